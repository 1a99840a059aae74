//! Logging support with automatic credential and PII redaction
//!
//! Account emails, bearer tokens and reset links flow through the identity
//! core constantly. Anything that might end up in a log line goes through
//! [`redact`] first so that logs can be shipped without leaking who signed
//! in or which token they used.
//!
//! # Detected Data Types
//!
//! - **Email Addresses**: `user@example.com` → `EMAIL[k3Jf0aQ2xS8]` (hash mode) or `u***@e***`
//! - **Bearer headers**: `Bearer eyJ...` → `Bearer [TOKEN]`
//! - **JWTs**: any three-segment `eyJ...` token → `[TOKEN]`
//!
//! # Example
//!
//! ```rust
//! use logger_redacted::{init_tracing, redact, LoggerConfig};
//!
//! let _ = init_tracing(&LoggerConfig::default());
//! tracing::info!(email = %redact("jane@example.com"), "account registered");
//! assert!(!redact("jane@example.com").contains("jane"));
//! ```

pub mod config;
pub mod redactor;
pub mod subscriber;

pub use config::*;
pub use redactor::*;
pub use subscriber::*;

use lazy_static::lazy_static;

lazy_static! {
    static ref DEFAULT_REDACTOR: PiiRedactor = PiiRedactor::default();
}

/// Redact with the default configuration (emails hashed, tokens masked)
pub fn redact(text: &str) -> String {
    DEFAULT_REDACTOR.redact(text)
}
