//! Common error handling utilities for the EventHub engine
//!
//! Every crate in the workspace keeps its own `thiserror` enum, but all of
//! them classify into the same small taxonomy so callers (and whatever HTTP
//! layer sits on top) can map failures without knowing each crate's variants.
//!
//! # Error Categories
//!
//! - **Conflict**: duplicate email or event title
//! - **Unauthorized**: bad credentials, bad or expired token, wrong role, missing account
//! - **NotFound**: referenced event or account absent
//! - **UnsupportedMediaType**: upload outside the image allow-list
//! - **DeliveryError**: notification could not be sent
//! - **ValidationError**: malformed input, rejected before any side effect
//! - **Internal**: record store, filesystem or configuration faults
//!
//! # Example
//!
//! ```rust
//! use error_common::{Classify, ErrorKind};
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("title already taken")]
//! struct TitleTaken;
//!
//! impl Classify for TitleTaken {
//!     fn kind(&self) -> ErrorKind {
//!         ErrorKind::Conflict
//!     }
//! }
//!
//! assert_eq!(TitleTaken.kind(), ErrorKind::Conflict);
//! assert_eq!(TitleTaken.code(), "CONFLICT_5001");
//! ```

pub mod codes;
pub mod types;

pub use types::*;
