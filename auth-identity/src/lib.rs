//! Identity core for EventHub
//!
//! This crate owns everything about who a caller is:
//! - password hashing with Argon2id ([`SecretHasher`])
//! - session and reset tokens signed with separate secrets ([`TokenAuthority`])
//! - registration, login and the password flows ([`AccountDirectory`])
//! - the Organizer-only gate in front of event operations ([`AccessGuard`])
//!
//! # Example
//!
//! ```rust
//! use auth_identity::{AccessGuard, IdentityConfig, InMemoryAccountRepository, RequestContext, TokenAuthority};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let tokens = Arc::new(TokenAuthority::new(&IdentityConfig::for_testing())?);
//! let guard = AccessGuard::new(tokens, Arc::new(InMemoryAccountRepository::new()));
//!
//! let mut ctx = RequestContext::new();
//! assert!(guard.guard_organizer_only(&mut ctx).await.is_err());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod guard;
pub mod models;
pub mod password;
pub mod repository;
pub mod service;
pub mod tokens;

pub use config::IdentityConfig;
pub use error::*;
pub use guard::{AccessGuard, AuthContext, OrganizerContext, RequestContext};
pub use models::*;
pub use password::SecretHasher;
pub use repository::{
    relation, AccountFilter, AccountRepository, InMemoryAccountRepository, RelationPatch, RelationSet,
};
pub use service::{AccountDirectory, PASSWORD_RESET_MESSAGE};
pub use tokens::{IssuedToken, TokenAuthority, TokenClaims, TokenPurpose};
