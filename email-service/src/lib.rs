//! Transactional email for EventHub
//!
//! [`Notifier`] is the seam the account directory sends through.
//! [`EmailService`] delivers over SMTP using Stalwart Labs' `mail-send`, and
//! [`InMemoryNotifier`] keeps an outbox for tests and local runs.

pub mod error;
pub mod notifier;
pub mod service;
pub mod templates;

pub use error::*;
pub use notifier::*;
pub use service::*;
pub use templates::*;
