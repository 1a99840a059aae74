//! EventHub credential and authorization core
//!
//! Wires the identity directory, the organizer gate, the event registry and
//! the relationship repair pass into one [`EventHub`] built from an
//! [`EngineConfig`].
//!
//! ```rust,no_run
//! use eventhub_engine::{init_logging, EngineConfig, EventHub};
//!
//! # fn main() -> eventhub_engine::EngineResult<()> {
//! let config = EngineConfig::from_env()?;
//! init_logging(&config)?;
//! let hub = EventHub::from_config(&config)?;
//! # let _ = hub;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;

pub use config::EngineConfig;
pub use engine::{Collaborators, EventHub};
pub use error::{EngineError, EngineResult};

/// Install the tracing subscriber described by `config.logger`
pub fn init_logging(config: &EngineConfig) -> EngineResult<()> {
    logger_redacted::init_tracing(&config.logger)?;
    tracing::info!(json = config.logger.json, level = %config.logger.log_level, "logging initialised");
    Ok(())
}
