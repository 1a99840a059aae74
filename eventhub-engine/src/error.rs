use auth_identity::IdentityError;
use error_common::{Classify, ErrorKind};
use event_registry::RegistryError;
use logger_redacted::LoggerInitError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Logging(#[from] LoggerInitError),
}

impl Classify for EngineError {
    fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Identity(e) => e.kind(),
            EngineError::Registry(e) => e.kind(),
            EngineError::Config(_) | EngineError::Logging(_) => ErrorKind::Internal,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
