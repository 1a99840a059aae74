use auth_identity::IdentityError;
use error_common::{Classify, ErrorKind};
use object_storage::StorageError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Event not found: {0}")]
    EventNotFound(Uuid),

    #[error("Event with title '{0}' already exists")]
    TitleInUse(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),

    /// A relationship write failed after earlier steps were committed
    #[error("Relationship step '{step}' failed for event {event_id}: {source}")]
    Reconciliation {
        step: &'static str,
        event_id: Uuid,
        #[source]
        source: IdentityError,
    },

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Upload(#[from] StorageError),

    #[error("Record store error: {0}")]
    Store(#[from] anyhow::Error),
}

impl Classify for RegistryError {
    fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::EventNotFound(_) | RegistryError::AccountNotFound(_) => ErrorKind::NotFound,
            RegistryError::TitleInUse(_) => ErrorKind::Conflict,
            RegistryError::Validation(_) => ErrorKind::ValidationError,
            RegistryError::Reconciliation { source, .. } => source.kind(),
            RegistryError::Identity(e) => e.kind(),
            RegistryError::Upload(e) => e.kind(),
            RegistryError::Store(_) => ErrorKind::Internal,
        }
    }
}

pub type RegistryResult<T> = Result<T, RegistryError>;
