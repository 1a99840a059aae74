use error_common::{Classify, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Upload is empty")]
    EmptyPayload,

    #[error("Upload of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Classify for StorageError {
    fn kind(&self) -> ErrorKind {
        match self {
            StorageError::UnsupportedMediaType(_) => ErrorKind::UnsupportedMediaType,
            StorageError::EmptyPayload | StorageError::PayloadTooLarge { .. } => {
                ErrorKind::ValidationError
            }
            StorageError::Storage(_) | StorageError::Io(_) => ErrorKind::Internal,
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;
