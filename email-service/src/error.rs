use error_common::{Classify, ErrorKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmailError {
    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),
}

impl Classify for EmailError {
    fn kind(&self) -> ErrorKind {
        match self {
            EmailError::SendFailed(_) | EmailError::InvalidRecipient(_) => ErrorKind::DeliveryError,
        }
    }
}

pub type EmailResult<T> = Result<T, EmailError>;
