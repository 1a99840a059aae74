use email_service::EmailError;
use error_common::{Classify, ErrorKind};
use object_storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IdentityError {
    /// Unknown email and wrong password both map here
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("No bearer token provided")]
    MissingBearerToken,

    #[error("Only organizers can access this resource")]
    InsufficientRole,

    /// The account a token or session refers to is gone
    #[error("User not found")]
    UnknownAccount,

    #[error("User with this email does not exist")]
    UnknownEmail,

    #[error("Account not found: {0}")]
    AccountNotFound(uuid::Uuid),

    #[error("User with this email already exists")]
    EmailAlreadyInUse,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Hashing error")]
    HashingError,

    #[error("Token signing failed: {0}")]
    TokenSigning(String),

    #[error("Failed to send reset email. Please try again later.")]
    EmailDeliveryFailed(#[source] EmailError),

    #[error(transparent)]
    Upload(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Record store error: {0}")]
    Store(#[from] anyhow::Error),
}

impl Classify for IdentityError {
    fn kind(&self) -> ErrorKind {
        match self {
            IdentityError::InvalidCredentials
            | IdentityError::InvalidToken
            | IdentityError::MissingBearerToken
            | IdentityError::InsufficientRole
            | IdentityError::UnknownAccount
            | IdentityError::UnknownEmail => ErrorKind::Unauthorized,
            IdentityError::AccountNotFound(_) => ErrorKind::NotFound,
            IdentityError::EmailAlreadyInUse => ErrorKind::Conflict,
            IdentityError::Validation(_) => ErrorKind::ValidationError,
            IdentityError::EmailDeliveryFailed(_) => ErrorKind::DeliveryError,
            IdentityError::Upload(e) => e.kind(),
            IdentityError::HashingError
            | IdentityError::TokenSigning(_)
            | IdentityError::Configuration(_)
            | IdentityError::Store(_) => ErrorKind::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, IdentityError>;
