use crate::codes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller-facing classification shared by every error in the workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Conflict,
    Unauthorized,
    NotFound,
    UnsupportedMediaType,
    DeliveryError,
    ValidationError,
    Internal,
}

impl ErrorKind {
    /// Stable error code for API responses
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Conflict => codes::conflict::DUPLICATE_RESOURCE,
            ErrorKind::Unauthorized => codes::authentication::INVALID_CREDENTIALS,
            ErrorKind::NotFound => codes::not_found::RESOURCE_NOT_FOUND,
            ErrorKind::UnsupportedMediaType => codes::media::UNSUPPORTED_MEDIA_TYPE,
            ErrorKind::DeliveryError => codes::delivery::EMAIL_DELIVERY_FAILED,
            ErrorKind::ValidationError => codes::validation::INVALID_INPUT,
            ErrorKind::Internal => codes::internal::INTERNAL_ERROR,
        }
    }

    /// HTTP status an outer layer would most likely answer with
    pub fn http_status(self) -> u16 {
        match self {
            ErrorKind::Conflict => 409,
            ErrorKind::Unauthorized => 401,
            ErrorKind::NotFound => 404,
            ErrorKind::UnsupportedMediaType => 415,
            ErrorKind::DeliveryError => 502,
            ErrorKind::ValidationError => 400,
            ErrorKind::Internal => 500,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Conflict => "conflict",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::NotFound => "not_found",
            ErrorKind::UnsupportedMediaType => "unsupported_media_type",
            ErrorKind::DeliveryError => "delivery_error",
            ErrorKind::ValidationError => "validation_error",
            ErrorKind::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// Implemented by every crate error so failures can be mapped uniformly
pub trait Classify: std::error::Error {
    fn kind(&self) -> ErrorKind;

    fn code(&self) -> &'static str {
        self.kind().code()
    }
}

/// Log an error with its classification attached
pub fn log_error<E: Classify>(context: &str, error: &E) {
    let kind = error.kind();
    if kind == ErrorKind::Internal {
        tracing::error!(context = context, error_kind = %kind, error_code = kind.code(), error = %error, "operation failed");
    } else {
        tracing::warn!(context = context, error_kind = %kind, error_code = kind.code(), error = %error, "operation rejected");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        let kinds = [
            ErrorKind::Conflict,
            ErrorKind::Unauthorized,
            ErrorKind::NotFound,
            ErrorKind::UnsupportedMediaType,
            ErrorKind::DeliveryError,
            ErrorKind::ValidationError,
            ErrorKind::Internal,
        ];
        let codes: std::collections::HashSet<_> = kinds.iter().map(|k| k.code()).collect();
        assert_eq!(codes.len(), kinds.len());
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(ErrorKind::Unauthorized.http_status(), 401);
        assert_eq!(ErrorKind::UnsupportedMediaType.http_status(), 415);
    }
}
