use crate::config::StorageConfig;
use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Binary payload submitted alongside a registration or event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upload {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    /// Original client-side file name, if any
    pub file_name: Option<String>,
}

impl Upload {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
            file_name: None,
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }
}

/// Opaque blob store: keeps the bytes and hands back a public URL
#[async_trait]
pub trait BlobSink: Send + Sync {
    /// # Errors
    ///
    /// [`StorageError::UnsupportedMediaType`] unless the type is JPEG, PNG
    /// or GIF; validation errors for empty or oversized payloads.
    async fn store(
        &self,
        bytes: &[u8],
        mime_type: &str,
        suggested_name: Option<&str>,
    ) -> StorageResult<String>;
}

/// Returns the file extension for an accepted image type.
pub fn ensure_supported_image(mime_type: &str) -> StorageResult<&'static str> {
    let parsed: mime::Mime = mime_type
        .trim()
        .parse()
        .map_err(|_| StorageError::UnsupportedMediaType(mime_type.to_string()))?;

    let essence = parsed.essence_str();
    if essence == mime::IMAGE_JPEG.essence_str() {
        Ok("jpg")
    } else if essence == mime::IMAGE_PNG.essence_str() {
        Ok("png")
    } else if essence == mime::IMAGE_GIF.essence_str() {
        Ok("gif")
    } else {
        Err(StorageError::UnsupportedMediaType(essence.to_string()))
    }
}

/// Media type first, then size; returns the extension to store under.
pub(crate) fn check_upload(
    config: &StorageConfig,
    bytes: &[u8],
    mime_type: &str,
) -> StorageResult<&'static str> {
    let extension = ensure_supported_image(mime_type)?;
    if bytes.is_empty() {
        return Err(StorageError::EmptyPayload);
    }
    if bytes.len() > config.max_upload_bytes {
        return Err(StorageError::PayloadTooLarge {
            size: bytes.len(),
            limit: config.max_upload_bytes,
        });
    }
    Ok(extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_image_types() {
        assert_eq!(ensure_supported_image("image/jpeg").unwrap(), "jpg");
        assert_eq!(ensure_supported_image("image/png").unwrap(), "png");
        assert_eq!(ensure_supported_image("image/gif").unwrap(), "gif");
        assert_eq!(ensure_supported_image("image/png; charset=binary").unwrap(), "png");
    }

    #[test]
    fn test_other_types_rejected() {
        for mime_type in ["application/pdf", "image/webp", "text/plain", "", "not a mime"] {
            assert!(
                matches!(ensure_supported_image(mime_type), Err(StorageError::UnsupportedMediaType(_))),
                "{mime_type} should be rejected"
            );
        }
    }

    #[test]
    fn test_media_type_checked_before_size() {
        let config = StorageConfig::default();
        assert!(matches!(
            check_upload(&config, &[], "application/pdf"),
            Err(StorageError::UnsupportedMediaType(_))
        ));
        assert!(matches!(check_upload(&config, &[], "image/png"), Err(StorageError::EmptyPayload)));
    }

    #[test]
    fn test_oversized_payload_rejected() {
        let config = StorageConfig {
            max_upload_bytes: 4,
            ..StorageConfig::default()
        };
        assert!(matches!(
            check_upload(&config, &[0; 5], "image/gif"),
            Err(StorageError::PayloadTooLarge { size: 5, limit: 4 })
        ));
        assert!(check_upload(&config, &[0; 4], "image/gif").is_ok());
    }
}
