use crate::config::StorageConfig;
use crate::error::StorageResult;
use crate::sink::{check_upload, BlobSink};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Writes uploads into a local directory served by the HTTP layer
pub struct FileSystemBlobSink {
    config: StorageConfig,
}

impl FileSystemBlobSink {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    /// Create the upload directory if it does not exist yet
    pub async fn initialize(&self) -> StorageResult<()> {
        fs::create_dir_all(&self.config.upload_dir).await?;
        Ok(())
    }

    fn file_path(&self, file_name: &str) -> PathBuf {
        self.config.upload_dir.join(file_name)
    }
}

#[async_trait]
impl BlobSink for FileSystemBlobSink {
    async fn store(
        &self,
        bytes: &[u8],
        mime_type: &str,
        suggested_name: Option<&str>,
    ) -> StorageResult<String> {
        let extension = check_upload(&self.config, bytes, mime_type)?;
        self.initialize().await?;

        // Client names are never used on disk
        let file_name = format!("{}.{}", Uuid::new_v4(), extension);
        let mut file = fs::File::create(self.file_path(&file_name)).await?;
        file.write_all(bytes).await?;
        file.flush().await?;

        tracing::debug!(
            file_name = %file_name,
            suggested_name = suggested_name.unwrap_or_default(),
            size = bytes.len(),
            "upload stored"
        );
        Ok(self.config.public_url(&file_name))
    }
}
