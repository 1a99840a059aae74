use crate::config::StorageConfig;
use crate::error::StorageResult;
use crate::sink::{check_upload, BlobSink};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub suggested_name: Option<String>,
    pub stored_at: DateTime<Utc>,
}

/// In-memory implementation for development/testing
#[derive(Clone, Default)]
pub struct InMemoryBlobSink {
    config: StorageConfig,
    blobs: Arc<RwLock<HashMap<String, StoredBlob>>>,
}

impl InMemoryBlobSink {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            blobs: Arc::default(),
        }
    }

    pub async fn get(&self, url: &str) -> Option<StoredBlob> {
        self.blobs.read().await.get(url).cloned()
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait]
impl BlobSink for InMemoryBlobSink {
    async fn store(
        &self,
        bytes: &[u8],
        mime_type: &str,
        suggested_name: Option<&str>,
    ) -> StorageResult<String> {
        let extension = check_upload(&self.config, bytes, mime_type)?;
        let url = self
            .config
            .public_url(&format!("{}.{}", Uuid::new_v4(), extension));

        self.blobs.write().await.insert(
            url.clone(),
            StoredBlob {
                bytes: bytes.to_vec(),
                mime_type: mime_type.to_string(),
                suggested_name: suggested_name.map(str::to_string),
                stored_at: Utc::now(),
            },
        );
        Ok(url)
    }
}
