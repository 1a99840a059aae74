use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Maximum accepted upload, matching the multipart limit of the HTTP layer
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory files are written to
    pub upload_dir: PathBuf,
    /// Public base URL; stored files are served under `<server_url>/uploads/`
    pub server_url: String,
    pub max_upload_bytes: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            server_url: "http://localhost:3000".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl StorageConfig {
    pub fn public_url(&self, file_name: &str) -> String {
        format!("{}/uploads/{}", self.server_url.trim_end_matches('/'), file_name)
    }
}
