//! Image upload storage
//!
//! Avatars and event posters go through a [`BlobSink`], which only accepts
//! JPEG, PNG and GIF payloads and answers with the public URL the record
//! should store.

pub mod backends;
pub mod config;
pub mod error;
pub mod sink;

pub use backends::{FileSystemBlobSink, InMemoryBlobSink};
pub use config::StorageConfig;
pub use error::{StorageError, StorageResult};
pub use sink::{ensure_supported_image, BlobSink, Upload};
