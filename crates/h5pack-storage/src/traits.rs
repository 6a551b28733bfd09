//! Storage abstraction trait
//!
//! This module defines the ObjectStorage trait that all remote storage
//! backends must implement.

use async_trait::async_trait;
use h5pack_core::StorageBackend;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("List failed: {0}")]
    ListFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// One level of a prefix listing: the immediate sub-prefixes and object
/// keys directly under the listed prefix.
#[derive(Debug, Default, Clone)]
pub struct PrefixListing {
    pub prefixes: Vec<String>,
    pub keys: Vec<String>,
}

impl PrefixListing {
    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty() && self.keys.is_empty()
    }
}

/// Object storage abstraction
///
/// All remote storage backends (S3, local filesystem) must implement this
/// trait. The store is key-addressed and has no native recursive
/// operations; callers walk prefixes one level at a time via `list`.
///
/// **Key format:** `{org}/{course}/{block}/{entry_path}`. See the crate
/// root documentation.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Write an object at `key` and return its public URL.
    async fn upload(&self, key: &str, data: Vec<u8>) -> StorageResult<String>;

    /// Read the object at `key`.
    async fn download(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Delete the object at `key`. Deleting a missing object is not an
    /// error.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// List the immediate children of `prefix`. A prefix with no objects
    /// under it yields an empty listing.
    async fn list(&self, prefix: &str) -> StorageResult<PrefixListing>;

    /// Public URL for an object key.
    fn url_for(&self, key: &str) -> String;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
