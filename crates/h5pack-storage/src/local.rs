use crate::traits::{ObjectStorage, PrefixListing, StorageError, StorageResult};
use async_trait::async_trait;
use h5pack_core::StorageBackend;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage implementation
///
/// Backs the object-storage abstraction with a directory tree, so the
/// remote publishing path can run against local disk in development and in
/// tests.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for object storage (e.g., "/var/lib/h5pack/content")
    /// * `base_url` - Base URL for serving files (e.g., "http://localhost:3000/content")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
        })
    }

    /// Convert a storage key to a filesystem path with security validation.
    ///
    /// Keys are sanitized before they reach the backend, but the backend
    /// still rejects anything that could escape the base directory.
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        let traversal_safe = !key.is_empty()
            && !key.starts_with('/')
            && key
                .split('/')
                .all(|segment| !segment.is_empty() && segment != "." && segment != "..");

        if !traversal_safe {
            return Err(StorageError::InvalidKey(key.to_string()));
        }

        Ok(self.base_path.join(key))
    }

    /// Generate public URL for a key
    fn generate_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStorage for LocalStorage {
    async fn upload(&self, key: &str, data: Vec<u8>) -> StorageResult<String> {
        let path = self.key_to_path(key)?;
        let size = data.len();

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        let url = self.generate_url(key);

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(url)
    }

    async fn download(&self, key: &str) -> StorageResult<Vec<u8>> {
        let path = self.key_to_path(key)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(key.to_string()));
        }

        let data = fs::read(&path).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        Ok(data)
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.key_to_path(key)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }

        fs::remove_file(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(())
    }

    async fn list(&self, prefix: &str) -> StorageResult<PrefixListing> {
        let path = self.key_to_path(prefix)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(PrefixListing::default());
        }

        let mut listing = PrefixListing::default();
        let mut entries = fs::read_dir(&path).await.map_err(|e| {
            StorageError::ListFailed(format!("Failed to list {}: {}", path.display(), e))
        })?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::ListFailed(e.to_string()))?
        {
            let name = entry.file_name().to_string_lossy().to_string();
            let child = format!("{}/{}", prefix, name);
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| StorageError::ListFailed(e.to_string()))?;

            if file_type.is_dir() {
                listing.prefixes.push(child);
            } else {
                listing.keys.push(child);
            }
        }

        Ok(listing)
    }

    fn url_for(&self, key: &str) -> String {
        self.generate_url(key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
