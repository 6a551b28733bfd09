#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-s3")]
use crate::S3Storage;
use crate::{ObjectStorage, StorageError, StorageResult};
use h5pack_core::{Config, StorageBackend};
use std::path::PathBuf;
use std::sync::Arc;

/// Where ingested packages are distributed.
///
/// Selected once at startup from configuration and never mutated
/// per-request. `Local` extracts archives straight onto disk below `root`;
/// `Remote` uploads each extracted file to an object store.
#[derive(Clone)]
pub enum StorageTarget {
    Local { root: PathBuf, base_url: String },
    Remote(Arc<dyn ObjectStorage>),
}

/// Build the storage target described by the configuration.
///
/// Fails fast with `ConfigError` when the selected backend cannot be
/// constructed, so a broken deployment never reaches its first upload.
pub async fn create_target(config: &Config) -> StorageResult<StorageTarget> {
    match config.storage_backend() {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let bucket = config
                .s3_bucket
                .clone()
                .ok_or_else(|| StorageError::ConfigError("S3_BUCKET not configured".to_string()))?;
            let region = config.s3_region().map(String::from).ok_or_else(|| {
                StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
            })?;
            let endpoint = config.s3_endpoint.clone();

            let storage = S3Storage::new(bucket, region, endpoint).await?;
            Ok(StorageTarget::Remote(Arc::new(storage)))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        StorageBackend::Local => {
            let root = config.local_storage_path.clone().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
            })?;
            let base_url = config.local_storage_base_url.clone().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_BASE_URL not configured".to_string())
            })?;

            let root = PathBuf::from(root);
            tokio::fs::create_dir_all(&root).await.map_err(|e| {
                StorageError::ConfigError(format!(
                    "Failed to create content root {}: {}",
                    root.display(),
                    e
                ))
            })?;

            Ok(StorageTarget::Local { root, base_url })
        }
    }
}

/// Build a remote target backed by local disk, for tests and development.
#[cfg(feature = "storage-local")]
pub async fn create_local_remote_target(
    root: impl Into<PathBuf>,
    base_url: String,
) -> StorageResult<StorageTarget> {
    let storage = LocalStorage::new(root, base_url).await?;
    Ok(StorageTarget::Remote(Arc::new(storage)))
}
