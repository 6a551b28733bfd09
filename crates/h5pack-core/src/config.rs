//! Configuration module
//!
//! This module provides the ingestion pipeline configuration: which storage
//! backend to publish through, its connection settings, and the worker-pool
//! limits for remote batches. The configuration is read once at startup and
//! passed explicitly into the storage factory; there is no process-wide
//! mutable state.

use std::env;
use std::str::FromStr;

use crate::storage_types::StorageBackend;

const MAX_WORKERS: usize = 10;
const UPLOAD_FAILURE_THRESHOLD: f64 = 0.0;

/// Ingestion pipeline configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Selected storage backend. `None` falls back to `Local`.
    pub storage_backend: Option<StorageBackend>,
    // Local backend settings
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    // S3 backend settings
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, DigitalOcean Spaces, etc.)
    pub aws_region: Option<String>,
    /// Worker-pool size for remote delete/upload batches.
    pub max_workers: usize,
    /// Fraction of failed operations a remote batch tolerates before the
    /// whole publish call reports failure. 0.0 surfaces any failure.
    pub upload_failure_threshold: f64,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let storage_backend = env::var("STORAGE_BACKEND")
            .ok()
            .and_then(|s| StorageBackend::from_str(&s).ok());

        let max_workers = env::var("MAX_WORKERS")
            .unwrap_or_else(|_| MAX_WORKERS.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_WORKERS)
            .max(1); // Ensure at least 1

        let upload_failure_threshold = env::var("UPLOAD_FAILURE_THRESHOLD")
            .unwrap_or_else(|_| UPLOAD_FAILURE_THRESHOLD.to_string())
            .parse::<f64>()
            .unwrap_or(UPLOAD_FAILURE_THRESHOLD)
            .clamp(0.0, 1.0);

        Ok(Config {
            storage_backend,
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            aws_region: env::var("AWS_REGION").ok(),
            max_workers,
            upload_failure_threshold,
        })
    }

    /// Effective backend, defaulting to local filesystem storage.
    pub fn storage_backend(&self) -> StorageBackend {
        self.storage_backend.unwrap_or(StorageBackend::Local)
    }

    /// Effective S3 region: `S3_REGION` wins over `AWS_REGION`.
    pub fn s3_region(&self) -> Option<&str> {
        self.s3_region.as_deref().or(self.aws_region.as_deref())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage_backend: None,
            local_storage_path: None,
            local_storage_base_url: None,
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            aws_region: None,
            max_workers: MAX_WORKERS,
            upload_failure_threshold: UPLOAD_FAILURE_THRESHOLD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_backend_is_local() {
        let config = Config::default();
        assert_eq!(config.storage_backend(), StorageBackend::Local);
    }

    #[test]
    fn test_s3_region_prefers_explicit_setting() {
        let config = Config {
            s3_region: Some("eu-west-1".to_string()),
            aws_region: Some("us-east-1".to_string()),
            ..Config::default()
        };
        assert_eq!(config.s3_region(), Some("eu-west-1"));

        let config = Config {
            aws_region: Some("us-east-1".to_string()),
            ..Config::default()
        };
        assert_eq!(config.s3_region(), Some("us-east-1"));
    }

    #[test]
    fn test_default_limits() {
        let config = Config::default();
        assert_eq!(config.max_workers, 10);
        assert_eq!(config.upload_failure_threshold, 0.0);
    }
}
