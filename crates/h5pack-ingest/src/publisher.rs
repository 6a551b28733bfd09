//! Ingestion pipeline entry point.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use crate::archive::{discover_entry_point, ContentPackage};
use crate::error::IngestError;
use crate::local::publish_local;
use crate::remote::RemotePublisher;
use h5pack_core::{Config, ContentLocation, PublishResult};
use h5pack_storage::{create_target, StorageResult, StorageTarget};

enum Route {
    Local { root: PathBuf, base_url: String },
    Remote(RemotePublisher),
}

/// Drives one ingestion end to end: validate the upload, supersede whatever
/// was previously published at the content location, and report where the
/// content now lives.
///
/// The storage route is fixed at construction; per-request state is limited
/// to the per-location serialization locks.
pub struct ContentPublisher {
    route: Route,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ContentPublisher {
    pub fn new(target: StorageTarget, max_workers: usize, failure_threshold: f64) -> Self {
        let route = match target {
            StorageTarget::Local { root, base_url } => Route::Local { root, base_url },
            StorageTarget::Remote(storage) => {
                Route::Remote(RemotePublisher::new(storage, max_workers, failure_threshold))
            }
        };

        ContentPublisher {
            route,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Build a publisher from configuration.
    ///
    /// Fails fast when the configured storage backend is unusable; a
    /// misconfigured deployment never reaches its first upload.
    pub async fn from_config(config: &Config) -> StorageResult<Self> {
        let target = create_target(config).await?;
        Ok(ContentPublisher::new(
            target,
            config.max_workers,
            config.upload_failure_threshold,
        ))
    }

    /// Ingest `package` at `location` and return where it now lives.
    pub async fn publish(
        &self,
        package: &ContentPackage,
        location: &ContentLocation,
    ) -> Result<PublishResult, IngestError> {
        // Ingestions for one location are serialized so concurrent
        // re-uploads cannot interleave deletes and writes under the same
        // prefix.
        let lock = self.location_lock(location).await;
        let _held = lock.lock().await;

        let entry_point = discover_entry_point(package)?;

        match &self.route {
            Route::Local { root, .. } => {
                publish_local(package, &location.dir_under(root)).await?;
            }
            Route::Remote(remote) => {
                remote.publish(package, location).await?;
            }
        }

        let url = self.public_url(location, entry_point.as_deref());

        tracing::info!(
            package = %package.name(),
            location = %location,
            url = %url,
            "Package published"
        );

        Ok(PublishResult {
            url,
            entry_point,
            package_name: package.name().to_string(),
            size_bytes: package.size(),
            checksum: hex::encode(Sha256::digest(package.data())),
            published_at: Utc::now(),
        })
    }

    fn public_url(&self, location: &ContentLocation, entry_point: Option<&str>) -> String {
        let prefix = location.prefix();
        let key = match entry_point {
            Some(entry) => format!("{}/{}", prefix, entry),
            None => prefix,
        };

        match &self.route {
            Route::Local { base_url, .. } => {
                format!("{}/{}", base_url.trim_end_matches('/'), key)
            }
            Route::Remote(remote) => remote.url_for(&key),
        }
    }

    async fn location_lock(&self, location: &ContentLocation) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(location.prefix()).or_default().clone()
    }
}
