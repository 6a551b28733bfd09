//! Remote object-store publishing.
//!
//! The store has no native recursive operations, so superseding a previous
//! upload means walking the content prefix one listing at a time and
//! deleting each object, then uploading every archive entry as its own
//! object. Both batches run through a bounded worker pool and report an
//! aggregated outcome instead of discarding per-task failures.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::archive::{validate_package, ContentPackage};
use crate::error::{BatchPhase, BatchSummary, IngestError, ObjectFailure};
use h5pack_core::{sanitize_entry_path, ContentLocation};
use h5pack_storage::ObjectStorage;

/// Publishes packages into an object store, superseding prior uploads
/// under the same content prefix.
pub struct RemotePublisher {
    storage: Arc<dyn ObjectStorage>,
    max_workers: usize,
    failure_threshold: f64,
}

impl RemotePublisher {
    /// # Arguments
    /// * `storage` - Object store to publish through
    /// * `max_workers` - Worker-pool size for delete/upload batches
    /// * `failure_threshold` - Fraction of failed operations a batch
    ///   tolerates before the publish call reports failure
    pub fn new(storage: Arc<dyn ObjectStorage>, max_workers: usize, failure_threshold: f64) -> Self {
        RemotePublisher {
            storage,
            max_workers: max_workers.max(1),
            failure_threshold: failure_threshold.clamp(0.0, 1.0),
        }
    }

    /// Publish `package` under `location`, superseding any previous upload.
    ///
    /// Validates first, then deletes everything below the prefix, then
    /// uploads every storable archive entry. Returns only after every
    /// submitted task has completed.
    pub async fn publish(
        &self,
        package: &ContentPackage,
        location: &ContentLocation,
    ) -> Result<(), IngestError> {
        validate_package(package)?;

        let prefix = location.prefix();
        self.delete_prefix(&prefix).await?;
        self.upload_entries(package, &prefix).await
    }

    /// Recursively delete every object below `prefix`.
    ///
    /// Each listing level's files are deleted through the worker pool and
    /// sub-prefixes are walked depth-first. A single failed deletion does
    /// not halt the batch; failures are aggregated into the batch outcome.
    /// Listing failures abort the walk, since the level cannot be cleaned
    /// without knowing its contents.
    pub async fn delete_prefix(&self, prefix: &str) -> Result<(), IngestError> {
        tracing::info!(prefix = %prefix, "Deleting previously published files");

        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut outcome = BatchOutcome::new(BatchPhase::Delete);
        let mut pending = vec![prefix.to_string()];

        while let Some(current) = pending.pop() {
            let listing = self.storage.list(&current).await?;

            let mut tasks = JoinSet::new();
            for key in listing.keys {
                let permit = semaphore.clone().acquire_owned().await;
                let storage = Arc::clone(&self.storage);
                tasks.spawn(async move {
                    let _permit = permit;
                    let result = storage.delete(&key).await;
                    (key, result)
                });
            }

            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((key, Ok(()))) => {
                        tracing::info!(key = %key, "Deleted remote object");
                        outcome.success();
                    }
                    Ok((key, Err(e))) => {
                        tracing::warn!(key = %key, error = %e, "Remote delete failed");
                        outcome.failure(key, e.to_string());
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Delete task did not complete");
                        outcome.failure("<task>".to_string(), e.to_string());
                    }
                }
            }

            pending.extend(listing.prefixes);
        }

        outcome.into_result(self.failure_threshold)
    }

    /// Upload every storable archive entry below `prefix`.
    async fn upload_entries(
        &self,
        package: &ContentPackage,
        prefix: &str,
    ) -> Result<(), IngestError> {
        let mut archive = package.open()?;
        tracing::info!(
            package = %package.name(),
            prefix = %prefix,
            entries = archive.len(),
            "Uploading package contents"
        );

        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut outcome = BatchOutcome::new(BatchPhase::Upload);
        let mut tasks = JoinSet::new();

        for index in 0..archive.len() {
            // The zip entry handle is not Send; fully read each entry
            // before handing its bytes to an upload task.
            let (rel_path, data) = {
                let mut entry = archive
                    .by_index(index)
                    .map_err(|e| package.invalid(e))?;

                let Some(rel_path) = sanitize_entry_path(entry.name()) else {
                    continue;
                };

                let mut data = Vec::with_capacity(entry.size() as usize);
                std::io::Read::read_to_end(&mut entry, &mut data)
                    .map_err(|e| package.invalid(e))?;
                (rel_path, data)
            };

            let key = format!("{}/{}", prefix, rel_path);
            let permit = semaphore.clone().acquire_owned().await;
            let storage = Arc::clone(&self.storage);
            tasks.spawn(async move {
                let _permit = permit;
                let result = storage.upload(&key, data).await;
                (key, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((key, Ok(_url))) => {
                    tracing::info!(key = %key, "Uploaded remote object");
                    outcome.success();
                }
                Ok((key, Err(e))) => {
                    tracing::warn!(key = %key, error = %e, "Remote upload failed");
                    outcome.failure(key, e.to_string());
                }
                Err(e) => {
                    tracing::error!(error = %e, "Upload task did not complete");
                    outcome.failure("<task>".to_string(), e.to_string());
                }
            }
        }

        outcome.into_result(self.failure_threshold)
    }

    /// Public URL for an object key in the backing store.
    pub fn url_for(&self, key: &str) -> String {
        self.storage.url_for(key)
    }
}

/// Collected per-task results of one remote batch.
struct BatchOutcome {
    phase: BatchPhase,
    attempted: usize,
    failures: Vec<ObjectFailure>,
}

impl BatchOutcome {
    fn new(phase: BatchPhase) -> Self {
        BatchOutcome {
            phase,
            attempted: 0,
            failures: Vec::new(),
        }
    }

    fn success(&mut self) {
        self.attempted += 1;
    }

    fn failure(&mut self, key: String, error: String) {
        self.attempted += 1;
        self.failures.push(ObjectFailure { key, error });
    }

    fn into_result(self, threshold: f64) -> Result<(), IngestError> {
        if self.failures.is_empty() {
            return Ok(());
        }

        let rate = self.failures.len() as f64 / self.attempted as f64;
        if rate > threshold {
            Err(IngestError::RemoteBatch(BatchSummary {
                phase: self.phase,
                attempted: self.attempted,
                failures: self.failures,
            }))
        } else {
            tracing::warn!(
                phase = %self.phase,
                failed = self.failures.len(),
                attempted = self.attempted,
                "Remote batch completed with tolerated failures"
            );
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::zip_bytes;
    use async_trait::async_trait;
    use h5pack_core::StorageBackend;
    use h5pack_storage::{PrefixListing, StorageError, StorageResult};
    use std::collections::BTreeMap;
    use tokio::sync::Mutex;

    /// In-memory store that fails uploads for keys containing a marker.
    struct FlakyStorage {
        objects: Mutex<BTreeMap<String, Vec<u8>>>,
        fail_marker: Option<String>,
    }

    impl FlakyStorage {
        fn new(fail_marker: Option<&str>) -> Self {
            FlakyStorage {
                objects: Mutex::new(BTreeMap::new()),
                fail_marker: fail_marker.map(String::from),
            }
        }

        async fn keys(&self) -> Vec<String> {
            self.objects.lock().await.keys().cloned().collect()
        }
    }

    #[async_trait]
    impl ObjectStorage for FlakyStorage {
        async fn upload(&self, key: &str, data: Vec<u8>) -> StorageResult<String> {
            if let Some(marker) = &self.fail_marker {
                if key.contains(marker.as_str()) {
                    return Err(StorageError::UploadFailed("injected failure".to_string()));
                }
            }
            self.objects
                .lock()
                .await
                .insert(key.to_string(), data);
            Ok(format!("mem://{}", key))
        }

        async fn download(&self, key: &str) -> StorageResult<Vec<u8>> {
            self.objects
                .lock()
                .await
                .get(key)
                .cloned()
                .ok_or_else(|| StorageError::NotFound(key.to_string()))
        }

        async fn delete(&self, key: &str) -> StorageResult<()> {
            self.objects.lock().await.remove(key);
            Ok(())
        }

        async fn list(&self, prefix: &str) -> StorageResult<PrefixListing> {
            let objects = self.objects.lock().await;
            let mut listing = PrefixListing::default();
            let wanted = format!("{}/", prefix);
            for key in objects.keys() {
                if let Some(rest) = key.strip_prefix(&wanted) {
                    match rest.split_once('/') {
                        None => listing.keys.push(key.clone()),
                        Some((dir, _)) => {
                            let sub = format!("{}/{}", prefix, dir);
                            if !listing.prefixes.contains(&sub) {
                                listing.prefixes.push(sub);
                            }
                        }
                    }
                }
            }
            Ok(listing)
        }

        fn url_for(&self, key: &str) -> String {
            format!("mem://{}", key)
        }

        fn backend_type(&self) -> StorageBackend {
            StorageBackend::S3
        }
    }

    fn location() -> ContentLocation {
        ContentLocation::new("org", "course", "block1").unwrap()
    }

    #[tokio::test]
    async fn test_publish_uploads_every_storable_entry() {
        let storage = Arc::new(FlakyStorage::new(None));
        let publisher = RemotePublisher::new(storage.clone(), 4, 0.0);

        let package = ContentPackage::new(
            "content.h5p",
            zip_bytes(&[
                ("index.html", b"<h1>hi</h1>".as_slice()),
                ("img/a.png", b"\x89PNG".as_slice()),
                ("../escape.txt", b"out".as_slice()),
            ]),
        );

        publisher.publish(&package, &location()).await.unwrap();

        assert_eq!(
            storage.keys().await,
            vec![
                "org/course/block1/img/a.png".to_string(),
                "org/course/block1/index.html".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_publish_supersedes_previous_upload() {
        let storage = Arc::new(FlakyStorage::new(None));
        let publisher = RemotePublisher::new(storage.clone(), 4, 0.0);

        let first = ContentPackage::new(
            "v1.h5p",
            zip_bytes(&[
                ("old/deep/file.txt", b"old".as_slice()),
                ("index.html", b"one".as_slice()),
            ]),
        );
        publisher.publish(&first, &location()).await.unwrap();

        let second = ContentPackage::new(
            "v2.h5p",
            zip_bytes(&[("index.html", b"two".as_slice())]),
        );
        publisher.publish(&second, &location()).await.unwrap();

        assert_eq!(
            storage.keys().await,
            vec!["org/course/block1/index.html".to_string()]
        );
        assert_eq!(
            storage.download("org/course/block1/index.html").await.unwrap(),
            b"two"
        );
    }

    #[tokio::test]
    async fn test_invalid_archive_mutates_nothing() {
        let storage = Arc::new(FlakyStorage::new(None));
        let publisher = RemotePublisher::new(storage.clone(), 4, 0.0);

        let first = ContentPackage::new(
            "v1.h5p",
            zip_bytes(&[("index.html", b"one".as_slice())]),
        );
        publisher.publish(&first, &location()).await.unwrap();

        let invalid = ContentPackage::new("broken.h5p", b"not a zip".to_vec());
        let err = publisher.publish(&invalid, &location()).await.unwrap_err();

        assert!(matches!(err, IngestError::InvalidArchive { .. }));
        // Previous upload untouched.
        assert_eq!(
            storage.keys().await,
            vec!["org/course/block1/index.html".to_string()]
        );
    }

    #[tokio::test]
    async fn test_upload_failures_surface_as_batch_error() {
        let storage = Arc::new(FlakyStorage::new(Some("a.png")));
        let publisher = RemotePublisher::new(storage.clone(), 4, 0.0);

        let package = ContentPackage::new(
            "content.h5p",
            zip_bytes(&[
                ("index.html", b"<h1>hi</h1>".as_slice()),
                ("img/a.png", b"\x89PNG".as_slice()),
            ]),
        );

        let err = publisher.publish(&package, &location()).await.unwrap_err();
        match err {
            IngestError::RemoteBatch(summary) => {
                assert_eq!(summary.phase, BatchPhase::Upload);
                assert_eq!(summary.attempted, 2);
                assert_eq!(summary.failed(), 1);
                assert_eq!(summary.failures[0].key, "org/course/block1/img/a.png");
            }
            other => panic!("expected RemoteBatch, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failures_below_threshold_are_tolerated() {
        let storage = Arc::new(FlakyStorage::new(Some("a.png")));
        let publisher = RemotePublisher::new(storage.clone(), 4, 0.5);

        let package = ContentPackage::new(
            "content.h5p",
            zip_bytes(&[
                ("index.html", b"<h1>hi</h1>".as_slice()),
                ("img/a.png", b"\x89PNG".as_slice()),
                ("img/b.png", b"\x89PNG".as_slice()),
            ]),
        );

        publisher.publish(&package, &location()).await.unwrap();

        assert_eq!(
            storage.keys().await,
            vec![
                "org/course/block1/img/b.png".to_string(),
                "org/course/block1/index.html".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_delete_prefix_clears_nested_objects_any_pool_size() {
        for workers in [1usize, 10] {
            let storage = Arc::new(FlakyStorage::new(None));
            for i in 0..8 {
                storage
                    .upload(&format!("org/course/block1/f{}.txt", i), vec![b'x'])
                    .await
                    .unwrap();
            }
            storage
                .upload("org/course/block1/deep/nested/g.txt", vec![b'y'])
                .await
                .unwrap();

            let publisher = RemotePublisher::new(storage.clone(), workers, 0.0);
            publisher.delete_prefix("org/course/block1").await.unwrap();

            assert!(
                storage.keys().await.is_empty(),
                "objects survived with pool size {}",
                workers
            );
        }
    }
}
