//! Local filesystem extraction.

use std::path::Path;

use tokio::fs;

use crate::archive::{validate_package, ContentPackage};
use crate::error::IngestError;
use h5pack_core::sanitize_entry_path;

/// Extract `package` into `dest`, superseding any previous contents.
///
/// The package is validated before anything is deleted, so a malformed
/// upload leaves the previously published files in place and returns
/// `InvalidArchive`. On success the directory holds exactly the archive's
/// storable entries; nothing from a prior ingestion survives.
///
/// Extraction is sequential; the only side effects are filesystem writes
/// below `dest`. I/O failures propagate as `IngestError::Storage`.
pub async fn publish_local(package: &ContentPackage, dest: &Path) -> Result<(), IngestError> {
    validate_package(package)?;

    if fs::try_exists(dest).await.unwrap_or(false) {
        fs::remove_dir_all(dest).await?;
    }
    fs::create_dir_all(dest).await?;

    let mut archive = package.open()?;
    tracing::info!(
        package = %package.name(),
        dest = %dest.display(),
        entries = archive.len(),
        "Extracting package"
    );

    let mut written = 0usize;
    for index in 0..archive.len() {
        // The zip entry handle is not Send; fully read each entry before
        // the async writes.
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

        let path = dest.join(&rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, &data).await?;
        written += 1;
    }

    tracing::info!(
        package = %package.name(),
        dest = %dest.display(),
        files_written = written,
        "Local extraction complete"
    );

    Ok(())
}
