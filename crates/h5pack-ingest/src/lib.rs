//! H5pack Ingest Library
//!
//! The content-package ingestion pipeline: accept an uploaded zip archive,
//! validate it, and distribute its files to the configured storage target,
//! superseding whatever was previously published at the same content
//! location.
//!
//! The entry point is [`ContentPublisher`], built from a
//! [`StorageTarget`](h5pack_storage::StorageTarget) (usually via
//! configuration). Local targets extract straight onto disk; remote targets
//! upload every file to an object store through a bounded worker pool and
//! report an aggregated outcome.

pub mod archive;
pub mod error;
pub mod local;
pub mod publisher;
pub mod remote;

// Re-export commonly used types
pub use archive::{discover_entry_point, validate_package, ContentPackage};
pub use error::{BatchPhase, BatchSummary, IngestError, ObjectFailure};
pub use local::publish_local;
pub use publisher::ContentPublisher;
pub use remote::RemotePublisher;

#[cfg(test)]
pub(crate) mod testutil {
    use std::io::Write;

    /// Build an in-memory zip archive from (entry name, contents) pairs.
    pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
        use zip::write::{FileOptions, ZipWriter};
        use zip::CompressionMethod;

        let mut buffer = Vec::new();
        {
            let mut writer = ZipWriter::new(std::io::Cursor::new(&mut buffer));
            let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

            for (name, data) in entries {
                writer.start_file(*name, options).unwrap();
                writer.write_all(data).unwrap();
            }

            writer.finish().unwrap();
        }
        buffer
    }
}
