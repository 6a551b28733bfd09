//! H5pack Core Library
//!
//! This crate provides the configuration, content addressing, and result
//! types shared across the h5pack ingestion pipeline.
//!
//! # Content location format
//!
//! Every content instance is addressed by a `{org}/{course}/{block}` prefix.
//! The same identifiers always resolve to the same prefix, so re-ingesting a
//! package fully supersedes the previous upload. Prefix construction and
//! archive-entry sanitization are centralized in the `location` module so
//! every write path applies the same traversal rules.

pub mod config;
pub mod location;
pub mod result;
pub mod storage_types;

// Re-export commonly used types
pub use config::Config;
pub use location::{sanitize_entry_path, ContentLocation, LocationError};
pub use result::PublishResult;
pub use storage_types::StorageBackend;
