//! H5pack Storage Library
//!
//! This crate provides the object-storage abstraction the remote publishing
//! path distributes content through, implementations for S3-compatible
//! stores and the local filesystem, and the factory that turns a [`Config`]
//! into a concrete [`StorageTarget`].
//!
//! # Storage keys
//!
//! Keys are content-location prefixes plus the sanitized relative path of
//! an archive entry: `{org}/{course}/{block}/{entry_path}`. Keys must not
//! contain `..` or a leading `/`; entry sanitization is centralized in
//! `h5pack_core::location`.
//!
//! [`Config`]: h5pack_core::Config

pub mod factory;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
#[cfg(feature = "storage-local")]
pub use factory::create_local_remote_target;
pub use factory::{create_target, StorageTarget};
pub use h5pack_core::StorageBackend;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{ObjectStorage, PrefixListing, StorageError, StorageResult};
