//! Uploaded package handling and archive validation.
//!
//! Validation is the gate in front of every destructive pipeline step: a
//! package that does not open as a zip archive is reported as
//! `InvalidArchive` before anything is deleted or written.

use std::io::Cursor;

use bytes::Bytes;
use zip::ZipArchive;

use crate::error::IngestError;
use h5pack_core::sanitize_entry_path;

/// Entry-point files the player can boot from, in preference order.
const ENTRY_POINT_CANDIDATES: &[&str] = &["h5p.json", "index.html"];

/// An uploaded content package: raw bytes plus the declared file name.
///
/// Transient; exists only for the duration of one ingestion request.
#[derive(Debug, Clone)]
pub struct ContentPackage {
    name: String,
    data: Bytes,
}

impl ContentPackage {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        ContentPackage {
            name: name.into(),
            data: data.into(),
        }
    }

    /// Declared file name of the upload.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size of the upload in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Raw package bytes.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Open the package as a zip archive.
    ///
    /// Checks the signature and reads the central directory without
    /// extracting anything.
    pub(crate) fn open(&self) -> Result<ZipArchive<Cursor<&[u8]>>, IngestError> {
        ZipArchive::new(Cursor::new(self.data.as_ref())).map_err(|e| IngestError::InvalidArchive {
            name: self.name.clone(),
            reason: e.to_string(),
        })
    }

    pub(crate) fn invalid(&self, reason: impl std::fmt::Display) -> IngestError {
        IngestError::InvalidArchive {
            name: self.name.clone(),
            reason: reason.to_string(),
        }
    }
}

/// Validate that `package` is a well-formed zip archive.
///
/// Malformed input is signaled as `InvalidArchive`, never a panic, and
/// nothing is written anywhere.
pub fn validate_package(package: &ContentPackage) -> Result<(), IngestError> {
    package.open().map(|_| ())
}

/// Find the file the player should boot from.
///
/// Prefers the H5P manifest, falls back to a root-level index page.
/// Returns `Ok(None)` for archives that contain neither; the published URL
/// then points at the content prefix itself.
pub fn discover_entry_point(package: &ContentPackage) -> Result<Option<String>, IngestError> {
    let archive = package.open()?;

    for candidate in ENTRY_POINT_CANDIDATES {
        let found = archive
            .file_names()
            .filter_map(sanitize_entry_path)
            .any(|path| path == *candidate);
        if found {
            return Ok(Some((*candidate).to_string()));
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::zip_bytes;

    #[test]
    fn test_validate_accepts_well_formed_zip() {
        let package = ContentPackage::new(
            "content.h5p",
            zip_bytes(&[("h5p.json", b"{}".as_slice())]),
        );
        assert!(validate_package(&package).is_ok());
    }

    #[test]
    fn test_validate_rejects_garbage() {
        let package = ContentPackage::new("bad.h5p", b"not a zip".to_vec());
        let err = validate_package(&package).unwrap_err();
        assert!(matches!(err, IngestError::InvalidArchive { .. }));
    }

    #[test]
    fn test_validate_rejects_empty_stream() {
        let package = ContentPackage::new("empty.h5p", Vec::new());
        assert!(matches!(
            validate_package(&package),
            Err(IngestError::InvalidArchive { .. })
        ));
    }

    #[test]
    fn test_entry_point_prefers_manifest() {
        let package = ContentPackage::new(
            "content.h5p",
            zip_bytes(&[
                ("index.html", b"<h1>hi</h1>".as_slice()),
                ("h5p.json", b"{}".as_slice()),
            ]),
        );
        assert_eq!(
            discover_entry_point(&package).unwrap().as_deref(),
            Some("h5p.json")
        );
    }

    #[test]
    fn test_entry_point_falls_back_to_index() {
        let package = ContentPackage::new(
            "content.h5p",
            zip_bytes(&[
                ("index.html", b"<h1>hi</h1>".as_slice()),
                ("img/a.png", b"png".as_slice()),
            ]),
        );
        assert_eq!(
            discover_entry_point(&package).unwrap().as_deref(),
            Some("index.html")
        );
    }

    #[test]
    fn test_entry_point_ignores_nested_candidates() {
        let package = ContentPackage::new(
            "content.h5p",
            zip_bytes(&[("nested/h5p.json", b"{}".as_slice())]),
        );
        assert_eq!(discover_entry_point(&package).unwrap(), None);
    }

    #[test]
    fn test_package_metadata() {
        let data = zip_bytes(&[("h5p.json", b"{}".as_slice())]);
        let size = data.len() as u64;
        let package = ContentPackage::new("content.h5p", data);
        assert_eq!(package.name(), "content.h5p");
        assert_eq!(package.size(), size);
    }
}
