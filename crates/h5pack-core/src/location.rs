//! Content addressing for ingested packages.
//!
//! A [`ContentLocation`] is the stable path under which one content
//! instance's files live, both as a directory on local disk and as an
//! object-store key prefix. It is derived from the hierarchical identifiers
//! of the hosting course structure, so the same content instance always
//! resolves to the same prefix and a re-upload fully supersedes the
//! previous one.
//!
//! Archive entry names pass through [`sanitize_entry_path`] before any
//! write. This is the single traversal check for the whole pipeline; no
//! downstream component accepts an unsanitized entry name.

use std::path::{Path, PathBuf};

/// Errors produced while building a content location.
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Invalid location segment: {0:?}")]
    InvalidSegment(String),
}

/// Stable storage location for one content instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentLocation {
    org: String,
    course: String,
    block: String,
}

impl ContentLocation {
    /// Build a location from hierarchical identifiers.
    ///
    /// Each identifier must be a single path-safe segment: non-empty, not
    /// `.` or `..`, and free of separators and NUL bytes.
    pub fn new(
        org: impl Into<String>,
        course: impl Into<String>,
        block: impl Into<String>,
    ) -> Result<Self, LocationError> {
        let org = org.into();
        let course = course.into();
        let block = block.into();

        for segment in [&org, &course, &block] {
            validate_segment(segment)?;
        }

        Ok(ContentLocation { org, course, block })
    }

    /// Object-store key prefix for this location: `{org}/{course}/{block}`.
    pub fn prefix(&self) -> String {
        format!("{}/{}/{}", self.org, self.course, self.block)
    }

    /// Local directory for this location below `root`.
    pub fn dir_under(&self, root: &Path) -> PathBuf {
        root.join(&self.org).join(&self.course).join(&self.block)
    }
}

impl std::fmt::Display for ContentLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

fn validate_segment(segment: &str) -> Result<(), LocationError> {
    let path_safe = !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(['/', '\\', '\0']);

    if path_safe {
        Ok(())
    } else {
        Err(LocationError::InvalidSegment(segment.to_string()))
    }
}

/// Normalize an archive entry name into a path-safe relative path.
///
/// Returns `None` for entries that carry nothing storable: directory
/// entries (trailing separator), entries containing a `..` segment, and
/// names that normalize to nothing. Empty and `.` segments are dropped,
/// so absolute entry names are treated as relative to the content root.
pub fn sanitize_entry_path(name: &str) -> Option<String> {
    if name.ends_with('/') || name.ends_with('\\') {
        return None;
    }

    let mut segments = Vec::new();
    for segment in name.split(['/', '\\']) {
        match segment {
            "" | "." => continue,
            ".." => return None,
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}
