//! Publish result metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of a successful package ingestion.
///
/// The hosting plugin persists this record; the pipeline itself keeps no
/// state between requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishResult {
    /// Public URL of the published content. Points at the entry-point file
    /// when one was discovered, otherwise at the content prefix.
    pub url: String,
    /// Entry-point file found inside the package, e.g. `h5p.json`.
    pub entry_point: Option<String>,
    /// Declared file name of the uploaded package.
    pub package_name: String,
    /// Size of the uploaded package in bytes.
    pub size_bytes: u64,
    /// SHA-256 of the uploaded package, hex-encoded.
    pub checksum: String,
    /// When the ingestion completed.
    pub published_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_serializes_round_trip() {
        let result = PublishResult {
            url: "http://localhost:3000/content/org/course/block1/h5p.json".to_string(),
            entry_point: Some("h5p.json".to_string()),
            package_name: "interactive-video.h5p".to_string(),
            size_bytes: 1024,
            checksum: "ab".repeat(32),
            published_at: Utc::now(),
        };

        let json = serde_json::to_string(&result).unwrap();
        let back: PublishResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.url, result.url);
        assert_eq!(back.entry_point, result.entry_point);
        assert_eq!(back.size_bytes, result.size_bytes);
    }
}
