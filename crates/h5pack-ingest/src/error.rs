//! Ingestion error taxonomy.

use std::fmt::{Display, Formatter, Result as FmtResult};

use h5pack_storage::StorageError;

/// Which remote batch an aggregated failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPhase {
    Delete,
    Upload,
}

impl Display for BatchPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            BatchPhase::Delete => write!(f, "delete"),
            BatchPhase::Upload => write!(f, "upload"),
        }
    }
}

/// One failed remote operation inside a batch.
#[derive(Debug)]
pub struct ObjectFailure {
    pub key: String,
    pub error: String,
}

/// Summary of a remote batch whose failure fraction exceeded the
/// configured threshold.
#[derive(Debug)]
pub struct BatchSummary {
    pub phase: BatchPhase,
    pub attempted: usize,
    pub failures: Vec<ObjectFailure>,
}

impl BatchSummary {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

impl Display for BatchSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "{} batch: {} of {} remote operations failed",
            self.phase,
            self.failed(),
            self.attempted
        )
    }
}

/// Errors produced by the ingestion pipeline.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The uploaded bytes are not a readable archive. Nothing was mutated.
    #[error("Invalid archive {name:?}: {reason}")]
    InvalidArchive { name: String, reason: String },

    /// Local filesystem mutation failed.
    #[error("Storage failure: {0}")]
    Storage(#[from] std::io::Error),

    /// A remote operation the batch cannot proceed without failed.
    #[error("Remote storage failure: {0}")]
    Remote(#[from] StorageError),

    /// Too many individual operations in a remote batch failed.
    #[error("{0}")]
    RemoteBatch(BatchSummary),
}
