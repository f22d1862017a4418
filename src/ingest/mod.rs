//! Concurrent ingestion of a JSON document tree
//!
//! ```text
//!   ┌──────────────────────┐
//!   │   DirectoryWalker    │   root/<dir>/<file>.json
//!   │  (director thread)   │
//!   └──────────┬───────────┘
//!              │ FileTask { seq, path }
//!              ▼
//!   ┌──────────────────────┐
//!   │      WorkQueue       │   crossbeam unbounded
//!   └──────────┬───────────┘
//!       ┌──────┼───────┐
//!       ▼      ▼       ▼
//!   worker-0 worker-1 worker-N   read → parse → flatten
//!       │      │       │         (private buffers)
//!       └──────┼───────┘
//!              ▼  join + merge by seq
//!      RecordCollection
//! ```

pub mod pool;
pub mod queue;
pub mod walker;

pub use pool::{ingest_file, IngestOutcome, IngestionPool, DEFAULT_WORKERS};
pub use queue::{FileTask, QueueClosed, QueueStats, WorkQueue, WorkReceiver, WorkSender};
pub use walker::{DirectoryWalker, WalkSummary};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Ingestion errors
#[derive(Error, Debug)]
pub enum IngestError {
    /// The root meta-directory could not be listed
    #[error("Cannot read root directory '{}': {source}", path.display())]
    RootUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A second-level directory could not be listed
    #[error("Cannot read directory '{}': {source}", path.display())]
    DirectoryUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A document could not be read
    #[error("Cannot read file '{}': {source}", path.display())]
    FileUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A document is not well-formed JSON
    #[error("Invalid JSON in '{}': {source}", path.display())]
    InvalidJson {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// A worker thread could not be started
    #[error("Failed to spawn ingest worker {id}: {source}")]
    WorkerSpawn { id: usize, source: std::io::Error },

    /// A worker thread panicked
    #[error("Ingest worker {id} panicked")]
    WorkerPanicked { id: usize },

    /// Ingestion was cancelled before the queue was drained
    #[error("Ingestion interrupted")]
    Interrupted,
}

impl IngestError {
    /// Errors confined to a single document or directory
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            IngestError::DirectoryUnreadable { .. }
                | IngestError::FileUnreadable { .. }
                | IngestError::InvalidJson { .. }
        )
    }
}

pub type IngestResult<T> = Result<T, IngestError>;

/// What to do when a single document or directory fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ErrorPolicy {
    /// Record the failure, warn, and keep going
    #[default]
    Skip,

    /// Cancel the whole ingestion on the first failure
    Abort,
}

/// A document or directory left out of the collection
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: IngestError,
}

impl fmt::Display for FileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_file_classification() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let invalid = IngestError::InvalidJson {
            path: "a.json".into(),
            source: parse_err,
        };
        assert!(invalid.is_per_file());

        let root = IngestError::RootUnreadable {
            path: "missing".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(!root.is_per_file());
        assert!(!IngestError::Interrupted.is_per_file());
    }

    #[test]
    fn test_default_policy_is_skip() {
        assert_eq!(ErrorPolicy::default(), ErrorPolicy::Skip);
    }
}
