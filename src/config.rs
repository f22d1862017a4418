//! Pipeline configuration
//!
//! Flag parsing lives in the CLI crate; this module only holds the
//! validated settings a run needs.

use crate::graph::CorrelationStrategy;
use crate::ingest::{ErrorPolicy, DEFAULT_WORKERS};
use crate::record::FlattenPolicy;
use crate::sink::OutputFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Maximum reasonable worker count
pub const MAX_WORKERS: usize = 256;

/// Default document tree root
pub const DEFAULT_ROOT: &str = "../json/base/meta";

/// Default cache snapshot path
pub const DEFAULT_CACHE_PATH: &str = "cache.bin";

/// Default graph output path
pub const DEFAULT_OUTPUT_PATH: &str = "out.gv";

/// Configuration errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The query is required
    #[error("A non-empty query is required")]
    EmptyQuery,

    /// Invalid worker count
    #[error("Invalid worker count {count}: must be between 1 and {max}")]
    InvalidWorkerCount { count: usize, max: usize },
}

/// Settings for one pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Substring filter applied to every record
    pub query: String,

    /// Load records from the cache instead of walking the tree
    pub cached: bool,

    /// Root meta-directory of the document tree
    pub root: PathBuf,

    /// Cache snapshot location
    pub cache_path: PathBuf,

    /// Graph description location
    pub output_path: PathBuf,

    pub output_format: OutputFormat,

    /// Number of ingest workers
    pub workers: usize,

    pub flatten_policy: FlattenPolicy,

    pub error_policy: ErrorPolicy,

    pub correlation: CorrelationStrategy,
}

impl PipelineConfig {
    /// Defaults for everything but the query
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            cached: false,
            root: PathBuf::from(DEFAULT_ROOT),
            cache_path: PathBuf::from(DEFAULT_CACHE_PATH),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            output_format: OutputFormat::default(),
            workers: DEFAULT_WORKERS,
            flatten_policy: FlattenPolicy::default(),
            error_policy: ErrorPolicy::default(),
            correlation: CorrelationStrategy::default(),
        }
    }

    /// Check the settings before any work starts
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.query.is_empty() {
            return Err(ConfigError::EmptyQuery);
        }
        if self.workers == 0 || self.workers > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkerCount {
                count: self.workers,
                max: MAX_WORKERS,
            });
        }
        Ok(())
    }
}
