//! End-to-end run: records → filter → graph → sink
//!
//! The pipeline owns the record collection for the duration of a run. It is
//! filled exactly once, either from the cache snapshot or by walking the
//! document tree, and only read afterwards.

use crate::config::{ConfigError, PipelineConfig};
use crate::graph::{BuildStats, FieldGraph, GraphBuilder};
use crate::ingest::{DirectoryWalker, FileFailure, IngestError, IngestOutcome, IngestionPool};
use crate::persistence::{CacheError, CacheStore, SnapshotInfo};
use crate::query::QueryFilter;
use crate::record::{Flattener, Record, RecordCollection};
use crate::sink::SinkError;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

/// Pipeline errors
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Ingestion error: {0}")]
    Ingest(#[from] IngestError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Output error: {0}")]
    Sink(#[from] SinkError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Where the records of a run came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSource {
    Ingestion,
    Cache,
}

/// The populated record collection and how it was obtained
#[derive(Debug)]
pub struct CollectedRecords {
    pub collection: RecordCollection,
    pub source: RecordSource,
    pub files_ingested: usize,
    pub failures: Vec<FileFailure>,
    pub snapshot: Option<SnapshotInfo>,
}

/// Summary of a completed run
#[derive(Debug)]
pub struct RunReport {
    pub source: RecordSource,
    pub records_total: usize,
    pub records_matched: usize,
    pub files_ingested: usize,
    /// Documents and directories left out (skip policy)
    pub failures: Vec<FileFailure>,
    pub snapshot: Option<SnapshotInfo>,
    pub vertices: usize,
    pub edges: usize,
    pub build: BuildStats,
    pub output_path: PathBuf,
    pub duration: Duration,
}

/// One configured run
pub struct Pipeline {
    config: PipelineConfig,
    shutdown: Arc<AtomicBool>,
}

impl Pipeline {
    /// Validate `config` and prepare a run
    pub fn new(config: PipelineConfig) -> PipelineResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Share an externally owned cancellation flag (e.g. a signal handler)
    pub fn with_shutdown(mut self, shutdown: Arc<AtomicBool>) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage and write the graph
    pub fn run(&self) -> PipelineResult<RunReport> {
        self.run_inspect(|_| {})
    }

    /// Like [`Pipeline::run`], handing the matched records to `on_matches`
    /// before the graph is built
    pub fn run_inspect<F>(&self, on_matches: F) -> PipelineResult<RunReport>
    where
        F: FnOnce(&[&Record]),
    {
        let start = Instant::now();
        let filter = QueryFilter::new(self.config.query.as_str())?;

        let collected = self.collect_records()?;
        let matched = filter.apply(collected.collection.as_slice());
        info!(
            query = filter.query(),
            matched = matched.len(),
            total = collected.collection.len(),
            "Records filtered"
        );
        on_matches(&matched);

        let (graph, build) = self.build_graph(&matched);
        self.emit(&graph)?;

        Ok(RunReport {
            source: collected.source,
            records_total: collected.collection.len(),
            records_matched: matched.len(),
            files_ingested: collected.files_ingested,
            failures: collected.failures,
            snapshot: collected.snapshot,
            vertices: graph.vertex_count(),
            edges: graph.edge_count(),
            build,
            output_path: self.config.output_path.clone(),
            duration: start.elapsed(),
        })
    }

    /// Populate the record collection from the cache or the document tree.
    ///
    /// A fresh ingestion is written to the cache afterwards.
    pub fn collect_records(&self) -> PipelineResult<CollectedRecords> {
        let cache = CacheStore::new(&self.config.cache_path);

        if self.config.cached {
            let (collection, snapshot) = cache.load_with_info()?;
            return Ok(CollectedRecords {
                files_ingested: collection.file_count(),
                collection,
                source: RecordSource::Cache,
                failures: Vec::new(),
                snapshot: Some(snapshot),
            });
        }

        let outcome = self.ingest()?;
        let snapshot = cache.save(&outcome.collection)?;
        Ok(CollectedRecords {
            collection: outcome.collection,
            source: RecordSource::Ingestion,
            files_ingested: outcome.files_ingested,
            failures: outcome.failures,
            snapshot: Some(snapshot),
        })
    }

    /// Walk the document tree and flatten every document
    pub fn ingest(&self) -> PipelineResult<IngestOutcome> {
        let pool = IngestionPool::start(
            self.config.workers,
            Flattener::new(self.config.flatten_policy),
            self.config.error_policy,
            Arc::clone(&self.shutdown),
        )?;
        let walker = DirectoryWalker::new(
            &self.config.root,
            self.config.error_policy,
            pool.shutdown_flag(),
        );

        let summary = match walker.walk(pool.sender()) {
            Ok(summary) => summary,
            Err(e) => {
                // Let the workers drain what was already submitted
                if let Err(drain) = pool.finish() {
                    debug!(error = %drain, "Ingest pool drained with error");
                }
                return Err(e.into());
            }
        };

        let mut outcome = pool.finish()?;
        if !summary.failures.is_empty() {
            let mut failures = summary.failures;
            failures.append(&mut outcome.failures);
            outcome.failures = failures;
        }
        Ok(outcome)
    }

    pub fn build_graph(&self, matched: &[&Record]) -> (FieldGraph, BuildStats) {
        GraphBuilder::new()
            .with_strategy(self.config.correlation)
            .build(matched)
    }

    /// Write the graph description
    pub fn emit(&self, graph: &FieldGraph) -> PipelineResult<()> {
        self.config
            .output_format
            .sink()
            .render_to_path(graph, &self.config.output_path)?;
        Ok(())
    }
}
