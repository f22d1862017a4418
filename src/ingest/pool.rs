//! Fixed-size pool of ingest workers
//!
//! Each worker:
//! - Pulls file tasks from the shared work queue
//! - Reads and parses the document into a `serde_json::Value`
//! - Flattens it into records kept in a private buffer
//!
//! The director merges the buffers by submission sequence after every
//! worker has been joined, so no lock guards the record collection.

use super::queue::{WorkQueue, WorkReceiver, WorkSender};
use super::{ErrorPolicy, FileFailure, IngestError, IngestResult};
use crate::record::{Flattener, Record, RecordCollection};
use serde_json::Value;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Default number of ingest workers
pub const DEFAULT_WORKERS: usize = 8;

/// Result of a drained ingestion
#[derive(Debug, Default)]
pub struct IngestOutcome {
    /// Records from every successfully ingested document, in walk order
    pub collection: RecordCollection,

    /// Documents (and directories) that were skipped
    pub failures: Vec<FileFailure>,

    /// Number of documents flattened
    pub files_ingested: usize,
}

/// Everything one worker produced
#[derive(Default)]
struct WorkerOutput {
    batches: Vec<(u64, Vec<Record>)>,
    failures: Vec<(u64, FileFailure)>,
}

struct Worker {
    id: usize,
    handle: JoinHandle<WorkerOutput>,
}

/// Pool of worker threads draining a [`WorkQueue`]
pub struct IngestionPool {
    queue: WorkQueue,
    workers: Vec<Worker>,
    policy: ErrorPolicy,
    shutdown: Arc<AtomicBool>,
}

impl IngestionPool {
    /// Spawn `worker_count` workers waiting on a fresh queue
    pub fn start(
        worker_count: usize,
        flattener: Flattener,
        policy: ErrorPolicy,
        shutdown: Arc<AtomicBool>,
    ) -> IngestResult<Self> {
        let queue = WorkQueue::new();
        let mut workers = Vec::with_capacity(worker_count);

        for id in 0..worker_count {
            let receiver = queue.receiver();
            let shutdown = Arc::clone(&shutdown);
            let handle = thread::Builder::new()
                .name(format!("ingest-{}", id))
                .spawn(move || worker_loop(id, receiver, flattener, policy, shutdown))
                .map_err(|source| IngestError::WorkerSpawn { id, source })?;
            workers.push(Worker { id, handle });
        }

        info!(workers = worker_count, ?policy, "Ingest workers started");

        Ok(Self {
            queue,
            workers,
            policy,
            shutdown,
        })
    }

    /// Sender used to submit documents
    pub fn sender(&self) -> WorkSender {
        self.queue.sender()
    }

    /// Shared cancellation flag
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Close the queue, wait for every worker and merge their output.
    ///
    /// Every [`WorkSender`] handed out must be dropped before calling this,
    /// otherwise the workers never see the queue close.
    pub fn finish(self) -> IngestResult<IngestOutcome> {
        let stats = self.queue.stats();
        self.queue.close();

        let mut batches = Vec::new();
        let mut failures = Vec::new();
        let mut panicked = None;

        for worker in self.workers {
            match worker.handle.join() {
                Ok(output) => {
                    batches.extend(output.batches);
                    failures.extend(output.failures);
                }
                Err(_) => {
                    warn!(worker = worker.id, "Ingest worker panicked");
                    panicked.get_or_insert(worker.id);
                }
            }
        }

        if let Some(id) = panicked {
            return Err(IngestError::WorkerPanicked { id });
        }

        failures.sort_by_key(|(seq, _)| *seq);
        if self.policy == ErrorPolicy::Abort && !failures.is_empty() {
            let (_, first) = failures.swap_remove(0);
            return Err(first.error);
        }
        if self.shutdown.load(Ordering::SeqCst) {
            return Err(IngestError::Interrupted);
        }

        batches.sort_by_key(|(seq, _)| *seq);
        let files_ingested = batches.len();
        let mut collection = RecordCollection::new();
        for (_, records) in batches {
            collection.extend_from_file(records);
        }

        info!(
            files = files_ingested,
            records = collection.len(),
            skipped = failures.len(),
            submitted = stats.enqueued(),
            "Ingestion finished"
        );

        Ok(IngestOutcome {
            collection,
            failures: failures.into_iter().map(|(_, f)| f).collect(),
            files_ingested,
        })
    }
}

/// Main worker loop
fn worker_loop(
    id: usize,
    receiver: WorkReceiver,
    flattener: Flattener,
    policy: ErrorPolicy,
    shutdown: Arc<AtomicBool>,
) -> WorkerOutput {
    let mut output = WorkerOutput::default();

    while let Some(task) = receiver.next() {
        if shutdown.load(Ordering::SeqCst) {
            debug!(worker = id, "Shutdown requested, stopping");
            break;
        }

        match ingest_file(&flattener, &task.path) {
            Ok(records) => {
                debug!(worker = id, path = %task.path.display(), records = records.len(), "Parsed");
                output.batches.push((task.seq, records));
            }
            Err(error) => {
                if policy == ErrorPolicy::Abort {
                    shutdown.store(true, Ordering::SeqCst);
                } else {
                    warn!(path = %task.path.display(), %error, "Skipping document");
                }
                output.failures.push((
                    task.seq,
                    FileFailure {
                        path: task.path,
                        error,
                    },
                ));
            }
        }
    }

    output
}

/// Read, parse and flatten one document
pub fn ingest_file(flattener: &Flattener, path: &Path) -> IngestResult<Vec<Record>> {
    let bytes = std::fs::read(path).map_err(|source| IngestError::FileUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let document: Value =
        serde_json::from_slice(&bytes).map_err(|source| IngestError::InvalidJson {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(flattener.flatten(&path.to_string_lossy(), &document))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FlattenPolicy;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    fn start(workers: usize, policy: ErrorPolicy) -> IngestionPool {
        IngestionPool::start(
            workers,
            Flattener::new(FlattenPolicy::Complete),
            policy,
            Arc::new(AtomicBool::new(false)),
        )
        .unwrap()
    }

    #[test]
    fn test_ingest_file() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "a.json", r#"{"id": "x", "n": {"m": 1}}"#);

        let records = ingest_file(&Flattener::default(), &path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].source_file, path.to_string_lossy());
        assert_eq!(records[1].key_path, "n->m");
    }

    #[test]
    fn test_ingest_file_errors() {
        let dir = TempDir::new().unwrap();
        let bad = write(&dir, "bad.json", "{not json");

        let err = ingest_file(&Flattener::default(), &bad).unwrap_err();
        assert!(matches!(err, IngestError::InvalidJson { .. }));

        let err = ingest_file(&Flattener::default(), &dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, IngestError::FileUnreadable { .. }));
    }

    #[test]
    fn test_pool_merges_in_submission_order() {
        let dir = TempDir::new().unwrap();
        let paths: Vec<_> = (0..20)
            .map(|i| write(&dir, &format!("{:02}.json", i), &format!(r#"{{"i": {}}}"#, i)))
            .collect();

        let pool = start(4, ErrorPolicy::Skip);
        let sender = pool.sender();
        for path in &paths {
            sender.submit(path.clone()).unwrap();
        }
        drop(sender);

        let outcome = pool.finish().unwrap();
        assert_eq!(outcome.files_ingested, 20);
        assert!(outcome.failures.is_empty());
        let values: Vec<&str> = outcome.collection.iter().map(|r| r.value_text.as_str()).collect();
        let expected: Vec<String> = (0..20).map(|i| i.to_string()).collect();
        assert_eq!(values, expected.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn test_skip_policy_records_failure() {
        let dir = TempDir::new().unwrap();
        let good = write(&dir, "good.json", r#"{"a": 1}"#);
        let bad = write(&dir, "bad.json", "[1,");

        let pool = start(2, ErrorPolicy::Skip);
        let sender = pool.sender();
        sender.submit(good).unwrap();
        sender.submit(bad.clone()).unwrap();
        drop(sender);

        let outcome = pool.finish().unwrap();
        assert_eq!(outcome.files_ingested, 1);
        assert_eq!(outcome.collection.len(), 1);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].path, bad);
    }

    #[test]
    fn test_abort_policy_fails_run() {
        let dir = TempDir::new().unwrap();
        let bad = write(&dir, "bad.json", "{");

        let pool = start(2, ErrorPolicy::Abort);
        let sender = pool.sender();
        sender.submit(bad).unwrap();
        drop(sender);

        let err = pool.finish().unwrap_err();
        assert!(matches!(err, IngestError::InvalidJson { .. }));
    }

    #[test]
    fn test_shutdown_reports_interrupted() {
        let pool = start(1, ErrorPolicy::Skip);
        pool.shutdown_flag().store(true, Ordering::SeqCst);
        let sender = pool.sender();
        sender.submit("never-read.json".into()).unwrap();
        drop(sender);

        assert!(matches!(pool.finish(), Err(IngestError::Interrupted)));
    }
}
