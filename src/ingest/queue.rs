//! Work queue shared by the directory walker and the ingest workers
//!
//! The queue is unbounded, so submission never blocks. It is closed by
//! dropping every [`WorkSender`]; workers drain what is left and exit.

use crossbeam_channel::{unbounded, Receiver, Sender};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A document waiting to be ingested
#[derive(Debug, Clone)]
pub struct FileTask {
    /// Submission order, used to merge worker output deterministically
    pub seq: u64,

    /// Path of the JSON document
    pub path: PathBuf,
}

/// Statistics for the work queue
#[derive(Debug, Default)]
pub struct QueueStats {
    /// Total tasks enqueued
    pub enqueued: AtomicU64,

    /// Total tasks taken by workers
    pub dequeued: AtomicU64,
}

impl QueueStats {
    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    pub fn dequeued(&self) -> u64 {
        self.dequeued.load(Ordering::Relaxed)
    }

    /// Tasks submitted but not yet taken
    pub fn pending(&self) -> u64 {
        self.enqueued().saturating_sub(self.dequeued())
    }
}

/// Unbounded queue of file tasks
pub struct WorkQueue {
    sender: Sender<FileTask>,
    receiver: Receiver<FileTask>,
    stats: Arc<QueueStats>,
    next_seq: Arc<AtomicU64>,
}

impl WorkQueue {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            sender,
            receiver,
            stats: Arc::new(QueueStats::default()),
            next_seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Get a sender for this queue
    pub fn sender(&self) -> WorkSender {
        WorkSender {
            sender: self.sender.clone(),
            stats: Arc::clone(&self.stats),
            next_seq: Arc::clone(&self.next_seq),
        }
    }

    /// Get a receiver for this queue (clone for each worker)
    pub fn receiver(&self) -> WorkReceiver {
        WorkReceiver {
            receiver: self.receiver.clone(),
            stats: Arc::clone(&self.stats),
        }
    }

    pub fn stats(&self) -> Arc<QueueStats> {
        Arc::clone(&self.stats)
    }

    /// Drop the queue's own endpoints.
    ///
    /// The queue is fully closed once every outstanding [`WorkSender`] has
    /// been dropped as well.
    pub fn close(self) {
        drop(self.sender);
        drop(self.receiver);
    }
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Error returned when every worker has gone away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueClosed;

/// Submitting side of the queue
#[derive(Clone)]
pub struct WorkSender {
    sender: Sender<FileTask>,
    stats: Arc<QueueStats>,
    next_seq: Arc<AtomicU64>,
}

impl WorkSender {
    /// Enqueue a document, returning its sequence number.
    ///
    /// Only successful submissions count as enqueued.
    pub fn submit(&self, path: PathBuf) -> Result<u64, QueueClosed> {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        self.sender
            .send(FileTask { seq, path })
            .map_err(|_| QueueClosed)?;
        self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
        Ok(seq)
    }
}

/// Receiving side of the queue
#[derive(Clone)]
pub struct WorkReceiver {
    receiver: Receiver<FileTask>,
    stats: Arc<QueueStats>,
}

impl WorkReceiver {
    /// Block until a task is available; `None` once the queue is closed and drained
    pub fn next(&self) -> Option<FileTask> {
        let task = self.receiver.recv().ok()?;
        self.stats.dequeued.fetch_add(1, Ordering::Relaxed);
        Some(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_assigns_sequence() {
        let queue = WorkQueue::new();
        let sender = queue.sender();
        let receiver = queue.receiver();

        assert_eq!(sender.submit("a.json".into()), Ok(0));
        assert_eq!(sender.submit("b.json".into()), Ok(1));
        assert_eq!(queue.stats().pending(), 2);

        let task = receiver.next().unwrap();
        assert_eq!(task.seq, 0);
        assert_eq!(task.path, PathBuf::from("a.json"));
        assert_eq!(queue.stats().dequeued(), 1);
    }

    #[test]
    fn test_closed_queue_drains_then_ends() {
        let queue = WorkQueue::new();
        let sender = queue.sender();
        let receiver = queue.receiver();
        queue.close();

        sender.submit("a.json".into()).unwrap();
        drop(sender);

        assert!(receiver.next().is_some());
        assert!(receiver.next().is_none());
    }

    #[test]
    fn test_submit_fails_without_receivers() {
        let queue = WorkQueue::new();
        let stats = queue.stats();
        let sender = queue.sender();
        queue.close();

        assert_eq!(sender.submit("a.json".into()), Err(QueueClosed));
        assert_eq!(stats.enqueued(), 0);
        assert_eq!(stats.pending(), 0);
    }
}
