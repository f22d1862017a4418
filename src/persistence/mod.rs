//! Persistence layer
//!
//! The record collection can be snapshotted to a single binary file and
//! loaded back instead of walking and parsing the document tree again.

pub mod cache;

pub use cache::{
    CacheError, CacheResult, CacheStore, SnapshotInfo, SNAPSHOT_MAGIC, SNAPSHOT_VERSION,
};
