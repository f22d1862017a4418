//! Binary snapshot of a record collection
//!
//! File layout:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ header (bincode, fixed size)                 │
//! │   magic "FGCACHE\0" | version | created_at   │
//! │   record_count | sha256(payload)             │
//! ├──────────────────────────────────────────────┤
//! │ payload: gzip(bincode(Vec<Record>))          │
//! └──────────────────────────────────────────────┘
//! ```

use crate::record::{Record, RecordCollection};
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Leading bytes of every snapshot
pub const SNAPSHOT_MAGIC: [u8; 8] = *b"FGCACHE\0";

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Cache errors
#[derive(Error, Debug)]
pub enum CacheError {
    /// No snapshot at the configured path
    #[error("Cache snapshot not found at '{}'", .0.display())]
    Missing(PathBuf),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// The file is not a snapshot
    #[error("'{}' is not a cache snapshot", .0.display())]
    NotASnapshot(PathBuf),

    /// Snapshot written by an incompatible version
    #[error("Unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    /// Payload does not match its header
    #[error("Corrupt cache snapshot: {0}")]
    Corrupt(String),
}

pub type CacheResult<T> = Result<T, CacheError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SnapshotHeader {
    magic: [u8; 8],
    version: u32,
    /// Unix milliseconds
    created_at: i64,
    record_count: u64,
    checksum: [u8; 32],
}

/// Summary of a written or loaded snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotInfo {
    pub path: PathBuf,
    pub records: usize,
    /// Compressed payload size in bytes
    pub payload_bytes: usize,
    /// Unix milliseconds
    pub created_at: i64,
}

impl SnapshotInfo {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.created_at)
    }
}

/// Reads and writes the record collection snapshot
#[derive(Debug, Clone)]
pub struct CacheStore {
    path: PathBuf,
}

impl CacheStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Write `collection`, replacing any previous snapshot.
    ///
    /// The snapshot is written beside the target and renamed into place.
    pub fn save(&self, collection: &RecordCollection) -> CacheResult<SnapshotInfo> {
        info!(path = %self.path.display(), records = collection.len(), "Writing cache");

        let payload = encode_payload(collection.as_slice())?;
        let header = SnapshotHeader {
            magic: SNAPSHOT_MAGIC,
            version: SNAPSHOT_VERSION,
            created_at: Utc::now().timestamp_millis(),
            record_count: collection.len() as u64,
            checksum: Sha256::digest(&payload).into(),
        };

        let tmp_path = self.tmp_path();
        let written = write_snapshot(&tmp_path, &header, &payload)
            .and_then(|()| std::fs::rename(&tmp_path, &self.path).map_err(CacheError::from));
        if let Err(e) = written {
            if let Err(cleanup) = std::fs::remove_file(&tmp_path) {
                debug!(
                    path = %tmp_path.display(),
                    error = %cleanup,
                    "Temporary snapshot not removed"
                );
            }
            return Err(e);
        }

        debug!(payload_bytes = payload.len(), "Cache written");

        Ok(SnapshotInfo {
            path: self.path.clone(),
            records: collection.len(),
            payload_bytes: payload.len(),
            created_at: header.created_at,
        })
    }

    /// Load the snapshot
    pub fn load(&self) -> CacheResult<RecordCollection> {
        self.load_with_info().map(|(collection, _)| collection)
    }

    /// Load the snapshot together with its header summary
    pub fn load_with_info(&self) -> CacheResult<(RecordCollection, SnapshotInfo)> {
        info!(path = %self.path.display(), "Reading cache");

        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(CacheError::Missing(self.path.clone()))
            }
            Err(e) => return Err(e.into()),
        };
        let mut reader = BufReader::new(file);

        let header: SnapshotHeader = bincode::deserialize_from(&mut reader)
            .map_err(|_| CacheError::NotASnapshot(self.path.clone()))?;
        if header.magic != SNAPSHOT_MAGIC {
            return Err(CacheError::NotASnapshot(self.path.clone()));
        }
        if header.version != SNAPSHOT_VERSION {
            return Err(CacheError::UnsupportedVersion {
                found: header.version,
                expected: SNAPSHOT_VERSION,
            });
        }

        let mut payload = Vec::new();
        reader.read_to_end(&mut payload)?;
        let checksum: [u8; 32] = Sha256::digest(&payload).into();
        if checksum != header.checksum {
            return Err(CacheError::Corrupt("payload checksum mismatch".into()));
        }

        let records = decode_payload(&payload)?;
        if records.len() as u64 != header.record_count {
            return Err(CacheError::Corrupt(format!(
                "header declares {} records, payload holds {}",
                header.record_count,
                records.len()
            )));
        }

        info!(records = records.len(), "Cache loaded");

        let info = SnapshotInfo {
            path: self.path.clone(),
            records: records.len(),
            payload_bytes: payload.len(),
            created_at: header.created_at,
        };
        Ok((RecordCollection::from_records(records), info))
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn write_snapshot(path: &Path, header: &SnapshotHeader, payload: &[u8]) -> CacheResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    bincode::serialize_into(&mut writer, header)?;
    writer.write_all(payload)?;
    writer.flush()?;
    Ok(())
}

fn encode_payload(records: &[Record]) -> CacheResult<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    bincode::serialize_into(&mut encoder, records)?;
    Ok(encoder.finish()?)
}

fn decode_payload(payload: &[u8]) -> CacheResult<Vec<Record>> {
    let decoder = GzDecoder::new(payload);
    Ok(bincode::deserialize_from(decoder)?)
}
