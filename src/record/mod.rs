//! Flattened field records
//!
//! - Record model: one (file, key path, type, value) tuple per terminal
//! - Record collection: the append-only set of records for a run
//! - Flattener: turns a parsed JSON document into records

pub mod flatten;
pub mod types;

pub use flatten::{join_key_path, FlattenPolicy, Flattener};
pub use types::{Record, RecordCollection, ValueType, KEY_PATH_SEPARATOR};
