//! Core type definitions for flattened field records

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Separator placed between object keys in a key path
pub const KEY_PATH_SEPARATOR: &str = "->";

/// Dynamic kind of a flattened JSON value
///
/// Arrays are never expanded element-wise, so they carry their own kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub enum ValueType {
    String,
    Number,
    Boolean,
    Null,
    Array,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Number => "number",
            ValueType::Boolean => "boolean",
            ValueType::Null => "null",
            ValueType::Array => "array",
        }
    }

    /// Only string values take part in correlation
    pub fn is_string(&self) -> bool {
        matches!(self, ValueType::String)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One flattened terminal field extracted from one JSON document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    /// Identifier of the originating document (its path)
    pub source_file: String,

    /// Arrow-joined object keys from the document root
    pub key_path: String,

    /// Kind of the value at this path
    pub value_type: ValueType,

    /// The value rendered as text
    pub value_text: String,
}

impl Record {
    pub fn new(
        source_file: impl Into<String>,
        key_path: impl Into<String>,
        value_type: ValueType,
        value_text: impl Into<String>,
    ) -> Self {
        Record {
            source_file: source_file.into(),
            key_path: key_path.into(),
            value_type,
            value_text: value_text.into(),
        }
    }

    /// Display label used as the identity of this field's graph vertex
    pub fn field_label(&self) -> String {
        format!("{}: {}", self.key_path, self.value_text)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.source_file,
            self.value_type,
            self.field_label()
        )
    }
}

/// The full set of records produced by one run
///
/// Populated once (by ingestion or a cache load) and read-only afterwards.
/// Records are only ever appended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordCollection {
    records: Vec<Record>,
}

impl RecordCollection {
    pub fn new() -> Self {
        RecordCollection {
            records: Vec::new(),
        }
    }

    pub fn from_records(records: Vec<Record>) -> Self {
        RecordCollection { records }
    }

    /// Append all records flattened from one file, keeping their order
    pub fn extend_from_file(&mut self, records: impl IntoIterator<Item = Record>) {
        self.records.extend(records);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn as_slice(&self) -> &[Record] {
        &self.records
    }

    /// Number of distinct source files represented
    pub fn file_count(&self) -> usize {
        self.records
            .iter()
            .map(|r| r.source_file.as_str())
            .collect::<HashSet<_>>()
            .len()
    }
}

impl<'a> IntoIterator for &'a RecordCollection {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl From<Vec<Record>> for RecordCollection {
    fn from(records: Vec<Record>) -> Self {
        RecordCollection::from_records(records)
    }
}
