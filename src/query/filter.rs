//! Case-insensitive substring filter over records

use crate::config::ConfigError;
use crate::record::Record;

/// Selects records whose file, key path or value contains the query
#[derive(Debug, Clone)]
pub struct QueryFilter {
    query: String,
    needle: String,
}

impl QueryFilter {
    /// Build a filter; only the empty query is rejected
    pub fn new(query: impl Into<String>) -> Result<Self, ConfigError> {
        let query = query.into();
        if query.is_empty() {
            return Err(ConfigError::EmptyQuery);
        }
        let needle = query.to_lowercase();
        Ok(Self { query, needle })
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn matches(&self, record: &Record) -> bool {
        contains_folded(&record.source_file, &self.needle)
            || contains_folded(&record.key_path, &self.needle)
            || contains_folded(&record.value_text, &self.needle)
    }

    /// Matching records in input order
    pub fn apply<'a>(&self, records: &'a [Record]) -> Vec<&'a Record> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}
