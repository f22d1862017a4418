//! Schema-agnostic flattening of parsed JSON documents into records
//!
//! Objects are walked depth-first in document key order. Every terminal
//! value (scalar or whole array) becomes one [`Record`] whose key path is
//! the chain of object keys leading to it.

use super::types::{Record, ValueType, KEY_PATH_SEPARATOR};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// How siblings of a nested object are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FlattenPolicy {
    /// Emit every terminal value in the document
    #[default]
    Complete,

    /// Stop iterating an object once a nested object has been walked.
    ///
    /// The stop propagates to every enclosing object, so keys that follow
    /// the first nested object (at any level above it) produce no records.
    /// Keys that precede it are still emitted.
    Legacy,
}

/// Flattens one parsed document into records
#[derive(Debug, Clone, Copy, Default)]
pub struct Flattener {
    policy: FlattenPolicy,
}

impl Flattener {
    pub fn new(policy: FlattenPolicy) -> Self {
        Flattener { policy }
    }

    pub fn policy(&self) -> FlattenPolicy {
        self.policy
    }

    /// Flatten `document`, tagging each record with `source_file`
    pub fn flatten(&self, source_file: &str, document: &Value) -> Vec<Record> {
        let mut records = Vec::new();
        match document {
            Value::Object(map) => self.walk_object(source_file, "", map, &mut records),
            // A bare scalar or array document is a single terminal at the root
            other => records.push(terminal(source_file, String::new(), other)),
        }
        records
    }

    fn walk_object(
        &self,
        source_file: &str,
        path: &str,
        map: &Map<String, Value>,
        out: &mut Vec<Record>,
    ) {
        for (key, value) in map {
            let key_path = join_key_path(path, key);
            match value {
                Value::Object(child) => {
                    self.walk_object(source_file, &key_path, child, out);
                    if self.policy == FlattenPolicy::Legacy {
                        return;
                    }
                }
                other => out.push(terminal(source_file, key_path, other)),
            }
        }
    }
}

/// Join a parent key path and a child key
pub fn join_key_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}{}{}", parent, KEY_PATH_SEPARATOR, key)
    }
}

fn terminal(source_file: &str, key_path: String, value: &Value) -> Record {
    let (value_type, value_text) = describe(value);
    Record {
        source_file: source_file.to_string(),
        key_path,
        value_type,
        value_text,
    }
}

/// Kind and textual rendering of a terminal value
fn describe(value: &Value) -> (ValueType, String) {
    match value {
        Value::String(s) => (ValueType::String, s.clone()),
        Value::Number(n) => (ValueType::Number, n.to_string()),
        Value::Bool(b) => (ValueType::Boolean, b.to_string()),
        Value::Null => (ValueType::Null, "null".to_string()),
        Value::Array(_) => (ValueType::Array, value.to_string()),
        // Objects are always walked, never described
        Value::Object(_) => (ValueType::Null, value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys(records: &[Record]) -> Vec<&str> {
        records.iter().map(|r| r.key_path.as_str()).collect()
    }

    #[test]
    fn test_flat_document_one_record_per_key() {
        let doc = json!({"name": "Alice", "age": 30, "admin": false, "manager": null});
        let records = Flattener::default().flatten("users.json", &doc);

        assert_eq!(keys(&records), vec!["name", "age", "admin", "manager"]);
        assert_eq!(records[0].value_type, ValueType::String);
        assert_eq!(records[0].value_text, "Alice");
        assert_eq!(records[1].value_type, ValueType::Number);
        assert_eq!(records[1].value_text, "30");
        assert_eq!(records[2].value_type, ValueType::Boolean);
        assert_eq!(records[2].value_text, "false");
        assert_eq!(records[3].value_type, ValueType::Null);
        assert_eq!(records[3].value_text, "null");
        assert!(records.iter().all(|r| r.source_file == "users.json"));
    }

    #[test]
    fn test_complete_policy_keeps_siblings() {
        let doc = json!({"a": {"b": 1, "c": 2}, "d": 3});
        let records = Flattener::new(FlattenPolicy::Complete).flatten("f", &doc);

        assert_eq!(keys(&records), vec!["a->b", "a->c", "d"]);
        assert_eq!(records[2].value_text, "3");
    }

    #[test]
    fn test_legacy_policy_skips_siblings_after_nested_object() {
        let doc = json!({"a": {"b": 1, "c": 2}, "d": 3});
        let records = Flattener::new(FlattenPolicy::Legacy).flatten("f", &doc);

        assert_eq!(keys(&records), vec!["a->b", "a->c"]);
        assert_eq!(records[0].value_text, "1");
        assert_eq!(records[1].value_text, "2");
    }

    #[test]
    fn test_legacy_policy_keeps_preceding_keys_and_stops_ancestors() {
        let doc = json!({
            "first": "kept",
            "outer": {"x": 1, "inner": {"y": 2}, "z": 3},
            "last": "dropped"
        });
        let records = Flattener::new(FlattenPolicy::Legacy).flatten("f", &doc);
        assert_eq!(keys(&records), vec!["first", "outer->x", "outer->inner->y"]);

        let records = Flattener::new(FlattenPolicy::Complete).flatten("f", &doc);
        assert_eq!(
            keys(&records),
            vec!["first", "outer->x", "outer->inner->y", "outer->z", "last"]
        );
    }

    #[test]
    fn test_arrays_are_not_expanded() {
        let doc = json!({"tags": [1, "two", {"three": 3}]});
        let records = Flattener::default().flatten("f", &doc);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key_path, "tags");
        assert_eq!(records[0].value_type, ValueType::Array);
        assert_eq!(records[0].value_text, r#"[1,"two",{"three":3}]"#);
    }

    #[test]
    fn test_empty_object_produces_nothing() {
        assert!(Flattener::default().flatten("f", &json!({})).is_empty());

        let records = Flattener::default().flatten("f", &json!({"a": {}, "b": 1}));
        assert_eq!(keys(&records), vec!["b"]);
    }

    #[test]
    fn test_bare_scalar_document() {
        let records = Flattener::default().flatten("f", &json!("hello"));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key_path, "");
        assert_eq!(records[0].value_type, ValueType::String);
        assert_eq!(records[0].value_text, "hello");
    }

    #[test]
    fn test_join_key_path() {
        assert_eq!(join_key_path("", "a"), "a");
        assert_eq!(join_key_path("a", "b"), "a->b");
        assert_eq!(join_key_path("a->b", "c"), "a->b->c");
    }
}
