//! fieldgraph
//!
//! Flattens a tree of JSON documents into (file, key path, type, value)
//! records, filters them with a free-text query, and builds a directed
//! graph linking files to their fields and fields to each other whenever
//! one field's string value names another field's key path.
//!
//! # Architecture
//!
//! ```text
//!   root/<dir>/*.json ──► DirectoryWalker ──► WorkQueue ──► IngestionPool
//!                                                              │ Flattener
//!                                                              ▼
//!                         CacheStore  ◄──── save ──── RecordCollection
//!                             │                             ▲
//!                             └──────── load (cached) ──────┘
//!                                                           │
//!                                        QueryFilter ◄──────┘
//!                                             │
//!                                        GraphBuilder ──► GraphSink (DOT / JSON)
//! ```
//!
//! ## Example Usage
//!
//! ```rust
//! use fieldgraph::graph::{GraphBuilder, VertexKind};
//! use fieldgraph::query::QueryFilter;
//! use fieldgraph::record::{Flattener, RecordCollection};
//! use serde_json::json;
//!
//! let doc = json!({"id": "u1", "owner": "id"});
//! let records = Flattener::default().flatten("users.json", &doc);
//! let collection = RecordCollection::from_records(records);
//!
//! let filter = QueryFilter::new("users").unwrap();
//! let matched = filter.apply(collection.as_slice());
//!
//! let (graph, stats) = GraphBuilder::new().build(&matched);
//! assert_eq!(graph.vertex("users.json").unwrap().kind, VertexKind::File);
//! assert_eq!(stats.containment_edges, 2);
//! // "owner: id" -> "id: u1"
//! assert_eq!(stats.correlation_edges, 1);
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod graph;
pub mod ingest;
pub mod persistence;
pub mod pipeline;
pub mod query;
pub mod record;
pub mod sink;

// Re-export main types for convenience
pub use config::{ConfigError, PipelineConfig};

pub use graph::{
    BuildStats, CorrelationStrategy, Edge, EdgeKind, FieldGraph, GraphBuilder, GraphError,
    GraphResult, Vertex, VertexKind,
};

pub use ingest::{DirectoryWalker, ErrorPolicy, FileFailure, IngestError, IngestionPool};

pub use persistence::{CacheError, CacheStore, SnapshotInfo};

pub use pipeline::{Pipeline, PipelineError, PipelineResult, RecordSource, RunReport};

pub use query::QueryFilter;

pub use record::{FlattenPolicy, Flattener, Record, RecordCollection, ValueType};

pub use sink::{DotSink, GraphSink, JsonSink, OutputFormat, SinkError};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
