//! File/field graph
//!
//! Vertices are source files and field labels (`"<key path>: <value>"`),
//! identified by their label. Edges are directed and may repeat:
//! - containment: file -> field found in it
//! - correlation: field -> field whose key path equals the source's value

pub mod builder;
pub mod edge;
pub mod node;
pub mod store;
pub mod types;

pub use builder::{BuildStats, CorrelationStrategy, GraphBuilder};
pub use edge::Edge;
pub use node::Vertex;
pub use store::{FieldGraph, GraphError, GraphResult};
pub use types::{EdgeId, EdgeKind, VertexId, VertexKind};
