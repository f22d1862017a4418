//! Graph vertices

use super::types::{VertexId, VertexKind};
use serde::{Deserialize, Serialize};

/// A vertex, identified by its label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vertex {
    pub id: VertexId,

    /// Identity of the vertex: a file path or a field label
    pub label: String,

    /// Fixed by the first insertion of the label
    pub kind: VertexKind,
}

impl Vertex {
    pub fn new(id: VertexId, label: impl Into<String>, kind: VertexKind) -> Self {
        Vertex {
            id,
            label: label.into(),
            kind,
        }
    }
}
