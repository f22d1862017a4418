//! Directed graph edges
//!
//! Parallel edges between the same pair of vertices are allowed.

use super::types::{EdgeId, EdgeKind, VertexId};
use serde::{Deserialize, Serialize};

/// A directed edge between two vertices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,

    /// Edge goes FROM this vertex
    pub source: VertexId,

    /// Edge goes TO this vertex
    pub target: VertexId,

    pub kind: EdgeKind,
}

impl Edge {
    pub fn new(id: EdgeId, source: VertexId, target: VertexId, kind: EdgeKind) -> Self {
        Edge {
            id,
            source,
            target,
            kind,
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}
