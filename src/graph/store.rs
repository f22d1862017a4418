//! In-memory directed multigraph keyed by vertex label
//!
//! Uses:
//! - vertices: VertexId -> Vertex (insertion order)
//! - edges: EdgeId -> Edge (insertion order, duplicates kept)
//! - outgoing: VertexId -> Vec<EdgeId> (adjacency list)
//! - label_index: label -> VertexId (O(1) identity lookup)

use super::edge::Edge;
use super::node::Vertex;
use super::types::{EdgeId, EdgeKind, VertexId, VertexKind};
use rustc_hash::FxHashMap;
use thiserror::Error;

/// Errors that can occur during graph operations
#[derive(Error, Debug, PartialEq)]
pub enum GraphError {
    #[error("Vertex '{0}' not found")]
    VertexNotFound(String),

    #[error("Vertex {0} not found")]
    InvalidVertexId(VertexId),
}

pub type GraphResult<T> = Result<T, GraphError>;

/// Directed graph of files and fields
#[derive(Debug, Default, Clone)]
pub struct FieldGraph {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    outgoing: Vec<Vec<EdgeId>>,
    label_index: FxHashMap<String, VertexId>,
}

impl FieldGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a vertex unless its label is already present.
    ///
    /// Returns the id of the new or existing vertex; an existing vertex
    /// keeps its original kind.
    pub fn add_vertex(&mut self, label: &str, kind: VertexKind) -> VertexId {
        if let Some(&id) = self.label_index.get(label) {
            return id;
        }
        let id = VertexId::new(self.vertices.len());
        self.vertices.push(Vertex::new(id, label, kind));
        self.outgoing.push(Vec::new());
        self.label_index.insert(label.to_string(), id);
        id
    }

    pub fn vertex(&self, label: &str) -> Option<&Vertex> {
        self.label_index
            .get(label)
            .map(|id| &self.vertices[id.as_usize()])
    }

    pub fn contains_vertex(&self, label: &str) -> bool {
        self.label_index.contains_key(label)
    }

    /// Add a directed edge between two existing vertices, by label
    pub fn add_edge(
        &mut self,
        source: &str,
        target: &str,
        kind: EdgeKind,
    ) -> GraphResult<EdgeId> {
        let source_id = *self
            .label_index
            .get(source)
            .ok_or_else(|| GraphError::VertexNotFound(source.to_string()))?;
        let target_id = *self
            .label_index
            .get(target)
            .ok_or_else(|| GraphError::VertexNotFound(target.to_string()))?;
        self.add_edge_by_id(source_id, target_id, kind)
    }

    /// Add a directed edge between two existing vertices, by id
    pub fn add_edge_by_id(
        &mut self,
        source: VertexId,
        target: VertexId,
        kind: EdgeKind,
    ) -> GraphResult<EdgeId> {
        if source.as_usize() >= self.vertices.len() {
            return Err(GraphError::InvalidVertexId(source));
        }
        if target.as_usize() >= self.vertices.len() {
            return Err(GraphError::InvalidVertexId(target));
        }

        let id = EdgeId::new(self.edges.len());
        self.edges.push(Edge::new(id, source, target, kind));
        self.outgoing[source.as_usize()].push(id);
        Ok(id)
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Outgoing edges of the vertex with `label`
    pub fn outgoing(&self, label: &str) -> Vec<&Edge> {
        match self.label_index.get(label) {
            Some(id) => self.outgoing[id.as_usize()]
                .iter()
                .map(|e| &self.edges[e.as_usize()])
                .collect(),
            None => Vec::new(),
        }
    }

    /// Labels of an edge's endpoints
    pub fn endpoints(&self, edge: &Edge) -> (&str, &str) {
        (
            self.vertices[edge.source.as_usize()].label.as_str(),
            self.vertices[edge.target.as_usize()].label.as_str(),
        )
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edge_count_of(&self, kind: EdgeKind) -> usize {
        self.edges.iter().filter(|e| e.kind == kind).count()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.edges.is_empty()
    }
}
