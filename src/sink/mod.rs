//! Graph description output
//!
//! Supports:
//! - Graphviz DOT (.gv)
//! - JSON (vertices and edges arrays)

pub mod dot;
pub mod json;

pub use dot::DotSink;
pub use json::JsonSink;

use crate::graph::FieldGraph;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Graph description format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Graphviz DOT
    #[default]
    Dot,
    /// JSON document
    Json,
}

impl OutputFormat {
    pub fn sink(&self) -> Box<dyn GraphSink> {
        match self {
            OutputFormat::Dot => Box::new(DotSink::new()),
            OutputFormat::Json => Box::new(JsonSink::new()),
        }
    }
}

/// Sink errors
#[derive(Error, Debug)]
pub enum SinkError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SinkResult<T> = Result<T, SinkError>;

/// Renders a graph into one artifact containing every vertex and edge
pub trait GraphSink {
    fn render(&self, graph: &FieldGraph, out: &mut dyn Write) -> SinkResult<()>;

    /// Render into a file, replacing it
    fn render_to_path(&self, graph: &FieldGraph, path: &Path) -> SinkResult<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.render(graph, &mut writer)?;
        writer.flush()?;
        info!(
            path = %path.display(),
            vertices = graph.vertex_count(),
            edges = graph.edge_count(),
            "Graph written"
        );
        Ok(())
    }
}
