//! JSON graph description

use super::{GraphSink, SinkResult};
use crate::graph::{EdgeKind, FieldGraph, VertexKind};
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct GraphDocument<'a> {
    vertices: Vec<VertexEntry<'a>>,
    edges: Vec<EdgeEntry<'a>>,
}

#[derive(Serialize)]
struct VertexEntry<'a> {
    id: usize,
    label: &'a str,
    kind: VertexKind,
}

#[derive(Serialize)]
struct EdgeEntry<'a> {
    source: &'a str,
    target: &'a str,
    kind: EdgeKind,
}

/// Writes `{"vertices": [...], "edges": [...]}`
#[derive(Debug, Clone)]
pub struct JsonSink {
    pretty: bool,
}

impl JsonSink {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn compact() -> Self {
        Self { pretty: false }
    }
}

impl Default for JsonSink {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphSink for JsonSink {
    fn render(&self, graph: &FieldGraph, out: &mut dyn Write) -> SinkResult<()> {
        let document = GraphDocument {
            vertices: graph
                .vertices()
                .iter()
                .map(|v| VertexEntry {
                    id: v.id.as_usize(),
                    label: &v.label,
                    kind: v.kind,
                })
                .collect(),
            edges: graph
                .edges()
                .iter()
                .map(|e| {
                    let (source, target) = graph.endpoints(e);
                    EdgeEntry {
                        source,
                        target,
                        kind: e.kind,
                    }
                })
                .collect(),
        };

        if self.pretty {
            serde_json::to_writer_pretty(&mut *out, &document)?;
        } else {
            serde_json::to_writer(&mut *out, &document)?;
        }
        writeln!(out)?;
        Ok(())
    }
}
