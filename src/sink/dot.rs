//! Graphviz DOT output

use super::{GraphSink, SinkResult};
use crate::graph::{EdgeKind, FieldGraph, VertexKind};
use std::io::Write;

/// Writes a `digraph` with file vertices as boxes and correlation
/// edges dashed
#[derive(Debug, Clone)]
pub struct DotSink {
    name: String,
}

impl DotSink {
    pub fn new() -> Self {
        Self {
            name: "fieldgraph".to_string(),
        }
    }
}

impl Default for DotSink {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphSink for DotSink {
    fn render(&self, graph: &FieldGraph, out: &mut dyn Write) -> SinkResult<()> {
        writeln!(out, "digraph \"{}\" {{", escape(&self.name))?;
        writeln!(out, "  rankdir=LR;")?;
        writeln!(out, "  node [shape=ellipse, fontname=\"Helvetica\", fontsize=10];")?;

        for vertex in graph.vertices() {
            match vertex.kind {
                VertexKind::File => writeln!(out, "  \"{}\" [shape=box];", escape(&vertex.label))?,
                VertexKind::Field => writeln!(out, "  \"{}\";", escape(&vertex.label))?,
            }
        }

        for edge in graph.edges() {
            let (source, target) = graph.endpoints(edge);
            match edge.kind {
                EdgeKind::Containment => {
                    writeln!(out, "  \"{}\" -> \"{}\";", escape(source), escape(target))?
                }
                EdgeKind::Correlation => writeln!(
                    out,
                    "  \"{}\" -> \"{}\" [style=dashed];",
                    escape(source),
                    escape(target)
                )?,
            }
        }

        writeln!(out, "}}")?;
        Ok(())
    }
}

/// Escape a string for use inside a quoted DOT identifier
fn escape(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            other => escaped.push(other),
        }
    }
    escaped
}
