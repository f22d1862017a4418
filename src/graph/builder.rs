//! Builds the file/field graph from filtered records
//!
//! Phase 1 adds a containment edge `file -> "<key path>: <value>"` for every
//! record. Phase 2 adds a correlation edge `A -> B` for every ordered pair
//! of records (a record may pair with itself) where A holds a string value
//! equal to B's key path.

use super::store::FieldGraph;
use super::types::{EdgeKind, VertexId, VertexKind};
use crate::record::Record;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

/// How correlation pairs are found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CorrelationStrategy {
    /// Compare every pair of records: O(n²)
    Naive,

    /// Look candidates up in a key-path index; same edges, same order
    #[default]
    Indexed,
}

/// Edge counts produced by a build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub containment_edges: usize,
    pub correlation_edges: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GraphBuilder {
    strategy: CorrelationStrategy,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strategy(mut self, strategy: CorrelationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn strategy(&self) -> CorrelationStrategy {
        self.strategy
    }

    pub fn build(&self, records: &[&Record]) -> (FieldGraph, BuildStats) {
        let mut graph = FieldGraph::new();
        let mut stats = BuildStats::default();

        let field_ids = add_containment(&mut graph, records, &mut stats);

        match self.strategy {
            CorrelationStrategy::Naive => {
                correlate_naive(&mut graph, records, &field_ids, &mut stats)
            }
            CorrelationStrategy::Indexed => {
                correlate_indexed(&mut graph, records, &field_ids, &mut stats)
            }
        }

        info!(
            vertices = graph.vertex_count(),
            containment = stats.containment_edges,
            correlation = stats.correlation_edges,
            strategy = ?self.strategy,
            "Graph built"
        );

        (graph, stats)
    }
}

/// Phase 1; returns the field vertex of each record
fn add_containment(
    graph: &mut FieldGraph,
    records: &[&Record],
    stats: &mut BuildStats,
) -> Vec<VertexId> {
    let mut field_ids = Vec::with_capacity(records.len());
    for record in records {
        let file = graph.add_vertex(&record.source_file, VertexKind::File);
        let field = graph.add_vertex(&record.field_label(), VertexKind::Field);
        link(graph, file, field, EdgeKind::Containment, &mut stats.containment_edges);
        field_ids.push(field);
    }
    field_ids
}

fn correlate_naive(
    graph: &mut FieldGraph,
    records: &[&Record],
    field_ids: &[VertexId],
    stats: &mut BuildStats,
) {
    for (i, a) in records.iter().enumerate() {
        if !a.value_type.is_string() {
            continue;
        }
        for (j, b) in records.iter().enumerate() {
            if a.value_text == b.key_path {
                trace!(source = %a.key_path, target = %b.key_path, "Correlation hit");
                link(
                    graph,
                    field_ids[i],
                    field_ids[j],
                    EdgeKind::Correlation,
                    &mut stats.correlation_edges,
                );
            }
        }
    }
}

fn correlate_indexed(
    graph: &mut FieldGraph,
    records: &[&Record],
    field_ids: &[VertexId],
    stats: &mut BuildStats,
) {
    let mut by_key_path: FxHashMap<&str, Vec<usize>> = FxHashMap::default();
    for (j, record) in records.iter().enumerate() {
        by_key_path.entry(record.key_path.as_str()).or_default().push(j);
    }

    for (i, a) in records.iter().enumerate() {
        if !a.value_type.is_string() {
            continue;
        }
        let Some(targets) = by_key_path.get(a.value_text.as_str()) else {
            continue;
        };
        for &j in targets {
            trace!(source = %a.key_path, target = %records[j].key_path, "Correlation hit");
            link(
                graph,
                field_ids[i],
                field_ids[j],
                EdgeKind::Correlation,
                &mut stats.correlation_edges,
            );
        }
    }
}

fn link(
    graph: &mut FieldGraph,
    source: VertexId,
    target: VertexId,
    kind: EdgeKind,
    counter: &mut usize,
) {
    match graph.add_edge_by_id(source, target, kind) {
        Ok(_) => *counter += 1,
        Err(e) => debug!(error = %e, "Edge skipped"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ValueType;

    fn edges(graph: &FieldGraph) -> Vec<(String, String, EdgeKind)> {
        graph
            .edges()
            .iter()
            .map(|e| {
                let (s, t) = graph.endpoints(e);
                (s.to_string(), t.to_string(), e.kind)
            })
            .collect()
    }

    fn build(records: &[Record], strategy: CorrelationStrategy) -> (FieldGraph, BuildStats) {
        let refs: Vec<&Record> = records.iter().collect();
        GraphBuilder::new().with_strategy(strategy).build(&refs)
    }

    #[test]
    fn test_containment_edges() {
        let records = vec![Record::new("f1", "id", ValueType::Number, "42")];
        let (graph, stats) = build(&records, CorrelationStrategy::Indexed);

        assert!(graph.contains_vertex("f1"));
        assert!(graph.contains_vertex("id: 42"));
        assert_eq!(graph.vertex("f1").unwrap().kind, VertexKind::File);
        assert_eq!(graph.vertex("id: 42").unwrap().kind, VertexKind::Field);
        assert_eq!(
            edges(&graph),
            vec![("f1".into(), "id: 42".into(), EdgeKind::Containment)]
        );
        assert_eq!(stats.containment_edges, 1);
        assert_eq!(stats.correlation_edges, 0);
    }

    #[test]
    fn test_correlation_edge() {
        for strategy in [CorrelationStrategy::Naive, CorrelationStrategy::Indexed] {
            let records = vec![
                Record::new("f1", "ref", ValueType::String, "x"),
                Record::new("f2", "x", ValueType::Number, "7"),
            ];
            let (graph, stats) = build(&records, strategy);

            let correlations: Vec<_> = edges(&graph)
                .into_iter()
                .filter(|(_, _, k)| *k == EdgeKind::Correlation)
                .collect();
            assert_eq!(
                correlations,
                vec![("ref: x".into(), "x: 7".into(), EdgeKind::Correlation)]
            );
            assert_eq!(stats.correlation_edges, 1);
        }
    }

    #[test]
    fn test_no_correlation_from_non_string() {
        let records = vec![
            Record::new("f1", "ref", ValueType::Array, "x"),
            Record::new("f2", "x", ValueType::Number, "7"),
        ];
        let (graph, stats) = build(&records, CorrelationStrategy::Naive);

        assert_eq!(stats.correlation_edges, 0);
        assert_eq!(graph.edge_count_of(EdgeKind::Correlation), 0);
    }

    #[test]
    fn test_self_correlation() {
        let records = vec![Record::new("f1", "loop", ValueType::String, "loop")];
        let (graph, _) = build(&records, CorrelationStrategy::Indexed);

        let correlation = graph
            .edges()
            .iter()
            .find(|e| e.kind == EdgeKind::Correlation)
            .unwrap();
        assert!(correlation.is_self_loop());
    }

    #[test]
    fn test_shared_vertices_and_duplicate_edges() {
        let records = vec![
            Record::new("f1", "a", ValueType::String, "b"),
            Record::new("f2", "a", ValueType::String, "b"),
            Record::new("f1", "b", ValueType::Number, "1"),
        ];
        let (graph, stats) = build(&records, CorrelationStrategy::Indexed);

        // f1, f2, "a: b", "b: 1"
        assert_eq!(graph.vertex_count(), 4);
        assert_eq!(stats.containment_edges, 3);
        // each "a: b" record correlates with "b: 1"; duplicates are kept
        assert_eq!(stats.correlation_edges, 2);
        assert_eq!(graph.outgoing("a: b").len(), 2);
    }

    #[test]
    fn test_strategies_agree() {
        let records = vec![
            Record::new("f1", "owner", ValueType::String, "user->id"),
            Record::new("f1", "user->id", ValueType::String, "owner"),
            Record::new("f2", "user->id", ValueType::Number, "3"),
            Record::new("f2", "name", ValueType::String, "name"),
            Record::new("f3", "owner", ValueType::String, "name"),
            Record::new("f3", "ghost", ValueType::String, "nowhere"),
        ];
        let (naive, naive_stats) = build(&records, CorrelationStrategy::Naive);
        let (indexed, indexed_stats) = build(&records, CorrelationStrategy::Indexed);

        assert_eq!(edges(&naive), edges(&indexed));
        assert_eq!(naive_stats, indexed_stats);
    }

    #[test]
    fn test_empty_input() {
        let (graph, stats) = build(&[], CorrelationStrategy::Indexed);
        assert!(graph.is_empty());
        assert_eq!(stats, BuildStats::default());
    }
}
