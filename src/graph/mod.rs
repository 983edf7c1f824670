//! Weighted similarity graph and its mutation operations

use std::collections::HashMap;

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

/// Provenance of a sequence node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Member of the external reference set
    Reference,
    /// Member of the curated catalog
    Catalog,
}

/// Attributes carried by every node in the network
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    pub id: String,
    pub kind: NodeKind,
    /// Whether alignment computation has run for this node
    pub alignments_made: bool,
    /// Seed node this node was last claimed by, if any
    pub cluster_group: Option<String>,
}

/// Weighted undirected similarity network for one enzyme category.
///
/// Node identifiers are unique sequence names; edge weights are pairwise
/// alignment scores. Every edge's endpoints exist as nodes.
#[derive(Debug, Clone, Default)]
pub struct SsnGraph {
    graph: UnGraph<NodeData, f32>,
    index: HashMap<String, NodeIndex>,
}

impl SsnGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&NodeData> {
        self.index.get(id).map(|&idx| &self.graph[idx])
    }

    /// Insert a node if absent, returning whether a new node was created.
    ///
    /// Re-adding an existing node is a no-op except that `alignments_made`
    /// is upgraded monotonically from false to true.
    pub fn add_node(&mut self, id: &str, kind: NodeKind, alignments_made: bool) -> bool {
        if let Some(&idx) = self.index.get(id) {
            if alignments_made {
                self.graph[idx].alignments_made = true;
            }
            return false;
        }

        let idx = self.graph.add_node(NodeData {
            id: id.to_string(),
            kind,
            alignments_made,
            cluster_group: None,
        });
        self.index.insert(id.to_string(), idx);
        true
    }

    /// Insert or overwrite the alignment edge between two nodes.
    ///
    /// Self-loops, non-positive scores and edges naming an unknown endpoint
    /// are alignment noise and are dropped without escalating.
    pub fn add_edge(&mut self, a: &str, b: &str, weight: f32) {
        if a == b {
            return;
        }
        if weight <= 0.0 {
            log::debug!("Dropping non-positive alignment {} - {} ({})", a, b, weight);
            return;
        }
        let (Some(&ia), Some(&ib)) = (self.index.get(a), self.index.get(b)) else {
            log::debug!("Dropping alignment {} - {} with unknown endpoint", a, b);
            return;
        };
        self.graph.update_edge(ia, ib, weight);
    }

    pub fn remove_node(&mut self, id: &str) {
        if let Some(idx) = self.index.remove(id) {
            self.graph.remove_node(idx);
            // petgraph swaps the last node into the freed slot
            if let Some(moved) = self.graph.node_weight(idx) {
                self.index.insert(moved.id.clone(), idx);
            }
        }
    }

    pub fn set_cluster_group(&mut self, id: &str, seed: &str) {
        if let Some(&idx) = self.index.get(id) {
            self.graph[idx].cluster_group = Some(seed.to_string());
        }
    }

    /// Node identifiers in sorted order, for deterministic iteration
    pub fn node_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.index.keys().cloned().collect();
        ids.sort_unstable();
        ids
    }

    /// Present nodes whose alignments have not been computed yet, capped
    pub fn nodes_needing_alignment(&self, max_num: usize) -> Vec<String> {
        self.node_ids()
            .into_iter()
            .filter(|id| self.node(id).is_some_and(|n| !n.alignments_made))
            .take(max_num)
            .collect()
    }

    /// Edges as `(a, b, weight)` with `a < b`, sorted for determinism
    pub fn edge_triples(&self) -> Vec<(String, String, f32)> {
        let mut edges: Vec<(String, String, f32)> = self
            .graph
            .edge_references()
            .map(|e| {
                let a = self.graph[e.source()].id.as_str();
                let b = self.graph[e.target()].id.as_str();
                let (a, b) = if a <= b { (a, b) } else { (b, a) };
                (a.to_string(), b.to_string(), *e.weight())
            })
            .collect();
        edges.sort_by(|x, y| (&x.0, &x.1).cmp(&(&y.0, &y.1)));
        edges
    }

    pub fn weight(&self, a: &str, b: &str) -> Option<f32> {
        let (&ia, &ib) = (self.index.get(a)?, self.index.get(b)?);
        self.graph
            .find_edge(ia, ib)
            .and_then(|e| self.graph.edge_weight(e))
            .copied()
    }

    /// Neighbor identifiers of a node, sorted
    pub fn neighbors(&self, id: &str) -> Vec<String> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };
        let mut out: Vec<String> = self
            .graph
            .neighbors(idx)
            .map(|n| self.graph[n].id.clone())
            .collect();
        out.sort_unstable();
        out
    }

    /// View containing only edges with `weight >= min_weight` and their
    /// endpoints. Nodes with no qualifying edge are dropped from the view.
    pub fn filtered_subgraph(&self, min_weight: f32) -> Self {
        let mut sub = Self::new();
        for edge in self.graph.edge_references() {
            let w = *edge.weight();
            if w < min_weight {
                continue;
            }
            sub.insert_data(self.graph[edge.source()].clone());
            sub.insert_data(self.graph[edge.target()].clone());
            sub.add_edge(
                &self.graph[edge.source()].id,
                &self.graph[edge.target()].id,
                w,
            );
        }
        sub
    }

    /// Subgraph induced by a set of member identifiers
    pub fn induced_subgraph(&self, members: &[String]) -> Self {
        let mut sub = Self::new();
        for id in members {
            if let Some(data) = self.node(id) {
                sub.insert_data(data.clone());
            }
        }
        for (a, b, w) in self.edge_triples() {
            if sub.contains(&a) && sub.contains(&b) {
                sub.add_edge(&a, &b, w);
            }
        }
        sub
    }

    fn insert_data(&mut self, data: NodeData) {
        if self.contains(&data.id) {
            return;
        }
        let id = data.id.clone();
        let idx = self.graph.add_node(data);
        self.index.insert(id, idx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(graph: &mut SsnGraph, id: &str) {
        graph.add_node(id, NodeKind::Catalog, false);
    }

    #[test]
    fn node_insertion_is_idempotent() {
        let mut graph = SsnGraph::new();
        assert!(graph.add_node("seq1", NodeKind::Catalog, false));
        assert!(!graph.add_node("seq1", NodeKind::Catalog, true));
        assert!(!graph.add_node("seq1", NodeKind::Catalog, false));

        assert_eq!(graph.node_count(), 1);
        // upgrade is monotonic: the later false does not revert it
        assert!(graph.node("seq1").unwrap().alignments_made);
    }

    #[test]
    fn alignments_made_upgrade_is_order_independent() {
        let mut a = SsnGraph::new();
        a.add_node("x", NodeKind::Reference, false);
        a.add_node("x", NodeKind::Reference, true);

        let mut b = SsnGraph::new();
        b.add_node("x", NodeKind::Reference, true);
        b.add_node("x", NodeKind::Reference, false);

        assert!(a.node("x").unwrap().alignments_made);
        assert!(b.node("x").unwrap().alignments_made);
    }

    #[test]
    fn self_edges_are_dropped() {
        let mut graph = SsnGraph::new();
        catalog(&mut graph, "a");
        graph.add_edge("a", "a", 120.0);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn malformed_edges_are_dropped() {
        let mut graph = SsnGraph::new();
        catalog(&mut graph, "a");
        catalog(&mut graph, "b");
        graph.add_edge("a", "b", 0.0);
        graph.add_edge("a", "b", -3.0);
        graph.add_edge("a", "ghost", 50.0);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn duplicate_edge_overwrites_weight() {
        let mut graph = SsnGraph::new();
        catalog(&mut graph, "a");
        catalog(&mut graph, "b");
        graph.add_edge("a", "b", 100.0);
        graph.add_edge("b", "a", 250.0);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.weight("a", "b"), Some(250.0));
    }

    #[test]
    fn filtered_subgraph_drops_isolated_endpoints() {
        let mut graph = SsnGraph::new();
        for id in ["a", "b", "c"] {
            catalog(&mut graph, id);
        }
        graph.add_edge("a", "b", 300.0);
        graph.add_edge("b", "c", 100.0);

        let sub = graph.filtered_subgraph(200.0);
        assert!(sub.contains("a"));
        assert!(sub.contains("b"));
        assert!(!sub.contains("c"));
        assert_eq!(sub.edge_count(), 1);
    }

    #[test]
    fn remove_node_keeps_index_consistent() {
        let mut graph = SsnGraph::new();
        for id in ["a", "b", "c", "d"] {
            catalog(&mut graph, id);
        }
        graph.add_edge("c", "d", 42.0);
        graph.remove_node("a");

        assert!(!graph.contains("a"));
        for id in ["b", "c", "d"] {
            assert_eq!(graph.node(id).unwrap().id, id);
        }
        assert_eq!(graph.weight("c", "d"), Some(42.0));
    }

    #[test]
    fn nodes_needing_alignment_is_capped_and_sorted() {
        let mut graph = SsnGraph::new();
        graph.add_node("c", NodeKind::Catalog, false);
        graph.add_node("a", NodeKind::Catalog, false);
        graph.add_node("b", NodeKind::Catalog, true);
        graph.add_node("d", NodeKind::Catalog, false);

        assert_eq!(graph.nodes_needing_alignment(2), vec!["a", "c"]);
    }
}
