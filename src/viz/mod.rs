//! Rendering of cluster sets into presentation-ready node and edge records

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::cluster::grouping::resolve_groups;
use crate::cluster::sweep::threshold_sweep;
use crate::color::{assign_group_colors, Color, ColorGen};
use crate::config::Config;
use crate::graph::{NodeData, NodeKind, SsnGraph};
use crate::layout::{cluster_layout, PackingCursor, Point};

const NODE_SIZE: f32 = 40.0;
const NODE_SHAPE: &str = "dot";
const EDGE_WIDTH: f32 = 0.4;
const EDGE_COLOR: &str = "darkgrey";
const EDGE_OPACITY: f32 = 0.5;
const REFERENCE_BORDER: &str = "black";
const REFERENCE_BORDER_WIDTH: f32 = 1.0;
const CATALOG_BORDER: &str = "darkred";
const CATALOG_BORDER_WIDTH: f32 = 2.0;
const BORDER_WIDTH_SELECTED: f32 = 3.0;
const DEFAULT_FILL: &str = "rgba(5, 5, 168, 0.95)";

/// Lookup metadata used to title nodes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeMeta {
    #[serde(default)]
    pub protein_name: Option<String>,
    #[serde(default)]
    pub tax: Option<String>,
}

/// Node fill: a resolved group color, or the default css fill
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Fill {
    Rgb(Color),
    Css(&'static str),
}

#[derive(Debug, Clone, Serialize)]
pub struct Highlight {
    pub border: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct VisNodeColor {
    pub background: Fill,
    pub border: &'static str,
    pub highlight: Highlight,
}

/// One renderable node
#[derive(Debug, Clone, Serialize)]
pub struct VisNode {
    pub id: String,
    pub size: f32,
    #[serde(rename = "borderWidth")]
    pub border_width: f32,
    #[serde(rename = "borderWidthSelected")]
    pub border_width_selected: f32,
    pub color: VisNodeColor,
    pub title: String,
    pub shape: &'static str,
    pub node_type: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<NodeMeta>,
    pub x: f32,
    pub y: f32,
}

/// One renderable edge
#[derive(Debug, Clone, Serialize)]
pub struct VisEdge {
    pub id: String,
    pub from: String,
    pub to: String,
    pub weight: f32,
    pub width: f32,
    pub color: EdgeStroke,
}

#[derive(Debug, Clone, Serialize)]
pub struct EdgeStroke {
    pub color: &'static str,
    pub opacity: f32,
}

/// Nodes and edges for one recorded threshold
#[derive(Debug, Clone, Default, Serialize)]
pub struct VisFrame {
    pub nodes: Vec<VisNode>,
    pub edges: Vec<VisEdge>,
}

fn vis_node(
    data: &NodeData,
    meta: Option<&NodeMeta>,
    fill: Option<Color>,
    position: Point,
) -> VisNode {
    let (border, border_width) = match data.kind {
        NodeKind::Reference => (REFERENCE_BORDER, REFERENCE_BORDER_WIDTH),
        NodeKind::Catalog => (CATALOG_BORDER, CATALOG_BORDER_WIDTH),
    };

    let title = match meta.and_then(|m| m.protein_name.as_deref()) {
        Some(protein_name) if !protein_name.is_empty() => {
            let tax = meta.and_then(|m| m.tax.as_deref()).unwrap_or("");
            format!("{} - {}", protein_name, tax)
        }
        _ => data.id.clone(),
    };

    VisNode {
        id: data.id.clone(),
        size: NODE_SIZE,
        border_width,
        border_width_selected: BORDER_WIDTH_SELECTED,
        color: VisNodeColor {
            background: fill.map_or(Fill::Css(DEFAULT_FILL), Fill::Rgb),
            border,
            highlight: Highlight { border },
        },
        title,
        shape: NODE_SHAPE,
        node_type: data.kind,
        metadata: meta.cloned(),
        x: position.x,
        y: position.y,
    }
}

fn vis_edge(from: &str, to: &str, weight: f32) -> VisEdge {
    VisEdge {
        id: format!("from {} to {}", from, to),
        from: from.to_string(),
        to: to.to_string(),
        weight,
        width: EDGE_WIDTH,
        color: EdgeStroke {
            color: EDGE_COLOR,
            opacity: EDGE_OPACITY,
        },
    }
}

/// Stable partition moving catalog nodes after all others, so they are
/// drawn last and end up on top
fn catalog_last(nodes: Vec<VisNode>) -> Vec<VisNode> {
    let (catalog, others): (Vec<VisNode>, Vec<VisNode>) = nodes
        .into_iter()
        .partition(|n| n.node_type == NodeKind::Catalog);
    others.into_iter().chain(catalog).collect()
}

/// Run the full sweep -> group -> color -> layout -> encode pipeline over a
/// loaded graph and return one frame per recorded threshold, ordered by
/// descending score.
pub fn cluster_and_visualize(
    graph: &SsnGraph,
    metadata: &HashMap<String, NodeMeta>,
    config: &Config,
) -> IndexMap<i32, VisFrame> {
    let snapshots = threshold_sweep(graph, &config.sweep_params());
    let groups = resolve_groups(&snapshots);

    let mut gen = ColorGen::new(config.pastel_factor, config.color_seed);
    let group_colors = assign_group_colors(&groups, &mut gen);
    let node_colors: HashMap<&str, Color> = groups
        .iter()
        .filter_map(|(node, group)| {
            group_colors
                .get(&group.label())
                .map(|&c| (node.as_str(), c))
        })
        .collect();

    let layout_params = config.layout_params();
    let mut frames = IndexMap::new();

    for snapshot in &snapshots {
        log::debug!("Encoding frame at score {}", snapshot.score);
        let mut frame = VisFrame::default();
        let mut cursor = PackingCursor::new(snapshot.clusters.len(), config.space_per_node);

        for cluster in &snapshot.clusters {
            let center = cursor.place(cluster.size());
            let subgraph = snapshot.graph.induced_subgraph(&cluster.members);
            let positions = cluster_layout(&subgraph, &cluster.members, center, &layout_params);

            for id in &cluster.members {
                let Some(data) = subgraph.node(id) else {
                    continue;
                };
                frame.nodes.push(vis_node(
                    data,
                    metadata.get(id),
                    node_colors.get(id.as_str()).copied(),
                    positions.get(id).copied().unwrap_or_default(),
                ));
            }
            for (a, b, w) in subgraph.edge_triples() {
                frame.edges.push(vis_edge(&a, &b, w));
            }
        }

        frame.nodes = catalog_last(frame.nodes);
        frames.insert(snapshot.score, frame);
    }

    frames
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeKind;

    fn chain_graph() -> SsnGraph {
        let mut graph = SsnGraph::new();
        for id in ["A", "B", "C", "D"] {
            graph.add_node(id, NodeKind::Catalog, true);
        }
        graph.add_edge("A", "B", 500.0);
        graph.add_edge("B", "C", 350.0);
        graph.add_edge("C", "D", 150.0);
        graph
    }

    fn chain_config() -> Config {
        Config {
            min_cluster_size: 2,
            start_score: 500,
            step: -50,
            ..Config::default()
        }
    }

    #[test]
    fn end_to_end_chain_example() {
        let frames = cluster_and_visualize(&chain_graph(), &HashMap::new(), &chain_config());

        let scores: Vec<i32> = frames.keys().copied().collect();
        assert_eq!(scores, vec![500, 350, 150]);
        assert_eq!(frames[&500].nodes.len(), 2);
        assert_eq!(frames[&350].nodes.len(), 3);
        assert_eq!(frames[&150].nodes.len(), 4);
        assert_eq!(frames[&150].edges.len(), 3);

        // A keeps the same fill across every snapshot it appears in
        let fill_of = |score: i32| {
            frames[&score]
                .nodes
                .iter()
                .find(|n| n.id == "A")
                .map(|n| n.color.background.clone())
                .unwrap()
        };
        assert_eq!(fill_of(500), fill_of(350));
        assert_eq!(fill_of(350), fill_of(150));
        assert!(matches!(fill_of(500), Fill::Rgb(_)));
    }

    #[test]
    fn titles_fall_back_to_the_identifier() {
        let mut metadata = HashMap::new();
        metadata.insert(
            "A".to_string(),
            NodeMeta {
                protein_name: Some("Carboxylic acid reductase".to_string()),
                tax: Some("Mycobacterium".to_string()),
            },
        );

        let frames = cluster_and_visualize(&chain_graph(), &metadata, &chain_config());
        let frame = &frames[&500];
        let title_of = |id: &str| {
            frame
                .nodes
                .iter()
                .find(|n| n.id == id)
                .map(|n| n.title.clone())
                .unwrap()
        };

        assert_eq!(title_of("A"), "Carboxylic acid reductase - Mycobacterium");
        assert_eq!(title_of("B"), "B");
    }

    #[test]
    fn catalog_nodes_render_after_reference_nodes() {
        let mut graph = SsnGraph::new();
        graph.add_node("cat1", NodeKind::Catalog, true);
        graph.add_node("ref1", NodeKind::Reference, true);
        graph.add_node("cat2", NodeKind::Catalog, true);
        graph.add_node("ref2", NodeKind::Reference, true);
        graph.add_edge("cat1", "ref1", 400.0);
        graph.add_edge("ref1", "cat2", 400.0);
        graph.add_edge("cat2", "ref2", 400.0);

        let config = Config {
            min_cluster_size: 2,
            start_score: 400,
            step: -100,
            ..Config::default()
        };
        let frames = cluster_and_visualize(&graph, &HashMap::new(), &config);
        let kinds: Vec<NodeKind> = frames[&400].nodes.iter().map(|n| n.node_type).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Reference,
                NodeKind::Reference,
                NodeKind::Catalog,
                NodeKind::Catalog
            ]
        );

        // border styling distinguishes the two kinds
        let border_of = |kind: NodeKind| {
            frames[&400]
                .nodes
                .iter()
                .find(|n| n.node_type == kind)
                .map(|n| (n.color.border, n.border_width))
                .unwrap()
        };
        assert_eq!(border_of(NodeKind::Reference), ("black", 1.0));
        assert_eq!(border_of(NodeKind::Catalog), ("darkred", 2.0));
    }

    #[test]
    fn edges_carry_weight_and_synthetic_id() {
        let frames = cluster_and_visualize(&chain_graph(), &HashMap::new(), &chain_config());
        let edge = &frames[&500].edges[0];
        assert_eq!(edge.id, "from A to B");
        assert_eq!(edge.weight, 500.0);
        assert_eq!(edge.width, 0.4);
        assert_eq!(edge.color.color, "darkgrey");
    }

    #[test]
    fn empty_graph_produces_no_frames() {
        let frames =
            cluster_and_visualize(&SsnGraph::new(), &HashMap::new(), &Config::default());
        assert!(frames.is_empty());
    }
}
