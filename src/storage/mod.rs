//! Persistence of the similarity network and of rendered frames

use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, to_string_pretty};
use thiserror::Error;

use crate::graph::{NodeKind, SsnGraph};
use crate::viz::{NodeMeta, VisFrame};

/// Persisted per-node attributes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeAttributes {
    pub node_type: NodeKind,
    pub alignments_made: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_group: Option<String>,
}

/// External representation of one category's network: string adjacency plus
/// per-node attributes. Nodes with no edges appear only in `nodes`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistedGraph {
    pub adjacency: BTreeMap<String, BTreeMap<String, f32>>,
    pub nodes: BTreeMap<String, NodeAttributes>,
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("decoding {path}: {source}")]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Store for persisted networks, keyed by enzyme category.
///
/// `load` reports absent state as `Ok(None)`; callers treat that as an
/// empty-graph outcome, not a failure.
pub trait GraphRepository {
    fn load(&self, category: &str) -> Result<Option<PersistedGraph>>;
    fn save(&self, category: &str, graph: &PersistedGraph) -> Result<()>;
}

/// One pretty-printed JSON document per category under a root directory
pub struct JsonRepository {
    root: PathBuf,
}

impl JsonRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn graph_path(&self, category: &str) -> PathBuf {
        self.root.join(format!("{}.json", category))
    }

    /// Node metadata for titling, if a sidecar document exists.
    /// Missing metadata is expected and yields an empty map.
    pub fn load_metadata(&self, category: &str) -> Result<HashMap<String, NodeMeta>> {
        let path = self.root.join(format!("{}_metadata.json", category));
        if !path.exists() {
            return Ok(HashMap::new());
        }
        let text = fs::read_to_string(&path).map_err(|source| RepositoryError::Io {
            path: path.clone(),
            source,
        })?;
        let meta =
            serde_json::from_str(&text).map_err(|source| RepositoryError::Decode { path, source })?;
        Ok(meta)
    }
}

impl GraphRepository for JsonRepository {
    fn load(&self, category: &str) -> Result<Option<PersistedGraph>> {
        let path = self.graph_path(category);
        if !path.exists() {
            log::info!("No saved network for {}, could not load", category);
            return Ok(None);
        }
        let text = fs::read_to_string(&path).map_err(|source| RepositoryError::Io {
            path: path.clone(),
            source,
        })?;
        let graph =
            serde_json::from_str(&text).map_err(|source| RepositoryError::Decode { path, source })?;
        Ok(Some(graph))
    }

    fn save(&self, category: &str, graph: &PersistedGraph) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        let path = self.graph_path(category);
        let mut file = File::create(&path)?;
        file.write_all(to_string_pretty(graph)?.as_bytes())?;
        log::info!(
            "Saved network for {} ({} nodes)",
            category,
            graph.nodes.len()
        );
        Ok(())
    }
}

/// Flatten a graph into its persisted form
pub fn to_persisted(graph: &SsnGraph) -> PersistedGraph {
    let mut persisted = PersistedGraph::default();
    for id in graph.node_ids() {
        let data = graph
            .node(&id)
            .map(|n| NodeAttributes {
                node_type: n.kind,
                alignments_made: n.alignments_made,
                cluster_group: n.cluster_group.clone(),
            })
            .unwrap_or(NodeAttributes {
                node_type: NodeKind::Reference,
                alignments_made: false,
                cluster_group: None,
            });
        persisted.nodes.insert(id, data);
    }
    for (a, b, w) in graph.edge_triples() {
        persisted
            .adjacency
            .entry(a.clone())
            .or_default()
            .insert(b.clone(), w);
        persisted.adjacency.entry(b).or_default().insert(a, w);
    }
    persisted
}

/// Rebuild a graph from its persisted form.
///
/// Nodes with attributes but no edges are not implied by the adjacency and
/// are re-attached from the attribute map.
pub fn from_persisted(persisted: &PersistedGraph) -> SsnGraph {
    let mut graph = SsnGraph::new();
    for (id, attrs) in &persisted.nodes {
        graph.add_node(id, attrs.node_type, attrs.alignments_made);
        if let Some(seed) = &attrs.cluster_group {
            graph.set_cluster_group(id, seed);
        }
    }
    for (a, neighbors) in &persisted.adjacency {
        for (b, &w) in neighbors {
            graph.add_edge(a, b, w);
        }
    }
    graph
}

/// Write one render file per recorded threshold plus a summary document
pub fn save_frames(frames: &IndexMap<i32, VisFrame>, out_dir: &Path) -> Result<()> {
    log::info!("Saving {} frames to {}", frames.len(), out_dir.display());
    fs::create_dir_all(out_dir)?;

    for (score, frame) in frames {
        let path = out_dir.join(format!("ssn_{}.json", score));
        let mut file = File::create(path)?;
        file.write_all(to_string_pretty(frame)?.as_bytes())?;
    }

    let summary = json!({
        "scores": frames.keys().collect::<Vec<_>>(),
        "frames": frames.iter().map(|(score, frame)| {
            json!({
                "score": score,
                "node_count": frame.nodes.len(),
                "edge_count": frame.edges.len(),
            })
        }).collect::<Vec<_>>(),
    });
    let mut file = File::create(out_dir.join("frames.json"))?;
    file.write_all(to_string_pretty(&summary)?.as_bytes())?;

    Ok(())
}
