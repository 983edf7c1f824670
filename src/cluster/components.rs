//! Connected component extraction

use std::collections::{BTreeMap, HashMap};

use crate::cluster::Cluster;
use crate::graph::SsnGraph;

/// Union-Find over node ranks, with path compression and union by size
pub struct DisjointSets {
    parent: Vec<u32>,
    size: Vec<u32>,
}

impl DisjointSets {
    pub fn new(len: usize) -> Self {
        Self {
            parent: (0..len as u32).collect(),
            size: vec![1; len],
        }
    }

    pub fn find(&mut self, x: u32) -> u32 {
        let px = self.parent[x as usize];
        if px != x {
            // Path compression: point directly at the root
            self.parent[x as usize] = self.find(px);
        }
        self.parent[x as usize]
    }

    pub fn union(&mut self, x: u32, y: u32) {
        let root_x = self.find(x);
        let root_y = self.find(y);
        if root_x == root_y {
            return;
        }

        // Attach the smaller tree under the root of the larger one
        if self.size[root_x as usize] >= self.size[root_y as usize] {
            self.parent[root_y as usize] = root_x;
            self.size[root_x as usize] += self.size[root_y as usize];
        } else {
            self.parent[root_x as usize] = root_y;
            self.size[root_y as usize] += self.size[root_x as usize];
        }
    }
}

/// Connected components of `graph` with at least `min_size` members, sorted
/// by size descending with ties broken by the smallest member identifier.
pub fn connected_components(graph: &SsnGraph, min_size: usize) -> Vec<Cluster> {
    let ids = graph.node_ids();
    let rank: HashMap<&str, u32> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i as u32))
        .collect();

    let mut sets = DisjointSets::new(ids.len());
    for (a, b, _) in graph.edge_triples() {
        sets.union(rank[a.as_str()], rank[b.as_str()]);
    }

    let mut by_root: BTreeMap<u32, Vec<String>> = BTreeMap::new();
    for (i, id) in ids.iter().enumerate() {
        by_root
            .entry(sets.find(i as u32))
            .or_default()
            .push(id.clone());
    }

    let mut clusters: Vec<Cluster> = by_root
        .into_values()
        .filter(|members| members.len() >= min_size)
        .map(Cluster::new)
        .collect();
    clusters.sort_by(|a, b| {
        b.size()
            .cmp(&a.size())
            .then_with(|| a.members.cmp(&b.members))
    });
    clusters
}
