//! Selection of representative seed nodes for reference-set clusters

use std::collections::HashSet;

use itertools::Itertools;

use crate::graph::{NodeKind, SsnGraph};

/// Parameters for one seed-selection sweep
#[derive(Debug, Clone)]
pub struct SeedParams {
    pub start_score: i32,
    /// Negative step; a non-negative step yields no seeds
    pub step: i32,
    /// Minimum qualifying edges for a node to become a seed
    pub min_edges: usize,
}

impl Default for SeedParams {
    fn default() -> Self {
        Self {
            start_score: 300,
            step: -2,
            min_edges: 6,
        }
    }
}

/// Sweep descending thresholds and pick, at each one, the best-connected
/// unclaimed nodes as cluster seeds.
///
/// An edge qualifies when both endpoints are reference-set members and
/// neither is already claimed by an earlier seed. Each chosen seed claims
/// its whole neighborhood and stamps its identifier into the
/// `cluster_group` attribute of every unclaimed reference member.
pub fn select_seeds(graph: &mut SsnGraph, params: &SeedParams) -> Vec<String> {
    if params.step >= 0 {
        log::warn!("Seed selection requires a negative step, got {}", params.step);
        return Vec::new();
    }

    let mut seeds = Vec::new();
    let mut claimed: HashSet<String> = HashSet::new();

    let mut score = params.start_score;
    while score > 0 {
        let filtered = graph.filtered_subgraph(score as f32);

        let candidates: Vec<(String, usize)> = filtered
            .node_ids()
            .into_iter()
            .filter(|id| !claimed.contains(id))
            .filter(|id| is_reference(&filtered, id))
            .map(|id| {
                let count = filtered
                    .neighbors(&id)
                    .into_iter()
                    .filter(|nb| is_reference(&filtered, nb) && !claimed.contains(nb))
                    .count();
                (id, count)
            })
            .filter(|(_, count)| *count >= params.min_edges)
            .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
            .collect();

        for (seed, _) in candidates {
            if claimed.contains(&seed) {
                continue;
            }
            let mut neighborhood = filtered.neighbors(&seed);
            neighborhood.push(seed.clone());

            for member in &neighborhood {
                if is_reference(graph, member) && !claimed.contains(member) {
                    graph.set_cluster_group(member, &seed);
                }
            }
            claimed.extend(neighborhood);
            seeds.push(seed);
        }

        score += params.step;
    }

    log::info!(
        "Found {} seed nodes with at least {} qualifying edges",
        seeds.len(),
        params.min_edges
    );
    seeds
}

fn is_reference(graph: &SsnGraph, id: &str) -> bool {
    graph
        .node(id)
        .is_some_and(|n| n.kind == NodeKind::Reference)
}
