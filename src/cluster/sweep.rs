//! Descending threshold sweep over the similarity network

use crate::cluster::components::connected_components;
use crate::cluster::Cluster;
use crate::graph::SsnGraph;

/// Parameters of one threshold sweep
#[derive(Debug, Clone)]
pub struct SweepParams {
    pub start_score: i32,
    /// Negative step; a non-negative step yields an empty sweep
    pub step: i32,
    pub floor: i32,
    pub min_cluster_size: usize,
}

impl Default for SweepParams {
    fn default() -> Self {
        Self {
            start_score: 400,
            step: -5,
            floor: 0,
            min_cluster_size: 8,
        }
    }
}

/// Cluster set observed at one recorded threshold, with the filtered graph
/// it was extracted from (kept for layout)
#[derive(Debug, Clone)]
pub struct SweepSnapshot {
    pub score: i32,
    pub clusters: Vec<Cluster>,
    pub graph: SsnGraph,
}

/// Scan thresholds from `start_score` down to `floor` (exclusive) and record
/// each threshold where the cluster partition changes.
///
/// A step is recorded when its size signature (the descending list of
/// qualifying cluster sizes) differs from the previously recorded one;
/// membership reshuffles at identical sizes are not recorded. Identical
/// input yields an identical snapshot sequence.
pub fn threshold_sweep(graph: &SsnGraph, params: &SweepParams) -> Vec<SweepSnapshot> {
    if params.step >= 0 {
        log::warn!("Threshold sweep requires a negative step, got {}", params.step);
        return Vec::new();
    }

    let mut snapshots = Vec::new();
    let mut last_signature: Vec<usize> = Vec::new();

    let mut score = params.start_score;
    while score > params.floor {
        let filtered = graph.filtered_subgraph(score as f32);
        let clusters = connected_components(&filtered, params.min_cluster_size);
        let signature: Vec<usize> = clusters.iter().map(Cluster::size).collect();

        if signature != last_signature {
            log::debug!(
                "Recording {} clusters at score {} (sizes {:?})",
                clusters.len(),
                score,
                signature
            );
            last_signature = signature;
            snapshots.push(SweepSnapshot {
                score,
                clusters,
                graph: filtered,
            });
        }

        score += params.step;
    }

    log::info!(
        "Sweep from {} by {} recorded {} snapshots",
        params.start_score,
        params.step,
        snapshots.len()
    );
    snapshots
}
