//! Configuration for the sequence similarity network engine

use crate::cluster::seeds::SeedParams;
use crate::cluster::sweep::SweepParams;
use crate::layout::LayoutParams;

/// Tunables for network growth, clustering and visualization
#[derive(Debug, Clone)]
pub struct Config {
    /// Minimum number of nodes for a connected component to count as a cluster
    pub min_cluster_size: usize,

    /// Alignment score the threshold sweep starts from
    pub start_score: i32,

    /// Sweep step (negative)
    pub step: i32,

    /// Score the sweep stops at (exclusive)
    pub floor: i32,

    /// Maximum nodes handled per growth cycle
    pub batch_cap: usize,

    /// Horizontal space reserved per node when packing clusters
    pub space_per_node: f32,

    /// Spatial extent of a single cluster layout
    pub layout_extent: f32,

    /// Force-directed iterations per cluster
    pub layout_iterations: usize,

    /// Bias of generated colors towards the light end of the range
    pub pastel_factor: f32,

    /// Seed for the color random source
    pub color_seed: u64,

    /// Score the seed-selection sweep starts from
    pub seed_start_score: i32,

    /// Seed-selection sweep step (negative)
    pub seed_step: i32,

    /// Minimum qualifying edges for a node to seed a cluster
    pub min_seed_edges: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_cluster_size: 8,
            start_score: 400,
            step: -5,
            floor: 0,
            batch_cap: 200,
            space_per_node: 2.0,
            layout_extent: 5000.0,
            layout_iterations: 50,
            pastel_factor: 0.9,
            color_seed: 7,
            seed_start_score: 300,
            seed_step: -2,
            min_seed_edges: 6,
        }
    }
}

impl Config {
    pub fn sweep_params(&self) -> SweepParams {
        SweepParams {
            start_score: self.start_score,
            step: self.step,
            floor: self.floor,
            min_cluster_size: self.min_cluster_size,
        }
    }

    pub fn seed_params(&self) -> SeedParams {
        SeedParams {
            start_score: self.seed_start_score,
            step: self.seed_step,
            min_edges: self.min_seed_edges,
        }
    }

    pub fn layout_params(&self) -> LayoutParams {
        LayoutParams {
            extent: self.layout_extent,
            iterations: self.layout_iterations,
            space_per_node: self.space_per_node,
        }
    }
}
