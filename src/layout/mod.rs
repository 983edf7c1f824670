//! Per-cluster force-directed layout and non-overlapping cluster packing

use std::collections::HashMap;

use serde::Serialize;

use crate::graph::SsnGraph;

/// 2-D layout coordinate
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Parameters of the per-cluster layout
#[derive(Debug, Clone)]
pub struct LayoutParams {
    /// Distance from a cluster's center to its farthest node
    pub extent: f32,
    /// Force-directed iterations
    pub iterations: usize,
    /// Horizontal space reserved per node when packing clusters
    pub space_per_node: f32,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            extent: 5000.0,
            iterations: 50,
            space_per_node: 2.0,
        }
    }
}

const COOLING: f32 = 0.95;
const MIN_DIST: f32 = 0.01;

/// Standalone Fruchterman-Reingold layout of one cluster, scaled to the
/// configured extent and translated to `center`.
///
/// Initial positions are placed on a circle by member rank, so identical
/// input yields an identical layout.
pub fn cluster_layout(
    graph: &SsnGraph,
    members: &[String],
    center: Point,
    params: &LayoutParams,
) -> HashMap<String, Point> {
    let n = members.len();
    if n == 0 {
        return HashMap::new();
    }
    if n == 1 {
        return HashMap::from([(members[0].clone(), center)]);
    }

    let rank: HashMap<&str, usize> = members
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();
    let edges: Vec<(usize, usize)> = graph
        .edge_triples()
        .into_iter()
        .filter_map(|(a, b, _)| {
            let (&i, &j) = (rank.get(a.as_str())?, rank.get(b.as_str())?);
            Some((i, j))
        })
        .collect();

    let mut pos: Vec<Point> = (0..n)
        .map(|i| {
            let angle = i as f32 * std::f32::consts::TAU / n as f32;
            Point {
                x: params.extent / 2.0 * angle.cos(),
                y: params.extent / 2.0 * angle.sin(),
            }
        })
        .collect();

    let k = params.extent / (n as f32).sqrt();
    let mut temperature = params.extent / 10.0;

    for _ in 0..params.iterations {
        let mut disp = vec![(0.0f32, 0.0f32); n];

        // repulsion between all pairs: k^2 / d
        for i in 0..n {
            for j in (i + 1)..n {
                let dx = pos[i].x - pos[j].x;
                let dy = pos[i].y - pos[j].y;
                let dist = (dx * dx + dy * dy).sqrt().max(MIN_DIST);
                let force = k * k / dist;
                let fx = dx / dist * force;
                let fy = dy / dist * force;
                disp[i].0 += fx;
                disp[i].1 += fy;
                disp[j].0 -= fx;
                disp[j].1 -= fy;
            }
        }

        // attraction along edges: d^2 / k
        for &(i, j) in &edges {
            let dx = pos[j].x - pos[i].x;
            let dy = pos[j].y - pos[i].y;
            let dist = (dx * dx + dy * dy).sqrt().max(MIN_DIST);
            let force = dist * dist / k;
            let fx = dx / dist * force;
            let fy = dy / dist * force;
            disp[i].0 += fx;
            disp[i].1 += fy;
            disp[j].0 -= fx;
            disp[j].1 -= fy;
        }

        // displace, capped by the current temperature
        for i in 0..n {
            let (fx, fy) = disp[i];
            let mag = (fx * fx + fy * fy).sqrt().max(MIN_DIST);
            let step = mag.min(temperature);
            pos[i].x += fx / mag * step;
            pos[i].y += fy / mag * step;
        }
        temperature *= COOLING;
    }

    // rescale around the centroid so the farthest node sits at the extent,
    // then translate to the cluster center
    let cx = pos.iter().map(|p| p.x).sum::<f32>() / n as f32;
    let cy = pos.iter().map(|p| p.y).sum::<f32>() / n as f32;
    let max_dev = pos
        .iter()
        .map(|p| ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt())
        .fold(0.0f32, f32::max);
    let scale = if max_dev > 0.0 {
        params.extent / max_dev
    } else {
        0.0
    };

    members
        .iter()
        .zip(&pos)
        .map(|(id, p)| {
            (
                id.clone(),
                Point {
                    x: center.x + (p.x - cx) * scale,
                    y: center.y + (p.y - cy) * scale,
                },
            )
        })
        .collect()
}

/// Running cursor that packs clusters left-to-right into rows.
///
/// A cluster of `n` nodes occupies a horizontal box of half-extent
/// `n * space_per_node / 2` around its center. Rows wrap after the integer
/// square root of the cluster count; each wrap moves the baseline down by
/// the widest half-extent placed in the finished row.
pub struct PackingCursor {
    per_row: usize,
    space_per_node: f32,
    placed_in_row: usize,
    x: f32,
    y: f32,
    row_max_half: f32,
}

impl PackingCursor {
    pub fn new(cluster_count: usize, space_per_node: f32) -> Self {
        let per_row = (cluster_count as f64).sqrt() as usize;
        Self {
            per_row: per_row.max(1),
            space_per_node,
            placed_in_row: 0,
            x: 0.0,
            y: 0.0,
            row_max_half: 0.0,
        }
    }

    /// Center for the next cluster of `cluster_size` nodes
    pub fn place(&mut self, cluster_size: usize) -> Point {
        let half = cluster_size as f32 * self.space_per_node / 2.0;
        let center = Point {
            x: self.x + half,
            y: self.y,
        };
        self.x = center.x + half;
        self.row_max_half = self.row_max_half.max(half);
        self.placed_in_row += 1;

        if self.placed_in_row == self.per_row {
            self.y -= self.row_max_half;
            self.x = 0.0;
            self.row_max_half = 0.0;
            self.placed_in_row = 0;
        }

        center
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeKind;

    fn clique(ids: &[&str]) -> (SsnGraph, Vec<String>) {
        let mut graph = SsnGraph::new();
        for id in ids {
            graph.add_node(id, NodeKind::Catalog, true);
        }
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                graph.add_edge(a, b, 200.0);
            }
        }
        (graph, ids.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn layout_is_deterministic() {
        let (graph, members) = clique(&["a", "b", "c", "d", "e"]);
        let params = LayoutParams::default();
        let first = cluster_layout(&graph, &members, Point::default(), &params);
        let second = cluster_layout(&graph, &members, Point::default(), &params);
        assert_eq!(first, second);
    }

    #[test]
    fn layout_is_bounded_by_the_extent() {
        let (graph, members) = clique(&["a", "b", "c", "d", "e", "f"]);
        let params = LayoutParams::default();
        let center = Point { x: 100.0, y: -50.0 };
        let positions = cluster_layout(&graph, &members, center, &params);

        for p in positions.values() {
            let dev = ((p.x - center.x).powi(2) + (p.y - center.y).powi(2)).sqrt();
            assert!(dev <= params.extent * 1.001);
        }
    }

    #[test]
    fn single_node_sits_at_the_center() {
        let (graph, members) = clique(&["only"]);
        let center = Point { x: 3.0, y: 4.0 };
        let positions = cluster_layout(&graph, &members, center, &LayoutParams::default());
        assert_eq!(positions["only"], center);
    }

    #[test]
    fn boxes_in_a_row_do_not_overlap() {
        // four clusters pack two per row
        let sizes = [10usize, 8, 6, 4];
        let space = 2.0;
        let mut cursor = PackingCursor::new(sizes.len(), space);
        let centers: Vec<Point> = sizes.iter().map(|&s| cursor.place(s)).collect();

        let half = |s: usize| s as f32 * space / 2.0;
        // row one
        assert!(centers[0].x + half(sizes[0]) <= centers[1].x - half(sizes[1]) + 1e-6);
        assert_eq!(centers[0].y, centers[1].y);
        // row two
        assert!(centers[2].x + half(sizes[2]) <= centers[3].x - half(sizes[3]) + 1e-6);
        assert_eq!(centers[2].y, centers[3].y);
    }

    #[test]
    fn row_baselines_strictly_decrease() {
        let sizes = [9usize, 7, 5, 3, 2, 2, 1, 1, 1];
        let mut cursor = PackingCursor::new(sizes.len(), 2.0);
        let centers: Vec<Point> = sizes.iter().map(|&s| cursor.place(s)).collect();

        let mut baselines: Vec<f32> = centers.iter().map(|c| c.y).collect();
        baselines.dedup();
        for pair in baselines.windows(2) {
            assert!(pair[1] < pair[0]);
        }
        // the drop below row one equals its widest half-extent
        assert_eq!(baselines[1], -9.0);
    }
}
