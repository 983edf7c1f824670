//! Visually distinct color assignment for cluster groups

use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::cluster::grouping::Group;

/// Three-channel color in the generator's bounded range
pub type Color = [f32; 3];

const TRIALS: usize = 100;

/// Generator of pastel colors that keeps every new color as far as possible
/// from the ones already handed out.
///
/// The random source is injected by seed so a fixed seed reproduces the
/// whole palette.
pub struct ColorGen {
    pastel_factor: f32,
    existing: Vec<Color>,
    rng: StdRng,
}

impl ColorGen {
    pub fn new(pastel_factor: f32, seed: u64) -> Self {
        Self {
            pastel_factor,
            existing: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Colors handed out so far, in assignment order
    pub fn existing_colors(&self) -> &[Color] {
        &self.existing
    }

    /// One trial color: each channel drawn from `0..=256` and pulled toward
    /// the light end by the pastel factor
    pub fn random_color(&mut self) -> Color {
        let p = self.pastel_factor;
        let mut color = [0.0f32; 3];
        for channel in &mut color {
            let u = self.rng.gen_range(0..=256) as f32;
            *channel = (u + p) / (1.0 + p);
        }
        color
    }

    /// Summed channel-wise absolute difference
    pub fn distance(a: &Color, b: &Color) -> f32 {
        a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
    }

    fn min_distance(&self, color: &Color) -> f32 {
        self.existing
            .iter()
            .map(|c| Self::distance(color, c))
            .fold(f32::INFINITY, f32::min)
    }

    /// Best of 100 trial colors by minimum distance to the existing ones.
    /// The very first color is the first trial, unexamined.
    pub fn generate_new(&mut self) -> Color {
        let mut best = self.random_color();
        if self.existing.is_empty() {
            self.existing.push(best);
            return best;
        }

        let mut best_distance = self.min_distance(&best);
        for _ in 1..TRIALS {
            let trial = self.random_color();
            let trial_distance = self.min_distance(&trial);
            if trial_distance > best_distance {
                best_distance = trial_distance;
                best = trial;
            }
        }
        self.existing.push(best);
        best
    }

    /// Exact element-wise mean, registered for future distinctness checks
    pub fn average(&mut self, colors: &[Color]) -> Color {
        let mut mean = [0.0f32; 3];
        if colors.is_empty() {
            return mean;
        }
        for color in colors {
            for (m, c) in mean.iter_mut().zip(color) {
                *m += c;
            }
        }
        for m in &mut mean {
            *m /= colors.len() as f32;
        }
        self.existing.push(mean);
        mean
    }
}

/// Resolve one color per distinct group label.
///
/// Integer labels are resolved first, in assignment order; merged labels
/// then average the colors of the single groups they absorbed.
pub fn assign_group_colors(
    groups: &IndexMap<String, Group>,
    gen: &mut ColorGen,
) -> IndexMap<String, Color> {
    let mut colors: IndexMap<String, Color> = IndexMap::new();

    for group in groups.values() {
        if let Group::Single(_) = group {
            let label = group.label();
            if !colors.contains_key(&label) {
                let color = gen.generate_new();
                colors.insert(label, color);
            }
        }
    }

    for group in groups.values() {
        if let Group::Merged(ids) = group {
            let label = group.label();
            if !colors.contains_key(&label) {
                let parts: Vec<Color> = ids
                    .iter()
                    .filter_map(|id| colors.get(&id.to_string()).copied())
                    .collect();
                let color = gen.average(&parts);
                colors.insert(label, color);
            }
        }
    }

    colors
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::BTreeSet;

    #[test]
    fn fixed_seed_reproduces_the_palette() {
        let mut a = ColorGen::new(0.9, 11);
        let mut b = ColorGen::new(0.9, 11);
        for _ in 0..5 {
            assert_eq!(a.generate_new(), b.generate_new());
        }
    }

    #[test]
    fn channels_stay_in_the_pastel_range() {
        let mut gen = ColorGen::new(0.9, 3);
        for _ in 0..200 {
            let color = gen.random_color();
            for channel in color {
                assert!(channel >= 0.9 / 1.9);
                assert!(channel <= 256.9 / 1.9);
            }
        }
    }

    #[test]
    fn second_color_is_the_best_of_its_trials() {
        let seed = 42;
        let mut gen = ColorGen::new(0.9, seed);
        let first = gen.generate_new();
        let second = gen.generate_new();

        // replay the same stream: skip the first color's draw, then collect
        // the hundred trials the second call examined
        let mut replay = ColorGen::new(0.9, seed);
        let replay_first = replay.random_color();
        assert_eq!(replay_first, first);
        let trials: Vec<Color> = (0..100).map(|_| replay.random_color()).collect();

        assert!(trials.contains(&second));
        let best = trials
            .iter()
            .map(|t| ColorGen::distance(t, &first))
            .fold(f32::NEG_INFINITY, f32::max);
        assert_eq!(ColorGen::distance(&second, &first), best);
    }

    #[test]
    fn average_is_the_exact_mean_and_is_registered() {
        let mut gen = ColorGen::new(0.9, 1);
        let mean = gen.average(&[[10.0, 20.0, 30.0], [20.0, 40.0, 70.0]]);
        assert_relative_eq!(mean[0], 15.0);
        assert_relative_eq!(mean[1], 30.0);
        assert_relative_eq!(mean[2], 50.0);
        assert_eq!(gen.existing_colors(), &[[15.0, 30.0, 50.0]]);
    }

    #[test]
    fn merged_label_gets_the_mean_of_its_parts() {
        let mut groups: IndexMap<String, Group> = IndexMap::new();
        groups.insert("a".into(), Group::Single(1));
        groups.insert("x".into(), Group::Single(2));
        groups.insert("m".into(), Group::Merged(BTreeSet::from([1, 2])));

        let mut gen = ColorGen::new(0.9, 9);
        let colors = assign_group_colors(&groups, &mut gen);

        let one = colors["1"];
        let two = colors["2"];
        let merged = colors["{1,2}"];
        for i in 0..3 {
            assert_relative_eq!(merged[i], (one[i] + two[i]) / 2.0);
        }
    }
}
