// Copyright 2025 the Nexus Authors
// SPDX-License-Identifier: Apache-2.0

//! Gaussian-weighted smoothing of raw pen samples.

use super::Sample;
use crate::config::Smoothing;

/// Smooth interior samples in place, in order.
///
/// Each interior sample becomes `s0·P[i] + s1·P[i-1] + s1·P[i+1]` over x, y
/// and pressure, where `s0 = 1 - 2·factor/3` and `s1 = factor/3`. A sample is
/// only touched when its summed squared distance to both neighbours is below
/// `near`, so corners and jumps survive. The previous neighbour has already
/// been smoothed when a sample is visited. End points never move.
pub fn gaussian_smoothing(samples: &mut [Sample], params: Smoothing) {
    let s0 = 1.0 - 2.0 * params.factor / 3.0;
    let s1 = params.factor / 3.0;

    for i in 1..samples.len().saturating_sub(1) {
        let prev = samples[i - 1];
        let next = samples[i + 1];
        let cur = samples[i];

        let diff = cur.distance_sq(&prev) + cur.distance_sq(&next);
        if diff < params.near {
            let s = &mut samples[i];
            s.x = s0 * cur.x + s1 * prev.x + s1 * next.x;
            s.y = s0 * cur.y + s1 * prev.y + s1 * next.y;
            s.pressure = s0 * cur.pressure + s1 * prev.pressure + s1 * next.pressure;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(points: &[(f64, f64, f64)]) -> Vec<Sample> {
        points
            .iter()
            .enumerate()
            .map(|(i, &(x, y, p))| Sample::new(x, y, p, i as f64 * 0.01))
            .collect()
    }

    #[test]
    fn zero_near_threshold_changes_nothing() {
        let original = samples(&[(0.0, 0.0, 0.5), (1.0, 1.0, 0.6), (2.0, 0.0, 0.7), (3.0, 1.0, 0.5)]);
        let mut smoothed = original.clone();
        gaussian_smoothing(&mut smoothed, Smoothing { factor: 0.6, near: 0.0 });
        assert_eq!(smoothed, original);
    }

    #[test]
    fn end_points_never_move() {
        let mut pts = samples(&[(0.0, 0.0, 0.5), (0.5, 1.0, 0.5), (1.0, 0.0, 0.5)]);
        gaussian_smoothing(&mut pts, Smoothing::default());
        assert_eq!((pts[0].x, pts[0].y), (0.0, 0.0));
        assert_eq!((pts[2].x, pts[2].y), (1.0, 0.0));
    }

    #[test]
    fn interior_zigzag_is_pulled_towards_neighbours() {
        let mut pts = samples(&[(0.0, 0.0, 0.5), (0.5, 1.0, 0.5), (1.0, 0.0, 0.5)]);
        gaussian_smoothing(&mut pts, Smoothing { factor: 0.6, near: 7.0 });
        // s0 = 0.6, s1 = 0.2: y = 0.6 * 1.0
        assert!((pts[1].y - 0.6).abs() < 1e-12);
        assert!((pts[1].x - 0.5).abs() < 1e-12);
    }

    #[test]
    fn sharp_jump_is_left_alone() {
        let original = samples(&[(0.0, 0.0, 0.5), (10.0, 10.0, 0.5), (20.0, 0.0, 0.5)]);
        let mut pts = original.clone();
        gaussian_smoothing(&mut pts, Smoothing::default());
        assert_eq!(pts, original);
    }

    #[test]
    fn short_inputs_are_untouched() {
        let mut two = samples(&[(0.0, 0.0, 0.5), (1.0, 0.0, 0.5)]);
        let copy = two.clone();
        gaussian_smoothing(&mut two, Smoothing::default());
        assert_eq!(two, copy);

        let mut none: Vec<Sample> = Vec::new();
        gaussian_smoothing(&mut none, Smoothing::default());
        assert!(none.is_empty());
    }
}
