// Copyright 2025 the Nexus Authors
// SPDX-License-Identifier: Apache-2.0

//! Angular ordering of sibling stems around their parent's tip.

use kurbo::Vec2;
use std::f64::consts::{PI, TAU};

/// Sort key for a stem stored at `pos`.
///
/// `direction` is the stem's inherited direction and `flip` its own flip, so
/// `direction * flip` is the parent's direction. Top-level branches
/// (depth 1) count clockwise from straight up; deeper stems count from the
/// side facing back towards the parent, in a sense that depends on which way
/// the parent grows. The result is in `[0, 2π)` and is only ever compared,
/// never stored.
pub fn posangle(pos: Vec2, direction: f64, flip: f64, depth: usize) -> f64 {
    let x = pos.x * direction;
    // Screen y grows downward
    let y = -pos.y;
    let parent_direction = direction * flip;
    let a = y.atan2(x);
    // Every dividend below is non-negative, so `%` lands in [0, 2π).
    if depth == 1 {
        (5.0 * PI / 2.0 - a) % TAU
    } else if parent_direction > 0.0 {
        (PI - a) % TAU
    } else {
        (TAU + a) % TAU
    }
}

/// Dense indices for siblings given their sort keys: `result[i]` is the
/// position of sibling `i` once sorted. Ties keep their input order.
pub fn dense_order(keys: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by(|&a, &b| keys[a].total_cmp(&keys[b]));
    let mut index = vec![0; keys.len()];
    for (rank, i) in order.into_iter().enumerate() {
        index[i] = rank;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn depth_one_counts_clockwise_from_top() {
        let up = posangle(Vec2::new(0.0, -10.0), 1.0, 1.0, 1);
        let right = posangle(Vec2::new(10.0, 0.0), 1.0, 1.0, 1);
        let down = posangle(Vec2::new(0.0, 10.0), 1.0, 1.0, 1);
        assert!(up.abs() < EPS);
        assert!((right - PI / 2.0).abs() < EPS);
        assert!((down - PI).abs() < EPS);
    }

    #[test]
    fn depth_one_left_branches_continue_round() {
        // Stored mirrored, so pos.x is positive but direction is -1.
        let left = posangle(Vec2::new(10.0, 0.0), -1.0, -1.0, 1);
        assert!((left - 3.0 * PI / 2.0).abs() < EPS);
    }

    #[test]
    fn deeper_stems_depend_on_parent_direction() {
        let pos = Vec2::new(10.0, -10.0);
        let right_parent = posangle(pos, 1.0, 1.0, 2);
        assert!((right_parent - 3.0 * PI / 4.0).abs() < EPS);

        let left_parent = posangle(pos, -1.0, 1.0, 2);
        // x = -10, y = 10, atan2 = 3π/4
        assert!((left_parent - 3.0 * PI / 4.0).abs() < EPS);

        let below = posangle(Vec2::new(10.0, 10.0), 1.0, 1.0, 2);
        assert!(below > right_parent);
    }

    #[test]
    fn results_are_in_range() {
        for depth in 1..4 {
            for (x, y) in [(1.0, 0.0), (0.0, 1.0), (-1.0, 0.0), (0.0, -1.0), (-3.0, -0.5)] {
                for (direction, flip) in [(1.0, 1.0), (1.0, -1.0), (-1.0, 1.0), (-1.0, -1.0)] {
                    let t = posangle(Vec2::new(x, y), direction, flip, depth);
                    assert!((0.0..TAU).contains(&t), "{t}");
                }
            }
        }
    }

    #[test]
    fn dense_order_is_a_permutation() {
        let index = dense_order(&[2.0, 0.5, 1.0, 0.5]);
        assert_eq!(index, vec![3, 0, 2, 1]);
        assert_eq!(dense_order(&index.iter().map(|&i| i as f64).collect::<Vec<_>>()), index);
    }
}
