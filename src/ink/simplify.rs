// Copyright 2025 the Nexus Authors
// SPDX-License-Identifier: Apache-2.0

//! Recursive polyline simplification (Lowe's method).
//!
//! Points may have any number of coordinates; the distance metric is the
//! generalised point-to-line distance, so the pressure channel can take part
//! alongside x and y. Retained points are identified by their index in the
//! input, which keeps the result independent of coordinate values.

use std::collections::BTreeSet;

/// Dot product over the shorter of the two slices
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Euclidean distance from `p` to the infinite line through `a` and `b`, in
/// any number of dimensions.
///
/// When `a` and `b` coincide this is the distance from `p` to `a`.
pub fn distance_to_line(p: &[f64], a: &[f64], b: &[f64]) -> f64 {
    let ap: Vec<f64> = a.iter().zip(p).map(|(a, p)| a - p).collect();
    let ab: Vec<f64> = a.iter().zip(b).map(|(a, b)| a - b).collect();

    let ab_ap = dot(&ab, &ap);
    let ab_ab = dot(&ab, &ab);
    let ap_ap = dot(&ap, &ap);

    if ab_ab == 0.0 {
        return ap_ap.sqrt();
    }
    (ap_ap - ab_ap * ab_ap / ab_ab).abs().sqrt()
}

/// Simplify `curve[i..=f]`, adding the indices of retained points to `keep`.
///
/// Both end points are always kept. If the interior point furthest from the
/// chord `(i, f)` is more than `tolerance` away, the range is split there and
/// each half is simplified in turn. A split point adjacent to an end is kept
/// directly rather than recursing into a one-segment range.
pub fn simplify_lowes<P: AsRef<[f64]>>(
    curve: &[P],
    i: usize,
    f: usize,
    tolerance: f64,
    keep: &mut BTreeSet<usize>,
) {
    let a = curve[i].as_ref();
    let b = curve[f].as_ref();
    keep.insert(i);
    keep.insert(f);

    let mut max_d = 0.0;
    let mut max_i = 0;
    for (ii, p) in curve.iter().enumerate().take(f).skip(i + 1) {
        let d = distance_to_line(p.as_ref(), a, b);
        if d > max_d {
            max_d = d;
            max_i = ii;
        }
    }

    if max_d > tolerance {
        if max_i == f - 1 {
            keep.insert(max_i);
        } else {
            simplify_lowes(curve, max_i, f, tolerance, keep);
        }

        if max_i == i + 1 {
            keep.insert(max_i);
        } else {
            simplify_lowes(curve, i, max_i, tolerance, keep);
        }
    }
}

/// Indices of the points retained from the whole curve, in order.
pub fn simplify<P: AsRef<[f64]>>(curve: &[P], tolerance: f64) -> Vec<usize> {
    if curve.is_empty() {
        return Vec::new();
    }
    let mut keep = BTreeSet::new();
    simplify_lowes(curve, 0, curve.len() - 1, tolerance, &mut keep);
    keep.into_iter().collect()
}
