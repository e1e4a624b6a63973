// Copyright 2025 the Nexus Authors
// SPDX-License-Identifier: Apache-2.0

//! Tail outlines joining a stem to its parent.
//!
//! ```text
//!                 (0,0)
//!             Pbase o----o Ptip
//!                  /
//!             o---o Proot
//! ```
//!
//! All points are in the stem's own frame, where `Pbase` is normally the
//! origin. The outline is a closed teardrop: a half disc of radius `R`
//! around `Proot`, two quadratic curves converging on `Pbase` and a thin
//! strip out to `Ptip`.

use crate::settings::stem::{BUD_STUB_LENGTH, STEM_WIDTH, TAIL_CONTROL_FRACTION};
use kurbo::{Arc, BezPath, Point, Vec2};
use std::f64::consts::PI;

const FLATTEN_TOLERANCE: f64 = 0.1;

/// Build the closed tail outline.
///
/// `direction` is the stem's inherited direction (+1 grows right) and `r`
/// the half-width of the tail where it meets the parent.
pub fn create_tail_path(proot: Point, pbase: Point, ptip: Point, direction: f64, r: f64) -> BezPath {
    let h = Vec2::new(0.0, STEM_WIDTH);
    let half_h = h / 2.0;

    let length = (pbase - proot).hypot();
    let control = Vec2::new(-TAIL_CONTROL_FRACTION * length * direction, 0.0);

    // Angle of the radius at Proot, perpendicular-ish to the incoming curve.
    let v = proot.to_vec2() - control - pbase.to_vec2();
    let theta = if v.hypot2() < 1e-18 { 0.0 } else { -v.x.atan2(v.y) };

    let radial = Vec2::new(r * theta.cos(), r * theta.sin());
    let ppt = proot - radial * direction + half_h;
    let ppb = proot + radial * direction + half_h;

    let mut path = BezPath::new();
    path.move_to(ppb);
    path.quad_to(pbase + control + h, pbase + h);
    path.line_to(ptip + h + Vec2::new(-direction * STEM_WIDTH, 0.0));
    path.line_to(ptip);
    path.line_to(pbase);
    path.quad_to(pbase + control, ppt);

    // Half disc back round Proot from ppt to ppb, on the side away from the
    // stem.
    let (start, sweep) = if direction > 0.0 {
        (theta - PI, -PI)
    } else {
        (theta, PI)
    };
    let centre = proot + half_h;
    path.extend(Arc::new(centre, (r, r), start, sweep, 0.0).append_iter(FLATTEN_TOLERANCE));
    path.close_path();
    path
}

/// Preview of a stem about to be created from `parent_tip` towards
/// `pointer`, both in the parent's frame. Grows in whichever direction the
/// pointer lies and ends in a short stub past the pointer.
pub fn bud_path(parent_tip: Point, pointer: Point, r: f64) -> BezPath {
    let direction = if (pointer - parent_tip).x < 0.0 { -1.0 } else { 1.0 };
    let stub = pointer + Vec2::new(direction * BUD_STUB_LENGTH, 0.0);
    create_tail_path(parent_tip, pointer, stub, direction, r)
}
