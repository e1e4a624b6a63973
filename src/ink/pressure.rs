// Copyright 2025 the Nexus Authors
// SPDX-License-Identifier: Apache-2.0

//! Pressure response curve.
//!
//! Raw stylus pressure is remapped through a quadratic Bézier
//! `(0,0)-(x1,y1)-(1,1)` so light touches can be made heavier (or lighter)
//! without changing the end points.

use crate::config::PressureCurve;

impl PressureCurve {
    /// Map a raw pressure in `[0, 1]` through the curve.
    pub fn apply(&self, p: f64) -> f64 {
        let (x1, y1) = (self.x1, self.y1);
        if x1 == 0.5 {
            // The Bézier parameter equals x here, so the curve is explicit.
            return 2.0 * (1.0 - p) * p * y1 + p * p;
        }
        let root = (p - 2.0 * p * x1 + x1 * x1).max(0.0).sqrt();
        let denom = (1.0 - 2.0 * x1).powi(2);
        (p * (2.0 * x1 - 1.0) * (2.0 * y1 - 1.0) - 2.0 * (root - x1) * (x1 - y1)) / denom
    }
}
