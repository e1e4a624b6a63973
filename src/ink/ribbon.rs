// Copyright 2025 the Nexus Authors
// SPDX-License-Identifier: Apache-2.0

//! Variable-width ribbon outlines for stored strokes.
//!
//! Each segment of the polyline becomes its own closed capsule: two straight
//! sides offset by the half-width at each end, closed by half-circle caps
//! around both end points. Adjacent capsules overlap at the shared vertex,
//! which gives round joins when the union is filled with the non-zero rule.

use crate::model::StrokePoint;
use crate::settings;
use kurbo::{Arc, BezPath, Circle, Point, Shape, Stroke, StrokeOpts, Vec2};
use std::f64::consts::{FRAC_PI_2, PI};

/// Builds fill and pick outlines for ink strokes
#[derive(Debug, Clone, Copy)]
pub struct RibbonStroker {
    /// Flattening tolerance for the arc caps
    pub tolerance: f64,
}

impl Default for RibbonStroker {
    fn default() -> Self {
        Self {
            tolerance: settings::pick::TOLERANCE,
        }
    }
}

impl RibbonStroker {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    /// Filled outline of a stroke of nominal `width`.
    ///
    /// The width at each point is `width * width_fraction`. A stroke with a
    /// single point (or whose points all coincide) renders as a dot.
    pub fn outline(&self, points: &[StrokePoint], width: f64) -> BezPath {
        let mut path = BezPath::new();
        let Some(first) = points.first() else {
            return path;
        };

        for pair in points.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            let w0 = width * a.width_fraction();
            let w1 = width * b.width_fraction();
            self.append_segment(&mut path, a.point(), b.point(), w0, w1);
        }

        if path.elements().is_empty() {
            let r = width * first.width_fraction() / 2.0;
            path.extend(Circle::new(first.point(), r).path_elements(self.tolerance));
        }
        path
    }

    /// The outline expanded on every side, used to make thin strokes easier
    /// to click.
    pub fn pick_shape(&self, outline: &BezPath) -> BezPath {
        let style = Stroke::new(settings::pick::STROKE_WIDTH);
        kurbo::stroke(outline.iter(), &style, &StrokeOpts::default(), self.tolerance)
    }

    /// Whether `pt` lands on the stroke or within the pick margin around it.
    pub fn hit_test(&self, points: &[StrokePoint], width: f64, pt: Point) -> bool {
        let outline = self.outline(points, width);
        outline.contains(pt) || self.pick_shape(&outline).contains(pt)
    }

    fn append_segment(&self, path: &mut BezPath, b0: Point, b1: Point, w0: f64, w1: f64) {
        let delta = b1 - b0;
        let len = delta.hypot();
        if len < 1e-9 {
            return;
        }
        let d = delta / len;
        let theta = d.y.atan2(d.x);
        let perp = Vec2::new(-d.y, d.x);
        let (h0, h1) = (w0 / 2.0, w1 / 2.0);

        path.move_to(b0 - perp * h0);
        path.line_to(b1 - perp * h1);
        let front = Arc::new(b1, (h1, h1), theta - FRAC_PI_2, PI, 0.0);
        path.extend(front.append_iter(self.tolerance));
        path.line_to(b0 + perp * h0);
        let back = Arc::new(b0, (h0, h0), theta + FRAC_PI_2, PI, 0.0);
        path.extend(back.append_iter(self.tolerance));
        path.close_path();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::PathEl;

    fn line(points: &[(f64, f64)]) -> Vec<StrokePoint> {
        points.iter().map(|&(x, y)| StrokePoint::new(x, y)).collect()
    }

    fn subpaths(path: &BezPath) -> usize {
        path.elements()
            .iter()
            .filter(|el| matches!(el, PathEl::MoveTo(_)))
            .count()
    }

    #[test]
    fn one_closed_subpath_per_segment() {
        let stroker = RibbonStroker::default();
        let path = stroker.outline(&line(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]), 4.0);
        assert_eq!(subpaths(&path), 2);
        let closes = path
            .elements()
            .iter()
            .filter(|el| matches!(el, PathEl::ClosePath))
            .count();
        assert_eq!(closes, 2);
    }

    #[test]
    fn horizontal_segment_bounds_include_caps() {
        let stroker = RibbonStroker::default();
        let path = stroker.outline(&line(&[(0.0, 0.0), (10.0, 0.0)]), 4.0);
        let bbox = path.bounding_box();
        assert!((bbox.x0 + 2.0).abs() < 1e-6);
        assert!((bbox.x1 - 12.0).abs() < 1e-6);
        assert!((bbox.y0 + 2.0).abs() < 1e-6);
        assert!((bbox.y1 - 2.0).abs() < 1e-6);
    }

    #[test]
    fn width_fraction_tapers_the_ribbon() {
        let stroker = RibbonStroker::default();
        let points = vec![
            StrokePoint::with_width(0.0, 0.0, 1.0),
            StrokePoint::with_width(20.0, 0.0, 0.25),
        ];
        let path = stroker.outline(&points, 8.0);
        assert!(path.contains(Point::new(1.0, 3.5)));
        assert!(!path.contains(Point::new(19.0, 3.5)));
        assert!(path.contains(Point::new(19.0, 0.5)));
    }

    #[test]
    fn single_point_is_a_dot() {
        let stroker = RibbonStroker::default();
        let path = stroker.outline(&line(&[(5.0, 5.0)]), 6.0);
        assert!(path.contains(Point::new(5.0, 5.0)));
        assert!(path.contains(Point::new(7.5, 5.0)));
        assert!(!path.contains(Point::new(8.5, 5.0)));
    }

    #[test]
    fn empty_stroke_has_empty_outline() {
        let stroker = RibbonStroker::default();
        assert!(stroker.outline(&[], 2.0).elements().is_empty());
    }

    #[test]
    fn pick_margin_extends_beyond_outline() {
        let stroker = RibbonStroker::default();
        let points = line(&[(0.0, 0.0), (30.0, 0.0)]);
        let near = Point::new(15.0, 2.5);
        let far = Point::new(15.0, 10.0);

        let outline = stroker.outline(&points, 2.0);
        assert!(!outline.contains(near));
        assert!(stroker.hit_test(&points, 2.0, near));
        assert!(!stroker.hit_test(&points, 2.0, far));
    }
}
