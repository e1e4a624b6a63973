// Copyright 2025 the Nexus Authors
// SPDX-License-Identifier: Apache-2.0

//! Content items carried by a stem: ink strokes, text frames and images.
//!
//! Every item has a `frame` transform placing it in the stem's local
//! coordinates and a `z` used for stacking. Stroke points are stored relative
//! to the first point so the frame only needs to carry the translation.

use super::transform::Transform;
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// One sample of a stored stroke, relative to the stroke's first point.
///
/// `width` is the fraction of the stroke width at this point; strokes without
/// pressure variation omit it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<f64>", into = "Vec<f64>")]
pub struct StrokePoint {
    pub dx: f64,
    pub dy: f64,
    pub width: Option<f64>,
}

impl StrokePoint {
    pub fn new(dx: f64, dy: f64) -> Self {
        Self {
            dx,
            dy,
            width: None,
        }
    }

    pub fn with_width(dx: f64, dy: f64, width: f64) -> Self {
        Self {
            dx,
            dy,
            width: Some(width),
        }
    }

    pub fn point(&self) -> Point {
        Point::new(self.dx, self.dy)
    }

    /// Width fraction, treating a missing value as full width
    pub fn width_fraction(&self) -> f64 {
        self.width.unwrap_or(1.0)
    }
}

impl From<Vec<f64>> for StrokePoint {
    fn from(v: Vec<f64>) -> Self {
        Self {
            dx: v.first().copied().unwrap_or(0.0),
            dy: v.get(1).copied().unwrap_or(0.0),
            width: v.get(2).copied(),
        }
    }
}

impl From<StrokePoint> for Vec<f64> {
    fn from(p: StrokePoint) -> Self {
        match p.width {
            Some(w) => vec![p.dx, p.dy, w],
            None => vec![p.dx, p.dy],
        }
    }
}

/// Freehand ink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeContent {
    /// `#RRGGBB`
    pub color: String,
    pub opacity: f64,
    pub width: f64,
    pub frame: Transform,
    pub stroke: Vec<StrokePoint>,
    pub z: f64,
}

/// A frame of rich text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    /// Sanitised markup
    pub source: String,
    pub frame: Transform,
    pub maxwidth: f64,
    pub z: f64,
}

/// A reference to shared image bytes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageContent {
    /// Content hash of the image data, owned by the store
    pub sha1: String,
    pub frame: Transform,
    pub z: f64,
    /// Pixel dimensions, recorded when the image was added
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
}

/// Anything a stem can hold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ContentItem {
    Stroke(StrokeContent),
    Text(TextContent),
    Image(ImageContent),
}

impl ContentItem {
    pub fn frame(&self) -> Transform {
        match self {
            ContentItem::Stroke(s) => s.frame,
            ContentItem::Text(t) => t.frame,
            ContentItem::Image(i) => i.frame,
        }
    }

    pub fn set_frame(&mut self, frame: Transform) {
        match self {
            ContentItem::Stroke(s) => s.frame = frame,
            ContentItem::Text(t) => t.frame = frame,
            ContentItem::Image(i) => i.frame = frame,
        }
    }

    pub fn z(&self) -> f64 {
        match self {
            ContentItem::Stroke(s) => s.z,
            ContentItem::Text(t) => t.z,
            ContentItem::Image(i) => i.z,
        }
    }

    /// Bounds in the item's own coordinates, before `frame` is applied.
    ///
    /// Text bounds are an estimate from `maxwidth` and the number of lines;
    /// exact text layout is the renderer's business.
    pub fn local_bounds(&self) -> Rect {
        match self {
            ContentItem::Stroke(s) => {
                let Some(first) = s.stroke.first() else {
                    return Rect::ZERO;
                };
                let mut rect = Rect::from_points(first.point(), first.point());
                let mut max_half = 0.0f64;
                for p in &s.stroke {
                    rect = rect.union_pt(p.point());
                    max_half = max_half.max(s.width * p.width_fraction() / 2.0);
                }
                rect.inflate(max_half, max_half)
            }
            ContentItem::Text(t) => {
                let lines = t.source.lines().count().max(1) as f64;
                Rect::new(
                    0.0,
                    0.0,
                    t.maxwidth,
                    lines * crate::settings::leaf::TEXT_LINE_HEIGHT,
                )
            }
            ContentItem::Image(i) => Rect::new(0.0, 0.0, i.width, i.height),
        }
    }

    /// Bounds after `frame` is applied.
    pub fn bounds(&self) -> Rect {
        self.frame().map_rect(self.local_bounds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stroke(points: Vec<StrokePoint>) -> ContentItem {
        ContentItem::Stroke(StrokeContent {
            color: "#000000".to_string(),
            opacity: 1.0,
            width: 2.0,
            frame: Transform::translate(10.0, 20.0),
            stroke: points,
            z: 1.0,
        })
    }

    #[test]
    fn stroke_points_serialise_as_short_lists() {
        let plain = serde_json::to_string(&StrokePoint::new(1.0, 2.0)).unwrap();
        assert_eq!(plain, "[1.0,2.0]");
        let weighted = serde_json::to_string(&StrokePoint::with_width(1.0, 2.0, 0.5)).unwrap();
        assert_eq!(weighted, "[1.0,2.0,0.5]");

        let back: StrokePoint = serde_json::from_str("[3.0,4.0,0.25]").unwrap();
        assert_eq!(back, StrokePoint::with_width(3.0, 4.0, 0.25));
    }

    #[test]
    fn content_is_tagged_by_kind() {
        let item = ContentItem::Text(TextContent {
            source: "hello".to_string(),
            frame: Transform::IDENTITY,
            maxwidth: 100.0,
            z: 0.0,
        });
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["kind"], "Text");
        let back: ContentItem = serde_json::from_value(json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn stroke_bounds_include_half_width_and_frame() {
        let item = stroke(vec![StrokePoint::new(0.0, 0.0), StrokePoint::new(4.0, 0.0)]);
        assert_eq!(item.local_bounds(), Rect::new(-1.0, -1.0, 5.0, 1.0));
        assert_eq!(item.bounds(), Rect::new(9.0, 19.0, 15.0, 21.0));
    }

    #[test]
    fn empty_stroke_has_zero_bounds() {
        assert_eq!(stroke(vec![]).local_bounds(), Rect::ZERO);
    }

    #[test]
    fn set_frame_replaces_frame() {
        let mut item = stroke(vec![StrokePoint::new(0.0, 0.0)]);
        item.set_frame(Transform::IDENTITY);
        assert_eq!(item.frame(), Transform::IDENTITY);
    }
}
