// Copyright 2025 the Nexus Authors
// SPDX-License-Identifier: Apache-2.0

//! Scale, rotate and move a group of selected items together.
//!
//! Every target is tracked by its item transform (a content `frame` or a
//! stem's local transform) and the fixed container transform that maps item
//! coordinates into the scene. Drag steps are applied in scene space and
//! nothing is stored until release.

use super::selection::{Selection, SelectionTarget};
use crate::error::Error;
use crate::layout::{Placement, StemLayout};
use crate::model::{BatchId, NodeStore, Transform};
use crate::settings::pick::{HANDLE_RADIUS, ROTATE_HANDLE_OFFSET};
use kurbo::{Point, Rect};

// ============================================================================
// HANDLES
// ============================================================================

/// Which handle of the selection rect is being dragged.
///
/// Corner handles scale both axes. Edge handles scale one axis only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Top,
    Bottom,
    Left,
    Right,
    Rotate,
}

impl Handle {
    const CORNERS: [Handle; 4] = [
        Handle::TopLeft,
        Handle::TopRight,
        Handle::BottomLeft,
        Handle::BottomRight,
    ];
    const EDGES: [Handle; 4] = [Handle::Top, Handle::Bottom, Handle::Left, Handle::Right];

    pub fn is_corner(self) -> bool {
        matches!(
            self,
            Self::TopLeft | Self::TopRight | Self::BottomLeft | Self::BottomRight
        )
    }

    /// Where the handle is drawn for a selection rect (y grows down)
    pub fn position(self, rect: Rect) -> Point {
        let c = rect.center();
        match self {
            Handle::TopLeft => Point::new(rect.x0, rect.y0),
            Handle::TopRight => Point::new(rect.x1, rect.y0),
            Handle::BottomLeft => Point::new(rect.x0, rect.y1),
            Handle::BottomRight => Point::new(rect.x1, rect.y1),
            Handle::Top => Point::new(c.x, rect.y0),
            Handle::Bottom => Point::new(c.x, rect.y1),
            Handle::Left => Point::new(rect.x0, c.y),
            Handle::Right => Point::new(rect.x1, c.y),
            Handle::Rotate => Point::new(c.x, rect.y0 - ROTATE_HANDLE_OFFSET),
        }
    }

    /// The fixed point of a gesture started on this handle: the opposite
    /// corner or edge, or the centre for rotation and centred scaling.
    pub fn pivot(self, rect: Rect, centred: bool) -> Point {
        if centred {
            return rect.center();
        }
        match self {
            Handle::TopLeft => Handle::BottomRight.position(rect),
            Handle::TopRight => Handle::BottomLeft.position(rect),
            Handle::BottomLeft => Handle::TopRight.position(rect),
            Handle::BottomRight => Handle::TopLeft.position(rect),
            Handle::Top => Handle::Bottom.position(rect),
            Handle::Bottom => Handle::Top.position(rect),
            Handle::Left => Handle::Right.position(rect),
            Handle::Right => Handle::Left.position(rect),
            Handle::Rotate => rect.center(),
        }
    }
}

/// What a press on the selection grabbed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grip {
    Handle(Handle),
    /// Inside the rect, away from any handle
    Body,
}

/// Find the handle or body under `point`. Rotation wins, then corners, then
/// edges.
pub fn hit_test(rect: Rect, point: Point) -> Option<Grip> {
    let near = |h: Handle| (h.position(rect) - point).hypot() <= HANDLE_RADIUS;
    std::iter::once(Handle::Rotate)
        .chain(Handle::CORNERS)
        .chain(Handle::EDGES)
        .find(|&h| near(h))
        .map(Grip::Handle)
        .or_else(|| rect.contains(point).then_some(Grip::Body))
}

// ============================================================================
// TRANSFORMER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Move,
    Scale(Handle),
    Rotate,
}

#[derive(Debug, Clone, Copy)]
struct Active {
    mode: Mode,
    pivot: Point,
    last: Point,
}

#[derive(Debug, Clone)]
struct Tracked {
    target: SelectionTarget,
    /// Item coordinates to scene, fixed while a gesture runs
    container: Transform,
    start: Transform,
    current: Transform,
    /// Bounds in item coordinates
    local: Rect,
}

impl Tracked {
    fn scene_bounds(&self) -> Rect {
        self.current.then(self.container).map_rect(self.local)
    }
}

/// Transforms a selection as one rigid group
#[derive(Debug, Clone)]
pub struct SelectionTransformer {
    items: Vec<Tracked>,
    active: Option<Active>,
}

impl SelectionTransformer {
    /// Track every selected target still present in the layout.
    pub fn new(layout: &StemLayout, selection: &Selection) -> Self {
        let items = selection
            .iter()
            .filter_map(|target| track(layout, target))
            .collect();
        Self {
            items,
            active: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Bounding rect of the group in the scene, `None` when empty
    pub fn rect(&self) -> Option<Rect> {
        self.items
            .iter()
            .map(Tracked::scene_bounds)
            .reduce(|a, b| a.union(b))
    }

    /// The pivot of the running gesture
    pub fn pivot(&self) -> Option<Point> {
        self.active.map(|a| a.pivot)
    }

    /// Start a gesture. `centred` scales about the rect centre instead of the
    /// opposite handle.
    pub fn press(&mut self, grip: Grip, point: Point, centred: bool) {
        let Some(rect) = self.rect() else {
            return;
        };
        let (mode, pivot) = match grip {
            Grip::Body => (Mode::Move, point),
            Grip::Handle(Handle::Rotate) => (Mode::Rotate, rect.center()),
            Grip::Handle(h) => (Mode::Scale(h), h.pivot(rect, centred)),
        };
        tracing::debug!("Selection {:?} about {:?}", mode, pivot);
        self.active = Some(Active {
            mode,
            pivot,
            last: point,
        });
    }

    /// Continue the gesture to `point`. `free_aspect` lets corner handles
    /// scale the two axes independently.
    ///
    /// A scale step whose factor on either axis is 0 (the pointer crossed
    /// the pivot's line) is dropped and the gesture keeps its previous
    /// anchor, so the items never collapse to zero width or height.
    pub fn drag(&mut self, point: Point, free_aspect: bool) {
        let Some(active) = self.active else {
            return;
        };
        let (p0, p1, pivot) = (active.last, point, active.pivot);
        if p0 == p1 {
            return;
        }

        let step = match active.mode {
            Mode::Move => {
                let d = p1 - p0;
                Transform::translate(d.x, d.y)
            }
            Mode::Rotate => {
                let (a, b) = (p0 - pivot, p1 - pivot);
                Transform::about(pivot, Transform::rotate(b.atan2() - a.atan2()))
            }
            Mode::Scale(handle) => {
                let (kx, ky) = scale_factors(handle, pivot, p0, p1, free_aspect);
                if kx == 0.0 || ky == 0.0 {
                    // Collapsing an axis cannot be undone by later steps
                    return;
                }
                Transform::about(pivot, Transform::scale(kx, ky))
            }
        };
        self.active = Some(Active {
            last: point,
            ..active
        });
        self.apply(step);
    }

    /// Apply a scene-space transform to every item.
    pub fn apply(&mut self, step: Transform) {
        for item in &mut self.items {
            // Conjugate by the container so the step acts in scene space
            item.current = item
                .current
                .then(item.container)
                .then(step)
                .then(item.container.inverse());
        }
    }

    /// Put every item back where the gesture started.
    pub fn cancel(&mut self) {
        for item in &mut self.items {
            item.current = item.start;
        }
        self.active = None;
    }

    /// Write every changed item in one batch and start afresh from the
    /// stored state.
    pub fn release<S: NodeStore + ?Sized>(
        &mut self,
        layout: &mut StemLayout,
        store: &mut S,
    ) -> Result<Option<BatchId>, Error> {
        self.active = None;
        let placements: Vec<Placement> = self
            .items
            .iter()
            .filter(|item| item.current != item.start)
            .map(|item| match &item.target {
                SelectionTarget::Content { stem, uid } => Placement::Content {
                    stem: *stem,
                    uid: uid.clone(),
                    frame: item.current,
                },
                SelectionTarget::Stem(id) => Placement::Stem {
                    id: *id,
                    local: item.current,
                },
            })
            .collect();
        let batch = layout.apply_placements(store, &placements)?;
        self.refresh(layout);
        Ok(batch)
    }

    /// Re-read every target from the layout, dropping any that vanished.
    pub fn refresh(&mut self, layout: &StemLayout) {
        self.items = self
            .items
            .iter()
            .filter_map(|item| track(layout, &item.target))
            .collect();
    }
}

fn track(layout: &StemLayout, target: &SelectionTarget) -> Option<Tracked> {
    let (container, start, local) = match target {
        SelectionTarget::Content { stem, uid } => {
            let item = layout.content(*stem, uid).ok()?;
            (
                layout.content_transform(*stem).ok()?,
                item.frame(),
                item.local_bounds(),
            )
        }
        SelectionTarget::Stem(id) => {
            let container = match layout.parent(*id).ok()? {
                Some(parent) => layout.scene_transform(parent.id).ok()?,
                None => Transform::IDENTITY,
            };
            (
                container,
                layout.local_transform(*id).ok()?,
                layout.leaf_rect(*id).ok()?,
            )
        }
    };
    Some(Tracked {
        target: target.clone(),
        container,
        start,
        current: start,
        local,
    })
}

/// Per-axis factors for one scale step from `p0` to `p1` about `pivot`.
fn scale_factors(handle: Handle, pivot: Point, p0: Point, p1: Point, free_aspect: bool) -> (f64, f64) {
    let (from, to) = (p0 - pivot, p1 - pivot);
    let ratio = |a: f64, b: f64| if a == 0.0 { 0.0 } else { b / a };
    let mut kx = ratio(from.x, to.x);
    let mut ky = ratio(from.y, to.y);
    match handle {
        Handle::Top | Handle::Bottom => kx = 1.0,
        Handle::Left | Handle::Right => ky = 1.0,
        _ => {}
    }
    if !free_aspect {
        let k = if (kx - 1.0).abs() > (ky - 1.0).abs() { kx } else { ky };
        kx = k;
        ky = k;
    }
    (kx, ky)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::model::{ContentItem, MemoryStore, NodeId, StemNode, TextContent};
    use kurbo::Vec2;
    use std::f64::consts::FRAC_PI_2;

    fn assert_near(a: Point, b: Point) {
        assert!((a - b).hypot() < 1e-6, "{a:?} != {b:?}");
    }

    fn rect_near(a: Rect, b: Rect) {
        assert_near(Point::new(a.x0, a.y0), Point::new(b.x0, b.y0));
        assert_near(Point::new(a.x1, a.y1), Point::new(b.x1, b.y1));
    }

    /// A top-level stem holding one 100 x 16 text frame, centred on the origin
    fn single_item() -> (MemoryStore, StemLayout, NodeId) {
        let mut store = MemoryStore::new();
        let root = store.root();
        let mut node = StemNode::at(Vec2::new(0.0, 0.0), 1.0);
        node.content.insert(
            "t".to_string(),
            ContentItem::Text(TextContent {
                source: "hello".to_string(),
                frame: Transform::IDENTITY,
                maxwidth: 100.0,
                z: 0.0,
            }),
        );
        let top = store.add_stem(root, node).unwrap();
        let layout = StemLayout::load(&store, &Config::default()).unwrap();
        (store, layout, top)
    }

    fn select_text(stem: NodeId) -> Selection {
        [SelectionTarget::Content {
            stem,
            uid: "t".to_string(),
        }]
        .into_iter()
        .collect()
    }

    #[test]
    fn pivots_are_opposite_the_handle() {
        let rect = Rect::new(0.0, 0.0, 100.0, 50.0);
        assert_eq!(Handle::BottomRight.pivot(rect, false), Point::new(0.0, 0.0));
        assert_eq!(Handle::TopLeft.pivot(rect, false), Point::new(100.0, 50.0));
        assert_eq!(Handle::TopRight.pivot(rect, false), Point::new(0.0, 50.0));
        assert_eq!(Handle::Top.pivot(rect, false), Point::new(50.0, 50.0));
        assert_eq!(Handle::Right.pivot(rect, false), Point::new(0.0, 25.0));
        assert_eq!(Handle::Right.pivot(rect, true), Point::new(50.0, 25.0));
        assert_eq!(Handle::Rotate.pivot(rect, false), Point::new(50.0, 25.0));
    }

    #[test]
    fn hit_test_prefers_handles() {
        let rect = Rect::new(0.0, 0.0, 100.0, 50.0);
        assert_eq!(
            hit_test(rect, Point::new(98.0, 49.0)),
            Some(Grip::Handle(Handle::BottomRight))
        );
        assert_eq!(
            hit_test(rect, Point::new(50.0, -20.0)),
            Some(Grip::Handle(Handle::Rotate))
        );
        assert_eq!(
            hit_test(rect, Point::new(0.0, 25.0)),
            Some(Grip::Handle(Handle::Left))
        );
        assert_eq!(hit_test(rect, Point::new(30.0, 30.0)), Some(Grip::Body));
        assert_eq!(hit_test(rect, Point::new(300.0, 30.0)), None);
        assert!(Handle::TopLeft.is_corner());
        assert!(!Handle::Top.is_corner());
    }

    #[test]
    fn scale_factor_rules() {
        let pivot = Point::ZERO;
        // Uniform: the factor further from 1 wins
        let (kx, ky) = scale_factors(
            Handle::BottomRight,
            pivot,
            Point::new(10.0, 10.0),
            Point::new(30.0, 15.0),
            false,
        );
        assert_eq!((kx, ky), (3.0, 3.0));

        let (kx, ky) = scale_factors(
            Handle::BottomRight,
            pivot,
            Point::new(10.0, 10.0),
            Point::new(30.0, 15.0),
            true,
        );
        assert_eq!((kx, ky), (3.0, 1.5));

        // Equally far from 1: the y factor wins
        let (kx, ky) = scale_factors(
            Handle::BottomRight,
            pivot,
            Point::new(10.0, 10.0),
            Point::new(5.0, 15.0),
            false,
        );
        assert_eq!((kx, ky), (1.5, 1.5));

        // Edge handles lock the other axis before free scaling
        let (kx, ky) = scale_factors(
            Handle::Right,
            pivot,
            Point::new(10.0, 10.0),
            Point::new(20.0, 40.0),
            true,
        );
        assert_eq!((kx, ky), (2.0, 1.0));

        // Zero denominators give a zero factor
        let (kx, _) = scale_factors(
            Handle::BottomRight,
            pivot,
            Point::new(0.0, 10.0),
            Point::new(5.0, 10.0),
            true,
        );
        assert_eq!(kx, 0.0);
    }

    #[test]
    fn corner_drag_scales_about_opposite_corner() {
        let (mut store, mut layout, top) = single_item();
        let mut transformer = SelectionTransformer::new(&layout, &select_text(top));
        let rect = transformer.rect().unwrap();
        rect_near(rect, Rect::new(-50.0, -8.0, 50.0, 8.0));

        let corner = Handle::BottomRight.position(rect);
        transformer.press(Grip::Handle(Handle::BottomRight), corner, false);
        assert_near(transformer.pivot().unwrap(), Point::new(-50.0, -8.0));

        // Double the width; uniform scaling doubles the height too
        transformer.drag(Point::new(150.0, 8.0), false);
        rect_near(transformer.rect().unwrap(), Rect::new(-50.0, -8.0, 150.0, 24.0));

        let batches = store.batches().len();
        let batch = transformer.release(&mut layout, &mut store).unwrap();
        assert!(batch.is_some());
        assert_eq!(store.batches().len(), batches + 1);

        let frame = store.stem(top).unwrap().content["t"].frame();
        assert!((frame.m11() - 2.0).abs() < 1e-9);
        assert!((frame.m22() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn zero_factor_step_is_dropped() {
        let (_store, layout, top) = single_item();
        let mut transformer = SelectionTransformer::new(&layout, &select_text(top));
        let rect = transformer.rect().unwrap();
        let corner = Handle::BottomRight.position(rect);
        transformer.press(Grip::Handle(Handle::BottomRight), corner, false);

        // Onto the pivot's vertical: x factor 0
        transformer.drag(Point::new(-50.0, 20.0), false);
        rect_near(transformer.rect().unwrap(), rect);

        // Later steps still measure from the press point
        transformer.drag(Point::new(150.0, 8.0), false);
        rect_near(transformer.rect().unwrap(), Rect::new(-50.0, -8.0, 150.0, 24.0));
    }

    #[test]
    fn rotate_turns_about_centre() {
        let (_store, layout, top) = single_item();
        let mut transformer = SelectionTransformer::new(&layout, &select_text(top));
        let rect = transformer.rect().unwrap();
        let centre = rect.center();

        transformer.press(Grip::Handle(Handle::Rotate), centre + Vec2::new(10.0, 0.0), false);
        transformer.drag(centre + Vec2::new(0.0, 10.0), false);

        let rotated = transformer.rect().unwrap();
        assert_near(rotated.center(), centre);
        assert!((rotated.width() - rect.height()).abs() < 1e-6);
        let t = transformer.items[0].current;
        assert!((t.decompose_rotation() - FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn body_drag_moves_and_cancel_restores() {
        let (_store, layout, top) = single_item();
        let mut transformer = SelectionTransformer::new(&layout, &select_text(top));
        let rect = transformer.rect().unwrap();

        transformer.press(Grip::Body, Point::new(0.0, 0.0), false);
        transformer.drag(Point::new(5.0, 5.0), false);
        transformer.drag(Point::new(12.0, -3.0), false);
        rect_near(transformer.rect().unwrap(), rect + Vec2::new(12.0, -3.0));

        transformer.cancel();
        assert!(!transformer.is_active());
        rect_near(transformer.rect().unwrap(), rect);
    }

    #[test]
    fn release_without_change_writes_nothing() {
        let (mut store, mut layout, top) = single_item();
        let mut transformer = SelectionTransformer::new(&layout, &select_text(top));
        transformer.press(Grip::Body, Point::ZERO, false);
        let before = store.log().len();
        assert_eq!(transformer.release(&mut layout, &mut store).unwrap(), None);
        assert_eq!(store.log().len(), before);
    }

    #[test]
    fn stems_move_in_parent_frame() {
        let (mut store, _layout, top) = single_item();
        let child = store
            .add_stem(top, StemNode::at(Vec2::new(20.0, 0.0), 1.0))
            .unwrap();
        let mut layout = StemLayout::load(&store, &Config::default()).unwrap();

        let selection: Selection = [SelectionTarget::Stem(child)].into_iter().collect();
        let mut transformer = SelectionTransformer::new(&layout, &selection);
        transformer.press(Grip::Body, Point::ZERO, false);
        transformer.drag(Point::new(0.0, 30.0), false);
        transformer.release(&mut layout, &mut store).unwrap();

        assert_eq!(store.stem(child).unwrap().pos, [20.0, 30.0]);
        assert_eq!(layout.base(child).unwrap(), Point::new(20.0, 30.0));
    }
}
