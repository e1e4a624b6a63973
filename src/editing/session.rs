// Copyright 2025 the Nexus Authors
// SPDX-License-Identifier: Apache-2.0

//! Canvas session - routes pointer input to the layout and ink engines
//!
//! The session owns the store, the layout built from it and all transient
//! gesture state. Each completed gesture issues at most one store batch, and
//! every gesture is fully unwound by [`CanvasSession::pointer_cancel`].

use super::gesture::{GestureController, GestureKind, GestureState, InputSource, PointerEvent};
use super::selection::{Selection, SelectionTarget, lasso_select};
use super::selection_transform::{self, Grip, Handle, SelectionTransformer};
use crate::config::Config;
use crate::error::Error;
use crate::ink::{RibbonStroker, Sample, StrokeProcessor};
use crate::layout::{Leaf, StemLayout};
use crate::model::{ContentItem, NodeId, NodeStore, StemNode, StrokeContent, Transform};
use crate::settings;
use kurbo::{BezPath, Point, Rect};

/// Active tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    /// Move stems and grow new ones
    #[default]
    Arrange,
    /// Draw ink
    Pen,
    /// Select, scale and rotate content
    Select,
}

/// Style of new strokes
#[derive(Debug, Clone, PartialEq)]
pub struct PenStyle {
    /// `#RRGGBB`
    pub color: String,
    pub width: f64,
    pub opacity: f64,
}

impl Default for PenStyle {
    fn default() -> Self {
        Self {
            color: settings::ink::COLOR.to_string(),
            width: settings::ink::WIDTH,
            opacity: settings::ink::OPACITY,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Press {
    pos: Point,
    time: f64,
    stem: Option<NodeId>,
}

/// A new stem being pulled out of `parent`
#[derive(Debug, Clone, Copy)]
struct Bud {
    parent: NodeId,
    /// Scene position of the pointer
    pointer: Point,
}

/// Editing state of one canvas
#[derive(Debug)]
pub struct CanvasSession<S: NodeStore> {
    config: Config,
    store: S,
    layout: StemLayout,
    processor: StrokeProcessor,
    stroker: RibbonStroker,
    tool: Tool,
    pen: PenStyle,
    selection: Selection,
    transformer: Option<SelectionTransformer>,
    gesture: GestureController,
    press: Option<Press>,
    samples: Vec<Sample>,
    lasso: Vec<Point>,
    bud: Option<Bud>,
}

impl<S: NodeStore> CanvasSession<S> {
    /// Lay out everything in `store`.
    pub fn new(store: S, config: Config) -> Result<Self, Error> {
        let layout = StemLayout::load(&store, &config)?;
        let processor = StrokeProcessor::new(&config);
        Ok(Self {
            config,
            store,
            layout,
            processor,
            stroker: RibbonStroker::default(),
            tool: Tool::default(),
            pen: PenStyle::default(),
            selection: Selection::new(),
            transformer: None,
            gesture: GestureController::new(),
            press: None,
            samples: Vec::new(),
            lasso: Vec::new(),
            bud: None,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Give the store back, dropping all transient state
    pub fn into_store(self) -> S {
        self.store
    }

    pub fn layout(&self) -> &StemLayout {
        &self.layout
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn gesture_state(&self) -> GestureState {
        self.gesture.state()
    }

    pub fn pen(&self) -> &PenStyle {
        &self.pen
    }

    pub fn set_pen(&mut self, pen: PenStyle) {
        self.pen = pen;
    }

    /// Switch tools, abandoning any gesture in progress.
    pub fn set_tool(&mut self, tool: Tool) {
        self.pointer_cancel();
        self.tool = tool;
        self.rebuild_transformer();
        tracing::debug!("Tool {:?}", tool);
    }

    /// Replace the selection.
    pub fn select(&mut self, selection: Selection) {
        self.selection = selection;
        self.selection.retain_existing(&self.layout);
        self.rebuild_transformer();
    }

    /// Rebuild the layout after the store changed behind the session's back.
    pub fn reload(&mut self) -> Result<(), Error> {
        self.pointer_cancel();
        self.layout.renew(&self.store)?;
        self.selection.retain_existing(&self.layout);
        self.rebuild_transformer();
        Ok(())
    }

    fn rebuild_transformer(&mut self) {
        self.transformer = match self.tool {
            Tool::Select if !self.selection.is_empty() => {
                Some(SelectionTransformer::new(&self.layout, &self.selection))
            }
            _ => None,
        };
    }

    // ------------------------------------------------------------------
    // Pointer input
    // ------------------------------------------------------------------

    pub fn pointer_down(&mut self, event: PointerEvent) -> Result<(), Error> {
        if !self.gesture.is_idle() {
            tracing::debug!("Ignoring {:?} press during {:?}", event.source, self.gesture.state());
            return Ok(());
        }
        match self.tool {
            Tool::Pen => self.begin_ink(event),
            Tool::Arrange => self.begin_arrange(event),
            Tool::Select => self.begin_select(event),
        }
        Ok(())
    }

    pub fn pointer_move(&mut self, event: PointerEvent) -> Result<(), Error> {
        if !self.gesture.accepts(event.source) {
            return Ok(());
        }
        let Some(kind) = self.gesture.kind() else {
            return Ok(());
        };
        match kind {
            GestureKind::Inking => {
                let sample = self.processor.sample(event.pos, event.pressure, event.time);
                self.samples.push(sample);
            }
            GestureKind::Pressed => self.pressed_move(event)?,
            GestureKind::Dragging if self.tool == Tool::Arrange => {
                if let Some(press) = self.press {
                    self.layout.move_selected(event.pos - press.pos)?;
                }
            }
            GestureKind::Dragging | GestureKind::Scaling | GestureKind::Rotating => {
                if let Some(transformer) = self.transformer.as_mut() {
                    transformer.drag(event.pos, event.modifiers.shift);
                }
            }
            GestureKind::Lassoing => self.lasso.push(event.pos),
            GestureKind::Budding => {
                if let Some(bud) = self.bud.as_mut() {
                    bud.pointer = event.pos;
                }
            }
            GestureKind::Pinching => {}
        }
        Ok(())
    }

    pub fn pointer_up(&mut self, event: PointerEvent) -> Result<(), Error> {
        if !self.gesture.accepts(event.source) {
            return Ok(());
        }
        // Take the moving position into account before finishing
        self.pointer_move(event)?;
        let Some(kind) = self.gesture.end(event.source) else {
            return Ok(());
        };
        let press = self.press.take();

        match kind {
            GestureKind::Inking => self.finish_ink(press.and_then(|p| p.stem))?,
            GestureKind::Pressed => {}
            GestureKind::Dragging if self.tool == Tool::Arrange => {
                self.layout.end_move(&mut self.store)?;
            }
            GestureKind::Dragging | GestureKind::Scaling | GestureKind::Rotating => {
                if let Some(transformer) = self.transformer.as_mut() {
                    transformer.release(&mut self.layout, &mut self.store)?;
                }
            }
            GestureKind::Lassoing => {
                let lasso = std::mem::take(&mut self.lasso);
                let selection = lasso_select(&self.layout, &lasso);
                self.select(selection);
            }
            GestureKind::Budding => {
                if let Some(bud) = self.bud.take() {
                    self.finish_bud(bud)?;
                }
            }
            GestureKind::Pinching => {}
        }
        Ok(())
    }

    /// Abandon the running gesture and undo its unsaved effects.
    pub fn pointer_cancel(&mut self) {
        let Some(kind) = self.gesture.cancel() else {
            return;
        };
        match kind {
            GestureKind::Dragging if self.tool == Tool::Arrange => self.layout.cancel_move(),
            GestureKind::Dragging | GestureKind::Scaling | GestureKind::Rotating => {
                if let Some(transformer) = self.transformer.as_mut() {
                    transformer.cancel();
                }
            }
            _ => {}
        }
        self.press = None;
        self.samples.clear();
        self.lasso.clear();
        self.bud = None;
        tracing::debug!("Cancelled {:?}", kind);
    }

    /// Let time pass without pointer movement. A press held long enough
    /// turns into a new-branch gesture.
    pub fn tick(&mut self, time: f64) {
        if self.gesture.kind() != Some(GestureKind::Pressed) {
            return;
        }
        if let Some(press) = self.press {
            self.check_long_press(press, press.pos, time);
        }
    }

    /// A two-finger gesture takes over from any pointer gesture.
    pub fn begin_pinch(&mut self) -> bool {
        self.pointer_cancel();
        self.gesture.begin(InputSource::Touch, GestureKind::Pinching)
    }

    pub fn end_pinch(&mut self) {
        if self.gesture.kind() == Some(GestureKind::Pinching) {
            self.gesture.end(InputSource::Touch);
        }
    }

    fn begin_ink(&mut self, event: PointerEvent) {
        self.gesture.begin(event.source, GestureKind::Inking);
        self.samples.clear();
        self.samples
            .push(self.processor.sample(event.pos, event.pressure, event.time));
        self.press = Some(Press {
            pos: event.pos,
            time: event.time,
            stem: self.layout.stem_at(event.pos),
        });
    }

    fn begin_arrange(&mut self, event: PointerEvent) {
        let stem = self.layout.stem_at(event.pos);
        match stem {
            Some(id) => {
                let target = SelectionTarget::Stem(id);
                if event.modifiers.shift {
                    self.selection.insert(target);
                } else if !self.selection.contains(&target) {
                    self.selection = [target].into_iter().collect();
                }
            }
            None if !event.modifiers.shift => self.selection.clear(),
            None => {}
        }

        let press = Press {
            pos: event.pos,
            time: event.time,
            stem,
        };
        self.press = Some(press);
        self.gesture.begin(event.source, GestureKind::Pressed);
        if event.modifiers.ctrl {
            self.start_bud(press, event.pos);
        }
    }

    fn begin_select(&mut self, event: PointerEvent) {
        let grip = self
            .transformer
            .as_ref()
            .and_then(SelectionTransformer::rect)
            .and_then(|rect| selection_transform::hit_test(rect, event.pos));

        let kind = match grip {
            Some(Grip::Body) => GestureKind::Dragging,
            Some(Grip::Handle(Handle::Rotate)) => GestureKind::Rotating,
            Some(Grip::Handle(_)) => GestureKind::Scaling,
            None => match self.content_at(event.pos) {
                Some(target) => {
                    let mut selection = if event.modifiers.shift {
                        self.selection.clone()
                    } else {
                        Selection::new()
                    };
                    selection.insert(target);
                    self.select(selection);
                    GestureKind::Dragging
                }
                None => {
                    self.lasso = vec![event.pos];
                    self.gesture.begin(event.source, GestureKind::Lassoing);
                    return;
                }
            },
        };

        if let Some(transformer) = self.transformer.as_mut() {
            transformer.press(grip.unwrap_or(Grip::Body), event.pos, event.modifiers.alt);
        }
        self.press = Some(Press {
            pos: event.pos,
            time: event.time,
            stem: None,
        });
        self.gesture.begin(event.source, kind);
    }

    fn pressed_move(&mut self, event: PointerEvent) -> Result<(), Error> {
        let Some(press) = self.press else {
            return Ok(());
        };
        let delta = event.pos - press.pos;
        if delta.hypot() <= self.config.no_move_threshold {
            self.check_long_press(press, event.pos, event.time);
            return Ok(());
        }
        let stems = self.selection.stems();
        if stems.is_empty() {
            return Ok(());
        }
        self.layout.begin_move(&stems)?;
        self.gesture.transition(GestureKind::Dragging);
        self.layout.move_selected(delta)?;
        Ok(())
    }

    fn check_long_press(&mut self, press: Press, pointer: Point, time: f64) {
        let held_ms = (time - press.time) * 1000.0;
        if held_ms >= self.config.long_press_ms as f64 {
            self.start_bud(press, pointer);
        }
    }

    fn start_bud(&mut self, press: Press, pointer: Point) {
        let Some(parent) = press.stem else {
            return;
        };
        tracing::debug!("Budding from {parent}");
        self.bud = Some(Bud { parent, pointer });
        self.gesture.transition(GestureKind::Budding);
    }

    fn finish_bud(&mut self, bud: Bud) -> Result<(), Error> {
        let drop = self
            .layout
            .scene_transform(bud.parent)?
            .inverse()
            .map_point(bud.pointer);
        let id = self.layout.new_stem(&mut self.store, bud.parent, drop, None)?;
        self.selection = [SelectionTarget::Stem(id)].into_iter().collect();
        Ok(())
    }

    fn finish_ink(&mut self, stem: Option<NodeId>) -> Result<(), Error> {
        let samples = std::mem::take(&mut self.samples);

        // Ink lands in the content coordinates of the stem under the pen,
        // or of a new top-level stem anchored at the first sample.
        let (to_content, anchor) = match stem {
            Some(id) => (self.layout.content_transform(id)?.inverse(), None),
            None => match samples.first() {
                Some(first) => (
                    Transform::translate(-first.x, -first.y),
                    Some(first.point()),
                ),
                None => (Transform::IDENTITY, None),
            },
        };
        let local: Vec<Sample> = samples
            .iter()
            .map(|s| {
                let p = to_content.map_point(s.point());
                Sample { x: p.x, y: p.y, ..*s }
            })
            .collect();

        let Some(stroke) = self.processor.process(&local) else {
            return Ok(());
        };
        if stroke.is_instant() {
            tracing::warn!("Zero duration stroke, nothing written");
            return Ok(());
        }
        let max_z = match stem {
            Some(id) => self.layout.get(id)?.node.max_z(),
            None => 0.0,
        };
        let item = ContentItem::Stroke(StrokeContent {
            color: self.pen.color.clone(),
            opacity: self.pen.opacity,
            width: self.pen.width * stroke.width_scale,
            frame: Transform::translate(stroke.origin.x, stroke.origin.y),
            stroke: stroke.points,
            z: max_z + 1.0,
        });

        match (stem, anchor) {
            (Some(id), _) => {
                self.layout.add_content(&mut self.store, id, item)?;
            }
            (None, Some(anchor)) => {
                let mut node = StemNode::default();
                node.content.insert(crate::model::ids::content_uid(), item);
                // The leaf is centred on the stem origin, so shift the stem
                // by the leaf centre to keep the ink where it was drawn.
                let centre = Leaf::new(&node).c();
                node.set_pos(anchor.to_vec2() + centre.to_vec2());
                self.layout.new_top_stem(&mut self.store, node)?;
            }
            (None, None) => {}
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Direct actions
    // ------------------------------------------------------------------

    /// Add a child below the existing children of `parent`.
    pub fn add_child(&mut self, parent: NodeId) -> Result<NodeId, Error> {
        self.pointer_cancel();
        self.layout
            .add_child_stem(&mut self.store, parent, StemNode::default())
    }

    /// Delete a stem and its subtree.
    pub fn delete_stem(&mut self, id: NodeId) -> Result<(), Error> {
        self.pointer_cancel();
        self.layout.delete_stem(&mut self.store, id)?;
        self.selection.retain_existing(&self.layout);
        self.rebuild_transformer();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries for drawing
    // ------------------------------------------------------------------

    /// Topmost content item under `point`, using the ribbon outline for ink.
    pub fn content_at(&self, point: Point) -> Option<SelectionTarget> {
        for id in self.layout.preorder().into_iter().rev() {
            let (Ok(stem), Ok(container)) = (self.layout.get(id), self.layout.content_transform(id)) else {
                continue;
            };
            let mut items: Vec<_> = stem.node.content.iter().collect();
            items.sort_by(|a, b| b.1.z().total_cmp(&a.1.z()));
            for (uid, item) in items {
                let local = item.frame().then(container).inverse().map_point(point);
                let hit = match item {
                    ContentItem::Stroke(s) => self.stroker.hit_test(&s.stroke, s.width, local),
                    ContentItem::Text(_) | ContentItem::Image(_) => item.local_bounds().contains(local),
                };
                if hit {
                    return Some(SelectionTarget::Content {
                        stem: id,
                        uid: uid.clone(),
                    });
                }
            }
        }
        None
    }

    /// Filled outline of a stroke, in scene coordinates.
    pub fn stroke_outline(&self, stem: NodeId, uid: &str) -> Result<Option<BezPath>, Error> {
        let ContentItem::Stroke(stroke) = self.layout.content(stem, uid)? else {
            return Ok(None);
        };
        let to_scene = stroke.frame.then(self.layout.content_transform(stem)?);
        let mut path = self.stroker.outline(&stroke.stroke, stroke.width);
        path.apply_affine(to_scene.affine());
        Ok(Some(path))
    }

    /// Preview of the stem being grown, in scene coordinates.
    pub fn bud_path(&self) -> Result<Option<BezPath>, Error> {
        let Some(bud) = self.bud else {
            return Ok(None);
        };
        let to_scene = self.layout.scene_transform(bud.parent)?;
        let pointer = to_scene.inverse().map_point(bud.pointer);
        let mut path = self.layout.bud_path(bud.parent, pointer)?;
        path.apply_affine(to_scene.affine());
        Ok(Some(path))
    }

    /// Bounding rect of the Select tool's selection
    pub fn selection_rect(&self) -> Option<Rect> {
        self.transformer.as_ref().and_then(SelectionTransformer::rect)
    }

    /// Points of the lasso being drawn
    pub fn lasso(&self) -> &[Point] {
        &self.lasso
    }

    /// Raw samples of the stroke being drawn
    pub fn ink_preview(&self) -> impl Iterator<Item = Point> + '_ {
        self.samples.iter().map(Sample::point)
    }
}
