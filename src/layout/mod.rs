// Copyright 2025 the Nexus Authors
// SPDX-License-Identifier: Apache-2.0

//! Stem tree geometry.
//!
//! [`StemLayout`] mirrors the visible part of the stored stem tree as an
//! index-addressed arena: every stem keeps its parent as a [`NodeId`] handle
//! and all geometry (direction, base, tip, transforms, tails) is derived on
//! demand by walking those handles. Nothing here is persisted except through
//! the explicit store writes, and each user action issues exactly one batch.

pub mod leaf;
pub mod ordering;
pub mod style;
pub mod tail;

pub use leaf::Leaf;
pub use style::{StyleKey, StyleValue};

use crate::config::Config;
use crate::error::{Error, InvariantError, StoreError};
use crate::model::ids::content_uid;
use crate::model::stem::sign;
use crate::model::{BatchId, ContentItem, NodeId, NodeStore, StemNode, Transform};
use crate::settings::placement::{CHILD_OFFSET_X, FIRST_CHILD_OFFSET_Y, NEXT_CHILD_GAP_Y};
use crate::settings::stem::{ROOT_WIDTH, STEM_WIDTH};
use kurbo::{BezPath, Point, Rect, Vec2};
use peniko::Color;
use std::collections::{BTreeMap, BTreeSet};

/// One visible stem
#[derive(Debug, Clone)]
pub struct LayoutStem {
    pub id: NodeId,
    /// Working copy of the stored attributes
    pub node: StemNode,
    /// `None` for top-level stems owned by the root node
    pub parent: Option<NodeId>,
    /// Visible children ordered by `index`
    pub children: Vec<NodeId>,
    /// Position among its siblings, by angle
    pub index: usize,
    /// Number of ancestor stems
    pub depth: usize,
    pub leaf: Leaf,
}

/// A new transform for one item of a group edit
#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    /// New `frame` of a content item
    Content {
        stem: NodeId,
        uid: String,
        frame: Transform,
    },
    /// New local transform of a stem, decomposed into pos, angle and scale
    Stem { id: NodeId, local: Transform },
}

/// Scene positions recorded when a move starts
#[derive(Debug, Clone, Copy)]
struct MoveAnchor {
    id: NodeId,
    scene_base: Point,
    scene_tip: Point,
    start_pos: [f64; 2],
    start_flip: f64,
}

/// Stored `pos` and `flip` for a child whose base sits at `offset` from its
/// parent's tip, measured in the parent's frame.
pub fn canonical_placement(offset: Vec2, parent_direction: f64) -> (Vec2, f64) {
    let flip = sign(offset.x) * parent_direction;
    let pos = if parent_direction * flip < 0.0 {
        Vec2::new(-offset.x, offset.y)
    } else {
        offset
    };
    (pos, flip)
}

#[derive(Debug, Clone)]
pub struct StemLayout {
    default_child_scale: f64,
    root: NodeId,
    top: Vec<NodeId>,
    stems: BTreeMap<NodeId, LayoutStem>,
    moving: Vec<MoveAnchor>,
}

impl StemLayout {
    /// An empty layout for the tree under `root`
    pub fn new(root: NodeId, config: &Config) -> Self {
        Self {
            default_child_scale: config.default_child_scale,
            root,
            top: Vec::new(),
            stems: BTreeMap::new(),
            moving: Vec::new(),
        }
    }

    /// Build the layout for everything reachable from the store's root.
    pub fn load<S: NodeStore + ?Sized>(store: &S, config: &Config) -> Result<Self, Error> {
        let mut layout = Self::new(store.root(), config);
        layout.renew(store)?;
        Ok(layout)
    }

    /// Rebuild the whole tree from the store, dropping any move in progress.
    pub fn renew<S: NodeStore + ?Sized>(&mut self, store: &S) -> Result<(), Error> {
        self.stems.clear();
        self.top.clear();
        self.moving.clear();
        for id in store.children(self.root)? {
            if self.attach(store, id, None, 0)? {
                self.top.push(id);
            }
        }
        tracing::info!("Layout renewed with {} stems", self.stems.len());
        Ok(())
    }

    /// Reload one stem and its subtree from the store.
    pub fn renew_stem<S: NodeStore + ?Sized>(&mut self, store: &S, id: NodeId) -> Result<(), Error> {
        let (parent, depth) = {
            let stem = self.get(id)?;
            (stem.parent, stem.depth)
        };
        self.detach(id);
        let visible = self.attach(store, id, parent, depth)?;
        match parent {
            Some(p) => {
                if !visible {
                    self.get_mut(p)?.children.retain(|c| *c != id);
                }
                self.reindex_children(p)?;
            }
            None if !visible => self.top.retain(|c| *c != id),
            None => {}
        }
        Ok(())
    }

    /// Insert `id` and its visible descendants. Returns false for a hidden
    /// stem, which is skipped together with its subtree.
    fn attach<S: NodeStore + ?Sized>(
        &mut self,
        store: &S,
        id: NodeId,
        parent: Option<NodeId>,
        depth: usize,
    ) -> Result<bool, Error> {
        if self.stems.contains_key(&id) {
            return Err(InvariantError::Cycle(id).into());
        }
        let node = match (store.stem(id), parent) {
            (Err(StoreError::MissingNode(_)), Some(parent)) => {
                return Err(InvariantError::DanglingParent { stem: id, parent }.into());
            }
            (node, _) => node?,
        };
        if node.hide {
            return Ok(false);
        }
        let leaf = Leaf::new(&node);
        self.stems.insert(
            id,
            LayoutStem {
                id,
                node,
                parent,
                children: Vec::new(),
                index: 0,
                depth,
                leaf,
            },
        );

        let mut children = Vec::new();
        for child in store.children(id)? {
            if self.attach(store, child, Some(id), depth + 1)? {
                children.push(child);
            }
        }
        self.get_mut(id)?.children = children;
        // Only once every child is in place
        self.reindex_children(id)?;
        Ok(true)
    }

    /// Remove a subtree from the arena without touching the parent's list.
    fn detach(&mut self, id: NodeId) {
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(stem) = self.stems.remove(&next) {
                pending.extend(stem.children);
            }
        }
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    /// The store node owning the top-level stems
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Top-level stems in store order
    pub fn top_level(&self) -> &[NodeId] {
        &self.top
    }

    pub fn len(&self) -> usize {
        self.stems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stems.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.stems.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> Result<&LayoutStem, InvariantError> {
        self.stems.get(&id).ok_or(InvariantError::UnknownStem(id))
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut LayoutStem, InvariantError> {
        self.stems.get_mut(&id).ok_or(InvariantError::UnknownStem(id))
    }

    /// The parent stem, `None` at the top level
    pub fn parent(&self, id: NodeId) -> Result<Option<&LayoutStem>, InvariantError> {
        match self.get(id)?.parent {
            None => Ok(None),
            Some(parent) => self
                .stems
                .get(&parent)
                .map(Some)
                .ok_or(InvariantError::DanglingParent { stem: id, parent }),
        }
    }

    /// Every visible stem, parents before children
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.stems.len());
        let mut pending: Vec<NodeId> = self.top.iter().rev().copied().collect();
        while let Some(id) = pending.pop() {
            out.push(id);
            if let Some(stem) = self.stems.get(&id) {
                pending.extend(stem.children.iter().rev());
            }
        }
        out
    }

    /// Child of `id` with sibling index `index`
    pub fn child(&self, id: NodeId, index: usize) -> Result<NodeId, InvariantError> {
        let stem = self.get(id)?;
        stem.children
            .iter()
            .copied()
            .find(|c| self.stems.get(c).is_some_and(|s| s.index == index))
            .ok_or(InvariantError::NoChildAtIndex { parent: id, index })
    }

    /// All descendants, depth first, children in index order
    pub fn all_child_stems(&self, id: NodeId) -> Result<Vec<NodeId>, InvariantError> {
        let mut out = Vec::new();
        for &child in &self.get(id)?.children {
            out.push(child);
            out.extend(self.all_child_stems(child)?);
        }
        Ok(out)
    }

    /// All ancestors, nearest first
    pub fn all_parent_stems(&self, id: NodeId) -> Result<Vec<NodeId>, InvariantError> {
        let mut out = Vec::new();
        let mut current = self.parent(id)?;
        while let Some(parent) = current {
            out.push(parent.id);
            current = self.parent(parent.id)?;
        }
        Ok(out)
    }

    pub fn content(&self, id: NodeId, uid: &str) -> Result<&ContentItem, InvariantError> {
        self.get(id)?
            .node
            .content
            .get(uid)
            .ok_or_else(|| InvariantError::UnknownContent {
                stem: id,
                uid: uid.to_string(),
            })
    }

    // ------------------------------------------------------------------
    // Geometry
    // ------------------------------------------------------------------

    /// +1 when the stem's subtree grows right, -1 when it grows left
    pub fn direction(&self, id: NodeId) -> Result<f64, InvariantError> {
        let flip = self.get(id)?.node.flip;
        match self.parent(id)? {
            None => Ok(1.0),
            Some(parent) => Ok(self.direction(parent.id)? * flip),
        }
    }

    pub fn depth(&self, id: NodeId) -> Result<usize, InvariantError> {
        Ok(self.get(id)?.depth)
    }

    /// Where the stem attaches, in the parent's frame (scene for top level)
    pub fn base(&self, id: NodeId) -> Result<Point, InvariantError> {
        let pos = self.get(id)?.node.pos();
        match self.parent(id)? {
            None => Ok(pos.to_point()),
            Some(parent) => {
                let offset = if self.direction(id)? < 0.0 {
                    Vec2::new(-pos.x, pos.y)
                } else {
                    pos
                };
                Ok(self.tip(parent.id)? + offset)
            }
        }
    }

    /// Where children attach, in the stem's own frame
    pub fn tip(&self, id: NodeId) -> Result<Point, InvariantError> {
        let stem = self.get(id)?;
        if stem.depth == 0 {
            return Ok(Point::ZERO);
        }
        Ok(Point::new(self.direction(id)? * stem.leaf.width(), 0.0))
    }

    /// Stem frame to parent frame
    pub fn local_transform(&self, id: NodeId) -> Result<Transform, InvariantError> {
        let node = &self.get(id)?.node;
        let base = self.base(id)?;
        Ok(Transform::from_trs(
            base.x,
            base.y,
            node.angle,
            node.placement_scale(),
            Point::ZERO,
        ))
    }

    /// Stem frame to scene
    pub fn scene_transform(&self, id: NodeId) -> Result<Transform, InvariantError> {
        let local = self.local_transform(id)?;
        match self.parent(id)? {
            None => Ok(local),
            Some(parent) => Ok(local.then(self.scene_transform(parent.id)?)),
        }
    }

    /// Translation placing the leaf content in the stem's frame
    pub fn leaf_offset(&self, id: NodeId) -> Result<Vec2, InvariantError> {
        let stem = self.get(id)?;
        Ok(stem
            .leaf
            .offset(stem.depth, self.direction(id)?, self.tip(id)?))
    }

    /// Content frame coordinates to scene
    pub fn content_transform(&self, id: NodeId) -> Result<Transform, InvariantError> {
        let offset = self.leaf_offset(id)?;
        Ok(Transform::translate(offset.x, offset.y).then(self.scene_transform(id)?))
    }

    /// Leaf title rect in the stem's frame
    pub fn leaf_rect(&self, id: NodeId) -> Result<Rect, InvariantError> {
        Ok(self.get(id)?.leaf.title_rect() + self.leaf_offset(id)?)
    }

    /// Bounding box of the leaf in the scene
    pub fn leaf_scene_bounds(&self, id: NodeId) -> Result<Rect, InvariantError> {
        Ok(self.scene_transform(id)?.map_rect(self.leaf_rect(id)?))
    }

    /// Half-width of the tail where it meets the parent, in the stem's frame
    pub fn tail_radius(&self, id: NodeId) -> Result<f64, InvariantError> {
        let stem = self.get(id)?;
        let width = if stem.depth == 1 { ROOT_WIDTH } else { STEM_WIDTH };
        let scale = stem.node.placement_scale();
        if scale.abs() < 1e-9 {
            return Ok(width);
        }
        Ok(width / scale)
    }

    /// Tail outline in the stem's frame; top-level stems have none.
    pub fn tail_path(&self, id: NodeId) -> Result<Option<BezPath>, InvariantError> {
        let Some(parent) = self.parent(id)? else {
            return Ok(None);
        };
        let proot = self
            .local_transform(id)?
            .inverse()
            .map_point(self.tip(parent.id)?);
        Ok(Some(tail::create_tail_path(
            proot,
            Point::ZERO,
            self.tip(id)?,
            self.direction(id)?,
            self.tail_radius(id)?,
        )))
    }

    /// Preview of a new child of `parent` reaching to `pointer`, both in the
    /// parent's frame.
    pub fn bud_path(&self, parent: NodeId, pointer: Point) -> Result<BezPath, InvariantError> {
        let r = if self.get(parent)?.depth == 0 {
            ROOT_WIDTH
        } else {
            STEM_WIDTH
        };
        Ok(tail::bud_path(self.tip(parent)?, pointer, r))
    }

    pub fn style(&self, id: NodeId, key: StyleKey) -> Result<StyleValue, InvariantError> {
        let mut chain = vec![&self.get(id)?.node];
        for ancestor in self.all_parent_stems(id)? {
            chain.push(&self.get(ancestor)?.node);
        }
        Ok(style::resolve(chain, key))
    }

    /// Branch colour with the inherited opacity applied
    pub fn branch_color(&self, id: NodeId) -> Result<Color, InvariantError> {
        let hex = self.style(id, StyleKey::BranchColor)?;
        let opacity = self
            .style(id, StyleKey::Opacity)?
            .as_number()
            .unwrap_or(crate::settings::style::OPACITY);
        let color = hex
            .as_color()
            .and_then(style::parse_color)
            .or_else(|| style::parse_color(crate::settings::style::BRANCH_COLOR))
            .unwrap_or(Color::BLACK);
        Ok(color.with_alpha(opacity as f32))
    }

    /// Sibling ordering key
    pub fn posangle(&self, id: NodeId) -> Result<f64, InvariantError> {
        let stem = self.get(id)?;
        Ok(ordering::posangle(
            stem.node.pos(),
            self.direction(id)?,
            stem.node.flip,
            stem.depth,
        ))
    }

    /// Sort the children of `id` by angle and give them dense indices.
    pub fn reindex_children(&mut self, id: NodeId) -> Result<(), InvariantError> {
        let children = self.get(id)?.children.clone();
        let keys = children
            .iter()
            .map(|&c| self.posangle(c))
            .collect::<Result<Vec<_>, _>>()?;
        let index = ordering::dense_order(&keys);

        let mut ordered: Vec<(usize, NodeId)> = index.into_iter().zip(children).collect();
        ordered.sort_by_key(|(i, _)| *i);
        for &(i, child) in &ordered {
            self.get_mut(child)?.index = i;
        }
        self.get_mut(id)?.children = ordered.into_iter().map(|(_, c)| c).collect();
        Ok(())
    }

    /// Topmost stem whose leaf contains `point` (scene coordinates).
    ///
    /// Parents draw above their children; among equals the later one wins.
    pub fn stem_at(&self, point: Point) -> Option<NodeId> {
        let mut best: Option<(usize, NodeId)> = None;
        for id in self.preorder() {
            let Ok(bounds) = self.leaf_scene_bounds(id) else {
                continue;
            };
            if !bounds.contains(point) {
                continue;
            }
            let depth = self.stems.get(&id).map_or(usize::MAX, |s| s.depth);
            if best.is_none_or(|(d, _)| depth <= d) {
                best = Some((depth, id));
            }
        }
        best.map(|(_, id)| id)
    }

    // ------------------------------------------------------------------
    // Moving stems
    // ------------------------------------------------------------------

    /// Drop stems whose ancestor is also selected, keeping input order.
    pub fn selection_roots(&self, selection: &[NodeId]) -> Result<Vec<NodeId>, InvariantError> {
        let selected: BTreeSet<NodeId> = selection.iter().copied().collect();
        let mut roots = Vec::new();
        for &id in selection {
            if roots.contains(&id) {
                continue;
            }
            let ancestors = self.all_parent_stems(id)?;
            if !ancestors.iter().any(|a| selected.contains(a)) {
                roots.push(id);
            }
        }
        Ok(roots)
    }

    pub fn is_moving(&self) -> bool {
        !self.moving.is_empty()
    }

    /// Record where the selected stems start. Deltas passed to
    /// [`StemLayout::move_selected`] are measured from this moment.
    pub fn begin_move(&mut self, selection: &[NodeId]) -> Result<(), InvariantError> {
        let roots = self.selection_roots(selection)?;
        let mut anchors = Vec::with_capacity(roots.len());
        for id in roots {
            let base = self.base(id)?;
            let scene_base = match self.parent(id)? {
                Some(parent) => self.scene_transform(parent.id)?.map_point(base),
                None => base,
            };
            let scene_tip = self.scene_transform(id)?.map_point(self.tip(id)?);
            let node = &self.get(id)?.node;
            anchors.push(MoveAnchor {
                id,
                scene_base,
                scene_tip,
                start_pos: node.pos,
                start_flip: node.flip,
            });
        }
        tracing::debug!("Move started for {} stems", anchors.len());
        self.moving = anchors;
        Ok(())
    }

    /// Move the selected stems by `delta` (scene units, cumulative since
    /// [`StemLayout::begin_move`]).
    ///
    /// A stem whose midpoint crosses its parent's tip is mirrored: its flip
    /// toggles and its old tip becomes the new base, so the stem turns over
    /// in place instead of jumping. Returns the stems that flipped on this
    /// call. Nothing is written to the store until [`StemLayout::end_move`].
    pub fn move_selected(&mut self, delta: Vec2) -> Result<Vec<NodeId>, InvariantError> {
        let mut flipped = Vec::new();
        for i in 0..self.moving.len() {
            let anchor = self.moving[i];
            let id = anchor.id;
            let depth = self.get(id)?.depth;
            let parent = self.parent(id)?.map(|p| p.id);

            let ptip = match parent {
                Some(p) => self.scene_transform(p)?.map_point(self.tip(p)?),
                None => Point::ZERO,
            };

            let mut new_base = anchor.scene_base + delta;
            let half = anchor.scene_base.midpoint(anchor.scene_tip) + delta;
            let direction = self.direction(id)?;

            let crosses = (direction > 0.0 && half.x < ptip.x) || (direction < 0.0 && half.x > ptip.x);
            if depth > 0 && crosses {
                new_base = anchor.scene_tip + delta;
                let slot = &mut self.moving[i];
                std::mem::swap(&mut slot.scene_base, &mut slot.scene_tip);
                self.get_mut(id)?.node.flip *= -1.0;
                flipped.push(id);
            }

            let offset = match parent {
                Some(p) => self.scene_transform(p)?.inverse().map_point(new_base) - self.tip(p)?,
                None => new_base.to_vec2(),
            };
            let pos = if self.direction(id)? < 0.0 {
                Vec2::new(-offset.x, offset.y)
            } else {
                offset
            };
            self.get_mut(id)?.node.set_pos(pos);
        }
        if !flipped.is_empty() {
            tracing::debug!("Flipped {:?}", flipped);
        }
        Ok(flipped)
    }

    /// Persist the moved stems in one batch and reorder their siblings.
    pub fn end_move<S: NodeStore + ?Sized>(&mut self, store: &mut S) -> Result<Option<BatchId>, Error> {
        if self.moving.is_empty() {
            return Ok(None);
        }
        let anchors = std::mem::take(&mut self.moving);
        let batch = store.new_batch_id();
        let mut parents = BTreeSet::new();
        for anchor in &anchors {
            let stem = self.get(anchor.id)?;
            store.save_stem(anchor.id, &stem.node, batch)?;
            if let Some(p) = stem.parent {
                parents.insert(p);
            }
        }
        for parent in parents {
            self.reindex_children(parent)?;
        }
        tracing::info!("Moved {} stems", anchors.len());
        Ok(Some(batch))
    }

    /// Put the selected stems back where they started.
    pub fn cancel_move(&mut self) {
        for anchor in std::mem::take(&mut self.moving) {
            if let Some(stem) = self.stems.get_mut(&anchor.id) {
                stem.node.pos = anchor.start_pos;
                stem.node.flip = anchor.start_flip;
            }
        }
    }

    // ------------------------------------------------------------------
    // Structural edits
    // ------------------------------------------------------------------

    /// Scale given to a new child of `parent`
    pub fn child_scale(&self, parent: NodeId) -> Result<f64, InvariantError> {
        if self.get(parent)?.depth == 0 {
            Ok(self.default_child_scale)
        } else {
            Ok(self.local_transform(parent)?.m11())
        }
    }

    /// Create a top-level stem from `node`, whose `pos` is its scene
    /// position. Any content it already holds is written in the same batch.
    pub fn new_top_stem<S: NodeStore + ?Sized>(&mut self, store: &mut S, node: StemNode) -> Result<NodeId, Error> {
        let batch = store.new_batch_id();
        let id = store.create_stem(self.root, node.clone(), batch)?;
        self.insert_created(id, node, None)?;
        tracing::info!("New top-level stem {id}");
        Ok(id)
    }

    /// Create a child of `parent` whose base lands on `drop` (parent frame).
    ///
    /// Children of top-level stems start a new branch and get `color`, or a
    /// random branch colour when `None`; deeper stems inherit theirs.
    pub fn new_stem<S: NodeStore + ?Sized>(
        &mut self,
        store: &mut S,
        parent: NodeId,
        drop: Point,
        color: Option<String>,
    ) -> Result<NodeId, Error> {
        let scale = self.child_scale(parent)?;
        let offset = drop - self.tip(parent)?;
        let (pos, flip) = canonical_placement(offset, self.direction(parent)?);

        let mut node = StemNode::at(pos, flip);
        node.scale = Some(scale);
        if self.get(parent)?.depth == 0 {
            node.branchcolor = Some(color.unwrap_or_else(style::random_branch_color));
        }

        let batch = store.new_batch_id();
        let id = store.create_stem(parent, node.clone(), batch)?;
        self.insert_created(id, node, Some(parent))?;
        tracing::info!("New stem {id} under {parent}, flip {flip}");
        Ok(id)
    }

    /// Where a new child of `parent` goes when there is no drop point,
    /// as an unscaled offset from the parent's tip in the parent's frame.
    ///
    /// Below the existing children, following their rough pattern.
    pub fn suggest_child_offset(&self, parent: NodeId) -> Result<Vec2, InvariantError> {
        let tip = self.tip(parent)?;
        let mut points = Vec::new();
        for &child in &self.get(parent)?.children {
            let p = self.local_transform(child)?.inverse().map_point(tip);
            points.push(Vec2::new(-p.x, -p.y));
        }

        match points.as_slice() {
            [] => Ok(Vec2::new(
                self.direction(parent)? * CHILD_OFFSET_X,
                FIRST_CHILD_OFFSET_Y,
            )),
            [only] => Ok(Vec2::new(only.x, only.y + NEXT_CHILD_GAP_Y)),
            [first, ..] => {
                let n = points.len() as f64;
                let (mut min_y, mut max_y) = (first.y, first.y);
                let mut sum_x = 0.0;
                for p in &points {
                    min_y = min_y.min(p.y);
                    max_y = max_y.max(p.y);
                    sum_x += p.x;
                }
                Ok(Vec2::new(sum_x / n, max_y + (max_y - min_y) / (n - 1.0)))
            }
        }
    }

    /// Add `data` as a new child of `parent` at the suggested position.
    ///
    /// `pos` and `flip` of `data` are replaced; its scale is kept when set.
    pub fn add_child_stem<S: NodeStore + ?Sized>(
        &mut self,
        store: &mut S,
        parent: NodeId,
        mut data: StemNode,
    ) -> Result<NodeId, Error> {
        let scale = self.child_scale(parent)?;
        let offset = self.suggest_child_offset(parent)? * scale;
        let (pos, flip) = canonical_placement(offset, self.direction(parent)?);
        if data.scale.is_none() && scale != 1.0 {
            data.scale = Some(scale);
        }
        data.set_pos(pos);
        data.flip = flip;

        let batch = store.new_batch_id();
        let id = store.create_stem(parent, data.clone(), batch)?;
        self.insert_created(id, data, Some(parent))?;
        tracing::info!("Added stem {id} under {parent}");
        Ok(id)
    }

    fn insert_created(&mut self, id: NodeId, node: StemNode, parent: Option<NodeId>) -> Result<(), InvariantError> {
        let depth = match parent {
            Some(p) => self.get(p)?.depth + 1,
            None => 0,
        };
        let leaf = Leaf::new(&node);
        self.stems.insert(
            id,
            LayoutStem {
                id,
                node,
                parent,
                children: Vec::new(),
                index: 0,
                depth,
                leaf,
            },
        );
        match parent {
            Some(p) => {
                self.get_mut(p)?.children.push(id);
                self.reindex_children(p)
            }
            None => {
                self.top.push(id);
                Ok(())
            }
        }
    }

    /// Delete a stem and its subtree in one batch.
    pub fn delete_stem<S: NodeStore + ?Sized>(&mut self, store: &mut S, id: NodeId) -> Result<BatchId, Error> {
        let parent = self.get(id)?.parent;
        let batch = store.new_batch_id();
        store.delete_stem(id, batch)?;
        self.detach(id);
        match parent {
            Some(p) => {
                self.get_mut(p)?.children.retain(|c| *c != id);
                self.reindex_children(p)?;
            }
            None => self.top.retain(|c| *c != id),
        }
        let stems = &self.stems;
        self.moving.retain(|a| stems.contains_key(&a.id));
        tracing::info!("Deleted stem {id}");
        Ok(batch)
    }

    // ------------------------------------------------------------------
    // Content edits
    // ------------------------------------------------------------------

    /// Add a content item to a stem in its own batch. Returns the new uid.
    pub fn add_content<S: NodeStore + ?Sized>(
        &mut self,
        store: &mut S,
        id: NodeId,
        item: ContentItem,
    ) -> Result<(String, BatchId), Error> {
        let uid = content_uid();
        let stem = self.get_mut(id)?;
        stem.node.content.insert(uid.clone(), item);
        stem.leaf = Leaf::new(&stem.node);

        let batch = store.new_batch_id();
        store.save_stem(id, &stem.node, batch)?;
        tracing::debug!("Added content {uid} to {id}");
        Ok((uid, batch))
    }

    /// Write the result of a group edit, all in one batch.
    pub fn apply_placements<S: NodeStore + ?Sized>(
        &mut self,
        store: &mut S,
        placements: &[Placement],
    ) -> Result<Option<BatchId>, Error> {
        if placements.is_empty() {
            return Ok(None);
        }
        let mut changed = BTreeSet::new();
        let mut parents = BTreeSet::new();

        for placement in placements {
            match placement {
                Placement::Content { stem, uid, frame } => {
                    let item = self
                        .get_mut(*stem)?
                        .node
                        .content
                        .get_mut(uid)
                        .ok_or_else(|| InvariantError::UnknownContent {
                            stem: *stem,
                            uid: uid.clone(),
                        })?;
                    item.set_frame(*frame);
                    changed.insert(*stem);
                }
                Placement::Stem { id, local } => {
                    let trs = local.decompose_trs();
                    let base = Point::new(trs.dx, trs.dy);
                    let offset = match self.parent(*id)? {
                        Some(parent) => base - self.tip(parent.id)?,
                        None => base.to_vec2(),
                    };
                    let pos = if self.direction(*id)? < 0.0 {
                        Vec2::new(-offset.x, offset.y)
                    } else {
                        offset
                    };
                    let stem = self.get_mut(*id)?;
                    stem.node.set_pos(pos);
                    stem.node.angle = trs.angle;
                    stem.node.scale = Some(trs.scale);
                    if let Some(p) = stem.parent {
                        parents.insert(p);
                    }
                    changed.insert(*id);
                }
            }
        }

        let batch = store.new_batch_id();
        for id in &changed {
            let stem = self.get_mut(*id)?;
            stem.leaf = Leaf::new(&stem.node);
            store.save_stem(*id, &stem.node, batch)?;
        }
        for parent in parents {
            self.reindex_children(parent)?;
        }
        tracing::info!("Saved {} transformed stems", changed.len());
        Ok(Some(batch))
    }
}
