// Copyright 2025 the Nexus Authors
// SPDX-License-Identifier: Apache-2.0

//! Immutable selection set for tracking which stems and content items are
//! selected.
//!
//! `Selection` wraps an `Arc<BTreeSet<SelectionTarget>>` so it can be cheaply
//! cloned into a transformer or a preview. Mutations produce a new set. The
//! `BTreeSet` gives deterministic iteration order, so group edits always
//! write their nodes in the same order.

use crate::layout::StemLayout;
use crate::model::NodeId;
use kurbo::{Point, Rect};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Something that can be selected on the canvas
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SelectionTarget {
    /// A whole stem, moved and transformed as one
    Stem(NodeId),
    /// One content item of a stem
    Content { stem: NodeId, uid: String },
}

impl SelectionTarget {
    /// The stem owning the target
    pub fn stem(&self) -> NodeId {
        match self {
            SelectionTarget::Stem(id) => *id,
            SelectionTarget::Content { stem, .. } => *stem,
        }
    }
}

/// A set of selected targets
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    inner: Arc<BTreeSet<SelectionTarget>>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn contains(&self, target: &SelectionTarget) -> bool {
        self.inner.contains(target)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SelectionTarget> {
        self.inner.iter()
    }

    pub fn insert(&mut self, target: SelectionTarget) {
        Arc::make_mut(&mut self.inner).insert(target);
    }

    pub fn remove(&mut self, target: &SelectionTarget) {
        Arc::make_mut(&mut self.inner).remove(target);
    }

    pub fn clear(&mut self) {
        self.inner = Arc::new(BTreeSet::new());
    }

    /// Selected whole stems, in id order
    pub fn stems(&self) -> Vec<NodeId> {
        self.inner
            .iter()
            .filter_map(|t| match t {
                SelectionTarget::Stem(id) => Some(*id),
                SelectionTarget::Content { .. } => None,
            })
            .collect()
    }

    /// Drop targets whose stem is no longer laid out.
    pub fn retain_existing(&mut self, layout: &StemLayout) {
        if self.inner.iter().all(|t| layout.contains(t.stem())) {
            return;
        }
        Arc::make_mut(&mut self.inner).retain(|t| layout.contains(t.stem()));
    }
}

impl FromIterator<SelectionTarget> for Selection {
    fn from_iter<I: IntoIterator<Item = SelectionTarget>>(iter: I) -> Self {
        Self {
            inner: Arc::new(iter.into_iter().collect()),
        }
    }
}

/// Content items whose scene bounds overlap the bounding box of `lasso`.
pub fn lasso_select(layout: &StemLayout, lasso: &[Point]) -> Selection {
    let Some(&first) = lasso.first() else {
        return Selection::new();
    };
    let area = lasso
        .iter()
        .fold(Rect::from_points(first, first), |r, p| r.union_pt(*p));

    let mut selection = Selection::new();
    for id in layout.preorder() {
        let (Ok(stem), Ok(container)) = (layout.get(id), layout.content_transform(id)) else {
            continue;
        };
        for (uid, item) in &stem.node.content {
            let bounds = container.map_rect(item.bounds());
            if overlaps(area, bounds) {
                selection.insert(SelectionTarget::Content {
                    stem: id,
                    uid: uid.clone(),
                });
            }
        }
    }
    tracing::debug!("Lasso selected {} items", selection.len());
    selection
}

/// Closed-interval overlap, so touching edges count
fn overlaps(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::model::{ContentItem, MemoryStore, NodeStore, StemNode, TextContent, Transform};
    use kurbo::Vec2;

    fn content(stem: u64, uid: &str) -> SelectionTarget {
        SelectionTarget::Content {
            stem: NodeId::new(stem),
            uid: uid.to_string(),
        }
    }

    #[test]
    fn new_selection_is_empty() {
        let sel = Selection::new();
        assert!(sel.is_empty());
        assert_eq!(sel.len(), 0);
    }

    #[test]
    fn insert_duplicate_is_noop() {
        let mut sel = Selection::new();
        sel.insert(content(1, "a"));
        sel.insert(content(1, "a"));
        assert_eq!(sel.len(), 1);
        assert!(sel.contains(&content(1, "a")));
    }

    #[test]
    fn remove_nonexistent_is_noop() {
        let mut sel = Selection::new();
        sel.insert(SelectionTarget::Stem(NodeId::new(4)));
        sel.remove(&content(4, "x"));
        assert_eq!(sel.len(), 1);
    }

    #[test]
    fn clone_is_independent() {
        let mut sel = Selection::new();
        sel.insert(SelectionTarget::Stem(NodeId::new(1)));

        let mut clone = sel.clone();
        clone.insert(SelectionTarget::Stem(NodeId::new(2)));

        assert_eq!(sel.len(), 1);
        assert_eq!(clone.stems(), vec![NodeId::new(1), NodeId::new(2)]);
    }

    #[test]
    fn stems_ignores_content_targets() {
        let sel: Selection = [
            content(3, "a"),
            SelectionTarget::Stem(NodeId::new(9)),
            SelectionTarget::Stem(NodeId::new(2)),
        ]
        .into_iter()
        .collect();
        assert_eq!(sel.stems(), vec![NodeId::new(2), NodeId::new(9)]);
        assert_eq!(content(3, "a").stem(), NodeId::new(3));
    }

    #[test]
    fn lasso_picks_overlapping_content() {
        let mut store = MemoryStore::new();
        let root = store.root();
        let mut node = StemNode::at(Vec2::new(0.0, 0.0), 1.0);
        for (uid, x) in [("near", 0.0), ("far", 500.0)] {
            node.content.insert(
                uid.to_string(),
                ContentItem::Text(TextContent {
                    source: uid.to_string(),
                    frame: Transform::translate(x, 0.0),
                    maxwidth: 40.0,
                    z: 0.0,
                }),
            );
        }
        let top = store.add_stem(root, node).unwrap();
        let layout = StemLayout::load(&store, &Config::default()).unwrap();

        // Leaf spans x 0..540, centred on the origin
        let selection = lasso_select(
            &layout,
            &[
                Point::new(-280.0, -20.0),
                Point::new(-250.0, 20.0),
                Point::new(-260.0, 0.0),
            ],
        );
        assert_eq!(selection.len(), 1);
        assert!(selection.contains(&SelectionTarget::Content {
            stem: top,
            uid: "near".to_string()
        }));

        assert!(lasso_select(&layout, &[]).is_empty());
    }

    #[test]
    fn retain_existing_drops_deleted_stems() {
        let mut store = MemoryStore::new();
        let root = store.root();
        let top = store.add_stem(root, StemNode::default()).unwrap();
        let layout = StemLayout::load(&store, &Config::default()).unwrap();

        let mut sel: Selection = [SelectionTarget::Stem(top), SelectionTarget::Stem(NodeId::new(999))]
            .into_iter()
            .collect();
        sel.retain_existing(&layout);
        assert_eq!(sel.stems(), vec![top]);
    }
}
