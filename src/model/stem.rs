// Copyright 2025 the Nexus Authors
// SPDX-License-Identifier: Apache-2.0

//! Persisted attributes of a stem.
//!
//! `pos` is always stored as if the stem grew to the right (direction +1);
//! the layout mirrors it when the inherited direction is negative. `flip` is
//! relative to the parent's direction, so mirroring a stem mirrors its whole
//! subtree without touching any descendant.

use super::content::ContentItem;
use kurbo::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Attribute record of one stem node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StemNode {
    /// Offset of the base from the parent's tip, canonicalised to direction +1
    pub pos: [f64; 2],
    /// +1 or -1 relative to the parent's direction
    #[serde(default = "default_flip")]
    pub flip: f64,
    /// Own scale; absent means 1.0 for placement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    /// Radians, usually 0
    #[serde(default)]
    pub angle: f64,
    #[serde(default)]
    pub content: BTreeMap<String, ContentItem>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// `#RRGGBB`, inherited from the nearest ancestor when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branchcolor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default)]
    pub hide: bool,
    #[serde(default)]
    pub iconified: bool,
}

fn default_flip() -> f64 {
    1.0
}

impl Default for StemNode {
    fn default() -> Self {
        Self {
            pos: [0.0, 0.0],
            flip: 1.0,
            scale: None,
            angle: 0.0,
            content: BTreeMap::new(),
            tags: BTreeSet::new(),
            branchcolor: None,
            opacity: None,
            hide: false,
            iconified: false,
        }
    }
}

impl StemNode {
    /// A stem at `pos` with the given flip
    pub fn at(pos: Vec2, flip: f64) -> Self {
        Self {
            pos: [pos.x, pos.y],
            flip,
            ..Self::default()
        }
    }

    pub fn pos(&self) -> Vec2 {
        Vec2::new(self.pos[0], self.pos[1])
    }

    pub fn set_pos(&mut self, pos: Vec2) {
        self.pos = [pos.x, pos.y];
    }

    /// Scale used to place the stem
    pub fn placement_scale(&self) -> f64 {
        self.scale.unwrap_or(1.0)
    }

    /// Highest z of any content item, 0 when empty
    pub fn max_z(&self) -> f64 {
        self.content
            .values()
            .map(ContentItem::z)
            .fold(0.0, f64::max)
    }
}

/// +1 for non-negative values, -1 otherwise
pub fn sign(x: f64) -> f64 {
    if x < 0.0 { -1.0 } else { 1.0 }
}
