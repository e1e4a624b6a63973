// Copyright 2025 the Nexus Authors
// SPDX-License-Identifier: Apache-2.0

//! The rendered aggregate of a stem's content.

use crate::model::StemNode;
use crate::settings::leaf::{ICON_SIZE, PAD};
use kurbo::{Point, Rect, Vec2};

/// Bounds of a stem's content, in content coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Leaf {
    title: Rect,
    iconified: bool,
}

impl Leaf {
    pub fn new(stem: &StemNode) -> Self {
        let content = if stem.iconified {
            Rect::new(0.0, 0.0, ICON_SIZE, ICON_SIZE)
        } else {
            stem.content
                .values()
                .map(|item| item.bounds())
                .reduce(|a, b| a.union(b))
                .unwrap_or(Rect::ZERO)
        };
        Self {
            title: content.inflate(PAD, PAD),
            iconified: stem.iconified,
        }
    }

    /// Content bounds plus padding
    pub fn title_rect(&self) -> Rect {
        self.title
    }

    pub fn is_iconified(&self) -> bool {
        self.iconified
    }

    pub fn width(&self) -> f64 {
        self.title.width()
    }

    /// Bottom-right corner, the attachment point when growing right
    pub fn e(&self) -> Point {
        Point::new(self.title.x1, self.title.y1)
    }

    /// Bottom-left corner, the attachment point when growing left
    pub fn w(&self) -> Point {
        Point::new(self.title.x0, self.title.y1)
    }

    pub fn c(&self) -> Point {
        self.title.center()
    }

    /// Translation from content coordinates into the stem's frame.
    ///
    /// Top-level leaves are centred on the stem origin. Other leaves sit so
    /// that the corner on the growing side lands on `tip`.
    pub fn offset(&self, depth: usize, direction: f64, tip: Point) -> Vec2 {
        if depth == 0 {
            return Point::ZERO - self.c();
        }
        let corner = if direction > 0.0 { self.e() } else { self.w() };
        tip - corner
    }
}
