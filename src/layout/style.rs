// Copyright 2025 the Nexus Authors
// SPDX-License-Identifier: Apache-2.0

//! Inherited stem style.
//!
//! A stem without its own value for a style key takes the value of its
//! nearest ancestor that has one, falling back to a fixed default table.

use crate::model::StemNode;
use crate::settings::style::{
    BRANCH_COLOR, BRANCH_SATURATION, BRANCH_VALUE, OPACITY, SCALE,
};
use peniko::Color;

/// Inheritable style attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleKey {
    BranchColor,
    Scale,
    Opacity,
}

/// A resolved style value
#[derive(Debug, Clone, PartialEq)]
pub enum StyleValue {
    /// `#RRGGBB`
    Color(String),
    Number(f64),
}

impl StyleValue {
    pub fn as_color(&self) -> Option<&str> {
        match self {
            StyleValue::Color(c) => Some(c),
            StyleValue::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            StyleValue::Number(n) => Some(*n),
            StyleValue::Color(_) => None,
        }
    }
}

impl StyleKey {
    /// The stem's own value, if it sets one
    pub fn own(self, stem: &StemNode) -> Option<StyleValue> {
        match self {
            StyleKey::BranchColor => stem.branchcolor.clone().map(StyleValue::Color),
            StyleKey::Scale => stem.scale.map(StyleValue::Number),
            StyleKey::Opacity => stem.opacity.map(StyleValue::Number),
        }
    }

    /// Terminal value when no ancestor sets the key
    pub fn default_value(self) -> StyleValue {
        match self {
            StyleKey::BranchColor => StyleValue::Color(BRANCH_COLOR.to_string()),
            StyleKey::Scale => StyleValue::Number(SCALE),
            StyleKey::Opacity => StyleValue::Number(OPACITY),
        }
    }
}

/// Resolve `key` along `chain`, which starts at the stem itself and walks up
/// through its ancestors.
pub fn resolve<'a>(chain: impl IntoIterator<Item = &'a StemNode>, key: StyleKey) -> StyleValue {
    chain
        .into_iter()
        .find_map(|stem| key.own(stem))
        .unwrap_or_else(|| key.default_value())
}

/// Parse `#RRGGBB` into a render colour.
pub fn parse_color(hex: &str) -> Option<Color> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some(Color::from_rgb8(channel(0)?, channel(2)?, channel(4)?))
}

/// Format an RGB triple in `[0, 1]` as `#RRGGBB`.
pub fn to_hex(r: f64, g: f64, b: f64) -> String {
    let byte = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!("#{:02x}{:02x}{:02x}", byte(r), byte(g), byte(b))
}

/// HSV with all components in `[0, 1]` to RGB.
pub fn hsv_to_rgb(h: f64, s: f64, v: f64) -> (f64, f64, f64) {
    if s == 0.0 {
        return (v, v, v);
    }
    let h6 = h.rem_euclid(1.0) * 6.0;
    let sector = h6.floor();
    let f = h6 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match sector as u8 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    }
}

/// Branch colour for a new top-level branch with the given hue.
pub fn branch_color_for_hue(hue: f64) -> String {
    let (r, g, b) = hsv_to_rgb(hue, BRANCH_SATURATION, BRANCH_VALUE);
    to_hex(r, g, b)
}

/// Branch colour with a random hue.
pub fn random_branch_color() -> String {
    branch_color_for_hue(rand::random::<f64>())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_color(color: Option<&str>) -> StemNode {
        StemNode {
            branchcolor: color.map(str::to_string),
            ..StemNode::default()
        }
    }

    #[test]
    fn nearest_ancestor_wins() {
        let own = with_color(None);
        let parent = with_color(Some("#112233"));
        let grandparent = with_color(Some("#445566"));
        let value = resolve([&own, &parent, &grandparent], StyleKey::BranchColor);
        assert_eq!(value.as_color(), Some("#112233"));
    }

    #[test]
    fn defaults_terminate_the_walk() {
        let chain = [StemNode::default(), StemNode::default()];
        assert_eq!(resolve(&chain, StyleKey::BranchColor).as_color(), Some("#999999"));
        assert_eq!(resolve(&chain, StyleKey::Scale).as_number(), Some(0.6));
        assert_eq!(resolve(&chain, StyleKey::Opacity).as_number(), Some(1.0));
    }

    #[test]
    fn own_value_shadows_parent() {
        let own = StemNode {
            opacity: Some(0.25),
            ..StemNode::default()
        };
        let parent = StemNode {
            opacity: Some(0.75),
            ..StemNode::default()
        };
        assert_eq!(resolve([&own, &parent], StyleKey::Opacity).as_number(), Some(0.25));
    }

    #[test]
    fn hex_round_trip() {
        assert_eq!(to_hex(1.0, 0.0, 0.6), "#ff0099");
        let parsed = parse_color("#ff0099").map(|c| c.to_rgba8());
        assert_eq!(parsed, Some(Color::from_rgb8(0xff, 0x00, 0x99).to_rgba8()));
        assert!(parse_color("ff0099").is_none());
        assert!(parse_color("#ff00").is_none());
        assert!(parse_color("#gg0000").is_none());
    }

    #[test]
    fn hsv_primaries() {
        assert_eq!(hsv_to_rgb(0.0, 1.0, 1.0), (1.0, 0.0, 0.0));
        let (r, g, b) = hsv_to_rgb(1.0 / 3.0, 1.0, 1.0);
        assert!(r.abs() < 1e-9 && (g - 1.0).abs() < 1e-9 && b.abs() < 1e-9);
        assert_eq!(hsv_to_rgb(0.5, 0.0, 0.4), (0.4, 0.4, 0.4));
    }

    #[test]
    fn random_branch_colours_use_fixed_saturation_and_value() {
        for _ in 0..20 {
            let hex = random_branch_color();
            assert_eq!(hex.len(), 7);
            let digits: Vec<u8> = (0..3)
                .map(|i| u8::from_str_radix(&hex[1 + 2 * i..3 + 2 * i], 16).unwrap())
                .collect();
            // v = 0.85 puts the largest channel at 217
            assert_eq!(*digits.iter().max().unwrap(), 217);
        }
    }

    #[test]
    fn random_hues_cover_the_wheel() {
        // Sextant of the hue wheel, read back from which channel is
        // largest and which is smallest
        let mut seen = [false; 6];
        for _ in 0..600 {
            let hex = random_branch_color();
            let c: Vec<u8> = (0..3)
                .map(|i| u8::from_str_radix(&hex[1 + 2 * i..3 + 2 * i], 16).unwrap())
                .collect();
            let (r, g, b) = (c[0], c[1], c[2]);
            let sextant = match (r >= g, g >= b, r >= b) {
                (true, true, _) => 0,
                (false, true, true) => 1,
                (false, true, false) => 2,
                (false, false, _) => 3,
                (true, false, false) => 4,
                (true, false, true) => 5,
            };
            seen[sextant] = true;
        }
        assert!(seen.iter().all(|s| *s), "hues only in {seen:?}");
    }
}
