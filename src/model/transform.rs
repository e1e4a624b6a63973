// Copyright 2025 the Nexus Authors
// SPDX-License-Identifier: Apache-2.0

//! 2D affine transform used for content frames and stem placement.
//!
//! `Transform` wraps a `kurbo::Affine` but reads like a 3×3 row-vector matrix:
//! `a.then(b)` applies `a` first and `b` second, which is the order the
//! persisted matrices were written in. The persisted form is the nine
//! entries `[m11, m12, m13, m21, m22, m23, m31, m32, m33]` with the last
//! column always `[0, 0, 1]`.

use crate::error::FormatError;
use kurbo::{Affine, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::fmt;
use std::str::FromStr;

/// Translation, rotation and uniform scale recovered from a transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trs {
    pub dx: f64,
    pub dy: f64,
    /// Radians in `[0, 2π)`
    pub angle: f64,
    pub scale: f64,
}

/// Row-vector affine transform
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "[f64; 9]")]
pub struct Transform(Affine);

impl Transform {
    pub const IDENTITY: Self = Self(Affine::IDENTITY);

    pub fn from_affine(affine: Affine) -> Self {
        Self(affine)
    }

    pub fn affine(&self) -> Affine {
        self.0
    }

    pub fn translate(dx: f64, dy: f64) -> Self {
        Self(Affine::translate((dx, dy)))
    }

    /// Rotation by `angle` radians (positive turns +x towards +y)
    pub fn rotate(angle: f64) -> Self {
        Self(Affine::rotate(angle))
    }

    pub fn scale(kx: f64, ky: f64) -> Self {
        Self(Affine::scale_non_uniform(kx, ky))
    }

    /// Build a transform that applies `op` about `pivot` instead of the origin.
    pub fn about(pivot: Point, op: Transform) -> Self {
        Self::translate(-pivot.x, -pivot.y)
            .then(op)
            .then(Self::translate(pivot.x, pivot.y))
    }

    /// Apply `self`, then `next`.
    #[must_use]
    pub fn then(self, next: Transform) -> Self {
        Self(next.0 * self.0)
    }

    pub fn inverse(&self) -> Self {
        Self(self.0.inverse())
    }

    pub fn map_point(&self, p: Point) -> Point {
        self.0 * p
    }

    /// Map a vector, ignoring translation.
    pub fn map_vec(&self, v: Vec2) -> Vec2 {
        let [a, b, c, d, _, _] = self.0.as_coeffs();
        Vec2::new(a * v.x + c * v.y, b * v.x + d * v.y)
    }

    /// Bounding box of a rectangle after mapping.
    pub fn map_rect(&self, rect: Rect) -> Rect {
        self.0.transform_rect_bbox(rect)
    }

    pub fn m11(&self) -> f64 {
        self.0.as_coeffs()[0]
    }
    pub fn m12(&self) -> f64 {
        self.0.as_coeffs()[1]
    }
    pub fn m21(&self) -> f64 {
        self.0.as_coeffs()[2]
    }
    pub fn m22(&self) -> f64 {
        self.0.as_coeffs()[3]
    }
    pub fn m31(&self) -> f64 {
        self.0.as_coeffs()[4]
    }
    pub fn m32(&self) -> f64 {
        self.0.as_coeffs()[5]
    }

    /// Angle of the mapped x axis, normalised to `[0, 2π)`.
    ///
    /// Only meaningful when x and y are scaled equally.
    pub fn decompose_rotation(&self) -> f64 {
        let p0 = self.map_point(Point::ZERO);
        let p1 = self.map_point(Point::new(1.0, 0.0));
        let angle = (p1.y - p0.y).atan2(p1.x - p0.x);
        if angle < 0.0 { angle + TAU } else { angle }
    }

    /// Scale factors `(sx, sy)`.
    ///
    /// `sy` shares the `m12` term with `sx`, which is only correct for the
    /// rotation plus uniform scale transforms produced by [`Transform::from_trs`].
    pub fn decompose_scale(&self) -> (f64, f64) {
        let (m11, m12, m22) = (self.m11(), self.m12(), self.m22());
        let sx = (m11 * m11 + m12 * m12).sqrt();
        let sy = (m12 * m12 + m22 * m22).sqrt();
        (sx, sy)
    }

    /// Translation, rotation and x scale. See [`Transform::decompose_scale`].
    pub fn decompose_trs(&self) -> Trs {
        Trs {
            dx: self.m31(),
            dy: self.m32(),
            angle: self.decompose_rotation(),
            scale: self.decompose_scale().0,
        }
    }

    /// Rigid placement plus uniform scale.
    ///
    /// Starting from identity: translate by `-origin`, then
    /// `translate(dx, dy) · rotate(angle) · scale(scale)`, then translate by
    /// `+origin`, each step composed in the row-vector convention.
    pub fn from_trs(dx: f64, dy: f64, angle: f64, scale: f64, origin: Point) -> Self {
        Self(
            Affine::translate((-origin.x, -origin.y))
                * Affine::translate((dx, dy))
                * Affine::rotate(angle)
                * Affine::scale(scale)
                * Affine::translate((origin.x, origin.y)),
        )
    }

    /// Reset `self` to [`Transform::from_trs`].
    pub fn set_trs(&mut self, dx: f64, dy: f64, angle: f64, scale: f64, origin: Point) {
        *self = Self::from_trs(dx, dy, angle, scale, origin);
    }

    /// The nine matrix entries in persisted order.
    pub fn to_list(&self) -> [f64; 9] {
        let [a, b, c, d, e, f] = self.0.as_coeffs();
        [a, b, 0.0, c, d, 0.0, e, f, 1.0]
    }

    /// Build from the nine persisted entries.
    ///
    /// A non-unit `m33` is divided out; perspective terms are dropped.
    pub fn from_list(m: [f64; 9]) -> Self {
        let w = if m[8] != 0.0 { m[8] } else { 1.0 };
        if m[2] != 0.0 || m[5] != 0.0 {
            tracing::warn!("Dropping perspective terms from transform {:?}", m);
        }
        Self(Affine::new([
            m[0] / w,
            m[1] / w,
            m[3] / w,
            m[4] / w,
            m[6] / w,
            m[7] / w,
        ]))
    }

    /// Textual form `[m11, m12, m13, m21, m22, m23, m31, m32, m33]`.
    pub fn serialize(&self) -> String {
        self.to_string()
    }

    /// Parse the textual form. Any separators between the numbers are
    /// accepted, but exactly nine finite numeric tokens must be present.
    pub fn deserialize(text: &str) -> Result<Self, FormatError> {
        let tokens: Vec<&str> = text
            .split(|c: char| c == '[' || c == ']' || c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
            .collect();

        let mut numbers = Vec::with_capacity(tokens.len());
        for token in &tokens {
            let value = token
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| FormatError::TransformNumber {
                    token: (*token).to_string(),
                })?;
            numbers.push(value);
        }

        Self::try_from(numbers).map_err(|e| match e {
            FormatError::TransformLength { found, .. } => FormatError::TransformLength {
                found,
                text: text.to_string(),
            },
            other => other,
        })
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl TryFrom<Vec<f64>> for Transform {
    type Error = FormatError;

    fn try_from(numbers: Vec<f64>) -> Result<Self, Self::Error> {
        let m: [f64; 9] = numbers
            .as_slice()
            .try_into()
            .map_err(|_| FormatError::TransformLength {
                found: numbers.len(),
                text: String::new(),
            })?;
        Ok(Self::from_list(m))
    }
}

impl From<Transform> for [f64; 9] {
    fn from(t: Transform) -> Self {
        t.to_list()
    }
}

impl FromStr for Transform {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::deserialize(s)
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.to_list();
        write!(
            f,
            "[{}, {}, {}, {}, {}, {}, {}, {}, {}]",
            m[0], m[1], m[2], m[3], m[4], m[5], m[6], m[7], m[8]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    const EPS: f64 = 1e-9;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < EPS, "{a} != {b}");
    }

    fn assert_point_close(a: Point, b: Point) {
        assert_close(a.x, b.x);
        assert_close(a.y, b.y);
    }

    #[test]
    fn then_applies_left_first() {
        let t = Transform::translate(10.0, 0.0).then(Transform::scale(2.0, 2.0));
        // translate first, then scale: (1,0) -> (11,0) -> (22,0)
        assert_point_close(t.map_point(Point::new(1.0, 0.0)), Point::new(22.0, 0.0));

        let u = Transform::scale(2.0, 2.0).then(Transform::translate(10.0, 0.0));
        assert_point_close(u.map_point(Point::new(1.0, 0.0)), Point::new(12.0, 0.0));
    }

    #[test]
    fn trs_places_scaled_rotated_then_translated() {
        let t = Transform::from_trs(5.0, 7.0, FRAC_PI_2, 2.0, Point::ZERO);
        // (1,0) scaled to (2,0), rotated to (0,2), translated to (5,9)
        assert_point_close(t.map_point(Point::new(1.0, 0.0)), Point::new(5.0, 9.0));
    }

    #[test]
    fn trs_decomposes_back() {
        let t = Transform::from_trs(3.0, -4.0, 1.25, 0.6, Point::ZERO);
        let trs = t.decompose_trs();
        assert_close(trs.dx, 3.0);
        assert_close(trs.dy, -4.0);
        assert_close(trs.angle, 1.25);
        assert_close(trs.scale, 0.6);
    }

    #[test]
    fn rotation_is_normalised_to_positive_range() {
        let t = Transform::rotate(-FRAC_PI_2);
        assert_close(t.decompose_rotation(), 3.0 * FRAC_PI_2);
        assert_close(Transform::rotate(PI).decompose_rotation(), PI);
        assert_close(Transform::IDENTITY.decompose_rotation(), 0.0);
    }

    #[test]
    fn scale_shares_m12_term() {
        // Pure non-uniform scale: m12 = 0 so both factors are exact
        let (sx, sy) = Transform::scale(2.0, 3.0).decompose_scale();
        assert_close(sx, 2.0);
        assert_close(sy, 3.0);

        // Uniform scale with rotation: also exact
        let t = Transform::from_trs(0.0, 0.0, 0.7, 1.5, Point::ZERO);
        let (sx, sy) = t.decompose_scale();
        assert_close(sx, 1.5);
        assert_close(sy, 1.5);
    }

    #[test]
    fn serialized_text_round_trips() {
        let t = Transform::from_trs(12.5, -3.25, 0.3, 0.75, Point::ZERO);
        let text = t.serialize();
        let back = Transform::deserialize(&text).unwrap();
        for (a, b) in t.to_list().iter().zip(back.to_list().iter()) {
            assert_close(*a, *b);
        }
    }

    #[test]
    fn identity_text_form() {
        assert_eq!(
            Transform::IDENTITY.serialize(),
            "[1, 0, 0, 0, 1, 0, 0, 0, 1]"
        );
    }

    #[test]
    fn parses_scientific_notation() {
        let t: Transform = "[8.94, 0.0, 0.0, 0.0, 8.94, 0.0, -2.835e1, -5.78, 1.0]"
            .parse()
            .unwrap();
        assert_close(t.m11(), 8.94);
        assert_close(t.m31(), -28.35);
    }

    #[test]
    fn wrong_token_count_is_format_error() {
        let err = Transform::deserialize("[1, 0, 0, 0, 1, 0, 0, 0]").unwrap_err();
        assert!(matches!(err, FormatError::TransformLength { found: 8, .. }));

        let err = Transform::deserialize("").unwrap_err();
        assert!(matches!(err, FormatError::TransformLength { found: 0, .. }));
    }

    #[test]
    fn non_numeric_token_is_format_error() {
        let err = Transform::deserialize("[1, 0, 0, 0, 1, 0, x, 0, 1]").unwrap_err();
        assert_eq!(
            err,
            FormatError::TransformNumber {
                token: "x".to_string()
            }
        );
    }

    #[test]
    fn non_finite_token_is_format_error() {
        for token in ["NaN", "inf", "-infinity"] {
            let text = format!("[1, 0, 0, 0, 1, 0, {token}, 0, 1]");
            assert_eq!(
                Transform::deserialize(&text).unwrap_err(),
                FormatError::TransformNumber {
                    token: token.to_string()
                }
            );
        }
    }

    #[test]
    fn serde_uses_nine_entry_list() {
        let t = Transform::translate(4.0, 5.0);
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, "[1.0,0.0,0.0,0.0,1.0,0.0,4.0,5.0,1.0]");
        let back: Transform = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
        assert!(serde_json::from_str::<Transform>("[1.0, 2.0]").is_err());
    }

    #[test]
    fn about_pivot_keeps_pivot_fixed() {
        let pivot = Point::new(10.0, 20.0);
        let t = Transform::about(pivot, Transform::rotate(0.9).then(Transform::scale(2.0, 2.0)));
        assert_point_close(t.map_point(pivot), pivot);
    }

    #[test]
    fn inverse_undoes_transform() {
        let t = Transform::from_trs(3.0, 1.0, 0.4, 2.0, Point::ZERO);
        let p = Point::new(-7.0, 2.5);
        assert_point_close(t.inverse().map_point(t.map_point(p)), p);
    }
}
