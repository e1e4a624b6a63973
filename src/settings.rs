// Copyright 2025 the Nexus Authors
// SPDX-License-Identifier: Apache-2.0

//! Layout and interaction constants.
//!
//! These stay fixed for the lifetime of the application. Anything a user may
//! want to tune (pressure response, smoothing, simplification) lives in
//! `config.rs` instead and is passed around explicitly.

// ============================================================================
// STEM GEOMETRY
// ============================================================================
/// Tail width at the root end of depth-1 stems
const ROOT_WIDTH: f64 = 20.0;

/// Tail width at the tip of every stem (and root end of deeper stems)
const STEM_WIDTH: f64 = 5.0;

/// Control point distance for the tail curve, as a fraction of its length
const TAIL_CONTROL_FRACTION: f64 = 0.4;

/// Length of the stub drawn past the pointer while budding a new stem
const BUD_STUB_LENGTH: f64 = 30.0;

// ============================================================================
// LEAF SETTINGS
// ============================================================================
/// Padding around a leaf's content when computing its title rect
const LEAF_PAD: f64 = 3.0;

/// Side length of the placeholder drawn for iconified stems
const ICON_SIZE: f64 = 16.0;

/// Line height used to estimate text frame bounds
const TEXT_LINE_HEIGHT: f64 = 16.0;

// ============================================================================
// NEW STEM PLACEMENT
// ============================================================================
/// Horizontal offset of a first child from its parent's tip
const CHILD_OFFSET_X: f64 = 30.0;

/// Vertical offset of a first child from its parent's tip
const FIRST_CHILD_OFFSET_Y: f64 = -50.0;

/// Vertical gap below a single existing sibling
const NEXT_CHILD_GAP_Y: f64 = 50.0;

// ============================================================================
// STYLE DEFAULTS
// ============================================================================
/// Branch colour used when no ancestor defines one
const DEFAULT_BRANCH_COLOR: &str = "#999999";

/// Scale used when no ancestor defines one
const DEFAULT_SCALE: f64 = 0.6;

/// Opacity used when no ancestor defines one
const DEFAULT_OPACITY: f64 = 1.0;

/// Saturation and value of randomly chosen depth-1 branch colours
const BRANCH_SATURATION: f64 = 0.6;
const BRANCH_VALUE: f64 = 0.85;

// ============================================================================
// HIT TESTING
// ============================================================================
/// Extra width added around an ink stroke to make it easier to pick
const STROKE_PICK_WIDTH: f64 = 5.0;

/// Radius around a transformation handle that counts as a hit
const HANDLE_RADIUS: f64 = 8.0;

/// Tolerance for flattening curves during hit tests
const PICK_TOLERANCE: f64 = 0.1;

/// Distance of the rotate handle above the selection rect
const ROTATE_HANDLE_OFFSET: f64 = 20.0;

// ============================================================================
// INK DEFAULTS
// ============================================================================
/// Pen colour for new strokes
const INK_COLOR: &str = "#000000";

/// Nominal pen width for new strokes
const INK_WIDTH: f64 = 3.0;

const INK_OPACITY: f64 = 1.0;

// ============================================================================
// PUBLIC API
// ============================================================================

/// Stem tail geometry
pub mod stem {
    pub const ROOT_WIDTH: f64 = super::ROOT_WIDTH;
    pub const STEM_WIDTH: f64 = super::STEM_WIDTH;
    pub const TAIL_CONTROL_FRACTION: f64 = super::TAIL_CONTROL_FRACTION;
    pub const BUD_STUB_LENGTH: f64 = super::BUD_STUB_LENGTH;
}

/// Leaf bounds
pub mod leaf {
    pub const PAD: f64 = super::LEAF_PAD;
    pub const ICON_SIZE: f64 = super::ICON_SIZE;
    pub const TEXT_LINE_HEIGHT: f64 = super::TEXT_LINE_HEIGHT;
}

/// Suggested placement of stems added without a drop point
pub mod placement {
    pub const CHILD_OFFSET_X: f64 = super::CHILD_OFFSET_X;
    pub const FIRST_CHILD_OFFSET_Y: f64 = super::FIRST_CHILD_OFFSET_Y;
    pub const NEXT_CHILD_GAP_Y: f64 = super::NEXT_CHILD_GAP_Y;
}

/// Terminal values for inherited style keys
pub mod style {
    pub const BRANCH_COLOR: &str = super::DEFAULT_BRANCH_COLOR;
    pub const SCALE: f64 = super::DEFAULT_SCALE;
    pub const OPACITY: f64 = super::DEFAULT_OPACITY;
    pub const BRANCH_SATURATION: f64 = super::BRANCH_SATURATION;
    pub const BRANCH_VALUE: f64 = super::BRANCH_VALUE;
}

/// Pointer picking
pub mod pick {
    pub const STROKE_WIDTH: f64 = super::STROKE_PICK_WIDTH;
    pub const HANDLE_RADIUS: f64 = super::HANDLE_RADIUS;
    pub const TOLERANCE: f64 = super::PICK_TOLERANCE;
    pub const ROTATE_HANDLE_OFFSET: f64 = super::ROTATE_HANDLE_OFFSET;
}

/// Pen defaults for new strokes
pub mod ink {
    pub const COLOR: &str = super::INK_COLOR;
    pub const WIDTH: f64 = super::INK_WIDTH;
    pub const OPACITY: f64 = super::INK_OPACITY;
}
