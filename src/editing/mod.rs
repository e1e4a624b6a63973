// Copyright 2025 the Nexus Authors
// SPDX-License-Identifier: Apache-2.0

//! Editing model and interaction

pub mod gesture;
pub mod selection;
pub mod selection_transform;
pub mod session;

pub use gesture::{GestureController, GestureKind, GestureState, InputSource, Modifiers, PointerEvent};
pub use selection::{Selection, SelectionTarget, lasso_select};
pub use selection_transform::{Grip, Handle, SelectionTransformer};
pub use session::{CanvasSession, PenStyle, Tool};
