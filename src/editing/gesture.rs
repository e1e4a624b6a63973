// Copyright 2025 the Nexus Authors
// SPDX-License-Identifier: Apache-2.0

//! Pointer input and the continuous-gesture state machine.
//!
//! Only one gesture runs at a time and it belongs to the input source that
//! started it. Events from any other source are dropped until the gesture
//! ends or is cancelled, so a mouse event synthesised during a pen stroke
//! cannot interleave with the stroke.

use kurbo::Point;

/// Device that produced a pointer event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputSource {
    Mouse,
    Pen,
    Touch,
}

/// Keyboard modifiers held during a pointer event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub alt: bool,
    pub ctrl: bool,
}

/// One pointer sample in scene coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub pos: Point,
    pub source: InputSource,
    /// Raw pen pressure in `[0, 1]`, `None` for devices without a sensor
    pub pressure: Option<f64>,
    /// Seconds
    pub time: f64,
    pub modifiers: Modifiers,
}

impl PointerEvent {
    pub fn new(source: InputSource, pos: Point, time: f64) -> Self {
        Self {
            pos,
            source,
            pressure: None,
            time,
            modifiers: Modifiers::default(),
        }
    }

    pub fn mouse(x: f64, y: f64, time: f64) -> Self {
        Self::new(InputSource::Mouse, Point::new(x, y), time)
    }

    pub fn pen(x: f64, y: f64, pressure: f64, time: f64) -> Self {
        Self {
            pressure: Some(pressure),
            ..Self::new(InputSource::Pen, Point::new(x, y), time)
        }
    }

    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// What the running gesture is doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    /// Pressed but not yet moved past the drag threshold
    Pressed,
    Dragging,
    Scaling,
    Rotating,
    Inking,
    Lassoing,
    /// Growing a new stem from a parent
    Budding,
    Pinching,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    Active {
        kind: GestureKind,
        source: InputSource,
    },
}

/// Gatekeeper for continuous gestures
#[derive(Debug, Clone, Default)]
pub struct GestureController {
    state: GestureState,
}

impl GestureController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == GestureState::Idle
    }

    pub fn kind(&self) -> Option<GestureKind> {
        match self.state {
            GestureState::Idle => None,
            GestureState::Active { kind, .. } => Some(kind),
        }
    }

    /// The source that owns the running gesture
    pub fn owner(&self) -> Option<InputSource> {
        match self.state {
            GestureState::Idle => None,
            GestureState::Active { source, .. } => Some(source),
        }
    }

    /// Whether an event from `source` belongs to the running gesture
    pub fn accepts(&self, source: InputSource) -> bool {
        self.owner() == Some(source)
    }

    /// Start a gesture. Refused while another gesture is running.
    pub fn begin(&mut self, source: InputSource, kind: GestureKind) -> bool {
        if !self.is_idle() {
            tracing::debug!("Ignoring {:?} start while {:?}", source, self.state);
            return false;
        }
        self.state = GestureState::Active { kind, source };
        true
    }

    /// Change what the running gesture does, keeping its owner.
    pub fn transition(&mut self, kind: GestureKind) {
        if let GestureState::Active { source, .. } = self.state {
            tracing::debug!("Gesture {:?} -> {:?}", self.kind(), kind);
            self.state = GestureState::Active { kind, source };
        }
    }

    /// Finish the gesture owned by `source`, returning what it was doing.
    pub fn end(&mut self, source: InputSource) -> Option<GestureKind> {
        if !self.accepts(source) {
            return None;
        }
        let kind = self.kind();
        self.state = GestureState::Idle;
        kind
    }

    /// Abandon whatever is running, whoever owns it.
    pub fn cancel(&mut self) -> Option<GestureKind> {
        let kind = self.kind();
        self.state = GestureState::Idle;
        kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_one_gesture_at_a_time() {
        let mut gesture = GestureController::new();
        assert!(gesture.begin(InputSource::Pen, GestureKind::Inking));
        assert!(!gesture.begin(InputSource::Mouse, GestureKind::Pressed));
        assert_eq!(gesture.owner(), Some(InputSource::Pen));
        assert_eq!(gesture.kind(), Some(GestureKind::Inking));
    }

    #[test]
    fn other_sources_cannot_end_the_gesture() {
        let mut gesture = GestureController::new();
        gesture.begin(InputSource::Pen, GestureKind::Inking);
        assert!(!gesture.accepts(InputSource::Mouse));
        assert_eq!(gesture.end(InputSource::Mouse), None);
        assert_eq!(gesture.end(InputSource::Pen), Some(GestureKind::Inking));
        assert!(gesture.is_idle());
    }

    #[test]
    fn transition_keeps_owner() {
        let mut gesture = GestureController::new();
        gesture.begin(InputSource::Mouse, GestureKind::Pressed);
        gesture.transition(GestureKind::Dragging);
        assert_eq!(
            gesture.state(),
            GestureState::Active {
                kind: GestureKind::Dragging,
                source: InputSource::Mouse
            }
        );
    }

    #[test]
    fn transition_while_idle_does_nothing() {
        let mut gesture = GestureController::new();
        gesture.transition(GestureKind::Dragging);
        assert!(gesture.is_idle());
    }

    #[test]
    fn cancel_always_resets() {
        let mut gesture = GestureController::new();
        gesture.begin(InputSource::Touch, GestureKind::Pinching);
        assert_eq!(gesture.cancel(), Some(GestureKind::Pinching));
        assert!(gesture.is_idle());
        assert_eq!(gesture.cancel(), None);
        assert!(gesture.begin(InputSource::Mouse, GestureKind::Pressed));
    }

    #[test]
    fn event_constructors() {
        let e = PointerEvent::pen(1.0, 2.0, 0.3, 0.5);
        assert_eq!(e.source, InputSource::Pen);
        assert_eq!(e.pressure, Some(0.3));
        let m = PointerEvent::mouse(0.0, 0.0, 0.0).with_modifiers(Modifiers {
            alt: true,
            ..Modifiers::default()
        });
        assert!(m.modifiers.alt);
        assert!(m.pressure.is_none());
    }
}
