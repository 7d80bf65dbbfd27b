//! Gesture samples delivered to commands.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Kind of gesture recognized by the host view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureType {
    #[default]
    Unknown,
    Pan,
    Tap,
    DoubleTap,
    Press,
    TwoFinger,
}

/// Phase of a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureState {
    /// The host is asking whether the gesture would be handled.
    #[default]
    Possible,
    Began,
    Moved,
    Ended,
    Cancel,
}

/// One sampled instant of a gesture, in display and model coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Motion {
    pub gesture_type: GestureType,
    pub gesture_state: GestureState,
    /// A long press that turned into a drag.
    pub press_drag: bool,
    /// The host switched gesture recognizers mid-sequence.
    pub switch_gesture: bool,
    pub start_pt: Point,
    pub start_pt_m: Point,
    pub last_pt: Point,
    pub last_pt_m: Point,
    pub point: Point,
    pub point_m: Point,
    /// Second finger, for two-finger gestures.
    pub start_pt2: Point,
    pub start_pt2_m: Point,
    pub point2: Point,
    pub point2_m: Point,
    /// Model units per display millimeter, including the finger/mouse factor.
    pub mm_to_model: f64,
    /// Model units per display pixel.
    pub px_to_model: f64,
    /// Input comes from a finger rather than a mouse.
    pub from_finger: bool,
}

impl Default for Motion {
    fn default() -> Self {
        Self {
            gesture_type: GestureType::Unknown,
            gesture_state: GestureState::Possible,
            press_drag: false,
            switch_gesture: false,
            start_pt: Point::ZERO,
            start_pt_m: Point::ZERO,
            last_pt: Point::ZERO,
            last_pt_m: Point::ZERO,
            point: Point::ZERO,
            point_m: Point::ZERO,
            start_pt2: Point::ZERO,
            start_pt2_m: Point::ZERO,
            point2: Point::ZERO,
            point2_m: Point::ZERO,
            mm_to_model: 1.0,
            px_to_model: 1.0,
            from_finger: true,
        }
    }
}

impl Motion {
    /// Convert a millimeter tolerance to model units.
    pub fn display_mm_to_model(&self, mm: f64) -> f64 {
        mm * self.mm_to_model
    }

    /// Convert display pixels to model units.
    pub fn display_to_model_len(&self, pixels: f64) -> f64 {
        pixels * self.px_to_model
    }

    /// Display distance the pointer travelled since the gesture began.
    pub fn drag_distance(&self) -> f64 {
        self.point.distance(self.start_pt)
    }

    /// Model displacement since the gesture began.
    pub fn drag_delta_m(&self) -> Vec2 {
        self.point_m - self.start_pt_m
    }

    /// A single-pointer drag is in progress.
    pub fn dragging(&self) -> bool {
        self.gesture_type == GestureType::Pan
            && matches!(self.gesture_state, GestureState::Began | GestureState::Moved)
    }

    pub fn start_center_m(&self) -> Point {
        self.start_pt_m.midpoint(self.start_pt2_m)
    }

    pub fn center_m(&self) -> Point {
        self.point_m.midpoint(self.point2_m)
    }

    pub fn start_distance_m(&self) -> f64 {
        self.start_pt_m.distance(self.start_pt2_m)
    }

    pub fn distance_m(&self) -> f64 {
        self.point_m.distance(self.point2_m)
    }
}
