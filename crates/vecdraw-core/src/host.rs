//! Boundary to the hosting view: notifications, capability checks and drawing.

use crate::actions::{Action, SelectState};
use crate::command::Command;
use crate::shapes::{Shape, ShapeId};
use kurbo::{Point, Rect};
use peniko::Color;

/// What the select command reports when a drag finishes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TouchEndedInfo {
    /// Shape whose handle was dragged, 0 if none.
    pub shape: ShapeId,
    /// Dragged handle index, -1 for a whole-shape move.
    pub handle: i32,
    /// Shape and handle the drag snapped onto, if any.
    pub snapped_shape: ShapeId,
    pub snapped_handle: i32,
    /// All shapes in the selection.
    pub ids: Vec<ShapeId>,
}

/// Notifications and capability checks supplied by the hosting view.
///
/// Every method has a permissive default so hosts implement only what they need.
pub trait ViewHost {
    /// Touch input (full millimeter tolerances) or mouse input (scaled down).
    fn use_finger(&self) -> bool {
        true
    }

    fn shape_will_add(&self, _shape: &Shape) -> bool {
        true
    }

    fn shape_added(&self, _id: ShapeId) {}

    fn shape_will_delete(&self, _shape: &Shape) -> bool {
        true
    }

    fn shape_deleted(&self, _id: ShapeId) {}

    fn shape_can_rotate(&self, _shape: &Shape) -> bool {
        true
    }

    fn shape_can_transform(&self, _shape: &Shape) -> bool {
        true
    }

    fn shape_can_unlock(&self, _shape: &Shape) -> bool {
        true
    }

    fn shape_can_ungroup(&self, _shape: &Shape) -> bool {
        true
    }

    fn shape_moved(&self, _id: ShapeId, _segment: i32) {}

    fn selection_changed(&self) {}

    fn command_changed(&self, _name: &str) {}

    /// The document committed new changes; `generation` increases with each commit.
    fn content_changed(&self, _generation: u64) {}

    /// Dynamic (in-progress) shapes need repainting.
    fn redraw(&self) {}

    /// Committed shapes need regenerating.
    fn regen_all(&self, _changed: bool) {}

    /// One shape was appended on top of the committed shapes.
    fn regen_append(&self, _id: ShapeId) {}

    /// Show a context menu; returns whether the host displayed it.
    fn show_context_actions(
        &self,
        _state: SelectState,
        _actions: &[Action],
        _display_box: Rect,
        _shape: Option<ShapeId>,
    ) -> bool {
        false
    }

    fn is_context_actions_visible(&self) -> bool {
        false
    }

    /// Supply a command the manager does not know.
    fn create_command(&self, _name: &str) -> Option<Box<dyn Command>> {
        None
    }

    /// Handle an action code first; returning true stops further dispatch.
    fn do_action(&self, _action: u32) -> bool {
        false
    }

    fn on_select_touch_ended(&self, _info: &TouchEndedInfo) {}
}

/// A host that accepts every default.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHost;

impl ViewHost for NullHost {}

/// Stroke used for overlays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuideStyle {
    pub color: Color,
    pub width: f64,
    pub dashed: bool,
}

impl GuideStyle {
    pub fn solid(color: Color, width: f64) -> Self {
        Self {
            color,
            width,
            dashed: false,
        }
    }

    pub fn dashed(color: Color, width: f64) -> Self {
        Self {
            color,
            width,
            dashed: true,
        }
    }
}

/// Receiver of draw calls for transient command state, in model coordinates.
pub trait GraphicsSink {
    fn draw_shape(&mut self, shape: &Shape);
    fn draw_line(&mut self, from: Point, to: Point, style: &GuideStyle);
    fn draw_circle(&mut self, center: Point, radius: f64, style: &GuideStyle);
    fn draw_rect(&mut self, rect: Rect, style: &GuideStyle);
}

/// A recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Shape(Shape),
    Line { from: Point, to: Point, style: GuideStyle },
    Circle { center: Point, radius: f64, style: GuideStyle },
    Rect { rect: Rect, style: GuideStyle },
}

/// A sink that records draw calls.
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    pub ops: Vec<DrawOp>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn shapes(&self) -> impl Iterator<Item = &Shape> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Shape(shape) => Some(shape),
            _ => None,
        })
    }
}

impl GraphicsSink for DrawList {
    fn draw_shape(&mut self, shape: &Shape) {
        self.ops.push(DrawOp::Shape(shape.clone()));
    }

    fn draw_line(&mut self, from: Point, to: Point, style: &GuideStyle) {
        self.ops.push(DrawOp::Line {
            from,
            to,
            style: *style,
        });
    }

    fn draw_circle(&mut self, center: Point, radius: f64, style: &GuideStyle) {
        self.ops.push(DrawOp::Circle {
            center,
            radius,
            style: *style,
        });
    }

    fn draw_rect(&mut self, rect: Rect, style: &GuideStyle) {
        self.ops.push(DrawOp::Rect { rect, style: *style });
    }
}
