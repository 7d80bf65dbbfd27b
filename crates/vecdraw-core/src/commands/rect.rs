//! Rectangle-drag commands: rect, square, ellipse and circle.

use super::draw::{DrawCore, replay_points};
use crate::command::{CmdContext, Command};
use crate::host::GraphicsSink;
use crate::shapes::{BaseRect, Geometry, Shape, ShapeId};
use crate::storage::CmdParams;
use kurbo::Point;

/// Both sides must exceed this to commit.
const MIN_SIDE_MM: f64 = 2.0;
/// The diagonal must exceed this to commit.
const MIN_DIAGONAL_MM: f64 = 4.0;
/// A release closer than this to the press point (display pixels) is a tap.
const TAP_SLOP_PX: f64 = 2.0;

/// Draws a frame from the press point to the release point.
#[derive(Debug, Clone)]
pub struct CmdDrawRect {
    name: &'static str,
    pub(crate) core: DrawCore,
    start: Point,
}

impl CmdDrawRect {
    pub(crate) fn with_shape(name: &'static str, shape: Shape) -> Self {
        Self {
            name,
            core: DrawCore::new(shape),
            start: Point::ZERO,
        }
    }

    pub fn rect() -> Self {
        Self::with_shape("rect", Shape::new(Geometry::Rect(BaseRect::default())))
    }

    pub fn square() -> Self {
        Self::with_shape("square", Shape::new(Geometry::Rect(BaseRect::square())))
    }

    pub fn ellipse() -> Self {
        Self::with_shape("ellipse", Shape::new(Geometry::Ellipse(BaseRect::default())))
    }

    pub fn circle() -> Self {
        Self::with_shape("circle", Shape::new(Geometry::Ellipse(BaseRect::square())))
    }

    fn set_corners(&mut self, a: Point, b: Point) {
        if let Some(frame) = self.core.shape.frame_mut() {
            frame.set_rect_2p(a, b);
        }
    }

    /// The dragged frame is big enough to keep.
    pub(crate) fn is_acceptable(&self, ctx: &CmdContext<'_>) -> bool {
        let Some(frame) = self.core.shape.frame() else {
            return false;
        };
        let (w, h) = (frame.width(), frame.height());
        w > ctx.mm(MIN_SIDE_MM) && h > ctx.mm(MIN_SIDE_MM) && w.hypot(h) > ctx.mm(MIN_DIAGONAL_MM)
    }

    /// Handle the release of the frame drag without committing.
    ///
    /// Returns `Some(true)` when the frame is acceptable, `Some(false)` when it
    /// was discarded, and `None` when the release was a tap and got handled as one.
    pub(crate) fn finish_drag(&mut self, ctx: &mut CmdContext<'_>) -> Option<bool> {
        let end = self.core.snap(ctx, 2);
        self.set_corners(self.start, end);
        if self.is_acceptable(ctx) {
            return Some(true);
        }
        if ctx.motion.drag_distance() < TAP_SLOP_PX {
            self.core.cancel(ctx);
            DrawCore::idle_click(ctx);
            return None;
        }
        self.core.cancel(ctx);
        Some(false)
    }
}

impl Command for CmdDrawRect {
    fn name(&self) -> &str {
        self.name
    }

    fn initialize(&mut self, ctx: &mut CmdContext<'_>, params: Option<&CmdParams>, _selected: &[ShapeId]) -> bool {
        self.core.initialize(ctx, params);
        replay_points(self, ctx, params);
        true
    }

    fn cancel(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        self.core.cancel(ctx)
    }

    fn back_step(&mut self, _ctx: &mut CmdContext<'_>) -> bool {
        self.core.back_step()
    }

    fn draw(&self, ctx: &CmdContext<'_>, sink: &mut dyn GraphicsSink) -> bool {
        self.core.draw(ctx, sink)
    }

    fn gather_shapes(&self, out: &mut Vec<Shape>) -> bool {
        self.core.gather_shapes(out)
    }

    fn click(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        if self.core.step == 0 {
            DrawCore::idle_click(ctx)
        } else {
            self.touch_began(ctx) && self.touch_ended(ctx)
        }
    }

    fn touch_began(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        self.core.step = 1;
        self.start = self.core.snap(ctx, 0);
        self.set_corners(self.start, self.start);
        true
    }

    fn touch_moved(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        if self.core.step == 0 {
            return false;
        }
        let end = self.core.snap(ctx, 2);
        self.set_corners(self.start, end);
        true
    }

    fn touch_ended(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        if self.core.step == 0 {
            return false;
        }
        if self.finish_drag(ctx) == Some(true) {
            self.core.commit(ctx);
        }
        true
    }

    fn is_drawing_command(&self) -> bool {
        true
    }
}
