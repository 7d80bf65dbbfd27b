//! Two-point line and single-point dot commands.

use super::draw::{DrawCore, MIN_STEP_MM, replay_points};
use crate::command::{CmdContext, Command};
use crate::host::GraphicsSink;
use crate::shapes::{Shape, ShapeId};
use crate::storage::CmdParams;
use kurbo::Point;

/// A release closer than this to the press point (display pixels) is a tap.
const TAP_SLOP_PX: f64 = 2.0;

/// Drags a straight line from the press point.
#[derive(Debug, Clone)]
pub struct CmdDrawLine {
    pub(crate) core: DrawCore,
}

impl Default for CmdDrawLine {
    fn default() -> Self {
        Self::new()
    }
}

impl CmdDrawLine {
    pub fn new() -> Self {
        Self {
            core: DrawCore::new(Shape::line(Point::ZERO, Point::ZERO)),
        }
    }

    fn length(&self) -> f64 {
        self.core.shape.point(0).distance(self.core.shape.point(1))
    }
}

impl Command for CmdDrawLine {
    fn name(&self) -> &str {
        "line"
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
        let start = self.core.snap(ctx, 0);
        self.core.shape.set_point(0, start);
        self.core.shape.set_point(1, start);
        true
    }

    fn touch_moved(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        if self.core.step == 0 {
            return false;
        }
        let end = self.core.snap(ctx, 1);
        self.core.shape.set_point(1, end);
        true
    }

    fn touch_ended(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        if self.core.step == 0 {
            return false;
        }
        let end = self.core.snap(ctx, 1);
        self.core.shape.set_point(1, end);
        if self.length() > ctx.mm(MIN_STEP_MM) {
            self.core.commit(ctx);
        } else {
            self.core.cancel(ctx);
            if ctx.motion.drag_distance() < TAP_SLOP_PX {
                DrawCore::idle_click(ctx);
            }
        }
        true
    }

    fn is_drawing_command(&self) -> bool {
        true
    }
}

/// Places a dot where the pointer lifts.
#[derive(Debug, Clone)]
pub struct CmdDrawDot {
    pub(crate) core: DrawCore,
}

impl Default for CmdDrawDot {
    fn default() -> Self {
        Self::new()
    }
}

impl CmdDrawDot {
    pub fn new() -> Self {
        Self {
            core: DrawCore::new(Shape::dot(Point::ZERO)),
        }
    }
}

impl Command for CmdDrawDot {
    fn name(&self) -> &str {
        "dot"
    }

    fn initialize(&mut self, ctx: &mut CmdContext<'_>, params: Option<&CmdParams>, _selected: &[ShapeId]) -> bool {
        self.core.initialize(ctx, params);
        replay_points(self, ctx, params);
        true
    }

    fn cancel(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        self.core.cancel(ctx)
    }

    fn draw(&self, ctx: &CmdContext<'_>, sink: &mut dyn GraphicsSink) -> bool {
        self.core.draw(ctx, sink)
    }

    fn gather_shapes(&self, out: &mut Vec<Shape>) -> bool {
        self.core.gather_shapes(out)
    }

    fn click(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        self.touch_began(ctx) && self.touch_ended(ctx)
    }

    fn touch_began(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        self.core.step = 1;
        let pt = self.core.snap(ctx, 0);
        self.core.shape.set_point(0, pt);
        true
    }

    fn touch_moved(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        if self.core.step == 0 {
            return false;
        }
        let pt = self.core.snap(ctx, 0);
        self.core.shape.set_point(0, pt);
        true
    }

    fn touch_ended(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        if self.core.step == 0 {
            return false;
        }
        let pt = self.core.snap(ctx, 0);
        self.core.shape.set_point(0, pt);
        self.core.commit(ctx);
        true
    }

    fn is_drawing_command(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::Fixture;
    use crate::shapes::ShapeKind;

    #[test]
    fn test_drag_draws_line() {
        let mut fx = Fixture::new();
        let mut cmd = CmdDrawLine::new();
        fx.began(&mut cmd, 0.0, 0.0);
        fx.moved(&mut cmd, 50.0, 0.0);
        fx.ended(&mut cmd, 100.0, 0.0);
        let shapes = fx.shapes();
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].points(), vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)]);
        assert_eq!(cmd.core.step, 0);
    }

    #[test]
    fn test_short_line_is_discarded() {
        let mut fx = Fixture::new();
        let mut cmd = CmdDrawLine::new();
        fx.drag(&mut cmd, (0.0, 0.0), (1.0, 1.0));
        assert!(fx.shapes().is_empty());
        assert_eq!(cmd.core.step, 0);
    }

    #[test]
    fn test_tap_places_dot() {
        let mut fx = Fixture::new();
        let mut cmd = CmdDrawDot::new();
        assert!(fx.tap(&mut cmd, 7.0, 8.0));
        let shapes = fx.shapes();
        assert_eq!(shapes[0].kind(), ShapeKind::Dot);
        assert_eq!(shapes[0].point(0), Point::new(7.0, 8.0));
    }
}
