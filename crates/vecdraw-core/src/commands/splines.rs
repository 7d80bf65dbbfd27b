//! Spline commands: freehand sketching and click-by-click curves.

use super::draw::{DrawCore, replay_points};
use crate::command::{CmdContext, Command};
use crate::host::{GraphicsSink, GuideStyle};
use crate::shapes::{Shape, ShapeId, geom::is_empty_extent};
use crate::storage::CmdParams;
use kurbo::{Point, Vec2};
use peniko::Color;

/// Freehand samples closer than this to the last point are skipped.
const SAMPLE_GAP_MM: f64 = 0.5;
/// A click-by-click curve whose end returns this close to its start closes.
const CLOSE_MM: f64 = 1.0;
/// A freehand stroke whose extent stays below this is treated as a tap.
const EMPTY_EXTENT_MM: f64 = 1.0;
/// Number of recent vertices marked while placing a click-by-click curve.
const MARKED_TAIL: usize = 5;

const VERTEX_MARK_COLOR: Color = Color::from_rgba8(64, 128, 64, 172);

/// Draws a spline through sampled or clicked points.
#[derive(Debug, Clone)]
pub struct CmdDrawSplines {
    name: &'static str,
    core: DrawCore,
    freehand: bool,
}

impl CmdDrawSplines {
    /// Sketch by dragging; samples are midpoints of consecutive pointer positions.
    pub fn freehand() -> Self {
        Self {
            name: "splines",
            core: DrawCore::new(Shape::splines(Vec::new(), false)),
            freehand: true,
        }
    }

    /// Place one control point per tap; the last point follows the pointer.
    pub fn by_clicks() -> Self {
        Self {
            name: "spline_mouse",
            core: DrawCore::new(Shape::splines(Vec::new(), false)),
            freehand: false,
        }
    }

    pub fn step(&self) -> usize {
        self.core.step
    }

    fn end_point(&self) -> Point {
        self.core.shape.polyline().map_or(Point::ZERO, |p| p.end_point())
    }

    fn count(&self) -> usize {
        self.core.shape.point_count()
    }

    fn remove_at(&mut self, index: usize) {
        if let Some(p) = self.core.shape.polyline_mut() {
            if index < p.points.len() {
                p.points.remove(index);
            }
        }
    }

    /// A tap while sketching leaves a tiny line so the mark stays visible.
    fn add_tap_line(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        let motion = ctx.motion;
        let mut end = motion.point_m;
        if motion.point.distance(motion.start_pt) < 1.0 {
            end = ctx.view.to_model(motion.point + Vec2::new(1.0, 1.0));
        }
        let mut line = Shape::line(motion.start_pt_m, end);
        line.flags = self.core.shape.flags;
        line.style = self.core.shape.style.clone();
        ctx.add_shape(line);
        self.core.step = 0;
        self.core.shape.clear();
        true
    }
}

impl Command for CmdDrawSplines {
    fn name(&self) -> &str {
        self.name
    }

    fn initialize(&mut self, ctx: &mut CmdContext<'_>, params: Option<&CmdParams>, _selected: &[ShapeId]) -> bool {
        self.core.initialize(ctx, params);
        replay_points(self, ctx, params);
        true
    }

    fn cancel(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        if !self.freehand && self.core.step > 1 {
            // The trailing point only tracks the pointer.
            self.remove_at(self.core.step);
            self.core.commit(ctx);
            return true;
        }
        self.core.cancel(ctx)
    }

    fn back_step(&mut self, _ctx: &mut CmdContext<'_>) -> bool {
        let step = self.core.step;
        if step > 1 {
            self.remove_at(if self.freehand { step - 1 } else { step });
        }
        self.core.back_step()
    }

    fn draw(&self, ctx: &CmdContext<'_>, sink: &mut dyn GraphicsSink) -> bool {
        if self.core.step > 0 && !self.freehand {
            let style = GuideStyle::solid(VERTEX_MARK_COLOR, 0.0);
            let radius = ctx.mm(0.8);
            let points = self.core.shape.points();
            for pt in points.iter().rev().take(MARKED_TAIL) {
                sink.draw_circle(*pt, radius, &style);
            }
            if let Some(first) = points.first() {
                sink.draw_circle(*first, radius * 1.5, &style);
            }
        }
        self.core.draw(ctx, sink)
    }

    fn gather_shapes(&self, out: &mut Vec<Shape>) -> bool {
        self.core.gather_shapes(out)
    }

    fn click(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        if self.freehand {
            return self.add_tap_line(ctx);
        }
        if self.core.step == 0 {
            DrawCore::idle_click(ctx)
        } else {
            self.touch_began(ctx) && self.touch_ended(ctx)
        }
    }

    fn touch_began(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        let pnt = if self.freehand {
            ctx.motion.start_pt_m
        } else {
            self.core.snap(ctx, self.core.step as i32)
        };
        if self.core.step > 0 && !self.freehand {
            self.core.step += 1;
            if self.core.step >= self.count() {
                self.core.shape.add_point(pnt);
            }
            self.core.shape.set_point(self.core.step, pnt);
            return true;
        }
        if let Some(p) = self.core.shape.polyline_mut() {
            p.closed = false;
            p.points = if self.freehand { vec![pnt] } else { vec![pnt, pnt] };
        }
        self.core.step = 1;
        true
    }

    fn touch_moved(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        if self.core.step == 0 {
            return false;
        }
        if self.freehand {
            let pnt = ctx.motion.point_m.midpoint(ctx.motion.last_pt_m);
            if ctx.motion.point_m.distance(self.end_point()) >= ctx.mm(SAMPLE_GAP_MM) {
                self.core.shape.add_point(pnt);
                self.core.step += 1;
            }
        } else {
            let pnt = self.core.snap(ctx, self.core.step as i32);
            self.core.shape.set_point(self.core.step, pnt);
        }
        true
    }

    fn touch_ended(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        if self.freehand {
            let tol = ctx.mm(EMPTY_EXTENT_MM);
            let drawn = self.core.step > 0 && !is_empty_extent(self.core.shape.extent(), tol);
            if drawn {
                self.core.commit(ctx);
            } else {
                self.add_tap_line(ctx);
            }
            self.core.step = 0;
            return true;
        }
        if self.core.step == 0 {
            return false;
        }
        let close_tol = ctx.mm(CLOSE_MM);
        while self.core.step > 1 && self.end_point().distance(self.core.shape.point(0)) < close_tol {
            self.core.shape.set_closed(true);
            self.remove_at(self.core.step);
            self.core.step -= 1;
        }
        if self.core.step > 1 && self.core.shape.is_closed() {
            self.core.commit(ctx);
        }
        true
    }

    fn mouse_hover(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        !self.freehand && self.core.step > 0 && self.touch_moved(ctx)
    }

    fn is_drawing_command(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::Fixture;
    use crate::motion::GestureState;
    use crate::shapes::ShapeKind;

    #[test]
    fn test_freehand_samples_midpoints() {
        let mut fx = Fixture::new();
        let mut cmd = CmdDrawSplines::freehand();
        fx.began(&mut cmd, 0.0, 0.0);
        fx.moved(&mut cmd, 10.0, 0.0);
        fx.moved(&mut cmd, 20.0, 10.0);
        assert_eq!(cmd.step(), 3);
        assert_eq!(cmd.core.shape.point(1), Point::new(5.0, 0.0));
        assert_eq!(cmd.core.shape.point(2), Point::new(15.0, 5.0));
        fx.ended(&mut cmd, 20.0, 10.0);
        let shapes = fx.shapes();
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].kind(), ShapeKind::Splines);
        assert_eq!(cmd.step(), 0);
    }

    #[test]
    fn test_freehand_tap_adds_short_line() {
        let mut fx = Fixture::new();
        let mut cmd = CmdDrawSplines::freehand();
        fx.began(&mut cmd, 5.0, 5.0);
        fx.ended(&mut cmd, 5.0, 5.0);
        let shapes = fx.shapes();
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].kind(), ShapeKind::Line);
        assert_eq!(shapes[0].point(0), Point::new(5.0, 5.0));
        assert_eq!(shapes[0].point(1), Point::new(6.0, 6.0));
    }

    #[test]
    fn test_click_spline_then_cancel_commits() {
        let mut fx = Fixture::new();
        let mut cmd = CmdDrawSplines::by_clicks();
        fx.drag(&mut cmd, (0.0, 0.0), (50.0, 0.0));
        fx.tap(&mut cmd, 50.0, 50.0);
        assert_eq!(cmd.step(), 2);
        fx.at(GestureState::Moved, 80.0, 80.0);
        assert!(cmd.mouse_hover(&mut fx.ctx()));
        assert!(cmd.cancel(&mut fx.ctx()));
        let shapes = fx.shapes();
        assert_eq!(shapes.len(), 1);
        assert_eq!(
            shapes[0].points(),
            vec![Point::new(0.0, 0.0), Point::new(50.0, 0.0)]
        );
    }

    #[test]
    fn test_click_spline_closes_on_start() {
        let mut fx = Fixture::new();
        let mut cmd = CmdDrawSplines::by_clicks();
        fx.drag(&mut cmd, (0.0, 0.0), (50.0, 0.0));
        fx.tap(&mut cmd, 50.0, 50.0);
        fx.tap(&mut cmd, 0.2, 0.3);
        let shapes = fx.shapes();
        assert_eq!(shapes.len(), 1);
        assert!(shapes[0].is_closed());
        assert_eq!(shapes[0].point_count(), 3);
    }
}
