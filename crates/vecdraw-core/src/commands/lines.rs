//! Multi-point commands: polylines, polygons, quadrangles and triangles.

use super::draw::{DrawCore, replay_points};
use crate::command::{CmdContext, Command};
use crate::host::{GraphicsSink, GuideStyle};
use crate::shapes::geom::point_to_line_dist;
use crate::shapes::{LinesHitKind, Shape, ShapeId, lines_hit};
use crate::storage::{CmdParams, ParamStorage};
use kurbo::Point;
use peniko::Color;

/// Pressing this close to an existing vertex or edge edits it instead of appending.
const HIT_MM: f64 = 5.0;
/// The pending point closes the outline when this close to the first point.
const CLOSE_MM: f64 = 2.0;
/// Minimum gap between neighbouring vertices.
const MIN_GAP_MM: f64 = 3.0;
/// Minimum distance of a vertex from the line through its neighbours.
const MIN_OFF_LINE_MM: f64 = 1.0;
/// Tapping this close to the outline's center finishes it.
const FINISH_TAP_MM: f64 = 5.0;
/// Edge limit of the polygon command.
pub const DEFAULT_MAX_EDGES: usize = 20;

const FINISH_HANDLE_COLOR: Color = Color::from_rgba8(255, 128, 0, 200);

/// Builds a point list one vertex per tap or drag.
///
/// With a nonzero edge limit the outline is a polygon: it is always closed and
/// is committed when the limit is reached. Either way a pending point dropped
/// on the first vertex closes and commits the outline.
#[derive(Debug, Clone)]
pub struct CmdDrawLines {
    name: &'static str,
    core: DrawCore,
    /// Vertex under the pointer.
    index: usize,
    /// Zero for an open-ended polyline.
    max_edges: usize,
    default_max_edges: usize,
    last_clicked: bool,
}

impl CmdDrawLines {
    fn with_limit(name: &'static str, max_edges: usize) -> Self {
        Self {
            name,
            core: DrawCore::new(Shape::lines(Vec::new(), max_edges > 0)),
            index: 0,
            max_edges,
            default_max_edges: max_edges,
            last_clicked: false,
        }
    }

    pub fn lines() -> Self {
        Self::with_limit("lines", 0)
    }

    pub fn polygon() -> Self {
        Self::with_limit("polygon", DEFAULT_MAX_EDGES)
    }

    pub fn quadrangle() -> Self {
        Self::with_limit("quadrangle", 4)
    }

    pub fn step(&self) -> usize {
        self.core.step
    }

    fn is_polygon(&self) -> bool {
        self.default_max_edges > 0
    }

    fn need_ended(&self) -> bool {
        self.max_edges > 0 && self.core.step + 1 >= self.max_edges
    }

    fn points(&self) -> &[Point] {
        self.core.shape.polyline().map_or(&[], |p| p.points.as_slice())
    }

    fn count(&self) -> usize {
        self.points().len()
    }

    fn remove_at(&mut self, index: usize) {
        if let Some(p) = self.core.shape.polyline_mut() {
            if index < p.points.len() {
                p.points.remove(index);
            }
        }
    }

    fn finish_threshold(&self) -> usize {
        if self.core.shape.is_closed() { 2 } else { 1 }
    }

    /// Whether the pending end point sits on the first vertex.
    fn check_closed(&mut self, ctx: &CmdContext<'_>, pnt: Point) -> bool {
        if self.index != self.core.step {
            return false;
        }
        let near = self.core.step > 2 && pnt.distance(self.core.shape.point(0)) < ctx.mm(CLOSE_MM);
        if !self.is_polygon() {
            self.core.shape.set_closed(near);
        }
        near
    }

    fn can_add_point(&self, ctx: &CmdContext<'_>, pnt: Point) -> bool {
        let Some(lines) = self.core.shape.polyline() else {
            return false;
        };
        let pts = &lines.points;
        let n = pts.len();
        if self.index == 0 || self.index >= n {
            return false;
        }
        let min_gap = ctx.mm(MIN_GAP_MM);
        let has_next = self.index + 1 < n;
        let prev = pts[self.index - 1];
        if prev.distance(pnt) < min_gap {
            return false;
        }
        if has_next && pts[self.index + 1].distance(pnt) < min_gap {
            return false;
        }
        if lines.closed || has_next {
            let next = pts[(self.index + 1) % n];
            if point_to_line_dist(prev, next, pnt) < ctx.mm(MIN_OFF_LINE_MM) {
                return false;
            }
        }
        true
    }

    fn finish(&mut self, ctx: &mut CmdContext<'_>) {
        self.core.commit(ctx);
        self.index = 0;
        self.last_clicked = false;
    }
}

impl Command for CmdDrawLines {
    fn name(&self) -> &str {
        self.name
    }

    fn initialize(&mut self, ctx: &mut CmdContext<'_>, params: Option<&CmdParams>, _selected: &[ShapeId]) -> bool {
        self.core.initialize(ctx, params);
        self.core.shape.set_closed(self.is_polygon());
        self.index = 0;
        if self.is_polygon() {
            let max = params.map_or(self.default_max_edges, |p| {
                p.read_u32("maxEdges", self.default_max_edges as u32) as usize
            });
            self.max_edges = max.max(3);
        }
        replay_points(self, ctx, params);
        true
    }

    fn cancel(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        if self.core.step > self.finish_threshold() && self.count() > 2 {
            self.finish(ctx);
            return true;
        }
        self.index = 0;
        let cancelled = self.core.cancel(ctx);
        self.core.shape.set_closed(self.is_polygon());
        cancelled
    }

    fn back_step(&mut self, _ctx: &mut CmdContext<'_>) -> bool {
        let step = self.core.step;
        if step > 2 {
            let index = if self.index == step { step - 1 } else { self.index };
            self.remove_at(index);
            self.index = self.index.min(self.count().saturating_sub(1));
        }
        self.core.back_step()
    }

    fn draw(&self, ctx: &CmdContext<'_>, sink: &mut dyn GraphicsSink) -> bool {
        let min_step = if self.need_ended() { 3 } else { 2 };
        if self.core.step > min_step {
            let style = GuideStyle::solid(FINISH_HANDLE_COLOR, ctx.mm(0.3));
            sink.draw_circle(self.core.shape.extent().center(), ctx.mm(1.5), &style);
        }
        self.core.draw(ctx, sink)
    }

    fn gather_shapes(&self, out: &mut Vec<Shape>) -> bool {
        self.core.gather_shapes(out)
    }

    fn click(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        let min_step = if self.need_ended() { 3 } else { 2 };
        if self.core.step > min_step
            && ctx.motion.point_m.distance(self.core.shape.extent().center()) < ctx.mm(FINISH_TAP_MM)
        {
            return self.cancel(ctx);
        }
        if self.core.step == 0 {
            DrawCore::idle_click(ctx)
        } else {
            self.touch_began(ctx) && self.touch_ended(ctx)
        }
    }

    fn double_click(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        let threshold = self.finish_threshold();
        if self.core.step > threshold {
            let pending = self.core.shape.point(self.index);
            let pnt = if self.last_clicked { pending } else { ctx.motion.point_m };
            if self.count() > threshold + 1 && pnt.distance(pending) < ctx.mm(HIT_MM) {
                self.remove_at(self.index);
            }
            self.finish(ctx);
        }
        true
    }

    fn touch_began(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        let step = self.core.step;
        let pnt = self.core.snap(ctx, step as i32);
        if step == 0 {
            self.core.step = 1;
            self.index = 1;
            if let Some(p) = self.core.shape.polyline_mut() {
                p.points = vec![pnt, pnt];
            }
        } else {
            if step >= self.count() {
                let mut appended = true;
                if step > 2 {
                    let closed = self.core.shape.is_closed();
                    let hit = lines_hit(self.points(), closed, ctx.motion.point_m, ctx.mm(HIT_MM));
                    match hit.kind {
                        LinesHitKind::OnEdge => {
                            self.core.shape.insert_point(hit.segment as i32, pnt);
                            self.index = hit.segment + 1;
                            appended = false;
                        }
                        // Vertex 0 is where the outline closes, so it is never dragged here.
                        LinesHitKind::AtVertex if hit.segment != 0 => {
                            self.index = hit.segment;
                            appended = false;
                        }
                        _ => {}
                    }
                }
                if appended {
                    self.core.shape.add_point(pnt);
                    self.core.step = step.min(self.count() - 1);
                    self.index = self.core.step;
                }
            }
            self.core.shape.set_point(self.index, pnt);
        }
        self.last_clicked = true;
        true
    }

    fn touch_moved(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        if self.core.step == 0 {
            return false;
        }
        let pnt = self.core.snap(ctx, self.index as i32);
        self.core.shape.set_point(self.index, pnt);
        self.check_closed(ctx, pnt);
        self.last_clicked = false;
        true
    }

    fn touch_ended(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        if self.core.step == 0 {
            return false;
        }
        let pnt = self.core.snap(ctx, self.index as i32);
        self.core.shape.set_point(self.index, pnt);

        if self.check_closed(ctx, pnt) {
            // The closing point duplicates the first vertex.
            self.remove_at(self.core.step);
            self.core.shape.set_closed(true);
            self.finish(ctx);
            return true;
        }
        if self.can_add_point(ctx, pnt) {
            if self.need_ended() {
                self.finish(ctx);
            } else if self.core.step <= self.count() {
                self.core.step += 1;
            }
        } else if self.core.step > 1 {
            if self.core.step >= self.count() {
                self.core.step -= 1;
            }
            self.remove_at(self.index);
            self.index = self.index.min(self.count().saturating_sub(1));
        }
        true
    }

    fn is_drawing_command(&self) -> bool {
        true
    }
}

/// Three points, committed as a closed triangle.
#[derive(Debug, Clone)]
pub struct CmdDrawTriangle {
    core: DrawCore,
}

impl Default for CmdDrawTriangle {
    fn default() -> Self {
        Self::new()
    }
}

impl CmdDrawTriangle {
    pub fn new() -> Self {
        Self {
            core: DrawCore::new(Shape::lines(Vec::new(), true)),
        }
    }
}

impl Command for CmdDrawTriangle {
    fn name(&self) -> &str {
        "triangle"
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
        let step = self.core.step;
        let pnt = self.core.snap(ctx, step as i32);
        if step == 0 {
            self.core.step = 1;
            if let Some(p) = self.core.shape.polyline_mut() {
                p.closed = true;
                p.points = vec![pnt; 3];
            }
        } else {
            self.core.shape.set_point(step, pnt);
        }
        true
    }

    fn touch_moved(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        let step = self.core.step;
        if step == 0 {
            return false;
        }
        let pnt = self.core.snap(ctx, step as i32);
        self.core.shape.set_point(step, pnt);
        true
    }

    fn touch_ended(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        let step = self.core.step;
        if step == 0 {
            return false;
        }
        let pnt = self.core.snap(ctx, step as i32);
        self.core.shape.set_point(step, pnt);
        if DrawCore::moved_enough(ctx, self.core.shape.point(step - 1), pnt) {
            self.core.step += 1;
            if self.core.step == 3 {
                self.core.commit(ctx);
            }
        }
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
    fn test_polyline_by_taps_then_double_click() {
        let mut fx = Fixture::new();
        let mut cmd = CmdDrawLines::lines();
        fx.drag(&mut cmd, (0.0, 0.0), (50.0, 0.0));
        assert_eq!(cmd.step(), 2);
        fx.tap(&mut cmd, 50.0, 50.0);
        // A double tap first arrives as a tap, whose point the double click drops again.
        fx.tap(&mut cmd, 100.0, 50.0);
        fx.at(crate::motion::GestureState::Ended, 100.0, 50.0);
        assert!(cmd.double_click(&mut fx.ctx()));
        let shapes = fx.shapes();
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].kind(), ShapeKind::Lines);
        assert_eq!(
            shapes[0].points(),
            vec![Point::new(0.0, 0.0), Point::new(50.0, 0.0), Point::new(50.0, 50.0)]
        );
        assert!(!shapes[0].is_closed());
    }

    #[test]
    fn test_lines_auto_close() {
        let mut fx = Fixture::new();
        let mut cmd = CmdDrawLines::lines();
        fx.drag(&mut cmd, (0.0, 0.0), (100.0, 0.0));
        fx.tap(&mut cmd, 100.0, 100.0);
        fx.tap(&mut cmd, 0.0, 100.0);
        fx.tap(&mut cmd, 0.5, 0.5);
        let shapes = fx.shapes();
        assert_eq!(shapes.len(), 1);
        assert!(shapes[0].is_closed());
        assert_eq!(shapes[0].point_count(), 4);
        assert_eq!(cmd.step(), 0);
    }

    #[test]
    fn test_polygon_closes_on_first_point() {
        let mut fx = Fixture::new();
        let mut cmd = CmdDrawLines::polygon();
        let params = CmdParams::from_json(r#"{"maxEdges": 4}"#).unwrap();
        cmd.initialize(&mut fx.ctx(), Some(&params), &[]);
        fx.drag(&mut cmd, (0.0, 0.0), (100.0, 0.0));
        fx.tap(&mut cmd, 100.0, 100.0);
        fx.tap(&mut cmd, 1.0, 0.5);
        let shapes = fx.shapes();
        assert_eq!(shapes.len(), 1);
        assert!(shapes[0].is_closed());
        assert_eq!(
            shapes[0].points(),
            vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0), Point::new(100.0, 100.0)]
        );
    }

    #[test]
    fn test_quadrangle_ends_at_four_points() {
        let mut fx = Fixture::new();
        let mut cmd = CmdDrawLines::quadrangle();
        fx.drag(&mut cmd, (0.0, 0.0), (100.0, 0.0));
        fx.tap(&mut cmd, 100.0, 100.0);
        assert!(fx.shapes().is_empty());
        fx.tap(&mut cmd, 0.0, 100.0);
        let shapes = fx.shapes();
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].point_count(), 4);
        assert!(shapes[0].is_closed());
    }

    #[test]
    fn test_point_too_close_is_dropped() {
        let mut fx = Fixture::new();
        let mut cmd = CmdDrawLines::lines();
        fx.drag(&mut cmd, (0.0, 0.0), (100.0, 0.0));
        fx.tap(&mut cmd, 101.0, 1.0);
        assert_eq!(cmd.step(), 2);
        assert_eq!(cmd.count(), 2);
    }

    #[test]
    fn test_cancel_commits_usable_polyline() {
        let mut fx = Fixture::new();
        let mut cmd = CmdDrawLines::lines();
        fx.drag(&mut cmd, (0.0, 0.0), (100.0, 0.0));
        fx.tap(&mut cmd, 100.0, 100.0);
        assert!(cmd.cancel(&mut fx.ctx()));
        assert!(!cmd.cancel(&mut fx.ctx()));
        assert_eq!(fx.shapes().len(), 1);
    }

    #[test]
    fn test_back_step_removes_last_vertex() {
        let mut fx = Fixture::new();
        let mut cmd = CmdDrawLines::lines();
        fx.drag(&mut cmd, (0.0, 0.0), (100.0, 0.0));
        fx.tap(&mut cmd, 100.0, 100.0);
        assert_eq!(cmd.step(), 3);
        assert!(cmd.back_step(&mut fx.ctx()));
        assert_eq!(cmd.step(), 2);
        assert_eq!(cmd.count(), 2);
    }

    #[test]
    fn test_triangle() {
        let mut fx = Fixture::new();
        let mut cmd = CmdDrawTriangle::new();
        fx.drag(&mut cmd, (0.0, 0.0), (100.0, 0.0));
        fx.tap(&mut cmd, 50.0, 80.0);
        let shapes = fx.shapes();
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].point_count(), 3);
        assert!(shapes[0].is_closed());
    }
}
