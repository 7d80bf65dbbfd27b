//! Shared state of the shape-drawing commands.

use crate::actions;
use crate::command::{CmdContext, Command};
use crate::host::GraphicsSink;
use crate::motion::{GestureState, GestureType, Motion};
use crate::shapes::{SerializableColor, Shape, ShapeId};
use crate::storage::{CmdParams, ParamStorage};
use kurbo::Point;

/// A new point must be this far from the previous one to count as a step.
pub const MIN_STEP_MM: f64 = 2.0;

/// Step counter and temporary shape of a draw command.
///
/// The step is 0 exactly when no geometry is in progress.
#[derive(Debug, Clone)]
pub struct DrawCore {
    pub step: usize,
    pub shape: Shape,
}

impl DrawCore {
    pub fn new(shape: Shape) -> Self {
        let mut shape = shape;
        shape.clear();
        Self { step: 0, shape }
    }

    /// Reset, then take initial flags and style from the params.
    pub fn initialize(&mut self, ctx: &mut CmdContext<'_>, params: Option<&CmdParams>) {
        self.step = 0;
        self.shape.clear();
        ctx.snap.clear_snap();
        let Some(params) = params else {
            return;
        };
        let flags = &mut self.shape.flags;
        flags.fixed_length = params.read_bool("fixedlen", flags.fixed_length);
        flags.fixed_size = params.read_bool("fixedsize", flags.fixed_size);
        flags.locked = params.read_bool("locked", flags.locked);
        let style = &mut self.shape.style;
        style.stroke_width = params.read_f64("lineWidth", style.stroke_width);
        if params.contains("lineRGB") {
            style.stroke_color = SerializableColor::from_rgb(params.read_u32("lineRGB", 0));
        }
    }

    pub fn cancel(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        if self.step == 0 {
            return false;
        }
        self.step = 0;
        self.shape.clear();
        ctx.snap.clear_snap();
        true
    }

    pub fn back_step(&mut self) -> bool {
        if self.step > 1 {
            self.step -= 1;
            true
        } else {
            false
        }
    }

    pub fn draw(&self, ctx: &CmdContext<'_>, sink: &mut dyn GraphicsSink) -> bool {
        if self.step > 0 {
            sink.draw_shape(&self.shape);
        }
        ctx.snap.draw_snap(sink);
        true
    }

    pub fn gather_shapes(&self, out: &mut Vec<Shape>) -> bool {
        if self.step > 0 && self.shape.point_count() > 0 {
            out.push(self.shape.clone());
            true
        } else {
            false
        }
    }

    /// Snap the current pointer position with `hot` as the handle being placed.
    pub fn snap(&self, ctx: &mut CmdContext<'_>, hot: i32) -> Point {
        let point = ctx.motion.point_m;
        ctx.snap_point(point, Some(&self.shape), hot)
    }

    /// The pointer moved far enough from `prev` to place another point.
    pub fn moved_enough(ctx: &CmdContext<'_>, prev: Point, point: Point) -> bool {
        prev.distance(point) > ctx.mm(MIN_STEP_MM)
    }

    /// Commit the temporary shape and go idle.
    pub fn commit(&mut self, ctx: &mut CmdContext<'_>) -> Option<ShapeId> {
        let id = ctx.add_shape(self.shape.clone());
        self.step = 0;
        self.shape.clear();
        ctx.snap.clear_snap();
        id
    }

    /// A tap while idle: jump to the tapped shape, or offer the drawing actions.
    pub fn idle_click(ctx: &mut CmdContext<'_>) -> bool {
        if ctx.config.not_click_select_in_draw_cmd {
            return true;
        }
        let point = ctx.motion.point_m;
        if let Some((id, _)) = ctx.hit_test(point, ctx.config.hit_test_tol_mm) {
            log::debug!("Shape {} tapped while drawing, switching to select", id);
            ctx.to_select(vec![id]);
            return true;
        }
        ctx.motion.from_finger && actions::show_in_drawing(ctx)
    }
}

fn synthetic_motion(base: &Motion, ctx: &CmdContext<'_>, state: GestureState, start: Point, last: Point, point: Point) -> Motion {
    Motion {
        gesture_type: GestureType::Pan,
        gesture_state: state,
        start_pt: ctx.view.to_display(start),
        start_pt_m: start,
        last_pt: ctx.view.to_display(last),
        last_pt_m: last,
        point: ctx.view.to_display(point),
        point_m: point,
        ..base.clone()
    }
}

fn replay_drag(cmd: &mut dyn Command, ctx: &mut CmdContext<'_>, base: &Motion, path: &[Point]) {
    let start = path[0];
    let mut last = start;
    let m = synthetic_motion(base, ctx, GestureState::Began, start, start, start);
    cmd.touch_began(&mut ctx.with_motion(&m));
    for &pt in &path[1..] {
        let m = synthetic_motion(base, ctx, GestureState::Moved, start, last, pt);
        cmd.touch_moved(&mut ctx.with_motion(&m));
        last = pt;
    }
    let m = synthetic_motion(base, ctx, GestureState::Ended, start, last, last);
    cmd.touch_ended(&mut ctx.with_motion(&m));
}

/// Replay the `points` param through `cmd` as drags, with snapping off.
///
/// With `multiMoved` the points form one drag; otherwise each consecutive
/// pair is its own drag. The command is cancelled afterwards: polylines and
/// click-by-click splines commit a usable shape left in progress, the other
/// commands discard it.
pub fn replay_points(cmd: &mut dyn Command, ctx: &mut CmdContext<'_>, params: Option<&CmdParams>) -> bool {
    let Some(params) = params else {
        return false;
    };
    let points = params.read_points("points");
    if points.is_empty() {
        return false;
    }
    let was_enabled = ctx.snap.is_enabled();
    ctx.snap.set_enabled(false);
    let base = ctx.motion.clone();

    if params.read_bool("multiMoved", false) || points.len() == 1 {
        replay_drag(cmd, ctx, &base, &points);
    } else {
        for pair in points.windows(2) {
            replay_drag(cmd, ctx, &base, pair);
        }
    }
    ctx.snap.set_enabled(was_enabled);
    cmd.cancel(ctx);
    true
}
