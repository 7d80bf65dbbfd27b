//! Dragging the selection: moves, handle edits, box resize and rotation, pinch.

use super::{CmdSelect, DRAG_START_MM, INSERT_CANCEL_MM, can_rotate, can_transform};
use crate::command::{CmdContext, Command};
use crate::motion::GestureState;
use crate::shapes::geom::{angle_between, move_rect_handle, rect_handle, ruler_point};
use crate::shapes::{HitResult, NO_SHAPE, Shape, ShapeId, ShapeKind, scale_between};
use crate::snap::{SnapResult, SnapType};
use kurbo::{Affine, Point, Rect, Vec2};
use std::f64::consts::FRAC_PI_2;

/// Reach of the selection box handles.
const BOX_HANDLE_TOL_MM: f64 = 5.0;
/// Edge midpoints win over corners by this much.
const EDGE_HANDLE_BONUS_MM: f64 = 1.0;
/// Rotate handles sit this far outside the selection box.
const ROTATE_HANDLE_OFFSET_MM: f64 = 10.0;
/// Step of the left rotate handle.
const ROTATE_STEP_DEGREES: f64 = 15.0;
/// Two-finger drags within this fraction of a quarter turn of an axis scale along it.
const AXIS_PINCH_SLACK: f64 = 0.3;

/// Rotate handle `index` (0 left, 1 right) of a selection box.
pub(super) fn rotate_handle_point(ctx: &CmdContext<'_>, selbox: Rect, index: usize) -> Point {
    let pnt = rect_handle(selbox, if index == 0 { 7 } else { 5 });
    ruler_point(pnt, selbox.center(), -ctx.mm(ROTATE_HANDLE_OFFSET_MM), 0.0)
}

fn snap_degrees(angle: f64, step: f64) -> f64 {
    ((angle.to_degrees() / step).round() * step).to_radians()
}

fn scale_about(sx: f64, sy: f64, center: Point) -> Affine {
    Affine::translate(center.to_vec2())
        * Affine::scale_non_uniform(sx, sy)
        * Affine::translate(-center.to_vec2())
}

/// Shift `shape` back inside `limits` when it fits there.
fn move_into_limits(shape: &mut Shape, limits: Option<Rect>) -> bool {
    let Some(limits) = limits else {
        return false;
    };
    let ext = shape.extent();
    let mut delta = Vec2::ZERO;
    if ext.width() <= limits.width() {
        if ext.x0 < limits.x0 {
            delta.x = limits.x0 - ext.x0;
        } else if ext.x1 > limits.x1 {
            delta.x = limits.x1 - ext.x1;
        }
    }
    if ext.height() <= limits.height() {
        if ext.y0 < limits.y0 {
            delta.y = limits.y0 - ext.y0;
        } else if ext.y1 > limits.y1 {
            delta.y = limits.y1 - ext.y1;
        }
    }
    if delta == Vec2::ZERO {
        return false;
    }
    shape.offset(delta, -1);
    true
}

impl CmdSelect {
    pub(super) fn drag_moved(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        self.rotate_angle = 0.0;
        let corner = self.drag_rect_corner(ctx);
        let mut point = ctx.motion.point_m;
        if self.insert_pt && point.distance(self.hit.nearpt) < ctx.mm(INSERT_CANCEL_MM) {
            point = self.hit.nearpt;
        }
        if !self.dragging {
            self.dragging = ctx.motion.point_m.distance(ctx.motion.start_pt_m) > ctx.mm(DRAG_START_MM);
            if !self.dragging {
                ctx.host.redraw();
                return true;
            }
        }

        let edit = self.is_edit_mode(ctx);
        let originals = self.originals(ctx);
        // Several shapes moved together are snapped twice: the first pass finds
        // the smallest snap offset, the second applies it to every shape.
        let passes = if self.clones.len() > 1 && corner.is_none() { 2 } else { 1 };
        let mut min_snap: Option<(Vec2, SnapResult)> = None;

        for pass in (1..=passes).rev() {
            for i in 0..self.clones.len() {
                let Some(base) = originals[i].as_ref() else {
                    continue;
                };
                if !can_transform(ctx, base) {
                    continue;
                }
                self.clones[i] = base.clone();
                if !edit {
                    self.clones[i].flags.fixed_length = true;
                    self.clones[i].flags.fixed_size = true;
                }
                if self.insert_pt && base.is_base_lines() {
                    self.clones[i].insert_point(self.hit.segment, self.hit.nearpt);
                }

                let mut segment = -1;
                if let Some(pivot) = self.rotate_handle.filter(|_| can_rotate(ctx, base)) {
                    let center = base.handle_point(pivot);
                    if center != self.pt_start && self.handle != Some(pivot) {
                        self.rotate_clone(ctx, i, center, point);
                    }
                } else if let Some(h) = self
                    .handle
                    .filter(|&h| edit && !base.flags.fixed_size && !base.is_handle_fixed(h))
                {
                    self.clones[i].set_handle_point(h, point);
                    let snapped = self.snap_point(ctx, &self.clones[i]);
                    self.clones[i].set_handle_point(h, snapped);
                } else if let Some(mat) = corner.filter(|_| !base.flags.fixed_size) {
                    self.clones[i].transform(mat);
                } else {
                    segment = if !edit && base.kind() == ShapeKind::Group {
                        -1
                    } else {
                        self.hit.segment
                    };
                    self.clones[i].offset(point - self.pt_start, segment);
                    if pass > 1 || self.clones.len() == 1 {
                        let snap_vec = self.snap_point(ctx, &self.clones[i]) - point;
                        self.clones[i].offset(snap_vec, segment);
                        let len = snap_vec.hypot();
                        let better = min_snap.as_ref().is_none_or(|(v, _)| v.hypot() > len);
                        if pass > 1 && len > 0.0 && better {
                            min_snap = Some((snap_vec, *ctx.snap.result()));
                        }
                    } else if let Some((v, _)) = &min_snap {
                        self.clones[i].offset(*v, segment);
                    }
                }

                move_into_limits(&mut self.clones[i], ctx.view.world_limits);
                if !edit {
                    self.clones[i].flags.fixed_length = base.flags.fixed_length;
                    self.clones[i].flags.fixed_size = base.flags.fixed_size;
                }
                if pass == 1 {
                    ctx.host.shape_moved(self.clones[i].id(), segment);
                }
            }
        }
        if let Some((_, result)) = min_snap {
            ctx.snap.restore(result);
        }

        if self.clones.is_empty() && self.box_sel {
            self.select_in_box(ctx);
        }
        ctx.host.redraw();
        true
    }

    /// Transform for a drag that started on a selection box handle.
    fn drag_rect_corner(&mut self, ctx: &CmdContext<'_>) -> Option<Affine> {
        self.box_handle = None;
        self.pt_snap = ctx.motion.point_m;
        if self.sel_ids.is_empty()
            || self.box_sel
            || self.is_edit_mode(ctx)
            || self.clones.first().is_some_and(|s| s.flags.fixed_size)
        {
            return None;
        }
        let selbox = self.bounding_box(ctx);
        if selbox.is_zero_area() {
            return None;
        }
        let first = super::find_shape(ctx, self.sel_ids[0])?;
        let start = ctx.motion.start_pt_m;
        let mut min_dist = ctx.mm(BOX_HANDLE_TOL_MM);

        if can_transform(ctx, &first) {
            for i in (0..8).rev() {
                let bonus = if i < 4 { 0.0 } else { ctx.mm(EDGE_HANDLE_BONUS_MM) };
                let d = start.distance(rect_handle(selbox, i)) - bonus;
                if d < min_dist {
                    min_dist = d;
                    self.box_handle = Some(i);
                }
            }
        }
        if can_rotate(ctx, &first) {
            for i in (0..2).rev() {
                let d = start.distance(rotate_handle_point(ctx, selbox, i));
                if d < min_dist {
                    min_dist = d;
                    self.box_handle = Some(8 + i);
                }
            }
        }

        let handle = self.box_handle?;
        let point = ctx.motion.point_m;
        if handle < 8 {
            let newbox = move_rect_handle(selbox, handle, point);
            if newbox.width().abs() < f64::EPSILON || newbox.height().abs() < f64::EPSILON {
                return None;
            }
            return scale_between(selbox, newbox);
        }

        let pnt = rotate_handle_point(ctx, selbox, handle - 8);
        let center = selbox.center();
        let mut angle = angle_between(pnt - center, point - center);
        if handle == 8 {
            angle = snap_degrees(angle, ROTATE_STEP_DEGREES);
        }
        self.rotate_angle = angle;
        self.pt_snap = center + Vec2::from_angle((pnt - center).atan2() + angle) * point.distance(center);
        Some(Affine::rotate_about(angle, center))
    }

    /// Rotate clone `index` about `center` so the drag anchor follows `point`.
    fn rotate_clone(&mut self, ctx: &mut CmdContext<'_>, index: usize, center: Point, point: Point) {
        let mut angle = angle_between(self.pt_start - center, point - center);
        if ctx.snap.snapped_type() == SnapType::None {
            angle = snap_degrees(angle, 1.0);
        }
        self.clones[index].transform(Affine::rotate_about(angle, center));
        self.snap_point(ctx, &self.clones[index]);
        if let Some((from, to, _)) = ctx.snap.get_snapped_point() {
            let fix = angle_between(from - center, to - center);
            self.clones[index].transform(Affine::rotate_about(fix, center));
            angle += fix;
        }
        self.rotate_angle = angle;
    }

    /// Select what the drag box catches, the shape nearest its center first.
    fn select_in_box(&mut self, ctx: &CmdContext<'_>) {
        let rect = Rect::from_points(ctx.motion.start_pt_m, ctx.motion.point_m);
        let center = rect.center();
        let ids = match ctx.doc.read() {
            Ok(doc) => {
                let mut ids = doc.shapes_in_rect(rect, ctx.config.select_box_intersect);
                let dist = |id: &ShapeId| doc.find_shape(*id).map_or(f64::INFINITY, |s| s.hit_test(center).dist);
                let nearest = ids
                    .iter()
                    .enumerate()
                    .min_by(|(_, a), (_, b)| dist(a).total_cmp(&dist(b)))
                    .map(|(i, _)| i);
                if let Some(pos) = nearest {
                    let id = ids.remove(pos);
                    ids.insert(0, id);
                }
                ids
            }
            Err(err) => {
                log::debug!("Box selection skipped: {}", err);
                return;
            }
        };
        self.id = ids.first().copied().unwrap_or(NO_SHAPE);
        self.hit = HitResult::default();
        self.sel_ids = ids;
    }

    /// Two-finger move, zoom and rotate of the selection.
    pub(super) fn pinch(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        let motion = ctx.motion;
        match motion.gesture_state {
            GestureState::Possible => !self.sel_ids.is_empty() && motion.distance_m() > 0.0,
            GestureState::Began => {
                self.drop_stale_ids(ctx);
                if self.sel_ids.is_empty() {
                    return false;
                }
                self.clone_shapes(ctx);
                ctx.host.redraw();
                self.clones.len() == self.sel_ids.len() && motion.start_distance_m() > 0.0
            }
            GestureState::Moved => {
                let dist0 = motion.start_distance_m();
                if dist0 < f64::EPSILON {
                    return false;
                }
                let originals = self.originals(ctx);
                let a0 = (motion.start_pt2_m - motion.start_pt_m).atan2();
                for i in 0..self.clones.len() {
                    let Some(base) = originals[i].as_ref() else {
                        continue;
                    };
                    if !can_transform(ctx, base) {
                        continue;
                    }
                    let mut mat = Affine::translate(motion.point_m - motion.start_pt_m);
                    let resizable = (self.edit_mode || base.kind() == ShapeKind::Image)
                        && !base.flags.fixed_length
                        && !base.flags.fixed_size;
                    if resizable {
                        let quarter = a0.abs() / FRAC_PI_2;
                        if !can_rotate(ctx, base) && (quarter - quarter.round()).abs() < AXIS_PINCH_SLACK {
                            let d0 = motion.start_pt2_m - motion.start_pt_m;
                            let d1 = motion.point2_m - motion.point_m;
                            let vertical = (quarter.round() as i64) % 2 == 1;
                            let ratio = |from: f64, to: f64| {
                                if from.abs() < f64::EPSILON || to.abs() < f64::EPSILON {
                                    1.0
                                } else {
                                    (to / from).abs()
                                }
                            };
                            let sx = if vertical { 1.0 } else { ratio(d0.x, d1.x) };
                            let sy = if vertical { ratio(d0.y, d1.y) } else { 1.0 };
                            // One-axis stretch about the starting center, without the pan.
                            mat = scale_about(sx, sy, motion.start_center_m());
                        } else {
                            let s = motion.distance_m() / dist0;
                            mat = scale_about(s, s, motion.point_m) * mat;
                        }
                    }
                    if can_rotate(ctx, base) {
                        let angle = (motion.point2_m - motion.point_m).atan2() - a0;
                        mat = Affine::rotate_about(snap_degrees(angle, 1.0), motion.point_m) * mat;
                    }
                    self.clones[i] = base.clone();
                    self.clones[i].transform(mat);
                    if self.clones.len() == 1 {
                        let snap_vec = self.snap_point(ctx, &self.clones[i]) - motion.point_m;
                        self.clones[i].offset(snap_vec, -1);
                    }
                    ctx.host.shape_moved(self.clones[i].id(), -1);
                }
                ctx.host.redraw();
                true
            }
            GestureState::Ended | GestureState::Cancel => {
                self.apply_clone_shapes(ctx, motion.gesture_state == GestureState::Ended, false);
                if !motion.switch_gesture {
                    self.long_press(ctx);
                }
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::Fixture;
    use crate::motion::GestureType;

    fn pinch_at(fx: &mut Fixture, cmd: &mut CmdSelect, state: GestureState, p1: Point, p2: Point) -> bool {
        let m = &mut fx.motion;
        if state == GestureState::Began {
            m.start_pt_m = p1;
            m.start_pt2_m = p2;
        }
        m.point_m = p1;
        m.point2_m = p2;
        m.gesture_type = GestureType::TwoFinger;
        m.gesture_state = state;
        cmd.two_fingers_move(&mut fx.ctx())
    }

    #[test]
    fn test_snap_degrees() {
        let a = snap_degrees(22.0_f64.to_radians(), 15.0);
        assert!((a - 15.0_f64.to_radians()).abs() < 1e-12);
        let b = snap_degrees(0.4_f64.to_radians(), 1.0);
        assert!(b.abs() < 1e-12);
    }

    #[test]
    fn test_move_into_limits() {
        let mut rect = Shape::rect(Rect::new(-20.0, 10.0, 30.0, 40.0));
        assert!(move_into_limits(&mut rect, Some(Rect::new(0.0, 0.0, 100.0, 100.0))));
        let ext = rect.extent();
        assert!((ext.x0 - 0.0).abs() < 1e-9);
        assert!((ext.x1 - 50.0).abs() < 1e-9);
        assert!(!move_into_limits(&mut rect, None));
    }

    #[test]
    fn test_world_limits_hold_dragged_shape() {
        let mut fx = Fixture::new();
        fx.view.world_limits = Some(Rect::new(0.0, 0.0, 300.0, 300.0));
        let id = fx.add(Shape::line(Point::new(100.0, 100.0), Point::new(200.0, 100.0)));
        let mut cmd = CmdSelect::new();
        fx.drag(&mut cmd, (130.0, 100.0), (330.0, 100.0));
        let ext = fx.shape(id).unwrap().extent();
        assert!((ext.x1 - 300.0).abs() < 1e-9);
        assert!((ext.x0 - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_box_handle_resizes_selection() {
        let mut fx = Fixture::new();
        let id = fx.add(Shape::rect(Rect::new(100.0, 100.0, 200.0, 200.0)));
        let mut cmd = CmdSelect::new();
        cmd.initialize(&mut fx.ctx(), None, &[id]);
        // The box is inflated by one pixel, so its bottom-right corner is at (201, 201).
        fx.drag(&mut cmd, (201.0, 201.0), (301.0, 301.0));
        // Box (99, 99)-(201, 201) grows to (99, 99)-(301, 301) with the rect inside it.
        let scale = 202.0 / 102.0;
        let ext = fx.shape(id).unwrap().extent();
        assert!((ext.x0 - (99.0 + scale)).abs() < 1e-9);
        assert!((ext.x1 - (99.0 + 101.0 * scale)).abs() < 1e-9);
        assert!((ext.y1 - (99.0 + 101.0 * scale)).abs() < 1e-9);
    }

    #[test]
    fn test_pinch_translates_selection() {
        let mut fx = Fixture::new();
        let id = fx.add(Shape::rect(Rect::new(100.0, 100.0, 200.0, 160.0)));
        let mut cmd = CmdSelect::new();
        cmd.initialize(&mut fx.ctx(), None, &[id]);

        let (p1, p2) = (Point::new(100.0, 300.0), Point::new(200.0, 300.0));
        assert!(pinch_at(&mut fx, &mut cmd, GestureState::Possible, p1, p2));
        assert!(pinch_at(&mut fx, &mut cmd, GestureState::Began, p1, p2));
        let (q1, q2) = (Point::new(110.0, 320.0), Point::new(210.0, 320.0));
        assert!(pinch_at(&mut fx, &mut cmd, GestureState::Moved, q1, q2));
        assert!(cmd.has_dynamic_shapes());
        assert!(pinch_at(&mut fx, &mut cmd, GestureState::Ended, q1, q2));

        let ext = fx.shape(id).unwrap().extent();
        assert!((ext.x0 - 110.0).abs() < 1e-9);
        assert!((ext.y0 - 120.0).abs() < 1e-9);
        assert!((ext.width() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_axis_pinch_stretches_about_start_center() {
        let mut fx = Fixture::new();
        fx.host.can_rotate = false;
        let id = fx.add(Shape::image(Rect::new(100.0, 100.0, 200.0, 160.0), "photo.png"));
        let mut cmd = CmdSelect::new();
        cmd.initialize(&mut fx.ctx(), None, &[id]);

        let (p1, p2) = (Point::new(100.0, 300.0), Point::new(200.0, 300.0));
        assert!(pinch_at(&mut fx, &mut cmd, GestureState::Began, p1, p2));
        let (q1, q2) = (Point::new(90.0, 320.0), Point::new(240.0, 320.0));
        assert!(pinch_at(&mut fx, &mut cmd, GestureState::Moved, q1, q2));
        assert!(pinch_at(&mut fx, &mut cmd, GestureState::Ended, q1, q2));

        // Fingers spread from 100 to 150 apart around x = 150; the drift of the pair is ignored.
        let ext = fx.shape(id).unwrap().extent();
        assert!((ext.x0 - 75.0).abs() < 1e-9);
        assert!((ext.x1 - 225.0).abs() < 1e-9);
        assert!((ext.y0 - 100.0).abs() < 1e-9);
        assert!((ext.y1 - 160.0).abs() < 1e-9);
    }

    #[test]
    fn test_pinch_cancel_restores() {
        let mut fx = Fixture::new();
        let id = fx.add(Shape::rect(Rect::new(100.0, 100.0, 200.0, 160.0)));
        let mut cmd = CmdSelect::new();
        cmd.initialize(&mut fx.ctx(), None, &[id]);
        let (p1, p2) = (Point::new(100.0, 300.0), Point::new(200.0, 300.0));
        pinch_at(&mut fx, &mut cmd, GestureState::Began, p1, p2);
        pinch_at(&mut fx, &mut cmd, GestureState::Moved, Point::new(150.0, 350.0), Point::new(250.0, 350.0));
        pinch_at(&mut fx, &mut cmd, GestureState::Cancel, p1, p2);
        assert_eq!(fx.shape(id).unwrap().extent(), Rect::new(100.0, 100.0, 200.0, 160.0));
        assert!(!cmd.has_dynamic_shapes());
    }
}
