//! Operations on the current selection, mostly reached through context actions.

use super::{CmdSelect, HANDLE_TOL_MM, can_transform, find_shape};
use crate::actions::SelectState;
use crate::command::{CmdContext, Command};
use crate::lock::LockIntent;
use crate::shapes::geom::is_empty_extent;
use crate::shapes::{NO_SHAPE, Shape, ShapeId, ShapeKind};
use crate::storage::{CmdParams, ParamStorage};
use kurbo::{Affine, Rect, Vec2};

/// Minimum size of the selection box, in display pixels.
const MIN_BOX_PX: f64 = 8.0;
/// Offset of a copy made from the context menu.
const CLONE_OFFSET_MM: f64 = 10.0;
/// A vertex is only inserted this far from the start of its edge.
const MIN_INSERT_GAP_MM: f64 = 1.0;

/// Kind of the selected shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionKind {
    /// Every selected shape is of this kind.
    Uniform(ShapeKind),
    Mixed,
}

/// Edit shapes in place under one write lock; returns the ids `edit` changed.
fn edit_shapes(
    ctx: &CmdContext<'_>,
    ids: &[ShapeId],
    mut edit: impl FnMut(&mut Shape) -> bool,
) -> Vec<ShapeId> {
    let mut doc = match ctx.doc.write(LockIntent::Edit) {
        Ok(doc) => doc,
        Err(err) => {
            log::debug!("Selection not edited: {}", err);
            return Vec::new();
        }
    };
    let changed: Vec<ShapeId> = ids
        .iter()
        .copied()
        .filter(|&id| doc.find_shape_mut(id).is_some_and(&mut edit))
        .collect();
    if changed.is_empty() {
        doc.discard();
    }
    changed
}

impl CmdSelect {
    /// Edit mode needs exactly one unlocked shape.
    pub fn is_edit_mode(&self, ctx: &CmdContext<'_>) -> bool {
        self.edit_mode
            && self.sel_ids.len() == 1
            && find_shape(ctx, self.sel_ids[0]).is_some_and(|s| !s.flags.locked)
    }

    pub fn set_edit_mode(&mut self, ctx: &mut CmdContext<'_>, edit: bool) -> bool {
        self.edit_mode = edit;
        self.handle = None;
        self.rotate_handle = None;
        self.insert_pt = false;
        ctx.host.redraw();
        self.long_press(ctx);
        true
    }

    pub fn select_state(&self, ctx: &CmdContext<'_>) -> SelectState {
        if self.is_edit_mode(ctx) {
            let on_vertex = self.handle.is_some()
                && self.selected_shape(ctx).is_some_and(|s| s.is_base_lines());
            return if on_vertex {
                SelectState::Vertex
            } else {
                SelectState::Vertexes
            };
        }
        match self.sel_ids.len() {
            0 => SelectState::None,
            1 => SelectState::One,
            _ => SelectState::Multi,
        }
    }

    pub fn select_kind(&self, ctx: &CmdContext<'_>) -> Option<SelectionKind> {
        let shapes = self.selection_shapes(ctx);
        let first = shapes.first()?.kind();
        Some(if shapes.iter().all(|s| s.kind() == first) {
            SelectionKind::Uniform(first)
        } else {
            SelectionKind::Mixed
        })
    }

    /// Exactly one shape is selected and it is of `kind`.
    pub fn is_selected_by_type(&self, ctx: &CmdContext<'_>, kind: ShapeKind) -> bool {
        self.sel_ids.len() == 1 && self.select_kind(ctx) == Some(SelectionKind::Uniform(kind))
    }

    /// Union of the selected extents, empty when nothing is selected.
    pub fn selection_extent(&self, ctx: &CmdContext<'_>) -> Rect {
        self.selection_shapes(ctx)
            .iter()
            .map(Shape::extent)
            .reduce(|a, b| a.union(b))
            .unwrap_or(Rect::ZERO)
    }

    /// Selection box as drawn: never thinner than a few pixels and kept inside the view.
    pub fn bounding_box(&self, ctx: &CmdContext<'_>) -> Rect {
        let mut selbox = self.selection_extent(ctx);
        if self.sel_ids.is_empty() {
            return selbox;
        }
        let min = ctx.motion.display_to_model_len(MIN_BOX_PX);
        if selbox.width() < min {
            selbox = selbox.inflate(min / 2.0, 0.0);
        }
        if selbox.height() < min {
            selbox = selbox.inflate(0.0, min / 2.0);
        }
        selbox = selbox.inflate(min / 8.0, min / 8.0);

        let margin = ctx.mm(1.0);
        let view = ctx.view.model_view_rect().inflate(-margin, -margin);
        selbox = selbox.intersect(view);
        let inner_margin = ctx.mm(12.0);
        let inner = selbox.intersect(view.inflate(-inner_margin, -inner_margin));
        if is_empty_extent(inner, ctx.mm(5.0)) { selbox } else { inner }
    }

    pub fn select_all(&mut self, ctx: &mut CmdContext<'_>) -> usize {
        let had_selection = !self.sel_ids.is_empty();
        self.apply_clone_shapes(ctx, false, false);
        self.sel_ids = match ctx.doc.read() {
            Ok(doc) => doc
                .shapes_ordered()
                .filter(|s| !s.flags.hidden)
                .map(Shape::id)
                .collect(),
            Err(err) => {
                log::debug!("Select all skipped: {}", err);
                return 0;
            }
        };
        self.id = self.sel_ids.first().copied().unwrap_or(NO_SHAPE);
        self.handle = None;
        self.rotate_handle = None;
        self.edit_mode = false;
        ctx.host.redraw();
        if had_selection || !self.sel_ids.is_empty() {
            self.selection_changed(ctx);
        }
        self.long_press(ctx);
        self.sel_ids.len()
    }

    /// Clear the selection; returns whether anything was selected.
    pub fn reset_selection(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        self.apply_clone_shapes(ctx, false, false);
        if self.sel_ids.is_empty() {
            return false;
        }
        self.sel_ids.clear();
        self.id = NO_SHAPE;
        self.handle = None;
        self.rotate_handle = None;
        self.edit_mode = false;
        ctx.host.redraw();
        self.selection_changed(ctx);
        true
    }

    /// Add a shape to the selection; returns whether it is selected afterwards.
    pub fn add_selection(&mut self, ctx: &mut CmdContext<'_>, id: ShapeId) -> bool {
        if find_shape(ctx, id).is_none() {
            return false;
        }
        if !self.sel_ids.contains(&id) {
            self.sel_ids.push(id);
            self.id = id;
            self.handle = None;
            self.rotate_handle = None;
            ctx.host.redraw();
            self.selection_changed(ctx);
        }
        true
    }

    /// Delete the unlocked selected shapes; returns how many went.
    pub fn delete_selection(&mut self, ctx: &mut CmdContext<'_>) -> usize {
        let Some(first) = self.selected_shape(ctx) else {
            return 0;
        };
        if !ctx.host.shape_will_delete(&first) {
            return 0;
        }
        self.apply_clone_shapes(ctx, false, false);
        let ids: Vec<ShapeId> = self
            .selection_shapes(ctx)
            .iter()
            .filter(|s| !s.flags.locked)
            .map(Shape::id)
            .collect();
        if ids.is_empty() {
            return 0;
        }
        let count = ctx.delete_shapes(&ids);
        self.sel_ids.clear();
        self.id = NO_SHAPE;
        self.handle = None;
        self.rotate_handle = None;
        self.edit_mode = false;
        self.selection_changed(ctx);
        if count > 0 {
            log::info!("Deleted {} shapes", count);
        }
        count
    }

    pub fn group_selection(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        if self.sel_ids.len() < 2 {
            return false;
        }
        self.apply_clone_shapes(ctx, false, false);
        let group = match ctx.doc.write(LockIntent::Add) {
            Ok(mut doc) => doc.group_shapes(&self.sel_ids),
            Err(err) => {
                log::debug!("Group skipped: {}", err);
                None
            }
        };
        let Some(group) = group else {
            return false;
        };
        log::info!("Grouped {} shapes into {}", self.sel_ids.len(), group);
        self.sel_ids = vec![group];
        self.id = group;
        self.handle = None;
        self.rotate_handle = None;
        ctx.host.shape_added(group);
        ctx.host.regen_all(true);
        self.selection_changed(ctx);
        self.long_press(ctx);
        true
    }

    pub fn ungroup_selection(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        self.apply_clone_shapes(ctx, false, false);
        let groups: Vec<ShapeId> = self
            .selection_shapes(ctx)
            .iter()
            .filter(|s| {
                s.kind() == ShapeKind::Group
                    && ctx.host.shape_can_ungroup(s)
                    && ctx.host.shape_will_delete(s)
            })
            .map(Shape::id)
            .collect();
        if groups.is_empty() {
            return false;
        }
        let count = match ctx.doc.write(LockIntent::Add) {
            Ok(mut doc) => groups
                .iter()
                .filter(|&&id| doc.ungroup_shape(id).is_some())
                .count(),
            Err(err) => {
                log::debug!("Ungroup skipped: {}", err);
                0
            }
        };
        if count == 0 {
            return false;
        }
        for &id in &groups {
            ctx.host.shape_deleted(id);
        }
        self.sel_ids.clear();
        self.id = NO_SHAPE;
        self.handle = None;
        self.rotate_handle = None;
        ctx.host.regen_all(true);
        self.selection_changed(ctx);
        self.long_press(ctx);
        true
    }

    /// Copy the selection a little down and to the right, selecting the copies.
    pub fn clone_selection(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        self.apply_clone_shapes(ctx, false, false);
        self.clone_shapes(ctx);
        if self.clones.is_empty() {
            return false;
        }
        let offset = Vec2::new(ctx.mm(CLONE_OFFSET_MM), ctx.mm(CLONE_OFFSET_MM));
        for clone in &mut self.clones {
            clone.offset(offset, -1);
        }
        let done = self.apply_clone_shapes(ctx, true, true);
        if done {
            self.long_press(ctx);
        }
        done
    }

    /// Remove the active vertex of the edited shape.
    pub fn delete_vertex(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        let Some(handle) = self.handle else {
            return false;
        };
        if !self.is_edit_mode(ctx) {
            return false;
        }
        let removed = !edit_shapes(ctx, &[self.id], |s| s.is_base_lines() && s.remove_point(handle)).is_empty();
        if removed {
            let nearpt = self.hit.nearpt;
            self.handle = match self.selected_shape(ctx) {
                Some(shape) => self.hit_test_handles(ctx, &shape, nearpt, HANDLE_TOL_MM),
                None => None,
            };
            ctx.host.regen_all(true);
        }
        self.insert_pt = false;
        self.long_press(ctx);
        removed
    }

    /// Insert a vertex at the last hit point of the edited shape.
    pub fn insert_vertex(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        if !self.is_edit_mode(ctx) {
            return false;
        }
        let (segment, nearpt) = (self.hit.segment, self.hit.nearpt);
        let Some(shape) = self.selected_shape(ctx) else {
            return false;
        };
        if segment < 0
            || !shape.is_base_lines()
            || nearpt.distance(shape.point(segment as usize)) <= ctx.mm(MIN_INSERT_GAP_MM)
        {
            return false;
        }
        let inserted = !edit_shapes(ctx, &[self.id], |s| s.insert_point(segment, nearpt)).is_empty();
        if inserted {
            self.handle = Some(segment as usize + 1);
            ctx.host.regen_all(true);
        }
        self.insert_pt = false;
        self.long_press(ctx);
        inserted
    }

    /// Toggle whether the edited polyline is closed.
    pub fn switch_closed(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        let Some(id) = self.sel_ids.first().copied() else {
            return false;
        };
        let switched = !edit_shapes(ctx, &[id], |s| {
            let closed = s.is_closed();
            s.is_base_lines() && s.set_closed(!closed)
        })
        .is_empty();
        if switched {
            ctx.host.regen_all(true);
            self.long_press(ctx);
        }
        switched
    }

    pub fn is_fixed_length(&self, ctx: &CmdContext<'_>) -> bool {
        self.selected_shape(ctx).is_some_and(|s| s.flags.fixed_length)
    }

    pub fn set_fixed_length(&mut self, ctx: &mut CmdContext<'_>, fixed: bool) -> usize {
        let ids = self.sel_ids.clone();
        let count = edit_shapes(ctx, &ids, |s| {
            let change = s.flags.fixed_length != fixed;
            s.flags.fixed_length = fixed;
            change
        })
        .len();
        if count > 0 {
            ctx.host.redraw();
            self.long_press(ctx);
        }
        count
    }

    pub fn is_locked(&self, ctx: &CmdContext<'_>) -> bool {
        self.selected_shape(ctx).is_some_and(|s| s.flags.locked)
    }

    /// Lock or unlock the selection; unlocking asks the host first.
    pub fn set_locked(&mut self, ctx: &mut CmdContext<'_>, locked: bool) -> usize {
        let ids = self.sel_ids.clone();
        let host = ctx.host;
        let count = edit_shapes(ctx, &ids, |s| {
            if s.flags.locked == locked || (!locked && !host.shape_can_unlock(s)) {
                return false;
            }
            s.flags.locked = locked;
            true
        })
        .len();
        if count > 0 {
            self.handle = None;
            self.rotate_handle = None;
            ctx.host.redraw();
            self.long_press(ctx);
        }
        count
    }

    /// Mirror the selection left to right about the center of its visible part.
    pub fn overturn_polygon(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        let visible = self.selection_extent(ctx).intersect(ctx.view.model_view_rect());
        if visible.is_zero_area() {
            return false;
        }
        let c = visible.center().to_vec2();
        let mirror = Affine::translate(c) * Affine::FLIP_X * Affine::translate(-c);
        self.apply_transform(ctx, mirror) > 0
    }

    /// Apply `affine` to every transformable selected shape.
    pub fn apply_transform(&mut self, ctx: &mut CmdContext<'_>, affine: Affine) -> usize {
        self.apply_clone_shapes(ctx, false, false);
        let ids = self.sel_ids.clone();
        let count = edit_shapes(ctx, &ids, |s| {
            if !can_transform(ctx, s) {
                return false;
            }
            s.transform(affine);
            true
        })
        .len();
        if count > 0 {
            ctx.host.regen_all(true);
            self.long_press(ctx);
        }
        count
    }

    /// Scale (`sx`, `sy`), rotate (`angle` degrees) about the selection center, then move (`dx`, `dy`).
    pub fn apply_transform_params(&mut self, ctx: &mut CmdContext<'_>, params: &CmdParams) -> usize {
        let center = self.selection_extent(ctx).center().to_vec2();
        let about = |m: Affine| Affine::translate(center) * m * Affine::translate(-center);
        let mut xf = Affine::IDENTITY;
        let sx = params.read_f64("sx", 0.0);
        if sx != 0.0 {
            let sy = params.read_f64("sy", sx);
            xf = about(Affine::scale_non_uniform(sx, sy)) * xf;
        }
        let angle = params.read_f64("angle", 0.0);
        if angle != 0.0 {
            xf = about(Affine::rotate(angle.to_radians())) * xf;
        }
        let delta = Vec2::new(params.read_f64("dx", 0.0), params.read_f64("dy", 0.0));
        xf = Affine::translate(delta) * xf;
        self.apply_transform(ctx, xf)
    }

    /// Finish a drag driven from outside the gesture flow.
    pub fn dynamic_change_ended(&mut self, ctx: &mut CmdContext<'_>, apply: bool) -> bool {
        self.apply_clone_shapes(ctx, apply, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::Fixture;
    use kurbo::Point;

    fn setup(shapes: Vec<Shape>) -> (Fixture, CmdSelect, Vec<ShapeId>) {
        let mut fx = Fixture::new();
        let ids: Vec<ShapeId> = shapes.into_iter().map(|s| fx.add(s)).collect();
        let mut cmd = CmdSelect::new();
        cmd.initialize(&mut fx.ctx(), None, &ids);
        (fx, cmd, ids)
    }

    #[test]
    fn test_add_selection_keeps_ids_unique() {
        let (mut fx, mut cmd, ids) = setup(vec![
            Shape::rect(Rect::new(10.0, 10.0, 50.0, 50.0)),
            Shape::dot(Point::new(80.0, 80.0)),
        ]);
        assert!(cmd.reset_selection(&mut fx.ctx()));
        assert!(cmd.add_selection(&mut fx.ctx(), ids[1]));
        assert!(cmd.add_selection(&mut fx.ctx(), ids[1]));
        assert!(!cmd.add_selection(&mut fx.ctx(), 99));
        assert_eq!(cmd.selected(), &[ids[1]]);
    }

    #[test]
    fn test_select_all_and_kind() {
        let (mut fx, mut cmd, _) = setup(vec![
            Shape::rect(Rect::new(10.0, 10.0, 50.0, 50.0)),
            Shape::rect(Rect::new(60.0, 60.0, 90.0, 90.0)),
        ]);
        assert!(cmd.reset_selection(&mut fx.ctx()));
        assert_eq!(cmd.select_all(&mut fx.ctx()), 2);
        assert_eq!(cmd.select_kind(&fx.ctx()), Some(SelectionKind::Uniform(ShapeKind::Rect)));
        assert!(!cmd.is_selected_by_type(&fx.ctx(), ShapeKind::Rect));
        fx.add(Shape::dot(Point::new(5.0, 5.0)));
        cmd.select_all(&mut fx.ctx());
        assert_eq!(cmd.select_kind(&fx.ctx()), Some(SelectionKind::Mixed));
        assert_eq!(cmd.select_state(&fx.ctx()), SelectState::Multi);
    }

    #[test]
    fn test_delete_skips_locked() {
        let mut locked = Shape::rect(Rect::new(60.0, 60.0, 90.0, 90.0));
        locked.flags.locked = true;
        let (mut fx, mut cmd, ids) = setup(vec![Shape::rect(Rect::new(10.0, 10.0, 50.0, 50.0)), locked]);
        assert_eq!(cmd.delete_selection(&mut fx.ctx()), 1);
        let left: Vec<ShapeId> = fx.shapes().iter().map(Shape::id).collect();
        assert_eq!(left, vec![ids[1]]);
        assert!(cmd.selected().is_empty());
        assert_eq!(fx.host.count("deleted"), 1);
    }

    #[test]
    fn test_group_then_ungroup() {
        let (mut fx, mut cmd, _) = setup(vec![
            Shape::rect(Rect::new(10.0, 10.0, 50.0, 50.0)),
            Shape::line(Point::new(60.0, 60.0), Point::new(90.0, 60.0)),
        ]);
        assert!(cmd.group_selection(&mut fx.ctx()));
        let shapes = fx.shapes();
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].kind(), ShapeKind::Group);
        assert_eq!(cmd.selected(), &[shapes[0].id()]);
        assert!(fx.host.last_menu().is_some_and(|(_, a)| a.contains(&crate::actions::Action::Ungroup)));

        assert!(cmd.ungroup_selection(&mut fx.ctx()));
        assert_eq!(fx.shapes().len(), 2);
        assert!(cmd.selected().is_empty());
    }

    #[test]
    fn test_group_needs_two_shapes() {
        let (mut fx, mut cmd, _) = setup(vec![Shape::rect(Rect::new(10.0, 10.0, 50.0, 50.0))]);
        assert!(!cmd.group_selection(&mut fx.ctx()));
        assert!(!cmd.ungroup_selection(&mut fx.ctx()));
    }

    #[test]
    fn test_clone_selection_offsets_copy() {
        let (mut fx, mut cmd, ids) = setup(vec![Shape::rect(Rect::new(10.0, 10.0, 50.0, 50.0))]);
        assert!(cmd.clone_selection(&mut fx.ctx()));
        let shapes = fx.shapes();
        assert_eq!(shapes.len(), 2);
        assert_eq!(shapes[1].extent(), Rect::new(20.0, 20.0, 60.0, 60.0));
        assert_ne!(cmd.selected(), &[ids[0]]);
        assert_eq!(cmd.selected(), &[shapes[1].id()]);
    }

    #[test]
    fn test_unlock_needs_host_consent() {
        let (mut fx, mut cmd, ids) = setup(vec![Shape::rect(Rect::new(10.0, 10.0, 50.0, 50.0))]);
        assert_eq!(cmd.set_locked(&mut fx.ctx(), true), 1);
        assert!(cmd.is_locked(&fx.ctx()));
        fx.host.can_unlock = false;
        assert_eq!(cmd.set_locked(&mut fx.ctx(), false), 0);
        fx.host.can_unlock = true;
        assert_eq!(cmd.set_locked(&mut fx.ctx(), false), 1);
        assert!(!fx.shape(ids[0]).unwrap().flags.locked);
    }

    #[test]
    fn test_fixed_length_toggle() {
        let (mut fx, mut cmd, _) = setup(vec![Shape::line(Point::new(10.0, 10.0), Point::new(50.0, 10.0))]);
        assert!(!cmd.is_fixed_length(&fx.ctx()));
        assert_eq!(cmd.set_fixed_length(&mut fx.ctx(), true), 1);
        assert!(cmd.is_fixed_length(&fx.ctx()));
        assert_eq!(cmd.set_fixed_length(&mut fx.ctx(), true), 0);
    }

    #[test]
    fn test_edit_mode_requires_unlocked_single_shape() {
        let (mut fx, mut cmd, _) = setup(vec![Shape::lines(
            vec![Point::new(10.0, 10.0), Point::new(50.0, 10.0), Point::new(50.0, 50.0)],
            false,
        )]);
        assert!(cmd.set_edit_mode(&mut fx.ctx(), true));
        assert!(cmd.is_edit_mode(&fx.ctx()));
        assert_eq!(cmd.select_state(&fx.ctx()), SelectState::Vertexes);
        cmd.set_locked(&mut fx.ctx(), true);
        assert!(!cmd.is_edit_mode(&fx.ctx()));
    }

    #[test]
    fn test_switch_closed() {
        let (mut fx, mut cmd, ids) = setup(vec![Shape::lines(
            vec![Point::new(10.0, 10.0), Point::new(50.0, 10.0), Point::new(50.0, 50.0)],
            false,
        )]);
        assert!(cmd.switch_closed(&mut fx.ctx()));
        assert!(fx.shape(ids[0]).unwrap().is_closed());
        assert!(cmd.switch_closed(&mut fx.ctx()));
        assert!(!fx.shape(ids[0]).unwrap().is_closed());
    }

    #[test]
    fn test_overturn_mirrors_horizontally() {
        let (mut fx, mut cmd, ids) = setup(vec![Shape::line(Point::new(100.0, 100.0), Point::new(200.0, 150.0))]);
        assert!(cmd.overturn_polygon(&mut fx.ctx()));
        let line = fx.shape(ids[0]).unwrap();
        assert!((line.point(0).x - 200.0).abs() < 1e-9);
        assert!((line.point(0).y - 100.0).abs() < 1e-9);
        assert!((line.point(1).x - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_transform_params() {
        let (mut fx, mut cmd, ids) = setup(vec![Shape::rect(Rect::new(100.0, 100.0, 200.0, 160.0))]);
        let params = CmdParams::from_json(r#"{"sx": 2.0, "dx": 5.0}"#).unwrap();
        assert_eq!(cmd.apply_transform_params(&mut fx.ctx(), &params), 1);
        let ext = fx.shape(ids[0]).unwrap().extent();
        assert!((ext.x0 - 55.0).abs() < 1e-9);
        assert!((ext.x1 - 255.0).abs() < 1e-9);
        assert!((ext.y0 - 70.0).abs() < 1e-9);
        assert!((ext.y1 - 190.0).abs() < 1e-9);
    }

    #[test]
    fn test_locked_shapes_ignore_transforms() {
        let mut locked = Shape::rect(Rect::new(100.0, 100.0, 200.0, 160.0));
        locked.flags.locked = true;
        let (mut fx, mut cmd, _) = setup(vec![locked]);
        assert_eq!(cmd.apply_transform(&mut fx.ctx(), Affine::translate((5.0, 0.0))), 0);
        assert!(!cmd.overturn_polygon(&mut fx.ctx()));
    }

    #[test]
    fn test_bounding_box_has_minimum_size() {
        let (mut fx, cmd, _) = setup(vec![Shape::line(Point::new(100.0, 100.0), Point::new(200.0, 100.0))]);
        let selbox = cmd.bounding_box(&fx.ctx());
        assert_eq!(selbox, Rect::new(99.0, 95.0, 201.0, 105.0));
    }

    #[test]
    fn test_vertex_insert_and_delete() {
        let (mut fx, mut cmd, ids) = setup(vec![Shape::lines(
            vec![Point::new(100.0, 100.0), Point::new(200.0, 100.0), Point::new(200.0, 200.0)],
            false,
        )]);
        cmd.set_edit_mode(&mut fx.ctx(), true);
        fx.tap(&mut cmd, 150.0, 102.0);
        assert!(cmd.insert_vertex(&mut fx.ctx()));
        assert_eq!(fx.shape(ids[0]).unwrap().point_count(), 4);
        assert_eq!(cmd.selected_handle(), Some(1));
        assert!(cmd.delete_vertex(&mut fx.ctx()));
        assert_eq!(fx.shape(ids[0]).unwrap().point_count(), 3);
    }
}
