//! Selection command: pick, move, resize, rotate and vertex-edit shapes.
//!
//! Gestures never touch the document directly. A drag works on clones of the
//! selected shapes and the clones are written back, or added as new shapes
//! for a press-drag copy, when the gesture ends.

mod drag;
mod ops;

pub use ops::SelectionKind;

use crate::actions::{self, SelectState};
use crate::command::{CmdContext, Command};
use crate::host::{GraphicsSink, GuideStyle, TouchEndedInfo};
use crate::lock::LockIntent;
use crate::shapes::geom::{is_empty_extent, rect_handle};
use crate::shapes::{HitResult, NO_SHAPE, SerializableColor, Shape, ShapeId, ShapeKind};
use crate::snap::SnapRequest;
use crate::storage::{CmdParams, ParamStorage};
use kurbo::{Point, Rect};
use peniko::Color;

/// Reach of a shape handle under the pointer.
const HANDLE_TOL_MM: f64 = 10.0;
/// Reach used to anchor a drag on a handle of the first selected shape.
const START_HANDLE_TOL_MM: f64 = 5.0;
/// A press this close to the outline starts the drag from the outline point.
const NEAR_POINT_MM: f64 = 3.0;
/// Movement needed before a press turns into a drag.
const DRAG_START_MM: f64 = 2.0;
/// Movement needed before a press-drag copies instead of moving.
const CLONE_DRAG_MM: f64 = 5.0;
/// Releasing an inserted vertex this close to where it was created drops it.
const INSERT_CANCEL_MM: f64 = 5.0;
/// Handles closer than this to the pointer suppress vertex insertion.
const INSERT_MIN_MM: f64 = 8.0;
/// Shapes smaller than this in both directions hide their handles on tap.
const SMALL_SHAPE_MM: f64 = 5.0;
/// Clones whose extent shrinks below this are not written back.
const EMPTY_EXTENT_TOL: f64 = 1e-4;

const HIGHLIGHT_COLOR: SerializableColor = SerializableColor {
    r: 0,
    g: 120,
    b: 215,
    a: 255,
};
const BOX_COLOR: Color = Color::from_rgba8(0, 120, 215, 160);
const HANDLE_COLOR: Color = Color::from_rgba8(0, 120, 215, 255);
const PIVOT_COLOR: Color = Color::from_rgba8(215, 60, 0, 255);

/// The select command.
#[derive(Debug, Clone)]
pub struct CmdSelect {
    sel_ids: Vec<ShapeId>,
    /// Working copies during a drag; each keeps the id of its original.
    clones: Vec<Shape>,
    /// Primary shape of the selection.
    id: ShapeId,
    hit: HitResult,
    /// Where the dragged box handle currently is.
    pt_snap: Point,
    /// Anchor of the current drag.
    pt_start: Point,
    handle: Option<usize>,
    /// Handle used as the pivot when rotating.
    rotate_handle: Option<usize>,
    rotate_angle: f64,
    /// Box handle being dragged: 0..8 resize, 8 and 9 rotate.
    box_handle: Option<usize>,
    edit_mode: bool,
    insert_pt: bool,
    show_sel: bool,
    box_sel: bool,
    dragging: bool,
    can_rotate_handle: bool,
}

impl Default for CmdSelect {
    fn default() -> Self {
        Self::new()
    }
}

fn find_shape(ctx: &CmdContext<'_>, id: ShapeId) -> Option<Shape> {
    match ctx.doc.read() {
        Ok(doc) => doc.find_shape(id).cloned(),
        Err(err) => {
            log::debug!("Shape {} not read: {}", id, err);
            None
        }
    }
}

fn can_transform(ctx: &CmdContext<'_>, shape: &Shape) -> bool {
    !shape.flags.locked && ctx.host.shape_can_transform(shape)
}

fn can_rotate(ctx: &CmdContext<'_>, shape: &Shape) -> bool {
    !shape.flags.rotate_disabled && !shape.flags.locked && ctx.host.shape_can_rotate(shape)
}

fn handle_code(handle: Option<usize>) -> i32 {
    handle.map_or(-1, |h| h as i32)
}

impl CmdSelect {
    pub fn new() -> Self {
        Self {
            sel_ids: Vec::new(),
            clones: Vec::new(),
            id: NO_SHAPE,
            hit: HitResult::default(),
            pt_snap: Point::ZERO,
            pt_start: Point::ZERO,
            handle: None,
            rotate_handle: None,
            rotate_angle: 0.0,
            box_handle: None,
            edit_mode: false,
            insert_pt: false,
            show_sel: true,
            box_sel: false,
            dragging: false,
            can_rotate_handle: true,
        }
    }

    /// Selected ids in selection order.
    pub fn selected(&self) -> &[ShapeId] {
        &self.sel_ids
    }

    pub fn primary(&self) -> ShapeId {
        self.id
    }

    pub fn selected_handle(&self) -> Option<usize> {
        self.handle
    }

    /// Angle of the rotation in progress, in radians.
    pub fn rotate_angle(&self) -> f64 {
        self.rotate_angle
    }

    /// Whether a drag is holding uncommitted clones.
    pub fn has_dynamic_shapes(&self) -> bool {
        !self.clones.is_empty()
    }

    fn selected_shape(&self, ctx: &CmdContext<'_>) -> Option<Shape> {
        let id = if self.sel_ids.contains(&self.id) {
            self.id
        } else {
            *self.sel_ids.first()?
        };
        find_shape(ctx, id)
    }

    /// Selected shapes as currently stored in the document.
    pub fn selection_shapes(&self, ctx: &CmdContext<'_>) -> Vec<Shape> {
        match ctx.doc.read() {
            Ok(doc) => self
                .sel_ids
                .iter()
                .filter_map(|id| doc.find_shape(*id).cloned())
                .collect(),
            Err(err) => {
                log::debug!("Selection not read: {}", err);
                Vec::new()
            }
        }
    }

    /// Document versions of the clones, in clone order.
    fn originals(&self, ctx: &CmdContext<'_>) -> Vec<Option<Shape>> {
        match ctx.doc.read() {
            Ok(doc) => self
                .clones
                .iter()
                .map(|c| doc.find_shape(c.id()).cloned())
                .collect(),
            Err(err) => {
                log::debug!("Originals not read: {}", err);
                vec![None; self.clones.len()]
            }
        }
    }

    fn selection_changed(&self, ctx: &CmdContext<'_>) {
        log::debug!("Selection is now {:?}", self.sel_ids);
        ctx.host.selection_changed();
    }

    /// Forget ids whose shapes left the document behind our back.
    fn drop_stale_ids(&mut self, ctx: &CmdContext<'_>) -> bool {
        let before = self.sel_ids.len();
        {
            let Ok(doc) = ctx.doc.read() else {
                return false;
            };
            self.sel_ids.retain(|id| doc.contains(*id));
            self.clones.retain(|c| doc.contains(c.id()));
        }
        let dropped = before - self.sel_ids.len();
        if dropped == 0 {
            return false;
        }
        log::warn!("Dropped {} stale shape ids from the selection", dropped);
        if !self.sel_ids.contains(&self.id) {
            self.id = self.sel_ids.first().copied().unwrap_or(NO_SHAPE);
            self.handle = None;
            self.rotate_handle = None;
        }
        self.selection_changed(ctx);
        true
    }

    /// Whether the press at the gesture start lands on `shape`; records the hit.
    fn can_select(&mut self, ctx: &CmdContext<'_>, shape: Option<&Shape>) -> bool {
        let Some(shape) = shape else {
            return false;
        };
        let pt = ctx.motion.start_pt_m;
        let tol = ctx.mm(ctx.config.hit_test_tol_mm);
        self.hit = shape.hit_test(pt);
        if (self.hit.inside && shape.style.has_fill()) || self.hit.dist <= tol {
            return true;
        }
        self.is_edit_mode(ctx)
            && (0..shape.handle_count()).any(|i| shape.handle_point(i).distance(pt) <= tol)
    }

    /// Nearest movable handle within `tol_mm`, and whether the press should insert a vertex.
    fn probe_handles(
        &self,
        ctx: &CmdContext<'_>,
        shape: &Shape,
        point: Point,
        tol_mm: f64,
    ) -> (Option<usize>, bool) {
        if shape.flags.fixed_size {
            return (None, false);
        }
        let mut min_dist = ctx.mm(tol_mm);
        let mut found = None;
        for i in 0..shape.handle_count() {
            let d = point.distance(shape.handle_point(i));
            if d < min_dist && !shape.is_handle_fixed(i) {
                min_dist = d;
                found = Some(i);
            }
        }
        let insert = ctx.motion.dragging()
            && shape.is_base_lines()
            && self.hit.nearpt.distance(point) < min_dist / 3.0
            && min_dist > ctx.mm(INSERT_MIN_MM);
        (found, insert)
    }

    fn hit_test_handles(
        &mut self,
        ctx: &CmdContext<'_>,
        shape: &Shape,
        point: Point,
        tol_mm: f64,
    ) -> Option<usize> {
        let (found, insert) = self.probe_handles(ctx, shape, point, tol_mm);
        if insert {
            self.insert_pt = true;
        }
        found
    }

    fn clone_shapes(&mut self, ctx: &CmdContext<'_>) {
        self.clones = self.selection_shapes(ctx);
    }

    /// Snap the pointer while dragging `shape`, anchoring on the hot handle when it is under the pointer.
    fn snap_point(&self, ctx: &mut CmdContext<'_>, shape: &Shape) -> Point {
        let ignore: Vec<ShapeId> = self.clones.iter().map(Shape::id).collect();
        let mut org = ctx.motion.point_m;
        if let Some(h) = self.handle.filter(|&h| h < shape.handle_count()) {
            let pnt = shape.handle_point(h);
            if pnt.distance(org) < ctx.mm(DRAG_START_MM) {
                org = pnt;
            }
        }
        let req = SnapRequest {
            point: org,
            shape: Some(shape),
            hot_handle: handle_code(self.handle),
            ignore_handle: handle_code(self.rotate_handle),
            ignore_ids: &ignore,
        };
        ctx.snap_request(&req)
    }

    /// Write the clones back (or add them as copies) and drop them.
    ///
    /// Returns whether anything changed or any clone was pending.
    fn apply_clone_shapes(&mut self, ctx: &mut CmdContext<'_>, apply: bool, add_new: bool) -> bool {
        let originals = self.originals(ctx);
        let clones = std::mem::take(&mut self.clones);
        let cloned = !clones.is_empty();
        let apply = apply
            && clones
                .iter()
                .zip(&originals)
                .any(|(c, o)| o.as_ref().is_some_and(|o| o != c));

        let mut changed = false;
        if apply {
            changed = if add_new {
                self.add_clones(ctx, clones)
            } else {
                Self::update_from_clones(ctx, clones, &originals)
            };
        }
        if changed {
            ctx.host.regen_all(true);
            if add_new {
                self.selection_changed(ctx);
            }
        } else {
            ctx.host.redraw();
        }
        changed || cloned
    }

    fn add_clones(&mut self, ctx: &mut CmdContext<'_>, clones: Vec<Shape>) -> bool {
        let mut added = Vec::with_capacity(clones.len());
        for clone in clones {
            if !ctx.host.shape_will_add(&clone) {
                continue;
            }
            let id = match ctx.doc.write(LockIntent::Add) {
                Ok(mut doc) => doc.add_shape(clone),
                Err(err) => {
                    log::debug!("Copy not added: {}", err);
                    break;
                }
            };
            ctx.host.shape_added(id);
            added.push(id);
        }
        if added.is_empty() {
            return false;
        }
        log::info!("Copied {} shapes", added.len());
        self.id = added.last().copied().unwrap_or(NO_SHAPE);
        self.sel_ids = added;
        self.hit.segment = -1;
        self.handle = None;
        self.rotate_handle = None;
        true
    }

    fn update_from_clones(ctx: &CmdContext<'_>, clones: Vec<Shape>, originals: &[Option<Shape>]) -> bool {
        let mut restored = Vec::new();
        let mut updated = 0;
        {
            let mut doc = match ctx.doc.write(LockIntent::Edit) {
                Ok(doc) => doc,
                Err(err) => {
                    log::debug!("Moved shapes not saved: {}", err);
                    return false;
                }
            };
            for (clone, original) in clones.into_iter().zip(originals) {
                let Some(original) = original else {
                    continue;
                };
                if *original == clone {
                    continue;
                }
                let id = clone.id();
                let usable = clone.point_count() < 2 || !is_empty_extent(clone.extent(), EMPTY_EXTENT_TOL);
                if usable && doc.update_shape(id, clone) {
                    updated += 1;
                } else {
                    restored.push(id);
                }
            }
            if updated == 0 {
                doc.discard();
            }
        }
        for id in restored {
            ctx.host.shape_moved(id, -1);
        }
        log::debug!("Updated {} shapes", updated);
        updated > 0
    }

    fn show_actions(&self, ctx: &CmdContext<'_>, shape: Option<&Shape>) -> bool {
        actions::show_in_select(ctx, self.select_state(ctx), shape, self.bounding_box(ctx))
    }

    fn is_clone_drag(&self, ctx: &CmdContext<'_>) -> bool {
        let motion = ctx.motion;
        !self.is_edit_mode(ctx)
            && self.box_handle.is_none()
            && motion.press_drag
            && motion.point_m.distance(motion.start_pt_m) > ctx.mm(CLONE_DRAG_MM)
    }

    fn draw_handles(&self, ctx: &CmdContext<'_>, shape: &Shape, edit: bool, sink: &mut dyn GraphicsSink) {
        let mm = ctx.mm(1.0);
        let style = GuideStyle::solid(HANDLE_COLOR, mm * 0.2);
        for i in 0..shape.handle_count() {
            let pnt = shape.handle_point(i);
            if Some(i) == self.rotate_handle {
                sink.draw_circle(pnt, mm * 1.5, &GuideStyle::solid(PIVOT_COLOR, mm * 0.3));
            } else if Some(i) == self.handle {
                sink.draw_circle(pnt, mm * 1.5, &style);
            } else if edit && !shape.is_handle_fixed(i) {
                sink.draw_circle(pnt, mm, &style);
            }
        }
        if self.insert_pt {
            sink.draw_circle(self.hit.nearpt, mm * 1.5, &GuideStyle::dashed(HANDLE_COLOR, mm * 0.2));
        }
    }
}

impl Command for CmdSelect {
    fn name(&self) -> &str {
        "select"
    }

    /// Parameters: `id`, 1-based `handleIndex` and `rotateHandle`, `editMode`.
    fn initialize(&mut self, ctx: &mut CmdContext<'_>, params: Option<&CmdParams>, selected: &[ShapeId]) -> bool {
        self.clones.clear();
        self.hit = HitResult::default();
        self.box_sel = false;
        self.box_handle = None;
        self.insert_pt = false;
        self.show_sel = true;
        self.dragging = false;
        self.rotate_angle = 0.0;
        self.can_rotate_handle = true;

        let id = params.map_or(NO_SHAPE, |p| p.read_u32("id", NO_SHAPE));
        let handle_index = params.map_or(0, |p| p.read_u32("handleIndex", 0));
        let rotate_handle = params.map_or(0, |p| p.read_u32("rotateHandle", 0));
        let edit = params.is_some_and(|p| p.read_bool("editMode", false));

        self.sel_ids.clear();
        if id != NO_SHAPE {
            self.sel_ids.push(id);
        } else {
            for &id in selected {
                if !self.sel_ids.contains(&id) {
                    self.sel_ids.push(id);
                }
            }
        }
        self.id = self.sel_ids.first().copied().unwrap_or(NO_SHAPE);
        self.handle = (handle_index > 0).then(|| handle_index as usize - 1);
        self.rotate_handle = (rotate_handle > 0).then(|| rotate_handle as usize - 1);
        self.edit_mode = (edit || self.handle.is_some()) && self.rotate_handle.is_none();
        self.drop_stale_ids(ctx);

        if !self.sel_ids.is_empty() {
            self.selection_changed(ctx);
            ctx.host.redraw();
            if handle_index == 0 {
                self.long_press(ctx);
            }
        }
        true
    }

    fn cancel(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        let a = self.back_step(ctx);
        let b = self.back_step(ctx);
        let c = self.back_step(ctx);
        a || b || c
    }

    fn back_step(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        self.box_sel = false;
        self.box_handle = None;
        if !self.clones.is_empty() {
            self.clones.clear();
            self.insert_pt = false;
            ctx.host.redraw();
            return true;
        }
        if !self.sel_ids.is_empty() {
            self.sel_ids.clear();
            self.id = NO_SHAPE;
            self.hit.segment = -1;
            self.handle = None;
            self.rotate_handle = None;
            ctx.host.redraw();
            self.selection_changed(ctx);
            return true;
        }
        false
    }

    fn draw(&self, ctx: &CmdContext<'_>, sink: &mut dyn GraphicsSink) -> bool {
        let mm = ctx.mm(1.0);
        let edit = self.is_edit_mode(ctx);
        let selection = if self.clones.is_empty() {
            self.selection_shapes(ctx)
        } else {
            self.clones.clone()
        };

        if !self.clones.is_empty() {
            for shape in &self.clones {
                sink.draw_shape(shape);
            }
        } else if self.show_sel {
            for shape in &selection {
                let mut highlight = shape.clone();
                highlight.style.stroke_color = HIGHLIGHT_COLOR;
                sink.draw_shape(&highlight);
            }
        }

        if self.box_sel {
            let rect = Rect::from_points(ctx.motion.start_pt_m, ctx.motion.point_m);
            let style = if ctx.config.select_box_intersect {
                GuideStyle::dashed(BOX_COLOR, mm * 0.2)
            } else {
                GuideStyle::solid(BOX_COLOR, mm * 0.2)
            };
            sink.draw_rect(rect, &style);
        } else if self.show_sel && !selection.is_empty() && (selection.len() > 1 || !edit) {
            let selbox = self.bounding_box(ctx);
            sink.draw_rect(selbox, &GuideStyle::dashed(BOX_COLOR, mm * 0.2));
            let handle_style = GuideStyle::solid(HANDLE_COLOR, mm * 0.2);
            match self.box_handle {
                None if self.clones.is_empty() => {
                    if can_transform(ctx, &selection[0]) {
                        for i in 0..8 {
                            sink.draw_circle(rect_handle(selbox, i), mm, &handle_style);
                        }
                    }
                    if can_rotate(ctx, &selection[0]) {
                        for i in 0..2 {
                            sink.draw_circle(drag::rotate_handle_point(ctx, selbox, i), mm * 1.2, &handle_style);
                        }
                    }
                }
                Some(h) if h >= 8 => sink.draw_line(selbox.center(), self.pt_snap, &handle_style),
                Some(_) => sink.draw_circle(self.pt_snap, mm * 1.5, &handle_style),
                None => {}
            }
        }

        if selection.len() == 1 && self.show_sel && (edit || self.handle.is_some() || self.rotate_handle.is_some()) {
            self.draw_handles(ctx, &selection[0], edit, sink);
        }
        ctx.snap.draw_snap(sink);
        true
    }

    fn gather_shapes(&self, out: &mut Vec<Shape>) -> bool {
        out.extend(self.clones.iter().cloned());
        !self.clones.is_empty()
    }

    fn click(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        self.drop_stale_ids(ctx);
        self.box_handle = None;
        self.rotate_handle = None;
        if ctx.motion.press_drag {
            return false;
        }
        self.show_sel = true;
        self.apply_clone_shapes(ctx, false, false);
        self.insert_pt = false;

        let point = ctx.motion.point_m;
        let mut shape = self.selected_shape(ctx);
        let select_again = self.sel_ids.len() == 1 && self.can_select(ctx, shape.as_ref());

        if select_again {
            self.handle = None;
            if let Some(s) = &shape {
                if self.is_edit_mode(ctx) || (can_rotate(ctx, s) && s.kind() != ShapeKind::Splines) {
                    self.handle = self.hit_test_handles(ctx, s, point, HANDLE_TOL_MM);
                }
            }
        } else {
            let hit = ctx.hit_test(point, ctx.config.hit_test_tol_mm);
            let hit_shape = hit.and_then(|(id, _)| find_shape(ctx, id));
            let changed = match &hit_shape {
                Some(s) => self.sel_ids.len() != 1 || s.id() != self.id,
                None => !self.sel_ids.is_empty(),
            };
            self.hit = hit.map(|(_, res)| res).unwrap_or_default();
            self.sel_ids = hit_shape.iter().map(Shape::id).collect();
            self.id = hit_shape.as_ref().map_or(NO_SHAPE, Shape::id);
            self.handle = None;
            if changed {
                self.selection_changed(ctx);
            } else if let Some(s) = hit_shape.as_ref().filter(|s| s.kind() != ShapeKind::Splines) {
                let ext = s.extent();
                let small = ext.width() < ctx.mm(SMALL_SHAPE_MM) && ext.height() < ctx.mm(SMALL_SHAPE_MM);
                if self.is_edit_mode(ctx) || !small {
                    self.handle = self.hit_test_handles(ctx, s, point, HANDLE_TOL_MM);
                }
            }
            shape = hit_shape;
        }

        let pivot_allowed = shape
            .as_ref()
            .is_some_and(|s| can_rotate(ctx, s) && s.kind() != ShapeKind::Splines);
        if self.can_rotate_handle && !self.is_edit_mode(ctx) && pivot_allowed {
            self.rotate_handle = self.handle;
        }
        ctx.host.redraw();

        if self.is_edit_mode(ctx) || self.handle.is_none() {
            self.show_actions(ctx, shape.as_ref());
            return true;
        }
        self.id != NO_SHAPE
    }

    fn double_click(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        self.drop_stale_ids(ctx);
        let shape = self.selected_shape(ctx);
        if self.show_actions(ctx, shape.as_ref()) {
            return shape.is_some();
        }
        let edit = self.is_edit_mode(ctx);
        self.set_edit_mode(ctx, !edit)
    }

    fn long_press(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        self.drop_stale_ids(ctx);
        let mut shown = false;
        if self.sel_ids.is_empty() {
            shown = self.click(ctx);
        }
        let shape = self.selected_shape(ctx);
        if let (Some(s), Some(_)) = (&shape, self.handle) {
            let point = ctx.motion.point_m;
            self.handle = self.hit_test_handles(ctx, s, point, HANDLE_TOL_MM);
            ctx.host.redraw();
        }
        self.show_actions(ctx, shape.as_ref()) || shown
    }

    fn touch_began(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        self.drop_stale_ids(ctx);
        let start = ctx.motion.start_pt_m;
        if !ctx.motion.switch_gesture {
            let old = self.selected_shape(ctx);
            if let Some((new_id, res)) = ctx.hit_test(start, ctx.config.hit_test_tol_mm) {
                if new_id != self.id && !self.can_select(ctx, old.as_ref()) {
                    self.hit = res;
                    self.id = new_id;
                    self.sel_ids = vec![new_id];
                    self.handle = None;
                    self.rotate_handle = None;
                    self.selection_changed(ctx);
                }
            }
        }

        self.clone_shapes(ctx);
        self.show_sel = true;
        self.dragging = false;
        self.insert_pt = false;

        let edit = self.is_edit_mode(ctx);
        let single = (self.clones.len() == 1).then(|| self.clones[0].clone());
        if let Some(shape) = &single {
            self.can_select(ctx, Some(shape));
        }
        self.handle = match &single {
            Some(shape) if self.handle.is_some() || edit => {
                self.hit_test_handles(ctx, shape, start, HANDLE_TOL_MM)
            }
            _ => None,
        };
        if self.insert_pt {
            let (segment, nearpt) = (self.hit.segment, self.hit.nearpt);
            let inserted = match self.clones.first_mut() {
                Some(first) if first.is_base_lines() => first.insert_point(segment, nearpt).then(|| first.clone()),
                _ => None,
            };
            match inserted {
                Some(shape) => self.handle = self.hit_test_handles(ctx, &shape, nearpt, HANDLE_TOL_MM),
                None => self.insert_pt = false,
            }
        }

        if self.clones.is_empty() {
            self.box_sel = true;
        }
        self.box_handle = None;
        let anchor = self.clones.first().and_then(|s| {
            self.probe_handles(ctx, s, start, START_HANDLE_TOL_MM)
                .0
                .map(|i| s.handle_point(i))
        });
        self.pt_start = anchor.unwrap_or(if start.distance(self.hit.nearpt) < ctx.mm(NEAR_POINT_MM) {
            self.hit.nearpt
        } else {
            start
        });
        self.pt_snap = start;
        ctx.host.redraw();
        true
    }

    fn touch_moved(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        self.drag_moved(ctx)
    }

    fn touch_ended(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        let point = ctx.motion.point_m;
        if self.insert_pt && self.clones.len() == 1 && point.distance(self.hit.nearpt) < ctx.mm(INSERT_CANCEL_MM) {
            self.clones.clear();
        }
        let snapped = ctx.snap.get_snapped_handle();
        let clone_drag = self.is_clone_drag(ctx);
        self.apply_clone_shapes(ctx, true, clone_drag);
        ctx.snap.clear_snap();

        self.insert_pt = false;
        self.dragging = false;
        self.hit.nearpt = point;
        self.box_handle = None;
        self.rotate_angle = 0.0;

        if self.is_edit_mode(ctx) && self.handle.is_some() {
            if let Some(shape) = self.selected_shape(ctx) {
                self.handle = self.hit_test_handles(ctx, &shape, point, HANDLE_TOL_MM);
            }
            ctx.host.redraw();
        }
        if self.box_sel {
            self.box_sel = false;
            if !self.sel_ids.is_empty() {
                self.selection_changed(ctx);
            }
        }
        if !self.sel_ids.is_empty() {
            let (snapped_shape, snapped_handle, dragged_handle) = snapped.unwrap_or((NO_SHAPE, -1, -1));
            ctx.host.on_select_touch_ended(&TouchEndedInfo {
                shape: self.id,
                handle: dragged_handle,
                snapped_shape,
                snapped_handle,
                ids: self.sel_ids.clone(),
            });
        }
        if !ctx.motion.switch_gesture {
            self.long_press(ctx);
        }
        true
    }

    fn two_fingers_move(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        self.pinch(ctx)
    }

    fn selected_ids(&self) -> Vec<ShapeId> {
        self.sel_ids.clone()
    }

    fn as_select(&self) -> Option<&CmdSelect> {
        Some(self)
    }

    fn as_select_mut(&mut self) -> Option<&mut CmdSelect> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::Fixture;
    use crate::lock::LockIntent;

    fn select(fx: &mut Fixture, cmd: &mut CmdSelect, ids: &[ShapeId]) {
        assert!(cmd.initialize(&mut fx.ctx(), None, ids));
    }

    fn assert_point(actual: Point, x: f64, y: f64) {
        assert!(
            (actual.x - x).abs() < 1e-9 && (actual.y - y).abs() < 1e-9,
            "expected ({x}, {y}), got {actual:?}"
        );
    }

    #[test]
    fn test_tap_selects_and_clears() {
        let mut fx = Fixture::new();
        let id = fx.add(Shape::line(Point::new(100.0, 100.0), Point::new(200.0, 100.0)));
        let mut cmd = CmdSelect::new();
        assert!(fx.tap(&mut cmd, 130.0, 102.0));
        assert_eq!(cmd.selected(), &[id]);
        assert_eq!(fx.host.count("selection"), 1);

        fx.tap(&mut cmd, 500.0, 500.0);
        assert!(cmd.selected().is_empty());
        assert_eq!(fx.host.count("selection"), 2);
    }

    #[test]
    fn test_cancel_twice_matches_cancel_once() {
        let mut fx = Fixture::new();
        let id = fx.add(Shape::rect(Rect::new(10.0, 10.0, 50.0, 50.0)));
        let mut cmd = CmdSelect::new();
        select(&mut fx, &mut cmd, &[id]);
        assert!(cmd.cancel(&mut fx.ctx()));
        assert!(cmd.selected().is_empty());
        assert!(!cmd.cancel(&mut fx.ctx()));
        assert!(cmd.selected().is_empty());
    }

    #[test]
    fn test_initialize_dedups_carried_selection() {
        let mut fx = Fixture::new();
        let a = fx.add(Shape::rect(Rect::new(10.0, 10.0, 50.0, 50.0)));
        let b = fx.add(Shape::dot(Point::new(80.0, 80.0)));
        let mut cmd = CmdSelect::new();
        select(&mut fx, &mut cmd, &[a, b, a, 99]);
        assert_eq!(cmd.selected(), &[a, b]);
        assert_eq!(cmd.primary(), a);
        assert_eq!(fx.host.last_menu().map(|m| m.0), Some(SelectState::Multi));
    }

    #[test]
    fn test_drag_moves_selected_line() {
        let mut fx = Fixture::new();
        let id = fx.add(Shape::line(Point::new(100.0, 100.0), Point::new(200.0, 100.0)));
        let mut cmd = CmdSelect::new();
        select(&mut fx, &mut cmd, &[id]);

        fx.began(&mut cmd, 130.0, 100.0);
        fx.moved(&mut cmd, 160.0, 140.0);
        assert!(cmd.has_dynamic_shapes());
        assert_point(fx.shape(id).unwrap().point(0), 100.0, 100.0);
        fx.ended(&mut cmd, 160.0, 140.0);

        let line = fx.shape(id).unwrap();
        assert_point(line.point(0), 130.0, 140.0);
        assert_point(line.point(1), 230.0, 140.0);
        assert!(!cmd.has_dynamic_shapes());
        assert!(fx.host.count(&format!("moved {id}")) > 0);
        let info = fx.host.touch_ended.borrow().last().cloned().unwrap();
        assert_eq!(info.shape, id);
        assert_eq!(info.snapped_shape, NO_SHAPE);
        assert_eq!(info.ids, vec![id]);
    }

    #[test]
    fn test_drag_on_unselected_shape_selects_and_moves_it() {
        let mut fx = Fixture::new();
        let id = fx.add(Shape::line(Point::new(100.0, 100.0), Point::new(200.0, 100.0)));
        let mut cmd = CmdSelect::new();
        fx.drag(&mut cmd, (130.0, 100.0), (130.0, 150.0));
        assert_eq!(cmd.selected(), &[id]);
        assert_point(fx.shape(id).unwrap().point(0), 100.0, 150.0);
    }

    #[test]
    fn test_press_drag_copies() {
        let mut fx = Fixture::new();
        let id = fx.add(Shape::line(Point::new(100.0, 100.0), Point::new(200.0, 100.0)));
        let mut cmd = CmdSelect::new();
        select(&mut fx, &mut cmd, &[id]);
        fx.began(&mut cmd, 130.0, 100.0);
        fx.motion.press_drag = true;
        fx.moved(&mut cmd, 130.0, 160.0);
        fx.ended(&mut cmd, 130.0, 160.0);

        let shapes = fx.shapes();
        assert_eq!(shapes.len(), 2);
        assert_point(shapes[0].point(0), 100.0, 100.0);
        assert_point(shapes[1].point(0), 100.0, 160.0);
        assert_eq!(cmd.selected(), &[shapes[1].id()]);
    }

    #[test]
    fn test_multi_drag_shares_one_snap_offset() {
        let mut fx = Fixture::new();
        fx.snap.set_enabled(true);
        let a = fx.add(Shape::line(Point::new(10.0, 30.0), Point::new(30.0, 50.0)));
        let b = fx.add(Shape::line(Point::new(10.0, 90.0), Point::new(25.0, 90.0)));
        let target = fx.add(Shape::line(Point::new(200.0, 200.0), Point::new(260.0, 230.0)));
        let mut cmd = CmdSelect::new();
        select(&mut fx, &mut cmd, &[a, b]);

        fx.drag(&mut cmd, (20.0, 40.0), (191.0, 189.0));

        let la = fx.shape(a).unwrap();
        let lb = fx.shape(b).unwrap();
        assert_point(la.point(0), 180.0, 180.0);
        assert_point(la.point(1), 200.0, 200.0);
        assert_point(lb.point(0), 180.0, 240.0);
        assert_point(lb.point(1), 195.0, 240.0);

        let info = fx.host.touch_ended.borrow().last().cloned().unwrap();
        assert_eq!(info.snapped_shape, target);
        assert_eq!(info.snapped_handle, 0);
        assert_eq!(info.handle, 1);
    }

    #[test]
    fn test_box_select_intersect_and_contains() {
        let mut fx = Fixture::new();
        let rect = fx.add(Shape::rect(Rect::new(50.0, 50.0, 80.0, 80.0)));
        let line = fx.add(Shape::line(Point::new(70.0, 70.0), Point::new(150.0, 150.0)));
        let mut cmd = CmdSelect::new();
        fx.drag(&mut cmd, (35.0, 35.0), (105.0, 105.0));
        assert_eq!(cmd.selected(), &[line, rect]);
        assert_eq!(cmd.primary(), line);

        assert!(cmd.cancel(&mut fx.ctx()));
        fx.config.select_box_intersect = false;
        fx.drag(&mut cmd, (35.0, 35.0), (105.0, 105.0));
        assert_eq!(cmd.selected(), &[rect]);
    }

    #[test]
    fn test_rotate_box_handle_turns_selection() {
        let mut fx = Fixture::new();
        let id = fx.add(Shape::rect(Rect::new(100.0, 120.0, 200.0, 180.0)));
        let mut cmd = CmdSelect::new();
        select(&mut fx, &mut cmd, &[id]);
        // Left rotate handle sits 10mm outside the box edge.
        fx.began(&mut cmd, 89.0, 150.0);
        fx.moved(&mut cmd, 150.0, 89.0);
        assert!((cmd.rotate_angle() - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
        fx.ended(&mut cmd, 150.0, 89.0);

        let ext = fx.shape(id).unwrap().extent();
        assert!((ext.x0 - 120.0).abs() < 1e-6);
        assert!((ext.x1 - 180.0).abs() < 1e-6);
        assert!((ext.y0 - 100.0).abs() < 1e-6);
        assert!((ext.y1 - 200.0).abs() < 1e-6);
    }

    #[test]
    fn test_edit_mode_drags_vertex() {
        let mut fx = Fixture::new();
        let id = fx.add(Shape::lines(
            vec![Point::new(100.0, 100.0), Point::new(200.0, 100.0), Point::new(200.0, 200.0)],
            false,
        ));
        let mut cmd = CmdSelect::new();
        let params = CmdParams::from_json(&format!(r#"{{"id": {id}, "editMode": true}}"#)).unwrap();
        assert!(cmd.initialize(&mut fx.ctx(), Some(&params), &[]));
        assert!(cmd.is_edit_mode(&fx.ctx()));

        fx.drag(&mut cmd, (200.0, 100.0), (250.0, 120.0));
        let shape = fx.shape(id).unwrap();
        assert_eq!(
            shape.points(),
            vec![Point::new(100.0, 100.0), Point::new(250.0, 120.0), Point::new(200.0, 200.0)]
        );
        assert_eq!(cmd.selected_handle(), Some(1));
        assert_eq!(fx.host.last_menu().map(|m| m.0), Some(SelectState::Vertex));
    }

    #[test]
    fn test_edit_mode_drag_on_edge_inserts_vertex() {
        let mut fx = Fixture::new();
        let id = fx.add(Shape::lines(
            vec![Point::new(100.0, 100.0), Point::new(200.0, 100.0), Point::new(200.0, 200.0)],
            false,
        ));
        let mut cmd = CmdSelect::new();
        let params = CmdParams::from_json(&format!(r#"{{"id": {id}, "editMode": true}}"#)).unwrap();
        cmd.initialize(&mut fx.ctx(), Some(&params), &[]);

        fx.drag(&mut cmd, (150.0, 100.0), (150.0, 60.0));
        let shape = fx.shape(id).unwrap();
        assert_eq!(shape.point_count(), 4);
        assert_point(shape.point(1), 150.0, 60.0);
    }

    #[test]
    fn test_stale_ids_are_dropped() {
        let mut fx = Fixture::new();
        let a = fx.add(Shape::rect(Rect::new(10.0, 10.0, 50.0, 50.0)));
        let mut cmd = CmdSelect::new();
        select(&mut fx, &mut cmd, &[a]);
        let before = fx.host.count("selection");
        fx.doc.write(LockIntent::Remove).unwrap().remove_shape(a);

        cmd.long_press(&mut fx.ctx());
        assert!(cmd.selected().is_empty());
        assert_eq!(cmd.primary(), NO_SHAPE);
        assert!(fx.host.count("selection") > before);
    }
}
