//! Command interface and the context handed to every gesture callback.
//!
//! A command is a named state machine driven by gestures. Gesture methods
//! return whether they handled the gesture; the defaults do nothing, so
//! concrete commands implement only what they react to.

use crate::config::EngineConfig;
use crate::document::ShapeDocument;
use crate::host::{GraphicsSink, ViewHost};
use crate::lock::{LockIntent, ShapeLock};
use crate::motion::Motion;
use crate::select::CmdSelect;
use crate::shapes::{HitResult, Shape, ShapeId};
use crate::snap::{SnapEngine, SnapRequest, SnapScope};
use crate::storage::CmdParams;
use crate::transform::ViewTransform;
use kurbo::Point;

/// Follow-up work a command asks the manager to do once the callback returns.
#[derive(Debug, Clone, PartialEq)]
pub enum CmdRequest {
    /// Switch to the named command.
    SetCommand(String),
    /// Replace the select command's selection.
    Select(Vec<ShapeId>),
}

/// Everything a command may touch while handling one callback.
pub struct CmdContext<'a> {
    pub doc: &'a ShapeLock<ShapeDocument>,
    pub snap: &'a mut SnapEngine,
    pub host: &'a dyn ViewHost,
    pub view: &'a ViewTransform,
    pub config: &'a EngineConfig,
    pub motion: &'a Motion,
    pub requests: &'a mut Vec<CmdRequest>,
}

impl<'a> CmdContext<'a> {
    /// The same context with a different motion, for replaying synthetic gestures.
    pub fn with_motion<'b>(&'b mut self, motion: &'b Motion) -> CmdContext<'b> {
        CmdContext {
            doc: self.doc,
            snap: &mut *self.snap,
            host: self.host,
            view: self.view,
            config: self.config,
            motion,
            requests: &mut *self.requests,
        }
    }

    /// Display millimeters to model units.
    pub fn mm(&self, mm: f64) -> f64 {
        self.motion.display_mm_to_model(mm)
    }

    /// Snap a point, optionally in the context of a shape being drawn or dragged.
    ///
    /// When the document is busy the raw point comes back unchanged.
    pub fn snap_point(&mut self, point: Point, shape: Option<&Shape>, hot_handle: i32) -> Point {
        let req = SnapRequest {
            point,
            shape,
            hot_handle,
            ignore_handle: -1,
            ignore_ids: &[],
        };
        self.snap_request(&req)
    }

    pub fn snap_request(&mut self, req: &SnapRequest<'_>) -> Point {
        let doc = match self.doc.read() {
            Ok(doc) => doc,
            Err(err) => {
                log::debug!("Snap skipped: {}", err);
                return req.point;
            }
        };
        let scope = SnapScope {
            doc: &doc,
            view_rect: self.view.model_view_rect(),
            mm_to_model: self.motion.mm_to_model,
            px_to_model: self.motion.px_to_model,
        };
        self.snap.snap_point(&scope, req)
    }

    /// Nearest visible shape within `tol_mm` display millimeters of `point`.
    pub fn hit_test(&self, point: Point, tol_mm: f64) -> Option<(ShapeId, HitResult)> {
        let tol = self.mm(tol_mm);
        match self.doc.read() {
            Ok(doc) => doc.hit_test(point, tol, |_| true),
            Err(err) => {
                log::debug!("Hit test skipped: {}", err);
                None
            }
        }
    }

    /// Commit a finished shape to the document.
    ///
    /// Applies the new-shape flags from the config, asks the host for
    /// permission and, in one-shape mode, hands control back to select.
    pub fn add_shape(&mut self, mut shape: Shape) -> Option<ShapeId> {
        if self.config.new_shape_fixed_length {
            shape.flags.fixed_length = true;
        }
        if self.config.new_shape_locked {
            shape.flags.locked = true;
        }
        if !self.host.shape_will_add(&shape) {
            return None;
        }
        let id = match self.doc.write(LockIntent::Add) {
            Ok(mut doc) => doc.add_shape(shape),
            Err(err) => {
                log::debug!("Shape not added: {}", err);
                return None;
            }
        };
        self.host.shape_added(id);
        self.host.regen_append(id);
        if self.config.draw_one_shape {
            self.to_select(vec![id]);
        }
        Some(id)
    }

    /// Remove shapes the host agrees to delete; returns how many went.
    ///
    /// The host is asked before the write lock is taken, so its callback may
    /// read the document.
    pub fn delete_shapes(&mut self, ids: &[ShapeId]) -> usize {
        let candidates: Vec<Shape> = match self.doc.read() {
            Ok(doc) => ids.iter().filter_map(|&id| doc.find_shape(id).cloned()).collect(),
            Err(err) => {
                log::debug!("Shapes not deleted: {}", err);
                return 0;
            }
        };
        let approved: Vec<ShapeId> = candidates
            .iter()
            .filter(|s| self.host.shape_will_delete(s))
            .map(Shape::id)
            .collect();
        if approved.is_empty() {
            return 0;
        }
        let removed: Vec<ShapeId> = match self.doc.write(LockIntent::Remove) {
            Ok(mut doc) => {
                let removed: Vec<ShapeId> = approved
                    .into_iter()
                    .filter(|&id| doc.remove_shape(id).is_some())
                    .collect();
                if removed.is_empty() {
                    doc.discard();
                }
                removed
            }
            Err(err) => {
                log::debug!("Shapes not deleted: {}", err);
                return 0;
            }
        };
        if removed.is_empty() {
            return 0;
        }
        for &id in &removed {
            self.host.shape_deleted(id);
        }
        self.host.regen_all(true);
        removed.len()
    }

    pub fn request_command(&mut self, name: &str) {
        self.requests.push(CmdRequest::SetCommand(name.to_string()));
    }

    pub fn request_select(&mut self, ids: Vec<ShapeId>) {
        self.requests.push(CmdRequest::Select(ids));
    }

    /// Switch to select with `ids` selected.
    pub fn to_select(&mut self, ids: Vec<ShapeId>) {
        self.request_command("select");
        self.request_select(ids);
    }
}

/// A gesture-driven command.
pub trait Command {
    fn name(&self) -> &str;

    /// Prepare for use. `selected` is the selection carried over from the previous command.
    fn initialize(
        &mut self,
        _ctx: &mut CmdContext<'_>,
        _params: Option<&CmdParams>,
        _selected: &[ShapeId],
    ) -> bool {
        true
    }

    /// Drop in-progress state; returns whether there was any.
    fn cancel(&mut self, _ctx: &mut CmdContext<'_>) -> bool {
        false
    }

    fn back_step(&mut self, _ctx: &mut CmdContext<'_>) -> bool {
        false
    }

    /// Draw transient state such as the shape being drawn and snap guides.
    fn draw(&self, _ctx: &CmdContext<'_>, _sink: &mut dyn GraphicsSink) -> bool {
        false
    }

    /// Collect in-progress shapes for renderers that cannot call [`Command::draw`].
    fn gather_shapes(&self, _out: &mut Vec<Shape>) -> bool {
        false
    }

    fn click(&mut self, _ctx: &mut CmdContext<'_>) -> bool {
        false
    }

    fn double_click(&mut self, _ctx: &mut CmdContext<'_>) -> bool {
        false
    }

    fn long_press(&mut self, _ctx: &mut CmdContext<'_>) -> bool {
        false
    }

    fn touch_began(&mut self, _ctx: &mut CmdContext<'_>) -> bool {
        false
    }

    fn touch_moved(&mut self, _ctx: &mut CmdContext<'_>) -> bool {
        false
    }

    fn touch_ended(&mut self, _ctx: &mut CmdContext<'_>) -> bool {
        false
    }

    fn mouse_hover(&mut self, _ctx: &mut CmdContext<'_>) -> bool {
        false
    }

    fn two_fingers_move(&mut self, _ctx: &mut CmdContext<'_>) -> bool {
        false
    }

    /// Handle a context action code the dispatcher does not know.
    fn do_context_action(&mut self, _ctx: &mut CmdContext<'_>, _action: u32) -> bool {
        false
    }

    /// Remembered as the target of `@draw`.
    fn is_drawing_command(&self) -> bool {
        false
    }

    /// May run on top of another command.
    fn is_floating_command(&self) -> bool {
        false
    }

    fn selected_ids(&self) -> Vec<ShapeId> {
        Vec::new()
    }

    fn as_select(&self) -> Option<&CmdSelect> {
        None
    }

    fn as_select_mut(&mut self) -> Option<&mut CmdSelect> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::NullHost;

    struct Noop;

    impl Command for Noop {
        fn name(&self) -> &str {
            "noop"
        }
    }

    #[test]
    fn test_defaults_do_nothing() {
        let doc = ShapeLock::new(ShapeDocument::new());
        let mut snap = SnapEngine::default();
        let view = ViewTransform::default();
        let config = EngineConfig::default();
        let motion = Motion::default();
        let mut requests = Vec::new();
        let mut ctx = CmdContext {
            doc: &doc,
            snap: &mut snap,
            host: &NullHost,
            view: &view,
            config: &config,
            motion: &motion,
            requests: &mut requests,
        };
        let mut cmd = Noop;
        assert!(cmd.initialize(&mut ctx, None, &[]));
        assert!(!cmd.click(&mut ctx));
        assert!(!cmd.touch_began(&mut ctx));
        assert!(!cmd.cancel(&mut ctx));
        assert!(!cmd.is_drawing_command());
        assert!(cmd.as_select().is_none());
    }

    #[test]
    fn test_add_shape_applies_config_flags() {
        let doc = ShapeLock::new(ShapeDocument::new());
        let mut snap = SnapEngine::default();
        let view = ViewTransform::default();
        let config = EngineConfig {
            new_shape_locked: true,
            draw_one_shape: true,
            ..EngineConfig::default()
        };
        let motion = Motion::default();
        let mut requests = Vec::new();
        let mut ctx = CmdContext {
            doc: &doc,
            snap: &mut snap,
            host: &NullHost,
            view: &view,
            config: &config,
            motion: &motion,
            requests: &mut requests,
        };
        let id = ctx
            .add_shape(Shape::line(Point::new(0.0, 0.0), Point::new(10.0, 0.0)))
            .unwrap();
        assert_eq!(ctx.delete_shapes(&[id, 99]), 1);
        assert_eq!(
            requests,
            vec![CmdRequest::SetCommand("select".into()), CmdRequest::Select(vec![id])]
        );
        assert_eq!(doc.generation(), 2);
    }

    /// Host that inspects the document before agreeing to a delete.
    struct PeekingHost<'a> {
        doc: &'a ShapeLock<ShapeDocument>,
    }

    impl ViewHost for PeekingHost<'_> {
        fn shape_will_delete(&self, shape: &Shape) -> bool {
            self.doc
                .read_timeout(std::time::Duration::ZERO)
                .is_ok_and(|doc| doc.contains(shape.id()))
        }
    }

    #[test]
    fn test_delete_host_may_read_document() {
        let doc = ShapeLock::new(ShapeDocument::new());
        let id = doc
            .write(LockIntent::Add)
            .unwrap()
            .add_shape(Shape::line(Point::new(0.0, 0.0), Point::new(10.0, 0.0)));
        let host = PeekingHost { doc: &doc };
        let mut snap = SnapEngine::default();
        let view = ViewTransform::default();
        let config = EngineConfig::default();
        let motion = Motion::default();
        let mut requests = Vec::new();
        let mut ctx = CmdContext {
            doc: &doc,
            snap: &mut snap,
            host: &host,
            view: &view,
            config: &config,
            motion: &motion,
            requests: &mut requests,
        };
        assert_eq!(ctx.delete_shapes(&[id]), 1);
        assert!(doc.read().unwrap().is_empty());
    }
}
