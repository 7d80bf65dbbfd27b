//! Command manager: owns the command registry, the document locks and the
//! snap engine, and routes host gestures to the active command.
//!
//! Commands never switch each other directly. They leave [`CmdRequest`]s in
//! their context, and the manager applies them once the gesture sequence that
//! produced them is over.

use crate::actions::{Action, SelectState};
use crate::command::{CmdContext, CmdRequest, Command};
use crate::commands::{CmdFactory, default_factories};
use crate::config::EngineConfig;
use crate::document::ShapeDocument;
use crate::host::{GraphicsSink, ViewHost};
use crate::lock::{LockError, LockIntent, ShapeLock};
use crate::motion::{GestureState, GestureType, Motion};
use crate::select::{CmdSelect, SelectionKind};
use crate::shapes::{NO_SHAPE, SerializableColor, Shape, ShapeId};
use crate::snap::SnapEngine;
use crate::storage::CmdParams;
use crate::transform::ViewTransform;
use kurbo::{Point, Rect, Vec2};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

pub const SELECT_COMMAND: &str = "select";
pub const ERASE_COMMAND: &str = "erase";
/// Pseudo-command deleting everything in the visible window.
pub const ERASE_WINDOW_COMMAND: &str = "erasewnd";
/// Resolves to the last drawing command.
pub const DRAW_ALIAS: &str = "@draw";
pub const DEFAULT_DRAW_COMMAND: &str = "splines";

/// Mouse input uses this share of the millimeter tolerances.
const MOUSE_MM_FACTOR: f64 = 0.5;
/// Largest side of a new image, in model units.
const IMAGE_MAX_SIDE: f64 = 200.0;
const IMAGE_MARGIN: f64 = 10.0;

/// Drives the commands of one view.
pub struct CmdManager<H: ViewHost> {
    host: H,
    doc: ShapeLock<ShapeDocument>,
    /// In-progress shapes of the active command, for concurrent renderers.
    dynamic: ShapeLock<Vec<Shape>>,
    snap: SnapEngine,
    view: ViewTransform,
    config: EngineConfig,
    motion: Motion,
    factories: BTreeMap<String, CmdFactory>,
    commands: HashMap<String, Box<dyn Command>>,
    cmd_name: String,
    draw_cmd: String,
    /// Finger or mouse, decided on the first gesture.
    use_finger: Option<bool>,
    /// Whether the command took the current gesture sequence.
    gesture_handled: bool,
    requests: Vec<CmdRequest>,
}

impl<H: ViewHost> CmdManager<H> {
    /// Create a manager with the built-in commands, starting in select.
    pub fn new(host: H, config: EngineConfig) -> Self {
        let timeout = Duration::from_millis(config.lock_timeout_ms);
        let mut snap = SnapEngine::new(config.snap_options());
        snap.set_enabled(config.snap_enabled);
        let mut manager = Self {
            host,
            doc: ShapeLock::with_timeout(ShapeDocument::new(), timeout),
            dynamic: ShapeLock::with_timeout(Vec::new(), timeout),
            snap,
            view: ViewTransform::default(),
            motion: Motion::default(),
            factories: BTreeMap::new(),
            commands: HashMap::new(),
            cmd_name: String::new(),
            draw_cmd: String::new(),
            use_finger: config.use_finger,
            gesture_handled: false,
            requests: Vec::new(),
            config,
        };
        for (name, factory) in default_factories() {
            manager.factories.insert(name.to_string(), factory);
        }
        manager.set_command(SELECT_COMMAND, None);
        manager
    }

    pub fn with_view(mut self, view: ViewTransform) -> Self {
        self.view = view;
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn document(&self) -> &ShapeLock<ShapeDocument> {
        &self.doc
    }

    /// Shapes the active command is drawing or dragging, as of the last callback.
    pub fn dynamic_shapes(&self) -> &ShapeLock<Vec<Shape>> {
        &self.dynamic
    }

    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ViewTransform {
        &mut self.view
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: EngineConfig) {
        self.snap.set_options(config.snap_options());
        self.snap.set_enabled(config.snap_enabled);
        if config.use_finger.is_some() {
            self.use_finger = config.use_finger;
        }
        self.config = config;
    }

    pub fn snap(&self) -> &SnapEngine {
        &self.snap
    }

    pub fn motion(&self) -> &Motion {
        &self.motion
    }

    /// Name of the active command.
    pub fn command_name(&self) -> &str {
        &self.cmd_name
    }

    /// Command that `@draw` resumes.
    pub fn draw_command_name(&self) -> &str {
        if self.draw_cmd.is_empty() {
            DEFAULT_DRAW_COMMAND
        } else {
            &self.draw_cmd
        }
    }

    pub fn command(&self) -> Option<&dyn Command> {
        self.commands.get(&self.cmd_name).map(|cmd| cmd.as_ref())
    }

    /// Display millimeters to model units, with the finger/mouse factor.
    pub fn display_mm_to_model(&self, mm: f64) -> f64 {
        let factor = if self.use_finger.unwrap_or(true) {
            1.0
        } else {
            MOUSE_MM_FACTOR
        };
        self.view.mm_to_model(mm * factor)
    }

    /// Ask the host again whether input comes from a finger.
    pub fn reset_input_calibration(&mut self) {
        self.use_finger = self.config.use_finger;
    }

    /// Add, replace or (with `None`) remove a command factory.
    pub fn register_command(&mut self, name: &str, factory: Option<CmdFactory>) -> bool {
        if name.is_empty() || name.starts_with('@') {
            log::warn!("Rejected command name {:?}", name);
            return false;
        }
        let changed = match factory {
            Some(factory) => {
                self.factories.insert(name.to_string(), factory);
                log::debug!("Registered command {} ({} known)", name, self.factories.len());
                true
            }
            None => self.factories.remove(name).is_some(),
        };
        if changed && self.cmd_name != name {
            self.commands.remove(name);
        }
        changed
    }

    /// Drop every cached command instance except the active one.
    pub fn unload_commands(&mut self) {
        let active = self.commands.remove(&self.cmd_name);
        self.commands.clear();
        if let Some(cmd) = active {
            self.commands.insert(self.cmd_name.clone(), cmd);
        }
    }

    /// Switch to the named command; returns whether it initialized.
    ///
    /// Unknown names fall back to select.
    pub fn set_command(&mut self, name: &str, params: Option<&CmdParams>) -> bool {
        self.switch_to(name, params, None)
    }

    /// Cycle to the next drawing command after the active one, by name.
    pub fn switch_command(&mut self) -> bool {
        let names: Vec<String> = self.factories.keys().cloned().collect();
        let start = names
            .iter()
            .position(|name| *name == self.cmd_name)
            .map_or(0, |i| i + 1);
        for offset in 0..names.len() {
            let name = &names[(start + offset) % names.len()];
            if *name == self.cmd_name || !self.find_command(name) {
                continue;
            }
            if self.commands.get(name).is_some_and(|cmd| cmd.is_drawing_command()) {
                return self.set_command(name, None);
            }
        }
        false
    }

    /// Cancel whatever the active command has in progress.
    pub fn cancel(&mut self) -> bool {
        let cancelled = self.cancel_current();
        self.after_dispatch();
        cancelled
    }

    /// Feed one gesture sample in display coordinates.
    pub fn on_gesture(&mut self, gesture: GestureType, state: GestureState, point: Point, switch_gesture: bool) -> bool {
        self.update_motion(gesture, state, point, point, switch_gesture);
        self.route()
    }

    /// Feed one two-finger sample in display coordinates.
    pub fn two_fingers_move(&mut self, state: GestureState, p1: Point, p2: Point, switch_gesture: bool) -> bool {
        self.update_motion(GestureType::TwoFinger, state, p1, p2, switch_gesture);
        self.route()
    }

    /// Pointer hovering without a button pressed.
    pub fn mouse_hover(&mut self, point: Point) -> bool {
        self.motion.point = point;
        self.motion.point_m = self.view.to_model(point);
        self.calibrate();
        let name = self.cmd_name.clone();
        let handled = self
            .with_command(&name, |cmd, ctx| cmd.mouse_hover(ctx))
            .unwrap_or(false);
        self.after_dispatch();
        handled
    }

    /// Let the active command paint its overlay.
    pub fn draw(&mut self, sink: &mut dyn GraphicsSink) -> bool {
        let name = self.cmd_name.clone();
        self.with_command(&name, |cmd, ctx| cmd.draw(ctx, sink))
            .unwrap_or(false)
    }

    /// Run a context action code.
    pub fn do_action(&mut self, code: u32) -> bool {
        let Some(action) = Action::from_code(code) else {
            return false;
        };
        let done = match action {
            Action::SelAll => self.with_select(|sel, ctx| sel.select_all(ctx) > 0),
            Action::SelReset => self.with_select(|sel, ctx| sel.reset_selection(ctx)),
            Action::Draw => self.set_command(DRAW_ALIAS, None),
            Action::Cancel => self.set_command(SELECT_COMMAND, None),
            Action::Delete => self.with_select(|sel, ctx| sel.delete_selection(ctx) > 0),
            Action::Clone => self.with_select(|sel, ctx| sel.clone_selection(ctx)),
            Action::Group => self.with_select(|sel, ctx| sel.group_selection(ctx)),
            Action::Ungroup => self.with_select(|sel, ctx| sel.ungroup_selection(ctx)),
            Action::FixedLength | Action::FreeLength => self.with_select(|sel, ctx| {
                let fixed = sel.is_fixed_length(ctx);
                sel.set_fixed_length(ctx, !fixed) > 0
            }),
            Action::Locked | Action::Unlocked => self.with_select(|sel, ctx| {
                let locked = sel.is_locked(ctx);
                sel.set_locked(ctx, !locked) > 0
            }),
            Action::EditVertex | Action::HideVertex => self.with_select(|sel, ctx| {
                let edit = sel.is_edit_mode(ctx);
                sel.set_edit_mode(ctx, !edit)
            }),
            Action::Closed | Action::Opened => self.with_select(|sel, ctx| sel.switch_closed(ctx)),
            Action::AddVertex => self.with_select(|sel, ctx| sel.insert_vertex(ctx)),
            Action::DelVertex => self.with_select(|sel, ctx| sel.delete_vertex(ctx)),
            Action::Overturn => self.with_select(|sel, ctx| sel.overturn_polygon(ctx)),
            Action::Customized(_) => self.do_custom_action(code),
        };
        self.after_dispatch();
        done
    }

    /// Host first, then the active command, then the last drawing command.
    fn do_custom_action(&mut self, code: u32) -> bool {
        if self.host.do_action(code) {
            return true;
        }
        let name = self.cmd_name.clone();
        if self
            .with_command(&name, |cmd, ctx| cmd.do_context_action(ctx, code))
            .unwrap_or(false)
        {
            return true;
        }
        let drawing = self.command().is_some_and(|cmd| cmd.is_drawing_command());
        let draw_cmd = self.draw_command_name().to_string();
        if drawing || !self.find_command(&draw_cmd) {
            return false;
        }
        self.with_command(&draw_cmd, |cmd, ctx| cmd.do_context_action(ctx, code))
            .unwrap_or(false)
    }

    /// Ids selected in the select command, empty in other commands.
    pub fn selection(&self) -> Vec<ShapeId> {
        if self.cmd_name != SELECT_COMMAND {
            return Vec::new();
        }
        self.command().map(|cmd| cmd.selected_ids()).unwrap_or_default()
    }

    /// Copies of the selected shapes.
    pub fn selected_shapes(&mut self) -> Vec<Shape> {
        self.with_active_select(|sel, ctx| sel.selection_shapes(ctx))
            .unwrap_or_default()
    }

    pub fn selected_shape_count(&self) -> usize {
        self.selection().len()
    }

    /// Primary selected shape, [`NO_SHAPE`] when none.
    pub fn selected_shape_id(&self) -> ShapeId {
        self.command()
            .filter(|_| self.cmd_name == SELECT_COMMAND)
            .and_then(|cmd| cmd.as_select())
            .map_or(NO_SHAPE, CmdSelect::primary)
    }

    pub fn selected_shape_type(&mut self) -> Option<SelectionKind> {
        self.with_active_select(|sel, ctx| sel.select_kind(ctx)).flatten()
    }

    /// Add a shape to the selection, entering select if needed.
    pub fn add_selection(&mut self, id: ShapeId) -> bool {
        if self.cmd_name != SELECT_COMMAND {
            let mut ids = self.carried_selection();
            if !ids.contains(&id) {
                ids.push(id);
            }
            self.switch_to(SELECT_COMMAND, None, Some(ids));
            return self.selection().contains(&id);
        }
        let added = self.with_select(|sel, ctx| sel.add_selection(ctx, id));
        self.after_dispatch();
        added
    }

    /// Finish an externally driven drag of the selection.
    pub fn dynamic_change_ended(&mut self, apply: bool) -> bool {
        let changed = self
            .with_active_select(|sel, ctx| sel.dynamic_change_ended(ctx, apply))
            .unwrap_or(false);
        self.after_dispatch();
        changed
    }

    /// The selection box in display coordinates, or an empty box at the pointer.
    pub fn bounding_box(&mut self) -> Rect {
        let selbox = self
            .with_active_select(|sel, ctx| sel.bounding_box(ctx))
            .filter(|selbox| !selbox.is_zero_area())
            .unwrap_or_else(|| Rect::from_points(self.motion.point_m, self.motion.point_m));
        self.view.rect_to_display(selbox)
    }

    /// Add an image scaled to fit near the top-left of the view and select it.
    pub fn add_image_shape(&mut self, name: &str, width: f64, height: f64) -> Option<ShapeId> {
        if name.is_empty() || width < 1.0 || height < 1.0 {
            return None;
        }
        let mut size = Vec2::new(
            self.view.display_to_model_len(width),
            self.view.display_to_model_len(height),
        );
        while size.x > IMAGE_MAX_SIDE || size.y > IMAGE_MAX_SIDE {
            size *= 0.95;
        }
        let window = self.view.model_view_rect();
        let origin = Point::new(window.x0 + IMAGE_MARGIN, window.y0 + IMAGE_MARGIN);
        let mut shape = Shape::image(Rect::from_origin_size(origin, size.to_size()), name);
        shape.style.fill_color = Some(SerializableColor::new(255, 255, 255, 255));
        if !self.host.shape_will_add(&shape) {
            return None;
        }
        let id = match self.doc.write(LockIntent::Add) {
            Ok(mut doc) => doc.add_shape(shape),
            Err(err) => {
                log::debug!("Image not added: {}", err);
                return None;
            }
        };
        log::info!("Added image {} as shape {}", name, id);
        self.host.shape_added(id);
        self.host.regen_append(id);
        self.switch_to(SELECT_COMMAND, None, Some(vec![id]));
        Some(id)
    }

    /// Replace the whole document without counting it as an edit.
    pub fn load_document(&mut self, document: ShapeDocument) -> Result<(), LockError> {
        self.cancel_current();
        *self.doc.write(LockIntent::Load)? = document;
        self.switch_to(SELECT_COMMAND, None, Some(Vec::new()));
        self.host.regen_all(true);
        Ok(())
    }

    fn switch_to(&mut self, name: &str, params: Option<&CmdParams>, selection: Option<Vec<ShapeId>>) -> bool {
        let name = if name == DRAW_ALIAS {
            self.draw_command_name().to_string()
        } else {
            name.to_string()
        };
        let found = self.find_command(&name);

        if name == ERASE_COMMAND
            && self.cmd_name == SELECT_COMMAND
            && self.with_select(|sel, ctx| sel.delete_selection(ctx) > 0)
        {
            log::debug!("Erase chosen with a selection, deleted the selection instead");
            self.after_dispatch();
            return false;
        }

        let carried = selection.unwrap_or_else(|| self.carried_selection());
        self.cancel_current();
        let old = self.cmd_name.clone();

        let initialized = if found {
            self.cmd_name = name.clone();
            let ok = self
                .with_command(&name, |cmd, ctx| cmd.initialize(ctx, params, &carried))
                .unwrap_or(false);
            if !ok {
                log::debug!("Command {} refused to start", name);
                self.cmd_name = old.clone();
            } else if self.commands.get(&name).is_some_and(|cmd| cmd.is_drawing_command()) {
                self.draw_cmd = name.clone();
            }
            ok
        } else {
            if name == ERASE_WINDOW_COMMAND {
                self.erase_window();
            } else {
                log::debug!("Unknown command {:?}, using select", name);
            }
            self.find_command(SELECT_COMMAND);
            self.cmd_name = SELECT_COMMAND.to_string();
            self.with_command(SELECT_COMMAND, |cmd, ctx| cmd.initialize(ctx, params, &carried));
            false
        };

        if old != self.cmd_name {
            log::info!("Command changed: {:?} -> {:?}", old, self.cmd_name);
            self.host.command_changed(&self.cmd_name);
        }
        self.after_dispatch();
        initialized
    }

    /// Look up or create a command instance by name.
    fn find_command(&mut self, name: &str) -> bool {
        if name.is_empty() {
            return false;
        }
        if self.commands.contains_key(name) {
            return true;
        }
        let cmd = self
            .factories
            .get(name)
            .map(|factory| factory())
            .or_else(|| (name == SELECT_COMMAND).then(|| Box::new(CmdSelect::new()) as Box<dyn Command>))
            .or_else(|| self.host.create_command(name));
        match cmd {
            Some(cmd) => {
                self.commands.insert(name.to_string(), cmd);
                true
            }
            None => false,
        }
    }

    fn carried_selection(&self) -> Vec<ShapeId> {
        let current = self.command().map(|cmd| cmd.selected_ids()).unwrap_or_default();
        if !current.is_empty() {
            return current;
        }
        self.commands
            .get(SELECT_COMMAND)
            .map(|cmd| cmd.selected_ids())
            .unwrap_or_default()
    }

    fn cancel_current(&mut self) -> bool {
        self.snap.clear_snap();
        self.host
            .show_context_actions(SelectState::None, &[], Rect::ZERO, None);
        let name = self.cmd_name.clone();
        self.with_command(&name, |cmd, ctx| cmd.cancel(ctx))
            .unwrap_or(false)
    }

    /// Delete every shape touching the visible window.
    fn erase_window(&mut self) -> usize {
        let window = self.view.model_view_rect();
        let ids = match self.doc.read() {
            Ok(doc) => doc.shapes_in_rect(window, true),
            Err(err) => {
                log::debug!("Window erase skipped: {}", err);
                return 0;
            }
        };
        if ids.is_empty() {
            return 0;
        }
        let count = self.with_context(|ctx| ctx.delete_shapes(&ids));
        log::info!("Erased {} shapes in the window", count);
        count
    }

    fn calibrate(&mut self) {
        if self.use_finger.is_none() {
            let finger = self.host.use_finger();
            log::debug!("Input calibrated for {}", if finger { "finger" } else { "mouse" });
            self.use_finger = Some(finger);
        }
        self.motion.from_finger = self.use_finger.unwrap_or(true);
        self.motion.mm_to_model = self.display_mm_to_model(1.0);
        self.motion.px_to_model = self.view.display_to_model_len(1.0);
    }

    fn update_motion(&mut self, gesture: GestureType, state: GestureState, p1: Point, p2: Point, switch_gesture: bool) {
        let p1_m = self.view.to_model(p1);
        let p2_m = self.view.to_model(p2);
        let m = &mut self.motion;
        m.gesture_type = gesture;
        m.gesture_state = state;
        m.press_drag = gesture == GestureType::Press && state < GestureState::Ended;
        m.switch_gesture = switch_gesture;
        m.point = p1;
        m.point_m = p1_m;
        m.point2 = p2;
        m.point2_m = p2_m;
        if state <= GestureState::Began || matches!(gesture, GestureType::Tap | GestureType::DoubleTap) {
            m.start_pt = p1;
            m.start_pt_m = p1_m;
            m.last_pt = p1;
            m.last_pt_m = p1_m;
            m.start_pt2 = p2;
            m.start_pt2_m = p2_m;
        }
        self.calibrate();
    }

    /// Dispatch the current motion; the decision taken when a sequence starts holds for it.
    fn route(&mut self) -> bool {
        let starts = self.motion.gesture_state <= GestureState::Began
            || matches!(self.motion.gesture_type, GestureType::Tap | GestureType::DoubleTap);
        if starts {
            self.gesture_handled = self.gesture_to_command();
        } else if self.gesture_handled {
            self.gesture_to_command();
        }
        self.motion.last_pt = self.motion.point;
        self.motion.last_pt_m = self.motion.point_m;
        self.gesture_handled
    }

    fn gesture_to_command(&mut self) -> bool {
        let gesture = self.motion.gesture_type;
        let state = self.motion.gesture_state;
        let name = self.cmd_name.clone();
        let handled = self
            .with_command(&name, |cmd, ctx| {
                if state == GestureState::Cancel {
                    return cmd.cancel(ctx);
                }
                if state == GestureState::Possible && gesture != GestureType::TwoFinger {
                    return true;
                }
                let handled = match gesture {
                    GestureType::TwoFinger => cmd.two_fingers_move(ctx),
                    GestureType::Pan => match state {
                        GestureState::Began => cmd.touch_began(ctx),
                        GestureState::Moved => cmd.touch_moved(ctx),
                        // The release point is the last sample of the drag.
                        _ => cmd.touch_moved(ctx) && cmd.touch_ended(ctx),
                    },
                    GestureType::Tap => cmd.click(ctx),
                    GestureType::DoubleTap => cmd.double_click(ctx),
                    GestureType::Press => state != GestureState::Began || cmd.long_press(ctx),
                    GestureType::Unknown => false,
                };
                if !handled {
                    log::debug!("Command {} ignored {:?} gesture ({:?})", cmd.name(), gesture, state);
                }
                handled
            })
            .unwrap_or(false);
        self.after_dispatch();
        handled
    }

    /// Publish dynamic shapes, apply command requests and report document changes.
    fn after_dispatch(&mut self) {
        self.publish_dynamic_shapes();
        self.process_requests();
        if let Some(changes) = self.doc.take_changes() {
            self.host.content_changed(changes.generation);
        }
    }

    fn publish_dynamic_shapes(&mut self) {
        let mut shapes = Vec::new();
        if let Some(cmd) = self.commands.get(&self.cmd_name) {
            cmd.gather_shapes(&mut shapes);
        }
        match self.dynamic.write(LockIntent::Edit) {
            Ok(mut dynamic) => {
                if *dynamic == shapes {
                    dynamic.discard();
                } else {
                    *dynamic = shapes;
                }
            }
            Err(err) => log::debug!("Dynamic shapes not published: {}", err),
        }
    }

    /// Apply the commands' requests once no drag is in progress.
    fn process_requests(&mut self) {
        if self.requests.is_empty() || self.motion.dragging() {
            return;
        }
        let mut command = None;
        let mut selection = None;
        for request in std::mem::take(&mut self.requests) {
            match request {
                CmdRequest::SetCommand(name) => command = Some(name),
                CmdRequest::Select(ids) => selection = Some(ids),
            }
        }
        match (command, selection) {
            (Some(name), selection) => {
                self.switch_to(&name, None, selection);
            }
            (None, Some(ids)) if self.cmd_name == SELECT_COMMAND => {
                self.with_command(SELECT_COMMAND, |cmd, ctx| cmd.initialize(ctx, None, &ids));
                self.after_dispatch();
            }
            (None, _) => {}
        }
    }

    /// Run `f` on the select command, creating it if needed.
    fn with_select<R: Default>(&mut self, f: impl FnOnce(&mut CmdSelect, &mut CmdContext<'_>) -> R) -> R {
        self.find_command(SELECT_COMMAND);
        self.with_command(SELECT_COMMAND, |cmd, ctx| cmd.as_select_mut().map(|sel| f(sel, ctx)))
            .flatten()
            .unwrap_or_default()
    }

    /// Run `f` on the select command only while it is active.
    fn with_active_select<R>(&mut self, f: impl FnOnce(&mut CmdSelect, &mut CmdContext<'_>) -> R) -> Option<R> {
        if self.cmd_name != SELECT_COMMAND {
            return None;
        }
        self.with_command(SELECT_COMMAND, |cmd, ctx| cmd.as_select_mut().map(|sel| f(sel, ctx)))
            .flatten()
    }

    fn with_command<R>(
        &mut self,
        name: &str,
        f: impl FnOnce(&mut dyn Command, &mut CmdContext<'_>) -> R,
    ) -> Option<R> {
        let Self {
            host,
            doc,
            snap,
            view,
            config,
            motion,
            commands,
            requests,
            ..
        } = self;
        let cmd = commands.get_mut(name)?;
        let mut ctx = CmdContext {
            doc: &*doc,
            snap,
            host: &*host,
            view: &*view,
            config: &*config,
            motion: &*motion,
            requests,
        };
        Some(f(&mut **cmd, &mut ctx))
    }

    fn with_context<R>(&mut self, f: impl FnOnce(&mut CmdContext<'_>) -> R) -> R {
        let mut ctx = CmdContext {
            doc: &self.doc,
            snap: &mut self.snap,
            host: &self.host,
            view: &self.view,
            config: &self.config,
            motion: &self.motion,
            requests: &mut self.requests,
        };
        f(&mut ctx)
    }
}
