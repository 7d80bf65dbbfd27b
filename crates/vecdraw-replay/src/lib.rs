//! Headless host for the vecdraw engine.
//!
//! A replay script carries an engine config, a view and a list of steps:
//!
//! ```json
//! {
//!   "config": { "snap_enabled": false },
//!   "view": { "dpi": 25.4 },
//!   "steps": [
//!     { "type": "command", "name": "line" },
//!     { "type": "gesture", "gesture": "pan", "state": "began", "x": 0, "y": 0 },
//!     { "type": "gesture", "gesture": "pan", "state": "ended", "x": 100, "y": 0 },
//!     { "type": "action", "code": 1 }
//!   ]
//! }
//! ```
//!
//! Steps run through a [`CmdManager`] whose host logs every notification.

use kurbo::{Point, Rect};
use log::{debug, info};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;
use vecdraw_core::{
    Action, CmdManager, CmdParams, ConfigError, EngineConfig, GestureState, GestureType, LockError, SelectState,
    ShapeDocument, ShapeId, TouchEndedInfo, ViewHost, ViewTransform,
};

/// Replay errors.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid script: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Config(#[from] ConfigError),
    #[error("Document unavailable: {0}")]
    Lock(#[from] LockError),
}

/// A scripted session.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Script {
    pub config: EngineConfig,
    pub view: ViewTransform,
    /// Shapes present before the first step.
    pub document: Option<ShapeDocument>,
    pub steps: Vec<Step>,
}

impl Script {
    pub fn from_json(json: &str) -> Result<Self, ReplayError> {
        let script: Self = serde_json::from_str(json)?;
        script.config.validate()?;
        Ok(script)
    }

    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

/// One scripted input, tagged by `"type"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Step {
    /// Switch command, with optional JSON parameters.
    Command {
        name: String,
        #[serde(default)]
        params: Option<Value>,
    },
    /// One-finger gesture sample in display pixels.
    Gesture {
        gesture: GestureType,
        state: GestureState,
        x: f64,
        y: f64,
        #[serde(default)]
        switch_gesture: bool,
    },
    TwoFingers {
        state: GestureState,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        #[serde(default)]
        switch_gesture: bool,
    },
    Hover { x: f64, y: f64 },
    Action { code: u32 },
    /// Add a shape to the selection by id.
    Select { id: ShapeId },
    /// Cycle to the next drawing command.
    Switch,
    Cancel,
}

/// What a replay left behind.
#[derive(Debug, Clone)]
pub struct ReplayOutcome {
    pub document: ShapeDocument,
    /// Whether each step reported that it handled its input.
    pub handled: Vec<bool>,
    pub command: String,
    pub selection: Vec<ShapeId>,
}

/// ViewHost that only logs what the engine tells it.
#[derive(Debug, Default)]
pub struct LoggingHost;

impl ViewHost for LoggingHost {
    fn shape_added(&self, id: ShapeId) {
        debug!("shape {id} added");
    }

    fn shape_deleted(&self, id: ShapeId) {
        debug!("shape {id} deleted");
    }

    fn shape_moved(&self, id: ShapeId, segment: i32) {
        debug!("shape {id} moved (segment {segment})");
    }

    fn selection_changed(&self) {
        debug!("selection changed");
    }

    fn command_changed(&self, name: &str) {
        info!("command is now {name}");
    }

    fn content_changed(&self, generation: u64) {
        debug!("content changed, generation {generation}");
    }

    fn show_context_actions(
        &self,
        state: SelectState,
        actions: &[Action],
        display_box: Rect,
        shape: Option<ShapeId>,
    ) -> bool {
        debug!("context actions for {state:?} at {display_box:?} (shape {shape:?}): {actions:?}");
        false
    }

    fn on_select_touch_ended(&self, info: &TouchEndedInfo) {
        debug!("select drag ended: {info:?}");
    }
}

/// Run every step of `script` and return the resulting document.
pub fn run_script(script: &Script) -> Result<ReplayOutcome, ReplayError> {
    let mut manager = CmdManager::new(LoggingHost, script.config.clone()).with_view(script.view.clone());
    if let Some(document) = &script.document {
        manager.load_document(document.clone())?;
    }

    let mut handled = Vec::with_capacity(script.steps.len());
    for (index, step) in script.steps.iter().enumerate() {
        let result = apply_step(&mut manager, step);
        debug!("step {index} {step:?} -> {result}");
        handled.push(result);
    }

    Ok(ReplayOutcome {
        document: manager.document().snapshot()?,
        handled,
        command: manager.command_name().to_string(),
        selection: manager.selection(),
    })
}

fn apply_step<H: ViewHost>(manager: &mut CmdManager<H>, step: &Step) -> bool {
    match step {
        Step::Command { name, params } => {
            let params = params.clone().map(CmdParams::from_value);
            manager.set_command(name, params.as_ref())
        }
        Step::Gesture {
            gesture,
            state,
            x,
            y,
            switch_gesture,
        } => manager.on_gesture(*gesture, *state, Point::new(*x, *y), *switch_gesture),
        Step::TwoFingers {
            state,
            x1,
            y1,
            x2,
            y2,
            switch_gesture,
        } => manager.two_fingers_move(*state, Point::new(*x1, *y1), Point::new(*x2, *y2), *switch_gesture),
        Step::Hover { x, y } => manager.mouse_hover(Point::new(*x, *y)),
        Step::Action { code } => manager.do_action(*code),
        Step::Select { id } => manager.add_selection(*id),
        Step::Switch => manager.switch_command(),
        Step::Cancel => manager.cancel(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vecdraw_core::ShapeKind;

    const LINE_SCRIPT: &str = r#"{
        "config": { "snap_enabled": false },
        "view": { "dpi": 25.4 },
        "steps": [
            { "type": "command", "name": "line" },
            { "type": "gesture", "gesture": "pan", "state": "began", "x": 0, "y": 0 },
            { "type": "gesture", "gesture": "pan", "state": "moved", "x": 100, "y": 0 },
            { "type": "gesture", "gesture": "pan", "state": "ended", "x": 100, "y": 0 }
        ]
    }"#;

    fn write_script(dir: &tempfile::TempDir, json: &str) -> std::path::PathBuf {
        let path = dir.path().join("script.json");
        std::fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn test_replay_draws_a_line() {
        let dir = tempfile::tempdir().unwrap();
        let script = Script::load(&write_script(&dir, LINE_SCRIPT)).unwrap();
        let outcome = run_script(&script).unwrap();

        let shapes: Vec<_> = outcome.document.shapes_ordered().collect();
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].kind(), ShapeKind::Line);
        assert_eq!(shapes[0].points(), vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)]);
        assert_eq!(outcome.handled.len(), 4);
        assert!(outcome.handled[0]);
        assert_eq!(outcome.command, "line");
    }

    #[test]
    fn test_actions_and_initial_document() {
        let mut document = ShapeDocument::new();
        document.add_shape(vecdraw_core::Shape::rect(Rect::new(20.0, 20.0, 60.0, 60.0)));
        document.add_shape(vecdraw_core::Shape::rect(Rect::new(100.0, 20.0, 160.0, 60.0)));
        let json = format!(
            r#"{{
                "view": {{ "dpi": 25.4 }},
                "document": {},
                "steps": [
                    {{ "type": "action", "code": 1 }},
                    {{ "type": "action", "code": 5 }}
                ]
            }}"#,
            document.to_json().unwrap()
        );

        let outcome = run_script(&Script::from_json(&json).unwrap()).unwrap();
        assert_eq!(outcome.handled, vec![true, true]);
        assert!(outcome.document.is_empty());
        assert!(outcome.selection.is_empty());
    }

    #[test]
    fn test_params_points_replay() {
        let json = r#"{
            "view": { "dpi": 25.4 },
            "steps": [
                { "type": "command", "name": "line", "params": { "points": [0, 0, 80, 0] } }
            ]
        }"#;
        let outcome = run_script(&Script::from_json(json).unwrap()).unwrap();
        assert_eq!(outcome.document.len(), 1);
    }

    #[test]
    fn test_malformed_scripts_are_rejected() {
        assert!(matches!(
            Script::from_json(r#"{"steps": [{"type": "teleport"}]}"#),
            Err(ReplayError::Parse(_))
        ));
        assert!(matches!(
            Script::from_json(r#"{"config": {"hit_test_tol_mm": -1}}"#),
            Err(ReplayError::Config(_))
        ));

        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Script::load(&dir.path().join("missing.json")),
            Err(ReplayError::Io(_))
        ));
    }

    #[test]
    fn test_empty_script_runs() {
        let outcome = run_script(&Script::default()).unwrap();
        assert!(outcome.document.is_empty());
        assert!(outcome.handled.is_empty());
        assert_eq!(outcome.command, "select");
    }
}
