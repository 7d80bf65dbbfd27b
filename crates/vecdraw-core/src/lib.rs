//! VecDraw Core Library
//!
//! Gesture-driven command, selection and snapping engine for 2D vector drawing.
//! Hosts feed gestures into a [`CmdManager`] and implement [`ViewHost`] to hear
//! about document changes.

pub mod actions;
pub mod command;
pub mod commands;
pub mod config;
pub mod document;
pub mod host;
pub mod lock;
pub mod manager;
pub mod motion;
pub mod select;
pub mod shapes;
pub mod snap;
pub mod storage;
pub mod transform;

pub use actions::{Action, SelectState};
pub use command::{CmdContext, CmdRequest, Command};
pub use commands::CmdFactory;
pub use config::{ConfigError, EngineConfig};
pub use document::ShapeDocument;
pub use host::{DrawList, GraphicsSink, NullHost, TouchEndedInfo, ViewHost};
pub use lock::{LockError, LockIntent, ShapeLock};
pub use manager::CmdManager;
pub use motion::{GestureState, GestureType, Motion};
pub use select::{CmdSelect, SelectionKind};
pub use shapes::{NO_SHAPE, Shape, ShapeId, ShapeKind};
pub use snap::{SnapEngine, SnapOptions, SnapResult, SnapType};
pub use storage::{CmdParams, ParamStorage, StorageError};
pub use transform::ViewTransform;
