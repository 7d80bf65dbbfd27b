//! Built-in commands and their default registry.

pub mod draw;
pub mod erase;
pub mod grid;
pub mod line;
pub mod lines;
pub mod rect;
pub mod splines;

pub use draw::{DrawCore, MIN_STEP_MM, replay_points};
pub use erase::CmdErase;
pub use grid::CmdDrawGrid;
pub use line::{CmdDrawDot, CmdDrawLine};
pub use lines::{CmdDrawLines, CmdDrawTriangle, DEFAULT_MAX_EDGES};
pub use rect::CmdDrawRect;
pub use splines::CmdDrawSplines;

use crate::command::Command;
use crate::select::CmdSelect;

/// Creates a fresh command instance.
pub type CmdFactory = fn() -> Box<dyn Command>;

/// Name and factory of every command a new manager knows.
pub fn default_factories() -> Vec<(&'static str, CmdFactory)> {
    vec![
        ("select", || -> Box<dyn Command> { Box::new(CmdSelect::new()) }),
        ("erase", || -> Box<dyn Command> { Box::new(CmdErase::new()) }),
        ("rect", || -> Box<dyn Command> { Box::new(CmdDrawRect::rect()) }),
        ("square", || -> Box<dyn Command> { Box::new(CmdDrawRect::square()) }),
        ("ellipse", || -> Box<dyn Command> { Box::new(CmdDrawRect::ellipse()) }),
        ("circle", || -> Box<dyn Command> { Box::new(CmdDrawRect::circle()) }),
        ("line", || -> Box<dyn Command> { Box::new(CmdDrawLine::new()) }),
        ("dot", || -> Box<dyn Command> { Box::new(CmdDrawDot::new()) }),
        ("lines", || -> Box<dyn Command> { Box::new(CmdDrawLines::lines()) }),
        ("polygon", || -> Box<dyn Command> { Box::new(CmdDrawLines::polygon()) }),
        ("quadrangle", || -> Box<dyn Command> { Box::new(CmdDrawLines::quadrangle()) }),
        ("triangle", || -> Box<dyn Command> { Box::new(CmdDrawTriangle::new()) }),
        ("splines", || -> Box<dyn Command> { Box::new(CmdDrawSplines::freehand()) }),
        ("spline_mouse", || -> Box<dyn Command> { Box::new(CmdDrawSplines::by_clicks()) }),
        ("grid", || -> Box<dyn Command> { Box::new(CmdDrawGrid::new()) }),
    ]
}
