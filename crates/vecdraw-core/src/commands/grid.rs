//! Grid command: drag the frame, then drag the cell-size handle.

use super::rect::CmdDrawRect;
use crate::command::{CmdContext, Command};
use crate::host::{GraphicsSink, GuideStyle};
use crate::shapes::{Geometry, RECT_HANDLE_COUNT, Shape, ShapeId};
use crate::storage::CmdParams;
use kurbo::{Rect, Vec2};
use peniko::Color;

/// Index of the cell-size handle of a grid shape.
const CELL_HANDLE: usize = RECT_HANDLE_COUNT;
/// Cells smaller than this cannot be committed.
const MIN_CELL_MM: f64 = 1.0;

const CELL_HANDLE_COLOR: Color = Color::from_rgba8(0, 120, 215, 255);

#[derive(Debug, Clone)]
pub struct CmdDrawGrid {
    rect: CmdDrawRect,
    /// Cell size restored when a handle drag produces an unusable grid.
    default_cell: Vec2,
}

impl Default for CmdDrawGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl CmdDrawGrid {
    pub fn new() -> Self {
        let default_cell = Vec2::new(10.0, 10.0);
        Self {
            rect: CmdDrawRect::with_shape("grid", Shape::grid(Rect::ZERO, default_cell)),
            default_cell,
        }
    }

    pub fn step(&self) -> usize {
        self.rect.core.step
    }

    fn cell(&self) -> Vec2 {
        match &self.rect.core.shape.geometry {
            Geometry::Grid(g) => g.cell,
            _ => self.default_cell,
        }
    }

    fn set_cell(&mut self, cell: Vec2) {
        if let Geometry::Grid(g) = &mut self.rect.core.shape.geometry {
            g.cell = cell;
        }
    }

    fn is_valid(&self, ctx: &CmdContext<'_>) -> bool {
        match &self.rect.core.shape.geometry {
            Geometry::Grid(g) => g.is_valid(ctx.mm(MIN_CELL_MM)),
            _ => false,
        }
    }

    fn drag_cell_handle(&mut self, ctx: &mut CmdContext<'_>) {
        let pnt = self.rect.core.snap(ctx, CELL_HANDLE as i32);
        self.rect.core.shape.set_handle_point(CELL_HANDLE, pnt);
    }
}

impl Command for CmdDrawGrid {
    fn name(&self) -> &str {
        "grid"
    }

    fn initialize(&mut self, ctx: &mut CmdContext<'_>, params: Option<&CmdParams>, _selected: &[ShapeId]) -> bool {
        self.rect.core.initialize(ctx, params);
        self.set_cell(self.default_cell);
        true
    }

    fn cancel(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        let cancelled = self.rect.cancel(ctx);
        self.set_cell(self.default_cell);
        cancelled
    }

    fn back_step(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        self.rect.back_step(ctx)
    }

    fn draw(&self, ctx: &CmdContext<'_>, sink: &mut dyn GraphicsSink) -> bool {
        if self.step() == 2 {
            let style = GuideStyle::solid(CELL_HANDLE_COLOR, ctx.mm(0.3));
            sink.draw_circle(self.rect.core.shape.handle_point(CELL_HANDLE), ctx.mm(1.5), &style);
        }
        self.rect.draw(ctx, sink)
    }

    fn gather_shapes(&self, out: &mut Vec<Shape>) -> bool {
        self.rect.gather_shapes(out)
    }

    fn click(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        self.rect.click(ctx)
    }

    fn touch_began(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        if self.step() == 0 {
            return self.rect.touch_began(ctx);
        }
        self.rect.core.step = 3;
        true
    }

    fn touch_moved(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        match self.step() {
            0 => false,
            1 => self.rect.touch_moved(ctx),
            _ => {
                self.drag_cell_handle(ctx);
                true
            }
        }
    }

    fn touch_ended(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        match self.step() {
            0 => return false,
            1 => {
                // An acceptable frame waits for the cell size instead of committing.
                if self.rect.finish_drag(ctx) == Some(true) {
                    self.rect.core.step = 2;
                    ctx.host.redraw();
                }
                return true;
            }
            _ => self.drag_cell_handle(ctx),
        }
        if self.is_valid(ctx) {
            if let Some(id) = self.rect.core.commit(ctx) {
                ctx.to_select(vec![id]);
            }
            self.set_cell(self.default_cell);
        } else {
            log::debug!("Grid cell {:?} rejected", self.cell());
            self.set_cell(self.default_cell);
            self.rect.core.step = 2;
        }
        true
    }

    fn is_drawing_command(&self) -> bool {
        true
    }
}
