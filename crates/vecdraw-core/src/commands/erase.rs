//! Eraser: tap a shape to delete it, or drag a box to delete everything it catches.

use crate::actions::SelectState;
use crate::command::{CmdContext, Command};
use crate::host::{GraphicsSink, GuideStyle};
use crate::shapes::{SerializableColor, ShapeId};
use crate::storage::CmdParams;
use kurbo::Rect;
use peniko::Color;

const BOX_COLOR: Color = Color::from_rgba8(0, 0, 255, 80);

/// Floating command that removes shapes.
///
/// While a box drag is in progress the shapes it would delete are previewed;
/// nothing is removed until the drag ends.
#[derive(Debug, Clone, Default)]
pub struct CmdErase {
    box_sel: bool,
    pending: Vec<ShapeId>,
}

impl CmdErase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shapes the current box drag would delete.
    pub fn pending(&self) -> &[ShapeId] {
        &self.pending
    }

    fn drag_box(ctx: &CmdContext<'_>) -> Rect {
        Rect::from_points(ctx.motion.start_pt_m, ctx.motion.point_m)
    }

    fn collect_pending(&mut self, ctx: &CmdContext<'_>) {
        self.pending.clear();
        let rect = Self::drag_box(ctx);
        let doc = match ctx.doc.read() {
            Ok(doc) => doc,
            Err(err) => {
                log::debug!("Erase preview skipped: {}", err);
                return;
            }
        };
        self.pending = doc
            .shapes_in_rect(rect, ctx.config.erase_box_intersect)
            .into_iter()
            .filter(|id| doc.find_shape(*id).is_some_and(|s| !s.flags.locked))
            .collect();
    }
}

impl Command for CmdErase {
    fn name(&self) -> &str {
        "erase"
    }

    fn initialize(&mut self, _ctx: &mut CmdContext<'_>, _params: Option<&CmdParams>, _selected: &[ShapeId]) -> bool {
        self.box_sel = false;
        self.pending.clear();
        true
    }

    fn cancel(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        let had_state = self.box_sel || !self.pending.is_empty();
        self.box_sel = false;
        self.pending.clear();
        if had_state {
            ctx.host.redraw();
        }
        had_state
    }

    fn back_step(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        if self.pending.pop().is_some() {
            ctx.host.redraw();
            return true;
        }
        std::mem::replace(&mut self.box_sel, false)
    }

    fn draw(&self, ctx: &CmdContext<'_>, sink: &mut dyn GraphicsSink) -> bool {
        if self.box_sel {
            let width = ctx.mm(0.2);
            let style = if ctx.config.erase_box_intersect {
                GuideStyle::dashed(BOX_COLOR, width)
            } else {
                GuideStyle::solid(BOX_COLOR, width)
            };
            sink.draw_rect(Self::drag_box(ctx), &style);
        }
        if let Ok(doc) = ctx.doc.read() {
            for shape in self.pending.iter().filter_map(|id| doc.find_shape(*id)) {
                let mut faded = shape.clone();
                faded.style.stroke_color = SerializableColor::new(64, 64, 64, 128);
                sink.draw_shape(&faded);
            }
        }
        true
    }

    fn click(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        let point = ctx.motion.start_pt_m;
        if let Some((id, _)) = ctx.hit_test(point, ctx.config.hit_test_tol_mm) {
            let count = ctx.delete_shapes(&[id]);
            if count > 0 {
                log::info!("Erased shape {}", id);
            }
        }
        true
    }

    fn long_press(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        let at = ctx.motion.point;
        ctx.host
            .show_context_actions(SelectState::None, &[], Rect::from_points(at, at), None)
    }

    fn touch_began(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        self.box_sel = true;
        self.pending.clear();
        ctx.host.redraw();
        true
    }

    fn touch_moved(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        if self.box_sel {
            self.collect_pending(ctx);
        } else {
            self.pending.clear();
        }
        ctx.host.redraw();
        true
    }

    fn touch_ended(&mut self, ctx: &mut CmdContext<'_>) -> bool {
        let ids = std::mem::take(&mut self.pending);
        if !ids.is_empty() {
            let count = ctx.delete_shapes(&ids);
            log::info!("Erased {} shapes", count);
        }
        self.box_sel = false;
        ctx.host.redraw();
        true
    }

    fn is_floating_command(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::Fixture;
    use crate::shapes::Shape;
    use kurbo::Point;

    fn three_shapes(fx: &mut Fixture) -> (ShapeId, ShapeId, ShapeId) {
        let a = fx.add(Shape::rect(Rect::new(10.0, 10.0, 20.0, 20.0)));
        let b = fx.add(Shape::line(Point::new(30.0, 30.0), Point::new(40.0, 35.0)));
        let c = fx.add(Shape::rect(Rect::new(80.0, 80.0, 150.0, 150.0)));
        (a, b, c)
    }

    #[test]
    fn test_tap_erases_hit_shape() {
        let mut fx = Fixture::new();
        let (a, _, _) = three_shapes(&mut fx);
        let mut cmd = CmdErase::new();
        assert!(fx.tap(&mut cmd, 10.0, 15.0));
        let ids: Vec<_> = fx.shapes().iter().map(|s| s.id()).collect();
        assert!(!ids.contains(&a));
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn test_box_erase_intersect_mode() {
        let mut fx = Fixture::new();
        three_shapes(&mut fx);
        let mut cmd = CmdErase::new();
        fx.began(&mut cmd, 0.0, 0.0);
        fx.moved(&mut cmd, 100.0, 100.0);
        assert_eq!(cmd.pending().len(), 3);
        assert_eq!(fx.shapes().len(), 3);
        fx.ended(&mut cmd, 100.0, 100.0);
        assert!(fx.shapes().is_empty());
        assert!(!cmd.cancel(&mut fx.ctx()));
    }

    #[test]
    fn test_box_erase_contains_mode() {
        let mut fx = Fixture::new();
        fx.config.erase_box_intersect = false;
        let (_, _, c) = three_shapes(&mut fx);
        let mut cmd = CmdErase::new();
        fx.drag(&mut cmd, (0.0, 0.0), (100.0, 100.0));
        let ids: Vec<_> = fx.shapes().iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec![c]);
    }

    #[test]
    fn test_locked_shapes_survive() {
        let mut fx = Fixture::new();
        let mut locked = Shape::rect(Rect::new(10.0, 10.0, 20.0, 20.0));
        locked.flags.locked = true;
        fx.add(locked);
        let mut cmd = CmdErase::new();
        fx.drag(&mut cmd, (0.0, 0.0), (50.0, 50.0));
        assert_eq!(fx.shapes().len(), 1);
    }

    #[test]
    fn test_back_step_unmarks_pending() {
        let mut fx = Fixture::new();
        three_shapes(&mut fx);
        let mut cmd = CmdErase::new();
        fx.began(&mut cmd, 0.0, 0.0);
        fx.moved(&mut cmd, 50.0, 50.0);
        assert_eq!(cmd.pending().len(), 2);
        assert!(cmd.back_step(&mut fx.ctx()));
        assert_eq!(cmd.pending().len(), 1);
        assert!(cmd.cancel(&mut fx.ctx()));
        assert!(cmd.pending().is_empty());
    }
}
