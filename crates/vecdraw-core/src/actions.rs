//! Context actions offered around a selection or while drawing.

use crate::command::CmdContext;
use crate::shapes::{Shape, ShapeKind};
use kurbo::Rect;
use serde::{Deserialize, Serialize};

/// First code available to host-defined actions.
pub const CUSTOMIZED_ACTION: u32 = 100;

/// A context action code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    SelAll,
    SelReset,
    Draw,
    Cancel,
    Delete,
    Clone,
    FixedLength,
    FreeLength,
    Locked,
    Unlocked,
    EditVertex,
    HideVertex,
    Closed,
    Opened,
    AddVertex,
    DelVertex,
    Group,
    Ungroup,
    Overturn,
    /// Host-defined, code at or above [`CUSTOMIZED_ACTION`].
    Customized(u32),
}

impl Action {
    pub fn code(self) -> u32 {
        match self {
            Action::SelAll => 1,
            Action::SelReset => 2,
            Action::Draw => 3,
            Action::Cancel => 4,
            Action::Delete => 5,
            Action::Clone => 6,
            Action::FixedLength => 7,
            Action::FreeLength => 8,
            Action::Locked => 9,
            Action::Unlocked => 10,
            Action::EditVertex => 11,
            Action::HideVertex => 12,
            Action::Closed => 13,
            Action::Opened => 14,
            Action::AddVertex => 15,
            Action::DelVertex => 16,
            Action::Group => 17,
            Action::Ungroup => 18,
            Action::Overturn => 19,
            Action::Customized(code) => code,
        }
    }

    /// Decode an action code; 0 and the unassigned gap below 100 are invalid.
    pub fn from_code(code: u32) -> Option<Self> {
        let action = match code {
            1 => Action::SelAll,
            2 => Action::SelReset,
            3 => Action::Draw,
            4 => Action::Cancel,
            5 => Action::Delete,
            6 => Action::Clone,
            7 => Action::FixedLength,
            8 => Action::FreeLength,
            9 => Action::Locked,
            10 => Action::Unlocked,
            11 => Action::EditVertex,
            12 => Action::HideVertex,
            13 => Action::Closed,
            14 => Action::Opened,
            15 => Action::AddVertex,
            16 => Action::DelVertex,
            17 => Action::Group,
            18 => Action::Ungroup,
            19 => Action::Overturn,
            c if c >= CUSTOMIZED_ACTION => Action::Customized(c),
            _ => return None,
        };
        Some(action)
    }
}

/// What the select command currently has selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SelectState {
    #[default]
    None,
    One,
    Multi,
    /// Editing the vertices of one shape.
    Vertexes,
    /// One vertex of the edited shape is active.
    Vertex,
    /// Inside a drawing command.
    Draw,
}

/// Actions that apply to `shape` in `state`, in menu order.
pub fn actions_for(state: SelectState, shape: Option<&Shape>) -> Vec<Action> {
    let mut actions = Vec::new();
    let locked = shape.is_some_and(|s| s.flags.locked);
    let fixed_length = shape.is_some_and(|s| s.flags.fixed_length);
    let length_action = if fixed_length {
        Action::FreeLength
    } else {
        Action::FixedLength
    };
    let is_line = shape.is_some_and(|s| s.kind() == ShapeKind::Line);

    match state {
        SelectState::None | SelectState::Draw => {}
        SelectState::Multi | SelectState::One => {
            if state == SelectState::Multi && shape.is_some() {
                actions.push(Action::Group);
            }
            if let Some(shape) = shape {
                if !locked {
                    actions.push(Action::Delete);
                }
                actions.push(Action::Clone);
                if !locked && matches!(shape.kind(), ShapeKind::Image | ShapeKind::Line) {
                    actions.push(length_action);
                }
                actions.push(if locked { Action::Unlocked } else { Action::Locked });
            }
            if state == SelectState::One && !locked {
                actions.push(Action::EditVertex);
            }
            let can_overturn = shape.is_some_and(|s| {
                !s.flags.rotate_disabled
                    && !s.flags.locked
                    && (s.is_rect_family() || s.is_base_lines() || s.kind() == ShapeKind::Group)
            });
            if state == SelectState::One && can_overturn {
                actions.push(Action::Overturn);
            }
        }
        SelectState::Vertexes | SelectState::Vertex => {
            if let Some(shape) = shape.filter(|s| s.is_base_lines() && !locked) {
                if state == SelectState::Vertexes {
                    actions.push(Action::AddVertex);
                    actions.push(if shape.is_closed() {
                        Action::Opened
                    } else {
                        Action::Closed
                    });
                } else if shape.point_count() > 3 {
                    actions.push(Action::DelVertex);
                }
            }
            if !locked && is_line {
                actions.push(length_action);
            }
            actions.push(Action::HideVertex);
        }
    }
    actions
}

/// Offer the actions for a selection; returns whether the host showed a menu.
pub fn show_in_select(ctx: &CmdContext<'_>, state: SelectState, shape: Option<&Shape>, selbox: Rect) -> bool {
    let mut actions = actions_for(state, shape);
    if let Some(shape) = shape {
        let has_state = !matches!(state, SelectState::None | SelectState::Draw);
        if has_state && shape.kind() == ShapeKind::Group && ctx.host.shape_can_ungroup(shape) {
            actions.push(Action::Ungroup);
        }
    }
    let model_box = if selbox.is_zero_area() {
        Rect::from_points(ctx.motion.point_m, ctx.motion.point_m)
    } else {
        ctx.host.redraw();
        selbox
    };
    let display_box = ctx.view.rect_to_display(model_box);
    ctx.host
        .show_context_actions(state, &actions, display_box, shape.map(Shape::id))
}

/// Offer the drawing-state actions at the current point.
pub fn show_in_drawing(ctx: &CmdContext<'_>) -> bool {
    show_in_select(ctx, SelectState::Draw, None, Rect::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    #[test]
    fn test_codes_round_trip_through_decoding() {
        assert_eq!(Action::from_code(5), Some(Action::Delete));
        assert_eq!(Action::Overturn.code(), 19);
        assert_eq!(Action::from_code(0), None);
        assert_eq!(Action::from_code(42), None);
        assert_eq!(Action::from_code(120), Some(Action::Customized(120)));
    }

    #[test]
    fn test_one_shape_actions() {
        let line = Shape::line(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        let actions = actions_for(SelectState::One, Some(&line));
        assert_eq!(
            actions,
            vec![
                Action::Delete,
                Action::Clone,
                Action::FixedLength,
                Action::Locked,
                Action::EditVertex
            ]
        );
    }

    #[test]
    fn test_locked_shape_offers_unlock_only() {
        let mut rect = Shape::rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        rect.flags.locked = true;
        let actions = actions_for(SelectState::One, Some(&rect));
        assert_eq!(actions, vec![Action::Clone, Action::Unlocked]);
    }

    #[test]
    fn test_multi_starts_with_group() {
        let rect = Shape::rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        let actions = actions_for(SelectState::Multi, Some(&rect));
        assert_eq!(actions.first(), Some(&Action::Group));
        assert!(!actions.contains(&Action::EditVertex));
    }

    #[test]
    fn test_vertex_actions() {
        let lines = Shape::lines(
            vec![
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(10.0, 10.0),
                Point::new(0.0, 10.0),
            ],
            false,
        );
        assert_eq!(
            actions_for(SelectState::Vertex, Some(&lines)),
            vec![Action::DelVertex, Action::HideVertex]
        );
        assert_eq!(
            actions_for(SelectState::Vertexes, Some(&lines)),
            vec![Action::AddVertex, Action::Closed, Action::HideVertex]
        );
        assert!(actions_for(SelectState::Draw, None).is_empty());
    }
}
