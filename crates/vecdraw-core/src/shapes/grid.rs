//! Grid shape: a framed lattice that other points can snap onto.

use super::rect::{BaseRect, RECT_HANDLE_COUNT};
use super::HandleType;
use kurbo::{Affine, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Bit set in a grid snap result when the X coordinate locked onto a grid line.
pub const GRID_SNAP_X: u8 = 1;
/// Bit set in a grid snap result when the Y coordinate locked onto a grid line.
pub const GRID_SNAP_Y: u8 = 2;

/// A rectangular grid with a fixed cell size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub frame: BaseRect,
    pub cell: Vec2,
}

impl Default for Grid {
    fn default() -> Self {
        Self {
            frame: BaseRect::default(),
            cell: Vec2::new(10.0, 10.0),
        }
    }
}

impl Grid {
    pub fn new(rect: Rect, cell: Vec2) -> Self {
        Self {
            frame: BaseRect::from_rect(rect),
            cell,
        }
    }

    /// Frame handles plus the cell-size handle at the end.
    pub fn handle_count(&self) -> usize {
        RECT_HANDLE_COUNT + 1
    }

    pub fn handle_point(&self, index: usize) -> Point {
        if index == RECT_HANDLE_COUNT {
            self.frame.extent().origin() + self.cell
        } else {
            self.frame.handle_point(index)
        }
    }

    pub fn handle_type(&self, index: usize) -> HandleType {
        if index == RECT_HANDLE_COUNT {
            HandleType::Outside
        } else {
            self.frame.handle_type(index)
        }
    }

    pub fn set_handle_point(&mut self, index: usize, point: Point) -> bool {
        if index == RECT_HANDLE_COUNT {
            let origin = self.frame.extent().origin();
            self.cell = Vec2::new((point.x - origin.x).abs(), (point.y - origin.y).abs());
            true
        } else {
            self.frame.set_handle_point(index, point)
        }
    }

    /// A grid is usable when its cells are at least `min_cell` wide and fit in the frame.
    pub fn is_valid(&self, min_cell: f64) -> bool {
        let ext = self.frame.extent();
        self.cell.x >= min_cell
            && self.cell.y >= min_cell
            && self.cell.x <= ext.width()
            && self.cell.y <= ext.height()
    }

    /// Snap `point` onto the nearest grid lines within `dists`.
    ///
    /// Returns the snapped point, the remaining distances and a mask of
    /// [`GRID_SNAP_X`] / [`GRID_SNAP_Y`].
    pub fn snap(&self, point: Point, dists: Vec2) -> (Point, Vec2, u8) {
        let ext = self.frame.extent();
        let mut result = point;
        let mut out = dists;
        let mut mask = 0;
        if self.cell.x < f64::EPSILON || self.cell.y < f64::EPSILON {
            return (result, out, mask);
        }
        let gx = (ext.x0 + ((point.x - ext.x0) / self.cell.x).round() * self.cell.x)
            .clamp(ext.x0, ext.x1);
        let gy = (ext.y0 + ((point.y - ext.y0) / self.cell.y).round() * self.cell.y)
            .clamp(ext.y0, ext.y1);
        let dx = (gx - point.x).abs();
        let dy = (gy - point.y).abs();
        if dx < out.x {
            result.x = gx;
            out.x = dx;
            mask |= GRID_SNAP_X;
        }
        if dy < out.y {
            result.y = gy;
            out.y = dy;
            mask |= GRID_SNAP_Y;
        }
        (result, out, mask)
    }

    pub fn offset(&mut self, delta: Vec2) {
        self.frame.offset(delta);
    }

    pub fn transform(&mut self, affine: Affine) {
        self.frame.transform(affine);
        let scale = affine.as_coeffs();
        self.cell = Vec2::new(
            (self.cell.x * scale[0]).hypot(self.cell.x * scale[1]),
            (self.cell.y * scale[2]).hypot(self.cell.y * scale[3]),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_both_axes() {
        let grid = Grid::new(Rect::new(0.0, 0.0, 100.0, 100.0), Vec2::new(10.0, 10.0));
        let (p, _, mask) = grid.snap(Point::new(21.0, 38.5), Vec2::new(2.0, 2.0));
        assert_eq!(mask, GRID_SNAP_X | GRID_SNAP_Y);
        assert!((p.x - 20.0).abs() < f64::EPSILON);
        assert!((p.y - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_snap_only_within_tolerance() {
        let grid = Grid::new(Rect::new(0.0, 0.0, 100.0, 100.0), Vec2::new(10.0, 10.0));
        let (p, _, mask) = grid.snap(Point::new(25.0, 31.0), Vec2::new(2.0, 2.0));
        assert_eq!(mask, GRID_SNAP_Y);
        assert!((p.x - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_cell_handle() {
        let mut grid = Grid::new(Rect::new(0.0, 0.0, 100.0, 100.0), Vec2::new(10.0, 10.0));
        grid.set_handle_point(RECT_HANDLE_COUNT, Point::new(25.0, 20.0));
        assert!((grid.cell.x - 25.0).abs() < f64::EPSILON);
        assert!(grid.is_valid(1.0));
        grid.set_handle_point(RECT_HANDLE_COUNT, Point::new(0.5, 0.5));
        assert!(!grid.is_valid(1.0));
    }
}
