//! Rectangle frame shared by rectangles, ellipses, images and grids.

use super::geom::{bounds_of, nearest_on_segment, polygon_contains};
use super::{HandleType, HitResult};
use kurbo::{Affine, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Number of handles on a rectangle frame: 4 corners, 4 edge midpoints, center.
pub const RECT_HANDLE_COUNT: usize = 9;

/// A (possibly rotated) rectangle stored as its four corners.
///
/// Corners run 0→1→2→3 around the frame; edge `i` joins corner `i` and `i + 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseRect {
    pub corners: [Point; 4],
    /// Keep width and height equal while editing.
    #[serde(default)]
    pub square: bool,
}

impl Default for BaseRect {
    fn default() -> Self {
        Self {
            corners: [Point::ZERO; 4],
            square: false,
        }
    }
}

impl BaseRect {
    /// Create an axis-aligned frame from a rect.
    pub fn from_rect(rect: Rect) -> Self {
        let mut frame = Self::default();
        frame.set_rect(rect);
        frame
    }

    /// Create a square frame.
    pub fn square() -> Self {
        Self {
            square: true,
            ..Self::default()
        }
    }

    fn set_rect(&mut self, rect: Rect) {
        let r = rect.abs();
        self.corners = [
            Point::new(r.x0, r.y0),
            Point::new(r.x1, r.y0),
            Point::new(r.x1, r.y1),
            Point::new(r.x0, r.y1),
        ];
    }

    /// Reset to an axis-aligned frame spanning two opposite points.
    ///
    /// In square mode the side is the larger of the two spans, grown away from `p1`.
    pub fn set_rect_2p(&mut self, p1: Point, p2: Point) {
        let mut p2 = p2;
        if self.square {
            let side = (p2.x - p1.x).abs().max((p2.y - p1.y).abs());
            p2 = Point::new(
                p1.x + side.copysign(p2.x - p1.x),
                p1.y + side.copysign(p2.y - p1.y),
            );
        }
        self.set_rect(Rect::from_points(p1, p2));
    }

    pub fn width(&self) -> f64 {
        self.corners[0].distance(self.corners[1])
    }

    pub fn height(&self) -> f64 {
        self.corners[0].distance(self.corners[3])
    }

    pub fn center(&self) -> Point {
        self.corners[0].midpoint(self.corners[2])
    }

    pub fn extent(&self) -> Rect {
        bounds_of(&self.corners)
    }

    pub fn is_empty(&self, tol: f64) -> bool {
        self.width() <= tol || self.height() <= tol
    }

    /// Local unit axes (along edge 0 and edge 3).
    fn axes(&self) -> (Vec2, Vec2) {
        let u = self.corners[1] - self.corners[0];
        let v = self.corners[3] - self.corners[0];
        let u = if u.hypot() > f64::EPSILON {
            u / u.hypot()
        } else if v.hypot() > f64::EPSILON {
            let vn = v / v.hypot();
            Vec2::new(-vn.y, vn.x)
        } else {
            Vec2::new(1.0, 0.0)
        };
        (u, Vec2::new(-u.y, u.x))
    }

    /// The frame in its own axis-aligned coordinates (origin at corner 0).
    fn local_rect(&self) -> (Rect, Vec2, Vec2) {
        let (u, v) = self.axes();
        let o = self.corners[0];
        let local: Vec<Point> = self
            .corners
            .iter()
            .map(|p| Point::new((*p - o).dot(u), (*p - o).dot(v)))
            .collect();
        (bounds_of(&local), u, v)
    }

    fn set_local_rect(&mut self, rect: Rect, origin: Point, u: Vec2, v: Vec2) {
        let r = rect.abs();
        let to_model = |x: f64, y: f64| origin + u * x + v * y;
        self.corners = [
            to_model(r.x0, r.y0),
            to_model(r.x1, r.y0),
            to_model(r.x1, r.y1),
            to_model(r.x0, r.y1),
        ];
    }

    pub fn handle_point(&self, index: usize) -> Point {
        match index {
            0..=3 => self.corners[index],
            4..=7 => self.corners[index - 4].midpoint(self.corners[(index - 3) % 4]),
            _ => self.center(),
        }
    }

    pub fn handle_type(&self, index: usize) -> HandleType {
        match index {
            0..=3 => HandleType::Vertex,
            4..=7 => HandleType::MidPoint,
            _ => HandleType::Center,
        }
    }

    /// Drag a handle to `point`, keeping the frame rectangular.
    pub fn set_handle_point(&mut self, index: usize, point: Point) -> bool {
        if index >= RECT_HANDLE_COUNT - 1 {
            let delta = point - self.center();
            self.offset(delta);
            return true;
        }
        let origin = self.corners[0];
        let (mut r, u, v) = self.local_rect();
        let local = Point::new((point - origin).dot(u), (point - origin).dot(v));
        let c = [
            Point::new(r.x0, r.y0),
            Point::new(r.x1, r.y0),
            Point::new(r.x1, r.y1),
            Point::new(r.x0, r.y1),
        ];
        match index {
            0..=3 => {
                let opposite = c[(index + 2) % 4];
                let mut moved = local;
                if self.square {
                    let side = (moved.x - opposite.x).abs().max((moved.y - opposite.y).abs());
                    moved = Point::new(
                        opposite.x + side.copysign(moved.x - opposite.x),
                        opposite.y + side.copysign(moved.y - opposite.y),
                    );
                }
                r = Rect::from_points(opposite, moved);
            }
            _ => {
                match index {
                    4 => r.y0 = local.y,
                    5 => r.x1 = local.x,
                    6 => r.y1 = local.y,
                    _ => r.x0 = local.x,
                }
                if self.square {
                    let cen = r.center();
                    let side = if index % 2 == 0 { r.height().abs() } else { r.width().abs() };
                    r = Rect::from_center_size(cen, (side, side));
                }
            }
        }
        self.set_local_rect(r, origin, u, v);
        true
    }

    pub fn offset(&mut self, delta: Vec2) {
        for p in &mut self.corners {
            *p += delta;
        }
    }

    pub fn transform(&mut self, affine: Affine) {
        for p in &mut self.corners {
            *p = affine * *p;
        }
    }

    /// Hit test against the frame outline.
    pub fn hit_test(&self, point: Point) -> HitResult {
        let mut res = HitResult::default();
        for i in 0..4 {
            let (near, dist) = nearest_on_segment(point, self.corners[i], self.corners[(i + 1) % 4]);
            if dist < res.dist {
                res.dist = dist;
                res.nearpt = near;
                res.segment = i as i32;
            }
        }
        res.inside = polygon_contains(&self.corners, point);
        res
    }
}
