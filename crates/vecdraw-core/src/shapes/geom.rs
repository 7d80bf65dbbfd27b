//! Planar helpers shared by shapes, snapping and the selection command.

use kurbo::{Point, Rect, Vec2};

/// Tolerance below which two coordinates are considered equal.
pub const GEOM_EPSILON: f64 = 1e-7;

/// Nearest point on segment (a→b) and its distance to `point`.
pub fn nearest_on_segment(point: Point, a: Point, b: Point) -> (Point, f64) {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return (a, pv.hypot());
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = a + seg * t;
    (proj, point.distance(proj))
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    nearest_on_segment(point, a, b).1
}

/// Foot of the perpendicular from `point` onto the infinite line through a and b.
pub fn perpendicular_foot(a: Point, b: Point, point: Point) -> Point {
    let seg = b - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return a;
    }
    a + seg * ((point - a).dot(seg) / len_sq)
}

/// Distance from `point` to the infinite line through a and b.
pub fn point_to_line_dist(a: Point, b: Point, point: Point) -> f64 {
    point.distance(perpendicular_foot(a, b, point))
}

/// Signed angle in radians rotating `from` onto `to` (counter-clockwise positive).
pub fn angle_between(from: Vec2, to: Vec2) -> f64 {
    from.cross(to).atan2(from.dot(to))
}

/// Edges of a point list as (start, end) pairs, closing the ring when asked.
pub fn edges(points: &[Point], closed: bool) -> impl Iterator<Item = (Point, Point)> + '_ {
    let n = points.len();
    let count = if closed && n > 2 { n } else { n.saturating_sub(1) };
    (0..count).map(move |i| (points[i], points[(i + 1) % n]))
}

/// Bounding box of a set of points, or a zero rect at the origin if empty.
pub fn bounds_of(points: &[Point]) -> Rect {
    let mut iter = points.iter();
    let Some(first) = iter.next() else {
        return Rect::ZERO;
    };
    iter.fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p))
}

/// Check if a rect has no extent in either axis within `tol`.
pub fn is_empty_extent(rect: Rect, tol: f64) -> bool {
    rect.width() <= tol && rect.height() <= tol
}

/// Check if two rects overlap, touching edges included.
pub fn rects_touch(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

/// Check if `outer` fully contains `inner`.
pub fn rect_contains_rect(outer: Rect, inner: Rect) -> bool {
    inner.x0 >= outer.x0 && inner.x1 <= outer.x1 && inner.y0 >= outer.y0 && inner.y1 <= outer.y1
}

/// Even-odd containment test for a closed polygon.
pub fn polygon_contains(points: &[Point], point: Point) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (pi, pj) = (points[i], points[j]);
        if (pi.y > point.y) != (pj.y > point.y)
            && point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Test if two line segments (a-b) and (c-d) intersect.
pub fn segments_intersect(a: Point, b: Point, c: Point, d: Point) -> bool {
    let cross = |o: Point, p: Point, q: Point| -> f64 {
        (p.x - o.x) * (q.y - o.y) - (p.y - o.y) * (q.x - o.x)
    };
    let d1 = cross(c, d, a);
    let d2 = cross(c, d, b);
    let d3 = cross(a, b, c);
    let d4 = cross(a, b, d);
    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }
    let on_segment = |p: Point, q: Point, r: Point| -> bool {
        r.x >= p.x.min(q.x) && r.x <= p.x.max(q.x) && r.y >= p.y.min(q.y) && r.y <= p.y.max(q.y)
    };
    (d1.abs() < 1e-10 && on_segment(c, d, a))
        || (d2.abs() < 1e-10 && on_segment(c, d, b))
        || (d3.abs() < 1e-10 && on_segment(a, b, c))
        || (d4.abs() < 1e-10 && on_segment(a, b, d))
}

/// Crossing point of segments (a-b) and (c-d), if they properly cross.
pub fn segment_intersection(a: Point, b: Point, c: Point, d: Point) -> Option<Point> {
    let r = b - a;
    let s = d - c;
    let denom = r.cross(s);
    if denom.abs() < GEOM_EPSILON {
        return None;
    }
    let t = (c - a).cross(s) / denom;
    let u = (c - a).cross(r) / denom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(a + r * t)
    } else {
        None
    }
}

/// Test if any edge of a point list touches a rectangle, or a vertex lies inside it.
pub fn edges_touch_rect(points: &[Point], closed: bool, rect: Rect) -> bool {
    if points.iter().any(|p| rect.contains(*p)) {
        return true;
    }
    let corners = rect_corners(rect);
    let rect_edges = [
        (corners[0], corners[1]),
        (corners[1], corners[2]),
        (corners[2], corners[3]),
        (corners[3], corners[0]),
    ];
    for (a, b) in edges(points, closed) {
        for &(c, d) in &rect_edges {
            if segments_intersect(a, b, c, d) {
                return true;
            }
        }
    }
    // A rect fully inside a closed outline touches its area.
    closed && polygon_contains(points, rect.center())
}

/// Corners of a rect, clockwise in y-down space starting at (x0, y0).
pub fn rect_corners(rect: Rect) -> [Point; 4] {
    [
        Point::new(rect.x0, rect.y0),
        Point::new(rect.x1, rect.y0),
        Point::new(rect.x1, rect.y1),
        Point::new(rect.x0, rect.y1),
    ]
}

/// Selection-box handle position: 0..4 corners, 4..8 edge midpoints.
pub fn rect_handle(rect: Rect, index: usize) -> Point {
    let c = rect_corners(rect);
    match index {
        0..=3 => c[index],
        4..=7 => c[index - 4].midpoint(c[(index - 3) % 4]),
        _ => rect.center(),
    }
}

/// Move one selection-box handle to `point`, returning the resulting rect.
pub fn move_rect_handle(rect: Rect, index: usize, point: Point) -> Rect {
    let mut r = rect;
    match index {
        0 => {
            r.x0 = point.x;
            r.y0 = point.y;
        }
        1 => {
            r.x1 = point.x;
            r.y0 = point.y;
        }
        2 => {
            r.x1 = point.x;
            r.y1 = point.y;
        }
        3 => {
            r.x0 = point.x;
            r.y1 = point.y;
        }
        4 => r.y0 = point.y,
        5 => r.x1 = point.x,
        6 => r.y1 = point.y,
        7 => r.x0 = point.x,
        _ => return rect + (point - rect.center()),
    }
    r
}

/// Point `dist` away from `from` along the direction towards `to`, shifted `offset` perpendicular.
pub fn ruler_point(from: Point, to: Point, dist: f64, offset: f64) -> Point {
    let dir = to - from;
    let len = dir.hypot();
    if len < f64::EPSILON {
        return from;
    }
    let u = dir / len;
    let n = Vec2::new(-u.y, u.x);
    from + u * dist + n * offset
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_on_segment() {
        let (p, d) = nearest_on_segment(Point::new(5.0, 3.0), Point::ZERO, Point::new(10.0, 0.0));
        assert!((p.x - 5.0).abs() < f64::EPSILON);
        assert!((d - 3.0).abs() < f64::EPSILON);

        let (p, _) = nearest_on_segment(Point::new(-4.0, 0.0), Point::ZERO, Point::new(10.0, 0.0));
        assert!(p.x.abs() < f64::EPSILON);
    }

    #[test]
    fn test_perpendicular_foot_beyond_segment() {
        let foot = perpendicular_foot(Point::ZERO, Point::new(10.0, 0.0), Point::new(20.0, 5.0));
        assert!((foot.x - 20.0).abs() < 1e-9);
        assert!(foot.y.abs() < 1e-9);
    }

    #[test]
    fn test_angle_between_is_signed() {
        let a = angle_between(Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0));
        assert!((a - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
        let b = angle_between(Vec2::new(0.0, 1.0), Vec2::new(1.0, 0.0));
        assert!((b + std::f64::consts::FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn test_polygon_contains() {
        let square = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        assert!(polygon_contains(&square, Point::new(5.0, 5.0)));
        assert!(!polygon_contains(&square, Point::new(15.0, 5.0)));
    }

    #[test]
    fn test_segment_intersection() {
        let p = segment_intersection(
            Point::new(0.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
            Point::new(10.0, 0.0),
        );
        let p = p.unwrap();
        assert!((p.x - 5.0).abs() < 1e-9 && (p.y - 5.0).abs() < 1e-9);

        assert!(segment_intersection(
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(10.0, 1.0),
        )
        .is_none());
    }

    #[test]
    fn test_edges_touch_rect() {
        let line = [Point::new(-10.0, 5.0), Point::new(20.0, 5.0)];
        assert!(edges_touch_rect(&line, false, Rect::new(0.0, 0.0, 10.0, 10.0)));
        assert!(!edges_touch_rect(&line, false, Rect::new(0.0, 6.0, 10.0, 10.0)));
    }

    #[test]
    fn test_move_rect_handle() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        let moved = move_rect_handle(r, 2, Point::new(20.0, 30.0));
        assert!((moved.x1 - 20.0).abs() < f64::EPSILON);
        assert!((moved.y1 - 30.0).abs() < f64::EPSILON);
        let edge = move_rect_handle(r, 7, Point::new(-5.0, 99.0));
        assert!((edge.x0 + 5.0).abs() < f64::EPSILON);
        assert!((edge.y1 - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bounds_of() {
        let b = bounds_of(&[Point::new(3.0, -1.0), Point::new(-2.0, 4.0)]);
        assert_eq!(b, Rect::new(-2.0, -1.0, 3.0, 4.0));
        assert_eq!(bounds_of(&[]), Rect::ZERO);
    }
}
