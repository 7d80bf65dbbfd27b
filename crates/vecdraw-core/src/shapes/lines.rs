//! Polyline geometry used by line lists, polygons and splines.

use super::geom::{bounds_of, edges, nearest_on_segment, polygon_contains};
use super::HitResult;
use kurbo::{Affine, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// How a point relates to a polyline, as reported by [`lines_hit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinesHitKind {
    /// Farther than the tolerance from every edge.
    #[default]
    Outside,
    /// On an edge, away from its end vertices.
    OnEdge,
    /// On one of the vertices.
    AtVertex,
}

/// Result of classifying a point against a polyline.
#[derive(Debug, Clone, Copy)]
pub struct LinesHit {
    pub kind: LinesHitKind,
    /// Edge index for `OnEdge`, vertex index for `AtVertex`.
    pub segment: usize,
    pub nearpt: Point,
    pub dist: f64,
}

/// Classify `point` against the polyline within `tol`.
pub fn lines_hit(points: &[Point], closed: bool, point: Point, tol: f64) -> LinesHit {
    let mut hit = LinesHit {
        kind: LinesHitKind::Outside,
        segment: 0,
        nearpt: point,
        dist: f64::INFINITY,
    };
    let n = points.len();
    for (i, (a, b)) in edges(points, closed).enumerate() {
        let (near, dist) = nearest_on_segment(point, a, b);
        if dist < hit.dist {
            hit.dist = dist;
            hit.nearpt = near;
            hit.segment = i;
        }
    }
    if hit.dist > tol || n == 0 {
        return hit;
    }
    let start = hit.segment;
    let end = (hit.segment + 1) % n;
    if point.distance(points[start]) <= tol {
        hit.kind = LinesHitKind::AtVertex;
    } else if point.distance(points[end]) <= tol {
        hit.kind = LinesHitKind::AtVertex;
        hit.segment = end;
    } else {
        hit.kind = LinesHitKind::OnEdge;
    }
    hit
}

/// An ordered point list, optionally closed into a ring.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    pub points: Vec<Point>,
    #[serde(default)]
    pub closed: bool,
}

impl Polyline {
    pub fn new(points: Vec<Point>, closed: bool) -> Self {
        Self { points, closed }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn end_point(&self) -> Point {
        self.points.last().copied().unwrap_or(Point::ZERO)
    }

    /// Index of the last edge start vertex.
    pub fn max_edge_index(&self) -> usize {
        let n = self.points.len();
        if self.closed {
            n.saturating_sub(1)
        } else {
            n.saturating_sub(2)
        }
    }

    /// Grow or shrink to `count` points, repeating the last point when growing.
    pub fn resize(&mut self, count: usize) {
        let fill = self.end_point();
        self.points.resize(count, fill);
    }

    pub fn add_point(&mut self, point: Point) {
        self.points.push(point);
    }

    /// Insert a vertex after the start of edge `segment`.
    pub fn insert_point(&mut self, segment: usize, point: Point) -> bool {
        if segment >= self.points.len() {
            return false;
        }
        self.points.insert(segment + 1, point);
        true
    }

    /// Remove a vertex, keeping at least two points (three when closed).
    pub fn remove_point(&mut self, index: usize) -> bool {
        let min = if self.closed { 3 } else { 2 };
        if index >= self.points.len() || self.points.len() <= min {
            return false;
        }
        self.points.remove(index);
        true
    }

    pub fn extent(&self) -> Rect {
        bounds_of(&self.points)
    }

    pub fn offset(&mut self, delta: Vec2) {
        for p in &mut self.points {
            *p += delta;
        }
    }

    /// Move only the two vertices of edge `segment`.
    pub fn offset_segment(&mut self, segment: usize, delta: Vec2) -> bool {
        let n = self.points.len();
        if segment >= n || (!self.closed && segment + 1 >= n) {
            return false;
        }
        self.points[segment] += delta;
        self.points[(segment + 1) % n] += delta;
        true
    }

    pub fn transform(&mut self, affine: Affine) {
        for p in &mut self.points {
            *p = affine * *p;
        }
    }

    pub fn hit_test(&self, point: Point) -> HitResult {
        let mut res = HitResult::default();
        if self.points.len() == 1 {
            res.dist = point.distance(self.points[0]);
            res.nearpt = self.points[0];
            res.segment = 0;
            return res;
        }
        for (i, (a, b)) in edges(&self.points, self.closed).enumerate() {
            let (near, dist) = nearest_on_segment(point, a, b);
            if dist < res.dist {
                res.dist = dist;
                res.nearpt = near;
                res.segment = i as i32;
            }
        }
        res.inside = self.closed && polygon_contains(&self.points, point);
        res
    }

    /// Reverse the vertex order.
    pub fn reverse(&mut self) {
        self.points.reverse();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zigzag() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
        ]
    }

    #[test]
    fn test_lines_hit_on_edge() {
        let hit = lines_hit(&zigzag(), false, Point::new(50.0, 2.0), 5.0);
        assert_eq!(hit.kind, LinesHitKind::OnEdge);
        assert_eq!(hit.segment, 0);
        assert!((hit.nearpt.x - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_lines_hit_at_vertex() {
        let hit = lines_hit(&zigzag(), false, Point::new(99.0, 1.0), 5.0);
        assert_eq!(hit.kind, LinesHitKind::AtVertex);
        assert_eq!(hit.segment, 1);
    }

    #[test]
    fn test_lines_hit_outside() {
        let hit = lines_hit(&zigzag(), false, Point::new(50.0, 50.0), 5.0);
        assert_eq!(hit.kind, LinesHitKind::Outside);
    }

    #[test]
    fn test_closed_ring_hits_closing_edge() {
        let hit = lines_hit(&zigzag(), true, Point::new(50.0, 50.0), 5.0);
        assert_eq!(hit.kind, LinesHitKind::OnEdge);
        assert_eq!(hit.segment, 2);
    }

    #[test]
    fn test_remove_point_keeps_minimum() {
        let mut lines = Polyline::new(zigzag(), true);
        assert!(!lines.remove_point(0));
        lines.closed = false;
        assert!(lines.remove_point(1));
        assert!(!lines.remove_point(0));
    }

    #[test]
    fn test_insert_point() {
        let mut lines = Polyline::new(zigzag(), false);
        assert!(lines.insert_point(0, Point::new(50.0, 0.0)));
        assert_eq!(lines.len(), 4);
        assert_eq!(lines.points[1], Point::new(50.0, 0.0));
    }

    #[test]
    fn test_max_edge_index() {
        let mut lines = Polyline::new(zigzag(), false);
        assert_eq!(lines.max_edge_index(), 1);
        lines.closed = true;
        assert_eq!(lines.max_edge_index(), 2);
    }
}
