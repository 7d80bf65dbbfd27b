//! Secondary snap features: intersections, perpendicular feet, tangents,
//! extensions and parallels. They only run when no handle snap was found.

use super::{GUIDE_PENALTY_MM, PARALLEL_MAX_ANGLE_DEG, PARALLEL_MIN_LEN_MM, PointTrack, Search, SnapOptions, SnapType};
use crate::shapes::geom::{GEOM_EPSILON, edges, perpendicular_foot, point_to_line_dist, point_to_segment_dist, segment_intersection};
use crate::shapes::{Geometry, NO_SHAPE, Shape, ShapeId};
use kurbo::{Point, Vec2};

type Edge = (ShapeId, Point, Point);

/// Straight edges of a shape, with the owning shape id.
fn straight_edges(shape: &Shape, id: ShapeId, out: &mut Vec<Edge>) {
    match &shape.geometry {
        Geometry::Line { start, end } => out.push((id, *start, *end)),
        Geometry::Rect(f) | Geometry::Image { frame: f, .. } => {
            out.extend(edges(&f.corners, true).map(|(a, b)| (id, a, b)));
        }
        Geometry::Grid(g) => out.extend(edges(&g.frame.corners, true).map(|(a, b)| (id, a, b))),
        Geometry::Lines(p) => out.extend(edges(&p.points, p.closed).map(|(a, b)| (id, a, b))),
        Geometry::Group { children } => {
            for child in children {
                straight_edges(child, id, out);
            }
        }
        Geometry::Ellipse(_) | Geometry::Splines(_) | Geometry::Dot { .. } => {}
    }
}

fn collect_edges(shapes: &[&Shape]) -> Vec<Edge> {
    let mut out = Vec::new();
    for shape in shapes {
        straight_edges(shape, shape.id(), &mut out);
    }
    out
}

impl Search {
    fn take(&mut self, snap_type: SnapType, base: Point, pt: Point, shape: ShapeId, penalty: f64) -> bool {
        let dist = pt.distance(self.org);
        if !self.arr0.accepts(dist, penalty) {
            return false;
        }
        self.arr0 = PointTrack {
            score: dist + penalty,
            snap_type,
            base,
            pt,
            matchpt: None,
            shape,
            handle: -1,
            dragged_handle: -1,
            ..self.arr0
        };
        true
    }

    fn snap_intersections(&mut self, near_edges: &[Edge]) {
        for (i, &(id, a, b)) in near_edges.iter().enumerate() {
            for &(other, c, d) in &near_edges[i + 1..] {
                if let Some(p) = segment_intersection(a, b, c, d) {
                    self.take(SnapType::Intersect, self.org, p, if id == other { id } else { NO_SHAPE }, 0.0);
                }
            }
        }
    }

    fn snap_perpendicular(&mut self, base: Point, near_edges: &[Edge]) {
        let allow_out = self.options.contains(SnapOptions::PERP_OUT);
        for &(id, a, b) in near_edges {
            if point_to_line_dist(a, b, base) < GEOM_EPSILON {
                continue;
            }
            let foot = perpendicular_foot(a, b, base);
            let on_segment = point_to_segment_dist(foot, a, b) < GEOM_EPSILON;
            if on_segment {
                self.take(SnapType::Perp, base, foot, id, 0.0);
            } else if allow_out {
                self.take(SnapType::PerpNear, base, foot, id, 0.0);
            }
        }
    }

    fn snap_tangent(&mut self, base: Point, shapes: &[&Shape]) {
        for shape in shapes {
            let Geometry::Ellipse(frame) = &shape.geometry else {
                continue;
            };
            if (frame.width() - frame.height()).abs() > GEOM_EPSILON {
                continue;
            }
            let center = frame.center();
            let radius = frame.width() / 2.0;
            let dist = base.distance(center);
            if radius < GEOM_EPSILON || dist <= radius {
                continue;
            }
            let dir = (base - center) / dist;
            let alpha = (radius / dist).acos();
            for sign in [1.0, -1.0] {
                let (sin, cos) = (sign * alpha).sin_cos();
                let rotated = Vec2::new(dir.x * cos - dir.y * sin, dir.x * sin + dir.y * cos);
                self.take(SnapType::Tangent, base, center + rotated * radius, shape.id(), 0.0);
            }
        }
    }

    /// Continue an open line or polyline past either end.
    fn snap_extend(&mut self, shapes: &[&Shape]) {
        let penalty = self.mm * GUIDE_PENALTY_MM;
        for shape in shapes {
            let points = match &shape.geometry {
                Geometry::Line { start, end } => vec![*start, *end],
                Geometry::Lines(p) if !p.closed => p.points.clone(),
                _ => continue,
            };
            let n = points.len();
            if n < 2 {
                continue;
            }
            for (end, prev) in [(points[n - 1], points[n - 2]), (points[0], points[1])] {
                let len = end.distance(prev);
                if len < GEOM_EPSILON {
                    continue;
                }
                let dir = (end - prev) / len;
                let t = (self.org - end).dot(dir);
                if t > 0.0 {
                    self.take(SnapType::ExtendPt, end, end + dir * t, shape.id(), penalty);
                }
            }
        }
    }

    fn snap_parallel(&mut self, base: Point, all_edges: &[Edge]) {
        let drawn = self.org - base;
        if drawn.hypot() < GEOM_EPSILON {
            return;
        }
        let penalty = self.mm * GUIDE_PENALTY_MM;
        let min_len = self.mm * PARALLEL_MIN_LEN_MM;
        let max_angle = PARALLEL_MAX_ANGLE_DEG.to_radians();
        for &(id, a, b) in all_edges {
            let edge = b - a;
            let len = edge.hypot();
            if len < min_len || point_to_line_dist(a, b, base) < GEOM_EPSILON {
                continue;
            }
            let angle = drawn.cross(edge).abs().atan2(drawn.dot(edge).abs());
            if angle > max_angle {
                continue;
            }
            let unit = edge / len;
            let pt = base + unit * drawn.dot(unit);
            self.take(SnapType::Parallel, a.midpoint(b), pt, id, penalty);
        }
    }
}

/// Run the enabled feature snaps over shapes near the point and in view.
pub(super) fn snap_features(search: &mut Search, nearby: &[&Shape], visible: &[&Shape]) {
    let options = search.options;
    let tol = search.arr0.tol;
    let org = search.org;
    let near_edges: Vec<Edge> = collect_edges(nearby)
        .into_iter()
        .filter(|&(_, a, b)| point_to_segment_dist(org, a, b) < tol)
        .collect();

    if options.contains(SnapOptions::CROSS) {
        search.snap_intersections(&near_edges);
    }
    if let Some(base) = search.base_point {
        if options.contains(SnapOptions::PERP) {
            let line_edges: Vec<Edge> = collect_edges(nearby)
                .into_iter()
                .filter(|&(_, a, b)| point_to_line_dist(a, b, org) < tol)
                .collect();
            search.snap_perpendicular(base, &line_edges);
        }
        if options.contains(SnapOptions::TANGENT) {
            search.snap_tangent(base, nearby);
        }
    }
    if options.contains(SnapOptions::EXTEND) {
        search.snap_extend(nearby);
    }
    if let Some(base) = search.base_point {
        if options.contains(SnapOptions::PARALLEL) {
            search.snap_parallel(base, &collect_edges(visible));
        }
    }
}
