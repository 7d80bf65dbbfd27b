//! Feature-point snapping for drawing and editing.
//!
//! A snap request runs three candidate tracks over the document:
//!
//! - the point track (handles of other shapes within [`POINT_SNAP_MM`], with
//!   near-point, intersection and other feature fallbacks),
//! - independent same-X / same-Y alignment tracks within [`AXIS_SNAP_MM`],
//! - grid lines, feeding both axis tracks.
//!
//! A point-track result wins over the axis tracks; otherwise the X and Y
//! tracks adjust their coordinates independently. The outcome is cached so
//! that [`SnapEngine::draw_snap`] can render the guides.

mod features;

use crate::host::{GraphicsSink, GuideStyle};
use crate::shapes::geom::{GEOM_EPSILON, rects_touch};
use crate::shapes::{GRID_SNAP_X, GRID_SNAP_Y, Geometry, Grid, HandleType, NO_SHAPE, Shape, ShapeId, ShapeKind};
use crate::document::ShapeDocument;
use kurbo::{Point, Rect, Vec2};
use peniko::Color;
use std::ops::BitOr;

/// Tolerance of the point track, in display millimeters.
pub const POINT_SNAP_MM: f64 = 3.0;
/// Tolerance of each axis-alignment track, in display millimeters.
pub const AXIS_SNAP_MM: f64 = 1.0;
/// Extra distance charged to midpoint handles so vertices win ties.
pub const MIDPOINT_PENALTY_MM: f64 = 0.5;
/// Extra distance charged to near-point (on-edge) snaps so handle snaps win.
pub const NEAR_SNAP_PENALTY_MM: f64 = 4.0;
/// Extra distance charged to extension and parallel snaps.
pub const GUIDE_PENALTY_MM: f64 = 1.0;
/// Shapes smaller than this in both directions are never snap targets.
pub const MIN_SNAP_EXTENT_PX: f64 = 2.0;
/// Shortest edge that can serve as a parallel reference.
pub const PARALLEL_MIN_LEN_MM: f64 = 5.0;
/// Largest direction difference that still snaps to parallel.
pub const PARALLEL_MAX_ANGLE_DEG: f64 = 3.0;

const SNAP_POINT_COLOR: Color = Color::from_rgba8(0, 176, 0, 220);
const SNAP_GUIDE_COLOR: Color = Color::from_rgba8(0, 128, 255, 200);

/// What a snapped point locked onto. Everything from [`SnapType::Grid`] on is a point snap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum SnapType {
    #[default]
    None,
    SameX,
    SameY,
    GridX,
    GridY,
    Grid,
    Point,
    Center,
    MidPoint,
    Quadrant,
    OutPoint,
    Tangent,
    Intersect,
    Parallel,
    Perp,
    PerpNear,
    NearPt,
    ExtendPt,
}

impl SnapType {
    fn from_handle(handle: HandleType) -> Self {
        match handle {
            HandleType::Vertex => SnapType::Point,
            HandleType::Center => SnapType::Center,
            HandleType::MidPoint => SnapType::MidPoint,
            HandleType::Quadrant => SnapType::Quadrant,
            HandleType::Outside => SnapType::OutPoint,
        }
    }

    /// Snapped onto a handle of another shape.
    pub fn is_handle(self) -> bool {
        matches!(
            self,
            SnapType::Point | SnapType::Center | SnapType::MidPoint | SnapType::Quadrant
        )
    }
}

/// Bit set selecting which features snap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SnapOptions(u32);

impl SnapOptions {
    pub const GRID: Self = Self(1 << 1);
    /// The first point of a new shape only snaps to vertices.
    pub const START_MUST_VERTEX: Self = Self(1 << 2);
    pub const VERTEX: Self = Self(1 << 3);
    pub const CENTER: Self = Self(1 << 4);
    pub const MIDPOINT: Self = Self(1 << 5);
    pub const QUADRANT: Self = Self(1 << 6);
    pub const CROSS: Self = Self(1 << 7);
    pub const PERP: Self = Self(1 << 8);
    /// Perpendicular feet may fall outside the edge.
    pub const PERP_OUT: Self = Self(1 << 9);
    pub const TANGENT: Self = Self(1 << 10);
    pub const NEAR: Self = Self(1 << 11);
    pub const EXTEND: Self = Self(1 << 12);
    pub const PARALLEL: Self = Self(1 << 13);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    fn allows_handle(self, handle: HandleType) -> bool {
        match handle {
            HandleType::Vertex => self.contains(Self::VERTEX),
            HandleType::Center => self.contains(Self::CENTER),
            HandleType::MidPoint => self.contains(Self::MIDPOINT),
            HandleType::Quadrant => self.contains(Self::QUADRANT),
            HandleType::Outside => false,
        }
    }
}

impl Default for SnapOptions {
    fn default() -> Self {
        Self::GRID
            | Self::VERTEX
            | Self::CENTER
            | Self::MIDPOINT
            | Self::QUADRANT
            | Self::CROSS
            | Self::PERP
            | Self::TANGENT
            | Self::NEAR
            | Self::EXTEND
            | Self::PARALLEL
    }
}

impl BitOr for SnapOptions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Document and view state a snap request runs against.
#[derive(Clone, Copy)]
pub struct SnapScope<'a> {
    pub doc: &'a ShapeDocument,
    /// Visible model rect; handle snapping only considers shapes inside it.
    pub view_rect: Rect,
    /// Model units per display millimeter.
    pub mm_to_model: f64,
    /// Model units per display pixel.
    pub px_to_model: f64,
}

/// One point to snap.
#[derive(Debug, Clone, Copy)]
pub struct SnapRequest<'a> {
    /// Candidate point in model coordinates.
    pub point: Point,
    /// Shape being drawn (id 0) or dragged.
    pub shape: Option<&'a Shape>,
    /// Handle of `shape` at `point`, or -1 when the whole shape moves.
    pub hot_handle: i32,
    /// Handle of `shape` excluded from matching, or -1.
    pub ignore_handle: i32,
    /// Shapes that are never snap targets.
    pub ignore_ids: &'a [ShapeId],
}

impl<'a> SnapRequest<'a> {
    /// Snap a free point with no shape context.
    pub fn point(point: Point) -> Self {
        Self {
            point,
            shape: None,
            hot_handle: -1,
            ignore_handle: -1,
            ignore_ids: &[],
        }
    }

    pub fn for_shape(point: Point, shape: &'a Shape, hot_handle: i32) -> Self {
        Self {
            point,
            shape: Some(shape),
            hot_handle,
            ignore_handle: -1,
            ignore_ids: &[],
        }
    }
}

/// Cached outcome of the last snap request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapResult {
    /// Point handed back to the caller.
    pub point: Point,
    /// Feature point that was snapped to.
    pub snapped: Point,
    /// Point track type in slot 0, or X/Y track types in slots 0 and 1.
    pub snap_type: [SnapType; 2],
    /// Reference point of each slot (the dragged handle, or the aligned vertex).
    pub base: [Point; 2],
    /// Target shape, 0 for none.
    pub shape: ShapeId,
    /// Target handle, -1 for none.
    pub handle: i32,
    /// Handle of the dragged shape that matched, -1 for the pointer itself.
    pub dragged_handle: i32,
}

impl Default for SnapResult {
    fn default() -> Self {
        Self {
            point: Point::ZERO,
            snapped: Point::ZERO,
            snap_type: [SnapType::None; 2],
            base: [Point::ZERO; 2],
            shape: NO_SHAPE,
            handle: -1,
            dragged_handle: -1,
        }
    }
}

/// Best candidate of the point track.
#[derive(Debug, Clone, Copy)]
struct PointTrack {
    /// Acceptance tolerance.
    tol: f64,
    /// Effective distance of the current candidate, penalties included.
    score: f64,
    snap_type: SnapType,
    base: Point,
    pt: Point,
    matchpt: Option<Point>,
    shape: ShapeId,
    handle: i32,
    dragged_handle: i32,
}

impl PointTrack {
    fn new(tol: f64) -> Self {
        Self {
            tol,
            score: f64::INFINITY,
            snap_type: SnapType::None,
            base: Point::ZERO,
            pt: Point::ZERO,
            matchpt: None,
            shape: NO_SHAPE,
            handle: -1,
            dragged_handle: -1,
        }
    }

    /// Check whether a candidate at `dist` with `penalty` beats the current one.
    fn accepts(&self, dist: f64, penalty: f64) -> bool {
        dist < self.tol && dist + penalty < self.score
    }

    fn has_handle(&self) -> bool {
        self.snap_type.is_handle()
    }
}

/// Best candidate of one axis track.
#[derive(Debug, Clone, Copy)]
struct AxisTrack {
    dist: f64,
    snap_type: SnapType,
    base: Point,
    value: f64,
}

impl AxisTrack {
    fn new(dist: f64) -> Self {
        Self {
            dist,
            snap_type: SnapType::None,
            base: Point::ZERO,
            value: 0.0,
        }
    }
}

/// State of one snap request while the document is scanned.
struct Search {
    org: Point,
    mm: f64,
    options: SnapOptions,
    /// Handles of the dragged shape matched against targets, with their indices.
    dragged: Vec<(i32, Point)>,
    /// Previous point of the edge being drawn, for perpendicular, tangent and parallel snaps.
    base_point: Option<Point>,
    arr0: PointTrack,
    arr1: AxisTrack,
    arr2: AxisTrack,
}

impl Search {
    /// Align with a target point on either axis.
    fn snap_hv(&mut self, pnt: Point) {
        let dx = (pnt.x - self.org.x).abs();
        let diff = self.arr1.dist - dx;
        if diff > GEOM_EPSILON
            || (diff.abs() <= GEOM_EPSILON
                && self.arr1.snap_type != SnapType::None
                && (pnt.y - self.org.y).abs() < (self.arr1.base.y - self.org.y).abs())
        {
            self.arr1.dist = dx;
            self.arr1.base = pnt;
            self.arr1.value = pnt.x;
            self.arr1.snap_type = SnapType::SameX;
        }

        let dy = (pnt.y - self.org.y).abs();
        let diff = self.arr2.dist - dy;
        if diff > GEOM_EPSILON
            || (diff.abs() <= GEOM_EPSILON
                && self.arr2.snap_type != SnapType::None
                && (pnt.x - self.org.x).abs() < (self.arr2.base.x - self.org.x).abs())
        {
            self.arr2.dist = dy;
            self.arr2.base = pnt;
            self.arr2.value = pnt.y;
            self.arr2.snap_type = SnapType::SameY;
        }
    }

    /// Snap to the handles of `target`, directly or through a dragged handle.
    fn snap_handle(&mut self, target: &Shape) -> bool {
        let mut found = false;
        for i in 0..target.handle_count() {
            if !is_snap_handle(target, i) {
                continue;
            }
            let handle_type = target.handle_type(i);
            let pnt = target.handle_point(i);
            self.snap_hv(pnt);
            if !self.options.allows_handle(handle_type) {
                continue;
            }
            let penalty = if handle_type == HandleType::MidPoint {
                self.mm * MIDPOINT_PENALTY_MM
            } else {
                0.0
            };
            let snap_type = SnapType::from_handle(handle_type);

            let dist = pnt.distance(self.org);
            if self.arr0.accepts(dist, penalty) {
                self.arr0 = PointTrack {
                    score: dist + penalty,
                    snap_type,
                    base: self.org,
                    pt: pnt,
                    matchpt: None,
                    shape: target.id(),
                    handle: i as i32,
                    dragged_handle: -1,
                    ..self.arr0
                };
                found = true;
            }
            for k in 0..self.dragged.len() {
                let (j, ptd) = self.dragged[k];
                let dist = pnt.distance(ptd);
                if self.arr0.accepts(dist, penalty) {
                    self.arr0 = PointTrack {
                        score: dist + penalty,
                        snap_type,
                        base: ptd,
                        pt: pnt,
                        matchpt: Some(self.org + (pnt - ptd)),
                        shape: target.id(),
                        handle: i as i32,
                        dragged_handle: j,
                        ..self.arr0
                    };
                    found = true;
                }
            }
        }
        found
    }

    /// Snap onto the outline of `target`.
    fn snap_near(&mut self, target: &Shape) {
        let penalty = self.mm * NEAR_SNAP_PENALTY_MM;
        let mut candidates = Vec::with_capacity(self.dragged.len() + 1);
        candidates.push((-1, self.org));
        candidates.extend(self.dragged.iter().copied());

        for (j, ptd) in candidates {
            let res = target.hit_test(ptd);
            if self.arr0.accepts(res.dist, penalty) {
                self.arr0 = PointTrack {
                    score: res.dist + penalty,
                    snap_type: SnapType::NearPt,
                    base: ptd,
                    pt: res.nearpt,
                    matchpt: (j >= 0).then(|| self.org + (res.nearpt - ptd)),
                    shape: target.id(),
                    handle: -1,
                    dragged_handle: j,
                    ..self.arr0
                };
            }
        }
    }

    /// Lock onto grid lines, and onto grid crossings for dragged handles.
    fn snap_grid(&mut self, target: &Shape, grid: &Grid) {
        let (pt, dists, mask) = grid.snap(self.org, Vec2::new(self.arr1.dist, self.arr2.dist));
        let ext = grid.frame.extent();
        if mask & GRID_SNAP_X != 0 {
            self.arr1 = AxisTrack {
                dist: dists.x,
                snap_type: SnapType::GridX,
                base: Point::new(pt.x, ext.y0),
                value: pt.x,
            };
        }
        if mask & GRID_SNAP_Y != 0 {
            self.arr2 = AxisTrack {
                dist: dists.y,
                snap_type: SnapType::GridY,
                base: Point::new(ext.x0, pt.y),
                value: pt.y,
            };
        }

        let tol = self.arr0.tol;
        for k in 0..self.dragged.len() {
            let (j, ptd) = self.dragged[k];
            let (gp, _, mask) = grid.snap(ptd, Vec2::new(tol, tol));
            if mask != GRID_SNAP_X | GRID_SNAP_Y {
                continue;
            }
            let dist = gp.distance(ptd);
            if self.arr0.accepts(dist, 0.0) {
                self.arr0 = PointTrack {
                    score: dist,
                    snap_type: SnapType::Grid,
                    base: ptd,
                    pt: gp,
                    matchpt: Some(self.org + (gp - ptd)),
                    shape: target.id(),
                    handle: -1,
                    dragged_handle: j,
                    ..self.arr0
                };
            }
        }
    }

    /// Resolve the tracks into the returned point and the cached result.
    fn finish(self) -> SnapResult {
        if self.arr0.snap_type != SnapType::None {
            return SnapResult {
                point: self.arr0.matchpt.unwrap_or(self.arr0.pt),
                snapped: self.arr0.pt,
                snap_type: [self.arr0.snap_type, SnapType::None],
                base: [self.arr0.base, Point::ZERO],
                shape: self.arr0.shape,
                handle: self.arr0.handle,
                dragged_handle: self.arr0.dragged_handle,
            };
        }
        let mut point = self.org;
        if self.arr1.snap_type != SnapType::None {
            point.x = self.arr1.value;
        }
        if self.arr2.snap_type != SnapType::None {
            point.y = self.arr2.value;
        }
        SnapResult {
            point,
            snapped: point,
            snap_type: [self.arr1.snap_type, self.arr2.snap_type],
            base: [self.arr1.base, self.arr2.base],
            ..SnapResult::default()
        }
    }
}

/// Handles of `shape` eligible as snap targets or match sources.
fn is_snap_handle(shape: &Shape, index: usize) -> bool {
    if shape.handle_type(index) >= HandleType::Outside {
        return false;
    }
    match &shape.geometry {
        // Only the loose ends of an open curve are meaningful points.
        Geometry::Splines(p) => !p.closed && (index == 0 || index + 1 == p.len()),
        _ => true,
    }
}

/// The snapping engine and its cached last result.
#[derive(Debug, Clone)]
pub struct SnapEngine {
    options: SnapOptions,
    enabled: bool,
    result: SnapResult,
    mm_to_model: f64,
}

impl Default for SnapEngine {
    fn default() -> Self {
        Self::new(SnapOptions::default())
    }
}

impl SnapEngine {
    pub fn new(options: SnapOptions) -> Self {
        Self {
            options,
            enabled: true,
            result: SnapResult::default(),
            mm_to_model: 1.0,
        }
    }

    pub fn options(&self) -> SnapOptions {
        self.options
    }

    pub fn set_options(&mut self, options: SnapOptions) {
        self.options = options;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable snapping; disabling also clears the cached result.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.clear_snap();
        }
    }

    /// Snap `req.point` against the document, caching the outcome.
    pub fn snap_point(&mut self, scope: &SnapScope<'_>, req: &SnapRequest<'_>) -> Point {
        self.result = SnapResult {
            point: req.point,
            snapped: req.point,
            ..SnapResult::default()
        };
        self.mm_to_model = scope.mm_to_model;
        if !self.enabled {
            return req.point;
        }

        let mm = scope.mm_to_model;
        let mut search = Search {
            org: req.point,
            mm,
            options: self.options,
            dragged: Vec::new(),
            base_point: None,
            arr0: PointTrack::new(mm * POINT_SNAP_MM),
            arr1: AxisTrack::new(mm * AXIS_SNAP_MM),
            arr2: AxisTrack::new(mm * AXIS_SNAP_MM),
        };
        let mut start_point = false;

        if let Some(shape) = req.shape {
            let hot = req.hot_handle;
            let drawn_edge = matches!(shape.kind(), ShapeKind::Line | ShapeKind::Lines);
            if hot > 0 && (hot as usize) <= shape.handle_count() && drawn_edge {
                search.base_point = Some(shape.handle_point(hot as usize - 1));
            }
            if shape.id() == NO_SHAPE {
                start_point = hot <= 0;
                if let Some(prev) = search.base_point {
                    search.snap_hv(prev);
                }
            }
            let center_drag = hot >= 0
                && (hot as usize) < shape.handle_count()
                && shape.handle_type(hot as usize) == HandleType::Center;
            let match_mode = shape.id() != NO_SHAPE
                && (hot < 0 || (req.ignore_handle >= 0 && req.ignore_handle != hot) || center_drag);
            if match_mode {
                search.dragged = (0..shape.handle_count())
                    .filter(|&i| i as i32 != req.ignore_handle)
                    .filter(|&i| !shape.is_handle_fixed(i) && is_snap_handle(shape, i))
                    .map(|i| (i as i32, shape.handle_point(i)))
                    .collect();
            }
        }
        let vertex_only = start_point && self.options.contains(SnapOptions::START_MUST_VERTEX);
        if vertex_only {
            search.options = SnapOptions::VERTEX;
        }

        let tol = search.arr0.tol;
        let snapbox = Rect::from_center_size(req.point, (4.0 * tol, 4.0 * tol));
        let min_extent = scope.px_to_model * MIN_SNAP_EXTENT_PX;
        let own_id = req.shape.map_or(NO_SHAPE, Shape::id);
        let mut nearby: Vec<&Shape> = Vec::new();
        let mut visible: Vec<&Shape> = Vec::new();

        for target in scope.doc.shapes_ordered() {
            if target.flags.no_snap
                || target.flags.hidden
                || (own_id != NO_SHAPE && target.id() == own_id)
                || req.ignore_ids.contains(&target.id())
            {
                continue;
            }
            let ext = target.extent();
            if ext.width() < min_extent && ext.height() < min_extent {
                continue;
            }
            if let Geometry::Grid(grid) = &target.geometry {
                if rects_touch(ext, snapbox) && search.options.contains(SnapOptions::GRID) {
                    search.snap_grid(target, grid);
                }
                continue;
            }
            let mut found = false;
            if rects_touch(ext, scope.view_rect) {
                visible.push(target);
                found = search.snap_handle(target);
            }
            if rects_touch(ext, snapbox) {
                nearby.push(target);
                if !found && !search.arr0.has_handle() && search.options.contains(SnapOptions::NEAR) {
                    search.snap_near(target);
                }
            }
        }

        if !search.arr0.has_handle() && !vertex_only {
            features::snap_features(&mut search, &nearby, &visible);
        }

        self.result = search.finish();
        if self.result.snap_type[0] != SnapType::None {
            log::debug!(
                "Snapped {:?} -> {:?} ({:?}, shape {})",
                req.point,
                self.result.point,
                self.result.snap_type,
                self.result.shape
            );
        }
        self.result.point
    }

    /// Forget the cached result so no guide is drawn.
    pub fn clear_snap(&mut self) {
        self.result = SnapResult::default();
    }

    pub fn result(&self) -> &SnapResult {
        &self.result
    }

    /// Put back a result saved from an earlier [`SnapEngine::snap_point`] call.
    pub fn restore(&mut self, result: SnapResult) {
        self.result = result;
    }

    /// The point-level snap type, counting a combined grid X+Y lock as a point.
    pub fn snapped_type(&self) -> SnapType {
        let [t0, t1] = self.result.snap_type;
        if t0 >= SnapType::Grid {
            t0
        } else if t0 == SnapType::GridX && t1 == SnapType::GridY {
            SnapType::Point
        } else {
            SnapType::None
        }
    }

    /// Reference and snapped points of the last point-level snap.
    pub fn get_snapped_point(&self) -> Option<(Point, Point, SnapType)> {
        match self.snapped_type() {
            SnapType::None => None,
            t => Some((self.result.base[0], self.result.snapped, t)),
        }
    }

    /// Target shape, target handle and dragged handle of the last handle match.
    pub fn get_snapped_handle(&self) -> Option<(ShapeId, i32, i32)> {
        (self.result.shape != NO_SHAPE).then_some((
            self.result.shape,
            self.result.handle,
            self.result.dragged_handle,
        ))
    }

    /// Render guides for the cached result; returns whether anything was drawn.
    pub fn draw_snap(&self, sink: &mut dyn GraphicsSink) -> bool {
        let r = &self.result;
        let mm = self.mm_to_model;
        let [t0, t1] = r.snap_type;
        if t0 >= SnapType::Grid {
            let radius = if t0.is_handle() || t0 == SnapType::Grid {
                mm * 2.0
            } else {
                mm * 1.5
            };
            sink.draw_circle(r.snapped, radius, &GuideStyle::solid(SNAP_POINT_COLOR, mm * 0.3));
            let with_guide = matches!(
                t0,
                SnapType::Perp
                    | SnapType::PerpNear
                    | SnapType::Parallel
                    | SnapType::ExtendPt
                    | SnapType::Tangent
            ) || r.dragged_handle >= 0;
            if with_guide {
                sink.draw_line(r.base[0], r.snapped, &GuideStyle::dashed(SNAP_GUIDE_COLOR, mm * 0.2));
            }
            return true;
        }

        let mut drawn = false;
        for (slot, snap_type) in [t0, t1].into_iter().enumerate() {
            let style = match snap_type {
                SnapType::SameX | SnapType::SameY => GuideStyle::dashed(SNAP_GUIDE_COLOR, mm * 0.2),
                SnapType::GridX | SnapType::GridY => GuideStyle::solid(SNAP_GUIDE_COLOR, mm * 0.2),
                _ => continue,
            };
            sink.draw_line(r.base[slot], r.snapped, &style);
            drawn = true;
        }
        drawn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{DrawList, DrawOp};

    fn scope(doc: &ShapeDocument) -> SnapScope<'_> {
        SnapScope {
            doc,
            view_rect: Rect::new(-1000.0, -1000.0, 1000.0, 1000.0),
            mm_to_model: 1.0,
            px_to_model: 0.25,
        }
    }

    fn doc_with(shapes: Vec<Shape>) -> ShapeDocument {
        let mut doc = ShapeDocument::new();
        for shape in shapes {
            doc.add_shape(shape);
        }
        doc
    }

    #[test]
    fn test_vertex_snap() {
        let doc = doc_with(vec![Shape::line(Point::new(0.0, 0.0), Point::new(100.0, 0.0))]);
        let mut snap = SnapEngine::default();
        let p = snap.snap_point(&scope(&doc), &SnapRequest::point(Point::new(101.0, 1.5)));
        assert_eq!(p, Point::new(100.0, 0.0));
        assert_eq!(snap.result().snap_type[0], SnapType::Point);
        assert_eq!(snap.get_snapped_handle(), Some((1, 1, -1)));
    }

    #[test]
    fn test_same_x_alone() {
        let doc = doc_with(vec![
            Shape::line(Point::new(0.0, 0.0), Point::new(50.0, 0.0)),
            Shape::rect(Rect::new(1.5, 40.0, 60.0, 90.0)),
        ]);
        let mut snap = SnapEngine::default();
        let p = snap.snap_point(&scope(&doc), &SnapRequest::point(Point::new(1.2, 20.0)));
        assert_eq!(snap.result().snap_type[0], SnapType::SameX);
        assert_eq!(snap.result().base[0], Point::new(1.5, 40.0));
        assert!((p.x - 1.5).abs() < f64::EPSILON);
        assert!((p.y - 20.0).abs() < f64::EPSILON);

        // Within 1mm of x = 1.5, but a vertex is within 3mm.
        let p = snap.snap_point(&scope(&doc), &SnapRequest::point(Point::new(1.0, 2.0)));
        assert_eq!(p, Point::new(0.0, 0.0));
        assert_eq!(snap.result().snap_type[0], SnapType::Point);
    }

    #[test]
    fn test_point_track_dominates_axis_track() {
        let doc = doc_with(vec![
            Shape::line(Point::new(10.0, 10.0), Point::new(10.0, 60.0)),
            Shape::line(Point::new(11.5, 100.0), Point::new(11.5, 200.0)),
        ]);
        let mut snap = SnapEngine::default();
        let p = snap.snap_point(&scope(&doc), &SnapRequest::point(Point::new(11.8, 11.0)));
        assert_eq!(p, Point::new(10.0, 10.0));
        assert_eq!(snap.result().snap_type, [SnapType::Point, SnapType::None]);
    }

    #[test]
    fn test_same_x_and_same_y_reported_together() {
        let doc = doc_with(vec![
            Shape::line(Point::new(50.0, 100.0), Point::new(50.0, 200.0)),
            Shape::line(Point::new(100.0, 30.0), Point::new(200.0, 30.0)),
        ]);
        let mut snap = SnapEngine::default();
        let p = snap.snap_point(&scope(&doc), &SnapRequest::point(Point::new(50.6, 30.4)));
        assert_eq!(snap.result().snap_type, [SnapType::SameX, SnapType::SameY]);
        assert_eq!(p, Point::new(50.0, 30.0));

        let mut sink = DrawList::new();
        assert!(snap.draw_snap(&mut sink));
        assert_eq!(sink.ops.len(), 2);
    }

    #[test]
    fn test_vertex_beats_near_edge() {
        let doc = doc_with(vec![Shape::line(Point::new(0.0, 0.0), Point::new(100.0, 0.0))]);
        let mut snap = SnapEngine::default();
        // On the edge, 2.5 away from the end vertex.
        let p = snap.snap_point(&scope(&doc), &SnapRequest::point(Point::new(97.5, 0.0)));
        assert_eq!(p, Point::new(100.0, 0.0));

        let p = snap.snap_point(&scope(&doc), &SnapRequest::point(Point::new(30.0, 0.8)));
        assert_eq!(snap.result().snap_type[0], SnapType::NearPt);
        assert!((p.x - 30.0).abs() < 1e-9 && p.y.abs() < 1e-9);
    }

    #[test]
    fn test_midpoint_penalty() {
        let doc = doc_with(vec![Shape::line(Point::new(0.0, 0.0), Point::new(4.0, 0.0))]);
        let mut snap = SnapEngine::default();
        // Slightly closer to the midpoint than to the start vertex.
        let p = snap.snap_point(&scope(&doc), &SnapRequest::point(Point::new(1.1, 0.5)));
        assert_eq!(snap.result().snap_type[0], SnapType::Point);
        assert_eq!(p, Point::new(0.0, 0.0));
    }

    #[test]
    fn test_excluded_shapes() {
        let mut hidden = Shape::line(Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        hidden.flags.no_snap = true;
        let tiny = Shape::line(Point::new(50.0, 50.0), Point::new(50.1, 50.1));
        let doc = doc_with(vec![hidden, tiny, Shape::line(Point::new(200.0, 0.0), Point::new(300.0, 0.0))]);
        let mut snap = SnapEngine::default();
        let p = snap.snap_point(&scope(&doc), &SnapRequest::point(Point::new(1.0, 50.0)));
        assert_eq!(p, Point::new(1.0, 50.0));
        assert_eq!(snap.snapped_type(), SnapType::None);

        let mut req = SnapRequest::point(Point::new(201.0, 1.0));
        req.ignore_ids = &[3];
        let p = snap.snap_point(&scope(&doc), &req);
        assert_eq!(p, Point::new(201.0, 1.0));
    }

    #[test]
    fn test_dragged_handle_matches_target() {
        let doc = doc_with(vec![Shape::rect(Rect::new(0.0, 0.0, 100.0, 100.0))]);
        let mut dragged = Shape::line(Point::new(102.0, 101.0), Point::new(150.0, 150.0));
        dragged.id = 99;
        let mut snap = SnapEngine::default();
        let req = SnapRequest::for_shape(Point::new(130.0, 130.0), &dragged, -1);
        let p = snap.snap_point(&scope(&doc), &req);
        assert!((p.x - 128.0).abs() < 1e-9);
        assert!((p.y - 129.0).abs() < 1e-9);
        assert_eq!(snap.get_snapped_handle(), Some((1, 2, 0)));
    }

    #[test]
    fn test_grid_axis_and_crossing() {
        let doc = doc_with(vec![Shape::grid(
            Rect::new(0.0, 0.0, 100.0, 100.0),
            Vec2::new(10.0, 10.0),
        )]);
        let mut snap = SnapEngine::default();
        let p = snap.snap_point(&scope(&doc), &SnapRequest::point(Point::new(20.5, 35.0)));
        assert_eq!(snap.result().snap_type, [SnapType::GridX, SnapType::None]);
        assert!((p.x - 20.0).abs() < f64::EPSILON);

        snap.snap_point(&scope(&doc), &SnapRequest::point(Point::new(20.5, 29.5)));
        assert_eq!(snap.snapped_type(), SnapType::Point);
    }

    #[test]
    fn test_disabled_returns_raw_point() {
        let doc = doc_with(vec![Shape::line(Point::new(0.0, 0.0), Point::new(100.0, 0.0))]);
        let mut snap = SnapEngine::default();
        snap.set_enabled(false);
        let p = snap.snap_point(&scope(&doc), &SnapRequest::point(Point::new(1.0, 1.0)));
        assert_eq!(p, Point::new(1.0, 1.0));
        let mut sink = DrawList::new();
        assert!(!snap.draw_snap(&mut sink));
    }

    #[test]
    fn test_start_must_vertex() {
        let doc = doc_with(vec![Shape::line(Point::new(0.0, 0.0), Point::new(100.0, 0.0))]);
        let mut snap = SnapEngine::new(SnapOptions::default() | SnapOptions::START_MUST_VERTEX);
        let temp = Shape::line(Point::new(50.0, 1.0), Point::new(50.0, 1.0));
        let p = snap.snap_point(&scope(&doc), &SnapRequest::for_shape(Point::new(50.0, 1.0), &temp, 0));
        assert_eq!(snap.snapped_type(), SnapType::None);
        assert!((p.y - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_draw_point_snap() {
        let doc = doc_with(vec![Shape::line(Point::new(0.0, 0.0), Point::new(100.0, 0.0))]);
        let mut snap = SnapEngine::default();
        snap.snap_point(&scope(&doc), &SnapRequest::point(Point::new(1.0, 1.0)));
        let mut sink = DrawList::new();
        assert!(snap.draw_snap(&mut sink));
        assert!(matches!(sink.ops[0], DrawOp::Circle { .. }));
        snap.clear_snap();
        assert!(snap.get_snapped_point().is_none());
    }
}
