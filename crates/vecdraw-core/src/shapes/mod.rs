//! Shape model edited by the command engine.
//!
//! Shapes are plain data: a [`Geometry`] plus flags and style. Identity is an
//! integer [`ShapeId`] assigned by the owning [`crate::document::ShapeDocument`];
//! shapes that are not (yet) in a document carry id [`NO_SHAPE`].

pub mod geom;
mod grid;
mod lines;
mod rect;

pub use grid::{GRID_SNAP_X, GRID_SNAP_Y, Grid};
pub use lines::{LinesHit, LinesHitKind, Polyline, lines_hit};
pub use rect::{BaseRect, RECT_HANDLE_COUNT};

use geom::{bounds_of, edges_touch_rect, nearest_on_segment, rect_contains_rect, rects_touch};
use kurbo::{Affine, Point, Rect, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};

/// Identifier for shapes, unique within a document. Zero means "no shape".
pub type ShapeId = u32;

/// The "no shape" id.
pub const NO_SHAPE: ShapeId = 0;

/// Segments used to approximate an ellipse outline.
const ELLIPSE_SEGMENTS: usize = 64;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    /// Build from a packed `0xRRGGBB` value, fully opaque.
    pub fn from_rgb(value: u32) -> Self {
        Self::new(
            ((value >> 16) & 0xFF) as u8,
            ((value >> 8) & 0xFF) as u8,
            (value & 0xFF) as u8,
            255,
        )
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Stroke style for outlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StrokeStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
    /// No outline is drawn.
    Null,
}

/// Style properties for shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeStyle {
    pub stroke_color: SerializableColor,
    pub stroke_width: f64,
    #[serde(default)]
    pub stroke_style: StrokeStyle,
    /// Fill color (None = no fill).
    #[serde(default)]
    pub fill_color: Option<SerializableColor>,
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            stroke_color: SerializableColor::black(),
            stroke_width: 1.0,
            stroke_style: StrokeStyle::Solid,
            fill_color: None,
        }
    }
}

impl ShapeStyle {
    pub fn stroke(&self) -> Color {
        self.stroke_color.into()
    }

    pub fn fill(&self) -> Option<Color> {
        self.fill_color.map(|c| c.into())
    }

    pub fn has_fill(&self) -> bool {
        self.fill_color.is_some_and(|c| c.a > 0)
    }
}

/// Boolean shape flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeFlags {
    /// Cannot be moved, edited or deleted from the selection UI.
    pub locked: bool,
    /// Edge lengths are preserved while editing.
    pub fixed_length: bool,
    /// Overall size is preserved while editing.
    pub fixed_size: bool,
    pub rotate_disabled: bool,
    /// Excluded from snapping.
    pub no_snap: bool,
    pub hidden: bool,
}

/// Kind of a control point, ordered by snapping priority.
///
/// Everything at or after [`HandleType::Outside`] is never a snap target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HandleType {
    Vertex,
    Center,
    MidPoint,
    Quadrant,
    Outside,
}

/// Result of hit-testing a point against a shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitResult {
    /// Distance from the probe to the nearest outline point.
    pub dist: f64,
    /// Nearest outline point.
    pub nearpt: Point,
    /// Index of the nearest edge (or child for groups), -1 if none.
    pub segment: i32,
    /// Whether the probe is inside a closed outline.
    pub inside: bool,
}

impl Default for HitResult {
    fn default() -> Self {
        Self {
            dist: f64::INFINITY,
            nearpt: Point::ZERO,
            segment: -1,
            inside: false,
        }
    }
}

/// Coarse kind of a shape, used by selection queries and context actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    Line,
    Rect,
    Ellipse,
    Lines,
    Splines,
    Dot,
    Grid,
    Group,
    Image,
}

/// Shape geometry variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Geometry {
    Line { start: Point, end: Point },
    Rect(BaseRect),
    Ellipse(BaseRect),
    Lines(Polyline),
    Splines(Polyline),
    Dot { center: Point },
    Grid(Grid),
    Group { children: Vec<Shape> },
    Image { frame: BaseRect, name: String },
}

/// A shape: geometry plus identity, flags and style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub(crate) id: ShapeId,
    #[serde(default)]
    pub flags: ShapeFlags,
    #[serde(default)]
    pub style: ShapeStyle,
    pub geometry: Geometry,
}

impl Shape {
    /// Create a shape that is not yet part of a document.
    pub fn new(geometry: Geometry) -> Self {
        Self {
            id: NO_SHAPE,
            flags: ShapeFlags::default(),
            style: ShapeStyle::default(),
            geometry,
        }
    }

    pub fn line(start: Point, end: Point) -> Self {
        Self::new(Geometry::Line { start, end })
    }

    pub fn rect(rect: Rect) -> Self {
        Self::new(Geometry::Rect(BaseRect::from_rect(rect)))
    }

    pub fn ellipse(rect: Rect) -> Self {
        Self::new(Geometry::Ellipse(BaseRect::from_rect(rect)))
    }

    pub fn lines(points: Vec<Point>, closed: bool) -> Self {
        Self::new(Geometry::Lines(Polyline::new(points, closed)))
    }

    pub fn splines(points: Vec<Point>, closed: bool) -> Self {
        Self::new(Geometry::Splines(Polyline::new(points, closed)))
    }

    pub fn dot(center: Point) -> Self {
        Self::new(Geometry::Dot { center })
    }

    pub fn grid(rect: Rect, cell: Vec2) -> Self {
        Self::new(Geometry::Grid(Grid::new(rect, cell)))
    }

    /// An image placeholder framed by `rect`; `name` identifies the picture for the host.
    pub fn image(rect: Rect, name: impl Into<String>) -> Self {
        Self::new(Geometry::Image {
            frame: BaseRect::from_rect(rect),
            name: name.into(),
        })
    }

    pub fn group(children: Vec<Shape>) -> Self {
        Self::new(Geometry::Group { children })
    }

    pub fn id(&self) -> ShapeId {
        self.id
    }

    pub fn kind(&self) -> ShapeKind {
        match &self.geometry {
            Geometry::Line { .. } => ShapeKind::Line,
            Geometry::Rect(_) => ShapeKind::Rect,
            Geometry::Ellipse(_) => ShapeKind::Ellipse,
            Geometry::Lines(_) => ShapeKind::Lines,
            Geometry::Splines(_) => ShapeKind::Splines,
            Geometry::Dot { .. } => ShapeKind::Dot,
            Geometry::Grid(_) => ShapeKind::Grid,
            Geometry::Group { .. } => ShapeKind::Group,
            Geometry::Image { .. } => ShapeKind::Image,
        }
    }

    /// Rect-framed shapes (rectangles, ellipses, images, grids).
    pub fn is_rect_family(&self) -> bool {
        matches!(
            self.geometry,
            Geometry::Rect(_) | Geometry::Ellipse(_) | Geometry::Image { .. } | Geometry::Grid(_)
        )
    }

    /// Vertex-list shapes whose points can be inserted and removed.
    pub fn is_base_lines(&self) -> bool {
        matches!(self.geometry, Geometry::Lines(_) | Geometry::Splines(_))
    }

    pub fn is_curve(&self) -> bool {
        matches!(self.geometry, Geometry::Splines(_) | Geometry::Ellipse(_))
    }

    pub fn polyline(&self) -> Option<&Polyline> {
        match &self.geometry {
            Geometry::Lines(p) | Geometry::Splines(p) => Some(p),
            _ => None,
        }
    }

    pub fn polyline_mut(&mut self) -> Option<&mut Polyline> {
        match &mut self.geometry {
            Geometry::Lines(p) | Geometry::Splines(p) => Some(p),
            _ => None,
        }
    }

    pub fn frame(&self) -> Option<&BaseRect> {
        match &self.geometry {
            Geometry::Rect(f) | Geometry::Ellipse(f) | Geometry::Image { frame: f, .. } => Some(f),
            Geometry::Grid(g) => Some(&g.frame),
            _ => None,
        }
    }

    pub fn frame_mut(&mut self) -> Option<&mut BaseRect> {
        match &mut self.geometry {
            Geometry::Rect(f) | Geometry::Ellipse(f) | Geometry::Image { frame: f, .. } => Some(f),
            Geometry::Grid(g) => Some(&mut g.frame),
            _ => None,
        }
    }

    pub fn children(&self) -> Option<&[Shape]> {
        match &self.geometry {
            Geometry::Group { children } => Some(children),
            _ => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        match &self.geometry {
            Geometry::Lines(p) | Geometry::Splines(p) => p.closed,
            Geometry::Rect(_) | Geometry::Ellipse(_) | Geometry::Image { .. } | Geometry::Grid(_) => {
                true
            }
            _ => false,
        }
    }

    /// Open or close a vertex-list shape. Other shapes ignore the request.
    pub fn set_closed(&mut self, closed: bool) -> bool {
        match self.polyline_mut() {
            Some(p) => {
                p.closed = closed;
                true
            }
            None => false,
        }
    }

    /// The defining points of the geometry.
    pub fn points(&self) -> Vec<Point> {
        match &self.geometry {
            Geometry::Line { start, end } => vec![*start, *end],
            Geometry::Rect(f) | Geometry::Ellipse(f) | Geometry::Image { frame: f, .. } => {
                f.corners.to_vec()
            }
            Geometry::Grid(g) => g.frame.corners.to_vec(),
            Geometry::Lines(p) | Geometry::Splines(p) => p.points.clone(),
            Geometry::Dot { center } => vec![*center],
            Geometry::Group { .. } => geom::rect_corners(self.extent()).to_vec(),
        }
    }

    pub fn point_count(&self) -> usize {
        match &self.geometry {
            Geometry::Line { .. } => 2,
            Geometry::Lines(p) | Geometry::Splines(p) => p.len(),
            Geometry::Dot { .. } => 1,
            _ => 4,
        }
    }

    pub fn point(&self, index: usize) -> Point {
        self.points().get(index).copied().unwrap_or(Point::ZERO)
    }

    /// Overwrite one defining point. Rect-framed shapes move a raw corner.
    pub fn set_point(&mut self, index: usize, point: Point) -> bool {
        match &mut self.geometry {
            Geometry::Line { start, end } => match index {
                0 => *start = point,
                1 => *end = point,
                _ => return false,
            },
            Geometry::Lines(p) | Geometry::Splines(p) => match p.points.get_mut(index) {
                Some(slot) => *slot = point,
                None => return false,
            },
            Geometry::Dot { center } => *center = point,
            Geometry::Rect(f) | Geometry::Ellipse(f) | Geometry::Image { frame: f, .. } => {
                match f.corners.get_mut(index) {
                    Some(slot) => *slot = point,
                    None => return false,
                }
            }
            Geometry::Grid(g) => match g.frame.corners.get_mut(index) {
                Some(slot) => *slot = point,
                None => return false,
            },
            Geometry::Group { .. } => return false,
        }
        true
    }

    /// Reset the geometry to a degenerate state, keeping kind, flags and style.
    pub fn clear(&mut self) {
        match &mut self.geometry {
            Geometry::Line { start, end } => {
                *start = Point::ZERO;
                *end = Point::ZERO;
            }
            Geometry::Lines(p) | Geometry::Splines(p) => p.points.clear(),
            Geometry::Dot { center } => *center = Point::ZERO,
            Geometry::Rect(f) | Geometry::Ellipse(f) | Geometry::Image { frame: f, .. } => {
                f.corners = [Point::ZERO; 4];
            }
            Geometry::Grid(g) => g.frame.corners = [Point::ZERO; 4],
            Geometry::Group { children } => children.clear(),
        }
    }

    /// Axis-aligned bounding box.
    pub fn extent(&self) -> Rect {
        match &self.geometry {
            Geometry::Group { children } => children
                .iter()
                .map(Shape::extent)
                .reduce(|a, b| a.union(b))
                .unwrap_or(Rect::ZERO),
            _ => bounds_of(&self.points()),
        }
    }

    /// Outline approximation used for ellipse hit tests.
    fn ellipse_outline(frame: &BaseRect) -> Vec<Point> {
        let c = frame.center();
        let u = (frame.corners[1] - frame.corners[0]) / 2.0;
        let v = (frame.corners[3] - frame.corners[0]) / 2.0;
        (0..ELLIPSE_SEGMENTS)
            .map(|i| {
                let t = i as f64 / ELLIPSE_SEGMENTS as f64 * std::f64::consts::TAU;
                c + u * t.cos() + v * t.sin()
            })
            .collect()
    }

    /// Hit-test a point; the result distance is infinite when nothing is near.
    pub fn hit_test(&self, point: Point) -> HitResult {
        match &self.geometry {
            Geometry::Line { start, end } => {
                let (nearpt, dist) = nearest_on_segment(point, *start, *end);
                HitResult {
                    dist,
                    nearpt,
                    segment: 0,
                    inside: false,
                }
            }
            Geometry::Rect(f) | Geometry::Image { frame: f, .. } => f.hit_test(point),
            Geometry::Grid(g) => g.frame.hit_test(point),
            Geometry::Ellipse(f) => {
                let mut res = Polyline::new(Self::ellipse_outline(f), true).hit_test(point);
                res.segment = -1;
                res
            }
            Geometry::Lines(p) | Geometry::Splines(p) => p.hit_test(point),
            Geometry::Dot { center } => HitResult {
                dist: point.distance(*center),
                nearpt: *center,
                segment: 0,
                inside: false,
            },
            Geometry::Group { children } => {
                let mut best = HitResult::default();
                for (i, child) in children.iter().enumerate() {
                    let res = child.hit_test(point);
                    if res.inside || res.dist < best.dist {
                        best = HitResult {
                            segment: i as i32,
                            inside: best.inside || res.inside,
                            ..res
                        };
                    }
                }
                best
            }
        }
    }

    /// Check whether the shape outline touches a rectangle.
    pub fn hit_test_box(&self, rect: Rect) -> bool {
        let ext = self.extent();
        if !rects_touch(ext, rect) {
            return false;
        }
        if rect_contains_rect(rect, ext) {
            return true;
        }
        match &self.geometry {
            Geometry::Line { start, end } => edges_touch_rect(&[*start, *end], false, rect),
            Geometry::Rect(f) | Geometry::Image { frame: f, .. } => {
                edges_touch_rect(&f.corners, true, rect)
            }
            Geometry::Grid(g) => edges_touch_rect(&g.frame.corners, true, rect),
            Geometry::Ellipse(f) => edges_touch_rect(&Self::ellipse_outline(f), true, rect),
            Geometry::Lines(p) | Geometry::Splines(p) => edges_touch_rect(&p.points, p.closed, rect),
            Geometry::Dot { center } => rect.contains(*center),
            Geometry::Group { children } => children.iter().any(|c| c.hit_test_box(rect)),
        }
    }

    pub fn handle_count(&self) -> usize {
        match &self.geometry {
            Geometry::Line { .. } => 3,
            Geometry::Rect(_) | Geometry::Image { .. } => RECT_HANDLE_COUNT,
            Geometry::Ellipse(_) => 5,
            Geometry::Grid(g) => g.handle_count(),
            Geometry::Lines(p) | Geometry::Splines(p) => p.len(),
            Geometry::Dot { .. } => 1,
            Geometry::Group { .. } => 5,
        }
    }

    pub fn handle_point(&self, index: usize) -> Point {
        match &self.geometry {
            Geometry::Line { start, end } => match index {
                0 => *start,
                1 => *end,
                _ => start.midpoint(*end),
            },
            Geometry::Rect(f) | Geometry::Image { frame: f, .. } => f.handle_point(index),
            // Quadrant points are the edge midpoints of the frame.
            Geometry::Ellipse(f) => f.handle_point(if index < 4 { index + 4 } else { 8 }),
            Geometry::Grid(g) => g.handle_point(index),
            Geometry::Lines(p) | Geometry::Splines(p) => {
                p.points.get(index).copied().unwrap_or(Point::ZERO)
            }
            Geometry::Dot { center } => *center,
            Geometry::Group { .. } => {
                let ext = self.extent();
                geom::rect_handle(ext, if index < 4 { index } else { 8 })
            }
        }
    }

    pub fn handle_type(&self, index: usize) -> HandleType {
        match &self.geometry {
            Geometry::Line { .. } => {
                if index < 2 {
                    HandleType::Vertex
                } else {
                    HandleType::MidPoint
                }
            }
            Geometry::Rect(f) | Geometry::Image { frame: f, .. } => f.handle_type(index),
            Geometry::Ellipse(_) => {
                if index < 4 {
                    HandleType::Quadrant
                } else {
                    HandleType::Center
                }
            }
            Geometry::Grid(g) => g.handle_type(index),
            Geometry::Lines(_) | Geometry::Splines(_) | Geometry::Dot { .. } => HandleType::Vertex,
            Geometry::Group { .. } => {
                if index < 4 {
                    HandleType::Outside
                } else {
                    HandleType::Center
                }
            }
        }
    }

    /// Fixed handles cannot be dragged individually.
    pub fn is_handle_fixed(&self, index: usize) -> bool {
        if self.flags.locked {
            return true;
        }
        match &self.geometry {
            Geometry::Rect(_) | Geometry::Ellipse(_) | Geometry::Image { .. } | Geometry::Grid(_) => {
                self.flags.fixed_size && self.handle_type(index) != HandleType::Center
            }
            _ => false,
        }
    }

    /// Drag one handle to `point`, honoring the fixed-length / fixed-size flags.
    pub fn set_handle_point(&mut self, index: usize, point: Point) -> bool {
        if index >= self.handle_count() || self.flags.locked {
            return false;
        }
        let fixed_length = self.flags.fixed_length;
        let fixed_size = self.flags.fixed_size;
        if fixed_size && self.handle_type(index) != HandleType::Center && self.is_rect_family() {
            let delta = point - self.handle_point(index);
            self.offset(delta, -1);
            return true;
        }
        if self.kind() == ShapeKind::Group {
            return self.set_group_handle(index, point);
        }
        let current = self.handle_point(index);
        match &mut self.geometry {
            Geometry::Line { start, end } => match index {
                0 | 1 => {
                    let (moving, anchor) = if index == 0 { (start, *end) } else { (end, *start) };
                    if fixed_length {
                        let len = moving.distance(anchor);
                        let dir = point - anchor;
                        if dir.hypot() > f64::EPSILON {
                            *moving = anchor + dir * (len / dir.hypot());
                        }
                    } else {
                        *moving = point;
                    }
                }
                _ => {
                    let delta = point - current;
                    *start += delta;
                    *end += delta;
                }
            },
            Geometry::Rect(f) | Geometry::Image { frame: f, .. } => {
                return f.set_handle_point(index, point);
            }
            Geometry::Ellipse(f) => {
                return f.set_handle_point(if index < 4 { index + 4 } else { 8 }, point);
            }
            Geometry::Grid(g) => return g.set_handle_point(index, point),
            Geometry::Lines(p) | Geometry::Splines(p) => {
                if fixed_length {
                    let delta = point - current;
                    p.offset(delta);
                } else if let Some(slot) = p.points.get_mut(index) {
                    *slot = point;
                }
            }
            Geometry::Dot { center } => *center = point,
            Geometry::Group { .. } => {}
        }
        true
    }

    fn set_group_handle(&mut self, index: usize, point: Point) -> bool {
        let ext = self.extent();
        if index < 4 {
            let newbox = geom::move_rect_handle(ext, index, point);
            match scale_between(ext, newbox) {
                Some(affine) => self.transform(affine),
                None => return false,
            }
        } else {
            self.offset(point - ext.center(), -1);
        }
        true
    }

    /// Move the shape, or only edge `segment` of a vertex-list shape when editable.
    pub fn offset(&mut self, delta: Vec2, segment: i32) {
        let fixed = self.flags.fixed_length || self.flags.fixed_size;
        match &mut self.geometry {
            Geometry::Line { start, end } => {
                *start += delta;
                *end += delta;
            }
            Geometry::Rect(f) | Geometry::Ellipse(f) | Geometry::Image { frame: f, .. } => {
                f.offset(delta)
            }
            Geometry::Grid(g) => g.offset(delta),
            Geometry::Lines(p) | Geometry::Splines(p) => {
                if segment < 0 || fixed || !p.offset_segment(segment as usize, delta) {
                    p.offset(delta);
                }
            }
            Geometry::Dot { center } => *center += delta,
            Geometry::Group { children } => {
                for child in children {
                    child.offset(delta, -1);
                }
            }
        }
    }

    pub fn transform(&mut self, affine: Affine) {
        match &mut self.geometry {
            Geometry::Line { start, end } => {
                *start = affine * *start;
                *end = affine * *end;
            }
            Geometry::Rect(f) | Geometry::Ellipse(f) | Geometry::Image { frame: f, .. } => {
                f.transform(affine)
            }
            Geometry::Grid(g) => g.transform(affine),
            Geometry::Lines(p) | Geometry::Splines(p) => p.transform(affine),
            Geometry::Dot { center } => *center = affine * *center,
            Geometry::Group { children } => {
                for child in children {
                    child.transform(affine);
                }
            }
        }
    }

    /// Insert a vertex into edge `segment` of a vertex-list shape.
    pub fn insert_point(&mut self, segment: i32, point: Point) -> bool {
        match (segment, self.polyline_mut()) {
            (s, Some(p)) if s >= 0 => p.insert_point(s as usize, point),
            _ => false,
        }
    }

    pub fn remove_point(&mut self, index: usize) -> bool {
        self.polyline_mut().is_some_and(|p| p.remove_point(index))
    }

    pub fn add_point(&mut self, point: Point) -> bool {
        match self.polyline_mut() {
            Some(p) => {
                p.add_point(point);
                true
            }
            None => false,
        }
    }
}

/// Affine map that scales `from` onto `to`, both axis-aligned.
pub fn scale_between(from: Rect, to: Rect) -> Option<Affine> {
    if from.width().abs() < f64::EPSILON || from.height().abs() < f64::EPSILON {
        return None;
    }
    let sx = to.width() / from.width();
    let sy = to.height() / from.height();
    let origin = Point::new(from.x0, from.y0);
    Some(
        Affine::translate(Vec2::new(to.x0, to.y0))
            * Affine::scale_non_uniform(sx, sy)
            * Affine::translate(-origin.to_vec2()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_handles() {
        let line = Shape::line(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        assert_eq!(line.handle_count(), 3);
        assert_eq!(line.handle_type(2), HandleType::MidPoint);
        assert_eq!(line.handle_point(2), Point::new(5.0, 0.0));
    }

    #[test]
    fn test_fixed_length_line_keeps_length() {
        let mut line = Shape::line(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        line.flags.fixed_length = true;
        line.set_handle_point(1, Point::new(0.0, 50.0));
        let end = line.point(1);
        assert!(end.x.abs() < 1e-9);
        assert!((end.y - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_locked_shape_rejects_edit() {
        let mut line = Shape::line(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        line.flags.locked = true;
        assert!(!line.set_handle_point(0, Point::new(5.0, 5.0)));
        assert!(line.is_handle_fixed(0));
    }

    #[test]
    fn test_rect_hit_test_box_modes() {
        let rect = Shape::rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(rect.hit_test_box(Rect::new(-5.0, -5.0, 20.0, 20.0)));
        assert!(rect.hit_test_box(Rect::new(5.0, -5.0, 20.0, 5.0)));
        assert!(!rect.hit_test_box(Rect::new(20.0, 20.0, 30.0, 30.0)));
    }

    #[test]
    fn test_ellipse_quadrant_handles() {
        let ellipse = Shape::ellipse(Rect::new(0.0, 0.0, 20.0, 10.0));
        assert_eq!(ellipse.handle_type(0), HandleType::Quadrant);
        assert_eq!(ellipse.handle_point(0), Point::new(10.0, 0.0));
        assert_eq!(ellipse.handle_point(4), Point::new(10.0, 5.0));
    }

    #[test]
    fn test_offset_segment_only_when_editable() {
        let pts = vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)];
        let mut shape = Shape::lines(pts, false);
        shape.offset(Vec2::new(0.0, 5.0), 0);
        assert_eq!(shape.point(0), Point::new(0.0, 5.0));
        assert_eq!(shape.point(2), Point::new(10.0, 10.0));

        shape.flags.fixed_length = true;
        shape.offset(Vec2::new(1.0, 0.0), 0);
        assert_eq!(shape.point(2), Point::new(11.0, 10.0));
    }

    #[test]
    fn test_group_extent_and_offset() {
        let mut group = Shape::group(vec![
            Shape::line(Point::new(0.0, 0.0), Point::new(10.0, 0.0)),
            Shape::rect(Rect::new(20.0, 20.0, 30.0, 30.0)),
        ]);
        assert_eq!(group.extent(), Rect::new(0.0, 0.0, 30.0, 30.0));
        group.offset(Vec2::new(5.0, 5.0), -1);
        assert_eq!(group.extent(), Rect::new(5.0, 5.0, 35.0, 35.0));
    }

    #[test]
    fn test_group_corner_scales_children() {
        let mut group = Shape::group(vec![Shape::rect(Rect::new(0.0, 0.0, 10.0, 10.0))]);
        group.set_handle_point(2, Point::new(20.0, 20.0));
        assert_eq!(group.extent(), Rect::new(0.0, 0.0, 20.0, 20.0));
    }

    #[test]
    fn test_geometry_json_roundtrip_keeps_kind() {
        let shape = Shape::lines(vec![Point::new(1.0, 2.0), Point::new(3.0, 4.0)], true);
        let json = serde_json::to_string(&shape).unwrap();
        assert!(json.contains("\"kind\":\"lines\""));
        let back: Shape = serde_json::from_str(&json).unwrap();
        assert_eq!(back, shape);
    }
}
