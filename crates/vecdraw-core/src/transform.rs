//! Model/display mapping for a view.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Millimeters per inch.
pub const MM_PER_INCH: f64 = 25.4;

/// Default display resolution in pixels per inch.
pub const DEFAULT_DPI: f64 = 96.0;

/// ViewTransform maps model coordinates to display pixels and back.
///
/// Display = model * zoom + offset. Tolerances given in millimeters are
/// converted through the display resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewTransform {
    /// Current translation offset (pan), in display pixels.
    pub offset: Vec2,
    /// Display pixels per model unit.
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Display pixels per inch.
    pub dpi: f64,
    /// Size of the view in display pixels.
    pub viewport: Size,
    /// Optional model-space region that edited shapes must stay inside.
    pub world_limits: Option<Rect>,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: 1.0,
            min_zoom: 0.05,
            max_zoom: 20.0,
            dpi: DEFAULT_DPI,
            viewport: Size::new(1024.0, 768.0),
            world_limits: None,
        }
    }
}

impl ViewTransform {
    pub fn new(viewport: Size) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }

    /// Transform from model to display coordinates.
    pub fn model_to_display(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.zoom)
    }

    /// Transform from display to model coordinates.
    pub fn display_to_model(&self) -> Affine {
        Affine::scale(1.0 / self.zoom) * Affine::translate(-self.offset)
    }

    pub fn to_model(&self, display_point: Point) -> Point {
        self.display_to_model() * display_point
    }

    pub fn to_display(&self, model_point: Point) -> Point {
        self.model_to_display() * model_point
    }

    pub fn rect_to_display(&self, rect: Rect) -> Rect {
        Rect::from_points(self.to_display(rect.origin()), self.to_display(Point::new(rect.x1, rect.y1)))
    }

    /// Length in display pixels to model units.
    pub fn display_to_model_len(&self, pixels: f64) -> f64 {
        pixels / self.zoom
    }

    /// Millimeters on screen to display pixels.
    pub fn mm_to_display(&self, mm: f64) -> f64 {
        mm * self.dpi / MM_PER_INCH
    }

    /// Millimeters on screen to model units at the current zoom.
    pub fn mm_to_model(&self, mm: f64) -> f64 {
        self.display_to_model_len(self.mm_to_display(mm))
    }

    /// Visible part of the model.
    pub fn model_view_rect(&self) -> Rect {
        let a = self.to_model(Point::ZERO);
        let b = self.to_model(Point::new(self.viewport.width, self.viewport.height));
        Rect::from_points(a, b)
    }

    pub fn display_view_rect(&self) -> Rect {
        Rect::from_origin_size(Point::ZERO, self.viewport)
    }

    /// Pan the view by a delta in display pixels.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Zoom the view, keeping the given display point fixed.
    pub fn zoom_at(&mut self, display_point: Point, factor: f64) {
        let new_zoom = (self.zoom * factor).clamp(self.min_zoom, self.max_zoom);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }
        let model_point = self.to_model(display_point);
        self.zoom = new_zoom;
        let moved = self.to_display(model_point);
        self.offset += display_point - moved;
    }

    /// Fit the view to show the given model rect.
    pub fn zoom_to_extent(&mut self, bounds: Rect, padding: f64) -> bool {
        if bounds.is_zero_area() {
            return false;
        }
        let width = (self.viewport.width - padding * 2.0).max(1.0);
        let height = (self.viewport.height - padding * 2.0).max(1.0);
        self.zoom = (width / bounds.width())
            .min(height / bounds.height())
            .clamp(self.min_zoom, self.max_zoom);
        let center = bounds.center();
        self.offset = Vec2::new(
            self.viewport.width / 2.0 - center.x * self.zoom,
            self.viewport.height / 2.0 - center.y * self.zoom,
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_identity() {
        let view = ViewTransform::default();
        let p = view.to_model(Point::new(100.0, 200.0));
        assert!((p.x - 100.0).abs() < f64::EPSILON);
        assert!((p.y - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_offset_and_zoom() {
        let view = ViewTransform {
            offset: Vec2::new(50.0, 100.0),
            zoom: 2.0,
            ..ViewTransform::default()
        };
        let p = view.to_model(Point::new(150.0, 300.0));
        assert!((p.x - 50.0).abs() < f64::EPSILON);
        assert!((p.y - 100.0).abs() < f64::EPSILON);
        let back = view.to_display(p);
        assert!((back.x - 150.0).abs() < 1e-10);
    }

    #[test]
    fn test_mm_conversion() {
        let mut view = ViewTransform::default();
        assert!((view.mm_to_display(25.4) - 96.0).abs() < 1e-10);
        view.zoom = 2.0;
        assert!((view.mm_to_model(25.4) - 48.0).abs() < 1e-10);
    }

    #[test]
    fn test_model_view_rect() {
        let view = ViewTransform {
            zoom: 2.0,
            viewport: Size::new(200.0, 100.0),
            ..ViewTransform::default()
        };
        assert_eq!(view.model_view_rect(), Rect::new(0.0, 0.0, 100.0, 50.0));
    }

    #[test]
    fn test_zoom_at_keeps_point() {
        let mut view = ViewTransform::default();
        let anchor = Point::new(300.0, 200.0);
        let before = view.to_model(anchor);
        view.zoom_at(anchor, 2.0);
        let after = view.to_model(anchor);
        assert!((before.x - after.x).abs() < 1e-10);
        assert!((before.y - after.y).abs() < 1e-10);
    }

    #[test]
    fn test_zoom_to_extent() {
        let mut view = ViewTransform::new(Size::new(100.0, 100.0));
        assert!(view.zoom_to_extent(Rect::new(0.0, 0.0, 50.0, 25.0), 0.0));
        assert!((view.zoom - 2.0).abs() < f64::EPSILON);
        assert!(!view.zoom_to_extent(Rect::ZERO, 0.0));
    }
}
