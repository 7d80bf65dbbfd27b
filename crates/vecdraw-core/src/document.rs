//! Shape document: an id-keyed arena of shapes with a z-order.

use crate::shapes::geom::{rect_contains_rect, rects_touch};
use crate::shapes::{HitResult, NO_SHAPE, Shape, ShapeId};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A document containing all committed shapes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapeDocument {
    /// Unique document identifier.
    pub id: String,
    /// All shapes in the document, keyed by ID.
    shapes: HashMap<ShapeId, Shape>,
    /// Z-order of shapes (back to front).
    z_order: Vec<ShapeId>,
    /// Next id to hand out; ids are never reused within a document.
    next_id: ShapeId,
}

impl Default for ShapeDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl ShapeDocument {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            shapes: HashMap::new(),
            z_order: Vec::new(),
            next_id: 1,
        }
    }

    /// Add a shape on top of the z-order, assigning it a fresh id.
    pub fn add_shape(&mut self, mut shape: Shape) -> ShapeId {
        let id = self.next_id;
        self.next_id += 1;
        shape.id = id;
        self.z_order.push(id);
        self.shapes.insert(id, shape);
        id
    }

    /// Replace the geometry, flags and style of an existing shape, keeping its id.
    pub fn update_shape(&mut self, id: ShapeId, mut shape: Shape) -> bool {
        match self.shapes.get_mut(&id) {
            Some(slot) => {
                shape.id = id;
                *slot = shape;
                true
            }
            None => false,
        }
    }

    /// Remove a shape from the document.
    pub fn remove_shape(&mut self, id: ShapeId) -> Option<Shape> {
        self.z_order.retain(|&shape_id| shape_id != id);
        self.shapes.remove(&id)
    }

    /// Clear all shapes from the document.
    pub fn clear(&mut self) {
        self.shapes.clear();
        self.z_order.clear();
    }

    pub fn find_shape(&self, id: ShapeId) -> Option<&Shape> {
        if id == NO_SHAPE {
            return None;
        }
        self.shapes.get(&id)
    }

    pub fn find_shape_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.get_mut(&id)
    }

    pub fn contains(&self, id: ShapeId) -> bool {
        self.shapes.contains_key(&id)
    }

    /// Get shapes in z-order (back to front).
    pub fn shapes_ordered(&self) -> impl Iterator<Item = &Shape> {
        self.z_order.iter().filter_map(|id| self.shapes.get(id))
    }

    /// Ids in z-order (back to front).
    pub fn ids(&self) -> &[ShapeId] {
        &self.z_order
    }

    /// Z-order position of a shape.
    pub fn index_of(&self, id: ShapeId) -> Option<usize> {
        self.z_order.iter().position(|&shape_id| shape_id == id)
    }

    /// Bring a shape to the front (topmost).
    pub fn bring_to_front(&mut self, id: ShapeId) {
        if self.contains(id) {
            self.z_order.retain(|&shape_id| shape_id != id);
            self.z_order.push(id);
        }
    }

    /// Bounding box of all shapes, zero when empty.
    pub fn extent(&self) -> Rect {
        self.shapes_ordered()
            .map(Shape::extent)
            .reduce(|a, b| a.union(b))
            .unwrap_or(Rect::ZERO)
    }

    /// Find the shape nearest to `point` within `tol`.
    ///
    /// Ties go to the front-most shape. A point inside a filled closed shape
    /// hits it even when its outline is farther away than `tol`.
    pub fn hit_test(
        &self,
        point: Point,
        tol: f64,
        filter: impl Fn(&Shape) -> bool,
    ) -> Option<(ShapeId, HitResult)> {
        let probe = Rect::from_center_size(point, (2.0 * tol, 2.0 * tol));
        let mut best: Option<(ShapeId, HitResult)> = None;
        for shape in self.shapes_ordered() {
            if shape.flags.hidden || !filter(shape) {
                continue;
            }
            let inside_fill = shape.style.has_fill() && shape.extent().contains(point);
            if !inside_fill && !rects_touch(shape.extent(), probe) {
                continue;
            }
            let mut res = shape.hit_test(point);
            if res.inside && shape.style.has_fill() {
                res.dist = res.dist.min(tol);
            }
            if res.dist > tol {
                continue;
            }
            if best.as_ref().is_none_or(|(_, b)| res.dist <= b.dist) {
                best = Some((shape.id, res));
            }
        }
        best
    }

    /// Shapes touching `rect` (intersect mode) or fully inside it (contains mode).
    pub fn shapes_in_rect(&self, rect: Rect, intersect: bool) -> Vec<ShapeId> {
        let rect = rect.abs();
        self.shapes_ordered()
            .filter(|s| !s.flags.hidden)
            .filter(|s| {
                if intersect {
                    s.hit_test_box(rect)
                } else {
                    rect_contains_rect(rect, s.extent())
                }
            })
            .map(Shape::id)
            .collect()
    }

    /// Check if the document is empty.
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Get the number of shapes.
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Group the given shapes into a single group placed at the front-most member's depth.
    /// Returns the new group's id, or None if fewer than 2 shapes were found.
    pub fn group_shapes(&mut self, shape_ids: &[ShapeId]) -> Option<ShapeId> {
        let members: Vec<(usize, ShapeId)> = self
            .z_order
            .iter()
            .enumerate()
            .filter(|(_, id)| shape_ids.contains(id))
            .map(|(idx, id)| (idx, *id))
            .collect();
        if members.len() < 2 {
            return None;
        }
        let max_z_idx = members.iter().map(|(idx, _)| *idx).max()?;
        let children: Vec<Shape> = members
            .iter()
            .filter_map(|(_, id)| self.remove_shape(*id))
            .collect();

        let group_id = self.add_shape(Shape::group(children));
        self.z_order.pop();
        let insert_pos = (max_z_idx + 1).saturating_sub(members.len()).min(self.z_order.len());
        self.z_order.insert(insert_pos, group_id);
        Some(group_id)
    }

    /// Ungroup a group shape, returning its children to the document with fresh ids.
    pub fn ungroup_shape(&mut self, group_id: ShapeId) -> Option<Vec<ShapeId>> {
        let z_pos = self.index_of(group_id)?;
        let children = self.find_shape(group_id)?.children()?.to_vec();
        self.remove_shape(group_id);

        let mut child_ids = Vec::with_capacity(children.len());
        for (i, child) in children.into_iter().enumerate() {
            let child_id = self.add_shape(child);
            self.z_order.pop();
            self.z_order.insert(z_pos + i, child_id);
            child_ids.push(child_id);
        }
        Some(child_ids)
    }

    /// Serialize the document to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a document from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::SerializableColor;

    fn sample() -> ShapeDocument {
        let mut doc = ShapeDocument::new();
        doc.add_shape(Shape::line(Point::new(0.0, 0.0), Point::new(100.0, 0.0)));
        doc.add_shape(Shape::rect(Rect::new(50.0, 50.0, 150.0, 150.0)));
        doc
    }

    #[test]
    fn test_document_creation() {
        let doc = ShapeDocument::new();
        assert!(doc.is_empty());
        assert!(doc.extent() == Rect::ZERO);
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut doc = sample();
        let removed = doc.remove_shape(2);
        assert!(removed.is_some());
        let id = doc.add_shape(Shape::dot(Point::new(1.0, 1.0)));
        assert_eq!(id, 3);
        assert_eq!(doc.find_shape(3).map(Shape::id), Some(3));
        assert!(doc.find_shape(NO_SHAPE).is_none());
    }

    #[test]
    fn test_hit_test_prefers_nearest() {
        let doc = sample();
        let (id, res) = doc.hit_test(Point::new(60.0, 2.0), 5.0, |_| true).unwrap();
        assert_eq!(id, 1);
        assert!((res.dist - 2.0).abs() < f64::EPSILON);
        assert!(doc.hit_test(Point::new(300.0, 300.0), 5.0, |_| true).is_none());
    }

    #[test]
    fn test_hit_test_inside_filled_shape() {
        let mut doc = ShapeDocument::new();
        let mut rect = Shape::rect(Rect::new(0.0, 0.0, 100.0, 100.0));
        rect.style.fill_color = Some(SerializableColor::black());
        let id = doc.add_shape(rect);
        let (hit, _) = doc.hit_test(Point::new(50.0, 50.0), 5.0, |_| true).unwrap();
        assert_eq!(hit, id);
    }

    #[test]
    fn test_hit_test_filter() {
        let doc = sample();
        assert!(doc.hit_test(Point::new(60.0, 2.0), 5.0, |s| s.id() != 1).is_none());
    }

    #[test]
    fn test_shapes_in_rect_modes() {
        let doc = sample();
        let rect = Rect::new(-10.0, -10.0, 110.0, 110.0);
        assert_eq!(doc.shapes_in_rect(rect, false), vec![1]);
        assert_eq!(doc.shapes_in_rect(rect, true), vec![1, 2]);
    }

    #[test]
    fn test_group_and_ungroup() {
        let mut doc = sample();
        doc.add_shape(Shape::dot(Point::new(5.0, 5.0)));
        let gid = doc.group_shapes(&[1, 2]).unwrap();
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.ids(), &[gid, 3]);

        let children = doc.ungroup_shape(gid).unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(doc.ids()[2], 3);
        assert!(doc.group_shapes(&[3]).is_none());
    }

    #[test]
    fn test_json_roundtrip() {
        let doc = sample();
        let json = doc.to_json().unwrap();
        let back = ShapeDocument::from_json(&json).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back.ids(), doc.ids());
        assert_eq!(back.find_shape(2), doc.find_shape(2));
    }
}
