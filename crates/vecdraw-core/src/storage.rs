//! Parameter storage handed to commands, and document persistence helpers.
//!
//! Commands read their `setCommand` parameters through [`ParamStorage`]; the
//! concrete [`CmdParams`] is a JSON object.

use crate::document::ShapeDocument;
use kurbo::Point;
use serde_json::{Map, Value};
use std::path::Path;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Missing key: {0}")]
    MissingKey(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Key/value access used by commands to read and write their parameters.
pub trait ParamStorage {
    fn read_f64(&self, key: &str, default: f64) -> f64;
    fn read_u32(&self, key: &str, default: u32) -> u32;
    fn read_bool(&self, key: &str, default: bool) -> bool;
    /// Read a flat array of numbers; empty when the key is absent.
    fn read_f64_array(&self, key: &str) -> Vec<f64>;
    fn write_f64(&mut self, key: &str, value: f64);
    fn write_u32(&mut self, key: &str, value: u32);
    fn write_bool(&mut self, key: &str, value: bool);

    /// Read a flat `[x0, y0, x1, y1, ...]` array as points; a dangling coordinate is ignored.
    fn read_points(&self, key: &str) -> Vec<Point> {
        self.read_f64_array(key)
            .chunks_exact(2)
            .map(|c| Point::new(c[0], c[1]))
            .collect()
    }
}

/// Command parameters backed by a JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CmdParams {
    values: Map<String, Value>,
}

impl CmdParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse parameters from a JSON object; an empty string gives no parameters.
    pub fn from_json(json: &str) -> StorageResult<Self> {
        if json.trim().is_empty() {
            return Ok(Self::new());
        }
        let value: Value = serde_json::from_str(json)?;
        Ok(Self::from_value(value))
    }

    /// Non-object values give empty parameters.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(values) => Self { values },
            _ => Self::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    /// Nested parameter object.
    pub fn node(&self, key: &str) -> StorageResult<CmdParams> {
        match self.values.get(key) {
            Some(Value::Object(values)) => Ok(Self {
                values: values.clone(),
            }),
            _ => Err(StorageError::MissingKey(key.to_string())),
        }
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.values.clone())
    }
}

impl ParamStorage for CmdParams {
    fn read_f64(&self, key: &str, default: f64) -> f64 {
        self.values.get(key).and_then(Value::as_f64).unwrap_or(default)
    }

    fn read_u32(&self, key: &str, default: u32) -> u32 {
        self.values
            .get(key)
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(default)
    }

    fn read_bool(&self, key: &str, default: bool) -> bool {
        match self.values.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
            _ => default,
        }
    }

    fn read_f64_array(&self, key: &str) -> Vec<f64> {
        self.values
            .get(key)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_f64).collect())
            .unwrap_or_default()
    }

    fn write_f64(&mut self, key: &str, value: f64) {
        self.values.insert(key.to_string(), Value::from(value));
    }

    fn write_u32(&mut self, key: &str, value: u32) {
        self.values.insert(key.to_string(), Value::from(value));
    }

    fn write_bool(&mut self, key: &str, value: bool) {
        self.values.insert(key.to_string(), Value::from(value));
    }
}

/// Write a document to a JSON file.
pub fn save_document(path: &Path, document: &ShapeDocument) -> StorageResult<()> {
    let json = document.to_json()?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Read a document from a JSON file.
pub fn load_document(path: &Path) -> StorageResult<ShapeDocument> {
    let json = std::fs::read_to_string(path)?;
    Ok(ShapeDocument::from_json(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_with_defaults() {
        let params = CmdParams::from_json(r#"{"maxEdges": 4, "locked": 1, "lineWidth": 2.5}"#).unwrap();
        assert_eq!(params.read_u32("maxEdges", 20), 4);
        assert!(params.read_bool("locked", false));
        assert!(!params.read_bool("fixedlen", false));
        assert!((params.read_f64("lineWidth", 1.0) - 2.5).abs() < f64::EPSILON);
        assert_eq!(params.read_u32("missing", 7), 7);
    }

    #[test]
    fn test_read_points_ignores_dangling() {
        let params = CmdParams::from_json(r#"{"points": [0, 0, 100, 0, 5]}"#).unwrap();
        let pts = params.read_points("points");
        assert_eq!(pts, vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)]);
    }

    #[test]
    fn test_empty_and_invalid() {
        assert!(CmdParams::from_json("").unwrap().is_empty());
        assert!(CmdParams::from_value(Value::from(3)).is_empty());
        assert!(matches!(CmdParams::from_json("{"), Err(StorageError::Parse(_))));
        assert!(matches!(
            CmdParams::new().node("style"),
            Err(StorageError::MissingKey(_))
        ));
    }

    #[test]
    fn test_write_then_read() {
        let mut params = CmdParams::new();
        params.write_u32("lineRGB", 0xFF0000);
        params.write_bool("fixedsize", true);
        assert_eq!(params.read_u32("lineRGB", 0), 0xFF0000);
        assert!(params.read_bool("fixedsize", false));
    }

    #[test]
    fn test_document_file_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drawing.json");
        let mut doc = ShapeDocument::new();
        let id = doc.add_shape(crate::shapes::Shape::line(Point::new(0.0, 0.0), Point::new(50.0, 0.0)));
        save_document(&path, &doc).unwrap();

        let loaded = load_document(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded.contains(id));

        let missing = load_document(&dir.path().join("missing.json"));
        assert!(matches!(missing, Err(StorageError::Io(_))));
    }
}
