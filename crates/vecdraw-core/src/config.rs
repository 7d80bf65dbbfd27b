//! Engine configuration.

use crate::snap::SnapOptions;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Tunables shared by the command manager and its commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Touch input uses full millimeter tolerances; mouse input halves them.
    /// `None` asks the host on the first gesture.
    pub use_finger: Option<bool>,
    pub lock_timeout_ms: u64,
    /// Bit set of [`SnapOptions`].
    pub snap_options: u32,
    pub snap_enabled: bool,
    pub new_shape_fixed_length: bool,
    pub new_shape_locked: bool,
    /// Draw commands hand control back to select after one shape.
    pub draw_one_shape: bool,
    /// Taps in a draw command do not jump to the tapped shape.
    pub not_click_select_in_draw_cmd: bool,
    pub hit_test_tol_mm: f64,
    /// Box selection picks shapes that touch the box, not only those inside it.
    pub select_box_intersect: bool,
    pub erase_box_intersect: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            use_finger: None,
            lock_timeout_ms: 200,
            snap_options: SnapOptions::default().bits(),
            snap_enabled: true,
            new_shape_fixed_length: false,
            new_shape_locked: false,
            draw_one_shape: false,
            not_click_select_in_draw_cmd: false,
            hit_test_tol_mm: 10.0,
            select_box_intersect: true,
            erase_box_intersect: true,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a config from JSON; missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.hit_test_tol_mm.is_finite() && self.hit_test_tol_mm > 0.0) {
            return Err(ConfigError::Invalid {
                field: "hit_test_tol_mm",
                reason: format!("must be positive, got {}", self.hit_test_tol_mm),
            });
        }
        if self.lock_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "lock_timeout_ms",
                reason: "must be nonzero".to_string(),
            });
        }
        Ok(())
    }

    pub fn snap_options(&self) -> SnapOptions {
        SnapOptions::from_bits(self.snap_options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert!(config.select_box_intersect);
        assert!((config.hit_test_tol_mm - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_partial_override() {
        let config =
            EngineConfig::from_json(r#"{"use_finger": true, "erase_box_intersect": false}"#).unwrap();
        assert_eq!(config.use_finger, Some(true));
        assert!(!config.erase_box_intersect);
        assert_eq!(config.lock_timeout_ms, 200);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            EngineConfig::from_json(r#"{"hit_test_tol_mm": -1}"#),
            Err(ConfigError::Invalid { field: "hit_test_tol_mm", .. })
        ));
        assert!(matches!(
            EngineConfig::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
