#![forbid(unsafe_code)]

//! Tunable layout parameters.
//!
//! Every constant the snap engine, auto-relayout, keyboard nudging and the
//! scale clamp depend on lives in one [`LayoutConfig`] that can be loaded
//! from TOML or JSON at startup.
//!
//! # Loading
//!
//! ```toml
//! # hudkit-layout.toml
//! [snap]
//! threshold = 6.0
//! gap = 12.0
//!
//! [nudge]
//! coarse_step = 20.0
//! ```
//!
//! ```rust,ignore
//! let config = LayoutConfig::from_toml_file("hudkit-layout.toml")?;
//! let config = LayoutConfig::from_json_str(json)?;
//! ```
//!
//! # Defaults
//!
//! Omitted sections and fields keep their defaults, so an empty document
//! yields [`LayoutConfig::default()`].

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level layout configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub snap: SnapConfig,
    pub relayout: RelayoutConfig,
    pub nudge: NudgeConfig,
    pub scale: ScaleConfig,
}

/// Snap-to-neighbor parameters, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapConfig {
    /// Corrections must be strictly smaller than this to snap.
    pub threshold: f64,
    /// Spacing enforced by gap rules.
    pub gap: f64,
    /// Gap rules apply only when the perpendicular axis is this close.
    pub proximity: f64,
    /// Farthest a directional jump may travel.
    pub max_search_distance: f64,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            threshold: 8.0,
            gap: 10.0,
            proximity: 100.0,
            max_search_distance: 100.0,
        }
    }
}

/// Auto-relayout parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayoutConfig {
    /// A widget within this distance of its default (on both axes) counts as
    /// sitting at the default.
    pub tolerance_px: f64,
}

impl Default for RelayoutConfig {
    fn default() -> Self {
        Self { tolerance_px: 2.0 }
    }
}

/// Keyboard nudge step sizes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NudgeConfig {
    pub step: f64,
    pub coarse_step: f64,
}

impl Default for NudgeConfig {
    fn default() -> Self {
        Self {
            step: 1.0,
            coarse_step: 10.0,
        }
    }
}

/// Allowed range for per-widget scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleConfig {
    pub min: f64,
    pub max: f64,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self { min: 0.5, max: 2.0 }
    }
}

impl ScaleConfig {
    /// Clamp a requested scale; non-finite input maps to 1.0 first.
    /// `max` wins over `min` when the range is inverted.
    #[must_use]
    pub fn clamp(&self, scale: f64) -> f64 {
        let scale = if scale.is_finite() { scale } else { 1.0 };
        scale.max(self.min).min(self.max)
    }
}

impl LayoutConfig {
    /// Load from a TOML string and validate.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validated()
    }

    /// Load from a TOML file on disk and validate.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string and validate.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validated()
    }

    fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Check every parameter; an empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let positive = [
            ("snap.threshold", self.snap.threshold),
            ("snap.max_search_distance", self.snap.max_search_distance),
            ("nudge.step", self.nudge.step),
            ("nudge.coarse_step", self.nudge.coarse_step),
            ("scale.min", self.scale.min),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                errors.push(format!("{name} must be > 0, got {value}"));
            }
        }

        let non_negative = [
            ("snap.gap", self.snap.gap),
            ("snap.proximity", self.snap.proximity),
            ("relayout.tolerance_px", self.relayout.tolerance_px),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                errors.push(format!("{name} must be >= 0, got {value}"));
            }
        }

        if !(self.scale.max.is_finite() && self.scale.max >= self.scale.min) {
            errors.push(format!(
                "scale.max must be >= scale.min ({}), got {}",
                self.scale.min, self.scale.max
            ));
        }

        errors
    }
}

/// Failure to load a [`LayoutConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = LayoutConfig::default();
        assert!(config.validate().is_empty());
        assert_eq!(config.snap.threshold, 8.0);
        assert_eq!(config.snap.gap, 10.0);
        assert_eq!(config.snap.proximity, 100.0);
        assert_eq!(config.snap.max_search_distance, 100.0);
        assert_eq!(config.relayout.tolerance_px, 2.0);
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(LayoutConfig::from_toml_str("").unwrap(), LayoutConfig::default());
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let config = LayoutConfig::from_toml_str(
            r#"
            [snap]
            threshold = 6.0

            [nudge]
            coarse_step = 20.0
            "#,
        )
        .unwrap();
        assert_eq!(config.snap.threshold, 6.0);
        assert_eq!(config.snap.gap, 10.0);
        assert_eq!(config.nudge.coarse_step, 20.0);
        assert_eq!(config.nudge.step, 1.0);
    }

    #[test]
    fn json_is_accepted() {
        let config = LayoutConfig::from_json_str(r#"{"relayout": {"tolerance_px": 4.0}}"#).unwrap();
        assert_eq!(config.relayout.tolerance_px, 4.0);
    }

    #[test]
    fn invalid_values_are_listed() {
        let err = LayoutConfig::from_toml_str(
            r#"
            [snap]
            threshold = 0.0
            [scale]
            min = 2.0
            max = 1.0
            "#,
        )
        .unwrap_err();
        match err {
            ConfigError::Validation(errors) => {
                assert_eq!(errors.len(), 2);
                assert!(errors[0].starts_with("snap.threshold"));
                assert!(errors[1].starts_with("scale.max"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(
            LayoutConfig::from_toml_str("[snap\nthreshold = "),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn toml_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.toml");
        std::fs::write(&path, "[scale]\nmax = 3.0\n").unwrap();
        let config = LayoutConfig::from_toml_file(&path).unwrap();
        assert_eq!(config.scale.max, 3.0);
        assert!(matches!(
            LayoutConfig::from_toml_file(dir.path().join("missing.toml")),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn scale_clamp() {
        let scale = ScaleConfig::default();
        assert_eq!(scale.clamp(0.1), 0.5);
        assert_eq!(scale.clamp(5.0), 2.0);
        assert_eq!(scale.clamp(1.25), 1.25);
        assert_eq!(scale.clamp(f64::NAN), 1.0);
    }
}
