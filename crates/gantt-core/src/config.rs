#![forbid(unsafe_code)]

//! Engine configuration as data.
//!
//! [`EngineConfig`] groups every tunable of the engine so that a host can
//! ship them in a TOML file instead of recompiling:
//!
//! ```toml
//! [widths]
//! day_px = 40.0
//! week_px = 77.0
//!
//! [auto_scroll]
//! edge_threshold_px = 48.0
//! period_ms = 150
//!
//! [animation]
//! max_duration_ms = 500
//! ```
//!
//! # Defaults
//!
//! Every field defaults to the reference UI's values, so
//! `EngineConfig::default()` needs no file at all. Missing keys fall back to
//! defaults individually.

#[cfg(feature = "config-toml")]
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::drag::DragConfig;
use crate::navigation::NavigationConfig;
use crate::units::{ColumnWidths, DisplayMode};

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Edge auto-scroll while dragging.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoScrollConfig {
    /// Distance from a surface edge (px) that starts scrolling.
    pub edge_threshold_px: f64,
    /// Timer period between viewport shifts.
    pub period_ms: u64,
    /// Days shifted per tick in Day mode.
    pub step_days_day: u32,
    /// Days shifted per tick in Week mode.
    pub step_days_week: u32,
}

impl Default for AutoScrollConfig {
    fn default() -> Self {
        Self {
            edge_threshold_px: 50.0,
            period_ms: 150,
            step_days_day: 1,
            step_days_week: 7,
        }
    }
}

impl AutoScrollConfig {
    #[must_use]
    pub const fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    /// Days per tick for `mode`.
    #[must_use]
    pub const fn step_days(&self, mode: DisplayMode) -> u32 {
        match mode {
            DisplayMode::Day => self.step_days_day,
            DisplayMode::Week => self.step_days_week,
        }
    }
}

/// Viewport transition timing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Duration added per day of distance.
    pub ms_per_day: u64,
    /// Upper bound for any navigation transition.
    pub max_duration_ms: u64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            ms_per_day: 10,
            max_duration_ms: 500,
        }
    }
}

impl AnimationConfig {
    /// `min(max_duration, days * ms_per_day)`.
    #[must_use]
    pub fn duration_for(&self, days: u64) -> Duration {
        let ms = days.saturating_mul(self.ms_per_day).min(self.max_duration_ms);
        Duration::from_millis(ms)
    }

    #[must_use]
    pub const fn max_duration(&self) -> Duration {
        Duration::from_millis(self.max_duration_ms)
    }
}

/// Persistence rate limiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Minimum time between two writes for the same subject.
    pub min_interval_ms: u64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 250,
        }
    }
}

impl PersistenceConfig {
    #[must_use]
    pub const fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// All engine tunables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub widths: ColumnWidths,
    pub drag: DragConfig,
    pub auto_scroll: AutoScrollConfig,
    pub animation: AnimationConfig,
    pub persistence: PersistenceConfig,
    pub navigation: NavigationConfig,
}

/// Errors from loading an [`EngineConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// Reading the file failed.
    Io(std::io::Error),
    /// The file is not valid TOML for this schema.
    #[cfg(feature = "config-toml")]
    Toml(toml::de::Error),
    /// Parsed, but some values are out of range.
    Invalid(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error reading config: {e}"),
            #[cfg(feature = "config-toml")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            Self::Invalid(errors) => write!(f, "invalid config: {}", errors.join("; ")),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "config-toml")]
            Self::Toml(e) => Some(e),
            Self::Invalid(_) => None,
        }
    }
}

impl EngineConfig {
    /// Parse from a TOML string and validate.
    #[cfg(feature = "config-toml")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(ConfigError::Toml)?;
        config.validated()
    }

    /// Read a TOML file and validate.
    #[cfg(feature = "config-toml")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Problems with the current values. Empty means valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !self.widths.is_valid() {
            errors.push(format!(
                "widths must be finite and > 0 (day_px={}, week_px={})",
                self.widths.day_px, self.widths.week_px
            ));
        }
        let h = self.drag.snap_hysteresis;
        if !(h.is_finite() && (0.0..1.0).contains(&h)) {
            errors.push(format!("drag.snap_hysteresis must be in [0, 1), got {h}"));
        }
        if self.drag.min_span_days < 0 {
            errors.push(format!(
                "drag.min_span_days must be >= 0, got {}",
                self.drag.min_span_days
            ));
        }
        let edge = self.auto_scroll.edge_threshold_px;
        if !(edge.is_finite() && edge >= 0.0) {
            errors.push(format!("auto_scroll.edge_threshold_px must be >= 0, got {edge}"));
        }
        if self.auto_scroll.period_ms == 0 {
            errors.push("auto_scroll.period_ms must be > 0".to_string());
        }
        if self.auto_scroll.step_days_day == 0 || self.auto_scroll.step_days_week == 0 {
            errors.push("auto_scroll step days must be > 0".to_string());
        }
        let lead = self.navigation.lead_fraction;
        if !(lead.is_finite() && (0.0..=1.0).contains(&lead)) {
            errors.push(format!("navigation.lead_fraction must be in [0, 1], got {lead}"));
        }
        if self.navigation.page_days == Some(0) {
            errors.push("navigation.page_days must be > 0 when set".to_string());
        }

        errors
    }

    /// `self` if valid, otherwise every problem found.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_empty());
    }

    #[test]
    fn duration_scales_then_caps() {
        let anim = AnimationConfig::default();
        assert_eq!(anim.duration_for(1), Duration::from_millis(10));
        assert_eq!(anim.duration_for(30), Duration::from_millis(300));
        assert_eq!(anim.duration_for(400), anim.max_duration());
        assert_eq!(anim.duration_for(u64::MAX), anim.max_duration());
    }

    #[test]
    fn step_days_per_mode() {
        let scroll = AutoScrollConfig::default();
        assert_eq!(scroll.step_days(DisplayMode::Day), 1);
        assert_eq!(scroll.step_days(DisplayMode::Week), 7);
        assert_eq!(scroll.period(), Duration::from_millis(150));
    }

    #[test]
    fn validation_collects_every_problem() {
        let mut config = EngineConfig::default();
        config.widths.day_px = 0.0;
        config.drag.snap_hysteresis = 1.5;
        config.auto_scroll.period_ms = 0;
        let errors = config.validate();
        assert_eq!(errors.len(), 3, "{errors:?}");
        assert!(matches!(
            EngineConfig {
                navigation: NavigationConfig {
                    page_days: Some(0),
                    ..NavigationConfig::default()
                },
                ..EngineConfig::default()
            }
            .validated(),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[cfg(feature = "config-toml")]
    #[test]
    fn partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            [widths]
            day_px = 32.0

            [auto_scroll]
            period_ms = 100
            "#,
        )
        .unwrap();
        assert_eq!(config.widths.day_px, 32.0);
        assert_eq!(config.widths.week_px, 77.0);
        assert_eq!(config.auto_scroll.period_ms, 100);
        assert_eq!(config.auto_scroll.step_days_week, 7);
        assert_eq!(config.animation, AnimationConfig::default());
    }

    #[cfg(feature = "config-toml")]
    #[test]
    fn invalid_toml_values_are_reported() {
        let err = EngineConfig::from_toml_str("[drag]\nsnap_hysteresis = -0.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref e) if e.len() == 1), "{err}");
        let err = EngineConfig::from_toml_str("[widths\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[cfg(feature = "config-toml")]
    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gantt.toml");
        std::fs::write(&path, "[persistence]\nmin_interval_ms = 40\n").unwrap();
        let config = EngineConfig::from_toml_file(&path).unwrap();
        assert_eq!(config.persistence.min_interval(), Duration::from_millis(40));
        assert!(matches!(
            EngineConfig::from_toml_file(dir.path().join("missing.toml")),
            Err(ConfigError::Io(_))
        ));
    }
}
