//! Engine tuning configuration.
//!
//! The follow dead zone and the drift thresholds were tuned by hand against
//! real recordings. They live here as named defaults that a config file can
//! override, rather than as literals inside the engine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{FramecamError, FramecamResult};

/// Dead zone (source pixels) for mouse-follow when an effect doesn't set one.
pub const DEFAULT_MOUSE_IDLE_PX: f64 = 8.0;

/// Boundary hold/crossfade window in milliseconds.
pub const DEFAULT_CROSSFADE_MS: f64 = 0.0;

pub const DEFAULT_DRIFT_ENABLE_THRESHOLD_SECS: f64 = 0.15;
pub const DEFAULT_DRIFT_DISABLE_THRESHOLD_SECS: f64 = 0.08;
pub const DEFAULT_MAX_RATE_NUDGE: f64 = 0.10;
pub const DEFAULT_NUDGE_GAIN: f64 = 0.5;
pub const DEFAULT_HARD_SEEK_DRIFT_SECS: f64 = 1.25;
pub const DEFAULT_HARD_SEEK_SUSTAIN_MS: f64 = 1000.0;
pub const DEFAULT_POST_SEEK_GRACE_MS: f64 = 800.0;
pub const DEFAULT_JUMP_FRAME_DELTA: u32 = 10;
pub const DEFAULT_JUMP_TIME_DELTA_MS: f64 = 1000.0;
pub const DEFAULT_PAUSED_TOLERANCE_SECS: f64 = 1.0 / 60.0;

/// Global FrameCam configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FramecamConfig {
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Camera follow tuning.
    #[serde(default)]
    pub follow: FollowTuning,

    /// Clip boundary tuning.
    #[serde(default)]
    pub boundary: BoundaryTuning,

    /// Playback drift correction tuning.
    #[serde(default)]
    pub drift: DriftTuning,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "framecam_camera_engine=debug,warn").
    pub level: String,

    /// Separate level for the camera engine, which logs per frame at debug.
    pub engine_level: Option<String>,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

/// Mouse-follow tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowTuning {
    /// Dead zone used when an effect has no positive `mouse_idle_px`.
    pub default_mouse_idle_px: f64,
}

/// Clip boundary tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryTuning {
    /// Length of the hold-previous-frame / near-end window at clip seams.
    pub crossfade_ms: f64,
}

/// Playback drift correction thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftTuning {
    /// Drift at which rate nudging starts (seconds).
    pub enable_threshold_secs: f64,
    /// Drift below which rate nudging stops (seconds). Must be below enable.
    pub disable_threshold_secs: f64,
    /// Largest fractional deviation from the nominal rate.
    pub max_rate_nudge: f64,
    /// Rate change per second of drift before clamping.
    pub nudge_gain: f64,
    /// Drift that counts as "too large" for a soft correction (seconds).
    pub hard_seek_drift_secs: f64,
    /// How long drift must stay too large before a hard seek (ms).
    pub hard_seek_sustain_ms: f64,
    /// Correction is suppressed for this long after a seek completes (ms).
    pub post_seek_grace_ms: f64,
    /// Frame delta between ticks treated as an explicit jump.
    pub jump_frame_delta: u32,
    /// Expected-time delta beyond normal progression treated as a jump (ms).
    pub jump_time_delta_ms: f64,
    /// While paused, drift beyond this is fixed with a seek (seconds).
    pub paused_tolerance_secs: f64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            engine_level: None,
            json: false,
        }
    }
}

impl Default for FollowTuning {
    fn default() -> Self {
        Self {
            default_mouse_idle_px: DEFAULT_MOUSE_IDLE_PX,
        }
    }
}

impl Default for BoundaryTuning {
    fn default() -> Self {
        Self {
            crossfade_ms: DEFAULT_CROSSFADE_MS,
        }
    }
}

impl Default for DriftTuning {
    fn default() -> Self {
        Self {
            enable_threshold_secs: DEFAULT_DRIFT_ENABLE_THRESHOLD_SECS,
            disable_threshold_secs: DEFAULT_DRIFT_DISABLE_THRESHOLD_SECS,
            max_rate_nudge: DEFAULT_MAX_RATE_NUDGE,
            nudge_gain: DEFAULT_NUDGE_GAIN,
            hard_seek_drift_secs: DEFAULT_HARD_SEEK_DRIFT_SECS,
            hard_seek_sustain_ms: DEFAULT_HARD_SEEK_SUSTAIN_MS,
            post_seek_grace_ms: DEFAULT_POST_SEEK_GRACE_MS,
            jump_frame_delta: DEFAULT_JUMP_FRAME_DELTA,
            jump_time_delta_ms: DEFAULT_JUMP_TIME_DELTA_MS,
            paused_tolerance_secs: DEFAULT_PAUSED_TOLERANCE_SECS,
        }
    }
}

impl DriftTuning {
    /// Reject threshold combinations that would make the corrector oscillate
    /// or never engage.
    pub fn validate(&self) -> FramecamResult<()> {
        let positive = [
            ("enable_threshold_secs", self.enable_threshold_secs),
            ("disable_threshold_secs", self.disable_threshold_secs),
            ("max_rate_nudge", self.max_rate_nudge),
            ("nudge_gain", self.nudge_gain),
            ("hard_seek_drift_secs", self.hard_seek_drift_secs),
            ("paused_tolerance_secs", self.paused_tolerance_secs),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(FramecamError::config(format!(
                    "drift.{name} must be positive, got {value}"
                )));
            }
        }
        if self.disable_threshold_secs >= self.enable_threshold_secs {
            return Err(FramecamError::config(format!(
                "drift.disable_threshold_secs ({}) must be below enable_threshold_secs ({})",
                self.disable_threshold_secs, self.enable_threshold_secs
            )));
        }
        if self.max_rate_nudge >= 1.0 {
            return Err(FramecamError::config(format!(
                "drift.max_rate_nudge must be below 1.0, got {}",
                self.max_rate_nudge
            )));
        }
        if self.hard_seek_sustain_ms < 0.0 || self.post_seek_grace_ms < 0.0 {
            return Err(FramecamError::config(
                "drift sustain/grace windows must not be negative",
            ));
        }
        Ok(())
    }
}

impl FramecamConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load and validate config from an explicit path.
    pub fn load_from(path: impl AsRef<Path>) -> FramecamResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(FramecamError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(config_file_path())
    }

    /// Save config to an explicit path.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), std::io::Error> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    pub fn validate(&self) -> FramecamResult<()> {
        if !self.follow.default_mouse_idle_px.is_finite() || self.follow.default_mouse_idle_px < 0.0
        {
            return Err(FramecamError::config(format!(
                "follow.default_mouse_idle_px must be non-negative, got {}",
                self.follow.default_mouse_idle_px
            )));
        }
        if !self.boundary.crossfade_ms.is_finite() || self.boundary.crossfade_ms < 0.0 {
            return Err(FramecamError::config(format!(
                "boundary.crossfade_ms must be non-negative, got {}",
                self.boundary.crossfade_ms
            )));
        }
        self.drift.validate()
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("framecam").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = FramecamConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.drift.enable_threshold_secs, 0.15);
        assert_eq!(config.drift.disable_threshold_secs, 0.08);
        assert_eq!(config.drift.post_seek_grace_ms, 800.0);
    }

    #[test]
    fn test_inverted_hysteresis_is_rejected() {
        let mut config = FramecamConfig::default();
        config.drift.disable_threshold_secs = 0.2;
        let err = config.validate().unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("disable_threshold_secs"));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let json = r#"{ "drift": { "enable_threshold_secs": 0.3 } }"#;
        let config: FramecamConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.drift.enable_threshold_secs, 0.3);
        assert_eq!(config.drift.disable_threshold_secs, 0.08);
        assert_eq!(config.follow.default_mouse_idle_px, DEFAULT_MOUSE_IDLE_PX);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let path = std::env::temp_dir()
            .join("framecam_test_config")
            .join("config.json");
        let _ = std::fs::remove_file(&path);

        let mut config = FramecamConfig::default();
        config.boundary.crossfade_ms = 166.0;
        config.save_to(&path).unwrap();

        let loaded = FramecamConfig::load_from(&path).unwrap();
        assert_eq!(loaded.boundary.crossfade_ms, 166.0);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_from_missing_file() {
        let err = FramecamConfig::load_from("/nonexistent/framecam/config.json").unwrap_err();
        assert!(matches!(err, FramecamError::FileNotFound { .. }));
    }
}
