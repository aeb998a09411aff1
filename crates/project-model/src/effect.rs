//! Zoom effects placed on the composition timeline.

use serde::{Deserialize, Serialize};

use crate::geometry::Point2D;

/// Smallest allowed zoom scale (no zoom).
pub const MIN_ZOOM_SCALE: f64 = 1.0;

/// Largest allowed zoom scale.
pub const MAX_ZOOM_SCALE: f64 = 7.0;

/// What point the camera tracks while an effect is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FollowStrategy {
    /// Follow the recorded cursor, with a dead zone.
    Mouse,
    /// Lock on the frame center.
    #[default]
    Center,
    /// Hold an authored point.
    Manual,
}

/// Automatic scale policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoScale {
    /// Scale so a letterboxed source covers the whole frame.
    Fill,
}

/// A zoom effect anchored on the composition timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoomEffect {
    /// Stable identifier (used in diagnostics only).
    pub id: String,

    /// Start time on the composition timeline (ms).
    pub start_ms: f64,

    /// End time on the composition timeline (ms, inclusive).
    pub end_ms: f64,

    /// Zoom scale during the hold phase, in `[1, 7]`.
    #[serde(default = "default_scale")]
    pub scale: f64,

    /// Length of the zoom-in ramp (ms).
    #[serde(default)]
    pub intro_ms: f64,

    /// Length of the zoom-out ramp (ms).
    #[serde(default)]
    pub outro_ms: f64,

    /// Follow strategy.
    #[serde(default)]
    pub follow: FollowStrategy,

    /// Manual target in source pixel space (Manual strategy only).
    #[serde(default)]
    pub manual_target: Option<Point2D>,

    /// Mouse-follow dead zone in source pixels. `0` means "use the default".
    #[serde(default)]
    pub mouse_idle_px: f64,

    /// Optional automatic scale policy.
    #[serde(default)]
    pub auto_scale: Option<AutoScale>,
}

fn default_scale() -> f64 {
    2.0
}

impl ZoomEffect {
    /// Create a center-locked effect with no easing.
    pub fn new(id: impl Into<String>, start_ms: f64, end_ms: f64, scale: f64) -> Self {
        Self {
            id: id.into(),
            start_ms,
            end_ms,
            scale,
            intro_ms: 0.0,
            outro_ms: 0.0,
            follow: FollowStrategy::Center,
            manual_target: None,
            mouse_idle_px: 0.0,
            auto_scale: None,
        }
    }

    /// Builder-style easing setter.
    pub fn with_easing(mut self, intro_ms: f64, outro_ms: f64) -> Self {
        self.intro_ms = intro_ms;
        self.outro_ms = outro_ms;
        self
    }

    /// Builder-style follow strategy setter.
    pub fn with_follow(mut self, follow: FollowStrategy) -> Self {
        self.follow = follow;
        self
    }

    /// Duration in milliseconds (never negative).
    pub fn duration_ms(&self) -> f64 {
        (self.end_ms - self.start_ms).max(0.0)
    }

    /// Whether `time_ms` falls within `[start_ms, end_ms]`.
    pub fn contains(&self, time_ms: f64) -> bool {
        time_ms >= self.start_ms && time_ms <= self.end_ms
    }

    /// Hold scale clamped into the supported range.
    pub fn clamped_scale(&self) -> f64 {
        if self.scale.is_nan() {
            return MIN_ZOOM_SCALE;
        }
        self.scale.clamp(MIN_ZOOM_SCALE, MAX_ZOOM_SCALE)
    }

    /// Intro/outro lengths, scaled down together when they don't fit.
    pub fn effective_ramps(&self) -> (f64, f64) {
        let intro = self.intro_ms.max(0.0);
        let outro = self.outro_ms.max(0.0);
        let duration = self.duration_ms();
        let total = intro + outro;
        if total > duration && total > 0.0 {
            let k = duration / total;
            (intro * k, outro * k)
        } else {
            (intro, outro)
        }
    }

    /// Authoring problems that make this effect unusable as written.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = vec![];
        let ordered = self.end_ms > self.start_ms;
        if !ordered {
            issues.push(format!(
                "effect '{}': end_ms ({}) must be after start_ms ({})",
                self.id, self.end_ms, self.start_ms
            ));
        }
        if !(MIN_ZOOM_SCALE..=MAX_ZOOM_SCALE).contains(&self.scale) {
            issues.push(format!(
                "effect '{}': scale {} outside [{MIN_ZOOM_SCALE}, {MAX_ZOOM_SCALE}]",
                self.id, self.scale
            ));
        }
        if self.intro_ms < 0.0 || self.outro_ms < 0.0 {
            issues.push(format!("effect '{}': negative intro/outro", self.id));
        }
        if self.follow == FollowStrategy::Manual && self.manual_target.is_none() {
            issues.push(format!(
                "effect '{}': manual follow without manual_target (falls back to center)",
                self.id
            ));
        }
        issues
    }
}
