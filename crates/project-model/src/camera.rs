//! Camera dynamics and motion blur settings.

use serde::{Deserialize, Serialize};

/// Named camera feel. Presets are critically damped with unit mass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CameraPreset {
    Snappy,
    #[default]
    Smooth,
    Cinematic,
    /// Use `CameraSettings::dynamics` as written.
    Custom,
}

impl CameraPreset {
    /// Spring dynamics for this preset; `None` for `Custom`.
    pub fn dynamics(self) -> Option<CameraDynamics> {
        let stiffness = match self {
            CameraPreset::Snappy => 300.0,
            CameraPreset::Smooth => 170.0,
            CameraPreset::Cinematic => 90.0,
            CameraPreset::Custom => return None,
        };
        Some(CameraDynamics::critically_damped(stiffness, 1.0))
    }
}

/// Spring parameters as authored. Validated by the engine, not here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraDynamics {
    pub stiffness: f64,
    pub damping: f64,
    pub mass: f64,
}

impl CameraDynamics {
    /// Damping of `2 * sqrt(stiffness * mass)`: fastest approach without overshoot.
    pub fn critically_damped(stiffness: f64, mass: f64) -> Self {
        Self {
            stiffness,
            damping: 2.0 * (stiffness * mass).sqrt(),
            mass,
        }
    }
}

impl Default for CameraDynamics {
    fn default() -> Self {
        Self::critically_damped(170.0, 1.0)
    }
}

/// Motion blur derived from camera velocity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionBlurSettings {
    pub enabled: bool,
    /// Maximum blur mix in `[0, 1]`.
    pub intensity: f64,
    /// Speed (px/frame) below which no blur is applied.
    pub velocity_threshold_px: f64,
    /// Speed (px/frame) at which blur reaches `intensity`.
    pub full_blur_velocity_px: f64,
    /// Per-frame smoothing factor while blur increases.
    pub ramp_up: f64,
    /// Per-frame smoothing factor while blur decreases.
    pub ramp_down: f64,
}

impl Default for MotionBlurSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            intensity: 1.0,
            velocity_threshold_px: 2.0,
            full_blur_velocity_px: 40.0,
            ramp_up: 0.5,
            ramp_down: 0.15,
        }
    }
}

/// Everything the user can tune about camera motion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct CameraSettings {
    #[serde(default)]
    pub preset: CameraPreset,

    /// Used when `preset` is `Custom`.
    #[serde(default)]
    pub dynamics: CameraDynamics,

    #[serde(default)]
    pub motion_blur: MotionBlurSettings,
}

impl CameraSettings {
    /// Custom settings with explicit dynamics.
    pub fn custom(dynamics: CameraDynamics) -> Self {
        Self {
            preset: CameraPreset::Custom,
            dynamics,
            motion_blur: MotionBlurSettings::default(),
        }
    }

    /// Dynamics after resolving the preset.
    pub fn effective_dynamics(&self) -> CameraDynamics {
        self.preset.dynamics().unwrap_or(self.dynamics)
    }
}
