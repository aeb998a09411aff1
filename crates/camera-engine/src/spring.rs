//! Damped spring integrator for the camera focus point.
//!
//! One semi-implicit (symplectic) Euler step per call:
//!
//! ```text
//! a  = (stiffness * (target - x) - damping * v) / mass
//! v' = v + a * dt
//! x' = x + v' * dt
//! ```
//!
//! Long steps (slow frame rates, dropped frames) are split into sub-steps of
//! at most [`MAX_SUB_STEP_SECS`] so the explicit integration stays stable.
//! Stiff springs lower the threshold further: a single explicit step must
//! stay well inside `omega * dt < 0.5`, or a critically damped spring starts
//! to ring.

use framecam_common::error::{FramecamError, FramecamResult};
use framecam_project_model::camera::CameraDynamics;
use framecam_project_model::geometry::Point2D;
use serde::{Deserialize, Serialize};

/// Steps longer than this are sub-stepped.
pub const STABILITY_THRESHOLD_SECS: f64 = 1.0 / 30.0;

/// Longest sub-step used once sub-stepping kicks in.
pub const MAX_SUB_STEP_SECS: f64 = 0.001;

/// Longest span a single call integrates. A longer gap (a suspended
/// process, a stalled wall clock) is treated as this long; every valid
/// spring has settled well before it.
pub const MAX_INTEGRATED_SECS: f64 = 10.0;

/// Position and velocity of the spring, in normalized screen space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpringState {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
}

impl SpringState {
    /// At rest at `position`.
    pub fn at_rest(position: Point2D) -> Self {
        Self {
            x: position.x,
            y: position.y,
            vx: 0.0,
            vy: 0.0,
        }
    }

    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }

    pub fn velocity(&self) -> Point2D {
        Point2D::new(self.vx, self.vy)
    }
}

impl Default for SpringState {
    fn default() -> Self {
        Self::at_rest(Point2D::CENTER)
    }
}

/// Validated spring parameters. All fields are strictly positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringParams {
    stiffness: f64,
    damping: f64,
    mass: f64,
}

impl SpringParams {
    /// Validate and build parameters.
    ///
    /// Non-positive or non-finite values are rejected rather than clamped:
    /// a clamped spring would silently produce motion nobody authored.
    pub fn new(stiffness: f64, damping: f64, mass: f64) -> FramecamResult<Self> {
        for (name, value) in [
            ("stiffness", stiffness),
            ("damping", damping),
            ("mass", mass),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(FramecamError::config(format!(
                    "spring {name} must be a positive finite number, got {value}"
                )));
            }
        }
        Ok(Self {
            stiffness,
            damping,
            mass,
        })
    }

    /// Critically damped parameters: no overshoot.
    pub fn critically_damped(stiffness: f64, mass: f64) -> FramecamResult<Self> {
        let damping = 2.0 * (stiffness * mass).sqrt();
        Self::new(stiffness, damping, mass)
    }

    pub fn from_dynamics(dynamics: &CameraDynamics) -> FramecamResult<Self> {
        Self::new(dynamics.stiffness, dynamics.damping, dynamics.mass)
    }

    pub fn stiffness(&self) -> f64 {
        self.stiffness
    }

    pub fn damping(&self) -> f64 {
        self.damping
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Longest single step that keeps the discrete system free of ringing.
    pub fn max_stable_step_secs(&self) -> f64 {
        let omega = (self.stiffness / self.mass).sqrt();
        0.45 * (1.0 / omega).min(2.0 * self.mass / self.damping)
    }

    /// Damping ratio: 1.0 is critical, below is underdamped.
    pub fn damping_ratio(&self) -> f64 {
        self.damping / (2.0 * (self.stiffness * self.mass).sqrt())
    }
}

/// Advance `state` toward `target` by `dt_secs`.
pub fn integrate(
    state: SpringState,
    target: Point2D,
    params: &SpringParams,
    dt_secs: f64,
) -> SpringState {
    if !dt_secs.is_finite() || dt_secs <= 0.0 {
        return state;
    }
    let dt_secs = dt_secs.min(MAX_INTEGRATED_SECS);

    let threshold = STABILITY_THRESHOLD_SECS.min(params.max_stable_step_secs());
    let steps = if dt_secs > threshold {
        (dt_secs / MAX_SUB_STEP_SECS).ceil() as u32
    } else {
        1
    };
    let h = dt_secs / steps as f64;

    let mut s = state;
    for _ in 0..steps {
        s = step(s, target, params, h);
    }
    s
}

fn step(s: SpringState, target: Point2D, p: &SpringParams, h: f64) -> SpringState {
    let ax = (p.stiffness * (target.x - s.x) - p.damping * s.vx) / p.mass;
    let ay = (p.stiffness * (target.y - s.y) - p.damping * s.vy) / p.mass;
    let vx = s.vx + ax * h;
    let vy = s.vy + ay * h;
    SpringState {
        x: s.x + vx * h,
        y: s.y + vy * h,
        vx,
        vy,
    }
}
