//! Frame timing utilities.
//!
//! Every engine evaluation is anchored to composition frame numbers. This
//! module provides:
//! - Validated frame/millisecond conversion for a composition frame rate
//! - Step clocks that feed the spring integrator its time deltas
//! - Drift measurement between an expected and an actual media position

use std::time::Instant;

use crate::error::{FramecamError, FramecamResult};

/// Converts between composition frame numbers and time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameClock {
    fps: f64,
}

impl FrameClock {
    /// Create a clock for the given frame rate.
    ///
    /// A non-positive or non-finite rate is a configuration error.
    pub fn new(fps: f64) -> FramecamResult<Self> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(FramecamError::config(format!(
                "fps must be a positive finite number, got {fps}"
            )));
        }
        Ok(Self { fps })
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Duration of a single frame in seconds.
    pub fn frame_duration_secs(&self) -> f64 {
        1.0 / self.fps
    }

    /// Start time of `frame` in milliseconds.
    pub fn frame_to_ms(&self, frame: u32) -> f64 {
        frame as f64 / self.fps * 1000.0
    }

    /// Frame containing the timestamp (floor, tolerant of float error).
    pub fn frame_at_ms(&self, ms: f64) -> u32 {
        let exact = ms.max(0.0) * self.fps / 1000.0;
        (exact + 1e-6).floor() as u32
    }

    /// Nearest frame boundary to the timestamp.
    pub fn round_to_frame(&self, ms: f64) -> u32 {
        (ms.max(0.0) * self.fps / 1000.0).round() as u32
    }

    /// Number of whole frames needed to cover `ms`.
    pub fn frames_covering(&self, ms: f64) -> u32 {
        let exact = ms.max(0.0) * self.fps / 1000.0;
        (exact - 1e-6).ceil().max(0.0) as u32
    }
}

/// Source of integration time deltas for the camera path builder.
pub trait StepClock {
    /// Seconds elapsed since the previous step.
    fn step_secs(&mut self) -> f64;
}

/// Deterministic clock: every step is exactly one frame long.
#[derive(Debug, Clone, Copy)]
pub struct FixedStepClock {
    step_secs: f64,
}

impl FixedStepClock {
    pub fn new(clock: FrameClock) -> Self {
        Self {
            step_secs: clock.frame_duration_secs(),
        }
    }
}

impl StepClock for FixedStepClock {
    fn step_secs(&mut self) -> f64 {
        self.step_secs
    }
}

/// Interactive clock: steps by the wall time that actually passed.
///
/// Never used for export; results depend on how fast the caller runs.
#[derive(Debug, Clone)]
pub struct WallClock {
    last: Instant,
}

impl WallClock {
    /// Create a wall clock anchored to now.
    pub fn start() -> Self {
        Self {
            last: Instant::now(),
        }
    }
}

impl StepClock for WallClock {
    fn step_secs(&mut self) -> f64 {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last).as_secs_f64();
        self.last = now;
        elapsed
    }
}

/// Drift between where a media element is and where its layout expects it.
#[derive(Debug, Clone, Copy)]
pub struct DriftMeasurement {
    /// Source position the visible frame expects (seconds).
    pub expected_secs: f64,
    /// Position the media element reports (seconds).
    pub actual_secs: f64,
}

impl DriftMeasurement {
    /// Drift in seconds (positive = media is ahead).
    pub fn drift_secs(&self) -> f64 {
        self.actual_secs - self.expected_secs
    }

    /// Drift in milliseconds.
    pub fn drift_ms(&self) -> f64 {
        self.drift_secs() * 1000.0
    }

    /// Whether the absolute drift is at least `threshold_secs`.
    pub fn exceeds(&self, threshold_secs: f64) -> bool {
        self.drift_secs().abs() >= threshold_secs
    }
}
