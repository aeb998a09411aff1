//! Camera path construction.
//!
//! Walks the composition frame by frame, resolves the zoom target, and runs
//! the spring toward it. The output is one [`CameraPathFrame`] per frame:
//! the smoothed focus point, the zoom transform to apply, and a motion-blur
//! mix derived from camera speed.
//!
//! Export always builds with a fixed `1/fps` step so two builds of the same
//! inputs are identical. Interactive preview may step with wall-clock time
//! through [`LiveCamera`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use framecam_common::clock::{FixedStepClock, FrameClock, StepClock, WallClock};
use framecam_common::error::FramecamResult;
use framecam_project_model::camera::{CameraSettings, MotionBlurSettings};
use framecam_project_model::cursor::CursorLog;
use framecam_project_model::effect::ZoomEffect;
use framecam_project_model::geometry::{DrawRect, Point2D, Size};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::frame_layout::{active_item, source_time_ms, FrameLayoutItem};
use crate::spring::{integrate, SpringParams, SpringState};
use crate::zoom_target::{resolve_target, TargetContext};

/// Transform applied to the drawn source for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomTransform {
    pub scale: f64,
    /// Translation in composition pixels.
    pub pan_x: f64,
    pub pan_y: f64,
    /// Draw size over composition size, per axis.
    pub scale_compensation_x: f64,
    pub scale_compensation_y: f64,
}

impl ZoomTransform {
    pub fn identity() -> Self {
        Self {
            scale: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
            scale_compensation_x: 1.0,
            scale_compensation_y: 1.0,
        }
    }

    /// Zoom by `scale` about `focus` so that `focus` stays put on screen.
    pub fn focused(focus: Point2D, scale: f64, draw: &DrawRect, composition: Size) -> Self {
        let (comp_x, comp_y) = if composition.is_valid() {
            (draw.width / composition.width, draw.height / composition.height)
        } else {
            (1.0, 1.0)
        };
        Self {
            scale,
            pan_x: (0.5 - focus.x) * (scale - 1.0) * draw.width,
            pan_y: (0.5 - focus.y) * (scale - 1.0) * draw.height,
            scale_compensation_x: comp_x,
            scale_compensation_y: comp_y,
        }
    }
}

/// Camera state for a single composition frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPathFrame {
    pub frame: u32,
    /// Smoothed focus point (normalized).
    pub position: Point2D,
    pub zoom_transform: ZoomTransform,
    /// Screen-space velocity in pixels per frame.
    pub velocity: Point2D,
    /// Motion blur mix in `[0, 1]`.
    pub motion_blur_mix: f64,
}

impl CameraPathFrame {
    /// Centered, unzoomed, at rest.
    pub fn identity(frame: u32) -> Self {
        Self {
            frame,
            position: Point2D::CENTER,
            zoom_transform: ZoomTransform::identity(),
            velocity: Point2D::ZERO,
            motion_blur_mix: 0.0,
        }
    }
}

/// A fully computed path. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraPath {
    frames: Vec<CameraPathFrame>,
    fps: f64,
}

impl CameraPath {
    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, frame: u32) -> Option<&CameraPathFrame> {
        self.frames.get(frame as usize)
    }

    /// Frame lookup clamped to the valid range. `None` only for an empty path.
    pub fn frame_at(&self, frame: i64) -> Option<&CameraPathFrame> {
        let last = self.frames.len().checked_sub(1)?;
        let idx = frame.clamp(0, last as i64) as usize;
        self.frames.get(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CameraPathFrame> {
        self.frames.iter()
    }

    pub fn frames(&self) -> &[CameraPathFrame] {
        &self.frames
    }
}

/// Everything a path depends on. Changing any field changes the fingerprint.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PathInputs<'a> {
    pub effects: &'a [ZoomEffect],
    pub layout: &'a [FrameLayoutItem],
    pub cursor_logs: &'a BTreeMap<String, CursorLog>,
    pub settings: CameraSettings,
    pub fps: f64,
    pub composition_size: Size,
    pub frame_count: u32,
    pub default_mouse_idle_px: f64,
}

impl PathInputs<'_> {
    fn draw_rect(&self, item: Option<&FrameLayoutItem>) -> DrawRect {
        match item {
            Some(item) => DrawRect::contain(item.source_size, self.composition_size),
            None => DrawRect::full(self.composition_size),
        }
    }
}

/// Build the path with a fixed `1/fps` step (`deterministic`) or with
/// wall-clock steps.
pub fn build_path(inputs: &PathInputs<'_>, deterministic: bool) -> FramecamResult<CameraPath> {
    if deterministic {
        let frame_clock = FrameClock::new(inputs.fps)?;
        build_path_with_clock(inputs, &mut FixedStepClock::new(frame_clock))
    } else {
        build_path_with_clock(inputs, &mut WallClock::start())
    }
}

/// Build the path, taking each step length from `clock`.
pub fn build_path_with_clock(
    inputs: &PathInputs<'_>,
    clock: &mut dyn StepClock,
) -> FramecamResult<CameraPath> {
    let mut sim = Simulation::new(&inputs.settings, FrameClock::new(inputs.fps)?)?;

    let mut frames = Vec::with_capacity(inputs.frame_count as usize);
    for frame in 0..inputs.frame_count {
        // Frame 0 is the resting state; the clock starts ticking after it.
        let dt = if frame == 0 { 0.0 } else { clock.step_secs() };
        frames.push(sim.advance(inputs, frame, dt));
    }

    Ok(CameraPath {
        frames,
        fps: inputs.fps,
    })
}

/// Spring plus the per-frame carry-over needed to step it.
#[derive(Debug, Clone)]
struct Simulation {
    settings: CameraSettings,
    clock: FrameClock,
    params: SpringParams,
    spring: SpringState,
    prior_target: Point2D,
    prev_position: Option<Point2D>,
    blur_mix: f64,
}

impl Simulation {
    fn new(settings: &CameraSettings, clock: FrameClock) -> FramecamResult<Self> {
        let params = SpringParams::from_dynamics(&settings.effective_dynamics())?;
        Ok(Self {
            settings: *settings,
            clock,
            params,
            spring: SpringState::default(),
            prior_target: Point2D::CENTER,
            prev_position: None,
            blur_mix: 0.0,
        })
    }

    fn advance(&mut self, inputs: &PathInputs<'_>, frame: u32, dt_secs: f64) -> CameraPathFrame {
        let time_ms = self.clock.frame_to_ms(frame);
        let item = active_item(inputs.layout, frame);

        let cursor = item.and_then(|item| {
            inputs
                .cursor_logs
                .get(&item.recording_id)
                .and_then(|log| log.position_at(source_time_ms(item, frame, self.clock.fps())))
        });
        let ctx = TargetContext {
            cursor,
            source_size: item.map(|i| i.source_size),
            frame_size: inputs.composition_size,
            prior_target: self.prior_target,
            default_mouse_idle_px: inputs.default_mouse_idle_px,
        };
        let target = resolve_target(inputs.effects, time_ms, &ctx);
        self.prior_target = target.target;

        self.spring = integrate(self.spring, target.target, &self.params, dt_secs);
        let position = self.spring.position();

        let draw = inputs.draw_rect(item);
        let zoom_transform =
            ZoomTransform::focused(position, target.scale, &draw, inputs.composition_size);

        let velocity = match self.prev_position {
            Some(prev) => Point2D::new(
                (position.x - prev.x) * draw.width * target.scale,
                (position.y - prev.y) * draw.height * target.scale,
            ),
            None => Point2D::ZERO,
        };
        self.prev_position = Some(position);

        let raw_blur = blur_amount(&self.settings.motion_blur, velocity.magnitude());
        self.blur_mix = smooth_blur(&self.settings.motion_blur, self.blur_mix, raw_blur);

        CameraPathFrame {
            frame,
            position,
            zoom_transform,
            velocity,
            motion_blur_mix: self.blur_mix,
        }
    }
}

/// Target blur for a speed in px/frame, before smoothing.
fn blur_amount(blur: &MotionBlurSettings, speed_px: f64) -> f64 {
    if !blur.enabled || !speed_px.is_finite() {
        return 0.0;
    }
    let span = blur.full_blur_velocity_px - blur.velocity_threshold_px;
    let ramp = if span > 0.0 {
        ((speed_px - blur.velocity_threshold_px) / span).clamp(0.0, 1.0)
    } else if speed_px > blur.velocity_threshold_px {
        1.0
    } else {
        0.0
    };
    ramp * blur.intensity.clamp(0.0, 1.0)
}

fn smooth_blur(blur: &MotionBlurSettings, current: f64, raw: f64) -> f64 {
    let factor = if raw > current {
        blur.ramp_up
    } else {
        blur.ramp_down
    };
    (current + (raw - current) * factor.clamp(0.0, 1.0)).clamp(0.0, 1.0)
}

/// Stable hash of [`PathInputs`], used as the cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathFingerprint(pub u64);

impl PathFingerprint {
    pub fn of(inputs: &PathInputs<'_>) -> FramecamResult<Self> {
        let bytes = serde_json::to_vec(inputs)?;
        Ok(Self(fnv1a_64(&bytes)))
    }
}

impl fmt::Display for PathFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in bytes {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

/// Memoizes the deterministic path for the current inputs.
///
/// Readers hold an `Arc` to a complete path; a rebuild swaps in a new one
/// and never touches the old.
#[derive(Debug, Default)]
pub struct CameraPathCache {
    current: Option<(PathFingerprint, Arc<CameraPath>)>,
    rebuilds: u64,
}

impl CameraPathCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached path for `inputs`, building it on a fingerprint miss.
    pub fn get_or_build(&mut self, inputs: &PathInputs<'_>) -> FramecamResult<Arc<CameraPath>> {
        let fingerprint = PathFingerprint::of(inputs)?;
        if let Some((cached, path)) = &self.current {
            if *cached == fingerprint {
                return Ok(Arc::clone(path));
            }
        }

        let path = Arc::new(build_path(inputs, true)?);
        self.rebuilds += 1;
        debug!(
            %fingerprint,
            frames = path.len(),
            rebuilds = self.rebuilds,
            "camera path rebuilt"
        );
        self.current = Some((fingerprint, Arc::clone(&path)));
        Ok(path)
    }

    /// Fingerprint of the cached path, if any.
    pub fn fingerprint(&self) -> Option<PathFingerprint> {
        self.current.as_ref().map(|(fp, _)| *fp)
    }

    pub fn invalidate(&mut self) {
        self.current = None;
    }

    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }
}

/// Continuously advancing camera for interactive preview.
///
/// Steps by whatever time actually elapsed between displayed frames, so it
/// is not reproducible. Export uses [`build_path`] instead.
#[derive(Debug, Default)]
pub struct LiveCamera {
    sim: Option<Simulation>,
}

impl LiveCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance to `frame` after `elapsed_secs` of wall time.
    pub fn advance(
        &mut self,
        inputs: &PathInputs<'_>,
        frame: u32,
        elapsed_secs: f64,
    ) -> FramecamResult<CameraPathFrame> {
        let clock = FrameClock::new(inputs.fps)?;
        let mut sim = match self.sim.take() {
            Some(sim) if sim.settings == inputs.settings && sim.clock == clock => sim,
            _ => Simulation::new(&inputs.settings, clock)?,
        };
        let out = sim.advance(inputs, frame, elapsed_secs);
        self.sim = Some(sim);
        Ok(out)
    }

    /// Drop the simulation; the next advance starts at rest at center.
    pub fn reset(&mut self) {
        self.sim = None;
    }
}
