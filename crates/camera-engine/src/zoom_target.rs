//! Zoom target resolution.
//!
//! Given the effects on the timeline and a composition time, decide where
//! the camera should look and how far it should be zoomed in. The result is
//! the *target* the spring chases, not the camera position itself.
//!
//! # Rules
//!
//! 1. **Selection**: the effect whose `[start_ms, end_ms]` contains the time.
//!    Overlapping effects resolve to the one that started last.
//! 2. **Follow**: mouse (with a pixel dead zone), center, or an authored point.
//! 3. **Easing**: smoothstep on the scale during intro and outro. The target
//!    point is never eased; the spring smooths it.
//! 4. **Bounds**: scale in `[1, 7]`, target in `[0, 1]`.

use framecam_common::config::DEFAULT_MOUSE_IDLE_PX;
use framecam_project_model::effect::{
    AutoScale, FollowStrategy, ZoomEffect, MAX_ZOOM_SCALE, MIN_ZOOM_SCALE,
};
use framecam_project_model::geometry::{DrawRect, Point2D, Size};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Where the resolved time falls inside the active effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoomPhase {
    Intro,
    Hold,
    Outro,
    /// No effect is active.
    None,
}

/// Resolved camera goal for one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoomTarget {
    /// Normalized focus point.
    pub target: Point2D,
    /// Zoom scale after easing.
    pub scale: f64,
    pub phase: ZoomPhase,
    /// Id of the effect that produced this target.
    pub effect_id: Option<String>,
}

impl ZoomTarget {
    /// Centered and unzoomed.
    pub fn neutral() -> Self {
        Self {
            target: Point2D::CENTER,
            scale: MIN_ZOOM_SCALE,
            phase: ZoomPhase::None,
            effect_id: None,
        }
    }
}

/// Per-instant inputs that are not part of the effect itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetContext {
    /// Recorded cursor position (normalized, source space), if any.
    pub cursor: Option<Point2D>,
    /// Pixel size of the active source, when known.
    pub source_size: Option<Size>,
    /// Composition frame size in pixels.
    pub frame_size: Size,
    /// Target resolved for the previous frame.
    pub prior_target: Point2D,
    /// Dead zone used when an effect leaves `mouse_idle_px` at zero.
    pub default_mouse_idle_px: f64,
}

impl TargetContext {
    pub fn new(frame_size: Size) -> Self {
        Self {
            cursor: None,
            source_size: None,
            frame_size,
            prior_target: Point2D::CENTER,
            default_mouse_idle_px: DEFAULT_MOUSE_IDLE_PX,
        }
    }

    fn valid_source_size(&self) -> Option<Size> {
        self.source_size.filter(Size::is_valid)
    }
}

/// The effect in control at `time_ms`, if any.
pub fn active_effect(effects: &[ZoomEffect], time_ms: f64) -> Option<&ZoomEffect> {
    effects
        .iter()
        .filter(|e| e.contains(time_ms))
        .max_by(|a, b| a.start_ms.total_cmp(&b.start_ms))
}

/// Resolve the camera target at `time_ms`.
pub fn resolve_target(effects: &[ZoomEffect], time_ms: f64, ctx: &TargetContext) -> ZoomTarget {
    let Some(effect) = active_effect(effects, time_ms) else {
        return ZoomTarget::neutral();
    };

    let target = follow_point(effect, ctx).clamped01();
    let hold_scale = hold_scale(effect, ctx);
    let (phase, progress) = ramp_progress(effect, time_ms);
    let scale = MIN_ZOOM_SCALE + (hold_scale - MIN_ZOOM_SCALE) * smoothstep(progress);

    ZoomTarget {
        target,
        scale: clamp_scale(scale),
        phase,
        effect_id: Some(effect.id.clone()),
    }
}

/// Classic `3t^2 - 2t^3`, clamped to `[0, 1]`.
pub fn smoothstep(t: f64) -> f64 {
    let t = if t.is_nan() { 1.0 } else { t.clamp(0.0, 1.0) };
    t * t * (3.0 - 2.0 * t)
}

fn clamp_scale(scale: f64) -> f64 {
    if scale.is_nan() {
        return MIN_ZOOM_SCALE;
    }
    scale.clamp(MIN_ZOOM_SCALE, MAX_ZOOM_SCALE)
}

fn hold_scale(effect: &ZoomEffect, ctx: &TargetContext) -> f64 {
    match effect.auto_scale {
        Some(AutoScale::Fill) => {
            let Some(source) = ctx.valid_source_size() else {
                debug!(effect = %effect.id, "fill scale without source size, using 1.0");
                return MIN_ZOOM_SCALE;
            };
            clamp_scale(DrawRect::contain(source, ctx.frame_size).fill_scale(ctx.frame_size))
        }
        None => effect.clamped_scale(),
    }
}

/// Phase plus easing progress (0 = unzoomed, 1 = full hold scale).
fn ramp_progress(effect: &ZoomEffect, time_ms: f64) -> (ZoomPhase, f64) {
    let (intro, outro) = effect.effective_ramps();

    if intro > 0.0 && time_ms < effect.start_ms + intro {
        return (ZoomPhase::Intro, (time_ms - effect.start_ms) / intro);
    }
    if outro > 0.0 && time_ms > effect.end_ms - outro {
        return (ZoomPhase::Outro, (effect.end_ms - time_ms) / outro);
    }
    (ZoomPhase::Hold, 1.0)
}

fn follow_point(effect: &ZoomEffect, ctx: &TargetContext) -> Point2D {
    match effect.follow {
        FollowStrategy::Center => Point2D::CENTER,
        FollowStrategy::Manual => {
            match (effect.manual_target, ctx.valid_source_size()) {
                (Some(px), Some(source)) => {
                    Point2D::new(px.x / source.width, px.y / source.height)
                }
                _ => {
                    debug!(effect = %effect.id, "manual target unavailable, centering");
                    Point2D::CENTER
                }
            }
        }
        FollowStrategy::Mouse => {
            let Some(cursor) = ctx.cursor else {
                return ctx.prior_target;
            };
            let idle_px = if effect.mouse_idle_px > 0.0 {
                effect.mouse_idle_px
            } else {
                ctx.default_mouse_idle_px
            };
            if within_dead_zone(cursor, ctx.prior_target, dead_zone_dims(ctx), idle_px) {
                ctx.prior_target
            } else {
                cursor
            }
        }
    }
}

fn dead_zone_dims(ctx: &TargetContext) -> Size {
    ctx.valid_source_size().unwrap_or(ctx.frame_size)
}

/// Whether `cursor` is within `idle_px` pixels of `prior`.
fn within_dead_zone(cursor: Point2D, prior: Point2D, dims: Size, idle_px: f64) -> bool {
    let dx = (cursor.x - prior.x) * dims.width;
    let dy = (cursor.y - prior.y) * dims.height;
    (dx * dx + dy * dy).sqrt() <= idle_px
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ctx() -> TargetContext {
        TargetContext::new(Size::new(1920.0, 1080.0))
    }

    fn center_effect() -> ZoomEffect {
        ZoomEffect::new("z", 1000.0, 4000.0, 2.5).with_easing(500.0, 500.0)
    }

    #[test]
    fn test_no_effect_is_neutral() {
        let t = resolve_target(&[center_effect()], 500.0, &ctx());
        assert_eq!(t, ZoomTarget::neutral());
        let t = resolve_target(&[], 2000.0, &ctx());
        assert_eq!(t.phase, ZoomPhase::None);
    }

    #[test]
    fn test_center_effect_phases() {
        let effects = [center_effect()];

        let start = resolve_target(&effects, 1000.0, &ctx());
        assert_eq!(start.phase, ZoomPhase::Intro);
        assert!((start.scale - 1.0).abs() < 1e-9);

        let mid_intro = resolve_target(&effects, 1250.0, &ctx());
        assert!((mid_intro.scale - 1.75).abs() < 1e-9);

        let hold = resolve_target(&effects, 2500.0, &ctx());
        assert_eq!(hold.phase, ZoomPhase::Hold);
        assert_eq!(hold.scale, 2.5);
        assert_eq!(hold.target, Point2D::CENTER);
        assert_eq!(hold.effect_id.as_deref(), Some("z"));

        let outro = resolve_target(&effects, 3900.0, &ctx());
        assert_eq!(outro.phase, ZoomPhase::Outro);
        assert!(outro.scale > 1.0 && outro.scale < 2.5);
        let later = resolve_target(&effects, 3950.0, &ctx());
        assert!(later.scale < outro.scale);
    }

    #[test]
    fn test_later_start_wins_on_overlap() {
        let effects = [
            ZoomEffect::new("early", 0.0, 3000.0, 2.0),
            ZoomEffect::new("late", 1000.0, 2000.0, 3.0),
        ];
        let t = resolve_target(&effects, 1500.0, &ctx());
        assert_eq!(t.effect_id.as_deref(), Some("late"));
        assert_eq!(t.scale, 3.0);
        let t = resolve_target(&effects, 2500.0, &ctx());
        assert_eq!(t.effect_id.as_deref(), Some("early"));
    }

    #[test]
    fn test_ramps_longer_than_effect_still_reach_peak_smoothly() {
        let effects = [ZoomEffect::new("z", 0.0, 400.0, 3.0).with_easing(600.0, 600.0)];
        let mid = resolve_target(&effects, 200.0, &ctx());
        assert!((mid.scale - 3.0).abs() < 1e-9);
        let quarter = resolve_target(&effects, 100.0, &ctx());
        assert!(quarter.scale > 1.0 && quarter.scale < 3.0);
    }

    #[test]
    fn test_manual_target_is_normalized() {
        let mut effect = ZoomEffect::new("m", 0.0, 1000.0, 2.0).with_follow(FollowStrategy::Manual);
        effect.manual_target = Some(Point2D::new(480.0, 270.0));
        let mut c = ctx();
        c.source_size = Some(Size::new(1920.0, 1080.0));

        let t = resolve_target(std::slice::from_ref(&effect), 500.0, &c);
        assert!((t.target.x - 0.25).abs() < 1e-9);
        assert!((t.target.y - 0.25).abs() < 1e-9);

        c.source_size = None;
        let t = resolve_target(&[effect], 500.0, &c);
        assert_eq!(t.target, Point2D::CENTER);
    }

    #[test]
    fn test_manual_without_target_centers() {
        let effect = ZoomEffect::new("m", 0.0, 1000.0, 2.0).with_follow(FollowStrategy::Manual);
        let t = resolve_target(&[effect], 500.0, &ctx());
        assert_eq!(t.target, Point2D::CENTER);
    }

    #[test]
    fn test_mouse_follow_and_dead_zone() {
        let effect = ZoomEffect::new("m", 0.0, 1000.0, 2.0).with_follow(FollowStrategy::Mouse);
        let effects = [effect];
        let mut c = ctx();
        c.prior_target = Point2D::new(0.5, 0.5);

        // 4px away on a 1920-wide frame: inside the default 8px zone.
        c.cursor = Some(Point2D::new(0.5 + 4.0 / 1920.0, 0.5));
        assert_eq!(resolve_target(&effects, 10.0, &c).target, c.prior_target);

        c.cursor = Some(Point2D::new(0.7, 0.3));
        assert_eq!(resolve_target(&effects, 10.0, &c).target, Point2D::new(0.7, 0.3));

        c.cursor = None;
        assert_eq!(resolve_target(&effects, 10.0, &c).target, c.prior_target);
    }

    #[test]
    fn test_mouse_dead_zone_uses_source_pixels() {
        let mut effect = ZoomEffect::new("m", 0.0, 1000.0, 2.0).with_follow(FollowStrategy::Mouse);
        effect.mouse_idle_px = 10.0;
        let effects = [effect];
        let mut c = ctx();
        // 0.01 normalized is 6.4px on a 640-wide source but 19.2px on the frame.
        c.source_size = Some(Size::new(640.0, 480.0));
        c.cursor = Some(Point2D::new(0.51, 0.5));
        assert_eq!(resolve_target(&effects, 10.0, &c).target, Point2D::CENTER);

        c.source_size = None;
        assert_eq!(resolve_target(&effects, 10.0, &c).target, Point2D::new(0.51, 0.5));
    }

    #[test]
    fn test_fill_auto_scale() {
        let mut effect = ZoomEffect::new("f", 0.0, 1000.0, 1.0);
        effect.auto_scale = Some(AutoScale::Fill);
        let mut c = ctx();
        c.source_size = Some(Size::new(2000.0, 1000.0));
        let t = resolve_target(std::slice::from_ref(&effect), 500.0, &c);
        assert!((t.scale - 1080.0 / 960.0).abs() < 1e-9);

        c.source_size = None;
        assert_eq!(resolve_target(&[effect], 500.0, &c).scale, 1.0);
    }

    #[test]
    fn test_smoothstep_endpoints() {
        assert_eq!(smoothstep(0.0), 0.0);
        assert_eq!(smoothstep(1.0), 1.0);
        assert_eq!(smoothstep(0.5), 0.5);
        assert_eq!(smoothstep(-3.0), 0.0);
        assert_eq!(smoothstep(7.0), 1.0);
    }

    fn arb_follow() -> impl Strategy<Value = FollowStrategy> {
        prop_oneof![
            Just(FollowStrategy::Mouse),
            Just(FollowStrategy::Center),
            Just(FollowStrategy::Manual),
        ]
    }

    proptest! {
        #[test]
        fn prop_target_and_scale_stay_in_bounds(
            scale in -10.0f64..20.0,
            intro in 0.0f64..3000.0,
            outro in 0.0f64..3000.0,
            time in -500.0f64..3500.0,
            cx in -1.0f64..2.0,
            cy in -1.0f64..2.0,
            mx in -5000.0f64..5000.0,
            my in -5000.0f64..5000.0,
            follow in arb_follow(),
        ) {
            let mut effect = ZoomEffect::new("p", 0.0, 3000.0, scale)
                .with_easing(intro, outro)
                .with_follow(follow);
            effect.manual_target = Some(Point2D::new(mx, my));
            let mut c = ctx();
            c.cursor = Some(Point2D::new(cx, cy));
            c.source_size = Some(Size::new(1280.0, 720.0));

            let t = resolve_target(&[effect], time, &c);
            prop_assert!((1.0..=7.0).contains(&t.scale));
            prop_assert!((0.0..=1.0).contains(&t.target.x));
            prop_assert!((0.0..=1.0).contains(&t.target.y));
        }

        #[test]
        fn prop_dead_zone_holds_prior_target(
            px in 0.1f64..0.9,
            py in 0.1f64..0.9,
            angle in 0.0f64..std::f64::consts::TAU,
            radius in 0.0f64..7.9,
        ) {
            let effect = ZoomEffect::new("m", 0.0, 1000.0, 2.0).with_follow(FollowStrategy::Mouse);
            let mut c = ctx();
            c.prior_target = Point2D::new(px, py);
            c.cursor = Some(Point2D::new(
                px + radius * angle.cos() / 1920.0,
                py + radius * angle.sin() / 1080.0,
            ));
            let t = resolve_target(&[effect], 500.0, &c);
            prop_assert_eq!(t.target, c.prior_target);
        }
    }
}
