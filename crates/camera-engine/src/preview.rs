//! Camera motion preview helpers.
//!
//! Turns camera path frames into CSS-like transform strings so UI clients can
//! preview camera movement without running a renderer.

use crate::camera_path::{CameraPath, CameraPathFrame, ZoomTransform};

impl ZoomTransform {
    pub fn css_transform(&self) -> String {
        format!(
            "translate({:.3}px, {:.3}px) scale({:.4})",
            self.pan_x, self.pan_y, self.scale
        )
    }
}

impl CameraPathFrame {
    pub fn css_transform(&self) -> String {
        self.zoom_transform.css_transform()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CameraMotionSample {
    pub time_secs: f64,
    pub frame: u32,
    pub css: String,
    pub motion_blur_mix: f64,
}

/// Sample `path` at `sample_rate_fps`, snapping each sample to the nearest
/// path frame.
pub fn simulate_camera_motion(path: &CameraPath, sample_rate_fps: f64) -> Vec<CameraMotionSample> {
    if path.is_empty() || path.fps() <= 0.0 {
        return vec![];
    }
    let sample_rate_fps = sample_rate_fps.max(1.0);
    let duration_secs = path.len() as f64 / path.fps();
    let count = (duration_secs * sample_rate_fps).floor() as usize;

    (0..count)
        .filter_map(|i| {
            let time_secs = i as f64 / sample_rate_fps;
            let frame = path.frame_at((time_secs * path.fps()).round() as i64)?;
            Some(CameraMotionSample {
                time_secs,
                frame: frame.frame,
                css: frame.css_transform(),
                motion_blur_mix: frame.motion_blur_mix,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use framecam_project_model::camera::CameraSettings;
    use framecam_project_model::clip::Clip;
    use framecam_project_model::effect::ZoomEffect;
    use framecam_project_model::geometry::Size;

    use super::*;
    use crate::camera_path::{build_path, PathInputs};
    use crate::frame_layout::resolve_layout;

    #[test]
    fn identity_css() {
        assert_eq!(
            ZoomTransform::identity().css_transform(),
            "translate(0.000px, 0.000px) scale(1.0000)"
        );
    }

    #[test]
    fn preview_samples_follow_path() {
        let layout = resolve_layout(&[Clip::new("c", "rec", 0.0, 2000.0)], 30.0).unwrap();
        let effects = vec![ZoomEffect::new("z", 500.0, 1500.0, 2.0)];
        let logs = BTreeMap::new();
        let inputs = PathInputs {
            effects: &effects,
            layout: &layout,
            cursor_logs: &logs,
            settings: CameraSettings::default(),
            fps: 30.0,
            composition_size: Size::new(1280.0, 720.0),
            frame_count: 60,
            default_mouse_idle_px: 8.0,
        };
        let path = build_path(&inputs, true).unwrap();

        let samples = simulate_camera_motion(&path, 10.0);
        assert_eq!(samples.len(), 20);
        assert!(samples[0].css.ends_with("scale(1.0000)"));
        assert!(samples[10].css.ends_with("scale(2.0000)"));
        assert_eq!(samples[10].frame, 30);
    }

    #[test]
    fn empty_path_has_no_samples() {
        let path: CameraPath = serde_json::from_str(r#"{"frames": [], "fps": 30.0}"#).unwrap();
        assert!(simulate_camera_motion(&path, 30.0).is_empty());
    }
}
