pub mod drift_sim;
pub mod info;
pub mod init;
pub mod path;
pub mod snapshot;
pub mod validate;

use std::path::Path;

use anyhow::Context;
use framecam_camera_engine::camera_path::PathInputs;
use framecam_camera_engine::frame_layout::{resolve_layout, FrameLayoutItem};
use framecam_common::config::FramecamConfig;
use framecam_project_model::LoadedComposition;

/// A loaded bundle with its layout resolved.
pub struct Prepared {
    pub loaded: LoadedComposition,
    pub layout: Vec<FrameLayoutItem>,
    default_mouse_idle_px: f64,
}

impl Prepared {
    pub fn load(path: &Path, config: &FramecamConfig) -> anyhow::Result<Self> {
        let loaded = LoadedComposition::load(path)
            .with_context(|| format!("Failed to load composition at {}", path.display()))?;
        loaded
            .composition
            .ensure_valid()
            .context("Composition is invalid")?;

        let layout = resolve_layout(&loaded.composition.clips, loaded.composition.fps)?;
        tracing::debug!(items = layout.len(), "layout resolved");

        Ok(Self {
            loaded,
            layout,
            default_mouse_idle_px: config.follow.default_mouse_idle_px,
        })
    }

    pub fn path_inputs(&self) -> PathInputs<'_> {
        let comp = &self.loaded.composition;
        PathInputs {
            effects: &comp.effects,
            layout: &self.layout,
            cursor_logs: &self.loaded.cursor_logs,
            settings: comp.camera,
            fps: comp.fps,
            composition_size: comp.size(),
            frame_count: comp.total_frames(),
            default_mouse_idle_px: self.default_mouse_idle_px,
        }
    }
}
