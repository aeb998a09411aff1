//! Print the resolved snapshot for one frame.

use std::path::PathBuf;

use framecam_camera_engine::camera_path::CameraPathCache;
use framecam_camera_engine::snapshot::{EngineSession, SnapshotInputs};
use framecam_common::config::FramecamConfig;

use super::Prepared;

pub fn run(
    config: &FramecamConfig,
    path: PathBuf,
    frame: u32,
    crossfade_ms: Option<f64>,
) -> anyhow::Result<()> {
    let prepared = Prepared::load(&path, config)?;
    let comp = &prepared.loaded.composition;
    if frame >= comp.total_frames() {
        anyhow::bail!(
            "Frame {frame} is past the end of the composition ({} frames)",
            comp.total_frames()
        );
    }

    let mut cache = CameraPathCache::new();
    let inputs = prepared.path_inputs();
    let camera_path = cache.get_or_build(&inputs)?;
    let fingerprint = cache
        .fingerprint()
        .ok_or_else(|| anyhow::anyhow!("Camera path cache is empty after build"))?;

    let snapshot_inputs = SnapshotInputs {
        layout: &prepared.layout,
        path: &*camera_path,
        path_fingerprint: fingerprint,
        composition_size: comp.size(),
        fps: comp.fps,
        crossfade_ms: crossfade_ms.unwrap_or(config.boundary.crossfade_ms),
        source_dims: None,
    };

    let mut session = EngineSession::new();
    let snapshot = session.snapshot(&snapshot_inputs, frame);
    if snapshot.is_fallback {
        tracing::warn!(frame, "snapshot fell back to the previous good frame");
    }

    println!("{}", serde_json::to_string_pretty(&*snapshot)?);
    Ok(())
}
