//! Bake the camera path for a composition.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use framecam_camera_engine::camera_path::{build_path, PathFingerprint};
use framecam_camera_engine::preview::simulate_camera_motion;
use framecam_common::config::FramecamConfig;

use super::Prepared;
use crate::PathFormat;

pub fn run(
    config: &FramecamConfig,
    path: PathBuf,
    format: PathFormat,
    sample_fps: f64,
    output: Option<PathBuf>,
    live: bool,
) -> anyhow::Result<()> {
    let prepared = Prepared::load(&path, config)?;
    let inputs = prepared.path_inputs();

    let fingerprint = PathFingerprint::of(&inputs)?;
    let camera_path = build_path(&inputs, !live)?;
    tracing::info!(
        frames = camera_path.len(),
        %fingerprint,
        deterministic = !live,
        "camera path built"
    );

    let text = match format {
        PathFormat::Json => serde_json::to_string_pretty(&camera_path)?,
        PathFormat::Css => {
            let mut lines = vec![format!("# fingerprint {fingerprint}")];
            lines.extend(
                simulate_camera_motion(&camera_path, sample_fps)
                    .into_iter()
                    .map(|s| {
                        format!(
                            "{:.4}\t{}\t{}\t{:.3}",
                            s.time_secs, s.frame, s.css, s.motion_blur_mix
                        )
                    }),
            );
            lines.join("\n")
        }
    };

    match output {
        Some(out) => {
            std::fs::write(&out, text)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            println!("Wrote {} frames to {}", camera_path.len(), out.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{text}")?;
        }
    }

    Ok(())
}
