//! Validate a composition bundle.

use std::path::PathBuf;

use framecam_camera_engine::frame_layout::resolve_layout;
use framecam_camera_engine::spring::SpringParams;
use framecam_project_model::LoadedComposition;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    println!("Validating composition at: {}", path.display());

    let loaded = LoadedComposition::load(&path)
        .map_err(|e| anyhow::anyhow!("Failed to load composition: {e}"))?;
    let comp = &loaded.composition;

    println!("  Name: {}", comp.name);
    println!("  Version: {}", comp.version);
    println!("  Size: {}x{} @ {}fps", comp.width, comp.height, comp.fps);
    println!("  Clips: {}", comp.clips.len());
    println!("  Zoom effects: {}", comp.effects.len());

    let mut issues = comp.validate();
    issues.extend(loaded.validate_sources());
    if let Err(e) = SpringParams::from_dynamics(&comp.camera.effective_dynamics()) {
        issues.push(format!("Camera spring is unusable: {e}"));
    }
    if issues.is_empty() {
        if let Err(e) = resolve_layout(&comp.clips, comp.fps) {
            issues.push(format!("Layout cannot be resolved: {e}"));
        }
    }

    if issues.is_empty() {
        println!("  Cursor logs: {}", loaded.cursor_logs.len());
        println!("\nComposition is valid.");
    } else {
        println!("\nValidation issues:");
        for issue in &issues {
            println!("  - {issue}");
        }
        println!(
            "\n{} issue(s) found. Composition may not render as authored.",
            issues.len()
        );
    }

    Ok(())
}
