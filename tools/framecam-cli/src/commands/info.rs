//! Show composition information.

use std::path::PathBuf;

use framecam_camera_engine::frame_layout::resolve_layout;
use framecam_project_model::LoadedComposition;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    let loaded = LoadedComposition::load(&path)
        .map_err(|e| anyhow::anyhow!("Failed to load composition: {e}"))?;
    let comp = &loaded.composition;

    println!("Composition: {}", comp.name);
    println!("  Size: {}x{} @ {}fps", comp.width, comp.height, comp.fps);
    println!(
        "  Duration: {:.2}s ({} frames)",
        comp.duration_ms() / 1000.0,
        comp.total_frames()
    );
    println!();

    println!("Layout:");
    let layout = resolve_layout(&comp.clips, comp.fps)?;
    for item in &layout {
        println!(
            "  {:<16} frames {:>5}..{:<5} group {:<16} source {}ms @ {}x",
            item.clip_id,
            item.start_frame,
            item.end_frame,
            item.group_id,
            item.source_in_ms,
            item.playback_rate
        );
    }
    println!();

    println!("Zoom effects:");
    for effect in &comp.effects {
        let (intro, outro) = effect.effective_ramps();
        println!(
            "  {:<16} {}..{}ms scale {:.2} follow {:?} (intro {intro:.0}ms, outro {outro:.0}ms)",
            effect.id,
            effect.start_ms,
            effect.end_ms,
            effect.clamped_scale(),
            effect.follow
        );
    }
    println!();

    let dynamics = comp.camera.effective_dynamics();
    println!("Camera:");
    println!("  Preset: {:?}", comp.camera.preset);
    println!(
        "  Spring: stiffness {} damping {:.2} mass {}",
        dynamics.stiffness, dynamics.damping, dynamics.mass
    );
    println!(
        "  Motion blur: {} (intensity {})",
        if comp.camera.motion_blur.enabled {
            "on"
        } else {
            "off"
        },
        comp.camera.motion_blur.intensity
    );
    println!();

    println!("Cursor logs:");
    for (recording_id, log) in &loaded.cursor_logs {
        println!("  {recording_id}: {} samples", log.len());
    }

    Ok(())
}
