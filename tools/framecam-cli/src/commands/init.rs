//! Initialize a new composition bundle.

use std::path::PathBuf;

use framecam_project_model::{Composition, LoadedComposition};

pub fn run(name: String, output: PathBuf, width: u32, height: u32, fps: f64) -> anyhow::Result<()> {
    let root = output.join(&name);
    println!("Creating composition '{}' at {}", name, root.display());

    let composition = Composition::new(&name, f64::from(width), f64::from(height), fps);
    composition
        .ensure_valid()
        .map_err(|e| anyhow::anyhow!("Invalid composition settings: {e}"))?;

    let loaded = LoadedComposition::create(&root, composition)
        .map_err(|e| anyhow::anyhow!("Failed to create composition: {e}"))?;

    println!("Composition created:");
    println!("  Directory: {}", loaded.root.display());
    println!("  Size: {}x{} @ {}fps", width, height, fps);
    println!();
    println!("Directory structure:");
    println!("  {}/", name);
    println!("  ├── composition.json   (clips, zoom effects, camera settings)");
    println!("  └── cursor/            (one <recording-id>.jsonl per recording)");

    Ok(())
}
