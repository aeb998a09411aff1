use std::path::PathBuf;

use framecam_camera_engine::camera_path::{build_path, CameraPath, PathFingerprint, PathInputs};
use framecam_camera_engine::frame_layout::{resolve_layout, FrameLayoutItem};
use framecam_camera_engine::snapshot::{EngineSession, SnapshotInputs};
use framecam_common::config::DEFAULT_MOUSE_IDLE_PX;
use framecam_project_model::LoadedComposition;

fn load_fixture() -> LoadedComposition {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("fixtures")
        .join("sample-composition");

    LoadedComposition::load(path).expect("fixture composition should load")
}

fn fnv1a_64(input: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in input.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

fn signature(path: &CameraPath) -> u64 {
    let text = path
        .iter()
        .map(|f| {
            format!(
                "{}|{:.9}|{:.9}|{:.9}|{:.6}|{:.6}|{:.9}",
                f.frame,
                f.position.x,
                f.position.y,
                f.zoom_transform.scale,
                f.zoom_transform.pan_x,
                f.zoom_transform.pan_y,
                f.motion_blur_mix
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    fnv1a_64(&text)
}

fn inputs<'a>(loaded: &'a LoadedComposition, layout: &'a [FrameLayoutItem]) -> PathInputs<'a> {
    let comp = &loaded.composition;
    PathInputs {
        effects: &comp.effects,
        layout,
        cursor_logs: &loaded.cursor_logs,
        settings: comp.camera,
        fps: comp.fps,
        composition_size: comp.size(),
        frame_count: comp.total_frames(),
        default_mouse_idle_px: DEFAULT_MOUSE_IDLE_PX,
    }
}

#[test]
fn fixture_is_valid_and_complete() {
    let loaded = load_fixture();
    assert!(loaded.composition.validate().is_empty());
    assert!(loaded.validate_sources().is_empty());
    assert_eq!(loaded.composition.total_frames(), 300);
}

#[test]
fn fixture_path_signature_matches_golden() {
    let loaded = load_fixture();
    let layout = resolve_layout(&loaded.composition.clips, loaded.composition.fps).unwrap();

    let first = build_path(&inputs(&loaded, &layout), true).unwrap();
    let second = build_path(&inputs(&loaded, &layout), true).unwrap();

    assert_eq!(first.len(), 300);
    assert_eq!(signature(&first), 0x2bf85e79401834a4);
    assert_eq!(signature(&first), signature(&second));
    assert_eq!(
        PathFingerprint::of(&inputs(&loaded, &layout)).unwrap(),
        PathFingerprint::of(&inputs(&loaded, &layout)).unwrap()
    );
}

#[test]
fn fixture_path_follows_authored_effects() {
    let loaded = load_fixture();
    let layout = resolve_layout(&loaded.composition.clips, loaded.composition.fps).unwrap();
    assert_eq!(layout.len(), 3);
    assert_eq!(layout[1].group_id, "intro");
    assert_eq!(layout[2].group_id, "terminal");

    let path = build_path(&inputs(&loaded, &layout), true).unwrap();

    // Title zoom holds at 2500ms.
    assert!((path.get(75).unwrap().zoom_transform.scale - 2.5).abs() < 1e-9);

    // Manual prompt target sits left of center on the letterboxed terminal.
    let prompt = path.get(285).unwrap();
    assert!(prompt.position.x < 0.5);
    assert!(prompt.position.y > 0.5);
    assert!(prompt.zoom_transform.pan_x > 0.0);
    assert!((prompt.zoom_transform.scale_compensation_x - 0.9).abs() < 1e-9);

    for frame in path.iter() {
        assert!((1.0..=7.0).contains(&frame.zoom_transform.scale));
        assert!((0.0..=1.0).contains(&frame.motion_blur_mix));
    }
}

#[test]
fn fixture_snapshots_never_fall_back() {
    let loaded = load_fixture();
    let comp = &loaded.composition;
    let layout = resolve_layout(&comp.clips, comp.fps).unwrap();
    let path_inputs = inputs(&loaded, &layout);
    let path = build_path(&path_inputs, true).unwrap();

    let snapshot_inputs = SnapshotInputs {
        layout: &layout,
        path: &path,
        path_fingerprint: PathFingerprint::of(&path_inputs).unwrap(),
        composition_size: comp.size(),
        fps: comp.fps,
        crossfade_ms: 100.0,
        source_dims: None,
    };

    let mut session = EngineSession::new();
    for frame in 0..comp.total_frames() {
        let snapshot = session.snapshot(&snapshot_inputs, frame);
        assert!(snapshot.active.is_some(), "frame {frame}");
        assert_eq!(snapshot.camera.frame, frame);
    }
    assert_eq!(session.anomaly_count(), 0);

    // The seam into the terminal clip is a crossfade window on both sides.
    let before = session.snapshot(&snapshot_inputs, 239);
    assert!(before.boundary.is_near_boundary_end);
    let after = session.snapshot(&snapshot_inputs, 240);
    assert!(after.boundary.should_hold_prev_frame);
    assert_eq!(after.boundary.overlap_frames, 3);
}
