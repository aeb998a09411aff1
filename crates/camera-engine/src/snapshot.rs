//! Per-frame snapshots for the presentation layer.
//!
//! A [`FrameSnapshot`] bundles everything needed to draw one frame: the
//! active clip and its neighbours, crossfade flags, the camera transform, and
//! letterbox geometry. [`build_snapshot`] is pure; [`EngineSession`] carries
//! the state that makes repeated queries cheap and masks transient layout
//! gaps during live edits.

use std::sync::Arc;

use framecam_common::clock::FrameClock;
use framecam_project_model::geometry::{DrawRect, Size};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::camera_path::{CameraPath, CameraPathFrame, PathFingerprint};
use crate::frame_layout::{
    adjacent_items, boundary_state, source_time_ms, BoundaryState, FrameLayoutItem,
};

/// Static placement of the drawn source inside the composition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameGeometry {
    pub composition_width: f64,
    pub composition_height: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub draw_width: f64,
    pub draw_height: f64,
}

impl FrameGeometry {
    fn new(composition: Size, draw: DrawRect) -> Self {
        Self {
            composition_width: composition.width,
            composition_height: composition.height,
            offset_x: draw.offset_x,
            offset_y: draw.offset_y,
            draw_width: draw.width,
            draw_height: draw.height,
        }
    }
}

/// Everything the presentation layer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub frame: u32,
    pub time_ms: f64,
    pub prev: Option<FrameLayoutItem>,
    pub active: Option<FrameLayoutItem>,
    pub next: Option<FrameLayoutItem>,
    pub boundary: BoundaryState,
    pub camera: CameraPathFrame,
    pub geometry: FrameGeometry,
    /// Source media time of the active item (ms).
    pub source_time_ms: Option<f64>,
    /// Re-stamped copy of an earlier snapshot.
    pub is_fallback: bool,
}

/// Inputs shared by every snapshot of one layout/path pair.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotInputs<'a> {
    pub layout: &'a [FrameLayoutItem],
    pub path: &'a CameraPath,
    pub path_fingerprint: PathFingerprint,
    pub composition_size: Size,
    pub fps: f64,
    pub crossfade_ms: f64,
    /// Decoded size of the active media, when reported.
    pub source_dims: Option<Size>,
}

/// Result of [`build_snapshot`].
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotOutcome {
    Resolved(FrameSnapshot),
    /// No active item; the last good snapshot, re-stamped.
    Fallback(FrameSnapshot),
    /// No active item and nothing to fall back to.
    Empty(FrameSnapshot),
}

impl SnapshotOutcome {
    pub fn snapshot(&self) -> &FrameSnapshot {
        match self {
            Self::Resolved(s) | Self::Fallback(s) | Self::Empty(s) => s,
        }
    }

    pub fn into_snapshot(self) -> FrameSnapshot {
        match self {
            Self::Resolved(s) | Self::Fallback(s) | Self::Empty(s) => s,
        }
    }
}

/// Assemble the snapshot for `frame`.
pub fn build_snapshot(
    inputs: &SnapshotInputs<'_>,
    frame: u32,
    last_valid: Option<&FrameSnapshot>,
) -> SnapshotOutcome {
    let time_ms = FrameClock::new(inputs.fps)
        .map(|clock| clock.frame_to_ms(frame))
        .unwrap_or(0.0);
    let neighbors = adjacent_items(inputs.layout, frame);

    if neighbors.active.is_none() {
        if let Some(last) = last_valid {
            let mut restamped = last.clone();
            restamped.frame = frame;
            restamped.time_ms = time_ms;
            restamped.is_fallback = true;
            return SnapshotOutcome::Fallback(restamped);
        }
    }

    let camera = inputs
        .path
        .frame_at(frame as i64)
        .copied()
        .unwrap_or_else(|| CameraPathFrame::identity(frame));
    let draw = match neighbors.active {
        Some(item) => DrawRect::contain(item.source_size, inputs.composition_size),
        None => DrawRect::full(inputs.composition_size),
    };

    let snapshot = FrameSnapshot {
        frame,
        time_ms,
        prev: neighbors.prev.cloned(),
        active: neighbors.active.cloned(),
        next: neighbors.next.cloned(),
        boundary: boundary_state(
            inputs.layout,
            frame,
            inputs.fps,
            inputs.source_dims,
            inputs.crossfade_ms,
        ),
        camera,
        geometry: FrameGeometry::new(inputs.composition_size, draw),
        source_time_ms: neighbors
            .active
            .map(|item| source_time_ms(item, frame, inputs.fps)),
        is_fallback: false,
    };

    if snapshot.active.is_some() {
        SnapshotOutcome::Resolved(snapshot)
    } else {
        SnapshotOutcome::Empty(snapshot)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct SnapshotKey {
    frame: u32,
    layout_version: u64,
    path_fingerprint: PathFingerprint,
    crossfade_bits: u64,
    source_dims_bits: Option<(u64, u64)>,
}

/// Carry-over state between snapshot queries.
#[derive(Debug, Default)]
pub struct EngineSession {
    layout_version: u64,
    freeze_requested: bool,
    frozen: Option<Arc<FrameSnapshot>>,
    /// Last snapshot handed out, whatever its outcome.
    shown: Option<Arc<FrameSnapshot>>,
    last_good: Option<Arc<FrameSnapshot>>,
    cached: Option<(SnapshotKey, Arc<FrameSnapshot>)>,
    anomalies: u64,
}

impl EngineSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot for `frame`, reusing the previous `Arc` when nothing changed.
    pub fn snapshot(&mut self, inputs: &SnapshotInputs<'_>, frame: u32) -> Arc<FrameSnapshot> {
        if let Some(frozen) = &self.frozen {
            return Arc::clone(frozen);
        }

        let key = SnapshotKey {
            frame,
            layout_version: self.layout_version,
            path_fingerprint: inputs.path_fingerprint,
            crossfade_bits: inputs.crossfade_ms.to_bits(),
            source_dims_bits: inputs
                .source_dims
                .map(|d| (d.width.to_bits(), d.height.to_bits())),
        };

        let hit = self
            .cached
            .as_ref()
            .filter(|(cached_key, _)| *cached_key == key)
            .map(|(_, snapshot)| Arc::clone(snapshot));
        let snapshot = match hit {
            Some(snapshot) => snapshot,
            None => self.rebuild(inputs, frame, key),
        };

        if self.freeze_requested {
            self.frozen = Some(Arc::clone(&snapshot));
        }
        self.shown = Some(Arc::clone(&snapshot));
        snapshot
    }

    fn rebuild(
        &mut self,
        inputs: &SnapshotInputs<'_>,
        frame: u32,
        key: SnapshotKey,
    ) -> Arc<FrameSnapshot> {
        match build_snapshot(inputs, frame, self.last_good.as_deref()) {
            SnapshotOutcome::Resolved(snapshot) => {
                let snapshot = Arc::new(snapshot);
                self.last_good = Some(Arc::clone(&snapshot));
                self.cached = Some((key, Arc::clone(&snapshot)));
                snapshot
            }
            SnapshotOutcome::Fallback(snapshot) => {
                self.anomalies += 1;
                warn!(
                    frame,
                    anomalies = self.anomalies,
                    "no renderable item for frame, reusing last good snapshot"
                );
                Arc::new(snapshot)
            }
            SnapshotOutcome::Empty(snapshot) => {
                debug!(frame, "no renderable item and no previous snapshot");
                Arc::new(snapshot)
            }
        }
    }

    /// Pin the current picture (e.g. while scrubbing).
    ///
    /// Freezing pins the snapshot last returned; if none was returned yet,
    /// the next one becomes the frozen one. Freezing twice keeps the first pin.
    pub fn set_frozen(&mut self, frozen: bool) {
        self.freeze_requested = frozen;
        if !frozen {
            self.frozen = None;
        } else if self.frozen.is_none() {
            self.frozen = self.shown.clone();
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.freeze_requested
    }

    /// Times a fallback snapshot was served.
    pub fn anomaly_count(&self) -> u64 {
        self.anomalies
    }

    pub fn layout_version(&self) -> u64 {
        self.layout_version
    }

    /// Clips were added, removed, or moved.
    pub fn on_track_list_changed(&mut self) {
        self.layout_version += 1;
        self.last_good = None;
        self.cached = None;
    }

    /// Switched between preview and export.
    pub fn on_mode_changed(&mut self) {
        self.freeze_requested = false;
        self.frozen = None;
        self.shown = None;
        self.cached = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::camera_path::{build_path, PathInputs};
    use crate::frame_layout::resolve_layout;
    use framecam_project_model::camera::CameraSettings;
    use framecam_project_model::clip::Clip;

    struct Fixture {
        layout: Vec<FrameLayoutItem>,
        path: CameraPath,
        fingerprint: PathFingerprint,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_frames(150)
        }

        /// `a` on [0, 60), gap, `b` on [90, 150).
        fn with_frames(frame_count: u32) -> Self {
            let clips = vec![
                Clip::new("a", "rec-1", 0.0, 2000.0),
                Clip::new("b", "rec-2", 3000.0, 2000.0).with_source_size(1080.0, 1080.0),
            ];
            let layout = resolve_layout(&clips, 30.0).unwrap();
            let logs = BTreeMap::new();
            let path_inputs = PathInputs {
                effects: &[],
                layout: &layout,
                cursor_logs: &logs,
                settings: CameraSettings::default(),
                fps: 30.0,
                composition_size: Size::new(1920.0, 1080.0),
                frame_count,
                default_mouse_idle_px: 8.0,
            };
            let path = build_path(&path_inputs, true).unwrap();
            let fingerprint = PathFingerprint::of(&path_inputs).unwrap();
            Self {
                layout,
                path,
                fingerprint,
            }
        }

        fn inputs(&self) -> SnapshotInputs<'_> {
            SnapshotInputs {
                layout: &self.layout,
                path: &self.path,
                path_fingerprint: self.fingerprint,
                composition_size: Size::new(1920.0, 1080.0),
                fps: 30.0,
                crossfade_ms: 0.0,
                source_dims: None,
            }
        }
    }

    #[test]
    fn test_resolved_snapshot_fields() {
        let fx = Fixture::new();
        let outcome = build_snapshot(&fx.inputs(), 100, None);
        let SnapshotOutcome::Resolved(s) = outcome else {
            panic!("expected a resolved snapshot");
        };
        assert_eq!(s.active.as_ref().unwrap().clip_id, "b");
        assert_eq!(s.prev.as_ref().unwrap().clip_id, "a");
        assert!(s.next.is_none());
        assert_eq!(s.camera.frame, 100);
        assert!((s.geometry.draw_width - 1080.0).abs() < 1e-9);
        assert!((s.geometry.offset_x - 420.0).abs() < 1e-9);
        assert!((s.source_time_ms.unwrap() - 10_000.0 / 30.0).abs() < 1e-9);
        assert!(!s.is_fallback);
    }

    #[test]
    fn test_camera_frame_is_clamped() {
        // Path shorter than the layout: late frames reuse the last camera frame.
        let fx = Fixture::with_frames(100);
        let s = build_snapshot(&fx.inputs(), 120, None).into_snapshot();
        assert_eq!(s.active.as_ref().unwrap().clip_id, "b");
        assert_eq!(s.camera.frame, 99);
    }

    #[test]
    fn test_empty_path_gives_identity_camera() {
        let fx = Fixture::new();
        let empty: CameraPath = serde_json::from_str(r#"{"frames": [], "fps": 30.0}"#).unwrap();
        let mut inputs = fx.inputs();
        inputs.path = &empty;
        let s = build_snapshot(&inputs, 10, None).into_snapshot();
        assert_eq!(s.camera, CameraPathFrame::identity(10));
    }

    #[test]
    fn test_gap_without_history_is_empty() {
        let fx = Fixture::new();
        let outcome = build_snapshot(&fx.inputs(), 75, None);
        assert!(matches!(outcome, SnapshotOutcome::Empty(_)));
        let s = outcome.snapshot();
        assert!(s.active.is_none());
        assert!(!s.is_fallback);
    }

    #[test]
    fn test_session_falls_back_and_counts() {
        let fx = Fixture::new();
        let mut session = EngineSession::new();
        let good = session.snapshot(&fx.inputs(), 10);
        assert_eq!(session.anomaly_count(), 0);

        let masked = session.snapshot(&fx.inputs(), 75);
        assert!(masked.is_fallback);
        assert_eq!(masked.frame, 75);
        assert_eq!(masked.active, good.active);
        assert_eq!(session.anomaly_count(), 1);

        session.snapshot(&fx.inputs(), 76);
        assert_eq!(session.anomaly_count(), 2);
    }

    #[test]
    fn test_session_reuses_arc_for_identical_inputs() {
        let fx = Fixture::new();
        let mut session = EngineSession::new();
        let a = session.snapshot(&fx.inputs(), 20);
        let b = session.snapshot(&fx.inputs(), 20);
        assert!(Arc::ptr_eq(&a, &b));

        let mut inputs = fx.inputs();
        inputs.crossfade_ms = 100.0;
        let c = session.snapshot(&inputs, 20);
        assert!(!Arc::ptr_eq(&a, &c));

        let d = session.snapshot(&fx.inputs(), 21);
        assert!(!Arc::ptr_eq(&c, &d));
    }

    #[test]
    fn test_freeze_pins_snapshot() {
        let fx = Fixture::new();
        let mut session = EngineSession::new();
        session.set_frozen(true);
        let pinned = session.snapshot(&fx.inputs(), 10);
        let still = session.snapshot(&fx.inputs(), 40);
        assert!(Arc::ptr_eq(&pinned, &still));
        assert_eq!(still.frame, 10);

        session.set_frozen(false);
        assert_eq!(session.snapshot(&fx.inputs(), 40).frame, 40);
    }

    #[test]
    fn test_freeze_returns_previously_shown_snapshot() {
        let fx = Fixture::new();
        let mut session = EngineSession::new();
        let shown = session.snapshot(&fx.inputs(), 10);

        session.set_frozen(true);
        let during = session.snapshot(&fx.inputs(), 40);
        assert!(Arc::ptr_eq(&shown, &during));
        assert_eq!(during.frame, 10);

        // A second freeze request mid-gesture keeps the original pin.
        session.set_frozen(true);
        assert!(Arc::ptr_eq(&shown, &session.snapshot(&fx.inputs(), 50)));

        session.set_frozen(false);
        let after = session.snapshot(&fx.inputs(), 40);
        assert_eq!(after.frame, 40);
        assert!(!Arc::ptr_eq(&shown, &after));
    }

    #[test]
    fn test_freeze_pins_shown_fallback() {
        let fx = Fixture::new();
        let mut session = EngineSession::new();
        session.snapshot(&fx.inputs(), 10);
        let masked = session.snapshot(&fx.inputs(), 75);
        assert!(masked.is_fallback);

        session.set_frozen(true);
        let during = session.snapshot(&fx.inputs(), 100);
        assert!(Arc::ptr_eq(&masked, &during));
        assert_eq!(session.anomaly_count(), 1);
    }

    #[test]
    fn test_mode_change_clears_freeze() {
        let fx = Fixture::new();
        let mut session = EngineSession::new();
        session.set_frozen(true);
        session.snapshot(&fx.inputs(), 10);
        session.on_mode_changed();
        assert!(!session.is_frozen());
        assert_eq!(session.snapshot(&fx.inputs(), 30).frame, 30);
    }

    #[test]
    fn test_track_list_change_drops_history() {
        let fx = Fixture::new();
        let mut session = EngineSession::new();
        let before = session.snapshot(&fx.inputs(), 10);
        session.on_track_list_changed();
        assert_eq!(session.layout_version(), 1);

        let after = session.snapshot(&fx.inputs(), 10);
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(*before, *after);

        session.on_track_list_changed();
        let gap = session.snapshot(&fx.inputs(), 75);
        assert!(!gap.is_fallback);
        assert_eq!(session.anomaly_count(), 0);
    }
}
