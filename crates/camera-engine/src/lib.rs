//! FrameCam Camera Engine
//!
//! Resolves, for every composition frame, where the camera looks and which
//! clip is on screen:
//! - **Spring:** critically damped camera smoothing with sub-stepping
//! - **Zoom Target:** effect selection, follow strategies, intro/outro easing
//! - **Camera Path:** per-frame transforms, motion blur, fingerprint cache
//! - **Frame Layout:** clip quantization, grouping, crossfade boundaries
//! - **Snapshot:** one bundle per rendered frame, with a safety-net fallback
//! - **Drift:** keeps a media element's playhead in step with the timeline
//!
//! This crate is pure computation: no I/O, no platform dependencies.
//! The drift corrector talks to media through the [`drift::MediaElement`]
//! trait.

pub mod camera_path;
pub mod drift;
pub mod frame_layout;
pub mod preview;
pub mod snapshot;
pub mod spring;
pub mod zoom_target;

pub use camera_path::{
    build_path, build_path_with_clock, CameraPath, CameraPathCache, CameraPathFrame, LiveCamera,
    PathFingerprint, PathInputs, ZoomTransform,
};
pub use drift::{DriftCorrector, DriftPhase, DriftTick, MediaElement, SeekError, SeekToken};
pub use frame_layout::{
    active_item, adjacent_items, boundary_state, resolve_layout, BoundaryState, FrameLayoutItem,
};
pub use snapshot::{build_snapshot, EngineSession, FrameSnapshot, SnapshotInputs, SnapshotOutcome};
pub use zoom_target::{resolve_target, TargetContext, ZoomPhase, ZoomTarget};
