//! FrameCam Project Model
//!
//! Defines the data contracts the camera engine consumes:
//! - **Clips:** Timeline placement of recorded media
//! - **Effects:** Zoom effects with follow strategies and easing
//! - **Camera:** Spring dynamics presets and motion blur settings
//! - **Cursor:** Recorded cursor logs used for deterministic mouse-follow
//! - **Composition:** Top-level bundle tying everything together
//!
//! Cursor coordinates are normalized to `[0.0, 1.0]` relative to the
//! recording's source dimensions. Manual zoom targets stay in source pixels.

pub mod camera;
pub mod clip;
pub mod composition;
pub mod cursor;
pub mod effect;
pub mod geometry;

pub use camera::*;
pub use clip::*;
pub use composition::*;
pub use cursor::*;
pub use effect::*;
pub use geometry::*;
