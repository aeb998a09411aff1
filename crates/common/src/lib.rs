//! FrameCam Common Utilities
//!
//! Shared infrastructure for all FrameCam crates:
//! - Error types and result aliases
//! - Frame clocks (fixed-step and wall-clock) and drift measurement
//! - Tracing/logging initialization
//! - Engine tuning configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
