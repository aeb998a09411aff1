//! Timeline clips referencing recorded media.

use serde::{Deserialize, Serialize};

use crate::geometry::Size;

/// A clip placed on the composition timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    /// Unique clip identifier.
    pub id: String,

    /// Recording (media source) this clip plays from.
    pub recording_id: String,

    /// Start on the composition timeline (ms).
    pub start_ms: f64,

    /// Length on the composition timeline (ms).
    pub duration_ms: f64,

    /// Offset into the source media where playback begins (ms).
    #[serde(default)]
    pub source_in_ms: f64,

    /// Playback rate (1.0 = realtime).
    #[serde(default = "default_playback_rate")]
    pub playback_rate: f64,

    /// Source pixel dimensions of the recording.
    pub source_width: f64,
    pub source_height: f64,
}

fn default_playback_rate() -> f64 {
    1.0
}

impl Clip {
    pub fn new(
        id: impl Into<String>,
        recording_id: impl Into<String>,
        start_ms: f64,
        duration_ms: f64,
    ) -> Self {
        Self {
            id: id.into(),
            recording_id: recording_id.into(),
            start_ms,
            duration_ms,
            source_in_ms: 0.0,
            playback_rate: 1.0,
            source_width: 1920.0,
            source_height: 1080.0,
        }
    }

    /// Builder-style source offset setter.
    pub fn with_source_in(mut self, source_in_ms: f64) -> Self {
        self.source_in_ms = source_in_ms;
        self
    }

    /// Builder-style source dimensions setter.
    pub fn with_source_size(mut self, width: f64, height: f64) -> Self {
        self.source_width = width;
        self.source_height = height;
        self
    }

    /// End on the composition timeline (ms, exclusive).
    pub fn end_ms(&self) -> f64 {
        self.start_ms + self.duration_ms.max(0.0)
    }

    /// Source position where this clip stops (ms).
    pub fn source_out_ms(&self) -> f64 {
        self.source_in_ms + self.duration_ms.max(0.0) * self.playback_rate
    }

    pub fn source_size(&self) -> Size {
        Size::new(self.source_width, self.source_height)
    }

    pub fn validate(&self) -> Vec<String> {
        let mut issues = vec![];
        if !(self.duration_ms.is_finite() && self.duration_ms > 0.0) {
            issues.push(format!(
                "clip '{}': duration_ms must be positive, got {}",
                self.id, self.duration_ms
            ));
        }
        if !(self.playback_rate.is_finite() && self.playback_rate > 0.0) {
            issues.push(format!(
                "clip '{}': playback_rate must be positive, got {}",
                self.id, self.playback_rate
            ));
        }
        if !self.source_size().is_valid() {
            issues.push(format!(
                "clip '{}': invalid source size {}x{}",
                self.id, self.source_width, self.source_height
            ));
        }
        if self.start_ms < 0.0 || self.source_in_ms < 0.0 {
            issues.push(format!("clip '{}': negative start or source_in", self.id));
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_out_respects_rate() {
        let mut clip = Clip::new("c1", "rec", 0.0, 2000.0).with_source_in(500.0);
        clip.playback_rate = 2.0;
        assert!((clip.end_ms() - 2000.0).abs() < 1e-9);
        assert!((clip.source_out_ms() - 4500.0).abs() < 1e-9);
    }

    #[test]
    fn test_validate() {
        assert!(Clip::new("ok", "rec", 0.0, 100.0).validate().is_empty());

        let mut bad = Clip::new("bad", "rec", -5.0, 0.0).with_source_size(0.0, 1080.0);
        bad.playback_rate = 0.0;
        assert_eq!(bad.validate().len(), 4);
    }

    #[test]
    fn test_deserialize_default_rate() {
        let json = r#"{ "id": "c", "recording_id": "r", "start_ms": 0, "duration_ms": 1000,
                        "source_width": 1280, "source_height": 720 }"#;
        let clip: Clip = serde_json::from_str(json).unwrap();
        assert_eq!(clip.playback_rate, 1.0);
        assert_eq!(clip.source_in_ms, 0.0);
    }
}
