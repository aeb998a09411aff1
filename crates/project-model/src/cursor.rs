//! Recorded cursor logs.
//!
//! Logs are stored as JSONL (one sample per line) next to the composition.
//! Sample times are in the recording's source time, and positions are
//! normalized against the recording's source dimensions. Mouse-follow reads
//! these logs, never a live pointer, so export reproduces the preview.

use serde::{Deserialize, Serialize};

use crate::geometry::Point2D;

/// One recorded cursor position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CursorSample {
    /// Source time in milliseconds.
    pub t: f64,
    /// Normalized X coordinate [0.0, 1.0].
    pub x: f64,
    /// Normalized Y coordinate [0.0, 1.0].
    pub y: f64,
}

impl CursorSample {
    pub fn new(t: f64, x: f64, y: f64) -> Self {
        Self { t, x, y }
    }

    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }
}

/// Time-ordered cursor samples for one recording.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CursorLog {
    samples: Vec<CursorSample>,
}

impl CursorLog {
    /// Build a log, sorting samples by time and dropping non-finite ones.
    pub fn new(mut samples: Vec<CursorSample>) -> Self {
        samples.retain(|s| s.t.is_finite() && s.x.is_finite() && s.y.is_finite());
        samples.sort_by(|a, b| a.t.total_cmp(&b.t));
        Self { samples }
    }

    /// Parse JSONL content. Blank lines and `#` comments are skipped.
    pub fn parse_jsonl(jsonl: &str) -> Result<Self, serde_json::Error> {
        let samples = jsonl
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(serde_json::from_str)
            .collect::<Result<Vec<CursorSample>, _>>()?;
        Ok(Self::new(samples))
    }

    /// Serialize back to JSONL.
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        let mut out = String::new();
        for sample in &self.samples {
            out.push_str(&serde_json::to_string(sample)?);
            out.push('\n');
        }
        Ok(out)
    }

    pub fn samples(&self) -> &[CursorSample] {
        &self.samples
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Cursor position at a source time, linearly interpolated.
    ///
    /// Times before the first or after the last sample clamp to that sample.
    pub fn position_at(&self, source_ms: f64) -> Option<Point2D> {
        let first = self.samples.first()?;
        let last = self.samples.last()?;

        if source_ms <= first.t {
            return Some(first.position());
        }
        if source_ms >= last.t {
            return Some(last.position());
        }

        // First sample strictly after source_ms; guaranteed in 1..len.
        let idx = self.samples.partition_point(|s| s.t <= source_ms);
        let a = &self.samples[idx - 1];
        let b = &self.samples[idx];

        let duration = b.t - a.t;
        if duration <= f64::EPSILON {
            return Some(a.position());
        }

        let t = (source_ms - a.t) / duration;
        Some(Point2D::lerp(&a.position(), &b.position(), t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_comments_and_sorts() {
        let jsonl = "# cursor log\n\
                     {\"t\": 100, \"x\": 0.2, \"y\": 0.2}\n\
                     \n\
                     {\"t\": 0, \"x\": 0.1, \"y\": 0.1}\n";
        let log = CursorLog::parse_jsonl(jsonl).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log.samples()[0].t, 0.0);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(CursorLog::parse_jsonl("{\"t\": 1}").is_err());
    }

    #[test]
    fn test_position_at_interpolation() {
        let log = CursorLog::new(vec![
            CursorSample::new(0.0, 0.0, 0.0),
            CursorSample::new(1000.0, 1.0, 1.0),
        ]);

        let mid = log.position_at(500.0).unwrap();
        assert!((mid.x - 0.5).abs() < 1e-9);
        assert!((mid.y - 0.5).abs() < 1e-9);

        assert_eq!(log.position_at(-10.0).unwrap(), Point2D::new(0.0, 0.0));
        assert_eq!(log.position_at(5000.0).unwrap(), Point2D::new(1.0, 1.0));
    }

    #[test]
    fn test_position_at_exact_sample() {
        let log = CursorLog::new(vec![
            CursorSample::new(0.0, 0.1, 0.1),
            CursorSample::new(10.0, 0.2, 0.3),
            CursorSample::new(20.0, 0.9, 0.9),
        ]);
        let p = log.position_at(10.0).unwrap();
        assert!((p.x - 0.2).abs() < 1e-9);
        assert!((p.y - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_empty_log_has_no_position() {
        assert!(CursorLog::default().position_at(0.0).is_none());
    }

    #[test]
    fn test_jsonl_round_trip() {
        let log = CursorLog::new(vec![CursorSample::new(5.0, 0.25, 0.75)]);
        let parsed = CursorLog::parse_jsonl(&log.to_jsonl().unwrap()).unwrap();
        assert_eq!(parsed, log);
    }
}
