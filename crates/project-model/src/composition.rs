//! Composition metadata and bundle storage.
//!
//! A composition ties together clips, zoom effects, camera settings, and the
//! cursor logs of every recording it references. On disk a bundle is a
//! directory holding `composition.json` and `cursor/<recording_id>.jsonl`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::camera::CameraSettings;
use crate::clip::Clip;
use crate::cursor::CursorLog;
use crate::effect::{FollowStrategy, ZoomEffect};
use crate::geometry::Size;

/// Top-level composition file (`composition.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    /// Schema version.
    pub version: String,

    /// Human-readable name.
    pub name: String,

    /// Composition frame rate.
    pub fps: f64,

    /// Output dimensions in pixels.
    pub width: f64,
    pub height: f64,

    /// Clips on the timeline (any order).
    #[serde(default)]
    pub clips: Vec<Clip>,

    /// Zoom effects on the timeline.
    #[serde(default)]
    pub effects: Vec<ZoomEffect>,

    /// Camera dynamics and motion blur.
    #[serde(default)]
    pub camera: CameraSettings,
}

impl Composition {
    /// Create an empty composition.
    pub fn new(name: impl Into<String>, width: f64, height: f64, fps: f64) -> Self {
        Self {
            version: "1.0".to_string(),
            name: name.into(),
            fps,
            width,
            height,
            clips: vec![],
            effects: vec![],
            camera: CameraSettings::default(),
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// End of the last clip (ms).
    pub fn duration_ms(&self) -> f64 {
        self.clips.iter().map(Clip::end_ms).fold(0.0, f64::max)
    }

    /// Frames needed to cover every clip.
    pub fn total_frames(&self) -> u32 {
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return 0;
        }
        let exact = self.duration_ms() * self.fps / 1000.0;
        (exact - 1e-6).ceil().max(0.0) as u32
    }

    /// Recordings followed by at least one mouse-follow effect.
    pub fn mouse_follow_recordings(&self) -> Vec<&str> {
        if !self
            .effects
            .iter()
            .any(|e| e.follow == FollowStrategy::Mouse)
        {
            return vec![];
        }
        let mut ids: Vec<&str> = self.clips.iter().map(|c| c.recording_id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Authoring issues, one message per problem.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = vec![];
        if !(self.fps.is_finite() && self.fps > 0.0) {
            issues.push(format!("fps must be positive, got {}", self.fps));
        }
        if !self.size().is_valid() {
            issues.push(format!(
                "invalid composition size {}x{}",
                self.width, self.height
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for clip in &self.clips {
            if !seen.insert(clip.id.as_str()) {
                issues.push(format!("duplicate clip id '{}'", clip.id));
            }
            issues.extend(clip.validate());
        }
        for effect in &self.effects {
            issues.extend(effect.validate());
        }
        issues
    }

    /// Like [`Composition::validate`], but fails on the first batch of issues.
    pub fn ensure_valid(&self) -> Result<(), CompositionError> {
        let issues = self.validate();
        if issues.is_empty() {
            Ok(())
        } else {
            Err(CompositionError::ValidationError {
                message: issues.join("; "),
            })
        }
    }
}

/// The complete in-memory representation of a loaded bundle.
#[derive(Debug, Clone)]
pub struct LoadedComposition {
    /// Filesystem path to the bundle directory.
    pub root: PathBuf,

    /// Composition metadata.
    pub composition: Composition,

    /// Cursor logs keyed by recording id.
    pub cursor_logs: BTreeMap<String, CursorLog>,
}

impl LoadedComposition {
    /// Load a bundle from a directory.
    pub fn load(root: impl AsRef<Path>) -> Result<Self, CompositionError> {
        let root = root.as_ref().to_path_buf();
        let composition_path = root.join("composition.json");

        let json =
            std::fs::read_to_string(&composition_path).map_err(|e| CompositionError::IoError {
                path: composition_path.clone(),
                source: e,
            })?;

        let composition: Composition =
            serde_json::from_str(&json).map_err(|e| CompositionError::ParseError {
                path: composition_path,
                source: e,
            })?;

        let mut cursor_logs = BTreeMap::new();
        let cursor_dir = root.join("cursor");
        for clip in &composition.clips {
            if cursor_logs.contains_key(&clip.recording_id) {
                continue;
            }
            let log_path = cursor_dir.join(format!("{}.jsonl", clip.recording_id));
            if !log_path.exists() {
                continue;
            }
            let content =
                std::fs::read_to_string(&log_path).map_err(|e| CompositionError::IoError {
                    path: log_path.clone(),
                    source: e,
                })?;
            let log = CursorLog::parse_jsonl(&content).map_err(|e| {
                CompositionError::ParseError {
                    path: log_path,
                    source: e,
                }
            })?;
            cursor_logs.insert(clip.recording_id.clone(), log);
        }

        Ok(Self {
            root,
            composition,
            cursor_logs,
        })
    }

    /// Save composition and cursor logs to disk.
    pub fn save(&self) -> Result<(), CompositionError> {
        let cursor_dir = self.root.join("cursor");
        std::fs::create_dir_all(&cursor_dir).map_err(|e| CompositionError::IoError {
            path: cursor_dir.clone(),
            source: e,
        })?;

        let composition_path = self.root.join("composition.json");
        let json = serde_json::to_string_pretty(&self.composition).map_err(|e| {
            CompositionError::ParseError {
                path: composition_path.clone(),
                source: e,
            }
        })?;
        std::fs::write(&composition_path, json).map_err(|e| CompositionError::IoError {
            path: composition_path,
            source: e,
        })?;

        for (recording_id, log) in &self.cursor_logs {
            let log_path = cursor_dir.join(format!("{recording_id}.jsonl"));
            let jsonl = log.to_jsonl().map_err(|e| CompositionError::ParseError {
                path: log_path.clone(),
                source: e,
            })?;
            std::fs::write(&log_path, jsonl).map_err(|e| CompositionError::IoError {
                path: log_path,
                source: e,
            })?;
        }

        Ok(())
    }

    /// Create a new bundle on disk.
    pub fn create(
        root: impl AsRef<Path>,
        composition: Composition,
    ) -> Result<Self, CompositionError> {
        let loaded = Self {
            root: root.as_ref().to_path_buf(),
            composition,
            cursor_logs: BTreeMap::new(),
        };
        loaded.save()?;
        Ok(loaded)
    }

    /// Report recordings that mouse-follow needs but have no cursor log.
    pub fn validate_sources(&self) -> Vec<String> {
        self.composition
            .mouse_follow_recordings()
            .into_iter()
            .filter(|id| self.cursor_logs.get(*id).map_or(true, CursorLog::is_empty))
            .map(|id| format!("Cursor log missing or empty: cursor/{id}.jsonl"))
            .collect()
    }
}

/// Errors that can occur when working with composition bundles.
#[derive(Debug, thiserror::Error)]
pub enum CompositionError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid composition: {message}")]
    ValidationError { message: String },
}
