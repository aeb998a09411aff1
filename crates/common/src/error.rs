//! Error types shared across FrameCam crates.

use std::path::PathBuf;

/// Top-level error type for FrameCam operations.
#[derive(Debug, thiserror::Error)]
pub enum FramecamError {
    /// Invalid engine configuration (fps, spring dynamics, thresholds).
    /// Always fatal for the operation that surfaced it.
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Composition error: {message}")]
    Composition { message: String },

    #[error("Layout error: {message}")]
    Layout { message: String },

    #[error("Processing error: {message}")]
    Processing { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using FramecamError.
pub type FramecamResult<T> = Result<T, FramecamError>;

impl FramecamError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn composition(msg: impl Into<String>) -> Self {
        Self::Composition {
            message: msg.into(),
        }
    }

    pub fn layout(msg: impl Into<String>) -> Self {
        Self::Layout {
            message: msg.into(),
        }
    }

    pub fn processing(msg: impl Into<String>) -> Self {
        Self::Processing {
            message: msg.into(),
        }
    }

    /// Whether this error came from invalid configuration.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = FramecamError::config("fps must be positive, got 0");
        assert!(err.is_config());
        assert_eq!(
            err.to_string(),
            "Configuration error: fps must be positive, got 0"
        );
    }

    #[test]
    fn test_json_error_converts() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: FramecamError = parse.into();
        assert!(matches!(err, FramecamError::Json(_)));
        assert!(!err.is_config());
    }
}
