//! Error types for the Mind subsystem.

use std::path::PathBuf;

use mind_git::EngineError;
use thiserror::Error;

/// Result type for Mind operations.
pub type MindResult<T> = Result<T, MindError>;

/// Errors that can occur while resolving, packaging or versioning a Mind.
#[derive(Debug, Error)]
pub enum MindError {
    /// Caller supplied an unusable combination of arguments.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A required path or history entry is missing.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Corrupt archive, or an archive member escaping its destination.
    #[error("Invalid mind-file {path}: {message}")]
    Format { path: PathBuf, message: String },

    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A version tag with this name already exists.
    #[error("Version {tag} already exists")]
    VersionCollision { tag: String },

    /// The working tree matches the tip of the current variant.
    #[error("Nothing to save: working tree matches the tip of variant '{variant}'")]
    NoChanges { variant: String },

    /// Uncommitted changes would be lost by switching variants.
    #[error("Uncommitted changes on variant '{variant}'; save them before switching")]
    DirtyState { variant: String },

    /// History engine failure.
    #[error("History error: {0}")]
    Engine(#[from] EngineError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MindError {
    /// Create a format error for an archive.
    pub fn format(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Format {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a not-found error for a filesystem path.
    pub fn missing_path(path: impl Into<PathBuf>) -> Self {
        Self::NotFound(path.into().display().to_string())
    }

    /// Wrap a zip failure for the archive at `path`.
    pub(crate) fn from_zip(path: impl Into<PathBuf>, err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Self::Io(e),
            other => Self::format(path, other.to_string()),
        }
    }
}

impl From<semver::Error> for MindError {
    fn from(err: semver::Error) -> Self {
        MindError::InvalidArgument(format!("invalid version: {err}"))
    }
}
