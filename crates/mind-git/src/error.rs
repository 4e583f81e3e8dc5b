//! Error types for the history engine.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised by a [`HistoryEngine`](crate::HistoryEngine).
#[derive(Debug, Error)]
pub enum EngineError {
    /// Underlying git operation failed.
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    /// IO error while preparing the object store.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No object store at the expected location.
    #[error("No history store found at {path}")]
    StoreNotFound { path: PathBuf },

    /// A ref or object id that should exist does not.
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    /// A ref already exists where a new one was requested.
    #[error("Reference already exists: {0}")]
    RefExists(String),
}
