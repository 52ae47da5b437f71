//! Error handling for rswupd-store
//!
//! Wraps the rswupd-core UpdError facility with store-specific helpers

use rswupd_core::errors::{UpdError, UpdErrorKind};
use std::path::Path;

/// Result type alias using UpdError
pub type Result<T> = std::result::Result<T, UpdError>;

/// Create a filesystem error for a state-directory operation
pub fn fs_error(op: &str, path: &Path, err: std::io::Error) -> UpdError {
    UpdError::new(UpdErrorKind::Filesystem)
        .with_op(op)
        .with_path(path.display().to_string())
        .with_message(err.to_string())
}

/// Create a concurrency error for a held run lock
pub fn lock_held(path: &Path) -> UpdError {
    UpdError::new(UpdErrorKind::Concurrency)
        .with_op("run_lock")
        .with_path(path.display().to_string())
        .with_message("another update run holds the state-directory lock")
}
