// Centralized error handling module
// Provides context-rich error types for discovery, configuration, and state persistence

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Main error type for the sync core
/// Discovery and configuration errors are fatal and abort a run before any
/// upload is attempted; per-file upload failures are reported separately
/// (see `sync::batch::UploadFailure`) and never surface through this type.
#[derive(Debug)]
pub enum SyncError {
    /// Module root directory missing
    RootNotFound { path: PathBuf },
    /// Module root exists but is not a directory
    NotADirectory { path: PathBuf },
    /// Walking the module tree failed
    Discovery { path: PathBuf, source: io::Error },

    /// Include pattern failed to compile
    InvalidPattern { pattern: String, reason: String },

    /// Persisted incremental-state read/write failure
    StateStore { path: PathBuf, operation: String, source: io::Error },
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SyncError::RootNotFound { path } => {
                write!(f, "Module root directory not found: {}\n", path.display())?;
                write!(f, "Suggestion: Check that the directory path is correct and the directory exists")
            }
            SyncError::NotADirectory { path } => {
                write!(f, "Module root is not a directory: {}\n", path.display())?;
                write!(f, "Suggestion: Point the sync at the root directory of the module tree, not a file")
            }
            SyncError::Discovery { path, source } => {
                write!(f, "Failed to walk module tree {}: {}\n", path.display(), source)?;
                write!(f, "Suggestion: Check directory permissions")
            }
            SyncError::InvalidPattern { pattern, reason } => {
                write!(f, "Invalid include pattern '{}': {}\n", pattern, reason)?;
                write!(f, "Suggestion: The include pattern must be a valid regular expression")
            }
            SyncError::StateStore { path, operation, source } => {
                write!(f, "Incremental state error while {} {}: {}\n", operation, path.display(), source)?;
                write!(f, "Suggestion: Check file permissions and disk space for the state file")
            }
        }
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SyncError::Discovery { source, .. } => Some(source),
            SyncError::StateStore { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl SyncError {
    /// Create a StateStore error with context about the operation
    pub fn state_store(err: io::Error, operation: &str, path: PathBuf) -> Self {
        SyncError::StateStore {
            path,
            operation: operation.to_string(),
            source: err,
        }
    }
}
