use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// The three families of pluggable adapters a model can register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterKind {
    Database,
    Storage,
    Compressor,
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            AdapterKind::Database => "database",
            AdapterKind::Storage => "storage",
            AdapterKind::Compressor => "compressor",
        };
        f.write_str(kind)
    }
}

/// A single destination that failed to receive the final artifact.
#[derive(Error, Debug)]
#[error("storage '{storage}' failed to transfer {}: {reason}", .path.display())]
pub struct StorageTransferError {
    pub storage: String,
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("No {kind} adapter registered under the name '{name}'")]
    AdapterNotFound { kind: AdapterKind, name: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Command `{command}` failed with exit status {}: {stderr}", .exit_status.map_or_else(|| "unknown (terminated by signal)".to_string(), |s| s.to_string()))]
    Process {
        command: String,
        exit_status: Option<i32>,
        stderr: String,
    },

    #[error("Command `{command}` timed out after {timeout:?}")]
    CommandTimedOut { command: String, timeout: Duration },

    #[error("Utility '{0}' not found in PATH and no override configured")]
    UtilityNotFound(String),

    #[error("{} of {attempted} storage transfers failed", .failures.len())]
    StorageDispatch {
        attempted: usize,
        failures: Vec<StorageTransferError>,
    },

    #[error("Model '{trigger}' has already been run")]
    AlreadyRun { trigger: String },

    #[error("{primary}; cleanup also failed: {cleanup}")]
    CleanupAfterFailure {
        primary: Box<BackupError>,
        cleanup: Box<BackupError>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BackupError {
    /// Exit status of the failed command, if this error came from one.
    pub fn exit_status(&self) -> Option<i32> {
        match self {
            BackupError::Process { exit_status, .. } => *exit_status,
            BackupError::CleanupAfterFailure { primary, .. } => primary.exit_status(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, BackupError>;
