//! Session error types

use std::path::PathBuf;

use capture::CaptureError;
use contracts::ContractError;
use recorder::RecorderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    /// Fewer than two sensors on the bus
    #[error("Too few cameras connected: found {found}, need 2")]
    TooFewDevices { found: usize },

    /// Session directory could not be prepared
    #[error("Failed to prepare session output '{}': {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Session name format is not a valid chrono format
    #[error("Invalid session name format '{format}'")]
    NameFormat { format: String },

    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Recorder(#[from] RecorderError),

    /// A blocking camera control task panicked or was cancelled
    #[error("Camera control task failed: {0}")]
    Control(#[from] tokio::task::JoinError),
}

impl SessionError {
    pub fn output(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Output {
            path: path.into(),
            source,
        }
    }

    pub fn name_format(format: impl Into<String>) -> Self {
        Self::NameFormat {
            format: format.into(),
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, SessionError>;
