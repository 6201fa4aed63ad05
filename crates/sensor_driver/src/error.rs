//! Sensor driver error types

use contracts::ContractError;
use thiserror::Error;

/// Errors raised inside the simulated driver before they cross the
/// `CameraDevice` boundary as `ContractError`
#[derive(Debug, Error)]
pub enum SensorDriverError {
    /// Operation on a closed connection
    #[error("device '{device}' is not connected")]
    NotConnected { device: String },

    /// Operation that needs an idle device while it streams
    #[error("device '{device}' is streaming")]
    Busy { device: String },

    /// Capture window rejected by the sensor
    #[error("device '{device}' rejected roi: {reason}")]
    RoiRejected { device: String, reason: String },

    /// Frame thread could not be spawned
    #[error("failed to spawn frame thread for '{device}': {source}")]
    Spawn {
        device: String,
        #[source]
        source: std::io::Error,
    },
}

impl SensorDriverError {
    pub fn not_connected(device: impl Into<String>) -> Self {
        Self::NotConnected {
            device: device.into(),
        }
    }

    pub fn busy(device: impl Into<String>) -> Self {
        Self::Busy {
            device: device.into(),
        }
    }

    fn device(&self) -> &str {
        match self {
            Self::NotConnected { device }
            | Self::Busy { device }
            | Self::RoiRejected { device, .. }
            | Self::Spawn { device, .. } => device,
        }
    }
}

impl From<SensorDriverError> for ContractError {
    fn from(err: SensorDriverError) -> Self {
        ContractError::driver(err.device().to_string(), err.to_string())
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, SensorDriverError>;
