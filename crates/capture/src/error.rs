//! Capture error types

use contracts::{ContractError, Side};
use thiserror::Error;

use crate::ChannelState;

/// Capture error
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Operation not allowed in the channel's current state
    #[error("{side} channel cannot {operation} while {state:?}")]
    InvalidState {
        side: Side,
        state: ChannelState,
        operation: &'static str,
    },

    /// Capture size differs from the buffer allocated at connect
    #[error("{side} channel buffer holds {allocated} bytes, frame needs {needed}")]
    BufferMismatch {
        side: Side,
        allocated: usize,
        needed: usize,
    },

    /// Driver, configuration or conversion failure
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl CaptureError {
    pub fn invalid_state(side: Side, state: ChannelState, operation: &'static str) -> Self {
        Self::InvalidState {
            side,
            state,
            operation,
        }
    }

    /// ROI rejected by the device
    pub fn is_configuration_invalid(&self) -> bool {
        matches!(
            self,
            Self::Contract(ContractError::ConfigurationInvalid { .. })
        )
    }
}

/// Capture Result type alias
pub type Result<T> = std::result::Result<T, CaptureError>;
