//! Layered error definitions
//!
//! Categorized by source: config / device / roi / conversion / io

use thiserror::Error;

use crate::Side;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Device Errors =====
    /// Device unreachable or enumeration failure
    #[error("device connect error for '{device}': {message}")]
    DeviceConnect { device: String, message: String },

    /// Driver call failed on an already connected device
    #[error("device '{device}' driver error: {message}")]
    Driver { device: String, message: String },

    /// Region of interest / format rejected by the device
    #[error("{side} roi rejected: {message}")]
    ConfigurationInvalid { side: Side, message: String },

    /// Raw frame could not be converted to the interchange format
    #[error("frame conversion error: {message}")]
    Conversion { message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create device connect error
    pub fn device_connect(device: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DeviceConnect {
            device: device.into(),
            message: message.into(),
        }
    }

    /// Create driver error
    pub fn driver(device: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Driver {
            device: device.into(),
            message: message.into(),
        }
    }

    /// Create ROI rejection error
    pub fn configuration_invalid(side: Side, message: impl Into<String>) -> Self {
        Self::ConfigurationInvalid {
            side,
            message: message.into(),
        }
    }

    /// Create conversion error
    pub fn conversion(message: impl Into<String>) -> Self {
        Self::Conversion {
            message: message.into(),
        }
    }

    /// Whether the session can keep running after this error.
    ///
    /// Only per-frame conditions are recoverable; everything touching device
    /// identity or configuration ends the session.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Conversion { .. } | Self::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_taxonomy() {
        assert!(ContractError::conversion("bad stride").is_recoverable());
        assert!(ContractError::Io(std::io::Error::other("disk full")).is_recoverable());
        assert!(!ContractError::device_connect("cam0", "unplugged").is_recoverable());
        assert!(!ContractError::configuration_invalid(Side::Left, "offset").is_recoverable());
    }

    #[test]
    fn test_display_names_side() {
        let err = ContractError::configuration_invalid(Side::Right, "offset 6 not aligned to 4");
        assert_eq!(
            err.to_string(),
            "right roi rejected: offset 6 not aligned to 4"
        );
    }
}
