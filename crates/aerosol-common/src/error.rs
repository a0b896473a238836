//! Error types for the aerosol gridding services.

use thiserror::Error;

/// Result type alias using AerosolError.
pub type AerosolResult<T> = Result<T, AerosolError>;

/// Primary error type shared by the gridding crates.
#[derive(Debug, Error)]
pub enum AerosolError {
    // === Input Errors ===
    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid bounding box: {0}")]
    InvalidBbox(String),

    #[error("Unknown product: {0}")]
    UnknownProduct(String),

    #[error("Unknown satellite: {0}")]
    UnknownSatellite(String),

    // === Data Errors ===
    #[error("No granules found for {collection} on {day}")]
    NoGranules { collection: String, day: String },

    #[error("Failed to read data: {0}")]
    DataReadError(String),

    // === Remote Errors ===
    #[error("Archive request failed: {0}")]
    ArchiveError(String),

    #[error("Credential acquisition failed: {0}")]
    CredentialError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AerosolError {
    /// Create an InvalidParameter error.
    pub fn invalid_parameter(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for AerosolError {
    fn from(err: std::io::Error) -> Self {
        AerosolError::InternalError(err.to_string())
    }
}

impl From<serde_json::Error> for AerosolError {
    fn from(err: serde_json::Error) -> Self {
        AerosolError::InternalError(format!("JSON error: {}", err))
    }
}
