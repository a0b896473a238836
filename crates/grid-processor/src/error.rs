//! Error types for grid processing.

use thiserror::Error;

/// Errors that can occur during grid processing.
///
/// Everything except [`GridProcessorError::ExportFailed`] and
/// [`GridProcessorError::NetCdf`] is a caller contract violation: the inputs
/// were rejected before any work was done.
#[derive(Error, Debug)]
pub enum GridProcessorError {
    /// The four sample sequences do not have the same length.
    #[error("sample arrays differ in length: values={values}, lats={lats}, lons={lons}, angles={angles}")]
    LengthMismatch {
        values: usize,
        lats: usize,
        lons: usize,
        angles: usize,
    },

    /// Cell size is zero, negative or not finite.
    #[error("cell size must be a positive finite number, got {0}")]
    InvalidCellSize(f64),

    /// The bounding box is inverted, degenerate or not finite.
    #[error("invalid grid domain: {0}")]
    InvalidDomain(String),

    /// Two grids that must share a shape do not.
    #[error("grid shapes differ: {left} cells vs {right} cells")]
    ShapeMismatch { left: usize, right: usize },

    /// Two gridded products were built on different domains.
    #[error("products were gridded on different domains: {0}")]
    DomainMismatch(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Writing the output file failed.
    #[error("export failed: {0}")]
    ExportFailed(String),

    /// NetCDF library error.
    #[error("NetCDF error: {0}")]
    NetCdf(#[from] netcdf::Error),
}

impl GridProcessorError {
    /// Create an InvalidDomain error.
    pub fn invalid_domain(msg: impl Into<String>) -> Self {
        Self::InvalidDomain(msg.into())
    }

    /// Create an ExportFailed error.
    pub fn export_failed(msg: impl Into<String>) -> Self {
        Self::ExportFailed(msg.into())
    }

    /// True when the error was raised by input validation.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::LengthMismatch { .. }
                | Self::InvalidCellSize(_)
                | Self::InvalidDomain(_)
                | Self::ShapeMismatch { .. }
                | Self::DomainMismatch(_)
        )
    }
}

impl From<std::io::Error> for GridProcessorError {
    fn from(err: std::io::Error) -> Self {
        Self::ExportFailed(err.to_string())
    }
}

/// Result type for grid processor operations.
pub type Result<T> = std::result::Result<T, GridProcessorError>;
