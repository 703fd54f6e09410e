//! Error types for NetCDF parsing operations.

use grid_common::GridError;
use thiserror::Error;

/// Result type for NetCDF parser operations.
pub type NetCdfResult<T> = Result<T, NetCdfError>;

/// Error types for NetCDF parsing.
#[derive(Error, Debug)]
pub enum NetCdfError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Missing required variable, dimension, category or attribute
    #[error("Missing required data: {0}")]
    MissingData(String),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// Error reported by the netcdf library
    #[error("NetCDF library error: {0}")]
    Library(String),

    /// Grid does not have the resolution the pipeline is built for
    #[error("Grid shape mismatch on '{dimension}': expected {expected}, got {actual}")]
    ShapeMismatch {
        dimension: String,
        expected: usize,
        actual: usize,
    },

    #[error(transparent)]
    Grid(#[from] GridError),
}
