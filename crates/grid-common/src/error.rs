//! Error types for grid operations.

use thiserror::Error;

/// Result type alias using GridError.
pub type GridResult<T> = Result<T, GridError>;

/// Errors raised when building or combining scalar fields.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("Field '{name}' has {actual} values, expected {expected} ({ny}x{nx})")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
        ny: usize,
        nx: usize,
    },

    #[error("Fields '{left}' and '{right}' do not share coordinates")]
    CoordinateMismatch { left: String, right: String },

    #[error("Invalid region: {0}")]
    InvalidRegion(String),
}
