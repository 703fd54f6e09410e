//! Error types for streamline extraction.

use thiserror::Error;

pub type StreamlineResult<T> = Result<T, StreamlineError>;

#[derive(Debug, Error)]
pub enum StreamlineError {
    /// Coordinates are too short, not increasing or not evenly spaced
    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    #[error("'{name}' has {actual} values, grid needs {expected} ({ny}x{nx})")]
    ShapeMismatch {
        name: String,
        expected: usize,
        actual: usize,
        ny: usize,
        nx: usize,
    },

    #[error("Density must give a mask of at least 2x2 cells, got {0}")]
    InvalidDensity(f64),

    #[error("Invalid streamline length bounds: min {min}, max {max}")]
    InvalidLength { min: f64, max: f64 },
}
