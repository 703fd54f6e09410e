//! Error types for projection parsing.

use thiserror::Error;

pub type ProjectionResult<T> = Result<T, ProjectionError>;

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("Invalid projection code '{code}': {reason}")]
    InvalidCode { code: String, reason: String },

    #[error("Unsupported projection '{0}', only orthographic (G) is available")]
    Unsupported(String),

    #[error("Invalid length '{0}'")]
    InvalidLength(String),
}
