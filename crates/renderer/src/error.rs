//! Error types for palette handling, figure composition and export.

use std::io;

use thiserror::Error;

pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Unknown color scheme: {0}")]
    UnknownScheme(String),

    #[error("Invalid palette: {0}")]
    InvalidPalette(String),

    #[error("Invalid pen '{pen}': {reason}")]
    InvalidPen { pen: String, reason: String },

    #[error("Invalid transparency {0}, expected 0-100")]
    InvalidTransparency(f64),

    #[error("Invalid GeoJSON: {0}")]
    GeoJson(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("Canvas error: {0}")]
    Canvas(String),

    #[error("Encoding failed: {0}")]
    Encode(String),
}
