//! Wind streamplot key figure.
//!
//! Reads 10 m wind from a prediction file, traces streamlines through it and
//! draws them over a wind speed map on an orthographic globe, exported as
//! PNG and PDF.

pub mod config;
pub mod pipeline;

pub use config::{KeyFigureConfig, OutputTarget};
pub use pipeline::{run, KeyFigurePipeline, MapStyle, RunSummary};
