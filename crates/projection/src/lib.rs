//! Map projections for the wind figure.
//!
//! Implements the orthographic projection from scratch and parses GMT-style
//! projection codes such as `G100/-30/30c`.

pub mod code;
pub mod error;
pub mod orthographic;

pub use code::{Length, MapProjection};
pub use error::{ProjectionError, ProjectionResult};
pub use orthographic::Orthographic;
