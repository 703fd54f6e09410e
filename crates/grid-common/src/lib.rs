//! Common grid types shared across the wind streamplot crates.

pub mod bbox;
pub mod error;
pub mod field;
pub mod grid;

pub use bbox::BoundingBox;
pub use error::{GridError, GridResult};
pub use field::ScalarField;
pub use grid::{annotate, AnnotatedGrid, CoordinateType, GridAnnotation, Registration};
