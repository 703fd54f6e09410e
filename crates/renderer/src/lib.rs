//! Map rendering for the wind figure.
//!
//! Builds colour palettes, reads coastlines and draws a retained [`Figure`]
//! made of:
//! - a colour raster of a gridded field
//! - coastline polylines
//! - streamline polylines
//!
//! Figures are exported to PNG (rasterised with tiny-skia) or PDF.

pub mod canvas;
pub mod coastline;
pub mod error;
pub mod figure;
pub mod gradient;
pub mod palette;
pub mod pdf;
pub mod pen;
pub mod png;
pub mod raster;

pub use canvas::Canvas;
pub use coastline::Coastlines;
pub use error::{RenderError, RenderResult};
pub use figure::{Figure, OutputFormat, SavedFigure};
pub use gradient::Color;
pub use palette::{make_cpt, ColorPalette, ColorScheme, CptSlice, Series};
pub use pen::{LineStyle, Pen};
