//! Drawing surface shared by the PNG and PDF back ends.
//!
//! Coordinates are page points with the origin at the top-left corner and y
//! growing downwards, the convention of [`projection::MapProjection`].

use crate::error::RenderResult;
use crate::pen::Pen;

pub trait Canvas {
    /// Pixel size of a raster image covering the whole page.
    fn raster_size(&self) -> (u32, u32);

    /// Paint a straight-alpha RGBA image stretched over the whole page.
    fn draw_raster(&mut self, rgba: &[u8], width: u32, height: u32) -> RenderResult<()>;

    /// Stroke an open polyline. Lines with fewer than two points are skipped.
    fn stroke_polyline(&mut self, points: &[(f64, f64)], pen: &Pen, opacity: f32)
        -> RenderResult<()>;

    /// Encode the page into its file format.
    fn finish(self) -> RenderResult<Vec<u8>>
    where
        Self: Sized;
}
