//! Colour raster rendering of gridded data on the map projection.

use grid_common::{AnnotatedGrid, BoundingBox};
use projection::MapProjection;
use rayon::prelude::*;

use crate::palette::ColorPalette;

/// Color value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub fn transparent() -> Self {
        Self { r: 0, g: 0, b: 0, a: 0 }
    }

    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Linear color interpolation, `t` clamped to [0, 1].
pub fn interpolate_color(color1: Color, color2: Color, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let t_inv = 1.0 - t;
    let mix = |a: u8, b: u8| (a as f32 * t_inv + b as f32 * t).round() as u8;

    Color::new(
        mix(color1.r, color2.r),
        mix(color1.g, color2.g),
        mix(color1.b, color2.b),
        mix(color1.a, color2.a),
    )
}

/// Render `grid` as seen through `projection` into a `width` x `height`
/// straight-alpha RGBA buffer covering the whole page.
///
/// Each device pixel is inverse-projected from its centre. Pixels off the
/// globe or outside `region` stay transparent; the rest take the palette
/// colour of the grid value there (the NaN colour where the grid has none).
/// Rows are coloured in parallel; the output does not depend on the number
/// of threads.
pub fn render_raster(
    grid: &AnnotatedGrid,
    palette: &ColorPalette,
    projection: &MapProjection,
    region: &BoundingBox,
    width: usize,
    height: usize,
) -> Vec<u8> {
    let mut pixels = vec![0u8; width * height * 4];
    if width == 0 || height == 0 {
        return pixels;
    }

    let sx = projection.width_points() / width as f64;
    let sy = projection.height_points() / height as f64;

    pixels
        .par_chunks_mut(width * 4)
        .enumerate()
        .for_each(|(row, line)| {
            let py = (row as f64 + 0.5) * sy;
            for (col, pixel) in line.chunks_exact_mut(4).enumerate() {
                let px = (col as f64 + 0.5) * sx;
                let Some((lon, lat)) = projection.page_to_geo(px, py) else {
                    continue;
                };
                if !region.contains_point(lon, lat) {
                    continue;
                }
                let value = grid.sample(lon, lat);
                pixel.copy_from_slice(&palette.color_at(value).to_rgba());
            }
        });

    pixels
}
