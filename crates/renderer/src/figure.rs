//! Retained map figure: a list of draw layers exported to PNG or PDF.

use std::fs;
use std::path::{Path, PathBuf};

use grid_common::{AnnotatedGrid, BoundingBox};
use projection::MapProjection;
use tracing::{debug, info};

use crate::canvas::Canvas;
use crate::coastline::Coastlines;
use crate::error::{RenderError, RenderResult};
use crate::gradient::render_raster;
use crate::palette::ColorPalette;
use crate::pdf::PdfCanvas;
use crate::pen::Pen;
use crate::raster::RasterCanvas;

/// Output file format, chosen from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Pdf,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> RenderResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("png") => Ok(OutputFormat::Png),
            Some("pdf") => Ok(OutputFormat::Pdf),
            _ => Err(RenderError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

#[derive(Debug, Clone)]
enum Layer {
    Raster {
        grid: AnnotatedGrid,
        palette: ColorPalette,
    },
    /// Polylines in page points
    Lines {
        lines: Vec<Vec<(f64, f64)>>,
        pen: Pen,
        opacity: f32,
    },
}

/// Summary of an exported figure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFigure {
    pub path: PathBuf,
    pub format: OutputFormat,
    pub bytes: usize,
    /// Size of the rasterised page (PNG) or of the embedded raster (PDF)
    pub width_px: u32,
    pub height_px: u32,
}

/// An orthographic map of `region`.
///
/// Layers are drawn in the order they were added.
#[derive(Debug, Clone)]
pub struct Figure {
    region: BoundingBox,
    projection: MapProjection,
    layers: Vec<Layer>,
}

impl Figure {
    pub fn new(region: BoundingBox, projection: MapProjection) -> Self {
        Self {
            region,
            projection,
            layers: Vec::new(),
        }
    }

    pub fn region(&self) -> &BoundingBox {
        &self.region
    }

    pub fn projection(&self) -> &MapProjection {
        &self.projection
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Number of visible polylines across all line layers.
    pub fn line_count(&self) -> usize {
        self.layers
            .iter()
            .map(|layer| match layer {
                Layer::Lines { lines, .. } => lines.len(),
                Layer::Raster { .. } => 0,
            })
            .sum()
    }

    /// Colour image of `grid` through `palette`.
    pub fn grdimage(&mut self, grid: &AnnotatedGrid, palette: &ColorPalette) {
        debug!(
            grid = %grid.field.name,
            slices = palette.slices.len(),
            "Adding raster layer"
        );
        self.layers.push(Layer::Raster {
            grid: grid.clone(),
            palette: palette.clone(),
        });
    }

    /// Coastlines stroked with `pen`.
    pub fn coast(&mut self, coastlines: &Coastlines, pen: &Pen) {
        let lines = coastlines.lines.iter().map(Vec::as_slice);
        let visible = self.add_lines(lines, pen, 1.0);
        debug!(lines = coastlines.lines.len(), visible, "Adding coastlines");
    }

    /// A lon/lat polyline stroked with `pen` at `transparency` percent
    /// (0 opaque, 100 invisible).
    ///
    /// Consecutive calls with the same pen and transparency share a layer.
    pub fn plot(&mut self, line: &[(f64, f64)], pen: &Pen, transparency: f64) -> RenderResult<()> {
        if !(0.0..=100.0).contains(&transparency) {
            return Err(RenderError::InvalidTransparency(transparency));
        }
        let opacity = (1.0 - transparency / 100.0) as f32;
        self.add_lines(std::iter::once(line), pen, opacity);
        Ok(())
    }

    fn add_lines<'a>(
        &mut self,
        lines: impl Iterator<Item = &'a [(f64, f64)]>,
        pen: &Pen,
        opacity: f32,
    ) -> usize {
        let projected: Vec<Vec<(f64, f64)>> =
            lines.flat_map(|line| self.project_line(line)).collect();
        let count = projected.len();

        match self.layers.last_mut() {
            Some(Layer::Lines {
                lines,
                pen: last_pen,
                opacity: last_opacity,
            }) if *last_pen == *pen && *last_opacity == opacity => lines.extend(projected),
            _ => self.layers.push(Layer::Lines {
                lines: projected,
                pen: *pen,
                opacity,
            }),
        }
        count
    }

    /// Project a lon/lat polyline to page points.
    ///
    /// Points on the far hemisphere or outside the region split the line;
    /// pieces shorter than two points are dropped.
    pub fn project_line(&self, line: &[(f64, f64)]) -> Vec<Vec<(f64, f64)>> {
        let mut runs = Vec::new();
        let mut current = Vec::new();

        for &(lon, lat) in line {
            let page = if self.region.contains_point(lon, lat) {
                self.projection.geo_to_page(lon, lat)
            } else {
                None
            };
            match page {
                Some(p) => current.push(p),
                None => {
                    if current.len() >= 2 {
                        runs.push(std::mem::take(&mut current));
                    } else {
                        current.clear();
                    }
                }
            }
        }
        if current.len() >= 2 {
            runs.push(current);
        }
        runs
    }

    /// Draw every layer onto `canvas`.
    pub fn render<C: Canvas>(&self, canvas: &mut C) -> RenderResult<()> {
        for layer in &self.layers {
            match layer {
                Layer::Raster { grid, palette } => {
                    let (width, height) = canvas.raster_size();
                    let rgba = render_raster(
                        grid,
                        palette,
                        &self.projection,
                        &self.region,
                        width as usize,
                        height as usize,
                    );
                    canvas.draw_raster(&rgba, width, height)?;
                }
                Layer::Lines {
                    lines,
                    pen,
                    opacity,
                } => {
                    for line in lines {
                        canvas.stroke_polyline(line, pen, *opacity)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Encode the figure in memory, returning the bytes and pixel size.
    pub fn encode(&self, format: OutputFormat, dpi: u32) -> RenderResult<(Vec<u8>, u32, u32)> {
        self.encode_with_raster_limit(format, dpi, None)
    }

    /// Like [`Figure::encode`], embedding PDF rasters at no more than
    /// `max_raster_dpi`. PNG output is always rasterised at `dpi`.
    pub fn encode_with_raster_limit(
        &self,
        format: OutputFormat,
        dpi: u32,
        max_raster_dpi: Option<u32>,
    ) -> RenderResult<(Vec<u8>, u32, u32)> {
        if dpi == 0 || max_raster_dpi == Some(0) {
            return Err(RenderError::Canvas("dpi must be positive".to_string()));
        }
        match format {
            OutputFormat::Png => {
                let width = self.projection.width.pixels(dpi);
                let mut canvas = RasterCanvas::new(width, width, dpi)?;
                self.render(&mut canvas)?;
                Ok((canvas.finish()?, width, width))
            }
            OutputFormat::Pdf => {
                let raster_dpi = max_raster_dpi.map_or(dpi, |limit| dpi.min(limit));
                let mut canvas = PdfCanvas::new(
                    self.projection.width_points(),
                    self.projection.height_points(),
                    raster_dpi,
                );
                let (width, height) = canvas.raster_size();
                self.render(&mut canvas)?;
                Ok((canvas.finish()?, width, height))
            }
        }
    }

    /// Export to `path`, the format following its extension.
    ///
    /// The parent directory must exist.
    pub fn savefig(&self, path: &Path, dpi: u32) -> RenderResult<SavedFigure> {
        self.savefig_with_raster_limit(path, dpi, None)
    }

    pub fn savefig_with_raster_limit(
        &self,
        path: &Path,
        dpi: u32,
        max_raster_dpi: Option<u32>,
    ) -> RenderResult<SavedFigure> {
        let format = OutputFormat::from_path(path)?;
        let (bytes, width_px, height_px) =
            self.encode_with_raster_limit(format, dpi, max_raster_dpi)?;
        fs::write(path, &bytes)?;

        info!(
            path = %path.display(),
            format = ?format,
            dpi,
            bytes = bytes.len(),
            width_px,
            height_px,
            "Saved figure"
        );

        Ok(SavedFigure {
            path: path.to_path_buf(),
            format,
            bytes: bytes.len(),
            width_px,
            height_px,
        })
    }
}
