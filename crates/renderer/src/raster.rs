//! Raster back end: draws the page into a `tiny-skia` pixmap and encodes PNG.

use tiny_skia::{
    ColorU8, FilterQuality, IntSize, LineCap, LineJoin, Paint, PathBuilder, Pixmap, PixmapPaint,
    Stroke, StrokeDash, Transform,
};

use crate::canvas::Canvas;
use crate::error::{RenderError, RenderResult};
use crate::pen::Pen;
use crate::png::create_png_with_dpi;

/// A white page rasterised at `dpi`.
pub struct RasterCanvas {
    pixmap: Pixmap,
    dpi: u32,
    /// Device pixels per point
    scale: f32,
}

impl RasterCanvas {
    pub fn new(width: u32, height: u32, dpi: u32) -> RenderResult<Self> {
        let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
            RenderError::Canvas(format!("cannot allocate a {}x{} pixmap", width, height))
        })?;
        pixmap.fill(tiny_skia::Color::WHITE);

        Ok(Self {
            pixmap,
            dpi,
            scale: dpi as f32 / projection::code::POINTS_PER_INCH as f32,
        })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Straight-alpha RGBA copy of the page.
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixmap.data().len());
        for pixel in self.pixmap.pixels() {
            let c = pixel.demultiply();
            out.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        out
    }
}

/// Convert straight RGBA to the premultiplied layout `tiny-skia` stores.
fn premultiply(rgba: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(rgba.len());
    for px in rgba.chunks_exact(4) {
        let c = ColorU8::from_rgba(px[0], px[1], px[2], px[3]).premultiply();
        out.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    out
}

impl Canvas for RasterCanvas {
    fn raster_size(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    fn draw_raster(&mut self, rgba: &[u8], width: u32, height: u32) -> RenderResult<()> {
        if rgba.len() != width as usize * height as usize * 4 {
            return Err(RenderError::Canvas(format!(
                "raster of {}x{} needs {} bytes, got {}",
                width,
                height,
                width as usize * height as usize * 4,
                rgba.len()
            )));
        }
        let size = IntSize::from_wh(width, height)
            .ok_or_else(|| RenderError::Canvas("empty raster".to_string()))?;
        let image = Pixmap::from_vec(premultiply(rgba), size)
            .ok_or_else(|| RenderError::Canvas("raster does not fit a pixmap".to_string()))?;

        let transform = Transform::from_scale(
            self.width() as f32 / width as f32,
            self.height() as f32 / height as f32,
        );
        let paint = PixmapPaint {
            quality: FilterQuality::Nearest,
            ..PixmapPaint::default()
        };
        self.pixmap
            .draw_pixmap(0, 0, image.as_ref(), &paint, transform, None);
        Ok(())
    }

    fn stroke_polyline(
        &mut self,
        points: &[(f64, f64)],
        pen: &Pen,
        opacity: f32,
    ) -> RenderResult<()> {
        if points.len() < 2 {
            return Ok(());
        }

        let mut paint = Paint::default();
        let alpha = (pen.color.a as f32 * opacity.clamp(0.0, 1.0)).round() as u8;
        paint.set_color_rgba8(pen.color.r, pen.color.g, pen.color.b, alpha);
        paint.anti_alias = true;

        // Zero width is a hairline in tiny-skia
        let mut stroke = Stroke::default();
        stroke.width = pen.width as f32 * self.scale;
        stroke.line_cap = LineCap::Round;
        stroke.line_join = LineJoin::Round;
        let dashes: Vec<f32> = pen
            .style
            .dash_pattern(pen.width)
            .into_iter()
            .map(|d| d as f32 * self.scale)
            .collect();
        if !dashes.is_empty() {
            stroke.dash = StrokeDash::new(dashes, 0.0);
        }

        let mut pb = PathBuilder::new();
        pb.move_to(points[0].0 as f32, points[0].1 as f32);
        for &(x, y) in &points[1..] {
            pb.line_to(x as f32, y as f32);
        }

        if let Some(path) = pb.finish() {
            let transform = Transform::from_scale(self.scale, self.scale);
            self.pixmap
                .stroke_path(&path, &paint, &stroke, transform, None);
        }
        Ok(())
    }

    fn finish(self) -> RenderResult<Vec<u8>> {
        create_png_with_dpi(
            &self.to_rgba(),
            self.width() as usize,
            self.height() as usize,
            Some(self.dpi),
        )
        .map_err(RenderError::Encode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gradient::Color;

    fn pixel(canvas: &RasterCanvas, x: u32, y: u32) -> [u8; 4] {
        let rgba = canvas.to_rgba();
        let i = ((y * canvas.width() + x) * 4) as usize;
        [rgba[i], rgba[i + 1], rgba[i + 2], rgba[i + 3]]
    }

    #[test]
    fn test_page_starts_white() {
        let canvas = RasterCanvas::new(4, 3, 72).unwrap();
        assert_eq!(canvas.raster_size(), (4, 3));
        assert_eq!(pixel(&canvas, 2, 1), [255, 255, 255, 255]);
    }

    #[test]
    fn test_transparent_raster_keeps_background() {
        let mut canvas = RasterCanvas::new(2, 1, 72).unwrap();
        canvas
            .draw_raster(&[255, 0, 0, 255, 0, 0, 0, 0], 2, 1)
            .unwrap();
        assert_eq!(pixel(&canvas, 0, 0), [255, 0, 0, 255]);
        assert_eq!(pixel(&canvas, 1, 0), [255, 255, 255, 255]);
    }

    #[test]
    fn test_raster_is_stretched_to_page() {
        let mut canvas = RasterCanvas::new(4, 4, 72).unwrap();
        canvas.draw_raster(&[0, 0, 255, 255], 1, 1).unwrap();
        assert_eq!(pixel(&canvas, 3, 3), [0, 0, 255, 255]);
    }

    #[test]
    fn test_raster_size_mismatch() {
        let mut canvas = RasterCanvas::new(2, 2, 72).unwrap();
        assert!(canvas.draw_raster(&[0; 8], 2, 2).is_err());
    }

    #[test]
    fn test_stroke_scales_with_dpi() {
        // 10pt page at 144 dpi is 20 px wide
        let mut canvas = RasterCanvas::new(20, 20, 144).unwrap();
        let pen = Pen {
            width: 2.0,
            color: Color::rgb(0, 0, 0),
            ..Pen::default()
        };
        canvas
            .stroke_polyline(&[(0.0, 5.0), (10.0, 5.0)], &pen, 1.0)
            .unwrap();
        // y = 5pt is row 10 in pixels
        assert_eq!(pixel(&canvas, 10, 10), [0, 0, 0, 255]);
        assert_eq!(pixel(&canvas, 10, 2), [255, 255, 255, 255]);
    }

    #[test]
    fn test_opacity_blends_with_background() {
        let mut canvas = RasterCanvas::new(10, 10, 72).unwrap();
        let pen = Pen {
            width: 4.0,
            color: Color::rgb(0, 0, 0),
            ..Pen::default()
        };
        canvas
            .stroke_polyline(&[(0.0, 5.0), (10.0, 5.0)], &pen, 0.5)
            .unwrap();
        let [r, g, b, a] = pixel(&canvas, 5, 5);
        assert_eq!(a, 255);
        assert!((120..=136).contains(&r), "r = {}", r);
        assert_eq!((r, r), (g, b));
    }

    #[test]
    fn test_single_point_is_skipped() {
        let mut canvas = RasterCanvas::new(4, 4, 72).unwrap();
        let before = canvas.to_rgba();
        canvas
            .stroke_polyline(&[(1.0, 1.0)], &Pen::default(), 1.0)
            .unwrap();
        assert_eq!(canvas.to_rgba(), before);
    }

    #[test]
    fn test_finish_writes_png() {
        let canvas = RasterCanvas::new(3, 3, 300).unwrap();
        let png = canvas.finish().unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }
}
