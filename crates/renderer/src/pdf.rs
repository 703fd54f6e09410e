//! Vector back end: a single-page PDF 1.4 document.
//!
//! Rasters become Flate-compressed RGB image XObjects with a DeviceGray soft
//! mask, lines become stroked paths. Opacity goes through ExtGState
//! dictionaries shared between lines of equal opacity. The writer stamps no
//! dates or ids, so equal figures give equal files.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::canvas::Canvas;
use crate::error::{RenderError, RenderResult};
use crate::pen::Pen;

struct PdfImage {
    width: u32,
    height: u32,
    rgb: Vec<u8>,
    /// `None` when every pixel is opaque
    alpha: Option<Vec<u8>>,
}

pub struct PdfCanvas {
    /// Page size in points
    width: f64,
    height: f64,
    raster_dpi: u32,
    content: String,
    images: Vec<PdfImage>,
    /// Opacity in thousandths, to graphics state name index
    opacities: BTreeMap<u16, usize>,
}

/// Format a number with at most three decimals and no trailing zeros.
fn num(value: f64) -> String {
    let mut s = format!("{:.3}", value);
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}

fn deflate(data: &[u8]) -> RenderResult<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

impl PdfCanvas {
    /// A page of `width` x `height` points with rasters embedded at
    /// `raster_dpi`.
    pub fn new(width: f64, height: f64, raster_dpi: u32) -> Self {
        Self {
            width,
            height,
            raster_dpi: raster_dpi.max(1),
            content: String::new(),
            images: Vec::new(),
            opacities: BTreeMap::new(),
        }
    }

    pub fn raster_dpi(&self) -> u32 {
        self.raster_dpi
    }

    fn graphics_state(&mut self, opacity: f32) -> Option<usize> {
        let key = (opacity.clamp(0.0, 1.0) * 1000.0).round() as u16;
        if key >= 1000 {
            return None;
        }
        let next = self.opacities.len();
        Some(*self.opacities.entry(key).or_insert(next))
    }
}

impl Canvas for PdfCanvas {
    fn raster_size(&self) -> (u32, u32) {
        let px = |points: f64| {
            ((points / projection::code::POINTS_PER_INCH) * self.raster_dpi as f64)
                .round()
                .max(1.0) as u32
        };
        (px(self.width), px(self.height))
    }

    fn draw_raster(&mut self, rgba: &[u8], width: u32, height: u32) -> RenderResult<()> {
        let pixels = width as usize * height as usize;
        if rgba.len() != pixels * 4 || pixels == 0 {
            return Err(RenderError::Canvas(format!(
                "raster of {}x{} needs {} bytes, got {}",
                width,
                height,
                pixels * 4,
                rgba.len()
            )));
        }

        let mut rgb = Vec::with_capacity(pixels * 3);
        let mut alpha = Vec::with_capacity(pixels);
        for px in rgba.chunks_exact(4) {
            rgb.extend_from_slice(&px[..3]);
            alpha.push(px[3]);
        }
        let alpha = if alpha.iter().all(|&a| a == 255) {
            None
        } else {
            Some(alpha)
        };

        let index = self.images.len();
        self.images.push(PdfImage {
            width,
            height,
            rgb,
            alpha,
        });
        let _ = writeln!(
            self.content,
            "q {} 0 0 {} 0 0 cm /Im{} Do Q",
            num(self.width),
            num(self.height),
            index
        );
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
        let gs = self.graphics_state(opacity * pen.color.a as f32 / 255.0);
        let height = self.height;
        let out = &mut self.content;

        out.push_str("q ");
        if let Some(gs) = gs {
            let _ = write!(out, "/GS{} gs ", gs);
        }
        let c = |v: u8| num(v as f64 / 255.0);
        let _ = write!(
            out,
            "{} {} {} RG {} w 1 J 1 j ",
            c(pen.color.r),
            c(pen.color.g),
            c(pen.color.b),
            num(pen.width)
        );
        let dashes = pen.style.dash_pattern(pen.width);
        if !dashes.is_empty() {
            let pattern: Vec<String> = dashes.into_iter().map(num).collect();
            let _ = write!(out, "[{}] 0 d ", pattern.join(" "));
        }
        out.push('\n');

        let (x0, y0) = points[0];
        let _ = writeln!(out, "{} {} m", num(x0), num(height - y0));
        for &(x, y) in &points[1..] {
            let _ = writeln!(out, "{} {} l", num(x), num(height - y));
        }
        out.push_str("S Q\n");
        Ok(())
    }

    fn finish(self) -> RenderResult<Vec<u8>> {
        // Object numbers: 1 catalog, 2 pages, 3 page, 4 content, then one or
        // two per image, then one per graphics state.
        let mut next_id = 5;
        let mut image_ids = Vec::with_capacity(self.images.len());
        for image in &self.images {
            let id = next_id;
            next_id += if image.alpha.is_some() { 2 } else { 1 };
            image_ids.push(id);
        }
        let mut gs_by_index: Vec<(usize, u16)> =
            self.opacities.iter().map(|(&k, &i)| (i, k)).collect();
        gs_by_index.sort_unstable();
        let gs_ids: Vec<usize> = (0..gs_by_index.len()).map(|i| next_id + i).collect();

        let mut writer = PdfWriter::new();

        writer.object(1, b"<< /Type /Catalog /Pages 2 0 R >>");
        writer.object(2, b"<< /Type /Pages /Kids [3 0 R] /Count 1 >>");

        let mut resources = String::new();
        if !image_ids.is_empty() {
            resources.push_str("/XObject <<");
            for (i, id) in image_ids.iter().enumerate() {
                let _ = write!(resources, " /Im{} {} 0 R", i, id);
            }
            resources.push_str(" >> ");
        }
        if !gs_ids.is_empty() {
            resources.push_str("/ExtGState <<");
            for (i, id) in gs_ids.iter().enumerate() {
                let _ = write!(resources, " /GS{} {} 0 R", i, id);
            }
            resources.push_str(" >> ");
        }
        let page = format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] /Resources << {}>> /Contents 4 0 R >>",
            num(self.width),
            num(self.height),
            resources
        );
        writer.object(3, page.as_bytes());

        let content = deflate(self.content.as_bytes())?;
        writer.stream(4, "/Filter /FlateDecode", &content);

        for (image, &id) in self.images.iter().zip(&image_ids) {
            let smask = match image.alpha {
                Some(_) => format!(" /SMask {} 0 R", id + 1),
                None => String::new(),
            };
            let dict = format!(
                "/Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /FlateDecode{}",
                image.width, image.height, smask
            );
            writer.stream(id, &dict, &deflate(&image.rgb)?);

            if let Some(alpha) = &image.alpha {
                let dict = format!(
                    "/Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace /DeviceGray /BitsPerComponent 8 /Filter /FlateDecode",
                    image.width, image.height
                );
                writer.stream(id + 1, &dict, &deflate(alpha)?);
            }
        }

        for ((_, key), &id) in gs_by_index.iter().zip(&gs_ids) {
            let alpha = num(*key as f64 / 1000.0);
            let dict = format!("<< /Type /ExtGState /CA {} /ca {} >>", alpha, alpha);
            writer.object(id, dict.as_bytes());
        }

        Ok(writer.finish(next_id + gs_ids.len()))
    }
}

/// Sequential object writer keeping byte offsets for the xref table.
struct PdfWriter {
    buf: Vec<u8>,
    offsets: BTreeMap<usize, usize>,
}

impl PdfWriter {
    fn new() -> Self {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
        Self {
            buf,
            offsets: BTreeMap::new(),
        }
    }

    fn object(&mut self, id: usize, body: &[u8]) {
        self.offsets.insert(id, self.buf.len());
        self.buf
            .extend_from_slice(format!("{} 0 obj\n", id).as_bytes());
        self.buf.extend_from_slice(body);
        self.buf.extend_from_slice(b"\nendobj\n");
    }

    fn stream(&mut self, id: usize, dict: &str, data: &[u8]) {
        self.offsets.insert(id, self.buf.len());
        self.buf.extend_from_slice(
            format!("{} 0 obj\n<< {} /Length {} >>\nstream\n", id, dict, data.len()).as_bytes(),
        );
        self.buf.extend_from_slice(data);
        self.buf.extend_from_slice(b"\nendstream\nendobj\n");
    }

    /// Append the xref table and trailer for objects `1..size`.
    fn finish(mut self, size: usize) -> Vec<u8> {
        let xref = self.buf.len();
        let mut table = format!("xref\n0 {}\n0000000000 65535 f \n", size);
        for id in 1..size {
            let offset = self.offsets.get(&id).copied().unwrap_or(0);
            let _ = writeln!(table, "{:010} 00000 n ", offset);
        }
        let _ = write!(
            table,
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            size, xref
        );
        self.buf.extend_from_slice(table.as_bytes());
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gradient::Color;

    fn text(pdf: &[u8]) -> String {
        String::from_utf8_lossy(pdf).into_owned()
    }

    fn grey_pen() -> Pen {
        Pen {
            width: 0.05,
            color: Color::rgb(190, 190, 190),
            ..Pen::default()
        }
    }

    #[test]
    fn test_num_formatting() {
        assert_eq!(num(1.0), "1");
        assert_eq!(num(0.05), "0.05");
        assert_eq!(num(850.39370), "850.394");
        assert_eq!(num(-0.0001), "0");
    }

    #[test]
    fn test_raster_size_follows_dpi() {
        let canvas = PdfCanvas::new(72.0, 36.0, 600);
        assert_eq!(canvas.raster_dpi(), 600);
        assert_eq!(canvas.raster_size(), (600, 300));
        assert_eq!(PdfCanvas::new(72.0, 72.0, 100).raster_size(), (100, 100));
    }

    #[test]
    fn test_empty_page_structure() {
        let pdf = PdfCanvas::new(100.0, 50.0, 72).finish().unwrap();
        let s = text(&pdf);
        assert!(s.starts_with("%PDF-1.4"));
        assert!(s.contains("/MediaBox [0 0 100 50]"));
        assert!(s.contains("xref\n0 5\n"));
        assert!(s.trim_end().ends_with("%%EOF"));
        assert!(!s.contains("/CreationDate"));
    }

    #[test]
    fn test_xref_offsets_point_at_objects() {
        let mut canvas = PdfCanvas::new(10.0, 10.0, 72);
        canvas.draw_raster(&[10, 20, 30, 0], 1, 1).unwrap();
        canvas
            .stroke_polyline(&[(0.0, 0.0), (5.0, 5.0)], &grey_pen(), 0.55)
            .unwrap();
        let pdf = canvas.finish().unwrap();

        let xref = pdf.windows(6).rposition(|w| w == b"\nxref\n").unwrap();
        let table = String::from_utf8(pdf[xref + 1..].to_vec()).unwrap();
        let entries: Vec<&str> = table
            .lines()
            .skip(3)
            .take_while(|l| l.ends_with(" n "))
            .collect();
        // catalog, pages, page, content, image, smask, ext gstate
        assert_eq!(entries.len(), 7);
        for (i, entry) in entries.iter().enumerate() {
            let offset: usize = entry[..10].parse().unwrap();
            assert!(pdf[offset..].starts_with(format!("{} 0 obj", i + 1).as_bytes()));
        }
    }

    #[test]
    fn test_opaque_raster_has_no_soft_mask() {
        let mut canvas = PdfCanvas::new(10.0, 10.0, 72);
        canvas.draw_raster(&[1, 2, 3, 255, 4, 5, 6, 255], 2, 1).unwrap();
        let s = text(&canvas.finish().unwrap());
        assert!(s.contains("/Subtype /Image /Width 2 /Height 1 /ColorSpace /DeviceRGB"));
        assert!(!s.contains("/SMask"));
    }

    #[test]
    fn test_graphics_states_are_shared() {
        let mut canvas = PdfCanvas::new(10.0, 10.0, 72);
        for _ in 0..3 {
            canvas
                .stroke_polyline(&[(0.0, 0.0), (1.0, 1.0)], &grey_pen(), 0.55)
                .unwrap();
        }
        canvas
            .stroke_polyline(&[(0.0, 0.0), (1.0, 1.0)], &Pen::default(), 1.0)
            .unwrap();
        assert_eq!(canvas.opacities.len(), 1);
        assert!(canvas.content.contains("/GS0 gs 0.745 0.745 0.745 RG 0.05 w"));
        // y is flipped to PDF user space
        assert!(canvas.content.contains("0 10 m\n1 9 l\nS Q"));

        let s = text(&canvas.finish().unwrap());
        assert!(s.contains("<< /Type /ExtGState /CA 0.55 /ca 0.55 >>"));
    }

    #[test]
    fn test_hairline_and_dashes() {
        let mut canvas = PdfCanvas::new(10.0, 10.0, 72);
        let dashed = Pen::parse("1p,black,dashed").unwrap();
        canvas
            .stroke_polyline(&[(0.0, 0.0), (1.0, 1.0)], &dashed, 1.0)
            .unwrap();
        canvas
            .stroke_polyline(&[(0.0, 0.0), (1.0, 1.0)], &Pen::parse("faint").unwrap(), 1.0)
            .unwrap();
        assert!(canvas.content.contains("1 w 1 J 1 j [8 4] 0 d"));
        assert!(canvas.content.contains("0 w 1 J 1 j \n"));
    }

    #[test]
    fn test_output_is_deterministic() {
        let build = || {
            let mut canvas = PdfCanvas::new(20.0, 20.0, 72);
            canvas.draw_raster(&[200, 100, 0, 128], 1, 1).unwrap();
            canvas
                .stroke_polyline(&[(1.0, 1.0), (2.0, 3.0), (5.0, 8.0)], &grey_pen(), 0.55)
                .unwrap();
            canvas.finish().unwrap()
        };
        assert_eq!(build(), build());
    }
}
