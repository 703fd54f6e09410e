//! Colour palettes in the GMT CPT format.
//!
//! A palette maps value ranges ("slices") to colours. Palettes are built
//! from a named colour scheme and a `[min, max, step]` series, written to a
//! `.cpt` file, and read back by the renderer.
//!
//! ```text
//! # COLOR_MODEL = RGB
//! 0	3/19/38	1	5/25/48
//! 1	5/25/48	2	8/31/58
//! ...
//! B	3/19/38
//! F	252/244/217
//! N	128/128/128
//! ```

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{RenderError, RenderResult};
use crate::gradient::{interpolate_color, Color};

/// Parse hex color string to RGB
pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some((r, g, b))
}

/// Parse a colour as `#rrggbb`, `r/g/b`, a single grey level, or a name.
pub fn parse_color(text: &str) -> Option<Color> {
    let text = text.trim();
    if text.starts_with('#') {
        let (r, g, b) = hex_to_rgb(text)?;
        return Some(Color::rgb(r, g, b));
    }
    if text.contains('/') {
        let parts: Vec<u8> = text
            .split('/')
            .map(|p| p.trim().parse::<u8>())
            .collect::<Result<_, _>>()
            .ok()?;
        return match parts.as_slice() {
            [r, g, b] => Some(Color::rgb(*r, *g, *b)),
            _ => None,
        };
    }
    if let Ok(level) = text.parse::<u8>() {
        return Some(Color::rgb(level, level, level));
    }
    match text.to_ascii_lowercase().as_str() {
        "black" => Some(Color::rgb(0, 0, 0)),
        "white" => Some(Color::rgb(255, 255, 255)),
        "gray" | "grey" => Some(Color::rgb(190, 190, 190)),
        "lightgray" | "lightgrey" => Some(Color::rgb(211, 211, 211)),
        "darkgray" | "darkgrey" => Some(Color::rgb(169, 169, 169)),
        "red" => Some(Color::rgb(255, 0, 0)),
        "green" => Some(Color::rgb(0, 255, 0)),
        "blue" => Some(Color::rgb(0, 0, 255)),
        _ => None,
    }
}

fn format_color(color: Color) -> String {
    format!("{}/{}/{}", color.r, color.g, color.b)
}

// =============================================================================
// Colour schemes
// =============================================================================

// Scientific colour map "navia": deep navy through teal and green to cream.
const NAVIA: [(u8, u8, u8); 9] = [
    (3, 19, 38),
    (10, 38, 74),
    (20, 63, 110),
    (35, 97, 136),
    (55, 125, 140),
    (86, 150, 128),
    (133, 177, 113),
    (193, 209, 133),
    (252, 244, 217),
];

const VIRIDIS: [(u8, u8, u8); 9] = [
    (68, 1, 84),
    (71, 45, 123),
    (59, 82, 139),
    (44, 114, 142),
    (33, 145, 140),
    (40, 174, 128),
    (94, 201, 98),
    (173, 220, 48),
    (253, 231, 37),
];

const GRAY: [(u8, u8, u8); 2] = [(0, 0, 0), (255, 255, 255)];

/// A continuous colour scheme sampled by piecewise-linear interpolation.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScheme {
    pub name: String,
    anchors: Vec<Color>,
}

impl ColorScheme {
    /// Look up a scheme by name. `SCM/` prefixes (scientific colour maps)
    /// are accepted and case is ignored.
    pub fn by_name(name: &str) -> RenderResult<Self> {
        let key = name.trim().to_ascii_lowercase();
        let key = key.strip_prefix("scm/").unwrap_or(&key);
        let anchors: &[(u8, u8, u8)] = match key {
            "navia" => &NAVIA,
            "viridis" => &VIRIDIS,
            "gray" | "grey" => &GRAY,
            _ => return Err(RenderError::UnknownScheme(name.to_string())),
        };
        Ok(Self {
            name: name.to_string(),
            anchors: anchors.iter().map(|&(r, g, b)| Color::rgb(r, g, b)).collect(),
        })
    }

    /// Colour at position `t` in [0, 1] (clamped).
    pub fn sample(&self, t: f64) -> Color {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let segments = self.anchors.len() - 1;
        let pos = t * segments as f64;
        let i = (pos.floor() as usize).min(segments - 1);
        interpolate_color(self.anchors[i], self.anchors[i + 1], (pos - i as f64) as f32)
    }
}

// =============================================================================
// Series and palettes
// =============================================================================

/// Slice boundaries `min, min + step, ..., max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Series {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Series {
    pub fn new(min: f64, max: f64, step: f64) -> RenderResult<Self> {
        if !(min.is_finite() && max.is_finite() && max > min) {
            return Err(RenderError::InvalidPalette(format!(
                "series range {}/{} is empty",
                min, max
            )));
        }
        if !(step > 0.0) || step > max - min {
            return Err(RenderError::InvalidPalette(format!(
                "series step {} does not fit {}/{}",
                step, min, max
            )));
        }
        Ok(Self { min, max, step })
    }

    /// `[min, max, step]` as used in configuration files.
    pub fn from_array(series: [f64; 3]) -> RenderResult<Self> {
        Self::new(series[0], series[1], series[2])
    }

    /// Number of slices; a trailing partial step counts as one slice.
    pub fn slice_count(&self) -> usize {
        (((self.max - self.min) / self.step) - 1e-9).ceil() as usize
    }

    /// All slice boundaries, `slice_count() + 1` values ending exactly at `max`.
    pub fn boundaries(&self) -> Vec<f64> {
        let n = self.slice_count();
        (0..=n)
            .map(|i| {
                if i == n {
                    self.max
                } else {
                    self.min + i as f64 * self.step
                }
            })
            .collect()
    }
}

/// One value range of a palette.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CptSlice {
    pub z_low: f64,
    pub color_low: Color,
    pub z_high: f64,
    pub color_high: Color,
}

/// A CPT palette.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorPalette {
    pub slices: Vec<CptSlice>,
    /// Colour below the first slice
    pub background: Color,
    /// Colour above the last slice
    pub foreground: Color,
    /// Colour for missing values
    pub nan: Color,
}

/// Default colour for missing values.
pub const NAN_COLOR: Color = Color {
    r: 128,
    g: 128,
    b: 128,
    a: 255,
};

/// Build a palette for `series` from `scheme`.
///
/// With `continuous`, each slice blends from the scheme colour at its lower
/// boundary to the one at its upper boundary; otherwise each slice has the
/// single colour at its centre.
pub fn make_cpt(scheme: &ColorScheme, series: &Series, continuous: bool) -> ColorPalette {
    let bounds = series.boundaries();
    let span = series.max - series.min;
    let position = |z: f64| (z - series.min) / span;

    let slices: Vec<CptSlice> = bounds
        .windows(2)
        .map(|w| {
            let (lo, hi) = (w[0], w[1]);
            if continuous {
                CptSlice {
                    z_low: lo,
                    color_low: scheme.sample(position(lo)),
                    z_high: hi,
                    color_high: scheme.sample(position(hi)),
                }
            } else {
                let color = scheme.sample(position((lo + hi) / 2.0));
                CptSlice {
                    z_low: lo,
                    color_low: color,
                    z_high: hi,
                    color_high: color,
                }
            }
        })
        .collect();

    debug!(
        scheme = %scheme.name,
        slices = slices.len(),
        continuous = continuous,
        "Built colour palette"
    );

    ColorPalette {
        background: slices[0].color_low,
        foreground: slices[slices.len() - 1].color_high,
        nan: NAN_COLOR,
        slices,
    }
}

impl ColorPalette {
    pub fn min(&self) -> f64 {
        self.slices[0].z_low
    }

    pub fn max(&self) -> f64 {
        self.slices[self.slices.len() - 1].z_high
    }

    /// Colour for `value`: B below the range, F above, N for NaN.
    pub fn color_at(&self, value: f32) -> Color {
        if value.is_nan() {
            return self.nan;
        }
        let z = value as f64;
        if z < self.min() {
            return self.background;
        }
        if z > self.max() {
            return self.foreground;
        }
        // Slices are sorted; find the first whose upper bound reaches z
        let idx = self
            .slices
            .partition_point(|s| s.z_high < z)
            .min(self.slices.len() - 1);
        let slice = &self.slices[idx];
        if slice.color_low == slice.color_high {
            return slice.color_low;
        }
        let t = (z - slice.z_low) / (slice.z_high - slice.z_low);
        interpolate_color(slice.color_low, slice.color_high, t as f32)
    }

    /// Render as CPT text.
    pub fn to_cpt_string(&self) -> String {
        let mut out = String::from("# COLOR_MODEL = RGB\n");
        for s in &self.slices {
            let _ = writeln!(
                out,
                "{}\t{}\t{}\t{}",
                s.z_low,
                format_color(s.color_low),
                s.z_high,
                format_color(s.color_high)
            );
        }
        let _ = writeln!(out, "B\t{}", format_color(self.background));
        let _ = writeln!(out, "F\t{}", format_color(self.foreground));
        let _ = writeln!(out, "N\t{}", format_color(self.nan));
        out
    }

    /// Write the palette to a `.cpt` file.
    pub fn write(&self, path: &Path) -> RenderResult<()> {
        fs::write(path, self.to_cpt_string())?;
        info!(path = %path.display(), slices = self.slices.len(), "Wrote colour palette");
        Ok(())
    }

    /// Parse CPT text.
    pub fn parse(text: &str) -> RenderResult<Self> {
        let mut slices = Vec::new();
        let mut background = None;
        let mut foreground = None;
        let mut nan = None;

        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let invalid = |reason: &str| {
                RenderError::InvalidPalette(format!("line {}: {}", lineno + 1, reason))
            };
            let fields: Vec<&str> = line.split_whitespace().collect();
            let color = |text: &str| parse_color(text).ok_or_else(|| invalid("bad colour"));

            match fields.as_slice() {
                ["B", c] => background = Some(color(*c)?),
                ["F", c] => foreground = Some(color(*c)?),
                ["N", c] => nan = Some(color(*c)?),
                [z0, c0, z1, c1, ..] => {
                    let z_low: f64 = z0.parse().map_err(|_| invalid("bad lower bound"))?;
                    let z_high: f64 = z1.parse().map_err(|_| invalid("bad upper bound"))?;
                    if !(z_high > z_low) {
                        return Err(invalid("slice bounds must increase"));
                    }
                    if let Some(prev) = slices.last().map(|s: &CptSlice| s.z_high) {
                        if z_low < prev {
                            return Err(invalid("slices overlap"));
                        }
                    }
                    slices.push(CptSlice {
                        z_low,
                        color_low: color(*c0)?,
                        z_high,
                        color_high: color(*c1)?,
                    });
                }
                _ => return Err(invalid("expected 'z0 color z1 color' or B/F/N")),
            }
        }

        let (first, last) = match (slices.first(), slices.last()) {
            (Some(first), Some(last)) => (first.color_low, last.color_high),
            _ => return Err(RenderError::InvalidPalette("no slices".to_string())),
        };

        Ok(Self {
            background: background.unwrap_or(first),
            foreground: foreground.unwrap_or(last),
            nan: nan.unwrap_or(NAN_COLOR),
            slices,
        })
    }

    /// Read a `.cpt` file.
    pub fn from_file(path: &Path) -> RenderResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }
}
