//! Pen specifications for line drawing.
//!
//! Pens use the GMT `width,color,style` syntax, e.g. `0.05p,#bebebe,solid`.
//! Every part is optional and the width may be a name such as `faint`.

use std::fmt;
use std::str::FromStr;

use projection::Length;

use crate::error::{RenderError, RenderResult};
use crate::gradient::Color;
use crate::palette::parse_color;

/// Dash pattern of a pen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl LineStyle {
    /// On/off lengths in points for a line of `width` points, empty when solid.
    pub fn dash_pattern(&self, width: f64) -> Vec<f64> {
        let unit = width.max(0.25);
        match self {
            LineStyle::Solid => Vec::new(),
            LineStyle::Dashed => vec![8.0 * unit, 4.0 * unit],
            LineStyle::Dotted => vec![unit, 2.0 * unit],
        }
    }
}

/// A line width, colour and style.
///
/// A width of zero is a hairline: the thinnest line the output device can
/// show.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pen {
    /// Width in points
    pub width: f64,
    pub color: Color,
    pub style: LineStyle,
}

impl Default for Pen {
    fn default() -> Self {
        Self {
            width: 0.25,
            color: Color::rgb(0, 0, 0),
            style: LineStyle::Solid,
        }
    }
}

/// Named widths in points.
fn named_width(name: &str) -> Option<f64> {
    match name {
        "faint" => Some(0.0),
        "default" | "thinnest" => Some(0.25),
        "thinner" => Some(0.5),
        "thin" => Some(0.75),
        "thick" => Some(1.0),
        "thicker" => Some(1.5),
        "thickest" => Some(2.0),
        "fat" => Some(3.0),
        _ => None,
    }
}

fn parse_width(text: &str) -> Option<f64> {
    if let Some(width) = named_width(text) {
        return Some(width);
    }
    // Bare numbers are points, unlike page lengths
    if let Ok(points) = text.parse::<f64>() {
        return (points >= 0.0).then_some(points);
    }
    text.parse::<Length>().ok().map(|l| l.points())
}

fn parse_style(text: &str) -> Option<LineStyle> {
    match text {
        "solid" => Some(LineStyle::Solid),
        "dashed" | "-" => Some(LineStyle::Dashed),
        "dotted" | "." => Some(LineStyle::Dotted),
        _ => None,
    }
}

impl Pen {
    pub fn parse(spec: &str) -> RenderResult<Self> {
        let invalid = |reason: &str| RenderError::InvalidPen {
            pen: spec.to_string(),
            reason: reason.to_string(),
        };

        let mut pen = Pen::default();
        let parts: Vec<&str> = spec.split(',').map(str::trim).collect();
        if parts.len() > 3 {
            return Err(invalid("expected width,color,style"));
        }

        if let Some(width) = parts.first().filter(|s| !s.is_empty()) {
            pen.width = parse_width(width).ok_or_else(|| invalid("bad width"))?;
        }
        if let Some(color) = parts.get(1).filter(|s| !s.is_empty()) {
            pen.color = parse_color(color).ok_or_else(|| invalid("bad colour"))?;
        }
        if let Some(style) = parts.get(2).filter(|s| !s.is_empty()) {
            pen.style = parse_style(style).ok_or_else(|| invalid("bad style"))?;
        }

        Ok(pen)
    }

    pub fn is_hairline(&self) -> bool {
        self.width == 0.0
    }
}

impl FromStr for Pen {
    type Err = RenderError;

    fn from_str(s: &str) -> RenderResult<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Pen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let style = match self.style {
            LineStyle::Solid => "solid",
            LineStyle::Dashed => "dashed",
            LineStyle::Dotted => "dotted",
        };
        write!(
            f,
            "{}p,#{:02x}{:02x}{:02x},{}",
            self.width, self.color.r, self.color.g, self.color.b, style
        )
    }
}
