//! GMT-style projection codes and page placement.
//!
//! `G<lon0>/<lat0>[/<horizon>]/<width>` selects an orthographic projection
//! centred on (lon0, lat0) whose globe is `width` wide on the page. Widths
//! take a unit suffix: `c` (cm, the default), `i` (inch) or `p` (point).

use std::fmt;
use std::str::FromStr;

use crate::error::{ProjectionError, ProjectionResult};
use crate::orthographic::Orthographic;

/// PostScript points per inch.
pub const POINTS_PER_INCH: f64 = 72.0;
const CM_PER_INCH: f64 = 2.54;

/// A physical length on the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Length {
    points: f64,
}

impl Length {
    pub fn from_points(points: f64) -> Self {
        Self { points }
    }

    pub fn from_cm(cm: f64) -> Self {
        Self::from_points(cm / CM_PER_INCH * POINTS_PER_INCH)
    }

    pub fn from_inches(inches: f64) -> Self {
        Self::from_points(inches * POINTS_PER_INCH)
    }

    pub fn points(&self) -> f64 {
        self.points
    }

    pub fn inches(&self) -> f64 {
        self.points / POINTS_PER_INCH
    }

    /// Number of device pixels this length covers at `dpi`.
    pub fn pixels(&self, dpi: u32) -> u32 {
        (self.inches() * dpi as f64).round().max(1.0) as u32
    }
}

impl FromStr for Length {
    type Err = ProjectionError;

    fn from_str(s: &str) -> ProjectionResult<Self> {
        let s = s.trim();
        let (number, unit) = match s.chars().last() {
            Some(c) if c.is_ascii_alphabetic() => (&s[..s.len() - 1], Some(c)),
            _ => (s, None),
        };
        let value: f64 = number
            .parse()
            .map_err(|_| ProjectionError::InvalidLength(s.to_string()))?;
        if !(value > 0.0) || !value.is_finite() {
            return Err(ProjectionError::InvalidLength(s.to_string()));
        }
        match unit {
            None | Some('c') => Ok(Self::from_cm(value)),
            Some('i') => Ok(Self::from_inches(value)),
            Some('p') => Ok(Self::from_points(value)),
            Some(_) => Err(ProjectionError::InvalidLength(s.to_string())),
        }
    }
}

/// An orthographic map placed on a square page of `width`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapProjection {
    pub orthographic: Orthographic,
    pub width: Length,
}

impl MapProjection {
    pub fn new(lon0: f64, lat0: f64, width: Length) -> Self {
        Self {
            orthographic: Orthographic::new(lon0, lat0),
            width,
        }
    }

    /// Parse a code such as `G100/-30/30c`.
    pub fn parse(code: &str) -> ProjectionResult<Self> {
        let invalid = |reason: &str| ProjectionError::InvalidCode {
            code: code.to_string(),
            reason: reason.to_string(),
        };

        let body = code
            .trim()
            .strip_prefix('G')
            .ok_or_else(|| ProjectionError::Unsupported(code.to_string()))?;
        let parts: Vec<&str> = body.split('/').collect();
        let (lon0, lat0, width) = match parts.as_slice() {
            [lon0, lat0, width] => (lon0, lat0, width),
            [lon0, lat0, horizon, width] => {
                let horizon: f64 = horizon.parse().map_err(|_| invalid("bad horizon"))?;
                if (horizon - 90.0).abs() > 1e-9 {
                    return Err(invalid("only a 90 degree horizon is orthographic"));
                }
                (lon0, lat0, width)
            }
            _ => return Err(invalid("expected G<lon0>/<lat0>/<width>")),
        };

        let lon0: f64 = lon0.parse().map_err(|_| invalid("bad centre longitude"))?;
        let lat0: f64 = lat0.parse().map_err(|_| invalid("bad centre latitude"))?;
        if !(-90.0..=90.0).contains(&lat0) {
            return Err(invalid("centre latitude out of range"));
        }
        let width: Length = width.parse()?;

        Ok(Self::new(lon0, lat0, width))
    }

    /// Page width in points.
    pub fn width_points(&self) -> f64 {
        self.width.points()
    }

    /// The globe is a disk, so the page is square.
    pub fn height_points(&self) -> f64 {
        self.width.points()
    }

    /// Page position in points (origin top-left, y down) of a lon/lat point.
    ///
    /// `None` when the point is on the far hemisphere.
    pub fn geo_to_page(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        let (x, y) = self.orthographic.forward(lon, lat)?;
        let r = self.width.points() / 2.0;
        Some((r + x * r, r - y * r))
    }

    /// Inverse of [`geo_to_page`](Self::geo_to_page). `None` off the globe.
    pub fn page_to_geo(&self, px: f64, py: f64) -> Option<(f64, f64)> {
        let r = self.width.points() / 2.0;
        self.orthographic.inverse((px - r) / r, (r - py) / r)
    }
}

impl FromStr for MapProjection {
    type Err = ProjectionError;

    fn from_str(s: &str) -> ProjectionResult<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for MapProjection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (lon0, lat0) = self.orthographic.center();
        write!(f, "G{}/{}/{}p", lon0, lat0, self.width.points())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_figure_projection() {
        let proj = MapProjection::parse("G100/-30/30c").unwrap();
        let (lon0, lat0) = proj.orthographic.center();
        assert!((lon0 - 100.0).abs() < 1e-9);
        assert!((lat0 + 30.0).abs() < 1e-9);
        assert!((proj.width_points() - 30.0 / 2.54 * 72.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_with_horizon_and_units() {
        let proj = MapProjection::parse("G0/0/90/6i").unwrap();
        assert!((proj.width_points() - 432.0).abs() < 1e-9);
        assert!(MapProjection::parse("G0/0/60/6i").is_err());
        assert!(MapProjection::parse("M0/0/6i").is_err());
        assert!(MapProjection::parse("G0/95/6i").is_err());
        assert!(MapProjection::parse("G0/0").is_err());
    }

    #[test]
    fn test_length_pixels() {
        let width: Length = "2.54c".parse().unwrap();
        assert_eq!(width.pixels(300), 300);
        assert_eq!(Length::from_points(72.0).pixels(600), 600);
        assert!("0c".parse::<Length>().is_err());
        assert!("3x".parse::<Length>().is_err());
    }

    #[test]
    fn test_page_roundtrip() {
        let proj = MapProjection::parse("G100/-30/10c").unwrap();
        let (px, py) = proj.geo_to_page(100.0, -30.0).unwrap();
        let half = proj.width_points() / 2.0;
        assert!((px - half).abs() < 1e-9 && (py - half).abs() < 1e-9);

        // North of the centre is up the page
        let (_, py_north) = proj.geo_to_page(100.0, 0.0).unwrap();
        assert!(py_north < half);

        let (lon, lat) = proj.page_to_geo(px + 10.0, py - 5.0).unwrap();
        let (px2, py2) = proj.geo_to_page(lon, lat).unwrap();
        assert!((px2 - px - 10.0).abs() < 1e-6 && (py2 - py + 5.0).abs() < 1e-6);

        assert!(proj.page_to_geo(0.0, 0.0).is_none());
    }
}
