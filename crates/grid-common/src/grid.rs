//! Grid registration and coordinate conventions used by the renderer.

use serde::{Deserialize, Serialize};

use crate::field::ScalarField;

/// Whether grid coordinates denote nodes or pixel centres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Registration {
    /// Coordinates are grid nodes; values are interpolated between nodes.
    Gridline,
    /// Coordinates are the centres of cells that each carry one value.
    #[default]
    Pixel,
}

impl Registration {
    /// From the GMT registration code (0 = gridline, 1 = pixel).
    pub fn from_gmt_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Gridline),
            1 => Some(Self::Pixel),
            _ => None,
        }
    }

    pub fn gmt_code(&self) -> u8 {
        match self {
            Self::Gridline => 0,
            Self::Pixel => 1,
        }
    }
}

/// Coordinate type of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateType {
    Cartesian,
    /// Longitude is periodic with a 360° period.
    #[default]
    Geographic,
}

impl CoordinateType {
    /// From the GMT gtype code (0 = Cartesian, 1 = geographic).
    pub fn from_gmt_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Cartesian),
            1 => Some(Self::Geographic),
            _ => None,
        }
    }

    pub fn gmt_code(&self) -> u8 {
        match self {
            Self::Cartesian => 0,
            Self::Geographic => 1,
        }
    }
}

/// Rendering conventions that accompany a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GridAnnotation {
    #[serde(default)]
    pub registration: Registration,
    #[serde(default)]
    pub coordinate_type: CoordinateType,
}

/// Pair `field` with the rendering conventions in `annotation`.
///
/// Shorthand for [`AnnotatedGrid::new`].
pub fn annotate(field: ScalarField, annotation: GridAnnotation) -> AnnotatedGrid {
    AnnotatedGrid::new(field, annotation)
}

/// A scalar field paired with the conventions the renderer needs.
#[derive(Debug, Clone)]
pub struct AnnotatedGrid {
    pub field: ScalarField,
    pub annotation: GridAnnotation,
}

impl AnnotatedGrid {
    /// Attach `annotation` to `field`.
    ///
    /// The field's `source` path is cleared: the grid is now an in-memory
    /// product and must never be re-read from its original file.
    pub fn new(mut field: ScalarField, annotation: GridAnnotation) -> Self {
        field.source = None;
        Self { field, annotation }
    }

    /// Longitude spacing (degrees). Zero for single-column grids.
    pub fn dx(&self) -> f64 {
        spacing(&self.field.lon)
    }

    /// Latitude spacing (degrees). Zero for single-row grids.
    pub fn dy(&self) -> f64 {
        spacing(&self.field.lat)
    }

    /// Sample the grid at a lon/lat point following the annotation.
    ///
    /// Pixel registration returns the value of the containing cell; gridline
    /// registration interpolates bilinearly between the surrounding nodes.
    /// Geographic grids wrap in longitude. Points outside the grid give NaN.
    pub fn sample(&self, lon: f64, lat: f64) -> f32 {
        let nx = self.field.nx();
        let ny = self.field.ny();
        if nx == 0 || ny == 0 {
            return f32::NAN;
        }
        let dx = self.dx();
        let dy = self.dy();
        let x0 = self.field.lon[0];
        let y0 = self.field.lat[0];
        let periodic = self.annotation.coordinate_type == CoordinateType::Geographic
            && dx > 0.0
            && (nx as f64 * dx - 360.0).abs() < dx * 0.5;

        let fy = if dy > 0.0 { (lat - y0) / dy } else { 0.0 };
        let fx = if dx > 0.0 {
            let mut x = (lon - x0) / dx;
            if periodic {
                x = x.rem_euclid(nx as f64);
            } else if self.annotation.coordinate_type == CoordinateType::Geographic {
                // Measure east of the grid's west edge, which sits half a
                // cell before x0 for pixel registration.
                let edge = match self.annotation.registration {
                    Registration::Pixel => dx * 0.5,
                    Registration::Gridline => 0.0,
                };
                x = ((lon - x0 + edge).rem_euclid(360.0) - edge) / dx;
            }
            x
        } else {
            0.0
        };

        match self.annotation.registration {
            Registration::Pixel => {
                let i = (fx + 0.5).floor();
                let j = (fy + 0.5).floor();
                let i = if periodic { i.rem_euclid(nx as f64) } else { i };
                if i < 0.0 || j < 0.0 || i >= nx as f64 || j >= ny as f64 {
                    return f32::NAN;
                }
                self.field.get(i as usize, j as usize).unwrap_or(f32::NAN)
            }
            Registration::Gridline => self.bilinear(fx, fy, periodic),
        }
    }

    fn bilinear(&self, fx: f64, fy: f64, periodic: bool) -> f32 {
        let nx = self.field.nx();
        let ny = self.field.ny();
        let max_x = if periodic { nx as f64 } else { (nx - 1) as f64 };
        if fx < 0.0 || fy < 0.0 || fx > max_x || fy > (ny - 1) as f64 {
            return f32::NAN;
        }
        let x1 = fx.floor() as usize;
        let y1 = fy.floor() as usize;
        let x2 = if periodic {
            (x1 + 1) % nx
        } else {
            (x1 + 1).min(nx - 1)
        };
        let x1 = x1 % nx;
        let y2 = (y1 + 1).min(ny - 1);
        let tx = (fx - fx.floor()) as f32;
        let ty = (fy - fy.floor()) as f32;

        let v11 = self.field.get(x1, y1).unwrap_or(f32::NAN);
        let v21 = self.field.get(x2, y1).unwrap_or(f32::NAN);
        let v12 = self.field.get(x1, y2).unwrap_or(f32::NAN);
        let v22 = self.field.get(x2, y2).unwrap_or(f32::NAN);

        let v1 = v11 * (1.0 - tx) + v21 * tx;
        let v2 = v12 * (1.0 - tx) + v22 * tx;
        v1 * (1.0 - ty) + v2 * ty
    }
}

fn spacing(coords: &[f64]) -> f64 {
    match coords {
        [first, .., last] => (last - first) / (coords.len() - 1) as f64,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 4 x 2 global grid, lon 0/90/180/270, lat -45/45.
    fn global_grid(registration: Registration) -> AnnotatedGrid {
        let field = ScalarField::new(
            "speed",
            vec![0.0, 90.0, 180.0, 270.0],
            vec![-45.0, 45.0],
            vec![0.0, 1.0, 2.0, 3.0, 10.0, 11.0, 12.0, 13.0],
        )
        .unwrap()
        .with_source("/tmp/stale.nc");
        annotate(
            field,
            GridAnnotation {
                registration,
                coordinate_type: CoordinateType::Geographic,
            },
        )
    }

    #[test]
    fn test_annotate_clears_source() {
        let grid = global_grid(Registration::Pixel);
        assert!(grid.field.source.is_none());
    }

    #[test]
    fn test_gmt_codes() {
        assert_eq!(Registration::from_gmt_code(1), Some(Registration::Pixel));
        assert_eq!(Registration::from_gmt_code(0), Some(Registration::Gridline));
        assert_eq!(Registration::from_gmt_code(2), None);
        assert_eq!(CoordinateType::from_gmt_code(1), Some(CoordinateType::Geographic));
        assert_eq!(CoordinateType::Geographic.gmt_code(), 1);
        assert_eq!(Registration::Pixel.gmt_code(), 1);
    }

    #[test]
    fn test_pixel_sampling_nearest_cell() {
        let grid = global_grid(Registration::Pixel);
        assert_eq!(grid.sample(10.0, -40.0), 0.0);
        assert_eq!(grid.sample(100.0, 40.0), 11.0);
        // Wraps around the dateline
        assert_eq!(grid.sample(-80.0, 40.0), 13.0);
        assert_eq!(grid.sample(350.0, -40.0), 0.0);
    }

    #[test]
    fn test_gridline_sampling_interpolates() {
        let grid = global_grid(Registration::Gridline);
        let v = grid.sample(45.0, -45.0);
        assert!((v - 0.5).abs() < 1e-6);
        let v = grid.sample(0.0, 0.0);
        assert!((v - 5.0).abs() < 1e-6);
        // Between 270 and 360 (= 0) the grid wraps
        let v = grid.sample(315.0, -45.0);
        assert!((v - 1.5).abs() < 1e-6);
        // Beyond the last latitude node
        assert!(grid.sample(0.0, 60.0).is_nan());
    }

    #[test]
    fn test_cartesian_grid_does_not_wrap() {
        let field = ScalarField::new("c", vec![0.0, 1.0], vec![0.0, 1.0], vec![1.0; 4]).unwrap();
        let grid = AnnotatedGrid::new(
            field,
            GridAnnotation {
                registration: Registration::Gridline,
                coordinate_type: CoordinateType::Cartesian,
            },
        );
        assert_eq!(grid.sample(0.5, 0.5), 1.0);
        assert!(grid.sample(5.0, 0.5).is_nan());
        assert!(grid.sample(-360.0, 0.5).is_nan());
    }

    fn regional_grid(registration: Registration) -> AnnotatedGrid {
        let field = ScalarField::new(
            "r",
            vec![0.0, 100.0, 200.0],
            vec![0.0, 1.0],
            vec![1.0, 2.0, 3.0, 1.0, 2.0, 3.0],
        )
        .unwrap();
        AnnotatedGrid::new(
            field,
            GridAnnotation {
                registration,
                coordinate_type: CoordinateType::Geographic,
            },
        )
    }

    #[test]
    fn test_regional_geographic_grid_keeps_eastern_half() {
        let grid = regional_grid(Registration::Gridline);
        assert!((grid.sample(150.0, 0.0) - 2.5).abs() < 1e-6);
        assert!((grid.sample(190.0, 0.0) - 2.9).abs() < 1e-5);
        assert!((grid.sample(200.0, 0.0) - 3.0).abs() < 1e-6);
        // Same meridian as 200
        assert!((grid.sample(-160.0, 0.0) - 3.0).abs() < 1e-5);
        assert!(grid.sample(250.0, 0.0).is_nan());
        assert!(grid.sample(-10.0, 0.0).is_nan());

        let grid = regional_grid(Registration::Pixel);
        assert_eq!(grid.sample(200.0, 0.0), 3.0);
        assert_eq!(grid.sample(240.0, 0.0), 3.0);
        assert_eq!(grid.sample(-40.0, 0.0), 1.0);
        assert!(grid.sample(260.0, 0.0).is_nan());
    }
}
