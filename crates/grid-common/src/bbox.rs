//! Geographic bounding boxes (map regions).

use serde::{Deserialize, Serialize};

use crate::error::{GridError, GridResult};

/// A geographic bounding box in degrees.
///
/// `min_x`/`max_x` are longitudes, `min_y`/`max_y` latitudes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// The whole globe, `[-180, 180, -90, 90]`.
    pub fn global() -> Self {
        Self::new(-180.0, -90.0, 180.0, 90.0)
    }

    /// Build from a GMT-style region `[west, east, south, north]`.
    pub fn from_wesn(region: [f64; 4]) -> GridResult<Self> {
        let [west, east, south, north] = region;
        if !(west < east) || !(south < north) {
            return Err(GridError::InvalidRegion(format!(
                "{}/{}/{}/{}",
                west, east, south, north
            )));
        }
        if south < -90.0 || north > 90.0 {
            return Err(GridError::InvalidRegion(format!(
                "latitude range {}..{} exceeds the poles",
                south, north
            )));
        }
        Ok(Self::new(west, south, east, north))
    }

    /// Region as `[west, east, south, north]`.
    pub fn to_wesn(&self) -> [f64; 4] {
        [self.min_x, self.max_x, self.min_y, self.max_y]
    }

    /// Width of the bounding box in degrees.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the bounding box in degrees.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// True when the region spans all longitudes.
    pub fn is_global_longitude(&self) -> bool {
        self.width() >= 360.0 - 1e-9
    }

    /// Check if a lon/lat point lies in the region.
    ///
    /// Longitudes are compared modulo 360 so that `-170` and `190` are the
    /// same meridian.
    pub fn contains_point(&self, lon: f64, lat: f64) -> bool {
        if lat < self.min_y || lat > self.max_y {
            return false;
        }
        if self.is_global_longitude() {
            return true;
        }
        let offset = (lon - self.min_x).rem_euclid(360.0);
        offset <= self.width()
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::global()
    }
}
