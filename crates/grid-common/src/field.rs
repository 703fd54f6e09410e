//! Two-dimensional scalar fields on a regular lat/lon grid.

use std::path::PathBuf;

use crate::error::{GridError, GridResult};

/// A 2-D field over (latitude, longitude).
///
/// Values are row major: `values[j * nx + i]` is the value at `lat[j]`,
/// `lon[i]`. Latitudes are ascending once loaded.
#[derive(Debug, Clone)]
pub struct ScalarField {
    /// Variable name (e.g. "U10M")
    pub name: String,
    /// Longitude coordinates (degrees)
    pub lon: Vec<f64>,
    /// Latitude coordinates (degrees)
    pub lat: Vec<f64>,
    /// Row-major values
    pub values: Vec<f32>,
    /// File the field was read from, if any
    pub source: Option<PathBuf>,
}

impl ScalarField {
    /// Create a field, checking that `values` matches the coordinate lengths.
    pub fn new(
        name: impl Into<String>,
        lon: Vec<f64>,
        lat: Vec<f64>,
        values: Vec<f32>,
    ) -> GridResult<Self> {
        let name = name.into();
        let expected = lon.len() * lat.len();
        if values.len() != expected {
            return Err(GridError::LengthMismatch {
                name,
                expected,
                actual: values.len(),
                ny: lat.len(),
                nx: lon.len(),
            });
        }
        Ok(Self {
            name,
            lon,
            lat,
            values,
            source: None,
        })
    }

    /// Record the file this field came from.
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Number of longitude points.
    pub fn nx(&self) -> usize {
        self.lon.len()
    }

    /// Number of latitude points.
    pub fn ny(&self) -> usize {
        self.lat.len()
    }

    /// `(ny, nx)`, i.e. (lat, lon) sizes.
    pub fn shape(&self) -> (usize, usize) {
        (self.ny(), self.nx())
    }

    /// Value at longitude index `i`, latitude index `j`.
    pub fn get(&self, i: usize, j: usize) -> Option<f32> {
        if i >= self.nx() || j >= self.ny() {
            return None;
        }
        self.values.get(j * self.nx() + i).copied()
    }

    /// Minimum and maximum ignoring NaN. `None` if every value is NaN.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        let (min, max) = self
            .values
            .iter()
            .filter(|v| !v.is_nan())
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), &v| {
                (min.min(v), max.max(v))
            });
        if min.is_finite() || max.is_finite() {
            Some((min, max))
        } else {
            None
        }
    }

    /// True if both fields are defined on the same coordinates.
    pub fn same_coordinates(&self, other: &ScalarField) -> bool {
        self.lon == other.lon && self.lat == other.lat
    }

    /// Combine two fields on the same grid elementwise.
    pub fn zip_with<F>(&self, other: &ScalarField, name: &str, f: F) -> GridResult<ScalarField>
    where
        F: Fn(f32, f32) -> f32,
    {
        if !self.same_coordinates(other) {
            return Err(GridError::CoordinateMismatch {
                left: self.name.clone(),
                right: other.name.clone(),
            });
        }
        let values = self
            .values
            .iter()
            .zip(&other.values)
            .map(|(&a, &b)| f(a, b))
            .collect();
        ScalarField::new(name, self.lon.clone(), self.lat.clone(), values)
    }
}
