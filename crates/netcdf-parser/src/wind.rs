//! 10 m wind fields: component selection, magnitude and shape validation.

use std::path::Path;

use chrono::{DateTime, Utc};
use grid_common::ScalarField;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::dataset::{DatasetLayout, GriddedDataset};
use crate::error::{NetCdfError, NetCdfResult};
use crate::native::open_dataset;

/// Grid resolution the pipeline is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedShape {
    pub lat: usize,
    pub lon: usize,
}

impl Default for ExpectedShape {
    fn default() -> Self {
        Self { lat: 360, lon: 576 }
    }
}

/// Everything the loader needs to know about the input file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub layout: DatasetLayout,
    /// Zonal wind category
    pub u_variable: String,
    /// Meridional wind category
    pub v_variable: String,
    pub time_index: usize,
    pub expected_shape: ExpectedShape,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            layout: DatasetLayout::default(),
            u_variable: "U10M".to_string(),
            v_variable: "V10M".to_string(),
            time_index: 0,
            expected_shape: ExpectedShape::default(),
        }
    }
}

/// Wind components and speed for a single time step.
#[derive(Debug, Clone)]
pub struct WindFields {
    pub u: ScalarField,
    pub v: ScalarField,
    pub magnitude: ScalarField,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Elementwise `sqrt(u^2 + v^2)`.
pub fn wind_magnitude(u: &ScalarField, v: &ScalarField) -> NetCdfResult<ScalarField> {
    let mut magnitude = u.zip_with(v, "wind_speed", |a, b| a.hypot(b))?;
    magnitude.source = u.source.clone();
    Ok(magnitude)
}

/// Fail unless the field has exactly the expected lat/lon sizes.
pub fn check_shape(field: &ScalarField, expected: ExpectedShape) -> NetCdfResult<()> {
    if field.ny() != expected.lat {
        return Err(NetCdfError::ShapeMismatch {
            dimension: "lat".to_string(),
            expected: expected.lat,
            actual: field.ny(),
        });
    }
    if field.nx() != expected.lon {
        return Err(NetCdfError::ShapeMismatch {
            dimension: "lon".to_string(),
            expected: expected.lon,
            actual: field.nx(),
        });
    }
    Ok(())
}

/// Select U and V at the configured time step and derive the wind speed.
pub fn wind_fields_from_dataset(
    dataset: &GriddedDataset,
    config: &LoaderConfig,
) -> NetCdfResult<WindFields> {
    let slice = dataset.isel_time(config.time_index)?;
    info!(
        time_index = slice.index(),
        time = %slice.label(),
        variables = ?dataset.variables,
        "Selected time slice"
    );

    let u = slice.select(&config.u_variable)?;
    let v = slice.select(&config.v_variable)?;
    let magnitude = wind_magnitude(&u, &v)?;

    check_shape(&magnitude, config.expected_shape)?;

    match magnitude.min_max() {
        Some((min, max)) => info!(min = min, max = max, "Wind speed range"),
        None => warn!("Wind speed field contains no finite values"),
    }

    Ok(WindFields {
        u,
        v,
        magnitude,
        timestamp: slice.timestamp(),
    })
}

/// Read a prediction file and return its wind fields.
pub fn load_wind_fields(path: impl AsRef<Path>, config: &LoaderConfig) -> NetCdfResult<WindFields> {
    let mut dataset = open_dataset(path.as_ref(), &config.layout)?;
    dataset.normalize_latitude();
    wind_fields_from_dataset(&dataset, config)
}
