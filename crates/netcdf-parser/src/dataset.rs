//! In-memory gridded dataset with `(time, vars, lat, lon)` layout.
//!
//! Prediction files keep every output field in one data variable and
//! distinguish fields by a categorical `vars` dimension whose coordinate holds
//! names such as `"SLP"`, `"U10M"` and `"V10M"`.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use grid_common::ScalarField;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{NetCdfError, NetCdfResult};
use crate::time::{decode_cf_time, TIMESTAMP_FORMAT};

/// Names of the variables and dimensions in a prediction file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetLayout {
    /// Data variable holding every field
    pub data_variable: String,
    /// Categorical dimension selecting the field
    pub variable_dimension: String,
    pub time_dimension: String,
    pub lat_dimension: String,
    pub lon_dimension: String,
}

impl Default for DatasetLayout {
    fn default() -> Self {
        Self {
            data_variable: "var".to_string(),
            variable_dimension: "vars".to_string(),
            time_dimension: "time".to_string(),
            lat_dimension: "lat".to_string(),
            lon_dimension: "lon".to_string(),
        }
    }
}

/// Sizes of the four dataset dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetSizes {
    pub time: usize,
    pub vars: usize,
    pub lat: usize,
    pub lon: usize,
}

/// A gridded dataset held in memory.
#[derive(Debug, Clone)]
pub struct GriddedDataset {
    /// Raw time coordinate values
    pub time: Vec<f64>,
    /// CF `units` of the time coordinate
    pub time_units: Option<String>,
    /// Category names along the variable dimension
    pub variables: Vec<String>,
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    /// Values in `[time][vars][lat][lon]` order
    pub data: Vec<f32>,
    pub source: Option<PathBuf>,
}

impl GriddedDataset {
    pub fn new(
        time: Vec<f64>,
        variables: Vec<String>,
        lat: Vec<f64>,
        lon: Vec<f64>,
        data: Vec<f32>,
    ) -> NetCdfResult<Self> {
        let expected = time.len() * variables.len() * lat.len() * lon.len();
        if data.len() != expected {
            return Err(NetCdfError::InvalidFormat(format!(
                "data has {} values, expected {} ({}x{}x{}x{})",
                data.len(),
                expected,
                time.len(),
                variables.len(),
                lat.len(),
                lon.len()
            )));
        }
        Ok(Self {
            time,
            time_units: None,
            variables,
            lat,
            lon,
            data,
            source: None,
        })
    }

    pub fn with_time_units(mut self, units: impl Into<String>) -> Self {
        self.time_units = Some(units.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn sizes(&self) -> DatasetSizes {
        DatasetSizes {
            time: self.time.len(),
            vars: self.variables.len(),
            lat: self.lat.len(),
            lon: self.lon.len(),
        }
    }

    /// Flip the latitude axis so that it is ascending.
    ///
    /// Returns true if the data was reordered.
    pub fn normalize_latitude(&mut self) -> bool {
        let descending = self.lat.len() > 1 && self.lat[0] > self.lat[self.lat.len() - 1];
        if !descending {
            return false;
        }
        let nx = self.lon.len();
        let ny = self.lat.len();
        for block in self.data.chunks_mut(nx * ny) {
            for j in 0..ny / 2 {
                let (top, bottom) = block.split_at_mut((ny - 1 - j) * nx);
                top[j * nx..(j + 1) * nx].swap_with_slice(&mut bottom[..nx]);
            }
        }
        self.lat.reverse();
        debug!(ny = ny, "Flipped descending latitude axis");
        true
    }

    /// Select a single time step by index.
    pub fn isel_time(&self, index: usize) -> NetCdfResult<TimeSlice<'_>> {
        let value = *self.time.get(index).ok_or_else(|| {
            NetCdfError::MissingData(format!(
                "time index {} (dataset has {} time steps)",
                index,
                self.time.len()
            ))
        })?;
        let timestamp = self
            .time_units
            .as_deref()
            .and_then(|units| decode_cf_time(value, units));
        Ok(TimeSlice {
            dataset: self,
            index,
            value,
            timestamp,
        })
    }
}

/// One time step of a [`GriddedDataset`].
#[derive(Debug, Clone, Copy)]
pub struct TimeSlice<'a> {
    dataset: &'a GriddedDataset,
    index: usize,
    value: f64,
    timestamp: Option<DateTime<Utc>>,
}

impl<'a> TimeSlice<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    /// Raw time coordinate value.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Decoded timestamp, if the time units could be interpreted.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    /// Timestamp as `%Y-%m-%d %H:%M:%S`, or the raw value when undecodable.
    pub fn label(&self) -> String {
        match self.timestamp {
            Some(t) => t.format(TIMESTAMP_FORMAT).to_string(),
            None => format!("{}", self.value),
        }
    }

    /// Select one category of the variable dimension, dropping that dimension.
    pub fn select(&self, name: &str) -> NetCdfResult<ScalarField> {
        let ds = self.dataset;
        let var_index = ds
            .variables
            .iter()
            .position(|v| v == name)
            .ok_or_else(|| {
                NetCdfError::MissingData(format!(
                    "variable '{}' (available: {})",
                    name,
                    ds.variables.join(", ")
                ))
            })?;

        let plane = ds.lat.len() * ds.lon.len();
        let start = (self.index * ds.variables.len() + var_index) * plane;
        let values = ds.data[start..start + plane].to_vec();

        let field = ScalarField::new(name, ds.lon.clone(), ds.lat.clone(), values)?;
        Ok(match &ds.source {
            Some(path) => field.with_source(path.clone()),
            None => field,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 2 times x 2 vars x 3 lat x 2 lon, value = t*100 + v*10 + j*2 + i
    fn dataset() -> GriddedDataset {
        let mut data = Vec::new();
        for t in 0..2 {
            for v in 0..2 {
                for j in 0..3 {
                    for i in 0..2 {
                        data.push((t * 100 + v * 10 + j * 2 + i) as f32);
                    }
                }
            }
        }
        GriddedDataset::new(
            vec![0.0, 6.0],
            vec!["U10M".to_string(), "V10M".to_string()],
            vec![-10.0, 0.0, 10.0],
            vec![0.0, 180.0],
            data,
        )
        .unwrap()
        .with_time_units("hours since 2020-01-01 00:00:00")
    }

    #[test]
    fn test_new_checks_length() {
        let err = GriddedDataset::new(vec![0.0], vec!["a".into()], vec![0.0], vec![0.0], vec![])
            .unwrap_err();
        assert!(matches!(err, NetCdfError::InvalidFormat(_)));
    }

    #[test]
    fn test_select_drops_variable_dimension() {
        let ds = dataset();
        let slice = ds.isel_time(1).unwrap();
        let v = slice.select("V10M").unwrap();
        assert_eq!(v.shape(), (3, 2));
        assert_eq!(v.values, vec![110.0, 111.0, 112.0, 113.0, 114.0, 115.0]);
        assert_eq!(slice.label(), "2020-01-01 06:00:00");
    }

    #[test]
    fn test_select_missing_category() {
        let ds = dataset();
        let err = ds.isel_time(0).unwrap().select("SLP").unwrap_err();
        assert!(matches!(err, NetCdfError::MissingData(_)));
    }

    #[test]
    fn test_unrepresentable_time_falls_back_to_raw_value() {
        let mut ds = dataset();
        ds.time = vec![1.0e12, -1.0e300];
        let slice = ds.isel_time(0).unwrap();
        assert!(slice.timestamp().is_none());
        assert_eq!(slice.label(), "1000000000000");
        assert!(ds.isel_time(1).unwrap().timestamp().is_none());
    }

    #[test]
    fn test_isel_time_out_of_range() {
        assert!(dataset().isel_time(2).is_err());
    }

    #[test]
    fn test_normalize_latitude_flips_rows() {
        let mut ds = dataset();
        ds.lat.reverse();
        assert!(ds.normalize_latitude());
        assert_eq!(ds.lat, vec![-10.0, 0.0, 10.0]);
        let u = ds.isel_time(0).unwrap().select("U10M").unwrap();
        assert_eq!(u.values, vec![4.0, 5.0, 2.0, 3.0, 0.0, 1.0]);
        assert!(!ds.normalize_latitude());
    }

    #[test]
    fn test_select_carries_source() {
        let ds = dataset().with_source("figures/predicted.nc");
        let u = ds.isel_time(0).unwrap().select("U10M").unwrap();
        assert_eq!(u.source.as_deref(), Some(std::path::Path::new("figures/predicted.nc")));
    }
}
