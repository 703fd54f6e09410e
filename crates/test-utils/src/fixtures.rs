//! File fixtures for integration tests.
//!
//! Writes small but structurally faithful input files: prediction NetCDF
//! files with a `var(time, vars, lat, lon)` data variable, and GeoJSON
//! coastlines in the Natural Earth layout.

use std::fs;
use std::io;
use std::path::Path;

use serde_json::json;

use crate::generators::WindGrid;

/// Common time values for testing.
pub mod time {
    /// Units attribute of the fixture time coordinate
    pub const TIME_UNITS: &str = "hours since 2020-01-01 00:00:00";

    /// Time coordinate of the first (only) slice: 2020-01-01 06:00:00
    pub const FIRST_TIME_VALUE: f64 = 6.0;

    pub const FIRST_TIME_LABEL: &str = "2020-01-01 06:00:00";
}

/// Category names along the `vars` dimension, in file order.
pub const PREDICTION_VARIABLES: [&str; 3] = ["SLP", "U10M", "V10M"];

/// Sea-level pressure written for the unused SLP category.
pub const SLP_VALUE: f32 = 101_325.0;

/// A prediction file to be written to disk.
#[derive(Debug, Clone)]
pub struct PredictionFixture {
    pub wind: WindGrid,
    pub time_units: String,
    pub time_value: f64,
    /// Store latitude north-to-south, as many global products do
    pub descending_latitude: bool,
    /// Store data packed as `value = raw * scale + offset`
    pub packing: Option<(f32, f32)>,
    /// Replace this node index with the fill value in every category
    pub fill_at: Option<usize>,
    /// Store the category names as a NUL-padded `(vars, strlen)` char array
    /// instead of NC_STRING
    pub char_variables: bool,
}

/// Length of the char dimension used by `with_char_variables`.
pub const VARS_STRLEN: usize = 8;

/// Fill value used by packed fixture files.
pub const FILL_VALUE: f32 = -9999.0;

impl PredictionFixture {
    pub fn new(wind: WindGrid) -> Self {
        Self {
            wind,
            time_units: time::TIME_UNITS.to_string(),
            time_value: time::FIRST_TIME_VALUE,
            descending_latitude: false,
            packing: None,
            fill_at: None,
            char_variables: false,
        }
    }

    pub fn with_descending_latitude(mut self) -> Self {
        self.descending_latitude = true;
        self
    }

    pub fn with_packing(mut self, scale: f32, offset: f32) -> Self {
        self.packing = Some((scale, offset));
        self
    }

    pub fn with_fill_at(mut self, index: usize) -> Self {
        self.fill_at = Some(index);
        self
    }

    pub fn with_char_variables(mut self) -> Self {
        self.char_variables = true;
        self
    }

    /// Write the fixture as a NetCDF-4 file.
    pub fn write(&self, path: &Path) -> Result<(), netcdf::Error> {
        let nx = self.wind.nx();
        let ny = self.wind.ny();

        let mut lat = self.wind.lat.clone();
        if self.descending_latitude {
            lat.reverse();
        }

        // [time=1][vars=3][lat][lon]
        let mut data = Vec::with_capacity(PREDICTION_VARIABLES.len() * ny * nx);
        for category in 0..PREDICTION_VARIABLES.len() {
            for row in 0..ny {
                let src_row = if self.descending_latitude { ny - 1 - row } else { row };
                for col in 0..nx {
                    let idx = src_row * nx + col;
                    let value = match category {
                        0 => SLP_VALUE,
                        1 => self.wind.u[idx],
                        _ => self.wind.v[idx],
                    };
                    let stored = if self.fill_at == Some(idx) {
                        FILL_VALUE
                    } else if let Some((scale, offset)) = self.packing {
                        (value - offset) / scale
                    } else {
                        value
                    };
                    data.push(stored);
                }
            }
        }

        let mut file = netcdf::create(path)?;
        file.add_dimension("time", 1)?;
        file.add_dimension("vars", PREDICTION_VARIABLES.len())?;
        file.add_dimension("lat", ny)?;
        file.add_dimension("lon", nx)?;

        {
            let mut time_var = file.add_variable::<f64>("time", &["time"])?;
            time_var.put_attribute("units", self.time_units.as_str())?;
            time_var.put_values(&[self.time_value], ..)?;
        }

        if self.char_variables {
            file.add_dimension("strlen", VARS_STRLEN)?;
            let mut raw = vec![0u8; PREDICTION_VARIABLES.len() * VARS_STRLEN];
            for (chunk, name) in raw.chunks_mut(VARS_STRLEN).zip(PREDICTION_VARIABLES) {
                chunk[..name.len()].copy_from_slice(name.as_bytes());
            }
            let mut vars_var = file.add_variable_with_type(
                "vars",
                &["vars", "strlen"],
                &netcdf::types::NcVariableType::Char,
            )?;
            vars_var.put_raw_values(&raw, ..)?;
        } else {
            let mut vars_var = file.add_string_variable("vars", &["vars"])?;
            for (i, name) in PREDICTION_VARIABLES.iter().enumerate() {
                vars_var.put_string(name, [i])?;
            }
        }

        {
            let mut lat_var = file.add_variable::<f64>("lat", &["lat"])?;
            lat_var.put_attribute("units", "degrees_north")?;
            lat_var.put_values(&lat, ..)?;
        }

        {
            let mut lon_var = file.add_variable::<f64>("lon", &["lon"])?;
            lon_var.put_attribute("units", "degrees_east")?;
            lon_var.put_values(&self.wind.lon, ..)?;
        }

        {
            let mut data_var = file.add_variable::<f32>("var", &["time", "vars", "lat", "lon"])?;
            if let Some((scale, offset)) = self.packing {
                data_var.put_attribute("scale_factor", scale)?;
                data_var.put_attribute("add_offset", offset)?;
            }
            if self.fill_at.is_some() {
                data_var.put_attribute("_FillValue", FILL_VALUE)?;
            }
            data_var.put_values(&data, ..)?;
        }

        Ok(())
    }
}

/// Write a plain prediction file holding `wind`.
pub fn write_prediction_netcdf(path: &Path, wind: &WindGrid) -> Result<(), netcdf::Error> {
    PredictionFixture::new(wind.clone()).write(path)
}

/// A few coastline features around Australia and the Indian Ocean, all on the
/// hemisphere facing (100E, 30S), plus one line on the far side.
pub fn coastline_geojson() -> serde_json::Value {
    json!({
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "featurecla": "Coastline", "scalerank": 0 },
                "geometry": {
                    "type": "LineString",
                    "coordinates": [
                        [114.0, -22.0], [114.0, -34.0], [118.0, -35.0],
                        [130.0, -32.0], [140.0, -38.0], [150.0, -37.0],
                        [153.0, -28.0], [146.0, -19.0], [142.0, -11.0]
                    ]
                }
            },
            {
                "type": "Feature",
                "properties": { "featurecla": "Coastline", "scalerank": 1 },
                "geometry": {
                    "type": "MultiLineString",
                    "coordinates": [
                        [[44.0, -25.0], [47.0, -25.0], [50.0, -15.0], [49.0, -12.0]],
                        [[79.8, 6.0], [81.8, 7.5], [80.0, 9.8]]
                    ]
                }
            },
            {
                "type": "Feature",
                "properties": { "featurecla": "Coastline", "scalerank": 0 },
                "geometry": {
                    "type": "LineString",
                    "coordinates": [[-80.0, 25.0], [-81.0, 30.0], [-76.0, 35.0]]
                }
            }
        ]
    })
}

/// Write [`coastline_geojson`] to `path`.
pub fn write_coastline_geojson(path: &Path) -> io::Result<()> {
    fs::write(path, coastline_geojson().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::{axis, uniform_wind};

    #[test]
    fn test_coastline_fixture_shape() {
        let value = coastline_geojson();
        let features = value["features"].as_array().unwrap();
        assert_eq!(features.len(), 3);
        assert_eq!(features[1]["geometry"]["type"], "MultiLineString");
    }

    #[test]
    fn test_write_coastline_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coast.geojson");
        write_coastline_geojson(&path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("FeatureCollection"));
    }

    #[test]
    fn test_fixture_builder() {
        let wind = uniform_wind(axis(4, 0.0, 1.0), axis(3, 0.0, 1.0), 1.0, 0.0);
        let fixture = PredictionFixture::new(wind)
            .with_descending_latitude()
            .with_packing(0.01, 0.0)
            .with_fill_at(5);
        assert!(fixture.descending_latitude);
        assert_eq!(fixture.packing, Some((0.01, 0.0)));
        assert_eq!(fixture.fill_at, Some(5));
        assert_eq!(fixture.time_units, time::TIME_UNITS);
    }
}
