//! NetCDF reader for gridded weather-prediction output.
//!
//! Prediction files store sea-level pressure and the 10 m wind components in
//! a single `var(time, vars, lat, lon)` variable. This crate reads such a
//! file, selects a time slice and the `U10M`/`V10M` categories, derives the
//! wind speed, and enforces the 360 x 576 grid the figure is built for.

pub mod dataset;
pub mod error;
pub mod native;
pub mod time;
pub mod wind;

pub use dataset::{DatasetLayout, DatasetSizes, GriddedDataset, TimeSlice};
pub use error::{NetCdfError, NetCdfResult};
pub use native::{open_dataset, silence_hdf5_errors};
pub use time::decode_cf_time;
pub use wind::{
    check_shape, load_wind_fields, wind_fields_from_dataset, wind_magnitude, ExpectedShape,
    LoaderConfig, WindFields,
};
