//! Native NetCDF reading using the netcdf library.
//!
//! Reads a prediction file into a [`GriddedDataset`]. The data variable must
//! be laid out as `(time, vars, lat, lon)`; packing attributes
//! (`scale_factor`, `add_offset`) are applied and fill values become NaN.

use std::path::Path;
use std::sync::Once;

use tracing::{debug, info};

use crate::dataset::{DatasetLayout, GriddedDataset};
use crate::error::{NetCdfError, NetCdfResult};

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints verbose error messages to stderr even when errors
/// are handled gracefully by the Rust code (e.g., when probing for optional
/// attributes that don't exist). This disables that output by calling
/// H5Eset_auto2 with null handlers. Safe to call multiple times.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and we're passing null pointers
        // to disable error output, which is a documented valid use.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// Open a prediction file and read it fully into memory.
pub fn open_dataset(path: &Path, layout: &DatasetLayout) -> NetCdfResult<GriddedDataset> {
    silence_hdf5_errors();

    if !path.exists() {
        return Err(NetCdfError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )));
    }

    let file = netcdf::open(path)
        .map_err(|e| NetCdfError::Library(format!("Failed to open {}: {}", path.display(), e)))?;

    let data_var = file
        .variable(&layout.data_variable)
        .ok_or_else(|| NetCdfError::MissingData(format!("{} variable", layout.data_variable)))?;

    let dim_names: Vec<String> = data_var.dimensions().iter().map(|d| d.name()).collect();
    let expected_dims = [
        layout.time_dimension.as_str(),
        layout.variable_dimension.as_str(),
        layout.lat_dimension.as_str(),
        layout.lon_dimension.as_str(),
    ];
    if dim_names.iter().map(String::as_str).ne(expected_dims.iter().copied()) {
        return Err(NetCdfError::InvalidFormat(format!(
            "{} has dimensions ({}), expected ({})",
            layout.data_variable,
            dim_names.join(", "),
            expected_dims.join(", ")
        )));
    }

    let time = read_f64_coordinate(&file, &layout.time_dimension)?;
    let time_units = file
        .variable(&layout.time_dimension)
        .and_then(|v| get_string_attr(&v, "units"));
    let lat = read_f64_coordinate(&file, &layout.lat_dimension)?;
    let lon = read_f64_coordinate(&file, &layout.lon_dimension)?;
    let variables = read_string_coordinate(&file, &layout.variable_dimension)?;

    debug!(
        time = time.len(),
        vars = variables.len(),
        lat = lat.len(),
        lon = lon.len(),
        "Read coordinates"
    );

    let raw: Vec<f32> = data_var.get_values::<f32, _>(..).map_err(|e| {
        NetCdfError::Library(format!("Failed to read {}: {}", layout.data_variable, e))
    })?;

    let scale_factor = get_f32_attr(&data_var, "scale_factor").unwrap_or(1.0);
    let add_offset = get_f32_attr(&data_var, "add_offset").unwrap_or(0.0);
    let fill_value = get_f32_attr(&data_var, "_FillValue");
    let missing_value = get_f32_attr(&data_var, "missing_value");

    let data: Vec<f32> = raw
        .into_iter()
        .map(|val| {
            if Some(val) == fill_value || Some(val) == missing_value {
                f32::NAN
            } else {
                val * scale_factor + add_offset
            }
        })
        .collect();

    let mut dataset = GriddedDataset::new(time, variables, lat, lon, data)?.with_source(path);
    if let Some(units) = time_units {
        dataset = dataset.with_time_units(units);
    }

    let sizes = dataset.sizes();
    info!(
        path = %path.display(),
        time = sizes.time,
        vars = sizes.vars,
        lat = sizes.lat,
        lon = sizes.lon,
        "Opened gridded dataset"
    );

    Ok(dataset)
}

// =============================================================================
// Internal helpers
// =============================================================================

fn read_f64_coordinate(file: &netcdf::File, name: &str) -> NetCdfResult<Vec<f64>> {
    let var = file
        .variable(name)
        .ok_or_else(|| NetCdfError::MissingData(format!("{} coordinate", name)))?;
    var.get_values::<f64, _>(..)
        .map_err(|e| NetCdfError::Library(format!("Failed to read {}: {}", name, e)))
}

/// Read a categorical coordinate stored either as NC_STRING or as a
/// `(n, strlen)` char array.
fn read_string_coordinate(file: &netcdf::File, name: &str) -> NetCdfResult<Vec<String>> {
    let len = file
        .dimension(name)
        .ok_or_else(|| NetCdfError::MissingData(format!("{} dimension", name)))?
        .len();
    let var = file
        .variable(name)
        .ok_or_else(|| NetCdfError::MissingData(format!("{} coordinate", name)))?;

    let strings: Result<Vec<String>, _> = (0..len).map(|i| var.get_string([i])).collect();
    if let Ok(strings) = strings {
        return Ok(strings);
    }

    let raw = var
        .get_raw_values(..)
        .map_err(|e| NetCdfError::Library(format!("Failed to read {}: {}", name, e)))?;
    if len == 0 || raw.len() % len != 0 {
        return Err(NetCdfError::InvalidFormat(format!(
            "{} holds {} bytes for {} entries",
            name,
            raw.len(),
            len
        )));
    }
    Ok(raw
        .chunks(raw.len() / len)
        .map(|chunk| {
            String::from_utf8_lossy(chunk)
                .trim_end_matches('\0')
                .trim()
                .to_string()
        })
        .collect())
}

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

/// Helper to get f32 attribute.
fn get_f32_attr(var: &netcdf::Variable, name: &str) -> Option<f32> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f32::try_from(attr_value).ok()
}

/// Helper to get a text attribute.
fn get_string_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
    if !has_attr(var, name) {
        return None;
    }
    match var.attribute_value(name)?.ok()? {
        netcdf::AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}
