//! Synthetic wind fields for tests.
//!
//! Fields are laid out the way prediction files are after loading:
//! row-major `(lat, lon)` with latitude ascending.

/// Latitude rows of the prediction grid.
pub const PREDICTION_NLAT: usize = 360;

/// Longitude columns of the prediction grid.
pub const PREDICTION_NLON: usize = 576;

/// Evenly spaced axis of `n` values.
///
/// # Example
///
/// ```
/// use test_utils::axis;
///
/// assert_eq!(axis(3, -1.0, 0.5), vec![-1.0, -0.5, 0.0]);
/// ```
pub fn axis(n: usize, start: f64, step: f64) -> Vec<f64> {
    (0..n).map(|i| start + i as f64 * step).collect()
}

/// Cell-centre latitudes of the 0.5 degree prediction grid.
pub fn prediction_lat() -> Vec<f64> {
    axis(PREDICTION_NLAT, -89.75, 0.5)
}

/// Cell-centre longitudes of the 0.625 degree prediction grid.
pub fn prediction_lon() -> Vec<f64> {
    axis(PREDICTION_NLON, -180.0, 0.625)
}

/// U/V components on a lon/lat grid.
#[derive(Debug, Clone)]
pub struct WindGrid {
    pub lon: Vec<f64>,
    pub lat: Vec<f64>,
    pub u: Vec<f32>,
    pub v: Vec<f32>,
}

impl WindGrid {
    /// Build a grid by evaluating `f(lon, lat) -> (u, v)` at every node.
    pub fn from_fn(lon: Vec<f64>, lat: Vec<f64>, f: impl Fn(f64, f64) -> (f32, f32)) -> Self {
        let mut u = Vec::with_capacity(lon.len() * lat.len());
        let mut v = Vec::with_capacity(lon.len() * lat.len());
        for &y in &lat {
            for &x in &lon {
                let (ui, vi) = f(x, y);
                u.push(ui);
                v.push(vi);
            }
        }
        Self { lon, lat, u, v }
    }

    pub fn nx(&self) -> usize {
        self.lon.len()
    }

    pub fn ny(&self) -> usize {
        self.lat.len()
    }

    /// Wind speed at each node.
    pub fn magnitude(&self) -> Vec<f32> {
        self.u.iter().zip(&self.v).map(|(u, v)| u.hypot(*v)).collect()
    }
}

/// Constant wind everywhere.
pub fn uniform_wind(lon: Vec<f64>, lat: Vec<f64>, u: f32, v: f32) -> WindGrid {
    WindGrid::from_fn(lon, lat, |_, _| (u, v))
}

/// Calm everywhere.
pub fn zero_wind(lon: Vec<f64>, lat: Vec<f64>) -> WindGrid {
    uniform_wind(lon, lat, 0.0, 0.0)
}

/// Counter-clockwise solid-body rotation around `(center_lon, center_lat)`.
///
/// Speed grows linearly with distance from the centre: `omega` per degree.
pub fn vortex_wind(
    lon: Vec<f64>,
    lat: Vec<f64>,
    center_lon: f64,
    center_lat: f64,
    omega: f64,
) -> WindGrid {
    WindGrid::from_fn(lon, lat, |x, y| {
        let dx = x - center_lon;
        let dy = y - center_lat;
        ((-omega * dy) as f32, (omega * dx) as f32)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_axes() {
        let lat = prediction_lat();
        let lon = prediction_lon();
        assert_eq!(lat.len(), 360);
        assert_eq!(lon.len(), 576);
        assert_eq!(lat[0], -89.75);
        assert!((lat[359] - 89.75).abs() < 1e-9);
        assert_eq!(lon[0], -180.0);
        assert!((lon[575] - 179.375).abs() < 1e-9);
    }

    #[test]
    fn test_uniform_magnitude() {
        let grid = uniform_wind(axis(4, 0.0, 1.0), axis(3, 0.0, 1.0), 3.0, 4.0);
        assert_eq!(grid.u.len(), 12);
        assert!(grid.magnitude().iter().all(|&m| m == 5.0));
    }

    #[test]
    fn test_vortex_is_tangential() {
        let grid = vortex_wind(axis(5, -2.0, 1.0), axis(5, -2.0, 1.0), 0.0, 0.0, 1.0);
        // East of the centre the wind blows north
        let idx = 2 * grid.nx() + 4;
        assert_eq!(grid.u[idx], 0.0);
        assert_eq!(grid.v[idx], 2.0);
        // Calm at the centre
        assert_eq!(grid.magnitude()[2 * grid.nx() + 2], 0.0);
    }
}
