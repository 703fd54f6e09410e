//! Orthographic projection.
//!
//! Views the globe from an infinite distance above a centre point. Only the
//! hemisphere facing the viewer is visible; the projected coordinates lie in
//! the unit disk.
//!
//! Reference: Snyder, Map Projections - A Working Manual (1987), pp. 145-153.

/// Orthographic projection on the unit sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orthographic {
    /// Longitude of the projection centre (radians)
    pub lambda_0: f64,
    /// Latitude of the projection centre (radians)
    pub phi_0: f64,
    sin_phi_0: f64,
    cos_phi_0: f64,
}

impl Orthographic {
    /// Create a projection centred on `lon0_deg`, `lat0_deg`.
    pub fn new(lon0_deg: f64, lat0_deg: f64) -> Self {
        let phi_0 = lat0_deg.to_radians();
        Self {
            lambda_0: lon0_deg.to_radians(),
            phi_0,
            sin_phi_0: phi_0.sin(),
            cos_phi_0: phi_0.cos(),
        }
    }

    /// Centre as (lon, lat) degrees.
    pub fn center(&self) -> (f64, f64) {
        (self.lambda_0.to_degrees(), self.phi_0.to_degrees())
    }

    /// Project lon/lat (degrees) to unit-disk coordinates, y pointing north.
    ///
    /// Returns `None` for points on the far hemisphere.
    pub fn forward(&self, lon_deg: f64, lat_deg: f64) -> Option<(f64, f64)> {
        let phi = lat_deg.to_radians();
        let dlambda = lon_deg.to_radians() - self.lambda_0;
        let (sin_phi, cos_phi) = phi.sin_cos();
        let cos_dl = dlambda.cos();

        let cos_c = self.sin_phi_0 * sin_phi + self.cos_phi_0 * cos_phi * cos_dl;
        if cos_c < 0.0 {
            return None;
        }

        let x = cos_phi * dlambda.sin();
        let y = self.cos_phi_0 * sin_phi - self.sin_phi_0 * cos_phi * cos_dl;
        Some((x, y))
    }

    /// Inverse projection from unit-disk coordinates to lon/lat (degrees).
    ///
    /// Longitudes are returned in [-180, 180). Returns `None` outside the
    /// disk.
    pub fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let rho = x.hypot(y);
        if rho > 1.0 {
            return None;
        }
        if rho < 1e-12 {
            return Some((normalize_lon(self.lambda_0.to_degrees()), self.phi_0.to_degrees()));
        }

        let c = rho.asin();
        let (sin_c, cos_c) = c.sin_cos();
        let phi = (cos_c * self.sin_phi_0 + y * sin_c * self.cos_phi_0 / rho)
            .clamp(-1.0, 1.0)
            .asin();
        let lambda = self.lambda_0
            + (x * sin_c).atan2(rho * cos_c * self.cos_phi_0 - y * sin_c * self.sin_phi_0);

        Some((normalize_lon(lambda.to_degrees()), phi.to_degrees()))
    }
}

fn normalize_lon(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}
