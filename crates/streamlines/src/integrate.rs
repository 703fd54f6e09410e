//! Trajectory integration in grid coordinates.
//!
//! Trajectories are integrated with an adaptive second-order Runge-Kutta
//! scheme (Heun's method with an embedded Euler error estimate). The
//! velocity is normalised by the local speed, so the step size measures arc
//! length in axes units rather than time.

use crate::grid::DomainMap;
use crate::IntegrationDirection;

const MAX_ERROR: f64 = 0.003;

/// Why a single evaluation of the velocity field failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stop {
    /// The point left the grid.
    OutOfBounds,
    /// Zero speed or missing data.
    Terminate,
}

/// Velocity components in grid units and speed in axes units, all `ny * nx`.
pub(crate) struct VelocityField<'a> {
    pub u: &'a [f64],
    pub v: &'a [f64],
    pub speed: &'a [f64],
}

impl VelocityField<'_> {
    /// Unit-speed direction at a grid point, reversed when `backward`.
    fn direction(&self, dmap: &DomainMap, xi: f64, yi: f64, backward: bool) -> Result<(f64, f64), Stop> {
        if !dmap.grid.within_grid(xi, yi) {
            return Err(Stop::OutOfBounds);
        }
        let (ny, nx) = dmap.grid.shape();
        let ds_dt = interpgrid(self.speed, nx, ny, xi, yi)?;
        if ds_dt == 0.0 {
            return Err(Stop::Terminate);
        }
        let dt_ds = 1.0 / ds_dt;
        let ui = interpgrid(self.u, nx, ny, xi, yi)?;
        let vi = interpgrid(self.v, nx, ny, xi, yi)?;
        if backward {
            Ok((-ui * dt_ds, -vi * dt_ds))
        } else {
            Ok((ui * dt_ds, vi * dt_ds))
        }
    }
}

/// Bilinear interpolation of a row-major array at a grid point.
///
/// Any NaN among the surrounding nodes terminates the trajectory.
pub(crate) fn interpgrid(a: &[f64], nx: usize, ny: usize, xi: f64, yi: f64) -> Result<f64, Stop> {
    let x = xi as usize;
    let y = yi as usize;
    let xn = if x == nx - 1 { x } else { x + 1 };
    let yn = if y == ny - 1 { y } else { y + 1 };

    let a00 = a[y * nx + x];
    let a01 = a[y * nx + xn];
    let a10 = a[yn * nx + x];
    let a11 = a[yn * nx + xn];

    let xt = xi - x as f64;
    let yt = yi - y as f64;
    let a0 = a00 * (1.0 - xt) + a01 * xt;
    let a1 = a10 * (1.0 - xt) + a11 * xt;
    let ai = a0 * (1.0 - yt) + a1 * yt;

    if ai.is_nan() {
        Err(Stop::Terminate)
    } else {
        Ok(ai)
    }
}

/// Integrate a streamline through the grid point `(x0, y0)`.
///
/// Returns the trajectory in grid coordinates, or `None` when it is shorter
/// than `min_length` (its mask cells are released again) or starts in an
/// occupied cell.
#[allow(clippy::too_many_arguments)]
pub(crate) fn integrate(
    dmap: &mut DomainMap,
    field: &VelocityField<'_>,
    x0: f64,
    y0: f64,
    min_length: f64,
    max_length: f64,
    direction: IntegrationDirection,
    broken: bool,
) -> Option<Vec<(f64, f64)>> {
    let max_length = match direction {
        IntegrationDirection::Both => max_length / 2.0,
        _ => max_length,
    };

    let mut stotal = 0.0;
    let mut trajectory = Vec::new();

    if dmap.start_trajectory(x0, y0, broken).is_err() {
        return None;
    }

    if matches!(direction, IntegrationDirection::Both | IntegrationDirection::Backward) {
        let (s, mut points) = integrate_rk12(dmap, field, x0, y0, max_length, broken, true);
        stotal += s;
        points.reverse();
        trajectory.extend(points);
    }

    if matches!(direction, IntegrationDirection::Both | IntegrationDirection::Forward) {
        dmap.reset_start_point(x0, y0);
        let (s, points) = integrate_rk12(dmap, field, x0, y0, max_length, broken, false);
        stotal += s;
        // Start point is already present from the backward pass or is dropped
        trajectory.extend(points.into_iter().skip(1));
    }

    if stotal > min_length {
        Some(trajectory)
    } else {
        dmap.undo_trajectory();
        None
    }
}

/// Adaptive RK12 integration from `(x0, y0)` in one direction.
///
/// Returns the arc length covered (axes units) and the visited points.
fn integrate_rk12(
    dmap: &mut DomainMap,
    field: &VelocityField<'_>,
    x0: f64,
    y0: f64,
    max_length: f64,
    broken: bool,
    backward: bool,
) -> (f64, Vec<(f64, f64)>) {
    let max_ds = (1.0 / dmap.mask.nx as f64)
        .min(1.0 / dmap.mask.ny as f64)
        .min(0.1);
    let (ny, nx) = dmap.grid.shape();

    let mut ds = max_ds;
    let mut stotal = 0.0;
    let mut xi = x0;
    let mut yi = y0;
    let mut points: Vec<(f64, f64)> = Vec::new();

    loop {
        let step = if dmap.grid.within_grid(xi, yi) {
            points.push((xi, yi));
            field
                .direction(dmap, xi, yi, backward)
                .and_then(|(k1x, k1y)| {
                    let (k2x, k2y) =
                        field.direction(dmap, xi + ds * k1x, yi + ds * k1y, backward)?;
                    Ok((k1x, k1y, k2x, k2y))
                })
        } else {
            Err(Stop::OutOfBounds)
        };

        let (k1x, k1y, k2x, k2y) = match step {
            Ok(k) => k,
            Err(Stop::OutOfBounds) => {
                // Finish neatly on the boundary
                if let Some(ds) = euler_step(dmap, field, &mut points, backward) {
                    stotal += ds;
                }
                break;
            }
            Err(Stop::Terminate) => break,
        };

        let dx1 = ds * k1x;
        let dy1 = ds * k1y;
        let dx2 = ds * 0.5 * (k1x + k2x);
        let dy2 = ds * 0.5 * (k1y + k2y);

        // Error in axes coordinates
        let error = ((dx2 - dx1) / (nx - 1) as f64).hypot((dy2 - dy1) / (ny - 1) as f64);

        if error < MAX_ERROR {
            xi += dx2;
            yi += dy2;
            if dmap.update_trajectory(xi, yi, broken).is_err() {
                break;
            }
            if stotal + ds > max_length {
                break;
            }
            stotal += ds;
        }

        ds = if error == 0.0 {
            max_ds
        } else {
            max_ds.min(0.85 * ds * (MAX_ERROR / error).sqrt())
        };
    }

    (stotal, points)
}

/// Extend the trajectory in a straight line to the nearest grid edge.
fn euler_step(
    dmap: &DomainMap,
    field: &VelocityField<'_>,
    points: &mut Vec<(f64, f64)>,
    backward: bool,
) -> Option<f64> {
    let &(xi, yi) = points.last()?;
    let (ny, nx) = dmap.grid.shape();
    let (cx, cy) = field.direction(dmap, xi, yi, backward).ok()?;

    let dsx = distance_to_edge(xi, cx, (nx - 1) as f64);
    let dsy = distance_to_edge(yi, cy, (ny - 1) as f64);
    let ds = dsx.min(dsy);

    points.push((xi + cx * ds, yi + cy * ds));
    Some(ds)
}

fn distance_to_edge(pos: f64, velocity: f64, upper: f64) -> f64 {
    if velocity == 0.0 {
        f64::INFINITY
    } else if velocity < 0.0 {
        pos / -velocity
    } else {
        (upper - pos) / velocity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpgrid_bilinear() {
        // 2x3 grid, values = x + 10 * y
        let a = [0.0, 1.0, 2.0, 10.0, 11.0, 12.0];
        assert_eq!(interpgrid(&a, 3, 2, 0.0, 0.0), Ok(0.0));
        assert_eq!(interpgrid(&a, 3, 2, 2.0, 1.0), Ok(12.0));
        let v = interpgrid(&a, 3, 2, 1.5, 0.5).unwrap();
        assert!((v - 6.5).abs() < 1e-12);
    }

    #[test]
    fn test_interpgrid_nan_terminates() {
        let a = [0.0, f64::NAN, 2.0, 10.0, 11.0, 12.0];
        assert_eq!(interpgrid(&a, 3, 2, 0.5, 0.5), Err(Stop::Terminate));
        // Far from the NaN node the value is fine
        assert!(interpgrid(&a, 3, 2, 2.0, 1.0).is_ok());
    }

    #[test]
    fn test_distance_to_edge() {
        assert_eq!(distance_to_edge(2.0, 0.0, 10.0), f64::INFINITY);
        assert_eq!(distance_to_edge(2.0, -1.0, 10.0), 2.0);
        assert_eq!(distance_to_edge(2.0, 2.0, 10.0), 4.0);
    }
}
