//! Streamline extraction from 2D vector fields.
//!
//! Follows the classic streamplot scheme: seeds are placed in a spiral over
//! a coarse occupancy mask, each seed is integrated in both directions with
//! an adaptive RK12 solver, and every accepted trajectory marks the mask
//! cells it crosses so that later streamlines keep their distance.
//!
//! The result is fully deterministic for a given field and configuration.

pub mod error;
pub mod grid;
mod integrate;
pub mod seeds;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use error::{StreamlineError, StreamlineResult};
pub use grid::{DomainMap, Grid, StreamMask};
pub use seeds::SpiralSeeds;

use integrate::{integrate, VelocityField};

/// Which way to follow the field from each seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrationDirection {
    #[default]
    Both,
    Forward,
    Backward,
}

/// Streamline extraction parameters.
///
/// Lengths are measured in axes units, where the full width or height of
/// the grid is 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamlineConfig {
    /// Mask resolution is `30 * density` cells per side
    pub density: f64,
    pub min_length: f64,
    pub max_length: f64,
    /// Stop a streamline when it runs into one drawn earlier
    pub broken_streamlines: bool,
    pub integration_direction: IntegrationDirection,
}

impl Default for StreamlineConfig {
    fn default() -> Self {
        Self {
            density: 1.0,
            min_length: 0.1,
            max_length: 4.0,
            broken_streamlines: true,
            integration_direction: IntegrationDirection::Both,
        }
    }
}

/// A point in data coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// One continuous flow path.
#[derive(Debug, Clone, PartialEq)]
pub struct Streamline {
    pub points: Vec<Point>,
}

impl Streamline {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Length of the polyline in data units.
    pub fn arc_length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| (w[1].x - w[0].x).hypot(w[1].y - w[0].y))
            .sum()
    }
}

/// Extract streamlines of the field `(u, v)` sampled on the `x` by `y` grid.
///
/// `u` and `v` are row-major with shape `(y.len(), x.len())`. Missing values
/// (NaN) end any streamline that reaches them. The polylines are returned in
/// the order they were accepted, in the coordinates of `x` and `y`.
pub fn extract_streamlines(
    x: &[f64],
    y: &[f64],
    u: &[f32],
    v: &[f32],
    config: &StreamlineConfig,
) -> StreamlineResult<Vec<Streamline>> {
    if !(config.min_length >= 0.0) || !(config.max_length > config.min_length) {
        return Err(StreamlineError::InvalidLength {
            min: config.min_length,
            max: config.max_length,
        });
    }

    let grid = Grid::new(x, y)?;
    let (ny, nx) = grid.shape();
    for (name, values) in [("u", u), ("v", v)] {
        if values.len() != nx * ny {
            return Err(StreamlineError::ShapeMismatch {
                name: name.to_string(),
                expected: nx * ny,
                actual: values.len(),
                ny,
                nx,
            });
        }
    }

    let mask = StreamMask::new(config.density)?;
    let mut dmap = DomainMap::new(grid, mask);

    // Velocities in grid units per unit time, speed in axes units
    let mut u_grid = Vec::with_capacity(nx * ny);
    let mut v_grid = Vec::with_capacity(nx * ny);
    let mut speed = Vec::with_capacity(nx * ny);
    for (&ui, &vi) in u.iter().zip(v) {
        let (ug, vg) = dmap.data2grid(ui as f64, vi as f64);
        u_grid.push(ug);
        v_grid.push(vg);
        speed.push((ug / (nx - 1) as f64).hypot(vg / (ny - 1) as f64));
    }
    let field = VelocityField {
        u: &u_grid,
        v: &v_grid,
        speed: &speed,
    };

    let (mask_ny, mask_nx) = dmap.mask.shape();
    let mut trajectories = Vec::new();
    for (xm, ym) in SpiralSeeds::new(mask_nx, mask_ny) {
        if dmap.mask.is_occupied(xm, ym) {
            continue;
        }
        let (xg, yg) = dmap.mask2grid(xm, ym);
        if let Some(trajectory) = integrate(
            &mut dmap,
            &field,
            xg,
            yg,
            config.min_length,
            config.max_length,
            config.integration_direction,
            config.broken_streamlines,
        ) {
            trajectories.push(trajectory);
        }
    }

    let streamlines: Vec<Streamline> = trajectories
        .into_iter()
        .filter(|t| t.len() >= 2)
        .map(|t| Streamline {
            points: t
                .into_iter()
                .map(|(xg, yg)| {
                    let (x, y) = dmap.grid2data(xg, yg);
                    Point { x, y }
                })
                .collect(),
        })
        .collect();

    debug!(
        streamlines = streamlines.len(),
        points = streamlines.iter().map(Streamline::len).sum::<usize>(),
        density = config.density,
        "Extracted streamlines"
    );

    Ok(streamlines)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis(n: usize, start: f64, step: f64) -> Vec<f64> {
        (0..n).map(|i| start + i as f64 * step).collect()
    }

    #[test]
    fn test_config_serde_partial() {
        let config: StreamlineConfig =
            serde_json::from_str(r#"{"density": 3.0, "integration_direction": "forward"}"#)
                .unwrap();
        assert_eq!(config.density, 3.0);
        assert_eq!(config.integration_direction, IntegrationDirection::Forward);
        assert_eq!(config.max_length, 4.0);
        assert!(config.broken_streamlines);
    }

    #[test]
    fn test_rejects_bad_lengths() {
        let x = axis(4, 0.0, 1.0);
        let values = vec![1.0f32; 16];
        let config = StreamlineConfig {
            min_length: 1.0,
            max_length: 0.5,
            ..Default::default()
        };
        assert!(matches!(
            extract_streamlines(&x, &x, &values, &values, &config),
            Err(StreamlineError::InvalidLength { .. })
        ));
    }

    #[test]
    fn test_rejects_shape_mismatch() {
        let x = axis(4, 0.0, 1.0);
        let u = vec![1.0f32; 16];
        let v = vec![0.0f32; 15];
        let err = extract_streamlines(&x, &x, &u, &v, &StreamlineConfig::default()).unwrap_err();
        assert!(matches!(err, StreamlineError::ShapeMismatch { ref name, .. } if name == "v"));
    }

    #[test]
    fn test_arc_length() {
        let line = Streamline {
            points: vec![
                Point { x: 0.0, y: 0.0 },
                Point { x: 3.0, y: 4.0 },
                Point { x: 3.0, y: 5.0 },
            ],
        };
        assert_eq!(line.arc_length(), 6.0);
        assert_eq!(line.len(), 3);
    }
}
