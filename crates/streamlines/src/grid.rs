//! Coordinate systems used during integration.
//!
//! Three spaces are involved:
//! - data: the caller's x/y coordinates (longitude/latitude)
//! - grid: fractional array indices, `0..=nx-1` by `0..=ny-1`
//! - mask: cells of the occupancy mask that spaces streamlines apart

use crate::error::{StreamlineError, StreamlineResult};

/// A regular, strictly increasing grid.
#[derive(Debug, Clone)]
pub struct Grid {
    pub nx: usize,
    pub ny: usize,
    pub dx: f64,
    pub dy: f64,
    pub x_origin: f64,
    pub y_origin: f64,
    pub width: f64,
    pub height: f64,
}

impl Grid {
    pub fn new(x: &[f64], y: &[f64]) -> StreamlineResult<Self> {
        let nx = x.len();
        let ny = y.len();
        if nx < 2 || ny < 2 {
            return Err(StreamlineError::InvalidGrid(format!(
                "need at least 2x2 points, got {}x{}",
                ny, nx
            )));
        }

        check_axis("x", x)?;
        check_axis("y", y)?;

        Ok(Self {
            nx,
            ny,
            dx: x[1] - x[0],
            dy: y[1] - y[0],
            x_origin: x[0],
            y_origin: y[0],
            width: x[nx - 1] - x[0],
            height: y[ny - 1] - y[0],
        })
    }

    /// `(ny, nx)`
    pub fn shape(&self) -> (usize, usize) {
        (self.ny, self.nx)
    }

    /// True if the grid-space point lies on the grid, edges included.
    pub fn within_grid(&self, xi: f64, yi: f64) -> bool {
        0.0 <= xi && xi <= (self.nx - 1) as f64 && 0.0 <= yi && yi <= (self.ny - 1) as f64
    }
}

fn check_axis(name: &str, values: &[f64]) -> StreamlineResult<()> {
    if values.windows(2).any(|w| !(w[1] > w[0])) {
        return Err(StreamlineError::InvalidGrid(format!(
            "'{}' must be strictly increasing",
            name
        )));
    }
    let step = (values[values.len() - 1] - values[0]) / (values.len() - 1) as f64;
    // Same tolerance as numpy.allclose
    let uneven = values
        .windows(2)
        .any(|w| ((w[1] - w[0]) - step).abs() > 1e-8 + 1e-5 * step.abs());
    if uneven {
        return Err(StreamlineError::InvalidGrid(format!(
            "'{}' values must be equally spaced",
            name
        )));
    }
    Ok(())
}

/// Occupancy mask limiting streamline density.
///
/// Each streamline marks the cells it passes through; a new streamline may not
/// enter a marked cell unless streamlines are allowed to continue through
/// occupied regions.
#[derive(Debug, Clone)]
pub struct StreamMask {
    pub nx: usize,
    pub ny: usize,
    cells: Vec<bool>,
    trajectory: Vec<(usize, usize)>,
    current: Option<(usize, usize)>,
}

/// Raised when a trajectory would enter an occupied mask cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occupied;

impl StreamMask {
    /// A `30 * density` square mask.
    pub fn new(density: f64) -> StreamlineResult<Self> {
        let n = (30.0 * density) as usize;
        if !density.is_finite() || n < 2 {
            return Err(StreamlineError::InvalidDensity(density));
        }
        Ok(Self {
            nx: n,
            ny: n,
            cells: vec![false; n * n],
            trajectory: Vec::new(),
            current: None,
        })
    }

    /// `(ny, nx)`
    pub fn shape(&self) -> (usize, usize) {
        (self.ny, self.nx)
    }

    pub fn is_occupied(&self, xm: usize, ym: usize) -> bool {
        self.cells[ym * self.nx + xm]
    }

    fn start_trajectory(&mut self, xm: usize, ym: usize, broken: bool) -> Result<(), Occupied> {
        self.trajectory.clear();
        self.update_trajectory(xm, ym, broken)
    }

    fn undo_trajectory(&mut self) {
        for &(xm, ym) in &self.trajectory {
            self.cells[ym * self.nx + xm] = false;
        }
    }

    fn update_trajectory(&mut self, xm: usize, ym: usize, broken: bool) -> Result<(), Occupied> {
        if self.current == Some((xm, ym)) {
            return Ok(());
        }
        if !self.is_occupied(xm, ym) {
            self.trajectory.push((xm, ym));
            self.cells[ym * self.nx + xm] = true;
            self.current = Some((xm, ym));
            Ok(())
        } else if broken {
            Err(Occupied)
        } else {
            Ok(())
        }
    }
}

/// Maps between data, grid and mask coordinates and owns the mask state.
#[derive(Debug, Clone)]
pub struct DomainMap {
    pub grid: Grid,
    pub mask: StreamMask,
    x_grid2mask: f64,
    y_grid2mask: f64,
    x_mask2grid: f64,
    y_mask2grid: f64,
    x_data2grid: f64,
    y_data2grid: f64,
}

impl DomainMap {
    pub fn new(grid: Grid, mask: StreamMask) -> Self {
        let x_grid2mask = (mask.nx - 1) as f64 / (grid.nx - 1) as f64;
        let y_grid2mask = (mask.ny - 1) as f64 / (grid.ny - 1) as f64;
        Self {
            x_grid2mask,
            y_grid2mask,
            x_mask2grid: 1.0 / x_grid2mask,
            y_mask2grid: 1.0 / y_grid2mask,
            x_data2grid: 1.0 / grid.dx,
            y_data2grid: 1.0 / grid.dy,
            grid,
            mask,
        }
    }

    /// Closest mask cell to a grid point (ties round to even).
    pub fn grid2mask(&self, xi: f64, yi: f64) -> (usize, usize) {
        (
            (xi * self.x_grid2mask).round_ties_even() as usize,
            (yi * self.y_grid2mask).round_ties_even() as usize,
        )
    }

    pub fn mask2grid(&self, xm: usize, ym: usize) -> (f64, f64) {
        (xm as f64 * self.x_mask2grid, ym as f64 * self.y_mask2grid)
    }

    /// Scale a data-space vector (or offset from the origin) to grid units.
    pub fn data2grid(&self, xd: f64, yd: f64) -> (f64, f64) {
        (xd * self.x_data2grid, yd * self.y_data2grid)
    }

    /// Grid point to absolute data coordinates.
    pub fn grid2data(&self, xg: f64, yg: f64) -> (f64, f64) {
        (
            xg / self.x_data2grid + self.grid.x_origin,
            yg / self.y_data2grid + self.grid.y_origin,
        )
    }

    pub(crate) fn start_trajectory(&mut self, xg: f64, yg: f64, broken: bool) -> Result<(), Occupied> {
        let (xm, ym) = self.grid2mask(xg, yg);
        self.mask.start_trajectory(xm, ym, broken)
    }

    pub(crate) fn reset_start_point(&mut self, xg: f64, yg: f64) {
        let (xm, ym) = self.grid2mask(xg, yg);
        self.mask.current = Some((xm, ym));
    }

    pub(crate) fn update_trajectory(&mut self, xg: f64, yg: f64, broken: bool) -> Result<(), Occupied> {
        if !self.grid.within_grid(xg, yg) {
            return Err(Occupied);
        }
        let (xm, ym) = self.grid2mask(xg, yg);
        self.mask.update_trajectory(xm, ym, broken)
    }

    pub(crate) fn undo_trajectory(&mut self) {
        self.mask.undo_trajectory();
    }
}
