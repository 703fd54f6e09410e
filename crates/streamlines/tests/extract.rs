//! End-to-end streamline extraction over synthetic wind fields.

use streamlines::{extract_streamlines, IntegrationDirection, StreamlineConfig, StreamlineError};
use test_utils::{assert_approx_eq, axis, uniform_wind, vortex_wind, zero_wind, WindGrid};

fn key_figure_config() -> StreamlineConfig {
    StreamlineConfig {
        density: 3.0,
        min_length: 0.1,
        max_length: 3.0,
        broken_streamlines: false,
        integration_direction: IntegrationDirection::Both,
    }
}

fn run(grid: &WindGrid, config: &StreamlineConfig) -> Vec<streamlines::Streamline> {
    extract_streamlines(&grid.lon, &grid.lat, &grid.u, &grid.v, config).unwrap()
}

#[test]
fn test_extraction_is_deterministic() {
    let grid = vortex_wind(axis(61, 60.0, 1.0), axis(41, -50.0, 1.0), 90.0, -30.0, 0.2);
    let first = run(&grid, &key_figure_config());
    let second = run(&grid, &key_figure_config());
    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn test_zero_field_gives_no_streamlines() {
    let grid = zero_wind(axis(41, 0.0, 1.0), axis(21, 0.0, 1.0));
    assert!(run(&grid, &key_figure_config()).is_empty());
}

#[test]
fn test_uniform_eastward_field_gives_horizontal_lines() {
    let grid = uniform_wind(axis(41, 0.0, 1.0), axis(21, -10.0, 1.0), 1.0, 0.0);
    let config = StreamlineConfig {
        density: 1.0,
        ..key_figure_config()
    };
    let lines = run(&grid, &config);
    assert!(!lines.is_empty());

    for line in &lines {
        let y0 = line.points[0].y;
        assert!(line.points.iter().all(|p| p.y == y0));
        // Each line crosses the whole domain
        let min_x = line.points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let max_x = line.points.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        assert_approx_eq!(min_x, 0.0, 1e-6);
        assert_approx_eq!(max_x, 40.0, 1e-6);
    }

    let mut rows: Vec<f64> = lines.iter().map(|l| l.points[0].y).collect();
    rows.sort_by(f64::total_cmp);
    rows.dedup();
    // One row of lines per mask row, edge rows may fall just outside the grid
    assert!((28..=30).contains(&rows.len()), "{} rows", rows.len());
}

#[test]
fn test_points_stay_inside_the_grid() {
    let grid = vortex_wind(axis(61, 60.0, 1.0), axis(41, -50.0, 1.0), 85.0, -35.0, 0.5);
    for line in run(&grid, &key_figure_config()) {
        assert!(line.len() >= 2);
        for p in &line.points {
            assert!((60.0 - 1e-9..=120.0 + 1e-9).contains(&p.x), "x = {}", p.x);
            assert!((-50.0 - 1e-9..=-10.0 + 1e-9).contains(&p.y), "y = {}", p.y);
        }
    }
}

#[test]
fn test_min_length_filters_short_lines() {
    // Forward-only lines seeded near the east edge are short
    let grid = uniform_wind(axis(41, 0.0, 1.0), axis(21, 0.0, 1.0), 1.0, 0.0);
    let forward = StreamlineConfig {
        integration_direction: IntegrationDirection::Forward,
        ..key_figure_config()
    };
    let short = run(&grid, &forward);
    let long_only = run(
        &grid,
        &StreamlineConfig {
            min_length: 0.5,
            ..forward
        },
    );
    assert!(!long_only.is_empty());
    assert!(long_only.len() < short.len());
    // Half the domain width is 20 degrees
    assert!(long_only.iter().all(|l| l.arc_length() > 19.9));
}

#[test]
fn test_nan_values_stop_streamlines() {
    // Eastward flow with a column of missing data at x = 20
    let grid = WindGrid::from_fn(axis(41, 0.0, 1.0), axis(21, 0.0, 1.0), |x, _| {
        if x == 20.0 {
            (f32::NAN, f32::NAN)
        } else {
            (1.0, 0.0)
        }
    });
    let lines = run(&grid, &key_figure_config());
    assert!(!lines.is_empty());
    for line in &lines {
        let left = line.points.iter().all(|p| p.x < 20.0);
        let right = line.points.iter().all(|p| p.x > 19.0);
        assert!(left || right);
    }
}

#[test]
fn test_forward_only_starts_downstream() {
    let grid = uniform_wind(axis(41, 0.0, 1.0), axis(21, 0.0, 1.0), 1.0, 0.0);
    let config = StreamlineConfig {
        integration_direction: IntegrationDirection::Forward,
        ..key_figure_config()
    };
    for line in run(&grid, &config) {
        assert!(line.points.windows(2).all(|w| w[1].x >= w[0].x));
    }
}

#[test]
fn test_invalid_inputs() {
    let grid = uniform_wind(axis(11, 0.0, 1.0), axis(11, 0.0, 1.0), 1.0, 0.0);
    let bad_density = StreamlineConfig {
        density: 0.0,
        ..key_figure_config()
    };
    assert!(matches!(
        extract_streamlines(&grid.lon, &grid.lat, &grid.u, &grid.v, &bad_density),
        Err(StreamlineError::InvalidDensity(_))
    ));

    let mut uneven = grid.lon.clone();
    uneven[5] = 5.5;
    assert!(matches!(
        extract_streamlines(&uneven, &grid.lat, &grid.u, &grid.v, &key_figure_config()),
        Err(StreamlineError::InvalidGrid(_))
    ));
}
