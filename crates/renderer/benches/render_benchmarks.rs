//! Benchmarks for the renderer crate - raster colouring and figure export.
//!
//! Run with: cargo bench --package renderer -- raster
//! Or: cargo bench --package renderer --bench render_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use grid_common::{AnnotatedGrid, BoundingBox, GridAnnotation, ScalarField};
use projection::MapProjection;
use renderer::{gradient, make_cpt, png, ColorScheme, Figure, OutputFormat, Pen, Series};
use test_utils::{prediction_lat, prediction_lon, vortex_wind};

/// Wind magnitude on the prediction grid, swirling around Australia.
fn magnitude_grid() -> AnnotatedGrid {
    let lon = prediction_lon();
    let lat = prediction_lat();
    let wind = vortex_wind(lon.clone(), lat.clone(), 135.0, -25.0, 0.2);
    let field = ScalarField::new("magnitude", lon, lat, wind.magnitude())
        .expect("prediction grid is consistent");
    AnnotatedGrid::new(field, GridAnnotation::default())
}

// =============================================================================
// RASTER BENCHMARKS
// =============================================================================

fn bench_render_raster(c: &mut Criterion) {
    let mut group = c.benchmark_group("raster");

    let grid = magnitude_grid();
    let palette = make_cpt(
        &ColorScheme::by_name("SCM/navia").unwrap(),
        &Series::new(0.0, 20.0, 1.0).unwrap(),
        true,
    );
    let region = BoundingBox::global();

    for width in ["5c", "10c", "30c"] {
        let projection = MapProjection::parse(&format!("G100/-30/{}", width)).unwrap();
        let px = projection.width.pixels(72) as usize;

        group.throughput(Throughput::Elements((px * px) as u64));
        group.bench_with_input(BenchmarkId::new("orthographic", width), &px, |b, &px| {
            b.iter(|| {
                gradient::render_raster(
                    black_box(&grid),
                    &palette,
                    &projection,
                    &region,
                    px,
                    px,
                )
            });
        });
    }

    group.finish();
}

// =============================================================================
// PNG ENCODING BENCHMARKS
// =============================================================================

fn bench_png_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("png_encode");

    for size in [256usize, 1024] {
        let pixels: Vec<u8> = (0..size * size * 4).map(|i| (i % 253) as u8).collect();
        group.throughput(Throughput::Bytes(pixels.len() as u64));
        group.bench_with_input(BenchmarkId::new("rgba", size), &pixels, |b, pixels| {
            b.iter(|| png::create_png_with_dpi(black_box(pixels), size, size, Some(300)));
        });
    }

    group.finish();
}

// =============================================================================
// FIGURE EXPORT BENCHMARKS
// =============================================================================

fn bench_figure_export(c: &mut Criterion) {
    let mut group = c.benchmark_group("figure_export");
    group.sample_size(10);

    let mut figure = Figure::new(
        BoundingBox::global(),
        MapProjection::parse("G100/-30/10c").unwrap(),
    );
    let pen = Pen::parse("0.05p,#bebebe,solid").unwrap();
    for i in 0..2000 {
        let lat = -80.0 + (i % 160) as f64;
        let lon0 = (i / 160) as f64 * 28.0 - 180.0;
        let line: Vec<(f64, f64)> = (0..40).map(|k| (lon0 + k as f64 * 0.5, lat)).collect();
        figure.plot(&line, &pen, 45.0).unwrap();
    }

    for format in [OutputFormat::Png, OutputFormat::Pdf] {
        group.bench_function(BenchmarkId::new("streamlines", format!("{:?}", format)), |b| {
            b.iter(|| figure.encode(black_box(format), 150).unwrap());
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_render_raster,
    bench_png_encode,
    bench_figure_export
);
criterion_main!(benches);
