//! The key figure pipeline.
//!
//! Stages run strictly in order, each consuming the previous one's output:
//! load wind fields, extract streamlines, prepare the palette and grid,
//! compose the figure, export it. Any error aborts the run; files written by
//! earlier stages are left in place.

use std::time::Instant;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use grid_common::{annotate, AnnotatedGrid, BoundingBox};
use netcdf_parser::{load_wind_fields, WindFields};
use projection::MapProjection;
use renderer::{
    make_cpt, ColorPalette, ColorScheme, Coastlines, Figure, OutputFormat, Pen, SavedFigure,
    Series,
};
use streamlines::{extract_streamlines, Streamline, StreamlineConfig};
use tracing::{debug, info};

use crate::config::KeyFigureConfig;

/// Map settings parsed from the configuration strings.
#[derive(Debug, Clone)]
pub struct MapStyle {
    pub region: BoundingBox,
    pub projection: MapProjection,
    pub coast_pen: Pen,
    pub streamline_pen: Pen,
    pub streamline_transparency: f64,
}

impl MapStyle {
    pub fn from_config(config: &KeyFigureConfig) -> Result<Self> {
        let map = &config.map;
        let region = BoundingBox::from_wesn(map.region).context("Invalid map region")?;
        let projection =
            MapProjection::parse(&map.projection).context("Invalid map projection")?;
        let coast_pen = Pen::parse(&map.coast_pen).context("Invalid coastline pen")?;
        let streamline_pen = Pen::parse(&map.streamline_pen).context("Invalid streamline pen")?;
        if !(0.0..=100.0).contains(&map.streamline_transparency) {
            bail!(
                "Streamline transparency {} is outside 0-100",
                map.streamline_transparency
            );
        }

        Ok(Self {
            region,
            projection,
            coast_pen,
            streamline_pen,
            streamline_transparency: map.streamline_transparency,
        })
    }
}

/// What a run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub timestamp: Option<DateTime<Utc>>,
    pub magnitude_range: Option<(f32, f32)>,
    pub streamline_count: usize,
    pub streamline_points: usize,
    pub palette_slices: usize,
    pub outputs: Vec<SavedFigure>,
}

pub struct KeyFigurePipeline {
    config: KeyFigureConfig,
    style: MapStyle,
}

impl KeyFigurePipeline {
    /// Validate the configuration. Nothing is read or written yet.
    pub fn new(config: KeyFigureConfig) -> Result<Self> {
        let style = MapStyle::from_config(&config)?;

        ColorScheme::by_name(&config.palette.scheme).context("Invalid palette scheme")?;
        Series::from_array(config.palette.series).context("Invalid palette series")?;
        if config.outputs.is_empty() {
            bail!("No outputs configured");
        }
        for output in &config.outputs {
            OutputFormat::from_path(&output.path)
                .with_context(|| format!("Invalid output {}", output.path.display()))?;
            if output.dpi == 0 || output.max_raster_dpi == Some(0) {
                bail!("Output {} has a dpi of 0", output.path.display());
            }
        }

        Ok(Self { config, style })
    }

    pub fn config(&self) -> &KeyFigureConfig {
        &self.config
    }

    pub fn style(&self) -> &MapStyle {
        &self.style
    }

    /// Read U and V at the configured time and derive the wind speed.
    ///
    /// Fails on a grid of unexpected shape before anything else runs.
    pub fn load(&self) -> Result<WindFields> {
        let input = &self.config.input;
        let fields = load_wind_fields(&input.dataset, &input.loader)
            .with_context(|| format!("Failed to load {}", input.dataset.display()))?;
        info!(
            path = %input.dataset.display(),
            ny = fields.magnitude.ny(),
            nx = fields.magnitude.nx(),
            "Loaded wind fields"
        );
        Ok(fields)
    }

    pub fn extract(&self, fields: &WindFields) -> Result<Vec<Streamline>> {
        let config = StreamlineConfig::from(&self.config.streamlines);
        let start = Instant::now();
        let lines = extract_streamlines(
            &fields.u.lon,
            &fields.u.lat,
            &fields.u.values,
            &fields.v.values,
            &config,
        )
        .context("Streamline extraction failed")?;

        info!(
            streamlines = lines.len(),
            points = lines.iter().map(Streamline::len).sum::<usize>(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Extracted streamlines"
        );
        Ok(lines)
    }

    /// Write the palette file, read it back, and annotate the speed grid.
    pub fn prepare(&self, fields: &WindFields) -> Result<(AnnotatedGrid, ColorPalette)> {
        let palette_config = &self.config.palette;
        let scheme = ColorScheme::by_name(&palette_config.scheme)?;
        let series = Series::from_array(palette_config.series)?;

        let palette = make_cpt(&scheme, &series, palette_config.continuous);
        palette.write(&palette_config.cpt_path).with_context(|| {
            format!(
                "Failed to write palette {}",
                palette_config.cpt_path.display()
            )
        })?;
        let palette = ColorPalette::from_file(&palette_config.cpt_path)
            .context("Failed to read back the palette")?;

        let grid = annotate(fields.magnitude.clone(), self.config.grid);
        debug!(
            registration = ?grid.annotation.registration,
            coordinate_type = ?grid.annotation.coordinate_type,
            "Annotated wind speed grid"
        );
        Ok((grid, palette))
    }

    /// Raster, then coastlines, then streamlines.
    pub fn compose(
        &self,
        grid: &AnnotatedGrid,
        palette: &ColorPalette,
        lines: &[Streamline],
    ) -> Result<Figure> {
        let style = &self.style;
        let mut figure = Figure::new(style.region, style.projection);

        figure.grdimage(grid, palette);

        if let Some(path) = &self.config.input.coastlines {
            let coastlines = Coastlines::from_file(path)
                .with_context(|| format!("Failed to read coastlines {}", path.display()))?;
            figure.coast(&coastlines, &style.coast_pen);
        }

        for line in lines {
            let points: Vec<(f64, f64)> = line.points.iter().map(|p| (p.x, p.y)).collect();
            figure.plot(&points, &style.streamline_pen, style.streamline_transparency)?;
        }

        info!(
            projection = %style.projection,
            layers = figure.layer_count(),
            visible_lines = figure.line_count(),
            "Composed figure"
        );
        Ok(figure)
    }

    pub fn export(&self, figure: &Figure) -> Result<Vec<SavedFigure>> {
        self.config
            .outputs
            .iter()
            .map(|output| {
                figure
                    .savefig_with_raster_limit(&output.path, output.dpi, output.max_raster_dpi)
                    .with_context(|| format!("Failed to save {}", output.path.display()))
            })
            .collect()
    }

    /// Run every stage once.
    pub fn run(&self) -> Result<RunSummary> {
        let start = Instant::now();

        let fields = self.load()?;
        let lines = self.extract(&fields)?;
        let (grid, palette) = self.prepare(&fields)?;
        let figure = self.compose(&grid, &palette, &lines)?;
        let outputs = self.export(&figure)?;

        let summary = RunSummary {
            timestamp: fields.timestamp,
            magnitude_range: fields.magnitude.min_max(),
            streamline_count: lines.len(),
            streamline_points: lines.iter().map(Streamline::len).sum(),
            palette_slices: palette.slices.len(),
            outputs,
        };
        info!(
            outputs = summary.outputs.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Key figure complete"
        );
        Ok(summary)
    }
}

/// Validate `config` and run the pipeline.
pub fn run(config: KeyFigureConfig) -> Result<RunSummary> {
    KeyFigurePipeline::new(config)?.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputTarget;

    #[test]
    fn test_default_style() {
        let style = MapStyle::from_config(&KeyFigureConfig::default()).unwrap();
        assert!(style.region.is_global_longitude());
        assert!(style.coast_pen.is_hairline());
        assert_eq!(style.streamline_pen.to_string(), "0.05p,#bebebe,solid");
        assert_eq!(style.streamline_transparency, 45.0);
    }

    #[test]
    fn test_invalid_map_settings() {
        let mut config = KeyFigureConfig::default();
        config.map.projection = "M10c".to_string();
        assert!(KeyFigurePipeline::new(config).is_err());

        let mut config = KeyFigureConfig::default();
        config.map.streamline_transparency = 150.0;
        assert!(KeyFigurePipeline::new(config).is_err());

        let mut config = KeyFigureConfig::default();
        config.map.region = [10.0, 0.0, -90.0, 90.0];
        assert!(KeyFigurePipeline::new(config).is_err());
    }

    #[test]
    fn test_invalid_outputs() {
        let mut config = KeyFigureConfig::default();
        config.outputs = vec![OutputTarget::new("figures/key_figure.jpg", 300)];
        assert!(KeyFigurePipeline::new(config).is_err());

        let mut config = KeyFigureConfig::default();
        config.outputs.clear();
        assert!(KeyFigurePipeline::new(config).is_err());

        let mut config = KeyFigureConfig::default();
        config.outputs[0].dpi = 0;
        assert!(KeyFigurePipeline::new(config).is_err());

        let mut config = KeyFigureConfig::default();
        config.outputs[1].max_raster_dpi = Some(0);
        assert!(KeyFigurePipeline::new(config).is_err());
    }

    #[test]
    fn test_invalid_palette() {
        let mut config = KeyFigureConfig::default();
        config.palette.scheme = "SCM/nonexistent".to_string();
        assert!(KeyFigurePipeline::new(config).is_err());

        let mut config = KeyFigureConfig::default();
        config.palette.series = [20.0, 0.0, 1.0];
        assert!(KeyFigurePipeline::new(config).is_err());
    }
}
