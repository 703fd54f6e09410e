//! Key figure configuration.
//!
//! Every value has a default reproducing the published figure, so an empty
//! (or absent) YAML file yields the standard run. Relative paths are
//! resolved against the working directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use grid_common::GridAnnotation;
use netcdf_parser::LoaderConfig;
use serde::{Deserialize, Serialize};
use streamlines::{IntegrationDirection, StreamlineConfig};

/// Top-level key figure configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyFigureConfig {
    pub input: InputConfig,
    pub streamlines: StreamlineSettings,
    pub palette: PaletteConfig,
    /// Registration and coordinate type attached to the magnitude grid
    pub grid: GridAnnotation,
    pub map: MapConfig,
    pub outputs: Vec<OutputTarget>,
}

/// Input files and how to read them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// NetCDF prediction file
    pub dataset: PathBuf,
    /// GeoJSON coastlines; `None` draws no coastlines
    pub coastlines: Option<PathBuf>,
    pub loader: LoaderConfig,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            dataset: PathBuf::from("figures/predicted_SLP_U10M_V10M.nc"),
            coastlines: Some(PathBuf::from("figures/ne_110m_coastline.geojson")),
            loader: LoaderConfig::default(),
        }
    }
}

/// Streamline parameters, defaulting to the key figure's rather than the
/// library's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamlineSettings {
    pub density: f64,
    pub min_length: f64,
    pub max_length: f64,
    pub broken_streamlines: bool,
    pub integration_direction: IntegrationDirection,
}

impl Default for StreamlineSettings {
    fn default() -> Self {
        Self {
            density: 3.0,
            min_length: 0.1,
            max_length: 3.0,
            broken_streamlines: false,
            integration_direction: IntegrationDirection::Both,
        }
    }
}

impl From<&StreamlineSettings> for StreamlineConfig {
    fn from(settings: &StreamlineSettings) -> Self {
        StreamlineConfig {
            density: settings.density,
            min_length: settings.min_length,
            max_length: settings.max_length,
            broken_streamlines: settings.broken_streamlines,
            integration_direction: settings.integration_direction,
        }
    }
}

/// Colour palette for the wind speed raster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteConfig {
    pub scheme: String,
    /// `[min, max, step]`
    pub series: [f64; 3],
    pub continuous: bool,
    /// Where the CPT file is written before rendering reads it back
    pub cpt_path: PathBuf,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            scheme: "SCM/navia".to_string(),
            series: [0.0, 20.0, 1.0],
            continuous: true,
            cpt_path: PathBuf::from("figures/cmap_wind_magnitude.cpt"),
        }
    }
}

/// Map frame and line styles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// `[west, east, south, north]`
    pub region: [f64; 4],
    pub projection: String,
    pub coast_pen: String,
    pub streamline_pen: String,
    /// Percent, 0 opaque
    pub streamline_transparency: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            region: [-180.0, 180.0, -90.0, 90.0],
            projection: "G100/-30/30c".to_string(),
            coast_pen: "faint".to_string(),
            streamline_pen: "0.05p,#bebebe,solid".to_string(),
            streamline_transparency: 45.0,
        }
    }
}

/// One exported file. The format follows the extension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputTarget {
    pub path: PathBuf,
    pub dpi: u32,
    /// Upper bound on the resolution of rasters embedded in a PDF; unset
    /// embeds them at `dpi`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_raster_dpi: Option<u32>,
}

impl OutputTarget {
    pub fn new(path: impl Into<PathBuf>, dpi: u32) -> Self {
        Self {
            path: path.into(),
            dpi,
            max_raster_dpi: None,
        }
    }

    pub fn with_max_raster_dpi(mut self, max_raster_dpi: u32) -> Self {
        self.max_raster_dpi = Some(max_raster_dpi);
        self
    }
}

impl Default for KeyFigureConfig {
    fn default() -> Self {
        Self {
            input: InputConfig::default(),
            streamlines: StreamlineSettings::default(),
            palette: PaletteConfig::default(),
            grid: GridAnnotation::default(),
            map: MapConfig::default(),
            outputs: vec![
                OutputTarget::new("figures/key_figure.png", 300),
                OutputTarget::new("figures/key_figure.pdf", 600),
            ],
        }
    }
}

impl KeyFigureConfig {
    /// Parse YAML; missing sections and fields keep their defaults.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).context("Invalid key figure configuration")
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&text).with_context(|| format!("In {}", path.display()))
    }

    /// Load `path` if given, otherwise use the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_yaml_file(path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_common::{CoordinateType, Registration};

    #[test]
    fn test_defaults_match_key_figure() {
        let config = KeyFigureConfig::default();
        assert_eq!(
            config.input.dataset,
            PathBuf::from("figures/predicted_SLP_U10M_V10M.nc")
        );
        assert_eq!(config.input.loader.u_variable, "U10M");
        assert_eq!(config.input.loader.expected_shape.lat, 360);
        assert_eq!(config.streamlines.density, 3.0);
        assert!(!config.streamlines.broken_streamlines);
        assert_eq!(config.palette.series, [0.0, 20.0, 1.0]);
        assert_eq!(config.grid.registration, Registration::Pixel);
        assert_eq!(config.grid.coordinate_type, CoordinateType::Geographic);
        assert_eq!(config.map.projection, "G100/-30/30c");
        assert_eq!(config.map.streamline_transparency, 45.0);
        assert_eq!(config.outputs.len(), 2);
        assert_eq!(config.outputs[1].dpi, 600);
        assert_eq!(config.outputs[1].max_raster_dpi, None);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(
            KeyFigureConfig::from_yaml_str("").unwrap(),
            KeyFigureConfig::default()
        );
        assert_eq!(
            KeyFigureConfig::from_yaml_str("{}").unwrap(),
            KeyFigureConfig::default()
        );
    }

    #[test]
    fn test_shipped_yaml_is_default() {
        let config =
            KeyFigureConfig::from_yaml_str(include_str!("../config/key_figure.yaml")).unwrap();
        assert_eq!(config, KeyFigureConfig::default());
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let yaml = r#"
streamlines:
  density: 1.5
map:
  projection: G0/0/10c
outputs:
  - path: out/figure.png
    dpi: 72
"#;
        let config = KeyFigureConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.streamlines.density, 1.5);
        assert_eq!(config.streamlines.max_length, 3.0);
        assert_eq!(config.map.projection, "G0/0/10c");
        assert_eq!(config.map.coast_pen, "faint");
        assert_eq!(config.outputs, vec![OutputTarget::new("out/figure.png", 72)]);
        assert_eq!(config.palette, PaletteConfig::default());
    }

    #[test]
    fn test_output_raster_limit() {
        let yaml = r#"
outputs:
  - path: out/figure.pdf
    dpi: 600
    max_raster_dpi: 300
"#;
        let config = KeyFigureConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(
            config.outputs,
            vec![OutputTarget::new("out/figure.pdf", 600).with_max_raster_dpi(300)]
        );
    }

    #[test]
    fn test_streamline_settings_conversion() {
        let config: StreamlineConfig = (&StreamlineSettings::default()).into();
        assert_eq!(config.density, 3.0);
        assert_eq!(config.min_length, 0.1);
        assert_eq!(config.max_length, 3.0);
        assert!(!config.broken_streamlines);
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(KeyFigureConfig::from_yaml_str("streamlines: [1, 2]").is_err());
        assert!(KeyFigureConfig::from_yaml_file(Path::new("/nonexistent/kf.yaml")).is_err());
    }
}
