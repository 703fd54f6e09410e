//! Coastline polylines read from GeoJSON.
//!
//! Accepts the layout of the Natural Earth coastline files (a
//! `FeatureCollection` of `LineString` features) and, more generally, any
//! line or polygon geometry. Polygon rings are treated as closed lines.
//! Point geometries are ignored.

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::info;

use crate::error::{RenderError, RenderResult};

/// A set of lon/lat polylines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Coastlines {
    pub lines: Vec<Vec<(f64, f64)>>,
}

impl Coastlines {
    pub fn from_geojson_str(text: &str) -> RenderResult<Self> {
        let value: Value = serde_json::from_str(text)?;
        let mut lines = Vec::new();
        collect_object(&value, &mut lines)?;
        Ok(Self { lines })
    }

    pub fn from_file(path: &Path) -> RenderResult<Self> {
        let text = fs::read_to_string(path)?;
        let coastlines = Self::from_geojson_str(&text)?;
        info!(
            path = %path.display(),
            lines = coastlines.lines.len(),
            points = coastlines.point_count(),
            "Loaded coastlines"
        );
        Ok(coastlines)
    }

    pub fn point_count(&self) -> usize {
        self.lines.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

fn member<'a>(value: &'a Value, key: &str) -> RenderResult<&'a Value> {
    value
        .get(key)
        .ok_or_else(|| RenderError::GeoJson(format!("missing '{}'", key)))
}

fn array<'a>(value: &'a Value, what: &str) -> RenderResult<&'a Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| RenderError::GeoJson(format!("{} must be an array", what)))
}

fn collect_object(value: &Value, lines: &mut Vec<Vec<(f64, f64)>>) -> RenderResult<()> {
    let kind = member(value, "type")?
        .as_str()
        .ok_or_else(|| RenderError::GeoJson("'type' must be a string".to_string()))?;

    match kind {
        "FeatureCollection" => {
            for feature in array(member(value, "features")?, "features")? {
                collect_object(feature, lines)?;
            }
        }
        "Feature" => match value.get("geometry") {
            Some(Value::Null) | None => {}
            Some(geometry) => collect_object(geometry, lines)?,
        },
        "GeometryCollection" => {
            for geometry in array(member(value, "geometries")?, "geometries")? {
                collect_object(geometry, lines)?;
            }
        }
        "LineString" => lines.push(line(member(value, "coordinates")?)?),
        "MultiLineString" | "Polygon" => {
            for part in array(member(value, "coordinates")?, "coordinates")? {
                lines.push(line(part)?);
            }
        }
        "MultiPolygon" => {
            for polygon in array(member(value, "coordinates")?, "coordinates")? {
                for ring in array(polygon, "polygon")? {
                    lines.push(line(ring)?);
                }
            }
        }
        "Point" | "MultiPoint" => {}
        other => {
            return Err(RenderError::GeoJson(format!("unsupported type '{}'", other)));
        }
    }
    Ok(())
}

fn line(value: &Value) -> RenderResult<Vec<(f64, f64)>> {
    array(value, "line")?
        .iter()
        .map(|position| {
            let pos = array(position, "position")?;
            match (
                pos.first().and_then(Value::as_f64),
                pos.get(1).and_then(Value::as_f64),
            ) {
                (Some(lon), Some(lat)) => Ok((lon, lat)),
                _ => Err(RenderError::GeoJson(format!("bad position {}", position))),
            }
        })
        .collect()
}
