//! Region boundaries.
//!
//! Geocoding a place name into a polygon is left to external tools; a
//! sweep consumes the resulting boundary as GeoJSON.

use crate::error::{Result, SweepError};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use geojson::{GeoJson, Geometry, Value};
use std::path::Path;

/// Supplies the polygon a sweep should cover.
pub trait BoundaryProvider {
    fn boundary(&self) -> Result<MultiPolygon<f64>>;
}

impl BoundaryProvider for MultiPolygon<f64> {
    fn boundary(&self) -> Result<MultiPolygon<f64>> {
        Ok(self.clone())
    }
}

/// A boundary read from a GeoJSON geometry, feature or feature collection.
///
/// Every `Polygon` and `MultiPolygon` in the document is merged into a single
/// `MultiPolygon`; other geometry types are skipped. With
/// [`GeoJsonBoundary::with_feature_name`] only features whose `name` property
/// matches are used.
#[derive(Debug, Clone)]
pub struct GeoJsonBoundary {
    document: GeoJson,
    feature_name: Option<String>,
}

impl GeoJsonBoundary {
    pub fn parse(geojson: &str) -> Result<Self> {
        let document = geojson
            .parse::<GeoJson>()
            .map_err(|e| SweepError::InvalidInput(format!("Failed to parse GeoJSON: {}", e)))?;
        Ok(Self {
            document,
            feature_name: None,
        })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Restrict the boundary to features whose `name` property equals `name`.
    pub fn with_feature_name(mut self, name: impl Into<String>) -> Self {
        self.feature_name = Some(name.into());
        self
    }

    fn geometries(&self) -> Vec<&Geometry> {
        let name_matches = |properties: Option<&geojson::JsonObject>| match &self.feature_name {
            None => true,
            Some(wanted) => properties
                .and_then(|props| props.get("name"))
                .and_then(|name| name.as_str())
                .is_some_and(|name| name == wanted),
        };

        match &self.document {
            GeoJson::Geometry(geometry) => {
                if self.feature_name.is_some() {
                    Vec::new()
                } else {
                    vec![geometry]
                }
            }
            GeoJson::Feature(feature) => feature
                .geometry
                .as_ref()
                .filter(|_| name_matches(feature.properties.as_ref()))
                .into_iter()
                .collect(),
            GeoJson::FeatureCollection(collection) => collection
                .features
                .iter()
                .filter(|feature| name_matches(feature.properties.as_ref()))
                .filter_map(|feature| feature.geometry.as_ref())
                .collect(),
        }
    }
}

impl BoundaryProvider for GeoJsonBoundary {
    fn boundary(&self) -> Result<MultiPolygon<f64>> {
        let mut polygons = Vec::new();
        for geometry in self.geometries() {
            collect_polygons(&geometry.value, &mut polygons)?;
        }

        if polygons.is_empty() {
            return Err(SweepError::InvalidInput(match &self.feature_name {
                Some(name) => format!("No polygon geometry found for feature '{}'", name),
                None => "GeoJSON document contains no polygon geometry".to_string(),
            }));
        }

        Ok(MultiPolygon::new(polygons))
    }
}

fn collect_polygons(value: &Value, out: &mut Vec<Polygon<f64>>) -> Result<()> {
    match value {
        Value::Polygon(rings) => out.push(polygon_from_rings(rings)?),
        Value::MultiPolygon(polygons) => {
            for rings in polygons {
                out.push(polygon_from_rings(rings)?);
            }
        }
        Value::GeometryCollection(geometries) => {
            for geometry in geometries {
                collect_polygons(&geometry.value, out)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn polygon_from_rings(rings: &[Vec<Vec<f64>>]) -> Result<Polygon<f64>> {
    let Some((exterior, interiors)) = rings.split_first() else {
        return Err(SweepError::InvalidInput(
            "Polygon must have at least one ring".to_string(),
        ));
    };

    let interiors = interiors
        .iter()
        .map(|ring| ring_from_positions(ring))
        .collect::<Result<Vec<_>>>()?;

    Ok(Polygon::new(ring_from_positions(exterior)?, interiors))
}

fn ring_from_positions(positions: &[Vec<f64>]) -> Result<LineString<f64>> {
    positions
        .iter()
        .map(|position| match position.as_slice() {
            [x, y, ..] => Ok(Coord { x: *x, y: *y }),
            _ => Err(SweepError::InvalidInput(
                "Coordinate must have at least 2 values".to_string(),
            )),
        })
        .collect::<Result<Vec<_>>>()
        .map(LineString::from)
}
