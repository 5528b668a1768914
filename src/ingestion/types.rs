//! GeoJSON Data Types
//!
//! The subset of GeoJSON the server stores and serves: features with a geometry,
//! an identifier and an open property map, plus the collection wrapper used for
//! both source files and query responses.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// A GeoJSON position: `[longitude, latitude, (altitude)]`.
pub type Position = Vec<f64>;

/// Geometry of a stored record. GeometryCollection is not supported.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Position },
    MultiPoint { coordinates: Vec<Position> },
    LineString { coordinates: Vec<Position> },
    MultiLineString { coordinates: Vec<Vec<Position>> },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
}

#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("position must have at least two coordinates")]
    ShortPosition,
    #[error("geometry has no coordinates")]
    Empty,
}

impl Geometry {
    /// First `(lng, lat)` pair of the geometry, used as the reference point
    /// for distance annotation.
    pub fn first_position(&self) -> Option<(f64, f64)> {
        let first = match self {
            Geometry::Point { coordinates } => Some(coordinates),
            Geometry::MultiPoint { coordinates } | Geometry::LineString { coordinates } => {
                coordinates.first()
            }
            Geometry::MultiLineString { coordinates } | Geometry::Polygon { coordinates } => {
                coordinates.iter().flatten().next()
            }
            Geometry::MultiPolygon { coordinates } => coordinates.iter().flatten().flatten().next(),
        }?;

        match first.as_slice() {
            [lng, lat, ..] => Some((*lng, *lat)),
            _ => None,
        }
    }

    /// Converts into a `geo` geometry for containment checks.
    pub fn to_geo(&self) -> Result<geo::Geometry<f64>, GeometryError> {
        let geometry = match self {
            Geometry::Point { coordinates } => geo::Geometry::Point(coord(coordinates)?.into()),
            Geometry::MultiPoint { coordinates } => {
                non_empty(coordinates)?;
                let points = coordinates
                    .iter()
                    .map(|p| coord(p).map(geo::Point::from))
                    .collect::<Result<Vec<_>, _>>()?;
                geo::Geometry::MultiPoint(geo::MultiPoint::new(points))
            }
            Geometry::LineString { coordinates } => {
                geo::Geometry::LineString(line_string(coordinates)?)
            }
            Geometry::MultiLineString { coordinates } => {
                non_empty(coordinates)?;
                let lines = coordinates
                    .iter()
                    .map(|line| line_string(line))
                    .collect::<Result<Vec<_>, _>>()?;
                geo::Geometry::MultiLineString(geo::MultiLineString::new(lines))
            }
            Geometry::Polygon { coordinates } => geo::Geometry::Polygon(polygon(coordinates)?),
            Geometry::MultiPolygon { coordinates } => {
                non_empty(coordinates)?;
                let polygons = coordinates
                    .iter()
                    .map(|rings| polygon(rings))
                    .collect::<Result<Vec<_>, _>>()?;
                geo::Geometry::MultiPolygon(geo::MultiPolygon::new(polygons))
            }
        };
        Ok(geometry)
    }
}

fn non_empty<T>(items: &[T]) -> Result<(), GeometryError> {
    if items.is_empty() {
        return Err(GeometryError::Empty);
    }
    Ok(())
}

fn coord(position: &Position) -> Result<geo::Coord<f64>, GeometryError> {
    match position.as_slice() {
        [x, y, ..] => Ok(geo::Coord { x: *x, y: *y }),
        _ => Err(GeometryError::ShortPosition),
    }
}

fn line_string(positions: &[Position]) -> Result<geo::LineString<f64>, GeometryError> {
    non_empty(positions)?;
    let coords = positions.iter().map(coord).collect::<Result<Vec<_>, _>>()?;
    Ok(geo::LineString::new(coords))
}

fn polygon(rings: &[Vec<Position>]) -> Result<geo::Polygon<f64>, GeometryError> {
    let (exterior, interiors) = rings.split_first().ok_or(GeometryError::Empty)?;
    let interiors = interiors
        .iter()
        .map(|ring| line_string(ring))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(geo::Polygon::new(line_string(exterior)?, interiors))
}

/// The `"type": "Feature"` marker.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum FeatureType {
    #[default]
    Feature,
}

/// The `"type": "FeatureCollection"` marker.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum CollectionType {
    #[default]
    FeatureCollection,
}

/// A geo-tagged record: identifier, geometry and arbitrary properties.
///
/// Records are immutable once inserted into an index; query results are
/// copies read back from the index's backing store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Feature {
    #[serde(rename = "type", default)]
    pub kind: FeatureType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub geometry: Geometry,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub properties: Map<String, Value>,
}

impl Feature {
    /// The lookup key of this feature: string ids as-is, numeric ids in
    /// their decimal form. Any other id shape has no key.
    pub fn key(&self) -> Option<String> {
        match self.id.as_ref()? {
            Value::String(id) => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureCollection {
    #[serde(rename = "type", default)]
    pub kind: CollectionType,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: CollectionType::FeatureCollection,
            features,
        }
    }
}

/// Top-level shape accepted in a source file.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum SourceDocument {
    FeatureCollection { features: Vec<Feature> },
    Feature(Feature),
}

impl SourceDocument {
    pub fn into_features(self) -> Vec<Feature> {
        match self {
            SourceDocument::FeatureCollection { features } => features,
            SourceDocument::Feature(feature) => vec![feature],
        }
    }
}
