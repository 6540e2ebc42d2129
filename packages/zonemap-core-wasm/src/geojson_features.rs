use geo_types::{Coord, LineString};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::console_warn;
use crate::error::MapError;

/// One ring of (lon, lat) vertices, as authored in the source data.
pub type Ring = LineString<f64>;

/// Polygon shape decided once at ingest from the nesting depth of the raw
/// coordinates.
///
/// Each polygon is a list of rings: the first is the exterior, any further
/// rings are holes.
#[derive(Debug, Clone, PartialEq)]
pub enum ZoneShape {
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
}

impl ZoneShape {
    pub fn empty() -> Self {
        ZoneShape::MultiPolygon(Vec::new())
    }

    /// Exterior rings in authoring order. Holes are not returned.
    pub fn exterior_rings(&self) -> Vec<&Ring> {
        match self {
            ZoneShape::Polygon(rings) => rings.first().into_iter().collect(),
            ZoneShape::MultiPolygon(polygons) => {
                polygons.iter().filter_map(|rings| rings.first()).collect()
            }
        }
    }
}

/// A raw feature: shape plus the untouched property bag.
#[derive(Debug, Clone)]
pub struct GeoFeature {
    pub shape: ZoneShape,
    pub properties: Map<String, Value>,
}

impl GeoFeature {
    pub fn new(shape: ZoneShape, properties: Map<String, Value>) -> Self {
        Self { shape, properties }
    }
}

// GeoJSON-like feature structure
#[derive(Deserialize)]
struct RawFeatureCollection {
    r#type: String,
    #[serde(default)]
    features: Vec<RawFeature>,
}

#[derive(Deserialize)]
struct RawFeature {
    #[serde(default)]
    geometry: Option<RawGeometry>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

// The declared `type` is ignored; the shape comes from the nesting depth.
#[derive(Deserialize)]
struct RawGeometry {
    #[serde(default)]
    coordinates: Value,
}

/// Parse a GeoJSON FeatureCollection that the host already fetched.
///
/// Features without usable geometry are kept with an empty shape so their
/// records still reach the registry.
pub fn parse_feature_collection(json: &str) -> Result<Vec<GeoFeature>, MapError> {
    let collection: RawFeatureCollection = serde_json::from_str(json)?;
    if collection.r#type != "FeatureCollection" {
        return Err(MapError::NotFeatureCollection(collection.r#type));
    }

    let features = collection
        .features
        .into_iter()
        .map(|raw| {
            let shape = raw
                .geometry
                .map(|g| shape_from_coordinates(&g.coordinates))
                .unwrap_or_else(ZoneShape::empty);
            GeoFeature::new(shape, raw.properties.unwrap_or_default())
        })
        .collect();

    Ok(features)
}

/// Decide polygon vs multi-polygon by looking at `coordinates[0][0][0]`:
/// if that is itself an array, the input nests one level deeper.
pub fn shape_from_coordinates(coordinates: &Value) -> ZoneShape {
    let Some(polygons) = coordinates.as_array() else {
        console_warn!("Geometry coordinates are not an array, skipping shape");
        return ZoneShape::empty();
    };

    let is_multi = polygons
        .first()
        .and_then(Value::as_array)
        .and_then(|rings| rings.first())
        .and_then(Value::as_array)
        .and_then(|ring| ring.first())
        .is_some_and(Value::is_array);

    if is_multi {
        ZoneShape::MultiPolygon(polygons.iter().map(parse_rings).collect())
    } else {
        ZoneShape::Polygon(parse_rings(coordinates))
    }
}

fn parse_rings(value: &Value) -> Vec<Ring> {
    value
        .as_array()
        .map(|rings| rings.iter().map(parse_ring).collect())
        .unwrap_or_default()
}

fn parse_ring(value: &Value) -> Ring {
    let Some(points) = value.as_array() else {
        return LineString::new(Vec::new());
    };

    let mut coords = Vec::with_capacity(points.len());
    let mut dropped = 0usize;
    for point in points {
        match parse_position(point) {
            Some(coord) => coords.push(coord),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        console_warn!("Dropped {} malformed vertices from ring", dropped);
    }

    LineString::new(coords)
}

fn parse_position(value: &Value) -> Option<Coord<f64>> {
    let pair = value.as_array()?;
    let lon = pair.first()?.as_f64()?;
    let lat = pair.get(1)?.as_f64()?;
    if !lon.is_finite() || !lat.is_finite() {
        return None;
    }
    Some(Coord { x: lon, y: lat })
}
