use rayon::prelude::*;
use serde_json::{Map, Value};

use crate::color::{safety_color, Color};
use crate::config::{DefaultLabels, MapConfig};
use crate::console_log;
use crate::geojson_features::GeoFeature;
use crate::models::{
    CrimeTally, HighlightKind, Material, MaterialUpdate, ObjectId, Record, Treatment,
};
use crate::polygon_geometry::{build_zone_mesh, Aabb, BufferGeometry};
use crate::projection::CoordinateProjector;

const CODE_KEYS: &[&str] = &["postalCode", "zipcode", "ZIPCODE"];
const NEIGHBORHOOD_KEYS: &[&str] = &["neighborhood", "PO_NAME"];
const BOROUGH_KEYS: &[&str] = &["borough", "COUNTY"];
const CRIME_WEIGHT_KEYS: &[&str] = &["weightedCrimeVal"];
const SAFETY_SCORE_KEYS: &[&str] = &["safetyScore"];
const PRECINCT_KEYS: &[&str] = &["precinct"];
const CRIME_COUNT_KEYS: &[&str] = &["crimeCount"];
const CRIME_BREAKDOWN_KEY: &str = "crimeBreakdown";

pub const DEFAULT_CRIME_WEIGHT: f64 = 1.0;
pub const DEFAULT_SAFETY_SCORE: f64 = 0.5;
pub const MIN_BASE_HEIGHT: f64 = 0.5;
const CRIME_WEIGHT_PER_UNIT_HEIGHT: f64 = 8.0;

/// Extrusion height for a crime weight; never below `MIN_BASE_HEIGHT`.
pub fn base_height_for(crime_weight: f64) -> f64 {
    (crime_weight / CRIME_WEIGHT_PER_UNIT_HEIGHT).max(MIN_BASE_HEIGHT)
}

/// A registered zone: its mesh, material, record and highlight state.
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub id: ObjectId,
    pub record: Record,
    pub mesh: BufferGeometry,
    pub material: Material,
    pub bounds: Option<Aabb>,
    treatment: Treatment,
}

impl SceneObject {
    pub fn treatment(&self) -> Treatment {
        self.treatment
    }

    pub fn is_hovered(&self) -> bool {
        self.treatment.hovered
    }

    pub fn is_searched(&self) -> bool {
        self.treatment.searched
    }
}

/// Turns raw features into scene objects.
pub struct FeatureRegistry {
    projector: CoordinateProjector,
    labels: DefaultLabels,
    opacity: f32,
}

impl FeatureRegistry {
    pub fn new(config: &MapConfig) -> Self {
        Self {
            projector: CoordinateProjector::from_config(config),
            labels: config.labels.clone(),
            opacity: config.opacity,
        }
    }

    /// Build one scene object per feature, in input order. Duplicate codes
    /// are kept; broken geometry yields an object with an empty mesh.
    pub fn build(&self, features: &[GeoFeature]) -> Vec<SceneObject> {
        let objects: Vec<SceneObject> = features
            .par_iter()
            .enumerate()
            .map(|(id, feature)| self.build_object(id, feature))
            .collect();

        let empty = objects.iter().filter(|o| !o.mesh.has_data).count();
        console_log!(
            "Registered {} zones from {} features ({} without geometry)",
            objects.len(),
            features.len(),
            empty
        );
        objects
    }

    fn build_object(&self, id: ObjectId, feature: &GeoFeature) -> SceneObject {
        let record = normalize_record(&feature.properties, &self.labels);
        let mesh = build_zone_mesh(&feature.shape, &self.projector, record.base_height);
        let material = Material {
            color: safety_color(record.safety_score),
            emissive: Color::BLACK,
            opacity: self.opacity,
            transparent: true,
        };

        SceneObject {
            id,
            bounds: mesh.bounding_box(),
            record,
            mesh,
            material,
            treatment: Treatment::default(),
        }
    }
}

/// Normalize a raw property bag into a `Record` using the fallback chains.
pub fn normalize_record(props: &Map<String, Value>, labels: &DefaultLabels) -> Record {
    let crime_weight = first_number(props, CRIME_WEIGHT_KEYS)
        .map(|w| w.max(0.0))
        .unwrap_or(DEFAULT_CRIME_WEIGHT);
    // Null takes the default, not 0
    let safety_score = first_number(props, SAFETY_SCORE_KEYS)
        .map(|s| s.clamp(0.0, 1.0))
        .unwrap_or(DEFAULT_SAFETY_SCORE);

    Record {
        code: first_text(props, CODE_KEYS).unwrap_or_else(|| labels.code.clone()),
        neighborhood_name: first_text(props, NEIGHBORHOOD_KEYS)
            .unwrap_or_else(|| labels.neighborhood.clone()),
        borough_name: first_text(props, BOROUGH_KEYS).unwrap_or_else(|| labels.borough.clone()),
        crime_weight,
        safety_score,
        precinct: first_text(props, PRECINCT_KEYS).unwrap_or_else(|| labels.precinct.clone()),
        base_height: base_height_for(crime_weight),
        crime_count: first_number(props, CRIME_COUNT_KEYS)
            .map(|c| c.max(0.0).round() as u64)
            .unwrap_or(0),
        crime_breakdown: props
            .get(CRIME_BREAKDOWN_KEY)
            .map(parse_breakdown)
            .unwrap_or_default(),
    }
}

// Null and blank strings count as absent
fn first_text(props: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match props.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(
            n.as_i64()
                .map(|i| i.to_string())
                .or_else(|| n.as_u64().map(|u| u.to_string()))
                .unwrap_or_else(|| n.to_string()),
        ),
        _ => None,
    })
}

fn first_number(props: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .find_map(|key| props.get(*key).and_then(value_as_number))
}

fn value_as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

// The breakdown arrives either as an object or as a JSON-encoded object
fn parse_breakdown(value: &Value) -> Vec<CrimeTally> {
    let decoded;
    let map = match value {
        Value::Object(map) => map,
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Object(map)) => {
                decoded = map;
                &decoded
            }
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    map.iter()
        .filter_map(|(category, count)| {
            value_as_number(count).map(|count| CrimeTally {
                category: category.clone(),
                count,
            })
        })
        .collect()
}

/// Colors applied for each highlight treatment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HighlightPalette {
    pub hover: Color,
    pub search: Color,
}

impl HighlightPalette {
    pub fn from_config(config: &MapConfig) -> Self {
        Self {
            hover: Color::from_hex(config.hover_emissive),
            search: Color::from_hex(config.search_emissive),
        }
    }

    /// Hover wins while the pointer is over a searched object.
    pub fn emissive_for(&self, treatment: Treatment) -> Color {
        if treatment.hovered {
            self.hover
        } else if treatment.searched {
            self.search
        } else {
            Color::BLACK
        }
    }
}

/// The registered objects plus bookkeeping of which materials changed.
#[derive(Debug, Clone)]
pub struct ZoneScene {
    objects: Vec<SceneObject>,
    palette: HighlightPalette,
    dirty: Vec<ObjectId>,
}

impl ZoneScene {
    pub fn new(objects: Vec<SceneObject>, palette: HighlightPalette) -> Self {
        Self {
            objects,
            palette,
            dirty: Vec::new(),
        }
    }

    pub fn empty(palette: HighlightPalette) -> Self {
        Self::new(Vec::new(), palette)
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// First object in registration order whose code matches exactly.
    pub fn find_by_code(&self, code: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.record.code == code)
    }

    /// Switch one treatment on or off. Returns `true` if the object changed.
    pub fn set_treatment(&mut self, id: ObjectId, kind: HighlightKind, on: bool) -> bool {
        let palette = self.palette;
        let Some(object) = self.objects.get_mut(id) else {
            return false;
        };

        let flag = match kind {
            HighlightKind::Hover => &mut object.treatment.hovered,
            HighlightKind::Search => &mut object.treatment.searched,
        };
        if *flag == on {
            return false;
        }
        *flag = on;

        let emissive = palette.emissive_for(object.treatment);
        if object.material.emissive != emissive {
            object.material.emissive = emissive;
            if !self.dirty.contains(&id) {
                self.dirty.push(id);
            }
        }
        true
    }

    /// Remove one treatment from every object that carries it.
    pub fn clear_treatment(&mut self, kind: HighlightKind) {
        for id in 0..self.objects.len() {
            self.set_treatment(id, kind, false);
        }
    }

    /// Objects carrying a treatment, in registration order.
    pub fn with_treatment(&self, kind: HighlightKind) -> Vec<ObjectId> {
        self.objects
            .iter()
            .filter(|o| match kind {
                HighlightKind::Hover => o.treatment.hovered,
                HighlightKind::Search => o.treatment.searched,
            })
            .map(|o| o.id)
            .collect()
    }

    /// Drain the material changes since the previous call.
    pub fn take_material_updates(&mut self) -> Vec<MaterialUpdate> {
        let dirty = std::mem::take(&mut self.dirty);
        dirty
            .into_iter()
            .filter_map(|id| {
                self.objects.get(id).map(|o| MaterialUpdate {
                    id,
                    emissive: o.material.emissive.to_array(),
                })
            })
            .collect()
    }
}
