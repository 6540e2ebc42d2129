// This is the models module containing shared data structures
use serde::Serialize;

use crate::color::Color;

/// Position of a scene object in registration order.
pub type ObjectId = usize;

/// Normalized, typed view of a zone's properties. Built once per feature
/// and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub code: String,
    pub neighborhood_name: String,
    pub borough_name: String,
    pub crime_weight: f64,
    pub safety_score: f64,
    pub precinct: String,
    pub base_height: f64,
    pub crime_count: u64,
    pub crime_breakdown: Vec<CrimeTally>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrimeTally {
    pub category: String,
    pub count: f64,
}

/// Surface description handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Material {
    pub color: Color,
    pub emissive: Color,
    pub opacity: f32,
    pub transparent: bool,
}

/// Which highlight treatments an object currently carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Treatment {
    pub hovered: bool,
    pub searched: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightKind {
    Hover,
    Search,
}

/// Emissive change for one object, reported to the host after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MaterialUpdate {
    pub id: ObjectId,
    pub emissive: [f32; 3],
}

/// What the host needs after one tick to draw the frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameReport {
    /// Orbit target while a camera pan is running.
    pub camera_target: Option<[f64; 3]>,
    pub hovered: Option<ObjectId>,
    pub material_updates: Vec<MaterialUpdate>,
}
