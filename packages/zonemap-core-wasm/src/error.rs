use thiserror::Error;
use wasm_bindgen::JsValue;

/// Failures at the ingest and configuration boundary.
///
/// Everything past ingest degrades gracefully instead of failing: bad rings
/// are skipped, missing properties fall back to defaults.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Expected a FeatureCollection, found {0}")]
    NotFeatureCollection(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<MapError> for JsValue {
    fn from(err: MapError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}
