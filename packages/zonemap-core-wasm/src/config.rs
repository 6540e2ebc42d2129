use serde::Deserialize;

use crate::error::MapError;

/// Earth mean radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Session configuration handed over by the host as JSON.
///
/// Every field has a default, so `{}` (or an empty string at the facade) is a
/// valid configuration centered on lower Manhattan.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapConfig {
    #[serde(default = "default_center_lat")]
    pub center_lat: f64,
    #[serde(default = "default_center_lon")]
    pub center_lon: f64,
    /// Meters per scene unit.
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default = "default_earth_radius")]
    pub earth_radius: f64,
    /// Seconds the orbit target takes to reach a searched zone.
    #[serde(default = "default_pan_duration")]
    pub pan_duration: f64,
    #[serde(default = "default_hover_emissive")]
    pub hover_emissive: u32,
    #[serde(default = "default_search_emissive")]
    pub search_emissive: u32,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    #[serde(default)]
    pub labels: DefaultLabels,
}

/// Labels used when a feature carries none of the fallback properties.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultLabels {
    #[serde(default = "default_not_available")]
    pub code: String,
    #[serde(default = "default_neighborhood")]
    pub neighborhood: String,
    #[serde(default = "default_borough")]
    pub borough: String,
    #[serde(default = "default_not_available")]
    pub precinct: String,
}

fn default_center_lat() -> f64 {
    40.7128
}
fn default_center_lon() -> f64 {
    -74.0060
}
fn default_scale() -> f64 {
    500.0
}
fn default_earth_radius() -> f64 {
    EARTH_RADIUS_M
}
fn default_pan_duration() -> f64 {
    1.2
}
fn default_hover_emissive() -> u32 {
    0x333333
}
fn default_search_emissive() -> u32 {
    0x00ffff
}
fn default_opacity() -> f32 {
    0.8
}
fn default_not_available() -> String {
    "N/A".to_string()
}
fn default_neighborhood() -> String {
    "NYC Neighborhood".to_string()
}
fn default_borough() -> String {
    "New York".to_string()
}

impl Default for DefaultLabels {
    fn default() -> Self {
        Self {
            code: default_not_available(),
            neighborhood: default_neighborhood(),
            borough: default_borough(),
            precinct: default_not_available(),
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center_lat: default_center_lat(),
            center_lon: default_center_lon(),
            scale: default_scale(),
            earth_radius: default_earth_radius(),
            pan_duration: default_pan_duration(),
            hover_emissive: default_hover_emissive(),
            search_emissive: default_search_emissive(),
            opacity: default_opacity(),
            labels: DefaultLabels::default(),
        }
    }
}

impl MapConfig {
    /// Parse and validate a JSON configuration. Blank input yields defaults.
    pub fn from_json(json: &str) -> Result<Self, MapError> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: MapConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MapError> {
        if !self.center_lat.is_finite() || !self.center_lon.is_finite() {
            return Err(MapError::InvalidConfig(format!(
                "center must be finite, got ({}, {})",
                self.center_lat, self.center_lon
            )));
        }
        if !(self.scale > 0.0) || !self.scale.is_finite() {
            return Err(MapError::InvalidConfig(format!(
                "scale must be a positive number, got {}",
                self.scale
            )));
        }
        if !(self.earth_radius > 0.0) {
            return Err(MapError::InvalidConfig(format!(
                "earthRadius must be positive, got {}",
                self.earth_radius
            )));
        }
        if !(self.pan_duration > 0.0) || !self.pan_duration.is_finite() {
            return Err(MapError::InvalidConfig(format!(
                "panDuration must be positive, got {}",
                self.pan_duration
            )));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(MapError::InvalidConfig(format!(
                "opacity must be within [0, 1], got {}",
                self.opacity
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_config_uses_defaults() {
        let config = MapConfig::from_json("  ").expect("defaults");
        assert_eq!(config.scale, 500.0);
        assert_eq!(config.center_lat, 40.7128);
        assert_eq!(config.labels.neighborhood, "NYC Neighborhood");
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let config = MapConfig::from_json(r#"{"scale": 250, "labels": {"borough": "Kings"}}"#)
            .expect("parsed");
        assert_eq!(config.scale, 250.0);
        assert_eq!(config.pan_duration, 1.2);
        assert_eq!(config.labels.borough, "Kings");
        assert_eq!(config.labels.code, "N/A");
    }

    #[test]
    fn rejects_non_positive_scale() {
        let err = MapConfig::from_json(r#"{"scale": 0}"#).unwrap_err();
        assert!(matches!(err, MapError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = MapConfig::from_json("{scale:").unwrap_err();
        assert!(matches!(err, MapError::Json(_)));
    }
}
