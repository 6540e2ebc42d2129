use nalgebra::Point3;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::camera::{Camera, CameraRig};
use crate::config::MapConfig;
use crate::error::MapError;
use crate::feature_registry::{FeatureRegistry, HighlightPalette, ZoneScene};
use crate::geojson_features::{parse_feature_collection, GeoFeature};
use crate::info_panel::InfoPanelAdapter;
use crate::models::FrameReport;
use crate::picking::{HoverState, PickingEngine};
use crate::search_focus::{SearchFocus, SearchHighlight, SearchOutcome};
use crate::console_warn;

/// Latest pointer sample in NDC. Writers overwrite, the tick reads once.
#[derive(Debug, Clone, Default)]
pub struct PointerSlot {
    inner: Arc<Mutex<Option<[f64; 2]>>>,
}

impl PointerSlot {
    /// Store a sample. Non-finite coordinates are dropped and the previous
    /// sample stays.
    pub fn write(&self, x: f64, y: f64) -> bool {
        if !(x.is_finite() && y.is_finite()) {
            return false;
        }
        *self.inner.lock() = Some([x, y]);
        true
    }

    pub fn latest(&self) -> Option<[f64; 2]> {
        *self.inner.lock()
    }
}

/// Hover and search slots. Independent of each other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HighlightState {
    pub hover: HoverState,
    pub search: SearchHighlight,
}

/// Owns everything that changes over the lifetime of one map view.
pub struct MapSession {
    config: MapConfig,
    scene: ZoneScene,
    highlights: HighlightState,
    pointer: PointerSlot,
    camera: Camera,
    rig: CameraRig,
    picking: PickingEngine,
    focus: SearchFocus,
    loaded: bool,
}

impl MapSession {
    pub fn new(config: MapConfig) -> Result<Self, MapError> {
        config.validate()?;
        let camera = Camera::default();

        Ok(Self {
            scene: ZoneScene::empty(HighlightPalette::from_config(&config)),
            highlights: HighlightState::default(),
            pointer: PointerSlot::default(),
            rig: CameraRig::new(camera.target),
            camera,
            picking: PickingEngine::default(),
            focus: SearchFocus::new(&config),
            loaded: false,
            config,
        })
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn scene(&self) -> &ZoneScene {
        &self.scene
    }

    pub fn highlights(&self) -> HighlightState {
        self.highlights
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn rig(&self) -> &CameraRig {
        &self.rig
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Handle for the pointer callback.
    pub fn pointer(&self) -> PointerSlot {
        self.pointer.clone()
    }

    /// Register the features. Only the first load takes effect; returns the
    /// number of scene objects.
    pub fn load_features(&mut self, features: &[GeoFeature]) -> usize {
        if self.loaded {
            console_warn!("Features already loaded, ignoring {} more", features.len());
            return self.scene.len();
        }

        let objects = FeatureRegistry::new(&self.config).build(features);
        self.scene = ZoneScene::new(objects, HighlightPalette::from_config(&self.config));
        self.highlights = HighlightState::default();
        self.loaded = true;
        self.scene.len()
    }

    pub fn load_geojson(&mut self, json: &str) -> Result<usize, MapError> {
        let features = parse_feature_collection(json)?;
        Ok(self.load_features(&features))
    }

    /// Adopt the host's camera pose. The orbit target is kept while a pan
    /// owns it.
    pub fn set_camera(&mut self, camera: Camera) {
        self.rig.sync_target(camera.target);
        self.camera = Camera {
            target: self.rig.target(),
            ..camera
        };
    }

    pub fn search(&mut self, query: &str, panel: &mut dyn InfoPanelAdapter) -> SearchOutcome {
        let outcome =
            self.focus
                .search(query, &mut self.scene, &mut self.highlights.search, panel);

        if let SearchOutcome::Focused { pan: Some(pan), .. } = outcome {
            self.rig.issue(pan);
        }
        outcome
    }

    /// One frame: advance the camera pan, then evaluate picking against the
    /// latest pointer sample.
    pub fn tick(&mut self, dt: f64, panel: &mut dyn InfoPanelAdapter) -> FrameReport {
        let camera_target = self.rig.advance(dt).map(|target| {
            self.camera.target = target;
            to_array(target)
        });

        let ray = self
            .pointer
            .latest()
            .and_then(|[x, y]| self.camera.ray_from_ndc(x, y));
        self.picking
            .evaluate(ray.as_ref(), &mut self.scene, &mut self.highlights.hover, panel);

        FrameReport {
            camera_target,
            hovered: self.highlights.hover.hovered(),
            material_updates: self.scene.take_material_updates(),
        }
    }
}

fn to_array(p: Point3<f64>) -> [f64; 3] {
    [p.x, p.y, p.z]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::geojson_features::shape_from_coordinates;
    use crate::info_panel::RecordingPanel;
    use crate::models::HighlightKind;
    use serde_json::json;

    fn zone(lat: f64, lon: f64, code: &str) -> GeoFeature {
        let d = 0.0005;
        let shape = shape_from_coordinates(&json!([[
            [lon - d, lat - d],
            [lon + d, lat - d],
            [lon + d, lat + d],
            [lon - d, lat + d],
            [lon - d, lat - d]
        ]]));
        let props = json!({"postalCode": code, "weightedCrimeVal": 16});
        GeoFeature::new(shape, props.as_object().cloned().unwrap_or_default())
    }

    fn session_with(features: &[GeoFeature]) -> MapSession {
        let mut session = MapSession::new(MapConfig::default()).expect("valid config");
        session.load_features(features);
        session.set_camera(Camera {
            position: Point3::new(0.0, 50.0, 50.0),
            ..Camera::default()
        });
        session
    }

    fn ground_center(session: &MapSession, id: usize) -> Point3<f64> {
        let c = session
            .scene()
            .get(id)
            .and_then(|o| o.bounds)
            .expect("bounds")
            .center();
        Point3::new(c.x, 0.0, c.z)
    }

    #[test]
    fn pointer_slot_keeps_latest_finite_sample() {
        let slot = PointerSlot::default();
        assert_eq!(slot.latest(), None);
        assert!(slot.write(0.25, -0.5));
        let writer = slot.clone();
        assert!(writer.write(0.1, 0.2));
        assert!(!writer.write(f64::NAN, 0.0));
        assert!(!writer.write(0.0, f64::INFINITY));
        assert_eq!(slot.latest(), Some([0.1, 0.2]));
    }

    #[test]
    fn everything_is_a_noop_before_load() {
        let mut session = MapSession::new(MapConfig::default()).expect("valid config");
        let mut panel = RecordingPanel::default();
        session.pointer().write(0.0, 0.0);

        assert_eq!(session.search("10001", &mut panel), SearchOutcome::NotFound);
        let report = session.tick(0.016, &mut panel);
        assert_eq!(report, FrameReport::default());
        assert!(panel.events.is_empty());
        assert!(!session.is_loaded());
    }

    #[test]
    fn second_load_is_ignored() {
        let mut session = session_with(&[zone(40.7128, -74.0060, "10001")]);
        let count = session.load_features(&[
            zone(40.7128, -74.0060, "10002"),
            zone(40.7228, -74.0060, "10003"),
        ]);
        assert_eq!(count, 1);
        assert_eq!(session.scene().objects()[0].record.code, "10001");
    }

    #[test]
    fn load_geojson_rejects_other_documents() {
        let mut session = MapSession::new(MapConfig::default()).expect("valid config");
        assert!(session.load_geojson("{\"type\": \"Feature\"}").is_err());
        assert!(!session.is_loaded());

        let loaded = session
            .load_geojson("{\"type\": \"FeatureCollection\", \"features\": []}")
            .expect("empty collection");
        assert_eq!(loaded, 0);
        assert!(session.is_loaded());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = MapConfig {
            scale: 0.0,
            ..MapConfig::default()
        };
        assert!(MapSession::new(config).is_err());
    }

    #[test]
    fn hover_follows_pointer_and_clears_once() {
        let mut session = session_with(&[zone(40.7128, -74.0060, "10001")]);
        let mut panel = RecordingPanel::default();

        // No sample yet counts as a miss
        let report = session.tick(0.016, &mut panel);
        assert_eq!(report.hovered, None);

        session.pointer().write(0.0, 0.0);
        let report = session.tick(0.016, &mut panel);
        assert_eq!(report.hovered, Some(0));
        assert_eq!(report.material_updates.len(), 1);
        assert_eq!(report.material_updates[0].emissive, Color::from_hex(0x333333).to_array());
        assert_eq!(panel.last_shown().expect("shown").code, "10001");

        let report = session.tick(0.016, &mut panel);
        assert!(report.material_updates.is_empty());

        session.pointer().write(0.99, 0.99);
        for _ in 0..3 {
            session.tick(0.016, &mut panel);
        }
        assert_eq!(session.highlights().hover, HoverState::Idle);
        assert_eq!(panel.clear_count(), 1);
    }

    #[test]
    fn top_down_camera_hovers_zone_below() {
        let mut session = session_with(&[zone(40.7128, -74.0060, "10001")]);
        let mut panel = RecordingPanel::default();
        session.set_camera(Camera {
            position: Point3::new(0.0, 500.0, 0.0),
            ..Camera::default()
        });

        session.pointer().write(0.0, 0.0);
        let report = session.tick(0.016, &mut panel);
        assert_eq!(report.hovered, Some(0));
    }

    #[test]
    fn degenerate_aspect_counts_as_a_miss() {
        let mut session = session_with(&[zone(40.7128, -74.0060, "10001")]);
        let mut panel = RecordingPanel::default();
        let squashed = Camera {
            aspect: 1e-17,
            ..*session.camera()
        };
        session.set_camera(squashed);

        session.pointer().write(0.0, 0.0);
        let report = session.tick(0.016, &mut panel);
        assert_eq!(report.hovered, None);
    }

    #[test]
    fn hover_and_search_coexist_on_one_zone() {
        let mut session = session_with(&[zone(40.7128, -74.0060, "10001")]);
        let mut panel = RecordingPanel::default();

        session.search("10001", &mut panel);
        session.pointer().write(0.0, 0.0);
        session.tick(0.016, &mut panel);
        let object = session.scene().get(0).expect("object");
        assert!(object.is_hovered() && object.is_searched());
        assert_eq!(object.material.emissive, Color::from_hex(0x333333));

        session.pointer().write(0.99, 0.99);
        let report = session.tick(0.016, &mut panel);
        assert_eq!(report.material_updates[0].emissive, Color::from_hex(0x00ffff).to_array());
        assert_eq!(session.highlights().search, SearchHighlight(Some(0)));
        assert_eq!(session.scene().with_treatment(HighlightKind::Search), vec![0]);
    }

    #[test]
    fn sequential_searches_end_at_the_second_target() {
        let mut session = session_with(&[
            zone(40.7128, -74.0060, "10001"),
            zone(40.7228, -73.9960, "10014"),
        ]);
        let mut panel = RecordingPanel::default();
        let second = ground_center(&session, 1);

        session.search("10001", &mut panel);
        session.tick(0.3, &mut panel);
        session.search("10014", &mut panel);
        assert_eq!(session.rig().destination(), Some(second));

        let mut last_target = None;
        for _ in 0..20 {
            if let Some(target) = session.tick(0.1, &mut panel).camera_target {
                last_target = Some(target);
            }
        }
        assert_eq!(last_target, Some([second.x, second.y, second.z]));
        assert_eq!(session.camera().target, second);
        assert!(!session.rig().is_animating());
    }

    #[test]
    fn host_camera_cannot_steal_target_mid_pan() {
        let mut session = session_with(&[zone(40.7228, -73.9960, "10014")]);
        let mut panel = RecordingPanel::default();
        session.search("10014", &mut panel);
        session.tick(0.1, &mut panel);
        let mid = session.camera().target;

        let dragged = Camera {
            target: Point3::new(999.0, 0.0, 999.0),
            ..*session.camera()
        };
        session.set_camera(dragged);
        assert_eq!(session.camera().target, mid);
    }
}
