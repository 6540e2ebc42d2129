use nalgebra::Point3;

use crate::camera::{CameraPan, Easing};
use crate::config::MapConfig;
use crate::console_log;
use crate::feature_registry::ZoneScene;
use crate::info_panel::InfoPanelAdapter;
use crate::models::{HighlightKind, ObjectId};

/// Zone codes are fixed width; anything else is not a lookup.
pub const ZONE_CODE_LENGTH: usize = 5;

/// Most recently search-selected object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchHighlight(pub Option<ObjectId>);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SearchOutcome {
    /// The trimmed query is not exactly `ZONE_CODE_LENGTH` characters.
    Ignored,
    NotFound,
    Focused {
        id: ObjectId,
        /// `None` when the matched zone has no geometry to center on.
        pan: Option<CameraPan>,
    },
}

/// Resolves zone-code queries into highlight, panel and camera commands.
#[derive(Debug, Clone)]
pub struct SearchFocus {
    pan_duration: f64,
    easing: Easing,
}

impl SearchFocus {
    pub fn new(config: &MapConfig) -> Self {
        Self {
            pan_duration: config.pan_duration,
            easing: Easing::Power2InOut,
        }
    }

    /// Look up `query` and focus the first zone with that code.
    ///
    /// Non-matching or wrongly sized queries leave every slot untouched.
    pub fn search(
        &self,
        query: &str,
        scene: &mut ZoneScene,
        highlight: &mut SearchHighlight,
        panel: &mut dyn InfoPanelAdapter,
    ) -> SearchOutcome {
        let code = query.trim();
        if code.chars().count() != ZONE_CODE_LENGTH {
            return SearchOutcome::Ignored;
        }

        let Some(target) = scene.find_by_code(code) else {
            return SearchOutcome::NotFound;
        };
        let id = target.id;
        let center = target.bounds.map(|b| b.center());

        scene.clear_treatment(HighlightKind::Search);
        scene.set_treatment(id, HighlightKind::Search, true);
        highlight.0 = Some(id);

        if let Some(object) = scene.get(id) {
            panel.show(&object.record);
        }

        let pan = center.map(|c| CameraPan {
            to: Point3::new(c.x, 0.0, c.z),
            duration: self.pan_duration,
            easing: self.easing,
        });
        console_log!("Focused zone {} (object {})", code, id);

        SearchOutcome::Focused { id, pan }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_registry::{FeatureRegistry, HighlightPalette};
    use crate::geojson_features::{shape_from_coordinates, GeoFeature, ZoneShape};
    use crate::info_panel::RecordingPanel;
    use serde_json::json;

    fn zone(lat: f64, lon: f64, code: &str, name: &str) -> GeoFeature {
        let d = 0.0005;
        let shape = shape_from_coordinates(&json!([[
            [lon - d, lat - d],
            [lon + d, lat - d],
            [lon + d, lat + d],
            [lon - d, lat + d],
            [lon - d, lat - d]
        ]]));
        let props = json!({"postalCode": code, "neighborhood": name});
        GeoFeature::new(shape, props.as_object().cloned().unwrap_or_default())
    }

    fn setup(features: &[GeoFeature]) -> (SearchFocus, ZoneScene) {
        let config = MapConfig::default();
        let objects = FeatureRegistry::new(&config).build(features);
        (
            SearchFocus::new(&config),
            ZoneScene::new(objects, HighlightPalette::from_config(&config)),
        )
    }

    #[test]
    fn length_gate_ignores_short_and_long_queries() {
        let (focus, mut scene) = setup(&[
            zone(40.7128, -74.0060, "10020", "Midtown"),
            zone(40.7228, -74.0060, "1020", "Short"),
        ]);
        let mut highlight = SearchHighlight::default();
        let mut panel = RecordingPanel::default();

        for query in ["1020", "102003", "", "   "] {
            let outcome = focus.search(query, &mut scene, &mut highlight, &mut panel);
            assert_eq!(outcome, SearchOutcome::Ignored, "query {query:?}");
        }
        assert_eq!(highlight, SearchHighlight(None));
        assert!(panel.events.is_empty());
        assert!(scene.with_treatment(HighlightKind::Search).is_empty());

        let outcome = focus.search(" 10020 ", &mut scene, &mut highlight, &mut panel);
        assert!(matches!(outcome, SearchOutcome::Focused { id: 0, pan: Some(_) }));
    }

    #[test]
    fn unknown_code_changes_nothing() {
        let (focus, mut scene) = setup(&[zone(40.7128, -74.0060, "10001", "Chelsea")]);
        let mut highlight = SearchHighlight::default();
        let mut panel = RecordingPanel::default();

        focus.search("10001", &mut scene, &mut highlight, &mut panel);
        scene.take_material_updates();

        let outcome = focus.search("abcde", &mut scene, &mut highlight, &mut panel);
        assert_eq!(outcome, SearchOutcome::NotFound);
        assert_eq!(highlight, SearchHighlight(Some(0)));
        assert_eq!(scene.with_treatment(HighlightKind::Search), vec![0]);
        assert!(scene.take_material_updates().is_empty());
        assert_eq!(panel.events.len(), 1);
    }

    #[test]
    fn duplicate_codes_focus_first_registered() {
        let (focus, mut scene) = setup(&[
            zone(40.7128, -74.0060, "10001", "first"),
            zone(40.7228, -74.0160, "10001", "second"),
        ]);
        let mut highlight = SearchHighlight::default();
        let mut panel = RecordingPanel::default();

        let outcome = focus.search("10001", &mut scene, &mut highlight, &mut panel);
        assert!(matches!(outcome, SearchOutcome::Focused { id: 0, .. }));
        assert_eq!(scene.with_treatment(HighlightKind::Search), vec![0]);
        assert_eq!(panel.last_shown().expect("shown").neighborhood_name, "first");
    }

    #[test]
    fn new_search_moves_the_highlight() {
        let (focus, mut scene) = setup(&[
            zone(40.7128, -74.0060, "10001", "Chelsea"),
            zone(40.7228, -74.0160, "10014", "West Village"),
        ]);
        let mut highlight = SearchHighlight::default();
        let mut panel = RecordingPanel::default();

        focus.search("10001", &mut scene, &mut highlight, &mut panel);
        focus.search("10014", &mut scene, &mut highlight, &mut panel);
        assert_eq!(highlight, SearchHighlight(Some(1)));
        assert_eq!(scene.with_treatment(HighlightKind::Search), vec![1]);
    }

    #[test]
    fn pan_targets_ground_level_bbox_center() {
        let (focus, mut scene) = setup(&[zone(40.7228, -73.9960, "10003", "East Village")]);
        let mut highlight = SearchHighlight::default();
        let mut panel = RecordingPanel::default();
        let center = scene.get(0).and_then(|o| o.bounds).expect("bounds").center();

        let SearchOutcome::Focused { pan: Some(pan), .. } =
            focus.search("10003", &mut scene, &mut highlight, &mut panel)
        else {
            panic!("expected a camera pan");
        };
        assert_eq!(pan.to, Point3::new(center.x, 0.0, center.z));
        assert!(pan.to.x > 0.0);
        assert!(pan.to.z < 0.0);
        assert_eq!(pan.duration, 1.2);
        assert_eq!(pan.easing, Easing::Power2InOut);
    }

    #[test]
    fn zone_without_geometry_is_focused_without_pan() {
        let config = MapConfig::default();
        let feature = GeoFeature::new(
            ZoneShape::empty(),
            json!({"postalCode": "10004"}).as_object().cloned().unwrap_or_default(),
        );
        let objects = FeatureRegistry::new(&config).build(&[feature]);
        let mut scene = ZoneScene::new(objects, HighlightPalette::from_config(&config));
        let mut highlight = SearchHighlight::default();
        let mut panel = RecordingPanel::default();

        let outcome = SearchFocus::new(&config).search("10004", &mut scene, &mut highlight, &mut panel);
        assert_eq!(outcome, SearchOutcome::Focused { id: 0, pan: None });
        assert_eq!(panel.events.len(), 1);
    }
}
