use js_sys::{Float32Array, Function, Uint32Array};
use nalgebra::{Point3, Vector3};
use serde_wasm_bindgen::to_value;
use wasm_bindgen::prelude::*;

// Create a console module for logging
pub mod console;
pub mod error;
pub mod config;
// Local flat-earth projection
pub mod projection;
pub mod color;
pub mod models;
// GeoJSON ingest
pub mod geojson_features;
// Import our geometry functions
#[path = "../geometry_functions/extrude.rs"]
pub mod extrude;
// Zone meshes in scene space
pub mod polygon_geometry;
pub mod feature_registry;
pub mod camera;
pub mod info_panel;
pub mod picking;
pub mod search_focus;
// Session state driven by the host's frame loop
pub mod module_state;

use camera::Camera;
use info_panel::{InfoPanelAdapter, PanelView};
use models::Record;
use module_state::MapSession;

pub use config::MapConfig;
pub use error::MapError;
pub use search_focus::SearchOutcome;

// Enable better panic messages in console during development
#[cfg(feature = "console_error_panic_hook")]
pub use console_error_panic_hook::set_once as set_panic_hook;

// Use the macro from our console module
#[macro_export]
macro_rules! console_log {
    ($($t:tt)*) => ($crate::console::log(&format!($($t)*)))
}

#[macro_export]
macro_rules! console_warn {
    ($($t:tt)*) => ($crate::console::warn(&format!($($t)*)))
}

use std::sync::Once;
static INIT: Once = Once::new();

// This sets up the wasm_bindgen start functionality
#[wasm_bindgen(start)]
pub fn start() {
    INIT.call_once(|| {
        // Set the panic hook for better error messages
        #[cfg(feature = "console_error_panic_hook")]
        console_error_panic_hook::set_once();

        console_log!("Zone map module initialized");
    });
}

/// Forwards panel updates to JS callbacks. Without callbacks it does nothing.
struct JsInfoPanel {
    show: Option<Function>,
    clear: Option<Function>,
    missing_precinct: String,
}

impl InfoPanelAdapter for JsInfoPanel {
    fn show(&mut self, record: &Record) {
        let Some(show) = &self.show else {
            return;
        };
        let view = PanelView::from_record(record, &self.missing_precinct);
        match to_value(&view) {
            Ok(value) => {
                if let Err(e) = show.call1(&JsValue::NULL, &value) {
                    console_warn!("Info panel show callback failed: {:?}", e);
                }
            }
            Err(e) => console_warn!("Failed to serialize panel view: {}", e),
        }
    }

    fn clear(&mut self) {
        if let Some(clear) = &self.clear {
            if let Err(e) = clear.call0(&JsValue::NULL) {
                console_warn!("Info panel clear callback failed: {:?}", e);
            }
        }
    }
}

/// Handle the host keeps for one map view.
#[wasm_bindgen]
pub struct ZoneMap {
    session: MapSession,
    panel: JsInfoPanel,
}

#[wasm_bindgen]
impl ZoneMap {
    /// `config_json` may be empty for the default configuration.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<ZoneMap, JsValue> {
        let config = MapConfig::from_json(config_json)?;
        let panel = JsInfoPanel {
            show: None,
            clear: None,
            missing_precinct: config.labels.precinct.clone(),
        };
        Ok(ZoneMap {
            session: MapSession::new(config)?,
            panel,
        })
    }

    pub fn set_info_panel(&mut self, show: Function, clear: Function) {
        self.panel.show = Some(show);
        self.panel.clear = Some(clear);
    }

    /// Parse a FeatureCollection and build the scene. Returns the number of
    /// zones.
    pub fn load_geojson(&mut self, geojson: &str) -> Result<usize, JsValue> {
        Ok(self.session.load_geojson(geojson)?)
    }

    /// Latest pointer position in NDC. Returns `false` if the sample was
    /// dropped.
    pub fn set_pointer(&self, x: f64, y: f64) -> bool {
        self.session.pointer().write(x, y)
    }

    /// Report the host camera pose: `position` and `target` are `[x, y, z]`,
    /// `fov_y` in degrees.
    pub fn set_camera(
        &mut self,
        position: &[f64],
        target: &[f64],
        fov_y: f64,
        aspect: f64,
    ) -> Result<(), JsValue> {
        let camera = Camera {
            position: point_from_slice(position, "position")?,
            target: point_from_slice(target, "target")?,
            up: Vector3::y(),
            fov_y,
            aspect,
            ..*self.session.camera()
        };
        self.session.set_camera(camera);
        Ok(())
    }

    /// Advance one frame. Returns the `FrameReport` as a JS object.
    pub fn tick(&mut self, dt: f64) -> Result<JsValue, JsValue> {
        let report = self.session.tick(dt, &mut self.panel);
        Ok(to_value(&report)?)
    }

    /// Returns `true` when a zone was focused.
    pub fn search(&mut self, query: &str) -> bool {
        matches!(
            self.session.search(query, &mut self.panel),
            SearchOutcome::Focused { .. }
        )
    }

    #[wasm_bindgen(getter)]
    pub fn object_count(&self) -> usize {
        self.session.scene().len()
    }

    pub fn positions(&self, id: usize) -> Option<Float32Array> {
        let object = self.session.scene().get(id)?;
        Some(Float32Array::from(object.mesh.vertices.as_slice()))
    }

    pub fn normals(&self, id: usize) -> Option<Float32Array> {
        let object = self.session.scene().get(id)?;
        Some(Float32Array::from(object.mesh.normals.as_slice()))
    }

    pub fn uvs(&self, id: usize) -> Option<Float32Array> {
        let object = self.session.scene().get(id)?;
        Some(Float32Array::from(object.mesh.uvs.as_slice()))
    }

    pub fn indices(&self, id: usize) -> Option<Uint32Array> {
        let object = self.session.scene().get(id)?;
        Some(Uint32Array::from(object.mesh.indices.as_slice()))
    }

    /// Material of one zone, or `undefined` for an unknown id.
    pub fn material(&self, id: usize) -> Result<JsValue, JsValue> {
        match self.session.scene().get(id) {
            Some(object) => Ok(to_value(&object.material)?),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    pub fn record(&self, id: usize) -> Result<JsValue, JsValue> {
        match self.session.scene().get(id) {
            Some(object) => Ok(to_value(&object.record)?),
            None => Ok(JsValue::UNDEFINED),
        }
    }
}

fn point_from_slice(values: &[f64], name: &str) -> Result<Point3<f64>, JsValue> {
    match values {
        [x, y, z] => Ok(Point3::new(*x, *y, *z)),
        _ => Err(JsValue::from_str(&format!(
            "Invalid '{}': expected [x, y, z], got {} values",
            name,
            values.len()
        ))),
    }
}
