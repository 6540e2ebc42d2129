#![cfg(target_arch = "wasm32")]

use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;
use zonemap_core_wasm::ZoneMap;

wasm_bindgen_test_configure!(run_in_browser);

const TWO_ZONES: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "properties": {"postalCode": "10001", "weightedCrimeVal": 16, "safetyScore": 0.9},
      "geometry": {"type": "Polygon", "coordinates": [[
        [-74.0065, 40.7123], [-74.0055, 40.7123], [-74.0055, 40.7133], [-74.0065, 40.7133], [-74.0065, 40.7123]
      ]]}
    },
    {
      "type": "Feature",
      "properties": {"zipcode": 10014},
      "geometry": {"type": "MultiPolygon", "coordinates": [[[
        [-73.9965, 40.7223], [-73.9955, 40.7223], [-73.9955, 40.7233], [-73.9965, 40.7233], [-73.9965, 40.7223]
      ]]]}
    }
  ]
}"#;

#[wasm_bindgen_test]
fn loads_zones_and_exposes_buffers() {
    let mut map = ZoneMap::new("").expect("default config");
    assert_eq!(map.load_geojson(TWO_ZONES).expect("valid geojson"), 2);
    assert_eq!(map.object_count(), 2);

    let positions = map.positions(0).expect("mesh");
    let indices = map.indices(0).expect("mesh");
    assert_eq!(positions.length() % 3, 0);
    assert_eq!(indices.length() * 3, positions.length());
    assert!(map.positions(5).is_none());
    assert!(map.record(5).expect("no error").is_undefined());
}

#[wasm_bindgen_test]
fn search_and_tick_report_to_js() {
    let mut map = ZoneMap::new("{\"panDuration\": 0.5}").expect("config");
    map.load_geojson(TWO_ZONES).expect("valid geojson");

    assert!(!map.search("1001"));
    assert!(map.search("10014"));

    let report = map.tick(0.25).expect("report");
    let target = js_sys::Reflect::get(&report, &JsValue::from_str("cameraTarget")).expect("field");
    assert!(js_sys::Array::is_array(&target));
}

#[wasm_bindgen_test]
fn rejects_bad_input() {
    assert!(ZoneMap::new("{\"scale\": -1}").is_err());

    let mut map = ZoneMap::new("").expect("default config");
    assert!(map.load_geojson("not json").is_err());
    assert!(map.set_camera(&[0.0, 1.0], &[0.0, 0.0, 0.0], 45.0, 1.5).is_err());
    assert!(!map.set_pointer(f64::NAN, 0.0));
}
