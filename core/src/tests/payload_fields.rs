use serde_json::{json, Value};

use crate::assets::{D3_V3_JS, D3_V4_JS};
use crate::component::{MapComponent, RenderOptions};
use crate::leaflet;
use crate::source::TemplateSource;
use crate::tree::{LatLng, MapTree};

fn small_map() -> MapTree {
    let mut tree = MapTree::new(leaflet::map(LatLng::new(10.0, 20.0), 4));
    let map = tree.root();
    tree.add_child(map, leaflet::open_street_map()).unwrap();
    tree.add_child(map, leaflet::draw(true)).unwrap();
    tree.add_child(map, leaflet::color_scale(&["#ffffff", "#ff0000"], &[0.0, 10.0], "Rain (mm)"))
        .unwrap();
    tree
}

#[test]
fn payload_serializes_with_host_field_names() {
    let opts = RenderOptions {
        key: Some("rain".to_string()),
        returned_objects: Some(vec!["zoom".to_string(), "last_clicked".to_string()]),
        center: Some((10.0, 20.0)),
        use_container_width: true,
        pixelated: true,
        max_drawn_objects: 2,
        ..RenderOptions::default()
    };
    let payload = MapComponent::new(&TemplateSource).render(&small_map(), &opts).unwrap();
    let value = serde_json::to_value(&payload).unwrap();
    let object = value.as_object().unwrap();

    let keys: Vec<&str> = object.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec![
            "script",
            "html",
            "id",
            "key",
            "height",
            "width",
            "returned_objects",
            "default",
            "zoom",
            "center",
            "feature_group",
            "return_on_hover",
            "layer_control",
            "pixelated",
            "css_links",
            "js_links",
            "max_drawn_objects",
            "max_drawn_objects_remove_old",
        ]
    );
    assert_eq!(value["id"], "map_div");
    assert_eq!(value["height"], 700);
    assert_eq!(value["width"], Value::Null);
    assert_eq!(value["center"], json!([10.0, 20.0]));
    assert_eq!(value["feature_group"], Value::Null);
    assert_eq!(value["max_drawn_objects"], 2);
    assert_eq!(value["max_drawn_objects_remove_old"], true);
    assert_eq!(value["default"], json!({"last_clicked": null, "zoom": 4}));
    assert_eq!(value["key"].as_str().map(str::len), Some(64));
}

#[test]
fn color_scale_pulls_d3_ahead_of_leaflet() {
    let payload = MapComponent::new(&TemplateSource)
        .render(&small_map(), &RenderOptions::default())
        .unwrap();
    assert_eq!(payload.js_links[0], D3_V4_JS);
    assert_eq!(payload.js_links[1], D3_V3_JS);
    assert_eq!(payload.js_links[2], leaflet::LEAFLET_JS);
    assert!(payload.css_links.iter().any(|href| href == leaflet::DRAW_CSS));
}

#[test]
fn draw_control_at_second_position_becomes_drawn_items() {
    let payload = MapComponent::new(&TemplateSource)
        .render(&small_map(), &RenderOptions::default())
        .unwrap();
    assert!(payload.script.contains("var drawnItems = new L.featureGroup().addTo("));
    assert!(payload.script.contains("drawnItems.addLayer(layer);"));
    assert!(!payload.script.contains("alert(coords);"));
    assert!(!payload.script.contains("var drawnItems = [];"));
}
