use serde_json::json;

use crate::assets::AssetManifest;
use crate::component::{MapComponent, RenderOptions};
use crate::envelope::EnvelopeField;
use crate::leaflet;
use crate::render::{render_tree, DEFAULT_BASE_ID};
use crate::source::TemplateSource;
use crate::tree::{LatLng, MapTree, NodeId};

fn side_by_side() -> (MapTree, NodeId) {
    let mut tree = MapTree::new(leaflet::dual_map());
    let dual = tree.root();
    let left = tree.add_child(dual, leaflet::map(LatLng::new(52.0, 4.0), 7)).unwrap();
    let right = tree.add_child(dual, leaflet::map(LatLng::new(52.0, 4.0), 9)).unwrap();
    tree.add_child(left, leaflet::open_street_map()).unwrap();
    tree.add_child(right, leaflet::marker(LatLng::new(52.1, 4.3))).unwrap();
    (tree, dual)
}

#[test]
fn panes_render_under_separate_bases() {
    let (tree, dual) = side_by_side();
    let rendered = render_tree(&TemplateSource, &tree, dual, true, DEFAULT_BASE_ID).unwrap();
    let script = &rendered.script;

    let first = script.find("var map_div = L.map(").unwrap();
    let second = script.find("var map_div2 = L.map(").unwrap();
    let sync = script.find("map_div.sync(map_div2);").unwrap();
    assert!(first < second);
    assert!(second < sync);
    assert!(script.contains("map_div2.sync(map_div);"));
    assert!(script.contains("tile_layer_div_0.addTo(map_div);"));
    assert!(script.contains("var marker_div2_0 = L.marker("));
    assert!(script.contains(").addTo(map_div2);"));
    assert_eq!(rendered.mapping.get(tree[dual].ephemeral_id()), Some("div"));
}

#[test]
fn non_nested_dual_map_is_just_the_first_pane() {
    let (tree, dual) = side_by_side();
    let rendered = render_tree(&TemplateSource, &tree, dual, false, DEFAULT_BASE_ID).unwrap();
    assert!(rendered.script.contains("var map_div = L.map("));
    assert!(!rendered.script.contains("map_div2"));
    assert!(!rendered.script.contains("sync"));
}

#[test]
fn payload_uses_first_pane() {
    let (tree, dual) = side_by_side();
    let payload = MapComponent::new(&TemplateSource)
        .render(&tree, &RenderOptions::default())
        .unwrap();
    assert_eq!(payload.id, "map_div");
    assert_eq!(payload.default.get(EnvelopeField::Zoom), Some(&json!(7)));
    assert_eq!(
        payload.default.get(EnvelopeField::Bounds),
        Some(&json!({
            "_southWest": {"lat": 52.1, "lng": 4.3},
            "_northEast": {"lat": 52.1, "lng": 4.3},
        }))
    );
    assert!(payload.script.contains("var map_div2 = L.map("));
    assert_eq!(payload.js_links, AssetManifest::collect(&tree, dual).js);
    assert_eq!(payload.js_links.last().map(String::as_str), Some(leaflet::SYNC_JS));
}

#[test]
fn dual_map_needs_two_panes() {
    let mut tree = MapTree::new(leaflet::dual_map());
    let dual = tree.root();
    tree.add_child(dual, leaflet::map(LatLng::new(0.0, 0.0), 3)).unwrap();
    let err = MapComponent::new(&TemplateSource)
        .render(&tree, &RenderOptions::default())
        .unwrap_err();
    assert_eq!(err.code(), "E_TEMPLATE_MISSING_ATTR");
}
