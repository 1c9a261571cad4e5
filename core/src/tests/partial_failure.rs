use crate::component::{MapComponent, RenderOptions};
use crate::error::TranscodeError;
use crate::leaflet;
use crate::source::TemplateSource;
use crate::tree::{LatLng, MapNode, MapTree, NodeKind, NodeTemplate};

fn with_fallback(name: &str, script: &str, page: Option<&str>) -> MapNode {
    MapNode::new(NodeKind::Element, name).with_template(NodeTemplate {
        script: script.to_string(),
        page: page.map(str::to_string),
        html: None,
    })
}

#[test]
fn failing_children_are_dropped_and_positions_kept() {
    let mut tree = MapTree::new(leaflet::map(LatLng::new(0.0, 0.0), 3));
    let map = tree.root();
    let broken = tree
        .add_child(map, with_fallback("broken", "var {{ this.var }} = {{ this.attrs.missing }};", None))
        .unwrap();
    tree.add_child(broken, leaflet::marker(LatLng::new(1.0, 1.0))).unwrap();
    tree.add_child(
        map,
        with_fallback("fallback", "{{ this.attrs.missing }}", Some("var {{ this.var }} = 1;")),
    )
    .unwrap();
    tree.add_child(map, leaflet::marker(LatLng::new(2.0, 2.0))).unwrap();

    let payload = MapComponent::new(&TemplateSource)
        .render(&tree, &RenderOptions::default())
        .unwrap();
    let script = &payload.script;
    assert!(!script.contains("broken_"));
    assert!(!script.contains("marker_div_0_0"));
    assert!(script.contains("var fallback_div_1 = 1;"));
    assert!(script.contains("var marker_div_2 = L.marker("));
}

#[test]
fn root_failure_surfaces_with_its_code() {
    let tree = MapTree::new(
        MapNode::new(NodeKind::Map, "map").with_template(NodeTemplate::script("var {{ this.var }} = {{ this.attrs.nope }};")),
    );
    let err = MapComponent::new(&TemplateSource)
        .render(&tree, &RenderOptions::default())
        .unwrap_err();
    assert!(matches!(err, TranscodeError::Template { ref stable_id, .. } if stable_id == "div"));
    assert_eq!(err.code(), "E_TEMPLATE_MISSING_ATTR");
}

#[test]
fn malformed_child_template_aborts_the_render() {
    let mut tree = MapTree::new(leaflet::map(LatLng::new(0.0, 0.0), 3));
    let map = tree.root();
    tree.add_child(map, leaflet::element("bad", "var {{ this.var ;")).unwrap();
    let err = MapComponent::new(&TemplateSource)
        .render(&tree, &RenderOptions::default())
        .unwrap_err();
    assert_eq!(err.code(), "E_TEMPLATE_SYNTAX");
}
