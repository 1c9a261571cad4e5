// leafweave-core/src/leaflet.rs
// Constructors for the Leaflet objects the built-in collaborator knows how
// to render: default templates, options and asset URLs.
//
// Cross-node references that are not a parent or child (a layer control
// listing tile layers, say) are written with the referenced node's ephemeral
// variable name; the normalization pass rewrites them after the walk.

use serde_json::{json, Value};

use crate::tree::{LatLng, MapNode, NodeKind, NodeTemplate};

pub const LEAFLET_JS: &str = "https://cdn.jsdelivr.net/npm/leaflet@1.9.3/dist/leaflet.js";
pub const LEAFLET_CSS: &str = "https://cdn.jsdelivr.net/npm/leaflet@1.9.3/dist/leaflet.css";
pub const JQUERY_JS: &str = "https://code.jquery.com/jquery-3.7.1.min.js";
pub const AWESOME_MARKERS_JS: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/Leaflet.awesome-markers/2.0.2/leaflet.awesome-markers.js";
pub const AWESOME_MARKERS_CSS: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/Leaflet.awesome-markers/2.0.2/leaflet.awesome-markers.css";
pub const DRAW_JS: &str = "https://cdnjs.cloudflare.com/ajax/libs/leaflet.draw/1.0.2/leaflet.draw.js";
pub const DRAW_CSS: &str = "https://cdnjs.cloudflare.com/ajax/libs/leaflet.draw/1.0.2/leaflet.draw.css";
/// Raw JS expression, spliced into the map options unquoted.
pub const DEFAULT_CRS: &str = "L.CRS.EPSG3857";
pub const SYNC_JS: &str = "https://cdn.jsdelivr.net/gh/jieter/Leaflet.Sync/L.Map.Sync.min.js";

const MAP_SCRIPT: &str = r#"
    var {{ this.var }} = L.map(
        "{{ this.var }}",
        {
            crs: {{ this.attrs.crs }},
            ...{{ this.options }}
        }
    );
"#;

const TILE_LAYER_SCRIPT: &str = r#"
    var {{ this.var }} = L.tileLayer(
        {{ this.attrs.url | json }},
        {{ this.options }}
    );
    {{ this.var }}.addTo({{ parent.var }});
"#;

const MARKER_SCRIPT: &str = r#"
    var {{ this.var }} = L.marker(
        {{ this.location }},
        {{ this.options }}
    ).addTo({{ parent.var }});
"#;

const CIRCLE_SCRIPT: &str = r#"
    var {{ this.var }} = L.circle(
        {{ this.location }},
        {{ this.options }}
    ).addTo({{ parent.var }});
"#;

const PATH_SCRIPT: &str = r#"
    var {{ this.var }} = L.{{ this.attrs.factory }}(
        {{ this.attrs.locations }},
        {{ this.options }}
    ).addTo({{ parent.var }});
"#;

const POPUP_SCRIPT: &str = r#"
    var {{ this.var }} = L.popup({{ this.options }});
    var html_{{ this.var }} = $(`<div style="width: 100.0%; height: 100.0%;">{{ this.attrs.html }}</div>`)[0];
    {{ this.var }}.setContent(html_{{ this.var }});
    {{ parent.var }}.bindPopup({{ this.var }});
"#;

const TOOLTIP_SCRIPT: &str = r#"
    {{ parent.var }}.bindTooltip(
        `<div>{{ this.attrs.text }}</div>`,
        {{ this.options }}
    );
"#;

const FEATURE_GROUP_SCRIPT: &str = r#"
    var {{ this.var }} = L.featureGroup(
        {{ this.options }}
    );
    {{ this.var }}.addTo({{ parent.var }});
"#;

const LAYER_CONTROL_SCRIPT: &str = r#"
    var {{ this.var }}_layers = {
        base_layers : { {{ this.attrs.base_layers }} },
        overlays :  { {{ this.attrs.overlays }} },
    };
    let {{ this.var }} = L.control.layers(
        {{ this.var }}_layers.base_layers,
        {{ this.var }}_layers.overlays,
        {{ this.options }}
    ).addTo({{ parent.var }});
"#;

const DRAW_SCRIPT: &str = r#"
    var options = {
        position: {{ this.options.position | json }},
        draw: {{ this.options.draw_options }},
        edit: {{ this.options.edit_options }},
    }
    var drawnItems_{{ this.var }} = new L.featureGroup().addTo(
        {{ parent.var }}
    );
    options.edit.featureGroup = drawnItems_{{ this.var }};
    var {{ this.var }} = new L.Control.Draw(
        options
    ).addTo( {{ parent.var }} );
    {{ parent.var }}.on(L.Draw.Event.CREATED, function(e) {
        var layer = e.layer,
            type = e.layerType;
        var coords = JSON.stringify(layer.toGeoJSON());
        layer.on('click', function() {
            alert(coords);
            console.log(coords);
        });
        drawnItems_{{ this.var }}.addLayer(layer);
    });
"#;

const COLOR_SCALE_SCRIPT: &str = r#"
    var {{ this.var }} = {};
    {{ this.var }}.color = d3.scale.threshold()
        .domain({{ this.options.index }})
        .range({{ this.options.colors }});
    {{ this.var }}.legend = L.control({position: 'topright'});
    {{ this.var }}.legend.onAdd = function (map) {
        var div = L.DomUtil.create('div', 'legend');
        div.innerHTML = {{ this.attrs.caption | json }};
        return div;
    };
    {{ this.var }}.legend.addTo({{ parent.var }});
"#;

const DUAL_MAP_SCRIPT: &str = r#"
    {{ children.0.var }}.sync({{ children.1.var }});
    {{ children.1.var }}.sync({{ children.0.var }});
"#;

pub fn figure() -> MapNode {
    MapNode::new(NodeKind::Figure, "figure")
}

pub fn map(center: LatLng, zoom: u32) -> MapNode {
    MapNode::new(NodeKind::Map, "map")
        .with_attr("crs", DEFAULT_CRS)
        .with_option("center", json!([center.lat, center.lng]))
        .with_option("zoom", zoom)
        .with_option("zoomControl", true)
        .with_option("preferCanvas", false)
        .with_template(NodeTemplate::script(MAP_SCRIPT))
        .with_css(LEAFLET_CSS)
        .with_css(AWESOME_MARKERS_CSS)
        .with_js(LEAFLET_JS)
        .with_js(JQUERY_JS)
        .with_js(AWESOME_MARKERS_JS)
}

pub fn tile_layer(url: &str, attribution: &str) -> MapNode {
    MapNode::new(NodeKind::Element, "tile_layer")
        .with_attr("url", url)
        .with_option("attribution", attribution)
        .with_option("maxZoom", 19)
        .with_option("minZoom", 0)
        .with_template(NodeTemplate::script(TILE_LAYER_SCRIPT))
}

pub fn open_street_map() -> MapNode {
    tile_layer(
        "https://tile.openstreetmap.org/{z}/{x}/{y}.png",
        "&copy; OpenStreetMap contributors",
    )
}

pub fn marker(location: LatLng) -> MapNode {
    MapNode::new(NodeKind::Element, "marker")
        .with_location(location)
        .with_template(NodeTemplate::script(MARKER_SCRIPT))
}

pub fn circle(location: LatLng, radius_m: f64) -> MapNode {
    MapNode::new(NodeKind::Element, "circle")
        .with_location(location)
        .with_option("radius", radius_m)
        .with_template(NodeTemplate::script(CIRCLE_SCRIPT))
}

pub fn polyline(points: &[LatLng]) -> MapNode {
    path_node("poly_line", "polyline", points)
}

pub fn polygon(points: &[LatLng]) -> MapNode {
    path_node("polygon", "polygon", points)
}

fn path_node(name: &str, factory: &str, points: &[LatLng]) -> MapNode {
    let locations: Vec<Value> = points.iter().map(|p| json!([p.lat, p.lng])).collect();
    let mut node = MapNode::new(NodeKind::Element, name)
        .with_attr("factory", factory)
        .with_attr("locations", Value::Array(locations).to_string())
        .with_template(NodeTemplate::script(PATH_SCRIPT));
    node.extent = footprint(points);
    node
}

fn footprint(points: &[LatLng]) -> Option<[LatLng; 2]> {
    let first = points.first()?;
    let mut south_west = *first;
    let mut north_east = *first;
    for p in &points[1..] {
        south_west.lat = south_west.lat.min(p.lat);
        south_west.lng = south_west.lng.min(p.lng);
        north_east.lat = north_east.lat.max(p.lat);
        north_east.lng = north_east.lng.max(p.lng);
    }
    Some([south_west, north_east])
}

/// Popup bound to its parent.
pub fn popup(html: &str) -> MapNode {
    MapNode::new(NodeKind::Element, "popup")
        .with_attr("html", html)
        .with_option("maxWidth", "100%")
        .with_template(NodeTemplate::script(POPUP_SCRIPT))
}

pub fn tooltip(text: &str) -> MapNode {
    MapNode::new(NodeKind::Element, "tooltip")
        .with_attr("text", text)
        .with_option("sticky", true)
        .with_template(NodeTemplate::script(TOOLTIP_SCRIPT))
}

pub fn feature_group(name: &str) -> MapNode {
    MapNode::new(NodeKind::FeatureGroup, "feature_group")
        .with_option("name", name)
        .with_option("overlay", true)
        .with_option("control", true)
        .with_option("show", true)
        .with_template(NodeTemplate::script(FEATURE_GROUP_SCRIPT))
}

/// Layer switcher over already-constructed layers, given as
/// `(label, layer)` pairs.
pub fn layer_control(base_layers: &[(&str, &MapNode)], overlays: &[(&str, &MapNode)]) -> MapNode {
    MapNode::new(NodeKind::Control, "layer_control")
        .with_attr("base_layers", layer_entries(base_layers))
        .with_attr("overlays", layer_entries(overlays))
        .with_option("position", "topright")
        .with_option("collapsed", true)
        .with_option("autoZIndex", true)
        .with_template(NodeTemplate::script(LAYER_CONTROL_SCRIPT))
}

fn layer_entries(layers: &[(&str, &MapNode)]) -> String {
    layers
        .iter()
        .map(|(label, node)| format!("{} : {},", Value::from(*label), node.ephemeral_var()))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn draw(export: bool) -> MapNode {
    MapNode::new(NodeKind::Control, "draw_control")
        .with_option("position", "topleft")
        .with_option("export", export)
        .with_option("draw_options", json!({}))
        .with_option("edit_options", json!({}))
        .with_template(NodeTemplate::script(DRAW_SCRIPT))
        .with_css(DRAW_CSS)
        .with_js(DRAW_JS)
}

/// Threshold color legend. The orchestrator adds the d3 scripts it needs.
pub fn color_scale(colors: &[&str], index: &[f64], caption: &str) -> MapNode {
    MapNode::new(NodeKind::ColorScale, "color_map")
        .with_option("colors", json!(colors))
        .with_option("index", json!(index))
        .with_attr("caption", caption)
        .with_template(NodeTemplate::script(COLOR_SCALE_SCRIPT))
}

/// Side-by-side container; attach exactly two `map` panes as children.
pub fn dual_map() -> MapNode {
    MapNode::new(NodeKind::DualMap, "dual_map")
        .with_template(NodeTemplate::script(DUAL_MAP_SCRIPT))
        .with_js(SYNC_JS)
}

/// Arbitrary element with a caller-supplied script template.
pub fn element(name: &str, script: &str) -> MapNode {
    MapNode::new(NodeKind::Element, name).with_template(NodeTemplate::script(script))
}

/// Default node for a built-in object name. Scene files borrow its template
/// and assets when they do not bring their own.
pub fn builtin(name: &str) -> Option<MapNode> {
    let origin = LatLng::new(0.0, 0.0);
    let node = match name {
        "figure" => figure(),
        "map" => map(origin, 0),
        "tile_layer" => tile_layer("", ""),
        "marker" => marker(origin),
        "circle" => circle(origin, 0.0),
        "poly_line" => polyline(&[]),
        "polygon" => polygon(&[]),
        "popup" => popup(""),
        "tooltip" => tooltip(""),
        "feature_group" => feature_group(""),
        "layer_control" => layer_control(&[], &[]),
        "draw_control" => draw(false),
        "color_map" => color_scale(&[], &[], ""),
        "dual_map" => dual_map(),
        _ => return None,
    };
    Some(node)
}
