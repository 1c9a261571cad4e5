// leafweave-core/src/envelope.rs
// Default interaction result handed to the host before the user touches the
// map. After that, the browser runtime sends envelopes of the same shape.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::dynamic::primary_pane;
use crate::tree::{LatLng, MapTree, NodeId, NodeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvelopeField {
    LastClicked,
    LastObjectClicked,
    LastObjectClickedTooltip,
    LastObjectClickedPopup,
    AllDrawings,
    LastActiveDrawing,
    Bounds,
    Zoom,
    LastCircleRadius,
    LastCirclePolygon,
}

impl EnvelopeField {
    /// Canonical order; envelopes always list fields in this order.
    pub const ALL: [EnvelopeField; 10] = [
        EnvelopeField::LastClicked,
        EnvelopeField::LastObjectClicked,
        EnvelopeField::LastObjectClickedTooltip,
        EnvelopeField::LastObjectClickedPopup,
        EnvelopeField::AllDrawings,
        EnvelopeField::LastActiveDrawing,
        EnvelopeField::Bounds,
        EnvelopeField::Zoom,
        EnvelopeField::LastCircleRadius,
        EnvelopeField::LastCirclePolygon,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EnvelopeField::LastClicked => "last_clicked",
            EnvelopeField::LastObjectClicked => "last_object_clicked",
            EnvelopeField::LastObjectClickedTooltip => "last_object_clicked_tooltip",
            EnvelopeField::LastObjectClickedPopup => "last_object_clicked_popup",
            EnvelopeField::AllDrawings => "all_drawings",
            EnvelopeField::LastActiveDrawing => "last_active_drawing",
            EnvelopeField::Bounds => "bounds",
            EnvelopeField::Zoom => "zoom",
            EnvelopeField::LastCircleRadius => "last_circle_radius",
            EnvelopeField::LastCirclePolygon => "last_circle_polygon",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct InteractionEnvelope(Map<String, Value>);

impl InteractionEnvelope {
    /// Every field, with bounds and zoom filled from the map.
    pub fn defaults(tree: &MapTree, map: NodeId) -> Self {
        let mut fields = Map::new();
        for field in EnvelopeField::ALL {
            let value = match field {
                EnvelopeField::Bounds => bounds_to_json(map_bounds(tree, map)),
                EnvelopeField::Zoom => initial_zoom(tree, map),
                _ => Value::Null,
            };
            fields.insert(field.as_str().to_string(), value);
        }
        Self(fields)
    }

    /// Keeps only the listed fields (exact, case-sensitive names). Order
    /// stays canonical whatever order the caller used.
    pub fn restrict(self, returned: Option<&[String]>) -> Self {
        let Some(returned) = returned else {
            return self;
        };
        let fields = self
            .0
            .into_iter()
            .filter(|(name, _)| returned.iter().any(|wanted| wanted == name))
            .collect();
        Self(fields)
    }

    pub fn build(tree: &MapTree, map: NodeId, returned: Option<&[String]>) -> Self {
        Self::defaults(tree, map).restrict(returned)
    }

    pub fn get(&self, field: EnvelopeField) -> Option<&Value> {
        self.0.get(field.as_str())
    }

    pub fn keys(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Smallest box around every located node under `map`, or `None` when
/// nothing in the subtree has a footprint.
pub fn map_bounds(tree: &MapTree, map: NodeId) -> Option<[LatLng; 2]> {
    let mut acc: Option<[LatLng; 2]> = None;
    for id in tree.descendants(map) {
        let node = &tree[id];
        let corners = match (node.location, node.extent) {
            (_, Some(extent)) => extent,
            (Some(loc), None) => [loc, loc],
            (None, None) => continue,
        };
        acc = Some(match acc {
            None => corners,
            Some([sw, ne]) => [
                LatLng::new(sw.lat.min(corners[0].lat), sw.lng.min(corners[0].lng)),
                LatLng::new(ne.lat.max(corners[1].lat), ne.lng.max(corners[1].lng)),
            ],
        });
    }
    acc
}

/// Leaflet's `LatLngBounds` shape. Missing bounds become null corners.
pub fn bounds_to_json(bounds: Option<[LatLng; 2]>) -> Value {
    match bounds {
        Some([sw, ne]) => json!({
            "_southWest": { "lat": sw.lat, "lng": sw.lng },
            "_northEast": { "lat": ne.lat, "lng": ne.lng },
        }),
        None => json!({
            "_southWest": { "lat": null, "lng": null },
            "_northEast": { "lat": null, "lng": null },
        }),
    }
}

/// Configured zoom of the map (a dual map's first pane). `null` when the
/// option is unset, `{}` when the node is not a map at all.
pub fn initial_zoom(tree: &MapTree, map: NodeId) -> Value {
    let pane = primary_pane(tree, map);
    match tree.get(pane) {
        Some(node) if node.kind == NodeKind::Map => {
            node.options.get("zoom").cloned().unwrap_or(Value::Null)
        }
        _ => Value::Object(Map::new()),
    }
}
