// leafweave-core/src/component.rs
// Turns a map tree plus render options into the payload the host page
// mounts: the main script, sibling markup, dynamic additions, the default
// interaction envelope, asset links and the remount key.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::assets::AssetManifest;
use crate::dynamic::{map_full_id, DynamicTranscoder};
use crate::envelope::InteractionEnvelope;
use crate::error::TranscodeError;
use crate::fingerprint::content_fingerprint;
use crate::ids::IdentifierMapping;
use crate::normalize::dedent;
use crate::render::{render_tree, RenderedScript, DEFAULT_BASE_ID, DUAL_SECOND_BASE};
use crate::source::{FragmentContext, FragmentSource};
use crate::tree::{MapTree, NodeId, NodeKind};

const DRAW_ALERT: &str = "alert(coords);";
const DRAWN_ITEMS_GENERATED: &str = "drawnItems_draw_control_div_1";
const DRAWN_ITEMS: &str = "drawnItems";
const DRAWN_ITEMS_FALLBACK: &str = "\nvar drawnItems = [];";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub key: Option<String>,
    pub height: u32,
    pub width: Option<u32>,
    /// Envelope fields to report back; `None` reports all of them.
    pub returned_objects: Option<Vec<String>>,
    pub zoom: Option<u32>,
    pub center: Option<(f64, f64)>,
    pub feature_groups: Vec<NodeId>,
    pub layer_control: Option<NodeId>,
    pub return_on_hover: bool,
    /// Overrides `width`.
    pub use_container_width: bool,
    pub pixelated: bool,
    pub debug: bool,
    /// 0 means unlimited.
    pub max_drawn_objects: u32,
    pub max_drawn_objects_remove_old: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            key: None,
            height: 700,
            width: Some(500),
            returned_objects: None,
            zoom: None,
            center: None,
            feature_groups: Vec::new(),
            layer_control: None,
            return_on_hover: false,
            use_container_width: false,
            pixelated: false,
            debug: false,
            max_drawn_objects: 0,
            max_drawn_objects_remove_old: true,
        }
    }
}

impl RenderOptions {
    pub fn effective_width(&self) -> Option<u32> {
        if self.use_container_width {
            None
        } else {
            self.width
        }
    }

    /// Remount key fed to the fingerprint. Changing the draw limit remounts
    /// the component too. A missing key is empty, so the default is `"_0"`;
    /// changing that changes every stored key.
    pub fn fingerprint_key(&self) -> String {
        format!("{}_{}", self.key.as_deref().unwrap_or(""), self.max_drawn_objects)
    }
}

/// Arguments handed to the host component, field names as the browser side
/// reads them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentPayload {
    pub script: String,
    pub html: String,
    pub id: String,
    pub key: String,
    pub height: u32,
    pub width: Option<u32>,
    pub returned_objects: Option<Vec<String>>,
    pub default: InteractionEnvelope,
    pub zoom: Option<u32>,
    pub center: Option<(f64, f64)>,
    pub feature_group: Option<String>,
    pub return_on_hover: bool,
    pub layer_control: Option<String>,
    pub pixelated: bool,
    pub css_links: Vec<String>,
    pub js_links: Vec<String>,
    pub max_drawn_objects: u32,
    pub max_drawn_objects_remove_old: bool,
}

impl ComponentPayload {
    pub fn to_json(&self) -> Result<String, TranscodeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub struct MapComponent<'a, S: FragmentSource + ?Sized> {
    source: &'a S,
}

impl<'a, S: FragmentSource + ?Sized> MapComponent<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    pub fn render(&self, tree: &MapTree, opts: &RenderOptions) -> Result<ComponentPayload, TranscodeError> {
        let map = locate_map(tree)?;
        let rendered = render_tree(self.source, tree, map, true, DEFAULT_BASE_ID)?;
        let script = clean_map_script(tree, map, &rendered)?;
        let html = self.sibling_html(tree, &rendered.mapping);
        let id = map_full_id(tree, &rendered.mapping, map);
        let default = InteractionEnvelope::build(tree, map, opts.returned_objects.as_deref());

        let mut dynamic = DynamicTranscoder::new(self.source, tree, map, &rendered.mapping);
        let feature_group = if opts.feature_groups.is_empty() {
            None
        } else {
            Some(dynamic.feature_groups(&opts.feature_groups)?)
        };
        let layer_control = opts
            .layer_control
            .map(|control| dynamic.layer_control(control))
            .transpose()?;

        if opts.debug {
            if !html.is_empty() {
                info!(target: "leafweave::debug", "html:\n{}", html);
            }
            info!(target: "leafweave::debug", "main map script:\n{}", script);
            if let Some(code) = &feature_group {
                info!(target: "leafweave::debug", "feature group script:\n{}", code);
            }
            if let Some(code) = &layer_control {
                info!(target: "leafweave::debug", "layer control script:\n{}", code);
            }
        }

        let mut assets = AssetManifest::collect(tree, map);
        for group in &opts.feature_groups {
            assets.extend_with(tree, *group);
        }
        if let Some(control) = opts.layer_control {
            assets.extend_with(tree, control);
        }
        let key = content_fingerprint(&script, &opts.fingerprint_key(), opts.return_on_hover);
        debug!(map_id = %id, key = %key, nodes = tree.len(), "rendered map component");

        Ok(ComponentPayload {
            script,
            html,
            id,
            key,
            height: opts.height,
            width: opts.effective_width(),
            returned_objects: opts.returned_objects.clone(),
            default,
            zoom: opts.zoom,
            center: opts.center,
            feature_group,
            return_on_hover: opts.return_on_hover,
            layer_control,
            pixelated: opts.pixelated,
            css_links: assets.css,
            js_links: assets.js,
            max_drawn_objects: opts.max_drawn_objects,
            max_drawn_objects_remove_old: opts.max_drawn_objects_remove_old,
        })
    }

    /// Markup of every figure child after the map. Children that cannot
    /// render html are left out.
    fn sibling_html(&self, tree: &MapTree, mapping: &IdentifierMapping) -> String {
        let root = tree.root();
        if tree[root].kind != NodeKind::Figure {
            return String::new();
        }
        let mut html = String::new();
        for sibling in tree.children(root).iter().skip(1) {
            let node = &tree[*sibling];
            let ctx = FragmentContext {
                tree,
                node: *sibling,
                stable_id: node.ephemeral_id(),
                parent: Some(root),
                mapping,
            };
            match self.source.render_html(&ctx) {
                Ok(markup) => {
                    html.push_str(&markup);
                    html.push('\n');
                }
                Err(err) => debug!(node = sibling.0, code = err.code(), "no sibling html: {}", err),
            }
        }
        html
    }
}

/// The root when it is a map, otherwise the root's first child.
pub fn locate_map(tree: &MapTree) -> Result<NodeId, TranscodeError> {
    let root = tree.root();
    if tree.node(root)?.kind.is_map() {
        return Ok(root);
    }
    tree.children(root).first().copied().ok_or(TranscodeError::NoMap)
}

/// Second pane of a dual map.
pub fn second_pane(tree: &MapTree, dual: NodeId) -> Result<NodeId, TranscodeError> {
    let node = tree.node(dual)?;
    match (node.kind, tree.children(dual)) {
        (NodeKind::DualMap, [_, second, ..]) => Ok(*second),
        _ => Err(TranscodeError::NotADualMap { id: dual.0 }),
    }
}

/// Fixes up the main script for the browser runtime: drops the draw
/// plugin's click alert, exposes drawn layers as `drawnItems` and pins a
/// dual map's second pane to `map_div2`.
pub fn clean_map_script(tree: &MapTree, map: NodeId, rendered: &RenderedScript) -> Result<String, TranscodeError> {
    let script = rendered
        .script
        .replace(DRAW_ALERT, "")
        .replace(DRAWN_ITEMS_GENERATED, DRAWN_ITEMS);
    let mut script = dedent(&script);
    if !script.contains(DRAWN_ITEMS) {
        script.push_str(DRAWN_ITEMS_FALLBACK);
    }
    if tree.node(map)?.kind == NodeKind::DualMap {
        let pane = second_pane(tree, map)?;
        let pane_id = rendered.mapping.var_of(tree, pane);
        script = script.replace(&pane_id, &format!("map_{}", DUAL_SECOND_BASE));
    }
    Ok(script)
}
