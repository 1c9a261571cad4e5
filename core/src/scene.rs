// leafweave-core/src/scene.rs
// JSON scene files: a nested node description plus render options.
//
// Nodes named after a built-in object borrow its template and assets unless
// the scene supplies them. Nodes carrying a `role` are kept out of the map
// and handed to the dynamic-addition transcoders instead.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::component::RenderOptions;
use crate::error::TranscodeError;
use crate::leaflet;
use crate::template::slot_roots;
use crate::tree::{Assets, AuxRoles, LatLng, MapNode, MapTree, NodeId, NodeKind, NodeTemplate};

const SLOT_ROOTS: [&str; 3] = ["this", "parent", "children"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneRole {
    FeatureGroup,
    LayerControl,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SceneNode {
    pub kind: NodeKind,
    #[serde(default)]
    pub name: Option<String>,
    /// Pinned ephemeral id; generated when absent.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub options: Map<String, Value>,
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    #[serde(default)]
    pub template: Option<NodeTemplate>,
    #[serde(default)]
    pub location: Option<LatLng>,
    #[serde(default)]
    pub extent: Option<[LatLng; 2]>,
    #[serde(default)]
    pub css: Vec<String>,
    #[serde(default)]
    pub js: Vec<String>,
    #[serde(default)]
    pub aux: Option<AuxRoles>,
    #[serde(default)]
    pub children: Vec<SceneNode>,
    #[serde(default)]
    pub role: Option<SceneRole>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scene {
    pub root: SceneNode,
    #[serde(default)]
    pub options: RenderOptions,
}

#[derive(Debug, Clone)]
pub struct LoadedScene {
    pub tree: MapTree,
    /// Scene options with `feature_groups` and `layer_control` filled from
    /// the role-tagged nodes.
    pub options: RenderOptions,
}

impl Scene {
    pub fn from_json(text: &str) -> Result<Self, TranscodeError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn build(self) -> Result<LoadedScene, TranscodeError> {
        let Scene { root, mut options } = self;
        let (node, children, role) = root.into_parts()?;
        if role.is_some() {
            return Err(scene_error("the root node cannot carry a role"));
        }
        let mut tree = MapTree::new(node);
        let root_id = tree.root();
        for child in children {
            insert(&mut tree, root_id, child, &mut options)?;
        }
        Ok(LoadedScene { tree, options })
    }
}

fn insert(tree: &mut MapTree, parent: NodeId, scene: SceneNode, options: &mut RenderOptions) -> Result<(), TranscodeError> {
    let (node, children, role) = scene.into_parts()?;
    let id = match role {
        None => tree.add_child(parent, node)?,
        Some(SceneRole::FeatureGroup) => {
            let id = tree.add(node);
            options.feature_groups.push(id);
            id
        }
        Some(SceneRole::LayerControl) => {
            if options.layer_control.is_some() {
                return Err(scene_error("only one node may have the layer_control role"));
            }
            let id = tree.add(node);
            options.layer_control = Some(id);
            id
        }
    };
    for child in children {
        insert(tree, id, child, options)?;
    }
    Ok(())
}

impl SceneNode {
    fn into_parts(self) -> Result<(MapNode, Vec<SceneNode>, Option<SceneRole>), TranscodeError> {
        let name = self.name.unwrap_or_else(|| default_name(self.kind).to_string());
        let builtin = leaflet::builtin(&name);

        let mut node = MapNode::new(self.kind, name);
        if let Some(id) = self.id {
            check_id(&id)?;
            node = node.with_ephemeral_id(id);
        }

        let template = match (self.template, &builtin) {
            (Some(template), _) => template,
            (None, Some(builtin)) => builtin.template.clone(),
            (None, None) => NodeTemplate::default(),
        };
        check_template(&node.name, &template)?;

        node.assets = match &builtin {
            Some(builtin) if self.css.is_empty() && self.js.is_empty() => builtin.assets.clone(),
            _ => Assets {
                css: self.css,
                js: self.js,
            },
        };
        let mut attrs = builtin.map(|builtin| builtin.attrs).unwrap_or_default();
        attrs.extend(self.attrs);

        node.template = template;
        node.options = self.options;
        node.attrs = attrs;
        node.location = self.location;
        node.extent = self.extent;
        node.aux = self.aux;
        Ok((node, self.children, self.role))
    }
}

fn default_name(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Figure => "figure",
        NodeKind::Map => "map",
        NodeKind::DualMap => "dual_map",
        NodeKind::FeatureGroup => "feature_group",
        NodeKind::Control => "control",
        NodeKind::ColorScale => "color_map",
        NodeKind::Element => "element",
    }
}

const MIN_PINNED_ID_LEN: usize = 8;

/// Pinned ids must look like generated ones (lowercase alphanumerics) or the
/// normalization pass cannot find them in the script. Short or all-digit ids
/// would match segments of stable names (`div`, `1`) and get rewritten there.
fn check_id(id: &str) -> Result<(), TranscodeError> {
    if !id.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()) {
        return Err(scene_error(&format!("node id '{}' must be lowercase alphanumeric", id)));
    }
    if id.len() < MIN_PINNED_ID_LEN || id.chars().all(|c| c.is_ascii_digit()) {
        return Err(scene_error(&format!(
            "node id '{}' must have at least {} characters and a letter",
            id, MIN_PINNED_ID_LEN
        )));
    }
    Ok(())
}

fn check_template(name: &str, template: &NodeTemplate) -> Result<(), TranscodeError> {
    let bodies = [
        Some(template.script.as_str()),
        template.page.as_deref(),
        template.html.as_deref(),
    ];
    for body in bodies.into_iter().flatten() {
        let roots = slot_roots(body).map_err(|err| scene_error(&format!("node '{}': {}", name, err)))?;
        if let Some(root) = roots.iter().find(|root| !SLOT_ROOTS.contains(&root.as_str())) {
            return Err(scene_error(&format!("node '{}': unknown slot root '{}'", name, root)));
        }
    }
    Ok(())
}

fn scene_error(message: &str) -> TranscodeError {
    TranscodeError::Scene {
        message: message.to_string(),
    }
}
