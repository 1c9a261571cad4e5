// leafweave-core/src/tree.rs
// Arena-backed object tree consumed by the transcoder.
//
// Every node gets an ephemeral id (v4 uuid, 32 lowercase hex chars) when it is
// constructed. The arena owns all nodes; `parent` is a back-reference only.

use std::collections::BTreeMap;
use std::ops::Index;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::TranscodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Page-level container; its first child is the map.
    Figure,
    Map,
    /// Two map panes kept in view-sync. Children 0 and 1 are the panes.
    DualMap,
    FeatureGroup,
    Control,
    ColorScale,
    Element,
}

impl NodeKind {
    pub fn is_map(self) -> bool {
        matches!(self, NodeKind::Map | NodeKind::DualMap)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Template bodies the built-in collaborator renders.
///
/// `script` is the primary entry point, `page` the alternate path tried when
/// `script` hits an undefined slot, `html` the markup emitted for figure
/// siblings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeTemplate {
    #[serde(default)]
    pub script: String,
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
}

impl NodeTemplate {
    pub fn script(body: impl Into<String>) -> Self {
        Self {
            script: body.into(),
            page: None,
            html: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assets {
    pub css: Vec<String>,
    pub js: Vec<String>,
}

/// Names of the logical "element" and "parent element" a plugin control
/// points at, e.g. `map_<ephemeral>`. Used by controls that reference a
/// sibling rather than their tree parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuxRoles {
    pub element_name: String,
    pub element_parent_name: String,
}

#[derive(Debug, Clone)]
pub struct MapNode {
    ephemeral_id: String,
    pub kind: NodeKind,
    /// snake_case variable prefix (`map`, `tile_layer`, `marker`, ...).
    pub name: String,
    pub options: Map<String, Value>,
    pub attrs: BTreeMap<String, String>,
    pub template: NodeTemplate,
    pub location: Option<LatLng>,
    pub extent: Option<[LatLng; 2]>,
    pub assets: Assets,
    pub aux: Option<AuxRoles>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl MapNode {
    pub fn new(kind: NodeKind, name: impl Into<String>) -> Self {
        Self {
            ephemeral_id: Uuid::new_v4().simple().to_string(),
            kind,
            name: name.into(),
            options: Map::new(),
            attrs: BTreeMap::new(),
            template: NodeTemplate::default(),
            location: None,
            extent: None,
            assets: Assets::default(),
            aux: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn ephemeral_id(&self) -> &str {
        &self.ephemeral_id
    }

    /// Overrides the generated id. Scene files and tests use this to pin ids.
    pub fn with_ephemeral_id(mut self, id: impl Into<String>) -> Self {
        self.ephemeral_id = id.into();
        self
    }

    pub fn with_option(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.options.insert(key.to_string(), value.into());
        self
    }

    pub fn with_attr(mut self, key: &str, value: impl Into<String>) -> Self {
        self.attrs.insert(key.to_string(), value.into());
        self
    }

    pub fn with_template(mut self, template: NodeTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn with_location(mut self, location: LatLng) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_extent(mut self, south_west: LatLng, north_east: LatLng) -> Self {
        self.extent = Some([south_west, north_east]);
        self
    }

    pub fn with_css(mut self, href: impl Into<String>) -> Self {
        self.assets.css.push(href.into());
        self
    }

    pub fn with_js(mut self, src: impl Into<String>) -> Self {
        self.assets.js.push(src.into());
        self
    }

    pub fn with_aux(mut self, element_name: &str, element_parent_name: &str) -> Self {
        self.aux = Some(AuxRoles {
            element_name: element_name.to_string(),
            element_parent_name: element_parent_name.to_string(),
        });
        self
    }

    /// `{name}_{id}`: the JS variable for this node under a given id.
    pub fn var_name(&self, id: &str) -> String {
        format!("{}_{}", self.name, id)
    }

    /// Variable name as the object model emits it before remapping.
    pub fn ephemeral_var(&self) -> String {
        self.var_name(&self.ephemeral_id)
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

#[derive(Debug, Clone)]
pub struct MapTree {
    nodes: Vec<MapNode>,
    root: NodeId,
}

impl MapTree {
    pub fn new(root: MapNode) -> Self {
        Self {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&MapNode> {
        self.nodes.get(id.0)
    }

    pub fn node(&self, id: NodeId) -> Result<&MapNode, TranscodeError> {
        self.nodes
            .get(id.0)
            .ok_or(TranscodeError::UnknownNode { id: id.0 })
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut MapNode, TranscodeError> {
        self.nodes
            .get_mut(id.0)
            .ok_or(TranscodeError::UnknownNode { id: id.0 })
    }

    /// Adds a node without a parent. Feature groups and layer controls meant
    /// for dynamic addition live like this.
    pub fn add(&mut self, node: MapNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub fn add_child(&mut self, parent: NodeId, node: MapNode) -> Result<NodeId, TranscodeError> {
        self.node(parent)?;
        let id = self.add(node);
        self.attach_child(parent, id)?;
        Ok(id)
    }

    /// Appends a detached node to `parent`'s children. Re-parenting and
    /// attaching an ancestor are rejected so the tree stays acyclic.
    pub fn attach_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TranscodeError> {
        self.node(parent)?;
        let node = self.node(child)?;
        if node.parent.is_some() || child == self.root || self.is_ancestor(child, parent) {
            return Err(TranscodeError::Scene {
                message: format!("node #{} cannot be attached under #{}", child.0, parent.0),
            });
        }
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        Ok(())
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|node| node.parent)
    }

    /// Pre-order walk starting at (and including) `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if self.get(current).is_none() {
                continue;
            }
            out.push(current);
            for child in self.children(current).iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    fn is_ancestor(&self, candidate: NodeId, of: NodeId) -> bool {
        let mut cursor = Some(of);
        while let Some(id) = cursor {
            if id == candidate {
                return true;
            }
            cursor = self.parent(id);
        }
        false
    }
}

impl Index<NodeId> for MapTree {
    type Output = MapNode;

    fn index(&self, id: NodeId) -> &MapNode {
        &self.nodes[id.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ephemeral_ids_are_uuid_hex() {
        let a = MapNode::new(NodeKind::Map, "map");
        let b = MapNode::new(NodeKind::Map, "map");
        assert_eq!(a.ephemeral_id().len(), 32);
        assert!(a
            .ephemeral_id()
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        assert_ne!(a.ephemeral_id(), b.ephemeral_id());
    }

    #[test]
    fn children_keep_insertion_order() {
        let mut tree = MapTree::new(MapNode::new(NodeKind::Map, "map"));
        let root = tree.root();
        let a = tree.add_child(root, MapNode::new(NodeKind::Element, "tile_layer")).unwrap();
        let b = tree.add_child(root, MapNode::new(NodeKind::Element, "marker")).unwrap();
        let c = tree.add_child(a, MapNode::new(NodeKind::Element, "popup")).unwrap();
        assert_eq!(tree.children(root), &[a, b]);
        assert_eq!(tree.parent(c), Some(a));
        assert_eq!(tree.descendants(root), vec![root, a, c, b]);
    }

    #[test]
    fn attach_rejects_reparent_and_cycles() {
        let mut tree = MapTree::new(MapNode::new(NodeKind::Map, "map"));
        let root = tree.root();
        let group = tree.add_child(root, MapNode::new(NodeKind::FeatureGroup, "feature_group")).unwrap();
        let marker = tree.add_child(group, MapNode::new(NodeKind::Element, "marker")).unwrap();

        assert!(tree.attach_child(root, marker).is_err());
        assert!(tree.attach_child(marker, root).is_err());
        assert!(tree.attach_child(NodeId(99), marker).is_err());
    }

    #[test]
    fn var_name_joins_prefix_and_id() {
        let node = MapNode::new(NodeKind::Element, "tile_layer").with_ephemeral_id("abc123");
        assert_eq!(node.ephemeral_var(), "tile_layer_abc123");
        assert_eq!(node.var_name("div_0"), "tile_layer_div_0");
    }
}
