// leafweave-core/src/dynamic.rs
// Layers and controls added to a map that the browser has already mounted.
//
// These fragments run against the live map, which the browser runtime
// always exposes as `map_div`, and they register what they create in
// well-known globals so later additions can find it.

use crate::error::TranscodeError;
use crate::ids::IdentifierMapping;
use crate::normalize::dedent;
use crate::render::{ancestors, render_with_mapping};
use crate::source::FragmentSource;
use crate::tree::{MapTree, NodeId, NodeKind};

/// Variable (and DOM id) under which the browser runtime mounts the map.
pub const MAP_MOUNT_VAR: &str = "map_div";
pub const LAYER_CONTROL_ID: &str = "layer_control";

pub fn feature_group_id(index: usize) -> String {
    format!("feature_group_{}", index)
}

/// Browser-side globals the emitted activation code writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserRegistry {
    /// Append-only list; order follows transcoding order.
    FeatureGroups,
    /// Single slot holding the current layer control.
    LayerControl,
}

impl BrowserRegistry {
    pub fn global(self) -> &'static str {
        match self {
            BrowserRegistry::FeatureGroups => "window.feature_group",
            BrowserRegistry::LayerControl => "window.layer_control",
        }
    }

    pub fn activation(self, var: &str) -> String {
        let global = self.global();
        match self {
            BrowserRegistry::FeatureGroups => format!(
                "\n{mount}.addLayer({var});\n{global} = {global} || [];\n{global}.push({var});\n",
                mount = MAP_MOUNT_VAR,
            ),
            BrowserRegistry::LayerControl => format!("\n{global} = {var};\n"),
        }
    }
}

/// The pane that owns the map variable: the map itself, or a dual map's
/// first pane.
pub fn primary_pane(tree: &MapTree, map: NodeId) -> NodeId {
    match tree.get(map) {
        Some(node) if node.kind == NodeKind::DualMap => {
            tree.children(map).first().copied().unwrap_or(map)
        }
        _ => map,
    }
}

/// `map_<stable>` for the map's primary pane.
pub fn map_full_id(tree: &MapTree, mapping: &IdentifierMapping, map: NodeId) -> String {
    mapping.var_of(tree, primary_pane(tree, map))
}

pub struct DynamicTranscoder<'a, S: FragmentSource + ?Sized> {
    source: &'a S,
    tree: &'a MapTree,
    map: NodeId,
    /// Starts as a copy of the map's own mapping and grows with every
    /// addition, so a layer control sees the names earlier groups were
    /// given.
    mapping: IdentifierMapping,
}

impl<'a, S: FragmentSource + ?Sized> DynamicTranscoder<'a, S> {
    pub fn new(source: &'a S, tree: &'a MapTree, map: NodeId, mapping: &IdentifierMapping) -> Self {
        Self {
            source,
            tree,
            map,
            mapping: mapping.clone(),
        }
    }

    pub fn mapping(&self) -> &IdentifierMapping {
        &self.mapping
    }

    pub fn feature_group(&mut self, group: NodeId, index: usize) -> Result<String, TranscodeError> {
        let base_id = feature_group_id(index);
        let var = self.tree.node(group)?.var_name(&base_id);
        let mut script = self.transcode(group, &base_id)?;
        script.push_str(&BrowserRegistry::FeatureGroups.activation(&var));
        Ok(script)
    }

    /// Feature groups in call order, indexed from zero.
    pub fn feature_groups(&mut self, groups: &[NodeId]) -> Result<String, TranscodeError> {
        let mut script = String::new();
        for (index, group) in groups.iter().enumerate() {
            script.push_str(&self.feature_group(*group, index)?);
        }
        Ok(script)
    }

    pub fn layer_control(&mut self, control: NodeId) -> Result<String, TranscodeError> {
        let var = self.tree.node(control)?.var_name(LAYER_CONTROL_ID);
        let mut script = self.transcode(control, LAYER_CONTROL_ID)?;
        script.push_str(&BrowserRegistry::LayerControl.activation(&var));
        Ok(script)
    }

    fn transcode(&mut self, node: NodeId, base_id: &str) -> Result<String, TranscodeError> {
        self.tree.node(self.map)?;
        let pane = primary_pane(self.tree, self.map);
        let mut lineage = ancestors(self.tree, pane);
        lineage.push(pane);

        let rendered = render_with_mapping(
            self.source,
            self.tree,
            node,
            true,
            base_id,
            &lineage,
            self.mapping.clone(),
        )?;
        let full_id = map_full_id(self.tree, &rendered.mapping, self.map);
        self.mapping = rendered.mapping;
        Ok(dedent(&rendered.script.replace(&full_id, MAP_MOUNT_VAR)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_group_activation_registers_in_order() {
        let snippet = BrowserRegistry::FeatureGroups.activation("feature_group_feature_group_0");
        assert_eq!(
            snippet,
            "\nmap_div.addLayer(feature_group_feature_group_0);\n\
             window.feature_group = window.feature_group || [];\n\
             window.feature_group.push(feature_group_feature_group_0);\n"
        );
    }

    #[test]
    fn layer_control_activation_assigns_slot() {
        assert_eq!(
            BrowserRegistry::LayerControl.activation("layer_control_layer_control"),
            "\nwindow.layer_control = layer_control_layer_control;\n"
        );
    }

    #[test]
    fn ids_are_index_derived() {
        assert_eq!(feature_group_id(2), "feature_group_2");
    }

    #[test]
    fn groups_render_against_the_mounted_map() {
        use crate::leaflet;
        use crate::render::{render_tree, DEFAULT_BASE_ID};
        use crate::source::TemplateSource;
        use crate::tree::LatLng;

        let mut tree = MapTree::new(leaflet::map(LatLng::new(0.0, 0.0), 3));
        let map = tree.root();
        let group = tree.add(leaflet::feature_group("Parks"));
        tree.add_child(group, leaflet::marker(LatLng::new(1.0, 2.0))).unwrap();

        let main = render_tree(&TemplateSource, &tree, map, true, DEFAULT_BASE_ID).unwrap();
        let mut dynamic = DynamicTranscoder::new(&TemplateSource, &tree, map, &main.mapping);
        let script = dynamic.feature_group(group, 0).unwrap();

        assert!(script.trim_start().starts_with("var feature_group_feature_group_0 = L.featureGroup("));
        assert!(script.contains("feature_group_feature_group_0.addTo(map_div);"));
        assert!(script.contains(").addTo(feature_group_feature_group_0);"));
        assert!(script.contains("marker_feature_group_0_0"));
        assert_eq!(dynamic.mapping().get(tree[group].ephemeral_id()), Some("feature_group_0"));
        // the transcoder never attaches the group
        assert_eq!(tree.parent(group), None);
    }
}
