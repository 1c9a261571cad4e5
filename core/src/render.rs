// leafweave-core/src/render.rs
// Tree walk that stitches single-node fragments into one script.
//
// Stable ids are positional: the root takes the caller's base id and the
// child at index `i` of a node with id `p` takes `p_i`. A dual map renders
// its first pane under the base id, its second pane under `div2`, and then
// its own link fragment, which needs both panes already mapped.

use tracing::debug;

use crate::error::{TemplateError, TranscodeError};
use crate::ids::{child_id, IdentifierMapping};
use crate::normalize::normalize;
use crate::source::{FragmentContext, FragmentSource};
use crate::tree::{MapTree, NodeId, NodeKind};

pub const DEFAULT_BASE_ID: &str = "div";
pub const DUAL_SECOND_BASE: &str = "div2";

/// Script text generated from one node (and, when nested, its subtree).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptFragment {
    pub stable_id: String,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct RenderedScript {
    pub script: String,
    pub mapping: IdentifierMapping,
}

pub struct FragmentRenderer<'a, S: FragmentSource + ?Sized> {
    source: &'a S,
    tree: &'a MapTree,
}

impl<'a, S: FragmentSource + ?Sized> FragmentRenderer<'a, S> {
    pub fn new(source: &'a S, tree: &'a MapTree) -> Self {
        Self { source, tree }
    }

    /// Renders `node` under `base_id`. `lineage` lists the logical ancestors
    /// of `node`, nearest last.
    pub fn render(
        &self,
        node: NodeId,
        nested: bool,
        base_id: &str,
        lineage: &[NodeId],
        mapping: &mut IdentifierMapping,
    ) -> Result<ScriptFragment, TemplateError> {
        mapping.assign(self.tree, node, base_id, lineage);

        let text = if self.tree[node].kind == NodeKind::DualMap {
            self.render_dual(node, nested, base_id, lineage, mapping)?
        } else {
            let mut text = self.own_fragment(node, base_id, lineage.last().copied(), mapping)?;
            if nested {
                self.append_children(node, base_id, lineage, mapping, &mut text)?;
            }
            text
        };

        Ok(ScriptFragment {
            stable_id: base_id.to_string(),
            text,
        })
    }

    fn own_fragment(
        &self,
        node: NodeId,
        stable_id: &str,
        parent: Option<NodeId>,
        mapping: &IdentifierMapping,
    ) -> Result<String, TemplateError> {
        let ctx = FragmentContext {
            tree: self.tree,
            node,
            stable_id,
            parent,
            mapping,
        };
        match self.source.render_fragment(&ctx) {
            Err(TemplateError::Undefined { path }) => {
                debug!(stable_id, path = %path, "retrying fragment through alternate path");
                self.source.render_alternate(&ctx)
            }
            other => other,
        }
    }

    fn append_children(
        &self,
        node: NodeId,
        base_id: &str,
        lineage: &[NodeId],
        mapping: &mut IdentifierMapping,
        text: &mut String,
    ) -> Result<(), TemplateError> {
        let child_lineage = extend(lineage, node);
        for (idx, child) in self.tree.children(node).iter().enumerate() {
            let child_base = child_id(base_id, idx);
            match self.render(*child, true, &child_base, &child_lineage, mapping) {
                Ok(fragment) => {
                    text.push('\n');
                    text.push_str(&fragment.text);
                }
                Err(err) if err.is_skippable() => {
                    debug!(stable_id = %child_base, code = err.code(), "skipping child fragment: {}", err);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    fn render_dual(
        &self,
        node: NodeId,
        nested: bool,
        base_id: &str,
        lineage: &[NodeId],
        mapping: &mut IdentifierMapping,
    ) -> Result<String, TemplateError> {
        let panes = self.tree.children(node);
        let (first, second) = match panes {
            [first, second, ..] => (*first, *second),
            _ => {
                return Err(TemplateError::MissingAttribute {
                    name: "panes".to_string(),
                })
            }
        };
        let pane_lineage = extend(lineage, node);

        if !nested {
            return Ok(self.render(first, false, base_id, &pane_lineage, mapping)?.text);
        }

        let mut text = self.render(first, true, base_id, &pane_lineage, mapping)?.text;
        text.push('\n');
        text.push_str(&self.render(second, true, DUAL_SECOND_BASE, &pane_lineage, mapping)?.text);
        text.push_str(&self.own_fragment(node, base_id, lineage.last().copied(), mapping)?);
        Ok(text)
    }
}

fn extend(lineage: &[NodeId], node: NodeId) -> Vec<NodeId> {
    let mut out = lineage.to_vec();
    out.push(node);
    out
}

/// Tree ancestors of `node`, root first.
pub fn ancestors(tree: &MapTree, node: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut cursor = tree.parent(node);
    while let Some(id) = cursor {
        out.push(id);
        cursor = tree.parent(id);
    }
    out.reverse();
    out
}

/// Renders `node` with a fresh mapping and runs the normalization pass.
pub fn render_tree<S: FragmentSource + ?Sized>(
    source: &S,
    tree: &MapTree,
    node: NodeId,
    nested: bool,
    base_id: &str,
) -> Result<RenderedScript, TranscodeError> {
    tree.node(node)?;
    let lineage = ancestors(tree, node);
    render_with_mapping(source, tree, node, nested, base_id, &lineage, IdentifierMapping::new())
}

/// Like `render_tree`, but with an explicit lineage and a seed mapping so
/// nodes rendered earlier resolve to their stable names.
pub fn render_with_mapping<S: FragmentSource + ?Sized>(
    source: &S,
    tree: &MapTree,
    node: NodeId,
    nested: bool,
    base_id: &str,
    lineage: &[NodeId],
    mut mapping: IdentifierMapping,
) -> Result<RenderedScript, TranscodeError> {
    let renderer = FragmentRenderer::new(source, tree);
    let fragment = renderer
        .render(node, nested, base_id, lineage, &mut mapping)
        .map_err(|source| TranscodeError::Template {
            stable_id: base_id.to_string(),
            source,
        })?;
    let script = normalize(&fragment.text, &mapping);
    Ok(RenderedScript { script, mapping })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::TemplateSource;
    use crate::tree::{MapNode, NodeTemplate};

    fn node(kind: NodeKind, name: &str, id: &str, script: &str) -> MapNode {
        MapNode::new(kind, name)
            .with_ephemeral_id(id)
            .with_template(NodeTemplate::script(script))
    }

    #[test]
    fn children_get_positional_ids() {
        let mut tree = MapTree::new(node(NodeKind::Map, "map", "m1", "var {{ this.var }};"));
        let root = tree.root();
        let layer = tree
            .add_child(root, node(NodeKind::Element, "tile_layer", "t1", "{{ this.var }}.addTo({{ parent.var }});"))
            .unwrap();
        tree.add_child(layer, node(NodeKind::Element, "popup", "p1", "{{ this.var }}.addTo({{ parent.var }});"))
            .unwrap();
        tree.add_child(root, node(NodeKind::Element, "marker", "k1", "{{ this.var }}.addTo({{ parent.var }});"))
            .unwrap();

        let rendered = render_tree(&TemplateSource, &tree, root, true, DEFAULT_BASE_ID).unwrap();
        assert_eq!(
            rendered.script,
            "var map_div;\n\
             tile_layer_div_0.addTo(map_div);\n\
             popup_div_0_0.addTo(tile_layer_div_0);\n\
             marker_div_1.addTo(map_div);"
        );
        assert_eq!(rendered.mapping.get("p1"), Some("div_0_0"));
    }

    #[test]
    fn non_nested_render_stops_at_node() {
        let mut tree = MapTree::new(node(NodeKind::Map, "map", "m1", "var {{ this.var }};"));
        let root = tree.root();
        tree.add_child(root, node(NodeKind::Element, "marker", "k1", "{{ this.var }};"))
            .unwrap();
        let rendered = render_tree(&TemplateSource, &tree, root, false, "base").unwrap();
        assert_eq!(rendered.script, "var map_base;");
        assert!(!rendered.mapping.contains("k1"));
    }

    #[test]
    fn root_failure_is_reported() {
        let tree = MapTree::new(node(NodeKind::Map, "map", "m1", "{{ this.attrs.nothing }}"));
        let err = render_tree(&TemplateSource, &tree, tree.root(), true, "div").unwrap_err();
        assert_eq!(err.code(), "E_TEMPLATE_MISSING_ATTR");
    }

    #[test]
    fn syntax_errors_in_children_propagate() {
        let mut tree = MapTree::new(node(NodeKind::Map, "map", "m1", "var {{ this.var }};"));
        let root = tree.root();
        tree.add_child(root, node(NodeKind::Element, "marker", "k1", "{{ this.var "))
            .unwrap();
        let err = render_tree(&TemplateSource, &tree, root, true, "div").unwrap_err();
        assert_eq!(err.code(), "E_TEMPLATE_SYNTAX");
    }

    #[test]
    fn ancestors_are_root_first() {
        let mut tree = MapTree::new(MapNode::new(NodeKind::Figure, "figure"));
        let figure = tree.root();
        let map = tree.add_child(figure, MapNode::new(NodeKind::Map, "map")).unwrap();
        let marker = tree.add_child(map, MapNode::new(NodeKind::Element, "marker")).unwrap();
        assert_eq!(ancestors(&tree, marker), vec![figure, map]);
        assert!(ancestors(&tree, figure).is_empty());
    }
}
