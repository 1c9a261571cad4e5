// leafweave-core/src/source.rs
// Single-node rendering collaborator.
//
// The transcoder never asks a collaborator for more than one node at a time.
// Instead of writing the stable id onto the node before rendering, the walk
// hands the collaborator a `FragmentContext` that carries it, together with
// the mapping built so far for resolving neighbours.

use serde_json::Value;

use crate::error::TemplateError;
use crate::ids::IdentifierMapping;
use crate::template::{render_template, SlotResolver, SlotValue};
use crate::tree::{MapNode, MapTree, NodeId};

pub struct FragmentContext<'a> {
    pub tree: &'a MapTree,
    pub node: NodeId,
    pub stable_id: &'a str,
    /// Logical parent. For dynamically added layers this is the map, even
    /// though the layer is not attached to it in the tree.
    pub parent: Option<NodeId>,
    pub mapping: &'a IdentifierMapping,
}

impl<'a> FragmentContext<'a> {
    pub fn current(&self) -> &'a MapNode {
        &self.tree[self.node]
    }

    pub fn var(&self) -> String {
        self.current().var_name(self.stable_id)
    }
}

pub trait FragmentSource {
    /// Script for this node alone, without its children.
    fn render_fragment(&self, ctx: &FragmentContext<'_>) -> Result<String, TemplateError>;

    /// Fallback entry point tried when `render_fragment` hits an undefined
    /// slot.
    fn render_alternate(&self, ctx: &FragmentContext<'_>) -> Result<String, TemplateError>;

    /// Markup emitted next to the map for page-level siblings.
    fn render_html(&self, ctx: &FragmentContext<'_>) -> Result<String, TemplateError>;
}

/// Built-in collaborator that renders each node's `NodeTemplate`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateSource;

impl FragmentSource for TemplateSource {
    fn render_fragment(&self, ctx: &FragmentContext<'_>) -> Result<String, TemplateError> {
        let body = &ctx.current().template.script;
        if body.is_empty() {
            return Err(TemplateError::Undefined {
                path: "script".to_string(),
            });
        }
        render_template(body, ctx)
    }

    fn render_alternate(&self, ctx: &FragmentContext<'_>) -> Result<String, TemplateError> {
        match &ctx.current().template.page {
            Some(body) => render_template(body, ctx),
            None => Err(TemplateError::MissingAttribute {
                name: "page".to_string(),
            }),
        }
    }

    fn render_html(&self, ctx: &FragmentContext<'_>) -> Result<String, TemplateError> {
        match &ctx.current().template.html {
            Some(body) => render_template(body, ctx),
            None => Err(TemplateError::MissingAttribute {
                name: "html".to_string(),
            }),
        }
    }
}

impl SlotResolver for FragmentContext<'_> {
    fn resolve(&self, path: &[String]) -> Result<SlotValue, TemplateError> {
        let undefined = || TemplateError::Undefined {
            path: path.join("."),
        };
        let segments: Vec<&str> = path.iter().map(String::as_str).collect();
        let node = self.current();

        match segments.as_slice() {
            ["this", "var"] => Ok(SlotValue::Text(self.var())),
            ["this", "id"] => Ok(SlotValue::Text(self.stable_id.to_string())),
            ["this", "name"] => Ok(SlotValue::Text(node.name.clone())),
            ["this", "options"] => Ok(SlotValue::Json(Value::Object(node.options.clone()))),
            ["this", "options", key, rest @ ..] => {
                let mut value = node.options.get(*key).ok_or_else(undefined)?;
                for segment in rest {
                    value = value.get(*segment).ok_or_else(undefined)?;
                }
                Ok(SlotValue::Json(value.clone()))
            }
            ["this", "attrs", key] => node
                .attrs
                .get(*key)
                .map(|text| SlotValue::Text(text.clone()))
                .ok_or_else(undefined),
            ["this", "location"] => node
                .location
                .map(|loc| SlotValue::Json(Value::from(vec![loc.lat, loc.lng])))
                .ok_or_else(undefined),
            ["parent", field] => {
                let parent = self.parent.ok_or_else(undefined)?;
                self.neighbour(parent, field).ok_or_else(undefined)
            }
            ["children", index, field] => {
                let index: usize = index.parse().map_err(|_| undefined())?;
                let child = *self.tree.children(self.node).get(index).ok_or_else(undefined)?;
                self.neighbour(child, field).ok_or_else(undefined)
            }
            _ => Err(undefined()),
        }
    }
}

impl FragmentContext<'_> {
    fn neighbour(&self, id: NodeId, field: &str) -> Option<SlotValue> {
        match field {
            "var" => Some(SlotValue::Text(self.mapping.var_of(self.tree, id))),
            "id" => Some(SlotValue::Text(self.mapping.resolve_id(self.tree, id))),
            _ => None,
        }
    }
}
