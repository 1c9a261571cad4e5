// leafweave-core/src/ids.rs
// Ephemeral -> stable identifier table for one render cycle.

use std::collections::BTreeMap;

use crate::tree::{MapTree, NodeId};

/// Prefixes stripped from auxiliary element names to recover the bare id.
const AUX_NAME_PREFIXES: [&str; 2] = ["map_", "tile_layer_"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifierMapping {
    entries: BTreeMap<String, String>,
}

impl IdentifierMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later inserts for the same ephemeral id win.
    pub fn insert(&mut self, ephemeral: impl Into<String>, stable: impl Into<String>) -> Option<String> {
        self.entries.insert(ephemeral.into(), stable.into())
    }

    pub fn get(&self, ephemeral: &str) -> Option<&str> {
        self.entries.get(ephemeral).map(String::as_str)
    }

    pub fn contains(&self, ephemeral: &str) -> bool {
        self.entries.contains_key(ephemeral)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Records `node -> stable_id`. `lineage` is the chain of logical
    /// ancestors, nearest last; it feeds the auxiliary element roles.
    pub fn assign(&mut self, tree: &MapTree, node: NodeId, stable_id: &str, lineage: &[NodeId]) {
        let Some(current) = tree.get(node) else {
            return;
        };
        self.insert(current.ephemeral_id(), stable_id);

        let Some(aux) = current.aux.as_ref() else {
            return;
        };
        let element_id = strip_aux_prefixes(&aux.element_name);
        let parent_element_id = strip_aux_prefixes(&aux.element_parent_name);

        let Some(parent) = lineage.last() else {
            return;
        };
        if !self.contains(&element_id) {
            let resolved = self.resolve_id(tree, *parent);
            self.insert(element_id, resolved);
        }

        let Some(grandparent) = lineage.iter().rev().nth(1) else {
            return;
        };
        if !self.contains(&parent_element_id) {
            let resolved = self.resolve_id(tree, *grandparent);
            self.insert(parent_element_id, resolved);
        }
    }

    /// Stable id of a node, or its ephemeral id when it was never visited.
    pub fn resolve_id(&self, tree: &MapTree, node: NodeId) -> String {
        match tree.get(node) {
            Some(n) => self
                .get(n.ephemeral_id())
                .unwrap_or(n.ephemeral_id())
                .to_string(),
            None => String::new(),
        }
    }

    pub fn var_of(&self, tree: &MapTree, node: NodeId) -> String {
        match tree.get(node) {
            Some(n) => n.var_name(&self.resolve_id(tree, node)),
            None => String::new(),
        }
    }
}

fn strip_aux_prefixes(name: &str) -> String {
    AUX_NAME_PREFIXES
        .iter()
        .fold(name.to_string(), |acc, prefix| acc.replace(prefix, ""))
}

/// `{parent}_{index}`: the stable id of a child.
pub fn child_id(parent_stable: &str, index: usize) -> String {
    format!("{}_{}", parent_stable, index)
}
