// leafweave-core/src/assets.rs
// CSS/JS URLs the host must load before running the script. Only the URL
// strings are collected; nothing is fetched.

use serde::Serialize;

use crate::tree::{MapTree, NodeId, NodeKind};

pub const D3_V3_JS: &str = "https://cdnjs.cloudflare.com/ajax/libs/d3/3.5.5/d3.min.js";
pub const D3_V4_JS: &str = "https://d3js.org/d3.v4.min.js";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssetManifest {
    pub css: Vec<String>,
    pub js: Vec<String>,
}

impl AssetManifest {
    /// Pre-order walk of the map subtree. A dual map contributes both panes
    /// before its own assets. Every color scale pushes the two d3 builds to
    /// the front of the js list. Duplicates are kept in encounter order.
    pub fn collect(tree: &MapTree, map: NodeId) -> Self {
        let mut manifest = Self::default();
        manifest.walk(tree, map);
        manifest
    }

    /// Adds a subtree that is mounted on the map later, such as a dynamic
    /// feature group, as if it were the map's next child.
    pub fn extend_with(&mut self, tree: &MapTree, node: NodeId) {
        self.walk(tree, node);
    }

    fn walk(&mut self, tree: &MapTree, id: NodeId) {
        let Some(node) = tree.get(id) else {
            return;
        };
        if node.kind == NodeKind::ColorScale {
            self.js.insert(0, D3_V3_JS.to_string());
            self.js.insert(0, D3_V4_JS.to_string());
        }
        if node.kind == NodeKind::DualMap {
            for pane in tree.children(id) {
                self.walk(tree, *pane);
            }
            self.extend_from(tree, id);
            return;
        }
        self.extend_from(tree, id);
        for child in tree.children(id) {
            self.walk(tree, *child);
        }
    }

    fn extend_from(&mut self, tree: &MapTree, id: NodeId) {
        let assets = &tree[id].assets;
        self.css.extend(assets.css.iter().cloned());
        self.js.extend(assets.js.iter().cloned());
    }
}
