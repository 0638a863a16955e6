//! Inheritance tree stored as an index arena
//!
//! The export nests inheritance nodes as JSON objects (`root.children[..]`). On load the
//! nesting is flattened into a `Vec` of nodes addressed by index, so traversal is
//! iterative and the tree can be walked without recursion however deep the hierarchy.

use serde::{Deserialize, Serialize};

/// One type in an inheritance tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InheritanceNode {
    pub uri: String,
    pub title: String,
    /// Indices of child nodes in the owning arena
    pub children: Vec<usize>,
    pub is_ancestor: bool,
    pub is_current: bool,
}

/// Arena holding every node of one inheritance tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawInheritance", into = "RawInheritance")]
pub struct InheritanceTree {
    nodes: Vec<InheritanceNode>,
    root: Option<usize>,
}

impl InheritanceTree {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node under `parent` (or as root when `parent` is `None`) and return its index.
    pub fn push(&mut self, parent: Option<usize>, uri: &str, title: &str) -> usize {
        let index = self.nodes.len();
        self.nodes.push(InheritanceNode {
            uri: uri.to_string(),
            title: title.to_string(),
            ..InheritanceNode::default()
        });
        match parent {
            Some(p) => self.nodes[p].children.push(index),
            None => self.root = Some(index),
        }
        index
    }

    /// Node at `index`.
    #[must_use]
    pub fn node(&self, index: usize) -> Option<&InheritanceNode> {
        self.nodes.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Pre-order traversal starting at the root.
    ///
    /// A parent always precedes its children and siblings keep their declared order.
    #[must_use]
    pub fn flatten(&self) -> Vec<&InheritanceNode> {
        self.preorder().into_iter().map(|index| &self.nodes[index]).collect()
    }

    fn preorder(&self) -> Vec<usize> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<usize> = self.root.into_iter().collect();

        while let Some(index) = stack.pop() {
            let Some(node) = self.nodes.get(index) else {
                continue;
            };
            out.push(index);
            stack.extend(node.children.iter().rev());
        }

        out
    }

    /// URIs of the flattened tree.
    #[must_use]
    pub fn flatten_uris(&self) -> Vec<&str> {
        self.flatten().into_iter().map(|n| n.uri.as_str()).collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawInheritance {
    root: Option<RawNode>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawNode {
    uri: String,
    title: String,
    children: Vec<RawNode>,
    is_ancestor: bool,
    is_current: bool,
}

impl From<RawInheritance> for InheritanceTree {
    fn from(raw: RawInheritance) -> Self {
        let mut tree = Self::new();
        let Some(root) = raw.root else {
            return tree;
        };

        // (parent index, node) pairs still to be placed
        let mut pending = vec![(None, root)];
        while let Some((parent, node)) = pending.pop() {
            let RawNode {
                uri,
                title,
                children,
                is_ancestor,
                is_current,
            } = node;
            let index = tree.push(parent, &uri, &title);
            tree.nodes[index].is_ancestor = is_ancestor;
            tree.nodes[index].is_current = is_current;
            // Pushed reversed so siblings are popped in declared order.
            pending.extend(children.into_iter().rev().map(|c| (Some(index), c)));
        }

        tree
    }
}

impl From<InheritanceTree> for RawInheritance {
    fn from(mut tree: InheritanceTree) -> Self {
        let order = tree.preorder();
        let mut built: Vec<Option<RawNode>> = (0..tree.nodes.len()).map(|_| None).collect();

        // Reverse pre-order builds every child before its parent.
        for &index in order.iter().rev() {
            let node = &mut tree.nodes[index];
            let children = node.children.iter().filter_map(|c| built.get_mut(*c).and_then(Option::take)).collect();
            built[index] = Some(RawNode {
                uri: std::mem::take(&mut node.uri),
                title: std::mem::take(&mut node.title),
                children,
                is_ancestor: node.is_ancestor,
                is_current: node.is_current,
            });
        }

        Self {
            root: tree.root.and_then(|r| built.get_mut(r).and_then(Option::take)),
        }
    }
}
