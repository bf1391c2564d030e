//! Hierarchical attribute tree.
//!
//! Attributes are addressed by string paths and resolved to stable integer
//! handles called quarks. The tree is an arena of nodes indexed by quark;
//! allocation is append-only and monotonic, so a given path always maps to
//! the same quark for the life of the analysis.

use std::collections::HashMap;
use std::fmt;

use super::StateError;

/// Stable small-integer handle for a hierarchical attribute path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Quark(pub(crate) usize);

impl Quark {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for Quark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct AttributeNode {
    label: String,
    parent: Option<Quark>,
    /// Children in creation order.
    children: Vec<Quark>,
    by_label: HashMap<String, Quark>,
}

impl AttributeNode {
    fn new(label: String, parent: Option<Quark>) -> Self {
        Self {
            label,
            parent,
            children: Vec::new(),
            by_label: HashMap::new(),
        }
    }
}

/// Arena of attribute nodes. The root is an unnamed node with quark 0.
pub struct AttributeTree {
    nodes: Vec<AttributeNode>,
}

impl AttributeTree {
    pub const ROOT: Quark = Quark(0);

    pub fn new() -> Self {
        Self {
            nodes: vec![AttributeNode::new(String::new(), None)],
        }
    }

    /// Number of allocated quarks, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    fn node(&self, quark: Quark) -> Result<&AttributeNode, StateError> {
        self.nodes
            .get(quark.0)
            .ok_or(StateError::AttributeNotFound(quark))
    }

    /// Resolve `label` under `parent`, creating the attribute if needed.
    pub fn quark_relative_and_add(&mut self, parent: Quark, label: &str) -> Quark {
        if let Some(q) = self.nodes[parent.0].by_label.get(label) {
            return *q;
        }

        let q = Quark(self.nodes.len());
        self.nodes
            .push(AttributeNode::new(label.to_string(), Some(parent)));

        let parent_node = &mut self.nodes[parent.0];
        parent_node.children.push(q);
        parent_node.by_label.insert(label.to_string(), q);

        q
    }

    /// Resolve an absolute path from the root, creating missing attributes.
    pub fn quark_absolute_and_add(&mut self, path: &[&str]) -> Quark {
        let mut q = Self::ROOT;

        for label in path {
            q = self.quark_relative_and_add(q, label);
        }

        q
    }

    /// Resolve `label` under `parent` without creating it.
    pub fn quark_relative(&self, parent: Quark, label: &str) -> Result<Quark, StateError> {
        self.node(parent)?
            .by_label
            .get(label)
            .copied()
            .ok_or(StateError::AttributeNotFound(parent))
    }

    /// Resolve an absolute path without creating it.
    pub fn quark_absolute(&self, path: &[&str]) -> Result<Quark, StateError> {
        let mut q = Self::ROOT;

        for label in path {
            q = self.quark_relative(q, label)?;
        }

        Ok(q)
    }

    /// Direct children of `quark`, in creation order.
    pub fn sub_attributes(&self, quark: Quark) -> Result<&[Quark], StateError> {
        Ok(&self.node(quark)?.children)
    }

    /// The label of the attribute, without its ancestors.
    pub fn attribute_name(&self, quark: Quark) -> Result<&str, StateError> {
        Ok(&self.node(quark)?.label)
    }

    /// The full slash-separated path of the attribute.
    pub fn full_path(&self, quark: Quark) -> Result<String, StateError> {
        let mut labels = Vec::new();
        let mut cur = Some(quark);

        while let Some(q) = cur {
            let node = self.node(q)?;
            if node.parent.is_some() {
                labels.push(node.label.as_str());
            }
            cur = node.parent;
        }

        labels.reverse();
        Ok(labels.join("/"))
    }
}

impl Default for AttributeTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{AttributeTree, Quark};

    #[test]
    fn test_path_resolution_is_stable() {
        let mut tree = AttributeTree::new();

        let a = tree.quark_absolute_and_add(&["Threads", "poll0/3"]);
        let b = tree.quark_absolute_and_add(&["Threads", "poll0/3"]);
        let c = tree.quark_absolute_and_add(&["Threads", "poll1/5"]);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(tree.quark_absolute(&["Threads", "poll0/3"]).unwrap(), a);
        assert_eq!(tree.attribute_name(a).unwrap(), "poll0/3");
        assert_eq!(tree.full_path(a).unwrap(), "Threads/poll0/3");
    }

    #[test]
    fn test_quark_allocation_is_monotonic() {
        let mut tree = AttributeTree::new();

        let threads = tree.quark_absolute_and_add(&["Threads"]);
        let q0 = tree.quark_relative_and_add(threads, "worker/0");
        let q1 = tree.quark_relative_and_add(threads, "worker/1");

        assert!(threads.index() < q0.index());
        assert!(q0.index() < q1.index());
        assert_eq!(tree.sub_attributes(threads).unwrap(), &[q0, q1]);
    }

    #[test]
    fn test_missing_attribute() {
        let tree = AttributeTree::new();

        assert!(tree.quark_absolute(&["Threads"]).is_err());
        assert!(tree.sub_attributes(Quark(42)).is_err());
    }
}
