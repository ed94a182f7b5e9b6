// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree nodes and root paths.

use core::fmt;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// The identity of a node: the sequence of names from the root to the node.
///
/// Two nodes are the same entity iff they occupy the same path.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodePath(Vec<String>);

impl NodePath {
    /// A path naming only the root.
    pub fn root(name: impl Into<String>) -> Self {
        Self(vec![name.into()])
    }

    /// Wrap an explicit segment list.
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// The path of a child named `name` below this path.
    #[must_use]
    pub fn child(&self, name: &str) -> Self {
        let mut segments = Vec::with_capacity(self.0.len() + 1);
        segments.extend(self.0.iter().cloned());
        segments.push(name.to_owned());
        Self(segments)
    }

    /// The parent path, or `None` for the root (and the empty path).
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        match self.0.len() {
            0 | 1 => None,
            n => Some(Self(self.0[..n - 1].to_vec())),
        }
    }

    /// The last segment.
    pub fn name(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Segments from the root down.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Number of segments; the root path has length 1.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the path has no segments.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `prefix` is an ancestor-or-self of this path.
    pub fn starts_with(&self, prefix: &Self) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Consume into the raw segments.
    pub fn into_segments(self) -> Vec<String> {
        self.0
    }

    pub(crate) fn push(&mut self, name: &str) {
        self.0.push(name.to_owned());
    }
}

impl From<Vec<String>> for NodePath {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

impl From<&[&str]> for NodePath {
    fn from(segments: &[&str]) -> Self {
        Self(segments.iter().map(|s| (*s).to_owned()).collect())
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

/// A taxonomy node: either materialized (with optional children) or a stub.
///
/// Invariant: `is_stub == true` iff `children` is `None` and `chunk_ref` is `Some`.
/// A materialized node's `leaf_count` is the number of its transitive leaf
/// descendants (1 when it has none). A stub's `leaf_count` is the leaf count of
/// the subtree it stands for, so sibling weights do not change on hydration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Display name; also the path segment identifying this node under its parent.
    pub name: String,
    /// Taxonomic level (depth in the source tree).
    pub level: u32,
    /// Whether this node is a placeholder for a chunk.
    pub is_stub: bool,
    /// File name of the chunk holding the real subtree (stubs only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_ref: Option<String>,
    /// Number of leaves under this node.
    pub leaf_count: u64,
    /// Materialized node count of the subtree a stub stands for (stubs only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_count: Option<u64>,
    /// Ordered children; absent for leaves and stubs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Node>>,
}

impl Drop for Node {
    fn drop(&mut self) {
        let Some(children) = self.children.take() else {
            return;
        };
        // Detach grandchildren first so no drop descends more than one level.
        let mut stack = children;
        while let Some(mut node) = stack.pop() {
            if let Some(grandchildren) = node.children.take() {
                stack.extend(grandchildren);
            }
        }
    }
}

/// The first name that repeats among `names`, with its position.
///
/// Sibling names are path segments, so they must be unique under one parent.
pub fn repeated_name<'a>(names: impl IntoIterator<Item = &'a str>) -> Option<(usize, &'a str)> {
    let mut seen = HashSet::new();
    names.into_iter().enumerate().find(|&(_, name)| !seen.insert(name))
}

/// Node totals gathered by [`Node::census`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Census {
    /// Every node present in memory, stubs included.
    pub nodes: u64,
    /// Stubs among them.
    pub stubs: u64,
}

impl Census {
    /// Present nodes that are not stubs.
    pub fn materialized(&self) -> u64 {
        self.nodes - self.stubs
    }
}

impl Node {
    /// A childless, materialized node.
    pub fn leaf(name: impl Into<String>, level: u32) -> Self {
        Self {
            name: name.into(),
            level,
            is_stub: false,
            chunk_ref: None,
            leaf_count: 1,
            node_count: None,
            children: None,
        }
    }

    /// A materialized node with `children`; the leaf count is derived from them.
    pub fn branch(name: impl Into<String>, level: u32, children: Vec<Self>) -> Self {
        let leaf_count = if children.is_empty() {
            1
        } else {
            children.iter().map(|c| c.leaf_count).sum()
        };
        Self {
            name: name.into(),
            level,
            is_stub: false,
            chunk_ref: None,
            leaf_count,
            node_count: None,
            children: Some(children),
        }
    }

    /// A stub standing for a subtree stored in `chunk_ref`.
    pub fn stub(
        name: impl Into<String>,
        level: u32,
        chunk_ref: impl Into<String>,
        leaf_count: u64,
        node_count: u64,
    ) -> Self {
        Self {
            name: name.into(),
            level,
            is_stub: true,
            chunk_ref: Some(chunk_ref.into()),
            leaf_count: leaf_count.max(1),
            node_count: Some(node_count),
            children: None,
        }
    }

    /// Materialized and without children.
    pub fn is_leaf(&self) -> bool {
        !self.is_stub && self.children.as_ref().is_none_or(Vec::is_empty)
    }

    /// Children, or an empty slice for leaves and stubs.
    pub fn children(&self) -> &[Self] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// The direct child named `name`.
    pub fn child(&self, name: &str) -> Option<&Self> {
        self.children().iter().find(|c| c.name == name)
    }

    /// Resolve a root path; the first segment must name this node.
    pub fn find(&self, path: &[String]) -> Option<&Self> {
        let (first, rest) = path.split_first()?;
        if *first != self.name {
            return None;
        }
        let mut node = self;
        for segment in rest {
            node = node.child(segment)?;
        }
        Some(node)
    }

    /// Mutable form of [`Node::find`].
    pub fn find_mut(&mut self, path: &[String]) -> Option<&mut Self> {
        let (first, rest) = path.split_first()?;
        if *first != self.name {
            return None;
        }
        let mut node = self;
        for segment in rest {
            node = node
                .children
                .as_mut()?
                .iter_mut()
                .find(|c| c.name == *segment)?;
        }
        Some(node)
    }

    /// Count present nodes and stubs without recursion.
    pub fn census(&self) -> Census {
        let mut census = Census::default();
        let mut stack: Vec<&Self> = vec![self];
        while let Some(node) = stack.pop() {
            census.nodes += 1;
            if node.is_stub {
                census.stubs += 1;
            }
            stack.extend(node.children());
        }
        census
    }

    /// Every stub below (or at) this node as `(path, chunk_ref)`, in depth-first order.
    /// Paths start at this node's name.
    pub fn stubs(&self) -> Vec<(NodePath, String)> {
        self.stubs_at(NodePath::root(self.name.clone()))
    }

    /// Like [`Node::stubs`], for a node that lives at `path` inside a larger tree.
    pub fn stubs_at(&self, path: NodePath) -> Vec<(NodePath, String)> {
        let mut out = Vec::new();
        let mut stack: Vec<(&Self, NodePath)> = vec![(self, path)];
        while let Some((node, path)) = stack.pop() {
            if let Some(chunk_ref) = node.chunk_ref.as_ref().filter(|_| node.is_stub) {
                out.push((path, chunk_ref.clone()));
                continue;
            }
            for child in node.children().iter().rev() {
                let mut child_path = path.clone();
                child_path.push(&child.name);
                stack.push((child, child_path));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Node {
        Node::branch(
            "Life",
            0,
            vec![
                Node::branch(
                    "Animalia",
                    1,
                    vec![Node::leaf("Chordata", 2), Node::leaf("Arthropoda", 2)],
                ),
                Node::stub("Plantae", 1, "chunk_00001.json", 40, 55),
            ],
        )
    }

    #[test]
    fn branch_sums_leaf_counts() {
        let tree = sample();
        assert_eq!(tree.leaf_count, 42);
        assert_eq!(tree.children()[0].leaf_count, 2);
        assert_eq!(Node::branch("empty", 0, Vec::new()).leaf_count, 1);
    }

    #[test]
    fn find_walks_names_from_root() {
        let tree = sample();
        let path = NodePath::from(&["Life", "Animalia", "Chordata"][..]);
        assert_eq!(tree.find(path.segments()).map(|n| n.level), Some(2));
        let wrong_root = NodePath::from(&["Death", "Animalia"][..]);
        assert!(tree.find(wrong_root.segments()).is_none());
    }

    #[test]
    fn census_and_stubs() {
        let tree = sample();
        let census = tree.census();
        assert_eq!(census.nodes, 5);
        assert_eq!(census.stubs, 1);
        assert_eq!(census.materialized(), 4);
        let stubs = tree.stubs();
        assert_eq!(stubs.len(), 1);
        assert_eq!(stubs[0].0.to_string(), "Life/Plantae");
        assert_eq!(stubs[0].1, "chunk_00001.json");
    }

    #[test]
    fn deep_chains_drop_without_recursion() {
        let mut node = Node::leaf("n0", 0);
        for i in 1..100_000 {
            node = Node::branch(format!("n{i}"), i, vec![node]);
        }
        assert_eq!(node.census().nodes, 100_000);
        drop(node);
    }

    #[test]
    fn repeated_names_are_found_in_order() {
        assert_eq!(repeated_name(["a", "b", "c"]), None);
        assert_eq!(
            repeated_name(["Incertae sedis", "Fungi", "Incertae sedis"]),
            Some((2, "Incertae sedis"))
        );
    }

    #[test]
    fn path_parent_and_child() {
        let root = NodePath::root("Life");
        let child = root.child("Fungi");
        assert_eq!(child.parent(), Some(root.clone()));
        assert_eq!(root.parent(), None);
        assert!(child.starts_with(&root));
        assert_eq!(child.name(), Some("Fungi"));
    }
}
