// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The laid-out arena: construction, incremental building, and grafting.

use arbor_chunk::{Node, NodePath};
use kurbo::Circle;

use crate::layout::LayoutConfig;
use crate::types::SceneNodeId;

/// A laid-out node.
#[derive(Clone, Debug)]
pub struct SceneNode {
    name: String,
    level: u32,
    depth: u32,
    circle: Circle,
    leaf_count: u64,
    chunk_ref: Option<String>,
    parent: Option<u32>,
    first_child: u32,
    child_count: u32,
}

impl SceneNode {
    /// Node name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Taxonomic level, as carried by the data.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Distance from the scene root.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Circle in world (layout) coordinates.
    pub fn circle(&self) -> Circle {
        self.circle
    }

    /// Leaves under this node, hydrated or not.
    pub fn leaf_count(&self) -> u64 {
        self.leaf_count
    }

    /// The chunk holding this node's subtree, while it is a stub.
    pub fn chunk_ref(&self) -> Option<&str> {
        self.chunk_ref.as_deref()
    }

    /// Whether the subtree has yet to be grafted.
    pub fn is_stub(&self) -> bool {
        self.chunk_ref.is_some()
    }

    /// Materialized and without children.
    pub fn is_leaf(&self) -> bool {
        !self.is_stub() && self.child_count == 0
    }

    pub(crate) fn parent_slot(&self) -> Option<usize> {
        self.parent.map(|p| p as usize)
    }

    fn children(&self) -> core::ops::Range<usize> {
        let first = self.first_child as usize;
        first..first + self.child_count as usize
    }
}

/// Why a graft was refused.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GraftError {
    /// No scene node has that path.
    #[error("no scene node at {0}")]
    UnknownPath(NodePath),
    /// The scene node there is not a stub.
    #[error("scene node {0} is not a stub")]
    NotAStub(NodePath),
    /// The node offered for grafting has not been hydrated.
    #[error("node offered for {0} is still a stub")]
    StillAStub(NodePath),
}

/// A tree laid out as nested circles, stored as a flat arena.
///
/// Siblings occupy contiguous slots, and a node's children are appended in one
/// go when it is expanded, so a subtree grafted later lands at the end of the
/// arena without moving anything.
#[derive(Clone)]
pub struct Scene {
    nodes: Vec<SceneNode>,
    epoch: u32,
    layout: LayoutConfig,
}

impl core::fmt::Debug for Scene {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let stubs = self.nodes.iter().filter(|n| n.is_stub()).count();
        f.debug_struct("Scene")
            .field("nodes", &self.nodes.len())
            .field("stubs", &stubs)
            .field("epoch", &self.epoch)
            .field("layout", &self.layout)
            .finish()
    }
}

impl Scene {
    /// Lay out the whole of `root` in one go.
    pub fn build(root: &Node, layout: LayoutConfig) -> Self {
        SceneBuilder::new(root, layout).finish()
    }

    /// Number of laid-out nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the scene is empty. A built scene always holds its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Bumped by every graft.
    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    /// Layout parameters.
    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// The root, if the scene has one.
    pub fn root(&self) -> Option<SceneNodeId> {
        (!self.nodes.is_empty()).then(|| self.id(0))
    }

    #[allow(
        clippy::cast_possible_truncation,
        reason = "Scene slots are 32-bit; a viewport never lays out 2^32 nodes."
    )]
    pub(crate) fn id(&self, slot: usize) -> SceneNodeId {
        SceneNodeId::new(slot as u32, self.epoch)
    }

    /// The node behind `id`, unless `id` is from an older epoch.
    pub fn node(&self, id: SceneNodeId) -> Option<&SceneNode> {
        if id.epoch() != self.epoch {
            return None;
        }
        self.nodes.get(id.slot())
    }

    pub(crate) fn slot(&self, slot: usize) -> &SceneNode {
        &self.nodes[slot]
    }

    pub(crate) fn child_slots(&self, slot: usize) -> core::ops::Range<usize> {
        self.nodes[slot].children()
    }

    /// Children of `id`, in layout order.
    pub fn children(&self, id: SceneNodeId) -> impl Iterator<Item = SceneNodeId> + '_ {
        self.node(id)
            .map(SceneNode::children)
            .unwrap_or(0..0)
            .map(|slot| self.id(slot))
    }

    /// Parent of `id`.
    pub fn parent(&self, id: SceneNodeId) -> Option<SceneNodeId> {
        let parent = self.node(id)?.parent?;
        Some(self.id(parent as usize))
    }

    /// Root path of `id`.
    pub fn path_of(&self, id: SceneNodeId) -> Option<NodePath> {
        self.node(id)?;
        Some(self.path_of_slot(id.slot()))
    }

    pub(crate) fn path_of_slot(&self, slot: usize) -> NodePath {
        let mut names = Vec::new();
        let mut at = Some(slot);
        while let Some(s) = at {
            let node = &self.nodes[s];
            names.push(node.name.clone());
            at = node.parent_slot();
        }
        names.reverse();
        NodePath::new(names)
    }

    /// The node at a root path.
    pub fn find(&self, path: &NodePath) -> Option<SceneNodeId> {
        let (first, rest) = path.segments().split_first()?;
        let root = self.nodes.first()?;
        if &root.name != first {
            return None;
        }
        let mut slot = 0;
        for name in rest {
            slot = self.nodes[slot]
                .children()
                .find(|&c| &self.nodes[c].name == name)?;
        }
        Some(self.id(slot))
    }

    /// Lay out a freshly hydrated subtree under the stub at `path`.
    ///
    /// `node` is the hydrated node; its own name and level are ignored, the
    /// stub's are kept. Nested stubs inside `node` become stubs in the scene.
    /// Existing nodes keep their circles. Returns the number of nodes added.
    pub fn graft(&mut self, path: &NodePath, node: &Node) -> Result<usize, GraftError> {
        let id = self
            .find(path)
            .ok_or_else(|| GraftError::UnknownPath(path.clone()))?;
        let slot = id.slot();
        if !self.nodes[slot].is_stub() {
            return Err(GraftError::NotAStub(path.clone()));
        }
        if node.is_stub {
            return Err(GraftError::StillAStub(path.clone()));
        }
        let before = self.nodes.len();
        self.nodes[slot].chunk_ref = None;
        let mut stack = Vec::new();
        self.expand(slot, node, &mut stack);
        while let Some((slot, node)) = stack.pop() {
            self.expand(slot, node, &mut stack);
        }
        self.epoch = self.epoch.wrapping_add(1);
        let added = self.nodes.len() - before;
        tracing::debug!(%path, added, epoch = self.epoch, "grafted subtree");
        Ok(added)
    }

    /// Append the children of `node` under `slot`, queueing the ones that
    /// have children of their own.
    fn expand<'a>(&mut self, slot: usize, node: &'a Node, stack: &mut Vec<(usize, &'a Node)>) {
        let kids = node.children();
        if kids.is_empty() {
            return;
        }
        let counts: Vec<u64> = kids.iter().map(|k| k.leaf_count).collect();
        let circles = self.layout.children(self.nodes[slot].circle, &counts);
        let first = self.nodes.len();
        let depth = self.nodes[slot].depth + 1;
        #[allow(
            clippy::cast_possible_truncation,
            reason = "Scene slots are 32-bit; a viewport never lays out 2^32 nodes."
        )]
        {
            self.nodes[slot].first_child = first as u32;
            self.nodes[slot].child_count = kids.len() as u32;
        }
        for (kid, circle) in kids.iter().zip(circles) {
            #[allow(
                clippy::cast_possible_truncation,
                reason = "Scene slots are 32-bit; a viewport never lays out 2^32 nodes."
            )]
            let parent = Some(slot as u32);
            self.nodes.push(SceneNode {
                name: kid.name.clone(),
                level: kid.level,
                depth,
                circle,
                leaf_count: kid.leaf_count,
                chunk_ref: if kid.is_stub {
                    kid.chunk_ref.clone()
                } else {
                    None
                },
                parent,
                first_child: 0,
                child_count: 0,
            });
        }
        for (i, kid) in kids.iter().enumerate().rev() {
            if !kid.children().is_empty() {
                stack.push((first + i, kid));
            }
        }
    }
}

/// Builds a [`Scene`] a slice at a time.
///
/// A large skeleton can take a while to lay out; [`step`](Self::step) bounds
/// the work per call so the caller can interleave frames or yield.
#[derive(Debug)]
pub struct SceneBuilder<'a> {
    scene: Scene,
    stack: Vec<(usize, &'a Node)>,
}

impl<'a> SceneBuilder<'a> {
    /// Start laying out `root`.
    pub fn new(root: &'a Node, layout: LayoutConfig) -> Self {
        let scene = Scene {
            nodes: vec![SceneNode {
                name: root.name.clone(),
                level: root.level,
                depth: 0,
                circle: layout.root_circle(),
                leaf_count: root.leaf_count,
                chunk_ref: if root.is_stub {
                    root.chunk_ref.clone()
                } else {
                    None
                },
                parent: None,
                first_child: 0,
                child_count: 0,
            }],
            epoch: 0,
            layout,
        };
        Self {
            scene,
            stack: vec![(0, root)],
        }
    }

    /// Expand nodes until at least `max_nodes` have been added or the work
    /// runs out. Returns `true` once the scene is complete.
    pub fn step(&mut self, max_nodes: usize) -> bool {
        let target = self.scene.nodes.len().saturating_add(max_nodes.max(1));
        while self.scene.nodes.len() < target {
            let Some((slot, node)) = self.stack.pop() else {
                break;
            };
            self.scene.expand(slot, node, &mut self.stack);
        }
        self.is_done()
    }

    /// Whether every node has been laid out.
    pub fn is_done(&self) -> bool {
        self.stack.is_empty()
    }

    /// Nodes laid out so far.
    pub fn built(&self) -> usize {
        self.scene.nodes.len()
    }

    /// Finish the remaining work and return the scene.
    pub fn finish(mut self) -> Scene {
        while !self.step(usize::MAX) {}
        self.scene
    }
}
