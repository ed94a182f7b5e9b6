// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The partitioning pass.

use core::fmt;

use arbor_chunk::{Chunk, ChunkEntry, Manifest, Node, NodePath, chunk_file_name, chunk_id};
use serde::{Deserialize, Serialize};

use crate::error::PartitionError;
use crate::source::SourceTree;

/// Partitioning parameters.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartitionConfig {
    /// Maximum materialized nodes per chunk.
    pub chunk_size_budget: u64,
    /// Depth below the nearest region root before a node may be split.
    pub depth_threshold: u32,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            chunk_size_budget: 5000,
            depth_threshold: 3,
        }
    }
}

/// Something worth reporting that did not stop the run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Warning {
    /// A chunk whose root has more leaf children than the budget; it cannot be split further.
    OversizedChunk {
        /// Root path of the chunk.
        path: NodePath,
        /// Its materialized size.
        node_count: u64,
        /// The budget it exceeds.
        budget: u64,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OversizedChunk {
                path,
                node_count,
                budget,
            } => write!(
                f,
                "chunk at {path} holds {node_count} nodes, over the budget of {budget}, \
                 because its children are all leaves"
            ),
        }
    }
}

/// Summary of a partition run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PartitionReport {
    /// Non-fatal findings.
    pub warnings: Vec<Warning>,
    /// Materialized size of the largest chunk.
    pub largest_chunk: u64,
    /// Materialized size of the root skeleton, stubs included.
    pub skeleton_nodes: u64,
}

/// The output of [`partition`]: a root skeleton, its chunks and their manifest.
#[derive(Clone, Debug)]
pub struct Partition {
    /// The always-materialized top of the tree, with stubs where chunks were cut out.
    pub root: Node,
    /// Chunks in emission order, which is also manifest order.
    pub chunks: Vec<Chunk>,
    /// Manifest describing `chunks`.
    pub manifest: Manifest,
    /// Warnings and sizes.
    pub report: PartitionReport,
}

/// Partition an in-memory tree.
pub fn partition_node(root: &Node, config: PartitionConfig) -> Result<Partition, PartitionError> {
    partition(&SourceTree::from_node(root)?, config)
}

/// Cut `tree` into chunks of at most `chunk_size_budget` materialized nodes.
///
/// A node is split off when its subtree holds more than the budget and it sits at
/// least `depth_threshold` levels below its region root (the skeleton root or the
/// nearest split ancestor). Inside a chunk, the budget is then enforced bottom-up
/// by splitting the largest non-leaf children of any node that is still too
/// large. The skeleton root is never split.
pub fn partition(tree: &SourceTree, config: PartitionConfig) -> Result<Partition, PartitionError> {
    if config.chunk_size_budget == 0 {
        return Err(PartitionError::ZeroBudget);
    }
    let budget = config.chunk_size_budget;
    let nodes = &tree.nodes;
    let n = nodes.len();
    if n == 0 {
        return Err(arbor_chunk::FormatError::MissingName {
            path: "$".to_owned(),
        }
        .into());
    }

    // Subtree sizes; the arena is in preorder so reverse order is bottom-up.
    let mut count = vec![1_u64; n];
    for index in (0..n).rev() {
        let below: u64 = nodes[index].children.iter().map(|&c| count[c]).sum();
        count[index] += below;
    }

    // Top-down split decisions by relative depth.
    let mut split = vec![false; n];
    let mut depth = vec![0_u32; n];
    let mut region = vec![0_usize; n];
    for index in 0..n {
        if index != 0 && count[index] > budget && depth[index] >= config.depth_threshold {
            split[index] = true;
        }
        let (child_depth, child_region) = if split[index] {
            (0, index)
        } else {
            (depth[index].saturating_add(1), region[index])
        };
        for &child in &nodes[index].children {
            depth[child] = child_depth;
            region[child] = child_region;
        }
    }

    // Budget repair inside chunk regions, bottom-up.
    let mut size = vec![1_u64; n];
    for index in (0..n).rev() {
        let node = &nodes[index];
        let materialized: u64 = node
            .children
            .iter()
            .map(|&c| if split[c] { 1 } else { size[c] })
            .sum();
        size[index] = 1 + materialized;
        let in_chunk = split[index] || region[index] != 0;
        if !in_chunk || size[index] <= budget {
            continue;
        }
        let mut candidates: Vec<usize> = node
            .children
            .iter()
            .copied()
            .filter(|&c| !split[c] && !nodes[c].children.is_empty())
            .collect();
        candidates.sort_by(|&a, &b| size[b].cmp(&size[a]).then(a.cmp(&b)));
        for child in candidates {
            if size[index] <= budget {
                break;
            }
            split[child] = true;
            size[index] -= size[child] - 1;
        }
    }

    Ok(Emitter::new(tree, &count, &split, &size, config).run())
}

/// Post-order assembly of nodes, chunks and manifest entries.
struct Emitter<'a> {
    tree: &'a SourceTree,
    count: &'a [u64],
    split: &'a [bool],
    size: &'a [u64],
    config: PartitionConfig,
}

struct Frame {
    index: usize,
    next_child: usize,
    built: Vec<Node>,
}

/// A chunk emitted before the chunk that holds its stub is known.
struct Pending {
    parent_chunk_root: Option<usize>,
    parent_path: NodePath,
}

impl<'a> Emitter<'a> {
    fn new(
        tree: &'a SourceTree,
        count: &'a [u64],
        split: &'a [bool],
        size: &'a [u64],
        config: PartitionConfig,
    ) -> Self {
        Self {
            tree,
            count,
            split,
            size,
            config,
        }
    }

    fn run(self) -> Partition {
        let nodes = &self.tree.nodes;
        let budget = self.config.chunk_size_budget;
        let mut chunks: Vec<Chunk> = Vec::new();
        let mut pending: Vec<Pending> = Vec::new();
        let mut chunk_seq_of = vec![None::<usize>; nodes.len()];
        let mut report = PartitionReport::default();

        let mut path: Vec<String> = vec![nodes[0].name.clone()];
        // Nearest split ancestor of the frame on top, per frame.
        let mut regions: Vec<Option<usize>> = vec![None];
        let mut stack = vec![Frame {
            index: 0,
            next_child: 0,
            built: Vec::with_capacity(nodes[0].children.len()),
        }];
        let mut root = None;

        while let Some(top) = stack.last_mut() {
            let source = &nodes[top.index];
            if let Some(&child) = source.children.get(top.next_child) {
                top.next_child += 1;
                let child_region = if self.split[top.index] {
                    Some(top.index)
                } else {
                    regions.last().copied().flatten()
                };
                regions.push(child_region);
                path.push(nodes[child].name.clone());
                stack.push(Frame {
                    index: child,
                    next_child: 0,
                    built: Vec::with_capacity(nodes[child].children.len()),
                });
                continue;
            }

            let Some(frame) = stack.pop() else {
                break;
            };
            let index = frame.index;
            let mut node = if frame.built.is_empty() {
                let mut leaf = Node::leaf(source.name.clone(), source.level);
                if source.empty_children {
                    leaf.children = Some(Vec::new());
                }
                leaf
            } else {
                Node::branch(source.name.clone(), source.level, frame.built)
            };
            let node_path = NodePath::new(path.clone());
            path.pop();
            let parent_region = regions.pop().flatten();

            if self.split[index] {
                let seq = chunks.len();
                let id = chunk_id(seq);
                let node_count = self.size[index];
                if node_count > budget {
                    let warning = Warning::OversizedChunk {
                        path: node_path.clone(),
                        node_count,
                        budget,
                    };
                    tracing::warn!(%warning, "oversized chunk");
                    report.warnings.push(warning);
                }
                report.largest_chunk = report.largest_chunk.max(node_count);
                tracing::debug!(chunk = %id, path = %node_path, node_count, "emitting chunk");
                let stub = Node::stub(
                    source.name.clone(),
                    source.level,
                    chunk_file_name(&id),
                    node.leaf_count,
                    self.count[index],
                );
                pending.push(Pending {
                    parent_chunk_root: parent_region,
                    parent_path: node_path.parent().unwrap_or_default(),
                });
                chunk_seq_of[index] = Some(seq);
                chunks.push(Chunk {
                    path: node_path,
                    node_id: id,
                    node_count,
                    data: node,
                });
                node = stub;
            }

            match stack.last_mut() {
                Some(parent) => parent.built.push(node),
                None => root = Some(node),
            }
        }

        let mut manifest = Manifest::new(budget, self.config.depth_threshold);
        manifest.total_nodes = self.count[0];
        manifest.total_chunks = chunks.len() as u64;
        manifest.chunks = chunks
            .iter()
            .zip(&pending)
            .map(|(chunk, pending)| ChunkEntry {
                node_id: chunk.node_id.clone(),
                path: chunk.path.clone(),
                parent_path: pending.parent_path.clone(),
                parent_chunk: pending
                    .parent_chunk_root
                    .and_then(|r| chunk_seq_of[r])
                    .map(chunk_id),
                node_count: chunk.node_count,
                leaf_count: chunk.data.leaf_count,
            })
            .collect();
        // Emission always completes with the root frame.
        let root = root.unwrap_or_else(|| Node::leaf(nodes[0].name.clone(), nodes[0].level));
        report.skeleton_nodes = root.census().nodes;
        tracing::info!(
            total_nodes = manifest.total_nodes,
            chunks = manifest.total_chunks,
            largest_chunk = report.largest_chunk,
            skeleton_nodes = report.skeleton_nodes,
            "partitioned tree"
        );
        Partition {
            root,
            chunks,
            manifest,
            report,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Replace every stub with its chunk's data, the way a loader would.
    fn reassemble(partition: &Partition) -> Node {
        let mut root = partition.root.clone();
        loop {
            let stubs = root.stubs();
            if stubs.is_empty() {
                return root;
            }
            for (path, chunk_ref) in stubs {
                let chunk = partition
                    .chunks
                    .iter()
                    .find(|c| c.file_name() == chunk_ref)
                    .unwrap();
                let stub = root.find_mut(path.segments()).unwrap();
                stub.is_stub = false;
                stub.chunk_ref = None;
                stub.node_count = None;
                stub.children = chunk.data.children.clone();
            }
        }
    }

    /// `fan` children per node down to `depth` levels.
    fn bushy(fan: usize, depth: u32) -> Node {
        let mut level_nodes: Vec<Node> = (0..fan.pow(depth))
            .map(|i| Node::leaf(format!("n{depth}_{i}"), depth))
            .collect();
        for level in (0..depth).rev() {
            level_nodes = level_nodes
                .chunks(fan)
                .enumerate()
                .map(|(i, children)| Node::branch(format!("n{level}_{i}"), level, children.to_vec()))
                .collect();
        }
        level_nodes.pop().unwrap()
    }

    /// Life -> A -> B -> C, where C has `width` children with `fan` leaves each,
    /// plus `extra` leaf siblings of A. Total nodes: 4 + width * (1 + fan) + extra.
    fn skewed(width: usize, fan: usize, extra: usize) -> Node {
        let c_children = (0..width)
            .map(|i| {
                Node::branch(
                    format!("C{i}"),
                    4,
                    (0..fan).map(|j| Node::leaf(format!("C{i}_{j}"), 5)).collect(),
                )
            })
            .collect();
        let c = Node::branch("C", 3, c_children);
        let b = Node::branch("B", 2, vec![c]);
        let mut root_children = vec![Node::branch("A", 1, vec![b])];
        root_children.extend((0..extra).map(|i| Node::leaf(format!("S{i}"), 1)));
        Node::branch("Life", 0, root_children)
    }

    fn check_budget(partition: &Partition, budget: u64) {
        for chunk in &partition.chunks {
            assert_eq!(chunk.node_count, chunk.data.census().nodes);
            let oversized = partition.report.warnings.iter().any(|w| {
                matches!(w, Warning::OversizedChunk { path, .. } if *path == chunk.path)
            });
            assert!(
                chunk.node_count <= budget || oversized,
                "chunk {} has {} nodes",
                chunk.node_id,
                chunk.node_count
            );
        }
    }

    #[test]
    fn twelve_thousand_node_scenario() {
        // 4 + 1090 * 11 + 6 = 12_000 nodes, 11_991 of them under C at depth 3.
        let tree = skewed(1090, 10, 6);
        assert_eq!(tree.census().nodes, 12_000);
        let partition = partition_node(&tree, PartitionConfig::default()).unwrap();
        assert!(!partition.chunks.is_empty());
        assert!(!partition.root.is_stub);
        assert!(!partition.root.stubs().is_empty());
        assert_eq!(partition.manifest.total_nodes, 12_000);
        assert_eq!(partition.manifest.total_chunks, partition.chunks.len() as u64);
        check_budget(&partition, 5000);
        assert!(partition.report.warnings.is_empty());
        assert_eq!(reassemble(&partition), tree);
    }

    #[test]
    fn round_trip_across_shapes_and_parameters() {
        let shapes = [bushy(4, 5), bushy(9, 3), skewed(50, 6, 20), Node::leaf("solo", 0)];
        let params = [(1, 0), (3, 0), (10, 1), (40, 2), (200, 3), (5000, 3)];
        for tree in &shapes {
            for &(chunk_size_budget, depth_threshold) in &params {
                let config = PartitionConfig {
                    chunk_size_budget,
                    depth_threshold,
                };
                let partition = partition_node(tree, config).unwrap();
                assert_eq!(&reassemble(&partition), tree, "B={chunk_size_budget} D={depth_threshold}");
                assert!(!partition.root.is_stub);
                assert_eq!(partition.manifest.total_nodes, tree.census().nodes);
            }
        }
    }

    #[test]
    fn budget_repair_bounds_chunks() {
        let tree = bushy(4, 6);
        for budget in [5, 21, 100, 300] {
            let config = PartitionConfig {
                chunk_size_budget: budget,
                depth_threshold: 2,
            };
            let partition = partition_node(&tree, config).unwrap();
            check_budget(&partition, budget);
            // A 4-way fan-out of leaves is 5 nodes, so nothing is oversized.
            assert!(partition.report.warnings.is_empty(), "budget {budget}");
        }
    }

    #[test]
    fn wide_leaf_fan_out_is_reported() {
        let wide = Node::branch(
            "W",
            3,
            (0..50).map(|i| Node::leaf(format!("w{i}"), 4)).collect(),
        );
        let tree = Node::branch(
            "Life",
            0,
            vec![Node::branch("A", 1, vec![Node::branch("B", 2, vec![wide])])],
        );
        let config = PartitionConfig {
            chunk_size_budget: 10,
            depth_threshold: 3,
        };
        let partition = partition_node(&tree, config).unwrap();
        assert_eq!(partition.chunks.len(), 1);
        assert_eq!(
            partition.report.warnings,
            vec![Warning::OversizedChunk {
                path: NodePath::from(&["Life", "A", "B", "W"][..]),
                node_count: 51,
                budget: 10,
            }]
        );
        assert_eq!(reassemble(&partition), tree);
    }

    #[test]
    fn manifest_links_nested_chunks() {
        let tree = bushy(3, 6);
        let config = PartitionConfig {
            chunk_size_budget: 30,
            depth_threshold: 1,
        };
        let partition = partition_node(&tree, config).unwrap();
        let manifest = &partition.manifest;
        assert!(manifest.chunks.len() > 1);
        for (seq, entry) in manifest.chunks.iter().enumerate() {
            assert_eq!(entry.node_id, chunk_id(seq));
            assert_eq!(entry.path.parent().unwrap(), entry.parent_path);
            match &entry.parent_chunk {
                // Post-order: the chunk holding a stub is emitted after the stub's chunk.
                Some(parent) => {
                    let holder = manifest.entry(parent).unwrap();
                    assert!(holder.node_id > entry.node_id);
                    assert!(entry.path.starts_with(&holder.path));
                    let data = &partition.chunks.iter().find(|c| c.node_id == *parent).unwrap().data;
                    let refs: Vec<_> = data.stubs().into_iter().map(|(_, r)| r).collect();
                    assert!(refs.contains(&entry.file_name()));
                }
                None => {
                    let refs: Vec<_> = partition.root.stubs().into_iter().map(|(_, r)| r).collect();
                    assert!(refs.contains(&entry.file_name()));
                }
            }
        }
    }

    #[test]
    fn stubs_keep_true_leaf_counts() {
        let tree = bushy(4, 5);
        let config = PartitionConfig {
            chunk_size_budget: 50,
            depth_threshold: 1,
        };
        let partition = partition_node(&tree, config).unwrap();
        assert_eq!(partition.root.leaf_count, tree.leaf_count);
        for (path, _) in partition.root.stubs() {
            let stub = partition.root.find(path.segments()).unwrap();
            let original = tree.find(path.segments()).unwrap();
            assert_eq!(stub.leaf_count, original.leaf_count);
            assert_eq!(stub.node_count, Some(original.census().nodes));
        }
    }

    #[test]
    fn zero_budget_is_rejected() {
        let config = PartitionConfig {
            chunk_size_budget: 0,
            depth_threshold: 0,
        };
        assert!(matches!(
            partition_node(&bushy(2, 2), config),
            Err(PartitionError::ZeroBudget)
        ));
    }
}
