// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Arbor Partition: cut one large tree into size-bounded chunks.
//!
//! The partitioner is an offline batch job. It reads a source document
//! ([`SourceTree`], in any of the [`SourceFormat`]s), decides which subtrees to
//! cut out, and produces a [`Partition`]: a root skeleton whose cut points are
//! stubs, the chunks themselves in post-order, and the manifest indexing them.
//!
//! Splitting follows two rules:
//!
//! - a node whose subtree holds more than `chunkSizeBudget` nodes and that sits
//!   at least `depthThreshold` levels below its region root is cut out, and the
//!   relative depth restarts at zero below it;
//! - inside a chunk, any node still larger than the budget has its largest
//!   non-leaf children cut out until it fits.
//!
//! A chunk can only exceed the budget when its root's children are all leaves
//! or stubs; that case is reported as [`Warning::OversizedChunk`].
//!
//! All traversals use explicit stacks over an arena, so very deep inputs do not
//! exhaust the call stack. Failures abort the run: nothing is written unless the
//! whole partition succeeded ([`write_partition`]).
//!
//! ```rust
//! use arbor_chunk::Node;
//! use arbor_partition::{PartitionConfig, partition_node};
//!
//! let tree = Node::branch(
//!     "Life",
//!     0,
//!     (0..3)
//!         .map(|i| Node::branch(format!("K{i}"), 1, (0..9).map(|j| Node::leaf(format!("s{j}"), 2)).collect()))
//!         .collect(),
//! );
//! let config = PartitionConfig { chunk_size_budget: 9, depth_threshold: 1 };
//! let partition = partition_node(&tree, config).unwrap();
//! assert_eq!(partition.chunks.len(), 3);
//! assert_eq!(partition.manifest.total_nodes, 31);
//! assert!(partition.root.children().iter().all(|k| k.is_stub));
//! ```

mod error;
mod partition;
mod source;
mod write;

pub use error::{CycleError, PartitionError};
pub use partition::{
    Partition, PartitionConfig, PartitionReport, Warning, partition, partition_node,
};
pub use source::{SourceFormat, SourceTree};
pub use write::write_partition;
