// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Arbor Chunk: the serialization contract shared by the partitioner and the loader.
//!
//! A taxonomy is a strict rooted tree of [`Node`]s. Large trees are cut into
//! independently loadable chunks; where a subtree was cut out, its parent keeps a
//! *stub* carrying only identity and summary fields plus a `chunkRef` naming the
//! chunk file that holds the real subtree.
//!
//! - [`Node`]: a materialized node or a stub. Identity is the root path ([`NodePath`]).
//! - [`Chunk`]: a standalone subtree plus the metadata the manifest records for it.
//! - [`Manifest`]: the read-only index of every chunk and the partitioning parameters.
//! - [`encode`] / [`decode`]: lossless JSON codec. Decoding validates the stub invariant
//!   and reports the JSON path of the first offence as a [`FormatError`].
//!
//! ```rust
//! use arbor_chunk::{Node, decode, encode};
//!
//! let tree = Node::branch(
//!     "Life",
//!     0,
//!     vec![Node::leaf("Archaea", 1), Node::stub("Bacteria", 1, "chunk_00000.json", 12, 20)],
//! );
//! let bytes = encode(&tree).unwrap();
//! assert_eq!(decode(&bytes).unwrap(), tree);
//! assert_eq!(tree.leaf_count, 13);
//! ```

mod codec;
mod error;
mod manifest;
mod node;

pub use codec::{decode, decode_value, encode, encode_pretty, parse_value, release};
pub use error::FormatError;
pub use manifest::{
    Chunk, ChunkEntry, MANIFEST_FILE, MANIFEST_KIND, MANIFEST_VERSION, Manifest, ROOT_FILE,
    chunk_file_name, chunk_id,
};
pub use node::{Census, Node, NodePath, repeated_name};
