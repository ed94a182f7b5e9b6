// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chunk metadata and the manifest that indexes a partition.

use serde::{Deserialize, Serialize};

use crate::error::FormatError;
use crate::node::{Node, NodePath};

/// File name of the manifest inside a partition directory.
pub const MANIFEST_FILE: &str = "manifest.json";
/// Default file name of the root skeleton.
pub const ROOT_FILE: &str = "root.json";
/// Value of the manifest's `version` field.
pub const MANIFEST_VERSION: &str = "arbor-1";
/// Value of the manifest's `type` field.
pub const MANIFEST_KIND: &str = "arbor-manifest";

/// The id of the `seq`th emitted chunk, e.g. `chunk_00007`.
pub fn chunk_id(seq: usize) -> String {
    format!("chunk_{seq:05}")
}

/// The file holding the chunk with id `id`.
pub fn chunk_file_name(id: &str) -> String {
    format!("{id}.json")
}

/// A standalone, materialized subtree cut out of a larger tree.
///
/// `data` is what gets written to the chunk file. Nested chunks appear inside it
/// only as stubs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    /// Root path of the node this chunk replaces.
    pub path: NodePath,
    /// Sequence id, see [`chunk_id`].
    pub node_id: String,
    /// Materialized nodes in `data`, stubs included.
    pub node_count: u64,
    /// The subtree.
    pub data: Node,
}

impl Chunk {
    /// The file name the chunk is stored under and that stubs refer to.
    pub fn file_name(&self) -> String {
        chunk_file_name(&self.node_id)
    }
}

/// One manifest row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkEntry {
    /// Sequence id, see [`chunk_id`].
    pub node_id: String,
    /// Root path of the chunk's root node.
    pub path: NodePath,
    /// Root path of the node holding the stub.
    pub parent_path: NodePath,
    /// Id of the chunk whose data holds the stub; `None` when it sits in the root skeleton.
    #[serde(default)]
    pub parent_chunk: Option<String>,
    /// Materialized nodes in the chunk, stubs included.
    pub node_count: u64,
    /// Leaves of the full subtree the chunk stands for.
    #[serde(default)]
    pub leaf_count: u64,
}

impl ChunkEntry {
    /// The file name of this chunk.
    pub fn file_name(&self) -> String {
        chunk_file_name(&self.node_id)
    }
}

fn default_root_file() -> String {
    ROOT_FILE.to_owned()
}

/// Index of every chunk in a partition plus the parameters that produced it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Format version, [`MANIFEST_VERSION`].
    pub version: String,
    /// Document type tag, [`MANIFEST_KIND`].
    #[serde(rename = "type")]
    pub kind: String,
    /// File name of the root skeleton.
    #[serde(default = "default_root_file")]
    pub root_file: String,
    /// Maximum materialized nodes per chunk.
    pub chunk_size_budget: u64,
    /// Depth below a region root before splitting is allowed.
    pub depth_threshold: u32,
    /// Nodes in the original tree.
    pub total_nodes: u64,
    /// Number of entries in `chunks`.
    pub total_chunks: u64,
    /// Entries in emission order.
    pub chunks: Vec<ChunkEntry>,
}

impl Manifest {
    /// An empty manifest for the given parameters.
    pub fn new(chunk_size_budget: u64, depth_threshold: u32) -> Self {
        Self {
            version: MANIFEST_VERSION.to_owned(),
            kind: MANIFEST_KIND.to_owned(),
            root_file: default_root_file(),
            chunk_size_budget,
            depth_threshold,
            total_nodes: 0,
            total_chunks: 0,
            chunks: Vec::new(),
        }
    }

    /// Indented JSON.
    pub fn encode(&self) -> Result<Vec<u8>, FormatError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Parse and check a manifest document.
    pub fn decode(bytes: &[u8]) -> Result<Self, FormatError> {
        let manifest: Self = serde_json::from_slice(bytes)?;
        if manifest.kind != MANIFEST_KIND {
            return Err(FormatError::InvalidField {
                path: "$".to_owned(),
                field: "type",
                reason: format!("expected {MANIFEST_KIND:?}, found {:?}", manifest.kind),
            });
        }
        if manifest.total_chunks != manifest.chunks.len() as u64 {
            return Err(FormatError::InvalidField {
                path: "$".to_owned(),
                field: "totalChunks",
                reason: format!("{} entries listed", manifest.chunks.len()),
            });
        }
        Ok(manifest)
    }

    /// The entry a stub's `chunkRef` points at. Accepts the file name or the bare id.
    pub fn entry(&self, chunk_ref: &str) -> Option<&ChunkEntry> {
        let id = chunk_ref.strip_suffix(".json").unwrap_or(chunk_ref);
        self.chunks.iter().find(|entry| entry.node_id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> Manifest {
        let mut manifest = Manifest::new(5000, 3);
        manifest.total_nodes = 12_000;
        manifest.chunks.push(ChunkEntry {
            node_id: chunk_id(0),
            path: NodePath::from(&["Life", "A", "B", "C"][..]),
            parent_path: NodePath::from(&["Life", "A", "B"][..]),
            parent_chunk: None,
            node_count: 4000,
            leaf_count: 3990,
        });
        manifest.total_chunks = 1;
        manifest
    }

    #[test]
    fn names() {
        assert_eq!(chunk_id(7), "chunk_00007");
        assert_eq!(chunk_file_name(&chunk_id(12)), "chunk_00012.json");
    }

    #[test]
    fn wire_shape_uses_camel_case() {
        let manifest = manifest();
        let value: serde_json::Value =
            serde_json::from_slice(&manifest.encode().unwrap()).unwrap();
        assert_eq!(value["type"], MANIFEST_KIND);
        assert_eq!(value["rootFile"], ROOT_FILE);
        assert_eq!(value["totalNodes"], 12_000);
        assert_eq!(value["chunks"][0]["parentPath"][2], "B");
        assert_eq!(value["chunks"][0]["nodeId"], "chunk_00000");
        assert_eq!(Manifest::decode(&manifest.encode().unwrap()).unwrap(), manifest);
    }

    #[test]
    fn decode_checks_type_and_count() {
        let mut wrong = manifest();
        wrong.kind = "something-else".to_owned();
        assert!(matches!(
            Manifest::decode(&wrong.encode().unwrap()),
            Err(FormatError::InvalidField { field: "type", .. })
        ));
        let mut short = manifest();
        short.total_chunks = 2;
        assert!(matches!(
            Manifest::decode(&short.encode().unwrap()),
            Err(FormatError::InvalidField {
                field: "totalChunks",
                ..
            })
        ));
        assert!(matches!(
            Manifest::decode(b"{}"),
            Err(FormatError::Json(_))
        ));
    }

    #[test]
    fn entry_lookup_by_ref() {
        let manifest = manifest();
        assert!(manifest.entry("chunk_00000.json").is_some());
        assert!(manifest.entry("chunk_00000").is_some());
        assert!(manifest.entry("chunk_00001.json").is_none());
    }
}
