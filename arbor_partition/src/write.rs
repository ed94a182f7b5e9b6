// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Writing a partition to disk.

use std::fs;
use std::path::Path;

use arbor_chunk::{FormatError, MANIFEST_FILE, Node, encode, encode_pretty};

use crate::error::PartitionError;
use crate::partition::Partition;

/// Write `manifest.json`, the root skeleton and every chunk file into `dir`.
///
/// Files are written into a temporary sibling directory that is renamed into
/// place only once everything has been written, so `dir` never holds a partial
/// partition. An existing `dir` is replaced only if it is empty or holds a
/// previous partition (a `manifest.json`).
pub fn write_partition(dir: &Path, partition: &Partition, pretty: bool) -> Result<(), PartitionError> {
    let parent = match dir.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(PartitionError::io(parent))?;
    let staging = tempfile::Builder::new()
        .prefix(".arbor-partition-")
        .tempdir_in(parent)
        .map_err(PartitionError::io(parent))?;

    let encode_node = |node: &Node| -> Result<Vec<u8>, FormatError> {
        if pretty { encode_pretty(node) } else { encode(node) }
    };
    let write = |name: &str, bytes: &[u8]| -> Result<(), PartitionError> {
        let path = staging.path().join(name);
        fs::write(&path, bytes).map_err(PartitionError::io(path))
    };

    for chunk in &partition.chunks {
        write(&chunk.file_name(), &encode_node(&chunk.data)?)?;
    }
    write(&partition.manifest.root_file, &encode_node(&partition.root)?)?;
    write(MANIFEST_FILE, &partition.manifest.encode()?)?;

    if dir.exists() {
        let replaceable = dir.join(MANIFEST_FILE).is_file()
            || fs::read_dir(dir)
                .map_err(PartitionError::io(dir))?
                .next()
                .is_none();
        if !replaceable {
            return Err(PartitionError::Io {
                path: dir.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    "output directory is not empty and holds no previous partition",
                ),
            });
        }
        fs::remove_dir_all(dir).map_err(PartitionError::io(dir))?;
    }
    fs::rename(staging.path(), dir).map_err(PartitionError::io(dir))?;
    tracing::info!(
        dir = %dir.display(),
        files = partition.chunks.len() + 2,
        "wrote partition"
    );
    Ok(())
}
