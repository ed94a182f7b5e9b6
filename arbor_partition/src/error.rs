// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Partition errors.

use std::path::PathBuf;

use arbor_chunk::{FormatError, NodePath};

/// A node that appears on its own ancestor path.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("cycle: {path} reaches one of its own ancestors")]
pub struct CycleError {
    /// Path from the root to the repeated node, the repeated name last.
    pub path: NodePath,
}

/// Why a partition run failed. Any of these aborts the whole batch.
#[derive(Debug, thiserror::Error)]
pub enum PartitionError {
    /// The input is not a traversable tree document.
    #[error(transparent)]
    Format(#[from] FormatError),
    /// The input contains a cycle.
    #[error(transparent)]
    Cycle(#[from] CycleError),
    /// `chunkSizeBudget` must be positive.
    #[error("chunk size budget must be at least 1")]
    ZeroBudget,
    /// Reading the input or writing the output failed.
    #[error("{}: {source}", path.display())]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl PartitionError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}
