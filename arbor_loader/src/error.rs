// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Load errors.

use core::time::Duration;

use arbor_chunk::FormatError;

/// What went wrong while loading one document.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LoadFailure {
    /// The transport failed.
    #[error("fetch failed: {0}")]
    Fetch(String),
    /// The document did not decode.
    #[error(transparent)]
    Format(#[from] FormatError),
    /// The fetch did not finish within the configured timeout.
    #[error("timeout after {0:?}")]
    Timeout(Duration),
    /// The manifest lists no chunk by that reference.
    #[error("not listed in the manifest")]
    UnknownChunk,
    /// The task that owned the shared fetch was dropped before finishing.
    #[error("fetch was cancelled")]
    Cancelled,
}

/// A failed load. The stub involved is left untouched and can be hydrated again.
///
/// `Clone`, so one failure can be delivered to every caller that was waiting on
/// the same fetch.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("loading {chunk_ref}: {reason}")]
pub struct LoadError {
    /// The document that failed to load.
    pub chunk_ref: String,
    /// Why.
    pub reason: LoadFailure,
}

impl LoadError {
    pub(crate) fn new(chunk_ref: &str, reason: impl Into<LoadFailure>) -> Self {
        Self {
            chunk_ref: chunk_ref.to_owned(),
            reason: reason.into(),
        }
    }

    /// Whether the failure was a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self.reason, LoadFailure::Timeout(_))
    }
}
