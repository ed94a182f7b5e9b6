// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Loader configuration and the worker budget.

use core::num::NonZeroUsize;
use core::time::Duration;

use arbor_chunk::MANIFEST_FILE;

/// Lower bound of the default worker budget.
pub const MIN_WORKERS: usize = 2;
/// Upper bound of the default worker budget.
pub const MAX_WORKERS: usize = 12;

/// The available parallelism of this machine, clamped to `[MIN_WORKERS, MAX_WORKERS]`.
pub fn default_worker_budget() -> usize {
    std::thread::available_parallelism()
        .map_or(MIN_WORKERS, NonZeroUsize::get)
        .clamp(MIN_WORKERS, MAX_WORKERS)
}

/// Loader configuration, passed by value at construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Maximum fetches outstanding at once; further requests queue in FIFO order.
    pub worker_budget: usize,
    /// Per-fetch timeout.
    pub fetch_timeout: Duration,
    /// Hydrated nodes between voluntary yields in [`crate::LazyLoader::hydrate_all`].
    pub yield_every: u64,
    /// Name of the manifest document.
    pub manifest_file: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            worker_budget: default_worker_budget(),
            fetch_timeout: Duration::from_secs(30),
            yield_every: 2048,
            manifest_file: MANIFEST_FILE.to_owned(),
        }
    }
}

impl LoaderConfig {
    /// Override the worker budget (at least one worker is always allowed).
    #[must_use]
    pub fn with_worker_budget(mut self, workers: usize) -> Self {
        self.worker_budget = workers.max(1);
        self
    }

    /// Override the per-fetch timeout.
    #[must_use]
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Override the yield interval.
    #[must_use]
    pub fn with_yield_every(mut self, nodes: u64) -> Self {
        self.yield_every = nodes.max(1);
        self
    }
}
