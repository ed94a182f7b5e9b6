// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Arbor Loader: hydrate stubs on demand.
//!
//! A session starts with [`LazyLoader::open`], which reads the manifest and the
//! root skeleton through an injected [`Fetch`] capability. From then on, any stub
//! the session runs into can be hydrated: the loader fetches the stub's chunk,
//! decodes it, and replaces the stub's children in place while keeping the
//! stub's own name and level.
//!
//! Concurrency rules:
//!
//! - one outstanding fetch per `chunkRef`; concurrent requests share its result;
//! - at most [`LoaderConfig::worker_budget`] fetches hold a worker slot, others queue FIFO;
//! - each fetch is bounded by [`LoaderConfig::fetch_timeout`];
//! - failures are reported as [`LoadError`], leave the stub untouched, and are not cached.
//!
//! The tree is never mutated from a fetch task. [`LazyLoader::load_chunk`] only
//! produces the decoded chunk; the owner of the tree applies it with
//! [`LazyLoader::merge_into`] on its own task. [`LazyLoader::hydrate`] and
//! [`LazyLoader::hydrate_all`] do both for callers that hold the tree directly.
//!
//! ```no_run
//! use std::sync::Arc;
//! use arbor_loader::{FsFetch, LazyLoader, LoaderConfig, Visibility};
//!
//! # async fn demo() -> Result<(), arbor_loader::LoadError> {
//! let (loader, mut root) =
//!     LazyLoader::open(Arc::new(FsFetch::new("data")), LoaderConfig::default()).await?;
//! let loader = Arc::new(loader);
//! let summary = loader.hydrate_all(&mut root, &Visibility::new()).await;
//! println!("{} chunks, {:.0}%", summary.chunks, loader.progress().fraction() * 100.0);
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod fetch;
mod loader;

pub use config::{LoaderConfig, MAX_WORKERS, MIN_WORKERS, default_worker_budget};
pub use error::{LoadError, LoadFailure};
pub use fetch::{Fetch, FetchError, FsFetch, MemoryFetch};
pub use loader::{HydrateSummary, LazyLoader, LoaderStats, Progress, Visibility};
