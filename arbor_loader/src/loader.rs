// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The lazy loader: deduplicated, budgeted chunk fetches and in-place hydration.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use arbor_chunk::{FormatError, Manifest, Node, NodePath, decode};
use tokio::sync::{Semaphore, watch};
use tokio::task::JoinSet;
use tokio::time::Instant;

use crate::config::LoaderConfig;
use crate::error::{LoadError, LoadFailure};
use crate::fetch::Fetch;

type Shared = Option<Result<Arc<Node>, LoadError>>;

/// Whether the consuming surface is currently visible.
///
/// Cloned handles share one flag. Long hydration passes skip their voluntary
/// yields while the surface is hidden.
#[derive(Clone, Debug, Default)]
pub struct Visibility(Arc<AtomicBool>);

impl Visibility {
    /// A handle that starts out visible.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the surface hidden or visible.
    pub fn set_hidden(&self, hidden: bool) {
        self.0.store(hidden, Ordering::Relaxed);
    }

    /// Whether the surface is hidden.
    pub fn is_hidden(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Hydration progress: materialized nodes so far out of the manifest's total.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Progress {
    /// Non-stub nodes loaded so far. Never decreases.
    pub loaded: u64,
    /// `totalNodes` from the manifest.
    pub total: u64,
}

impl Progress {
    /// `loaded / total` in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            (self.loaded as f64 / self.total as f64).min(1.0)
        }
    }

    /// Whether every node has been loaded.
    pub fn is_complete(&self) -> bool {
        self.loaded >= self.total
    }
}

/// A snapshot of the loader's fetch counters.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LoaderStats {
    /// Fetches holding a worker slot right now.
    pub in_flight: usize,
    /// The most fetches ever observed holding a slot at once.
    pub peak_in_flight: usize,
    /// Chunk fetches started.
    pub fetches: u64,
    /// Chunk loads that failed.
    pub failures: u64,
}

#[derive(Debug, Default)]
struct Counters {
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    fetches: AtomicU64,
    failures: AtomicU64,
}

/// Holds one unit of `in_flight` for as long as it lives.
struct Slot<'a>(&'a Counters);

impl<'a> Slot<'a> {
    fn enter(counters: &'a Counters) -> Self {
        let now = counters.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        counters.peak_in_flight.fetch_max(now, Ordering::AcqRel);
        counters.fetches.fetch_add(1, Ordering::Relaxed);
        Self(counters)
    }
}

impl Drop for Slot<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Removes a chunk's in-flight entry when the owning fetch finishes or is dropped.
struct InFlightGuard<'a> {
    map: &'a Mutex<HashMap<String, watch::Receiver<Shared>>>,
    chunk_ref: &'a str,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.map
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(self.chunk_ref);
    }
}

enum Role {
    Owner(watch::Sender<Shared>),
    Waiter(watch::Receiver<Shared>),
}

/// Result of [`LazyLoader::hydrate_all`].
#[derive(Clone, Debug, Default)]
pub struct HydrateSummary {
    /// Chunks merged into the tree.
    pub chunks: u64,
    /// Nodes materialized by those merges.
    pub nodes: u64,
    /// Loads that failed; their stubs are still in place.
    pub failures: Vec<LoadError>,
}

/// Fetches chunks on demand and merges them into the tree in place of stubs.
///
/// At most one fetch per chunk is outstanding at any time: concurrent requests for
/// the same `chunkRef` share it. At most `worker_budget` fetches hold a worker
/// slot at once; the rest wait in FIFO order. A fetch that exceeds the timeout
/// fails and releases its slot. Failures are never cached, so a later request
/// fetches again.
pub struct LazyLoader {
    fetch: Arc<dyn Fetch>,
    config: LoaderConfig,
    manifest: Manifest,
    permits: Semaphore,
    in_flight: Mutex<HashMap<String, watch::Receiver<Shared>>>,
    counters: Counters,
    loaded: AtomicU64,
}

impl core::fmt::Debug for LazyLoader {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LazyLoader")
            .field("config", &self.config)
            .field("total_chunks", &self.manifest.total_chunks)
            .field("stats", &self.stats())
            .field("progress", &self.progress())
            .finish_non_exhaustive()
    }
}

impl LazyLoader {
    /// Load the manifest and the root skeleton through `fetch`.
    ///
    /// Returns the loader and the root, which the caller owns from here on.
    pub async fn open(fetch: Arc<dyn Fetch>, config: LoaderConfig) -> Result<(Self, Node), LoadError> {
        let manifest_file = config.manifest_file.clone();
        let bytes = fetch_timed(fetch.as_ref(), &manifest_file, &config).await?;
        let manifest = Manifest::decode(&bytes).map_err(|e| LoadError::new(&manifest_file, e))?;
        let root_file = manifest.root_file.clone();
        let bytes = fetch_timed(fetch.as_ref(), &root_file, &config).await?;
        let root = decode(&bytes).map_err(|e| LoadError::new(&root_file, e))?;
        if root.is_stub {
            return Err(LoadError::new(
                &root_file,
                FormatError::StubInvariant {
                    path: "$".to_owned(),
                    reason: "the root skeleton must be materialized",
                },
            ));
        }
        tracing::info!(
            total_nodes = manifest.total_nodes,
            total_chunks = manifest.total_chunks,
            workers = config.worker_budget,
            "opened partition"
        );
        Ok((Self::new(fetch, config, manifest, &root), root))
    }

    /// Build a loader around an already loaded manifest and root.
    pub fn new(fetch: Arc<dyn Fetch>, config: LoaderConfig, manifest: Manifest, root: &Node) -> Self {
        let workers = config.worker_budget.max(1);
        Self {
            fetch,
            permits: Semaphore::new(workers),
            config,
            manifest,
            in_flight: Mutex::new(HashMap::new()),
            counters: Counters::default(),
            loaded: AtomicU64::new(root.census().materialized()),
        }
    }

    /// The manifest this loader was opened with.
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// The configuration this loader was built with.
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Current fetch counters.
    pub fn stats(&self) -> LoaderStats {
        LoaderStats {
            in_flight: self.counters.in_flight.load(Ordering::Acquire),
            peak_in_flight: self.counters.peak_in_flight.load(Ordering::Acquire),
            fetches: self.counters.fetches.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
        }
    }

    /// Nodes loaded so far and the manifest's total.
    pub fn progress(&self) -> Progress {
        Progress {
            loaded: self.loaded.load(Ordering::Relaxed),
            total: self.manifest.total_nodes,
        }
    }

    /// Whether a fetch for `chunk_ref` is currently outstanding.
    pub fn is_in_flight(&self, chunk_ref: &str) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(chunk_ref)
    }

    /// Fetch and decode the chunk `chunk_ref`, sharing any fetch already under way.
    ///
    /// Does not touch the tree; apply the result with [`LazyLoader::merge_into`].
    pub async fn load_chunk(&self, chunk_ref: &str) -> Result<Arc<Node>, LoadError> {
        let role = {
            let mut map = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            match map.get(chunk_ref) {
                Some(rx) => Role::Waiter(rx.clone()),
                None => {
                    let (tx, rx) = watch::channel(None);
                    map.insert(chunk_ref.to_owned(), rx);
                    Role::Owner(tx)
                }
            }
        };

        match role {
            Role::Waiter(mut rx) => {
                tracing::trace!(chunk_ref, "joining in-flight fetch");
                match rx.wait_for(Option::is_some).await {
                    Ok(shared) => (*shared)
                        .clone()
                        .unwrap_or_else(|| Err(LoadError::new(chunk_ref, LoadFailure::Cancelled))),
                    Err(_) => Err(LoadError::new(chunk_ref, LoadFailure::Cancelled)),
                }
            }
            Role::Owner(tx) => {
                let guard = InFlightGuard {
                    map: &self.in_flight,
                    chunk_ref,
                };
                let result = self.fetch_chunk(chunk_ref).await;
                if let Err(err) = &result {
                    self.counters.failures.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(chunk_ref, error = %err.reason, "chunk load failed");
                }
                // Leave the in-flight set before publishing, so a failure can be retried at once.
                drop(guard);
                tx.send_replace(Some(result.clone()));
                result
            }
        }
    }

    async fn fetch_chunk(&self, chunk_ref: &str) -> Result<Arc<Node>, LoadError> {
        let Some(entry) = self.manifest.entry(chunk_ref) else {
            return Err(LoadError::new(chunk_ref, LoadFailure::UnknownChunk));
        };
        let expected = entry.node_count;
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| LoadError::new(chunk_ref, LoadFailure::Cancelled))?;
        let _slot = Slot::enter(&self.counters);
        let started = Instant::now();
        let bytes = fetch_timed(self.fetch.as_ref(), chunk_ref, &self.config).await?;
        let node = decode(&bytes).map_err(|e| LoadError::new(chunk_ref, e))?;
        if node.is_stub {
            return Err(LoadError::new(
                chunk_ref,
                FormatError::StubInvariant {
                    path: "$".to_owned(),
                    reason: "a chunk root must be materialized",
                },
            ));
        }
        let census = node.census();
        if census.nodes != expected {
            tracing::warn!(chunk_ref, expected, found = census.nodes, "chunk size differs from manifest");
        }
        tracing::debug!(
            chunk_ref,
            bytes = bytes.len(),
            nodes = census.nodes,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "fetched chunk"
        );
        Ok(Arc::new(node))
    }

    /// Replace `stub`'s children with the chunk's, keeping the stub's name and level.
    ///
    /// Returns the number of nodes materialized. Does nothing (and returns 0) if
    /// `stub` was already hydrated.
    pub fn merge_into(&self, stub: &mut Node, chunk: Arc<Node>) -> u64 {
        if !stub.is_stub {
            return 0;
        }
        if chunk.name != stub.name || chunk.level != stub.level {
            tracing::warn!(
                stub = %stub.name,
                chunk = %chunk.name,
                stub_level = stub.level,
                chunk_level = chunk.level,
                "chunk root does not match its stub; keeping the stub's identity"
            );
        }
        let added = chunk.census().materialized();
        let (children, leaf_count) = match Arc::try_unwrap(chunk) {
            Ok(mut node) => (node.children.take(), node.leaf_count),
            Err(shared) => (shared.children.clone(), shared.leaf_count),
        };
        stub.children = Some(children.unwrap_or_default());
        stub.leaf_count = leaf_count;
        stub.is_stub = false;
        stub.chunk_ref = None;
        stub.node_count = None;
        self.loaded.fetch_add(added, Ordering::Relaxed);
        added
    }

    /// Hydrate one stub in place. A node that is not a stub is left alone.
    ///
    /// On failure the stub is unchanged.
    pub async fn hydrate(&self, stub: &mut Node) -> Result<(), LoadError> {
        let Some(chunk_ref) = stub.chunk_ref.clone().filter(|_| stub.is_stub) else {
            return Ok(());
        };
        let chunk = self.load_chunk(&chunk_ref).await?;
        self.merge_into(stub, chunk);
        Ok(())
    }

    /// Hydrate every stub reachable from `root`, level by level.
    ///
    /// Fetches run concurrently (within the worker budget); merges happen here, on
    /// the calling task. Every `yield_every` merged nodes the task yields, unless
    /// `visibility` reports the surface hidden. Failed stubs stay stubs and are
    /// listed in the summary.
    pub async fn hydrate_all(self: &Arc<Self>, root: &mut Node, visibility: &Visibility) -> HydrateSummary {
        let mut summary = HydrateSummary::default();
        let mut tasks = JoinSet::new();
        let mut since_yield = 0_u64;
        for (path, chunk_ref) in root.stubs() {
            self.spawn_load(&mut tasks, path, chunk_ref);
        }
        while let Some(joined) = tasks.join_next().await {
            let (path, result) = match joined {
                Ok(done) => done,
                Err(err) => {
                    tracing::error!(error = %err, "hydration task failed");
                    continue;
                }
            };
            let chunk = match result {
                Ok(chunk) => chunk,
                Err(err) => {
                    summary.failures.push(err);
                    continue;
                }
            };
            let Some(node) = root.find_mut(path.segments()) else {
                tracing::warn!(path = %path, "hydrated path no longer in tree");
                continue;
            };
            let added = self.merge_into(node, chunk);
            if added == 0 {
                tracing::warn!(
                    path = %path,
                    "path resolves to a node that is not a stub; chunk not applied"
                );
                continue;
            }
            summary.chunks += 1;
            summary.nodes += added;
            for (nested, chunk_ref) in node.stubs_at(path) {
                self.spawn_load(&mut tasks, nested, chunk_ref);
            }
            since_yield += added;
            if since_yield >= self.config.yield_every {
                since_yield = 0;
                if !visibility.is_hidden() {
                    tokio::task::yield_now().await;
                }
            }
        }
        tracing::info!(
            chunks = summary.chunks,
            nodes = summary.nodes,
            failures = summary.failures.len(),
            "hydrated tree"
        );
        summary
    }

    fn spawn_load(
        self: &Arc<Self>,
        tasks: &mut JoinSet<(NodePath, Result<Arc<Node>, LoadError>)>,
        path: NodePath,
        chunk_ref: String,
    ) {
        let loader = Arc::clone(self);
        tasks.spawn(async move {
            let result = loader.load_chunk(&chunk_ref).await;
            (path, result)
        });
    }
}

async fn fetch_timed(fetch: &dyn Fetch, name: &str, config: &LoaderConfig) -> Result<Vec<u8>, LoadError> {
    match tokio::time::timeout(config.fetch_timeout, fetch.fetch(name)).await {
        Ok(Ok(bytes)) => Ok(bytes),
        Ok(Err(err)) => Err(LoadError::new(name, LoadFailure::Fetch(err.to_string()))),
        Err(_) => Err(LoadError::new(name, LoadFailure::Timeout(config.fetch_timeout))),
    }
}
