// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Arbor Explorer: one zoomable session over a partitioned taxonomy.
//!
//! [`Explorer`] ties the pieces together. It opens the manifest and root
//! skeleton through the loader, lays the skeleton out as a scene, and keeps a
//! camera on it. Each [`render`](Explorer::render) culls the scene and asks
//! the loader for the stubs the frame wants; finished loads are merged into
//! the tree and grafted into the scene on the caller's task.
//!
//! Pointer input is turned into hover transitions ([`hover`]) and
//! click-to-zoom animations.
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Instant;
//!
//! use arbor_explorer::{Explorer, ExplorerConfig};
//! use arbor_loader::{FsFetch, Visibility};
//!
//! # async fn demo() -> Result<(), arbor_explorer::ExplorerError> {
//! let start = Instant::now();
//! let mut explorer = Explorer::open(
//!     Arc::new(FsFetch::new("data")),
//!     ExplorerConfig::default(),
//!     Visibility::new(),
//! )
//! .await?;
//! loop {
//!     explorer.apply_completed();
//!     let frame = explorer.render(start.elapsed());
//!     println!("{} nodes on screen", frame.entries().len());
//!     if !explorer.is_animating() && explorer.pending_requests() == 0 {
//!         break;
//!     }
//!     tokio::time::sleep(std::time::Duration::from_millis(16)).await;
//! }
//! # Ok(())
//! # }
//! ```

mod explorer;
pub mod hover;

pub use explorer::{Applied, Explorer, ExplorerConfig, ExplorerError};
