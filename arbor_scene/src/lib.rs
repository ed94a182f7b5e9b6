// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Arbor Scene: a laid-out, culled, labelled view of a partially hydrated tree.
//!
//! A [`Scene`] flattens the tree into an arena of nested circles. Each frame,
//! [`Scene::cull`] projects it through a [`Camera`](arbor_view::Camera) and
//! returns a [`Frame`]:
//!
//! - the visible entries, pruned by subtree against a padded viewport and a
//!   minimum on-screen radius;
//! - label placements, largest first, at most one per label-grid neighbourhood;
//! - hydration requests for visible stubs, largest first;
//! - hit testing through a pick index built on first use.
//!
//! When the loader hydrates a stub, [`Scene::graft`] lays out the new subtree
//! in place. Layout depends only on a parent's circle and its children's leaf
//! counts, so existing nodes never move. Every graft bumps the scene epoch,
//! which retires older [`SceneNodeId`]s and frames.
//!
//! Large skeletons can be laid out a slice at a time with [`SceneBuilder`].
//!
//! ```
//! use arbor_chunk::Node;
//! use arbor_scene::{LayoutConfig, Scene};
//! use arbor_view::{Camera, Settings};
//! use kurbo::Size;
//!
//! let root = Node::branch("Life", 0, vec![
//!     Node::leaf("Bacteria", 1),
//!     Node::stub("Eukaryota", 1, "chunk_00000", 120, 180),
//! ]);
//! let scene = Scene::build(&root, LayoutConfig::default());
//! let frame = scene.cull(Camera::new(0.0, 0.0, 0.25), Size::new(640.0, 480.0), &Settings::default());
//! assert_eq!(frame.entries().len(), 3);
//! assert_eq!(frame.requests()[0].chunk_ref, "chunk_00000");
//! ```

mod frame;
mod layout;
mod scene;
mod types;

pub use frame::{Frame, FrameEntry, FrameKey, FrameStats, HydrationRequest, Label};
pub use layout::LayoutConfig;
pub use scene::{GraftError, Scene, SceneBuilder, SceneNode};
pub use types::{DetailLevel, EntryFlags, SceneNodeId};
