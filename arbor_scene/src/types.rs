// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the scene: node identifiers, entry flags, and detail levels.

/// Identifier for a node in the scene.
///
/// A slot index plus the scene epoch it was issued in.
///
/// ## Semantics
///
/// - Slots are never freed; a node keeps its slot for the life of the scene.
/// - Every [graft](crate::Scene::graft) bumps the epoch. Ids issued before the
///   graft stop resolving, even though their slot is still occupied, because
///   the node behind it may have stopped being a stub.
/// - Re-resolve by identity with [`Scene::find`](crate::Scene::find) when an
///   id goes stale.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct SceneNodeId(pub(crate) u32, pub(crate) u32);

impl SceneNodeId {
    pub(crate) const fn new(slot: u32, epoch: u32) -> Self {
        Self(slot, epoch)
    }

    pub(crate) const fn slot(self) -> usize {
        self.0 as usize
    }

    /// The epoch this id was issued in.
    pub const fn epoch(self) -> u32 {
        self.1
    }
}

bitflags::bitflags! {
    /// Per-entry facts a painter needs.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct EntryFlags: u8 {
        /// The node is a stub; its subtree has not been hydrated.
        const STUB    = 0b0000_0001;
        /// The node has no children.
        const LEAF    = 0b0000_0010;
        /// A label was placed for this node this frame.
        const LABELED = 0b0000_0100;
    }
}

/// How much of a node to draw.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DetailLevel {
    /// A few pixels: a filled dot.
    Dot,
    /// A circle with outline, no text.
    Disc,
    /// A circle with its label.
    Labeled,
}

impl DetailLevel {
    /// Screen radius below which nodes are drawn as dots.
    pub const DOT_RADIUS_PX: f64 = 3.0;

    /// Pick a level from screen radius and whether a label was placed.
    pub fn from_screen_radius(radius_px: f64, labeled: bool) -> Self {
        if labeled {
            Self::Labeled
        } else if radius_px < Self::DOT_RADIUS_PX {
            Self::Dot
        } else {
            Self::Disc
        }
    }
}
