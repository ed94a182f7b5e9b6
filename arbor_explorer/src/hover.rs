// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hover state: enter/leave transitions from changes of the hovered path.
//!
//! ```
//! use arbor_chunk::NodePath;
//! use arbor_explorer::hover::{HoverEvent, HoverState};
//!
//! let mut h = HoverState::new();
//! let animals = NodePath::from(&["Life", "Animalia"][..]);
//! h.update(Some(&animals));
//! let events = h.update(Some(&NodePath::from(&["Life", "Plantae"][..])));
//! assert_eq!(events, [
//!     HoverEvent::Leave(animals),
//!     HoverEvent::Enter(NodePath::from(&["Life", "Plantae"][..])),
//! ]);
//! ```

use arbor_chunk::NodePath;

/// Tracks the hovered node by root path, so the state survives grafts that
/// retire scene ids.
///
/// Leaves are reported innermost first, enters outermost first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HoverState {
    current: Vec<String>,
}

/// A hover transition. Each event names the node entered or left.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HoverEvent {
    /// The pointer entered this node.
    Enter(NodePath),
    /// The pointer left this node.
    Leave(NodePath),
}

impl HoverState {
    /// Nothing hovered.
    pub fn new() -> Self {
        Self::default()
    }

    /// The hovered node, if any.
    pub fn current(&self) -> Option<NodePath> {
        (!self.current.is_empty()).then(|| NodePath::new(self.current.clone()))
    }

    /// Drop the hover, leaving every node on the path.
    pub fn clear(&mut self) -> Vec<HoverEvent> {
        self.update(None)
    }

    /// Move the hover to `path` (or to nothing) and report the transitions.
    pub fn update(&mut self, path: Option<&NodePath>) -> Vec<HoverEvent> {
        let new = path.map(NodePath::segments).unwrap_or(&[]);
        let common = self
            .current
            .iter()
            .zip(new)
            .take_while(|(a, b)| a == b)
            .count();

        let mut out = Vec::new();
        for depth in (common..self.current.len()).rev() {
            out.push(HoverEvent::Leave(NodePath::new(self.current[..=depth].to_vec())));
        }
        for depth in common..new.len() {
            out.push(HoverEvent::Enter(NodePath::new(new[..=depth].to_vec())));
        }
        self.current.clear();
        self.current.extend_from_slice(new);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(segments: &[&str]) -> NodePath {
        NodePath::from(segments)
    }

    #[test]
    fn fresh_path_enters_outer_to_inner() {
        let mut h = HoverState::new();
        let ev = h.update(Some(&p(&["a", "b", "c"])));
        assert_eq!(
            ev,
            [
                HoverEvent::Enter(p(&["a"])),
                HoverEvent::Enter(p(&["a", "b"])),
                HoverEvent::Enter(p(&["a", "b", "c"])),
            ]
        );
        assert_eq!(h.current(), Some(p(&["a", "b", "c"])));
    }

    #[test]
    fn clear_leaves_inner_to_outer() {
        let mut h = HoverState::new();
        h.update(Some(&p(&["a", "b"])));
        assert_eq!(
            h.clear(),
            [HoverEvent::Leave(p(&["a", "b"])), HoverEvent::Leave(p(&["a"]))]
        );
        assert_eq!(h.current(), None);
    }

    #[test]
    fn branch_change_keeps_shared_ancestry() {
        let mut h = HoverState::new();
        h.update(Some(&p(&["a", "b", "c"])));
        let ev = h.update(Some(&p(&["a", "x"])));
        assert_eq!(
            ev,
            [
                HoverEvent::Leave(p(&["a", "b", "c"])),
                HoverEvent::Leave(p(&["a", "b"])),
                HoverEvent::Enter(p(&["a", "x"])),
            ]
        );
    }

    #[test]
    fn same_path_is_quiet() {
        let mut h = HoverState::new();
        h.update(Some(&p(&["a", "b"])));
        assert!(h.update(Some(&p(&["a", "b"]))).is_empty());
    }
}
