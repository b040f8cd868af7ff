// Copyright 2026 the VRML97 Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bound-node stacks.
//!
//! Background, Fog, NavigationInfo, and Viewpoint are *bindable*: at most one
//! node of each class is active, and the active node is the top of a per-class
//! stack. Sending `set_bind TRUE` moves a node to the top; `set_bind FALSE`
//! removes it and re-activates whatever is below.
//!
//! [`BoundNodeStack`] holds the pure stack discipline and reports which
//! transitions happened. [`Scene`](crate::scene::Scene) turns those outcomes
//! into `isBound`/`bindTime` emissions and browser notifications.
//!
//! Entries are [`NodeId`]s, which never keep a node alive; the scene removes a
//! node from its stack (and clears `first`) while the node is being shut down,
//! so stacks never contain destroyed nodes.

use alloc::vec::Vec;

use crate::error::Error;
use crate::field::FieldValue;
use crate::node::{NodeContext, NodeId};

/// Result of [`BoundNodeStack::bind`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindOutcome {
    /// The node was already on top; nothing changed and nothing is emitted.
    Unchanged,
    /// The node is now on top.
    Bound {
        /// The node that was on top before, now covered.
        previous_top: Option<NodeId>,
    },
}

/// Result of [`BoundNodeStack::unbind`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UnbindOutcome {
    /// The node was on the stack (and has been removed).
    pub removed: bool,
    /// The node was the active one.
    pub was_top: bool,
    /// The node was on top and another node is now on top.
    pub new_top: Option<NodeId>,
}

/// An ordered stack of bound nodes; the last entry is the active one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BoundNodeStack {
    nodes: Vec<NodeId>,
}

impl BoundNodeStack {
    /// Creates an empty stack.
    #[must_use]
    pub const fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// The active node.
    #[inline]
    #[must_use]
    pub fn top(&self) -> Option<NodeId> {
        self.nodes.last().copied()
    }

    /// Whether `node` is anywhere on the stack.
    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the stack is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Entries from bottom to top.
    pub fn iter(&self) -> core::slice::Iter<'_, NodeId> {
        self.nodes.iter()
    }

    /// Moves `node` to the top.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfMemory`] if the stack cannot grow. The stack is left
    /// unchanged in that case.
    pub fn bind(&mut self, node: NodeId) -> Result<BindOutcome, Error> {
        let previous_top = self.top();
        if previous_top == Some(node) {
            return Ok(BindOutcome::Unchanged);
        }
        self.nodes.try_reserve(1)?;
        self.nodes.retain(|&n| n != node);
        self.nodes.push(node);
        Ok(BindOutcome::Bound { previous_top })
    }

    /// Removes `node` wherever it is.
    pub fn unbind(&mut self, node: NodeId) -> UnbindOutcome {
        let Some(pos) = self.nodes.iter().position(|&n| n == node) else {
            return UnbindOutcome::default();
        };
        let was_top = pos + 1 == self.nodes.len();
        self.nodes.remove(pos);
        UnbindOutcome {
            removed: true,
            was_top,
            new_top: if was_top { self.top() } else { None },
        }
    }
}

/// Per-class bindable bookkeeping: the first node seen during
/// initialization plus the bound stack.
#[derive(Clone, Debug, Default)]
pub struct BindableState {
    first: Option<NodeId>,
    stack: BoundNodeStack,
}

impl BindableState {
    /// Records the class's first node.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if a first node is already recorded.
    pub fn set_first(&mut self, node: NodeId) {
        debug_assert!(self.first.is_none(), "first bindable node already set");
        self.first = Some(node);
    }

    /// Forgets the first node.
    pub fn reset_first(&mut self) {
        self.first = None;
    }

    /// Whether a first node is recorded.
    #[must_use]
    pub fn has_first(&self) -> bool {
        self.first.is_some()
    }

    /// Whether `node` is the recorded first node.
    #[must_use]
    pub fn is_first(&self, node: NodeId) -> bool {
        self.first == Some(node)
    }

    /// The recorded first node.
    #[must_use]
    pub fn first(&self) -> Option<NodeId> {
        self.first
    }

    /// The bound stack.
    #[must_use]
    pub fn stack(&self) -> &BoundNodeStack {
        &self.stack
    }

    pub(crate) fn stack_mut(&mut self) -> &mut BoundNodeStack {
        &mut self.stack
    }
}

/// Shared `set_bind` eventIn handler for bindable classes.
///
/// # Errors
///
/// [`Error::OutOfMemory`] if the stack cannot grow.
pub fn set_bind(ctx: &mut NodeContext<'_>, value: &FieldValue, timestamp: f64) -> Result<(), Error> {
    if value.as_bool() == Some(true) {
        ctx.bind(timestamp)
    } else {
        ctx.unbind(timestamp)
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    fn n(i: u32) -> NodeId {
        NodeId::new_for_test(i, 0)
    }

    #[test]
    fn bind_a_b_a_leaves_a_on_top_of_b() {
        let (a, b) = (n(0), n(1));
        let mut s = BoundNodeStack::new();
        assert_eq!(s.bind(a).unwrap(), BindOutcome::Bound { previous_top: None });
        assert_eq!(s.bind(b).unwrap(), BindOutcome::Bound { previous_top: Some(a) });
        assert_eq!(s.bind(a).unwrap(), BindOutcome::Bound { previous_top: Some(b) });
        assert_eq!(s.iter().copied().collect::<Vec<_>>(), vec![b, a]);
        assert_eq!(s.top(), Some(a));
    }

    #[test]
    fn rebinding_top_is_a_no_op() {
        let a = n(0);
        let mut s = BoundNodeStack::new();
        s.bind(a).unwrap();
        assert_eq!(s.bind(a).unwrap(), BindOutcome::Unchanged);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn unbind_top_reveals_next() {
        let (a, b) = (n(0), n(1));
        let mut s = BoundNodeStack::new();
        s.bind(a).unwrap();
        s.bind(b).unwrap();
        let out = s.unbind(b);
        assert_eq!(
            out,
            UnbindOutcome {
                removed: true,
                was_top: true,
                new_top: Some(a),
            }
        );
    }

    #[test]
    fn unbind_below_top_keeps_top() {
        let (a, b) = (n(0), n(1));
        let mut s = BoundNodeStack::new();
        s.bind(a).unwrap();
        s.bind(b).unwrap();
        let out = s.unbind(a);
        assert!(out.removed, "removed from below");
        assert!(!out.was_top, "was covered");
        assert_eq!(out.new_top, None);
        assert_eq!(s.top(), Some(b));
    }

    #[test]
    fn unbind_last_empties() {
        let a = n(0);
        let mut s = BoundNodeStack::new();
        s.bind(a).unwrap();
        let out = s.unbind(a);
        assert!(out.was_top, "was the only entry");
        assert!(s.is_empty(), "stack emptied");
        assert_eq!(out.new_top, None);
        assert_eq!(s.unbind(a), UnbindOutcome::default(), "absent node is ignored");
    }

    #[test]
    fn first_bookkeeping() {
        let mut st = BindableState::default();
        assert!(!st.has_first(), "starts without first");
        st.set_first(n(3));
        assert!(st.is_first(n(3)), "first recorded");
        assert!(!st.is_first(n(4)), "other node is not first");
        st.reset_first();
        assert_eq!(st.first(), None);
    }
}
