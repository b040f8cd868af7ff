// Copyright 2026 the VRML97 Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Routes and the event worklist.
//!
//! A [`Route`] connects an emitter (eventOut or exposedField) of one node to
//! a listener (eventIn or exposedField) of another. Emissions never call
//! listeners directly: each one is appended to an explicit FIFO together with
//! the route targets it resolves to at emission time, and the scene drains
//! the FIFO to a fixpoint before a public entry point returns. Deliveries
//! that emit further events append to the same FIFO, so recursion depth stays
//! constant however long the cascade.

use alloc::collections::{BTreeSet, VecDeque};
use alloc::vec::Vec;

use crate::error::Error;
use crate::field::FieldValue;
use crate::node::NodeId;

/// A connection from an emitter to a listener.
///
/// Interface names are the canonical names on each node type, so a route
/// added as `translation_changed → set_translation` is stored as
/// `translation → translation`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Route {
    pub(crate) from: NodeId,
    pub(crate) from_port: usize,
    pub(crate) event_out: &'static str,
    pub(crate) to: NodeId,
    pub(crate) to_port: usize,
    pub(crate) event_in: &'static str,
}

impl Route {
    /// Source node.
    #[inline]
    #[must_use]
    pub fn source(&self) -> NodeId {
        self.from
    }

    /// Canonical name of the source emitter.
    #[inline]
    #[must_use]
    pub fn event_out(&self) -> &'static str {
        self.event_out
    }

    /// Destination node.
    #[inline]
    #[must_use]
    pub fn target(&self) -> NodeId {
        self.to
    }

    /// Canonical name of the destination listener.
    #[inline]
    #[must_use]
    pub fn event_in(&self) -> &'static str {
        self.event_in
    }

    fn same_endpoints(&self, other: &Self) -> bool {
        self.from == other.from
            && self.from_port == other.from_port
            && self.to == other.to
            && self.to_port == other.to_port
    }
}

/// All routes of a scene, in insertion order.
#[derive(Clone, Debug, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Creates an empty table.
    #[must_use]
    pub const fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Adds `route`. Returns `false` if an identical route already exists.
    pub(crate) fn add(&mut self, route: Route) -> Result<bool, Error> {
        if self.routes.iter().any(|r| r.same_endpoints(&route)) {
            return Ok(false);
        }
        self.routes.try_reserve(1)?;
        self.routes.push(route);
        Ok(true)
    }

    /// Removes the route with the given endpoints. Returns whether one was
    /// removed.
    pub(crate) fn remove(&mut self, route: &Route) -> bool {
        let before = self.routes.len();
        self.routes.retain(|r| !r.same_endpoints(route));
        self.routes.len() != before
    }

    /// Removes every route touching `node`.
    pub(crate) fn remove_node(&mut self, node: NodeId) {
        self.routes.retain(|r| r.from != node && r.to != node);
    }

    /// Routes leaving the given emitter.
    pub(crate) fn targets(&self, from: NodeId, from_port: usize) -> impl Iterator<Item = &Route> {
        self.routes
            .iter()
            .filter(move |r| r.from == from && r.from_port == from_port)
    }

    /// All routes.
    pub fn iter(&self) -> core::slice::Iter<'_, Route> {
        self.routes.iter()
    }

    /// Number of routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// One queued emission.
#[derive(Clone, Debug)]
pub(crate) struct Emission {
    pub(crate) source: NodeId,
    pub(crate) event_out: &'static str,
    pub(crate) value: FieldValue,
    pub(crate) timestamp: f64,
    /// `(destination, listener port, listener name)`, resolved when queued.
    pub(crate) targets: Vec<(NodeId, usize, &'static str)>,
}

/// What happened to an emission offered to the queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Enqueued {
    /// Appended to the FIFO.
    Queued,
    /// Dropped: the emitter already fired at this timestamp in this cascade.
    LoopBroken,
}

/// FIFO of pending emissions plus per-cascade bookkeeping.
#[derive(Debug, Default)]
pub(crate) struct EventQueue {
    pending: VecDeque<Emission>,
    /// `(source, emitter port, timestamp bits)` already fired this cascade.
    fired: BTreeSet<(NodeId, usize, u64)>,
    pub(crate) draining: bool,
    pub(crate) processed: u32,
}

impl EventQueue {
    pub(crate) fn push(
        &mut self,
        emission: Emission,
        port: usize,
        break_loops: bool,
    ) -> Result<Enqueued, Error> {
        if break_loops
            && !self
                .fired
                .insert((emission.source, port, emission.timestamp.to_bits()))
        {
            return Ok(Enqueued::LoopBroken);
        }
        self.pending.try_reserve(1)?;
        self.pending.push_back(emission);
        Ok(Enqueued::Queued)
    }

    pub(crate) fn pop(&mut self) -> Option<Emission> {
        self.pending.pop_front()
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }

    /// Discards everything queued and ends the cascade.
    pub(crate) fn clear(&mut self) {
        self.pending.clear();
        self.end_cascade();
    }

    /// Forgets which emitters fired.
    pub(crate) fn end_cascade(&mut self) {
        self.fired.clear();
        self.processed = 0;
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    fn route(from: u32, to: u32) -> Route {
        Route {
            from: NodeId::new_for_test(from, 0),
            from_port: 0,
            event_out: "value_changed",
            to: NodeId::new_for_test(to, 0),
            to_port: 1,
            event_in: "set_value",
        }
    }

    fn emission(source: u32, t: f64) -> Emission {
        Emission {
            source: NodeId::new_for_test(source, 0),
            event_out: "value_changed",
            value: FieldValue::SfFloat(1.0),
            timestamp: t,
            targets: vec![],
        }
    }

    #[test]
    fn duplicate_routes_are_ignored() {
        let mut table = RouteTable::new();
        assert!(table.add(route(0, 1)).unwrap(), "first add");
        assert!(!table.add(route(0, 1)).unwrap(), "duplicate add");
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn targets_keep_insertion_order() {
        let mut table = RouteTable::new();
        table.add(route(0, 2)).unwrap();
        table.add(route(5, 9)).unwrap();
        table.add(route(0, 1)).unwrap();
        let to: Vec<u32> = table
            .targets(NodeId::new_for_test(0, 0), 0)
            .map(|r| r.to.index())
            .collect();
        assert_eq!(to, vec![2, 1]);
    }

    #[test]
    fn remove_node_drops_both_directions() {
        let mut table = RouteTable::new();
        table.add(route(0, 1)).unwrap();
        table.add(route(1, 2)).unwrap();
        table.add(route(3, 4)).unwrap();
        table.remove_node(NodeId::new_for_test(1, 0));
        assert_eq!(table.len(), 1);
        assert!(table.remove(&route(3, 4)), "explicit removal");
        assert!(table.is_empty(), "table drained");
    }

    #[test]
    fn queue_is_fifo() {
        let mut q = EventQueue::default();
        q.push(emission(1, 0.0), 0, true).unwrap();
        q.push(emission(2, 0.0), 0, true).unwrap();
        assert_eq!(q.pop().map(|e| e.source.index()), Some(1));
        assert_eq!(q.pop().map(|e| e.source.index()), Some(2));
        assert!(q.pop().is_none(), "queue empty");
    }

    #[test]
    fn emitter_fires_once_per_timestamp_per_cascade() {
        let mut q = EventQueue::default();
        assert_eq!(q.push(emission(1, 2.0), 0, true).unwrap(), Enqueued::Queued);
        assert_eq!(q.push(emission(1, 2.0), 0, true).unwrap(), Enqueued::LoopBroken);
        assert_eq!(q.push(emission(1, 3.0), 0, true).unwrap(), Enqueued::Queued);
        assert_eq!(q.push(emission(1, 2.0), 1, true).unwrap(), Enqueued::Queued);
        q.end_cascade();
        assert_eq!(q.push(emission(1, 2.0), 0, true).unwrap(), Enqueued::Queued);
        assert_eq!(q.push(emission(1, 2.0), 0, false).unwrap(), Enqueued::Queued);
        assert_eq!(q.len(), 5);
    }
}
