// Copyright 2026 the VRML97 Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the scene.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! scene calls at each stage of a tick and whenever something noteworthy
//! happens to a node, a binding, or an event. All method bodies default to
//! no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] owns an optional boxed sink. When the `trace` feature is
//! **off**, every `Tracer` method compiles to nothing and installed sinks are
//! dropped. When **on**, each method performs a single `Option` branch before
//! dispatching.
//!
//! A sink shared as `Rc<RefCell<S>>` is itself a sink, so a host can install
//! it and still read what it collected.
//!
//! # Crate features
//!
//! - `trace` enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`) gates [`EventDelivered`] and
//!   [`BoundsRecomputed`] plus the corresponding `TraceSink` methods.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::RefCell;

#[cfg(feature = "trace-rich")]
use crate::bounds::BoundingSphere;
use crate::error::Error;
use crate::node::NodeId;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Lifecycle phase of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LifecyclePhase {
    /// Allocated in the store.
    Created,
    /// Initialized (registered with the browser, class hook run).
    Initialized,
    /// Shut down (deregistered, unbound).
    ShutDown,
    /// Slot freed; the handle is now stale.
    Destroyed,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted at the start of [`Scene::tick`](crate::scene::Scene::tick).
#[derive(Clone, Copy, Debug)]
pub struct TickEvent {
    /// Monotonic tick counter.
    pub tick_index: u64,
    /// Scene time of the tick, in seconds.
    pub now: f64,
}

/// Per-tick counters, returned by [`Scene::tick`](crate::scene::Scene::tick)
/// and reported to [`TraceSink::on_tick_end`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TickSummary {
    /// Monotonic tick counter.
    pub tick_index: u64,
    /// Scene time of the tick, in seconds.
    pub now: f64,
    /// Time-dependent nodes updated.
    pub time_dependents: u32,
    /// Successful deliveries to listeners.
    pub events_delivered: u32,
    /// Deliveries dropped because of an error.
    pub deliveries_dropped: u32,
    /// Emissions dropped by loop breaking.
    pub loops_broken: u32,
}

/// A node changed lifecycle phase.
#[derive(Clone, Copy, Debug)]
pub struct NodeLifecycleEvent<'a> {
    /// The node. After [`LifecyclePhase::Destroyed`] the handle is stale.
    pub node: NodeId,
    /// Class id of the node.
    pub class_id: &'a str,
    /// New phase.
    pub phase: LifecyclePhase,
}

/// A bindable node was bound or unbound.
#[derive(Clone, Copy, Debug)]
pub struct BindEvent<'a> {
    /// Class id of the stack.
    pub class_id: &'a str,
    /// The node whose `isBound` changed.
    pub node: NodeId,
    /// New `isBound` value.
    pub bound: bool,
    /// Event timestamp.
    pub timestamp: f64,
}

/// A delivery was dropped.
#[derive(Clone, Copy, Debug)]
pub struct DeliveryFailure<'a> {
    /// Emitting node.
    pub source: NodeId,
    /// Emitter name.
    pub event_out: &'a str,
    /// Destination node.
    pub target: NodeId,
    /// Listener name.
    pub event_in: &'a str,
    /// Event timestamp.
    pub timestamp: f64,
    /// Why.
    pub error: &'a Error,
}

/// An emission was dropped because its eventOut already fired at this
/// timestamp in the current cascade.
#[derive(Clone, Copy, Debug)]
pub struct EventLoopBroken<'a> {
    /// Emitting node.
    pub source: NodeId,
    /// Emitter name.
    pub event_out: &'a str,
    /// Event timestamp.
    pub timestamp: f64,
}

/// A cascade hit the configured cap and its remaining emissions were dropped.
#[derive(Clone, Copy, Debug)]
pub struct CascadeTruncated {
    /// Emissions processed before the cap.
    pub processed: u32,
    /// Emissions discarded.
    pub discarded: usize,
}

/// A delivery reached a listener.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct EventDelivered<'a> {
    /// Emitting node, or the target itself for external events.
    pub source: NodeId,
    /// Emitter name (`""` for external events).
    pub event_out: &'a str,
    /// Destination node.
    pub target: NodeId,
    /// Listener name.
    pub event_in: &'a str,
    /// Event timestamp.
    pub timestamp: f64,
}

/// A node's bounding sphere was recomputed.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct BoundsRecomputed {
    /// The node.
    pub node: NodeId,
    /// The new sphere.
    pub sphere: BoundingSphere,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the scene.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a tick begins.
    fn on_tick_begin(&mut self, e: &TickEvent) {
        _ = e;
    }

    /// Called when a tick's cascade has drained.
    fn on_tick_end(&mut self, s: &TickSummary) {
        _ = s;
    }

    /// Called when a node changes lifecycle phase.
    fn on_node_lifecycle(&mut self, e: &NodeLifecycleEvent<'_>) {
        _ = e;
    }

    /// Called when a node's `isBound` changes.
    fn on_bind_changed(&mut self, e: &BindEvent<'_>) {
        _ = e;
    }

    /// Called when a delivery is dropped.
    fn on_delivery_failed(&mut self, e: &DeliveryFailure<'_>) {
        _ = e;
    }

    /// Called when loop breaking drops an emission.
    fn on_event_loop_broken(&mut self, e: &EventLoopBroken<'_>) {
        _ = e;
    }

    /// Called when a cascade is truncated.
    fn on_cascade_truncated(&mut self, e: &CascadeTruncated) {
        _ = e;
    }

    /// Called for every successful delivery (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_event_delivered(&mut self, e: &EventDelivered<'_>) {
        _ = e;
    }

    /// Called when a bounding sphere is recomputed (requires `trace-rich`
    /// feature).
    #[cfg(feature = "trace-rich")]
    fn on_bounds_recomputed(&mut self, e: &BoundsRecomputed) {
        _ = e;
    }
}

impl<S: TraceSink + ?Sized> TraceSink for Rc<RefCell<S>> {
    fn on_tick_begin(&mut self, e: &TickEvent) {
        self.borrow_mut().on_tick_begin(e);
    }

    fn on_tick_end(&mut self, s: &TickSummary) {
        self.borrow_mut().on_tick_end(s);
    }

    fn on_node_lifecycle(&mut self, e: &NodeLifecycleEvent<'_>) {
        self.borrow_mut().on_node_lifecycle(e);
    }

    fn on_bind_changed(&mut self, e: &BindEvent<'_>) {
        self.borrow_mut().on_bind_changed(e);
    }

    fn on_delivery_failed(&mut self, e: &DeliveryFailure<'_>) {
        self.borrow_mut().on_delivery_failed(e);
    }

    fn on_event_loop_broken(&mut self, e: &EventLoopBroken<'_>) {
        self.borrow_mut().on_event_loop_broken(e);
    }

    fn on_cascade_truncated(&mut self, e: &CascadeTruncated) {
        self.borrow_mut().on_cascade_truncated(e);
    }

    #[cfg(feature = "trace-rich")]
    fn on_event_delivered(&mut self, e: &EventDelivered<'_>) {
        self.borrow_mut().on_event_delivered(e);
    }

    #[cfg(feature = "trace-rich")]
    fn on_bounds_recomputed(&mut self, e: &BoundsRecomputed) {
        self.borrow_mut().on_bounds_recomputed(e);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Owner of an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
#[derive(Default)]
pub struct Tracer {
    #[cfg(feature = "trace")]
    sink: Option<Box<dyn TraceSink>>,
}

impl core::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl Tracer {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: Box<dyn TraceSink>) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {}
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether a sink is installed and the `trace` feature is on.
    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        #[cfg(feature = "trace")]
        {
            self.sink.is_some()
        }
        #[cfg(not(feature = "trace"))]
        {
            false
        }
    }

    /// Emits a [`TickEvent`].
    #[inline]
    pub fn tick_begin(&mut self, e: &TickEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_tick_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`TickSummary`].
    #[inline]
    pub fn tick_end(&mut self, summary: &TickSummary) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_tick_end(summary);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = summary;
        }
    }

    /// Emits a [`NodeLifecycleEvent`].
    #[inline]
    pub fn node_lifecycle(&mut self, e: &NodeLifecycleEvent<'_>) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_node_lifecycle(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`BindEvent`].
    #[inline]
    pub fn bind_changed(&mut self, e: &BindEvent<'_>) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_bind_changed(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`DeliveryFailure`].
    #[inline]
    pub fn delivery_failed(&mut self, e: &DeliveryFailure<'_>) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_delivery_failed(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`EventLoopBroken`].
    #[inline]
    pub fn event_loop_broken(&mut self, e: &EventLoopBroken<'_>) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_event_loop_broken(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`CascadeTruncated`].
    #[inline]
    pub fn cascade_truncated(&mut self, e: &CascadeTruncated) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_cascade_truncated(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`EventDelivered`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn event_delivered(&mut self, e: &EventDelivered<'_>) {
        if let Some(s) = &mut self.sink {
            s.on_event_delivered(e);
        }
    }

    /// Emits a [`BoundsRecomputed`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn bounds_recomputed(&mut self, e: &BoundsRecomputed) {
        if let Some(s) = &mut self.sink {
            s.on_bounds_recomputed(e);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
