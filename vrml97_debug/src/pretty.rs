// Copyright 2026 the VRML97 Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Scene times
//! are printed in seconds.

use std::io::Write;

use vrml97_core::node::NodeId;
use vrml97_core::trace::{
    BindEvent, BoundsRecomputed, CascadeTruncated, DeliveryFailure, EventDelivered,
    EventLoopBroken, LifecyclePhase, NodeLifecycleEvent, TickEvent, TickSummary, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    deliveries: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("deliveries", &self.deliveries)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self {
            writer,
            deliveries: false,
        }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            deliveries: false,
        }
    }

    /// Also print every successful delivery and bounds recompute. Off by
    /// default; a busy scene produces thousands per tick.
    #[must_use]
    pub fn with_deliveries(mut self, deliveries: bool) -> Self {
        self.deliveries = deliveries;
        self
    }

    /// Consumes the sink and returns its writer.
    #[must_use]
    pub fn into_writer(self) -> W {
        self.writer
    }
}

/// `#index@generation`
struct Node(NodeId);

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}@{}", self.0.index(), self.0.generation())
    }
}

fn phase_name(phase: LifecyclePhase) -> &'static str {
    match phase {
        LifecyclePhase::Created => "created",
        LifecyclePhase::Initialized => "initialized",
        LifecyclePhase::ShutDown => "shutdown",
        LifecyclePhase::Destroyed => "destroyed",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_tick_begin(&mut self, e: &TickEvent) {
        let _ = writeln!(self.writer, "[tick] #{} now={:.3}s", e.tick_index, e.now);
    }

    fn on_tick_end(&mut self, s: &TickSummary) {
        let _ = writeln!(
            self.writer,
            "[tick:end] #{} sensors={} delivered={} dropped={} loops={}",
            s.tick_index,
            s.time_dependents,
            s.events_delivered,
            s.deliveries_dropped,
            s.loops_broken,
        );
    }

    fn on_node_lifecycle(&mut self, e: &NodeLifecycleEvent<'_>) {
        let _ = writeln!(
            self.writer,
            "[node] {} {} {}",
            e.class_id,
            Node(e.node),
            phase_name(e.phase),
        );
    }

    fn on_bind_changed(&mut self, e: &BindEvent<'_>) {
        let state = if e.bound { "bound" } else { "unbound" };
        let _ = writeln!(
            self.writer,
            "[bind] {} {} {state} at {:.3}s",
            e.class_id,
            Node(e.node),
            e.timestamp,
        );
    }

    fn on_delivery_failed(&mut self, e: &DeliveryFailure<'_>) {
        let _ = writeln!(
            self.writer,
            "[route:FAILED] {}.{} -> {}.{} at {:.3}s: {}",
            Node(e.source),
            e.event_out,
            Node(e.target),
            e.event_in,
            e.timestamp,
            e.error,
        );
    }

    fn on_event_loop_broken(&mut self, e: &EventLoopBroken<'_>) {
        let _ = writeln!(
            self.writer,
            "[route:loop] {}.{} already fired at {:.3}s",
            Node(e.source),
            e.event_out,
            e.timestamp,
        );
    }

    fn on_cascade_truncated(&mut self, e: &CascadeTruncated) {
        let _ = writeln!(
            self.writer,
            "[cascade:TRUNCATED] processed={} discarded={}",
            e.processed, e.discarded,
        );
    }

    fn on_event_delivered(&mut self, e: &EventDelivered<'_>) {
        if !self.deliveries {
            return;
        }
        let _ = writeln!(
            self.writer,
            "[route] {}.{} -> {}.{} at {:.3}s",
            Node(e.source),
            e.event_out,
            Node(e.target),
            e.event_in,
            e.timestamp,
        );
    }

    fn on_bounds_recomputed(&mut self, e: &BoundsRecomputed) {
        if !self.deliveries {
            return;
        }
        let c = e.sphere.center();
        let _ = writeln!(
            self.writer,
            "[bounds] {} center=({}, {}, {}) radius={}",
            Node(e.node),
            c.x,
            c.y,
            c.z,
            e.sphere.radius(),
        );
    }
}
