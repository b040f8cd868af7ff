// Copyright 2026 the VRML97 Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as tagged little-endian records. Strings (class ids, interface
//! names, error messages) are stored length-prefixed. [`decode`] reads them
//! back as an iterator of [`RecordedEvent`].
//!
//! Node handles are recorded as their raw index and generation
//! ([`RecordedNode`]); they identify nodes within one recording only.

use vrml97_core::field::Vec3f;
use vrml97_core::node::NodeId;
use vrml97_core::trace::{
    BindEvent, BoundsRecomputed, CascadeTruncated, DeliveryFailure, EventDelivered,
    EventLoopBroken, LifecyclePhase, NodeLifecycleEvent, TickEvent, TickSummary, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_TICK_BEGIN: u8 = 1;
const TAG_TICK_END: u8 = 2;
const TAG_NODE_LIFECYCLE: u8 = 3;
const TAG_BIND_CHANGED: u8 = 4;
const TAG_DELIVERY_FAILED: u8 = 5;
const TAG_EVENT_LOOP_BROKEN: u8 = 6;
const TAG_CASCADE_TRUNCATED: u8 = 7;
const TAG_EVENT_DELIVERED: u8 = 8;
const TAG_BOUNDS_RECOMPUTED: u8 = 9;

/// A node handle as recorded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RecordedNode {
    /// Slot index.
    pub index: u32,
    /// Generation counter.
    pub generation: u32,
}

impl From<NodeId> for RecordedNode {
    fn from(id: NodeId) -> Self {
        Self {
            index: id.index(),
            generation: id.generation(),
        }
    }
}

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_f32(&mut self, v: f32) {
        self.write_u32(v.to_bits());
    }

    fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    fn write_node(&mut self, id: NodeId) {
        self.write_u32(id.index());
        self.write_u32(id.generation());
    }

    fn write_str(&mut self, s: &str) {
        let len = u32::try_from(s.len()).unwrap_or(u32::MAX);
        self.write_u32(len);
        self.buf.extend_from_slice(&s.as_bytes()[..len as usize]);
    }

    fn write_phase(&mut self, p: LifecyclePhase) {
        self.write_u8(match p {
            LifecyclePhase::Created => 0,
            LifecyclePhase::Initialized => 1,
            LifecyclePhase::ShutDown => 2,
            LifecyclePhase::Destroyed => 3,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_tick_begin(&mut self, e: &TickEvent) {
        self.write_u8(TAG_TICK_BEGIN);
        self.write_u64(e.tick_index);
        self.write_f64(e.now);
    }

    fn on_tick_end(&mut self, s: &TickSummary) {
        self.write_u8(TAG_TICK_END);
        self.write_u64(s.tick_index);
        self.write_f64(s.now);
        self.write_u32(s.time_dependents);
        self.write_u32(s.events_delivered);
        self.write_u32(s.deliveries_dropped);
        self.write_u32(s.loops_broken);
    }

    fn on_node_lifecycle(&mut self, e: &NodeLifecycleEvent<'_>) {
        self.write_u8(TAG_NODE_LIFECYCLE);
        self.write_node(e.node);
        self.write_str(e.class_id);
        self.write_phase(e.phase);
    }

    fn on_bind_changed(&mut self, e: &BindEvent<'_>) {
        self.write_u8(TAG_BIND_CHANGED);
        self.write_str(e.class_id);
        self.write_node(e.node);
        self.write_u8(u8::from(e.bound));
        self.write_f64(e.timestamp);
    }

    fn on_delivery_failed(&mut self, e: &DeliveryFailure<'_>) {
        self.write_u8(TAG_DELIVERY_FAILED);
        self.write_node(e.source);
        self.write_str(e.event_out);
        self.write_node(e.target);
        self.write_str(e.event_in);
        self.write_f64(e.timestamp);
        self.write_str(&e.error.to_string());
    }

    fn on_event_loop_broken(&mut self, e: &EventLoopBroken<'_>) {
        self.write_u8(TAG_EVENT_LOOP_BROKEN);
        self.write_node(e.source);
        self.write_str(e.event_out);
        self.write_f64(e.timestamp);
    }

    fn on_cascade_truncated(&mut self, e: &CascadeTruncated) {
        self.write_u8(TAG_CASCADE_TRUNCATED);
        self.write_u32(e.processed);
        self.write_u64(u64::try_from(e.discarded).unwrap_or(u64::MAX));
    }

    fn on_event_delivered(&mut self, e: &EventDelivered<'_>) {
        self.write_u8(TAG_EVENT_DELIVERED);
        self.write_node(e.source);
        self.write_str(e.event_out);
        self.write_node(e.target);
        self.write_str(e.event_in);
        self.write_f64(e.timestamp);
    }

    fn on_bounds_recomputed(&mut self, e: &BoundsRecomputed) {
        self.write_u8(TAG_BOUNDS_RECOMPUTED);
        self.write_node(e.node);
        let c = e.sphere.center();
        self.write_f32(c.x);
        self.write_f32(c.y);
        self.write_f32(c.z);
        self.write_f32(e.sphere.radius());
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`TickEvent`].
    TickBegin(TickEvent),
    /// A [`TickSummary`].
    TickEnd(TickSummary),
    /// A [`NodeLifecycleEvent`].
    NodeLifecycle {
        /// The node.
        node: RecordedNode,
        /// Class id.
        class_id: String,
        /// New phase.
        phase: LifecyclePhase,
    },
    /// A [`BindEvent`].
    BindChanged {
        /// Class id of the stack.
        class_id: String,
        /// The node.
        node: RecordedNode,
        /// New `isBound` value.
        bound: bool,
        /// Event timestamp.
        timestamp: f64,
    },
    /// A [`DeliveryFailure`], with the error rendered as text.
    DeliveryFailed {
        /// Emitting node.
        source: RecordedNode,
        /// Emitter name.
        event_out: String,
        /// Destination node.
        target: RecordedNode,
        /// Listener name.
        event_in: String,
        /// Event timestamp.
        timestamp: f64,
        /// Error message.
        error: String,
    },
    /// An [`EventLoopBroken`].
    EventLoopBroken {
        /// Emitting node.
        source: RecordedNode,
        /// Emitter name.
        event_out: String,
        /// Event timestamp.
        timestamp: f64,
    },
    /// A [`CascadeTruncated`].
    CascadeTruncated {
        /// Emissions processed before the cap.
        processed: u32,
        /// Emissions discarded.
        discarded: u64,
    },
    /// An [`EventDelivered`].
    EventDelivered {
        /// Emitting node.
        source: RecordedNode,
        /// Emitter name.
        event_out: String,
        /// Destination node.
        target: RecordedNode,
        /// Listener name.
        event_in: String,
        /// Event timestamp.
        timestamp: f64,
    },
    /// A [`BoundsRecomputed`].
    BoundsRecomputed {
        /// The node.
        node: RecordedNode,
        /// Sphere center.
        center: Vec3f,
        /// Sphere radius (negative when empty).
        radius: f32,
    },
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take(&mut self, n: usize) -> Option<&[u8]> {
        let end = self.pos.checked_add(n)?;
        let bytes = self.data.get(self.pos..end)?;
        self.pos = end;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        Some(self.take(1)?[0])
    }

    fn read_u32(&mut self) -> Option<u32> {
        Some(u32::from_le_bytes(self.take(4)?.try_into().ok()?))
    }

    fn read_u64(&mut self) -> Option<u64> {
        Some(u64::from_le_bytes(self.take(8)?.try_into().ok()?))
    }

    fn read_f32(&mut self) -> Option<f32> {
        self.read_u32().map(f32::from_bits)
    }

    fn read_f64(&mut self) -> Option<f64> {
        self.read_u64().map(f64::from_bits)
    }

    fn read_node(&mut self) -> Option<RecordedNode> {
        Some(RecordedNode {
            index: self.read_u32()?,
            generation: self.read_u32()?,
        })
    }

    fn read_string(&mut self) -> Option<String> {
        let len = usize::try_from(self.read_u32()?).ok()?;
        Some(String::from_utf8_lossy(self.take(len)?).into_owned())
    }

    fn read_phase(&mut self) -> Option<LifecyclePhase> {
        Some(match self.read_u8()? {
            0 => LifecyclePhase::Created,
            1 => LifecyclePhase::Initialized,
            2 => LifecyclePhase::ShutDown,
            _ => LifecyclePhase::Destroyed,
        })
    }

    fn decode_tick_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::TickBegin(TickEvent {
            tick_index: self.read_u64()?,
            now: self.read_f64()?,
        }))
    }

    fn decode_tick_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::TickEnd(TickSummary {
            tick_index: self.read_u64()?,
            now: self.read_f64()?,
            time_dependents: self.read_u32()?,
            events_delivered: self.read_u32()?,
            deliveries_dropped: self.read_u32()?,
            loops_broken: self.read_u32()?,
        }))
    }

    fn decode_node_lifecycle(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::NodeLifecycle {
            node: self.read_node()?,
            class_id: self.read_string()?,
            phase: self.read_phase()?,
        })
    }

    fn decode_bind_changed(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::BindChanged {
            class_id: self.read_string()?,
            node: self.read_node()?,
            bound: self.read_u8()? != 0,
            timestamp: self.read_f64()?,
        })
    }

    fn decode_delivery_failed(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::DeliveryFailed {
            source: self.read_node()?,
            event_out: self.read_string()?,
            target: self.read_node()?,
            event_in: self.read_string()?,
            timestamp: self.read_f64()?,
            error: self.read_string()?,
        })
    }

    fn decode_event_loop_broken(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::EventLoopBroken {
            source: self.read_node()?,
            event_out: self.read_string()?,
            timestamp: self.read_f64()?,
        })
    }

    fn decode_cascade_truncated(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::CascadeTruncated {
            processed: self.read_u32()?,
            discarded: self.read_u64()?,
        })
    }

    fn decode_event_delivered(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::EventDelivered {
            source: self.read_node()?,
            event_out: self.read_string()?,
            target: self.read_node()?,
            event_in: self.read_string()?,
            timestamp: self.read_f64()?,
        })
    }

    fn decode_bounds_recomputed(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::BoundsRecomputed {
            node: self.read_node()?,
            center: Vec3f::new(self.read_f32()?, self.read_f32()?, self.read_f32()?),
            radius: self.read_f32()?,
        })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_u8()? {
            TAG_TICK_BEGIN => self.decode_tick_begin(),
            TAG_TICK_END => self.decode_tick_end(),
            TAG_NODE_LIFECYCLE => self.decode_node_lifecycle(),
            TAG_BIND_CHANGED => self.decode_bind_changed(),
            TAG_DELIVERY_FAILED => self.decode_delivery_failed(),
            TAG_EVENT_LOOP_BROKEN => self.decode_event_loop_broken(),
            TAG_CASCADE_TRUNCATED => self.decode_cascade_truncated(),
            TAG_EVENT_DELIVERED => self.decode_event_delivered(),
            TAG_BOUNDS_RECOMPUTED => self.decode_bounds_recomputed(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
