// Copyright 2026 the VRML97 Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! Ticks become duration slices; everything else is an instant event at the
//! scene time it carries, or at the enclosing tick's time when it carries
//! none.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::recorder::{RecordedEvent, RecordedNode, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Scene times (seconds) are converted to microseconds.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    let mut now = 0.0;

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::TickBegin(e) => {
                now = e.now;
                events.push(json!({
                    "ph": "B",
                    "name": "Tick",
                    "cat": "Scene",
                    "ts": seconds_to_us(e.now),
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "tick_index": e.tick_index,
                    }
                }));
            }
            RecordedEvent::TickEnd(s) => {
                events.push(json!({
                    "ph": "E",
                    "name": "Tick",
                    "cat": "Scene",
                    "ts": seconds_to_us(s.now),
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "tick_index": s.tick_index,
                        "time_dependents": s.time_dependents,
                        "events_delivered": s.events_delivered,
                        "deliveries_dropped": s.deliveries_dropped,
                        "loops_broken": s.loops_broken,
                    }
                }));
            }
            RecordedEvent::NodeLifecycle {
                node,
                class_id,
                phase,
            } => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("{phase:?}"),
                    "cat": "Lifecycle",
                    "ts": seconds_to_us(now),
                    "pid": 0,
                    "tid": 1,
                    "s": "t",
                    "args": {
                        "node": node_label(node),
                        "class": class_id,
                    }
                }));
            }
            RecordedEvent::BindChanged {
                class_id,
                node,
                bound,
                timestamp,
            } => {
                events.push(json!({
                    "ph": "i",
                    "name": if bound { "Bind" } else { "Unbind" },
                    "cat": "Bindable",
                    "ts": seconds_to_us(timestamp),
                    "pid": 0,
                    "tid": 2,
                    "s": "t",
                    "args": {
                        "node": node_label(node),
                        "class": class_id,
                    }
                }));
            }
            RecordedEvent::DeliveryFailed {
                source,
                event_out,
                target,
                event_in,
                timestamp,
                error,
            } => {
                events.push(json!({
                    "ph": "i",
                    "name": "DeliveryFailed",
                    "cat": "Routing",
                    "ts": seconds_to_us(timestamp),
                    "pid": 0,
                    "tid": 3,
                    "s": "g",
                    "args": {
                        "from": route_end(source, &event_out),
                        "to": route_end(target, &event_in),
                        "error": error,
                    }
                }));
            }
            RecordedEvent::EventLoopBroken {
                source,
                event_out,
                timestamp,
            } => {
                events.push(json!({
                    "ph": "i",
                    "name": "EventLoopBroken",
                    "cat": "Routing",
                    "ts": seconds_to_us(timestamp),
                    "pid": 0,
                    "tid": 3,
                    "s": "t",
                    "args": {
                        "from": route_end(source, &event_out),
                    }
                }));
            }
            RecordedEvent::CascadeTruncated {
                processed,
                discarded,
            } => {
                events.push(json!({
                    "ph": "i",
                    "name": "CascadeTruncated",
                    "cat": "Routing",
                    "ts": seconds_to_us(now),
                    "pid": 0,
                    "tid": 3,
                    "s": "g",
                    "args": {
                        "processed": processed,
                        "discarded": discarded,
                    }
                }));
            }
            RecordedEvent::EventDelivered {
                source,
                event_out,
                target,
                event_in,
                timestamp,
            } => {
                events.push(json!({
                    "ph": "i",
                    "name": "EventDelivered",
                    "cat": "Rich",
                    "ts": seconds_to_us(timestamp),
                    "pid": 0,
                    "tid": 3,
                    "s": "t",
                    "args": {
                        "from": route_end(source, &event_out),
                        "to": route_end(target, &event_in),
                    }
                }));
            }
            RecordedEvent::BoundsRecomputed {
                node,
                center,
                radius,
            } => {
                events.push(json!({
                    "ph": "i",
                    "name": "BoundsRecomputed",
                    "cat": "Rich",
                    "ts": seconds_to_us(now),
                    "pid": 0,
                    "tid": 4,
                    "s": "t",
                    "args": {
                        "node": node_label(node),
                        "center": [center.x, center.y, center.z],
                        "radius": radius,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn seconds_to_us(seconds: f64) -> f64 {
    seconds * 1_000_000.0
}

fn node_label(node: RecordedNode) -> String {
    format!("#{}@{}", node.index, node.generation)
}

fn route_end(node: RecordedNode, interface: &str) -> String {
    format!("{}.{interface}", node_label(node))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use vrml97_core::trace::{CascadeTruncated, TickEvent, TickSummary, TraceSink};

    #[test]
    fn export_produces_valid_json() {
        let mut rec = RecorderSink::new();
        rec.on_tick_begin(&TickEvent {
            tick_index: 1,
            now: 0.5,
        });
        rec.on_cascade_truncated(&CascadeTruncated {
            processed: 10,
            discarded: 4,
        });
        rec.on_tick_end(&TickSummary {
            tick_index: 1,
            now: 0.5,
            time_dependents: 2,
            ..TickSummary::default()
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();

        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert_eq!(parsed.len(), 3);

        assert_eq!(parsed[0]["ph"], "B");
        assert_eq!(parsed[0]["ts"], 500_000.0);

        // Untimed events take the tick's time.
        assert_eq!(parsed[1]["name"], "CascadeTruncated");
        assert_eq!(parsed[1]["ts"], 500_000.0);
        assert_eq!(parsed[1]["args"]["discarded"], 4);

        assert_eq!(parsed[2]["ph"], "E");
        assert_eq!(parsed[2]["args"]["time_dependents"], 2);
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert!(parsed.is_empty());
    }
}
