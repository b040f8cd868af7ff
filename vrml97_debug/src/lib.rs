// Copyright 2026 the VRML97 Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and Chrome trace export for vrml97 scene
//! diagnostics.
//!
//! This crate provides [`TraceSink`](vrml97_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`]: compact binary recording with
//!   [`recorder::decode`] for playback.
//! - [`chrome::export`]: writes Chrome Trace Event Format JSON from recorded
//!   bytes.
//!
//! Sinks are installed with
//! [`Scene::set_trace_sink`](vrml97_core::scene::Scene::set_trace_sink). To
//! read a sink back after the scene is done with it, install it as
//! `Rc<RefCell<_>>`.

pub mod chrome;
pub mod pretty;
pub mod recorder;
