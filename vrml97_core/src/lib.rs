// Copyright 2026 the VRML97 Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Runtime core of a VRML97 scene graph.
//!
//! `vrml97_core` provides the reflective node model, event routing, bounding
//! volume caching, and bound-node stacks that concrete VRML97 node classes
//! are built on. It is `no_std` compatible (with `alloc`) and stores nodes in
//! struct-of-arrays layout behind generational handles.
//!
//! # Architecture
//!
//! A scene is driven by an external stepper. Each entry point runs handlers,
//! queues the events they emit, and drains the queue before returning:
//!
//! ```text
//!   Host ──► Scene::tick(now) ──► time-dependent updates
//!                 │                        │ emit
//!                 │                        ▼
//!   Host ──► Scene::process_event ──► EventQueue (FIFO) ──► route targets
//!                                          ▲                    │
//!                                          └──── emit ──────────┘
//!                                                               │ write
//!                                                               ▼
//!                          NodeStore (values, modified, BOUNDS dirty marks)
//!                                                               │
//!   Host ──► Scene::render(viewer) ◄────────────────────────────┘
//! ```
//!
//! **[`field`]** — `FieldType`/`FieldValue`: the VRML97 value types.
//!
//! **[`node`]** — Node classes, node types, and the struct-of-arrays
//! [`NodeStore`](node::NodeStore) with generational [`NodeId`](node::NodeId)
//! handles. Interfaces are resolved by name at run time.
//!
//! **[`event`]** — Routes and the FIFO worklist. Emissions are queued, never
//! delivered recursively; an eventOut fires at most once per timestamp per
//! cascade.
//!
//! **[`scene`]** — The [`Scene`](scene::Scene): class registry, roots,
//! lifecycle, routing entry points, and queries.
//!
//! **[`bounds`]** / **[`dirty`]** — Bounding spheres and their lazily
//! recomputed cache, invalidated through `understory_dirty`.
//!
//! **[`bindable`]** — Bound-node stacks for Background, Fog, NavigationInfo,
//! and Viewpoint.
//!
//! **[`render`]** / **[`viewer`]** — Render traversal with culling and cached
//! viewer objects, and the [`Viewer`](viewer::Viewer) contract it targets.
//!
//! **[`browser`]** / **[`resource`]** — Host contract and resource streams.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) trait and event types,
//! with the zero-overhead [`Tracer`](trace::Tracer) owner.
//!
//! **[`transform`]** — 3D affine transform used by grouping nodes.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-delivery
//!   and per-bounds-recompute events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod bindable;
pub mod bounds;
pub mod browser;
pub mod config;
pub mod dirty;
pub mod error;
pub mod event;
pub mod field;
pub mod node;
pub mod render;
pub mod resource;
pub mod scene;
pub mod trace;
pub mod transform;
pub mod viewer;

pub use error::Error;
