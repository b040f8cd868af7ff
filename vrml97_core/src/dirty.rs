// Copyright 2026 the VRML97 Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! Bounding volumes are cached per node and invalidated through
//! [`understory_dirty`]. Each node depends on every node its `SFNode` and
//! `MFNode` fields reference, so an edge runs from a grouping node to each of
//! its children. Marking a node with
//! [`EagerPolicy`](understory_dirty::EagerPolicy) therefore marks every
//! ancestor whose volume contains it.
//!
//! # Consumption
//!
//! [`Scene::bounding_volume`](crate::scene::Scene::bounding_volume) drains
//! [`BOUNDS`], drops the cached spheres of every drained node, and then
//! recomputes lazily from the queried node downward. Writes never trigger a
//! recompute.

use understory_dirty::Channel;

/// Geometric extent changed; cached bounding spheres of the node and its
/// ancestors are stale.
pub const BOUNDS: Channel = Channel::new(0);
