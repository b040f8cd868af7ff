// Copyright 2026 the VRML97 Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mutable access to one node from inside a handler or hook.

use alloc::boxed::Box;
use core::any::Any;

use super::id::NodeId;
use super::view::NodeView;
use crate::browser::Browser;
use crate::error::Error;
use crate::field::FieldValue;
use crate::scene::Scene;

/// The node an event handler, side effect, or lifecycle hook runs for,
/// together with the scene it lives in.
///
/// Writes and emissions made through a context join the current cascade; they
/// are delivered after the running handler returns.
#[derive(Debug)]
pub struct NodeContext<'a> {
    scene: &'a mut Scene,
    node: NodeId,
}

impl<'a> NodeContext<'a> {
    pub(crate) fn new(scene: &'a mut Scene, node: NodeId) -> Self {
        Self { scene, node }
    }

    /// The node this context is for.
    #[inline]
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The scene.
    #[inline]
    #[must_use]
    pub fn scene(&self) -> &Scene {
        self.scene
    }

    /// The scene, mutably.
    #[inline]
    pub fn scene_mut(&mut self) -> &mut Scene {
        self.scene
    }

    /// Read-only view of the node.
    #[must_use]
    pub fn view(&self) -> NodeView<'_> {
        self.scene.store().view(self.node)
    }

    /// Current value of `name` on the node.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.scene.store().view(self.node).field(name)
    }

    /// Stores `value` into a field or exposedField and runs its side effect,
    /// without emitting `_changed`.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownInterface`], [`Error::TypeMismatch`],
    /// [`Error::NodeExpired`] for a node-valued field referencing a destroyed
    /// node, or [`Error::NodeCycle`] for one that already contains this node.
    pub fn set_field(&mut self, name: &str, value: FieldValue, timestamp: f64) -> Result<(), Error> {
        self.scene.write_field(self.node, name, value, timestamp, false)
    }

    /// Writes an exposedField and queues its `_changed` emission.
    ///
    /// # Errors
    ///
    /// As [`set_field`](Self::set_field).
    pub fn write(&mut self, name: &str, value: FieldValue, timestamp: f64) -> Result<(), Error> {
        self.scene.write_field(self.node, name, value, timestamp, true)
    }

    /// Emits `value` from the eventOut (or exposedField) `event_out`.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownInterface`] or [`Error::TypeMismatch`].
    pub fn emit(&mut self, event_out: &str, value: FieldValue, timestamp: f64) -> Result<(), Error> {
        self.scene.emit_value(self.node, event_out, value, timestamp)
    }

    /// Marks the node's bounding volume (and its ancestors') stale.
    pub fn mark_bounds_dirty(&mut self) {
        self.scene.mark_bounds_dirty(self.node);
    }

    /// Sets the node's own `modified` flag.
    pub fn set_modified(&mut self, modified: bool) {
        self.scene.set_modified(self.node, modified);
    }

    /// Moves the node to the top of its class's bound stack.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfMemory`] if the stack cannot grow.
    pub fn bind(&mut self, timestamp: f64) -> Result<(), Error> {
        self.scene.bind_node(self.node, timestamp)
    }

    /// Removes the node from its class's bound stack.
    ///
    /// # Errors
    ///
    /// [`Error::NodeExpired`] if the node is gone.
    pub fn unbind(&mut self, timestamp: f64) -> Result<(), Error> {
        self.scene.unbind_node(self.node, timestamp)
    }

    /// Scene time of the current tick.
    #[must_use]
    pub fn current_time(&self) -> f64 {
        self.scene.current_time()
    }

    /// The host browser.
    pub fn browser(&mut self) -> &mut dyn Browser {
        self.scene.browser_mut()
    }

    /// Node-private state of type `T`.
    #[must_use]
    pub fn state<T: Any>(&self) -> Option<&T> {
        self.scene.store().state[self.node.idx as usize].as_ref()?.downcast_ref()
    }

    /// Node-private state of type `T`, mutably.
    pub fn state_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.scene.store_mut().state[self.node.idx as usize]
            .as_mut()?
            .downcast_mut()
    }

    /// Replaces the node-private state.
    pub fn set_state<T: Any>(&mut self, state: T) {
        self.scene.store_mut().state[self.node.idx as usize] = Some(Box::new(state));
    }
}
