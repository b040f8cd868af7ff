// Copyright 2026 the VRML97 Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays node storage with allocation, field slots, and caches.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::Any;

use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use super::id::NodeId;
use super::node_type::NodeType;
use super::scope::Scope;
use super::traverse::NodeRefs;
use super::view::NodeView;
use crate::bounds::BoundingSphere;
use crate::dirty;
use crate::error::Error;
use crate::field::FieldValue;
use crate::viewer::ObjectHandle;

/// Struct-of-arrays storage for all nodes of a scene.
///
/// Nodes are addressed by [`NodeId`] handles. Each node occupies a slot in
/// parallel arrays. Destroyed nodes are recycled via a free list, and
/// generation counters make every outstanding handle to a destroyed node
/// detectably stale.
#[derive(Debug)]
pub struct NodeStore {
    // -- Type and values --
    pub(crate) node_type: Vec<Option<Rc<NodeType>>>,
    pub(crate) values: Vec<Vec<FieldValue>>,
    pub(crate) state: Vec<Option<Box<dyn Any>>>,

    // -- Naming --
    pub(crate) name: Vec<Option<String>>,
    pub(crate) scope: Vec<Option<Rc<Scope>>>,

    // -- Lifetime --
    pub(crate) ref_count: Vec<u32>,
    pub(crate) initialized: Vec<bool>,
    pub(crate) modified: Vec<bool>,

    // -- Caches --
    pub(crate) bounds: Vec<Option<BoundingSphere>>,
    pub(crate) viewer_object: Vec<Option<ObjectHandle>>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,
}

impl Default for NodeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            node_type: Vec::new(),
            values: Vec::new(),
            state: Vec::new(),
            name: Vec::new(),
            scope: Vec::new(),
            ref_count: Vec::new(),
            initialized: Vec::new(),
            modified: Vec::new(),
            bounds: Vec::new(),
            viewer_object: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
        }
    }

    // -- Allocation API --

    /// Stores a new node with the given type and slot values and returns its
    /// handle. The node starts unreferenced, uninitialized, modified, and
    /// with a dirty bounding volume.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfMemory`] if the arrays cannot grow.
    pub(crate) fn allocate(
        &mut self,
        node_type: Rc<NodeType>,
        values: Vec<FieldValue>,
    ) -> Result<NodeId, Error> {
        let idx = if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.node_type[i] = Some(node_type);
            self.values[i] = values;
            self.modified[i] = true;
            idx
        } else {
            self.reserve_one()?;
            let idx = self.len;
            self.len += 1;
            self.node_type.push(Some(node_type));
            self.values.push(values);
            self.state.push(None);
            self.name.push(None);
            self.scope.push(None);
            self.ref_count.push(0);
            self.initialized.push(false);
            self.modified.push(true);
            self.bounds.push(None);
            self.viewer_object.push(None);
            self.generation.push(0);
            idx
        };
        self.dirty.mark(idx, dirty::BOUNDS);
        Ok(NodeId {
            idx,
            generation: self.generation[idx as usize],
        })
    }

    fn reserve_one(&mut self) -> Result<(), Error> {
        self.node_type.try_reserve(1)?;
        self.values.try_reserve(1)?;
        self.state.try_reserve(1)?;
        self.name.try_reserve(1)?;
        self.scope.try_reserve(1)?;
        self.ref_count.try_reserve(1)?;
        self.initialized.try_reserve(1)?;
        self.modified.try_reserve(1)?;
        self.bounds.try_reserve(1)?;
        self.viewer_object.try_reserve(1)?;
        self.generation.try_reserve(1)?;
        self.free_list.try_reserve(1)?;
        Ok(())
    }

    /// Frees a node's slot and returns its former slot values, so the caller
    /// can release the nodes they reference.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub(crate) fn free(&mut self, id: NodeId) -> Vec<FieldValue> {
        self.validate(id);
        let i = id.idx as usize;
        self.dirty.remove_key(id.idx);
        self.node_type[i] = None;
        self.state[i] = None;
        self.name[i] = None;
        self.scope[i] = None;
        self.ref_count[i] = 0;
        self.initialized[i] = false;
        self.modified[i] = false;
        self.bounds[i] = None;
        self.viewer_object[i] = None;
        // Bump generation so old handles immediately fail validation.
        self.generation[i] = self.generation[i].wrapping_add(1);
        self.free_list.push(id.idx);
        core::mem::take(&mut self.values[i])
    }

    /// Returns whether the given handle refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        id.idx < self.len
            && self.generation[id.idx as usize] == id.generation
            && self.node_type[id.idx as usize].is_some()
    }

    /// Number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len as usize - self.free_list.len()
    }

    /// Whether no node is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // -- Getters --

    /// Type of a node.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn node_type(&self, id: NodeId) -> &Rc<NodeType> {
        self.validate(id);
        match &self.node_type[id.idx as usize] {
            Some(t) => t,
            None => unreachable!("validated slot has a type"),
        }
    }

    /// Type of a node, or `None` for a stale handle.
    #[must_use]
    pub fn try_node_type(&self, id: NodeId) -> Option<&Rc<NodeType>> {
        if self.is_alive(id) {
            self.node_type[id.idx as usize].as_ref()
        } else {
            None
        }
    }

    /// Read-only view of a node.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn view(&self, id: NodeId) -> NodeView<'_> {
        self.validate(id);
        NodeView::new(self, id)
    }

    /// Value in `slot`.
    #[inline]
    pub(crate) fn value(&self, id: NodeId, slot: usize) -> &FieldValue {
        &self.values[id.idx as usize][slot]
    }

    /// Replaces the value in `slot`, returning the old value.
    #[inline]
    pub(crate) fn replace_value(&mut self, id: NodeId, slot: usize, value: FieldValue) -> FieldValue {
        core::mem::replace(&mut self.values[id.idx as usize][slot], value)
    }

    /// All node handles referenced by a node's fields, in slot order.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn children(&self, id: NodeId) -> NodeRefs<'_> {
        self.validate(id);
        NodeRefs::new(&self.values[id.idx as usize])
    }

    /// DEF name of a node.
    #[must_use]
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.validate(id);
        self.name[id.idx as usize].as_deref()
    }

    /// Own `modified` flag (children not consulted).
    #[inline]
    #[must_use]
    pub fn own_modified(&self, id: NodeId) -> bool {
        self.validate(id);
        self.modified[id.idx as usize]
    }

    /// Sets the own `modified` flag.
    pub fn set_own_modified(&mut self, id: NodeId, modified: bool) {
        self.validate(id);
        self.modified[id.idx as usize] = modified;
    }

    /// Number of owning references (parent fields and scene roots).
    #[must_use]
    pub fn ref_count(&self, id: NodeId) -> u32 {
        self.validate(id);
        self.ref_count[id.idx as usize]
    }

    /// Whether the node has been initialized and not yet shut down.
    #[must_use]
    pub fn is_initialized(&self, id: NodeId) -> bool {
        self.validate(id);
        self.initialized[id.idx as usize]
    }

    // -- Bounds dependency graph --

    /// Records that `parent`'s volume depends on `child`'s.
    ///
    /// # Errors
    ///
    /// [`Error::NodeCycle`] if `parent` is already reachable from `child`.
    pub(crate) fn add_bounds_dependency(&mut self, parent: NodeId, child: NodeId) -> Result<(), Error> {
        self.dirty
            .add_dependency(parent.idx, child.idx, dirty::BOUNDS)
            .map(|_| ())
            .map_err(|_| Error::NodeCycle { parent, child })
    }

    /// Whether `to` is `from` or reachable from it through node-valued
    /// fields. Assumes the graph below `from` is acyclic.
    pub(crate) fn reaches(&self, from: NodeId, to: NodeId) -> bool {
        let mut pending = alloc::vec![from];
        while let Some(n) = pending.pop() {
            if n == to {
                return true;
            }
            if self.is_alive(n) {
                pending.extend(self.children(n));
            }
        }
        false
    }

    /// Drops the dependency of `parent` on `child`.
    pub(crate) fn remove_bounds_dependency(&mut self, parent: NodeId, child: NodeId) {
        self.dirty.remove_dependency(parent.idx, child.idx, dirty::BOUNDS);
    }

    /// Marks a node's volume (and every dependent ancestor's) stale.
    pub(crate) fn mark_bounds_dirty(&mut self, id: NodeId) {
        self.dirty.mark_with(id.idx, dirty::BOUNDS, &EagerPolicy);
    }

    /// Drains [`dirty::BOUNDS`] and drops the cached spheres of every drained
    /// slot.
    pub(crate) fn invalidate_bounds(&mut self) -> usize {
        let drained: Vec<u32> = self
            .dirty
            .drain(dirty::BOUNDS)
            .affected()
            .deterministic()
            .run()
            .collect();
        for &idx in &drained {
            if let Some(b) = self.bounds.get_mut(idx as usize) {
                *b = None;
            }
        }
        drained.len()
    }

    /// Panics if `id` is stale.
    fn validate(&self, id: NodeId) {
        assert!(
            self.is_alive(id),
            "stale NodeId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::field::{FieldType, FieldValue};
    use crate::node::class::{ClassDecl, InterfaceDecl, NodeClass};

    static DECLS: [InterfaceDecl; 2] = [
        InterfaceDecl::exposed_field(FieldType::MfNode, "children"),
        InterfaceDecl::field(FieldType::SfFloat, "radius"),
    ];
    static CLASS: ClassDecl = ClassDecl::new(&DECLS);

    fn ty() -> Rc<NodeType> {
        NodeClass::new("Thing", &CLASS).create_default_type("Thing").unwrap()
    }

    fn node(store: &mut NodeStore) -> NodeId {
        let t = ty();
        let values = t.initial_values().unwrap();
        store.allocate(t, values).unwrap()
    }

    #[test]
    fn allocate_and_free() {
        let mut store = NodeStore::new();
        let id = node(&mut store);
        assert!(store.is_alive(id), "fresh node is alive");
        assert_eq!(store.len(), 1);
        let _ = store.free(id);
        assert!(!store.is_alive(id), "freed node is dead");
        assert!(store.is_empty(), "store is empty");
    }

    #[test]
    fn generation_prevents_stale_access() {
        let mut store = NodeStore::new();
        let id1 = node(&mut store);
        let _ = store.free(id1);
        let id2 = node(&mut store);
        assert!(!store.is_alive(id1), "old handle is stale");
        assert!(store.is_alive(id2), "new handle is live");
        assert_eq!(id1.idx, id2.idx);
        assert_ne!(id1.generation, id2.generation);
        assert!(store.try_node_type(id1).is_none(), "stale lookup yields None");
    }

    #[test]
    #[should_panic(expected = "stale NodeId")]
    fn stale_handle_panics_on_node_type() {
        let mut store = NodeStore::new();
        let id = node(&mut store);
        let _ = store.free(id);
        let _ = store.node_type(id);
    }

    #[test]
    fn free_returns_values_and_children_iterate() {
        let mut store = NodeStore::new();
        let a = node(&mut store);
        let b = node(&mut store);
        let parent = node(&mut store);
        let _ = store.replace_value(parent, 0, FieldValue::MfNode(vec![a, b]));
        assert_eq!(store.children(parent).collect::<Vec<_>>(), vec![a, b]);
        let values = store.free(parent);
        assert_eq!(values[0], FieldValue::MfNode(vec![a, b]));
    }

    #[test]
    fn marking_a_child_invalidates_its_parent() {
        let mut store = NodeStore::new();
        let child = node(&mut store);
        let parent = node(&mut store);
        let other = node(&mut store);
        store.add_bounds_dependency(parent, child).unwrap();
        let _ = store.invalidate_bounds();
        for id in [child, parent, other] {
            store.bounds[id.idx as usize] = Some(BoundingSphere::EMPTY);
        }

        store.mark_bounds_dirty(child);
        let _ = store.invalidate_bounds();
        assert!(store.bounds[child.idx as usize].is_none(), "child invalidated");
        assert!(store.bounds[parent.idx as usize].is_none(), "parent invalidated");
        assert!(store.bounds[other.idx as usize].is_some(), "unrelated node kept");
    }

    #[test]
    fn reaches_follows_node_fields() {
        let mut store = NodeStore::new();
        let leaf = node(&mut store);
        let mid = node(&mut store);
        let top = node(&mut store);
        let _ = store.replace_value(mid, 0, FieldValue::MfNode(vec![leaf]));
        let _ = store.replace_value(top, 0, FieldValue::MfNode(vec![mid]));
        assert!(store.reaches(top, leaf), "grandchild reachable");
        assert!(store.reaches(leaf, leaf), "a node reaches itself");
        assert!(!store.reaches(leaf, top), "edges point downward");
    }
}
