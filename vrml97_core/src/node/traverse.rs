// Copyright 2026 the VRML97 Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Graph traversal utilities.

use super::id::NodeId;
use crate::field::FieldValue;

/// An iterator over the node handles referenced by a node's field slots.
///
/// Yields `SFNode` and `MFNode` references in slot order, with repeats if a
/// node is referenced more than once. Created by
/// [`NodeStore::children`](super::NodeStore::children).
#[derive(Debug)]
pub struct NodeRefs<'a> {
    slots: core::slice::Iter<'a, FieldValue>,
    current: core::slice::Iter<'a, NodeId>,
}

impl<'a> NodeRefs<'a> {
    pub(crate) fn new(slots: &'a [FieldValue]) -> Self {
        Self {
            slots: slots.iter(),
            current: [].iter(),
        }
    }
}

impl Iterator for NodeRefs<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        loop {
            if let Some(&id) = self.current.next() {
                return Some(id);
            }
            self.current = self.slots.next()?.node_refs().iter();
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use super::*;

    #[test]
    fn walks_sf_and_mf_slots_in_order() {
        let a = NodeId::new_for_test(0, 0);
        let b = NodeId::new_for_test(1, 0);
        let c = NodeId::new_for_test(2, 0);
        let slots = [
            FieldValue::SfNode(Some(a)),
            FieldValue::SfFloat(2.0),
            FieldValue::SfNode(None),
            FieldValue::MfNode(vec![b, c, b]),
        ];
        let refs: Vec<NodeId> = NodeRefs::new(&slots).collect();
        assert_eq!(refs, vec![a, b, c, b]);
    }

    #[test]
    fn empty_slots_yield_nothing() {
        assert_eq!(NodeRefs::new(&[]).count(), 0);
    }
}
