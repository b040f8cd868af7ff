// Copyright 2026 the VRML97 Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Read-only node views.

use alloc::string::String;
use core::any::Any;

use super::id::NodeId;
use super::node_type::NodeType;
use super::store::NodeStore;
use crate::field::{Color, FieldValue, Image, Rotation, Vec2f, Vec3f};

/// A read-only view of one live node.
///
/// Capability callbacks (bounds, geometry insertion, lights) receive a view
/// so they can read their own fields and follow node-valued fields without
/// mutating the scene.
#[derive(Clone, Copy)]
pub struct NodeView<'a> {
    store: &'a NodeStore,
    id: NodeId,
}

impl core::fmt::Debug for NodeView<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NodeView").field("id", &self.id).finish_non_exhaustive()
    }
}

impl<'a> NodeView<'a> {
    pub(crate) fn new(store: &'a NodeStore, id: NodeId) -> Self {
        Self { store, id }
    }

    /// Handle of the viewed node.
    #[inline]
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Type of the viewed node.
    #[must_use]
    pub fn node_type(&self) -> &'a NodeType {
        self.store.node_type(self.id)
    }

    /// Current value of the field, exposedField, or eventOut `name`.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&'a FieldValue> {
        let port = self.store.node_type(self.id).value_port(name)?;
        Some(self.store.value(self.id, port.slot?))
    }

    /// Node-private state of type `T`, if any.
    #[must_use]
    pub fn state<T: Any>(&self) -> Option<&'a T> {
        self.store.state[self.id.idx as usize].as_ref()?.downcast_ref()
    }

    /// View of the node referenced by the `SFNode` field `name`, if live.
    #[must_use]
    pub fn node(&self, name: &str) -> Option<Self> {
        let id = self.field(name)?.as_node()??;
        self.store.is_alive(id).then(|| Self::new(self.store, id))
    }

    /// Views of the live nodes referenced by the `MFNode` field `name`.
    pub fn nodes(&self, name: &str) -> impl Iterator<Item = Self> + use<'a> {
        let store = self.store;
        self.field(name)
            .map(FieldValue::node_refs)
            .unwrap_or(&[])
            .iter()
            .filter(move |&&id| store.is_alive(id))
            .map(move |&id| Self::new(store, id))
    }

    // -- Typed field reads --

    /// `SFBool` field.
    #[must_use]
    pub fn bool(&self, name: &str) -> Option<bool> {
        self.field(name)?.as_bool()
    }

    /// `SFFloat` field.
    #[must_use]
    pub fn float(&self, name: &str) -> Option<f32> {
        self.field(name)?.as_float()
    }

    /// `SFInt32` field.
    #[must_use]
    pub fn int32(&self, name: &str) -> Option<i32> {
        self.field(name)?.as_int32()
    }

    /// `SFTime` field.
    #[must_use]
    pub fn time(&self, name: &str) -> Option<f64> {
        self.field(name)?.as_time()
    }

    /// `SFVec2f` field.
    #[must_use]
    pub fn vec2f(&self, name: &str) -> Option<Vec2f> {
        self.field(name)?.as_vec2f()
    }

    /// `SFVec3f` field.
    #[must_use]
    pub fn vec3f(&self, name: &str) -> Option<Vec3f> {
        self.field(name)?.as_vec3f()
    }

    /// `SFColor` field.
    #[must_use]
    pub fn color(&self, name: &str) -> Option<Color> {
        self.field(name)?.as_color()
    }

    /// `SFRotation` field.
    #[must_use]
    pub fn rotation(&self, name: &str) -> Option<Rotation> {
        self.field(name)?.as_rotation()
    }

    /// `SFString` field.
    #[must_use]
    pub fn str(&self, name: &str) -> Option<&'a str> {
        self.field(name)?.as_str()
    }

    /// `SFImage` field.
    #[must_use]
    pub fn image(&self, name: &str) -> Option<&'a Image> {
        self.field(name)?.as_image()
    }

    /// `MFFloat` field.
    #[must_use]
    pub fn floats(&self, name: &str) -> Option<&'a [f32]> {
        self.field(name)?.as_floats()
    }

    /// `MFColor` field.
    #[must_use]
    pub fn colors(&self, name: &str) -> Option<&'a [Color]> {
        self.field(name)?.as_colors()
    }

    /// `MFVec3f` field.
    #[must_use]
    pub fn vec3fs(&self, name: &str) -> Option<&'a [Vec3f]> {
        self.field(name)?.as_vec3fs()
    }

    /// `MFString` field.
    #[must_use]
    pub fn strings(&self, name: &str) -> Option<&'a [String]> {
        self.field(name)?.as_strings()
    }
}
