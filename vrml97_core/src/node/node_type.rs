// Copyright 2026 the VRML97 Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node types: a chosen interface subset of a class plus the per-type
//! reflection table.

use alloc::borrow::Cow;
use alloc::rc::Rc;
use alloc::vec::Vec;

use super::capability::Capabilities;
use super::class::{ClassDecl, InterfaceDecl};
use super::interface::{InterfaceKind, InterfaceSet};
use super::scope::Scope;
use super::NodeId;
use crate::error::Error;
use crate::field::{FieldType, FieldValue};
use crate::scene::Scene;

/// One resolved interface of a node type.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Port {
    /// Position in the type's interface set.
    pub(crate) index: usize,
    pub(crate) decl: &'static InterfaceDecl,
    /// Value slot; `None` for eventIns.
    pub(crate) slot: Option<usize>,
}

impl Port {
    #[inline]
    pub(crate) fn kind(&self) -> InterfaceKind {
        self.decl.kind
    }

    #[inline]
    pub(crate) fn field_type(&self) -> FieldType {
        self.decl.field_type
    }

    #[inline]
    pub(crate) fn name(&self) -> &'static str {
        self.decl.name
    }
}

/// A node type: the ordered, name-unique interfaces a node exposes.
///
/// Shared by every node created from it. Created by
/// [`NodeClass::create_type`](super::NodeClass::create_type).
#[derive(Debug)]
pub struct NodeType {
    id: Cow<'static, str>,
    class_id: Cow<'static, str>,
    decl: &'static ClassDecl,
    interfaces: InterfaceSet,
    ports: Vec<Port>,
    slot_count: usize,
}

impl NodeType {
    pub(crate) fn new(
        id: Cow<'static, str>,
        class_id: Cow<'static, str>,
        decl: &'static ClassDecl,
        interfaces: InterfaceSet,
        ports: Vec<Port>,
        slot_count: usize,
    ) -> Self {
        Self {
            id,
            class_id,
            decl,
            interfaces,
            ports,
            slot_count,
        }
    }

    /// Type id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Id of the class this type was created from.
    #[inline]
    #[must_use]
    pub fn class_id(&self) -> &str {
        &self.class_id
    }

    /// The class declaration table.
    #[inline]
    #[must_use]
    pub fn decl(&self) -> &'static ClassDecl {
        self.decl
    }

    /// Capabilities of nodes of this type.
    #[inline]
    #[must_use]
    pub fn capabilities(&self) -> &'static Capabilities {
        &self.decl.capabilities
    }

    /// The exposed interfaces.
    #[inline]
    #[must_use]
    pub fn interfaces(&self) -> &InterfaceSet {
        &self.interfaces
    }

    /// Whether an interface with this exact name is exposed.
    #[must_use]
    pub fn has_interface(&self, name: &str) -> bool {
        self.interfaces.find(name).is_some()
    }

    /// Number of value slots per node.
    #[inline]
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// Creates a node of this type in `scene`. See [`Scene::create_node`].
    ///
    /// # Errors
    ///
    /// As [`Scene::create_node`].
    pub fn create_node(
        self: Rc<Self>,
        scene: &mut Scene,
        scope: &Rc<Scope>,
        initial_values: &[(&str, FieldValue)],
    ) -> Result<NodeId, Error> {
        scene.create_node(&self, scope, None, initial_values)
    }

    // -- Reflection --

    pub(crate) fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub(crate) fn port(&self, index: usize) -> Option<Port> {
        self.ports.get(index).copied()
    }

    /// Resolves `name` as a listener (`set_` alias included).
    pub(crate) fn listener(&self, name: &str) -> Option<Port> {
        self.interfaces
            .find_listener(name)
            .and_then(|(i, _)| self.port(i))
    }

    /// Resolves `name` as an emitter (`_changed` alias included).
    pub(crate) fn emitter(&self, name: &str) -> Option<Port> {
        self.interfaces
            .find_emitter(name)
            .and_then(|(i, _)| self.port(i))
    }

    /// Resolves `name` as a readable value (any interface with a slot).
    pub(crate) fn value_port(&self, name: &str) -> Option<Port> {
        self.interfaces
            .find(name)
            .and_then(|(i, _)| self.port(i))
            .filter(|p| p.slot.is_some())
            .or_else(|| self.emitter(name))
    }

    /// Default slot values for a fresh node.
    pub(crate) fn initial_values(&self) -> Result<Vec<FieldValue>, Error> {
        let mut values = Vec::new();
        values.try_reserve_exact(self.slot_count)?;
        for port in &self.ports {
            if port.slot.is_some() {
                values.push(port.decl.default_value());
            }
        }
        Ok(values)
    }

    pub(crate) fn unknown(&self, name: &str) -> Error {
        Error::UnknownInterface {
            node_type: self.id.clone().into_owned(),
            name: name.into(),
        }
    }
}
