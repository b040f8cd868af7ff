// Copyright 2026 the VRML97 Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node classes: static interface tables and the factory for node types.
//!
//! A concrete node kind is described once, as a `static` [`ClassDecl`]: its
//! supported interfaces (each with a default value, an optional event
//! handler, and an optional post-write hook), its [`Capabilities`], and its
//! lifecycle hooks. A [`NodeClass`] pairs that table with a class id and
//! produces [`NodeType`]s, each exposing a chosen subset of the interfaces.

use alloc::borrow::Cow;
use alloc::rc::Rc;
use alloc::vec::Vec;

use super::capability::{Capabilities, Capability};
use super::context::NodeContext;
use super::interface::{InterfaceKind, InterfaceSet, NodeInterface};
use super::node_type::{NodeType, Port};
use crate::error::Error;
use crate::field::{FieldType, FieldValue};
use crate::render::Renderer;

/// Handles one event delivered to an eventIn.
///
/// Receives the node context, the value, and the event timestamp.
pub type EventHandler = fn(&mut NodeContext<'_>, &FieldValue, f64) -> Result<(), Error>;

/// Runs after an accepted write to a field or exposedField, before any
/// `_changed` emission.
pub type SideEffect = fn(&mut NodeContext<'_>, &FieldValue, f64);

/// Runs on initialize or shutdown with the current time.
pub type LifecycleHook = fn(&mut NodeContext<'_>, f64);

/// Draws a node that is neither a grouping node nor bare geometry.
pub type RenderHook = fn(&mut Renderer<'_>, crate::node::NodeId);

/// Declaration of one supported interface.
#[derive(Clone, Copy, Debug)]
pub struct InterfaceDecl {
    /// Interface kind.
    pub kind: InterfaceKind,
    /// Value type.
    pub field_type: FieldType,
    /// Interface name.
    pub name: &'static str,
    /// Initial value; `None` uses the type's VRML default.
    pub default: Option<fn() -> FieldValue>,
    /// Handler for eventIns.
    pub handler: Option<EventHandler>,
    /// Post-write hook for fields and exposedFields.
    pub side_effect: Option<SideEffect>,
    /// Always present in created types, requested or not.
    pub mandatory: bool,
}

impl InterfaceDecl {
    const fn new(kind: InterfaceKind, field_type: FieldType, name: &'static str) -> Self {
        Self {
            kind,
            field_type,
            name,
            default: None,
            handler: None,
            side_effect: None,
            mandatory: false,
        }
    }

    /// A `field`.
    #[must_use]
    pub const fn field(field_type: FieldType, name: &'static str) -> Self {
        Self::new(InterfaceKind::Field, field_type, name)
    }

    /// An `exposedField`.
    #[must_use]
    pub const fn exposed_field(field_type: FieldType, name: &'static str) -> Self {
        Self::new(InterfaceKind::ExposedField, field_type, name)
    }

    /// An `eventIn` handled by `handler`.
    #[must_use]
    pub const fn event_in(field_type: FieldType, name: &'static str, handler: EventHandler) -> Self {
        let mut decl = Self::new(InterfaceKind::EventIn, field_type, name);
        decl.handler = Some(handler);
        decl
    }

    /// An `eventOut`.
    #[must_use]
    pub const fn event_out(field_type: FieldType, name: &'static str) -> Self {
        Self::new(InterfaceKind::EventOut, field_type, name)
    }

    /// Sets the initial value.
    #[must_use]
    pub const fn with_default(mut self, default: fn() -> FieldValue) -> Self {
        self.default = Some(default);
        self
    }

    /// Sets the post-write hook.
    #[must_use]
    pub const fn with_side_effect(mut self, side_effect: SideEffect) -> Self {
        self.side_effect = Some(side_effect);
        self
    }

    /// Marks the interface as always present.
    #[must_use]
    pub const fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    /// The interface this declaration describes.
    #[must_use]
    pub fn interface(&self) -> NodeInterface {
        NodeInterface::new(self.kind, self.field_type, self.name)
    }

    /// The initial value of a fresh node.
    #[must_use]
    pub fn default_value(&self) -> FieldValue {
        match self.default {
            Some(f) => f(),
            None => self.field_type.default_value(),
        }
    }

    fn matches(&self, interface: &NodeInterface) -> bool {
        self.kind == interface.kind
            && self.field_type == interface.field_type
            && self.name == interface.name
    }
}

/// Static description of a node class.
#[derive(Clone, Copy, Debug)]
pub struct ClassDecl {
    /// Supported interfaces in declaration order. Same-name entries are
    /// alternatives; a created type may expose at most one of them.
    pub interfaces: &'static [InterfaceDecl],
    /// Capability table.
    pub capabilities: Capabilities,
    /// Class-specific initialization, after generic bookkeeping.
    pub initialize: Option<LifecycleHook>,
    /// Class-specific shutdown, before generic bookkeeping is undone.
    pub shutdown: Option<LifecycleHook>,
    /// Custom drawing.
    pub render: Option<RenderHook>,
}

impl ClassDecl {
    /// A class with the given interfaces, no capabilities, and no hooks.
    #[must_use]
    pub const fn new(interfaces: &'static [InterfaceDecl]) -> Self {
        Self {
            interfaces,
            capabilities: Capabilities::NONE,
            initialize: None,
            shutdown: None,
            render: None,
        }
    }
}

/// A registered node class.
#[derive(Debug)]
pub struct NodeClass {
    id: Cow<'static, str>,
    decl: &'static ClassDecl,
}

impl NodeClass {
    /// Creates a class from its id and declaration table.
    #[must_use]
    pub fn new(id: impl Into<Cow<'static, str>>, decl: &'static ClassDecl) -> Self {
        Self {
            id: id.into(),
            decl,
        }
    }

    /// Class id (usually the VRML97 node name, e.g. `"Viewpoint"`).
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Declaration table.
    #[inline]
    #[must_use]
    pub fn decl(&self) -> &'static ClassDecl {
        self.decl
    }

    /// Whether nodes of this class support `capability`.
    #[inline]
    #[must_use]
    pub fn supports(&self, capability: Capability) -> bool {
        self.decl.capabilities.supports(capability)
    }

    /// Every interface the class can expose, alternatives included.
    pub fn supported_interfaces(&self) -> impl Iterator<Item = NodeInterface> + '_ {
        self.decl.interfaces.iter().map(InterfaceDecl::interface)
    }

    /// Creates a node type exposing exactly `requested` plus the class's
    /// mandatory interfaces, in declaration order.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedInterface`] naming the first requested interface
    ///   whose kind, type, and name match no declaration.
    /// - [`Error::DuplicateInterface`] if two requested interfaces share a
    ///   name.
    /// - [`Error::OutOfMemory`] on allocation failure.
    pub fn create_type(
        &self,
        id: impl Into<Cow<'static, str>>,
        requested: &[NodeInterface],
    ) -> Result<Rc<NodeType>, Error> {
        let mut chosen: Vec<usize> = Vec::new();
        chosen.try_reserve(requested.len())?;
        for interface in requested {
            let Some(pos) = self.decl.interfaces.iter().position(|d| d.matches(interface)) else {
                return Err(Error::UnsupportedInterface(interface.clone()));
            };
            if chosen.iter().any(|&c| self.decl.interfaces[c].name == interface.name) {
                return Err(Error::DuplicateInterface(interface.name.clone().into_owned()));
            }
            chosen.push(pos);
        }
        for (pos, decl) in self.decl.interfaces.iter().enumerate() {
            if decl.mandatory && !chosen.iter().any(|&c| self.decl.interfaces[c].name == decl.name) {
                chosen.try_reserve(1)?;
                chosen.push(pos);
            }
        }
        chosen.sort_unstable();
        self.build_type(id.into(), &chosen)
    }

    /// Creates a node type exposing every supported interface. For
    /// same-name alternatives the first declaration wins.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfMemory`] on allocation failure.
    pub fn create_default_type(&self, id: impl Into<Cow<'static, str>>) -> Result<Rc<NodeType>, Error> {
        let mut chosen: Vec<usize> = Vec::new();
        chosen.try_reserve(self.decl.interfaces.len())?;
        for (pos, decl) in self.decl.interfaces.iter().enumerate() {
            if !chosen.iter().any(|&c| self.decl.interfaces[c].name == decl.name) {
                chosen.push(pos);
            }
        }
        self.build_type(id.into(), &chosen)
    }

    fn build_type(&self, id: Cow<'static, str>, chosen: &[usize]) -> Result<Rc<NodeType>, Error> {
        let mut interfaces = InterfaceSet::new();
        let mut ports: Vec<Port> = Vec::new();
        ports.try_reserve(chosen.len())?;
        let mut slot_count = 0;
        for &pos in chosen {
            let decl = &self.decl.interfaces[pos];
            interfaces.insert(decl.interface())?;
            let slot = if decl.kind.has_value() {
                slot_count += 1;
                Some(slot_count - 1)
            } else {
                None
            };
            ports.push(Port {
                index: ports.len(),
                decl,
                slot,
            });
        }
        Ok(Rc::new(NodeType::new(
            id,
            self.id.clone(),
            self.decl,
            interfaces,
            ports,
            slot_count,
        )))
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    fn noop(_: &mut NodeContext<'_>, _: &FieldValue, _: f64) -> Result<(), Error> {
        Ok(())
    }

    static DECLS: [InterfaceDecl; 4] = [
        InterfaceDecl::event_in(FieldType::SfBool, "set_bind", noop),
        InterfaceDecl::exposed_field(FieldType::SfVec3f, "position"),
        InterfaceDecl::field(FieldType::SfString, "description"),
        InterfaceDecl::event_out(FieldType::SfBool, "isBound").mandatory(),
    ];
    static CLASS: ClassDecl = ClassDecl::new(&DECLS);

    fn iface(kind: InterfaceKind, ty: FieldType, name: &'static str) -> NodeInterface {
        NodeInterface::new(kind, ty, name)
    }

    #[test]
    fn subset_plus_mandatory_in_declaration_order() {
        let class = NodeClass::new("Probe", &CLASS);
        let ty = class
            .create_type(
                "P",
                &[
                    iface(InterfaceKind::Field, FieldType::SfString, "description"),
                    iface(InterfaceKind::ExposedField, FieldType::SfVec3f, "position"),
                ],
            )
            .unwrap();
        let names: Vec<&str> = ty.interfaces().iter().map(|i| &*i.name).collect();
        assert_eq!(names, vec!["position", "description", "isBound"]);
        assert!(!ty.has_interface("set_bind"), "unrequested eventIn is absent");
        assert_eq!(ty.slot_count(), 3);
    }

    #[test]
    fn unsupported_interface_is_named() {
        let class = NodeClass::new("Probe", &CLASS);
        let bogus = iface(InterfaceKind::ExposedField, FieldType::SfFloat, "position");
        let err = class
            .create_type(
                "P",
                &[
                    iface(InterfaceKind::Field, FieldType::SfString, "description"),
                    bogus.clone(),
                ],
            )
            .unwrap_err();
        assert_eq!(err, Error::UnsupportedInterface(bogus));
    }

    #[test]
    fn duplicate_request_is_rejected() {
        let class = NodeClass::new("Probe", &CLASS);
        let p = iface(InterfaceKind::ExposedField, FieldType::SfVec3f, "position");
        let err = class.create_type("P", &[p.clone(), p]).unwrap_err();
        assert_eq!(err, Error::DuplicateInterface("position".into()));
    }

    #[test]
    fn default_type_exposes_everything() {
        let class = NodeClass::new("Probe", &CLASS);
        let ty = class.create_default_type("Probe").unwrap();
        assert_eq!(ty.interfaces().len(), 4);
        assert_eq!(ty.class_id(), "Probe");
        assert!(ty.listener("set_bind").is_some(), "eventIn resolves");
        assert!(ty.listener("set_position").is_some(), "exposedField alias resolves");
        assert!(ty.emitter("position_changed").is_some(), "exposedField emits");
        assert!(ty.emitter("description").is_none(), "plain field never emits");
    }
}
