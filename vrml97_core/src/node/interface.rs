// Copyright 2026 the VRML97 Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node interface declarations.

use alloc::borrow::Cow;
use alloc::vec::Vec;
use core::fmt;

use crate::error::Error;
use crate::field::FieldType;

/// The four kinds of node interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InterfaceKind {
    /// Initialization-time value; readable, not routable.
    Field,
    /// Accepts events.
    EventIn,
    /// Emits events.
    EventOut,
    /// Readable value that both accepts (`set_<name>`) and emits
    /// (`<name>_changed`) events.
    ExposedField,
}

impl InterfaceKind {
    /// Whether interfaces of this kind accept events.
    #[inline]
    #[must_use]
    pub const fn is_listener(self) -> bool {
        matches!(self, Self::EventIn | Self::ExposedField)
    }

    /// Whether interfaces of this kind emit events.
    #[inline]
    #[must_use]
    pub const fn is_emitter(self) -> bool {
        matches!(self, Self::EventOut | Self::ExposedField)
    }

    /// Whether interfaces of this kind own a value slot.
    #[inline]
    #[must_use]
    pub const fn has_value(self) -> bool {
        !matches!(self, Self::EventIn)
    }

    /// The VRML97 keyword for this kind.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Field => "field",
            Self::EventIn => "eventIn",
            Self::EventOut => "eventOut",
            Self::ExposedField => "exposedField",
        }
    }
}

/// One interface of a node type: kind, value type, and name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeInterface {
    /// Interface kind.
    pub kind: InterfaceKind,
    /// Value type.
    pub field_type: FieldType,
    /// Interface name, unique within a node type.
    pub name: Cow<'static, str>,
}

impl NodeInterface {
    /// Creates an interface.
    #[must_use]
    pub fn new(kind: InterfaceKind, field_type: FieldType, name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            field_type,
            name: name.into(),
        }
    }

    /// Whether `name` addresses this interface as an event listener.
    ///
    /// An exposedField `x` also answers to `set_x`.
    #[must_use]
    pub fn answers_listener(&self, name: &str) -> bool {
        match self.kind {
            InterfaceKind::EventIn => self.name == name,
            InterfaceKind::ExposedField => {
                self.name == name || name.strip_prefix("set_") == Some(&*self.name)
            }
            _ => false,
        }
    }

    /// Whether `name` addresses this interface as an event emitter.
    ///
    /// An exposedField `x` also answers to `x_changed`.
    #[must_use]
    pub fn answers_emitter(&self, name: &str) -> bool {
        match self.kind {
            InterfaceKind::EventOut => self.name == name,
            InterfaceKind::ExposedField => {
                self.name == name || name.strip_suffix("_changed") == Some(&*self.name)
            }
            _ => false,
        }
    }
}

impl fmt::Display for NodeInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.kind.keyword(), self.field_type, self.name)
    }
}

/// An ordered set of interfaces with unique names.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InterfaceSet {
    entries: Vec<NodeInterface>,
}

impl InterfaceSet {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends `interface`.
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateInterface`] if the name is taken,
    /// [`Error::OutOfMemory`] if the set cannot grow.
    pub fn insert(&mut self, interface: NodeInterface) -> Result<(), Error> {
        if self.entries.iter().any(|e| e.name == interface.name) {
            return Err(Error::DuplicateInterface(interface.name.into_owned()));
        }
        self.entries.try_reserve(1)?;
        self.entries.push(interface);
        Ok(())
    }

    /// Number of interfaces.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Interfaces in declaration order.
    pub fn iter(&self) -> core::slice::Iter<'_, NodeInterface> {
        self.entries.iter()
    }

    /// Interface at position `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&NodeInterface> {
        self.entries.get(index)
    }

    /// Looks up an interface by its exact name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<(usize, &NodeInterface)> {
        self.entries.iter().enumerate().find(|(_, e)| e.name == name)
    }

    /// Looks up the listener addressed by `name`, preferring an exact match
    /// over a `set_` alias.
    #[must_use]
    pub fn find_listener(&self, name: &str) -> Option<(usize, &NodeInterface)> {
        self.find(name)
            .filter(|(_, e)| e.kind.is_listener())
            .or_else(|| self.entries.iter().enumerate().find(|(_, e)| e.answers_listener(name)))
    }

    /// Looks up the emitter addressed by `name`, preferring an exact match
    /// over a `_changed` alias.
    #[must_use]
    pub fn find_emitter(&self, name: &str) -> Option<(usize, &NodeInterface)> {
        self.find(name)
            .filter(|(_, e)| e.kind.is_emitter())
            .or_else(|| self.entries.iter().enumerate().find(|(_, e)| e.answers_emitter(name)))
    }
}

impl<'a> IntoIterator for &'a InterfaceSet {
    type Item = &'a NodeInterface;
    type IntoIter = core::slice::Iter<'a, NodeInterface>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    fn exposed(name: &'static str) -> NodeInterface {
        NodeInterface::new(InterfaceKind::ExposedField, FieldType::SfVec3f, name)
    }

    #[test]
    fn exposed_field_aliases() {
        let i = exposed("translation");
        assert!(i.answers_listener("translation"), "bare name listens");
        assert!(i.answers_listener("set_translation"), "set_ alias listens");
        assert!(i.answers_emitter("translation_changed"), "_changed alias emits");
        assert!(!i.answers_listener("translation_changed"), "_changed does not listen");
        assert!(!i.answers_emitter("set_translation"), "set_ does not emit");
    }

    #[test]
    fn plain_field_is_neither_listener_nor_emitter() {
        let i = NodeInterface::new(InterfaceKind::Field, FieldType::SfVec3f, "size");
        assert!(!i.answers_listener("size"), "field does not listen");
        assert!(!i.answers_emitter("size"), "field does not emit");
    }

    #[test]
    fn set_rejects_duplicate_names() {
        let mut set = InterfaceSet::new();
        set.insert(exposed("a")).unwrap();
        let err = set
            .insert(NodeInterface::new(InterfaceKind::EventIn, FieldType::SfBool, "a"))
            .unwrap_err();
        assert_eq!(err, Error::DuplicateInterface("a".into()));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn lookup_prefers_exact_names() {
        let mut set = InterfaceSet::new();
        set.insert(exposed("a")).unwrap();
        set.insert(NodeInterface::new(InterfaceKind::EventOut, FieldType::SfBool, "b"))
            .unwrap();
        assert_eq!(set.find_listener("set_a").map(|(i, _)| i), Some(0));
        assert_eq!(set.find_emitter("a_changed").map(|(i, _)| i), Some(0));
        assert_eq!(set.find_emitter("b").map(|(i, _)| i), Some(1));
        assert!(set.find_listener("b").is_none(), "eventOut is not a listener");
    }

    #[test]
    fn display_uses_vrml_syntax() {
        assert_eq!(exposed("center").to_string(), "exposedField SFVec3f center");
    }
}
