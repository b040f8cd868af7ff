// Copyright 2026 the VRML97 Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! DEF/USE name scopes.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::String;
use core::cell::RefCell;

use super::NodeId;

/// A DEF namespace.
///
/// Names resolve in the scope first and then in each parent scope in turn,
/// so a PROTO body can see the names of the file that instantiated it.
#[derive(Debug)]
pub struct Scope {
    id: String,
    parent: Option<Rc<Scope>>,
    names: RefCell<BTreeMap<String, NodeId>>,
}

impl Scope {
    /// Creates a root scope (usually named after the world URL).
    #[must_use]
    pub fn new(id: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            id: id.into(),
            parent: None,
            names: RefCell::new(BTreeMap::new()),
        })
    }

    /// Creates a nested scope.
    #[must_use]
    pub fn nested(parent: &Rc<Self>, id: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            id: id.into(),
            parent: Some(Rc::clone(parent)),
            names: RefCell::new(BTreeMap::new()),
        })
    }

    /// Scope id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Enclosing scope.
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<&Rc<Self>> {
        self.parent.as_ref()
    }

    /// Resolves a DEF name.
    ///
    /// The returned handle may be stale if the node was destroyed through a
    /// path that bypassed the scene; check it with
    /// [`Scene::is_alive`](crate::scene::Scene::is_alive).
    #[must_use]
    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        let mut scope = Some(self);
        while let Some(s) = scope {
            if let Some(&id) = s.names.borrow().get(name) {
                return Some(id);
            }
            scope = s.parent.as_deref();
        }
        None
    }

    /// Binds `name` to `node`, replacing any previous binding in this scope.
    pub(crate) fn define(&self, name: &str, node: NodeId) {
        self.names.borrow_mut().insert(name.into(), node);
    }

    /// Removes `name` if it is still bound to `node`.
    pub(crate) fn undefine(&self, name: &str, node: NodeId) {
        let mut names = self.names.borrow_mut();
        if names.get(name) == Some(&node) {
            names.remove(name);
        }
    }
}
