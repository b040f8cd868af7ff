// Copyright 2026 the VRML97 Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reflective node model.
//!
//! A *node class* ([`NodeClass`]) is a static table describing one concrete
//! node kind: every interface it can support, its capabilities, and its
//! lifecycle hooks. A *node type* ([`NodeType`]) is a chosen subset of those
//! interfaces; PROTO-like declarations may expose fewer than the class
//! supports. A *node* is a generational handle ([`NodeId`]) into the
//! struct-of-arrays [`NodeStore`], holding one value slot per field,
//! exposedField, and eventOut of its type.
//!
//! - Interfaces are resolved by name. `set_<name>` reaches the exposedField
//!   `<name>` as a listener; `<name>_changed` reaches it as an emitter.
//! - Handlers and hooks receive a [`NodeContext`]; capability callbacks that
//!   only read receive a [`NodeView`].
//! - Ownership is expressed by node-valued fields and scene roots. When the
//!   last reference goes away the node is shut down and its slot freed; its
//!   handle then reads as stale everywhere.

pub mod capability;
pub mod class;
mod context;
mod id;
mod interface;
mod node_type;
mod scope;
mod store;
mod traverse;
mod view;

pub use capability::{Capabilities, Capability};
pub use class::{ClassDecl, InterfaceDecl, NodeClass};
pub use context::NodeContext;
pub use id::NodeId;
pub use interface::{InterfaceKind, InterfaceSet, NodeInterface};
pub(crate) use node_type::Port;
pub use node_type::NodeType;
pub use scope::Scope;
pub use store::NodeStore;
pub use traverse::NodeRefs;
pub use view::NodeView;
