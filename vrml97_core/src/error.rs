// Copyright 2026 the VRML97 Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error type shared by the node model, routing, and bind stacks.

use alloc::collections::TryReserveError;
use alloc::string::String;

use thiserror::Error;

use crate::field::FieldType;
use crate::node::{NodeId, NodeInterface};

/// Errors produced by the scene-graph core.
///
/// Structural errors (`UnsupportedInterface`, `UnknownInterface`,
/// `DuplicateInterface`, `UnknownNodeClass`) are returned to the caller that
/// asked for the structure. Errors raised while delivering one routed event
/// are reported to the trace sink and never abort the rest of the cascade.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum Error {
    /// A node type was requested with an interface its class does not
    /// implement.
    #[error("unsupported interface: {0}")]
    UnsupportedInterface(NodeInterface),

    /// A by-name lookup found no matching interface on the node type.
    #[error("{node_type} has no interface \"{name}\"")]
    UnknownInterface {
        /// Id of the node type that was searched.
        node_type: String,
        /// The name that was looked up.
        name: String,
    },

    /// Two requested interfaces share a name.
    #[error("duplicate interface \"{0}\"")]
    DuplicateInterface(String),

    /// A value of the wrong type reached an interface.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Type declared by the interface.
        expected: FieldType,
        /// Type of the value that was offered.
        found: FieldType,
    },

    /// An allocation failed.
    #[error("out of memory")]
    OutOfMemory,

    /// A handle referred to a node that has been destroyed.
    #[error("node {0:?} no longer exists")]
    NodeExpired(NodeId),

    /// No node class is registered under this id.
    #[error("unknown node class \"{0}\"")]
    UnknownNodeClass(String),

    /// A node-valued write would make a node its own ancestor.
    #[error("{child:?} already contains {parent:?}")]
    NodeCycle {
        /// The node whose field was written.
        parent: NodeId,
        /// The offending value.
        child: NodeId,
    },
}

impl From<TryReserveError> for Error {
    fn from(_: TryReserveError) -> Self {
        Self::OutOfMemory
    }
}
