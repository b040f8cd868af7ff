// Copyright 2026 the VRML97 Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser contract.
//!
//! The host application implements [`Browser`] to learn about nodes that need
//! its attention: time-dependent nodes it must tick, scoped lights it must
//! apply scene-wide, viewpoints it may list in a menu, and changes to the
//! active viewpoint and navigation info. Every method defaults to a no-op.
//! [`NullBrowser`] is the stand-in until a host installs its own.

use alloc::boxed::Box;

use crate::node::NodeId;
use crate::resource::ResourceStream;

/// Services and notifications provided by the host.
pub trait Browser {
    /// Host clock, in seconds.
    fn current_time(&self) -> f64 {
        0.0
    }

    /// A time-dependent node was initialized.
    fn add_time_dependent(&mut self, node: NodeId) {
        _ = node;
    }

    /// A time-dependent node was shut down.
    fn remove_time_dependent(&mut self, node: NodeId) {
        _ = node;
    }

    /// A scoped light was initialized.
    fn add_scoped_light(&mut self, node: NodeId) {
        _ = node;
    }

    /// A scoped light was shut down.
    fn remove_scoped_light(&mut self, node: NodeId) {
        _ = node;
    }

    /// A viewpoint was initialized.
    fn add_viewpoint(&mut self, node: NodeId) {
        _ = node;
    }

    /// A viewpoint was shut down.
    fn remove_viewpoint(&mut self, node: NodeId) {
        _ = node;
    }

    /// The active viewpoint changed; `None` means reset to the default view.
    fn active_viewpoint_changed(&mut self, node: Option<NodeId>) {
        _ = node;
    }

    /// The active navigation info changed; `None` means reset to defaults.
    fn active_navigation_info_changed(&mut self, node: Option<NodeId>) {
        _ = node;
    }

    /// Something visible changed and a redraw is due.
    fn scene_modified(&mut self) {}

    /// Opens `url`.
    fn get_resource(&mut self, url: &str) -> Option<Box<dyn ResourceStream>> {
        _ = url;
        None
    }
}

/// A [`Browser`] that ignores every notification.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullBrowser;

impl Browser for NullBrowser {}
