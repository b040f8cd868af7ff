// Copyright 2026 the VRML97 Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render traversal.
//!
//! [`Scene::render`] describes the scene to a [`Viewer`]. Grouping and
//! geometry nodes cache the viewer object built for them; an unmodified
//! subtree is re-inserted by reference, a modified one is rebuilt. Grouping
//! nodes are culled against the view volume using their bounding sphere.

use alloc::vec::Vec;

use crate::bounds::BoundingSphere;
use crate::node::{NodeContext, NodeId};
use crate::node::capability::{Capability, GroupingNode};
use crate::scene::Scene;
use crate::viewer::{Intersection, Material, Viewer};

/// State of one render traversal.
///
/// Handed to [`RenderHook`](crate::node::class::RenderHook)s so node classes
/// with custom drawing (Shape) can render the nodes they reference.
pub struct Renderer<'a> {
    scene: &'a mut Scene,
    viewer: &'a mut dyn Viewer,
    cull: bool,
}

impl core::fmt::Debug for Renderer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Renderer")
            .field("cull", &self.cull)
            .finish_non_exhaustive()
    }
}

impl Renderer<'_> {
    /// The scene being rendered.
    #[must_use]
    pub fn scene(&self) -> &Scene {
        self.scene
    }

    /// The viewer being rendered into.
    pub fn viewer(&mut self) -> &mut dyn Viewer {
        &mut *self.viewer
    }

    /// A context for `id`, for hooks that emit events while drawing.
    /// Deliveries run once the traversal ends.
    pub fn node_context(&mut self, id: NodeId) -> NodeContext<'_> {
        NodeContext::new(self.scene, id)
    }

    /// Whether grouping nodes are still culled at this depth.
    #[must_use]
    pub fn cull(&self) -> bool {
        self.cull
    }

    /// Renders one node and clears its `modified` flag. A render hook runs
    /// after the flag is cleared and may set it again to be drawn next frame.
    pub fn render_node(&mut self, id: NodeId) {
        let Some(node_type) = self.scene.store().try_node_type(id).cloned() else {
            return;
        };
        let caps = node_type.capabilities();
        if let Some(hook) = node_type.decl().render {
            self.scene.set_modified(id, false);
            hook(self, id);
            return;
        }
        if let Some(grouping) = caps.grouping {
            if !self.render_group(id, grouping) {
                return;
            }
        } else if caps.geometry.is_some() {
            self.render_geometry(id);
        } else if let Some(light) = caps.light
            && !light.scoped
        {
            (light.render)(&self.scene.store().view(id), self.viewer);
        }
        self.scene.set_modified(id, false);
    }

    /// Inserts the geometry of `id`, reusing its cached viewer object when
    /// the node is unmodified.
    pub fn render_geometry(&mut self, id: NodeId) {
        let Some(geometry) = self.scene.as_geometry(id) else {
            return;
        };
        let i = id.idx as usize;
        let cached = self.scene.store().viewer_object[i];
        match cached {
            Some(object) if !self.scene.store().own_modified(id) => {
                self.viewer.insert_reference(object);
            }
            _ => {
                if let Some(object) = cached {
                    self.viewer.remove_object(object);
                }
                let object = (geometry.insert)(&self.scene.store().view(id), self.viewer);
                self.scene.store_mut().viewer_object[i] = Some(object);
            }
        }
        self.scene.set_modified(id, false);
    }

    /// Applies the material state of an appearance node, or unlit defaults
    /// for `None`.
    pub fn apply_appearance(&mut self, appearance: Option<NodeId>) {
        let record = appearance.and_then(|id| Some((id, self.scene.as_appearance(id)?)));
        let Some((id, record)) = record else {
            self.viewer.set_material(&Material::UNLIT);
            return;
        };
        (record.apply)(&self.scene.store().view(id), self.viewer);
        let referenced: Vec<NodeId> = self.scene.store().children(id).collect();
        for n in referenced {
            self.scene.set_modified(n, false);
        }
        self.scene.set_modified(id, false);
    }

    /// Returns `false` if the group was culled.
    fn render_group(&mut self, id: NodeId, grouping: GroupingNode) -> bool {
        let outer_cull = self.cull;
        let draw_spheres = self.scene.config().draw_bounding_spheres;
        if (outer_cull || draw_spheres)
            && let Some(sphere) = self.scene.bounding_volume(id)
            && !sphere.is_empty()
            && !sphere.is_maximized()
        {
            let intersection = if outer_cull {
                self.viewer.intersect_view_volume(&sphere)
            } else {
                Intersection::Partial
            };
            if draw_spheres {
                self.viewer.draw_bounding_sphere(&sphere, intersection);
            }
            match intersection {
                Intersection::Outside => return false,
                Intersection::Inside => self.cull = false,
                Intersection::Partial => {}
            }
        }

        let i = id.idx as usize;
        let cached = self.scene.store().viewer_object[i];
        match cached {
            Some(object) if !self.scene.modified(id) => self.viewer.insert_reference(object),
            _ => {
                if let Some(object) = cached {
                    self.viewer.remove_object(object);
                }
                let object = self.viewer.begin_object(self.scene.store().name(id));
                if let Some(transform) = grouping.transform {
                    let m = transform(&self.scene.store().view(id));
                    self.viewer.transform(&m);
                }
                let children: Vec<NodeId> = self
                    .scene
                    .store()
                    .view(id)
                    .nodes(grouping.children)
                    .map(|c| c.id())
                    .collect();
                let sensitive = children
                    .iter()
                    .any(|&c| self.scene.supports(c, Capability::PointingDeviceSensor));
                if sensitive {
                    self.viewer.set_sensitive(Some(id));
                }
                // Lights first so they affect their siblings.
                let (lights, rest): (Vec<NodeId>, Vec<NodeId>) = children
                    .into_iter()
                    .partition(|&c| self.scene.supports(c, Capability::Light));
                for child in lights.into_iter().chain(rest) {
                    self.render_node(child);
                }
                if sensitive {
                    self.viewer.set_sensitive(None);
                }
                self.viewer.end_object();
                self.scene.store_mut().viewer_object[i] = Some(object);
            }
        }
        self.cull = outer_cull;
        true
    }
}

impl Scene {
    /// Describes the scene to `viewer`: discards viewer objects of shut-down
    /// nodes, draws the active node of each bindable class that renders
    /// (Background, Fog), then traverses the roots. Events queued while
    /// drawing are delivered at the end.
    pub fn render(&mut self, viewer: &mut dyn Viewer) {
        for object in core::mem::take(&mut self.pending_removals) {
            viewer.remove_object(object);
        }
        for top in self.bindable_tops() {
            if let Some(draw) = self.as_bindable(top).and_then(|b| b.render) {
                draw(&self.store().view(top), viewer);
                self.set_modified(top, false);
            }
        }
        let cull = self.config().cull;
        let roots = self.roots().to_vec();
        let mut renderer = Renderer {
            scene: self,
            viewer,
            cull,
        };
        for root in roots {
            renderer.render_node(root);
        }
        self.drain();
    }

    /// Bounding sphere of the whole scene (union of the roots' volumes).
    pub fn scene_bounds(&mut self) -> BoundingSphere {
        let mut union = BoundingSphere::EMPTY;
        for root in self.roots().to_vec() {
            if let Some(b) = self.bounding_volume(root) {
                union.extend(&b);
            }
        }
        union
    }
}
