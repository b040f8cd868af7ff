// Copyright 2026 the VRML97 Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Viewer contract for rendering integrations.
//!
//! The core never draws pixels. A render traversal
//! ([`Scene::render`](crate::scene::Scene::render)) walks the scene and
//! describes it to a [`Viewer`]: primitives, lights, material state, and
//! transforms, grouped into display objects. The viewer hands back opaque
//! [`ObjectHandle`]s which the core caches per node, so unchanged subtrees
//! are re-inserted by reference instead of being described again.

use crate::bounds::BoundingSphere;
use crate::field::{Color, Vec2f, Vec3f};
use crate::node::NodeId;
use crate::transform::Transform3d;

/// Opaque handle to a viewer display object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectHandle(pub u64);

/// How a bounding sphere relates to the view volume.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Intersection {
    /// Entirely outside; the subtree can be skipped.
    Outside,
    /// Entirely inside; descendants need no further culling.
    Inside,
    /// Straddles the boundary (or the viewer cannot tell).
    Partial,
}

/// Material state (VRML97 `Material`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    /// Ambient reflection as a fraction of diffuse.
    pub ambient_intensity: f32,
    /// Diffuse color.
    pub diffuse_color: Color,
    /// Emissive color.
    pub emissive_color: Color,
    /// Specular exponent scale.
    pub shininess: f32,
    /// Specular color.
    pub specular_color: Color,
    /// 0 is opaque, 1 is fully transparent.
    pub transparency: f32,
}

impl Material {
    /// VRML97 defaults.
    pub const DEFAULT: Self = Self {
        ambient_intensity: 0.2,
        diffuse_color: Color::new(0.8, 0.8, 0.8),
        emissive_color: Color::BLACK,
        shininess: 0.2,
        specular_color: Color::BLACK,
        transparency: 0.0,
    };

    /// Unlit material, used for shapes without an appearance.
    pub const UNLIT: Self = Self {
        ambient_intensity: 0.0,
        diffuse_color: Color::BLACK,
        emissive_color: Color::WHITE,
        shininess: 0.0,
        specular_color: Color::BLACK,
        transparency: 0.0,
    };
}

impl Default for Material {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Directional light parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLight {
    /// Ambient contribution.
    pub ambient_intensity: f32,
    /// Light color.
    pub color: Color,
    /// Direction the light travels.
    pub direction: Vec3f,
    /// Direct contribution.
    pub intensity: f32,
}

/// Point light parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLight {
    /// Ambient contribution.
    pub ambient_intensity: f32,
    /// Constant, linear, and quadratic attenuation.
    pub attenuation: Vec3f,
    /// Light color.
    pub color: Color,
    /// Direct contribution.
    pub intensity: f32,
    /// Position in the light's frame.
    pub location: Vec3f,
    /// Maximum distance lit.
    pub radius: f32,
}

/// Background gradient parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackgroundParams<'a> {
    /// Ground gradient angles (radians from straight down).
    pub ground_angle: &'a [f32],
    /// Ground gradient colors.
    pub ground_color: &'a [Color],
    /// Sky gradient angles (radians from straight up).
    pub sky_angle: &'a [f32],
    /// Sky gradient colors.
    pub sky_color: &'a [Color],
}

/// Decoded texture pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureImage<'a> {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Bytes per pixel (1 to 4).
    pub components: u8,
    /// Row-major pixel bytes.
    pub pixels: &'a [u8],
    /// Repeat horizontally.
    pub repeat_s: bool,
    /// Repeat vertically.
    pub repeat_t: bool,
}

/// Receives the scene description produced by a render traversal.
///
/// Methods returning an [`ObjectHandle`] create a display object the viewer
/// may be asked to re-insert ([`insert_reference`](Self::insert_reference))
/// or discard ([`remove_object`](Self::remove_object)) later.
pub trait Viewer {
    /// Starts a display object; subsequent insertions belong to it.
    fn begin_object(&mut self, name: Option<&str>) -> ObjectHandle;

    /// Ends the innermost open display object.
    fn end_object(&mut self);

    /// Re-inserts a previously built display object.
    fn insert_reference(&mut self, object: ObjectHandle);

    /// Discards a display object.
    fn remove_object(&mut self, object: ObjectHandle);

    /// Axis-aligned box centered at the origin.
    fn insert_box(&mut self, size: Vec3f) -> ObjectHandle;

    /// Sphere centered at the origin.
    fn insert_sphere(&mut self, radius: f32) -> ObjectHandle;

    /// Cone along +Y centered at the origin.
    fn insert_cone(&mut self, height: f32, bottom_radius: f32, side: bool, bottom: bool) -> ObjectHandle;

    /// Cylinder along Y centered at the origin.
    fn insert_cylinder(
        &mut self,
        height: f32,
        radius: f32,
        side: bool,
        top: bool,
        bottom: bool,
    ) -> ObjectHandle;

    /// Directional light affecting the current group.
    fn insert_dir_light(&mut self, light: &DirectionalLight) -> ObjectHandle;

    /// Point light.
    fn insert_point_light(&mut self, light: &PointLight) -> ObjectHandle;

    /// Background gradient.
    fn insert_background(&mut self, background: &BackgroundParams<'_>) -> ObjectHandle;

    /// Fog. A `visibility_range` of 0 disables fog.
    fn set_fog(&mut self, color: Color, visibility_range: f32, fog_type: &str);

    /// Sets the current material.
    fn set_material(&mut self, material: &Material);

    /// Sets the current unlit color.
    fn set_color(&mut self, color: Color);

    /// Sets the current texture coordinate transform.
    fn set_texture_transform(&mut self, center: Vec2f, rotation: f32, scale: Vec2f, translation: Vec2f);

    /// Binds a texture for subsequent geometry.
    fn insert_texture(&mut self, image: &TextureImage<'_>) -> ObjectHandle;

    /// Multiplies the current model transform by `m`.
    fn transform(&mut self, m: &Transform3d);

    /// Classifies a sphere in the current frame against the view volume.
    fn intersect_view_volume(&mut self, sphere: &BoundingSphere) -> Intersection;

    /// Marks subsequent geometry as sensitive to `sensor`'s group, or clears
    /// the mark.
    fn set_sensitive(&mut self, node: Option<NodeId>) {
        _ = node;
    }

    /// Draws a debugging outline of a bounding sphere.
    fn draw_bounding_sphere(&mut self, sphere: &BoundingSphere, intersection: Intersection) {
        _ = (sphere, intersection);
    }
}
