// Copyright 2026 the VRML97 Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Primitive geometry: `Box`, `Sphere`, `Cone`, `Cylinder`, and the `Color`
//! property node.
//!
//! Geometry nodes live in a `Shape`'s `geometry` field. Their bounding volume
//! is computed from their own fields; writing a dimension marks it stale.

use vrml97_core::bounds::BoundingSphere;
use vrml97_core::field::{FieldType, FieldValue, Vec3f};
use vrml97_core::node::capability::{BoundsSource, Capabilities, GeometryNode};
use vrml97_core::node::class::{ClassDecl, InterfaceDecl};
use vrml97_core::node::{NodeContext, NodeView};
use vrml97_core::viewer::{ObjectHandle, Viewer};

fn bounds_changed(ctx: &mut NodeContext<'_>, _: &FieldValue, _: f64) {
    ctx.mark_bounds_dirty();
}

const fn geometry(
    insert: fn(&NodeView<'_>, &mut dyn Viewer) -> ObjectHandle,
    bounds: fn(&NodeView<'_>) -> BoundingSphere,
) -> Capabilities {
    Capabilities {
        geometry: Some(GeometryNode { insert }),
        bounded_volume: Some(BoundsSource::Leaf(bounds)),
        ..Capabilities::NONE
    }
}

// -- Box --

static BOX_INTERFACES: [InterfaceDecl; 1] = [InterfaceDecl::field(FieldType::SfVec3f, "size")
    .with_default(|| FieldValue::SfVec3f(Vec3f::new(2.0, 2.0, 2.0)))
    .with_side_effect(bounds_changed)];

/// `Box { field SFVec3f size 2 2 2 }`
pub static BOX: ClassDecl = ClassDecl {
    capabilities: geometry(insert_box, box_bounds),
    ..ClassDecl::new(&BOX_INTERFACES)
};

fn box_size(view: &NodeView<'_>) -> Vec3f {
    view.vec3f("size").unwrap_or(Vec3f::new(2.0, 2.0, 2.0))
}

fn insert_box(view: &NodeView<'_>, viewer: &mut dyn Viewer) -> ObjectHandle {
    viewer.insert_box(box_size(view))
}

fn box_bounds(view: &NodeView<'_>) -> BoundingSphere {
    BoundingSphere::from_box_size(box_size(view))
}

// -- Sphere --

static SPHERE_INTERFACES: [InterfaceDecl; 1] = [InterfaceDecl::field(FieldType::SfFloat, "radius")
    .with_default(|| FieldValue::SfFloat(1.0))
    .with_side_effect(bounds_changed)];

/// `Sphere { field SFFloat radius 1 }`
pub static SPHERE: ClassDecl = ClassDecl {
    capabilities: geometry(insert_sphere, sphere_bounds),
    ..ClassDecl::new(&SPHERE_INTERFACES)
};

fn insert_sphere(view: &NodeView<'_>, viewer: &mut dyn Viewer) -> ObjectHandle {
    viewer.insert_sphere(view.float("radius").unwrap_or(1.0))
}

fn sphere_bounds(view: &NodeView<'_>) -> BoundingSphere {
    BoundingSphere::new(Vec3f::ZERO, view.float("radius").unwrap_or(1.0))
}

// -- Cone --

static CONE_INTERFACES: [InterfaceDecl; 4] = [
    InterfaceDecl::field(FieldType::SfFloat, "bottomRadius")
        .with_default(|| FieldValue::SfFloat(1.0))
        .with_side_effect(bounds_changed),
    InterfaceDecl::field(FieldType::SfFloat, "height")
        .with_default(|| FieldValue::SfFloat(2.0))
        .with_side_effect(bounds_changed),
    InterfaceDecl::field(FieldType::SfBool, "side").with_default(|| FieldValue::SfBool(true)),
    InterfaceDecl::field(FieldType::SfBool, "bottom").with_default(|| FieldValue::SfBool(true)),
];

/// `Cone { bottomRadius 1 height 2 side TRUE bottom TRUE }`
pub static CONE: ClassDecl = ClassDecl {
    capabilities: geometry(insert_cone, cone_bounds),
    ..ClassDecl::new(&CONE_INTERFACES)
};

fn insert_cone(view: &NodeView<'_>, viewer: &mut dyn Viewer) -> ObjectHandle {
    viewer.insert_cone(
        view.float("height").unwrap_or(2.0),
        view.float("bottomRadius").unwrap_or(1.0),
        view.bool("side").unwrap_or(true),
        view.bool("bottom").unwrap_or(true),
    )
}

fn cone_bounds(view: &NodeView<'_>) -> BoundingSphere {
    let r = view.float("bottomRadius").unwrap_or(1.0);
    let h = view.float("height").unwrap_or(2.0);
    BoundingSphere::from_box_size(Vec3f::new(2.0 * r, h, 2.0 * r))
}

// -- Cylinder --

static CYLINDER_INTERFACES: [InterfaceDecl; 5] = [
    InterfaceDecl::field(FieldType::SfBool, "bottom").with_default(|| FieldValue::SfBool(true)),
    InterfaceDecl::field(FieldType::SfFloat, "height")
        .with_default(|| FieldValue::SfFloat(2.0))
        .with_side_effect(bounds_changed),
    InterfaceDecl::field(FieldType::SfFloat, "radius")
        .with_default(|| FieldValue::SfFloat(1.0))
        .with_side_effect(bounds_changed),
    InterfaceDecl::field(FieldType::SfBool, "side").with_default(|| FieldValue::SfBool(true)),
    InterfaceDecl::field(FieldType::SfBool, "top").with_default(|| FieldValue::SfBool(true)),
];

/// `Cylinder { bottom TRUE height 2 radius 1 side TRUE top TRUE }`
pub static CYLINDER: ClassDecl = ClassDecl {
    capabilities: geometry(insert_cylinder, cylinder_bounds),
    ..ClassDecl::new(&CYLINDER_INTERFACES)
};

fn insert_cylinder(view: &NodeView<'_>, viewer: &mut dyn Viewer) -> ObjectHandle {
    viewer.insert_cylinder(
        view.float("height").unwrap_or(2.0),
        view.float("radius").unwrap_or(1.0),
        view.bool("side").unwrap_or(true),
        view.bool("top").unwrap_or(true),
        view.bool("bottom").unwrap_or(true),
    )
}

fn cylinder_bounds(view: &NodeView<'_>) -> BoundingSphere {
    let r = view.float("radius").unwrap_or(1.0);
    let h = view.float("height").unwrap_or(2.0);
    BoundingSphere::from_box_size(Vec3f::new(2.0 * r, h, 2.0 * r))
}

// -- Color --

static COLOR_INTERFACES: [InterfaceDecl; 1] = [InterfaceDecl::exposed_field(FieldType::MfColor, "color")];

/// `Color { exposedField MFColor color [] }`
///
/// A property node holding colors for the geometry that references it. It
/// draws nothing and has no volume.
pub static COLOR: ClassDecl = ClassDecl::new(&COLOR_INTERFACES);

#[cfg(test)]
mod tests {
    use vrml97_core::field::{Color, FieldValue};
    use vrml97_core::node::Capability;

    use crate::testing::scene;

    #[test]
    fn color_nodes_hold_and_forward_their_colors() {
        let mut scene = scene();
        let red = Color::new(1.0, 0.0, 0.0);
        let source = scene
            .create_default_node("Color", None, &[("color", FieldValue::MfColor(vec![red]))])
            .unwrap();
        let copy = scene.create_default_node("Color", None, &[]).unwrap();
        assert_eq!(scene.field(copy, "color").unwrap(), &FieldValue::MfColor(Vec::new()));
        assert!(!scene.supports(source, Capability::Child), "not a child node");
        assert!(!scene.supports(source, Capability::BoundedVolume), "no volume");

        scene.add_route(source, "color_changed", copy, "set_color").unwrap();
        scene.set_modified(copy, false);
        let blue = Color::new(0.0, 0.0, 1.0);
        scene
            .process_event(source, "set_color", FieldValue::MfColor(vec![red, blue]), 1.0)
            .unwrap();
        assert_eq!(scene.field(copy, "color").unwrap(), &FieldValue::MfColor(vec![red, blue]));
        assert!(scene.modified(copy), "written by the route");
    }

    #[test]
    fn default_box_bounds() {
        let mut scene = scene();
        let b = scene.create_default_node("Box", None, &[]).unwrap();
        let sphere = scene.bounding_volume(b).unwrap();
        assert!((sphere.radius() - 3.0_f32.sqrt()).abs() < 1e-5, "half-diagonal of a 2-cube");
    }

    #[test]
    fn writing_radius_invalidates_sphere_bounds() {
        let mut scene = scene();
        let s = scene.create_default_node("Sphere", None, &[]).unwrap();
        assert_eq!(scene.bounding_volume(s).unwrap().radius(), 1.0);
        scene.set_field(s, "radius", FieldValue::SfFloat(4.0)).unwrap();
        assert_eq!(scene.bounding_volume(s).unwrap().radius(), 4.0);
    }

    #[test]
    fn cylinder_bounds_cover_its_box() {
        let mut scene = scene();
        let c = scene
            .create_default_node("Cylinder", None, &[("radius", FieldValue::SfFloat(0.0))])
            .unwrap();
        let sphere = scene.bounding_volume(c).unwrap();
        assert!((sphere.radius() - 1.0).abs() < 1e-5, "zero-radius cylinder spans its height");
    }
}
