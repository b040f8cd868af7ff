// Copyright 2026 the VRML97 Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Grouping nodes: `Group` and `Transform`.

use vrml97_core::Error;
use vrml97_core::field::{FieldType, FieldValue, Rotation, Vec3f};
use vrml97_core::node::capability::{BoundsSource, Capabilities, GroupingNode};
use vrml97_core::node::class::{ClassDecl, InterfaceDecl};
use vrml97_core::node::{NodeContext, NodeId, NodeView};
use vrml97_core::transform::Transform3d;

fn current_children(ctx: &NodeContext<'_>) -> Vec<NodeId> {
    ctx.field("children")
        .map(|v| v.node_refs().to_vec())
        .unwrap_or_default()
}

/// `eventIn MFNode addChildren`: appends the nodes not already present.
fn add_children(ctx: &mut NodeContext<'_>, value: &FieldValue, timestamp: f64) -> Result<(), Error> {
    let mut children = current_children(ctx);
    let before = children.len();
    for &node in value.node_refs() {
        if !children.contains(&node) {
            children.try_reserve(1)?;
            children.push(node);
        }
    }
    if children.len() == before {
        return Ok(());
    }
    ctx.write("children", FieldValue::MfNode(children), timestamp)
}

/// `eventIn MFNode removeChildren`: removes every listed node.
fn remove_children(ctx: &mut NodeContext<'_>, value: &FieldValue, timestamp: f64) -> Result<(), Error> {
    let mut children = current_children(ctx);
    let before = children.len();
    children.retain(|c| !value.node_refs().contains(c));
    if children.len() == before {
        return Ok(());
    }
    ctx.write("children", FieldValue::MfNode(children), timestamp)
}

fn bounds_changed(ctx: &mut NodeContext<'_>, _: &FieldValue, _: f64) {
    ctx.mark_bounds_dirty();
}

const GROUP_CAPABILITIES: Capabilities = Capabilities {
    child: true,
    bounded_volume: Some(BoundsSource::Children),
    grouping: Some(GroupingNode {
        children: "children",
        transform: None,
    }),
    ..Capabilities::NONE
};

static GROUP_INTERFACES: [InterfaceDecl; 5] = [
    InterfaceDecl::event_in(FieldType::MfNode, "addChildren", add_children),
    InterfaceDecl::event_in(FieldType::MfNode, "removeChildren", remove_children),
    InterfaceDecl::exposed_field(FieldType::MfNode, "children"),
    InterfaceDecl::field(FieldType::SfVec3f, "bboxCenter"),
    InterfaceDecl::field(FieldType::SfVec3f, "bboxSize")
        .with_default(|| FieldValue::SfVec3f(Vec3f::new(-1.0, -1.0, -1.0))),
];

/// `Group`
pub static GROUP: ClassDecl = ClassDecl {
    capabilities: GROUP_CAPABILITIES,
    ..ClassDecl::new(&GROUP_INTERFACES)
};

static TRANSFORM_INTERFACES: [InterfaceDecl; 10] = [
    InterfaceDecl::event_in(FieldType::MfNode, "addChildren", add_children),
    InterfaceDecl::event_in(FieldType::MfNode, "removeChildren", remove_children),
    InterfaceDecl::exposed_field(FieldType::SfVec3f, "center").with_side_effect(bounds_changed),
    InterfaceDecl::exposed_field(FieldType::MfNode, "children"),
    InterfaceDecl::exposed_field(FieldType::SfRotation, "rotation").with_side_effect(bounds_changed),
    InterfaceDecl::exposed_field(FieldType::SfVec3f, "scale")
        .with_default(|| FieldValue::SfVec3f(Vec3f::new(1.0, 1.0, 1.0)))
        .with_side_effect(bounds_changed),
    InterfaceDecl::exposed_field(FieldType::SfRotation, "scaleOrientation")
        .with_side_effect(bounds_changed),
    InterfaceDecl::exposed_field(FieldType::SfVec3f, "translation").with_side_effect(bounds_changed),
    InterfaceDecl::field(FieldType::SfVec3f, "bboxCenter"),
    InterfaceDecl::field(FieldType::SfVec3f, "bboxSize")
        .with_default(|| FieldValue::SfVec3f(Vec3f::new(-1.0, -1.0, -1.0))),
];

/// `Transform`: a `Group` whose children are drawn under
/// `T × C × R × SR × S × -SR × -C`.
pub static TRANSFORM: ClassDecl = ClassDecl {
    capabilities: Capabilities {
        grouping: Some(GroupingNode {
            children: "children",
            transform: Some(local_transform),
        }),
        ..GROUP_CAPABILITIES
    },
    ..ClassDecl::new(&TRANSFORM_INTERFACES)
};

/// The local matrix of a `Transform` node.
#[must_use]
pub fn local_transform(view: &NodeView<'_>) -> Transform3d {
    Transform3d::from_vrml(
        view.vec3f("translation").unwrap_or(Vec3f::ZERO),
        view.vec3f("center").unwrap_or(Vec3f::ZERO),
        view.rotation("rotation").unwrap_or(Rotation::IDENTITY),
        view.vec3f("scale").unwrap_or(Vec3f::new(1.0, 1.0, 1.0)),
        view.rotation("scaleOrientation").unwrap_or(Rotation::IDENTITY),
    )
}

#[cfg(test)]
mod tests {
    use vrml97_core::Error;
    use vrml97_core::field::{FieldValue, Vec3f};

    use crate::testing::scene;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    /// `Group { Shape { Box {} } Transform { translation 10 0 0 Shape { Box {} } } }`
    #[test]
    fn group_bounds_union_transformed_children() {
        let mut scene = scene();
        let box_a = scene.create_default_node("Box", None, &[]).unwrap();
        let shape_a = scene
            .create_default_node("Shape", None, &[("geometry", FieldValue::SfNode(Some(box_a)))])
            .unwrap();
        let box_b = scene.create_default_node("Box", None, &[]).unwrap();
        let shape_b = scene
            .create_default_node("Shape", None, &[("geometry", FieldValue::SfNode(Some(box_b)))])
            .unwrap();
        let xf = scene
            .create_default_node(
                "Transform",
                None,
                &[
                    ("translation", FieldValue::SfVec3f(Vec3f::new(10.0, 0.0, 0.0))),
                    ("children", FieldValue::MfNode(vec![shape_b])),
                ],
            )
            .unwrap();
        let group = scene
            .create_default_node("Group", None, &[("children", FieldValue::MfNode(vec![shape_a, xf]))])
            .unwrap();
        scene.add_root(group).unwrap();

        let sphere = scene.bounding_volume(group).unwrap();
        assert!(approx(sphere.center().x, 5.0), "center {:?}", sphere.center());
        assert!(approx(sphere.radius(), 5.0 + 3.0_f32.sqrt()), "radius {}", sphere.radius());

        // Growing the far box invalidates every ancestor.
        scene
            .set_field(box_b, "size", FieldValue::SfVec3f(Vec3f::new(4.0, 4.0, 4.0)))
            .unwrap();
        let grown = scene.bounding_volume(group).unwrap();
        let far = 10.0 + 12.0_f32.sqrt();
        let near = -(3.0_f32.sqrt());
        assert!(approx(grown.radius(), (far - near) / 2.0), "radius {}", grown.radius());
        assert!(approx(grown.center().x, (far + near) / 2.0), "center {:?}", grown.center());
        let far_subtree = scene.bounding_volume(xf).unwrap();

        // Shrinking the near box leaves the far subtree's volume alone.
        scene
            .set_field(box_a, "size", FieldValue::SfVec3f(Vec3f::new(0.2, 0.2, 0.2)))
            .unwrap();
        assert_eq!(scene.bounding_volume(xf), Some(far_subtree), "sibling untouched");
        let shrunk = scene.bounding_volume(group).unwrap();
        let near = -0.1 * 3.0_f32.sqrt();
        assert!(approx(shrunk.radius(), (far - near) / 2.0), "radius {}", shrunk.radius());
        assert!(approx(shrunk.center().x, (far + near) / 2.0), "center {:?}", shrunk.center());
    }

    #[test]
    fn a_group_cannot_contain_itself() {
        let mut scene = scene();
        let group = scene.create_default_node("Group", None, &[]).unwrap();
        scene.add_root(group).unwrap();
        assert_eq!(
            scene.process_event(group, "addChildren", FieldValue::MfNode(vec![group]), 1.0),
            Err(Error::NodeCycle {
                parent: group,
                child: group,
            }),
        );
        assert_eq!(scene.field(group, "children").unwrap(), &FieldValue::MfNode(vec![]));
        assert!(scene.modified(group), "fresh group is modified");
        assert!(scene.bounding_volume(group).unwrap().is_empty(), "still empty");
    }

    #[test]
    fn adding_an_ancestor_is_rejected_and_leaves_the_field_unchanged() {
        let mut scene = scene();
        let leaf = scene.create_default_node("Group", None, &[]).unwrap();
        let mid = scene
            .create_default_node("Group", None, &[("children", FieldValue::MfNode(vec![leaf]))])
            .unwrap();
        let top = scene
            .create_default_node("Transform", None, &[("children", FieldValue::MfNode(vec![mid]))])
            .unwrap();
        scene.add_root(top).unwrap();

        assert_eq!(
            scene.set_field(leaf, "children", FieldValue::MfNode(vec![top])),
            Err(Error::NodeCycle {
                parent: leaf,
                child: top,
            }),
        );
        assert_eq!(scene.field(leaf, "children").unwrap(), &FieldValue::MfNode(vec![]));
        assert!(scene.bounding_volume(top).unwrap().is_empty(), "no geometry below");
        assert!(scene.remove_root(top, 0.0), "was a root");
        assert!(!scene.is_alive(leaf), "whole chain released");
    }

    #[test]
    fn moving_a_transform_moves_its_bounds() {
        let mut scene = scene();
        let sphere = scene.create_default_node("Sphere", None, &[]).unwrap();
        let shape = scene
            .create_default_node("Shape", None, &[("geometry", FieldValue::SfNode(Some(sphere)))])
            .unwrap();
        let xf = scene
            .create_default_node("Transform", None, &[("children", FieldValue::MfNode(vec![shape]))])
            .unwrap();
        assert!(approx(scene.bounding_volume(xf).unwrap().center().y, 0.0), "at origin");
        scene
            .process_event(xf, "set_translation", FieldValue::SfVec3f(Vec3f::new(0.0, 3.0, 0.0)), 1.0)
            .unwrap();
        assert!(approx(scene.bounding_volume(xf).unwrap().center().y, 3.0), "moved");
    }

    #[test]
    fn add_and_remove_children() {
        let mut scene = scene();
        let group = scene.create_default_node("Group", None, &[]).unwrap();
        let a = scene.create_default_node("Group", None, &[]).unwrap();
        let b = scene.create_default_node("Group", None, &[]).unwrap();
        scene.add_root(group).unwrap();

        scene
            .process_event(group, "addChildren", FieldValue::MfNode(vec![a, b, a]), 1.0)
            .unwrap();
        assert_eq!(scene.field(group, "children").unwrap(), &FieldValue::MfNode(vec![a, b]));

        scene
            .process_event(group, "removeChildren", FieldValue::MfNode(vec![a]), 2.0)
            .unwrap();
        assert_eq!(scene.field(group, "children").unwrap(), &FieldValue::MfNode(vec![b]));
        assert!(!scene.is_alive(a), "removed child had no other owner");
    }

    #[test]
    fn empty_group_has_empty_bounds() {
        let mut scene = scene();
        let group = scene.create_default_node("Group", None, &[]).unwrap();
        assert!(scene.bounding_volume(group).unwrap().is_empty(), "no children");
    }
}
