// Copyright 2026 the VRML97 Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! VRML97 node classes for [`vrml97_core`].
//!
//! Each node kind is a `static` [`ClassDecl`]: an interface table with VRML97
//! defaults plus the capability records and hooks the core's generic
//! traversals call. [`register_vrml97`] installs all of them on a
//! [`Scene`] under their VRML97 names.
//!
//! ```
//! use vrml97_core::field::FieldValue;
//! use vrml97_core::scene::Scene;
//!
//! let mut scene = Scene::default();
//! vrml97_nodes::register_vrml97(&mut scene);
//! let sphere = scene.create_default_node("Sphere", None, &[]).unwrap();
//! let shape = scene
//!     .create_default_node("Shape", None, &[("geometry", FieldValue::SfNode(Some(sphere)))])
//!     .unwrap();
//! scene.add_root(shape).unwrap();
//! scene.initialize(0.0);
//! assert_eq!(scene.bounding_volume(shape).map(|b| b.radius()), Some(1.0));
//! ```
//!
//! # Node kinds
//!
//! - **[`grouping`]**: `Group`, `Transform`.
//! - **[`shape`]**: `Shape`, `Appearance`, `Material`, `TextureTransform`.
//! - **[`geometry`]**: `Box`, `Sphere`, `Cone`, `Cylinder`, `Color`.
//! - **[`light`]**: `DirectionalLight`, `PointLight`.
//! - **[`bindable`]**: `Background`, `Fog`, `NavigationInfo`, `Viewpoint`.
//! - **[`sensor`]**: `TimeSensor`, `TouchSensor`, `VisibilitySensor`.
//! - **[`interpolator`]**: `PositionInterpolator`, `ScalarInterpolator`,
//!   `ColorInterpolator`.
//! - **[`texture`]**: `ImageTexture`, `PixelTexture`.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod bindable;
pub mod geometry;
pub mod grouping;
pub mod interpolator;
pub mod light;
pub mod sensor;
pub mod shape;
pub mod texture;

#[cfg(test)]
mod testing;

use vrml97_core::node::class::{ClassDecl, NodeClass};
use vrml97_core::scene::Scene;

pub use bindable::{
    BACKGROUND, FOG, NAVIGATION_INFO, VIEWPOINT, set_user_view_transform, user_view_transform,
    viewpoint_transformation,
};
pub use geometry::{BOX, COLOR, CONE, CYLINDER, SPHERE};
pub use grouping::{GROUP, TRANSFORM, local_transform};
pub use interpolator::{COLOR_INTERPOLATOR, POSITION_INTERPOLATOR, SCALAR_INTERPOLATOR};
pub use light::{DIRECTIONAL_LIGHT, POINT_LIGHT};
pub use sensor::{TIME_SENSOR, TOUCH_SENSOR, VISIBILITY_SENSOR};
pub use shape::{APPEARANCE, MATERIAL, SHAPE, TEXTURE_TRANSFORM, material};
pub use texture::{IMAGE_TEXTURE, PIXEL_TEXTURE};

/// Every class in this crate with its VRML97 node name.
pub static CLASSES: [(&str, &ClassDecl); 26] = [
    ("Group", &GROUP),
    ("Transform", &TRANSFORM),
    ("Shape", &SHAPE),
    ("Appearance", &APPEARANCE),
    ("Material", &MATERIAL),
    ("TextureTransform", &TEXTURE_TRANSFORM),
    ("ImageTexture", &IMAGE_TEXTURE),
    ("PixelTexture", &PIXEL_TEXTURE),
    ("Box", &BOX),
    ("Sphere", &SPHERE),
    ("Cone", &CONE),
    ("Cylinder", &CYLINDER),
    ("Color", &COLOR),
    ("DirectionalLight", &DIRECTIONAL_LIGHT),
    ("PointLight", &POINT_LIGHT),
    ("Background", &BACKGROUND),
    ("Fog", &FOG),
    ("NavigationInfo", &NAVIGATION_INFO),
    ("Viewpoint", &VIEWPOINT),
    ("TimeSensor", &TIME_SENSOR),
    ("TouchSensor", &TOUCH_SENSOR),
    ("VisibilitySensor", &VISIBILITY_SENSOR),
    ("PositionInterpolator", &POSITION_INTERPOLATOR),
    ("ScalarInterpolator", &SCALAR_INTERPOLATOR),
    ("ColorInterpolator", &COLOR_INTERPOLATOR),
];

/// Registers every class in [`CLASSES`] on `scene`, replacing classes of the
/// same name.
pub fn register_vrml97(scene: &mut Scene) {
    for (name, decl) in &CLASSES {
        scene.add_node_class(NodeClass::new(*name, *decl));
    }
}

#[cfg(test)]
mod tests {
    use vrml97_core::Error;
    use vrml97_core::bounds::BoundingSphere;
    use vrml97_core::field::{FieldType, FieldValue, Vec3f};
    use vrml97_core::node::{InterfaceKind, NodeInterface};
    use vrml97_core::viewer::{Material, ObjectHandle};

    use super::CLASSES;
    use crate::testing::{RecordingViewer, ViewerCall, probed, scene, take_seen};

    #[test]
    fn every_class_is_registered() {
        let scene = scene();
        assert_eq!(scene.node_classes().count(), CLASSES.len());
        for (name, _) in &CLASSES {
            assert!(scene.node_class(name).is_some(), "{name} registered");
        }
        assert!(scene.node_class("Anchor").is_none(), "not provided");
    }

    #[test]
    fn node_types_expose_a_chosen_subset() {
        let scene = scene();
        let class = scene.node_class("Viewpoint").unwrap();
        let position = NodeInterface::new(InterfaceKind::ExposedField, FieldType::SfVec3f, "position");
        let ty = class.create_type("Camera", &[position]).unwrap();
        assert!(ty.has_interface("position"), "requested");
        assert!(!ty.has_interface("fieldOfView"), "not requested");

        let bogus = NodeInterface::new(InterfaceKind::Field, FieldType::SfFloat, "position");
        assert_eq!(
            class.create_type("Camera", &[bogus.clone()]).unwrap_err(),
            Error::UnsupportedInterface(bogus),
        );
    }

    #[test]
    fn routes_between_mismatched_types_are_rejected() {
        let mut scene = scene();
        let ts = scene.create_default_node("TimeSensor", None, &[]).unwrap();
        let interp = scene.create_default_node("PositionInterpolator", None, &[]).unwrap();
        assert_eq!(
            scene.add_route(ts, "isActive", interp, "set_fraction").unwrap_err(),
            Error::TypeMismatch {
                expected: FieldType::SfFloat,
                found: FieldType::SfBool,
            },
        );
        assert!(scene.add_route(ts, "fraction_changed", interp, "set_fraction").unwrap());
        assert!(
            !scene.add_route(ts, "fraction_changed", interp, "set_fraction").unwrap(),
            "duplicate route",
        );
    }

    #[test]
    fn a_failing_delivery_does_not_stop_the_cascade() {
        let mut scene = scene();
        let interp = scene
            .create_default_node(
                "ScalarInterpolator",
                None,
                &[
                    ("key", FieldValue::MfFloat(vec![0.0, 1.0])),
                    ("keyValue", FieldValue::MfFloat(vec![0.0, 10.0])),
                ],
            )
            .unwrap();
        let _recorder = probed(&mut scene, interp, &[("value_changed", "broken"), ("value_changed", "float")]);
        scene
            .process_event(interp, "set_fraction", FieldValue::SfFloat(0.5), 1.0)
            .unwrap();
        assert_eq!(take_seen(), vec![("float".into(), FieldValue::SfFloat(5.0))]);
    }

    #[test]
    fn an_exposed_field_cycle_fires_once_per_timestamp() {
        let mut scene = scene();
        let a = scene.create_default_node("TimeSensor", None, &[]).unwrap();
        let b = scene.create_default_node("TimeSensor", None, &[]).unwrap();
        assert!(scene.add_route(a, "startTime_changed", b, "set_startTime").unwrap());
        assert!(scene.add_route(b, "startTime_changed", a, "set_startTime").unwrap());
        let _recorder = probed(&mut scene, a, &[("startTime_changed", "time")]);

        scene
            .process_event(a, "set_startTime", FieldValue::SfTime(5.0), 1.0)
            .unwrap();
        assert_eq!(take_seen(), vec![("time".into(), FieldValue::SfTime(5.0))]);
        assert_eq!(scene.field(b, "startTime").unwrap(), &FieldValue::SfTime(5.0));

        scene
            .process_event(a, "set_startTime", FieldValue::SfTime(6.0), 2.0)
            .unwrap();
        assert_eq!(take_seen(), vec![("time".into(), FieldValue::SfTime(6.0))], "new timestamp");
    }

    #[test]
    fn unmodified_groups_are_reinserted_by_reference() {
        let mut scene = scene();
        let b = scene.create_default_node("Box", None, &[]).unwrap();
        let shape = scene
            .create_default_node("Shape", None, &[("geometry", FieldValue::SfNode(Some(b)))])
            .unwrap();
        let group = scene
            .create_default_node("Group", None, &[("children", FieldValue::MfNode(vec![shape]))])
            .unwrap();
        scene.add_root(group).unwrap();
        scene.initialize(0.0);

        let mut viewer = RecordingViewer::default();
        scene.render(&mut viewer);
        assert_eq!(
            viewer.calls,
            vec![
                ViewerCall::Begin(None, ObjectHandle(1)),
                ViewerCall::Material(Material::UNLIT),
                ViewerCall::Box(Vec3f::new(2.0, 2.0, 2.0)),
                ViewerCall::End,
            ],
        );

        viewer.calls.clear();
        scene.render(&mut viewer);
        assert_eq!(viewer.calls, vec![ViewerCall::Reference(ObjectHandle(1))]);

        viewer.calls.clear();
        scene
            .set_field(b, "size", FieldValue::SfVec3f(Vec3f::new(1.0, 1.0, 1.0)))
            .unwrap();
        scene.render(&mut viewer);
        assert_eq!(
            viewer.calls,
            vec![
                ViewerCall::Remove(ObjectHandle(1)),
                ViewerCall::Begin(None, ObjectHandle(3)),
                ViewerCall::Material(Material::UNLIT),
                ViewerCall::Remove(ObjectHandle(2)),
                ViewerCall::Box(Vec3f::new(1.0, 1.0, 1.0)),
                ViewerCall::End,
            ],
        );
    }

    #[test]
    fn groups_outside_the_view_volume_are_culled() {
        let mut scene = scene();
        let boxed = |scene: &mut vrml97_core::scene::Scene| {
            let b = scene.create_default_node("Box", None, &[]).unwrap();
            scene
                .create_default_node("Shape", None, &[("geometry", FieldValue::SfNode(Some(b)))])
                .unwrap()
        };
        let far_shape = boxed(&mut scene);
        let far = scene
            .create_default_node(
                "Transform",
                None,
                &[
                    ("translation", FieldValue::SfVec3f(Vec3f::new(100.0, 0.0, 0.0))),
                    ("children", FieldValue::MfNode(vec![far_shape])),
                ],
            )
            .unwrap();
        let near_shape = boxed(&mut scene);
        let near = scene
            .create_default_node("Group", None, &[("children", FieldValue::MfNode(vec![near_shape]))])
            .unwrap();
        scene.add_root(far).unwrap();
        scene.add_root(near).unwrap();
        scene.initialize(0.0);

        let mut viewer = RecordingViewer::with_view_volume(BoundingSphere::new(Vec3f::ZERO, 10.0));
        scene.render(&mut viewer);
        assert_eq!(viewer.count(|c| matches!(c, ViewerCall::Box(_))), 1, "far box culled");
        assert_eq!(viewer.count(|c| matches!(c, ViewerCall::Transform(_))), 0);

        viewer.calls.clear();
        scene
            .set_field(far, "translation", FieldValue::SfVec3f(Vec3f::ZERO))
            .unwrap();
        scene.render(&mut viewer);
        assert_eq!(viewer.count(|c| matches!(c, ViewerCall::Box(_))), 1, "far box now visible");
        assert_eq!(viewer.count(|c| matches!(c, ViewerCall::Reference(_))), 1, "near group cached");
    }

    #[test]
    fn groups_with_a_touch_sensor_are_sensitive() {
        let mut scene = scene();
        let touch = scene.create_default_node("TouchSensor", None, &[]).unwrap();
        let sphere = scene.create_default_node("Sphere", None, &[]).unwrap();
        let shape = scene
            .create_default_node("Shape", None, &[("geometry", FieldValue::SfNode(Some(sphere)))])
            .unwrap();
        let group = scene
            .create_default_node(
                "Group",
                None,
                &[("children", FieldValue::MfNode(vec![touch, shape]))],
            )
            .unwrap();
        scene.add_root(group).unwrap();
        let mut viewer = RecordingViewer::default();
        scene.render(&mut viewer);
        assert_eq!(
            viewer.calls,
            vec![
                ViewerCall::Begin(None, ObjectHandle(1)),
                ViewerCall::Sensitive(Some(group)),
                ViewerCall::Material(Material::UNLIT),
                ViewerCall::Sphere(1.0),
                ViewerCall::Sensitive(None),
                ViewerCall::End,
            ],
        );
    }
}
