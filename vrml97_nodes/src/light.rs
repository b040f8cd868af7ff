// Copyright 2026 the VRML97 Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Light sources.
//!
//! A `DirectionalLight` lights only its siblings and their descendants, so it
//! is drawn inside its group. A `PointLight` lights everything within its
//! radius; it is scoped to the scene and reported to the browser, which
//! draws it through [`LightNode::render`] before the scene graph.

use vrml97_core::field::{Color, FieldType, FieldValue, Vec3f};
use vrml97_core::node::NodeView;
use vrml97_core::node::capability::{Capabilities, LightNode};
use vrml97_core::node::class::{ClassDecl, InterfaceDecl};
use vrml97_core::viewer::{DirectionalLight, PointLight, Viewer};

static DIRECTIONAL_LIGHT_INTERFACES: [InterfaceDecl; 5] = [
    InterfaceDecl::exposed_field(FieldType::SfFloat, "ambientIntensity"),
    InterfaceDecl::exposed_field(FieldType::SfColor, "color")
        .with_default(|| FieldValue::SfColor(Color::WHITE)),
    InterfaceDecl::exposed_field(FieldType::SfVec3f, "direction")
        .with_default(|| FieldValue::SfVec3f(Vec3f::new(0.0, 0.0, -1.0))),
    InterfaceDecl::exposed_field(FieldType::SfFloat, "intensity")
        .with_default(|| FieldValue::SfFloat(1.0)),
    InterfaceDecl::exposed_field(FieldType::SfBool, "on").with_default(|| FieldValue::SfBool(true)),
];

/// `DirectionalLight`
pub static DIRECTIONAL_LIGHT: ClassDecl = ClassDecl {
    capabilities: Capabilities {
        child: true,
        light: Some(LightNode {
            scoped: false,
            render: render_directional,
        }),
        ..Capabilities::NONE
    },
    ..ClassDecl::new(&DIRECTIONAL_LIGHT_INTERFACES)
};

fn render_directional(view: &NodeView<'_>, viewer: &mut dyn Viewer) {
    if !view.bool("on").unwrap_or(true) {
        return;
    }
    viewer.insert_dir_light(&DirectionalLight {
        ambient_intensity: view.float("ambientIntensity").unwrap_or(0.0),
        color: view.color("color").unwrap_or(Color::WHITE),
        direction: view.vec3f("direction").unwrap_or(Vec3f::new(0.0, 0.0, -1.0)),
        intensity: view.float("intensity").unwrap_or(1.0),
    });
}

static POINT_LIGHT_INTERFACES: [InterfaceDecl; 7] = [
    InterfaceDecl::exposed_field(FieldType::SfFloat, "ambientIntensity"),
    InterfaceDecl::exposed_field(FieldType::SfVec3f, "attenuation")
        .with_default(|| FieldValue::SfVec3f(Vec3f::new(1.0, 0.0, 0.0))),
    InterfaceDecl::exposed_field(FieldType::SfColor, "color")
        .with_default(|| FieldValue::SfColor(Color::WHITE)),
    InterfaceDecl::exposed_field(FieldType::SfFloat, "intensity")
        .with_default(|| FieldValue::SfFloat(1.0)),
    InterfaceDecl::exposed_field(FieldType::SfVec3f, "location"),
    InterfaceDecl::exposed_field(FieldType::SfBool, "on").with_default(|| FieldValue::SfBool(true)),
    InterfaceDecl::exposed_field(FieldType::SfFloat, "radius")
        .with_default(|| FieldValue::SfFloat(100.0)),
];

/// `PointLight`
pub static POINT_LIGHT: ClassDecl = ClassDecl {
    capabilities: Capabilities {
        child: true,
        light: Some(LightNode {
            scoped: true,
            render: render_point,
        }),
        ..Capabilities::NONE
    },
    ..ClassDecl::new(&POINT_LIGHT_INTERFACES)
};

fn render_point(view: &NodeView<'_>, viewer: &mut dyn Viewer) {
    if !view.bool("on").unwrap_or(true) {
        return;
    }
    viewer.insert_point_light(&PointLight {
        ambient_intensity: view.float("ambientIntensity").unwrap_or(0.0),
        attenuation: view.vec3f("attenuation").unwrap_or(Vec3f::new(1.0, 0.0, 0.0)),
        color: view.color("color").unwrap_or(Color::WHITE),
        intensity: view.float("intensity").unwrap_or(1.0),
        location: view.vec3f("location").unwrap_or(Vec3f::ZERO),
        radius: view.float("radius").unwrap_or(100.0),
    });
}
