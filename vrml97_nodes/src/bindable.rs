// Copyright 2026 the VRML97 Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bindable environment nodes: `Background`, `Fog`, `NavigationInfo`,
//! `Viewpoint`.
//!
//! Each class has a bound-node stack in the scene. Sending `set_bind TRUE`
//! pushes the node on top and makes it active; `set_bind FALSE` removes it
//! and reactivates the node beneath. The active Background and Fog are drawn
//! before the scene graph; the active Viewpoint and NavigationInfo are
//! reported to the browser.

use vrml97_core::Error;
use vrml97_core::bindable::set_bind;
use vrml97_core::field::{Color, FieldType, FieldValue, Rotation, Vec3f};
use vrml97_core::node::capability::{BindableNode, BrowserBinding, Capabilities};
use vrml97_core::node::class::{ClassDecl, InterfaceDecl};
use vrml97_core::node::{NodeContext, NodeId, NodeView};
use vrml97_core::scene::Scene;
use vrml97_core::transform::Transform3d;
use vrml97_core::viewer::{BackgroundParams, Viewer};

/// Default `Viewpoint.fieldOfView`, in radians.
pub const DEFAULT_FIELD_OF_VIEW: f32 = 0.785_398;

const fn bindable(browser: BrowserBinding, render: Option<fn(&NodeView<'_>, &mut dyn Viewer)>) -> Capabilities {
    Capabilities {
        child: true,
        bindable: Some(BindableNode { browser, render }),
        ..Capabilities::NONE
    }
}

/// Re-announces the active node to the browser after one of its fields
/// changed.
fn active_changed(ctx: &mut NodeContext<'_>, _: &FieldValue, _: f64) {
    let id = ctx.node();
    let view = ctx.view();
    let node_type = view.node_type();
    let Some(bindable) = node_type.capabilities().bindable else {
        return;
    };
    if ctx.scene().active(node_type.class_id()) != Some(id) {
        return;
    }
    match bindable.browser {
        BrowserBinding::Viewpoint => ctx.browser().active_viewpoint_changed(Some(id)),
        BrowserBinding::NavigationInfo => ctx.browser().active_navigation_info_changed(Some(id)),
        BrowserBinding::None => {}
    }
}

// -- Background --

static BACKGROUND_INTERFACES: [InterfaceDecl; 13] = [
    InterfaceDecl::event_in(FieldType::SfBool, "set_bind", set_bind),
    InterfaceDecl::exposed_field(FieldType::MfFloat, "groundAngle"),
    InterfaceDecl::exposed_field(FieldType::MfColor, "groundColor"),
    InterfaceDecl::exposed_field(FieldType::MfString, "backUrl"),
    InterfaceDecl::exposed_field(FieldType::MfString, "bottomUrl"),
    InterfaceDecl::exposed_field(FieldType::MfString, "frontUrl"),
    InterfaceDecl::exposed_field(FieldType::MfString, "leftUrl"),
    InterfaceDecl::exposed_field(FieldType::MfString, "rightUrl"),
    InterfaceDecl::exposed_field(FieldType::MfString, "topUrl"),
    InterfaceDecl::exposed_field(FieldType::MfFloat, "skyAngle"),
    InterfaceDecl::exposed_field(FieldType::MfColor, "skyColor")
        .with_default(|| FieldValue::MfColor(vec![Color::BLACK])),
    InterfaceDecl::event_out(FieldType::SfTime, "bindTime"),
    InterfaceDecl::event_out(FieldType::SfBool, "isBound"),
];

/// `Background`
pub static BACKGROUND: ClassDecl = ClassDecl {
    capabilities: bindable(BrowserBinding::None, Some(render_background)),
    ..ClassDecl::new(&BACKGROUND_INTERFACES)
};

fn render_background(view: &NodeView<'_>, viewer: &mut dyn Viewer) {
    _ = viewer.insert_background(&BackgroundParams {
        ground_angle: view.floats("groundAngle").unwrap_or_default(),
        ground_color: view.colors("groundColor").unwrap_or_default(),
        sky_angle: view.floats("skyAngle").unwrap_or_default(),
        sky_color: view.colors("skyColor").unwrap_or_default(),
    });
}

// -- Fog --

static FOG_INTERFACES: [InterfaceDecl; 6] = [
    InterfaceDecl::exposed_field(FieldType::SfColor, "color")
        .with_default(|| FieldValue::SfColor(Color::WHITE)),
    InterfaceDecl::exposed_field(FieldType::SfString, "fogType")
        .with_default(|| FieldValue::SfString("LINEAR".into())),
    InterfaceDecl::exposed_field(FieldType::SfFloat, "visibilityRange"),
    InterfaceDecl::event_in(FieldType::SfBool, "set_bind", set_bind),
    InterfaceDecl::event_out(FieldType::SfTime, "bindTime"),
    InterfaceDecl::event_out(FieldType::SfBool, "isBound"),
];

/// `Fog`
pub static FOG: ClassDecl = ClassDecl {
    capabilities: bindable(BrowserBinding::None, Some(render_fog)),
    ..ClassDecl::new(&FOG_INTERFACES)
};

fn render_fog(view: &NodeView<'_>, viewer: &mut dyn Viewer) {
    viewer.set_fog(
        view.color("color").unwrap_or(Color::WHITE),
        view.float("visibilityRange").unwrap_or(0.0),
        view.str("fogType").unwrap_or("LINEAR"),
    );
}

// -- NavigationInfo --

static NAVIGATION_INFO_INTERFACES: [InterfaceDecl; 8] = [
    InterfaceDecl::event_in(FieldType::SfBool, "set_bind", set_bind),
    InterfaceDecl::exposed_field(FieldType::MfFloat, "avatarSize")
        .with_default(|| FieldValue::MfFloat(vec![0.25, 1.6, 0.75]))
        .with_side_effect(active_changed),
    InterfaceDecl::exposed_field(FieldType::SfBool, "headlight")
        .with_default(|| FieldValue::SfBool(true))
        .with_side_effect(active_changed),
    InterfaceDecl::exposed_field(FieldType::SfFloat, "speed")
        .with_default(|| FieldValue::SfFloat(1.0))
        .with_side_effect(active_changed),
    InterfaceDecl::exposed_field(FieldType::MfString, "type")
        .with_default(|| FieldValue::MfString(vec!["WALK".into(), "ANY".into()]))
        .with_side_effect(active_changed),
    InterfaceDecl::exposed_field(FieldType::SfFloat, "visibilityLimit")
        .with_side_effect(active_changed),
    InterfaceDecl::event_out(FieldType::SfTime, "bindTime"),
    InterfaceDecl::event_out(FieldType::SfBool, "isBound"),
];

/// `NavigationInfo`
pub static NAVIGATION_INFO: ClassDecl = ClassDecl {
    capabilities: bindable(BrowserBinding::NavigationInfo, None),
    ..ClassDecl::new(&NAVIGATION_INFO_INTERFACES)
};

// -- Viewpoint --

static VIEWPOINT_INTERFACES: [InterfaceDecl; 8] = [
    InterfaceDecl::event_in(FieldType::SfBool, "set_bind", set_bind),
    InterfaceDecl::exposed_field(FieldType::SfFloat, "fieldOfView")
        .with_default(|| FieldValue::SfFloat(DEFAULT_FIELD_OF_VIEW))
        .with_side_effect(active_changed),
    InterfaceDecl::exposed_field(FieldType::SfBool, "jump").with_default(|| FieldValue::SfBool(true)),
    InterfaceDecl::exposed_field(FieldType::SfRotation, "orientation").with_side_effect(active_changed),
    InterfaceDecl::exposed_field(FieldType::SfVec3f, "position")
        .with_default(|| FieldValue::SfVec3f(Vec3f::new(0.0, 0.0, 10.0)))
        .with_side_effect(active_changed),
    InterfaceDecl::field(FieldType::SfString, "description"),
    InterfaceDecl::event_out(FieldType::SfTime, "bindTime"),
    InterfaceDecl::event_out(FieldType::SfBool, "isBound"),
];

/// `Viewpoint`
pub static VIEWPOINT: ClassDecl = ClassDecl {
    capabilities: bindable(BrowserBinding::Viewpoint, None),
    ..ClassDecl::new(&VIEWPOINT_INTERFACES)
};

/// Offset of the user's view from a viewpoint, in the viewpoint's frame.
#[derive(Clone, Copy, Debug)]
struct UserView(Transform3d);

/// Sets how far the user has navigated away from `viewpoint`, relative to
/// the viewpoint itself. Returns `false`, changing nothing, if the node is
/// not a viewpoint.
///
/// # Errors
///
/// [`Error::NodeExpired`].
pub fn set_user_view_transform(scene: &mut Scene, viewpoint: NodeId, transform: Transform3d) -> Result<bool, Error> {
    if !scene.is_alive(viewpoint) {
        return Err(Error::NodeExpired(viewpoint));
    }
    if scene.as_bindable(viewpoint).map(|b| b.browser) != Some(BrowserBinding::Viewpoint) {
        return Ok(false);
    }
    scene.set_node_state(viewpoint, UserView(transform))?;
    Ok(true)
}

/// The user-view offset of `viewpoint`; identity until navigation sets one.
#[must_use]
pub fn user_view_transform(scene: &Scene, viewpoint: NodeId) -> Transform3d {
    if !scene.is_alive(viewpoint) {
        return Transform3d::IDENTITY;
    }
    scene
        .view(viewpoint)
        .state::<UserView>()
        .map_or(Transform3d::IDENTITY, |u| u.0)
}

/// World transformation of a viewpoint: the transforms of the grouping nodes
/// above it, its own position and orientation, then the user-view offset.
///
/// `None` if the viewpoint is not reachable from a scene root.
#[must_use]
pub fn viewpoint_transformation(scene: &Scene, viewpoint: NodeId) -> Option<Transform3d> {
    let path = scene.node_path(viewpoint)?;
    let mut m = Transform3d::IDENTITY;
    for &ancestor in &path[..path.len() - 1] {
        if let Some(transform) = scene.as_grouping(ancestor).and_then(|g| g.transform) {
            m = m * transform(&scene.view(ancestor));
        }
    }
    let view = scene.view(viewpoint);
    let local = Transform3d::from_vrml(
        view.vec3f("position").unwrap_or(Vec3f::new(0.0, 0.0, 10.0)),
        Vec3f::ZERO,
        view.rotation("orientation").unwrap_or(Rotation::IDENTITY),
        Vec3f::new(1.0, 1.0, 1.0),
        Rotation::IDENTITY,
    );
    Some(m * local * user_view_transform(scene, viewpoint))
}
