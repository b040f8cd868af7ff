// Copyright 2026 the VRML97 Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Capability tables.
//!
//! Generic traversal code never inspects a node's class. It asks whether a
//! node supports a [`Capability`], or fetches the typed capability record
//! (`as_grouping`, `as_time_dependent`, ...) on [`Scene`](crate::scene::Scene),
//! where `None` means "no".

use super::context::NodeContext;
use super::view::NodeView;
use crate::bounds::BoundingSphere;
use crate::field::Vec3f;
use crate::transform::Transform3d;
use crate::viewer::{ObjectHandle, Viewer};

/// The capabilities a node class may declare.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    /// May appear in a grouping node's children.
    Child,
    /// Produces drawable geometry.
    Geometry,
    /// Has a bounding volume.
    BoundedVolume,
    /// Groups children.
    Grouping,
    /// Emits light.
    Light,
    /// Emits light scoped to the whole scene rather than its group.
    ScopedLight,
    /// Sets material and texture state.
    Appearance,
    /// Supplies a texture.
    Texture,
    /// Updated every tick.
    TimeDependent,
    /// Reacts to pointer input over its sibling geometry.
    PointingDeviceSensor,
    /// Participates in a bound-node stack.
    Bindable,
}

/// Inserts geometry into the viewer.
#[derive(Clone, Copy, Debug)]
pub struct GeometryNode {
    /// Emits viewer primitives and returns their object handle.
    pub insert: fn(&NodeView<'_>, &mut dyn Viewer) -> ObjectHandle,
}

/// Where a node's bounding volume comes from.
#[derive(Clone, Copy, Debug)]
pub enum BoundsSource {
    /// Computed from the node's own fields.
    Leaf(fn(&NodeView<'_>) -> BoundingSphere),
    /// Union of the volumes of the nodes referenced by the node's `SFNode`
    /// and `MFNode` fields, in the node's local frame.
    Children,
}

/// Groups children, optionally under a local transform.
#[derive(Clone, Copy, Debug)]
pub struct GroupingNode {
    /// Name of the `MFNode` children field.
    pub children: &'static str,
    /// Local transform applied to the children.
    pub transform: Option<fn(&NodeView<'_>) -> Transform3d>,
}

/// Light source.
#[derive(Clone, Copy, Debug)]
pub struct LightNode {
    /// Registered with the browser instead of lighting only its group.
    pub scoped: bool,
    /// Inserts the light into the viewer.
    pub render: fn(&NodeView<'_>, &mut dyn Viewer),
}

/// Applies material state.
#[derive(Clone, Copy, Debug)]
pub struct AppearanceNode {
    /// Sets material, color, and texture state on the viewer.
    pub apply: fn(&NodeView<'_>, &mut dyn Viewer),
}

/// Supplies a texture.
#[derive(Clone, Copy, Debug)]
pub struct TextureNode {
    /// Binds the texture on the viewer.
    pub apply: fn(&NodeView<'_>, &mut dyn Viewer),
}

/// Updated once per tick.
#[derive(Clone, Copy, Debug)]
pub struct TimeDependentNode {
    /// Called with the tick time.
    pub update: fn(&mut NodeContext<'_>, f64),
}

/// Pointer input delivered to a sensor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    /// Pointer is over the sensor's geometry.
    pub over: bool,
    /// Button is pressed.
    pub active: bool,
    /// Hit point in the sensor's local frame.
    pub point: Vec3f,
    /// Event timestamp.
    pub timestamp: f64,
}

/// Reacts to pointer input.
#[derive(Clone, Copy, Debug)]
pub struct PointingDeviceSensorNode {
    /// Called for each pointer event over the sensor's group.
    pub activate: fn(&mut NodeContext<'_>, &PointerEvent),
}

/// Which browser notification a bind-stack change triggers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BrowserBinding {
    /// The browser does not track this class.
    None,
    /// Active viewpoint changes are reported.
    Viewpoint,
    /// Active navigation info changes are reported.
    NavigationInfo,
}

/// Participates in a bound-node stack.
#[derive(Clone, Copy, Debug)]
pub struct BindableNode {
    /// Browser notification for top-of-stack changes.
    pub browser: BrowserBinding,
    /// Draws the active node of the class (Background, Fog).
    pub render: Option<fn(&NodeView<'_>, &mut dyn Viewer)>,
}

/// Capability table of a node class.
#[derive(Clone, Copy, Debug)]
pub struct Capabilities {
    /// See [`Capability::Child`].
    pub child: bool,
    /// See [`Capability::Geometry`].
    pub geometry: Option<GeometryNode>,
    /// See [`Capability::BoundedVolume`].
    pub bounded_volume: Option<BoundsSource>,
    /// See [`Capability::Grouping`].
    pub grouping: Option<GroupingNode>,
    /// See [`Capability::Light`] and [`Capability::ScopedLight`].
    pub light: Option<LightNode>,
    /// See [`Capability::Appearance`].
    pub appearance: Option<AppearanceNode>,
    /// See [`Capability::Texture`].
    pub texture: Option<TextureNode>,
    /// See [`Capability::TimeDependent`].
    pub time_dependent: Option<TimeDependentNode>,
    /// See [`Capability::PointingDeviceSensor`].
    pub pointing_device_sensor: Option<PointingDeviceSensorNode>,
    /// See [`Capability::Bindable`].
    pub bindable: Option<BindableNode>,
}

impl Capabilities {
    /// No capabilities.
    pub const NONE: Self = Self {
        child: false,
        geometry: None,
        bounded_volume: None,
        grouping: None,
        light: None,
        appearance: None,
        texture: None,
        time_dependent: None,
        pointing_device_sensor: None,
        bindable: None,
    };

    /// Whether `capability` is present.
    #[must_use]
    pub const fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::Child => self.child,
            Capability::Geometry => self.geometry.is_some(),
            Capability::BoundedVolume => self.bounded_volume.is_some(),
            Capability::Grouping => self.grouping.is_some(),
            Capability::Light => self.light.is_some(),
            Capability::ScopedLight => matches!(self.light, Some(LightNode { scoped: true, .. })),
            Capability::Appearance => self.appearance.is_some(),
            Capability::Texture => self.texture.is_some(),
            Capability::TimeDependent => self.time_dependent.is_some(),
            Capability::PointingDeviceSensor => self.pointing_device_sensor.is_some(),
            Capability::Bindable => self.bindable.is_some(),
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::NONE
    }
}
