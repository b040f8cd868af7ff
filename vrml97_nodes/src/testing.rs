// Copyright 2026 the VRML97 Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording collaborators shared by the unit tests.

use std::cell::RefCell;
use std::rc::Rc;

use vrml97_core::Error;
use vrml97_core::bounds::BoundingSphere;
use vrml97_core::browser::Browser;
use vrml97_core::field::{Color, FieldType, FieldValue, Vec2f, Vec3f};
use vrml97_core::node::class::{ClassDecl, InterfaceDecl, NodeClass};
use vrml97_core::node::{NodeContext, NodeId};
use vrml97_core::resource::{MemoryStream, ResourceStream};
use vrml97_core::scene::Scene;
use vrml97_core::transform::Transform3d;
use vrml97_core::viewer::{
    BackgroundParams, DirectionalLight, Intersection, Material, ObjectHandle, PointLight,
    TextureImage, Viewer,
};

use crate::register_vrml97;

/// A scene with every VRML97 class registered.
pub(crate) fn scene() -> Scene {
    let mut scene = Scene::default();
    register_vrml97(&mut scene);
    scene
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum ViewerCall {
    Begin(Option<String>, ObjectHandle),
    End,
    Reference(ObjectHandle),
    Remove(ObjectHandle),
    Box(Vec3f),
    Sphere(f32),
    Cone(f32, f32),
    Cylinder(f32, f32),
    DirLight(DirectionalLight),
    PointLight(PointLight),
    Background(Vec<Color>),
    Fog(Color, f32, String),
    Material(Material),
    Color(Color),
    TextureTransform(Vec2f, f32, Vec2f, Vec2f),
    Texture(u32, u32, u8, Vec<u8>),
    Transform(Transform3d),
    Sensitive(Option<NodeId>),
    BoundingSphere(Intersection),
}

/// Records every call. The view volume, when set, is a sphere.
#[derive(Debug, Default)]
pub(crate) struct RecordingViewer {
    pub(crate) calls: Vec<ViewerCall>,
    pub(crate) view_volume: Option<BoundingSphere>,
    next: u64,
}

impl RecordingViewer {
    pub(crate) fn with_view_volume(volume: BoundingSphere) -> Self {
        Self {
            view_volume: Some(volume),
            ..Self::default()
        }
    }

    fn object(&mut self) -> ObjectHandle {
        self.next += 1;
        ObjectHandle(self.next)
    }

    fn record(&mut self, call: ViewerCall) -> ObjectHandle {
        self.calls.push(call);
        self.object()
    }

    pub(crate) fn count(&self, f: impl Fn(&ViewerCall) -> bool) -> usize {
        self.calls.iter().filter(|c| f(c)).count()
    }
}

impl Viewer for RecordingViewer {
    fn begin_object(&mut self, name: Option<&str>) -> ObjectHandle {
        let handle = self.object();
        self.calls.push(ViewerCall::Begin(name.map(String::from), handle));
        handle
    }

    fn end_object(&mut self) {
        self.calls.push(ViewerCall::End);
    }

    fn insert_reference(&mut self, object: ObjectHandle) {
        self.calls.push(ViewerCall::Reference(object));
    }

    fn remove_object(&mut self, object: ObjectHandle) {
        self.calls.push(ViewerCall::Remove(object));
    }

    fn insert_box(&mut self, size: Vec3f) -> ObjectHandle {
        self.record(ViewerCall::Box(size))
    }

    fn insert_sphere(&mut self, radius: f32) -> ObjectHandle {
        self.record(ViewerCall::Sphere(radius))
    }

    fn insert_cone(&mut self, height: f32, bottom_radius: f32, _: bool, _: bool) -> ObjectHandle {
        self.record(ViewerCall::Cone(height, bottom_radius))
    }

    fn insert_cylinder(&mut self, height: f32, radius: f32, _: bool, _: bool, _: bool) -> ObjectHandle {
        self.record(ViewerCall::Cylinder(height, radius))
    }

    fn insert_dir_light(&mut self, light: &DirectionalLight) -> ObjectHandle {
        self.record(ViewerCall::DirLight(*light))
    }

    fn insert_point_light(&mut self, light: &PointLight) -> ObjectHandle {
        self.record(ViewerCall::PointLight(*light))
    }

    fn insert_background(&mut self, background: &BackgroundParams<'_>) -> ObjectHandle {
        self.record(ViewerCall::Background(background.sky_color.to_vec()))
    }

    fn set_fog(&mut self, color: Color, visibility_range: f32, fog_type: &str) {
        self.calls
            .push(ViewerCall::Fog(color, visibility_range, fog_type.into()));
    }

    fn set_material(&mut self, material: &Material) {
        self.calls.push(ViewerCall::Material(*material));
    }

    fn set_color(&mut self, color: Color) {
        self.calls.push(ViewerCall::Color(color));
    }

    fn set_texture_transform(&mut self, center: Vec2f, rotation: f32, scale: Vec2f, translation: Vec2f) {
        self.calls
            .push(ViewerCall::TextureTransform(center, rotation, scale, translation));
    }

    fn insert_texture(&mut self, image: &TextureImage<'_>) -> ObjectHandle {
        self.record(ViewerCall::Texture(
            image.width,
            image.height,
            image.components,
            image.pixels.to_vec(),
        ))
    }

    fn transform(&mut self, m: &Transform3d) {
        self.calls.push(ViewerCall::Transform(*m));
    }

    fn intersect_view_volume(&mut self, sphere: &BoundingSphere) -> Intersection {
        let Some(volume) = self.view_volume else {
            return Intersection::Partial;
        };
        let d = (sphere.center() - volume.center()).length();
        if d + sphere.radius() <= volume.radius() {
            Intersection::Inside
        } else if d - sphere.radius() > volume.radius() {
            Intersection::Outside
        } else {
            Intersection::Partial
        }
    }

    fn set_sensitive(&mut self, node: Option<NodeId>) {
        self.calls.push(ViewerCall::Sensitive(node));
    }

    fn draw_bounding_sphere(&mut self, _: &BoundingSphere, intersection: Intersection) {
        self.calls.push(ViewerCall::BoundingSphere(intersection));
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum BrowserCall {
    AddTimeDependent(NodeId),
    RemoveTimeDependent(NodeId),
    AddScopedLight(NodeId),
    RemoveScopedLight(NodeId),
    AddViewpoint(NodeId),
    RemoveViewpoint(NodeId),
    ActiveViewpoint(Option<NodeId>),
    ActiveNavigationInfo(Option<NodeId>),
    SceneModified,
}

/// Records notifications into a log the test keeps a handle to, and serves
/// resources from memory.
#[derive(Debug, Default)]
pub(crate) struct RecordingBrowser {
    pub(crate) log: Rc<RefCell<Vec<BrowserCall>>>,
    pub(crate) resources: Vec<(String, String, Vec<u8>)>,
}

impl RecordingBrowser {
    /// Installs a recording browser on `scene` and returns its log.
    pub(crate) fn install(scene: &mut Scene) -> Rc<RefCell<Vec<BrowserCall>>> {
        Self::install_with(scene, Vec::new())
    }

    pub(crate) fn install_with(
        scene: &mut Scene,
        resources: Vec<(String, String, Vec<u8>)>,
    ) -> Rc<RefCell<Vec<BrowserCall>>> {
        let browser = Self {
            log: Rc::default(),
            resources,
        };
        let log = browser.log.clone();
        scene.set_browser(Box::new(browser));
        log
    }

    fn push(&self, call: BrowserCall) {
        self.log.borrow_mut().push(call);
    }
}

impl Browser for RecordingBrowser {
    fn add_time_dependent(&mut self, node: NodeId) {
        self.push(BrowserCall::AddTimeDependent(node));
    }

    fn remove_time_dependent(&mut self, node: NodeId) {
        self.push(BrowserCall::RemoveTimeDependent(node));
    }

    fn add_scoped_light(&mut self, node: NodeId) {
        self.push(BrowserCall::AddScopedLight(node));
    }

    fn remove_scoped_light(&mut self, node: NodeId) {
        self.push(BrowserCall::RemoveScopedLight(node));
    }

    fn add_viewpoint(&mut self, node: NodeId) {
        self.push(BrowserCall::AddViewpoint(node));
    }

    fn remove_viewpoint(&mut self, node: NodeId) {
        self.push(BrowserCall::RemoveViewpoint(node));
    }

    fn active_viewpoint_changed(&mut self, node: Option<NodeId>) {
        self.push(BrowserCall::ActiveViewpoint(node));
    }

    fn active_navigation_info_changed(&mut self, node: Option<NodeId>) {
        self.push(BrowserCall::ActiveNavigationInfo(node));
    }

    fn scene_modified(&mut self) {
        self.push(BrowserCall::SceneModified);
    }

    fn get_resource(&mut self, url: &str) -> Option<Box<dyn ResourceStream>> {
        let (url, media_type, data) = self.resources.iter().find(|(u, _, _)| u == url)?;
        Some(Box::new(MemoryStream::new(url.clone(), media_type.clone(), data.clone())))
    }
}

/// Browser calls in `log` other than `SceneModified`.
pub(crate) fn notifications(log: &Rc<RefCell<Vec<BrowserCall>>>) -> Vec<BrowserCall> {
    log.borrow()
        .iter()
        .filter(|c| **c != BrowserCall::SceneModified)
        .cloned()
        .collect()
}

// -- Probe --

thread_local! {
    static SEEN: RefCell<Vec<(String, FieldValue, f64)>> = const { RefCell::new(Vec::new()) };
}

fn record(name: &str, value: &FieldValue, timestamp: f64) {
    SEEN.with(|s| s.borrow_mut().push((name.into(), value.clone(), timestamp)));
}

macro_rules! probe_handler {
    ($name:ident, $label:literal) => {
        fn $name(_: &mut NodeContext<'_>, v: &FieldValue, t: f64) -> Result<(), Error> {
            record($label, v, t);
            Ok(())
        }
    };
}

probe_handler!(on_bool, "bool");
probe_handler!(on_first, "first");
probe_handler!(on_second, "second");
probe_handler!(on_float, "float");
probe_handler!(on_time, "time");
probe_handler!(on_cycle, "cycle");
probe_handler!(on_vec3f, "vec3f");
probe_handler!(on_color, "color");

fn on_broken(_: &mut NodeContext<'_>, _: &FieldValue, _: f64) -> Result<(), Error> {
    Err(Error::UnknownNodeClass("broken".into()))
}

static PROBE_INTERFACES: [InterfaceDecl; 9] = [
    InterfaceDecl::event_in(FieldType::SfBool, "bool", on_bool),
    InterfaceDecl::event_in(FieldType::SfBool, "first", on_first),
    InterfaceDecl::event_in(FieldType::SfBool, "second", on_second),
    InterfaceDecl::event_in(FieldType::SfFloat, "float", on_float),
    InterfaceDecl::event_in(FieldType::SfTime, "time", on_time),
    InterfaceDecl::event_in(FieldType::SfTime, "cycle", on_cycle),
    InterfaceDecl::event_in(FieldType::SfVec3f, "vec3f", on_vec3f),
    InterfaceDecl::event_in(FieldType::SfColor, "color", on_color),
    InterfaceDecl::event_in(FieldType::SfFloat, "broken", on_broken),
];
static PROBE: ClassDecl = ClassDecl::new(&PROBE_INTERFACES);

/// Events the probe has seen on this thread since the last call, labelled by
/// the eventIn they arrived at.
pub(crate) fn take_seen() -> Vec<(String, FieldValue)> {
    take_seen_at().into_iter().map(|(name, value, _)| (name, value)).collect()
}

/// As [`take_seen`], with the timestamp each event carried.
pub(crate) fn take_seen_at() -> Vec<(String, FieldValue, f64)> {
    SEEN.with(|s| core::mem::take(&mut *s.borrow_mut()))
}

/// Creates a probe node and routes `source`'s eventOuts to it.
pub(crate) fn probed(scene: &mut Scene, source: NodeId, routes: &[(&str, &str)]) -> NodeId {
    scene.add_node_class(NodeClass::new("Probe", &PROBE));
    let probe = scene.create_default_node("Probe", None, &[]).unwrap();
    for (out, inp) in routes {
        assert!(scene.add_route(source, out, probe, inp).unwrap(), "new route");
    }
    take_seen_at();
    probe
}
