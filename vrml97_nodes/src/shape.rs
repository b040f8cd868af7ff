// Copyright 2026 the VRML97 Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `Shape` and its appearance nodes: `Appearance`, `Material`,
//! `TextureTransform`.

use vrml97_core::field::{Color, FieldType, FieldValue, Vec2f};
use vrml97_core::node::capability::{AppearanceNode, BoundsSource, Capabilities};
use vrml97_core::node::class::{ClassDecl, InterfaceDecl};
use vrml97_core::node::{NodeId, NodeView};
use vrml97_core::render::Renderer;
use vrml97_core::viewer::{Material, Viewer};

// -- Shape --

static SHAPE_INTERFACES: [InterfaceDecl; 2] = [
    InterfaceDecl::exposed_field(FieldType::SfNode, "appearance"),
    InterfaceDecl::exposed_field(FieldType::SfNode, "geometry"),
];

/// `Shape { exposedField SFNode appearance NULL exposedField SFNode geometry NULL }`
///
/// Bounded by its geometry.
pub static SHAPE: ClassDecl = ClassDecl {
    capabilities: Capabilities {
        child: true,
        bounded_volume: Some(BoundsSource::Children),
        ..Capabilities::NONE
    },
    render: Some(render_shape),
    ..ClassDecl::new(&SHAPE_INTERFACES)
};

fn render_shape(renderer: &mut Renderer<'_>, id: NodeId) {
    let view = renderer.scene().view(id);
    let appearance = view.node("appearance").map(|n| n.id());
    let geometry = view.node("geometry").map(|n| n.id());
    renderer.apply_appearance(appearance);
    if let Some(geometry) = geometry {
        renderer.render_geometry(geometry);
    }
}

// -- Appearance --

static APPEARANCE_INTERFACES: [InterfaceDecl; 3] = [
    InterfaceDecl::exposed_field(FieldType::SfNode, "material"),
    InterfaceDecl::exposed_field(FieldType::SfNode, "texture"),
    InterfaceDecl::exposed_field(FieldType::SfNode, "textureTransform"),
];

/// `Appearance { material NULL texture NULL textureTransform NULL }`
///
/// Without a material, geometry is drawn unlit.
pub static APPEARANCE: ClassDecl = ClassDecl {
    capabilities: Capabilities {
        appearance: Some(AppearanceNode {
            apply: apply_appearance,
        }),
        ..Capabilities::NONE
    },
    ..ClassDecl::new(&APPEARANCE_INTERFACES)
};

fn apply_appearance(view: &NodeView<'_>, viewer: &mut dyn Viewer) {
    let material = view.node("material").map_or(Material::UNLIT, |m| material(&m));
    viewer.set_material(&material);
    if let Some(texture) = view.node("texture")
        && let Some(record) = texture.node_type().capabilities().texture
    {
        (record.apply)(&texture, viewer);
    }
    if let Some(tt) = view.node("textureTransform") {
        viewer.set_texture_transform(
            tt.vec2f("center").unwrap_or_default(),
            tt.float("rotation").unwrap_or(0.0),
            tt.vec2f("scale").unwrap_or(Vec2f::new(1.0, 1.0)),
            tt.vec2f("translation").unwrap_or_default(),
        );
    }
}

// -- Material --

static MATERIAL_INTERFACES: [InterfaceDecl; 6] = [
    InterfaceDecl::exposed_field(FieldType::SfFloat, "ambientIntensity")
        .with_default(|| FieldValue::SfFloat(Material::DEFAULT.ambient_intensity)),
    InterfaceDecl::exposed_field(FieldType::SfColor, "diffuseColor")
        .with_default(|| FieldValue::SfColor(Material::DEFAULT.diffuse_color)),
    InterfaceDecl::exposed_field(FieldType::SfColor, "emissiveColor"),
    InterfaceDecl::exposed_field(FieldType::SfFloat, "shininess")
        .with_default(|| FieldValue::SfFloat(Material::DEFAULT.shininess)),
    InterfaceDecl::exposed_field(FieldType::SfColor, "specularColor"),
    InterfaceDecl::exposed_field(FieldType::SfFloat, "transparency"),
];

/// `Material`
pub static MATERIAL: ClassDecl = ClassDecl::new(&MATERIAL_INTERFACES);

/// Reads the viewer material described by a `Material` node.
#[must_use]
pub fn material(view: &NodeView<'_>) -> Material {
    let d = Material::DEFAULT;
    Material {
        ambient_intensity: view.float("ambientIntensity").unwrap_or(d.ambient_intensity),
        diffuse_color: view.color("diffuseColor").unwrap_or(d.diffuse_color),
        emissive_color: view.color("emissiveColor").unwrap_or(Color::BLACK),
        shininess: view.float("shininess").unwrap_or(d.shininess),
        specular_color: view.color("specularColor").unwrap_or(Color::BLACK),
        transparency: view.float("transparency").unwrap_or(0.0),
    }
}

// -- TextureTransform --

static TEXTURE_TRANSFORM_INTERFACES: [InterfaceDecl; 4] = [
    InterfaceDecl::exposed_field(FieldType::SfVec2f, "center"),
    InterfaceDecl::exposed_field(FieldType::SfFloat, "rotation"),
    InterfaceDecl::exposed_field(FieldType::SfVec2f, "scale")
        .with_default(|| FieldValue::SfVec2f(Vec2f::new(1.0, 1.0))),
    InterfaceDecl::exposed_field(FieldType::SfVec2f, "translation"),
];

/// `TextureTransform`
pub static TEXTURE_TRANSFORM: ClassDecl = ClassDecl::new(&TEXTURE_TRANSFORM_INTERFACES);

#[cfg(test)]
mod tests {
    use vrml97_core::field::{Color, FieldValue};
    use vrml97_core::scene::Scene;
    use vrml97_core::viewer::Material;

    use crate::register_vrml97;
    use crate::testing::{RecordingViewer, ViewerCall};

    #[test]
    fn material_defaults_match_vrml97() {
        let mut scene = Scene::default();
        register_vrml97(&mut scene);
        let m = scene.create_default_node("Material", None, &[]).unwrap();
        assert_eq!(super::material(&scene.view(m)), Material::DEFAULT);
    }

    #[test]
    fn shape_applies_material_before_geometry() {
        let mut scene = Scene::default();
        register_vrml97(&mut scene);
        let red = Color::new(1.0, 0.0, 0.0);
        let mat = scene
            .create_default_node("Material", None, &[("diffuseColor", FieldValue::SfColor(red))])
            .unwrap();
        let app = scene
            .create_default_node("Appearance", None, &[("material", FieldValue::SfNode(Some(mat)))])
            .unwrap();
        let sphere = scene.create_default_node("Sphere", None, &[]).unwrap();
        let shape = scene
            .create_default_node(
                "Shape",
                None,
                &[
                    ("appearance", FieldValue::SfNode(Some(app))),
                    ("geometry", FieldValue::SfNode(Some(sphere))),
                ],
            )
            .unwrap();
        scene.add_root(shape).unwrap();
        scene.initialize(0.0);

        let mut viewer = RecordingViewer::default();
        scene.render(&mut viewer);
        let material = Material {
            diffuse_color: red,
            ..Material::DEFAULT
        };
        assert_eq!(
            viewer.calls,
            vec![ViewerCall::Material(material), ViewerCall::Sphere(1.0)],
        );
        assert!(!scene.modified(shape), "render clears modified flags");
    }

    #[test]
    fn shape_without_appearance_is_unlit() {
        let mut scene = Scene::default();
        register_vrml97(&mut scene);
        let b = scene.create_default_node("Box", None, &[]).unwrap();
        let shape = scene
            .create_default_node("Shape", None, &[("geometry", FieldValue::SfNode(Some(b)))])
            .unwrap();
        scene.add_root(shape).unwrap();
        let mut viewer = RecordingViewer::default();
        scene.render(&mut viewer);
        assert_eq!(viewer.calls[0], ViewerCall::Material(Material::UNLIT));
    }
}
