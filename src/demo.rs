use glam::Vec3;

use crate::error::Result;
use crate::material::{BaseMaterial, PhongMaterial, RotationMaterial};
use crate::scene_graph::{NodeId, Scene};

/// Handles to the nodes of the demo scene.
#[derive(Debug, Clone, Copy)]
pub struct DemoNodes {
    pub bunny: NodeId,
    pub floor: NodeId,
    pub pivot: NodeId,
    pub light: NodeId,
}

/// Populates `scene` with a lit bunny on a floor, and a small light sphere
/// orbiting the bunny on a rotating pivot.
///
/// ```text
/// Scene
/// ├── Bunny (phong)
/// │   └── A (rotation)
/// │       └── Light (base)
/// └── Sol (phong)
/// ```
pub fn build_scene(scene: &mut Scene) -> Result<DemoNodes> {
    let scene_node = scene.scene_node();

    let bunny = scene.get_or_create_node("Bunny");
    let floor = scene.get_or_create_node("Sol");
    let pivot = scene.get_or_create_node("A");
    let light = scene.get_or_create_node("Light");

    scene.adopt(scene_node, bunny)?;
    scene.adopt(scene_node, floor)?;
    scene.adopt(bunny, pivot)?;
    scene.adopt(pivot, light)?;

    let bunny_frame = scene.node_frame(bunny)?;
    let floor_frame = scene.node_frame(floor)?;
    let light_frame = scene.node_frame(light)?;

    let frames = scene.frames_mut();
    frames.scale(bunny_frame, Vec3::splat(30.0));
    frames.translate(floor_frame, Vec3::new(0.0, -2.3, 0.0));
    frames.translate(light_frame, Vec3::new(0.5, 0.0, 0.0));
    frames.scale(light_frame, Vec3::splat(0.1));

    let phong = scene.add_material(Box::new(PhongMaterial::new("Phong", Some(light_frame))));
    let phong_wall = scene.add_material(Box::new(PhongMaterial::new("PhongWall", Some(light_frame))));
    let rotation = scene.add_material(Box::new(RotationMaterial::new("Rotation")));
    let sphere = scene.add_material(Box::new(BaseMaterial::new("Sphere")));

    scene.set_material(bunny, phong)?;
    scene.set_material(floor, phong_wall)?;
    scene.set_material(pivot, rotation)?;
    scene.set_material(light, sphere)?;

    log::info!("Demo scene ready with {} frames", scene.frames().len());

    Ok(DemoNodes {
        bunny,
        floor,
        pivot,
        light,
    })
}
