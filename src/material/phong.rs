use glam::Vec3;

use crate::material::{DrawCommand, Material, MaterialUniforms, RenderContext};
use crate::scene_graph::{FrameGraph, FrameId, Node};

/// Phong-lit material. The light and the camera are handed to the shader in
/// the node's local space.
pub struct PhongMaterial {
    name: String,
    light: Option<FrameId>,

    pub ambient_color: Vec3,
    pub diffuse_color: Vec3,
    pub light_color: Vec3,
    pub ambient_coefficient: f32,
    pub diffuse_coefficient: f32,
    pub specular_coefficient: f32,
    pub cone_size: i32,

    breakdance_axis: Vec3,
    breakdance: bool,
    flip_pending: bool,
}

impl PhongMaterial {
    pub fn new(name: impl Into<String>, light: Option<FrameId>) -> Self {
        Self {
            name: name.into(),
            light,
            ambient_color: Vec3::new(0.92, 0.77, 0.10),
            diffuse_color: Vec3::new(0.98, 1.00, 0.00),
            light_color: Vec3::new(0.66, 0.63, 0.08),
            ambient_coefficient: 0.4,
            diffuse_coefficient: 0.25,
            specular_coefficient: 0.75,
            cone_size: 1,
            breakdance_axis: Vec3::new(0.0, 1.0, 0.5f32.sin().tan()),
            breakdance: false,
            flip_pending: false,
        }
    }

    pub fn set_light(&mut self, light: Option<FrameId>) {
        self.light = light;
    }

    /// Toggling breakdance also mirrors the node once along Y.
    pub fn set_breakdance(&mut self, enabled: bool) {
        if enabled != self.breakdance {
            self.breakdance = enabled;
            self.flip_pending = true;
        }
    }

    pub fn breakdance(&self) -> bool {
        self.breakdance
    }
}

impl Material for PhongMaterial {
    fn name(&self) -> &str {
        &self.name
    }

    fn render(&self, node: &Node, context: &RenderContext<'_>, draws: &mut Vec<DrawCommand>) {
        let frames = context.frames;

        let light_position = self
            .light
            .and_then(|light| frames.convert_point_to(light, Vec3::ZERO, node.frame()))
            .unwrap_or(Vec3::ZERO);
        let camera_position = frames
            .convert_point_to(context.camera_frame, Vec3::ZERO, node.frame())
            .unwrap_or(Vec3::ZERO);

        let uniforms = MaterialUniforms::Phong {
            light_position,
            camera_position,
            ambient_color: self.ambient_color,
            diffuse_color: self.diffuse_color,
            light_color: self.light_color,
            ambient_coefficient: self.ambient_coefficient,
            diffuse_coefficient: self.diffuse_coefficient,
            specular_coefficient: self.specular_coefficient,
            cone_size: self.cone_size,
        };

        if let Some(draw) = context.draw_for(node, uniforms) {
            draws.push(draw);
        }
    }

    fn animate(&mut self, node: &Node, frames: &mut FrameGraph, elapsed_ms: f32) {
        if self.flip_pending {
            frames.scale(node.frame(), Vec3::new(1.0, -1.0, 1.0));
            self.flip_pending = false;
        }

        if self.breakdance {
            frames.rotate(node.frame(), self.breakdance_axis, elapsed_ms / 100.0);
        }
    }

    fn display_interface(&mut self, node: &Node, lines: &mut Vec<String>) {
        lines.push(format!(
            "{}: ka {:.2} kd {:.2} ks {:.2} cone {}",
            node.name,
            self.ambient_coefficient,
            self.diffuse_coefficient,
            self.specular_coefficient,
            self.cone_size
        ));

        if self.breakdance {
            lines.push(format!("{}: breakdance", node.name));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProjectionConfig;
    use crate::scene_graph::Scene;

    #[test]
    fn light_and_camera_are_given_in_node_space() {
        let mut scene = Scene::new(1024, 1024, &ProjectionConfig::default()).unwrap();
        let scene_node = scene.scene_node();
        let lit = scene.add_node("lit");
        let lamp = scene.add_node("lamp");
        scene.adopt(scene_node, lit).unwrap();
        scene.adopt(scene_node, lamp).unwrap();

        let lit_frame = scene.node_frame(lit).unwrap();
        let lamp_frame = scene.node_frame(lamp).unwrap();
        let camera_frame = scene.camera().frame();
        scene.frames_mut().set_local_translation(lit_frame, Vec3::new(1.0, 0.0, 0.0));
        scene.frames_mut().set_local_translation(lamp_frame, Vec3::new(1.0, 3.0, 0.0));
        scene.frames_mut().set_local_translation(camera_frame, Vec3::new(0.0, 0.0, 4.0));

        let material = scene.add_material(Box::new(PhongMaterial::new("Phong", Some(lamp_frame))));
        scene.set_material(lit, material).unwrap();

        let draws = scene.render(&[lit]).unwrap();
        let MaterialUniforms::Phong {
            light_position,
            camera_position,
            cone_size,
            ..
        } = draws[0].uniforms
        else {
            panic!("expected phong uniforms");
        };

        assert!(light_position.abs_diff_eq(Vec3::new(0.0, 3.0, 0.0), 1e-5));
        assert!(camera_position.abs_diff_eq(Vec3::new(-1.0, 0.0, 4.0), 1e-5));
        assert_eq!(cone_size, 1);
    }

    #[test]
    fn breakdance_flips_once_then_spins() {
        let mut scene = Scene::new(1024, 1024, &ProjectionConfig::default()).unwrap();
        let dancer = scene.add_node("dancer");
        let mut phong = PhongMaterial::new("Phong", None);
        phong.set_breakdance(true);
        let material = scene.add_material(Box::new(phong));
        scene.set_material(dancer, material).unwrap();

        scene.animate(&[dancer], 10.0);
        scene.animate(&[dancer], 10.0);

        let frame = scene.node_frame(dancer).unwrap();
        let transform = scene.frames().transform(frame).unwrap();
        assert_eq!(transform.scale(), Vec3::new(1.0, -1.0, 1.0));
        assert!(transform.rotation().angle_between(glam::Quat::IDENTITY) > 0.1);

        let lines = scene.display_interface(&[dancer]);
        assert_eq!(lines.len(), 2);
    }
}
