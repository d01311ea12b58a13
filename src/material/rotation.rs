use glam::Vec3;

use crate::material::Material;
use crate::scene_graph::{FrameGraph, Node};

/// Spins its node around a fixed local axis, one radian per second.
pub struct RotationMaterial {
    name: String,
    pub axis: Vec3,
    pub enabled: bool,
}

impl RotationMaterial {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            axis: Vec3::Y,
            enabled: true,
        }
    }
}

impl Material for RotationMaterial {
    fn name(&self) -> &str {
        &self.name
    }

    fn animate(&mut self, node: &Node, frames: &mut FrameGraph, elapsed_ms: f32) {
        if self.enabled {
            frames.rotate(node.frame(), self.axis, elapsed_ms / 1000.0);
        }
    }

    fn display_interface(&mut self, node: &Node, lines: &mut Vec<String>) {
        let state = if self.enabled { "on" } else { "off" };
        lines.push(format!("{}: rotation {}", node.name, state));
    }
}
