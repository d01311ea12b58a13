use crate::material::{DrawCommand, Material, MaterialUniforms, RenderContext};
use crate::scene_graph::Node;

/// Flat material: draws the node with its model and camera matrices only.
pub struct BaseMaterial {
    name: String,
}

impl BaseMaterial {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Material for BaseMaterial {
    fn name(&self) -> &str {
        &self.name
    }

    fn render(&self, node: &Node, context: &RenderContext<'_>, draws: &mut Vec<DrawCommand>) {
        if let Some(draw) = context.draw_for(node, MaterialUniforms::Base) {
            draws.push(draw);
        }
    }
}
