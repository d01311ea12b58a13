use glam::{Mat4, Vec3};
use id_arena::Id;

use crate::camera::CameraMatrices;
use crate::scene_graph::{FrameGraph, FrameId, Node, NodeId};

pub mod base;
pub mod phong;
pub mod rotation;

pub use base::BaseMaterial;
pub use phong::PhongMaterial;
pub use rotation::RotationMaterial;

pub type MaterialId = Id<Box<dyn Material>>;

/// Per-material behaviour hooked into the tick.
///
/// `animate` runs during the mutation phase and may move frames; `render`
/// runs after every world matrix has been cleaned and only reads.
pub trait Material {
    fn name(&self) -> &str;

    fn render(&self, _node: &Node, _context: &RenderContext<'_>, _draws: &mut Vec<DrawCommand>) {}

    fn animate(&mut self, _node: &Node, _frames: &mut FrameGraph, _elapsed_ms: f32) {}

    /// Appends human-readable status lines for the debug overlay.
    fn display_interface(&mut self, _node: &Node, _lines: &mut Vec<String>) {}
}

/// Read-only view of the scene handed to [`Material::render`].
pub struct RenderContext<'a> {
    pub frames: &'a FrameGraph,
    pub camera_frame: FrameId,
    pub camera: &'a CameraMatrices,
    /// The material being rendered.
    pub material: MaterialId,
}

impl RenderContext<'_> {
    /// Builds the draw for `node`, or `None` if its frame is gone.
    pub fn draw_for(&self, node: &Node, uniforms: MaterialUniforms) -> Option<DrawCommand> {
        let model = self.frames.world_matrix(node.frame())?;

        Some(DrawCommand {
            node: node.id(),
            material: self.material,
            model,
            model_changed: self.frames.has_changed(node.frame()).unwrap_or(true),
            normal: model.inverse().transpose(),
            model_view_projection: self.camera.view_projection * model,
            uniforms,
        })
    }
}

/// What the GPU side needs to issue one draw.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub node: NodeId,
    pub material: MaterialId,
    pub model: Mat4,
    /// Whether `model` moved since the previous draw list; per-object
    /// uniforms can be left alone otherwise.
    pub model_changed: bool,
    pub normal: Mat4,
    pub model_view_projection: Mat4,
    pub uniforms: MaterialUniforms,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MaterialUniforms {
    Base,
    Phong {
        /// Light position in the node's local space.
        light_position: Vec3,
        /// Camera position in the node's local space.
        camera_position: Vec3,
        ambient_color: Vec3,
        diffuse_color: Vec3,
        light_color: Vec3,
        ambient_coefficient: f32,
        diffuse_coefficient: f32,
        specular_coefficient: f32,
        cone_size: i32,
    },
}
