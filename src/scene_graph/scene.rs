use glam::UVec2;
use id_arena::Arena;
use std::collections::HashMap;

use crate::camera::{Camera, CameraMatrices};
use crate::config::ProjectionConfig;
use crate::error::{Result, SceneError};
use crate::material::{DrawCommand, Material, MaterialId, RenderContext};
use crate::scene_graph::frame::FrameId;
use crate::scene_graph::frame_graph::FrameGraph;
use crate::scene_graph::node::{Node, NodeId};

/// Everything one viewer works on: the frame graph, the nodes living in it,
/// their materials, the active camera and the node the trackball drives.
///
/// Layout after [`Scene::new`]:
///
/// ```text
/// Root
/// ├── Scene      (content goes here; manipulated by default)
/// └── Camera     (frame only, no node)
/// ```
pub struct Scene {
    frames: FrameGraph,
    nodes: Arena<Node>,
    nodes_by_frame: HashMap<FrameId, NodeId>,
    materials: Arena<Box<dyn Material>>,
    camera: Camera,
    root: NodeId,
    scene_node: NodeId,
    manipulated: NodeId,
    viewport: UVec2,
}

impl Scene {
    pub fn new(width: u32, height: u32, projection: &ProjectionConfig) -> Result<Self> {
        let mut frames = FrameGraph::new();
        let mut nodes = Arena::new();
        let mut nodes_by_frame = HashMap::new();

        let root = alloc_node(&mut frames, &mut nodes, &mut nodes_by_frame, "Root");
        let scene_node = alloc_node(&mut frames, &mut nodes, &mut nodes_by_frame, "Scene");
        let root_frame = nodes[root].frame;
        frames.adopt(root_frame, nodes[scene_node].frame)?;

        let camera_frame = frames.add_frame("Camera");
        frames.adopt(root_frame, camera_frame)?;

        let mut camera = Camera::new("Camera", camera_frame);
        camera.set_perspective_projection(
            projection.half_fov_degrees,
            width as f32 / height as f32,
            projection.near,
            projection.far,
        )?;

        Ok(Self {
            frames,
            nodes,
            nodes_by_frame,
            materials: Arena::new(),
            camera,
            root,
            scene_node,
            manipulated: scene_node,
            viewport: UVec2::new(width, height),
        })
    }

    pub fn frames(&self) -> &FrameGraph {
        &self.frames
    }

    pub fn frames_mut(&mut self) -> &mut FrameGraph {
        &mut self.frames
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Camera and frame graph borrowed together, for camera operations that
    /// move its frame.
    pub fn camera_and_frames_mut(&mut self) -> (&mut Camera, &mut FrameGraph) {
        (&mut self.camera, &mut self.frames)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn scene_node(&self) -> NodeId {
        self.scene_node
    }

    pub fn manipulated_node(&self) -> NodeId {
        self.manipulated
    }

    pub fn set_manipulated_node(&mut self, id: NodeId) -> Result<()> {
        if self.node(id).is_none() {
            return Err(SceneError::UnknownNode(id));
        }

        self.manipulated = id;
        Ok(())
    }

    /// Frame of the manipulated node.
    pub fn manipulated_frame(&self) -> Result<FrameId> {
        self.node(self.manipulated)
            .map(Node::frame)
            .ok_or(SceneError::UnknownNode(self.manipulated))
    }

    pub fn viewport(&self) -> UVec2 {
        self.viewport
    }

    pub fn resize_viewport(&mut self, width: u32, height: u32) {
        self.viewport = UVec2::new(width, height);
    }

    /// Creates a detached node with a fresh frame.
    pub fn add_node(&mut self, name: impl Into<String>) -> NodeId {
        alloc_node(
            &mut self.frames,
            &mut self.nodes,
            &mut self.nodes_by_frame,
            name,
        )
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes
            .get(id)
            .filter(|node| self.frames.contains(node.frame))
    }

    pub fn node_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, node)| node.name == name && self.frames.contains(node.frame))
            .map(|(id, _)| id)
    }

    pub fn node_for_frame(&self, frame: FrameId) -> Option<NodeId> {
        self.nodes_by_frame.get(&frame).copied()
    }

    /// Looks a node up by name, creating a detached one if none exists.
    pub fn get_or_create_node(&mut self, name: &str) -> NodeId {
        match self.node_by_name(name) {
            Some(id) => id,
            None => self.add_node(name),
        }
    }

    pub fn node_frame(&self, id: NodeId) -> Result<FrameId> {
        self.node(id)
            .map(Node::frame)
            .ok_or(SceneError::UnknownNode(id))
    }

    /// Makes `child` a child of `parent` in the frame hierarchy.
    pub fn adopt(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let parent_frame = self.node_frame(parent)?;
        let child_frame = self.node_frame(child)?;
        self.frames.adopt(parent_frame, child_frame)
    }

    /// Destroys a node and its frame; its children move up to its parent.
    /// The root and scene nodes are refused with
    /// [`SceneError::ProtectedNode`].
    pub fn remove_node(&mut self, id: NodeId) -> Result<()> {
        if id == self.root || id == self.scene_node {
            return Err(SceneError::ProtectedNode(id));
        }

        let frame = self.node_frame(id)?;
        let parent_node = self
            .frames
            .get_frame(frame)
            .and_then(|frame| frame.parent_id())
            .and_then(|parent_frame| self.node_for_frame(parent_frame));

        self.frames.remove_frame(frame)?;
        self.nodes_by_frame.remove(&frame);

        if self.manipulated == id {
            self.manipulated = parent_node
                .filter(|&parent| self.node(parent).is_some())
                .unwrap_or(self.scene_node);
        }

        Ok(())
    }

    pub fn add_material(&mut self, material: Box<dyn Material>) -> MaterialId {
        self.materials.alloc(material)
    }

    pub fn material(&self, id: MaterialId) -> Option<&dyn Material> {
        self.materials.get(id).map(|material| &**material)
    }

    pub fn material_mut(&mut self, id: MaterialId) -> Option<&mut (dyn Material + 'static)> {
        self.materials.get_mut(id).map(|material| &mut **material)
    }

    pub fn set_material(&mut self, node: NodeId, material: MaterialId) -> Result<()> {
        if self.node(node).is_none() {
            return Err(SceneError::UnknownNode(node));
        }

        if let Some(node) = self.nodes.get_mut(node) {
            node.material = Some(material);
        }

        Ok(())
    }

    /// Runs every material's animate hook, in `order`.
    pub fn animate(&mut self, order: &[NodeId], elapsed_ms: f32) {
        for &node_id in order {
            let Some(node) = self
                .nodes
                .get(node_id)
                .filter(|node| self.frames.contains(node.frame))
            else {
                continue;
            };

            let Some(material) = node.material.and_then(|id| self.materials.get_mut(id)) else {
                continue;
            };

            material.animate(node, &mut self.frames, elapsed_ms);
        }
    }

    /// Flushes the camera once all frame mutation for the tick is done.
    pub fn flush_camera(&mut self) -> Result<bool> {
        self.camera.update_buffer(&self.frames)
    }

    /// Collects draws for `order`. Cleans every world matrix first so that no
    /// material can observe a stale one.
    pub fn render(&self, order: &[NodeId]) -> Result<Vec<DrawCommand>> {
        self.frames.update_world_matrices();
        let matrices: CameraMatrices = self.camera.matrices(&self.frames)?;

        let mut draws = Vec::new();
        for &node_id in order {
            let Some(node) = self.node(node_id) else {
                continue;
            };

            let Some(material_id) = node.material else {
                continue;
            };

            if let Some(material) = self.materials.get(material_id) {
                let context = RenderContext {
                    frames: &self.frames,
                    camera_frame: self.camera.frame(),
                    camera: &matrices,
                    material: material_id,
                };
                material.render(node, &context, &mut draws);
            }
        }

        Ok(draws)
    }

    pub fn display_interface(&mut self, order: &[NodeId]) -> Vec<String> {
        let mut lines = Vec::new();

        for &node_id in order {
            let Some(node) = self
                .nodes
                .get(node_id)
                .filter(|node| self.frames.contains(node.frame))
            else {
                continue;
            };

            if let Some(material) = node.material.and_then(|id| self.materials.get_mut(id)) {
                material.display_interface(node, &mut lines);
            }
        }

        lines
    }
}

fn alloc_node(
    frames: &mut FrameGraph,
    nodes: &mut Arena<Node>,
    nodes_by_frame: &mut HashMap<FrameId, NodeId>,
    name: impl Into<String>,
) -> NodeId {
    let name = name.into();
    let frame = frames.add_frame(name.clone());
    let id = nodes.next_id();

    let node_id = nodes.alloc(Node {
        name,
        id,
        frame,
        material: None,
    });
    nodes_by_frame.insert(frame, node_id);

    node_id
}
