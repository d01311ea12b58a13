use glam::Vec3;
use id_arena::Id;

use crate::scene_graph::transform::Transform;

pub type FrameId = Id<Frame>;

/// A node of the transform hierarchy.
///
/// Parent and children are plain arena handles: the `FrameGraph` owns every
/// frame, so neither direction of the link keeps anything alive.
#[derive(Debug, Clone)]
pub struct Frame {
    pub name: String,
    pub(crate) transform: Transform,
    pub(crate) parent_id: Option<FrameId>,
    pub(crate) child_ids: Vec<FrameId>,
    pub(crate) alive: bool,
}

impl Frame {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn parent_id(&self) -> Option<FrameId> {
        self.parent_id
    }

    pub fn child_ids(&self) -> &[FrameId] {
        &self.child_ids
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn is_dirty(&self) -> bool {
        self.transform.is_world_dirty()
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            name: String::new(),
            transform: Transform::from_translation(Vec3::ZERO),
            parent_id: None,
            child_ids: Vec::new(),
            alive: true,
        }
    }
}
