use id_arena::Id;

use crate::material::MaterialId;
use crate::scene_graph::frame::FrameId;

pub type NodeId = Id<Node>;

/// A scene entity: a frame in the transform hierarchy plus an optional
/// material that renders and animates it.
///
/// Nodes carry no hierarchy of their own; their parent/child structure is
/// the one of their frames.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub(crate) id: NodeId,
    pub(crate) frame: FrameId,
    pub(crate) material: Option<MaterialId>,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn frame(&self) -> FrameId {
        self.frame
    }

    pub fn material(&self) -> Option<MaterialId> {
        self.material
    }
}
