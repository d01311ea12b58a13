use thiserror::Error;

use crate::scene_graph::{FrameId, NodeId};

/// Errors reported by the frame graph, the scene and the camera.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    /// Adopting `child` under `parent` would make a frame its own ancestor.
    #[error("adopting {child:?} under {parent:?} would create a cycle")]
    Cycle { child: FrameId, parent: FrameId },

    #[error("unknown frame {0:?}")]
    UnknownFrame(FrameId),

    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),

    /// The root and scene nodes live as long as their scene.
    #[error("node {0:?} cannot be removed")]
    ProtectedNode(NodeId),

    #[error("invalid projection: {0}")]
    InvalidProjection(#[from] ProjectionError),
}

/// Reasons a projection parameter set is rejected.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ProjectionError {
    #[error("near plane must be positive, got {0}")]
    NonPositiveNear(f32),

    #[error("far plane ({far}) must lie beyond near plane ({near})")]
    FarNotBeyondNear { near: f32, far: f32 },

    #[error("aspect ratio must be positive, got {0}")]
    NonPositiveAspect(f32),

    #[error("half field of view must be within (0, 90) degrees, got {0}")]
    FieldOfViewOutOfRange(f32),

    #[error("frustum extent is empty")]
    EmptyExtent,

    #[error("projection parameters must be finite")]
    NonFinite,
}

pub type Result<T> = std::result::Result<T, SceneError>;
