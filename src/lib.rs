pub mod camera;
pub mod config;
pub mod demo;
pub mod error;
pub mod material;
pub mod scene_graph;
pub mod trackball;
pub mod viewer;

pub use camera::{Camera, CameraMatrices, Projection};
pub use error::{ProjectionError, Result, SceneError};
pub use scene_graph::{FrameGraph, FrameId, NodeId, Scene};
pub use viewer::{InputEvent, Key, Viewer};
