pub mod collector;
pub mod frame;
pub mod frame_graph;
pub mod node;
pub mod scene;
pub mod transform;

pub use collector::NodeCollector;
pub use frame::{Frame, FrameId};
pub use frame_graph::FrameGraph;
pub use node::{Node, NodeId};
pub use scene::Scene;
pub use transform::Transform;
