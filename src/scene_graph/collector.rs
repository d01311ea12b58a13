use crate::scene_graph::node::NodeId;
use crate::scene_graph::scene::Scene;

/// Flattened render/animate order of the nodes below a root.
///
/// Order is depth-first pre-order over the frame hierarchy: a node always
/// comes before its descendants, and siblings keep their adoption order.
/// Frames that belong to no node (the camera's, for instance) are skipped,
/// but their descendants are still visited.
#[derive(Debug, Default, Clone)]
pub struct NodeCollector {
    nodes: Vec<NodeId>,
}

impl NodeCollector {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn collect(&mut self, scene: &Scene, root: NodeId) {
        self.nodes.clear();

        let Some(root_node) = scene.node(root) else {
            return;
        };

        self.nodes.push(root);

        let frames = scene.frames();
        self.nodes.extend(
            frames
                .descendants(root_node.frame())
                .into_iter()
                .filter_map(|frame_id| scene.node_for_frame(frame_id)),
        );
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProjectionConfig;

    #[test]
    fn parents_come_before_children() {
        let mut scene = Scene::new(1024, 768, &ProjectionConfig::default()).unwrap();
        let scene_node = scene.scene_node();

        let a = scene.add_node("a");
        let b = scene.add_node("b");
        let a1 = scene.add_node("a1");
        scene.adopt(scene_node, a).unwrap();
        scene.adopt(scene_node, b).unwrap();
        scene.adopt(a, a1).unwrap();

        let mut collector = NodeCollector::new();
        collector.collect(&scene, scene.root());

        assert_eq!(
            collector.nodes(),
            &[scene.root(), scene_node, a, a1, b]
        );
    }

    #[test]
    fn detached_nodes_are_not_collected() {
        let mut scene = Scene::new(800, 600, &ProjectionConfig::default()).unwrap();
        let orphan = scene.add_node("orphan");

        let mut collector = NodeCollector::new();
        collector.collect(&scene, scene.root());
        assert!(!collector.iter().any(|id| id == orphan));

        collector.collect(&scene, orphan);
        assert_eq!(collector.len(), 1);
    }
}
