use glam::{Mat4, Quat, Vec3};
use id_arena::Arena;

use crate::error::{Result, SceneError};
use crate::scene_graph::frame::{Frame, FrameId};
use crate::scene_graph::transform::Transform;

/// Arena of frames plus the parent/child relationships between them.
///
/// World matrices are cached per frame and recomputed lazily: reading a
/// frame's world matrix recomputes every dirty frame on the path from its
/// topmost dirty ancestor down to the frame itself. Siblings and descendants
/// stay dirty until they are read or [`update_world_matrices`] runs.
///
/// [`update_world_matrices`]: FrameGraph::update_world_matrices
pub struct FrameGraph {
    frames: Arena<Frame>,
}

impl Default for FrameGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameGraph {
    pub fn new() -> Self {
        Self {
            frames: Arena::new(),
        }
    }

    pub fn add_frame(&mut self, name: impl Into<String>) -> FrameId {
        self.frames.alloc(Frame::new(name))
    }

    pub fn get_frame(&self, id: FrameId) -> Option<&Frame> {
        self.frames.get(id).filter(|frame| frame.alive)
    }

    fn get_frame_mut(&mut self, id: FrameId) -> Option<&mut Frame> {
        self.frames.get_mut(id).filter(|frame| frame.alive)
    }

    pub fn contains(&self, id: FrameId) -> bool {
        self.get_frame(id).is_some()
    }

    pub fn frame_by_name(&self, name: &str) -> Option<FrameId> {
        self.iter()
            .find(|(_, frame)| frame.name == name)
            .map(|(id, _)| id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FrameId, &Frame)> {
        self.frames.iter().filter(|(_, frame)| frame.alive)
    }

    /// Number of live frames.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn roots(&self) -> Vec<FrameId> {
        self.iter()
            .filter(|(_, frame)| frame.is_root())
            .map(|(id, _)| id)
            .collect()
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: FrameId) -> Vec<FrameId> {
        let mut ancestors = Vec::new();
        let mut cursor = self.get_frame(id).and_then(|frame| frame.parent_id);

        while let Some(parent_id) = cursor {
            ancestors.push(parent_id);
            cursor = self.get_frame(parent_id).and_then(|frame| frame.parent_id);
        }

        ancestors
    }

    /// Descendants of `id` in depth-first pre-order, excluding `id` itself.
    pub fn descendants(&self, id: FrameId) -> Vec<FrameId> {
        let mut descendants = Vec::new();
        let mut stack: Vec<FrameId> = match self.get_frame(id) {
            Some(frame) => frame.child_ids.iter().rev().copied().collect(),
            None => return descendants,
        };

        while let Some(frame_id) = stack.pop() {
            if let Some(frame) = self.get_frame(frame_id) {
                descendants.push(frame_id);
                stack.extend(frame.child_ids.iter().rev().copied());
            }
        }

        descendants
    }

    pub fn is_ancestor_of(&self, ancestor: FrameId, id: FrameId) -> bool {
        self.ancestors(id).contains(&ancestor)
    }

    /// Attaches `child_id` under `parent_id`, detaching it from its previous
    /// parent. Fails without touching the graph if `child_id` is `parent_id`
    /// or one of its ancestors.
    pub fn adopt(&mut self, parent_id: FrameId, child_id: FrameId) -> Result<()> {
        if !self.contains(parent_id) {
            return Err(SceneError::UnknownFrame(parent_id));
        }

        let current_parent = self
            .get_frame(child_id)
            .ok_or(SceneError::UnknownFrame(child_id))?
            .parent_id;

        if child_id == parent_id || self.is_ancestor_of(child_id, parent_id) {
            log::warn!(
                "Rejected adoption of {:?} by {:?}: would create a cycle",
                child_id,
                parent_id
            );
            return Err(SceneError::Cycle {
                child: child_id,
                parent: parent_id,
            });
        }

        if current_parent == Some(parent_id) {
            return Ok(());
        }

        self.set_frame_parent(child_id, Some(parent_id));
        log::debug!("Frame {:?} adopted by {:?}", child_id, parent_id);

        Ok(())
    }

    /// Turns `id` into a root frame.
    pub fn detach(&mut self, id: FrameId) -> Result<()> {
        if !self.contains(id) {
            return Err(SceneError::UnknownFrame(id));
        }

        self.set_frame_parent(id, None);
        Ok(())
    }

    /// Destroys a frame. Its children are handed over to its parent (or
    /// become roots) so that no handle is left pointing at the dead frame.
    pub fn remove_frame(&mut self, id: FrameId) -> Result<()> {
        let frame = self.get_frame(id).ok_or(SceneError::UnknownFrame(id))?;
        let parent_id = frame.parent_id;
        let child_ids = frame.child_ids.clone();

        for child_id in child_ids {
            self.set_frame_parent(child_id, parent_id);
        }

        self.set_frame_parent(id, None);

        if let Some(frame) = self.get_frame_mut(id) {
            frame.alive = false;
        }

        log::debug!("Removed frame {:?}", id);
        Ok(())
    }

    fn set_frame_parent(&mut self, child_id: FrameId, new_parent_id: Option<FrameId>) {
        // Remove from old parent's children list
        if let Some(old_parent_id) = self.get_frame(child_id).and_then(|child| child.parent_id) {
            if let Some(old_parent) = self.get_frame_mut(old_parent_id) {
                old_parent.child_ids.retain(|&id| id != child_id);
            }
        }

        if let Some(child) = self.get_frame_mut(child_id) {
            child.parent_id = new_parent_id;
        }

        if let Some(new_parent_id) = new_parent_id {
            if let Some(new_parent) = self.get_frame_mut(new_parent_id) {
                new_parent.child_ids.push(child_id);
            }
        }

        // The moved frame now composes with a different parent matrix
        self.invalidate_frame_hierarchy(child_id);
    }

    /// Marks a frame and every one of its descendants dirty. Ancestors are
    /// left untouched.
    pub fn mark_dirty(&self, id: FrameId) {
        self.invalidate_frame_hierarchy(id);
    }

    fn invalidate_frame_hierarchy(&self, id: FrameId) {
        let mut stack = vec![id];

        while let Some(frame_id) = stack.pop() {
            if let Some(frame) = self.get_frame(frame_id) {
                frame.transform.invalidate_world();
                stack.extend_from_slice(&frame.child_ids);
            }
        }
    }

    pub fn is_dirty(&self, id: FrameId) -> Option<bool> {
        self.get_frame(id).map(Frame::is_dirty)
    }

    fn modify_transform(&mut self, id: FrameId, modify: impl FnOnce(&mut Transform) -> bool) {
        let Some(frame) = self.get_frame_mut(id) else {
            log::warn!("Ignoring transform change on unknown frame {:?}", id);
            return;
        };

        if modify(&mut frame.transform) {
            self.invalidate_frame_hierarchy(id);
        }
    }

    pub fn set_local_translation(&mut self, id: FrameId, translation: Vec3) {
        self.modify_transform(id, |transform| {
            transform.set_translation(translation);
            true
        });
    }

    pub fn set_local_rotation(&mut self, id: FrameId, rotation: Quat) {
        self.modify_transform(id, |transform| {
            transform.set_rotation(rotation);
            true
        });
    }

    pub fn set_local_scale(&mut self, id: FrameId, scale: Vec3) {
        self.modify_transform(id, |transform| {
            transform.set_scale(scale);
            true
        });
    }

    pub fn set_local_transform(&mut self, id: FrameId, translation: Vec3, rotation: Quat, scale: Vec3) {
        self.modify_transform(id, |transform| {
            transform.set_transform(translation, rotation, scale);
            true
        });
    }

    /// Moves a frame by `delta`, expressed in the frame's own local axes.
    pub fn translate(&mut self, id: FrameId, delta: Vec3) {
        self.modify_transform(id, |transform| {
            transform.translate(delta);
            true
        });
    }

    /// Rotates a frame around `axis` (in its own local axes) by `angle`
    /// radians. Degenerate axes are ignored.
    pub fn rotate(&mut self, id: FrameId, axis: Vec3, angle: f32) {
        self.modify_transform(id, |transform| transform.rotate(axis, angle));
    }

    pub fn scale(&mut self, id: FrameId, factor: Vec3) {
        self.modify_transform(id, |transform| {
            transform.scale_by(factor);
            true
        });
    }

    pub fn transform(&self, id: FrameId) -> Option<&Transform> {
        self.get_frame(id).map(Frame::transform)
    }

    pub fn local_matrix(&self, id: FrameId) -> Option<Mat4> {
        self.get_frame(id).map(|frame| frame.transform.local_matrix())
    }

    /// World matrix of `id`, recomputing the dirty part of its ancestor
    /// chain first.
    pub fn world_matrix(&self, id: FrameId) -> Option<Mat4> {
        let frame = self.get_frame(id)?;

        if !frame.is_dirty() {
            return Some(frame.transform.cached_world_matrix());
        }

        // Walk up until a clean ancestor (or the root) is found. A clean
        // frame never has a dirty ancestor, so its cached matrix is usable.
        let mut chain = vec![id];
        let mut parent_world = Mat4::IDENTITY;
        let mut cursor = frame.parent_id;

        while let Some(parent_id) = cursor {
            let Some(parent) = self.get_frame(parent_id) else {
                break;
            };

            if !parent.is_dirty() {
                parent_world = parent.transform.cached_world_matrix();
                break;
            }

            chain.push(parent_id);
            cursor = parent.parent_id;
        }

        for &frame_id in chain.iter().rev() {
            let transform = &self.frames[frame_id].transform;
            let world_matrix = parent_world * transform.local_matrix();
            transform.set_world_matrix(world_matrix);
            parent_world = world_matrix;
        }

        Some(parent_world)
    }

    pub fn inverse_world_matrix(&self, id: FrameId) -> Option<Mat4> {
        self.world_matrix(id).map(|world| world.inverse())
    }

    /// Inverse transpose of the world matrix, for transforming normals.
    pub fn normal_matrix(&self, id: FrameId) -> Option<Mat4> {
        self.world_matrix(id).map(|world| world.inverse().transpose())
    }

    pub fn world_position(&self, id: FrameId) -> Option<Vec3> {
        self.world_matrix(id)
            .map(|world| world.transform_point3(Vec3::ZERO))
    }

    /// Matrix taking coordinates in `from`'s local space to `to`'s local space.
    pub fn relative_matrix(&self, from: FrameId, to: FrameId) -> Option<Mat4> {
        let from_world = self.world_matrix(from)?;
        let to_world = self.world_matrix(to)?;
        Some(to_world.inverse() * from_world)
    }

    pub fn convert_point_to(&self, from: FrameId, point: Vec3, to: FrameId) -> Option<Vec3> {
        self.relative_matrix(from, to)
            .map(|matrix| matrix.transform_point3(point))
    }

    /// Like [`convert_point_to`](Self::convert_point_to) but ignores
    /// translation (w = 0).
    pub fn convert_direction_to(&self, from: FrameId, direction: Vec3, to: FrameId) -> Option<Vec3> {
        self.relative_matrix(from, to)
            .map(|matrix| matrix.transform_vector3(direction))
    }

    /// Recomputes every dirty world matrix, top-down from the roots.
    pub fn update_world_matrices(&self) {
        for root_id in self.roots() {
            self.update_frame_transform_recursive(root_id, Mat4::IDENTITY);
        }
    }

    fn update_frame_transform_recursive(&self, frame_id: FrameId, parent_world_matrix: Mat4) {
        if let Some(frame) = self.get_frame(frame_id) {
            if frame.is_dirty() {
                let world_matrix = parent_world_matrix * frame.transform.local_matrix();
                frame.transform.set_world_matrix(world_matrix);
            }

            let world_matrix = frame.transform.cached_world_matrix();
            for &child_id in &frame.child_ids {
                self.update_frame_transform_recursive(child_id, world_matrix);
            }
        }
    }

    pub fn has_changed(&self, id: FrameId) -> Option<bool> {
        self.get_frame(id).map(|frame| frame.transform.has_changed())
    }

    pub fn reset_changed_flags(&self) {
        for (_, frame) in self.iter() {
            frame.transform.reset_flags();
        }
    }
}
