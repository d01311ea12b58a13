use glam::{Mat4, Quat, Vec3};
use std::cell::Cell;

/// Local translation/rotation/scale of a frame, together with the cached
/// local and world matrices derived from it.
///
/// The world matrix is owned here but computed by the
/// [`FrameGraph`](super::FrameGraph), which is the only place that knows the
/// parent chain.
#[derive(Debug, Clone)]
pub struct Transform {
    translation: Vec3,
    rotation: Quat,
    scale: Vec3,

    local_matrix: Cell<Mat4>,
    world_matrix: Cell<Mat4>,
    local_dirty: Cell<bool>,
    world_dirty: Cell<bool>,
    world_generation: Cell<u64>,
    has_changed_since_last_update: Cell<bool>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::from_translation(Vec3::ZERO)
    }
}

impl Transform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            local_matrix: Cell::new(Mat4::IDENTITY),
            world_matrix: Cell::new(Mat4::IDENTITY),
            local_dirty: Cell::new(true),
            world_dirty: Cell::new(true),
            world_generation: Cell::new(0),
            has_changed_since_last_update: Cell::new(true),
        }
    }

    pub fn local_matrix(&self) -> Mat4 {
        if self.local_dirty.get() {
            let matrix =
                Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation);

            self.local_matrix.set(matrix);
            self.local_dirty.set(false);
        }

        self.local_matrix.get()
    }

    /// Last world matrix written by the graph. May be stale if
    /// [`is_world_dirty`](Self::is_world_dirty) is set.
    pub(crate) fn cached_world_matrix(&self) -> Mat4 {
        self.world_matrix.get()
    }

    pub(crate) fn set_world_matrix(&self, world_matrix: Mat4) {
        self.world_matrix.set(world_matrix);
        self.world_dirty.set(false);
        self.world_generation.set(self.world_generation.get() + 1);
        self.has_changed_since_last_update.set(true);
    }

    pub fn invalidate_local(&self) {
        self.local_dirty.set(true);
        self.world_dirty.set(true);
        self.has_changed_since_last_update.set(true);
    }

    pub fn invalidate_world(&self) {
        self.world_dirty.set(true);
    }

    pub fn is_world_dirty(&self) -> bool {
        self.world_dirty.get()
    }

    /// Number of times the world matrix has been recomputed.
    pub fn world_generation(&self) -> u64 {
        self.world_generation.get()
    }

    pub fn set_translation(&mut self, translation: Vec3) {
        self.translation = translation;
        self.invalidate_local();
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
        self.invalidate_local();
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.invalidate_local();
    }

    pub fn set_transform(&mut self, translation: Vec3, rotation: Quat, scale: Vec3) {
        self.translation = translation;
        self.rotation = rotation;
        self.scale = scale;
        self.invalidate_local();
    }

    /// Moves by `delta` expressed in this transform's own (rotated, scaled) axes.
    pub fn translate(&mut self, delta: Vec3) {
        self.translation += self.rotation * (self.scale * delta);
        self.invalidate_local();
    }

    /// Rotates around `axis` (local space) by `angle` radians. A zero or
    /// non-finite axis leaves the rotation untouched.
    pub fn rotate(&mut self, axis: Vec3, angle: f32) -> bool {
        let Some(axis) = axis.try_normalize() else {
            return false;
        };

        if !angle.is_finite() {
            return false;
        }

        self.rotation = (self.rotation * Quat::from_axis_angle(axis, angle)).normalize();
        self.invalidate_local();
        true
    }

    pub fn scale_by(&mut self, factor: Vec3) {
        self.scale *= factor;
        self.invalidate_local();
    }

    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn reset_flags(&self) {
        self.has_changed_since_last_update.set(false);
    }

    pub fn has_changed(&self) -> bool {
        self.has_changed_since_last_update.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn approx_eq_vec3(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < EPSILON
    }

    #[test]
    fn local_matrix_is_rebuilt_after_mutation() {
        let mut transform = Transform::default();
        assert_eq!(transform.local_matrix(), Mat4::IDENTITY);

        transform.set_translation(Vec3::new(1.0, 2.0, 3.0));
        let moved = transform.local_matrix().transform_point3(Vec3::ZERO);
        assert!(approx_eq_vec3(moved, Vec3::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn translate_follows_local_axes() {
        let mut transform = Transform::default();
        transform.set_rotation(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));
        transform.set_scale(Vec3::splat(2.0));

        transform.translate(Vec3::X);

        // +X rotated a quarter turn around Y is -Z, doubled by the scale.
        assert!(approx_eq_vec3(
            transform.translation(),
            Vec3::new(0.0, 0.0, -2.0)
        ));
    }

    #[test]
    fn rotate_with_zero_axis_is_ignored() {
        let mut transform = Transform::default();
        transform.reset_flags();

        assert!(!transform.rotate(Vec3::ZERO, 1.0));
        assert!(!transform.rotate(Vec3::new(f32::NAN, 0.0, 0.0), 1.0));
        assert_eq!(transform.rotation(), Quat::IDENTITY);
        assert!(!transform.has_changed());
    }

    #[test]
    fn scale_multiplies_componentwise() {
        let mut transform = Transform::default();
        transform.set_scale(Vec3::new(1.0, 2.0, 3.0));
        transform.scale_by(Vec3::new(2.0, 2.0, 0.5));
        assert_eq!(transform.scale(), Vec3::new(2.0, 4.0, 1.5));
    }

    #[test]
    fn world_generation_counts_recomputes() {
        let transform = Transform::default();
        assert!(transform.is_world_dirty());
        assert_eq!(transform.world_generation(), 0);

        transform.set_world_matrix(Mat4::IDENTITY);
        assert!(!transform.is_world_dirty());
        assert_eq!(transform.world_generation(), 1);

        transform.invalidate_world();
        assert!(transform.is_world_dirty());
    }
}
