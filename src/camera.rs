use std::cell::Cell;

use glam::{Mat3, Mat4, Quat, Vec3, Vec4};

use crate::error::{ProjectionError, Result, SceneError};
use crate::scene_graph::{FrameGraph, FrameId};

/// Projection kinds. All of them follow the OpenGL clip-space convention
/// (right-handed view space, depth in [-1, 1]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Perspective {
        /// Vertical half field of view, in degrees.
        half_fov_degrees: f32,
        aspect_ratio: f32,
        near: f32,
        far: f32,
    },
    Frustum {
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    },
    Orthographic {
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    },
}

impl Projection {
    pub fn near(&self) -> f32 {
        match *self {
            Projection::Perspective { near, .. }
            | Projection::Frustum { near, .. }
            | Projection::Orthographic { near, .. } => near,
        }
    }

    pub fn far(&self) -> f32 {
        match *self {
            Projection::Perspective { far, .. }
            | Projection::Frustum { far, .. }
            | Projection::Orthographic { far, .. } => far,
        }
    }

    fn with_planes(self, near: f32, far: f32) -> Self {
        match self {
            Projection::Perspective {
                half_fov_degrees,
                aspect_ratio,
                ..
            } => Projection::Perspective {
                half_fov_degrees,
                aspect_ratio,
                near,
                far,
            },
            Projection::Frustum {
                left,
                right,
                bottom,
                top,
                ..
            } => Projection::Frustum {
                left,
                right,
                bottom,
                top,
                near,
                far,
            },
            Projection::Orthographic {
                left,
                right,
                bottom,
                top,
                ..
            } => Projection::Orthographic {
                left,
                right,
                bottom,
                top,
                near,
                far,
            },
        }
    }

    pub fn validate(&self) -> std::result::Result<(), ProjectionError> {
        let (near, far) = (self.near(), self.far());

        match *self {
            Projection::Perspective {
                half_fov_degrees,
                aspect_ratio,
                ..
            } => {
                if ![half_fov_degrees, aspect_ratio, near, far]
                    .iter()
                    .all(|value| value.is_finite())
                {
                    return Err(ProjectionError::NonFinite);
                }

                if !(half_fov_degrees > 0.0 && half_fov_degrees < 90.0) {
                    return Err(ProjectionError::FieldOfViewOutOfRange(half_fov_degrees));
                }

                if aspect_ratio <= 0.0 {
                    return Err(ProjectionError::NonPositiveAspect(aspect_ratio));
                }
            }
            Projection::Frustum {
                left,
                right,
                bottom,
                top,
                ..
            }
            | Projection::Orthographic {
                left,
                right,
                bottom,
                top,
                ..
            } => {
                if ![left, right, bottom, top, near, far]
                    .iter()
                    .all(|value| value.is_finite())
                {
                    return Err(ProjectionError::NonFinite);
                }

                if left == right || bottom == top {
                    return Err(ProjectionError::EmptyExtent);
                }
            }
        }

        if near <= 0.0 {
            return Err(ProjectionError::NonPositiveNear(near));
        }

        if far <= near {
            return Err(ProjectionError::FarNotBeyondNear { near, far });
        }

        Ok(())
    }

    pub fn matrix(&self) -> Mat4 {
        match *self {
            Projection::Perspective {
                half_fov_degrees,
                aspect_ratio,
                near,
                far,
            } => Mat4::perspective_rh_gl(
                (2.0 * half_fov_degrees).to_radians(),
                aspect_ratio,
                near,
                far,
            ),
            Projection::Frustum {
                left,
                right,
                bottom,
                top,
                near,
                far,
            } => frustum_rh_gl(left, right, bottom, top, near, far),
            Projection::Orthographic {
                left,
                right,
                bottom,
                top,
                near,
                far,
            } => Mat4::orthographic_rh_gl(left, right, bottom, top, near, far),
        }
    }
}

/// Off-center perspective matrix, same layout as `glFrustum`.
fn frustum_rh_gl(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    let width = right - left;
    let height = top - bottom;
    let depth = far - near;

    Mat4::from_cols(
        Vec4::new(2.0 * near / width, 0.0, 0.0, 0.0),
        Vec4::new(0.0, 2.0 * near / height, 0.0, 0.0),
        Vec4::new(
            (right + left) / width,
            (top + bottom) / height,
            -(far + near) / depth,
            -1.0,
        ),
        Vec4::new(0.0, 0.0, -2.0 * far * near / depth, 0.0),
    )
}

/// Orientation whose local -Z axis points along `forward` and whose Y axis is
/// as close to `up` as possible. `None` for a zero (or non-finite) `forward`.
pub fn look_rotation(forward: Vec3, up: Vec3) -> Option<Quat> {
    let back = -forward.try_normalize()?;

    // Gram-Schmidt: strip the part of `up` along the view axis
    let y_axis = (up - back * up.dot(back))
        .try_normalize()
        .unwrap_or_else(|| back.any_orthonormal_vector());
    let x_axis = y_axis.cross(back);

    Some(Quat::from_mat3(&Mat3::from_cols(x_axis, y_axis, back)).normalize())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraMatrices {
    pub projection: Mat4,
    pub view: Mat4,
    pub view_projection: Mat4,
    pub inverse_view_projection: Mat4,
    /// Inverse transpose of `view_projection`.
    pub normal_view_projection: Mat4,
}

impl Default for CameraMatrices {
    fn default() -> Self {
        Self {
            projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            view_projection: Mat4::IDENTITY,
            inverse_view_projection: Mat4::IDENTITY,
            normal_view_projection: Mat4::IDENTITY,
        }
    }
}

impl CameraMatrices {
    fn new(projection: Mat4, view: Mat4) -> Self {
        let view_projection = projection * view;

        Self {
            projection,
            view,
            view_projection,
            inverse_view_projection: view_projection.inverse(),
            normal_view_projection: view_projection.inverse().transpose(),
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Default)]
pub struct CameraUniform {
    pub projection: Mat4,
    pub view: Mat4,
    pub view_proj: Mat4,
    pub view_proj_inv: Mat4,
    pub view_proj_normal: Mat4,
    pub position: Vec4,
}

impl CameraUniform {
    pub fn update(&mut self, matrices: &CameraMatrices) {
        self.projection = matrices.projection;
        self.view = matrices.view;
        self.view_proj = matrices.view_projection;
        self.view_proj_inv = matrices.inverse_view_projection;
        self.view_proj_normal = matrices.normal_view_projection;
        self.position = matrices.view.inverse().w_axis;
    }
}

/// A camera looking through a frame of the graph.
///
/// The view matrix is the inverse of the frame's world matrix. Derived
/// matrices are cached and rebuilt only when the projection changed or the
/// frame's world matrix was recomputed since the last build.
pub struct Camera {
    name: String,
    frame: FrameId,
    projection: Projection,

    // Last perspective parameters, reused by the fov/aspect setters
    half_fov_degrees: f32,
    aspect_ratio: f32,

    matrices: Cell<CameraMatrices>,
    projection_dirty: Cell<bool>,
    projection_cache: Cell<Mat4>,
    projection_stale: Cell<bool>,
    projection_builds: Cell<u64>,
    seen_generation: Cell<Option<u64>>,
    rebuilds: Cell<u64>,

    flushed: Option<CameraMatrices>,
    uniform: CameraUniform,
    update_needed: bool,
}

impl Camera {
    pub fn new(name: impl Into<String>, frame: FrameId) -> Self {
        let projection = Projection::Perspective {
            half_fov_degrees: 45.0,
            aspect_ratio: 1.0,
            near: 1.0,
            far: 2000.0,
        };

        Self {
            name: name.into(),
            frame,
            projection,
            half_fov_degrees: 45.0,
            aspect_ratio: 1.0,
            matrices: Cell::new(CameraMatrices::default()),
            projection_dirty: Cell::new(true),
            projection_cache: Cell::new(Mat4::IDENTITY),
            projection_stale: Cell::new(true),
            projection_builds: Cell::new(0),
            seen_generation: Cell::new(None),
            rebuilds: Cell::new(0),
            flushed: None,
            uniform: CameraUniform::default(),
            update_needed: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frame(&self) -> FrameId {
        self.frame
    }

    pub fn attach_to(&mut self, frame: FrameId) {
        self.frame = frame;
        self.seen_generation.set(None);
    }

    /// Places the camera frame at `center` looking at `point_to`. The
    /// orientation is left unchanged when the two points coincide.
    pub fn look_at(&self, frames: &mut FrameGraph, point_to: Vec3, center: Vec3, up: Vec3) {
        frames.set_local_translation(self.frame, center);

        match look_rotation(point_to - center, up) {
            Some(rotation) => frames.set_local_rotation(self.frame, rotation),
            None => log::warn!(
                "Camera {} cannot look at its own position {:?}",
                self.name,
                center
            ),
        }
    }

    /// Sets the camera frame's local transform from a (scale, rotation,
    /// translation) matrix.
    pub fn set_up_from_matrix(&self, frames: &mut FrameGraph, matrix: &Mat4) {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        frames.set_local_transform(self.frame, translation, rotation, scale);
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    /// Replaces the projection if valid; otherwise the current one is kept.
    pub fn set_projection(&mut self, projection: Projection) -> Result<()> {
        if let Err(error) = projection.validate() {
            log::warn!("Camera {}: rejected projection {:?}: {}", self.name, projection, error);
            return Err(SceneError::InvalidProjection(error));
        }

        if let Projection::Perspective {
            half_fov_degrees,
            aspect_ratio,
            ..
        } = projection
        {
            self.half_fov_degrees = half_fov_degrees;
            self.aspect_ratio = aspect_ratio;
        }

        self.projection = projection;
        self.projection_dirty.set(true);
        self.projection_stale.set(true);
        Ok(())
    }

    pub fn set_perspective_projection(
        &mut self,
        half_fov_degrees: f32,
        aspect_ratio: f32,
        near: f32,
        far: f32,
    ) -> Result<()> {
        self.set_projection(Projection::Perspective {
            half_fov_degrees,
            aspect_ratio,
            near,
            far,
        })
    }

    pub fn set_frustum(
        &mut self,
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    ) -> Result<()> {
        self.set_projection(Projection::Frustum {
            left,
            right,
            bottom,
            top,
            near,
            far,
        })
    }

    pub fn set_orthographic_projection(
        &mut self,
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    ) -> Result<()> {
        self.set_projection(Projection::Orthographic {
            left,
            right,
            bottom,
            top,
            near,
            far,
        })
    }

    pub fn znear(&self) -> f32 {
        self.projection.near()
    }

    pub fn zfar(&self) -> f32 {
        self.projection.far()
    }

    pub fn set_znear(&mut self, near: f32) -> Result<()> {
        self.set_projection(self.projection.with_planes(near, self.zfar()))
    }

    pub fn set_zfar(&mut self, far: f32) -> Result<()> {
        self.set_projection(self.projection.with_planes(self.znear(), far))
    }

    /// Half field of view of the last perspective projection, in degrees.
    pub fn fov(&self) -> f32 {
        self.half_fov_degrees
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    /// Switches to a perspective projection with the given half field of
    /// view, keeping aspect ratio and clipping planes.
    pub fn set_fov(&mut self, half_fov_degrees: f32) -> Result<()> {
        self.set_perspective_projection(half_fov_degrees, self.aspect_ratio, self.znear(), self.zfar())
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) -> Result<()> {
        self.set_perspective_projection(self.half_fov_degrees, aspect_ratio, self.znear(), self.zfar())
    }

    /// Projection matrix, rebuilt once after each projection change.
    pub fn projection_matrix(&self) -> Mat4 {
        if self.projection_stale.get() {
            self.projection_cache.set(self.projection.matrix());
            self.projection_stale.set(false);
            self.projection_builds.set(self.projection_builds.get() + 1);
        }

        self.projection_cache.get()
    }

    pub fn view_matrix(&self, frames: &FrameGraph) -> Result<Mat4> {
        self.matrices(frames).map(|matrices| matrices.view)
    }

    /// Current derived matrices, rebuilt first if the projection or the
    /// camera frame changed.
    pub fn matrices(&self, frames: &FrameGraph) -> Result<CameraMatrices> {
        let world = frames
            .world_matrix(self.frame)
            .ok_or(SceneError::UnknownFrame(self.frame))?;
        let generation = frames
            .transform(self.frame)
            .map(|transform| transform.world_generation());

        if !self.projection_dirty.get() && self.seen_generation.get() == generation {
            return Ok(self.matrices.get());
        }

        let matrices = CameraMatrices::new(self.projection_matrix(), world.inverse());
        self.matrices.set(matrices);
        self.projection_dirty.set(false);
        self.seen_generation.set(generation);
        self.rebuilds.set(self.rebuilds.get() + 1);

        Ok(matrices)
    }

    /// Number of times the derived matrices have been rebuilt.
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds.get()
    }

    /// Flushes the matrices into the GPU-facing uniform. Call once per tick
    /// after every frame mutation. Returns whether the uniform changed.
    pub fn update_buffer(&mut self, frames: &FrameGraph) -> Result<bool> {
        let matrices = self.matrices(frames)?;

        if self.flushed == Some(matrices) {
            return Ok(false);
        }

        self.uniform.update(&matrices);
        self.flushed = Some(matrices);
        self.update_needed = true;
        Ok(true)
    }

    pub fn uniform(&self) -> &CameraUniform {
        &self.uniform
    }

    pub fn uniform_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(&self.uniform)
    }

    /// Whether the camera moved since consumers last acknowledged it.
    pub fn update_needed(&self) -> bool {
        self.update_needed
    }

    pub fn set_update(&mut self, update: bool) {
        self.update_needed = update;
    }
}
