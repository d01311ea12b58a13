use glam::{Vec2, Vec3};

use crate::config::TrackballConfig;
use crate::error::{Result, SceneError};
use crate::scene_graph::{FrameGraph, FrameId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
    Other(u16),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum TrackballMode {
    #[default]
    Idle,
    Rotating,
    Translating,
}

/// Lifts a point in normalized device coordinates onto the virtual
/// trackball: a unit sphere near the centre, a hyperbolic sheet outside it.
///
/// The result is not unit length in the outer region.
pub fn project_on_sphere(position: Vec2) -> Vec3 {
    let r2 = position.length_squared();

    let z = if r2 <= 0.5 {
        (1.0 - r2).sqrt()
    } else {
        0.5 / r2.sqrt()
    };

    position.extend(z)
}

/// Turns pointer drags into rotations and translations of a target frame,
/// interpreted in the axes of a reference frame (usually the camera).
///
/// Positions are window pixels with the origin at the top-left corner.
#[derive(Debug, Clone)]
pub struct TrackballController {
    config: TrackballConfig,
    viewport: Vec2,
    previous: Vec2,
    primary_held: bool,
    secondary_held: bool,
    wheel: f32,
}

impl TrackballController {
    pub fn new(config: TrackballConfig, width: u32, height: u32) -> Self {
        let viewport = Vec2::new(width.max(1) as f32, height.max(1) as f32);

        Self {
            config,
            viewport,
            previous: viewport * 0.5,
            primary_held: false,
            secondary_held: false,
            wheel: 0.0,
        }
    }

    pub fn config(&self) -> &TrackballConfig {
        &self.config
    }

    /// Rotation wins while the primary button is held, whatever else is.
    pub fn mode(&self) -> TrackballMode {
        if self.primary_held {
            TrackballMode::Rotating
        } else if self.secondary_held {
            TrackballMode::Translating
        } else {
            TrackballMode::Idle
        }
    }

    /// Sum of all wheel offsets seen so far, negated.
    pub fn wheel(&self) -> f32 {
        self.wheel
    }

    /// Zero sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.viewport = Vec2::new(width as f32, height as f32);
    }

    pub fn normalized_coordinates(&self, pixel: Vec2) -> Vec2 {
        Vec2::new(
            2.0 * pixel.x / self.viewport.x - 1.0,
            1.0 - 2.0 * pixel.y / self.viewport.y,
        )
    }

    pub fn button_pressed(&mut self, button: PointerButton, position: Vec2) {
        self.previous = position;

        match button {
            PointerButton::Primary => self.primary_held = true,
            PointerButton::Secondary => self.secondary_held = true,
            _ => {}
        }
    }

    pub fn button_released(&mut self, button: PointerButton, position: Vec2) {
        self.previous = position;

        match button {
            PointerButton::Primary => {
                self.primary_held = false;
                self.previous = self.viewport * 0.5;
            }
            PointerButton::Secondary => self.secondary_held = false,
            _ => {}
        }
    }

    /// Applies the drag from the previous pointer position to `position`.
    /// Returns whether `target` was moved.
    pub fn pointer_moved(
        &mut self,
        frames: &mut FrameGraph,
        reference: FrameId,
        target: FrameId,
        position: Vec2,
    ) -> Result<bool> {
        let current = self.normalized_coordinates(position);
        let previous = self.normalized_coordinates(self.previous);
        self.previous = position;

        match self.mode() {
            TrackballMode::Idle => Ok(false),
            TrackballMode::Rotating => {
                if (current - previous).length() <= self.config.min_rotation_motion {
                    return Ok(false);
                }

                self.rotate_frame(frames, reference, target, current, previous)
            }
            TrackballMode::Translating => {
                self.translate_frame(frames, reference, target, current, previous)
            }
        }
    }

    /// Moves `target` along the reference's viewing axis.
    pub fn scrolled(
        &mut self,
        frames: &mut FrameGraph,
        reference: FrameId,
        target: FrameId,
        offset: f32,
    ) -> Result<()> {
        ensure_frames(frames, reference, target)?;
        self.wheel -= offset;

        let forward = frames
            .convert_direction_to(reference, Vec3::NEG_Z, target)
            .ok_or(SceneError::UnknownFrame(target))?;
        frames.translate(target, forward * (offset * -self.config.wheel_step));

        Ok(())
    }

    /// Rotates `target` by the arc between two points on the trackball, both
    /// given in normalized device coordinates. Returns `Ok(false)` when the
    /// arc is degenerate.
    pub fn rotate_frame(
        &self,
        frames: &mut FrameGraph,
        reference: FrameId,
        target: FrameId,
        current: Vec2,
        previous: Vec2,
    ) -> Result<bool> {
        ensure_frames(frames, reference, target)?;

        let to = project_on_sphere(current).normalize();
        let from = project_on_sphere(previous).normalize();

        let Some(axis) = from.cross(to).try_normalize() else {
            return Ok(false);
        };

        let angle = from.dot(to).clamp(-1.0, 1.0).acos() * self.config.rotation_sensitivity;

        let Some(axis) = frames
            .convert_direction_to(reference, axis, target)
            .and_then(Vec3::try_normalize)
        else {
            return Ok(false);
        };

        frames.rotate(target, axis, angle);
        Ok(true)
    }

    /// Slides `target` so that it follows the pointer in the reference's
    /// screen plane, scaled by the reference's distance to the target.
    pub fn translate_frame(
        &self,
        frames: &mut FrameGraph,
        reference: FrameId,
        target: FrameId,
        current: Vec2,
        previous: Vec2,
    ) -> Result<bool> {
        ensure_frames(frames, reference, target)?;

        let delta = (current - previous).extend(0.0);
        let (Some(direction), Some(depth), Some(origin)) = (
            frames.convert_direction_to(reference, delta, target),
            frames.convert_direction_to(reference, Vec3::Z, target),
            frames.convert_point_to(reference, Vec3::ZERO, target),
        ) else {
            return Err(SceneError::UnknownFrame(target));
        };

        let unit_depth = depth.length();
        let distance = origin.length();

        if unit_depth <= f32::EPSILON || direction == Vec3::ZERO {
            return Ok(false);
        }

        frames.translate(target, direction * (distance / unit_depth));
        Ok(true)
    }
}

fn ensure_frames(frames: &FrameGraph, reference: FrameId, target: FrameId) -> Result<()> {
    for id in [reference, target] {
        if !frames.contains(id) {
            return Err(SceneError::UnknownFrame(id));
        }
    }

    Ok(())
}
