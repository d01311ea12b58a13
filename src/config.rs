use glam::Vec3;

#[derive(Debug, Clone)]
pub struct TrackballConfig {
    /// Multiplier applied to the arc angle swept on the virtual sphere.
    pub rotation_sensitivity: f32,
    /// Pointer motion (in normalized device units) below which rotation is skipped.
    pub min_rotation_motion: f32,
    /// Distance travelled along the view axis per wheel notch.
    pub wheel_step: f32,
}

impl Default for TrackballConfig {
    fn default() -> Self {
        Self {
            rotation_sensitivity: std::f32::consts::PI,
            min_rotation_motion: 0.001,
            wheel_step: 0.5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProjectionConfig {
    pub half_fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            half_fov_degrees: 45.0,
            near: 1.0,
            far: 2000.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Distance the camera travels per tick while a movement key is held.
    pub camera_speed: f32,
    pub camera_eye: Vec3,
    pub trackball: TrackballConfig,
    pub projection: ProjectionConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: String::from("framegraph"),
            width: 1024,
            height: 1024,
            camera_speed: 1.0,
            camera_eye: Vec3::new(0.0, 0.0, 5.0),
            trackball: TrackballConfig::default(),
            projection: ProjectionConfig::default(),
        }
    }
}

impl ViewerConfig {
    pub const WIDTH_VAR: &'static str = "FRAMEGRAPH_WIDTH";
    pub const HEIGHT_VAR: &'static str = "FRAMEGRAPH_HEIGHT";

    /// Defaults, with the window size overridable from the environment.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(width) = read_dimension(Self::WIDTH_VAR) {
            config.width = width;
        }

        if let Some(height) = read_dimension(Self::HEIGHT_VAR) {
            config.height = height;
        }

        config
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

fn read_dimension(var: &str) -> Option<u32> {
    let value = std::env::var(var).ok()?;

    match value.trim().parse::<u32>() {
        Ok(dimension) if dimension > 0 => Some(dimension),
        _ => {
            log::warn!("Ignoring {}={:?}, expected a positive integer", var, value);
            None
        }
    }
}
