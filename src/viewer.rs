use glam::{Vec2, Vec3};

use crate::config::ViewerConfig;
use crate::error::Result;
use crate::material::DrawCommand;
use crate::scene_graph::{NodeCollector, Scene};
use crate::trackball::{PointerButton, TrackballController};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Forward,
    Backward,
    Left,
    Right,
    ToggleTrackball,
    ToggleInterface,
    Quit,
}

/// Platform-independent input, as fed by the window layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Pointer position in window pixels, origin top-left.
    PointerMoved(Vec2),
    Button { button: PointerButton, pressed: bool },
    /// Vertical wheel offset, positive away from the user.
    Scroll(f32),
    Key { key: Key, pressed: bool },
    Resized { width: u32, height: u32 },
}

#[derive(Debug, Default, Clone, Copy)]
struct Movement {
    forward: bool,
    backward: bool,
    left: bool,
    right: bool,
}

impl Movement {
    /// Camera-local displacement for one tick. Forward wins over backward
    /// and right over left.
    fn direction(&self) -> Vec3 {
        let z = if self.forward {
            -1.0
        } else if self.backward {
            1.0
        } else {
            0.0
        };

        let x = if self.right {
            1.0
        } else if self.left {
            -1.0
        } else {
            0.0
        };

        Vec3::new(x, 0.0, z)
    }
}

/// Drives a [`Scene`] from input events: trackball manipulation, keyboard
/// camera motion, per-tick animation and draw list collection.
pub struct Viewer {
    config: ViewerConfig,
    scene: Scene,
    trackball: TrackballController,
    collector: NodeCollector,
    pointer: Vec2,
    movement: Movement,
    trackball_enabled: bool,
    show_interface: bool,
    quit_requested: bool,
}

impl Viewer {
    pub fn new(config: ViewerConfig) -> Result<Self> {
        let mut scene = Scene::new(config.width, config.height, &config.projection)?;

        let (camera, frames) = scene.camera_and_frames_mut();
        camera.look_at(frames, Vec3::ZERO, config.camera_eye, Vec3::Y);

        let trackball = TrackballController::new(config.trackball.clone(), config.width, config.height);
        let pointer = Vec2::new(config.width as f32, config.height as f32) * 0.5;

        log::info!(
            "Viewer \"{}\" started at {}x{}",
            config.title,
            config.width,
            config.height
        );

        Ok(Self {
            config,
            scene,
            trackball,
            collector: NodeCollector::new(),
            pointer,
            movement: Movement::default(),
            trackball_enabled: true,
            show_interface: true,
            quit_requested: false,
        })
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn trackball(&self) -> &TrackballController {
        &self.trackball
    }

    pub fn trackball_enabled(&self) -> bool {
        self.trackball_enabled
    }

    pub fn interface_visible(&self) -> bool {
        self.show_interface
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn handle_event(&mut self, event: InputEvent) -> Result<()> {
        match event {
            InputEvent::PointerMoved(position) => {
                self.pointer = position;

                if self.trackball_enabled {
                    let reference = self.scene.camera().frame();
                    let target = self.scene.manipulated_frame()?;
                    self.trackball
                        .pointer_moved(self.scene.frames_mut(), reference, target, position)?;
                }
            }
            InputEvent::Button { button, pressed } => {
                if self.trackball_enabled {
                    if pressed {
                        self.trackball.button_pressed(button, self.pointer);
                    } else {
                        self.trackball.button_released(button, self.pointer);
                    }
                }
            }
            InputEvent::Scroll(offset) => {
                let reference = self.scene.camera().frame();
                let target = self.scene.manipulated_frame()?;
                self.trackball
                    .scrolled(self.scene.frames_mut(), reference, target, offset)?;
            }
            InputEvent::Key { key, pressed } => self.handle_key(key, pressed),
            InputEvent::Resized { width, height } => self.on_window_resize(width, height)?,
        }

        Ok(())
    }

    fn handle_key(&mut self, key: Key, pressed: bool) {
        match key {
            Key::Forward => self.movement.forward = pressed,
            Key::Backward => self.movement.backward = pressed,
            Key::Left => self.movement.left = pressed,
            Key::Right => self.movement.right = pressed,
            Key::ToggleTrackball if pressed => {
                self.trackball_enabled = !self.trackball_enabled;
                log::debug!("Trackball {}", if self.trackball_enabled { "enabled" } else { "disabled" });
            }
            Key::ToggleInterface if pressed => self.show_interface = !self.show_interface,
            Key::Quit if pressed => {
                log::info!("Quit requested");
                self.quit_requested = true;
            }
            _ => {}
        }
    }

    /// Advances the scene by `elapsed_ms`: material animation, keyboard
    /// camera motion, then the camera flush. Returns whether the camera
    /// buffer needs uploading.
    pub fn tick(&mut self, elapsed_ms: f32) -> Result<bool> {
        self.scene.camera_mut().set_update(false);

        self.collector.collect(&self.scene, self.scene.root());
        self.scene.animate(self.collector.nodes(), elapsed_ms);

        let step = self.movement.direction() * self.config.camera_speed;
        if step != Vec3::ZERO {
            let camera_frame = self.scene.camera().frame();
            self.scene.frames_mut().translate(camera_frame, step);
        }

        self.scene.flush_camera()
    }

    /// Draw list for the current state, in collection order. Change flags
    /// are cleared afterwards, so `model_changed` covers everything since the
    /// previous call.
    pub fn render(&mut self) -> Result<Vec<DrawCommand>> {
        self.collector.collect(&self.scene, self.scene.root());
        let draws = self.scene.render(self.collector.nodes())?;
        self.scene.frames().reset_changed_flags();
        Ok(draws)
    }

    /// Status lines for the debug overlay; empty while the overlay is hidden.
    pub fn interface_lines(&mut self) -> Vec<String> {
        if !self.show_interface {
            return Vec::new();
        }

        self.collector.collect(&self.scene, self.scene.root());

        let mut lines = vec![format!(
            "Manipulate object trackball: {}",
            if self.trackball_enabled { "on" } else { "off" }
        )];
        lines.extend(self.scene.display_interface(self.collector.nodes()));
        lines
    }

    /// Zero sizes (minimised windows) are ignored.
    pub fn on_window_resize(&mut self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            return Ok(());
        }

        log::debug!("Resizing viewport to {}x{}", width, height);

        self.config.width = width;
        self.config.height = height;
        self.trackball.resize(width, height);
        self.scene.resize_viewport(width, height);

        let projection = &self.config.projection;
        self.scene.camera_mut().set_perspective_projection(
            projection.half_fov_degrees,
            width as f32 / height as f32,
            projection.near,
            projection.far,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::RotationMaterial;
    use glam::Quat;

    fn viewer() -> Viewer {
        Viewer::new(ViewerConfig::default()).unwrap()
    }

    #[test]
    fn camera_starts_at_configured_eye() {
        let viewer = viewer();
        let camera_frame = viewer.scene().camera().frame();
        let position = viewer.scene().frames().world_position(camera_frame).unwrap();
        assert!(position.abs_diff_eq(Vec3::new(0.0, 0.0, 5.0), 1e-5));
    }

    #[test]
    fn held_forward_key_moves_camera_each_tick() {
        let mut viewer = viewer();
        viewer
            .handle_event(InputEvent::Key { key: Key::Forward, pressed: true })
            .unwrap();

        viewer.tick(16.0).unwrap();
        viewer.tick(16.0).unwrap();
        viewer
            .handle_event(InputEvent::Key { key: Key::Forward, pressed: false })
            .unwrap();
        viewer.tick(16.0).unwrap();

        let camera_frame = viewer.scene().camera().frame();
        let position = viewer.scene().frames().world_position(camera_frame).unwrap();
        assert!(position.abs_diff_eq(Vec3::new(0.0, 0.0, 3.0), 1e-5));
    }

    #[test]
    fn tick_flushes_camera_only_on_change() {
        let mut viewer = viewer();
        assert!(viewer.tick(16.0).unwrap());
        assert!(!viewer.tick(16.0).unwrap());

        viewer
            .handle_event(InputEvent::Key { key: Key::Right, pressed: true })
            .unwrap();
        assert!(viewer.tick(16.0).unwrap());
        assert!(viewer.scene().camera().update_needed());
    }

    #[test]
    fn tick_animates_materials() {
        let mut viewer = viewer();
        let scene = viewer.scene_mut();
        let scene_node = scene.scene_node();
        let spinner = scene.add_node("spinner");
        scene.adopt(scene_node, spinner).unwrap();
        let material = scene.add_material(Box::new(RotationMaterial::new("Rotation")));
        scene.set_material(spinner, material).unwrap();

        viewer.tick(1000.0).unwrap();

        let frame = viewer.scene().node_frame(spinner).unwrap();
        let rotation = viewer.scene().frames().transform(frame).unwrap().rotation();
        assert!(rotation.abs_diff_eq(Quat::from_rotation_y(1.0), 1e-5));
    }

    #[test]
    fn disabled_trackball_ignores_drags() {
        let mut viewer = viewer();
        viewer
            .handle_event(InputEvent::Key { key: Key::ToggleTrackball, pressed: true })
            .unwrap();
        assert!(!viewer.trackball_enabled());

        let events = [
            InputEvent::PointerMoved(Vec2::new(512.0, 512.0)),
            InputEvent::Button { button: PointerButton::Primary, pressed: true },
            InputEvent::PointerMoved(Vec2::new(700.0, 512.0)),
        ];
        for event in events {
            viewer.handle_event(event).unwrap();
        }

        let target = viewer.scene().manipulated_frame().unwrap();
        let rotation = viewer.scene().frames().transform(target).unwrap().rotation();
        assert_eq!(rotation, Quat::IDENTITY);
    }

    #[test]
    fn drag_rotates_manipulated_node() {
        let mut viewer = viewer();
        let events = [
            InputEvent::PointerMoved(Vec2::new(512.0, 512.0)),
            InputEvent::Button { button: PointerButton::Primary, pressed: true },
            InputEvent::PointerMoved(Vec2::new(600.0, 512.0)),
            InputEvent::Button { button: PointerButton::Primary, pressed: false },
        ];
        for event in events {
            viewer.handle_event(event).unwrap();
        }

        let target = viewer.scene().manipulated_frame().unwrap();
        let rotation = viewer.scene().frames().transform(target).unwrap().rotation();
        let (axis, angle) = rotation.to_axis_angle();
        assert!(angle > 0.0);
        assert!(axis.abs_diff_eq(Vec3::Y, 1e-4));
    }

    #[test]
    fn resize_updates_aspect_and_ignores_zero() {
        let mut viewer = viewer();
        viewer
            .handle_event(InputEvent::Resized { width: 1600, height: 900 })
            .unwrap();
        assert!((viewer.scene().camera().aspect_ratio() - 16.0 / 9.0).abs() < 1e-6);

        viewer.on_window_resize(0, 900).unwrap();
        assert_eq!(viewer.scene().viewport(), glam::UVec2::new(1600, 900));
    }

    #[test]
    fn drags_normalize_against_resized_viewport() {
        let mut viewer = viewer();
        viewer.on_window_resize(2048, 2048).unwrap();

        let events = [
            InputEvent::PointerMoved(Vec2::new(1024.0, 1024.0)),
            InputEvent::Button { button: PointerButton::Secondary, pressed: true },
            InputEvent::PointerMoved(Vec2::new(1126.4, 1024.0)),
        ];
        for event in events {
            viewer.handle_event(event).unwrap();
        }

        let target = viewer.scene().manipulated_frame().unwrap();
        let position = viewer.scene().frames().world_position(target).unwrap();
        assert!(position.abs_diff_eq(Vec3::new(0.5, 0.0, 0.0), 1e-3));
    }

    #[test]
    fn pointer_input_survives_removal_of_manipulated_node() {
        let mut viewer = viewer();
        let scene = viewer.scene_mut();
        let loose = scene.add_node("loose");
        scene.set_manipulated_node(loose).unwrap();
        let scene_node = scene.scene_node();
        assert!(scene.remove_node(scene_node).is_err());
        scene.remove_node(loose).unwrap();

        viewer
            .handle_event(InputEvent::PointerMoved(Vec2::new(300.0, 200.0)))
            .unwrap();
        viewer.handle_event(InputEvent::Scroll(1.0)).unwrap();
    }

    #[test]
    fn only_moved_nodes_are_flagged_as_changed() {
        let mut viewer = viewer();
        let scene = viewer.scene_mut();
        let scene_node = scene.scene_node();
        let still = scene.add_node("still");
        let spinner = scene.add_node("spinner");
        scene.adopt(scene_node, still).unwrap();
        scene.adopt(scene_node, spinner).unwrap();
        let base = scene.add_material(Box::new(crate::material::BaseMaterial::new("Base")));
        let rotation = scene.add_material(Box::new(RotationMaterial::new("Rotation")));
        scene.set_material(still, base).unwrap();
        scene.set_material(spinner, rotation).unwrap();

        let spinner_child = scene.add_node("spinner child");
        scene.adopt(spinner, spinner_child).unwrap();
        scene.set_material(spinner_child, base).unwrap();

        let first = viewer.render().unwrap();
        assert!(first.iter().all(|draw| draw.model_changed));

        viewer.tick(100.0).unwrap();
        let second = viewer.render().unwrap();
        let changed: Vec<_> = second
            .iter()
            .map(|draw| (draw.node, draw.model_changed))
            .collect();
        assert_eq!(changed, vec![(still, false), (spinner_child, true)]);
    }

    #[test]
    fn moves_between_frames_are_reported_once() {
        let mut viewer = viewer();
        let scene = viewer.scene_mut();
        let scene_node = scene.scene_node();
        let item = scene.add_node("item");
        scene.adopt(scene_node, item).unwrap();
        let base = scene.add_material(Box::new(crate::material::BaseMaterial::new("Base")));
        scene.set_material(item, base).unwrap();
        viewer.render().unwrap();

        // A scroll reads the manipulated frame before the next tick.
        viewer.handle_event(InputEvent::Scroll(1.0)).unwrap();
        viewer.handle_event(InputEvent::Scroll(1.0)).unwrap();
        viewer.tick(16.0).unwrap();
        assert!(viewer.render().unwrap()[0].model_changed);

        viewer.tick(16.0).unwrap();
        assert!(!viewer.render().unwrap()[0].model_changed);
    }

    #[test]
    fn quit_and_interface_toggles() {
        let mut viewer = viewer();
        assert!(!viewer.interface_lines().is_empty());

        viewer
            .handle_event(InputEvent::Key { key: Key::ToggleInterface, pressed: true })
            .unwrap();
        assert!(viewer.interface_lines().is_empty());

        viewer
            .handle_event(InputEvent::Key { key: Key::Quit, pressed: true })
            .unwrap();
        assert!(viewer.quit_requested());
    }
}
