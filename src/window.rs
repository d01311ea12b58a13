use std::time::Instant;

use anyhow::Context;
use glam::Vec2;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use framegraph::{
    config::ViewerConfig,
    demo,
    trackball::PointerButton,
    viewer::{InputEvent, Key, Viewer},
};

const PIXELS_PER_WHEEL_LINE: f32 = 40.0;

struct App {
    window: Option<Window>,
    viewer: Viewer,
    last_frame: Instant,
    error: Option<anyhow::Error>,
}

impl App {
    fn new(viewer: Viewer) -> Self {
        Self {
            window: None,
            viewer,
            last_frame: Instant::now(),
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{:#}", error);
        self.error = Some(error);
        event_loop.exit();
    }

    fn redraw(&mut self) -> anyhow::Result<()> {
        let now = Instant::now();
        let elapsed_ms = now.duration_since(self.last_frame).as_secs_f32() * 1000.0;
        self.last_frame = now;

        let camera_changed = self.viewer.tick(elapsed_ms).context("Error during tick")?;
        let draws = self.viewer.render().context("Error during render")?;

        if camera_changed {
            log::trace!(
                "Camera uniform changed ({} bytes)",
                self.viewer.scene().camera().uniform_bytes().len()
            );
        }
        log::trace!("{} draws", draws.len());

        for line in self.viewer.interface_lines() {
            log::trace!("{}", line);
        }

        Ok(())
    }
}

fn map_button(button: MouseButton) -> PointerButton {
    match button {
        MouseButton::Left => PointerButton::Primary,
        MouseButton::Right => PointerButton::Secondary,
        MouseButton::Middle => PointerButton::Middle,
        MouseButton::Back => PointerButton::Other(3),
        MouseButton::Forward => PointerButton::Other(4),
        MouseButton::Other(other) => PointerButton::Other(other),
    }
}

fn map_key(event: &KeyEvent) -> Option<Key> {
    let PhysicalKey::Code(code) = event.physical_key else {
        return None;
    };

    match code {
        KeyCode::KeyW => Some(Key::Forward),
        KeyCode::KeyS => Some(Key::Backward),
        KeyCode::KeyA => Some(Key::Left),
        KeyCode::KeyD => Some(Key::Right),
        KeyCode::Space => Some(Key::ToggleTrackball),
        KeyCode::Tab => Some(Key::ToggleInterface),
        KeyCode::Escape => Some(Key::Quit),
        _ => None,
    }
}

fn map_event(event: &WindowEvent) -> Option<InputEvent> {
    match event {
        WindowEvent::Resized(size) => Some(InputEvent::Resized {
            width: size.width,
            height: size.height,
        }),
        WindowEvent::CursorMoved { position, .. } => Some(InputEvent::PointerMoved(Vec2::new(
            position.x as f32,
            position.y as f32,
        ))),
        WindowEvent::MouseInput { state, button, .. } => Some(InputEvent::Button {
            button: map_button(*button),
            pressed: *state == ElementState::Pressed,
        }),
        WindowEvent::MouseWheel { delta, .. } => {
            let offset = match delta {
                MouseScrollDelta::LineDelta(_, y) => *y,
                MouseScrollDelta::PixelDelta(position) => position.y as f32 / PIXELS_PER_WHEEL_LINE,
            };
            Some(InputEvent::Scroll(offset))
        }
        WindowEvent::KeyboardInput { event, .. } if !event.repeat => {
            map_key(event).map(|key| InputEvent::Key {
                key,
                pressed: event.state.is_pressed(),
            })
        }
        _ => None,
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let config = self.viewer.config();
        let attributes = Window::default_attributes()
            .with_title(config.title.clone())
            .with_inner_size(LogicalSize::new(config.width, config.height));

        match event_loop.create_window(attributes) {
            Ok(window) => {
                // Pointer events arrive in physical pixels.
                let size = window.inner_size();
                if let Err(error) = self.viewer.on_window_resize(size.width, size.height) {
                    self.fail(event_loop, anyhow::Error::new(error).context("Failed to size viewer"));
                    return;
                }

                window.request_redraw();
                self.window = Some(window);
            }
            Err(error) => self.fail(event_loop, anyhow::Error::new(error).context("Failed to create window")),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
                return;
            }
            WindowEvent::RedrawRequested => {
                if let Err(error) = self.redraw() {
                    self.fail(event_loop, error);
                    return;
                }

                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }

        if let Some(input) = map_event(&event) {
            if let Err(error) = self.viewer.handle_event(input) {
                self.fail(event_loop, anyhow::Error::new(error).context("Error handling input"));
                return;
            }
        }

        if self.viewer.quit_requested() {
            event_loop.exit();
        }
    }
}

pub fn run(config: ViewerConfig) -> anyhow::Result<()> {
    let event_loop = EventLoop::new().context("Failed to create event loop")?;

    let mut viewer = Viewer::new(config).context("Failed to create viewer")?;
    demo::build_scene(viewer.scene_mut()).context("Failed to build demo scene")?;

    let mut app = App::new(viewer);
    event_loop.run_app(&mut app)?;

    log::info!("Viewer stopped");

    match app.error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
