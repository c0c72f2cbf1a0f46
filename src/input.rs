// Input routing: window events in, camera updates out

use glam::Vec2;
use winit::event::{ElementState, KeyEvent, MouseScrollDelta};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::camera::{Camera, CameraMovement};

/// Pixels of trackpad scroll treated as one wheel notch.
const PIXELS_PER_LINE: f32 = 20.0;

#[derive(Debug, Default, Clone, Copy)]
struct KeyboardState {
    w: bool,
    a: bool,
    s: bool,
    d: bool,
}

/// Continuous pointer input, kept in arrival order until the next frame.
#[derive(Debug, Clone, Copy, PartialEq)]
enum PointerEvent {
    Look { x_offset: f32, y_offset: f32 },
    Scroll { y_offset: f32 },
}

/// Collects window input between frames and hands it to the camera once
/// per frame.
#[derive(Debug)]
pub struct InputRouter {
    keys: KeyboardState,
    last_cursor: Vec2,
    /// False until the first cursor position or motion has been seen.
    initialized: bool,
    /// Set once raw device motion arrives; cursor positions then stop driving look.
    raw_motion: bool,
    pending: Vec<PointerEvent>,
    close_requested: bool,
}

impl InputRouter {
    /// `initial_cursor` is only a placeholder; the first cursor event reseeds it.
    pub fn new(initial_cursor: Vec2) -> Self {
        Self {
            keys: KeyboardState::default(),
            last_cursor: initial_cursor,
            initialized: false,
            raw_motion: false,
            pending: Vec::new(),
            close_requested: false,
        }
    }

    pub fn handle_keyboard_input(&mut self, event: &KeyEvent) {
        if let PhysicalKey::Code(keycode) = event.physical_key {
            self.set_key(keycode, event.state == ElementState::Pressed);
        }
    }

    pub fn set_key(&mut self, keycode: KeyCode, is_pressed: bool) {
        match keycode {
            KeyCode::KeyW => self.keys.w = is_pressed,
            KeyCode::KeyA => self.keys.a = is_pressed,
            KeyCode::KeyS => self.keys.s = is_pressed,
            KeyCode::KeyD => self.keys.d = is_pressed,
            KeyCode::Escape if is_pressed => self.close_requested = true,
            _ => {}
        }
    }

    /// Release every held key, e.g. when the window loses focus and the
    /// matching key releases will never be delivered.
    pub fn release_keys(&mut self) {
        self.keys = KeyboardState::default();
    }

    /// Record an absolute cursor position. The y offset is reversed since
    /// window y grows downwards. Ignored for look once raw motion is flowing.
    pub fn cursor_moved(&mut self, x: f32, y: f32) {
        let position = Vec2::new(x, y);
        if !self.initialized {
            self.last_cursor = position;
            self.initialized = true;
        }

        let x_offset = position.x - self.last_cursor.x;
        let y_offset = self.last_cursor.y - position.y;
        self.last_cursor = position;

        if !self.raw_motion {
            self.pending.push(PointerEvent::Look { x_offset, y_offset });
        }
    }

    /// Record relative mouse motion from the device. Unlike cursor positions
    /// this keeps flowing while the cursor is locked. The first motion only
    /// initializes the router.
    pub fn mouse_motion(&mut self, dx: f32, dy: f32) {
        self.raw_motion = true;
        if !self.initialized {
            self.initialized = true;
            return;
        }
        self.pending.push(PointerEvent::Look {
            x_offset: dx,
            y_offset: -dy,
        });
    }

    pub fn scrolled(&mut self, delta: MouseScrollDelta) {
        let y_offset = match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(position) => position.y as f32 / PIXELS_PER_LINE,
        };
        self.pending.push(PointerEvent::Scroll { y_offset });
    }

    pub fn request_close(&mut self) {
        self.close_requested = true;
    }

    pub fn close_requested(&self) -> bool {
        self.close_requested
    }

    #[cfg(test)]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Apply everything gathered since the last frame: pointer events in
    /// arrival order, then held movement keys scaled by `delta_time`.
    pub fn dispatch(&mut self, camera: &mut Camera, delta_time: f32) {
        for event in self.pending.drain(..) {
            match event {
                PointerEvent::Look { x_offset, y_offset } => {
                    camera.process_mouse_movement(x_offset, y_offset, true)
                }
                PointerEvent::Scroll { y_offset } => camera.process_mouse_scroll(y_offset),
            }
        }

        if self.keys.w {
            camera.process_keyboard(CameraMovement::Forward, delta_time);
        }
        if self.keys.s {
            camera.process_keyboard(CameraMovement::Backward, delta_time);
        }
        if self.keys.a {
            camera.process_keyboard(CameraMovement::Left, delta_time);
        }
        if self.keys.d {
            camera.process_keyboard(CameraMovement::Right, delta_time);
        }
    }
}
