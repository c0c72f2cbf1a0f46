// Free-fly camera for Penguin World

use glam::{Mat4, Vec3};

use crate::config::CameraConfig;

/// Lower bound of the field of view, in degrees.
pub const MIN_ZOOM: f32 = 1.0;
/// Upper bound of the field of view, in degrees.
pub const MAX_ZOOM: f32 = 45.0;
/// Pitch limit applied when pitch is constrained, in degrees.
pub const PITCH_LIMIT: f32 = 89.0;

/// Movement directions understood by [`Camera::process_keyboard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMovement {
    Forward,
    Backward,
    Left,
    Right,
}

/// Euler-angle camera that flies through the scene.
///
/// `front`, `right` and `up` are derived from `yaw`/`pitch` and are refreshed
/// by every operation that touches the angles, so they always form an
/// orthonormal basis.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    world_up: Vec3,
    yaw: f32,
    pitch: f32,
    front: Vec3,
    right: Vec3,
    up: Vec3,
    zoom: f32,
    pub movement_speed: f32,
    pub mouse_sensitivity: f32,
}

impl Camera {
    /// Create a camera at `position` looking along the direction given by
    /// `yaw`/`pitch` (degrees).
    pub fn new(position: Vec3, yaw: f32, pitch: f32) -> Self {
        let mut camera = Self {
            position,
            world_up: Vec3::Y,
            yaw,
            pitch: pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT),
            front: Vec3::NEG_Z,
            right: Vec3::X,
            up: Vec3::Y,
            zoom: MAX_ZOOM,
            movement_speed: 2.5,
            mouse_sensitivity: 0.1,
        };
        camera.update_vectors();
        camera
    }

    pub fn from_config(config: &CameraConfig) -> Self {
        let mut camera = Self::new(Vec3::from_array(config.position), config.yaw, config.pitch);
        camera.movement_speed = config.speed;
        camera.mouse_sensitivity = config.sensitivity;
        camera.zoom = config.zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        camera
    }

    #[cfg(test)]
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    #[cfg(test)]
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    #[cfg(test)]
    pub fn front(&self) -> Vec3 {
        self.front
    }

    #[cfg(test)]
    pub fn right(&self) -> Vec3 {
        self.right
    }

    #[cfg(test)]
    pub fn up(&self) -> Vec3 {
        self.up
    }

    /// Field of view in degrees, always within `[MIN_ZOOM, MAX_ZOOM]`.
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Look-at matrix from `position` towards `position + front`.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    /// Moves along the front/right axes by `movement_speed * delta_time`.
    pub fn process_keyboard(&mut self, direction: CameraMovement, delta_time: f32) {
        let velocity = self.movement_speed * delta_time;
        match direction {
            CameraMovement::Forward => self.position += self.front * velocity,
            CameraMovement::Backward => self.position -= self.front * velocity,
            CameraMovement::Left => self.position -= self.right * velocity,
            CameraMovement::Right => self.position += self.right * velocity,
        }
    }

    pub fn process_mouse_movement(&mut self, x_offset: f32, y_offset: f32, constrain_pitch: bool) {
        self.yaw += x_offset * self.mouse_sensitivity;
        self.pitch += y_offset * self.mouse_sensitivity;

        // Keep the view from flipping over the poles
        if constrain_pitch {
            self.pitch = self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        }

        self.update_vectors();
    }

    /// Scrolling narrows or widens the field of view; it never moves the camera.
    pub fn process_mouse_scroll(&mut self, y_offset: f32) {
        self.zoom = (self.zoom - y_offset).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.front = Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize();
        self.right = self.front.cross(self.world_up).normalize();
        self.up = self.right.cross(self.front).normalize();
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_orthonormal(camera: &Camera) {
        let (f, r, u) = (camera.front(), camera.right(), camera.up());
        assert_relative_eq!(f.dot(r), 0.0, epsilon = 1e-5);
        assert_relative_eq!(f.dot(u), 0.0, epsilon = 1e-5);
        assert_relative_eq!(r.dot(u), 0.0, epsilon = 1e-5);
        assert_relative_eq!(f.length(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(r.length(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(u.length(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn default_camera_looks_down_negative_z() {
        let camera = Camera::default();
        assert_eq!(camera.position, Vec3::new(0.0, 0.0, 3.0));
        assert_relative_eq!(camera.front().x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(camera.front().z, -1.0, epsilon = 1e-6);
        assert_relative_eq!(camera.zoom(), 45.0);
        assert_orthonormal(&camera);
    }

    #[test]
    fn zero_delta_time_does_not_move() {
        let mut camera = Camera::default();
        let start = camera.position;
        for direction in [
            CameraMovement::Forward,
            CameraMovement::Backward,
            CameraMovement::Left,
            CameraMovement::Right,
        ] {
            camera.process_keyboard(direction, 0.0);
        }
        assert_eq!(camera.position, start);
    }

    #[test]
    fn movement_is_linear_in_delta_time() {
        let mut once = Camera::default();
        once.process_keyboard(CameraMovement::Forward, 0.5);

        let mut split = Camera::default();
        split.process_keyboard(CameraMovement::Forward, 0.25);
        split.process_keyboard(CameraMovement::Forward, 0.25);

        assert_relative_eq!(once.position.z, split.position.z, epsilon = 1e-6);
        assert_relative_eq!(once.position.z, 3.0 - 2.5 * 0.5, epsilon = 1e-6);
    }

    #[test]
    fn opposite_directions_cancel() {
        let mut camera = Camera::default();
        camera.process_mouse_movement(123.0, -40.0, true);
        let start = camera.position;
        camera.process_keyboard(CameraMovement::Left, 0.3);
        camera.process_keyboard(CameraMovement::Right, 0.3);
        camera.process_keyboard(CameraMovement::Forward, 0.7);
        camera.process_keyboard(CameraMovement::Backward, 0.7);
        assert_relative_eq!(camera.position.x, start.x, epsilon = 1e-5);
        assert_relative_eq!(camera.position.y, start.y, epsilon = 1e-5);
        assert_relative_eq!(camera.position.z, start.z, epsilon = 1e-5);
    }

    #[test]
    fn strafing_follows_right_vector() {
        let mut camera = Camera::default();
        camera.process_keyboard(CameraMovement::Right, 1.0);
        assert_relative_eq!(camera.position.x, 2.5, epsilon = 1e-5);
        assert_relative_eq!(camera.position.z, 3.0, epsilon = 1e-5);
    }

    #[test]
    fn pitch_is_clamped_and_basis_stays_orthonormal() {
        let mut camera = Camera::default();
        for step in [500.0, 2000.0, -7000.0, 13.0, -0.5, 9999.0] {
            camera.process_mouse_movement(step * 0.37, step, true);
            assert!(camera.pitch() <= PITCH_LIMIT && camera.pitch() >= -PITCH_LIMIT);
            assert_orthonormal(&camera);
        }
        assert_relative_eq!(camera.pitch(), PITCH_LIMIT);
    }

    #[test]
    fn unconstrained_pitch_is_not_clamped() {
        let mut camera = Camera::default();
        camera.process_mouse_movement(0.0, 1000.0, false);
        assert_relative_eq!(camera.pitch(), 100.0, epsilon = 1e-4);
    }

    #[test]
    fn mouse_offsets_are_scaled_by_sensitivity() {
        let mut camera = Camera::default();
        camera.process_mouse_movement(100.0, 50.0, true);
        assert_relative_eq!(camera.yaw(), -90.0 + 10.0, epsilon = 1e-4);
        assert_relative_eq!(camera.pitch(), 5.0, epsilon = 1e-4);
    }

    #[test]
    fn zoom_is_clamped_for_any_scroll() {
        let mut camera = Camera::default();
        camera.process_mouse_scroll(-1000.0);
        assert_relative_eq!(camera.zoom(), MAX_ZOOM);
        camera.process_mouse_scroll(1.0e6);
        assert_relative_eq!(camera.zoom(), MIN_ZOOM);
        camera.process_mouse_scroll(-10.5);
        assert_relative_eq!(camera.zoom(), 11.5);

        // clamping an in-range value again changes nothing
        let before = camera.zoom();
        camera.process_mouse_scroll(0.0);
        assert_relative_eq!(camera.zoom(), before);
    }

    #[test]
    fn view_matrix_moves_world_opposite_to_camera() {
        let camera = Camera::default();
        let view = camera.view_matrix();
        let origin = view.transform_point3(Vec3::ZERO);
        assert_relative_eq!(origin.z, -3.0, epsilon = 1e-5);

        let eye = view.transform_point3(camera.position);
        assert_relative_eq!(eye.length(), 0.0, epsilon = 1e-5);
    }
}
