// Math utilities for Penguin World

use glam::{Mat3, Mat4, Vec3};

/// Placement of a scene object, composed as translate · scale · rotate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub scale: Vec3,
    pub rotation_axis: Vec3,
    /// Angle handed to the rotation as-is, in radians.
    pub rotation_angle: f32,
}

impl Transform {
    pub fn new(translation: Vec3, scale: Vec3, rotation_axis: Vec3, rotation_angle: f32) -> Self {
        Self {
            translation,
            scale,
            rotation_axis,
            rotation_angle,
        }
    }

    pub fn identity() -> Self {
        Self {
            translation: Vec3::ZERO,
            scale: Vec3::ONE,
            rotation_axis: Vec3::Y,
            rotation_angle: 0.0,
        }
    }

    /// Generate the model matrix: `T * S * R`, so the rotation is applied to
    /// the vertices first and the translation last.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.translation)
            * Mat4::from_scale(self.scale)
            * Mat4::from_axis_angle(self.rotation_axis.normalize_or_zero(), self.rotation_angle)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Rotation angle for a whole-degree literal as the scene applies it:
/// reduced modulo 360 and then used directly as radians, with no unit
/// conversion. A literal 90 therefore rotates by 90 rad, not a quarter turn.
pub fn wrapped_degrees_as_radians(degrees: i32) -> f32 {
    (degrees % 360) as f32
}

/// Strip the translation from a view matrix, keeping its upper 3x3.
pub fn rotation_only(view: Mat4) -> Mat4 {
    Mat4::from_mat3(Mat3::from_mat4(view))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::Vec4;

    #[test]
    fn identity_matrix() {
        assert_eq!(Transform::identity().matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn composition_is_translate_scale_rotate() {
        let transform = Transform::new(
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(2.0, 1.0, 1.0),
            Vec3::Y,
            std::f32::consts::FRAC_PI_2,
        );
        // +Z rotates onto +X, is then stretched by the x scale, then moved
        let p = transform.matrix().transform_point3(Vec3::Z);
        assert_relative_eq!(p.x, 12.0, epsilon = 1e-5);
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(p.z, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn literal_angles_are_not_converted_from_degrees() {
        assert_eq!(wrapped_degrees_as_radians(90), 90.0);
        assert_eq!(wrapped_degrees_as_radians(20), 20.0);
        assert_eq!(wrapped_degrees_as_radians(0), 0.0);
        assert_eq!(wrapped_degrees_as_radians(450), 90.0);

        // a "90 degree" rotation is 90 radians, which is not a quarter turn
        let turned = Transform::new(Vec3::ZERO, Vec3::ONE, Vec3::Y, wrapped_degrees_as_radians(90));
        let p = turned.matrix().transform_point3(Vec3::Z);
        assert_relative_eq!(p.x, 90.0_f32.sin(), epsilon = 1e-5);
        assert_relative_eq!(p.z, 90.0_f32.cos(), epsilon = 1e-5);
        assert!(p.z.abs() > 0.4);
    }

    #[test]
    fn rotation_only_drops_translation() {
        let view = Mat4::look_at_rh(Vec3::new(4.0, -2.0, 9.0), Vec3::new(1.0, 1.0, 1.0), Vec3::Y);
        let stripped = rotation_only(view);
        assert_eq!(stripped.w_axis, Vec4::W);
        assert_eq!(stripped.x_axis.truncate(), view.x_axis.truncate());
        assert_eq!(stripped.y_axis.truncate(), view.y_axis.truncate());
        assert_eq!(stripped.z_axis.truncate(), view.z_axis.truncate());
    }
}
