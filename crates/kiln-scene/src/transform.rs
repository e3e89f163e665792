//! Per-object placement record.

use glam::{Mat4, Vec3};

/// Position, rotation (radians, per axis) and scale of one renderable object.
///
/// Fields are independent and never normalized. Scale components should stay
/// positive for a non-degenerate transform; see [`Transform::is_degenerate`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn new(position: Vec3, rotation: Vec3, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Model matrix composed as scale, then rotate X, then Y, then Z, then
    /// translate.
    ///
    /// Column-vector form: `T * Rz * Ry * Rx * S`. The order is fixed; editors
    /// rely on rotations always being applied about the object's own origin
    /// after scaling.
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_rotation_z(self.rotation.z)
            * Mat4::from_rotation_y(self.rotation.y)
            * Mat4::from_rotation_x(self.rotation.x)
            * Mat4::from_scale(self.scale)
    }

    /// True if any scale component is not strictly positive or any field is
    /// not finite.
    pub fn is_degenerate(&self) -> bool {
        !(self.position.is_finite() && self.rotation.is_finite() && self.scale.is_finite())
            || self.scale.min_element() <= 0.0
    }
}
