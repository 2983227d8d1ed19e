use crate::{AxisAngle, Vector3};
use glam::Mat4;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform3D {
    pub position: Vector3,
    pub scale: Vector3,
    pub rotation: AxisAngle,
}

impl Transform3D {
    pub const IDENTITY: Self = Self {
        position: Vector3::ZERO,
        scale: Vector3::ONE,
        rotation: AxisAngle::IDENTITY,
    };

    #[inline]
    pub const fn new(pos: Vector3, rot: AxisAngle, scale: Vector3) -> Self {
        Self {
            position: pos,
            scale,
            rotation: rot,
        }
    }

    #[inline]
    pub const fn from_position(pos: Vector3) -> Self {
        Self {
            position: pos,
            scale: Vector3::ONE,
            rotation: AxisAngle::IDENTITY,
        }
    }

    /// Convert to a Mat4 for transformations (TRS order)
    #[inline]
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            self.scale.into(),
            self.rotation.to_quat(),
            self.position.into(),
        )
    }

    /// Create from a Mat4 (extracts TRS components)
    #[inline]
    pub fn from_mat4(mat: Mat4) -> Self {
        let (scale, rotation, position) = mat.to_scale_rotation_translation();

        Self {
            position: position.into(),
            scale: scale.into(),
            rotation: rotation.into(),
        }
    }

    /// Transform a point by this TRS
    #[inline]
    pub fn transform_point(&self, p: Vector3) -> Vector3 {
        self.to_mat4().transform_point3(p.into()).into()
    }
}

impl Default for Transform3D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mat4_round_trip() {
        let t = Transform3D::new(
            Vector3::new(2.0, 4.0, -1.0),
            AxisAngle::around_y(0.5),
            Vector3::new(1.0, 2.0, 1.0),
        );
        let back = Transform3D::from_mat4(t.to_mat4());
        assert!((t.position - back.position).length() < 1e-5);
        assert!((t.scale - back.scale).length() < 1e-5);
    }

    #[test]
    fn test_transform_point_translates() {
        let t = Transform3D::from_position(Vector3::new(1.0, 0.0, 0.0));
        let p = t.transform_point(Vector3::ZERO);
        assert!((p - Vector3::new(1.0, 0.0, 0.0)).length() < 1e-6);
    }
}
