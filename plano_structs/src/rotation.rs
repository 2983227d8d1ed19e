use crate::Vector3;
use glam::Quat;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rotation stored as a unit axis plus an angle in radians.
///
/// The editor persists rotations in axis-angle form; conversion to
/// `glam::Quat` happens at the matrix boundary only.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisAngle {
    pub axis: Vector3,
    pub angle: f32,
}

impl fmt::Display for AxisAngle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AxisAngle({}, {} rad)", self.axis, self.angle)
    }
}

impl AxisAngle {
    pub const IDENTITY: Self = Self {
        axis: Vector3::Y,
        angle: 0.0,
    };

    #[inline]
    pub const fn new(axis: Vector3, angle: f32) -> Self {
        Self { axis, angle }
    }

    /// Rotation about the world Y axis (the common editor yaw)
    #[inline]
    pub const fn around_y(angle: f32) -> Self {
        Self {
            axis: Vector3::Y,
            angle,
        }
    }

    /// Rotation about the world X axis
    #[inline]
    pub const fn around_x(angle: f32) -> Self {
        Self {
            axis: Vector3::X,
            angle,
        }
    }

    /// Convert to glam Quat (axis is normalized on the way out)
    #[inline]
    pub fn to_quat(self) -> Quat {
        let axis: glam::Vec3 = self.axis.normalized().into();
        if axis.length_squared() == 0.0 {
            Quat::IDENTITY
        } else {
            Quat::from_axis_angle(axis, self.angle)
        }
    }

    /// Create from glam Quat
    #[inline]
    pub fn from_quat(quat: Quat) -> Self {
        let (axis, angle) = quat.to_axis_angle();
        Self {
            axis: axis.into(),
            angle,
        }
    }

    /// Compose two rotations (`self` applied after `rhs`)
    #[inline]
    pub fn then(self, rhs: Self) -> Self {
        Self::from_quat(self.to_quat() * rhs.to_quat())
    }

    /// Rotate a point about the origin
    #[inline]
    pub fn rotate(self, v: Vector3) -> Vector3 {
        (self.to_quat() * glam::Vec3::from(v)).into()
    }

    pub fn is_identity(&self) -> bool {
        self.angle == 0.0
    }
}

impl Default for AxisAngle {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<AxisAngle> for Quat {
    #[inline]
    fn from(r: AxisAngle) -> Self {
        r.to_quat()
    }
}

impl From<Quat> for AxisAngle {
    #[inline]
    fn from(q: Quat) -> Self {
        Self::from_quat(q)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_identity_rotation_is_noop() {
        let p = Vector3::new(1.0, 2.0, 3.0);
        let r = AxisAngle::IDENTITY.rotate(p);
        assert!((r - p).length() < 1e-6);
    }

    #[test]
    fn test_quarter_turn_y() {
        let r = AxisAngle::around_y(FRAC_PI_2).rotate(Vector3::X);
        // +X rotated 90 degrees about +Y lands on -Z
        assert!((r - Vector3::new(0.0, 0.0, -1.0)).length() < 1e-6);
    }

    #[test]
    fn test_quat_round_trip() {
        let r = AxisAngle::new(Vector3::new(0.0, 1.0, 0.0), 1.25);
        let back = AxisAngle::from_quat(r.to_quat());
        let p = Vector3::new(3.0, -1.0, 0.5);
        assert!((r.rotate(p) - back.rotate(p)).length() < 1e-5);
    }
}
