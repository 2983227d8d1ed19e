use crate::{AxisAngle, OrientedBox, Vector3};
use serde::{Deserialize, Serialize};

/// Geometry of one wall segment: two endpoint posts on the floor plane,
/// each with its own height, plus a uniform thickness.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WallGeometry {
    pub start: Vector3,
    pub end: Vector3,
    pub height_start: f32,
    pub height_end: f32,
    pub thickness: f32,
}

impl WallGeometry {
    pub const fn new(
        start: Vector3,
        end: Vector3,
        height_start: f32,
        height_end: f32,
        thickness: f32,
    ) -> Self {
        Self {
            start,
            end,
            height_start,
            height_end,
            thickness,
        }
    }

    /// Horizontal run of the segment
    #[inline]
    pub fn length(&self) -> f32 {
        let d = self.end - self.start;
        Vector3::new(d.x, 0.0, d.z).length()
    }

    /// The taller of the two endpoint posts governs the volume height
    #[inline]
    pub fn height(&self) -> f32 {
        self.height_start.max(self.height_end)
    }

    /// Yaw of the segment direction on the floor plane
    pub fn yaw(&self) -> f32 {
        let d = self.end - self.start;
        // atan2 of the run direction; a zero-length wall faces +X
        if d.x == 0.0 && d.z == 0.0 {
            0.0
        } else {
            (-d.z).atan2(d.x)
        }
    }

    /// Oriented volume of the wall: span x height x thickness, rotated
    /// to the segment direction, sitting on the floor plane.
    pub fn oriented_box(&self) -> OrientedBox {
        let mid = (self.start + self.end) * 0.5;
        let height = self.height();
        let center = Vector3::new(mid.x, mid.y + height * 0.5, mid.z);
        let half = Vector3::new(
            self.length() * 0.5,
            height * 0.5,
            self.thickness * 0.5,
        );
        OrientedBox::new(center, half, AxisAngle::around_y(self.yaw()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_straight_wall_volume() {
        let w = WallGeometry::new(
            Vector3::ZERO,
            Vector3::new(4.0, 0.0, 0.0),
            2.4,
            2.4,
            0.1,
        );
        let b = w.oriented_box();
        assert!((b.center - Vector3::new(2.0, 1.2, 0.0)).length() < 1e-6);
        assert!((b.half_extents.x - 2.0).abs() < 1e-6);
        assert!((b.half_extents.y - 1.2).abs() < 1e-6);
        assert!((b.half_extents.z - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_taller_endpoint_wins() {
        let w = WallGeometry::new(Vector3::ZERO, Vector3::new(1.0, 0.0, 0.0), 2.0, 3.0, 0.1);
        assert!((w.height() - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_yaw_follows_run_direction() {
        let w = WallGeometry::new(Vector3::ZERO, Vector3::new(0.0, 0.0, -3.0), 2.0, 2.0, 0.1);
        assert!((w.yaw() - FRAC_PI_2).abs() < 1e-5);
    }
}
