use crate::{Aabb, AxisAngle, Vector3};
use glam::{Mat3, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Oriented bounding volume: a box with its own rotation.
///
/// Intersection uses the separating axis theorem over the 15 candidate
/// axes of a box pair (3 + 3 face normals, 9 edge cross products).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrientedBox {
    pub center: Vector3,
    pub half_extents: Vector3,
    pub rotation: AxisAngle,
}

impl OrientedBox {
    #[inline]
    pub const fn new(center: Vector3, half_extents: Vector3, rotation: AxisAngle) -> Self {
        Self {
            center,
            half_extents,
            rotation,
        }
    }

    /// Axis-aligned box promoted to an oriented one
    #[inline]
    pub fn from_aabb(aabb: &Aabb) -> Self {
        Self {
            center: aabb.center(),
            half_extents: aabb.half_extents(),
            rotation: AxisAngle::IDENTITY,
        }
    }

    /// The three local axes expressed in the parent frame
    #[inline]
    pub fn axes(&self) -> [Vector3; 3] {
        let m = Mat3::from_quat(self.rotation.to_quat());
        [
            m.x_axis.into(),
            m.y_axis.into(),
            m.z_axis.into(),
        ]
    }

    /// The eight corner points
    pub fn corners(&self) -> [Vector3; 8] {
        let [ax, ay, az] = self.axes();
        let ex = ax * self.half_extents.x;
        let ey = ay * self.half_extents.y;
        let ez = az * self.half_extents.z;
        let c = self.center;
        [
            c - ex - ey - ez,
            c + ex - ey - ez,
            c - ex + ey - ez,
            c + ex + ey - ez,
            c - ex - ey + ez,
            c + ex - ey + ez,
            c - ex + ey + ez,
            c + ex + ey + ez,
        ]
    }

    /// Project onto a direction; returns (min, max) scalar extents
    pub fn extent_on(&self, dir: Vector3) -> (f32, f32) {
        let c = self.center.dot(dir);
        let [ax, ay, az] = self.axes();
        let r = (ax.dot(dir) * self.half_extents.x).abs()
            + (ay.dot(dir) * self.half_extents.y).abs()
            + (az.dot(dir) * self.half_extents.z).abs();
        (c - r, c + r)
    }

    /// Smallest axis-aligned box containing this volume
    pub fn to_aabb(&self) -> Aabb {
        let mut out = Aabb::EMPTY;
        for corner in self.corners() {
            out.absorb(corner);
        }
        out
    }

    /// Map this volume through a TRS matrix: decomposes the matrix and
    /// applies translation/rotation exactly, scale component-wise on the
    /// half extents.
    pub fn transformed(&self, mat: &Mat4) -> Self {
        let (scale, rot, _) = mat.to_scale_rotation_translation();
        let center = mat.transform_point3(self.center.into());
        let rotation = AxisAngle::from_quat(rot * self.rotation.to_quat());
        let half = Vector3::new(
            self.half_extents.x * scale.x.abs(),
            self.half_extents.y * scale.y.abs(),
            self.half_extents.z * scale.z.abs(),
        );
        Self {
            center: center.into(),
            half_extents: half,
            rotation,
        }
    }

    /// SAT overlap test against another box. Touching counts as overlap.
    pub fn intersects(&self, other: &Self) -> bool {
        // Epsilon guards the degenerate cross-product axes when edges
        // of the two boxes are near-parallel.
        const EPS: f32 = 1e-6;

        let a_axes = self.axes();
        let b_axes = other.axes();

        let mut candidates: [Vec3; 15] = [Vec3::ZERO; 15];
        let mut n = 0;
        for ax in a_axes {
            candidates[n] = ax.into();
            n += 1;
        }
        for bx in b_axes {
            candidates[n] = bx.into();
            n += 1;
        }
        for ax in a_axes {
            for bx in b_axes {
                candidates[n] = Vec3::from(ax).cross(bx.into());
                n += 1;
            }
        }

        for axis in candidates {
            if axis.length_squared() < EPS {
                continue; // parallel edges, axis already covered
            }
            let dir: Vector3 = axis.into();
            let (a_min, a_max) = self.extent_on(dir);
            let (b_min, b_max) = other.extent_on(dir);
            if a_max < b_min - EPS || b_max < a_min - EPS {
                return false;
            }
        }
        true
    }

    /// Quaternion form of the rotation, for callers composing matrices
    #[inline]
    pub fn quat(&self) -> Quat {
        self.rotation.to_quat()
    }
}
