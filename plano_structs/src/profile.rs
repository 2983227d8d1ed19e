use crate::{Aabb, Vector3};
use serde::{Deserialize, Serialize};

/// One vertex of an extruded cross-section.
///
/// Invisible vertices are construction points (miter pivots, bend
/// helpers) and do not contribute to the swept extents.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProfileVertex {
    pub x: f32,
    pub y: f32,
    /// Vertex participates in the rendered/collidable outline
    pub visible: bool,
    /// Vertex is a mitered corner; the joint extends to the outer edge
    pub miter: bool,
}

impl ProfileVertex {
    pub const fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            visible: true,
            miter: false,
        }
    }

    pub const fn hidden(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            visible: false,
            miter: false,
        }
    }

    pub const fn mitered(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            visible: true,
            miter: true,
        }
    }
}

/// A 2D cross-section swept along the local Z axis to form an extruded
/// volume. The profile lives in the local XY plane; `translation` shifts
/// the whole section before sweeping.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Profile2D {
    pub vertices: Vec<ProfileVertex>,
    pub translation_x: f32,
    pub translation_y: f32,
    /// Extra outline width added at mitered corners
    pub miter_depth: f32,
}

impl Profile2D {
    pub fn new(vertices: Vec<ProfileVertex>) -> Self {
        Self {
            vertices,
            translation_x: 0.0,
            translation_y: 0.0,
            miter_depth: 0.0,
        }
    }

    pub fn with_translation(mut self, x: f32, y: f32) -> Self {
        self.translation_x = x;
        self.translation_y = y;
        self
    }

    pub fn with_miter_depth(mut self, depth: f32) -> Self {
        self.miter_depth = depth;
        self
    }

    /// 2D extents of the visible outline, `(min_x, min_y, max_x, max_y)`.
    /// Returns `None` when no vertex is visible.
    pub fn extents(&self) -> Option<(f32, f32, f32, f32)> {
        let mut found = false;
        let (mut min_x, mut min_y) = (f32::INFINITY, f32::INFINITY);
        let (mut max_x, mut max_y) = (f32::NEG_INFINITY, f32::NEG_INFINITY);

        for v in &self.vertices {
            if !v.visible {
                continue;
            }
            found = true;
            let reach = if v.miter { self.miter_depth } else { 0.0 };
            let x = v.x + self.translation_x;
            let y = v.y + self.translation_y;
            min_x = min_x.min(x - reach);
            min_y = min_y.min(y - reach);
            max_x = max_x.max(x + reach);
            max_y = max_y.max(y + reach);
        }

        found.then_some((min_x, min_y, max_x, max_y))
    }

    /// Local-space box of the profile swept over `length` along Z.
    /// An all-hidden profile yields an empty box.
    pub fn swept_bounds(&self, length: f32) -> Aabb {
        match self.extents() {
            Some((min_x, min_y, max_x, max_y)) => Aabb::new(
                Vector3::new(min_x, min_y, 0.0),
                Vector3::new(max_x, max_y, length),
            ),
            None => Aabb::EMPTY,
        }
    }
}
