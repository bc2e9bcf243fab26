//! CPU ray picking against axis-aligned boxes
//!
//! Pointer events are turned into a world-space [`Ray`] by the camera and
//! tested against every pickable box with the slab method. Box rotation is
//! ignored: collision volumes are treated as axis-aligned in world space.

use glam::Vec3;

/// Direction components smaller than this are treated as parallel to the slab.
pub const PARALLEL_EPSILON: f32 = 1e-4;

// ========================================================================
// Ray
// ========================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Builds a ray, normalizing `direction`.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Ray from `origin` towards `target`.
    pub fn towards(origin: Vec3, target: Vec3) -> Self {
        Self::new(origin, target - origin)
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    pub fn is_finite(&self) -> bool {
        self.origin.is_finite() && self.direction.is_finite() && self.direction != Vec3::ZERO
    }

    pub fn intersect_box(&self, center: Vec3, half_extents: Vec3) -> Option<f32> {
        intersect(self.origin, self.direction, center, half_extents)
    }
}

// ========================================================================
// Slab test
// ========================================================================

/// Nearest positive hit distance of a ray against an axis-aligned box.
///
/// A ray starting inside the box reports the exit distance. `direction` is
/// expected to be unit length so the result is a world distance.
pub fn intersect(origin: Vec3, direction: Vec3, center: Vec3, half_extents: Vec3) -> Option<f32> {
    let min = center - half_extents;
    let max = center + half_extents;

    let mut tmin = f32::NEG_INFINITY;
    let mut tmax = f32::INFINITY;

    for axis in 0..3 {
        let o = origin[axis];
        let d = direction[axis];
        if d.abs() < PARALLEL_EPSILON {
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }
        let t1 = (min[axis] - o) / d;
        let t2 = (max[axis] - o) / d;
        tmin = tmin.max(t1.min(t2));
        tmax = tmax.min(t1.max(t2));
    }

    if tmax < tmin || tmax < 0.0 {
        return None;
    }
    Some(if tmin > 0.0 { tmin } else { tmax })
}

// ========================================================================
// PickHit
// ========================================================================

/// Box chosen by a pointer-down pick.
#[derive(Debug, Clone, PartialEq)]
pub struct PickHit {
    pub box_id: String,
    pub distance: f32,
}

// ========================================================================
// Tests
// ========================================================================
