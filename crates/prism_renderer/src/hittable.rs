//! Nearest-hit record and the trait every primitive implements.

use prism_math::{Ray, Vec3};

/// The nearest hit found so far while scanning primitives.
///
/// `t` starts at +infinity ("no hit") and only ever decreases during one
/// search: a primitive commits a hit only when its distance is non-negative
/// and strictly smaller than the current `t`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    /// Distance along the ray
    pub t: f32,
    /// World-space hit point
    pub point: Vec3,
    /// Unit surface normal at the hit point
    pub normal: Vec3,
}

impl Intersection {
    pub fn new() -> Self {
        Self {
            t: f32::INFINITY,
            point: Vec3::ZERO,
            normal: Vec3::ZERO,
        }
    }

    /// Forget any previous hit before a new search.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn is_hit(&self) -> bool {
        self.t.is_finite()
    }

    /// Returns true if a hit at `t` would improve this record.
    #[inline]
    pub fn accepts(&self, t: f32) -> bool {
        t >= 0.0 && t < self.t
    }

    #[inline]
    pub(crate) fn commit(&mut self, t: f32, point: Vec3, normal: Vec3) {
        debug_assert!(self.accepts(t));
        self.t = t;
        self.point = point;
        self.normal = normal;
    }
}

impl Default for Intersection {
    fn default() -> Self {
        Self::new()
    }
}

/// Trait for geometry that can be hit by rays.
pub trait Hittable: Send + Sync {
    /// Test the ray against this primitive.
    ///
    /// Returns true only if the hit is closer than `nearest.t`, in which
    /// case `nearest` has been overwritten. Degenerate configurations
    /// (parallel rays, zero-size geometry) are plain misses.
    fn intersect(&self, nearest: &mut Intersection, ray: &Ray) -> bool;
}

impl<H: Hittable + ?Sized> Hittable for &H {
    fn intersect(&self, nearest: &mut Intersection, ray: &Ray) -> bool {
        (**self).intersect(nearest, ray)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_no_hit() {
        let nearest = Intersection::new();
        assert!(!nearest.is_hit());
        assert!(nearest.accepts(1e30));
        assert!(!nearest.accepts(-0.001));
    }

    #[test]
    fn test_accepts_is_strict() {
        let mut nearest = Intersection::new();
        nearest.commit(2.0, Vec3::ZERO, Vec3::Y);
        assert!(nearest.is_hit());
        assert!(!nearest.accepts(2.0));
        assert!(nearest.accepts(1.999));

        nearest.reset();
        assert!(!nearest.is_hit());
    }
}
