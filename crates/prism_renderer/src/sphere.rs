//! Sphere primitive for ray tracing.

use crate::hittable::{Hittable, Intersection};
use prism_math::{Ray, Vec3};

/// A sphere primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub origin: Vec3,
    pub radius: f32,
}

impl Sphere {
    /// Create a new sphere. Negative radii are clamped to zero (never hit).
    pub fn new(origin: Vec3, radius: f32) -> Self {
        Self {
            origin,
            radius: radius.max(0.0),
        }
    }
}

impl Hittable for Sphere {
    /// Expects a unit-length ray direction, so the quadratic is
    /// `t^2 + 2t(D.L) + (L.L - r^2) = 0` with `L = origin - center`.
    fn intersect(&self, nearest: &mut Intersection, ray: &Ray) -> bool {
        if self.radius <= 0.0 {
            return false;
        }

        let l = ray.origin - self.origin;
        let half_b = ray.direction.dot(l);
        let c = l.length_squared() - self.radius * self.radius;

        let discriminant = half_b * half_b - c;
        if discriminant < 0.0 {
            return false;
        }

        // Only the near root: rays starting inside the sphere miss it
        let t = -half_b - discriminant.sqrt();
        if t <= 0.0 || t >= nearest.t {
            return false;
        }

        let point = ray.at(t);
        nearest.commit(t, point, (point - self.origin) / self.radius);
        true
    }
}
