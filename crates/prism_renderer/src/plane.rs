//! Infinite plane primitive.

use crate::hittable::{Hittable, Intersection};
use prism_math::{Ray, Vec3};

/// Rays with |N.D| below this are treated as parallel to the plane.
pub(crate) const PARALLEL_EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal
    pub normal: Vec3,
    /// Any point on the plane
    pub origin: Vec3,
}

impl Plane {
    pub fn new(normal: Vec3, origin: Vec3) -> Self {
        Self {
            normal: normal.normalize(),
            origin,
        }
    }
}

impl Hittable for Plane {
    fn intersect(&self, nearest: &mut Intersection, ray: &Ray) -> bool {
        let denom = self.normal.dot(ray.direction);
        if denom.abs() < PARALLEL_EPSILON {
            return false;
        }

        let t = self.normal.dot(self.origin - ray.origin) / denom;
        if !nearest.accepts(t) {
            return false;
        }

        nearest.commit(t, ray.at(t), self.normal);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_hit() {
        let floor = Plane::new(Vec3::Y, Vec3::new(0.0, -2.0, 0.0));
        let ray = Ray::normalized(Vec3::new(0.0, 3.0, 0.0), Vec3::new(1.0, -1.0, 0.0));

        let mut nearest = Intersection::new();
        assert!(floor.intersect(&mut nearest, &ray));
        assert!((nearest.t - 5.0 * 2.0_f32.sqrt()).abs() < 1e-4);
        assert!((nearest.point - Vec3::new(5.0, -2.0, 0.0)).length() < 1e-4);
        assert_eq!(nearest.normal, Vec3::Y);
    }

    #[test]
    fn test_plane_parallel_and_behind() {
        let floor = Plane::new(Vec3::Y, Vec3::ZERO);
        let mut nearest = Intersection::new();

        let parallel = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::X);
        assert!(!floor.intersect(&mut nearest, &parallel));

        // Nearly parallel: within tolerance, rejected rather than hit at huge t
        let grazing = Ray::normalized(Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, -1e-8, 0.0));
        assert!(!floor.intersect(&mut nearest, &grazing));

        let away = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::Y);
        assert!(!floor.intersect(&mut nearest, &away));
        assert!(!nearest.is_hit());
    }
}
