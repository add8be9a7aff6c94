use crate::Vec3;

/// A parametric ray: `origin + t * direction`.
///
/// Most intersection routines in the renderer expect a unit-length
/// direction so that `t` is a world-space distance; build those rays with
/// [`Ray::normalized`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Create a new ray, keeping the direction as given.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Create a ray with a unit-length direction.
    ///
    /// A zero direction stays zero; such a ray intersects nothing.
    pub fn normalized(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Get the point along the ray at parameter t.
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Offset the origin along `normal` by `epsilon`.
    ///
    /// Used for secondary rays leaving a surface so they do not hit the
    /// surface they start on.
    #[inline]
    pub fn offset(mut self, normal: Vec3, epsilon: f32) -> Self {
        self.origin += normal * epsilon;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_at() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);

        assert_eq!(ray.at(0.0), Vec3::ZERO);
        assert_eq!(ray.at(1.0), Vec3::X);
        assert_eq!(ray.at(2.0), Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(ray.at(-1.0), Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn test_ray_normalized() {
        let ray = Ray::normalized(Vec3::ONE, Vec3::new(0.0, 3.0, 4.0));
        assert!((ray.direction.length() - 1.0).abs() < 1e-6);
        assert!((ray.at(5.0) - Vec3::new(1.0, 4.0, 5.0)).length() < 1e-5);

        let degenerate = Ray::normalized(Vec3::ZERO, Vec3::ZERO);
        assert_eq!(degenerate.direction, Vec3::ZERO);
    }

    #[test]
    fn test_ray_offset() {
        let ray = Ray::new(Vec3::ZERO, Vec3::Z).offset(Vec3::Y, 0.01);
        assert_eq!(ray.origin, Vec3::new(0.0, 0.01, 0.0));
        assert_eq!(ray.direction, Vec3::Z);
    }
}
