use crate::{Ray, Vec3};

/// Axis-aligned bounding box used by the triangle octree and mesh bounds.
///
/// An empty box has `min > max` on every axis and contains nothing.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// The empty box, the identity for [`Aabb::include`].
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Create a box from two corners in any order.
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Smallest box containing every point.
    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Self {
        points
            .into_iter()
            .fold(Aabb::EMPTY, |bounds, p| bounds.include(p))
    }

    /// Grow the box so it contains `p`.
    pub fn include(&self, p: Vec3) -> Aabb {
        Aabb {
            min: self.min.min(p),
            max: self.max.max(p),
        }
    }

    /// Pad every side by `epsilon`.
    pub fn padded(&self, epsilon: f32) -> Aabb {
        Aabb {
            min: self.min - Vec3::splat(epsilon),
            max: self.max + Vec3::splat(epsilon),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Inclusive point containment.
    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Slab test against a ray.
    ///
    /// Returns the distance at which the ray enters the box, `0.0` when the
    /// origin is already inside, or `None` when the ray misses the box or
    /// only reaches it beyond `max_t`.
    pub fn intersect_ray(&self, ray: &Ray, max_t: f32) -> Option<f32> {
        if self.contains(ray.origin) {
            return Some(0.0);
        }

        let mut t_near = f32::NEG_INFINITY;
        let mut t_far = f32::INFINITY;

        for axis in 0..3 {
            let origin = ray.origin[axis];
            let direction = ray.direction[axis];

            if direction == 0.0 {
                // Parallel to this slab: either always inside it or never
                if origin < self.min[axis] || origin > self.max[axis] {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / direction;
            let mut t0 = (self.min[axis] - origin) * inv;
            let mut t1 = (self.max[axis] - origin) * inv;
            if inv < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_near = t_near.max(t0);
            t_far = t_far.min(t1);
            if t_far < t_near {
                return None;
            }
        }

        if t_far < 0.0 {
            return None;
        }

        let entry = t_near.max(0.0);
        if entry > max_t {
            return None;
        }
        Some(entry)
    }
}
