//! Triangle primitive for ray tracing.
//!
//! Intersects the supporting plane first, then accepts the hit point if it
//! lies on the inner side of all three edges.

use crate::hittable::{Hittable, Intersection};
use crate::plane::PARALLEL_EPSILON;
use prism_core::Mesh;
use prism_math::{Ray, Vec3};

/// Squared cross-product length below which a triangle has no area.
const DEGENERATE_AREA: f32 = 1e-20;

/// A triangle with a stored face normal.
///
/// The stored normal is what a hit reports; it may disagree with the
/// winding of the corners (the inside test orients itself to the winding).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub vertices: [Vec3; 3],
    pub normal: Vec3,
}

impl Triangle {
    /// Create a triangle whose normal follows the counter-clockwise winding.
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        let normal = (v1 - v0).cross(v2 - v0).normalize_or_zero();
        Self {
            vertices: [v0, v1, v2],
            normal,
        }
    }

    pub fn with_normal(v0: Vec3, v1: Vec3, v2: Vec3, normal: Vec3) -> Self {
        Self {
            vertices: [v0, v1, v2],
            normal: normal.normalize_or_zero(),
        }
    }

    /// Triangle `index` of a mesh.
    #[inline]
    pub fn from_mesh(mesh: &Mesh, index: usize) -> Self {
        Self {
            vertices: mesh.triangle(index),
            normal: mesh.face_normal(index),
        }
    }

    pub fn centroid(&self) -> Vec3 {
        (self.vertices[0] + self.vertices[1] + self.vertices[2]) / 3.0
    }
}

impl Hittable for Triangle {
    fn intersect(&self, nearest: &mut Intersection, ray: &Ray) -> bool {
        let [v0, v1, v2] = self.vertices;

        let winding = (v1 - v0).cross(v2 - v0);
        if winding.length_squared() < DEGENERATE_AREA {
            return false;
        }
        let n = winding.normalize();

        let denom = n.dot(ray.direction);
        if denom.abs() < PARALLEL_EPSILON {
            return false;
        }

        let t = n.dot(v0 - ray.origin) / denom;
        if !nearest.accepts(t) {
            return false;
        }

        let p = ray.at(t);
        let e0 = (v1 - v0).cross(p - v0).dot(n);
        let e1 = (v2 - v1).cross(p - v1).dot(n);
        let e2 = (v0 - v2).cross(p - v2).dot(n);
        if e0 < 0.0 || e1 < 0.0 || e2 < 0.0 {
            return false;
        }

        let normal = if self.normal == Vec3::ZERO { n } else { self.normal };
        nearest.commit(t, p, normal);
        true
    }
}
