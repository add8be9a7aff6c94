// Transform utilities for Mat4
//
// Extends glam::Mat4 with the few operations the ray tracer needs when it
// moves rays into an instance's object space and hits back into world space.

use glam::{Mat3, Mat4};
use crate::Ray;

/// Determinants below this are treated as singular.
const SINGULAR_EPSILON: f32 = 1e-12;

/// Extension trait for Mat4 to provide ray tracing transform utilities
pub trait Mat4Ext {
    /// Transform a ray: origin as a point (w=1), direction as a vector (w=0).
    /// The direction is not renormalized.
    fn transform_ray(&self, ray: &Ray) -> Ray;

    /// Inverse-transpose of the upper 3x3, for transforming surface normals.
    /// Non-uniform scale would skew normals transformed by the matrix itself.
    fn normal_matrix(&self) -> Mat3;

    /// Returns the inverse, or `None` when the matrix is (near-)singular.
    fn try_inverse(&self) -> Option<Mat4>;
}

impl Mat4Ext for Mat4 {
    fn transform_ray(&self, ray: &Ray) -> Ray {
        Ray::new(
            self.transform_point3(ray.origin),
            self.transform_vector3(ray.direction),
        )
    }

    fn normal_matrix(&self) -> Mat3 {
        Mat3::from_mat4(*self).inverse().transpose()
    }

    fn try_inverse(&self) -> Option<Mat4> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() < SINGULAR_EPSILON {
            return None;
        }
        Some(self.inverse())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    #[test]
    fn test_transform_ray_translation() {
        let mat = Mat4::from_translation(Vec3::new(10.0, 20.0, 30.0));
        let ray = Ray::new(Vec3::new(1.0, 2.0, 3.0), Vec3::X);
        let transformed = mat.transform_ray(&ray);

        assert_eq!(transformed.origin, Vec3::new(11.0, 22.0, 33.0));
        // Translation should NOT affect directions
        assert_eq!(transformed.direction, Vec3::X);
    }

    #[test]
    fn test_transform_ray_scale_keeps_parameter() {
        let mat = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        let ray = Ray::new(Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0));
        let transformed = mat.transform_ray(&ray);

        // Affine maps preserve the ray parameter of corresponding points
        let world = mat.transform_point3(ray.at(3.0));
        assert!((transformed.at(3.0) - world).length() < 1e-5);
    }

    #[test]
    fn test_normal_matrix_non_uniform_scale() {
        // A 45 degree slope squashed along X: the normal must stay perpendicular
        let mat = Mat4::from_scale(Vec3::new(4.0, 1.0, 1.0));
        let tangent = Vec3::new(1.0, -1.0, 0.0);
        let normal = Vec3::new(1.0, 1.0, 0.0).normalize();

        let world_tangent = mat.transform_vector3(tangent);
        let world_normal = (mat.normal_matrix() * normal).normalize();
        assert!(world_tangent.dot(world_normal).abs() < 1e-5);
    }

    #[test]
    fn test_try_inverse() {
        let mat = Mat4::from_scale_rotation_translation(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_rotation_y(0.7),
            Vec3::new(5.0, -1.0, 2.0),
        );
        let inv = mat.try_inverse().unwrap();
        let point = Vec3::new(5.0, 3.0, 2.0);
        let back = inv.transform_point3(mat.transform_point3(point));
        assert!((back - point).length() < 1e-4);

        let singular = Mat4::from_scale(Vec3::new(1.0, 0.0, 1.0));
        assert!(singular.try_inverse().is_none());
    }
}
