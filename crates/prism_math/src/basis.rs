use crate::Vec3;

/// Build two tangents completing `n` to a right-handed orthonormal frame.
///
/// Frisvad's construction: branch-free apart from the singularity at
/// `n = -Z`. `n` must be unit length.
pub fn orthonormal_basis(n: Vec3) -> (Vec3, Vec3) {
    if n.z < -0.999_999_9 {
        return (Vec3::new(0.0, -1.0, 0.0), Vec3::new(-1.0, 0.0, 0.0));
    }
    let a = 1.0 / (1.0 + n.z);
    let b = -n.x * n.y * a;
    let b1 = Vec3::new(1.0 - n.x * n.x * a, b, -n.x);
    let b2 = Vec3::new(b, 1.0 - n.y * n.y * a, -n.y);
    (b1, b2)
}

/// Mirror `v` about the plane with unit normal `n`.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_frame(n: Vec3) {
        let (b1, b2) = orthonormal_basis(n);
        assert!((b1.length() - 1.0).abs() < 1e-5, "b1 not unit for {n:?}");
        assert!((b2.length() - 1.0).abs() < 1e-5, "b2 not unit for {n:?}");
        assert!(b1.dot(b2).abs() < 1e-5);
        assert!(b1.dot(n).abs() < 1e-5);
        assert!(b2.dot(n).abs() < 1e-5);
    }

    #[test]
    fn test_orthonormal_basis() {
        assert_frame(Vec3::Z);
        assert_frame(-Vec3::Z);
        assert_frame(Vec3::X);
        assert_frame(Vec3::Y);
        assert_frame(Vec3::new(1.0, 2.0, -3.0).normalize());
        assert_frame(Vec3::new(-0.3, 0.1, -0.9).normalize());
    }

    #[test]
    fn test_reflect() {
        let v = Vec3::new(1.0, -1.0, 0.0);
        assert_eq!(reflect(v, Vec3::Y), Vec3::new(1.0, 1.0, 0.0));
        // Grazing vectors are unchanged
        assert_eq!(reflect(Vec3::X, Vec3::Y), Vec3::X);
    }
}
