//! Triangle mesh geometry shared by mesh instances.
//!
//! A `Mesh` is validated once on construction and never mutated afterwards;
//! instances hold it behind an `Arc`. Changing geometry means building a new
//! mesh (and whatever acceleration structure was built over the old one).

use prism_math::{Aabb, Vec3};
use thiserror::Error;

/// Errors from mesh construction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    #[error("Mesh has no triangles")]
    Empty,

    #[error("Index count {0} is not a multiple of 3")]
    IndexCount(usize),

    #[error("Index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },

    #[error("Normal count {normals} does not match vertex count {vertices}")]
    NormalCount { normals: usize, vertices: usize },
}

/// An indexed triangle mesh with one normal per face.
#[derive(Clone, Debug)]
pub struct Mesh {
    positions: Vec<Vec3>,
    indices: Vec<u32>,
    face_normals: Vec<Vec3>,
    bounds: Aabb,
}

impl Mesh {
    /// Create a mesh whose face normals follow the winding `(v1 - v0) x (v2 - v0)`.
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Result<Self, MeshError> {
        Self::validate(&positions, &indices)?;

        let face_normals = indices
            .chunks_exact(3)
            .map(|face| {
                let [v0, v1, v2] = Self::corners(&positions, face);
                (v1 - v0).cross(v2 - v0).normalize_or_zero()
            })
            .collect();

        Ok(Self::assemble(positions, indices, face_normals))
    }

    /// Create a mesh from per-vertex normals; each face uses the average of
    /// its three vertex normals.
    pub fn with_normals(
        positions: Vec<Vec3>,
        normals: Vec<Vec3>,
        indices: Vec<u32>,
    ) -> Result<Self, MeshError> {
        if normals.len() != positions.len() {
            return Err(MeshError::NormalCount {
                normals: normals.len(),
                vertices: positions.len(),
            });
        }
        Self::validate(&positions, &indices)?;

        let face_normals = indices
            .chunks_exact(3)
            .map(|face| {
                let [n0, n1, n2] = Self::corners(&normals, face);
                (n0 + n1 + n2).normalize_or_zero()
            })
            .collect();

        Ok(Self::assemble(positions, indices, face_normals))
    }

    fn validate(positions: &[Vec3], indices: &[u32]) -> Result<(), MeshError> {
        if indices.is_empty() {
            return Err(MeshError::Empty);
        }
        if indices.len() % 3 != 0 {
            return Err(MeshError::IndexCount(indices.len()));
        }
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= positions.len()) {
            return Err(MeshError::IndexOutOfRange {
                index,
                vertex_count: positions.len(),
            });
        }
        Ok(())
    }

    fn corners(values: &[Vec3], face: &[u32]) -> [Vec3; 3] {
        [
            values[face[0] as usize],
            values[face[1] as usize],
            values[face[2] as usize],
        ]
    }

    fn assemble(positions: Vec<Vec3>, indices: Vec<u32>, face_normals: Vec<Vec3>) -> Self {
        let bounds = Aabb::from_points(positions.iter().copied());
        log::debug!(
            "Mesh: {} vertices, {} triangles",
            positions.len(),
            indices.len() / 3
        );
        Self {
            positions,
            indices,
            face_normals,
            bounds,
        }
    }

    /// Axis-aligned unit cube centered at the origin (side length 1),
    /// 24 vertices so every face keeps its own outward normal.
    pub fn unit_cube() -> Self {
        // (normal, tangent u, tangent v) with u x v == normal
        let faces = [
            (Vec3::X, Vec3::Y, Vec3::Z),
            (-Vec3::X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::Z, Vec3::X),
            (-Vec3::Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (-Vec3::Z, Vec3::Y, Vec3::X),
        ];

        let mut positions = Vec::with_capacity(24);
        let mut normals = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);

        for (normal, u, v) in faces {
            let base = positions.len() as u32;
            let center = normal * 0.5;
            for (su, sv) in [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)] {
                positions.push(center + u * su + v * sv);
                normals.push(normal);
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self::with_normals(positions, normals, indices).expect("unit cube topology is valid")
    }

    /// Latitude/longitude sphere, useful as a dense test and demo mesh.
    ///
    /// `segments` and `rings` are clamped to at least 3 and 2.
    pub fn uv_sphere(radius: f32, segments: u32, rings: u32) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(2);

        let mut positions = Vec::with_capacity(((segments + 1) * (rings + 1)) as usize);
        for ring in 0..=rings {
            let theta = std::f32::consts::PI * ring as f32 / rings as f32;
            for segment in 0..=segments {
                let phi = std::f32::consts::TAU * segment as f32 / segments as f32;
                positions.push(
                    Vec3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin())
                        * radius,
                );
            }
        }

        let stride = segments + 1;
        let mut indices = Vec::with_capacity((segments * rings * 6) as usize);
        for ring in 0..rings {
            for segment in 0..segments {
                let a = ring * stride + segment;
                let b = a + stride;
                // Pole rows collapse to slivers; skip the degenerate half
                if ring != 0 {
                    indices.extend_from_slice(&[a, a + 1, b]);
                }
                if ring != rings - 1 {
                    indices.extend_from_slice(&[a + 1, b + 1, b]);
                }
            }
        }

        let normals = positions.iter().map(|p| p.normalize_or_zero()).collect();
        Self::with_normals(positions, normals, indices).expect("uv sphere topology is valid")
    }

    /// Get the number of triangles in the mesh.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Get the number of vertices in the mesh.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// The three corners of triangle `index`.
    #[inline]
    pub fn triangle(&self, index: usize) -> [Vec3; 3] {
        Self::corners(&self.positions, &self.indices[index * 3..index * 3 + 3])
    }

    #[inline]
    pub fn face_normal(&self, index: usize) -> Vec3 {
        self.face_normals[index]
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_validation() {
        let positions = vec![Vec3::ZERO, Vec3::X, Vec3::Y];

        assert_eq!(Mesh::new(positions.clone(), vec![]).unwrap_err(), MeshError::Empty);
        assert_eq!(
            Mesh::new(positions.clone(), vec![0, 1]).unwrap_err(),
            MeshError::IndexCount(2)
        );
        assert_eq!(
            Mesh::new(positions.clone(), vec![0, 1, 3]).unwrap_err(),
            MeshError::IndexOutOfRange { index: 3, vertex_count: 3 }
        );
        assert_eq!(
            Mesh::with_normals(positions.clone(), vec![Vec3::Z], vec![0, 1, 2]).unwrap_err(),
            MeshError::NormalCount { normals: 1, vertices: 3 }
        );
        assert!(Mesh::new(positions, vec![0, 1, 2]).is_ok());
    }

    #[test]
    fn test_winding_normal() {
        let mesh = Mesh::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![0, 1, 2]).unwrap();
        assert_eq!(mesh.face_normal(0), Vec3::Z);
        assert_eq!(mesh.triangle(0), [Vec3::ZERO, Vec3::X, Vec3::Y]);
    }

    #[test]
    fn test_unit_cube() {
        let cube = Mesh::unit_cube();
        assert_eq!(cube.triangle_count(), 12);
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.bounds().min, Vec3::splat(-0.5));
        assert_eq!(cube.bounds().max, Vec3::splat(0.5));

        for i in 0..cube.triangle_count() {
            let [v0, v1, v2] = cube.triangle(i);
            let centroid = (v0 + v1 + v2) / 3.0;
            let normal = cube.face_normal(i);
            // Outward normals, matching the geometric winding
            assert!(centroid.dot(normal) > 0.0);
            assert!((v1 - v0).cross(v2 - v0).dot(normal) > 0.0);
        }
    }

    #[test]
    fn test_uv_sphere() {
        let sphere = Mesh::uv_sphere(2.0, 16, 8);
        assert_eq!(sphere.triangle_count(), (16 * 8 * 2 - 2 * 16) as usize);
        for p in sphere.positions() {
            assert!((p.length() - 2.0).abs() < 1e-4);
        }
    }
}
