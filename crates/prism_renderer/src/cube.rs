//! Mesh instance placed in the world by a model matrix.
//!
//! The default instance is a unit cube, but any [`Mesh`] can be used. Rays
//! are moved into object space with the inverse model matrix; hits come
//! back as world-space points with world-space distances.

use std::sync::{Arc, OnceLock};

use crate::hittable::{Hittable, Intersection};
use crate::octree::{intersect_mesh, TriangleOctree, PREFERRED_TRIANGLE_COUNT};
use prism_core::Mesh;
use prism_math::{Mat3, Mat4, Mat4Ext, Ray, Vec3};

/// Shared unit cube mesh, built on first use.
fn unit_cube_mesh() -> Arc<Mesh> {
    static UNIT_CUBE: OnceLock<Arc<Mesh>> = OnceLock::new();
    UNIT_CUBE.get_or_init(|| Arc::new(Mesh::unit_cube())).clone()
}

#[derive(Clone)]
pub struct Cube {
    model: Mat4,
    /// `None` while the model matrix is singular; such an instance is never hit
    inv_model: Option<Mat4>,
    normal_matrix: Mat3,
    mesh: Arc<Mesh>,
    octree: Option<Arc<TriangleOctree>>,
}

impl Cube {
    /// Unit cube (side 1, centered on the origin) placed by `model`.
    pub fn new(model: Mat4) -> Self {
        Self::with_mesh(unit_cube_mesh(), model)
    }

    /// Instance of an arbitrary mesh. Meshes with more triangles than a
    /// single octree leaf holds get their own octree.
    pub fn with_mesh(mesh: Arc<Mesh>, model: Mat4) -> Self {
        let octree = (mesh.triangle_count() > PREFERRED_TRIANGLE_COUNT)
            .then(|| Arc::new(TriangleOctree::new(mesh.clone())));
        Self::assemble(mesh, octree, model)
    }

    /// Instance sharing an already built octree.
    pub fn with_octree(octree: Arc<TriangleOctree>, model: Mat4) -> Self {
        Self::assemble(octree.mesh().clone(), Some(octree), model)
    }

    fn assemble(mesh: Arc<Mesh>, octree: Option<Arc<TriangleOctree>>, model: Mat4) -> Self {
        let mut cube = Self {
            model: Mat4::IDENTITY,
            inv_model: Some(Mat4::IDENTITY),
            normal_matrix: Mat3::IDENTITY,
            mesh,
            octree,
        };
        cube.set_model(model);
        cube
    }

    pub fn model(&self) -> Mat4 {
        self.model
    }

    pub fn set_model(&mut self, model: Mat4) {
        self.model = model;
        self.inv_model = model.try_inverse();
        if self.inv_model.is_some() {
            self.normal_matrix = model.normal_matrix();
        } else {
            log::warn!("Cube model matrix is singular; instance will not be hit");
        }
    }

    /// Translate in world space.
    pub fn add_world_offset(&mut self, offset: Vec3) {
        self.set_model(Mat4::from_translation(offset) * self.model);
    }

    /// World-space position of the object-space origin.
    pub fn position(&self) -> Vec3 {
        self.model.w_axis.truncate()
    }

    pub fn mesh(&self) -> &Arc<Mesh> {
        &self.mesh
    }

    pub fn has_octree(&self) -> bool {
        self.octree.is_some()
    }
}

impl Hittable for Cube {
    fn intersect(&self, nearest: &mut Intersection, ray: &Ray) -> bool {
        let Some(inv_model) = self.inv_model else {
            return false;
        };

        // Object-space `t` is meaningless under scale; only the point is kept
        let local_ray = inv_model.transform_ray(ray);
        let local_ray = Ray::normalized(local_ray.origin, local_ray.direction);

        let mut local = Intersection::new();
        let hit = match &self.octree {
            Some(octree) => octree.intersect(&mut local, &local_ray),
            None => intersect_mesh(&self.mesh, &mut local, &local_ray),
        };
        if !hit {
            return false;
        }

        let point = self.model.transform_point3(local.point);
        let t = (point - ray.origin).length();
        if !nearest.accepts(t) {
            return false;
        }

        let normal = (self.normal_matrix * local.normal).normalize_or_zero();
        nearest.commit(t, point, normal);
        true
    }
}
