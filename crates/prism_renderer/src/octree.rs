//! Loose octree over the triangles of one mesh.
//!
//! Each node has an *initial* box (its exact octant of the parent) and a
//! slightly *stretched* box. A triangle belongs to the deepest node whose
//! initial box contains its centroid and whose stretched box contains all
//! three corners; triangles that straddle every child stay in the parent.

use std::sync::Arc;

use crate::hittable::{Hittable, Intersection};
use crate::triangle::Triangle;
use prism_core::Mesh;
use prism_math::{Aabb, Ray};

/// Triangles a leaf holds before it splits.
pub const PREFERRED_TRIANGLE_COUNT: usize = 32;
/// How far a child box may grow past its octant, relative to its size.
pub const MAX_STRETCHING_RATIO: f32 = 1.05;
/// Nodes at this depth never split (coincident triangles would recurse forever).
const MAX_DEPTH: u32 = 16;

struct OctreeNode {
    initial_box: Aabb,
    stretched_box: Aabb,
    triangles: Vec<u32>,
    children: Option<Box<[OctreeNode; 8]>>,
}

/// Octree acceleration structure for a single [`Mesh`].
///
/// Queries are read-only and may run from any number of threads.
pub struct TriangleOctree {
    mesh: Arc<Mesh>,
    root: OctreeNode,
}

impl TriangleOctree {
    /// Build an octree containing every triangle of `mesh`.
    pub fn new(mesh: Arc<Mesh>) -> Self {
        let bounds = mesh.bounds();
        let padding = bounds.size().max_element() * 1e-4 + 1e-6;
        let root_box = bounds.padded(padding);

        let mut root = OctreeNode::new(root_box, root_box);
        for index in 0..mesh.triangle_count() {
            let triangle = Triangle::from_mesh(&mesh, index);
            if !root.insert(&mesh, index as u32, &triangle, 0) {
                // Unreachable with a padded root box; keep the triangle anyway
                root.triangles.push(index as u32);
            }
        }

        let octree = Self { mesh, root };
        log::info!(
            "Octree built: {} triangles, {} nodes, depth {}",
            octree.mesh.triangle_count(),
            octree.node_count(),
            octree.depth()
        );
        octree
    }

    pub fn mesh(&self) -> &Arc<Mesh> {
        &self.mesh
    }

    pub fn bounds(&self) -> Aabb {
        self.root.stretched_box
    }

    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }

    /// Depth of the deepest node (a lone root has depth 1).
    pub fn depth(&self) -> u32 {
        self.root.depth()
    }

    /// Total triangle references stored in the tree.
    pub fn triangle_count(&self) -> usize {
        self.root.triangle_count()
    }
}

impl Hittable for TriangleOctree {
    fn intersect(&self, nearest: &mut Intersection, ray: &Ray) -> bool {
        if self.root.stretched_box.intersect_ray(ray, nearest.t).is_none() {
            return false;
        }
        self.root.intersect(&self.mesh, nearest, ray)
    }
}

impl OctreeNode {
    fn new(initial_box: Aabb, stretched_box: Aabb) -> Self {
        Self {
            initial_box,
            stretched_box,
            triangles: Vec::new(),
            children: None,
        }
    }

    /// Octant `index` of `parent`: bit 0 picks the upper x half, bit 1 the
    /// upper y half, bit 2 the upper z half. The stretched box grows toward
    /// the parent's center, into the neighbouring octants.
    fn child(parent: &Aabb, index: usize) -> Self {
        let center = parent.center();
        let upper = [index & 1 != 0, index & 2 != 0, index & 4 != 0];

        let mut min = parent.min;
        let mut max = parent.max;
        for axis in 0..3 {
            if upper[axis] {
                min[axis] = center[axis];
            } else {
                max[axis] = center[axis];
            }
        }
        let initial_box = Aabb { min, max };

        let elongation = (MAX_STRETCHING_RATIO - 1.0) * initial_box.size();
        let mut stretched = initial_box;
        for axis in 0..3 {
            if upper[axis] {
                stretched.min[axis] -= elongation[axis];
            } else {
                stretched.max[axis] += elongation[axis];
            }
        }

        Self::new(initial_box, stretched)
    }

    fn accepts(&self, triangle: &Triangle) -> bool {
        self.initial_box.contains(triangle.centroid())
            && triangle.vertices.iter().all(|v| self.stretched_box.contains(*v))
    }

    fn insert(&mut self, mesh: &Mesh, index: u32, triangle: &Triangle, depth: u32) -> bool {
        if !self.accepts(triangle) {
            return false;
        }

        if self.children.is_none() {
            if self.triangles.len() < PREFERRED_TRIANGLE_COUNT || depth >= MAX_DEPTH {
                self.triangles.push(index);
                return true;
            }
            self.split(mesh, depth);
        }

        if !self.insert_into_children(mesh, index, triangle, depth) {
            self.triangles.push(index);
        }
        true
    }

    fn insert_into_children(&mut self, mesh: &Mesh, index: u32, triangle: &Triangle, depth: u32) -> bool {
        let Some(children) = self.children.as_mut() else {
            return false;
        };
        children
            .iter_mut()
            .any(|child| child.insert(mesh, index, triangle, depth + 1))
    }

    /// Create the eight children and push existing triangles down.
    fn split(&mut self, mesh: &Mesh, depth: u32) {
        let parent = self.initial_box;
        self.children = Some(Box::new(std::array::from_fn(|i| Self::child(&parent, i))));

        for index in std::mem::take(&mut self.triangles) {
            let triangle = Triangle::from_mesh(mesh, index as usize);
            if !self.insert_into_children(mesh, index, &triangle, depth) {
                self.triangles.push(index);
            }
        }
    }

    /// Caller has already checked the ray against this node's stretched box.
    fn intersect(&self, mesh: &Mesh, nearest: &mut Intersection, ray: &Ray) -> bool {
        let mut found = false;
        for &index in &self.triangles {
            if Triangle::from_mesh(mesh, index as usize).intersect(nearest, ray) {
                found = true;
            }
        }

        let Some(children) = &self.children else {
            return found;
        };

        // Visit children front to back by box entry distance
        let mut order = [(0usize, 0.0f32); 8];
        let mut count = 0;
        for (i, child) in children.iter().enumerate() {
            if let Some(entry) = child.stretched_box.intersect_ray(ray, nearest.t) {
                order[count] = (i, entry);
                count += 1;
            }
        }
        let order = &mut order[..count];
        order.sort_unstable_by(|a, b| a.1.total_cmp(&b.1));

        for &(i, entry) in order.iter() {
            // A closer hit may have been found in an earlier child
            if entry > nearest.t {
                continue;
            }
            if children[i].intersect(mesh, nearest, ray) {
                found = true;
            }
        }
        found
    }

    fn node_count(&self) -> usize {
        1 + self
            .children
            .as_ref()
            .map_or(0, |c| c.iter().map(OctreeNode::node_count).sum())
    }

    fn depth(&self) -> u32 {
        1 + self
            .children
            .as_ref()
            .map_or(0, |c| c.iter().map(OctreeNode::depth).max().unwrap_or(0))
    }

    fn triangle_count(&self) -> usize {
        self.triangles.len()
            + self
                .children
                .as_ref()
                .map_or(0, |c| c.iter().map(OctreeNode::triangle_count).sum())
    }
}

/// Test every triangle of a mesh without acceleration.
pub fn intersect_mesh(mesh: &Mesh, nearest: &mut Intersection, ray: &Ray) -> bool {
    let mut found = false;
    for index in 0..mesh.triangle_count() {
        if Triangle::from_mesh(mesh, index).intersect(nearest, ray) {
            found = true;
        }
    }
    found
}
