//! Scene container and nearest-hit dispatch.
//!
//! The scene owns every primitive and light by value in append-only lists.
//! A query scans all of them with one shared [`Intersection`]; whichever
//! primitive commits last is the nearest, and its kind and index are
//! remembered so the right material can be looked up afterwards.

use crate::cube::Cube;
use crate::hittable::{Hittable, Intersection};
use crate::plane::Plane;
use crate::sphere::Sphere;
use prism_core::{DirectionalLight, LightRig, Material, PointLight, SpotLight};
use prism_math::{Ray, Vec3};

/// Geometry paired with the material it is shaded with.
#[derive(Clone)]
pub struct Primitive<G> {
    pub geometry: G,
    pub material: Material,
}

impl<G> Primitive<G> {
    pub fn new(geometry: G, material: Material) -> Self {
        Self { geometry, material }
    }
}

/// What kind of object a hit landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HitKind {
    Sphere,
    Plane,
    Cube,
    PointLight,
    SpotLight,
}

impl HitKind {
    pub fn is_light(self) -> bool {
        matches!(self, HitKind::PointLight | HitKind::SpotLight)
    }
}

/// Result of a scene query: the nearest hit and what it belongs to.
#[derive(Debug, Clone, Copy)]
pub struct SceneHit {
    pub intersection: Intersection,
    pub material: Material,
    pub kind: HitKind,
    /// Index into the list for `kind`
    pub index: usize,
}

/// Handle that translates one picked scene object.
///
/// Holds an index, not a reference, so it stays valid only while the
/// scene's lists are not reordered (they are append-only).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectMover {
    Sphere(usize),
    Cube(usize),
    PointLight(usize),
    SpotLight(usize),
}

impl ObjectMover {
    /// Mover for the object behind a hit. Planes cannot be moved.
    pub fn for_hit(hit: &SceneHit) -> Option<Self> {
        match hit.kind {
            HitKind::Sphere => Some(ObjectMover::Sphere(hit.index)),
            HitKind::Cube => Some(ObjectMover::Cube(hit.index)),
            HitKind::PointLight => Some(ObjectMover::PointLight(hit.index)),
            HitKind::SpotLight => Some(ObjectMover::SpotLight(hit.index)),
            HitKind::Plane => None,
        }
    }

    /// Translate the bound object by `offset`. Returns false if the index
    /// no longer refers to an object.
    pub fn apply(&self, scene: &mut Scene, offset: Vec3) -> bool {
        match *self {
            ObjectMover::Sphere(i) => scene
                .spheres
                .get_mut(i)
                .map(|s| s.geometry.origin += offset)
                .is_some(),
            ObjectMover::Cube(i) => scene
                .cubes
                .get_mut(i)
                .map(|c| c.geometry.add_world_offset(offset))
                .is_some(),
            ObjectMover::PointLight(i) => scene
                .point_lights
                .get_mut(i)
                .map(|l| l.position += offset)
                .is_some(),
            ObjectMover::SpotLight(i) => scene
                .spot_lights
                .get_mut(i)
                .map(|l| l.position += offset)
                .is_some(),
        }
    }
}

/// All renderable objects and lights.
#[derive(Default, Clone)]
pub struct Scene {
    pub(crate) spheres: Vec<Primitive<Sphere>>,
    pub(crate) planes: Vec<Primitive<Plane>>,
    pub(crate) cubes: Vec<Primitive<Cube>>,
    pub(crate) directional_lights: Vec<DirectionalLight>,
    pub(crate) point_lights: Vec<PointLight>,
    pub(crate) spot_lights: Vec<SpotLight>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sphere(&mut self, sphere: Sphere, material: Material) -> usize {
        log::debug!("Scene: sphere {} at {:?} r={}", self.spheres.len(), sphere.origin, sphere.radius);
        self.spheres.push(Primitive::new(sphere, material));
        self.spheres.len() - 1
    }

    pub fn add_plane(&mut self, plane: Plane, material: Material) -> usize {
        log::debug!("Scene: plane {} normal {:?}", self.planes.len(), plane.normal);
        self.planes.push(Primitive::new(plane, material));
        self.planes.len() - 1
    }

    pub fn add_cube(&mut self, cube: Cube, material: Material) -> usize {
        log::debug!(
            "Scene: cube {} at {:?} ({} triangles)",
            self.cubes.len(),
            cube.position(),
            cube.mesh().triangle_count()
        );
        self.cubes.push(Primitive::new(cube, material));
        self.cubes.len() - 1
    }

    pub fn add_directional_light(&mut self, light: DirectionalLight) -> usize {
        log::debug!("Scene: directional light {} toward {:?}", self.directional_lights.len(), light.direction);
        self.directional_lights.push(light);
        self.directional_lights.len() - 1
    }

    pub fn add_point_light(&mut self, light: PointLight) -> usize {
        log::debug!("Scene: point light {} at {:?}", self.point_lights.len(), light.position);
        self.point_lights.push(light);
        self.point_lights.len() - 1
    }

    pub fn add_spot_light(&mut self, light: SpotLight) -> usize {
        log::debug!("Scene: spot light {} at {:?}", self.spot_lights.len(), light.position);
        self.spot_lights.push(light);
        self.spot_lights.len() - 1
    }

    /// Register every light in `rig`.
    pub fn add_light_rig(&mut self, rig: LightRig) {
        let rig = rig.normalized();
        for light in rig.directional {
            self.add_directional_light(light);
        }
        for light in rig.point {
            self.add_point_light(light);
        }
        for light in rig.spot {
            self.add_spot_light(light);
        }
    }

    pub fn spheres(&self) -> &[Primitive<Sphere>] {
        &self.spheres
    }

    pub fn planes(&self) -> &[Primitive<Plane>] {
        &self.planes
    }

    pub fn cubes(&self) -> &[Primitive<Cube>] {
        &self.cubes
    }

    pub fn directional_lights(&self) -> &[DirectionalLight] {
        &self.directional_lights
    }

    pub fn point_lights(&self) -> &[PointLight] {
        &self.point_lights
    }

    pub fn spot_lights(&self) -> &[SpotLight] {
        &self.spot_lights
    }

    /// Nearest hit along `ray`, optionally including the light spheres.
    pub fn find_intersection(&self, ray: &Ray, include_lights: bool) -> Option<SceneHit> {
        let mut nearest = Intersection::new();
        let mut best: Option<(HitKind, usize)> = None;

        fn scan<G: Hittable>(
            items: impl Iterator<Item = G>,
            kind: HitKind,
            nearest: &mut Intersection,
            ray: &Ray,
            best: &mut Option<(HitKind, usize)>,
        ) {
            for (index, geometry) in items.enumerate() {
                if geometry.intersect(nearest, ray) {
                    *best = Some((kind, index));
                }
            }
        }

        scan(self.planes.iter().map(|p| &p.geometry), HitKind::Plane, &mut nearest, ray, &mut best);
        scan(self.spheres.iter().map(|p| &p.geometry), HitKind::Sphere, &mut nearest, ray, &mut best);
        scan(self.cubes.iter().map(|p| &p.geometry), HitKind::Cube, &mut nearest, ray, &mut best);

        if include_lights {
            scan(
                self.point_lights.iter().map(|l| Sphere::new(l.position, l.radius)),
                HitKind::PointLight,
                &mut nearest,
                ray,
                &mut best,
            );
            scan(
                self.spot_lights.iter().map(|l| Sphere::new(l.position, l.radius)),
                HitKind::SpotLight,
                &mut nearest,
                ray,
                &mut best,
            );
        }

        let (kind, index) = best?;
        Some(SceneHit {
            intersection: nearest,
            material: self.material_of(kind, index),
            kind,
            index,
        })
    }

    /// Nearest hit including lights, plus a mover for the hit object.
    pub fn find_intersection_with_mover(&self, ray: &Ray) -> Option<(SceneHit, Option<ObjectMover>)> {
        let hit = self.find_intersection(ray, true)?;
        Some((hit, ObjectMover::for_hit(&hit)))
    }

    fn material_of(&self, kind: HitKind, index: usize) -> Material {
        match kind {
            HitKind::Sphere => self.spheres[index].material,
            HitKind::Plane => self.planes[index].material,
            HitKind::Cube => self.cubes[index].material,
            HitKind::PointLight => self.point_lights[index].material(),
            HitKind::SpotLight => self.spot_lights[index].material(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_core::Color;
    use prism_math::Mat4;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_vec(rng: &mut StdRng, extent: f32) -> Vec3 {
        Vec3::new(
            rng.gen_range(-extent..extent),
            rng.gen_range(-extent..extent),
            rng.gen_range(-extent..extent),
        )
    }

    fn random_scene(rng: &mut StdRng) -> Scene {
        let mut scene = Scene::new();
        scene.add_plane(Plane::new(Vec3::Y, Vec3::new(0.0, -20.0, 0.0)), Material::default());
        for _ in 0..12 {
            scene.add_sphere(Sphere::new(random_vec(rng, 15.0), rng.gen_range(0.5..3.0)), Material::default());
        }
        for _ in 0..6 {
            let model = Mat4::from_translation(random_vec(rng, 15.0)) * Mat4::from_scale(Vec3::splat(rng.gen_range(1.0..4.0)));
            scene.add_cube(Cube::new(model), Material::default());
        }
        for _ in 0..3 {
            scene.add_point_light(PointLight::new(random_vec(rng, 15.0), Color::ONE, 0.5));
            scene.add_spot_light(SpotLight::new(random_vec(rng, 15.0), 0.5, -Vec3::Y, 0.5, Color::ONE));
        }
        scene
    }

    /// Independent reference: the smallest t over every object.
    fn brute_force_t(scene: &Scene, ray: &Ray, include_lights: bool) -> Option<(f32, HitKind, usize)> {
        let mut best: Option<(f32, HitKind, usize)> = None;
        let mut consider = |t: f32, kind: HitKind, index: usize| {
            if best.map_or(true, |(b, _, _)| t < b) {
                best = Some((t, kind, index));
            }
        };
        let first_t = |g: &dyn Hittable| {
            let mut hit = Intersection::new();
            g.intersect(&mut hit, ray).then_some(hit.t)
        };

        for (i, p) in scene.planes().iter().enumerate() {
            if let Some(t) = first_t(&p.geometry) {
                consider(t, HitKind::Plane, i);
            }
        }
        for (i, p) in scene.spheres().iter().enumerate() {
            if let Some(t) = first_t(&p.geometry) {
                consider(t, HitKind::Sphere, i);
            }
        }
        for (i, p) in scene.cubes().iter().enumerate() {
            if let Some(t) = first_t(&p.geometry) {
                consider(t, HitKind::Cube, i);
            }
        }
        if include_lights {
            for (i, l) in scene.point_lights().iter().enumerate() {
                if let Some(t) = first_t(&Sphere::new(l.position, l.radius)) {
                    consider(t, HitKind::PointLight, i);
                }
            }
            for (i, l) in scene.spot_lights().iter().enumerate() {
                if let Some(t) = first_t(&Sphere::new(l.position, l.radius)) {
                    consider(t, HitKind::SpotLight, i);
                }
            }
        }
        best
    }

    #[test]
    fn test_nearest_hit_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(42);
        let scene = random_scene(&mut rng);

        let mut hits = 0;
        for i in 0..400 {
            let origin = random_vec(&mut rng, 40.0);
            let target = random_vec(&mut rng, 15.0);
            let ray = Ray::normalized(origin, target - origin);
            let include_lights = i % 2 == 0;

            let found = scene.find_intersection(&ray, include_lights);
            let expected = brute_force_t(&scene, &ray, include_lights);

            match (found, expected) {
                (None, None) => {}
                (Some(hit), Some((t, kind, index))) => {
                    hits += 1;
                    assert!((hit.intersection.t - t).abs() < 1e-4, "ray {ray:?}");
                    assert_eq!((hit.kind, hit.index), (kind, index), "ray {ray:?}");
                }
                (found, expected) => panic!("ray {ray:?}: found {found:?}, expected {expected:?}"),
            }
        }
        assert!(hits > 100);
    }

    #[test]
    fn test_kind_follows_nearest_not_last() {
        let mut scene = Scene::new();
        // Sphere scanned before the cube but in front of it
        scene.add_sphere(Sphere::new(Vec3::new(0.0, 0.0, 5.0), 1.0), Material::diffuse(Color::X));
        scene.add_cube(
            Cube::new(Mat4::from_translation(Vec3::new(0.0, 0.0, 20.0))),
            Material::diffuse(Color::Y),
        );

        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        let hit = scene.find_intersection(&ray, false).unwrap();
        assert_eq!(hit.kind, HitKind::Sphere);
        assert_eq!(hit.material.albedo, Color::X);
    }

    #[test]
    fn test_lights_only_when_requested() {
        let mut scene = Scene::new();
        scene.add_point_light(PointLight::new(Vec3::new(0.0, 0.0, 5.0), Color::splat(3.0), 1.0));
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);

        assert!(scene.find_intersection(&ray, false).is_none());
        let hit = scene.find_intersection(&ray, true).unwrap();
        assert_eq!(hit.kind, HitKind::PointLight);
        assert_eq!(hit.material.emission, Color::splat(3.0));
    }

    #[test]
    fn test_light_rig_registers_lights() {
        let mut scene = Scene::new();
        scene.add_light_rig(LightRig {
            directional: vec![DirectionalLight::new(-Vec3::Y, Color::ONE, 0.01)],
            point: vec![PointLight::new(Vec3::new(0.0, 0.0, 5.0), Color::splat(3.0), 1.0)],
            spot: Vec::new(),
        });
        assert_eq!(scene.directional_lights().len(), 1);
        assert_eq!(scene.point_lights().len(), 1);
        assert!(scene.spot_lights().is_empty());

        let hit = scene.find_intersection(&Ray::new(Vec3::ZERO, Vec3::Z), true).unwrap();
        assert_eq!(hit.kind, HitKind::PointLight);
    }

    #[test]
    fn test_mover_translates_hit_object() {
        let mut scene = Scene::new();
        scene.add_plane(Plane::new(Vec3::Y, Vec3::new(0.0, -1.0, 0.0)), Material::default());
        scene.add_sphere(Sphere::new(Vec3::new(0.0, 0.0, 5.0), 1.0), Material::default());
        scene.add_cube(Cube::new(Mat4::from_translation(Vec3::new(3.0, 0.0, 5.0))), Material::default());

        let (hit, mover) = scene.find_intersection_with_mover(&Ray::new(Vec3::ZERO, Vec3::Z)).unwrap();
        assert_eq!(hit.kind, HitKind::Sphere);
        let mover = mover.unwrap();
        assert_eq!(mover, ObjectMover::Sphere(0));
        assert!(mover.apply(&mut scene, Vec3::new(0.0, 2.0, 0.0)));
        assert_eq!(scene.spheres()[0].geometry.origin, Vec3::new(0.0, 2.0, 5.0));

        let ray = Ray::normalized(Vec3::new(3.0, 0.2, 0.0), Vec3::Z);
        let (_, mover) = scene.find_intersection_with_mover(&ray).unwrap();
        assert!(mover.unwrap().apply(&mut scene, Vec3::X));
        assert_eq!(scene.cubes()[0].geometry.position(), Vec3::new(4.0, 0.0, 5.0));

        // The floor is hit but cannot be moved
        let down = Ray::new(Vec3::new(0.0, 0.0, -10.0), -Vec3::Y);
        let (hit, mover) = scene.find_intersection_with_mover(&down).unwrap();
        assert_eq!(hit.kind, HitKind::Plane);
        assert!(mover.is_none());

        assert!(!ObjectMover::Sphere(7).apply(&mut scene, Vec3::X));
    }
}
