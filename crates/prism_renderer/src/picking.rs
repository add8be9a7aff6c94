//! Screen-space picking and dragging of scene objects.

use crate::scene::{ObjectMover, Scene, SceneHit};
use prism_math::{Camera, Vec3};

/// Object under the normalized device coordinate `(ndc_x, ndc_y)`, with a
/// mover if the object can be moved.
///
/// Brings the camera's cached matrices up to date first.
pub fn pick(scene: &Scene, camera: &mut Camera, ndc_x: f32, ndc_y: f32) -> Option<(SceneHit, Option<ObjectMover>)> {
    camera.update_matrices();
    let ray = camera.generate_ray(ndc_x, ndc_y);
    scene.find_intersection_with_mover(&ray)
}

/// Moves a grabbed object so the grabbed point stays under the cursor at a
/// fixed distance from the camera.
#[derive(Debug, Clone, Copy)]
pub struct Dragger {
    mover: ObjectMover,
    grab_point: Vec3,
    distance: f32,
}

impl Dragger {
    /// Grab whatever movable object is under the cursor.
    pub fn grab(scene: &Scene, camera: &mut Camera, ndc_x: f32, ndc_y: f32) -> Option<Self> {
        let (hit, mover) = pick(scene, camera, ndc_x, ndc_y)?;
        Some(Self {
            mover: mover?,
            grab_point: hit.intersection.point,
            distance: hit.intersection.t,
        })
    }

    pub fn mover(&self) -> ObjectMover {
        self.mover
    }

    pub fn grab_point(&self) -> Vec3 {
        self.grab_point
    }

    /// Follow the cursor to a new position. Returns false if the grabbed
    /// object no longer exists.
    pub fn drag_to(&mut self, scene: &mut Scene, camera: &mut Camera, ndc_x: f32, ndc_y: f32) -> bool {
        camera.update_matrices();
        let target = camera.generate_ray(ndc_x, ndc_y).at(self.distance);
        let moved = self.mover.apply(scene, target - self.grab_point);
        if moved {
            self.grab_point = target;
        }
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plane::Plane;
    use crate::scene::HitKind;
    use crate::sphere::Sphere;
    use prism_core::Material;
    use prism_math::Angles;

    fn scene_and_camera() -> (Scene, Camera) {
        let mut scene = Scene::new();
        scene.add_plane(Plane::new(Vec3::Y, Vec3::new(0.0, -5.0, 0.0)), Material::default());
        scene.add_sphere(Sphere::new(Vec3::new(0.0, 0.0, 10.0), 1.0), Material::default());
        let camera = Camera::new(Vec3::ZERO, Vec3::Z, Vec3::Y).with_perspective(60.0_f32.to_radians(), 1.0, 0.1, 100.0);
        (scene, camera)
    }

    #[test]
    fn test_pick_center() {
        let (scene, mut camera) = scene_and_camera();
        let (hit, mover) = pick(&scene, &mut camera, 0.0, 0.0).unwrap();
        assert_eq!(hit.kind, HitKind::Sphere);
        assert!((hit.intersection.t - 9.0).abs() < 1e-3);
        assert_eq!(mover, Some(ObjectMover::Sphere(0)));
    }

    #[test]
    fn test_floor_not_grabbable() {
        let (scene, mut camera) = scene_and_camera();
        let (hit, mover) = pick(&scene, &mut camera, 0.0, -0.9).unwrap();
        assert_eq!(hit.kind, HitKind::Plane);
        assert!(mover.is_none());
        assert!(Dragger::grab(&scene, &mut camera, 0.0, -0.9).is_none());
    }

    #[test]
    fn test_drag_keeps_distance() {
        let (mut scene, mut camera) = scene_and_camera();
        let mut dragger = Dragger::grab(&scene, &mut camera, 0.0, 0.0).unwrap();

        assert!(dragger.drag_to(&mut scene, &mut camera, 0.2, 0.0));
        let ray = camera.generate_ray(0.2, 0.0);
        let expected_grab = ray.at(9.0);
        assert!((dragger.grab_point() - expected_grab).length() < 1e-3);

        // The sphere moved by the same offset as the grab point
        let center = scene.spheres()[0].geometry.origin;
        let offset = expected_grab - Vec3::new(0.0, 0.0, 9.0);
        assert!((center - (Vec3::new(0.0, 0.0, 10.0) + offset)).length() < 1e-3);
        assert!(center.x > 0.0);
    }

    #[test]
    fn test_pick_after_camera_moves() {
        let mut scene = Scene::new();
        scene.add_sphere(Sphere::new(Vec3::new(5.0, 0.0, 10.0), 1.0), Material::default());
        let mut camera = Camera::new(Vec3::ZERO, Vec3::Z, Vec3::Y).with_perspective(60.0_f32.to_radians(), 1.0, 0.1, 100.0);
        assert!(pick(&scene, &mut camera, 0.0, 0.0).is_none());

        camera.add_world_offset(Vec3::new(5.0, 0.0, 0.0));
        let (hit, mover) = pick(&scene, &mut camera, 0.0, 0.0).unwrap();
        assert_eq!(mover, Some(ObjectMover::Sphere(0)));
        assert!((hit.intersection.t - 9.0).abs() < 1e-3);
    }

    #[test]
    fn test_drag_after_camera_turns() {
        let (mut scene, mut camera) = scene_and_camera();
        let mut dragger = Dragger::grab(&scene, &mut camera, 0.0, 0.0).unwrap();

        // Turning the camera without moving the cursor still drags along its new view ray
        camera.add_world_angles(Angles::new(0.0, 0.0, 10.0_f32.to_radians()));
        assert!(dragger.drag_to(&mut scene, &mut camera, 0.0, 0.0));
        let grab = camera.position() + camera.forward() * 9.0;
        assert!((dragger.grab_point() - grab).length() < 1e-3);
        // The sphere center keeps its offset from the grabbed front point
        let center = scene.spheres()[0].geometry.origin;
        assert!((center - (grab + Vec3::Z)).length() < 1e-3, "{center:?}");
    }
}
