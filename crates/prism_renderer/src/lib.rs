//! Prism Renderer - CPU ray tracing and shading
//!
//! Whitted-style ray tracer over spheres, planes and mesh instances, with a
//! microfacet shading model, optional Monte-Carlo ambient and recursive
//! mirror reflections. Frames are rendered one task per pixel on a
//! persistent worker pool.

mod brdf;
mod cube;
mod executor;
mod hittable;
mod octree;
mod picking;
mod plane;
mod renderer;
mod scene;
mod settings;
mod shading;
mod sphere;
mod tonemap;
mod triangle;

pub use brdf::{
    evaluate_direction, evaluate_sphere_light, fresnel_schlick, ggx_distribution, roughness_sqr, smith_ggx,
    sphere_solid_angle, LightContribution,
};
pub use cube::Cube;
pub use executor::{default_thread_count, half_thread_count, ExecutorError, ParallelExecutor};
pub use hittable::{Hittable, Intersection};
pub use octree::{intersect_mesh, TriangleOctree, MAX_STRETCHING_RATIO, PREFERRED_TRIANGLE_COUNT};
pub use picking::{pick, Dragger};
pub use plane::Plane;
pub use renderer::{pixel_to_ndc, render_pixel, FrameBuffer, FrameRenderer};
pub use scene::{HitKind, ObjectMover, Primitive, Scene, SceneHit};
pub use settings::RenderSettings;
pub use shading::{fibonacci_hemisphere, REFLECTION_GLOSSINESS_THRESHOLD};
pub use sphere::Sphere;
pub use tonemap::{aces, gamma_encode, pack_rgb, to_display, unpack_rgb};
pub use triangle::Triangle;

/// Re-export the scene data and math types the renderer API is written in
pub use prism_core::{Color, DirectionalLight, LightRig, Material, Mesh, PointLight, SpotLight};
pub use prism_math::{Camera, Ray, Vec3};
