//! Outgoing radiance at a scene hit: direct light, ambient and mirror
//! reflections.

use std::f32::consts::PI;

use crate::brdf::{self, evaluate_direction, evaluate_sphere_light, sphere_solid_angle};
use crate::scene::{Scene, SceneHit};
use crate::settings::RenderSettings;
use prism_core::{Color, Material};
use prism_math::{orthonormal_basis, reflect, Ray, Vec3};

/// Glossiness above which mirror reflections are traced.
pub const REFLECTION_GLOSSINESS_THRESHOLD: f32 = 0.9;

/// Golden ratio, for the Fibonacci hemisphere.
const GOLDEN_RATIO: f32 = 1.618_034;

/// How far secondary rays start off the surface, scaled with the magnitude
/// of the hit point so large scenes do not self-shadow.
#[inline]
fn surface_offset(point: Vec3) -> f32 {
    1e-3 + point.abs().max_element() * 1e-5
}

/// Secondary ray leaving the surface at `point` on the `n` side.
#[inline]
fn leaving_ray(point: Vec3, n: Vec3, direction: Vec3) -> Ray {
    Ray::new(point, direction).offset(n, surface_offset(point))
}

/// Direction `i` of `count` spread evenly over the +Z hemisphere.
pub fn fibonacci_hemisphere(i: u32, count: u32) -> Vec3 {
    let cos_theta = 1.0 - (2 * i + 1) as f32 / (2 * count) as f32;
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let phi = 2.0 * PI * i as f32 / GOLDEN_RATIO;
    Vec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta)
}

impl Scene {
    /// Radiance leaving `hit` back along `ray`.
    ///
    /// `depth` counts mirror bounces taken so far; primary rays pass 0.
    pub fn shade(&self, ray: &Ray, hit: &SceneHit, settings: &RenderSettings, depth: u32) -> Color {
        let material = &hit.material;
        if hit.kind.is_light() {
            return material.emission;
        }

        let point = hit.intersection.point;
        let v = -ray.direction;
        let n = hit.intersection.normal;
        // Shade whichever side the ray arrived from
        let n = if n.dot(v) < 0.0 { -n } else { n };

        let mut color = material.emission;
        color += self.direct_light(material, point, n, v, settings);
        color += self.ambient(material, point, n, v, settings);
        color += self.reflection(material, point, n, ray, settings, depth);
        color
    }

    /// Radiance for one camera ray, or the sky color on a miss.
    pub fn trace(&self, ray: &Ray, settings: &RenderSettings) -> Color {
        match self.find_intersection(ray, true) {
            Some(hit) => self.shade(ray, &hit, settings, 0),
            None => settings.sky_color,
        }
    }

    /// True if nothing opaque lies along `shadow_ray` before a light
    /// `distance` away. Hitting a light counts as visible.
    pub fn is_visible(&self, shadow_ray: &Ray, distance: f32) -> bool {
        match self.find_intersection(shadow_ray, true) {
            None => true,
            Some(hit) => hit.kind.is_light() || hit.intersection.t >= distance,
        }
    }

    fn direct_light(
        &self,
        material: &Material,
        point: Vec3,
        n: Vec3,
        v: Vec3,
        settings: &RenderSettings,
    ) -> Color {
        let mut color = Color::ZERO;

        for light in &self.directional_lights {
            let l = light.to_light();
            if settings.shadows && !self.is_visible(&leaving_ray(point, n, l), f32::INFINITY) {
                continue;
            }
            color += evaluate_sphere_light(material, n, v, l, light.solid_angle, light.radiance).total();
        }

        for light in &self.point_lights {
            let to_light = light.position - point;
            let distance = to_light.length();
            if distance <= 0.0 {
                continue;
            }
            let l = to_light / distance;
            if settings.shadows && !self.is_visible(&leaving_ray(point, n, l), distance - light.radius) {
                continue;
            }
            let solid_angle = sphere_solid_angle(light.radius, distance);
            color += evaluate_sphere_light(material, n, v, l, solid_angle, light.radiance).total();
        }

        for light in &self.spot_lights {
            let falloff = light.falloff(point);
            if falloff <= 0.0 {
                continue;
            }
            let to_light = light.position - point;
            let distance = to_light.length();
            if distance <= 0.0 {
                continue;
            }
            let l = to_light / distance;
            if settings.shadows && !self.is_visible(&leaving_ray(point, n, l), distance - light.radius) {
                continue;
            }
            let solid_angle = sphere_solid_angle(light.radius, distance);
            color += evaluate_sphere_light(material, n, v, l, solid_angle, light.radiance * falloff).total();
        }

        color
    }

    /// Flat ambient, or a Monte-Carlo estimate over the hemisphere when GI
    /// is on. GI rays ignore lights; direct lighting already counts them.
    fn ambient(&self, material: &Material, point: Vec3, n: Vec3, v: Vec3, settings: &RenderSettings) -> Color {
        if !settings.global_illumination {
            return material.albedo * settings.ambient;
        }

        let count = settings.gi_samples.max(1);
        let solid_angle = 2.0 * PI / count as f32;
        let (tangent, bitangent) = orthonormal_basis(n);

        let mut sum = Color::ZERO;
        for i in 0..count {
            let local = fibonacci_hemisphere(i, count);
            let l = tangent * local.x + bitangent * local.y + n * local.z;
            if let Some(hit) = self.find_intersection(&leaving_ray(point, n, l), false) {
                sum += evaluate_direction(material, n, v, l, solid_angle, hit.material.albedo).total();
            }
        }
        sum
    }

    fn reflection(
        &self,
        material: &Material,
        point: Vec3,
        n: Vec3,
        ray: &Ray,
        settings: &RenderSettings,
        depth: u32,
    ) -> Color {
        if !settings.reflections
            || material.glossiness <= REFLECTION_GLOSSINESS_THRESHOLD
            || depth >= settings.max_reflection_depth
        {
            return Color::ZERO;
        }

        let reflected = leaving_ray(point, n, reflect(ray.direction, n));
        let incoming = match self.find_intersection(&reflected, false) {
            Some(hit) => self.shade(&reflected, &hit, settings, depth + 1),
            None => settings.sky_color,
        };

        let fresnel = brdf::fresnel_schlick(material.fresnel, n.dot(-ray.direction).max(0.0));
        let intensity = 10.0 * material.glossiness - 9.0;
        incoming * fresnel * intensity
    }
}
