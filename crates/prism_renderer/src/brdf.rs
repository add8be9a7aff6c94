//! Microfacet BRDF used for direct lights, ambient samples and reflections.
//!
//! Cook-Torrance specular (GGX distribution, Smith-GGX height-correlated
//! visibility, Schlick Fresnel) plus a Fresnel-weighted Lambertian lobe.
//! Light sources are spheres of a known solid angle rather than points, so
//! specular highlights are normalized by that solid angle.

use std::f32::consts::PI;

use prism_core::{Color, Material};
use prism_math::{reflect, Vec3};

/// Additive guard for cosines that end up in a denominator.
const COSINE_EPSILON: f32 = 1e-4;
/// Additive guard for the GGX denominator, which vanishes for mirrors.
const DISTRIBUTION_EPSILON: f32 = 1e-7;
/// Representative light directions are kept at least this far above the horizon.
const MIN_HORIZON_COSINE: f32 = 0.01;

/// Direct light split into its two lobes, already scaled by radiance.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LightContribution {
    pub diffuse: Color,
    pub specular: Color,
}

impl LightContribution {
    pub fn total(&self) -> Color {
        self.diffuse + self.specular
    }
}

/// GGX `alpha^2` for a material: `(1 - glossiness)^2`.
#[inline]
pub fn roughness_sqr(glossiness: f32) -> f32 {
    let roughness = 1.0 - glossiness.clamp(0.0, 1.0);
    roughness * roughness
}

/// GGX / Trowbridge-Reitz normal distribution.
#[inline]
pub fn ggx_distribution(alpha2: f32, n_dot_h: f32) -> f32 {
    let d = n_dot_h * n_dot_h * (alpha2 - 1.0) + 1.0;
    alpha2 / (PI * d * d + DISTRIBUTION_EPSILON)
}

/// Height-correlated Smith G2 for GGX.
#[inline]
pub fn smith_ggx(alpha2: f32, n_dot_v: f32, n_dot_l: f32) -> f32 {
    let nv2 = n_dot_v * n_dot_v + COSINE_EPSILON;
    let nl2 = n_dot_l * n_dot_l + COSINE_EPSILON;
    let lambda_v = (1.0 + alpha2 * (1.0 - nv2).max(0.0) / nv2).sqrt();
    let lambda_l = (1.0 + alpha2 * (1.0 - nl2).max(0.0) / nl2).sqrt();
    2.0 / (lambda_v + lambda_l)
}

/// Schlick's approximation of Fresnel reflectance.
#[inline]
pub fn fresnel_schlick(f0: Color, cos_theta: f32) -> Color {
    let k = (1.0 - cos_theta.clamp(0.0, 1.0)).powi(5);
    f0 + (Vec3::ONE - f0) * k
}

/// Solid angle of a sphere of `radius` seen from `distance`, clamped to a
/// hemisphere when the point is inside or on the light.
#[inline]
pub fn sphere_solid_angle(radius: f32, distance: f32) -> f32 {
    if distance <= radius {
        return 2.0 * PI;
    }
    (PI * radius * radius / (distance * distance)).min(2.0 * PI)
}

/// Lambertian lobe for light arriving from `l`, integrated over `solid_angle`.
pub fn diffuse(material: &Material, n: Vec3, l: Vec3, solid_angle: f32) -> Color {
    let n_dot_l = n.dot(l).max(0.0);
    let fresnel = fresnel_schlick(material.fresnel, n_dot_l);
    material.albedo * (1.0 - material.metalness) * (Vec3::ONE - fresnel) / PI * n_dot_l * solid_angle
}

/// Cook-Torrance lobe for light arriving from `l`.
///
/// `D * solid_angle / (4 NV)` is capped at 1 so a reflected light is never
/// brighter than its own emission.
pub fn specular(material: &Material, n: Vec3, v: Vec3, l: Vec3, solid_angle: f32) -> Color {
    let h = (v + l).normalize_or_zero();
    if h == Vec3::ZERO {
        return Color::ZERO;
    }

    let alpha2 = roughness_sqr(material.glossiness);
    let n_dot_v = n.dot(v).max(COSINE_EPSILON);
    let n_dot_l = n.dot(l).max(COSINE_EPSILON);
    let n_dot_h = n.dot(h).max(0.0);
    let h_dot_l = h.dot(l).max(0.0);

    let d = ggx_distribution(alpha2, n_dot_h);
    let g = smith_ggx(alpha2, n_dot_v, n_dot_l);
    let f = fresnel_schlick(material.fresnel, h_dot_l);

    f * g * (d * solid_angle / (4.0 * n_dot_v)).min(1.0)
}

/// Both lobes for a single incoming direction, e.g. one ambient sample.
pub fn evaluate_direction(
    material: &Material,
    n: Vec3,
    v: Vec3,
    l: Vec3,
    solid_angle: f32,
    radiance: Color,
) -> LightContribution {
    LightContribution {
        diffuse: diffuse(material, n, l, solid_angle) * radiance,
        specular: specular(material, n, v, l, solid_angle) * radiance,
    }
}

/// Both lobes for a spherical light whose center lies in direction `l`.
///
/// The specular lobe is evaluated along a representative direction: the
/// mirror direction if it already points into the light's cone, otherwise
/// the closest direction on the cone, kept above the horizon.
pub fn evaluate_sphere_light(
    material: &Material,
    n: Vec3,
    v: Vec3,
    l: Vec3,
    solid_angle: f32,
    radiance: Color,
) -> LightContribution {
    let sin_radius = (solid_angle / PI).sqrt().min(1.0);

    // Entire light disk below the horizon
    if n.dot(l) < -sin_radius {
        return LightContribution::default();
    }

    let half_width = 2.0 * sin_radius.asin();
    let mirror = reflect(-v, n);
    let representative = clamp_to_cone(mirror, l, half_width);
    let representative = clamp_to_horizon(representative, n);

    LightContribution {
        diffuse: diffuse(material, n, l, solid_angle) * radiance,
        specular: specular(material, n, v, representative, solid_angle) * radiance,
    }
}

/// Closest direction to `dir` within `half_angle` of `axis`.
fn clamp_to_cone(dir: Vec3, axis: Vec3, half_angle: f32) -> Vec3 {
    let cos_half = half_angle.cos();
    let cos_dir = dir.dot(axis);
    if cos_dir >= cos_half {
        return dir;
    }

    let tangent = (dir - axis * cos_dir).normalize_or_zero();
    if tangent == Vec3::ZERO {
        return axis;
    }
    (axis * cos_half + tangent * half_angle.sin()).normalize()
}

/// Nudge `l` toward `n` until `N.L` is at least [`MIN_HORIZON_COSINE`].
fn clamp_to_horizon(l: Vec3, n: Vec3) -> Vec3 {
    let n_dot_l = n.dot(l);
    if n_dot_l >= MIN_HORIZON_COSINE {
        return l;
    }
    (l + n * (MIN_HORIZON_COSINE - n_dot_l)).try_normalize().unwrap_or(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresnel_schlick_limits() {
        let f0 = Vec3::splat(0.04);
        assert!((fresnel_schlick(f0, 1.0) - f0).length() < 1e-6);
        assert!((fresnel_schlick(f0, 0.0) - Vec3::ONE).length() < 1e-6);
    }

    #[test]
    fn test_ggx_smooth_peaks_at_normal() {
        let alpha2 = roughness_sqr(0.9);
        assert!(ggx_distribution(alpha2, 1.0) > ggx_distribution(alpha2, 0.9));
        // Fully rough GGX is uniform: 1/pi everywhere
        let rough = roughness_sqr(0.0);
        assert!((ggx_distribution(rough, 0.3) - 1.0 / PI).abs() < 1e-3);
    }

    #[test]
    fn test_smith_bounded() {
        for &alpha2 in &[0.0, 0.1, 0.5, 1.0] {
            for &nv in &[0.0, 0.01, 0.5, 1.0] {
                for &nl in &[0.0, 0.01, 0.5, 1.0] {
                    let g = smith_ggx(alpha2, nv, nl);
                    assert!(g.is_finite() && g > 0.0 && g <= 1.0, "G={g}");
                }
            }
        }
    }

    #[test]
    fn test_diffuse_energy_bound() {
        let material = Material {
            albedo: Color::ONE,
            glossiness: 0.0,
            metalness: 0.0,
            ..Material::default()
        };
        let n = Vec3::Y;
        let v = Vec3::Y;
        let bound = 1.0 / PI;

        for &solid_angle in &[1e-4, 0.01, 0.5, 1.0] {
            let c = evaluate_sphere_light(&material, n, v, Vec3::Y, solid_angle, Color::ONE);
            assert!(c.diffuse.max_element() <= bound, "{c:?}");
            // Only the Fresnel-reflected share is missing
            assert!(c.diffuse.min_element() >= 0.95 * bound * solid_angle);
        }
    }

    #[test]
    fn test_specular_never_brighter_than_light() {
        let mirror = Material::metal(Color::ONE, 0.95);
        let n = Vec3::Y;
        let v = Vec3::new(1.0, 1.0, 0.0).normalize();
        let l = Vec3::new(-1.0, 1.0, 0.0).normalize();

        let c = evaluate_sphere_light(&mirror, n, v, l, 0.05, Color::ONE);
        assert!(c.specular.max_element() <= 1.0);
        assert!(c.specular.max_element() > 0.5);
        assert_eq!(c.diffuse, Color::ZERO);
    }

    #[test]
    fn test_light_below_horizon_is_dark() {
        let material = Material::plastic(Color::ONE, 0.5);
        let c = evaluate_sphere_light(&material, Vec3::Y, Vec3::Y, -Vec3::Y, 0.01, Color::ONE);
        assert_eq!(c.total(), Color::ZERO);
    }

    #[test]
    fn test_clamp_to_cone() {
        let axis = Vec3::Z;
        let inside = Vec3::new(0.01, 0.0, 1.0).normalize();
        assert_eq!(clamp_to_cone(inside, axis, 0.1), inside);

        let outside = Vec3::X;
        let clamped = clamp_to_cone(outside, axis, 0.1);
        assert!((clamped.dot(axis) - 0.1_f32.cos()).abs() < 1e-5);
        assert!(clamped.x > 0.0);
    }

    #[test]
    fn test_clamp_to_horizon() {
        let l = clamp_to_horizon(Vec3::new(1.0, -0.2, 0.0).normalize(), Vec3::Y);
        assert!(l.y >= MIN_HORIZON_COSINE - 1e-5);
        assert!((l.length() - 1.0).abs() < 1e-5);
    }
}
