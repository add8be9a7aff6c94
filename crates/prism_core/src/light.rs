//! Light source descriptions.
//!
//! Point and spot lights are small spheres: they have a radius, show up as
//! emissive spheres when a camera ray hits them, and their apparent solid
//! angle shrinks with distance.

use prism_math::Vec3;
use serde::{Deserialize, Serialize};

use crate::material::{Color, Material};

/// Distant light (sun): no position, no distance falloff.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    /// Direction the light travels, from the light into the scene
    pub direction: Vec3,
    pub radiance: Color,
    /// Apparent size of the light disk in steradians
    pub solid_angle: f32,
}

impl DirectionalLight {
    pub fn new(direction: Vec3, radiance: Color, solid_angle: f32) -> Self {
        Self {
            direction: direction.normalize(),
            radiance,
            solid_angle,
        }
    }

    /// Unit vector from a surface toward the light.
    #[inline]
    pub fn to_light(&self) -> Vec3 {
        -self.direction
    }
}

/// Spherical light emitting uniformly in all directions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    pub position: Vec3,
    pub radiance: Color,
    pub radius: f32,
}

impl PointLight {
    pub fn new(position: Vec3, radiance: Color, radius: f32) -> Self {
        Self {
            position,
            radiance,
            radius,
        }
    }

    /// Material seen when a ray hits the light sphere itself.
    pub fn material(&self) -> Material {
        Material::emissive(self.radiance)
    }
}

/// Spherical light restricted to a cone.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpotLight {
    pub position: Vec3,
    pub radius: f32,
    /// Cone axis, from the light into the scene
    pub direction: Vec3,
    /// Cone half-angle in radians
    pub angle: f32,
    pub radiance: Color,
}

impl SpotLight {
    /// Fraction of the cone half-angle over which intensity fades to zero.
    const EDGE_SOFTNESS: f32 = 0.2;

    pub fn new(position: Vec3, radius: f32, direction: Vec3, angle: f32, radiance: Color) -> Self {
        Self {
            position,
            radius,
            direction: direction.normalize(),
            angle,
            radiance,
        }
    }

    pub fn material(&self) -> Material {
        Material::emissive(self.radiance)
    }

    /// Intensity factor in [0, 1] for a point: 1 well inside the cone,
    /// fading at the rim, 0 outside the half-angle.
    pub fn falloff(&self, point: Vec3) -> f32 {
        let to_point = (point - self.position).normalize_or_zero();
        let cos_angle = to_point.dot(self.direction);

        let cos_outer = self.angle.cos();
        let cos_inner = (self.angle * (1.0 - Self::EDGE_SOFTNESS)).cos();
        if cos_angle <= cos_outer {
            return 0.0;
        }
        if cos_angle >= cos_inner {
            return 1.0;
        }
        let x = (cos_angle - cos_outer) / (cos_inner - cos_outer);
        x * x * (3.0 - 2.0 * x)
    }
}

/// A set of lights, as stored in a JSON lighting file.
///
/// Missing lists are empty. Directions read from a file need not be unit
/// length; [`LightRig::normalized`] fixes them up.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightRig {
    pub directional: Vec<DirectionalLight>,
    pub point: Vec<PointLight>,
    pub spot: Vec<SpotLight>,
}

impl LightRig {
    /// Same lights with every direction normalized.
    pub fn normalized(self) -> Self {
        Self {
            directional: self
                .directional
                .into_iter()
                .map(|l| DirectionalLight::new(l.direction, l.radiance, l.solid_angle))
                .collect(),
            point: self.point,
            spot: self
                .spot
                .into_iter()
                .map(|l| SpotLight::new(l.position, l.radius, l.direction, l.angle, l.radiance))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.directional.is_empty() && self.point.is_empty() && self.spot.is_empty()
    }
}
