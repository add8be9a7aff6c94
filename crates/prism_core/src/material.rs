//! Surface material description.

use prism_math::Vec3;
use serde::{Deserialize, Serialize};

/// Color type alias (linear RGB)
pub type Color = Vec3;

/// Reflectance at normal incidence of common dielectrics.
pub const DIELECTRIC_F0: Vec3 = Vec3::splat(0.04);

/// A metal/roughness style material, read-only while a frame renders.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    /// Diffuse/base color, each channel in [0, 1]
    pub albedo: Color,

    /// Smoothness: 0 = fully rough, 1 = perfect mirror
    pub glossiness: f32,

    /// Metallic factor (0=dielectric, 1=metal)
    pub metalness: f32,

    /// Emitted radiance, each channel >= 0
    pub emission: Color,

    /// Fresnel reflectance at normal incidence (F0)
    pub fresnel: Color,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            albedo: Color::splat(0.5),
            glossiness: 0.0,
            metalness: 0.0,
            emission: Color::ZERO,
            fresnel: DIELECTRIC_F0,
        }
    }
}

impl Material {
    /// Fully rough dielectric.
    pub fn diffuse(albedo: Color) -> Self {
        Self {
            albedo,
            ..Default::default()
        }
    }

    /// Dielectric with a specular lobe of the given glossiness.
    pub fn plastic(albedo: Color, glossiness: f32) -> Self {
        Self {
            albedo,
            glossiness: glossiness.clamp(0.0, 1.0),
            ..Default::default()
        }
    }

    /// Metal: no diffuse, F0 tinted by the albedo.
    pub fn metal(albedo: Color, glossiness: f32) -> Self {
        Self {
            albedo,
            glossiness: glossiness.clamp(0.0, 1.0),
            metalness: 1.0,
            emission: Color::ZERO,
            fresnel: albedo,
        }
    }

    /// Pure emitter, used for light sources seen directly.
    pub fn emissive(emission: Color) -> Self {
        Self {
            albedo: Color::ZERO,
            emission,
            ..Default::default()
        }
    }

    /// Check if this material is emissive.
    pub fn is_emissive(&self) -> bool {
        self.emission.max_element() > 0.0
    }
}
