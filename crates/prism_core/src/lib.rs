//! Prism Core - renderer-agnostic scene data.
//!
//! This crate provides:
//!
//! - **Geometry**: `Mesh`, a validated, immutable indexed triangle mesh
//! - **Surfaces**: `Material` (albedo, glossiness, metalness, emission, F0)
//! - **Lights**: `DirectionalLight`, `PointLight`, `SpotLight`, and `LightRig`
//!   for loading them from a file
//!
//! Nothing here knows about rays; the ray tracer lives in `prism_renderer`.

pub mod light;
pub mod material;
pub mod mesh;

// Re-export commonly used types
pub use light::{DirectionalLight, LightRig, PointLight, SpotLight};
pub use material::{Color, Material, DIELECTRIC_F0};
pub use mesh::{Mesh, MeshError};
