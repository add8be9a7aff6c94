//! HDR radiance to display color.

use prism_core::Color;
use prism_math::Vec3;

/// ACES filmic curve (Stephen Hill's fit of the RRT + ODT), clamped to [0, 1].
pub fn aces(color: Color) -> Color {
    let color = Vec3::new(
        color.x * 0.59719 + color.y * 0.35458 + color.z * 0.04823,
        color.x * 0.07600 + color.y * 0.90834 + color.z * 0.01566,
        color.x * 0.02840 + color.y * 0.13383 + color.z * 0.83777,
    );

    let a = color * (color + Vec3::splat(0.0245786)) - Vec3::splat(0.000090537);
    let b = color * (color * 0.983729 + Vec3::splat(0.432951)) + Vec3::splat(0.238081);
    let color = a / b;

    Vec3::new(
        color.x * 1.60475 + color.y * -0.53108 + color.z * -0.07367,
        color.x * -0.10208 + color.y * 1.10813 + color.z * -0.00605,
        color.x * -0.00327 + color.y * -0.07276 + color.z * 1.07602,
    )
    .clamp(Vec3::ZERO, Vec3::ONE)
}

/// `color^(1/gamma)` per channel.
#[inline]
pub fn gamma_encode(color: Color, gamma: f32) -> Color {
    let inv_gamma = 1.0 / gamma;
    Vec3::new(
        color.x.max(0.0).powf(inv_gamma),
        color.y.max(0.0).powf(inv_gamma),
        color.z.max(0.0).powf(inv_gamma),
    )
}

/// Pack a [0, 1] color as `0x00RRGGBB`.
#[inline]
pub fn pack_rgb(color: Color) -> u32 {
    let c = (color.clamp(Vec3::ZERO, Vec3::ONE) * 255.0 + Vec3::splat(0.5)).as_uvec3();
    (c.x << 16) | (c.y << 8) | c.z
}

#[inline]
pub fn unpack_rgb(packed: u32) -> [u8; 3] {
    [(packed >> 16) as u8, (packed >> 8) as u8, packed as u8]
}

/// Exposure, ACES, gamma and packing in one step.
pub fn to_display(radiance: Color, exposure: f32, gamma: f32) -> u32 {
    let radiance = if radiance.is_finite() { radiance } else { Color::ZERO };
    pack_rgb(gamma_encode(aces(radiance * exposure), gamma))
}
