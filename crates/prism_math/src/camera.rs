//! Perspective camera with lazily rebuilt matrices.
//!
//! Conventions: left-handed view space (+X right, +Y up, +Z forward) and
//! reversed depth, so the near plane maps to NDC depth 1 and the far plane
//! to depth 0.

use glam::{Mat3, Mat4, Quat, Vec3, Vec4};

use crate::Ray;

/// Euler angle deltas in radians.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Angles {
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
}

impl Angles {
    pub fn new(roll: f32, pitch: f32, yaw: f32) -> Self {
        Self { roll, pitch, yaw }
    }

    /// Yaw about Y, then pitch about X, then roll about Z.
    fn to_quat(self) -> Quat {
        Quat::from_rotation_y(self.yaw)
            * Quat::from_rotation_x(self.pitch)
            * Quat::from_rotation_z(self.roll)
    }
}

/// Camera for the ray tracer and for screen-space picking.
///
/// Every mutation clears `is_updated_basis` and/or `is_updated_matrices`;
/// call [`Camera::update_matrices`] before reading any matrix or calling
/// [`Camera::reproject`]. Render tasks only ever read a camera that has
/// been updated on the driving thread.
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    rotation: Quat,

    fov_y: f32,
    aspect: f32,
    near: f32,
    far: f32,
    ev100: f32,

    view: Mat4,
    proj: Mat4,
    view_proj: Mat4,
    inv_view: Mat4,
    inv_proj: Mat4,
    inv_view_proj: Mat4,

    is_updated_basis: bool,
    is_updated_matrices: bool,
}

impl Camera {
    /// Create a camera from a position and a forward/up basis.
    ///
    /// `up` only needs to be roughly perpendicular to `forward`; it is
    /// re-orthogonalized. The returned camera has up-to-date matrices.
    pub fn new(position: Vec3, forward: Vec3, up: Vec3) -> Self {
        let mut camera = Self {
            position,
            rotation: Quat::IDENTITY,
            fov_y: 55.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 10_000.0,
            ev100: 0.0,
            view: Mat4::IDENTITY,
            proj: Mat4::IDENTITY,
            view_proj: Mat4::IDENTITY,
            inv_view: Mat4::IDENTITY,
            inv_proj: Mat4::IDENTITY,
            inv_view_proj: Mat4::IDENTITY,
            is_updated_basis: false,
            is_updated_matrices: false,
        };
        camera.set_orientation(forward, up);
        camera.update_matrices();
        camera
    }

    /// Builder: set the perspective projection.
    pub fn with_perspective(mut self, fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        self.set_perspective(fov_y, aspect, near, far);
        self.update_matrices();
        self
    }

    /// Set the perspective projection (`fov_y` in radians).
    pub fn set_perspective(&mut self, fov_y: f32, aspect: f32, near: f32, far: f32) {
        self.fov_y = fov_y;
        self.aspect = aspect;
        self.near = near;
        self.far = far;
        self.is_updated_matrices = false;
    }

    /// Update aspect ratio (e.g., on window resize)
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.is_updated_matrices = false;
    }

    pub fn set_ev100(&mut self, ev100: f32) {
        self.ev100 = ev100;
    }

    pub fn ev100(&self) -> f32 {
        self.ev100
    }

    /// Linear scale applied to HDR radiance before tone mapping.
    pub fn exposure(&self) -> f32 {
        1.0 / (1.2 * 2.0_f32.powf(self.ev100))
    }

    pub fn fov_y(&self) -> f32 {
        self.fov_y
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    /// Point the camera along `forward` with `up` as the approximate up vector.
    pub fn set_orientation(&mut self, forward: Vec3, up: Vec3) {
        let forward = forward.normalize();
        let right = up.cross(forward).normalize();
        let up = forward.cross(right);
        self.rotation = Quat::from_mat3(&Mat3::from_cols(right, up, forward)).normalize();
        self.invalidate();
    }

    pub fn set_world_offset(&mut self, position: Vec3) {
        self.position = position;
        self.invalidate();
    }

    pub fn add_world_offset(&mut self, offset: Vec3) {
        self.position += offset;
        self.invalidate();
    }

    /// Move along the camera's own axes: x = right, y = up, z = forward.
    pub fn add_relative_offset(&mut self, offset: Vec3) {
        self.position += self.rotation * offset;
        self.invalidate();
    }

    /// Rotate about the world axes.
    pub fn add_world_angles(&mut self, angles: Angles) {
        self.rotation = (angles.to_quat() * self.rotation).normalize();
        self.invalidate();
    }

    /// Rotate about the camera's current axes.
    pub fn add_relative_angles(&mut self, angles: Angles) {
        self.rotation = (self.rotation * angles.to_quat()).normalize();
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.is_updated_basis = false;
        self.is_updated_matrices = false;
    }

    pub fn is_updated_basis(&self) -> bool {
        self.is_updated_basis
    }

    pub fn is_updated_matrices(&self) -> bool {
        self.is_updated_matrices
    }

    /// Rebuild the inverse-view (camera-to-world) matrix if stale.
    pub fn update_basis(&mut self) {
        if self.is_updated_basis {
            return;
        }
        self.inv_view = Mat4::from_rotation_translation(self.rotation, self.position);
        self.is_updated_basis = true;
    }

    /// Rebuild every derived matrix if stale.
    pub fn update_matrices(&mut self) {
        self.update_basis();
        if self.is_updated_matrices {
            return;
        }
        self.view = self.inv_view.inverse();
        self.proj = reversed_perspective_lh(self.fov_y, self.aspect, self.near, self.far);
        self.inv_proj = self.proj.inverse();
        self.view_proj = self.proj * self.view;
        self.inv_view_proj = self.inv_view * self.inv_proj;
        self.is_updated_matrices = true;
    }

    // Basis accessors read the inverse-view columns.

    pub fn position(&self) -> Vec3 {
        debug_assert!(self.is_updated_basis, "camera basis read while stale");
        self.inv_view.w_axis.truncate()
    }

    pub fn right(&self) -> Vec3 {
        debug_assert!(self.is_updated_basis, "camera basis read while stale");
        self.inv_view.x_axis.truncate()
    }

    pub fn up(&self) -> Vec3 {
        debug_assert!(self.is_updated_basis, "camera basis read while stale");
        self.inv_view.y_axis.truncate()
    }

    pub fn forward(&self) -> Vec3 {
        debug_assert!(self.is_updated_basis, "camera basis read while stale");
        self.inv_view.z_axis.truncate()
    }

    pub fn view(&self) -> Mat4 {
        debug_assert!(self.is_updated_matrices, "camera matrices read while stale");
        self.view
    }

    pub fn proj(&self) -> Mat4 {
        debug_assert!(self.is_updated_matrices, "camera matrices read while stale");
        self.proj
    }

    pub fn view_proj(&self) -> Mat4 {
        debug_assert!(self.is_updated_matrices, "camera matrices read while stale");
        self.view_proj
    }

    pub fn inv_view(&self) -> Mat4 {
        debug_assert!(self.is_updated_basis, "camera basis read while stale");
        self.inv_view
    }

    pub fn inv_view_proj(&self) -> Mat4 {
        debug_assert!(self.is_updated_matrices, "camera matrices read while stale");
        self.inv_view_proj
    }

    /// Unproject an NDC coordinate (x, y in [-1, 1], +y up) on the near
    /// plane to a world-space point.
    pub fn reproject(&self, ndc_x: f32, ndc_y: f32) -> Vec3 {
        let p = self.inv_view_proj() * Vec4::new(ndc_x, ndc_y, 1.0, 1.0);
        p.truncate() / p.w
    }

    /// Unit-direction ray from the camera through an NDC coordinate.
    pub fn generate_ray(&self, ndc_x: f32, ndc_y: f32) -> Ray {
        let origin = self.position();
        Ray::normalized(origin, self.reproject(ndc_x, ndc_y) - origin)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::Z, Vec3::Y)
    }
}

/// Left-handed perspective projection with reversed depth.
fn reversed_perspective_lh(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    let f = 1.0 / (0.5 * fov_y).tan();
    let depth_scale = near / (near - far);
    Mat4::from_cols(
        Vec4::new(f / aspect, 0.0, 0.0, 0.0),
        Vec4::new(0.0, f, 0.0, 0.0),
        Vec4::new(0.0, 0.0, depth_scale, 1.0),
        Vec4::new(0.0, 0.0, -far * depth_scale, 0.0),
    )
}
