//! Pinhole camera for ray generation.

use lux_math::{Mat3, Ray, Vec2, Vec3};

/// Pinhole camera.
///
/// Rays leave `position` through an image plane one unit in front of the
/// camera, addressed by normalized coordinates in `[-1, 1]` (`u` to the
/// right, `v` up).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    position: Vec3,
    /// Columns are the camera's right, up and backward axes
    rotation: Mat3,
    /// tan(vfov / 2)
    tan_half_fov: f32,
    /// Image width over height
    aspect: f32,
}

impl Camera {
    /// Camera at the origin looking down -Z with a 60 degree vertical field
    /// of view and a 16:9 image.
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Mat3::IDENTITY,
            tan_half_fov: (30.0f32).to_radians().tan(),
            aspect: 16.0 / 9.0,
        }
    }

    /// Place the camera at `look_from` facing `look_at`.
    pub fn with_position(mut self, look_from: Vec3, look_at: Vec3, vup: Vec3) -> Self {
        self.position = look_from;
        let w = (look_from - look_at).normalize_or_zero();
        if w == Vec3::ZERO {
            log::warn!("Camera target equals its position; keeping previous orientation");
            return self;
        }
        let mut u = vup.cross(w).normalize_or_zero();
        if u == Vec3::ZERO {
            // Looking straight along the up vector
            u = w.any_orthonormal_vector();
        }
        let v = w.cross(u);
        self.rotation = Mat3::from_cols(u, v, w);
        self
    }

    /// Vertical field of view in degrees.
    pub fn with_fov(mut self, vfov: f32) -> Self {
        self.tan_half_fov = (vfov.to_radians() / 2.0).tan();
        self
    }

    pub fn with_aspect(mut self, aspect: f32) -> Self {
        self.aspect = aspect;
        self
    }

    /// Match the aspect ratio of a `width` x `height` image.
    pub fn with_resolution(self, width: u32, height: u32) -> Self {
        self.with_aspect(width as f32 / height.max(1) as f32)
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Mat3 {
        self.rotation
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Primary ray through normalized image coordinates.
    pub fn get_ray(&self, u: f32, v: f32) -> Ray {
        let local = Vec3::new(
            u * self.tan_half_fov * self.aspect,
            v * self.tan_half_fov,
            -1.0,
        );
        Ray::new(self.position, self.rotation * local)
    }

    /// Primary ray through pixel `(x, y)` of a `width` x `height` image.
    ///
    /// `offset` is the position inside the pixel, `(0.5, 0.5)` being its
    /// centre. Row 0 is the top of the image.
    pub fn pixel_ray(&self, x: u32, y: u32, width: u32, height: u32, offset: Vec2) -> Ray {
        let u = (x as f32 + offset.x) / width as f32 * 2.0 - 1.0;
        let v = 1.0 - (y as f32 + offset.y) / height as f32 * 2.0;
        self.get_ray(u, v)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}
