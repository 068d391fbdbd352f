use crate::{Mat4, Vec3};

/// A ray in 3D space with an origin and a direction.
///
/// Rays built with [`Ray::new`] carry a unit direction, so the parameter `t`
/// of [`Ray::at`] is a world-space distance. [`Ray::transformed`] keeps the
/// direction unnormalized on purpose: a hit found at `t` in the local space
/// of an object is then at the same `t` along the original ray.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Create a new ray, normalizing `direction`.
    ///
    /// A zero-length direction stays zero; such a ray hits nothing.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Get the origin point of the ray.
    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Get the direction vector of the ray.
    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// True when the direction has no usable length.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.direction.length_squared() < 1e-12
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Map the ray through `matrix` (typically a world-to-local inverse).
    ///
    /// Translation applies to the origin only. The direction is not
    /// renormalized, which preserves the ray parameter across spaces.
    pub fn transformed(&self, matrix: &Mat4) -> Ray {
        Ray {
            origin: matrix.transform_point3(self.origin),
            direction: matrix.transform_vector3(self.direction),
        }
    }
}

impl Default for Ray {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            direction: Vec3::Z,
        }
    }
}
