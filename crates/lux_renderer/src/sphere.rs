//! Analytic sphere shape.

use lux_math::{Aabb, Interval, Ray, Vec2, Vec3};
use std::f32::consts::PI;

/// A sphere of fixed world-space radius. Its centre comes from the owning
/// object's transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    radius: f32,
}

impl Sphere {
    pub fn new(radius: f32) -> Self {
        Self {
            radius: radius.max(0.0),
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn bounds_at(&self, center: Vec3) -> Aabb {
        let rvec = Vec3::splat(self.radius);
        Aabb::from_points(center - rvec, center + rvec)
    }

    /// Nearest root of the ray/sphere quadratic strictly inside `ray_t`.
    pub fn intersect(&self, center: Vec3, ray: &Ray, ray_t: Interval) -> Option<f32> {
        if self.radius <= 0.0 {
            return None;
        }

        let oc = center - ray.origin();
        let a = ray.direction().length_squared();
        if a == 0.0 {
            return None;
        }
        let h = ray.direction().dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = h * h - a * c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrtd = discriminant.sqrt();

        // Find the nearest root in the acceptable range
        let mut root = (h - sqrtd) / a;
        if !ray_t.surrounds(root) {
            root = (h + sqrtd) / a;
            if !ray_t.surrounds(root) {
                return None;
            }
        }
        Some(root)
    }

    /// Spherical UV for a point on the unit sphere centered at origin.
    ///
    /// theta: angle down from +Y, phi: angle around Y from +X
    pub fn uv(p: Vec3) -> Vec2 {
        let theta = (-p.y).clamp(-1.0, 1.0).acos();
        let phi = (-p.z).atan2(p.x) + PI;
        Vec2::new(phi / (2.0 * PI), theta / PI)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_from_outside() {
        let sphere = Sphere::new(1.0);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 3.0), Vec3::NEG_Z);
        let t = sphere
            .intersect(Vec3::ZERO, &ray, Interval::new(1e-4, f32::INFINITY))
            .unwrap();
        assert!((t - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_hit_from_inside_uses_far_root() {
        let sphere = Sphere::new(2.0);
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        let t = sphere
            .intersect(Vec3::ZERO, &ray, Interval::new(1e-4, f32::INFINITY))
            .unwrap();
        assert!((t - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_miss_and_range() {
        let sphere = Sphere::new(1.0);
        let ray = Ray::new(Vec3::new(0.0, 5.0, 3.0), Vec3::NEG_Z);
        assert!(sphere
            .intersect(Vec3::ZERO, &ray, Interval::new(1e-4, f32::INFINITY))
            .is_none());

        let ray = Ray::new(Vec3::new(0.0, 0.0, 3.0), Vec3::NEG_Z);
        assert!(sphere
            .intersect(Vec3::ZERO, &ray, Interval::new(1e-4, 1.5))
            .is_none());
    }

    #[test]
    fn test_zero_radius_never_hits() {
        let sphere = Sphere::new(-1.0);
        assert_eq!(sphere.radius(), 0.0);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 3.0), Vec3::NEG_Z);
        assert!(sphere
            .intersect(Vec3::ZERO, &ray, Interval::new(1e-4, f32::INFINITY))
            .is_none());
    }

    #[test]
    fn test_sphere_uv() {
        let uv = Sphere::uv(Vec3::NEG_Y);
        assert!(uv.y.abs() < 1e-6);
        let uv = Sphere::uv(Vec3::Y);
        assert!((uv.y - 1.0).abs() < 1e-6);
        let uv = Sphere::uv(Vec3::X);
        assert!((uv.x - 0.5).abs() < 1e-6);
    }
}
