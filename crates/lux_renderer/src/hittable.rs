//! Hittable trait and HitRecord for ray-object intersection.

use crate::Material;
use lux_math::{Aabb, Interval, Ray, Vec2, Vec3};

/// Hits at or below this distance are treated as self-intersections.
pub const HIT_EPSILON: f32 = 1e-4;

/// Record of a ray-object intersection.
///
/// `t` doubles as the search limit: it starts at infinity and each
/// successful [`Hittable::hit`] shrinks it, so later objects only report
/// hits that are strictly closer.
#[derive(Clone)]
pub struct HitRecord<'a> {
    /// Distance along the ray of the best hit so far
    pub t: f32,
    /// Point of intersection
    pub p: Vec3,
    /// Surface normal at intersection (always points against the ray)
    pub normal: Vec3,
    /// Texture coordinates
    pub uv: Vec2,
    /// Whether the ray hit the outward-facing side
    pub front_face: bool,
    /// Material of the hit object, `None` until something is hit
    pub material: Option<&'a dyn Material>,
}

impl<'a> Default for HitRecord<'a> {
    fn default() -> Self {
        Self {
            t: f32::INFINITY,
            p: Vec3::ZERO,
            normal: Vec3::ZERO,
            uv: Vec2::ZERO,
            front_face: false,
            material: None,
        }
    }
}

impl<'a> HitRecord<'a> {
    /// Distances a new hit may take to replace the current one.
    pub fn search_interval(&self) -> Interval {
        Interval::new(HIT_EPSILON, self.t)
    }

    /// True once something has been hit.
    pub fn is_hit(&self) -> bool {
        self.material.is_some()
    }

    /// Set the face normal based on ray direction and outward normal.
    ///
    /// The stored normal always points against the ray; `front_face`
    /// remembers which side was hit.
    pub fn set_face_normal(&mut self, ray: &Ray, outward_normal: Vec3) {
        self.front_face = ray.direction().dot(outward_normal) < 0.0;
        self.normal = if self.front_face {
            outward_normal
        } else {
            -outward_normal
        };
    }
}

/// Trait for objects that can be hit by rays.
pub trait Hittable: Send + Sync {
    /// Look for a hit closer than `rec.t`.
    ///
    /// Returns true and overwrites `rec` only when a closer hit is found.
    fn hit<'a>(&'a self, ray: &Ray, rec: &mut HitRecord<'a>) -> bool;

    /// World-space bounding box.
    fn bounding_box(&self) -> Aabb;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_record_searches_everything() {
        let rec = HitRecord::default();
        assert!(!rec.is_hit());
        let range = rec.search_interval();
        assert!(range.surrounds(1e6));
        assert!(!range.surrounds(HIT_EPSILON));
    }

    #[test]
    fn test_face_normal_opposes_ray() {
        let mut rec = HitRecord::default();
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);

        rec.set_face_normal(&ray, Vec3::Z);
        assert!(rec.front_face);
        assert_eq!(rec.normal, Vec3::Z);

        rec.set_face_normal(&ray, Vec3::NEG_Z);
        assert!(!rec.front_face);
        assert_eq!(rec.normal, Vec3::Z);
    }
}
