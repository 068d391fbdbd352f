//! Surface materials.
//!
//! A material answers two questions at a hit: how much light the surface
//! emits, and where the next path segment goes together with the colour
//! it is weighted by.

use std::sync::Arc;

use crate::sampling::{gen_f32, random_cosine_direction, random_point_in, reflect};
use crate::HitRecord;
use lux_core::Texture;
use lux_math::{Aabb, Color, Ray, Vec3};
use rand::{Rng, RngCore};

/// Outcome of scattering a ray at a surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scatter {
    /// Unit direction of the continuation ray
    pub direction: Vec3,
    /// Weight applied to light arriving along `direction`
    pub albedo: Color,
}

/// A region of space worth aiming samples at, usually an emitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightTarget {
    pub bounds: Aabb,
}

impl LightTarget {
    pub fn new(bounds: Aabb) -> Self {
        Self { bounds }
    }

    /// Uniform random point inside the target region.
    pub fn sample_point(&self, rng: &mut dyn RngCore) -> Vec3 {
        random_point_in(&self.bounds, rng)
    }
}

/// Trait for materials that describe how light interacts with surfaces.
pub trait Material: Send + Sync {
    /// Light emitted by the surface. Black for most materials.
    fn emission(&self) -> Color {
        Color::ZERO
    }

    /// True if any channel of the emission is positive.
    fn is_emissive(&self) -> bool {
        self.emission().max_element() > 0.0
    }

    /// Choose a continuation direction for `ray_in` at `rec`.
    ///
    /// Returns `None` if the surface absorbs the ray.
    fn scatter(
        &self,
        ray_in: &Ray,
        rec: &HitRecord,
        lights: &[LightTarget],
        rng: &mut dyn RngCore,
    ) -> Option<Scatter>;
}

/// Diffuse-to-glossy material.
///
/// `roughness` blends between a mirror (0) and a fully diffuse surface (1)
/// and doubles as the probability of aiming a sample at a light target.
#[derive(Clone)]
pub struct Lambertian {
    albedo: Arc<Texture>,
    roughness: f32,
    emission: Color,
}

impl Lambertian {
    /// Fully diffuse, non-emissive material with a solid colour.
    pub fn new(albedo: Color) -> Self {
        Self::with_texture(Arc::new(Texture::solid_color(albedo)))
    }

    /// Fully diffuse material sampling its colour from a texture.
    pub fn with_texture(albedo: Arc<Texture>) -> Self {
        Self {
            albedo,
            roughness: 1.0,
            emission: Color::ZERO,
        }
    }

    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness.clamp(0.0, 1.0);
        self
    }

    pub fn with_emission(mut self, emission: Color) -> Self {
        self.emission = emission.max(Color::ZERO);
        self
    }

    pub fn roughness(&self) -> f32 {
        self.roughness
    }

    fn choose_direction(
        &self,
        incoming: Vec3,
        rec: &HitRecord,
        lights: &[LightTarget],
        rng: &mut dyn RngCore,
    ) -> Vec3 {
        let normal = rec.normal;

        if !lights.is_empty() && gen_f32(rng) < self.roughness {
            let target = &lights[rng.gen_range(0..lights.len())];
            let to_light = target.sample_point(rng) - rec.p;
            if to_light.dot(normal) > 0.0 {
                return to_light.normalize();
            }
        }

        let mirror = reflect(incoming, normal);
        let diffuse = random_cosine_direction(normal, rng);
        let direction = mirror.lerp(diffuse, self.roughness).normalize_or_zero();
        if direction == Vec3::ZERO {
            normal
        } else {
            direction
        }
    }
}

impl Material for Lambertian {
    fn emission(&self) -> Color {
        self.emission
    }

    fn scatter(
        &self,
        ray_in: &Ray,
        rec: &HitRecord,
        lights: &[LightTarget],
        rng: &mut dyn RngCore,
    ) -> Option<Scatter> {
        let incoming = ray_in.direction();
        let albedo = self.albedo.sample(rec.uv) * rec.normal.dot(incoming).abs();
        let direction = self.choose_direction(incoming, rec, lights, rng);
        Some(Scatter { direction, albedo })
    }
}

/// Pure emitter. Absorbs everything that hits it.
#[derive(Debug, Clone, Copy)]
pub struct DiffuseLight {
    emit: Color,
}

impl DiffuseLight {
    pub fn new(emit: Color) -> Self {
        Self { emit }
    }
}

impl Material for DiffuseLight {
    fn emission(&self) -> Color {
        self.emit
    }

    fn scatter(
        &self,
        _ray_in: &Ray,
        _rec: &HitRecord,
        _lights: &[LightTarget],
        _rng: &mut dyn RngCore,
    ) -> Option<Scatter> {
        None
    }
}
