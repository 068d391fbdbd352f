//! Random sampling helpers shared by the camera, materials and scheduler.

use lux_math::{Aabb, Vec3};
use rand::{Rng, RngCore};
use std::f32::consts::PI;

/// Uniform float in `[0, 1)` from a type-erased generator.
#[inline]
pub(crate) fn gen_f32(rng: &mut dyn RngCore) -> f32 {
    rng.gen()
}

/// Cosine-weighted direction in the hemisphere around `normal`.
pub fn random_cosine_direction(normal: Vec3, rng: &mut dyn RngCore) -> Vec3 {
    let r1 = gen_f32(rng);
    let r2 = gen_f32(rng);
    let phi = 2.0 * PI * r1;
    let radius = r2.sqrt();
    let local = Vec3::new(phi.cos() * radius, phi.sin() * radius, (1.0 - r2).sqrt());

    let (tangent, bitangent) = normal.any_orthonormal_pair();
    (tangent * local.x + bitangent * local.y + normal * local.z).normalize_or_zero()
}

/// Uniform point inside a box. Flat axes stay flat.
pub fn random_point_in(bounds: &Aabb, rng: &mut dyn RngCore) -> Vec3 {
    let t = Vec3::new(gen_f32(rng), gen_f32(rng), gen_f32(rng));
    bounds.min() + (bounds.max() - bounds.min()) * t
}

/// Mirror reflection of `v` about `n`.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Seed for the generator of one camera sample.
///
/// Every `(seed, pixel, sample)` triple gets an independent stream, so a
/// pixel's samples come out the same no matter how they are split across
/// passes or worker threads.
pub fn sample_seed(seed: u64, pixel: u64, sample: u64) -> u64 {
    let mut h = splitmix64(seed ^ 0x243f_6a88_85a3_08d3);
    h = splitmix64(h ^ pixel);
    splitmix64(h ^ sample.rotate_left(32))
}

fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
