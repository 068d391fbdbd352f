//! Geometry kernel for Lux.
//!
//! Re-exports glam for vector/matrix algebra and adds the ray, interval and
//! bounding-box types the spatial index is built on.

// Re-export glam for convenience
pub use glam::*;

mod aabb;
mod interval;
mod ray;
mod transform;

pub use aabb::Aabb;
pub use interval::Interval;
pub use ray::Ray;
pub use transform::Mat4Ext;

/// Linear RGB radiance or reflectance.
pub type Color = Vec3;
