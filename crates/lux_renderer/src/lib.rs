//! Lux renderer - CPU path tracing
//!
//! A Monte Carlo path tracer over spheres and octree-indexed triangle
//! meshes, with a bucketed parallel scheduler and noise-driven adaptive
//! refinement.

mod bucket;
mod camera;
mod error;
mod hittable;
mod material;
mod object;
mod octree;
mod progressive;
mod renderer;
mod result;
mod sampling;
mod scene;
mod sphere;

pub use bucket::{generate_buckets, render_bucket, Bucket, BucketResult, PassParams};
pub use camera::Camera;
pub use error::{RenderError, Result};
pub use hittable::{HitRecord, Hittable, HIT_EPSILON};
pub use material::{DiffuseLight, Lambertian, LightTarget, Material, Scatter};
pub use object::{Object, Shape};
pub use octree::{Octree, OctreeConfig, OctreeHit, OctreeNode, OctreeStats};
pub use progressive::{PassProgress, ProgressiveConfig, ProgressiveRenderer, ProgressiveSummary};
pub use renderer::{sample_pixel, RenderConfig, RenderStats, Renderer};
pub use result::{color_to_rgb8, NoiseMask, RenderResult, UpdateFlag};
pub use sampling::{random_cosine_direction, sample_seed};
pub use scene::{Scene, TraceSettings};
pub use sphere::Sphere;

/// Re-export common math types from lux_math
pub use lux_math::{Aabb, Color, Interval, Ray, Vec3};
