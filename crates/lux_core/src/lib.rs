//! Lux Core - scene input data for the path tracer.
//!
//! This crate provides:
//!
//! - **Geometry**: `Vertex`, `Polygon` and `TriangleMesh`
//! - **Textures**: fill colours and decoded RGB grids with nearest-pixel lookup
//! - **OBJ support**: a line-oriented Wavefront reader producing meshes
//!
//! # Example
//!
//! ```ignore
//! use lux_core::obj::load_obj;
//!
//! let mesh = load_obj("bunny.obj")?;
//! println!("Loaded {} triangles", mesh.triangle_count());
//! ```

pub mod mesh;
pub mod obj;
pub mod texture;

// Re-export commonly used types
pub use mesh::{Barycentric, Polygon, PolygonHit, TriangleMesh, Vertex};
pub use obj::{load_obj, parse_obj, ParseError, ParseResult};
pub use texture::{Texture, TextureError};
