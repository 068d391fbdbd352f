//! Triangle geometry for Lux.
//!
//! Meshes are kept as a flat list of self-contained polygons rather than an
//! indexed vertex buffer: the octree copies polygons by value into its nodes,
//! and each polygon carries everything needed to shade a hit.

use lux_math::{Aabb, Interval, Mat4, Mat4Ext, Ray, Vec2, Vec3};

/// Determinants below this are treated as a ray parallel to the triangle.
const PARALLEL_EPSILON: f32 = 1e-12;

/// A polygon corner: position, shading normal and texture coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// Barycentric weights of the second and third vertex; the first vertex
/// gets `1 - u - v`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Barycentric {
    pub u: f32,
    pub v: f32,
}

impl Barycentric {
    #[inline]
    pub fn w(&self) -> f32 {
        1.0 - self.u - self.v
    }
}

/// Result of a ray/polygon test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolygonHit {
    /// Ray parameter of the hit
    pub t: f32,
    pub barycentric: Barycentric,
}

/// A triangle with per-vertex attributes and a derived face normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Polygon {
    pub vertices: [Vertex; 3],
    /// Unit face normal following counter-clockwise winding; zero for a
    /// degenerate triangle.
    pub normal: Vec3,
}

impl Polygon {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        let normal = (v1.position - v0.position)
            .cross(v2.position - v0.position)
            .normalize_or_zero();
        Self {
            vertices: [v0, v1, v2],
            normal,
        }
    }

    /// Flat-shaded triangle with zero texture coordinates.
    pub fn from_positions(p0: Vec3, p1: Vec3, p2: Vec3) -> Self {
        let normal = (p1 - p0).cross(p2 - p0).normalize_or_zero();
        let vertex = |p| Vertex::new(p, normal, Vec2::ZERO);
        Self {
            vertices: [vertex(p0), vertex(p1), vertex(p2)],
            normal,
        }
    }

    /// True when the three positions are collinear (zero area).
    pub fn is_degenerate(&self) -> bool {
        self.normal == Vec3::ZERO
    }

    pub fn positions(&self) -> [Vec3; 3] {
        self.vertices.map(|v| v.position)
    }

    pub fn bounding_box(&self) -> Aabb {
        Aabb::enclosing(self.positions())
    }

    /// Möller-Trumbore ray-triangle intersection.
    ///
    /// Reports a hit only when `t` lies strictly inside `ray_t`. Degenerate
    /// triangles and degenerate rays never hit.
    pub fn intersect(&self, ray: &Ray, ray_t: Interval) -> Option<PolygonHit> {
        let [p0, p1, p2] = self.positions();
        let edge1 = p1 - p0;
        let edge2 = p2 - p0;

        let h = ray.direction.cross(edge2);
        let a = edge1.dot(h);

        // Ray is parallel to triangle (or either one is degenerate)
        if a.abs() < PARALLEL_EPSILON {
            return None;
        }

        let f = 1.0 / a;
        let s = ray.origin - p0;
        let u = f * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = f * ray.direction.dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * edge2.dot(q);
        if !ray_t.surrounds(t) {
            return None;
        }

        Some(PolygonHit {
            t,
            barycentric: Barycentric { u, v },
        })
    }

    pub fn interpolate_uv(&self, b: Barycentric) -> Vec2 {
        let [v0, v1, v2] = &self.vertices;
        v0.uv * b.w() + v1.uv * b.u + v2.uv * b.v
    }

    /// Smooth shading normal; falls back to the face normal when the vertex
    /// normals cancel out.
    pub fn interpolate_normal(&self, b: Barycentric) -> Vec3 {
        let [v0, v1, v2] = &self.vertices;
        let n = v0.normal * b.w() + v1.normal * b.u + v2.normal * b.v;
        let n = n.normalize_or_zero();
        if n == Vec3::ZERO {
            self.normal
        } else {
            n
        }
    }

    /// Bake a transform into the polygon (positions and normals).
    pub fn transformed(&self, matrix: &Mat4) -> Polygon {
        let inverse = matrix.inverse();
        let map = |v: &Vertex| {
            Vertex::new(
                matrix.transform_point3(v.position),
                inverse.transform_normal_by_inverse(v.normal),
                v.uv,
            )
        };
        let [v0, v1, v2] = &self.vertices;
        Polygon::new(map(v0), map(v1), map(v2))
    }
}

/// A mesh as an ordered list of polygons plus its bounds.
#[derive(Clone, Debug)]
pub struct TriangleMesh {
    pub polygons: Vec<Polygon>,

    /// Axis-aligned bounding box of every vertex
    pub bounds: Aabb,
}

impl TriangleMesh {
    pub fn new(polygons: Vec<Polygon>) -> Self {
        let bounds = Self::compute_bounds(&polygons);
        Self { polygons, bounds }
    }

    /// Build from an indexed vertex buffer (every 3 indices form a triangle).
    ///
    /// Out-of-range triangles are skipped with a warning.
    pub fn from_indexed(vertices: &[Vertex], indices: &[u32]) -> Self {
        let mut polygons = Vec::with_capacity(indices.len() / 3);

        for chunk in indices.chunks_exact(3) {
            let corner = |i: u32| vertices.get(i as usize).copied();
            match (corner(chunk[0]), corner(chunk[1]), corner(chunk[2])) {
                (Some(a), Some(b), Some(c)) => polygons.push(Polygon::new(a, b, c)),
                _ => log::warn!(
                    "Invalid triangle indices: {:?}, vertex count: {}",
                    chunk,
                    vertices.len()
                ),
            }
        }

        Self::new(polygons)
    }

    /// A planar quad `a b c d` (counter-clockwise) split into two triangles,
    /// with texture coordinates spanning the unit square.
    pub fn quad(a: Vec3, b: Vec3, c: Vec3, d: Vec3) -> Self {
        let normal = (b - a).cross(d - a).normalize_or_zero();
        let vertices = [
            Vertex::new(a, normal, Vec2::new(0.0, 0.0)),
            Vertex::new(b, normal, Vec2::new(1.0, 0.0)),
            Vertex::new(c, normal, Vec2::new(1.0, 1.0)),
            Vertex::new(d, normal, Vec2::new(0.0, 1.0)),
        ];
        Self::from_indexed(&vertices, &[0, 1, 2, 0, 2, 3])
    }

    /// An axis-aligned box with outward-facing sides.
    pub fn cuboid(min: Vec3, max: Vec3) -> Self {
        let p = |x: f32, y: f32, z: f32| Vec3::new(x, y, z);
        let (a, b) = (min, max);
        let faces = [
            // -Z, +Z
            [p(a.x, a.y, a.z), p(a.x, b.y, a.z), p(b.x, b.y, a.z), p(b.x, a.y, a.z)],
            [p(a.x, a.y, b.z), p(b.x, a.y, b.z), p(b.x, b.y, b.z), p(a.x, b.y, b.z)],
            // -X, +X
            [p(a.x, a.y, a.z), p(a.x, a.y, b.z), p(a.x, b.y, b.z), p(a.x, b.y, a.z)],
            [p(b.x, a.y, a.z), p(b.x, b.y, a.z), p(b.x, b.y, b.z), p(b.x, a.y, b.z)],
            // -Y, +Y
            [p(a.x, a.y, a.z), p(b.x, a.y, a.z), p(b.x, a.y, b.z), p(a.x, a.y, b.z)],
            [p(a.x, b.y, a.z), p(a.x, b.y, b.z), p(b.x, b.y, b.z), p(b.x, b.y, a.z)],
        ];

        let mut mesh = TriangleMesh::new(Vec::new());
        for [q0, q1, q2, q3] in faces {
            mesh.append(TriangleMesh::quad(q0, q1, q2, q3));
        }
        mesh
    }

    /// Move all polygons of `other` into this mesh.
    pub fn append(&mut self, mut other: TriangleMesh) {
        self.bounds = Aabb::surrounding(&self.bounds, &other.bounds);
        self.polygons.append(&mut other.polygons);
    }

    fn compute_bounds(polygons: &[Polygon]) -> Aabb {
        polygons
            .iter()
            .fold(Aabb::EMPTY, |acc, p| Aabb::surrounding(&acc, &p.bounding_box()))
    }

    /// Get the mesh center (center of bounding box).
    pub fn center(&self) -> Vec3 {
        self.bounds.centroid()
    }

    /// Get the mesh size (diagonal length of bounding box).
    pub fn size(&self) -> f32 {
        if self.bounds.is_empty() {
            return 0.0;
        }
        (self.bounds.max() - self.bounds.min()).length()
    }

    pub fn triangle_count(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }
}
