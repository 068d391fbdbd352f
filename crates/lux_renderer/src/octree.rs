//! Octree over the polygons of one mesh.
//!
//! Each node splits its box at the centre into eight octants. A polygon moves
//! down into the first octant that fully contains its bounding box; polygons
//! that straddle a split plane stay on the node. After construction every
//! node's box is shrunk to the union of what it actually holds, so sibling
//! boxes may overlap and empty children have an empty box.
//!
//! Traversal visits children front to back by slab entry distance and stops
//! as soon as the next child starts beyond the best hit found so far.

use lux_core::{Barycentric, Polygon};
use lux_math::{Aabb, Interval, Ray};
use serde::{Deserialize, Serialize};

use crate::hittable::HIT_EPSILON;

/// Construction limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OctreeConfig {
    /// Nodes deeper than this are never split
    pub max_depth: u32,
    /// Nodes holding fewer polygons than this are never split
    pub leaf_threshold: usize,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 9,
            leaf_threshold: 10_000,
        }
    }
}

/// Closest polygon hit found by a traversal.
#[derive(Debug, Clone, Copy)]
pub struct OctreeHit<'a> {
    pub t: f32,
    pub polygon: &'a Polygon,
    pub barycentric: Barycentric,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OctreeStats {
    pub nodes: usize,
    pub leaves: usize,
    pub depth: u32,
    /// Polygons kept on interior nodes because they straddle a split
    pub straddling: usize,
}

#[derive(Debug, Clone)]
pub struct OctreeNode {
    bounds: Aabb,
    polygons: Vec<Polygon>,
    /// Either empty or exactly eight octants
    children: Vec<OctreeNode>,
}

impl OctreeNode {
    fn leaf(polygons: Vec<Polygon>) -> Self {
        let bounds = polygons
            .iter()
            .fold(Aabb::EMPTY, |acc, p| Aabb::surrounding(&acc, &p.bounding_box()));
        Self {
            bounds,
            polygons,
            children: Vec::new(),
        }
    }

    fn build(polygons: Vec<Polygon>, bounds: Aabb, depth: u32, config: &OctreeConfig) -> Self {
        if depth > config.max_depth || polygons.len() < config.leaf_threshold {
            return Self::leaf(polygons);
        }

        let octants = bounds.octants();
        let mut buckets: [Vec<Polygon>; 8] = Default::default();
        let mut retained = Vec::new();
        for polygon in polygons {
            let bbox = polygon.bounding_box();
            match octants.iter().position(|o| o.contains_box(&bbox)) {
                Some(i) => buckets[i].push(polygon),
                None => retained.push(polygon),
            }
        }

        // Nothing fits in a single octant; splitting would not help
        if buckets.iter().all(Vec::is_empty) {
            return Self::leaf(retained);
        }

        let children: Vec<OctreeNode> = buckets
            .into_iter()
            .zip(octants)
            .map(|(bucket, octant)| {
                if bucket.is_empty() {
                    Self::leaf(bucket)
                } else {
                    Self::build(bucket, octant, depth + 1, config)
                }
            })
            .collect();

        let mut node = Self::leaf(retained);
        node.bounds = children
            .iter()
            .fold(node.bounds, |acc, c| Aabb::surrounding(&acc, &c.bounds));
        node.children = children;
        node
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    pub fn children(&self) -> &[OctreeNode] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    fn nearest<'a>(&'a self, ray: &Ray, best: &mut Option<OctreeHit<'a>>, best_t: &mut f32) {
        for polygon in &self.polygons {
            if let Some(hit) = polygon.intersect(ray, Interval::new(HIT_EPSILON, *best_t)) {
                *best_t = hit.t;
                *best = Some(OctreeHit {
                    t: hit.t,
                    polygon,
                    barycentric: hit.barycentric,
                });
            }
        }

        if self.children.is_empty() {
            return;
        }

        let mut order = [(0.0f32, 0usize); 8];
        let mut count = 0;
        for (i, child) in self.children.iter().enumerate() {
            if let Some((start, _end)) = child.bounds.time_to_intersect(ray) {
                if start < *best_t {
                    order[count] = (start, i);
                    count += 1;
                }
            }
        }
        let order = &mut order[..count];
        order.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

        for &(start, i) in order.iter() {
            if start >= *best_t {
                break;
            }
            self.children[i].nearest(ray, best, best_t);
        }
    }

    fn collect_stats(&self, depth: u32, stats: &mut OctreeStats) {
        stats.nodes += 1;
        stats.depth = stats.depth.max(depth);
        if self.is_leaf() {
            stats.leaves += 1;
            return;
        }
        stats.straddling += self.polygons.len();
        for child in &self.children {
            child.collect_stats(depth + 1, stats);
        }
    }
}

/// Spatial index over a mesh's polygons, in the mesh's own coordinates.
#[derive(Debug, Clone)]
pub struct Octree {
    root: OctreeNode,
    polygon_count: usize,
}

impl Octree {
    pub fn new(polygons: Vec<Polygon>) -> Self {
        Self::with_config(polygons, &OctreeConfig::default())
    }

    pub fn with_config(polygons: Vec<Polygon>, config: &OctreeConfig) -> Self {
        let polygon_count = polygons.len();
        let bounds = polygons
            .iter()
            .fold(Aabb::EMPTY, |acc, p| Aabb::surrounding(&acc, &p.bounding_box()));
        let root = OctreeNode::build(polygons, bounds, 0, config);

        let tree = Self {
            root,
            polygon_count,
        };
        let stats = tree.stats();
        log::debug!(
            "Octree: {} polygons, {} nodes ({} leaves), depth {}, {} straddling",
            polygon_count,
            stats.nodes,
            stats.leaves,
            stats.depth,
            stats.straddling
        );
        tree
    }

    pub fn root(&self) -> &OctreeNode {
        &self.root
    }

    pub fn bounds(&self) -> Aabb {
        self.root.bounds
    }

    pub fn polygon_count(&self) -> usize {
        self.polygon_count
    }

    pub fn stats(&self) -> OctreeStats {
        let mut stats = OctreeStats::default();
        self.root.collect_stats(0, &mut stats);
        stats
    }

    /// Closest polygon hit with `HIT_EPSILON < t < max_t`.
    pub fn nearest_hit(&self, ray: &Ray, max_t: f32) -> Option<OctreeHit<'_>> {
        match self.root.bounds.time_to_intersect(ray) {
            Some((start, _)) if start < max_t => {}
            _ => return None,
        }
        let mut best = None;
        let mut best_t = max_t;
        self.root.nearest(ray, &mut best, &mut best_t);
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lux_math::{Mat4, Vec2, Vec3};
    use proptest::prelude::*;

    fn brute_force<'a>(polygons: &'a [Polygon], ray: &Ray, max_t: f32) -> Option<OctreeHit<'a>> {
        let mut best: Option<OctreeHit<'a>> = None;
        for polygon in polygons {
            let limit = best.map_or(max_t, |b| b.t);
            if let Some(hit) = polygon.intersect(ray, Interval::new(HIT_EPSILON, limit)) {
                best = Some(OctreeHit {
                    t: hit.t,
                    polygon,
                    barycentric: hit.barycentric,
                });
            }
        }
        best
    }

    fn small_config() -> OctreeConfig {
        OctreeConfig {
            max_depth: 5,
            leaf_threshold: 4,
        }
    }

    fn all_polygons(node: &OctreeNode, out: &mut Vec<Polygon>) {
        out.extend_from_slice(&node.polygons);
        for child in &node.children {
            all_polygons(child, out);
        }
    }

    /// Every node's box is exactly the union of its own polygons' boxes and
    /// its children's boxes.
    fn check_bounds(node: &OctreeNode) {
        assert!(node.children.is_empty() || node.children.len() == 8);
        let mut union = Aabb::EMPTY;
        for polygon in &node.polygons {
            union = Aabb::surrounding(&union, &polygon.bounding_box());
        }
        for child in &node.children {
            check_bounds(child);
            union = Aabb::surrounding(&union, &child.bounds);
        }
        assert_eq!(node.bounds, union);
    }

    /// Small triangles scattered over a 20-unit cube.
    fn scattered_triangles(n: usize) -> Vec<Polygon> {
        (0..n)
            .map(|i| {
                let f = i as f32;
                let base = Vec3::new(
                    (f * 7.31).sin() * 10.0,
                    (f * 3.17).cos() * 10.0,
                    (f * 1.93).sin() * 10.0,
                );
                Polygon::from_positions(
                    base,
                    base + Vec3::new(0.8, 0.1, 0.0),
                    base + Vec3::new(0.0, 0.7, 0.3),
                )
            })
            .collect()
    }

    #[test]
    fn test_empty_tree() {
        let tree = Octree::new(Vec::new());
        assert!(tree.bounds().is_empty());
        assert_eq!(tree.polygon_count(), 0);
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        assert!(tree.nearest_hit(&ray, f32::INFINITY).is_none());
    }

    #[test]
    fn test_small_input_is_single_leaf() {
        let tree = Octree::new(scattered_triangles(50));
        assert!(tree.root().is_leaf());
        assert_eq!(tree.root().polygons().len(), 50);
    }

    #[test]
    fn test_subdivision_keeps_every_polygon() {
        let polygons = scattered_triangles(300);
        let tree = Octree::with_config(polygons.clone(), &small_config());
        assert!(!tree.root().is_leaf());

        let mut collected = Vec::new();
        all_polygons(tree.root(), &mut collected);
        assert_eq!(collected.len(), polygons.len());
        for polygon in &polygons {
            assert!(collected.contains(polygon));
        }

        check_bounds(tree.root());
        let stats = tree.stats();
        assert!(stats.depth >= 1 && stats.depth <= small_config().max_depth + 1);
    }

    #[test]
    fn test_straddling_polygon_stays_on_root() {
        let mut polygons = scattered_triangles(20);
        // Crosses the centre of the root box on every axis
        let big = Polygon::from_positions(
            Vec3::new(-5.0, -5.0, -5.0),
            Vec3::new(5.0, 5.0, 5.0),
            Vec3::new(5.0, -5.0, 0.0),
        );
        polygons.push(big);
        let tree = Octree::with_config(polygons, &small_config());
        assert!(tree.root().polygons().contains(&big));
    }

    #[test]
    fn test_front_to_back_finds_nearest() {
        let near = Polygon::from_positions(
            Vec3::new(-1.0, -1.0, 2.0),
            Vec3::new(1.0, -1.0, 2.0),
            Vec3::new(0.0, 1.0, 2.0),
        );
        let far = Polygon::from_positions(
            Vec3::new(-1.0, -1.0, 8.0),
            Vec3::new(1.0, -1.0, 8.0),
            Vec3::new(0.0, 1.0, 8.0),
        );
        // Clutter off to the side so the root subdivides
        let offset = Mat4::from_translation(Vec3::new(30.0, 0.0, 0.0));
        let mut polygons: Vec<Polygon> = scattered_triangles(40)
            .iter()
            .map(|p| p.transformed(&offset))
            .collect();
        polygons.push(far);
        polygons.push(near);
        let tree = Octree::with_config(polygons, &small_config());

        let ray = Ray::new(Vec3::new(0.0, 0.0, -20.0), Vec3::Z);
        let hit = tree.nearest_hit(&ray, f32::INFINITY).unwrap();
        assert!((hit.t - 22.0).abs() < 1e-4);
        assert_eq!(*hit.polygon, near);

        // Limit excludes both
        assert!(tree.nearest_hit(&ray, 21.0).is_none());
    }

    fn arb_vec3(range: f32) -> impl Strategy<Value = Vec3> {
        (-range..range, -range..range, -range..range).prop_map(|(x, y, z)| Vec3::new(x, y, z))
    }

    fn arb_polygon() -> impl Strategy<Value = Polygon> {
        (arb_vec3(10.0), arb_vec3(1.5), arb_vec3(1.5))
            .prop_map(|(a, e1, e2)| Polygon::from_positions(a, a + e1, a + e2))
    }

    /// Give polygon `i` the texture coordinates `(i, 0)`, `(i, 1)`, `(i, 2)`
    /// so any hit can be traced back to its polygon by its UV.
    fn tag_uvs(polygons: &mut [Polygon]) {
        for (i, polygon) in polygons.iter_mut().enumerate() {
            for (k, vertex) in polygon.vertices.iter_mut().enumerate() {
                vertex.uv = Vec2::new(i as f32, k as f32);
            }
        }
    }

    proptest! {
        #[test]
        fn prop_octree_matches_brute_force(
            mut polygons in prop::collection::vec(arb_polygon(), 1..120),
            origin in arb_vec3(15.0),
            target in arb_vec3(8.0),
        ) {
            prop_assume!((target - origin).length() > 1e-2);
            tag_uvs(&mut polygons);
            let ray = Ray::new(origin, target - origin);
            let tree = Octree::with_config(polygons.clone(), &small_config());
            check_bounds(tree.root());

            let expected = brute_force(&polygons, &ray, f32::INFINITY);
            let actual = tree.nearest_hit(&ray, f32::INFINITY);
            match (expected, actual) {
                (None, None) => {}
                (Some(e), Some(a)) => {
                    prop_assert!((e.t - a.t).abs() <= 1e-3 * e.t.max(1.0));
                    prop_assert_eq!(e.polygon, a.polygon);
                    prop_assert_eq!(
                        e.polygon.interpolate_uv(e.barycentric),
                        a.polygon.interpolate_uv(a.barycentric)
                    );
                }
                (e, a) => prop_assert!(false, "brute force {:?} vs octree {:?}", e.map(|h| h.t), a.map(|h| h.t)),
            }
        }
    }
}
