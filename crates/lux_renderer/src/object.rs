//! Renderable objects: a shape, a material and a placement.

use std::sync::Arc;

use crate::hittable::{HitRecord, Hittable};
use crate::octree::{Octree, OctreeConfig};
use crate::sphere::Sphere;
use crate::Material;
use lux_core::TriangleMesh;
use lux_math::{Aabb, Mat4, Mat4Ext, Ray, Vec3};

/// Geometry of an object.
#[derive(Debug, Clone)]
pub enum Shape {
    Sphere(Sphere),
    /// Polygons in model space, indexed by an octree
    Mesh(Octree),
}

/// A shape placed in the world with a material.
///
/// The world-to-model matrix is cached by [`Object::prepare`]; an object
/// that has not been prepared reports no hits.
#[derive(Clone)]
pub struct Object {
    shape: Shape,
    material: Arc<dyn Material>,
    transform: Mat4,
    inverse: Option<Mat4>,
    bounds: Aabb,
}

impl Object {
    pub fn new(shape: Shape, material: Arc<dyn Material>) -> Self {
        let mut object = Self {
            shape,
            material,
            transform: Mat4::IDENTITY,
            inverse: None,
            bounds: Aabb::EMPTY,
        };
        object.bounds = object.world_bounds();
        object
    }

    /// Sphere of the given world-space radius, centred at the transform's
    /// translation.
    pub fn sphere(radius: f32, material: Arc<dyn Material>) -> Self {
        Self::new(Shape::Sphere(Sphere::new(radius)), material)
    }

    pub fn mesh(mesh: TriangleMesh, material: Arc<dyn Material>) -> Self {
        Self::mesh_with_config(mesh, material, &OctreeConfig::default())
    }

    pub fn mesh_with_config(
        mesh: TriangleMesh,
        material: Arc<dyn Material>,
        config: &OctreeConfig,
    ) -> Self {
        Self::new(Shape::Mesh(Octree::with_config(mesh.polygons, config)), material)
    }

    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.set_transform(transform);
        self
    }

    /// Move the object. Invalidates the cached inverse.
    pub fn set_transform(&mut self, transform: Mat4) {
        self.transform = transform;
        self.inverse = None;
        self.bounds = self.world_bounds();
    }

    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn material(&self) -> &dyn Material {
        self.material.as_ref()
    }

    /// Cache the world-to-model matrix. Must run before rendering.
    pub fn prepare(&mut self) {
        self.inverse = Some(self.transform.inverse());
    }

    pub fn is_prepared(&self) -> bool {
        self.inverse.is_some()
    }

    /// World-space centre of a sphere (the transformed origin).
    pub fn center(&self) -> Vec3 {
        self.transform.transform_point3(Vec3::ZERO)
    }

    fn world_bounds(&self) -> Aabb {
        match &self.shape {
            Shape::Sphere(sphere) => sphere.bounds_at(self.center()),
            Shape::Mesh(octree) => self.transform.transform_aabb(&octree.bounds()),
        }
    }
}

impl Hittable for Object {
    fn hit<'a>(&'a self, ray: &Ray, rec: &mut HitRecord<'a>) -> bool {
        let Some(inverse) = self.inverse else {
            return false;
        };
        match self.bounds.time_to_intersect(ray) {
            Some((start, _)) if start < rec.t => {}
            _ => return false,
        }

        match &self.shape {
            Shape::Sphere(sphere) => {
                let center = self.center();
                let Some(t) = sphere.intersect(center, ray, rec.search_interval()) else {
                    return false;
                };
                rec.t = t;
                rec.p = ray.at(t);
                let outward_normal = (rec.p - center) / sphere.radius();
                rec.set_face_normal(ray, outward_normal);
                rec.uv = Sphere::uv(outward_normal);
            }
            Shape::Mesh(octree) => {
                // Direction stays unnormalized so t means the same in both spaces
                let local = ray.transformed(&inverse);
                let Some(hit) = octree.nearest_hit(&local, rec.t) else {
                    return false;
                };
                rec.t = hit.t;
                rec.p = ray.at(hit.t);
                let normal = inverse.transform_normal_by_inverse(
                    hit.polygon.interpolate_normal(hit.barycentric),
                );
                rec.set_face_normal(ray, normal);
                rec.uv = hit.polygon.interpolate_uv(hit.barycentric);
            }
        }
        rec.material = Some(self.material.as_ref());
        true
    }

    fn bounding_box(&self) -> Aabb {
        self.bounds
    }
}
