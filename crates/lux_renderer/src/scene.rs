//! Scene container and the path-tracing estimator.

use crate::hittable::{HitRecord, Hittable};
use crate::{Camera, LightTarget, Object};
use lux_math::{Aabb, Color, Ray};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Integrator parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceSettings {
    /// Bounces beyond this depth return `ambient` instead of recursing
    pub max_depth: u32,
    /// Scatter rays at the first hit; halved at each bounce, never below 1
    pub scatter_samples: u32,
    /// Radiance assumed past the depth bound
    pub ambient: Color,
}

impl Default for TraceSettings {
    fn default() -> Self {
        Self {
            max_depth: 6,
            scatter_samples: 4,
            ambient: Color::splat(0.01),
        }
    }
}

impl TraceSettings {
    /// Number of scatter rays spawned at `depth`.
    pub fn samples_at(&self, depth: u32) -> u32 {
        self.scatter_samples.checked_shr(depth).unwrap_or(0).max(1)
    }
}

/// Everything a render reads: camera, objects, light targets and the
/// integrator settings.
///
/// Call [`Scene::prepare`] after the last edit and before rendering.
pub struct Scene {
    pub camera: Camera,
    pub settings: TraceSettings,
    objects: Vec<Object>,
    light_targets: Vec<LightTarget>,
    bounds: Aabb,
}

impl Scene {
    pub fn new(camera: Camera) -> Self {
        Self {
            camera,
            settings: TraceSettings::default(),
            objects: Vec::new(),
            light_targets: Vec::new(),
            bounds: Aabb::EMPTY,
        }
    }

    pub fn with_settings(mut self, settings: TraceSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn add(&mut self, object: Object) {
        self.bounds = Aabb::surrounding(&self.bounds, &object.bounding_box());
        self.objects.push(object);
    }

    /// Register a region that diffuse surfaces should aim samples at.
    pub fn add_light_target(&mut self, target: LightTarget) {
        self.light_targets.push(target);
    }

    pub fn objects(&self) -> &[Object] {
        &self.objects
    }

    pub fn light_targets(&self) -> &[LightTarget] {
        &self.light_targets
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Cache per-object transforms. Must run before worker threads start.
    pub fn prepare(&mut self) {
        for object in &mut self.objects {
            object.prepare();
        }
        self.bounds = self
            .objects
            .iter()
            .fold(Aabb::EMPTY, |acc, o| Aabb::surrounding(&acc, &o.bounding_box()));
        log::debug!(
            "Scene prepared: {} objects, {} light targets",
            self.objects.len(),
            self.light_targets.len()
        );
    }

    pub fn is_prepared(&self) -> bool {
        self.objects.iter().all(Object::is_prepared)
    }

    /// Radiance arriving along `ray`.
    ///
    /// `depth` is 0 for camera rays. Emitters end the path; other surfaces
    /// spawn [`TraceSettings::samples_at`] scatter rays and average them.
    pub fn raytrace(&self, ray: &Ray, depth: u32, rng: &mut dyn RngCore) -> Color {
        let mut rec = HitRecord::default();
        if !self.hit(ray, &mut rec) {
            return Color::ZERO;
        }
        let Some(material) = rec.material else {
            return Color::ZERO;
        };

        if depth > self.settings.max_depth {
            return self.settings.ambient;
        }

        if material.is_emissive() {
            // Light sources seen directly are not attenuated
            if depth == 0 {
                return material.emission();
            }
            return material.emission() / (rec.t * rec.t).max(1.0);
        }

        let samples = self.settings.samples_at(depth);
        let mut sum = Color::ZERO;
        let mut taken = 0;
        for _ in 0..samples {
            taken += 1;
            let Some(scatter) = material.scatter(ray, &rec, &self.light_targets, rng) else {
                continue;
            };
            let next = Ray::new(rec.p, scatter.direction);
            sum += scatter.albedo * self.raytrace(&next, depth + 1, rng);

            // Already brighter than the display can show
            if depth == 0 && (sum / taken as f32).min_element() >= 1.0 {
                break;
            }
        }
        sum / taken as f32
    }
}

impl Hittable for Scene {
    fn hit<'a>(&'a self, ray: &Ray, rec: &mut HitRecord<'a>) -> bool {
        if ray.is_degenerate() {
            return false;
        }
        let mut hit_anything = false;
        for object in &self.objects {
            if object.hit(ray, rec) {
                hit_anything = true;
            }
        }
        hit_anything
    }

    fn bounding_box(&self) -> Aabb {
        self.bounds
    }
}
