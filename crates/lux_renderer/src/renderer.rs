//! Parallel render scheduler.
//!
//! A render call splits the image into buckets, samples them on a
//! dedicated worker pool and streams finished buckets back to the calling
//! thread, which is the only writer of the [`RenderResult`].

use std::sync::mpsc;
use std::time::{Duration, Instant};

use lux_math::{Color, Vec2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::bucket::{generate_buckets, render_bucket, PassParams, DEFAULT_BUCKET_HEIGHT, DEFAULT_BUCKET_WIDTH};
use crate::error::{RenderError, Result};
use crate::sampling::sample_seed;
use crate::{RenderResult, Scene};

/// Scheduler configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub block_width: u32,
    pub block_height: u32,
    /// Worker threads (0 lets rayon decide)
    pub threads: usize,
    /// Base seed for every camera sample
    pub seed: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            block_width: DEFAULT_BUCKET_WIDTH,
            block_height: DEFAULT_BUCKET_HEIGHT,
            threads: 16,
            seed: 0,
        }
    }
}

/// Summary of one render call.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RenderStats {
    pub pixels: usize,
    pub samples: u64,
    pub elapsed: Duration,
}

/// Radiance of one camera sample.
///
/// Sample 0 goes through the pixel centre; later samples are jittered.
/// Each sample draws from its own generator, so the value depends only on
/// `(seed, pixel, index)`.
pub fn sample_pixel(scene: &Scene, x: u32, y: u32, width: u32, height: u32, index: u32, seed: u64) -> Color {
    let pixel = y as u64 * width as u64 + x as u64;
    let mut rng = StdRng::seed_from_u64(sample_seed(seed, pixel, index as u64));
    let offset = if index == 0 {
        Vec2::splat(0.5)
    } else {
        Vec2::new(rng.gen(), rng.gen())
    };
    let ray = scene.camera.pixel_ray(x, y, width, height, offset);
    scene.raytrace(&ray, 0, &mut rng)
}

/// Path tracer driving a fixed-size worker pool.
pub struct Renderer {
    config: RenderConfig,
    pool: rayon::ThreadPool,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Result<Self> {
        if config.block_width == 0 || config.block_height == 0 {
            return Err(RenderError::InvalidConfig(format!(
                "block size must be non-zero, got {}x{}",
                config.block_width, config.block_height
            )));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .thread_name(|i| format!("lux-worker-{i}"))
            .build()?;
        log::debug!("Render pool: {} threads", pool.current_num_threads());
        Ok(Self { config, pool })
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Empty result buffer for a `width` x `height` image.
    pub fn create_result(&self, width: u32, height: u32) -> RenderResult {
        RenderResult::new(width, height)
    }

    /// Take `samples` new samples for every pixel accepted by `predicate`
    /// and merge them into `result`.
    ///
    /// `prior_samples` is the weight of the existing averages; `None` uses
    /// each pixel's tracked sample count. `on_progress` receives the
    /// fraction of the image finished after every bucket.
    pub fn render<P, F>(
        &self,
        scene: &Scene,
        result: &mut RenderResult,
        samples: u32,
        prior_samples: Option<u32>,
        predicate: P,
        mut on_progress: F,
    ) -> Result<RenderStats>
    where
        P: Fn(u32, u32) -> bool + Sync,
        F: FnMut(f32),
    {
        let (width, height) = (result.width(), result.height());
        if result.pixel_count() == 0 {
            return Err(RenderError::EmptyImage { width, height });
        }
        if !scene.is_prepared() {
            return Err(RenderError::SceneNotPrepared);
        }
        if samples == 0 {
            return Err(RenderError::InvalidConfig("samples per pixel must be positive".into()));
        }

        let start = Instant::now();
        let buckets = generate_buckets(width, height, self.config.block_width, self.config.block_height);
        let first_sample = match prior_samples {
            Some(prior) => vec![prior; result.pixel_count()],
            None => result.sample_counts().to_vec(),
        };
        let highest = first_sample.iter().copied().max().unwrap_or(0);
        if highest.checked_add(samples).is_none() {
            return Err(RenderError::InvalidConfig(format!(
                "{} prior samples plus {} new ones overflow the sample count",
                highest, samples
            )));
        }
        let pass = PassParams {
            image_width: width,
            image_height: height,
            samples,
            seed: self.config.seed,
            first_sample: &first_sample,
        };
        log::debug!("Rendering {} buckets at {} spp", buckets.len(), samples);

        let total = result.pixel_count() as f32;
        let mut finished = 0usize;
        let mut stats = RenderStats::default();
        let updated = result.updated();

        std::thread::scope(|scope| {
            let (tx, rx) = mpsc::channel();
            let buckets = &buckets;
            let pass = &pass;
            let predicate = &predicate;
            scope.spawn(move || {
                self.pool.install(|| {
                    buckets.par_iter().for_each_with(tx, |tx, bucket| {
                        // The receiver only goes away if the merging thread panicked
                        let _ = tx.send(render_bucket(bucket, scene, pass, predicate));
                    });
                });
            });

            for bucket_result in rx {
                for (x, y, sum) in bucket_result.iter() {
                    result.accumulate(x, y, sum, samples, prior_samples);
                    stats.pixels += 1;
                }
                updated.mark();
                finished += bucket_result.bucket.pixel_count() as usize;
                on_progress(finished as f32 / total);
            }
        });

        stats.samples = stats.pixels as u64 * samples as u64;
        stats.elapsed = start.elapsed();
        log::info!(
            "Rendered {} pixels ({} samples) in {:.2?}",
            stats.pixels,
            stats.samples,
            stats.elapsed
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Camera, DiffuseLight, Lambertian, LightTarget, Material, Object};
    use lux_core::TriangleMesh;
    use lux_math::{Aabb, Mat4, Vec3};
    use std::sync::Arc;

    fn small_renderer() -> Renderer {
        Renderer::new(RenderConfig {
            threads: 4,
            ..RenderConfig::default()
        })
        .unwrap()
    }

    fn emissive_sphere_scene(width: u32, height: u32) -> Scene {
        let camera = Camera::new()
            .with_position(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO, Vec3::Y)
            .with_resolution(width, height);
        let mut scene = Scene::new(camera);
        let light: Arc<dyn Material> = Arc::new(DiffuseLight::new(Color::splat(5.0)));
        scene.add(Object::sphere(1.0, light));
        scene.prepare();
        scene
    }

    fn lit_box_scene() -> Scene {
        let camera = Camera::new()
            .with_position(Vec3::new(0.0, 1.0, 4.0), Vec3::new(0.0, 0.5, 0.0), Vec3::Y)
            .with_resolution(24, 18);
        let mut scene = Scene::new(camera);
        let white: Arc<dyn Material> = Arc::new(Lambertian::new(Color::splat(0.8)));
        let lamp: Arc<dyn Material> = Arc::new(DiffuseLight::new(Color::splat(6.0)));
        scene.add(Object::mesh(
            TriangleMesh::quad(
                Vec3::new(-3.0, 0.0, 3.0),
                Vec3::new(3.0, 0.0, 3.0),
                Vec3::new(3.0, 0.0, -3.0),
                Vec3::new(-3.0, 0.0, -3.0),
            ),
            white.clone(),
        ));
        scene.add(
            Object::mesh(TriangleMesh::cuboid(Vec3::splat(-0.4), Vec3::splat(0.4)), white)
                .with_transform(Mat4::from_translation(Vec3::new(0.0, 0.4, 0.0))),
        );
        scene.add(Object::sphere(0.3, lamp).with_transform(Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0))));
        scene.add_light_target(LightTarget::new(Aabb::from_points(
            Vec3::new(-0.1, 1.8, -0.1),
            Vec3::new(0.1, 1.8, 0.1),
        )));
        scene.prepare();
        scene
    }

    #[test]
    fn test_energy_sanity() {
        let (w, h) = (32, 18);
        let scene = emissive_sphere_scene(w, h);
        let renderer = small_renderer();
        let mut result = renderer.create_result(w, h);
        renderer
            .render(&scene, &mut result, 1, None, |_, _| true, |_| {})
            .unwrap();

        let mut lit = 0;
        for y in 0..h {
            for x in 0..w {
                let c = result.get(x, y);
                let ray = scene.camera.pixel_ray(x, y, w, h, Vec2::splat(0.5));
                // Distance from the sphere centre to the primary ray
                let miss_distance = ray.origin().cross(ray.direction()).length();
                if (miss_distance - 1.0).abs() < 0.02 {
                    continue;
                }
                if miss_distance < 1.0 {
                    assert_eq!(c, Color::splat(5.0), "pixel ({x}, {y})");
                    lit += 1;
                } else {
                    assert_eq!(c, Color::ZERO, "pixel ({x}, {y})");
                }
            }
        }
        assert!(lit > 0);
    }

    #[test]
    fn test_centre_pixel_of_emissive_sphere() {
        let scene = emissive_sphere_scene(33, 33);
        let renderer = small_renderer();
        let mut result = renderer.create_result(33, 33);
        renderer
            .render(&scene, &mut result, 4, None, |_, _| true, |_| {})
            .unwrap();
        assert_eq!(result.get(16, 16), Color::splat(5.0));
        assert_eq!(result.samples_at(16, 16), 4);
    }

    #[test]
    fn test_split_passes_match_single_pass() {
        let scene = lit_box_scene();
        let renderer = small_renderer();

        let mut split = renderer.create_result(24, 18);
        renderer.render(&scene, &mut split, 2, None, |_, _| true, |_| {}).unwrap();
        renderer.render(&scene, &mut split, 3, None, |_, _| true, |_| {}).unwrap();

        let mut single = renderer.create_result(24, 18);
        renderer.render(&scene, &mut single, 5, None, |_, _| true, |_| {}).unwrap();

        for (a, b) in split.pixels().iter().zip(single.pixels()) {
            assert!((*a - *b).abs().max_element() <= 1e-4 * b.max_element().max(1.0), "{a} vs {b}");
        }
        assert!(single.pixels().iter().any(|c| c.max_element() > 0.0));
        assert_eq!(split.sample_counts(), single.sample_counts());
    }

    #[test]
    fn test_results_do_not_depend_on_thread_count() {
        let scene = lit_box_scene();
        let one = Renderer::new(RenderConfig {
            threads: 1,
            ..RenderConfig::default()
        })
        .unwrap();
        let many = small_renderer();

        let mut a = one.create_result(24, 18);
        let mut b = many.create_result(24, 18);
        one.render(&scene, &mut a, 2, None, |_, _| true, |_| {}).unwrap();
        many.render(&scene, &mut b, 2, None, |_, _| true, |_| {}).unwrap();
        assert_eq!(a.pixels(), b.pixels());
    }

    #[test]
    fn test_predicate_limits_work() {
        let scene = lit_box_scene();
        let renderer = small_renderer();
        let mut result = renderer.create_result(24, 18);
        let stats = renderer
            .render(&scene, &mut result, 1, None, |x, _| x < 5, |_| {})
            .unwrap();
        assert_eq!(stats.pixels, 5 * 18);
        assert_eq!(result.samples_at(4, 10), 1);
        assert_eq!(result.samples_at(5, 10), 0);
        assert_eq!(result.get(20, 3), Color::ZERO);
    }

    #[test]
    fn test_progress_reaches_one_and_flags_update() {
        let scene = emissive_sphere_scene(40, 20);
        let renderer = small_renderer();
        let mut result = renderer.create_result(40, 20);
        let flag = result.updated();

        let mut reports = Vec::new();
        renderer
            .render(&scene, &mut result, 1, None, |_, _| true, |p| reports.push(p))
            .unwrap();

        assert_eq!(reports.len(), generate_buckets(40, 20, 16, 9).len());
        assert!(reports.windows(2).all(|w| w[0] <= w[1]));
        assert!((reports[reports.len() - 1] - 1.0).abs() < 1e-6);
        assert!(flag.take());
    }

    #[test]
    fn test_prior_override() {
        let scene = emissive_sphere_scene(9, 9);
        let renderer = small_renderer();
        let mut result = RenderResult::from_pixels(9, 9, vec![Color::splat(1.0); 81], 7).unwrap();
        renderer
            .render(&scene, &mut result, 1, Some(1), |x, y| x == 4 && y == 4, |_| {})
            .unwrap();
        // (1 * 1 + 5) / 2
        assert_eq!(result.get(4, 4), Color::splat(3.0));
        assert_eq!(result.samples_at(4, 4), 2);
    }

    #[test]
    fn test_setup_errors() {
        let renderer = small_renderer();
        let scene = emissive_sphere_scene(4, 4);

        let mut empty = renderer.create_result(0, 4);
        assert!(matches!(
            renderer.render(&scene, &mut empty, 1, None, |_, _| true, |_| {}),
            Err(RenderError::EmptyImage { width: 0, height: 4 })
        ));

        let mut unprepared = Scene::new(Camera::new());
        let grey: Arc<dyn Material> = Arc::new(Lambertian::new(Color::splat(0.5)));
        unprepared.add(Object::sphere(1.0, grey));
        let mut result = renderer.create_result(4, 4);
        assert!(matches!(
            renderer.render(&unprepared, &mut result, 1, None, |_, _| true, |_| {}),
            Err(RenderError::SceneNotPrepared)
        ));

        assert!(matches!(
            renderer.render(&scene, &mut result, 0, None, |_, _| true, |_| {}),
            Err(RenderError::InvalidConfig(_))
        ));

        assert!(matches!(
            renderer.render(&scene, &mut result, 2, Some(u32::MAX), |_, _| true, |_| {}),
            Err(RenderError::InvalidConfig(_))
        ));
        assert!(result.sample_counts().iter().all(|&n| n == 0));

        assert!(matches!(
            Renderer::new(RenderConfig {
                block_width: 0,
                ..RenderConfig::default()
            }),
            Err(RenderError::InvalidConfig(_))
        ));
    }
}
