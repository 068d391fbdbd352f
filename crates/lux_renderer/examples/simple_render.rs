//! Simple path tracer example.
//!
//! Renders a glowing sphere over a diffuse floor and saves a PNG.
//!
//! Run with: cargo run --release --example simple_render -- out.png

use std::sync::Arc;

use lux_core::TriangleMesh;
use lux_math::Mat4;
use lux_renderer::{
    Aabb, Camera, Color, DiffuseLight, Lambertian, LightTarget, Material, Object, ProgressiveConfig,
    ProgressiveRenderer, RenderConfig, Renderer, Scene, Vec3,
};

fn build_scene(width: u32, height: u32) -> Scene {
    let camera = Camera::new()
        .with_position(Vec3::new(0.0, 1.2, 4.0), Vec3::new(0.0, 0.6, 0.0), Vec3::Y)
        .with_fov(40.0)
        .with_resolution(width, height);
    let mut scene = Scene::new(camera);

    let floor: Arc<dyn Material> = Arc::new(Lambertian::new(Color::new(0.6, 0.6, 0.55)));
    let ball: Arc<dyn Material> = Arc::new(Lambertian::new(Color::new(0.2, 0.3, 0.8)).with_roughness(0.3));
    let lamp: Arc<dyn Material> = Arc::new(DiffuseLight::new(Color::splat(10.0)));

    scene.add(Object::mesh(
        TriangleMesh::quad(
            Vec3::new(-5.0, 0.0, 5.0),
            Vec3::new(5.0, 0.0, 5.0),
            Vec3::new(5.0, 0.0, -5.0),
            Vec3::new(-5.0, 0.0, -5.0),
        ),
        floor,
    ));
    scene.add(Object::sphere(0.5, ball).with_transform(Mat4::from_translation(Vec3::new(-0.6, 0.5, 0.0))));
    scene.add(Object::sphere(0.3, lamp).with_transform(Mat4::from_translation(Vec3::new(0.7, 1.4, -0.3))));
    scene.add_light_target(LightTarget::new(Aabb::from_points(
        Vec3::new(0.5, 1.2, -0.5),
        Vec3::new(0.9, 1.2, -0.1),
    )));

    scene.prepare();
    scene
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let output = std::env::args().nth(1).unwrap_or_else(|| "simple_render.png".into());
    let (width, height) = (480, 270);

    let start = std::time::Instant::now();
    let scene = build_scene(width, height);
    println!("Scene built in {:?}", start.elapsed());

    let renderer = Renderer::new(RenderConfig::default())?;
    let mut result = renderer.create_result(width, height);
    let summary = ProgressiveRenderer::new(&renderer, ProgressiveConfig::default())
        .run(&scene, &mut result, |_| {})?;
    println!(
        "Rendered {} passes, {} samples in {:?}",
        summary.passes,
        summary.samples,
        start.elapsed()
    );

    result.to_image().save(&output)?;
    println!("Saved to {output}");
    Ok(())
}
