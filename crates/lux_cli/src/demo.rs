//! Built-in demo scene: a closed room lit by a ceiling panel.

use std::sync::Arc;

use anyhow::Result;
use lux_core::{Texture, TriangleMesh};
use lux_math::{Aabb, Color, Mat4, Quat, Vec3};
use lux_renderer::{Camera, DiffuseLight, Lambertian, LightTarget, Material, Object, OctreeConfig, Scene};

const ROOM_HALF_WIDTH: f32 = 1.5;
const ROOM_HEIGHT: f32 = 3.0;
const LIGHT_HALF_SIZE: f32 = 0.25;

fn material(m: impl Material + 'static) -> Arc<dyn Material> {
    Arc::new(m)
}

fn checker(size: u32, a: Color, b: Color) -> Result<Texture> {
    let pixels = (0..size * size)
        .map(|i| if (i % size + i / size) % 2 == 0 { a } else { b })
        .collect();
    Ok(Texture::new(size, size, pixels)?)
}

/// Room with coloured side walls, a boxy block, two spheres and an optional
/// user mesh standing on the floor.
pub fn cornell_box(
    width: u32,
    height: u32,
    mesh: Option<TriangleMesh>,
    octree: &OctreeConfig,
) -> Result<Scene> {
    let camera = Camera::new()
        .with_position(
            Vec3::new(0.0, 1.5, 5.5),
            Vec3::new(0.0, 1.4, 0.0),
            Vec3::Y,
        )
        .with_fov(45.0)
        .with_resolution(width, height);
    let mut scene = Scene::new(camera);

    let white = material(Lambertian::new(Color::splat(0.73)));
    let red = material(Lambertian::new(Color::new(0.65, 0.05, 0.05)));
    let green = material(Lambertian::new(Color::new(0.12, 0.45, 0.15)));
    let panel = material(DiffuseLight::new(Color::splat(15.0)));

    let (w, h) = (ROOM_HALF_WIDTH, ROOM_HEIGHT);
    let p = Vec3::new;
    let walls = [
        // floor, ceiling, back
        (TriangleMesh::quad(p(-w, 0.0, w), p(w, 0.0, w), p(w, 0.0, -w), p(-w, 0.0, -w)), &white),
        (TriangleMesh::quad(p(-w, h, -w), p(w, h, -w), p(w, h, w), p(-w, h, w)), &white),
        (TriangleMesh::quad(p(-w, 0.0, -w), p(w, 0.0, -w), p(w, h, -w), p(-w, h, -w)), &white),
        // left, right
        (TriangleMesh::quad(p(-w, 0.0, w), p(-w, 0.0, -w), p(-w, h, -w), p(-w, h, w)), &red),
        (TriangleMesh::quad(p(w, 0.0, -w), p(w, 0.0, w), p(w, h, w), p(w, h, -w)), &green),
    ];
    for (quad, mat) in walls {
        scene.add(Object::mesh_with_config(quad, Arc::clone(mat), octree));
    }

    // Ceiling panel, slightly below the ceiling so the two never coincide
    let l = LIGHT_HALF_SIZE;
    scene.add(Object::mesh_with_config(
        TriangleMesh::cuboid(p(-l, h - 0.02, -l), p(l, h, l)),
        panel,
        octree,
    ));
    scene.add_light_target(LightTarget::new(Aabb::from_points(p(-l, h, -l), p(l, h, l))));

    scene.add(
        Object::mesh_with_config(
            TriangleMesh::cuboid(p(-0.4, 0.0, -0.4), p(0.4, 1.6, 0.4)),
            white.clone(),
            octree,
        )
        .with_transform(Mat4::from_rotation_translation(
            Quat::from_rotation_y(0.3),
            p(-0.6, 0.0, -0.5),
        )),
    );

    let glossy = material(Lambertian::new(Color::splat(0.9)).with_roughness(0.05));
    scene.add(Object::sphere(0.45, glossy).with_transform(Mat4::from_translation(p(0.7, 0.45, 0.3))));

    let tiles = checker(8, Color::new(0.8, 0.7, 0.2), Color::splat(0.1))?;
    let tiled = material(Lambertian::with_texture(Arc::new(tiles)).with_roughness(0.8));
    scene.add(Object::sphere(0.3, tiled).with_transform(Mat4::from_translation(p(-0.5, 1.9, -0.3))));

    if let Some(mesh) = mesh {
        scene.add(fit_on_floor(mesh, white, octree));
    }

    log::info!(
        "Demo scene: {} objects, {} light targets",
        scene.len(),
        scene.light_targets().len()
    );
    Ok(scene)
}

/// Scale a mesh to roughly one unit and stand it on the floor, front right.
fn fit_on_floor(mesh: TriangleMesh, mat: Arc<dyn Material>, octree: &OctreeConfig) -> Object {
    let size = mesh.size();
    let scale = if size > 0.0 { 1.2 / size } else { 1.0 };
    let bounds = mesh.bounds;
    let base = Vec3::new(bounds.centroid().x, bounds.min().y, bounds.centroid().z);
    let transform = Mat4::from_translation(Vec3::new(0.5, 0.0, 0.6))
        * Mat4::from_scale(Vec3::splat(scale))
        * Mat4::from_translation(-base);
    log::info!(
        "Placing mesh with {} triangles (scale {:.3})",
        mesh.triangle_count(),
        scale
    );
    Object::mesh_with_config(mesh, mat, octree).with_transform(transform)
}
