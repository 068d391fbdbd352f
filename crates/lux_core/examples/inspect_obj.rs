//! Example: Load and inspect an OBJ file.
//!
//! Run with: cargo run --example inspect_obj -- assets/bunny.obj

use std::env;

use lux_core::obj::load_obj;

fn main() {
    env_logger::init();

    let Some(path) = env::args().nth(1) else {
        println!("Usage: inspect_obj <path-to-obj-file>");
        return;
    };

    match load_obj(&path) {
        Ok(mesh) => {
            println!("\n=== Mesh: {} ===", path);
            println!("Triangles: {}", mesh.triangle_count());
            println!("Bounds: {:?} .. {:?}", mesh.bounds.min(), mesh.bounds.max());
            println!("Center: {:?}, size: {:.3}", mesh.center(), mesh.size());

            let degenerate = mesh.polygons.iter().filter(|p| p.is_degenerate()).count();
            if degenerate > 0 {
                println!("Degenerate triangles: {}", degenerate);
            }
        }
        Err(e) => {
            eprintln!("Failed to load {}: {}", path, e);
            std::process::exit(1);
        }
    }
}
