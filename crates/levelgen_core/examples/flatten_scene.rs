//! Example: Load a scene file and show what the level header would contain.
//!
//! Run with: cargo run --example flatten_scene -- assets/demo/forest.usda

use std::env;

use levelgen_core::{flatten, read_scene, render_header, EmitOptions};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        println!("Usage: flatten_scene <scene-file>");
        println!("\nExamples:");
        println!("  cargo run --example flatten_scene -- assets/demo/forest.usda");
        println!("  cargo run --example flatten_scene -- assets/demo/forest.json");
        return;
    }

    let path = &args[1];
    println!("Loading scene: {}", path);

    let scene = match read_scene(path) {
        Ok(scene) => scene,
        Err(e) => {
            eprintln!("Error loading scene: {}", e);
            return;
        }
    };

    match flatten(&scene) {
        Ok(flat) => {
            println!("\n=== Scene: {} ===", flat.scene_path);
            println!("Objects: {}", scene.object_count());
            println!("Records: {}", flat.record_count());

            println!("\n--- Records ---");
            for (i, record) in flat.records.iter().enumerate() {
                let loc = record.placement.transform.location;
                println!(
                    "  [{}] {} -> {} ({}) at ({:.2}, {:.2}, {:.2})",
                    i,
                    record.placement.name,
                    record.mesh_name(),
                    record.origin_file,
                    loc.x,
                    loc.y,
                    loc.z
                );
            }

            println!("\n--- Linked files ---");
            for file in &flat.linked_files {
                println!("  {}", file);
            }
        }
        Err(e) => {
            eprintln!("Error flattening scene: {}", e);
            return;
        }
    }

    match render_header(&scene, &EmitOptions::default()) {
        Ok(text) => println!("\n--- Header ---\n{}", text),
        Err(e) => eprintln!("Error generating header: {}", e),
    }
}
