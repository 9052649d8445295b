// Quick debug tool to inspect how a scene resolves
// Run with: cargo run --bin inspect_scene -- <scene.json|scene.usda>

use std::env;

use levelgen_core::{flatten, read_scene, SceneSource};
use levelgen_math::{QuatExt, Vec3Ext};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <scene.json|scene.usda>", args[0]);
        std::process::exit(1);
    }

    let path = &args[1];
    println!("Loading scene: {}", path);

    let scene = read_scene(path)?;

    println!("\nFound {} object(s)", scene.object_count());
    for (i, obj) in scene.objects.iter().enumerate() {
        let data = match &obj.data {
            Some(d) => match d.library {
                Some(lib) => format!("{} [{}]", d.name, scene.origin_file(Some(lib))),
                None => d.name.clone(),
            },
            None => "-".to_string(),
        };
        println!("  [{}] {:<20} {:<8} data: {}", i, obj.name, format!("{:?}", obj.kind), data);

        if let Some(coll) = obj.instance_collection.and_then(|id| scene.collection(id)) {
            println!("       instances collection '{}'", coll.name);
        }
    }

    println!("\nFound {} collection(s)", scene.collection_count());
    for coll in &scene.collections {
        let members: Vec<&str> = coll
            .objects
            .iter()
            .filter_map(|id| scene.object(*id))
            .map(|o| o.name.as_str())
            .collect();
        println!(
            "  {} from {}: {:?}",
            coll.name,
            scene.origin_file(coll.library),
            members
        );
    }

    let flat = flatten(&scene)?;
    println!("\nResolved {} record(s)", flat.record_count());
    for record in &flat.records {
        let t = &record.placement.transform;
        let loc = t.location.to_y_up();
        let rot = t.rotation.to_quat().to_y_up();
        let scale = t.scale.to_y_up_scale();

        println!("\n=== {} ===", record.placement.name);
        println!("Mesh:   {} ({})", record.mesh_name(), record.origin_file);
        println!("Z-up:   loc ({:.3}, {:.3}, {:.3})", t.location.x, t.location.y, t.location.z);
        println!("Y-up:   loc ({:.3}, {:.3}, {:.3})", loc.x, loc.y, loc.z);
        println!("        rot ({:.3}, {:.3}, {:.3}, {:.3}) wxyz", rot.w, rot.x, rot.y, rot.z);
        println!("        scale ({:.3}, {:.3}, {:.3})", scale.x, scale.y, scale.z);
    }

    println!("\nIncludes:");
    for file in &flat.linked_files {
        println!("  {}", file);
    }

    Ok(())
}
