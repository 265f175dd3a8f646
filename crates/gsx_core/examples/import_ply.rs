//! Example: Import and inspect a Gaussian-splat PLY file.
//!
//! Run with: cargo run --example import_ply -- assets/garden.ply

use std::env;
use std::ops::ControlFlow;

use gsx_core::import::{import_ply_with, ImportOptions};
use gsx_core::ProgressRange;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        println!("Usage: import_ply <path-to-ply-file>");
        println!("\nExamples:");
        println!("  cargo run --example import_ply -- assets/garden.ply");
        println!("  RUST_LOG=debug cargo run --example import_ply -- assets/bicycle.ply");
        return;
    }

    let path = &args[1];
    println!("Importing PLY file: {}", path);

    let mut last_percent = 0;
    let mut print_progress = |fraction: f32| {
        let percent = (fraction * 100.0) as u32;
        if percent >= last_percent + 25 || fraction >= 1.0 {
            println!("  {:>3}%", percent);
            last_percent = percent;
        }
        ControlFlow::Continue(())
    };
    // Decoding is the middle of a load-then-upload job.
    let mut progress = ProgressRange::new(&mut print_progress, 0.1, 0.9);

    match import_ply_with(path, &ImportOptions::default(), &mut progress) {
        Ok(scene) => {
            println!("\n=== Scene: {} ===", scene.name());
            println!("Gaussians: {}", scene.len());
            println!(
                "SH degree: {}{}",
                scene.sh_dim(),
                if scene.layout().is_exact_degree() { "" } else { " (approximate)" }
            );
            println!("Coefficients per channel: {}", scene.sh_coefficients_count());

            println!("\n--- First Gaussians ---");
            for (i, record) in scene.records().take(5).enumerate() {
                println!(
                    "  [{}] pos ({:.3}, {:.3}, {:.3}) opacity {:.3}",
                    i, record.position.x, record.position.y, record.position.z, record.opacity
                );
                println!(
                    "       scale ({:.3}, {:.3}, {:.3}) dc ({:.3}, {:.3}, {:.3})",
                    record.scale.x,
                    record.scale.y,
                    record.scale.z,
                    record.dc().x,
                    record.dc().y,
                    record.dc().z
                );
            }

            let bounds = scene.bounds();
            println!("\n--- Bounds ---");
            println!(
                "  Min: ({:.2}, {:.2}, {:.2})",
                bounds.x.min, bounds.y.min, bounds.z.min
            );
            println!(
                "  Max: ({:.2}, {:.2}, {:.2})",
                bounds.x.max, bounds.y.max, bounds.z.max
            );
        }
        Err(e) => {
            eprintln!("Error importing PLY file: {}", e);
        }
    }
}
