// Quick debug tool to inspect PLY headers and raw Gaussian records
// Run with: cargo run --release --bin gsx_dump -- <path_to.ply> [count]

use std::env;
use std::fs::File;
use std::io::BufReader;

use gsx_core::import::import_ply;
use gsx_core::ply::{parse_header, PlyProperty, VertexSchema};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <path_to.ply> [count]", args[0]);
        std::process::exit(1);
    }

    let path = &args[1];
    let count: usize = match args.get(2) {
        Some(n) => n.parse()?,
        None => 8,
    };
    println!("Reading PLY: {}", path);

    let header = parse_header(&mut BufReader::new(File::open(path)?))?;
    println!(
        "\nFormat: {} {} ({} header bytes)",
        header.format.as_str(),
        header.version,
        header.header_len
    );
    for comment in &header.comments {
        println!("Comment: {}", comment);
    }
    for element in &header.elements {
        println!("\nElement '{}' x {}", element.name, element.count);
        for property in &element.properties {
            match property {
                PlyProperty::Scalar { name, ty } => println!("  {:<12} {:?}", name, ty),
                PlyProperty::List {
                    name,
                    count_ty,
                    item_ty,
                } => println!("  {:<12} list {:?} {:?}", name, count_ty, item_ty),
            }
        }
    }

    let schema = VertexSchema::from_header(&header)?;
    println!(
        "\nVertex stride: {} bytes, data offset {}, canonical order: {}",
        schema.stride(),
        schema.data_offset(),
        schema.is_canonical()
    );

    let scene = import_ply(path)?;
    let shown = count.min(scene.len());
    println!("\nFirst {} of {} gaussians:", shown, scene.len());

    for (i, record) in scene.records().take(shown).enumerate() {
        println!("\n=== Gaussian {} ===", i);
        println!("Position: {:?}", record.position);
        println!("Opacity:  {}", record.opacity);
        println!("Scale:    {:?}", record.scale);
        println!("Rotation: {:?} (length {:.4})", record.rotation, record.rotation.length());
        for (channel, label) in ["r", "g", "b"].iter().enumerate() {
            println!("SH {}:     {:?}", label, record.coefficients[channel]);
        }

        // Flag values a trainer would never write
        let finite = record.position.is_finite()
            && record.scale.is_finite()
            && record.rotation.is_finite()
            && record.opacity.is_finite();
        if !finite {
            println!("WARNING: non-finite attribute");
        }
    }

    Ok(())
}
