//! Tile dataset builder: samples a height field into LOD mesh tiles.
//!
//! Usage: cargo run --release --bin build_tiles -- [OPTIONS]
//!
//! Options:
//!   --out <DIR>          Output directory (default: "assets/terrain")
//!   --config <FILE>      Build config JSON (default: built-in defaults)
//!   --heightmap <FILE>   16-bit grayscale height image (default: noise)
//!   --size <METERS>      World size in meters (default: 1024)
//!   --height <H>         Height range in meters (default: 80.0)
//!   --seed <SEED>        Noise seed (default: 12345)
//!   --scale <SCALE>      Noise scale (default: 150.0)
//!   --depth <N>          LOD 0 grid depth, overrides the config
//!
//! Output structure:
//!   <out>/
//!     header.json          # Dataset header
//!     tree.bytes           # Quadtree index
//!     heightmap.bytes      # 2-byte height map
//!     terrain_0.bytes      # Mesh packs
//!     ...

use std::path::PathBuf;
use std::time::Instant;

use glam::{Vec2, Vec3};

use terramesh::build::{BuildConfig, DatasetBuilder};
use terramesh::heightfield::{HeightMap, HeightProvider, NoiseHeightField, NoiseParams};
use terramesh::math::Aabb;

fn main() {
    terramesh::core::logging::init();

    let args: Vec<String> = std::env::args().collect();
    let out = PathBuf::from(parse_str_arg(&args, "--out").unwrap_or_else(|| "assets/terrain".to_string()));
    let size = parse_f32_arg(&args, "--size").unwrap_or(1024.0);
    let height = parse_f32_arg(&args, "--height").unwrap_or(80.0);
    let seed = parse_u32_arg(&args, "--seed").unwrap_or(12345);
    let scale = parse_f32_arg(&args, "--scale").unwrap_or(150.0);

    let mut config = match parse_str_arg(&args, "--config") {
        Some(path) => BuildConfig::load(&PathBuf::from(path)).expect("Failed to load build config"),
        None => BuildConfig::default(),
    };
    if let Some(depth) = parse_u32_arg(&args, "--depth") {
        config.depth = depth;
    }

    let provider: Box<dyn HeightProvider> = match parse_str_arg(&args, "--heightmap") {
        Some(path) => {
            let bounds = Aabb::new(Vec3::ZERO, Vec3::new(size, height, size));
            Box::new(HeightMap::from_image(&PathBuf::from(path), bounds).expect("Failed to load height map"))
        }
        None => {
            let params = NoiseParams {
                seed,
                scale,
                height_scale: height,
                ..Default::default()
            };
            Box::new(NoiseHeightField::new(params, Vec2::splat(size)))
        }
    };

    println!("=== Terramesh Tile Builder ===");
    println!("Size:   {}m x {}m, height {}m", size, size, height);
    println!("Grid:   {} x {} tiles, {} LODs", config.slices(), config.slices(), config.lods.len());
    println!("Packs:  {} meshes, prefix \"{}\"", config.pack_size, config.mesh_prefix);
    println!("Output: {}", out.display());
    println!();

    let start = Instant::now();
    let mut builder = DatasetBuilder::new(config, provider.as_ref()).expect("Invalid build config");
    let mut last_phase = builder.phase();
    let mut last_percent = 0;

    while !builder.is_done() {
        let progress = builder.step().expect("Build failed");
        let percent = (progress.fraction * 100.0) as u32;
        if progress.phase != last_phase {
            eprintln!("  {:?} done ({:.1}s)", last_phase, start.elapsed().as_secs_f64());
            last_phase = progress.phase;
            last_percent = 0;
        } else if percent >= last_percent + 10 {
            eprintln!("  [{:?}] {}%", progress.phase, percent);
            last_percent = percent;
        }
    }

    let rejected = builder.rejected().len();
    let failures = builder.stitch_failures();
    let dataset = builder.into_dataset().expect("Build did not finish");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to start runtime");
    runtime
        .block_on(dataset.write_to(&out))
        .expect("Failed to write dataset");

    let pack_bytes: usize = dataset.packs.iter().map(|(_, b)| b.len()).sum();
    println!();
    println!("=== Build Complete ===");
    println!("Tiles:  {} ({} not indexed, {} stitch failures)", dataset.header.tile_count, rejected, failures);
    println!("Nodes:  {}", dataset.header.node_count);
    println!("Packs:  {} ({:.1} MB)", dataset.packs.len(), pack_bytes as f64 / (1024.0 * 1024.0));
    println!("Time:   {:.1}s", start.elapsed().as_secs_f64());
}

fn parse_f32_arg(args: &[String], flag: &str) -> Option<f32> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_u32_arg(args: &[String], flag: &str) -> Option<u32> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
