use criterion::{criterion_group, criterion_main, Criterion, black_box};

use terramesh::build::{build_dataset, BuildConfig};
use terramesh::heightfield::{NoiseHeightField, NoiseParams};
use terramesh::quadtree::{decode, CullParams, CullWalker};
use terramesh::sampler::{BuildJob, LodSetting};
use terramesh::streaming::{LodPolicy, MemoryPackLoader, MeshPool};
use terramesh::heightfield::HeightProvider;

use glam::{Mat4, Vec2, Vec3};

fn field() -> NoiseHeightField {
    NoiseHeightField::new(NoiseParams::default(), Vec2::splat(256.0))
}

fn bench_sampler_build(c: &mut Criterion) {
    let field = field();
    let settings = [LodSetting::default()];

    c.bench_function("sampler_build_4x4_sub3", |b| {
        b.iter(|| {
            let mut job = BuildJob::new(field.bounds(), 2, &settings, 1.0).unwrap();
            while !job.is_done() {
                job.step(black_box(&field));
            }
            black_box(job.end_process())
        });
    });
}

fn bench_cull_walk(c: &mut Criterion) {
    let field = field();
    let config = BuildConfig {
        depth: 3,
        ..Default::default()
    };
    let dataset = build_dataset(config, &field).unwrap();
    let nodes = decode(&dataset.tree_bytes, Vec3::ZERO).unwrap();
    let mut walker = CullWalker::new(nodes);
    let policy = LodPolicy::default();
    let proj = Mat4::perspective_rh(60f32.to_radians(), 16.0 / 9.0, 0.1, 5000.0);

    c.bench_function("cull_walk_orbit", |b| {
        let mut frame = 0u32;
        let mut activate = Vec::new();
        let mut deactivate = Vec::new();
        b.iter(|| {
            frame += 1;
            let t = frame as f32 * 0.05;
            let eye = Vec3::new(128.0 + t.sin() * 150.0, 60.0, 128.0 + t.cos() * 150.0);
            let params = CullParams {
                view_center: eye,
                fov: 60.0,
                screen_w: 1920.0,
                screen_h: 1080.0,
                view: Mat4::look_at_rh(eye, Vec3::new(128.0, 0.0, 128.0), Vec3::Y),
                proj,
            };
            activate.clear();
            deactivate.clear();
            walker.cull(black_box(&params), &policy, &mut activate, &mut deactivate);
            black_box(activate.len() + deactivate.len())
        });
    });
}

fn bench_pool_fetch(c: &mut Criterion) {
    let field = field();
    let dataset = build_dataset(BuildConfig::default(), &field).unwrap();
    let tile_count = dataset.header.tile_count as i32;

    c.bench_function("pool_fetch_all_tiles", |b| {
        b.iter(|| {
            let loader = MemoryPackLoader::from_packs(dataset.packs.clone());
            let mut pool = MeshPool::new(loader, dataset.header.mesh_prefix.clone(), dataset.header.pack_size);
            for id in 0..tile_count {
                black_box(pool.get_mesh(id).unwrap());
            }
        });
    });
}

criterion_group!(
    benches,
    bench_sampler_build,
    bench_cull_walk,
    bench_pool_fetch,
);
criterion_main!(benches);
