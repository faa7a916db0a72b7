//! Criterion benchmarks for the near-set tick.
//!
//! Benchmarks:
//!   - spatial index build for 5 000 buildings
//!   - steady-state tick (camera parked, membership settled)
//!   - walking tick (camera moving along a street every tick)
//!
//! Run with: cargo bench -p visibility --bench near_set_bench

use std::time::Duration;

use bevy::math::Vec2;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use layout::{generate_city, CityEntity, EntityMetrics, GeneratedCity, LayoutConfig};
use visibility::{NearSetInputs, NearSetManager, SpatialIndex, VisibilityConfig};

fn city(n: usize) -> GeneratedCity {
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let entities: Vec<CityEntity> = (0..n)
        .map(|i| {
            CityEntity::new(
                format!("e{i}"),
                ["dex", "lending", "bridge", "yield"][rng.gen_range(0..4)],
                EntityMetrics::new(rng.gen::<f64>() * 1e9, rng.gen::<f64>() * 1e8, 5.0, 1e4),
            )
        })
        .collect();
    generate_city(&entities, &LayoutConfig::default())
}

fn bench_index_build(c: &mut Criterion) {
    let city = city(5_000);
    c.bench_function("spatial_index_build_5000", |b| {
        b.iter(|| black_box(SpatialIndex::build(black_box(&city.buildings), 200.0, 1)));
    });
}

fn bench_tick(c: &mut Criterion) {
    let city = city(5_000);
    let config = VisibilityConfig {
        tick_interval: Duration::ZERO,
        ..Default::default()
    };
    let index = SpatialIndex::build(&city.buildings, config.cell_size, 0);

    let mut group = c.benchmark_group("near_set_tick");

    group.bench_function("settled", |b| {
        let mut manager = NearSetManager::default();
        let inputs = NearSetInputs {
            now: Duration::ZERO,
            viewpoint: Vec2::ZERO,
            buildings: &city.buildings,
            index: &index,
            focused: &[],
            flyover: false,
        };
        for _ in 0..200 {
            manager.tick(&config, &inputs);
        }
        b.iter(|| black_box(manager.tick(&config, &inputs)));
    });

    group.bench_function("walking", |b| {
        let mut manager = NearSetManager::default();
        let mut x = 0.0f32;
        b.iter(|| {
            x = (x + 15.0) % 4_000.0;
            let inputs = NearSetInputs {
                now: Duration::ZERO,
                viewpoint: Vec2::new(x - 2_000.0, 0.0),
                buildings: &city.buildings,
                index: &index,
                focused: &[],
                flyover: false,
            };
            black_box(manager.tick(&config, &inputs))
        });
    });

    group.finish();
}

criterion_group!(benches, bench_index_build, bench_tick);
criterion_main!(benches);
