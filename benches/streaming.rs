//! Streaming and tick benchmarks for the chunked world
//!
//! Run with: cargo bench --bench streaming

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use void_drift::config::{GenerationConfig, SimulationConfig};
use void_drift::game::chunk::{ChunkCoord, ChunkStore, IdAllocator};
use void_drift::game::constants::physics::DT;
use void_drift::game::entity::Entity;
use void_drift::game::generation::ProceduralGenerator;
use void_drift::game::input::Intent;
use void_drift::game::state::GameState;
use void_drift::game::streaming::LoadedSet;
use void_drift::game::systems::{collision, movement};
use void_drift::game::world::Simulation;
use void_drift::util::vec2::Vec2;

/// Loaded world with `count` drifting asteroids around the player
fn crowded_state(count: usize) -> GameState {
    let config = SimulationConfig {
        generation: GenerationConfig::empty_space(),
        ..SimulationConfig::default()
    };
    let mut state = GameState::new(&config);
    state.spawn_player(Vec2::new(300.0, 300.0));
    state.refresh_loaded(config.load_distance);
    let mut rng = rand::thread_rng();

    for _ in 0..count {
        let position = Vec2::new(rng.gen_range(-550.0..1150.0), rng.gen_range(-550.0..1150.0));
        let velocity = Vec2::new(rng.gen_range(-40.0..40.0), rng.gen_range(-40.0..40.0));
        state.spawn(Entity::asteroid(position, rng.gen_range(10.0..30.0)).with_velocity(velocity));
    }
    state
}

/// Benchmark raw chunk generation
fn bench_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("generation");
    let generator = ProceduralGenerator::new(&SimulationConfig::default());

    for side in [8, 16, 32] {
        group.throughput(Throughput::Elements((side * side) as u64));
        group.bench_with_input(BenchmarkId::new("generate", side), &side, |b, &side| {
            b.iter(|| {
                let mut ids = IdAllocator::default();
                for x in 0..side {
                    for y in 0..side {
                        black_box(generator.generate(ChunkCoord::new(x, y), &[], &mut ids).ok());
                    }
                }
            })
        });
    }
    group.finish();
}

/// Benchmark loaded-set rebuilds while flying through fresh space
fn bench_streaming(c: &mut Criterion) {
    let mut group = c.benchmark_group("streaming");

    for load_distance in [1, 2, 4] {
        group.bench_with_input(
            BenchmarkId::new("fly_east", load_distance),
            &load_distance,
            |b, &load_distance| {
                let config = SimulationConfig {
                    load_distance,
                    ..SimulationConfig::default()
                };
                let mut store = ChunkStore::new(&config);
                let mut loaded = LoadedSet::new();
                let mut x = 0.0f32;
                b.iter(|| {
                    x += config.chunk_size;
                    black_box(loaded.update(&mut store, Vec2::new(x, 0.0), load_distance));
                })
            },
        );
    }
    group.finish();
}

/// Benchmark movement and collision with many loaded entities
fn bench_systems(c: &mut Criterion) {
    let mut group = c.benchmark_group("systems");
    group.sample_size(50);

    for count in [100, 500, 1000] {
        let mut state = crowded_state(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("movement", count), &count, |b, _| {
            b.iter(|| movement::update(&mut state, black_box(DT)))
        });

        let mut state = crowded_state(count);
        group.bench_with_input(BenchmarkId::new("collision", count), &count, |b, _| {
            b.iter(|| collision::update(&mut state, &collision::CircleOverlap, black_box(DT)))
        });
    }
    group.finish();
}

/// Benchmark a full tick in a generated world
fn bench_full_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_tick");
    group.sample_size(30);

    for load_distance in [1, 2] {
        let mut sim = Simulation::new(SimulationConfig {
            load_distance,
            ..SimulationConfig::default()
        });
        group.bench_with_input(
            BenchmarkId::new("complete", load_distance),
            &load_distance,
            |b, _| {
                b.iter(|| black_box(sim.step(&[Intent::Move(Vec2::new(1.0, 0.3)), Intent::Shoot], DT)))
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_generation, bench_streaming, bench_systems, bench_full_tick);
criterion_main!(benches);
