//! Performance benchmarks for dvrp_core using Criterion.rs.

use bevy_ecs::prelude::Entity;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dvrp_core::config::DvrpConfig;
use dvrp_core::ids::LinkId;
use dvrp_core::passenger::RejectionEvent;
use dvrp_core::runner::{initialize_simulation, run_until_empty, simulation_schedule};
use dvrp_core::scenario::{RandomDemand, ScenarioBuilder};
use dvrp_core::test_helpers::{
    departing_agent, test_engine, test_network, RecordingMobsim, RecordingOptimizer, TEST_MODE,
};

fn bench_simulation_run(c: &mut Criterion) {
    let scenarios = vec![("small", 10, 100), ("medium", 50, 500), ("large", 100, 1000)];
    let links: Vec<LinkId> = (0..5).map(|i| LinkId::new(format!("l{i}"))).collect();

    let mut group = c.benchmark_group("simulation_run");
    for (name, vehicles, travelers) in scenarios {
        group.bench_with_input(
            BenchmarkId::from_parameter(name),
            &(vehicles, travelers),
            |b, &(vehicles, travelers)| {
                b.iter(|| {
                    let mut scenario = ScenarioBuilder::new(
                        DvrpConfig::default(),
                        test_network(),
                        RecordingOptimizer::new().shared(),
                    )
                    .build()
                    .expect("scenario");
                    let world = &mut scenario.world;
                    RandomDemand {
                        travelers,
                        vehicles,
                        ..RandomDemand::default()
                    }
                    .generate(world, &links);
                    initialize_simulation(world);
                    let mut schedule = simulation_schedule();
                    black_box(run_until_empty(world, &mut schedule, 10_000_000));
                });
            },
        );
    }
    group.finish();
}

fn bench_engine_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("passenger_engine");
    let from = LinkId::from("l0");

    group.bench_function("handle_departure_1000", |b| {
        b.iter(|| {
            let mut engine = test_engine(RecordingOptimizer::new().shared());
            let mut mobsim = RecordingMobsim::new();
            for n in 0..1000u32 {
                let agent = departing_agent(Entity::from_raw(n), "p", "l0", "l3", 10);
                black_box(engine.handle_departure(10, &agent, &from, &mut mobsim).is_ok());
            }
        });
    });

    group.bench_function("step_with_1000_rejections", |b| {
        b.iter(|| {
            let mut engine = test_engine(RecordingOptimizer::new().shared());
            let mut mobsim = RecordingMobsim::new();
            for n in 0..1000u32 {
                let agent = departing_agent(Entity::from_raw(n), "p", "l0", "l3", 10);
                let _ = engine.handle_departure(10, &agent, &from, &mut mobsim);
                engine.on_rejection_event(RejectionEvent::new(10, TEST_MODE, format!("drt_{n}"), "no_vehicle"));
            }
            black_box(engine.step(11, &mut mobsim));
        });
    });

    group.finish();
}

criterion_group!(benches, bench_simulation_run, bench_engine_operations);
criterion_main!(benches);
