//! Run 500 random drt rides with a shift-dispatched fleet and print completed rides.
//!
//! Run with: cargo run -p dvrp_core --example scenario_run

use dvrp_core::clock::SimulationClock;
use dvrp_core::config::{DvrpConfig, ShiftDispatchConfig};
use dvrp_core::ids::LinkId;
use dvrp_core::network::Coord;
use dvrp_core::runner::{initialize_simulation, run_until_empty, simulation_schedule};
use dvrp_core::scenario::{RandomDemand, ScenarioBuilder};
use dvrp_core::shifts::{DrtShift, FacilityKind, OperationFacility, ShiftBreak, ShiftVehicle};
use dvrp_core::telemetry::DvrpTelemetry;
use dvrp_core::test_helpers::{test_network, RecordingOptimizer};

fn main() {
    const NUM_TRAVELERS: usize = 500;
    const NUM_VEHICLES: usize = 20;
    const SIMULATION_HOURS: u64 = 4;

    let config = DvrpConfig {
        shifts: Some(ShiftDispatchConfig::default()),
        ..DvrpConfig::default()
    };
    let mut builder = ScenarioBuilder::new(config, test_network(), RecordingOptimizer::new().shared())
        .with_facility(OperationFacility::new(
            "depot",
            FacilityKind::Hub,
            "l0",
            Coord::new(500.0, 0.0),
            NUM_VEHICLES,
        ))
        .with_facility(OperationFacility::new(
            "rest",
            FacilityKind::InField,
            "l4",
            Coord::new(4500.0, 0.0),
            NUM_VEHICLES / 4,
        ));
    for n in 0..NUM_VEHICLES {
        builder = builder
            .with_vehicle(ShiftVehicle::new(format!("veh_{n}"), "l0"))
            .with_shift(
                DrtShift::new(format!("shift_{n}"), 0, SIMULATION_HOURS * 3600 + 1800)
                    .with_break(ShiftBreak {
                        earliest_start: 3600,
                        latest_end: 3 * 3600,
                        duration: 1800,
                    })
                    .with_operation_facility("depot"),
            );
    }
    let mut scenario = builder.build().expect("scenario");
    let world = &mut scenario.world;

    let links: Vec<LinkId> = (0..5).map(|i| LinkId::new(format!("l{i}"))).collect();
    RandomDemand {
        travelers: NUM_TRAVELERS,
        vehicles: NUM_VEHICLES,
        window: SIMULATION_HOURS * 3600,
        seed: 123,
        ..RandomDemand::default()
    }
    .generate(world, &links);

    initialize_simulation(world);
    let mut schedule = simulation_schedule();
    let steps = run_until_empty(world, &mut schedule, 2_000_000);

    let telemetry = world.resource::<DvrpTelemetry>();
    let completed = telemetry.completed_rides.len();
    let sim_time_secs = world.resource::<SimulationClock>().now();

    println!(
        "--- Scenario run ({} travelers, {} vehicles, {}h request window, seed 123) ---",
        NUM_TRAVELERS, NUM_VEHICLES, SIMULATION_HOURS
    );
    println!("Steps executed: {}", steps);
    println!("Simulation time: {} s ({:.1} min)", sim_time_secs, sim_time_secs as f64 / 60.0);
    println!("Completed rides: {}", completed);
    println!("Shift events: {}", telemetry.shift_events.len());
    if let Some(mean) = telemetry.mean_wait_time() {
        println!("Mean wait: {:.1} s", mean);
    }

    const SAMPLE: usize = 20;
    for (i, ride) in telemetry.completed_rides.iter().take(SAMPLE).enumerate() {
        println!(
            "  {}  request={} person={} vehicle={:?}  wait={} s  ride={} s  dropped_off_at={} s",
            i + 1,
            ride.request,
            ride.person,
            ride.vehicle,
            ride.wait_time(),
            ride.ride_duration(),
            ride.dropped_off_at,
        );
    }
    if completed > SAMPLE {
        println!("  ... and {} more", completed - SAMPLE);
    }
}
