mod support;

use bevy_ecs::prelude::{Entity, World};
use dvrp_core::config::ModeConfig;
use dvrp_core::ecs::{PassengerStop, StopState, Traveler, TravelerState};
use dvrp_core::ids::{PersonId, RequestId};
use dvrp_core::passenger::{PassengerEngines, PassengerEventKind, PrebookingManager};
use dvrp_core::plan::{Leg, PlannedLeg};
use dvrp_core::scenario::{schedule_stop, spawn_traveler, SimulationFault};
use dvrp_core::telemetry::DvrpTelemetry;
use dvrp_core::test_helpers::RecordingOptimizer;
use support::schedule::ScheduleRunner;
use support::world::TestWorldBuilder;

fn traveler_state(world: &World, entity: Entity) -> TravelerState {
    world.entity(entity).get::<Traveler>().expect("traveler").state
}

fn stop_state(world: &World, entity: Entity) -> StopState {
    world.entity(entity).get::<PassengerStop>().expect("stop").state
}

fn ride(world: &mut World, request: &str, pickup_at: u64, dropoff_at: u64) -> (Entity, Entity) {
    let pickup = PassengerStop::pickup("v1", request, "drt");
    let template = pickup.clone();
    let pickup_stop = schedule_stop(world, pickup, pickup_at);
    let dropoff_stop = schedule_stop(world, PassengerStop::dropoff(pickup_stop, &template), dropoff_at);
    (pickup_stop, dropoff_stop)
}

#[test]
fn two_leg_plan_rides_out_and_back() {
    let recorder = RecordingOptimizer::new();
    let mut scenario = TestWorldBuilder::new().with_recorder(&recorder).build();
    let world = &mut scenario.world;

    let alice = spawn_traveler(
        world,
        "alice",
        "l0",
        vec![
            Leg::new("drt", "l0", "l3", 100),
            Leg::new("drt", "l3", "l0", 1000),
        ],
    );
    let outbound = ride(world, "drt_0", 130, 500);
    let inbound = ride(world, "drt_1", 1020, 1400);

    ScheduleRunner::new().run_full(world);

    assert_eq!(traveler_state(world, alice), TravelerState::Arrived);
    assert_eq!(world.entity(alice).get::<Traveler>().map(|t| t.link.as_str().to_owned()), Some("l0".into()));
    for stop in [outbound.0, outbound.1, inbound.0, inbound.1] {
        assert_eq!(stop_state(world, stop), StopState::Completed);
    }
    assert_eq!(recorder.submitted_ids(), vec![RequestId::from("drt_0"), RequestId::from("drt_1")]);

    let telemetry = world.resource::<DvrpTelemetry>();
    assert_eq!(telemetry.counts.dropped_off, 2);
    assert_eq!(telemetry.completed_rides.len(), 2);
    assert_eq!(telemetry.mean_wait_time(), Some(25.0));
}

#[test]
fn optimizer_rejection_aborts_traveler_one_step_later() {
    let mut scenario = TestWorldBuilder::new().rejecting("no_vehicle").build();
    let world = &mut scenario.world;

    let bob = spawn_traveler(world, "bob", "l1", vec![Leg::new("drt", "l1", "l2", 50)]);
    let (pickup, dropoff) = ride(world, "drt_0", 200, 400);

    ScheduleRunner::new().run_full(world);

    assert_eq!(traveler_state(world, bob), TravelerState::Aborted);
    assert_eq!(stop_state(world, pickup), StopState::WaitingForPassenger);
    assert_eq!(stop_state(world, dropoff), StopState::Cancelled);

    let telemetry = world.resource::<DvrpTelemetry>();
    let rejected: Vec<_> = telemetry
        .observations
        .iter()
        .filter(|o| o.kind == PassengerEventKind::Rejected)
        .collect();
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].time, 51);
    assert_eq!(rejected[0].cause.as_deref(), Some("no_vehicle"));
    assert_eq!(telemetry.counts.rejected, 1);
    assert!(world.resource::<PassengerEngines>().by_mode(&"drt".into()).map(|e| e.active_count()) == Some(0));
}

#[test]
fn travelers_nobody_keeps_are_aborted() {
    let mut scenario = TestWorldBuilder::new().build();
    let world = &mut scenario.world;

    let same_link = spawn_traveler(world, "carol", "l2", vec![Leg::new("drt", "l2", "l2", 10)]);
    let walker = spawn_traveler(world, "dave", "l2", vec![Leg::new("walk", "l2", "l3", 10)]);

    ScheduleRunner::new().run_full(world);

    assert_eq!(traveler_state(world, same_link), TravelerState::Aborted);
    assert_eq!(traveler_state(world, walker), TravelerState::Aborted);
    assert_eq!(world.resource::<DvrpTelemetry>().travelers_aborted, 2);
}

#[test]
fn equal_links_are_accepted_when_the_mode_allows_them() {
    let recorder = RecordingOptimizer::new();
    let mut lenient = ModeConfig::new("shuttle");
    lenient.reject_equal_from_to_links = false;
    let mut scenario = TestWorldBuilder::new()
        .with_recorder(&recorder)
        .with_mode(lenient)
        .build();
    let world = &mut scenario.world;

    let erin = spawn_traveler(world, "erin", "l2", vec![Leg::new("shuttle", "l2", "l2", 10)]);

    ScheduleRunner::new().run_full(world);

    assert_eq!(traveler_state(world, erin), TravelerState::Waiting);
    assert_eq!(recorder.submitted_ids(), vec![RequestId::from("shuttle_0")]);
}

#[test]
fn missing_link_stops_the_simulation_with_a_fault() {
    let mut scenario = TestWorldBuilder::new().build();
    let world = &mut scenario.world;

    spawn_traveler(world, "frank", "taxi_only", vec![Leg::new("drt", "taxi_only", "l1", 10)]);
    let later = spawn_traveler(world, "gina", "l0", vec![Leg::new("drt", "l0", "l1", 500)]);

    ScheduleRunner::new().run_full(world);

    let fault = world.resource::<SimulationFault>();
    assert!(fault.is_set());
    assert!(!fault.error().expect("fault").is_invariant_violation());
    assert_eq!(traveler_state(world, later), TravelerState::Activity);
}

#[test]
fn dropoff_before_boarding_is_cancelled_not_fatal() {
    let mut scenario = TestWorldBuilder::new().build();
    let world = &mut scenario.world;

    let henry = spawn_traveler(world, "henry", "l0", vec![Leg::new("drt", "l0", "l1", 300)]);
    let (pickup, dropoff) = ride(world, "drt_0", 100, 200);

    ScheduleRunner::new().run_full(world);

    assert!(!world.resource::<SimulationFault>().is_set());
    assert_eq!(stop_state(world, dropoff), StopState::Cancelled);
    // The pickup kept waiting and boards henry once he departs.
    assert_eq!(stop_state(world, pickup), StopState::Completed);
    assert_eq!(traveler_state(world, henry), TravelerState::InVehicle);
}

#[test]
fn stop_that_arrived_first_picks_up_immediate_traveler() {
    let mut scenario = TestWorldBuilder::new().build();
    let world = &mut scenario.world;

    let jack = spawn_traveler(world, "jack", "l0", vec![Leg::new("drt", "l0", "l2", 300)]);
    let (pickup, dropoff) = ride(world, "drt_0", 100, 500);

    ScheduleRunner::new().run_full(world);

    assert_eq!(stop_state(world, pickup), StopState::Completed);
    assert_eq!(stop_state(world, dropoff), StopState::Completed);
    assert_eq!(traveler_state(world, jack), TravelerState::Arrived);

    let telemetry = world.resource::<DvrpTelemetry>();
    let ride = &telemetry.completed_rides[0];
    assert_eq!((ride.wait_time(), ride.ride_duration()), (0, 200));
    let engines = world.resource::<PassengerEngines>();
    assert_eq!(engines.by_mode(&"drt".into()).map(|e| e.waiting_stop_count()), Some(0));
}

#[test]
fn prebooked_traveler_is_picked_up_by_waiting_stop() {
    let recorder = RecordingOptimizer::new();
    let mut scenario = TestWorldBuilder::new()
        .with_recorder(&recorder)
        .with_prebooking()
        .build();
    let world = &mut scenario.world;

    let leg = Leg::new("drt", "l1", "l3", 600);
    let planned = PlannedLeg {
        index: 0,
        leg: leg.clone(),
    };
    let request = world
        .resource_mut::<PrebookingManager>()
        .prebook(0, &PersonId::from("ivy"), &planned)
        .expect("prebook")
        .expect("booked");
    let ivy = spawn_traveler(world, "ivy", "l1", vec![leg]);
    let (pickup, dropoff) = ride(world, request.as_str(), 540, 900);

    ScheduleRunner::new().run_full(world);

    assert_eq!(stop_state(world, pickup), StopState::Completed);
    assert_eq!(stop_state(world, dropoff), StopState::Completed);
    assert_eq!(traveler_state(world, ivy), TravelerState::Arrived);
    assert_eq!(recorder.submitted_ids(), vec![request.clone()]);

    let telemetry = world.resource::<DvrpTelemetry>();
    let picked_up = telemetry
        .observations_for(&request)
        .find(|o| o.kind == PassengerEventKind::PickedUp)
        .map(|o| o.time);
    assert_eq!(picked_up, Some(600));
}
