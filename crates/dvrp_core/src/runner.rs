//! Simulation runner: advances the clock and routes events into the ECS.
//!
//! Clock progression and event routing happen here, outside systems. Each step
//! pops the next event from [SimulationClock], inserts it as [CurrentEvent],
//! then runs the schedule.

use bevy_ecs::prelude::Res;
use bevy_ecs::prelude::{Schedule, World};
use bevy_ecs::schedule::IntoSystemConfigs;

use crate::clock::{CurrentEvent, Event, EventKind, SimulationClock};
use crate::scenario::{SimulationEndTime, SimulationFault};
use crate::systems::{
    departure::departure_system, passenger_step::passenger_step_system,
    shift_dispatch::shift_dispatch_system, simulation_started::simulation_started_system,
    stop_reached::stop_reached_system,
};

fn is_event(event: Option<Res<CurrentEvent>>, kind: EventKind) -> bool {
    event.map(|e| e.0.kind == kind).unwrap_or(false)
}

fn is_simulation_started(event: Option<Res<CurrentEvent>>) -> bool {
    is_event(event, EventKind::SimulationStarted)
}

fn is_shift_dispatch(event: Option<Res<CurrentEvent>>) -> bool {
    is_event(event, EventKind::ShiftDispatch)
}

fn is_passenger_step(event: Option<Res<CurrentEvent>>) -> bool {
    is_event(event, EventKind::PassengerStep)
}

fn is_departure(event: Option<Res<CurrentEvent>>) -> bool {
    is_event(event, EventKind::Departure)
}

fn is_stop_reached(event: Option<Res<CurrentEvent>>) -> bool {
    is_event(event, EventKind::StopReached)
}

/// Pops the next event and runs the schedule for it.
///
/// Returns `false` without processing anything when the clock is empty, when
/// the next event is at or past [SimulationEndTime], or once a
/// [SimulationFault] has been recorded.
pub fn run_next_event(world: &mut World, schedule: &mut Schedule) -> bool {
    run_next_event_with_hook(world, schedule, |_, _| {})
}

/// Like [run_next_event], invoking `hook` after the schedule completes.
pub fn run_next_event_with_hook<F>(world: &mut World, schedule: &mut Schedule, mut hook: F) -> bool
where
    F: FnMut(&World, &Event),
{
    if world
        .get_resource::<SimulationFault>()
        .is_some_and(SimulationFault::is_set)
    {
        return false;
    }
    let stop_at = world.get_resource::<SimulationEndTime>().map(|e| e.0);
    let next_ts = world
        .get_resource::<SimulationClock>()
        .and_then(|c| c.next_event_time());
    if let (Some(end), Some(ts)) = (stop_at, next_ts) {
        if ts >= end {
            return false;
        }
    }

    let event = match world.resource_mut::<SimulationClock>().pop_next() {
        Some(e) => e,
        None => return false,
    };
    world.insert_resource(CurrentEvent(event));

    schedule.run(world);
    hook(world, &event);
    true
}

/// Runs simulation steps until the event queue is empty or `max_steps` is reached.
/// Returns the number of steps executed.
pub fn run_until_empty(world: &mut World, schedule: &mut Schedule, max_steps: usize) -> usize {
    let mut steps = 0;
    while steps < max_steps && run_next_event(world, schedule) {
        steps += 1;
    }
    steps
}

/// Builds the simulation schedule. Every system is gated on its event kind, so
/// exactly one of them runs per event.
pub fn simulation_schedule() -> Schedule {
    let mut schedule = Schedule::default();

    schedule.add_systems((
        simulation_started_system.run_if(is_simulation_started),
        shift_dispatch_system.run_if(is_shift_dispatch),
        passenger_step_system.run_if(is_passenger_step),
        departure_system.run_if(is_departure),
        stop_reached_system.run_if(is_stop_reached),
    ));

    schedule
}

/// Schedules SimulationStarted at time 0. Call after building the scenario and
/// before running events.
pub fn initialize_simulation(world: &mut World) {
    let mut clock = world.resource_mut::<SimulationClock>();
    clock.schedule_at(0, EventKind::SimulationStarted, None);
}
