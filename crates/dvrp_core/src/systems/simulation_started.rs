use bevy_ecs::prelude::{Res, ResMut};

use crate::clock::{CurrentEvent, EventKind, SimulationClock};
use crate::shifts::ShiftDispatch;

/// Kicks off the periodic passenger step and, when shifts are configured, shift dispatch.
pub fn simulation_started_system(
    event: Res<CurrentEvent>,
    mut clock: ResMut<SimulationClock>,
    shifts: Option<Res<ShiftDispatch>>,
) {
    if event.0.kind != EventKind::SimulationStarted {
        return;
    }
    let now = event.0.timestamp;
    clock.schedule_at(now, EventKind::PassengerStep, None);
    if shifts.is_some() {
        clock.schedule_at(now, EventKind::ShiftDispatch, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::prelude::{Schedule, World};

    fn started(world: &mut World) {
        world.resource_mut::<SimulationClock>().schedule_at(0, EventKind::SimulationStarted, None);
        let event = world
            .resource_mut::<SimulationClock>()
            .pop_next()
            .expect("started event");
        world.insert_resource(CurrentEvent(event));
        let mut schedule = Schedule::default();
        schedule.add_systems(simulation_started_system);
        schedule.run(world);
    }

    #[test]
    fn schedules_passenger_step_only_without_shifts() {
        let mut world = World::new();
        world.insert_resource(SimulationClock::default());
        started(&mut world);

        let clock = world.resource::<SimulationClock>();
        assert!(clock.has_pending(EventKind::PassengerStep));
        assert!(!clock.has_pending(EventKind::ShiftDispatch));
        assert_eq!(clock.next_event_time(), Some(0));
    }
}
