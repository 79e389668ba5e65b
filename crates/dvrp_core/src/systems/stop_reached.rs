use bevy_ecs::prelude::{Res, ResMut};
use tracing::{debug, warn};

use crate::clock::{CurrentEvent, EventKind, EventSubject};
use crate::ecs::{StopKind, StopState};
use crate::passenger::PassengerEngines;
use crate::scenario::SimulationFault;

use super::mobsim::MobsimAccess;

/// A vehicle reached a pickup or dropoff stop (or a waiting pickup stop was
/// told that its passenger arrived).
pub fn stop_reached_system(
    event: Res<CurrentEvent>,
    mut engines: ResMut<PassengerEngines>,
    mut fault: ResMut<SimulationFault>,
    mut mobsim: MobsimAccess,
) {
    if event.0.kind != EventKind::StopReached {
        return;
    }
    let Some(EventSubject::Stop(stop_entity)) = event.0.subject else {
        return;
    };
    let now = event.0.timestamp;
    let Some(stop) = mobsim.stop(stop_entity) else {
        return;
    };
    let Some(engine) = engines.by_mode_mut(&stop.mode) else {
        warn!(mode = %stop.mode, request = %stop.request, "stop for a mode without passenger engine");
        return;
    };

    match stop.kind {
        StopKind::Pickup => {
            let passenger_there = match stop.state {
                StopState::Scheduled => engine.notify_wait_for_passenger(stop_entity, &stop.request),
                StopState::WaitingForPassenger => true,
                StopState::Completed | StopState::Cancelled => return,
            };
            let boarded = passenger_there
                && engine.try_pick_up_passenger(stop_entity, &stop.vehicle, &stop.request, now, &mut mobsim);
            let next = if boarded {
                StopState::Completed
            } else {
                StopState::WaitingForPassenger
            };
            mobsim.set_stop_state(stop_entity, next);
        }
        StopKind::Dropoff { pickup } => {
            if stop.state != StopState::Scheduled {
                return;
            }
            if mobsim.stop(pickup).map(|p| p.state) != Some(StopState::Completed) {
                debug!(request = %stop.request, vehicle = %stop.vehicle, "nobody boarded; dropoff cancelled");
                mobsim.set_stop_state(stop_entity, StopState::Cancelled);
                return;
            }
            match engine.drop_off_passenger(&stop.vehicle, &stop.request, now, &mut mobsim) {
                Ok(_) => mobsim.set_stop_state(stop_entity, StopState::Completed),
                Err(err) => fault.record(err),
            }
        }
    }
}
