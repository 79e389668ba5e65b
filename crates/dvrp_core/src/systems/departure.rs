use bevy_ecs::prelude::{Res, ResMut};
use tracing::{debug, warn};

use crate::clock::{CurrentEvent, EventKind, EventSubject};
use crate::ecs::TravelerState;
use crate::passenger::PassengerEngines;
use crate::scenario::SimulationFault;

use super::mobsim::MobsimAccess;

/// Hands a departing traveler to the passenger engines.
pub fn departure_system(
    event: Res<CurrentEvent>,
    mut engines: ResMut<PassengerEngines>,
    mut fault: ResMut<SimulationFault>,
    mut mobsim: MobsimAccess,
) {
    if event.0.kind != EventKind::Departure {
        return;
    }
    let Some(EventSubject::Traveler(traveler)) = event.0.subject else {
        return;
    };
    let now = event.0.timestamp;
    let Some((agent, from_link)) = mobsim.departing_agent(traveler) else {
        return;
    };

    mobsim.set_traveler_state(traveler, TravelerState::Waiting);
    match engines.handle_departure(now, &agent, &from_link, &mut mobsim) {
        Ok(true) => {
            if !engines.is_bound(traveler) {
                debug!(person = %agent.person, mode = %agent.mode, "request declined locally; traveler aborted");
                mobsim.abort_untracked(traveler, now);
            }
        }
        Ok(false) => {
            warn!(person = %agent.person, mode = %agent.mode, "no passenger engine for mode; traveler aborted");
            mobsim.abort_untracked(traveler, now);
        }
        Err(err) => fault.record(err),
    }
}
