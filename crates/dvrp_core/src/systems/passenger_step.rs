use bevy_ecs::prelude::{Res, ResMut, Resource};

use crate::clock::{CurrentEvent, EventKind, SimTime};
use crate::passenger::PassengerEngines;

use super::mobsim::MobsimAccess;

/// Seconds between two passenger engine steps.
#[derive(Debug, Clone, Copy, Resource)]
pub struct PassengerStepInterval(pub SimTime);

impl Default for PassengerStepInterval {
    fn default() -> Self {
        Self(1)
    }
}

/// Applies deferred rejections on every engine, then re-arms itself while
/// there is anything left to react to.
pub fn passenger_step_system(
    event: Res<CurrentEvent>,
    interval: Res<PassengerStepInterval>,
    mut engines: ResMut<PassengerEngines>,
    mut mobsim: MobsimAccess,
) {
    if event.0.kind != EventKind::PassengerStep {
        return;
    }
    let now = event.0.timestamp;
    for engine in engines.0.iter_mut() {
        engine.step(now, &mut mobsim);
    }
    if mobsim.has_pending_traffic() || engines.pending_rejections() > 0 {
        mobsim.schedule_at(now + interval.0.max(1), EventKind::PassengerStep);
    }
}
