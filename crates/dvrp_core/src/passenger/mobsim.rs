//! What the passenger engine needs from the surrounding simulation.

use bevy_ecs::prelude::Entity;

use crate::clock::SimTime;
use crate::error::DvrpError;
use crate::ids::{LinkId, Mode, PersonId, VehicleId};
use crate::plan::PlannedLeg;

use super::events::PassengerObservation;

/// Side effects the engine asks the simulation to carry out.
///
/// The engine never owns travelers or stop activities; it refers to them by
/// `Entity` and lets the implementation of this trait touch their state.
pub trait MobsimInterface {
    fn process_event(&mut self, observation: PassengerObservation);

    /// Tell a stop activity that was waiting for `passenger` that the passenger has arrived.
    fn notify_passenger_ready(&mut self, stop: Entity, passenger: Entity, now: SimTime);

    fn board_passenger(&mut self, vehicle: &VehicleId, passenger: Entity, now: SimTime);

    /// End the passenger's leg at `to_link`.
    fn alight_passenger(
        &mut self,
        vehicle: &VehicleId,
        passenger: Entity,
        to_link: &LinkId,
        now: SimTime,
    );

    /// Force the passenger's plan into the aborted state.
    fn abort_passenger(&mut self, passenger: Entity, now: SimTime);
}

/// A departing agent as seen by the engine.
///
/// `leg` is `None` for agents that cannot expose a plan (e.g. scripted
/// agents); departing with such an agent on an engine's mode is an error.
#[derive(Debug, Clone)]
pub struct DepartingAgent {
    pub handle: Entity,
    pub person: PersonId,
    pub mode: Mode,
    pub leg: Option<PlannedLeg>,
}

impl DepartingAgent {
    pub fn planned_leg(&self) -> Result<&PlannedLeg, DvrpError> {
        self.leg.as_ref().ok_or_else(|| DvrpError::NotAPlanAgent {
            person: self.person.clone(),
            mode: self.mode.clone(),
        })
    }
}
