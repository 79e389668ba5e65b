//! The simulation side of [MobsimInterface]: engine side effects land on ECS
//! components, the clock and telemetry.

use bevy_ecs::prelude::{Entity, Query, ResMut};
use bevy_ecs::system::SystemParam;

use crate::clock::{EventKind, EventSubject, SimTime, SimulationClock};
use crate::ecs::{PassengerStop, StopState, TravelPlan, Traveler, TravelerState};
use crate::ids::{LinkId, VehicleId};
use crate::passenger::{DepartingAgent, MobsimInterface, PassengerObservation};
use crate::telemetry::DvrpTelemetry;

#[derive(SystemParam)]
pub struct MobsimAccess<'w, 's> {
    clock: ResMut<'w, SimulationClock>,
    telemetry: ResMut<'w, DvrpTelemetry>,
    travelers: Query<'w, 's, (&'static mut Traveler, &'static mut TravelPlan)>,
    stops: Query<'w, 's, &'static mut PassengerStop>,
}

impl MobsimAccess<'_, '_> {
    /// The traveler as a departing agent on its current leg, plus the link it departs from.
    /// `None` when the entity is not a traveler or its plan is finished.
    pub fn departing_agent(&self, traveler: Entity) -> Option<(DepartingAgent, LinkId)> {
        let (state, plan) = self.travelers.get(traveler).ok()?;
        let leg = plan.current()?;
        Some((
            DepartingAgent {
                handle: traveler,
                person: state.person.clone(),
                mode: leg.leg.mode.clone(),
                leg: Some(leg),
            },
            state.link.clone(),
        ))
    }

    pub fn set_traveler_state(&mut self, traveler: Entity, state: TravelerState) {
        if let Ok((mut current, _)) = self.travelers.get_mut(traveler) {
            current.state = state;
        }
    }

    pub fn stop(&self, stop: Entity) -> Option<PassengerStop> {
        self.stops.get(stop).ok().cloned()
    }

    pub fn set_stop_state(&mut self, stop: Entity, state: StopState) {
        if let Ok(mut current) = self.stops.get_mut(stop) {
            current.state = state;
        }
    }

    /// Aborts a traveler that departed but is tracked by no engine.
    pub fn abort_untracked(&mut self, traveler: Entity, now: SimTime) {
        self.abort_passenger(traveler, now);
        self.telemetry.travelers_aborted += 1;
    }

    /// Whether travelers still have departures or stops ahead.
    pub fn has_pending_traffic(&self) -> bool {
        self.clock.has_pending(EventKind::Departure) || self.clock.has_pending(EventKind::StopReached)
    }

    pub fn schedule_at(&mut self, timestamp: SimTime, kind: EventKind) {
        self.clock.schedule_at(timestamp, kind, None);
    }
}

impl MobsimInterface for MobsimAccess<'_, '_> {
    fn process_event(&mut self, observation: PassengerObservation) {
        self.telemetry.record_observation(observation);
    }

    fn notify_passenger_ready(&mut self, stop: Entity, _passenger: Entity, now: SimTime) {
        self.clock
            .schedule_at(now, EventKind::StopReached, Some(EventSubject::Stop(stop)));
    }

    fn board_passenger(&mut self, vehicle: &VehicleId, passenger: Entity, _now: SimTime) {
        if let Ok((mut traveler, _)) = self.travelers.get_mut(passenger) {
            traveler.state = TravelerState::InVehicle;
            traveler.vehicle = Some(vehicle.clone());
        }
    }

    fn alight_passenger(
        &mut self,
        _vehicle: &VehicleId,
        passenger: Entity,
        to_link: &LinkId,
        now: SimTime,
    ) {
        let Ok((mut traveler, mut plan)) = self.travelers.get_mut(passenger) else {
            return;
        };
        traveler.link = to_link.clone();
        traveler.vehicle = None;
        match plan.advance().map(|leg| leg.departure_time) {
            Some(departure) => {
                traveler.state = TravelerState::Activity;
                self.clock.schedule_at(
                    departure.max(now),
                    EventKind::Departure,
                    Some(EventSubject::Traveler(passenger)),
                );
            }
            None => traveler.state = TravelerState::Arrived,
        }
    }

    fn abort_passenger(&mut self, passenger: Entity, _now: SimTime) {
        if let Ok((mut traveler, _)) = self.travelers.get_mut(passenger) {
            traveler.state = TravelerState::Aborted;
            traveler.vehicle = None;
        }
    }
}
