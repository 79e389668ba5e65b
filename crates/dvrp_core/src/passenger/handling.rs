//! Request-id generation plus the boarding and alighting steps shared by every engine flavour.

use bevy_ecs::prelude::Entity;

use crate::clock::SimTime;
use crate::ids::{LinkId, Mode, PersonId, RequestId, VehicleId};

use super::events::{PassengerEventKind, PassengerObservation};
use super::mobsim::MobsimInterface;
use super::request::{PassengerRequest, PassengerRequestValidator};

#[derive(Debug)]
pub(crate) struct PassengerHandling {
    mode: Mode,
    next_request: u64,
}

impl PassengerHandling {
    pub(crate) fn new(mode: Mode) -> Self {
        Self {
            mode,
            next_request: 0,
        }
    }

    pub(crate) fn create_request_id(&mut self) -> RequestId {
        let id = RequestId::new(format!("{}_{}", self.mode, self.next_request));
        self.next_request += 1;
        id
    }

    pub(crate) fn validate_request(
        &self,
        request: &PassengerRequest,
        validator: &dyn PassengerRequestValidator,
        now: SimTime,
    ) -> bool {
        let violations = validator.validate_request(request, now);
        if violations.is_empty() {
            return true;
        }
        tracing::debug!(
            mode = %self.mode,
            request = %request.id,
            causes = %violations.join(", "),
            "request discarded by validator"
        );
        false
    }

    pub(crate) fn pick_up(
        &self,
        mobsim: &mut impl MobsimInterface,
        vehicle: &VehicleId,
        passenger: Entity,
        person: &PersonId,
        request: &RequestId,
        now: SimTime,
    ) {
        mobsim.board_passenger(vehicle, passenger, now);
        mobsim.process_event(
            PassengerObservation::new(now, PassengerEventKind::PickedUp, &self.mode, request, person)
                .with_vehicle(vehicle),
        );
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn drop_off(
        &self,
        mobsim: &mut impl MobsimInterface,
        vehicle: &VehicleId,
        passenger: Entity,
        person: &PersonId,
        request: &RequestId,
        to_link: &LinkId,
        now: SimTime,
    ) {
        mobsim.process_event(
            PassengerObservation::new(now, PassengerEventKind::DroppedOff, &self.mode, request, person)
                .with_vehicle(vehicle),
        );
        mobsim.alight_passenger(vehicle, passenger, to_link, now);
    }
}
