use serde::{Deserialize, Serialize};

use crate::clock::SimTime;
use crate::ids::{Mode, PersonId, RequestId, VehicleId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PassengerEventKind {
    Waiting,
    PickedUp,
    DroppedOff,
    Rejected,
}

/// Outgoing observation raised by a passenger engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassengerObservation {
    pub time: SimTime,
    pub kind: PassengerEventKind,
    pub mode: Mode,
    pub request: RequestId,
    pub person: PersonId,
    pub vehicle: Option<VehicleId>,
    pub cause: Option<String>,
}

impl PassengerObservation {
    pub(crate) fn new(
        time: SimTime,
        kind: PassengerEventKind,
        mode: &Mode,
        request: &RequestId,
        person: &PersonId,
    ) -> Self {
        Self {
            time,
            kind,
            mode: mode.clone(),
            request: request.clone(),
            person: person.clone(),
            vehicle: None,
            cause: None,
        }
    }

    pub(crate) fn with_vehicle(mut self, vehicle: &VehicleId) -> Self {
        self.vehicle = Some(vehicle.clone());
        self
    }

    pub(crate) fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }
}
