use bevy_ecs::prelude::{Component, Entity};

use crate::ids::{LinkId, Mode, PersonId, RequestId, VehicleId};
use crate::plan::{Leg, PlannedLeg};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TravelerState {
    /// Performing an activity between legs.
    Activity,
    /// Departed and waiting for pickup.
    Waiting,
    InVehicle,
    /// Plan finished.
    Arrived,
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq, Component)]
pub struct Traveler {
    pub person: PersonId,
    pub state: TravelerState,
    pub link: LinkId,
    pub vehicle: Option<VehicleId>,
}

impl Traveler {
    pub fn new(person: impl Into<PersonId>, link: impl Into<LinkId>) -> Self {
        Self {
            person: person.into(),
            state: TravelerState::Activity,
            link: link.into(),
            vehicle: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Component)]
pub struct TravelPlan {
    pub legs: Vec<Leg>,
    pub current_leg: usize,
}

impl TravelPlan {
    pub fn new(legs: Vec<Leg>) -> Self {
        Self {
            legs,
            current_leg: 0,
        }
    }

    pub fn current(&self) -> Option<PlannedLeg> {
        self.legs.get(self.current_leg).map(|leg| PlannedLeg {
            index: self.current_leg,
            leg: leg.clone(),
        })
    }

    /// Moves to the next leg and returns it, if any.
    pub fn advance(&mut self) -> Option<&Leg> {
        self.current_leg += 1;
        self.legs.get(self.current_leg)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopKind {
    Pickup,
    /// Carries the pickup stop of the same request.
    Dropoff { pickup: Entity },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopState {
    Scheduled,
    WaitingForPassenger,
    Completed,
    /// The pickup never happened, so there is nobody to drop off.
    Cancelled,
}

/// A vehicle stop serving one passenger request.
#[derive(Debug, Clone, PartialEq, Eq, Component)]
pub struct PassengerStop {
    pub vehicle: VehicleId,
    pub request: RequestId,
    pub mode: Mode,
    pub kind: StopKind,
    pub state: StopState,
}

impl PassengerStop {
    pub fn pickup(vehicle: impl Into<VehicleId>, request: impl Into<RequestId>, mode: impl Into<Mode>) -> Self {
        Self {
            vehicle: vehicle.into(),
            request: request.into(),
            mode: mode.into(),
            kind: StopKind::Pickup,
            state: StopState::Scheduled,
        }
    }

    pub fn dropoff(pickup_stop: Entity, pickup: &PassengerStop) -> Self {
        Self {
            vehicle: pickup.vehicle.clone(),
            request: pickup.request.clone(),
            mode: pickup.mode.clone(),
            kind: StopKind::Dropoff { pickup: pickup_stop },
            state: StopState::Scheduled,
        }
    }
}
