//! Test helpers for common test setup and utilities.
//!
//! This module provides shared test doubles for the optimizer and the
//! simulation side of the passenger engine, plus a small reference network.

use std::sync::Arc;

use bevy_ecs::prelude::Entity;
use parking_lot::Mutex;

use crate::clock::SimTime;
use crate::ids::{LinkId, Mode, PersonId, RequestId, VehicleId};
use crate::network::{Coord, Link, Network};
use crate::optimizer::{SharedOptimizer, VrpOptimizer};
use crate::passenger::{
    DepartingAgent, MobsimInterface, PassengerEngine, PassengerObservation, PassengerRequest, RejectionEvent,
    RejectionEventBus,
};
use crate::plan::{Leg, PlannedLeg};

pub const TEST_MODE: &str = "drt";

/// Straight line of links `l0 .. l4`, 1 km each, open to every mode, plus
/// `taxi_only`, which only the taxi mode may use.
pub fn test_network() -> Arc<Network> {
    let mut links: Vec<Link> = (0..5)
        .map(|i| {
            let x = i as f64 * 1000.0;
            Link::new(format!("l{i}"), Coord::new(x, 0.0), Coord::new(x + 1000.0, 0.0))
        })
        .collect();
    links.push(
        Link::new("taxi_only", Coord::new(0.0, 1000.0), Coord::new(1000.0, 1000.0)).with_modes(["taxi"]),
    );
    Arc::new(Network::from_links(links))
}

/// Single-leg plan position on [TEST_MODE].
pub fn test_leg(from: &str, to: &str, departure_time: SimTime) -> PlannedLeg {
    PlannedLeg {
        index: 0,
        leg: Leg::new(TEST_MODE, from, to, departure_time),
    }
}

/// Engine on [TEST_MODE] over [test_network], with default creator and validator.
pub fn test_engine(optimizer: SharedOptimizer) -> PassengerEngine {
    let network = Arc::new(test_network().filter_by_mode(&Mode::from(TEST_MODE)));
    PassengerEngine::builder(TEST_MODE, network, optimizer).build()
}

/// Optimizer that records every submitted request.
#[derive(Debug, Clone, Default)]
pub struct RecordingOptimizer {
    submitted: Arc<Mutex<Vec<PassengerRequest>>>,
}

impl RecordingOptimizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The handle to give the engine; `self` keeps seeing the submissions.
    pub fn shared(&self) -> SharedOptimizer {
        SharedOptimizer::new(self.clone())
    }

    pub fn submitted(&self) -> Vec<PassengerRequest> {
        self.submitted.lock().clone()
    }

    pub fn submitted_ids(&self) -> Vec<RequestId> {
        self.submitted.lock().iter().map(|r| r.id.clone()).collect()
    }
}

impl VrpOptimizer for RecordingOptimizer {
    fn request_submitted(&mut self, request: &PassengerRequest) {
        self.submitted.lock().push(request.clone());
    }
}

/// Optimizer that rejects every request it receives, publishing the rejection
/// at the request's submission time.
#[derive(Debug, Clone)]
pub struct RejectingOptimizer {
    bus: RejectionEventBus,
    cause: String,
}

impl RejectingOptimizer {
    pub fn new(bus: RejectionEventBus, cause: impl Into<String>) -> Self {
        Self {
            bus,
            cause: cause.into(),
        }
    }
}

impl VrpOptimizer for RejectingOptimizer {
    fn request_submitted(&mut self, request: &PassengerRequest) {
        self.bus.publish(RejectionEvent::new(
            request.submission_time,
            request.mode.clone(),
            request.id.clone(),
            self.cause.clone(),
        ));
    }
}

/// One call the engine made on a [RecordingMobsim].
#[derive(Debug, Clone, PartialEq)]
pub enum MobsimCall {
    Observation(PassengerObservation),
    PassengerReady {
        stop: Entity,
        passenger: Entity,
        now: SimTime,
    },
    Board {
        vehicle: VehicleId,
        passenger: Entity,
        now: SimTime,
    },
    Alight {
        vehicle: VehicleId,
        passenger: Entity,
        to_link: LinkId,
        now: SimTime,
    },
    Abort {
        passenger: Entity,
        now: SimTime,
    },
}

/// Mobsim double that records calls in order.
#[derive(Debug, Default)]
pub struct RecordingMobsim {
    pub calls: Vec<MobsimCall>,
}

impl RecordingMobsim {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observations(&self) -> Vec<&PassengerObservation> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                MobsimCall::Observation(observation) => Some(observation),
                _ => None,
            })
            .collect()
    }

    pub fn aborted(&self) -> Vec<Entity> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                MobsimCall::Abort { passenger, .. } => Some(*passenger),
                _ => None,
            })
            .collect()
    }

    pub fn ready_notifications(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, MobsimCall::PassengerReady { .. }))
            .count()
    }
}

impl MobsimInterface for RecordingMobsim {
    fn process_event(&mut self, observation: PassengerObservation) {
        self.calls.push(MobsimCall::Observation(observation));
    }

    fn notify_passenger_ready(&mut self, stop: Entity, passenger: Entity, now: SimTime) {
        self.calls.push(MobsimCall::PassengerReady {
            stop,
            passenger,
            now,
        });
    }

    fn board_passenger(&mut self, vehicle: &VehicleId, passenger: Entity, now: SimTime) {
        self.calls.push(MobsimCall::Board {
            vehicle: vehicle.clone(),
            passenger,
            now,
        });
    }

    fn alight_passenger(
        &mut self,
        vehicle: &VehicleId,
        passenger: Entity,
        to_link: &LinkId,
        now: SimTime,
    ) {
        self.calls.push(MobsimCall::Alight {
            vehicle: vehicle.clone(),
            passenger,
            to_link: to_link.clone(),
            now,
        });
    }

    fn abort_passenger(&mut self, passenger: Entity, now: SimTime) {
        self.calls.push(MobsimCall::Abort { passenger, now });
    }
}

/// Departing agent on [TEST_MODE] travelling `from -> to`.
pub fn departing_agent(handle: Entity, person: &str, from: &str, to: &str, now: SimTime) -> DepartingAgent {
    DepartingAgent {
        handle,
        person: PersonId::from(person),
        mode: Mode::from(TEST_MODE),
        leg: Some(test_leg(from, to, now)),
    }
}
