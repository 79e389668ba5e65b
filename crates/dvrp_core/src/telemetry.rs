//! Telemetry / KPIs: passenger observations, shift events and completed rides.

use std::collections::HashMap;

use bevy_ecs::prelude::Resource;

use crate::clock::SimTime;
use crate::ids::{Mode, PersonId, RequestId, VehicleId};
use crate::passenger::{PassengerEventKind, PassengerObservation};
use crate::shifts::ShiftEvent;

/// One finished ride, recorded at dropoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedRideRecord {
    pub request: RequestId,
    pub person: PersonId,
    pub mode: Mode,
    pub vehicle: Option<VehicleId>,
    pub requested_at: SimTime,
    pub picked_up_at: SimTime,
    pub dropped_off_at: SimTime,
}

impl CompletedRideRecord {
    /// Time from departure to boarding.
    pub fn wait_time(&self) -> SimTime {
        self.picked_up_at.saturating_sub(self.requested_at)
    }

    /// Time on board.
    pub fn ride_duration(&self) -> SimTime {
        self.dropped_off_at.saturating_sub(self.picked_up_at)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassengerCounts {
    pub waiting: u64,
    pub picked_up: u64,
    pub dropped_off: u64,
    pub rejected: u64,
}

#[derive(Debug, Clone, Copy)]
struct RideProgress {
    requested_at: SimTime,
    picked_up_at: Option<SimTime>,
}

#[derive(Debug, Default, Resource)]
pub struct DvrpTelemetry {
    pub observations: Vec<PassengerObservation>,
    pub shift_events: Vec<ShiftEvent>,
    pub counts: PassengerCounts,
    pub completed_rides: Vec<CompletedRideRecord>,
    /// Travelers dropped by the harness because no engine kept their request.
    pub travelers_aborted: u64,
    in_progress: HashMap<RequestId, RideProgress>,
}

impl DvrpTelemetry {
    pub fn record_observation(&mut self, observation: PassengerObservation) {
        match observation.kind {
            PassengerEventKind::Waiting => {
                self.counts.waiting += 1;
                self.in_progress.insert(
                    observation.request.clone(),
                    RideProgress {
                        requested_at: observation.time,
                        picked_up_at: None,
                    },
                );
            }
            PassengerEventKind::PickedUp => {
                self.counts.picked_up += 1;
                if let Some(progress) = self.in_progress.get_mut(&observation.request) {
                    progress.picked_up_at = Some(observation.time);
                }
            }
            PassengerEventKind::DroppedOff => {
                self.counts.dropped_off += 1;
                if let Some(progress) = self.in_progress.remove(&observation.request) {
                    self.completed_rides.push(CompletedRideRecord {
                        request: observation.request.clone(),
                        person: observation.person.clone(),
                        mode: observation.mode.clone(),
                        vehicle: observation.vehicle.clone(),
                        requested_at: progress.requested_at,
                        picked_up_at: progress.picked_up_at.unwrap_or(progress.requested_at),
                        dropped_off_at: observation.time,
                    });
                }
            }
            PassengerEventKind::Rejected => {
                self.counts.rejected += 1;
                self.in_progress.remove(&observation.request);
            }
        }
        self.observations.push(observation);
    }

    pub fn record_shift_events(&mut self, events: impl IntoIterator<Item = ShiftEvent>) {
        self.shift_events.extend(events);
    }

    pub fn observations_for<'a>(
        &'a self,
        request: &'a RequestId,
    ) -> impl Iterator<Item = &'a PassengerObservation> + 'a {
        self.observations.iter().filter(move |o| &o.request == request)
    }

    pub fn mean_wait_time(&self) -> Option<f64> {
        if self.completed_rides.is_empty() {
            return None;
        }
        let total: SimTime = self.completed_rides.iter().map(|r| r.wait_time()).sum();
        Some(total as f64 / self.completed_rides.len() as f64)
    }
}
