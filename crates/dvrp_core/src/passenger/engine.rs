//! Passenger engine: turns departures into requests, coordinates pickups and
//! dropoffs, and applies optimizer rejections one step late.
//!
//! Two tables drive everything:
//! - active passengers: request id -> traveler, from departure until dropoff
//!   or rejection;
//! - waiting stops: request id -> stop activity that reached the pickup point
//!   before the traveler did.
//!
//! A request id is never in both at once. A rejection for a pre-booked request
//! whose traveler has not departed yet is parked until the departure, then
//! applied on the following step. Rejections arrive through a channel
//! (see [super::rejection]) and are applied only by [PassengerEngine::step],
//! and only for events strictly older than the instant being stepped. An event
//! published "at" the current instant can therefore race with nothing: it is
//! always applied on the next step.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bevy_ecs::prelude::{Entity, Resource};

use crate::clock::SimTime;
use crate::error::DvrpError;
use crate::ids::{LinkId, Mode, PersonId, RequestId, VehicleId};
use crate::network::{Link, Network};
use crate::optimizer::SharedOptimizer;

use super::advance::{AdvanceRequestProvider, NoAdvanceRequests};
use super::events::{PassengerEventKind, PassengerObservation};
use super::handling::PassengerHandling;
use super::mobsim::{DepartingAgent, MobsimInterface};
use super::rejection::{RejectionEvent, RejectionHandler, RejectionInbox};
use super::request::{
    DefaultRequestCreator, DefaultRequestValidator, PassengerRequest, PassengerRequestCreator,
    PassengerRequestValidator, RequestStatus,
};

/// A traveler bound to an in-flight request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivePassenger {
    pub handle: Entity,
    pub person: PersonId,
    pub to_link: LinkId,
    pub status: RequestStatus,
}

pub struct PassengerEngine {
    mode: Mode,
    network: Arc<Network>,
    creator: Box<dyn PassengerRequestCreator>,
    validator: Box<dyn PassengerRequestValidator>,
    advance_requests: Box<dyn AdvanceRequestProvider>,
    optimizer: SharedOptimizer,
    handling: PassengerHandling,
    active_passengers: HashMap<RequestId, ActivePassenger>,
    waiting_for_passenger: HashMap<RequestId, Entity>,
    rejections: RejectionInbox,
    rejection_handler: RejectionHandler,
    parked_rejections: HashMap<RequestId, RejectionEvent>,
}

pub struct PassengerEngineBuilder {
    mode: Mode,
    network: Arc<Network>,
    optimizer: SharedOptimizer,
    creator: Option<Box<dyn PassengerRequestCreator>>,
    validator: Option<Box<dyn PassengerRequestValidator>>,
    advance_requests: Option<Box<dyn AdvanceRequestProvider>>,
}

impl PassengerEngineBuilder {
    pub fn with_request_creator(mut self, creator: impl PassengerRequestCreator + 'static) -> Self {
        self.creator = Some(Box::new(creator));
        self
    }

    pub fn with_validator(mut self, validator: impl PassengerRequestValidator + 'static) -> Self {
        self.validator = Some(Box::new(validator));
        self
    }

    pub fn with_advance_requests(mut self, provider: impl AdvanceRequestProvider + 'static) -> Self {
        self.advance_requests = Some(Box::new(provider));
        self
    }

    pub fn build(self) -> PassengerEngine {
        let (rejections, rejection_handler) = RejectionInbox::new(self.mode.clone());
        PassengerEngine {
            creator: self
                .creator
                .unwrap_or_else(|| Box::new(DefaultRequestCreator::new(self.mode.clone()))),
            validator: self
                .validator
                .unwrap_or_else(|| Box::new(DefaultRequestValidator)),
            advance_requests: self
                .advance_requests
                .unwrap_or_else(|| Box::new(NoAdvanceRequests)),
            handling: PassengerHandling::new(self.mode.clone()),
            mode: self.mode,
            network: self.network,
            optimizer: self.optimizer,
            active_passengers: HashMap::new(),
            waiting_for_passenger: HashMap::new(),
            rejections,
            rejection_handler,
            parked_rejections: HashMap::new(),
        }
    }
}

impl PassengerEngine {
    /// `network` must be the network of this engine's mode; departures from links
    /// outside it are configuration errors.
    pub fn builder(
        mode: impl Into<Mode>,
        network: Arc<Network>,
        optimizer: SharedOptimizer,
    ) -> PassengerEngineBuilder {
        PassengerEngineBuilder {
            mode: mode.into(),
            network,
            optimizer,
            creator: None,
            validator: None,
            advance_requests: None,
        }
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn optimizer(&self) -> &SharedOptimizer {
        &self.optimizer
    }

    /// Returns `Ok(false)` when the agent travels on another mode.
    pub fn handle_departure(
        &mut self,
        now: SimTime,
        agent: &DepartingAgent,
        from_link: &LinkId,
        mobsim: &mut impl MobsimInterface,
    ) -> Result<bool, DvrpError> {
        if agent.mode != self.mode {
            return Ok(false);
        }
        let planned = agent.planned_leg()?;

        match self
            .advance_requests
            .retrieve_request(&agent.person, planned.index)
        {
            None => {
                let network = Arc::clone(&self.network);
                let from = modal_link(&network, &self.mode, from_link)?;
                let to = modal_link(&network, &self.mode, &planned.leg.to_link)?;
                let id = self.handling.create_request_id();
                let request = self.creator.create_request(
                    id,
                    agent.person.clone(),
                    planned.leg.route.as_ref(),
                    from,
                    to,
                    now,
                    now,
                );
                tracing::debug!(mode = %self.mode, request = %request.id, person = %agent.person, "immediate request created");

                // Emitted before submission so it precedes any rejection of this request.
                mobsim.process_event(self.observation(now, PassengerEventKind::Waiting, &request));
                self.bind(&request, agent.handle, RequestStatus::Created);
                if self.validate_and_submit(agent.handle, &request, now) {
                    self.release_waiting_stop(&request.id, agent.handle, now, mobsim);
                }
            }
            Some(request) => {
                tracing::debug!(mode = %self.mode, request = %request.id, person = %agent.person, "prebooked request activated");
                mobsim.process_event(self.observation(now, PassengerEventKind::Waiting, &request));
                self.bind(&request, agent.handle, RequestStatus::WaitingActive);

                if let Some(rejection) = self.parked_rejections.remove(&request.id) {
                    tracing::debug!(mode = %self.mode, request = %request.id, "booking was rejected before departure");
                    self.rejections.requeue(rejection);
                } else {
                    self.release_waiting_stop(&request.id, agent.handle, now, mobsim);
                }
            }
        }
        Ok(true)
    }

    /// Validates `request` and submits it inside the optimizer's critical
    /// section. A declined request is dropped here without further tracking;
    /// optimizer rejections only surface later through [Self::step].
    pub fn validate_and_submit(
        &mut self,
        passenger: Entity,
        request: &PassengerRequest,
        now: SimTime,
    ) -> bool {
        if !self
            .handling
            .validate_request(request, self.validator.as_ref(), now)
        {
            if self
                .active_passengers
                .get(&request.id)
                .is_some_and(|active| active.handle == passenger)
            {
                self.active_passengers.remove(&request.id);
            }
            return false;
        }

        self.optimizer.submit(request);
        if let Some(active) = self.active_passengers.get_mut(&request.id) {
            active.status = RequestStatus::Submitted;
        }
        tracing::debug!(mode = %self.mode, request = %request.id, "request submitted");
        true
    }

    /// Returns `true` when the traveler is already there. Otherwise remembers
    /// `stop` and notifies it once the traveler departs.
    pub fn notify_wait_for_passenger(&mut self, stop: Entity, request: &RequestId) -> bool {
        if self.active_passengers.contains_key(request) {
            return true;
        }
        self.waiting_for_passenger.insert(request.clone(), stop);
        false
    }

    /// Boards the traveler bound to `request`; `false` if nobody is there to board.
    pub fn try_pick_up_passenger(
        &mut self,
        stop: Entity,
        vehicle: &VehicleId,
        request: &RequestId,
        now: SimTime,
        mobsim: &mut impl MobsimInterface,
    ) -> bool {
        let Some(active) = self.active_passengers.get_mut(request) else {
            return false;
        };
        if active.status == RequestStatus::PickedUp {
            tracing::warn!(mode = %self.mode, request = %request, ?stop, "passenger already on board");
            return false;
        }

        active.status = RequestStatus::PickedUp;
        self.waiting_for_passenger.remove(request);
        self.handling
            .pick_up(mobsim, vehicle, active.handle, &active.person, request, now);
        true
    }

    /// Ends the ride. Dropping off a request nobody is bound to means the
    /// vehicle schedule is broken upstream.
    pub fn drop_off_passenger(
        &mut self,
        vehicle: &VehicleId,
        request: &RequestId,
        now: SimTime,
        mobsim: &mut impl MobsimInterface,
    ) -> Result<Entity, DvrpError> {
        let active = self
            .active_passengers
            .remove(request)
            .ok_or_else(|| DvrpError::UnboundRequest {
                request: request.clone(),
                mode: self.mode.clone(),
            })?;
        self.handling.drop_off(
            mobsim,
            vehicle,
            active.handle,
            &active.person,
            request,
            &active.to_link,
            now,
        );
        Ok(active.handle)
    }

    /// Queues a rejection for the next steps. Safe to call from any thread via
    /// [Self::rejection_handler]; never touches engine tables.
    pub fn on_rejection_event(&self, event: RejectionEvent) {
        self.rejection_handler.handle_event(event);
    }

    pub fn rejection_handler(&self) -> RejectionHandler {
        self.rejection_handler.clone()
    }

    /// Applies queued rejections older than `now`, in arrival order. Returns how
    /// many travelers were aborted.
    pub fn step(&mut self, now: SimTime, mobsim: &mut impl MobsimInterface) -> usize {
        self.rejections.collect();
        let mut applied = 0;
        while let Some(event) = self.rejections.pop_before(now) {
            self.waiting_for_passenger.remove(&event.request);
            let Some(active) = self.active_passengers.remove(&event.request) else {
                if self.advance_requests.is_booked(&event.request) {
                    tracing::debug!(mode = %self.mode, request = %event.request, "rejection parked until departure");
                    self.parked_rejections.insert(event.request.clone(), event);
                } else {
                    tracing::trace!(mode = %self.mode, request = %event.request, "rejection for untracked request discarded");
                }
                continue;
            };
            tracing::debug!(
                mode = %self.mode,
                request = %event.request,
                cause = %event.cause,
                rejected_at = event.time,
                "rejection applied"
            );
            mobsim.process_event(
                PassengerObservation::new(
                    now,
                    PassengerEventKind::Rejected,
                    &self.mode,
                    &event.request,
                    &active.person,
                )
                .with_cause(event.cause),
            );
            mobsim.abort_passenger(active.handle, now);
            applied += 1;
        }
        applied
    }

    pub fn active_passenger(&self, request: &RequestId) -> Option<&ActivePassenger> {
        self.active_passengers.get(request)
    }

    pub fn request_status(&self, request: &RequestId) -> Option<RequestStatus> {
        self.active_passengers.get(request).map(|active| active.status)
    }

    /// Whether any in-flight request is bound to `passenger`.
    pub fn is_bound(&self, passenger: Entity) -> bool {
        self.active_passengers
            .values()
            .any(|active| active.handle == passenger)
    }

    pub fn is_waiting_for_passenger(&self, request: &RequestId) -> bool {
        self.waiting_for_passenger.contains_key(request)
    }

    pub fn active_count(&self) -> usize {
        self.active_passengers.len()
    }

    pub fn waiting_stop_count(&self) -> usize {
        self.waiting_for_passenger.len()
    }

    /// Rejections received but not yet applied (or discarded).
    pub fn pending_rejections(&self) -> usize {
        self.rejections.len()
    }

    /// Rejected bookings whose traveler has not departed yet.
    pub fn parked_rejections(&self) -> usize {
        self.parked_rejections.len()
    }

    /// Hands the traveler to a stop that reached the pickup point first.
    fn release_waiting_stop(
        &mut self,
        request: &RequestId,
        passenger: Entity,
        now: SimTime,
        mobsim: &mut impl MobsimInterface,
    ) {
        if let Some(stop) = self.waiting_for_passenger.remove(request) {
            mobsim.notify_passenger_ready(stop, passenger, now);
        }
    }

    fn bind(&mut self, request: &PassengerRequest, passenger: Entity, status: RequestStatus) {
        let previous = self.active_passengers.insert(
            request.id.clone(),
            ActivePassenger {
                handle: passenger,
                person: request.passenger.clone(),
                to_link: request.to_link.clone(),
                status,
            },
        );
        if let Some(previous) = previous {
            tracing::warn!(mode = %self.mode, request = %request.id, replaced = ?previous.handle, "request bound twice");
        }
    }

    fn observation(
        &self,
        now: SimTime,
        kind: PassengerEventKind,
        request: &PassengerRequest,
    ) -> PassengerObservation {
        PassengerObservation::new(now, kind, &self.mode, &request.id, &request.passenger)
    }
}

impl fmt::Debug for PassengerEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PassengerEngine")
            .field("mode", &self.mode)
            .field("active_passengers", &self.active_passengers.len())
            .field("waiting_for_passenger", &self.waiting_for_passenger.len())
            .field("pending_rejections", &self.rejections.len())
            .finish()
    }
}

pub(super) fn modal_link<'a>(network: &'a Network, mode: &Mode, id: &LinkId) -> Result<&'a Link, DvrpError> {
    network.link(id).ok_or_else(|| DvrpError::MissingLink {
        link: id.clone(),
        mode: mode.clone(),
    })
}

/// All passenger engines of a simulation, one per mode, in departure-handler order.
#[derive(Debug, Default, Resource)]
pub struct PassengerEngines(pub Vec<PassengerEngine>);

impl PassengerEngines {
    /// Offers the departure to each engine until one handles it.
    pub fn handle_departure(
        &mut self,
        now: SimTime,
        agent: &DepartingAgent,
        from_link: &LinkId,
        mobsim: &mut impl MobsimInterface,
    ) -> Result<bool, DvrpError> {
        for engine in &mut self.0 {
            if engine.handle_departure(now, agent, from_link, mobsim)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn by_mode(&self, mode: &Mode) -> Option<&PassengerEngine> {
        self.0.iter().find(|engine| engine.mode() == mode)
    }

    pub fn by_mode_mut(&mut self, mode: &Mode) -> Option<&mut PassengerEngine> {
        self.0.iter_mut().find(|engine| engine.mode() == mode)
    }

    pub fn pending_rejections(&self) -> usize {
        self.0.iter().map(PassengerEngine::pending_rejections).sum()
    }

    pub fn is_bound(&self, passenger: Entity) -> bool {
        self.0.iter().any(|engine| engine.is_bound(passenger))
    }
}
