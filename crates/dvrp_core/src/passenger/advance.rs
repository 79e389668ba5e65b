//! Lookup of pre-booked requests at departure time, and the booking side that fills it.

use std::collections::HashMap;
use std::sync::Arc;

use bevy_ecs::prelude::Resource;
use parking_lot::Mutex;

use crate::clock::SimTime;
use crate::error::DvrpError;
use crate::ids::{Mode, PersonId, RequestId};
use crate::network::Network;
use crate::optimizer::SharedOptimizer;
use crate::plan::PlannedLeg;

use super::engine::modal_link;
use super::request::{
    DefaultRequestCreator, DefaultRequestValidator, PassengerRequest, PassengerRequestCreator,
    PassengerRequestValidator,
};

pub trait AdvanceRequestProvider: Send + Sync {
    /// Hands out (and forgets) the request booked for this person's leg, if any.
    fn retrieve_request(&mut self, person: &PersonId, leg_index: usize) -> Option<PassengerRequest>;

    /// Whether `request` is booked and still waiting for its traveler to depart.
    fn is_booked(&self, _request: &RequestId) -> bool {
        false
    }
}

/// Provider for modes without pre-booking: every departure is an immediate request.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAdvanceRequests;

impl AdvanceRequestProvider for NoAdvanceRequests {
    fn retrieve_request(&mut self, _person: &PersonId, _leg_index: usize) -> Option<PassengerRequest> {
        None
    }
}

type BookedRequests = Arc<Mutex<HashMap<(PersonId, usize), PassengerRequest>>>;

/// Read side of a [PrebookingManager], plugged into the passenger engine.
#[derive(Debug, Clone, Default)]
pub struct PrebookingLookup {
    booked: BookedRequests,
}

impl AdvanceRequestProvider for PrebookingLookup {
    fn retrieve_request(&mut self, person: &PersonId, leg_index: usize) -> Option<PassengerRequest> {
        self.booked.lock().remove(&(person.clone(), leg_index))
    }

    fn is_booked(&self, request: &RequestId) -> bool {
        self.booked.lock().values().any(|booked| &booked.id == request)
    }
}

/// Books legs ahead of time: the request is created, validated and submitted at
/// booking time, then handed to the engine when the traveler departs.
#[derive(Resource)]
pub struct PrebookingManager {
    mode: Mode,
    network: Arc<Network>,
    creator: Box<dyn PassengerRequestCreator>,
    validator: Box<dyn PassengerRequestValidator>,
    optimizer: SharedOptimizer,
    booked: BookedRequests,
    next_id: u64,
}

impl PrebookingManager {
    pub fn new(mode: impl Into<Mode>, network: Arc<Network>, optimizer: SharedOptimizer) -> Self {
        let mode = mode.into();
        Self {
            creator: Box::new(DefaultRequestCreator::new(mode.clone())),
            validator: Box::new(DefaultRequestValidator),
            mode,
            network,
            optimizer,
            booked: BookedRequests::default(),
            next_id: 0,
        }
    }

    pub fn with_validator(mut self, validator: impl PassengerRequestValidator + 'static) -> Self {
        self.validator = Box::new(validator);
        self
    }

    pub fn with_request_creator(mut self, creator: impl PassengerRequestCreator + 'static) -> Self {
        self.creator = Box::new(creator);
        self
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn lookup(&self) -> PrebookingLookup {
        PrebookingLookup {
            booked: Arc::clone(&self.booked),
        }
    }

    pub fn booked_count(&self) -> usize {
        self.booked.lock().len()
    }

    /// Books `leg` for `person`. Returns `Ok(None)` when the leg is not on this
    /// mode or the validator declines it.
    pub fn prebook(
        &mut self,
        now: SimTime,
        person: &PersonId,
        leg: &PlannedLeg,
    ) -> Result<Option<RequestId>, DvrpError> {
        if leg.leg.mode != self.mode {
            return Ok(None);
        }
        let network = Arc::clone(&self.network);
        let from_link = modal_link(&network, &self.mode, &leg.leg.from_link)?;
        let to_link = modal_link(&network, &self.mode, &leg.leg.to_link)?;

        let id = RequestId::new(format!("{}_prebooked_{}", self.mode, self.next_id));
        self.next_id += 1;
        let request = self.creator.create_request(
            id.clone(),
            person.clone(),
            leg.leg.route.as_ref(),
            from_link,
            to_link,
            leg.leg.departure_time,
            now,
        );

        let violations = self.validator.validate_request(&request, now);
        if !violations.is_empty() {
            tracing::debug!(
                request = %id,
                causes = ?violations,
                "prebooking declined by validator"
            );
            return Ok(None);
        }

        self.booked
            .lock()
            .insert((person.clone(), leg.index), request.clone());
        self.optimizer.submit(&request);
        tracing::debug!(request = %id, person = %person, leg = leg.index, "leg prebooked");
        Ok(Some(id))
    }
}
