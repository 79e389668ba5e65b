use serde::{Deserialize, Serialize};

use crate::clock::SimTime;
use crate::ids::{LinkId, Mode, PersonId, RequestId};
use crate::network::Link;
use crate::plan::LegRoute;

/// Cause reported when origin and destination link coincide.
pub const EQUAL_FROM_LINK_AND_TO_LINK_CAUSE: &str = "equal_from_link_and_to_link";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestStatus {
    Created,
    Submitted,
    /// A pre-booked request whose traveler has arrived at the departure point.
    WaitingActive,
    Rejected,
    PickedUp,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassengerRequest {
    pub id: RequestId,
    pub passenger: PersonId,
    pub mode: Mode,
    pub from_link: LinkId,
    pub to_link: LinkId,
    pub earliest_start_time: SimTime,
    pub submission_time: SimTime,
    pub route: Option<LegRoute>,
}

/// Factory for requests; lets a mode attach its own request attributes.
pub trait PassengerRequestCreator: Send + Sync {
    #[allow(clippy::too_many_arguments)]
    fn create_request(
        &self,
        id: RequestId,
        passenger: PersonId,
        route: Option<&LegRoute>,
        from_link: &Link,
        to_link: &Link,
        earliest_start_time: SimTime,
        submission_time: SimTime,
    ) -> PassengerRequest;
}

#[derive(Debug, Clone)]
pub struct DefaultRequestCreator {
    mode: Mode,
}

impl DefaultRequestCreator {
    pub fn new(mode: impl Into<Mode>) -> Self {
        Self { mode: mode.into() }
    }
}

impl PassengerRequestCreator for DefaultRequestCreator {
    fn create_request(
        &self,
        id: RequestId,
        passenger: PersonId,
        route: Option<&LegRoute>,
        from_link: &Link,
        to_link: &Link,
        earliest_start_time: SimTime,
        submission_time: SimTime,
    ) -> PassengerRequest {
        PassengerRequest {
            id,
            passenger,
            mode: self.mode.clone(),
            from_link: from_link.id.clone(),
            to_link: to_link.id.clone(),
            earliest_start_time,
            submission_time,
            route: route.copied(),
        }
    }
}

/// Policy deciding whether a request may be submitted to the optimizer.
pub trait PassengerRequestValidator: Send + Sync {
    /// Returns the causes that make the request unacceptable; empty means valid.
    fn validate_request(&self, request: &PassengerRequest, now: SimTime) -> Vec<String>;

    fn is_valid(&self, request: &PassengerRequest, now: SimTime) -> bool {
        self.validate_request(request, now).is_empty()
    }
}

/// Rejects trips that start and end on the same link.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRequestValidator;

impl PassengerRequestValidator for DefaultRequestValidator {
    fn validate_request(&self, request: &PassengerRequest, _now: SimTime) -> Vec<String> {
        if request.from_link == request.to_link {
            vec![EQUAL_FROM_LINK_AND_TO_LINK_CAUSE.to_owned()]
        } else {
            Vec::new()
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAllValidator;

impl PassengerRequestValidator for AcceptAllValidator {
    fn validate_request(&self, _request: &PassengerRequest, _now: SimTime) -> Vec<String> {
        Vec::new()
    }
}
