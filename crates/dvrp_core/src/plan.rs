use serde::{Deserialize, Serialize};

use crate::clock::SimTime;
use crate::ids::{LinkId, Mode};

/// Expected route attributes of a leg, as planned before departure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LegRoute {
    pub distance: f64,
    pub travel_time: SimTime,
}

/// One leg of a traveler's daily plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    pub mode: Mode,
    pub from_link: LinkId,
    pub to_link: LinkId,
    pub departure_time: SimTime,
    #[serde(default)]
    pub route: Option<LegRoute>,
}

impl Leg {
    pub fn new(
        mode: impl Into<Mode>,
        from_link: impl Into<LinkId>,
        to_link: impl Into<LinkId>,
        departure_time: SimTime,
    ) -> Self {
        Self {
            mode: mode.into(),
            from_link: from_link.into(),
            to_link: to_link.into(),
            departure_time,
            route: None,
        }
    }

    pub fn with_route(mut self, route: LegRoute) -> Self {
        self.route = Some(route);
        self
    }
}

/// A leg together with its position in the traveler's plan.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedLeg {
    pub index: usize,
    pub leg: Leg,
}
