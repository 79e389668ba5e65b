//! Fatal errors raised by the dispatch core.
//!
//! Validation and optimizer rejections are ordinary outcomes and never show up
//! here; everything in [DvrpError] means either a broken scenario setup or a bug
//! in an upstream collaborator.

use crate::config::ConfigError;
use crate::ids::{FacilityId, LinkId, Mode, PersonId, RequestId, ShiftId, VehicleId};
use crate::shifts::ShiftState;

/// Broad class of a [DvrpError].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Scenario data does not fit together (missing links, unknown vehicles, bad config).
    Configuration,
    /// A collaborator called the core in a way that cannot happen in a correct simulation.
    InvariantViolation,
}

#[derive(Debug, thiserror::Error)]
pub enum DvrpError {
    #[error(
        "link id={link} does not exist in network for mode {mode}; \
         agent departs from a link that does not belong to that network?"
    )]
    MissingLink { link: LinkId, mode: Mode },
    #[error("agent {person} departing with mode {mode} has no current leg")]
    NotAPlanAgent { person: PersonId, mode: Mode },
    #[error("unknown vehicle {0}")]
    UnknownVehicle(VehicleId),
    #[error("unknown operation facility {0}")]
    UnknownFacility(FacilityId),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("no passenger bound to request {request} (mode {mode}) at dropoff")]
    UnboundRequest { request: RequestId, mode: Mode },
    #[error("shift {shift}: illegal transition {from:?} -> {to:?}")]
    IllegalShiftTransition {
        shift: ShiftId,
        from: ShiftState,
        to: ShiftState,
    },
    #[error("vehicle {0} has no shift")]
    NoActiveShift(VehicleId),
}

impl DvrpError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DvrpError::MissingLink { .. }
            | DvrpError::NotAPlanAgent { .. }
            | DvrpError::UnknownVehicle(_)
            | DvrpError::UnknownFacility(_)
            | DvrpError::Config(_) => ErrorKind::Configuration,
            DvrpError::UnboundRequest { .. }
            | DvrpError::IllegalShiftTransition { .. }
            | DvrpError::NoActiveShift(_) => ErrorKind::InvariantViolation,
        }
    }

    pub fn is_invariant_violation(&self) -> bool {
        self.kind() == ErrorKind::InvariantViolation
    }
}
