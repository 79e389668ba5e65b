use serde::{Deserialize, Serialize};

use crate::clock::SimTime;
use crate::error::DvrpError;
use crate::ids::{FacilityId, ShiftId};

/// Lifecycle of a shift: Waiting -> Started -> (OnBreak -> Started)* -> Ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShiftState {
    #[default]
    Waiting,
    Started,
    OnBreak,
    Ended,
}

impl ShiftState {
    pub fn can_transition_to(self, next: ShiftState) -> bool {
        matches!(
            (self, next),
            (ShiftState::Waiting, ShiftState::Started)
                | (ShiftState::Started, ShiftState::OnBreak)
                | (ShiftState::OnBreak, ShiftState::Started)
                | (ShiftState::Started, ShiftState::Ended)
        )
    }
}

/// Break window of a shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftBreak {
    pub earliest_start: SimTime,
    pub latest_end: SimTime,
    pub duration: SimTime,
}

impl ShiftBreak {
    pub fn latest_start(&self) -> SimTime {
        self.latest_end.saturating_sub(self.duration)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrtShift {
    pub id: ShiftId,
    pub start_time: SimTime,
    pub end_time: SimTime,
    #[serde(default)]
    pub shift_break: Option<ShiftBreak>,
    /// Hub the shift should end at, if fixed.
    #[serde(default)]
    pub operation_facility: Option<FacilityId>,
    #[serde(skip)]
    state: ShiftState,
    #[serde(skip)]
    break_facility: Option<FacilityId>,
    #[serde(skip)]
    break_taken: bool,
    #[serde(skip)]
    end_facility: Option<FacilityId>,
}

impl DrtShift {
    pub fn new(id: impl Into<ShiftId>, start_time: SimTime, end_time: SimTime) -> Self {
        Self {
            id: id.into(),
            start_time,
            end_time,
            shift_break: None,
            operation_facility: None,
            state: ShiftState::Waiting,
            break_facility: None,
            break_taken: false,
            end_facility: None,
        }
    }

    pub fn with_break(mut self, shift_break: ShiftBreak) -> Self {
        self.shift_break = Some(shift_break);
        self
    }

    pub fn with_operation_facility(mut self, facility: impl Into<FacilityId>) -> Self {
        self.operation_facility = Some(facility.into());
        self
    }

    pub fn state(&self) -> ShiftState {
        self.state
    }

    /// Started or on break.
    pub fn is_running(&self) -> bool {
        matches!(self.state, ShiftState::Started | ShiftState::OnBreak)
    }

    pub fn break_facility(&self) -> Option<&FacilityId> {
        self.break_facility.as_ref()
    }

    pub fn break_taken(&self) -> bool {
        self.break_taken
    }

    pub fn end_facility(&self) -> Option<&FacilityId> {
        self.end_facility.as_ref()
    }

    pub fn start(&mut self) -> Result<(), DvrpError> {
        self.transition(ShiftState::Waiting, ShiftState::Started)
    }

    pub fn start_break(&mut self) -> Result<(), DvrpError> {
        self.transition(ShiftState::Started, ShiftState::OnBreak)
    }

    pub fn end_break(&mut self) -> Result<(), DvrpError> {
        self.transition(ShiftState::OnBreak, ShiftState::Started)?;
        self.break_taken = true;
        Ok(())
    }

    pub fn end(&mut self) -> Result<(), DvrpError> {
        self.transition(ShiftState::Started, ShiftState::Ended)
    }

    pub(crate) fn schedule_break(&mut self, facility: FacilityId) {
        self.break_facility = Some(facility);
    }

    /// Drops a break reservation that was never started; returns the facility it held.
    pub(crate) fn cancel_scheduled_break(&mut self) -> Option<FacilityId> {
        if self.break_taken {
            return None;
        }
        self.break_facility.take()
    }

    pub(crate) fn schedule_end(&mut self, facility: FacilityId) {
        self.end_facility = Some(facility);
    }

    /// Moves `from -> next`; any other current state is refused.
    fn transition(&mut self, from: ShiftState, next: ShiftState) -> Result<(), DvrpError> {
        if self.state != from || !from.can_transition_to(next) {
            return Err(DvrpError::IllegalShiftTransition {
                shift: self.id.clone(),
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }
}
