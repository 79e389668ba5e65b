use serde::{Deserialize, Serialize};

use crate::clock::SimTime;
use crate::ids::{FacilityId, LinkId, ShiftId, VehicleId};

/// A planned break slot at a facility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakTask {
    pub facility: FacilityId,
    pub begin: SimTime,
    pub end: SimTime,
}

/// What the dispatcher wants the fleet to do next. The fleet turns these into
/// vehicle tasks and reports back through `start_break`, `end_break` and
/// `end_shift`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShiftInstruction {
    Assigned {
        vehicle: VehicleId,
        shift: ShiftId,
    },
    Started {
        vehicle: VehicleId,
        shift: ShiftId,
    },
    ScheduleBreak {
        vehicle: VehicleId,
        shift: ShiftId,
        link: LinkId,
        task: BreakTask,
    },
    ScheduleShiftEnd {
        vehicle: VehicleId,
        shift: ShiftId,
        facility: FacilityId,
        link: LinkId,
        end_time: SimTime,
    },
}

impl ShiftInstruction {
    pub fn vehicle(&self) -> &VehicleId {
        match self {
            ShiftInstruction::Assigned { vehicle, .. }
            | ShiftInstruction::Started { vehicle, .. }
            | ShiftInstruction::ScheduleBreak { vehicle, .. }
            | ShiftInstruction::ScheduleShiftEnd { vehicle, .. } => vehicle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShiftEventKind {
    Assigned,
    Started,
    BreakScheduled,
    BreakStarted,
    BreakEnded,
    EndScheduled,
    Ended,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftEvent {
    pub time: SimTime,
    pub kind: ShiftEventKind,
    pub vehicle: VehicleId,
    pub shift: ShiftId,
    pub facility: Option<FacilityId>,
}

impl ShiftEvent {
    pub(crate) fn new(time: SimTime, kind: ShiftEventKind, vehicle: &VehicleId, shift: &ShiftId) -> Self {
        Self {
            time,
            kind,
            vehicle: vehicle.clone(),
            shift: shift.clone(),
            facility: None,
        }
    }

    pub(crate) fn at_facility(mut self, facility: Option<&FacilityId>) -> Self {
        self.facility = facility.cloned();
        self
    }
}
