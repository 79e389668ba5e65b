use serde::{Deserialize, Serialize};

use crate::clock::SimTime;
use crate::ids::{LinkId, VehicleId};

use super::shift::{DrtShift, ShiftState};

/// A fleet vehicle as far as shift planning is concerned: where it is, whether
/// the fleet marks it available, and its queue of shifts in start order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftVehicle {
    pub id: VehicleId,
    pub link: LinkId,
    #[serde(default = "available_by_default")]
    pub available: bool,
    #[serde(skip)]
    shifts: Vec<DrtShift>,
}

impl ShiftVehicle {
    pub fn new(id: impl Into<VehicleId>, link: impl Into<LinkId>) -> Self {
        Self {
            id: id.into(),
            link: link.into(),
            available: true,
            shifts: Vec::new(),
        }
    }

    pub fn shifts(&self) -> &[DrtShift] {
        &self.shifts
    }

    /// The last shift that left `Waiting`, else the next waiting one.
    pub fn current_shift(&self) -> Option<&DrtShift> {
        self.current_index().map(|i| &self.shifts[i])
    }

    pub fn current_shift_mut(&mut self) -> Option<&mut DrtShift> {
        self.current_index().map(move |i| &mut self.shifts[i])
    }

    pub fn running_shift(&self) -> Option<&DrtShift> {
        self.shifts.iter().find(|s| s.is_running())
    }

    pub fn next_waiting_mut(&mut self) -> Option<&mut DrtShift> {
        self.shifts
            .iter_mut()
            .find(|s| s.state() == ShiftState::Waiting)
    }

    /// Whether every unfinished shift ends at least `changeover` before `start`.
    pub fn is_free_for(&self, start: SimTime, changeover: SimTime) -> bool {
        self.shifts
            .iter()
            .filter(|s| s.state() != ShiftState::Ended)
            .all(|s| s.end_time + changeover <= start)
    }

    pub fn has_open_shifts(&self) -> bool {
        self.shifts.iter().any(|s| s.state() != ShiftState::Ended)
    }

    pub(crate) fn assign(&mut self, shift: DrtShift) {
        let at = self
            .shifts
            .partition_point(|s| s.start_time <= shift.start_time);
        self.shifts.insert(at, shift);
    }

    fn current_index(&self) -> Option<usize> {
        self.shifts
            .iter()
            .rposition(|s| s.state() != ShiftState::Waiting)
            .or_else(|| (!self.shifts.is_empty()).then_some(0))
    }
}

fn available_by_default() -> bool {
    true
}
