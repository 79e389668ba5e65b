use bevy_ecs::prelude::{Res, ResMut, Resource};

use crate::clock::{CurrentEvent, EventKind, SimTime, SimulationClock};
use crate::config::ShiftDispatchConfig;
use crate::error::DvrpError;
use crate::ids::{LinkId, VehicleId};
use crate::scenario::SimulationFault;
use crate::shifts::{BreakTask, ShiftDispatch, ShiftDispatcher, ShiftInstruction};
use crate::telemetry::DvrpTelemetry;

#[derive(Debug, Clone)]
struct PlannedBreak {
    vehicle: VehicleId,
    link: LinkId,
    task: BreakTask,
    started: bool,
}

#[derive(Debug, Clone)]
struct PlannedShiftEnd {
    vehicle: VehicleId,
    link: LinkId,
    end_time: SimTime,
}

/// Breaks and shift ends the dispatcher asked for, carried out once due.
/// Stands in for vehicles driving to the facility.
#[derive(Debug, Default, Resource)]
pub struct ShiftTaskQueue {
    breaks: Vec<PlannedBreak>,
    ends: Vec<PlannedShiftEnd>,
}

impl ShiftTaskQueue {
    pub fn accept(&mut self, instruction: ShiftInstruction) {
        match instruction {
            ShiftInstruction::ScheduleBreak {
                vehicle, link, task, ..
            } => self.breaks.push(PlannedBreak {
                vehicle,
                link,
                task,
                started: false,
            }),
            ShiftInstruction::ScheduleShiftEnd {
                vehicle,
                link,
                end_time,
                ..
            } => self.ends.push(PlannedShiftEnd {
                vehicle,
                link,
                end_time,
            }),
            ShiftInstruction::Assigned { .. } | ShiftInstruction::Started { .. } => {}
        }
    }

    pub fn is_empty(&self) -> bool {
        self.breaks.is_empty() && self.ends.is_empty()
    }

    /// Starts and ends due breaks, then ends due shifts.
    pub fn execute_due(&mut self, dispatcher: &mut dyn ShiftDispatcher, now: SimTime) -> Result<(), DvrpError> {
        let mut finished = Vec::new();
        for (i, planned) in self.breaks.iter_mut().enumerate() {
            if !planned.started && planned.task.begin <= now {
                dispatcher.start_break(&planned.vehicle, &planned.link, now)?;
                planned.started = true;
            }
            if planned.started && planned.task.end <= now {
                dispatcher.end_break(&planned.vehicle, &planned.task, now)?;
                finished.push(i);
            }
        }
        for i in finished.into_iter().rev() {
            self.breaks.remove(i);
        }

        let (due, later): (Vec<_>, Vec<_>) = std::mem::take(&mut self.ends)
            .into_iter()
            .partition(|end| end.end_time <= now);
        self.ends = later;
        for end in due {
            dispatcher.end_shift(&end.vehicle, &end.link, now)?;
        }
        Ok(())
    }
}

pub fn shift_dispatch_system(
    event: Res<CurrentEvent>,
    config: Res<ShiftDispatchConfig>,
    mut dispatch: ResMut<ShiftDispatch>,
    mut tasks: ResMut<ShiftTaskQueue>,
    mut telemetry: ResMut<DvrpTelemetry>,
    mut clock: ResMut<SimulationClock>,
    mut fault: ResMut<SimulationFault>,
) {
    if event.0.kind != EventKind::ShiftDispatch {
        return;
    }
    let now = event.0.timestamp;
    let dispatcher = dispatch.0.as_mut();

    for instruction in dispatcher.dispatch(now) {
        tasks.accept(instruction);
    }
    if let Err(err) = tasks.execute_due(dispatcher, now) {
        fault.record(err);
    }
    telemetry.record_shift_events(dispatcher.drain_events());

    if dispatcher.has_open_shifts() || !tasks.is_empty() {
        clock.schedule_at(now + config.dispatch_interval.max(1), EventKind::ShiftDispatch, None);
    }
}
