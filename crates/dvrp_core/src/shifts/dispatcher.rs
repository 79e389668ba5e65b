use std::collections::BTreeMap;
use std::sync::Arc;

use bevy_ecs::prelude::Resource;
use tracing::{debug, warn};

use crate::clock::SimTime;
use crate::config::ShiftDispatchConfig;
use crate::error::DvrpError;
use crate::ids::{FacilityId, LinkId, VehicleId};
use crate::network::{Coord, Network};

use super::events::{BreakTask, ShiftEvent, ShiftEventKind, ShiftInstruction};
use super::facility::{FacilityKind, OperationFacilities, OperationFacility};
use super::shift::{DrtShift, ShiftState};
use super::vehicle::ShiftVehicle;

/// A shift together with the vehicle that drives it. Only lives for one decision.
#[derive(Debug, Clone, Copy)]
pub struct ShiftEntry<'a> {
    pub shift: &'a DrtShift,
    pub vehicle: &'a ShiftVehicle,
}

pub trait ShiftDispatcher: Send + Sync {
    /// Periodic re-evaluation. Decisions are only taken at dispatch-interval
    /// boundaries; other time steps return no instructions.
    fn dispatch(&mut self, time_step: SimTime) -> Vec<ShiftInstruction>;

    /// Facility for the entry's break, or `None` if no break is due right now.
    fn decide_on_break(&self, entry: &ShiftEntry<'_>) -> Option<FacilityId>;

    fn start_break(&mut self, vehicle: &VehicleId, link: &LinkId, now: SimTime) -> Result<(), DvrpError>;

    fn end_break(&mut self, vehicle: &VehicleId, task: &BreakTask, now: SimTime) -> Result<(), DvrpError>;

    fn end_shift(&mut self, vehicle: &VehicleId, link: &LinkId, now: SimTime) -> Result<(), DvrpError>;

    /// Takes the shift events recorded since the last call.
    fn drain_events(&mut self) -> Vec<ShiftEvent>;

    /// Whether any shift is still unassigned or not yet ended.
    fn has_open_shifts(&self) -> bool;
}

/// Boxed dispatcher held by the simulation world.
#[derive(Resource)]
pub struct ShiftDispatch(pub Box<dyn ShiftDispatcher>);

impl ShiftDispatch {
    pub fn new(dispatcher: impl ShiftDispatcher + 'static) -> Self {
        Self(Box::new(dispatcher))
    }
}

pub struct DefaultShiftDispatcher {
    config: ShiftDispatchConfig,
    network: Arc<Network>,
    facilities: OperationFacilities,
    vehicles: BTreeMap<VehicleId, ShiftVehicle>,
    unassigned: Vec<DrtShift>,
    events: Vec<ShiftEvent>,
    now: SimTime,
}

impl DefaultShiftDispatcher {
    pub fn new(config: ShiftDispatchConfig, network: Arc<Network>, facilities: OperationFacilities) -> Self {
        Self {
            config,
            network,
            facilities,
            vehicles: BTreeMap::new(),
            unassigned: Vec::new(),
            events: Vec::new(),
            now: 0,
        }
    }

    /// Adds a vehicle; a vehicle placed on a hub link is parked at that hub.
    pub fn add_vehicle(&mut self, vehicle: ShiftVehicle) {
        let hub = self.facilities.hub_at(&vehicle.link).map(|hub| hub.id.clone());
        if let Some(hub) = hub {
            if !matches!(self.facilities.register(&hub, &vehicle.id), Ok(true)) {
                warn!(vehicle = %vehicle.id, hub = %hub, "Hub full; vehicle starts unregistered");
            }
        }
        self.vehicles.insert(vehicle.id.clone(), vehicle);
    }

    pub fn add_shift(&mut self, shift: DrtShift) {
        let at = self
            .unassigned
            .partition_point(|s| (s.start_time, &s.id) <= (shift.start_time, &shift.id));
        self.unassigned.insert(at, shift);
    }

    pub fn vehicle(&self, id: &VehicleId) -> Option<&ShiftVehicle> {
        self.vehicles.get(id)
    }

    pub fn vehicles(&self) -> impl Iterator<Item = &ShiftVehicle> {
        self.vehicles.values()
    }

    pub fn facilities(&self) -> &OperationFacilities {
        &self.facilities
    }

    pub fn unassigned_shifts(&self) -> &[DrtShift] {
        &self.unassigned
    }

    pub fn config(&self) -> &ShiftDispatchConfig {
        &self.config
    }

    /// Fleet-side update of a vehicle's position and availability.
    pub fn update_vehicle(&mut self, id: &VehicleId, link: &LinkId, available: bool) -> Result<(), DvrpError> {
        let vehicle = self
            .vehicles
            .get_mut(id)
            .ok_or_else(|| DvrpError::UnknownVehicle(id.clone()))?;
        vehicle.link = link.clone();
        vehicle.available = available;
        Ok(())
    }

    fn link_coord(&self, link: &LinkId) -> Option<Coord> {
        self.network.link(link).map(|l| l.coord())
    }

    fn assign_shifts(&mut self, now: SimTime, out: &mut Vec<ShiftInstruction>) {
        let horizon = now + self.config.shift_schedule_look_ahead;
        let mut remaining = Vec::with_capacity(self.unassigned.len());
        for shift in std::mem::take(&mut self.unassigned) {
            if shift.end_time <= now {
                warn!(shift = %shift.id, end = shift.end_time, "Shift expired before a vehicle was assigned");
                continue;
            }
            if shift.start_time > horizon {
                remaining.push(shift);
                continue;
            }
            let Some(vehicle_id) = self.select_vehicle(&shift) else {
                remaining.push(shift);
                continue;
            };
            debug!(shift = %shift.id, vehicle = %vehicle_id, "Shift assigned");
            self.events
                .push(ShiftEvent::new(now, ShiftEventKind::Assigned, &vehicle_id, &shift.id));
            out.push(ShiftInstruction::Assigned {
                vehicle: vehicle_id.clone(),
                shift: shift.id.clone(),
            });
            if let Some(vehicle) = self.vehicles.get_mut(&vehicle_id) {
                vehicle.assign(shift);
            }
        }
        self.unassigned = remaining;
    }

    /// Free vehicle closest to the shift's hub, or the first free one when the
    /// shift has no hub.
    fn select_vehicle(&self, shift: &DrtShift) -> Option<VehicleId> {
        let changeover = self.config.changeover_duration;
        let mut candidates = self
            .vehicles
            .values()
            .filter(|v| v.available && v.is_free_for(shift.start_time, changeover));
        let hub_coord = shift
            .operation_facility
            .as_ref()
            .and_then(|id| self.facilities.get(id))
            .map(|hub| hub.coord);
        match hub_coord {
            Some(target) => candidates
                .map(|v| {
                    let distance = self
                        .link_coord(&v.link)
                        .map_or(f64::INFINITY, |c| c.distance(&target));
                    (distance, v)
                })
                .min_by(|a, b| a.0.total_cmp(&b.0))
                .map(|(_, v)| v.id.clone()),
            None => candidates.next().map(|v| v.id.clone()),
        }
    }

    fn start_shifts(&mut self, now: SimTime, out: &mut Vec<ShiftInstruction>) {
        let Self {
            vehicles,
            facilities,
            events,
            ..
        } = self;
        for vehicle in vehicles.values_mut() {
            if vehicle.running_shift().is_some() {
                continue;
            }
            let id = vehicle.id.clone();
            let Some(shift) = vehicle.next_waiting_mut() else {
                continue;
            };
            if shift.start_time > now {
                continue;
            }
            if let Err(err) = shift.start() {
                warn!(error = %err, "Shift could not start");
                continue;
            }
            facilities.deregister_everywhere(&id);
            debug!(shift = %shift.id, vehicle = %id, "Shift started");
            events.push(ShiftEvent::new(now, ShiftEventKind::Started, &id, &shift.id));
            out.push(ShiftInstruction::Started {
                vehicle: id,
                shift: shift.id.clone(),
            });
        }
    }

    fn schedule_breaks(&mut self, now: SimTime, out: &mut Vec<ShiftInstruction>) {
        let ids: Vec<VehicleId> = self.vehicles.keys().cloned().collect();
        for id in ids {
            let decision = self.vehicles.get(&id).and_then(|vehicle| {
                let shift = vehicle.current_shift()?;
                let facility = self.decide_on_break(&ShiftEntry { shift, vehicle })?;
                Some((facility, shift.shift_break?))
            });
            let Some((facility_id, shift_break)) = decision else {
                continue;
            };
            if !matches!(self.facilities.register(&facility_id, &id), Ok(true)) {
                continue;
            }
            let Some(link) = self.facilities.get(&facility_id).map(|f| f.link.clone()) else {
                continue;
            };
            let Some(shift) = self.vehicles.get_mut(&id).and_then(|v| v.current_shift_mut()) else {
                continue;
            };
            shift.schedule_break(facility_id.clone());
            let begin = shift_break.earliest_start.max(now);
            let task = BreakTask {
                facility: facility_id.clone(),
                begin,
                end: begin + shift_break.duration,
            };
            debug!(shift = %shift.id, vehicle = %id, facility = %facility_id, begin, "Break scheduled");
            self.events.push(
                ShiftEvent::new(now, ShiftEventKind::BreakScheduled, &id, &shift.id)
                    .at_facility(Some(&facility_id)),
            );
            out.push(ShiftInstruction::ScheduleBreak {
                vehicle: id,
                shift: shift.id.clone(),
                link,
                task,
            });
        }
    }

    fn schedule_shift_ends(&mut self, now: SimTime, out: &mut Vec<ShiftInstruction>) {
        let horizon = now + self.config.shift_end_look_ahead;
        let ids: Vec<VehicleId> = self.vehicles.keys().cloned().collect();
        for id in ids {
            let target = self.vehicles.get(&id).and_then(|vehicle| {
                let shift = vehicle.current_shift()?;
                // A vehicle heading to or sitting at a break finishes it first.
                let break_pending = shift.break_facility().is_some() && !shift.break_taken();
                if shift.state() != ShiftState::Started
                    || shift.end_facility().is_some()
                    || break_pending
                    || shift.end_time > horizon
                {
                    return None;
                }
                self.end_facility_for(shift, vehicle)
            });
            let Some((facility_id, link)) = target else {
                continue;
            };
            if !matches!(self.facilities.register(&facility_id, &id), Ok(true)) {
                continue;
            }
            let Some(shift) = self.vehicles.get_mut(&id).and_then(|v| v.current_shift_mut()) else {
                continue;
            };
            shift.schedule_end(facility_id.clone());
            debug!(shift = %shift.id, vehicle = %id, facility = %facility_id, "Shift end scheduled");
            self.events.push(
                ShiftEvent::new(now, ShiftEventKind::EndScheduled, &id, &shift.id)
                    .at_facility(Some(&facility_id)),
            );
            out.push(ShiftInstruction::ScheduleShiftEnd {
                vehicle: id,
                shift: shift.id.clone(),
                facility: facility_id,
                link,
                end_time: shift.end_time,
            });
        }
    }

    /// The shift's own hub when it has room, else the nearest hub with room.
    fn end_facility_for(&self, shift: &DrtShift, vehicle: &ShiftVehicle) -> Option<(FacilityId, LinkId)> {
        let usable = |f: &OperationFacility| f.has_capacity() || f.is_registered(&vehicle.id);
        if let Some(hub) = shift
            .operation_facility
            .as_ref()
            .and_then(|id| self.facilities.get(id))
            .filter(|hub| usable(*hub))
        {
            return Some((hub.id.clone(), hub.link.clone()));
        }
        let coord = self.link_coord(&vehicle.link)?;
        self.facilities
            .nearest_with_capacity(&coord, |f| f.kind == FacilityKind::Hub)
            .map(|hub| (hub.id.clone(), hub.link.clone()))
    }
}

impl ShiftDispatcher for DefaultShiftDispatcher {
    fn dispatch(&mut self, time_step: SimTime) -> Vec<ShiftInstruction> {
        if time_step % self.config.dispatch_interval.max(1) != 0 {
            return Vec::new();
        }
        self.now = time_step;
        let mut out = Vec::new();
        self.assign_shifts(time_step, &mut out);
        self.start_shifts(time_step, &mut out);
        self.schedule_breaks(time_step, &mut out);
        self.schedule_shift_ends(time_step, &mut out);
        out
    }

    fn decide_on_break(&self, entry: &ShiftEntry<'_>) -> Option<FacilityId> {
        let shift = entry.shift;
        if shift.state() != ShiftState::Started || shift.break_facility().is_some() || shift.break_taken() {
            return None;
        }
        let shift_break = shift.shift_break.as_ref()?;
        if self.now + self.config.break_look_ahead < shift_break.earliest_start {
            return None;
        }
        if self.now > shift_break.latest_start() {
            debug!(shift = %shift.id, latest_start = shift_break.latest_start(), "Break window missed");
            return None;
        }
        let coord = self.link_coord(&entry.vehicle.link)?;
        self.facilities
            .nearest_with_capacity(&coord, |_| true)
            .map(|facility| facility.id.clone())
    }

    fn start_break(&mut self, vehicle: &VehicleId, link: &LinkId, now: SimTime) -> Result<(), DvrpError> {
        let entry = self
            .vehicles
            .get_mut(vehicle)
            .ok_or_else(|| DvrpError::UnknownVehicle(vehicle.clone()))?;
        let shift = entry
            .current_shift_mut()
            .ok_or_else(|| DvrpError::NoActiveShift(vehicle.clone()))?;
        shift.start_break()?;
        debug!(vehicle = %vehicle, shift = %shift.id, "Break started");
        self.events.push(
            ShiftEvent::new(now, ShiftEventKind::BreakStarted, vehicle, &shift.id)
                .at_facility(shift.break_facility()),
        );
        entry.link = link.clone();
        Ok(())
    }

    fn end_break(&mut self, vehicle: &VehicleId, task: &BreakTask, now: SimTime) -> Result<(), DvrpError> {
        self.facilities.require(&task.facility)?;
        let shift = self
            .vehicles
            .get_mut(vehicle)
            .ok_or_else(|| DvrpError::UnknownVehicle(vehicle.clone()))?
            .current_shift_mut()
            .ok_or_else(|| DvrpError::NoActiveShift(vehicle.clone()))?;
        shift.end_break()?;
        debug!(vehicle = %vehicle, facility = %task.facility, "Break ended");
        self.events.push(
            ShiftEvent::new(now, ShiftEventKind::BreakEnded, vehicle, &shift.id)
                .at_facility(Some(&task.facility)),
        );
        self.facilities.deregister(&task.facility, vehicle)?;
        Ok(())
    }

    fn end_shift(&mut self, vehicle: &VehicleId, link: &LinkId, now: SimTime) -> Result<(), DvrpError> {
        let entry = self
            .vehicles
            .get_mut(vehicle)
            .ok_or_else(|| DvrpError::UnknownVehicle(vehicle.clone()))?;
        let shift = entry
            .current_shift_mut()
            .ok_or_else(|| DvrpError::NoActiveShift(vehicle.clone()))?;
        if let Some(facility) = shift.break_facility().filter(|_| !shift.break_taken()) {
            self.facilities.require(facility)?;
        }
        shift.end()?;
        let released = shift.cancel_scheduled_break();
        debug!(vehicle = %vehicle, shift = %shift.id, "Shift ended");
        self.events.push(
            ShiftEvent::new(now, ShiftEventKind::Ended, vehicle, &shift.id)
                .at_facility(shift.end_facility()),
        );
        entry.link = link.clone();
        if let Some(facility) = released {
            self.facilities.deregister(&facility, vehicle)?;
        }
        Ok(())
    }

    fn drain_events(&mut self) -> Vec<ShiftEvent> {
        std::mem::take(&mut self.events)
    }

    fn has_open_shifts(&self) -> bool {
        !self.unassigned.is_empty() || self.vehicles.values().any(|v| v.has_open_shifts())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Link;
    use crate::shifts::shift::ShiftBreak;

    fn network() -> Arc<Network> {
        Arc::new(Network::from_links([
            Link::new("hub_link", Coord::new(0.0, 0.0), Coord::new(0.0, 10.0)),
            Link::new("field_link", Coord::new(500.0, 0.0), Coord::new(500.0, 10.0)),
            Link::new("road", Coord::new(450.0, 0.0), Coord::new(460.0, 0.0)),
        ]))
    }

    fn facilities() -> OperationFacilities {
        OperationFacilities::new([
            OperationFacility::new("hub", FacilityKind::Hub, "hub_link", Coord::new(0.0, 5.0), 4),
            OperationFacility::new(
                "field",
                FacilityKind::InField,
                "field_link",
                Coord::new(500.0, 5.0),
                1,
            ),
        ])
    }

    fn config() -> ShiftDispatchConfig {
        ShiftDispatchConfig {
            dispatch_interval: 60,
            shift_schedule_look_ahead: 1800,
            changeover_duration: 900,
            break_look_ahead: 600,
            shift_end_look_ahead: 600,
        }
    }

    fn dispatcher() -> DefaultShiftDispatcher {
        let mut dispatcher = DefaultShiftDispatcher::new(config(), network(), facilities());
        dispatcher.add_vehicle(ShiftVehicle::new("v1", "hub_link"));
        dispatcher
    }

    fn v1() -> VehicleId {
        VehicleId::from("v1")
    }

    #[test]
    fn dispatch_only_acts_on_interval_boundaries() {
        let mut dispatcher = dispatcher();
        dispatcher.add_shift(DrtShift::new("s1", 0, 3600));
        assert!(dispatcher.dispatch(30).is_empty());
        assert_eq!(dispatcher.unassigned_shifts().len(), 1);

        let out = dispatcher.dispatch(60);
        assert_eq!(
            out,
            vec![
                ShiftInstruction::Assigned {
                    vehicle: v1(),
                    shift: "s1".into()
                },
                ShiftInstruction::Started {
                    vehicle: v1(),
                    shift: "s1".into()
                },
            ]
        );
        assert_eq!(
            dispatcher.facilities().get(&"hub".into()).map(|h| h.occupancy()),
            Some(0)
        );
    }

    #[test]
    fn shifts_beyond_look_ahead_wait() {
        let mut dispatcher = dispatcher();
        dispatcher.add_shift(DrtShift::new("later", 7200, 9000));
        assert!(dispatcher.dispatch(0).is_empty());
        let out = dispatcher.dispatch(5400);
        assert!(matches!(out.as_slice(), [ShiftInstruction::Assigned { .. }]));
        assert_eq!(
            dispatcher.vehicle(&v1()).and_then(|v| v.current_shift()).map(|s| s.state()),
            Some(ShiftState::Waiting)
        );
    }

    #[test]
    fn expired_unassigned_shifts_are_dropped() {
        let mut dispatcher = DefaultShiftDispatcher::new(config(), network(), facilities());
        dispatcher.add_shift(DrtShift::new("gone", 0, 600));
        dispatcher.dispatch(0);
        assert_eq!(dispatcher.unassigned_shifts().len(), 1);
        dispatcher.dispatch(600);
        assert!(dispatcher.unassigned_shifts().is_empty());
        assert!(!dispatcher.has_open_shifts());
    }

    #[test]
    fn back_to_back_shifts_need_changeover() {
        let mut dispatcher = dispatcher();
        dispatcher.add_shift(DrtShift::new("first", 0, 3600));
        dispatcher.add_shift(DrtShift::new("tight", 4000, 8000));
        dispatcher.dispatch(0);
        dispatcher.dispatch(2400);
        // 3600 + 900 > 4000, so the only vehicle cannot take the second shift.
        assert_eq!(dispatcher.unassigned_shifts().len(), 1);
    }

    #[test]
    fn break_goes_to_nearest_facility_and_releases_slot() {
        let mut dispatcher = dispatcher();
        dispatcher.add_shift(DrtShift::new("s1", 0, 8 * 3600).with_break(ShiftBreak {
            earliest_start: 3600,
            latest_end: 3 * 3600,
            duration: 1800,
        }));
        dispatcher.dispatch(0);
        dispatcher
            .update_vehicle(&v1(), &"road".into(), true)
            .expect("known vehicle");
        assert!(dispatcher.dispatch(2400).is_empty());

        let out = dispatcher.dispatch(3000);
        let Some(ShiftInstruction::ScheduleBreak { task, link, .. }) = out.first() else {
            panic!("expected a break instruction, got {out:?}");
        };
        assert_eq!(task.facility.as_str(), "field");
        assert_eq!(link.as_str(), "field_link");
        assert_eq!((task.begin, task.end), (3600, 5400));
        let task = task.clone();

        // No second break while one is scheduled.
        assert!(dispatcher.dispatch(3060).is_empty());

        dispatcher
            .start_break(&v1(), &"field_link".into(), 3600)
            .expect("start break");
        dispatcher.end_break(&v1(), &task, 5400).expect("end break");
        assert_eq!(
            dispatcher.facilities().get(&"field".into()).map(|f| f.occupancy()),
            Some(0)
        );
        let kinds: Vec<_> = dispatcher.drain_events().into_iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ShiftEventKind::Assigned,
                ShiftEventKind::Started,
                ShiftEventKind::BreakScheduled,
                ShiftEventKind::BreakStarted,
                ShiftEventKind::BreakEnded,
            ]
        );
    }

    #[test]
    fn no_break_when_every_facility_is_full() {
        let full = OperationFacilities::new([OperationFacility::new(
            "tiny",
            FacilityKind::InField,
            "field_link",
            Coord::new(500.0, 5.0),
            0,
        )]);
        let mut dispatcher = DefaultShiftDispatcher::new(config(), network(), full);
        dispatcher.add_vehicle(ShiftVehicle::new("v1", "road"));
        dispatcher.add_shift(DrtShift::new("s1", 0, 8 * 3600).with_break(ShiftBreak {
            earliest_start: 0,
            latest_end: 3600,
            duration: 600,
        }));
        let out = dispatcher.dispatch(0);
        assert!(out
            .iter()
            .all(|i| !matches!(i, ShiftInstruction::ScheduleBreak { .. })));
    }

    #[test]
    fn shift_end_is_not_scheduled_during_a_break() {
        let mut dispatcher = dispatcher();
        dispatcher.add_shift(DrtShift::new("s1", 0, 3600).with_break(ShiftBreak {
            earliest_start: 900,
            latest_end: 3600,
            duration: 600,
        }));
        assert!(dispatcher
            .dispatch(0)
            .iter()
            .all(|i| !matches!(i, ShiftInstruction::ScheduleBreak { .. })));
        let out = dispatcher.dispatch(300);
        let Some(ShiftInstruction::ScheduleBreak { task, .. }) = out.first().cloned() else {
            panic!("expected a break instruction, got {out:?}");
        };
        dispatcher
            .start_break(&v1(), &"hub_link".into(), 900)
            .expect("start break");

        let during = dispatcher.dispatch(3000);
        assert!(during.is_empty());

        dispatcher.end_break(&v1(), &task, 3060).expect("end break");
        let after = dispatcher.dispatch(3060);
        assert!(matches!(
            after.as_slice(),
            [ShiftInstruction::ScheduleShiftEnd { facility, end_time: 3600, .. }] if facility.as_str() == "hub"
        ));
        dispatcher
            .end_shift(&v1(), &"hub_link".into(), 3600)
            .expect("end shift");
        assert!(!dispatcher.has_open_shifts());
        assert_eq!(
            dispatcher.facilities().get(&"hub".into()).map(|h| h.occupancy()),
            Some(1)
        );
    }

    #[test]
    fn start_break_after_shift_end_is_an_invariant_violation() {
        let mut dispatcher = dispatcher();
        dispatcher.add_shift(DrtShift::new("s1", 0, 600));
        dispatcher.dispatch(0);
        dispatcher
            .end_shift(&v1(), &"hub_link".into(), 600)
            .expect("end shift");

        let err = dispatcher
            .start_break(&v1(), &"hub_link".into(), 660)
            .expect_err("break after end");
        assert!(err.is_invariant_violation());
        assert_eq!(
            dispatcher.vehicle(&v1()).and_then(|v| v.current_shift()).map(|s| s.state()),
            Some(ShiftState::Ended)
        );
    }

    #[test]
    fn end_shift_on_break_fails_and_keeps_state() {
        let mut dispatcher = dispatcher();
        dispatcher.add_shift(DrtShift::new("s1", 0, 3600));
        dispatcher.dispatch(0);
        dispatcher
            .start_break(&v1(), &"hub_link".into(), 60)
            .expect("break");
        let err = dispatcher
            .end_shift(&v1(), &"hub_link".into(), 120)
            .expect_err("end while on break");
        assert!(matches!(
            err,
            DvrpError::IllegalShiftTransition {
                from: ShiftState::OnBreak,
                to: ShiftState::Ended,
                ..
            }
        ));
        assert_eq!(
            dispatcher.vehicle(&v1()).and_then(|v| v.current_shift()).map(|s| s.state()),
            Some(ShiftState::OnBreak)
        );
    }

    #[test]
    fn end_break_at_unknown_facility_keeps_vehicle_on_break() {
        let mut dispatcher = dispatcher();
        dispatcher.add_shift(DrtShift::new("s1", 0, 3600));
        dispatcher.dispatch(0);
        dispatcher
            .start_break(&v1(), &"hub_link".into(), 60)
            .expect("break");
        dispatcher.drain_events();

        let task = BreakTask {
            facility: "nowhere".into(),
            begin: 60,
            end: 660,
        };
        let err = dispatcher.end_break(&v1(), &task, 660).expect_err("unknown facility");
        assert!(matches!(err, DvrpError::UnknownFacility(_)));
        let shift = dispatcher.vehicle(&v1()).and_then(|v| v.current_shift());
        assert_eq!(shift.map(|s| s.state()), Some(ShiftState::OnBreak));
        assert_eq!(shift.map(|s| s.break_taken()), Some(false));
        assert!(dispatcher.drain_events().is_empty());
    }

    #[test]
    fn end_shift_with_unknown_break_facility_keeps_shift_running() {
        let mut dispatcher = dispatcher();
        dispatcher.add_shift(DrtShift::new("s1", 0, 3600));
        dispatcher.dispatch(0);
        dispatcher
            .vehicles
            .get_mut(&v1())
            .and_then(|v| v.current_shift_mut())
            .expect("running shift")
            .schedule_break("gone".into());

        let err = dispatcher
            .end_shift(&v1(), &"hub_link".into(), 600)
            .expect_err("unknown facility");
        assert!(matches!(err, DvrpError::UnknownFacility(_)));
        assert_eq!(
            dispatcher.vehicle(&v1()).and_then(|v| v.current_shift()).map(|s| s.state()),
            Some(ShiftState::Started)
        );
    }

    #[test]
    fn break_is_skipped_once_its_latest_start_has_passed() {
        let shift = || {
            DrtShift::new("s1", 0, 3600).with_break(ShiftBreak {
                earliest_start: 0,
                latest_end: 1200,
                duration: 600,
            })
        };

        let mut late = dispatcher();
        late.add_shift(shift());
        let out = late.dispatch(660);
        assert!(out
            .iter()
            .all(|i| !matches!(i, ShiftInstruction::ScheduleBreak { .. })));
        let current = late.vehicle(&v1()).and_then(|v| v.current_shift());
        assert_eq!(current.map(|s| s.state()), Some(ShiftState::Started));
        assert!(current.and_then(|s| s.break_facility()).is_none());

        let mut just_in_time = dispatcher();
        just_in_time.add_shift(shift());
        let out = just_in_time.dispatch(600);
        let task = out.iter().find_map(|i| match i {
            ShiftInstruction::ScheduleBreak { task, .. } => Some(task.clone()),
            _ => None,
        });
        assert_eq!(task.map(|t| (t.begin, t.end)), Some((600, 1200)));
    }

    #[test]
    fn vehicle_without_shifts_has_no_active_shift() {
        let mut dispatcher = dispatcher();
        let err = dispatcher
            .start_break(&v1(), &"hub_link".into(), 0)
            .expect_err("no shift");
        assert!(matches!(err, DvrpError::NoActiveShift(_)));
        let err = dispatcher
            .end_shift(&"ghost".into(), &"hub_link".into(), 0)
            .expect_err("no vehicle");
        assert!(matches!(err, DvrpError::UnknownVehicle(_)));
    }

    #[test]
    fn decide_on_break_is_pure() {
        let mut dispatcher = dispatcher();
        dispatcher.add_shift(DrtShift::new("s1", 0, 8 * 3600).with_break(ShiftBreak {
            earliest_start: 0,
            latest_end: 7200,
            duration: 600,
        }));
        // Assign and start without letting the break be scheduled yet.
        dispatcher.assign_shifts(0, &mut Vec::new());
        dispatcher.start_shifts(0, &mut Vec::new());

        let vehicle = dispatcher.vehicle(&v1()).expect("vehicle");
        let shift = vehicle.current_shift().expect("shift");
        let entry = ShiftEntry { shift, vehicle };
        let first = dispatcher.decide_on_break(&entry);
        let second = dispatcher.decide_on_break(&entry);
        assert_eq!(first, second);
        assert_eq!(first.as_ref().map(|f| f.as_str()), Some("hub"));
        assert!(shift.break_facility().is_none());
    }
}
