use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::DvrpError;
use crate::ids::{FacilityId, LinkId, VehicleId};
use crate::network::Coord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FacilityKind {
    /// Depot where shifts start and end.
    Hub,
    /// Break spot in the service area.
    InField,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationFacility {
    pub id: FacilityId,
    pub kind: FacilityKind,
    pub link: LinkId,
    pub coord: Coord,
    pub capacity: usize,
    #[serde(skip)]
    registered: BTreeSet<VehicleId>,
}

impl OperationFacility {
    pub fn new(
        id: impl Into<FacilityId>,
        kind: FacilityKind,
        link: impl Into<LinkId>,
        coord: Coord,
        capacity: usize,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            link: link.into(),
            coord,
            capacity,
            registered: BTreeSet::new(),
        }
    }

    pub fn has_capacity(&self) -> bool {
        self.registered.len() < self.capacity
    }

    pub fn occupancy(&self) -> usize {
        self.registered.len()
    }

    pub fn is_registered(&self, vehicle: &VehicleId) -> bool {
        self.registered.contains(vehicle)
    }

    /// Reserves a slot. Registering an already registered vehicle succeeds.
    pub fn register(&mut self, vehicle: &VehicleId) -> bool {
        if self.registered.contains(vehicle) {
            return true;
        }
        if !self.has_capacity() {
            return false;
        }
        self.registered.insert(vehicle.clone());
        true
    }

    pub fn deregister(&mut self, vehicle: &VehicleId) -> bool {
        self.registered.remove(vehicle)
    }
}

#[derive(Debug, Clone, Default)]
pub struct OperationFacilities {
    facilities: BTreeMap<FacilityId, OperationFacility>,
}

impl OperationFacilities {
    pub fn new(facilities: impl IntoIterator<Item = OperationFacility>) -> Self {
        Self {
            facilities: facilities
                .into_iter()
                .map(|facility| (facility.id.clone(), facility))
                .collect(),
        }
    }

    pub fn get(&self, id: &FacilityId) -> Option<&OperationFacility> {
        self.facilities.get(id)
    }

    pub fn require(&self, id: &FacilityId) -> Result<&OperationFacility, DvrpError> {
        self.get(id).ok_or_else(|| DvrpError::UnknownFacility(id.clone()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &OperationFacility> {
        self.facilities.values()
    }

    pub fn hub_at(&self, link: &LinkId) -> Option<&OperationFacility> {
        self.facilities
            .values()
            .find(|f| f.kind == FacilityKind::Hub && &f.link == link)
    }

    /// Closest facility accepted by `filter` that still has a free slot; ties go to the smaller id.
    pub fn nearest_with_capacity(
        &self,
        coord: &Coord,
        filter: impl Fn(&OperationFacility) -> bool,
    ) -> Option<&OperationFacility> {
        self.facilities
            .values()
            .filter(|f| f.has_capacity() && filter(f))
            .min_by(|a, b| coord.distance(&a.coord).total_cmp(&coord.distance(&b.coord)))
    }

    pub fn register(&mut self, facility: &FacilityId, vehicle: &VehicleId) -> Result<bool, DvrpError> {
        self.facilities
            .get_mut(facility)
            .map(|f| f.register(vehicle))
            .ok_or_else(|| DvrpError::UnknownFacility(facility.clone()))
    }

    pub fn deregister(&mut self, facility: &FacilityId, vehicle: &VehicleId) -> Result<bool, DvrpError> {
        self.facilities
            .get_mut(facility)
            .map(|f| f.deregister(vehicle))
            .ok_or_else(|| DvrpError::UnknownFacility(facility.clone()))
    }

    pub fn deregister_everywhere(&mut self, vehicle: &VehicleId) {
        for facility in self.facilities.values_mut() {
            facility.deregister(vehicle);
        }
    }
}
