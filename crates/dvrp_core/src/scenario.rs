//! Scenario setup: assembles the simulation world from config, network,
//! optimizer and fleet data, and spawns travelers and vehicle stops.
//!
//! [RandomDemand] spreads seeded random trips over a time window for load
//! tests and benches.

use std::sync::Arc;

use bevy_ecs::prelude::{Entity, Resource, World};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::error;

use crate::clock::{EventKind, EventSubject, SimTime, SimulationClock};
use crate::config::{ConfigError, DvrpConfig, ModeConfig};
use crate::ecs::{PassengerStop, TravelPlan, Traveler};
use crate::error::DvrpError;
use crate::ids::{LinkId, Mode, PersonId, RequestId, VehicleId};
use crate::network::Network;
use crate::optimizer::SharedOptimizer;
use crate::passenger::{
    AcceptAllValidator, DefaultRequestValidator, PassengerEngine, PassengerEngineBuilder,
    PassengerEngines, PrebookingManager, RejectionEventBus,
};
use crate::plan::Leg;
use crate::shifts::{
    DefaultShiftDispatcher, DrtShift, OperationFacilities, OperationFacility, ShiftDispatch,
    ShiftVehicle,
};
use crate::systems::passenger_step::PassengerStepInterval;
use crate::systems::shift_dispatch::ShiftTaskQueue;
use crate::telemetry::DvrpTelemetry;

/// Events at or after this time are not processed.
#[derive(Debug, Clone, Copy, Resource)]
pub struct SimulationEndTime(pub SimTime);

/// First fatal error raised inside a system. The runner stops once it is set.
#[derive(Debug, Default, Resource)]
pub struct SimulationFault(Option<DvrpError>);

impl SimulationFault {
    pub fn record(&mut self, err: DvrpError) {
        error!(error = %err, kind = ?err.kind(), "simulation fault");
        if self.0.is_none() {
            self.0 = Some(err);
        }
    }

    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }

    pub fn error(&self) -> Option<&DvrpError> {
        self.0.as_ref()
    }

    pub fn take(&mut self) -> Option<DvrpError> {
        self.0.take()
    }
}

/// A built world plus the publisher optimizers use to reject requests.
pub struct Scenario {
    pub world: World,
    pub rejections: RejectionEventBus,
}

pub struct ScenarioBuilder {
    config: DvrpConfig,
    network: Arc<Network>,
    optimizer: SharedOptimizer,
    prebooked_mode: Option<Mode>,
    facilities: Vec<OperationFacility>,
    vehicles: Vec<ShiftVehicle>,
    shifts: Vec<DrtShift>,
    end_time: Option<SimTime>,
    rejections: Option<RejectionEventBus>,
}

impl ScenarioBuilder {
    pub fn new(config: DvrpConfig, network: Arc<Network>, optimizer: SharedOptimizer) -> Self {
        Self {
            config,
            network,
            optimizer,
            prebooked_mode: None,
            facilities: Vec::new(),
            vehicles: Vec::new(),
            shifts: Vec::new(),
            end_time: None,
            rejections: None,
        }
    }

    /// Subscribe the engines to an existing bus, e.g. one the optimizer already holds.
    pub fn with_rejection_bus(mut self, bus: RejectionEventBus) -> Self {
        self.rejections = Some(bus);
        self
    }

    /// Serve departures on `mode` from a [PrebookingManager] inserted as a resource.
    pub fn with_prebooking(mut self, mode: impl Into<Mode>) -> Self {
        self.prebooked_mode = Some(mode.into());
        self
    }

    pub fn with_facility(mut self, facility: OperationFacility) -> Self {
        self.facilities.push(facility);
        self
    }

    pub fn with_vehicle(mut self, vehicle: ShiftVehicle) -> Self {
        self.vehicles.push(vehicle);
        self
    }

    pub fn with_shift(mut self, shift: DrtShift) -> Self {
        self.shifts.push(shift);
        self
    }

    pub fn with_end_time(mut self, end_time: SimTime) -> Self {
        self.end_time = Some(end_time);
        self
    }

    pub fn build(self) -> Result<Scenario, DvrpError> {
        self.config.validate()?;
        if self.config.shifts.is_none() && !self.shifts.is_empty() {
            return Err(ConfigError::Invalid("shifts given but shift dispatch is not configured".into()).into());
        }

        let rejections = self.rejections.unwrap_or_default();
        let mut engines = Vec::with_capacity(self.config.modes.len());
        let mut prebooking = None;
        for mode_config in &self.config.modes {
            let network = Arc::new(self.network.filter_by_mode(&mode_config.mode));
            let mut builder = with_mode_validator(
                PassengerEngine::builder(
                    mode_config.mode.clone(),
                    Arc::clone(&network),
                    self.optimizer.clone(),
                ),
                mode_config,
            );
            if self.prebooked_mode.as_ref() == Some(&mode_config.mode) {
                let manager = PrebookingManager::new(mode_config.mode.clone(), network, self.optimizer.clone());
                let manager = if mode_config.reject_equal_from_to_links {
                    manager.with_validator(DefaultRequestValidator)
                } else {
                    manager.with_validator(AcceptAllValidator)
                };
                builder = builder.with_advance_requests(manager.lookup());
                prebooking = Some(manager);
            }
            let engine = builder.build();
            rejections.subscribe(engine.rejection_handler());
            engines.push(engine);
        }

        let mut world = World::new();
        world.insert_resource(SimulationClock::default());
        world.insert_resource(DvrpTelemetry::default());
        world.insert_resource(SimulationFault::default());
        world.insert_resource(PassengerStepInterval(self.config.passenger_step_interval));
        world.insert_resource(PassengerEngines(engines));
        if let Some(manager) = prebooking {
            world.insert_resource(manager);
        }
        if let Some(end_time) = self.end_time {
            world.insert_resource(SimulationEndTime(end_time));
        }
        if let Some(shift_config) = self.config.shifts {
            let mut dispatcher = DefaultShiftDispatcher::new(
                shift_config,
                Arc::clone(&self.network),
                OperationFacilities::new(self.facilities),
            );
            for vehicle in self.vehicles {
                dispatcher.add_vehicle(vehicle);
            }
            for shift in self.shifts {
                dispatcher.add_shift(shift);
            }
            world.insert_resource(shift_config);
            world.insert_resource(ShiftDispatch::new(dispatcher));
            world.insert_resource(ShiftTaskQueue::default());
        }

        Ok(Scenario { world, rejections })
    }
}

fn with_mode_validator(builder: PassengerEngineBuilder, config: &ModeConfig) -> PassengerEngineBuilder {
    if config.reject_equal_from_to_links {
        builder.with_validator(DefaultRequestValidator)
    } else {
        builder.with_validator(AcceptAllValidator)
    }
}

/// Spawns a traveler at `link` and schedules the departure of its first leg.
pub fn spawn_traveler(
    world: &mut World,
    person: impl Into<PersonId>,
    link: impl Into<LinkId>,
    legs: Vec<Leg>,
) -> Entity {
    let first_departure = legs.first().map(|leg| leg.departure_time);
    let traveler = world
        .spawn((Traveler::new(person, link), TravelPlan::new(legs)))
        .id();
    if let Some(at) = first_departure {
        schedule_departure(world, traveler, at);
    }
    traveler
}

pub fn schedule_departure(world: &mut World, traveler: Entity, at: SimTime) {
    world.resource_mut::<SimulationClock>().schedule_at(
        at,
        EventKind::Departure,
        Some(EventSubject::Traveler(traveler)),
    );
}

/// Spawns `stop` and schedules the vehicle's arrival there at `at`.
pub fn schedule_stop(world: &mut World, stop: PassengerStop, at: SimTime) -> Entity {
    let entity = world.spawn(stop).id();
    world.resource_mut::<SimulationClock>().schedule_at(
        at,
        EventKind::StopReached,
        Some(EventSubject::Stop(entity)),
    );
    entity
}

/// Seeded random single-leg trips, each with a matching pickup and dropoff stop.
///
/// Stops are addressed by the request id the engine will hand out, which
/// assumes the generated travelers are the only departures on `mode`.
#[derive(Debug, Clone)]
pub struct RandomDemand {
    pub mode: Mode,
    pub travelers: usize,
    pub vehicles: usize,
    /// Departures are uniform in `[0, window)`.
    pub window: SimTime,
    /// Vehicle arrival at the pickup stop, after departure.
    pub pickup_delay: (SimTime, SimTime),
    pub ride_time: (SimTime, SimTime),
    pub seed: u64,
}

impl Default for RandomDemand {
    fn default() -> Self {
        Self {
            mode: Mode::from("drt"),
            travelers: 100,
            vehicles: 10,
            window: 3600,
            pickup_delay: (0, 600),
            ride_time: (120, 1200),
            seed: 42,
        }
    }
}

impl RandomDemand {
    /// Spawns the travelers and stops into `world`. Returns the number of travelers.
    pub fn generate(&self, world: &mut World, links: &[LinkId]) -> usize {
        if links.len() < 2 || self.window == 0 {
            return 0;
        }
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut trips: Vec<(SimTime, usize, usize)> = (0..self.travelers)
            .map(|_| {
                let departure = rng.gen_range(0..self.window);
                let from = rng.gen_range(0..links.len());
                let offset = rng.gen_range(1..links.len());
                (departure, from, (from + offset) % links.len())
            })
            .collect();
        // Request ids follow departure order.
        trips.sort_by_key(|trip| trip.0);

        let vehicles = self.vehicles.max(1);
        for (n, (departure, from, to)) in trips.into_iter().enumerate() {
            let leg = Leg::new(self.mode.clone(), links[from].clone(), links[to].clone(), departure);
            spawn_traveler(world, format!("person_{n}"), links[from].clone(), vec![leg]);

            let pickup_at = departure + rng.gen_range(self.pickup_delay.0..=self.pickup_delay.1);
            let dropoff_at = pickup_at + rng.gen_range(self.ride_time.0..=self.ride_time.1);
            let pickup = PassengerStop::pickup(
                VehicleId::new(format!("veh_{}", n % vehicles)),
                RequestId::new(format!("{}_{n}", self.mode)),
                self.mode.clone(),
            );
            let dropoff_template = pickup.clone();
            let pickup_stop = schedule_stop(world, pickup, pickup_at);
            schedule_stop(world, PassengerStop::dropoff(pickup_stop, &dropoff_template), dropoff_at);
        }
        self.travelers
    }
}
