#![allow(dead_code)]

use dvrp_core::config::{DvrpConfig, ModeConfig, ShiftDispatchConfig};
use dvrp_core::optimizer::SharedOptimizer;
use dvrp_core::passenger::RejectionEventBus;
use dvrp_core::scenario::{Scenario, ScenarioBuilder};
use dvrp_core::shifts::{DrtShift, OperationFacility, ShiftVehicle};
use dvrp_core::test_helpers::{test_network, RecordingOptimizer, RejectingOptimizer};

enum OptimizerChoice {
    Recording(RecordingOptimizer),
    Rejecting(String),
}

/// Scenario over the shared test network with a configurable optimizer.
pub struct TestWorldBuilder {
    config: DvrpConfig,
    optimizer: OptimizerChoice,
    prebooked: bool,
    facilities: Vec<OperationFacility>,
    vehicles: Vec<ShiftVehicle>,
    shifts: Vec<DrtShift>,
    end_time: Option<u64>,
}

impl Default for TestWorldBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorldBuilder {
    /// One `drt` engine, recording optimizer, no shifts.
    pub fn new() -> Self {
        Self {
            config: DvrpConfig::default(),
            optimizer: OptimizerChoice::Recording(RecordingOptimizer::new()),
            prebooked: false,
            facilities: Vec::new(),
            vehicles: Vec::new(),
            shifts: Vec::new(),
            end_time: None,
        }
    }

    /// Record submissions into `recorder`.
    pub fn with_recorder(mut self, recorder: &RecordingOptimizer) -> Self {
        self.optimizer = OptimizerChoice::Recording(recorder.clone());
        self
    }

    /// Reject every submitted request with `cause`.
    pub fn rejecting(mut self, cause: &str) -> Self {
        self.optimizer = OptimizerChoice::Rejecting(cause.to_owned());
        self
    }

    /// Add another passenger engine.
    pub fn with_mode(mut self, mode: ModeConfig) -> Self {
        self.config.modes.push(mode);
        self
    }

    /// Serve `drt` departures from prebooked requests.
    pub fn with_prebooking(mut self) -> Self {
        self.prebooked = true;
        self
    }

    pub fn with_shift_dispatch(mut self, config: ShiftDispatchConfig) -> Self {
        self.config.shifts = Some(config);
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

    pub fn with_end_time(mut self, end_time: u64) -> Self {
        self.end_time = Some(end_time);
        self
    }

    pub fn build(self) -> Scenario {
        let bus = RejectionEventBus::new();
        let optimizer = match self.optimizer {
            OptimizerChoice::Recording(recorder) => recorder.shared(),
            OptimizerChoice::Rejecting(cause) => {
                SharedOptimizer::new(RejectingOptimizer::new(bus.clone(), cause))
            }
        };
        let mut builder = ScenarioBuilder::new(self.config, test_network(), optimizer)
            .with_rejection_bus(bus);
        if self.prebooked {
            builder = builder.with_prebooking("drt");
        }
        for facility in self.facilities {
            builder = builder.with_facility(facility);
        }
        for vehicle in self.vehicles {
            builder = builder.with_vehicle(vehicle);
        }
        for shift in self.shifts {
            builder = builder.with_shift(shift);
        }
        if let Some(end_time) = self.end_time {
            builder = builder.with_end_time(end_time);
        }
        builder.build().expect("test scenario")
    }
}
