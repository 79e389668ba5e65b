pub mod clock;
pub mod config;
pub mod ecs;
pub mod error;
pub mod ids;
pub mod network;
pub mod optimizer;
pub mod passenger;
pub mod plan;
pub mod runner;
pub mod scenario;
pub mod shifts;
pub mod systems;
pub mod telemetry;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
