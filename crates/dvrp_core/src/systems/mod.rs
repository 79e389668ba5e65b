pub mod departure;
pub mod mobsim;
pub mod passenger_step;
pub mod shift_dispatch;
pub mod simulation_started;
pub mod stop_reached;

pub use mobsim::MobsimAccess;
