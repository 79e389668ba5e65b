pub mod advance;
pub mod engine;
pub mod events;
mod handling;
pub mod mobsim;
pub mod rejection;
pub mod request;

pub use advance::{AdvanceRequestProvider, NoAdvanceRequests, PrebookingLookup, PrebookingManager};
pub use engine::{ActivePassenger, PassengerEngine, PassengerEngineBuilder, PassengerEngines};
pub use events::{PassengerEventKind, PassengerObservation};
pub use mobsim::{DepartingAgent, MobsimInterface};
pub use rejection::{RejectionEvent, RejectionEventBus, RejectionHandler};
pub use request::{
    AcceptAllValidator, DefaultRequestCreator, DefaultRequestValidator, PassengerRequest,
    PassengerRequestCreator, PassengerRequestValidator, RequestStatus,
};
