//! Vehicle shifts: assignment, start, breaks and end, decided at dispatch-interval granularity.

pub mod dispatcher;
pub mod events;
pub mod facility;
pub mod shift;
pub mod vehicle;

pub use dispatcher::{DefaultShiftDispatcher, ShiftDispatch, ShiftDispatcher, ShiftEntry};
pub use events::{BreakTask, ShiftEvent, ShiftEventKind, ShiftInstruction};
pub use facility::{FacilityKind, OperationFacilities, OperationFacility};
pub use shift::{DrtShift, ShiftBreak, ShiftState};
pub use vehicle::ShiftVehicle;
