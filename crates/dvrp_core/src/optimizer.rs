//! Boundary to the external matching/routing optimizer.
//!
//! Submission is the only place where the core serializes access: the
//! optimizer sits behind a mutex owned by [SharedOptimizer], so every engine
//! sharing one optimizer (one per mode) enters the same critical section.
//! Outcomes never come back through this API; assignments reach vehicles out
//! of band and rejections arrive as [crate::passenger::RejectionEvent]s.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::passenger::PassengerRequest;

pub trait VrpOptimizer: Send {
    /// Called once per accepted (validated) request.
    fn request_submitted(&mut self, request: &PassengerRequest);
}

/// Handle to an optimizer guarded by its own lock. Cloning shares the optimizer.
#[derive(Clone)]
pub struct SharedOptimizer(Arc<Mutex<dyn VrpOptimizer>>);

impl SharedOptimizer {
    pub fn new<O: VrpOptimizer + 'static>(optimizer: O) -> Self {
        let guarded: Arc<Mutex<dyn VrpOptimizer>> = Arc::new(Mutex::new(optimizer));
        Self(guarded)
    }

    pub fn submit(&self, request: &PassengerRequest) {
        let mut optimizer = self.0.lock();
        optimizer.request_submitted(request);
    }

    /// Runs `f` inside the optimizer's critical section, e.g. for vehicle task
    /// queries that must not interleave with submissions.
    pub fn with_locked<R>(&self, f: impl FnOnce(&mut dyn VrpOptimizer) -> R) -> R {
        let mut optimizer = self.0.lock();
        f(&mut *optimizer)
    }

    /// Whether both handles guard the same optimizer instance.
    pub fn same_instance(&self, other: &SharedOptimizer) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for SharedOptimizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedOptimizer")
            .field("handles", &Arc::strong_count(&self.0))
            .finish()
    }
}
