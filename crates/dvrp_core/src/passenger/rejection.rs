//! Deferred rejection plumbing.
//!
//! Optimizers may reject a request from any execution context. They publish a
//! [RejectionEvent]; every engine's [RejectionHandler] keeps the events of its
//! own mode and pushes them into a channel. Only the engine's `step` drains the
//! channel, so rejection notifications never touch engine tables directly.

use std::collections::VecDeque;
use std::sync::Arc;

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::clock::SimTime;
use crate::ids::{Mode, RequestId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionEvent {
    pub time: SimTime,
    pub mode: Mode,
    pub request: RequestId,
    pub cause: String,
}

impl RejectionEvent {
    pub fn new(
        time: SimTime,
        mode: impl Into<Mode>,
        request: impl Into<RequestId>,
        cause: impl Into<String>,
    ) -> Self {
        Self {
            time,
            mode: mode.into(),
            request: request.into(),
            cause: cause.into(),
        }
    }
}

/// Producer side of one engine's rejection queue. Cheap to clone, `Send + Sync`.
#[derive(Debug, Clone)]
pub struct RejectionHandler {
    mode: Mode,
    sender: Sender<RejectionEvent>,
}

impl RejectionHandler {
    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    /// Enqueues the event if it belongs to this handler's mode. Never blocks.
    pub fn handle_event(&self, event: RejectionEvent) {
        if event.mode != self.mode {
            return;
        }
        if self.sender.send(event).is_err() {
            tracing::debug!(mode = %self.mode, "rejection dropped, engine is gone");
        }
    }
}

/// Consumer side, owned by the engine.
#[derive(Debug)]
pub(crate) struct RejectionInbox {
    receiver: Receiver<RejectionEvent>,
    backlog: VecDeque<RejectionEvent>,
}

impl RejectionInbox {
    pub(crate) fn new(mode: Mode) -> (Self, RejectionHandler) {
        let (sender, receiver) = channel::unbounded();
        (
            Self {
                receiver,
                backlog: VecDeque::new(),
            },
            RejectionHandler { mode, sender },
        )
    }

    /// Moves everything that arrived so far behind the retained backlog, keeping arrival order.
    pub(crate) fn collect(&mut self) {
        self.backlog.extend(self.receiver.try_iter());
    }

    /// Next event strictly earlier than `now`. The first event at or after `now`
    /// blocks everything behind it until a later step.
    pub(crate) fn pop_before(&mut self, now: SimTime) -> Option<RejectionEvent> {
        if self.backlog.front()?.time >= now {
            return None;
        }
        self.backlog.pop_front()
    }

    /// Puts an event back at the head of the backlog, ahead of anything newer.
    pub(crate) fn requeue(&mut self, event: RejectionEvent) {
        self.backlog.push_front(event);
    }

    pub(crate) fn len(&self) -> usize {
        self.backlog.len() + self.receiver.len()
    }
}

/// Fan-out point handed to optimizers: publishes each rejection to every subscribed engine.
#[derive(Debug, Clone, Default)]
pub struct RejectionEventBus {
    subscribers: Arc<RwLock<Vec<RejectionHandler>>>,
}

impl RejectionEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, handler: RejectionHandler) {
        self.subscribers.write().push(handler);
    }

    pub fn publish(&self, event: RejectionEvent) {
        for handler in self.subscribers.read().iter() {
            handler.handle_event(event.clone());
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}
