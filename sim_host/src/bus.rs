//! Shared broadcast bus with faithful echo
//!
//! Models the document-wide event target the sandboxed and untrusted
//! contexts share. A broadcast reaches every subscriber of the event,
//! the broadcaster's own subscriptions included. That echo is real
//! behavior, not an artifact: channel peers screen it out by direction
//! flag, and the tests that prove the screening works need a bus honest
//! enough to produce the echo.

use message_channel::{EventBus, FrameHandler, TransportError};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// Simulated document event target
#[derive(Default)]
pub struct SimBus {
    subscribers: RefCell<HashMap<String, Vec<FrameHandler>>>,
    detached: Cell<bool>,
}

impl SimBus {
    /// Creates an empty bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent broadcast fail, as after document teardown
    pub fn detach(&self) {
        self.detached.set(true);
    }

    /// Checks if the bus has been detached
    pub fn is_detached(&self) -> bool {
        self.detached.get()
    }
}

impl EventBus for SimBus {
    fn broadcast(&self, event: &str, detail: &str) -> Result<(), TransportError> {
        if self.detached.get() {
            return Err(TransportError::Disconnected(
                "document detached".to_string(),
            ));
        }
        // Snapshot first: a subscriber may broadcast or subscribe while
        // the fan-out is in progress.
        let snapshot: Vec<FrameHandler> = self
            .subscribers
            .borrow()
            .get(event)
            .map(|list| list.to_vec())
            .unwrap_or_default();
        for handler in snapshot {
            handler(detail);
        }
        Ok(())
    }

    fn subscribe(&self, event: &str, handler: FrameHandler) {
        self.subscribers
            .borrow_mut()
            .entry(event.to_string())
            .or_default()
            .push(handler);
    }
}
