//! Messaging Test Utilities
//!
//! This crate provides shared utilities for the cross-context messaging
//! integration tests.
//!
//! ## Test Philosophy
//!
//! - **Whole topology**: tests run all three peers over simulated transports
//! - **Deterministic delivery**: synchronous end to end, no sleeps or retries
//! - **Observable outcomes**: listener activity and responses land in probes
//! - **Faults are injected, not mocked**: tampering uses the same raw
//!   transports real traffic crosses

use channel_types::ChannelName;
use message_channel::{ListenerOutcome, MessageContext, Responder};
use serde_json::Value;
use sim_host::ExtensionWorld;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Bootstrap helper: a fully wired three-peer world on `name`
pub fn messaging_bootstrap(name: &str) -> ExtensionWorld {
    let name = ChannelName::new(name).expect("test channel name must be valid");
    ExtensionWorld::new(name)
}

/// Order-preserving log of values observed by listeners
#[derive(Clone, Default)]
pub struct Recorder {
    entries: Rc<RefCell<Vec<Value>>>,
}

impl Recorder {
    /// Creates an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one observation
    pub fn push(&self, value: Value) {
        self.entries.borrow_mut().push(value);
    }

    /// Snapshot of everything recorded so far
    pub fn values(&self) -> Vec<Value> {
        self.entries.borrow().clone()
    }

    /// Number of observations
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Checks if nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

/// Listener that records every payload and never replies
pub fn recording_listener(
    recorder: &Recorder,
) -> impl FnMut(&Value, &MessageContext, &Responder) -> Result<ListenerOutcome, String> {
    let recorder = recorder.clone();
    move |value, _, _| {
        recorder.push(value.clone());
        Ok(ListenerOutcome::Done)
    }
}

/// Listener answering every message with `reply`
pub fn echoing_listener(
    reply: Value,
) -> impl FnMut(&Value, &MessageContext, &Responder) -> Result<ListenerOutcome, String> {
    move |_, _, responder| {
        responder.respond(&reply).map_err(|err| err.to_string())?;
        Ok(ListenerOutcome::Done)
    }
}

/// One-shot response capture for `send_request`
#[derive(Clone, Default)]
pub struct ResponseProbe {
    value: Rc<RefCell<Option<Value>>>,
    fired: Rc<Cell<u32>>,
}

impl ResponseProbe {
    /// Creates an unfired probe
    pub fn new() -> Self {
        Self::default()
    }

    /// Callback to hand to `send_request`
    pub fn callback(&self) -> impl FnOnce(Value) + 'static {
        let value = self.value.clone();
        let fired = self.fired.clone();
        move |response| {
            fired.set(fired.get() + 1);
            *value.borrow_mut() = Some(response);
        }
    }

    /// The response payload, if the callback has fired
    pub fn value(&self) -> Option<Value> {
        self.value.borrow().clone()
    }

    /// Checks if the callback has fired
    pub fn fired(&self) -> bool {
        self.fired.get() > 0
    }

    /// How many times the callback fired across this probe's lifetime
    pub fn fire_count(&self) -> u32 {
        self.fired.get()
    }
}
