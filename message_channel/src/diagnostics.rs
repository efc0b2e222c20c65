//! Channel Diagnostics Trail
//!
//! In-memory record of every packet the channel dropped and every
//! listener failure it contained. The channel never escalates these to
//! application code (most of them are expected races during teardown),
//! so the trail is the only place they are visible.
//!
//! ## Philosophy
//!
//! - Deterministic: events carry a monotonic sequence number, recorded in
//!   the order they happened
//! - Queryable: tests assert on the trail to verify drop-and-log behavior
//! - Quiet by default: routine non-events (unknown correlation ids,
//!   direction-filtered bus echo) are deliberately not recorded
//!
//! ## Example
//!
//! ```
//! use message_channel::diagnostics::{ChannelDiagnostics, ChannelEvent};
//!
//! let log = ChannelDiagnostics::new();
//! log.record_event(ChannelEvent::DroppedAfterTeardown);
//!
//! assert_eq!(log.len(), 1);
//! assert!(log.has_event(|e| matches!(e, ChannelEvent::DroppedAfterTeardown)));
//! ```

use crate::dispatch::ListenerId;
use channel_types::HopToken;
use serde::Serialize;
use std::cell::{Cell, RefCell};

/// One thing the channel dropped or contained
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ChannelEvent {
    /// A response whose path did not end at this hop was dropped
    ResponsePathMismatch {
        expected: HopToken,
        found: Option<HopToken>,
    },
    /// A frame or payload failed to decode and was dropped
    MalformedFrame { detail: String },
    /// A listener reported failure; its siblings were unaffected
    ListenerFailure { listener: ListenerId, error: String },
    /// A packet could not be transmitted across a link and was dropped
    ForwardFailed { detail: String },
    /// A frame arrived after the channel was destroyed
    DroppedAfterTeardown,
}

/// A single diagnostics event with its sequence number
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelDiagnosticEvent {
    /// Position in the channel's lifetime; survives [`ChannelDiagnostics::clear`]
    pub sequence: u64,
    /// What was dropped or contained
    pub event: ChannelEvent,
}

/// Diagnostics trail for one channel instance
///
/// Shared between the channel core and the owning peer code, so queries
/// take `&self` and mutate through interior cells.
#[derive(Debug, Default)]
pub struct ChannelDiagnostics {
    events: RefCell<Vec<ChannelDiagnosticEvent>>,
    next_sequence: Cell<u64>,
}

impl ChannelDiagnostics {
    /// Creates a new empty diagnostics trail
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an event at the next sequence number
    pub fn record_event(&self, event: ChannelEvent) {
        let sequence = self.next_sequence.get();
        self.next_sequence.set(sequence + 1);
        self.events
            .borrow_mut()
            .push(ChannelDiagnosticEvent { sequence, event });
    }

    /// Returns a copy of all recorded events
    pub fn get_events(&self) -> Vec<ChannelDiagnosticEvent> {
        self.events.borrow().clone()
    }

    /// Counts events matching the predicate
    pub fn count_events<F>(&self, predicate: F) -> usize
    where
        F: Fn(&ChannelEvent) -> bool,
    {
        self.events
            .borrow()
            .iter()
            .filter(|e| predicate(&e.event))
            .count()
    }

    /// Checks if any event matches the predicate
    pub fn has_event<F>(&self, predicate: F) -> bool
    where
        F: Fn(&ChannelEvent) -> bool,
    {
        self.events.borrow().iter().any(|e| predicate(&e.event))
    }

    /// Clears recorded events (useful for test reset); sequence numbers
    /// keep counting
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    /// Returns the number of recorded events
    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    /// Checks if the trail is empty
    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}
