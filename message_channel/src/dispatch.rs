//! Reentrancy-safe dispatch queue
//!
//! Delivery converts what would otherwise be recursive listener
//! invocation (a listener sends, which delivers, which invokes more
//! listeners) into an iterative loop over an explicit FIFO queue. The
//! running job stays at the front of the queue until it completes, so
//! traffic generated by its listeners lands behind it and never starts a
//! nested drain.

use crate::channel::{MessageContext, Responder};
use channel_types::{CorrelationId, Direction};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

/// Identifier handed out by listener registration
///
/// Boxed closures have no identity of their own, so unregistration goes
/// through this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerId(pub(crate) u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({})", self.0)
    }
}

/// What a listener tells the dispatch loop about its reply intentions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerOutcome {
    /// Finished; no reply will come from this listener
    Done,
    /// Keep the reply channel open; this listener will respond, possibly
    /// after the dispatch job completes
    WillRespond,
}

/// Message handler signature
///
/// Listeners receive the decoded payload, the correlation context of the
/// inbound message, and a reply handle they may clone and stash for a
/// later response. A failing listener returns `Err`; the failure is
/// recorded and contained without affecting its siblings.
pub type ListenerFn =
    dyn FnMut(&Value, &MessageContext, &Responder) -> Result<ListenerOutcome, String>;

/// Shared, registration-ordered listener cell
pub(crate) type ListenerCell = Rc<RefCell<ListenerFn>>;

/// One queued unit of delivery work
#[derive(Clone)]
pub(crate) struct DispatchJob {
    /// Encoded payload text; decoded once when the job runs
    pub payload: String,
    /// Listener list snapshot taken at enqueue time
    pub snapshot: Vec<(ListenerId, ListenerCell)>,
    /// Correlation id wiring the reply path, when the sender expects one
    pub correlation: Option<CorrelationId>,
    /// Direction the message was travelling when it arrived
    pub direction: Direction,
}

/// FIFO queue of dispatch jobs
///
/// Invariant: the queue is non-empty exactly while a drain is running.
/// [`DispatchQueue::push`] reports whether this push started the queue,
/// in which case the caller owns draining it; pushes landing on a
/// non-empty queue are reached by the drain already in progress.
#[derive(Default)]
pub(crate) struct DispatchQueue {
    jobs: VecDeque<DispatchJob>,
}

impl DispatchQueue {
    /// Creates an empty queue
    pub fn new() -> Self {
        Self {
            jobs: VecDeque::new(),
        }
    }

    /// Appends a job; returns true when the queue was empty before
    pub fn push(&mut self, job: DispatchJob) -> bool {
        let was_empty = self.jobs.is_empty();
        self.jobs.push_back(job);
        was_empty
    }

    /// Clones the job at the front without removing it
    pub fn current(&self) -> Option<DispatchJob> {
        self.jobs.front().cloned()
    }

    /// Removes the front job once it has been processed
    pub fn finish(&mut self) -> Option<DispatchJob> {
        self.jobs.pop_front()
    }

    /// Drops all queued jobs (teardown)
    pub fn clear(&mut self) {
        self.jobs.clear();
    }

    /// Number of queued jobs, the running one included
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Checks if no jobs are queued
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
