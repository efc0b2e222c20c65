//! The channel endpoint: construction, routing, correlation, teardown
//!
//! One [`MessageChannel`] instance exists per (channel name, context)
//! pair. Hosts and pages are endpoints: inbound traffic dispatches to
//! their listeners. The mediator is a relay: fresh traffic passes
//! through it with the path extended, and only responses it addressed
//! itself ever terminate there.

use crate::diagnostics::{ChannelDiagnostics, ChannelEvent};
use crate::dispatch::{
    DispatchJob, DispatchQueue, ListenerCell, ListenerId, ListenerOutcome,
};
use crate::packet::{decode_payload, encode_payload, Packet, PacketError, PacketKind};
use crate::transport::{
    BusLink, EventBus, FrameHandler, MessagePort, PacketLink, PortLink, TransportError,
};
use channel_types::{ChannelName, CorrelationId, Direction, HopToken, PeerContext};
use serde::Serialize;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use thiserror::Error;

/// Errors surfaced by application-initiated channel operations
///
/// Inbound processing never returns these; problems with received
/// traffic are contained and recorded on the diagnostics trail instead.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Channel destroyed")]
    Destroyed,

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

impl From<PacketError> for ChannelError {
    fn from(err: PacketError) -> Self {
        ChannelError::Codec(err.to_string())
    }
}

/// What a listener may need to know about the inbound message
#[derive(Debug, Clone, Copy)]
pub struct MessageContext {
    correlation: Option<CorrelationId>,
    direction: Direction,
}

impl MessageContext {
    pub(crate) fn new(correlation: Option<CorrelationId>, direction: Direction) -> Self {
        Self {
            correlation,
            direction,
        }
    }

    /// Correlation id of the inbound message; `None` when the sender
    /// expects no reply
    pub fn correlation(&self) -> Option<CorrelationId> {
        self.correlation
    }

    /// Direction the message was travelling when it arrived
    pub fn direction(&self) -> Direction {
        self.direction
    }
}

/// Clonable reply handle bound to one inbound message
///
/// Handed to every listener during dispatch. A listener that returns
/// [`ListenerOutcome::WillRespond`] clones and stashes this handle, then
/// answers whenever it is ready. Replying twice, replying when the
/// sender expected nothing, and replying after teardown are all silent
/// no-ops.
#[derive(Clone)]
pub struct Responder {
    core: Weak<RefCell<ChannelCore>>,
    correlation: Option<CorrelationId>,
}

impl Responder {
    /// Correlation id this handle answers, if the sender expects a reply
    pub fn correlation(&self) -> Option<CorrelationId> {
        self.correlation
    }

    /// Sends `value` back along the recorded reverse path
    pub fn respond<T: Serialize>(&self, value: &T) -> Result<(), ChannelError> {
        let payload = encode_payload(value)?;
        let correlation = match self.correlation {
            Some(correlation) => correlation,
            None => return Ok(()),
        };
        match self.core.upgrade() {
            Some(core) => reply_encoded(&core, correlation, payload),
            None => Ok(()),
        }
    }
}

/// The adjacent links available to each context
enum Links {
    Host {
        port: Rc<dyn PacketLink>,
    },
    Mediator {
        host_side: Rc<dyn PacketLink>,
        page_side: Rc<dyn PacketLink>,
    },
    Page {
        bus: Rc<dyn PacketLink>,
    },
}

impl Links {
    /// The routing table: context and travel direction pick the link.
    /// Only the mediator has a real choice to make; endpoints own a
    /// single link that serves both directions.
    fn target_for(&self, direction: Direction) -> Rc<dyn PacketLink> {
        match (self, direction) {
            (Links::Mediator { page_side, .. }, Direction::Outbound) => page_side.clone(),
            (Links::Mediator { host_side, .. }, Direction::Inbound) => host_side.clone(),
            (Links::Host { port }, _) => port.clone(),
            (Links::Page { bus }, _) => bus.clone(),
        }
    }
}

/// Reverse route recorded for an inbound message awaiting its reply
struct PendingPath {
    path: Vec<HopToken>,
    direction: Direction,
}

struct ChannelCore {
    name: ChannelName,
    context: PeerContext,
    hop: HopToken,
    links: Links,
    listeners: Vec<(ListenerId, ListenerCell)>,
    next_listener: u64,
    queue: DispatchQueue,
    /// Requests this peer sent, keyed by correlation, waiting for the
    /// response to come home
    pending_responses: HashMap<CorrelationId, Box<dyn FnOnce(Value)>>,
    /// Messages this peer received, keyed by correlation, waiting for a
    /// local reply to send back
    pending_paths: HashMap<CorrelationId, PendingPath>,
    diagnostics: Rc<ChannelDiagnostics>,
    destroyed: bool,
}

/// One peer's endpoint of a cross-context channel
///
/// Not clonable: each (name, context) pair gets exactly one owning
/// instance, and dropping it destroys the channel. Use
/// [`MessageChannel::handle`] for the cheap handles listeners capture.
///
/// ## Example
///
/// ```
/// use channel_types::ChannelName;
/// use message_channel::{MessageChannel, RecordingPort};
/// use std::rc::Rc;
///
/// let port = Rc::new(RecordingPort::new());
/// let channel = MessageChannel::host(ChannelName::new("demo").unwrap(), port.clone());
///
/// channel.send_message(&"ping").unwrap();
/// assert_eq!(port.sent().len(), 1);
/// ```
pub struct MessageChannel {
    core: Rc<RefCell<ChannelCore>>,
    diagnostics: Rc<ChannelDiagnostics>,
}

impl MessageChannel {
    /// Creates the host-side channel over the port to the mediator
    pub fn host(name: ChannelName, port: Rc<dyn MessagePort>) -> Self {
        let event = name.as_str().to_string();
        let links = Links::Host {
            port: Rc::new(PortLink::new(port.clone(), event.clone())),
        };
        let channel = Self::with_links(name, PeerContext::Host, links);
        PortLink::bind_incoming(&port, &event, Self::incoming_handler(&channel.core));
        channel
    }

    /// Creates the mediator channel bridging the host port and the page
    /// bus
    pub fn mediator(name: ChannelName, port: Rc<dyn MessagePort>, bus: Rc<dyn EventBus>) -> Self {
        let event = name.as_str().to_string();
        let links = Links::Mediator {
            host_side: Rc::new(PortLink::new(port.clone(), event.clone())),
            page_side: Rc::new(BusLink::new(bus.clone(), event.clone())),
        };
        let channel = Self::with_links(name, PeerContext::Mediator, links);
        PortLink::bind_incoming(&port, &event, Self::incoming_handler(&channel.core));
        // The bus echoes broadcasts back to their sender; accepting only
        // inbound-flagged frames screens the mediator's own traffic out.
        BusLink::bind_incoming(
            &bus,
            &event,
            Direction::Inbound,
            Self::incoming_handler(&channel.core),
        );
        channel
    }

    /// Creates the page-side channel over the shared bus
    pub fn page(name: ChannelName, bus: Rc<dyn EventBus>) -> Self {
        let event = name.as_str().to_string();
        let links = Links::Page {
            bus: Rc::new(BusLink::new(bus.clone(), event.clone())),
        };
        let channel = Self::with_links(name, PeerContext::Page, links);
        BusLink::bind_incoming(
            &bus,
            &event,
            Direction::Outbound,
            Self::incoming_handler(&channel.core),
        );
        channel
    }

    fn with_links(name: ChannelName, context: PeerContext, links: Links) -> Self {
        let diagnostics = Rc::new(ChannelDiagnostics::new());
        let core = Rc::new(RefCell::new(ChannelCore {
            name,
            context,
            hop: HopToken::new(),
            links,
            listeners: Vec::new(),
            next_listener: 0,
            queue: DispatchQueue::new(),
            pending_responses: HashMap::new(),
            pending_paths: HashMap::new(),
            diagnostics: diagnostics.clone(),
            destroyed: false,
        }));
        Self { core, diagnostics }
    }

    /// Receive closure shared by every transport binding. Holds the core
    /// weakly so a dropped channel leaves only inert handlers behind.
    fn incoming_handler(core: &Rc<RefCell<ChannelCore>>) -> FrameHandler {
        let sink = Rc::downgrade(core);
        Rc::new(move |frame: &str| {
            if let Some(core) = sink.upgrade() {
                deliver_frame(&core, frame);
            }
        })
    }

    /// Creates a cheap clonable handle for use inside listeners
    ///
    /// Listeners frequently need to send on their own channel, prune a
    /// sibling, or tear the channel down. The handle keeps nothing
    /// alive: once the owning instance is gone, sends fail with
    /// [`ChannelError::Destroyed`] and the rest degrade to no-ops.
    pub fn handle(&self) -> ChannelHandle {
        ChannelHandle {
            core: Rc::downgrade(&self.core),
        }
    }

    /// Registers a message listener; listeners run in registration order
    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: FnMut(&Value, &MessageContext, &Responder) -> Result<ListenerOutcome, String> + 'static,
    {
        register_listener(&self.core, listener)
    }

    /// Unregisters a listener; returns whether it was registered
    ///
    /// Dispatch jobs already queued keep their snapshot, so a listener
    /// removed mid-delivery still sees messages that arrived before the
    /// removal.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        unregister_listener(&self.core, id)
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.core.borrow().listeners.len()
    }

    /// Sends a fire-and-forget message; no reply is ever delivered
    pub fn send_message<T: Serialize>(&self, payload: &T) -> Result<(), ChannelError> {
        let encoded = encode_payload(payload)?;
        send_from(&self.core, encoded, None)
    }

    /// Sends a message expecting a reply
    ///
    /// `on_response` fires at most once with the decoded reply payload.
    /// When the remote side dispatched the message but nothing kept the
    /// reply channel open, the reply arrives as [`Value::Null`]. If the
    /// channel is destroyed first, the callback is dropped unfired.
    pub fn send_request<T, F>(&self, payload: &T, on_response: F) -> Result<CorrelationId, ChannelError>
    where
        T: Serialize,
        F: FnOnce(Value) + 'static,
    {
        let encoded = encode_payload(payload)?;
        request_from(&self.core, encoded, Box::new(on_response))
    }

    /// Answers the inbound message described by `context`
    ///
    /// Silent no-op when the message expected no reply, when it was
    /// already answered, or after teardown.
    pub fn reply<T: Serialize>(&self, context: &MessageContext, value: &T) -> Result<(), ChannelError> {
        let payload = encode_payload(value)?;
        match context.correlation() {
            Some(correlation) => reply_encoded(&self.core, correlation, payload),
            None => Ok(()),
        }
    }

    /// Tears the channel down; idempotent
    ///
    /// Listeners, pending tables, and the dispatch queue are cleared so
    /// frames and replies arriving afterwards cannot invoke stale
    /// callbacks. Frames that do arrive are recorded on the diagnostics
    /// trail and dropped.
    pub fn destroy(&self) {
        destroy_core(&self.core);
    }

    /// Checks if the channel has been destroyed
    pub fn is_destroyed(&self) -> bool {
        self.core.borrow().destroyed
    }

    /// The context this instance was constructed for
    pub fn context(&self) -> PeerContext {
        self.core.borrow().context
    }

    /// The normalized channel name
    pub fn name(&self) -> ChannelName {
        self.core.borrow().name.clone()
    }

    /// This instance's hop token
    pub fn hop_token(&self) -> HopToken {
        self.core.borrow().hop
    }

    /// The diagnostics trail for this instance
    pub fn diagnostics(&self) -> Rc<ChannelDiagnostics> {
        self.diagnostics.clone()
    }

    /// Number of sent requests still waiting for their response
    pub fn pending_response_count(&self) -> usize {
        self.core.borrow().pending_responses.len()
    }

    /// Number of received messages still waiting for a local reply
    pub fn pending_path_count(&self) -> usize {
        self.core.borrow().pending_paths.len()
    }
}

impl Drop for MessageChannel {
    fn drop(&mut self) {
        destroy_core(&self.core);
    }
}

/// Weak handle to a channel, safe to capture in listeners
///
/// Cheap to clone and to drop. All operations degrade gracefully once
/// the owning [`MessageChannel`] is destroyed or dropped: sends return
/// [`ChannelError::Destroyed`], replies and teardown become no-ops.
#[derive(Clone)]
pub struct ChannelHandle {
    core: Weak<RefCell<ChannelCore>>,
}

impl ChannelHandle {
    /// Sends a fire-and-forget message on the underlying channel
    pub fn send_message<T: Serialize>(&self, payload: &T) -> Result<(), ChannelError> {
        let encoded = encode_payload(payload)?;
        match self.core.upgrade() {
            Some(core) => send_from(&core, encoded, None),
            None => Err(ChannelError::Destroyed),
        }
    }

    /// Sends a message expecting a reply on the underlying channel
    pub fn send_request<T, F>(&self, payload: &T, on_response: F) -> Result<CorrelationId, ChannelError>
    where
        T: Serialize,
        F: FnOnce(Value) + 'static,
    {
        let encoded = encode_payload(payload)?;
        match self.core.upgrade() {
            Some(core) => request_from(&core, encoded, Box::new(on_response)),
            None => Err(ChannelError::Destroyed),
        }
    }

    /// Answers the inbound message described by `context`
    pub fn reply<T: Serialize>(&self, context: &MessageContext, value: &T) -> Result<(), ChannelError> {
        let payload = encode_payload(value)?;
        match (self.core.upgrade(), context.correlation()) {
            (Some(core), Some(correlation)) => reply_encoded(&core, correlation, payload),
            _ => Ok(()),
        }
    }

    /// Unregisters a listener; returns whether it was registered
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        match self.core.upgrade() {
            Some(core) => unregister_listener(&core, id),
            None => false,
        }
    }

    /// Tears the underlying channel down; idempotent
    pub fn destroy(&self) {
        if let Some(core) = self.core.upgrade() {
            destroy_core(&core);
        }
    }
}

fn register_listener<F>(core: &Rc<RefCell<ChannelCore>>, listener: F) -> ListenerId
where
    F: FnMut(&Value, &MessageContext, &Responder) -> Result<ListenerOutcome, String> + 'static,
{
    let mut inner = core.borrow_mut();
    let id = ListenerId(inner.next_listener);
    inner.next_listener += 1;
    let cell: ListenerCell = Rc::new(RefCell::new(listener));
    inner.listeners.push((id, cell));
    id
}

fn unregister_listener(core: &Rc<RefCell<ChannelCore>>, id: ListenerId) -> bool {
    let mut inner = core.borrow_mut();
    let before = inner.listeners.len();
    inner.listeners.retain(|(listener, _)| *listener != id);
    inner.listeners.len() != before
}

fn destroy_core(core: &Rc<RefCell<ChannelCore>>) {
    let mut inner = core.borrow_mut();
    if inner.destroyed {
        return;
    }
    inner.destroyed = true;
    inner.listeners.clear();
    inner.pending_responses.clear();
    inner.pending_paths.clear();
    inner.queue.clear();
}

/// Builds and transmits a fresh packet originating at this peer
///
/// The origin stamps the travel direction from its own context (hosts
/// send outbound, everyone else sends inbound) and contributes the first
/// path element.
fn send_from(
    core: &Rc<RefCell<ChannelCore>>,
    payload: String,
    correlation: Option<CorrelationId>,
) -> Result<(), ChannelError> {
    let (link, packet) = {
        let inner = core.borrow();
        if inner.destroyed {
            return Err(ChannelError::Destroyed);
        }
        let direction = match inner.context {
            PeerContext::Host => Direction::Outbound,
            PeerContext::Mediator | PeerContext::Page => Direction::Inbound,
        };
        let mut packet = Packet::message(direction, correlation, payload);
        packet.path.push(inner.hop);
        (inner.links.target_for(direction), packet)
    };
    link.send(&packet)?;
    Ok(())
}

/// Registers the response callback, then transmits the request
///
/// Registration happens first: on a synchronous transport the response
/// can arrive inside the send call itself. A failed send rolls the
/// registration back so the callback cannot fire later.
fn request_from(
    core: &Rc<RefCell<ChannelCore>>,
    payload: String,
    on_response: Box<dyn FnOnce(Value)>,
) -> Result<CorrelationId, ChannelError> {
    let correlation = CorrelationId::new();
    {
        let mut inner = core.borrow_mut();
        if inner.destroyed {
            return Err(ChannelError::Destroyed);
        }
        inner.pending_responses.insert(correlation, on_response);
    }
    if let Err(err) = send_from(core, payload, Some(correlation)) {
        core.borrow_mut().pending_responses.remove(&correlation);
        return Err(err);
    }
    Ok(correlation)
}

/// Builds and routes the reply for `correlation`, if its reverse route
/// is still recorded
///
/// Consuming the recorded route is what makes replies at-most-once: the
/// second attempt finds nothing and returns without effect. The reply
/// retraces the request path and travels in the opposite direction.
fn reply_encoded(
    core: &Rc<RefCell<ChannelCore>>,
    correlation: CorrelationId,
    payload: String,
) -> Result<(), ChannelError> {
    let (link, packet) = {
        let mut inner = core.borrow_mut();
        if inner.destroyed {
            return Ok(());
        }
        let pending = match inner.pending_paths.remove(&correlation) {
            Some(pending) => pending,
            None => return Ok(()),
        };
        let packet = Packet::response(
            pending.path,
            pending.direction.inverted(),
            correlation,
            payload,
        );
        (inner.links.target_for(packet.direction), packet)
    };
    link.send(&packet)?;
    Ok(())
}

/// Entry point for every frame arriving at this peer
fn deliver_frame(core: &Rc<RefCell<ChannelCore>>, frame: &str) {
    let diagnostics = {
        let inner = core.borrow();
        if inner.destroyed {
            inner
                .diagnostics
                .record_event(ChannelEvent::DroppedAfterTeardown);
            return;
        }
        inner.diagnostics.clone()
    };
    let packet = match Packet::from_frame(frame) {
        Ok(packet) => packet,
        Err(err) => {
            diagnostics.record_event(ChannelEvent::MalformedFrame {
                detail: err.to_string(),
            });
            return;
        }
    };
    match packet.kind {
        PacketKind::Response { correlation } => deliver_response(core, packet, correlation),
        PacketKind::Message { correlation } => deliver_message(core, packet, correlation),
    }
}

/// What to do with a response once its path has been checked
enum ResponseAction {
    Consume(Box<dyn FnOnce(Value)>),
    Forward(Rc<dyn PacketLink>),
    Mismatch {
        expected: HopToken,
        found: Option<HopToken>,
    },
    Ignore,
}

/// Handles a response frame at this hop
///
/// Every hop a response reaches must find its own token at the end of
/// the path; it pops the token and either consumes the response (path
/// now empty) or forwards the remainder. Anything else is a routing
/// fault and the frame is dropped. The decision is computed under the
/// core borrow and acted on after it is released, so a response callback
/// is free to call straight back into the channel.
fn deliver_response(core: &Rc<RefCell<ChannelCore>>, mut packet: Packet, correlation: CorrelationId) {
    let diagnostics = core.borrow().diagnostics.clone();
    let action = {
        let mut inner = core.borrow_mut();
        let own = inner.hop;
        match packet.path.last().copied() {
            Some(last) if last == own => {
                packet.path.pop();
                if packet.path.is_empty() {
                    match inner.pending_responses.remove(&correlation) {
                        Some(callback) => ResponseAction::Consume(callback),
                        // Already resolved or never asked: routine, not a fault
                        None => ResponseAction::Ignore,
                    }
                } else {
                    ResponseAction::Forward(inner.links.target_for(packet.direction))
                }
            }
            found => ResponseAction::Mismatch {
                expected: own,
                found,
            },
        }
    };
    match action {
        ResponseAction::Consume(callback) => match decode_payload(&packet.payload) {
            Ok(value) => callback(value),
            Err(err) => diagnostics.record_event(ChannelEvent::MalformedFrame {
                detail: err.to_string(),
            }),
        },
        ResponseAction::Forward(link) => {
            if let Err(err) = link.send(&packet) {
                diagnostics.record_event(ChannelEvent::ForwardFailed {
                    detail: err.to_string(),
                });
            }
        }
        ResponseAction::Mismatch { expected, found } => {
            diagnostics.record_event(ChannelEvent::ResponsePathMismatch { expected, found });
        }
        ResponseAction::Ignore => {}
    }
}

/// Handles a fresh message frame at this peer
fn deliver_message(
    core: &Rc<RefCell<ChannelCore>>,
    mut packet: Packet,
    correlation: Option<CorrelationId>,
) {
    let context = core.borrow().context;
    match context {
        PeerContext::Mediator => {
            // Pure relay: extend the path with our own token and re-emit
            // toward the other side. Fresh traffic never terminates here,
            // so nothing is dispatched and no reverse route is recorded.
            let (own, link, diagnostics) = {
                let inner = core.borrow();
                (
                    inner.hop,
                    inner.links.target_for(packet.direction),
                    inner.diagnostics.clone(),
                )
            };
            packet.path.push(own);
            if let Err(err) = link.send(&packet) {
                diagnostics.record_event(ChannelEvent::ForwardFailed {
                    detail: err.to_string(),
                });
            }
        }
        PeerContext::Host | PeerContext::Page => {
            let job = {
                let mut inner = core.borrow_mut();
                if let Some(correlation) = correlation {
                    // Recorded before dispatch so the reply can be sent
                    // during the job or long after it.
                    inner.pending_paths.insert(
                        correlation,
                        PendingPath {
                            path: packet.path.clone(),
                            direction: packet.direction,
                        },
                    );
                }
                DispatchJob {
                    payload: packet.payload,
                    snapshot: inner.listeners.clone(),
                    correlation,
                    direction: packet.direction,
                }
            };
            enqueue_dispatch(core, job);
        }
    }
}

/// Queues a dispatch job, draining if no drain is in progress
fn enqueue_dispatch(core: &Rc<RefCell<ChannelCore>>, job: DispatchJob) {
    let started = core.borrow_mut().queue.push(job);
    if started {
        drain_queue(core);
    }
}

/// Drains the dispatch queue to quiescence
///
/// Runs only in the call frame that found the queue empty. Jobs that
/// listeners cause to be enqueued while it runs are appended and reached
/// here, which is what turns nested delivery into iteration.
fn drain_queue(core: &Rc<RefCell<ChannelCore>>) {
    loop {
        let job = match core.borrow().queue.current() {
            Some(job) => job,
            None => break,
        };
        run_job(core, &job);
        core.borrow_mut().queue.finish();
    }
}

/// Runs one dispatch job: decode once, invoke the listener snapshot,
/// then settle the reply channel
///
/// The core borrow is never held across a listener invocation, so
/// listeners can send, reply, register, unregister, and destroy freely.
fn run_job(core: &Rc<RefCell<ChannelCore>>, job: &DispatchJob) {
    let diagnostics = core.borrow().diagnostics.clone();
    let value = match decode_payload(&job.payload) {
        Ok(value) => value,
        Err(err) => {
            diagnostics.record_event(ChannelEvent::MalformedFrame {
                detail: err.to_string(),
            });
            return;
        }
    };
    let context = MessageContext::new(job.correlation, job.direction);
    let responder = Responder {
        core: Rc::downgrade(core),
        correlation: job.correlation,
    };
    let mut keep_alive = false;
    for (id, listener) in &job.snapshot {
        let outcome = (&mut *listener.borrow_mut())(&value, &context, &responder);
        match outcome {
            Ok(ListenerOutcome::WillRespond) => keep_alive = true,
            Ok(ListenerOutcome::Done) => {}
            Err(error) => diagnostics.record_event(ChannelEvent::ListenerFailure {
                listener: *id,
                error,
            }),
        }
    }
    if let Some(correlation) = job.correlation {
        if !keep_alive {
            // Resolve the sender rather than leak its callback. If a
            // listener already replied during the job, the reverse route
            // is gone and this does nothing.
            if let Err(err) = reply_encoded(core, correlation, Value::Null.to_string()) {
                diagnostics.record_event(ChannelEvent::ForwardFailed {
                    detail: err.to_string(),
                });
            }
        }
    }
}
