//! Transport adapters
//!
//! The channel never creates its transports; the embedder hands them in.
//! Two collaborator contracts cover the three peers: a duplex port
//! between host and mediator, and a document-scoped event bus between
//! mediator and page. The bus echoes broadcasts back to the sender, so
//! the receive side filters frames by direction flag before decoding.
//!
//! [`RecordingPort`] and [`RecordingBus`] are one-sided capture
//! implementations for unit tests; the full synchronous multi-peer
//! environment lives in the `sim_host` crate.

use crate::packet::Packet;
use channel_types::Direction;
use serde::Deserialize;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;

/// Callback invoked with each text frame arriving on a transport
pub type FrameHandler = Rc<dyn Fn(&str)>;

/// Errors raised by transports and adapters
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Transport disconnected: {0}")]
    Disconnected(String),

    #[error("Codec error: {0}")]
    Codec(String),
}

/// Duplex port between the host and mediator contexts
///
/// `emit` carries a named frame to the remote side; `on` registers a
/// handler for named frames arriving from the remote side. A port is
/// point-to-point: it never echoes an emission back to its own handlers.
pub trait MessagePort {
    /// Emits a named frame toward the remote side
    fn emit(&self, event: &str, frame: &str) -> Result<(), TransportError>;

    /// Registers a handler for named frames from the remote side
    fn on(&self, event: &str, handler: FrameHandler);
}

/// Document-scoped structured event bus between mediator and page
///
/// A broadcast reaches every subscriber of that event name on the shared
/// document, including subscribers registered by the broadcasting peer.
pub trait EventBus {
    /// Broadcasts a named event carrying a text detail
    fn broadcast(&self, event: &str, detail: &str) -> Result<(), TransportError>;

    /// Subscribes a handler to a named event
    fn subscribe(&self, event: &str, handler: FrameHandler);
}

/// Outbound side of the single abstract transport contract: serialize
/// the packet to its text frame and transmit it
pub trait PacketLink {
    /// Serializes and transmits a packet across this link
    fn send(&self, packet: &Packet) -> Result<(), TransportError>;
}

/// Sends packets across a duplex port under a fixed event name
pub struct PortLink {
    port: Rc<dyn MessagePort>,
    event: String,
}

impl PortLink {
    /// Creates a link emitting under `event`
    pub fn new(port: Rc<dyn MessagePort>, event: impl Into<String>) -> Self {
        Self {
            port,
            event: event.into(),
        }
    }

    /// Binds incoming frames for `event` to `on_frame`
    ///
    /// Ports are point-to-point, so no direction filtering is needed.
    pub fn bind_incoming(port: &Rc<dyn MessagePort>, event: &str, on_frame: FrameHandler) {
        port.on(event, on_frame);
    }
}

impl PacketLink for PortLink {
    fn send(&self, packet: &Packet) -> Result<(), TransportError> {
        let frame = packet
            .to_frame()
            .map_err(|err| TransportError::Codec(err.to_string()))?;
        self.port.emit(&self.event, &frame)
    }
}

/// Sends packets onto the shared bus under a fixed event name
pub struct BusLink {
    bus: Rc<dyn EventBus>,
    event: String,
}

impl BusLink {
    /// Creates a link broadcasting under `event`
    pub fn new(bus: Rc<dyn EventBus>, event: impl Into<String>) -> Self {
        Self {
            bus,
            event: event.into(),
        }
    }

    /// Subscribes `on_frame` to `event`, ignoring frames whose direction
    /// flag is not `accepted`
    ///
    /// This is what keeps a peer from reacting to its own echoed
    /// broadcast: the mediator accepts only inbound-flagged frames, the
    /// page only outbound-flagged ones. Frames whose direction cannot be
    /// peeked fall through so the channel can record them as malformed.
    pub fn bind_incoming(
        bus: &Rc<dyn EventBus>,
        event: &str,
        accepted: Direction,
        on_frame: FrameHandler,
    ) {
        let filtered: FrameHandler = Rc::new(move |frame: &str| {
            match frame_direction(frame) {
                Some(direction) if direction != accepted => {}
                _ => on_frame(frame),
            }
        });
        bus.subscribe(event, filtered);
    }
}

impl PacketLink for BusLink {
    fn send(&self, packet: &Packet) -> Result<(), TransportError> {
        let frame = packet
            .to_frame()
            .map_err(|err| TransportError::Codec(err.to_string()))?;
        self.bus.broadcast(&self.event, &frame)
    }
}

/// Peeks the direction flag of a frame without a full parse
fn frame_direction(frame: &str) -> Option<Direction> {
    #[derive(Deserialize)]
    struct DirectionProbe {
        direction: Direction,
    }

    serde_json::from_str::<DirectionProbe>(frame)
        .ok()
        .map(|probe| probe.direction)
}

/// One-sided port capture for unit tests
///
/// Emitted frames are recorded instead of delivered; tests drive the
/// receive side by hand with [`RecordingPort::inject`]. Flip
/// [`RecordingPort::set_disconnected`] to make every emit fail.
#[derive(Default)]
pub struct RecordingPort {
    sent: RefCell<Vec<(String, String)>>,
    handlers: RefCell<HashMap<String, Vec<FrameHandler>>>,
    disconnected: Cell<bool>,
}

impl RecordingPort {
    /// Creates an empty recording port
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every (event, frame) pair emitted so far
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.borrow().clone()
    }

    /// Returns the frames emitted under `event`
    pub fn sent_frames(&self, event: &str) -> Vec<String> {
        self.sent
            .borrow()
            .iter()
            .filter(|(name, _)| name == event)
            .map(|(_, frame)| frame.clone())
            .collect()
    }

    /// Invokes the handlers registered for `event` with `frame`
    ///
    /// Handlers are snapshotted first, so a handler may inject further
    /// frames or register new handlers without upsetting the iteration.
    pub fn inject(&self, event: &str, frame: &str) {
        let snapshot: Vec<FrameHandler> = self
            .handlers
            .borrow()
            .get(event)
            .map(|list| list.to_vec())
            .unwrap_or_default();
        for handler in snapshot {
            handler(frame);
        }
    }

    /// Makes every subsequent emit fail with a disconnected error
    pub fn set_disconnected(&self, disconnected: bool) {
        self.disconnected.set(disconnected);
    }

    /// Forgets everything emitted so far
    pub fn clear_sent(&self) {
        self.sent.borrow_mut().clear();
    }
}

impl MessagePort for RecordingPort {
    fn emit(&self, event: &str, frame: &str) -> Result<(), TransportError> {
        if self.disconnected.get() {
            return Err(TransportError::Disconnected("port closed".to_string()));
        }
        self.sent
            .borrow_mut()
            .push((event.to_string(), frame.to_string()));
        Ok(())
    }

    fn on(&self, event: &str, handler: FrameHandler) {
        self.handlers
            .borrow_mut()
            .entry(event.to_string())
            .or_default()
            .push(handler);
    }
}

/// One-sided bus capture for unit tests
///
/// Broadcasts are recorded, not fanned out; tests drive subscribers by
/// hand with [`RecordingBus::inject`].
#[derive(Default)]
pub struct RecordingBus {
    sent: RefCell<Vec<(String, String)>>,
    subscribers: RefCell<HashMap<String, Vec<FrameHandler>>>,
    disconnected: Cell<bool>,
}

impl RecordingBus {
    /// Creates an empty recording bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every (event, detail) pair broadcast so far
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.borrow().clone()
    }

    /// Returns the details broadcast under `event`
    pub fn sent_frames(&self, event: &str) -> Vec<String> {
        self.sent
            .borrow()
            .iter()
            .filter(|(name, _)| name == event)
            .map(|(_, frame)| frame.clone())
            .collect()
    }

    /// Invokes the subscribers of `event` with `detail`
    pub fn inject(&self, event: &str, detail: &str) {
        let snapshot: Vec<FrameHandler> = self
            .subscribers
            .borrow()
            .get(event)
            .map(|list| list.to_vec())
            .unwrap_or_default();
        for handler in snapshot {
            handler(detail);
        }
    }

    /// Makes every subsequent broadcast fail with a disconnected error
    pub fn set_disconnected(&self, disconnected: bool) {
        self.disconnected.set(disconnected);
    }

    /// Forgets everything broadcast so far
    pub fn clear_sent(&self) {
        self.sent.borrow_mut().clear();
    }
}

impl EventBus for RecordingBus {
    fn broadcast(&self, event: &str, detail: &str) -> Result<(), TransportError> {
        if self.disconnected.get() {
            return Err(TransportError::Disconnected(
                "document detached".to_string(),
            ));
        }
        self.sent
            .borrow_mut()
            .push((event.to_string(), detail.to_string()));
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
