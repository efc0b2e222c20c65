//! Three-peer harness: host, mediator, and page wired back to back
//!
//! [`ExtensionWorld`] assembles the full topology the channel is built
//! for: a port pair between the host and the mediator, a shared bus
//! between the mediator and the page, and one channel instance per
//! context, all on the same channel name. Delivery is synchronous end to
//! end, so a request sent on one side can be answered before the send
//! call returns.

use crate::bus::SimBus;
use crate::port::SimPort;
use channel_types::ChannelName;
use message_channel::MessageChannel;
use std::rc::Rc;

/// A complete simulated extension, one channel per context
///
/// ## Example
///
/// ```
/// use channel_types::ChannelName;
/// use message_channel::ListenerOutcome;
/// use serde_json::{json, Value};
/// use sim_host::ExtensionWorld;
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let world = ExtensionWorld::new(ChannelName::new("docs").unwrap());
///
/// world.page().add_listener(|value, _, responder| {
///     responder.respond(&json!({ "echo": value.clone() })).unwrap();
///     Ok(ListenerOutcome::Done)
/// });
///
/// let answer: Rc<RefCell<Option<Value>>> = Rc::new(RefCell::new(None));
/// let sink = answer.clone();
/// world
///     .host()
///     .send_request(&json!("hello"), move |value| {
///         *sink.borrow_mut() = Some(value);
///     })
///     .unwrap();
///
/// assert_eq!(*answer.borrow(), Some(json!({ "echo": "hello" })));
/// ```
pub struct ExtensionWorld {
    host: MessageChannel,
    mediator: MessageChannel,
    page: MessageChannel,
    host_port: Rc<SimPort>,
    mediator_port: Rc<SimPort>,
    bus: Rc<SimBus>,
}

impl ExtensionWorld {
    /// Builds the three peers and their transports for `name`
    pub fn new(name: ChannelName) -> Self {
        let (host_port, mediator_port) = SimPort::pair();
        let bus = Rc::new(SimBus::new());

        let host = MessageChannel::host(name.clone(), host_port.clone());
        let mediator = MessageChannel::mediator(name.clone(), mediator_port.clone(), bus.clone());
        let page = MessageChannel::page(name, bus.clone());

        Self {
            host,
            mediator,
            page,
            host_port,
            mediator_port,
            bus,
        }
    }

    /// The privileged-context channel
    pub fn host(&self) -> &MessageChannel {
        &self.host
    }

    /// The relay channel
    pub fn mediator(&self) -> &MessageChannel {
        &self.mediator
    }

    /// The untrusted-context channel
    pub fn page(&self) -> &MessageChannel {
        &self.page
    }

    /// The host's half of the port pair, for raw frame injection
    pub fn host_port(&self) -> Rc<SimPort> {
        self.host_port.clone()
    }

    /// The mediator's half of the port pair, for raw frame injection
    pub fn mediator_port(&self) -> Rc<SimPort> {
        self.mediator_port.clone()
    }

    /// The shared bus, for raw broadcasts in the page's position
    pub fn bus(&self) -> Rc<SimBus> {
        self.bus.clone()
    }

    /// Severs the host/mediator pipe
    pub fn disconnect_port(&self) {
        self.host_port.disconnect();
    }

    /// Detaches the shared bus
    pub fn detach_bus(&self) {
        self.bus.detach();
    }
}
