//! # Message Channel
//!
//! This crate implements the cross-context message channel: one logical
//! pipe spanning three isolated peers, with request/response correlation
//! on top of fire-and-forget transports.
//!
//! ## Philosophy
//!
//! - **Text at every boundary**: packets cross links as JSON frames, so
//!   no live reference ever leaks between contexts
//! - **Paths, not addresses**: packets record the hops they traverse;
//!   responses retrace that record instead of naming a destination
//! - **Contain, don't crash**: bad frames, failing listeners, and stale
//!   replies are recorded on a diagnostics trail and dropped
//! - **Iteration, not recursion**: reentrant delivery is flattened into
//!   a FIFO dispatch queue
//!
//! ## Architecture
//!
//! A channel instance lives in exactly one of three contexts. The host
//! and the page are endpoints whose listeners consume traffic; the
//! mediator sits between them and relays. The host talks to the mediator
//! over a dedicated port; the mediator and the page share a broadcast
//! bus whose echoes are screened out by a direction flag on every frame.

pub mod channel;
pub mod diagnostics;
pub mod dispatch;
pub mod packet;
pub mod transport;

pub use channel::{ChannelError, ChannelHandle, MessageChannel, MessageContext, Responder};
pub use diagnostics::{ChannelDiagnosticEvent, ChannelDiagnostics, ChannelEvent};
pub use dispatch::{ListenerFn, ListenerId, ListenerOutcome};
pub use packet::{decode_payload, encode_payload, Packet, PacketError, PacketKind};
pub use transport::{
    BusLink, EventBus, FrameHandler, MessagePort, PacketLink, PortLink, RecordingBus,
    RecordingPort, TransportError,
};
