//! Connected port pair with synchronous delivery
//!
//! Models the dedicated pipe between the privileged context and its
//! sandboxed companion: two halves, each private to its own side.
//! Emitting on one half invokes the handlers registered on the other, in
//! the same call stack, before `emit` returns.

use message_channel::{FrameHandler, MessagePort, TransportError};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

/// One half of a simulated port pair
///
/// Halves hold each other weakly, so dropping one side leaves the other
/// with a dead peer rather than a reference cycle.
pub struct SimPort {
    handlers: RefCell<HashMap<String, Vec<FrameHandler>>>,
    peer: RefCell<Weak<SimPort>>,
    disconnected: Cell<bool>,
}

impl SimPort {
    /// Creates two connected halves
    pub fn pair() -> (Rc<SimPort>, Rc<SimPort>) {
        let a = Rc::new(SimPort {
            handlers: RefCell::new(HashMap::new()),
            peer: RefCell::new(Weak::new()),
            disconnected: Cell::new(false),
        });
        let b = Rc::new(SimPort {
            handlers: RefCell::new(HashMap::new()),
            peer: RefCell::new(Weak::new()),
            disconnected: Cell::new(false),
        });
        *a.peer.borrow_mut() = Rc::downgrade(&b);
        *b.peer.borrow_mut() = Rc::downgrade(&a);
        (a, b)
    }

    /// Severs the pipe; emits fail on both halves afterwards
    pub fn disconnect(&self) {
        self.disconnected.set(true);
        if let Some(peer) = self.peer.borrow().upgrade() {
            peer.disconnected.set(true);
        }
    }

    /// Checks if this half has been disconnected
    pub fn is_disconnected(&self) -> bool {
        self.disconnected.get()
    }

    /// Invokes this half's handlers for `event`
    ///
    /// Handlers are snapshotted first, so one of them may emit further
    /// frames or register new handlers without upsetting the iteration.
    fn deliver(&self, event: &str, frame: &str) {
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
}

impl MessagePort for SimPort {
    fn emit(&self, event: &str, frame: &str) -> Result<(), TransportError> {
        if self.disconnected.get() {
            return Err(TransportError::Disconnected("port closed".to_string()));
        }
        let peer = self.peer.borrow().upgrade();
        match peer {
            Some(peer) => {
                peer.deliver(event, frame);
                Ok(())
            }
            None => Err(TransportError::Disconnected("peer dropped".to_string())),
        }
    }

    fn on(&self, event: &str, handler: FrameHandler) {
        self.handlers
            .borrow_mut()
            .entry(event.to_string())
            .or_default()
            .push(handler);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(port: &Rc<SimPort>, event: &str) -> Rc<RefCell<Vec<String>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        port.on(
            event,
            Rc::new(move |frame: &str| sink.borrow_mut().push(frame.to_string())),
        );
        log
    }

    #[test]
    fn test_emit_delivers_to_peer_only() {
        let (a, b) = SimPort::pair();
        let seen_a = collect(&a, "ev");
        let seen_b = collect(&b, "ev");

        a.emit("ev", "from a").unwrap();

        assert!(seen_a.borrow().is_empty());
        assert_eq!(*seen_b.borrow(), vec!["from a".to_string()]);
    }

    #[test]
    fn test_delivery_is_synchronous() {
        let (a, b) = SimPort::pair();
        let seen_b = collect(&b, "ev");

        a.emit("ev", "x").unwrap();
        // Already there when emit returns
        assert_eq!(seen_b.borrow().len(), 1);
    }

    #[test]
    fn test_events_are_isolated() {
        let (a, b) = SimPort::pair();
        let seen = collect(&b, "wanted");

        a.emit("other", "x").unwrap();

        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_disconnect_fails_both_halves() {
        let (a, b) = SimPort::pair();
        a.disconnect();

        assert!(a.is_disconnected());
        assert!(b.is_disconnected());
        assert!(matches!(
            a.emit("ev", "x"),
            Err(TransportError::Disconnected(_))
        ));
        assert!(matches!(
            b.emit("ev", "x"),
            Err(TransportError::Disconnected(_))
        ));
    }

    #[test]
    fn test_emit_to_dropped_peer_fails() {
        let (a, b) = SimPort::pair();
        drop(b);

        assert!(matches!(
            a.emit("ev", "x"),
            Err(TransportError::Disconnected(_))
        ));
    }

    #[test]
    fn test_handler_may_emit_back() {
        let (a, b) = SimPort::pair();
        let seen_a = collect(&a, "ev");

        let replier = b.clone();
        b.on(
            "ev",
            Rc::new(move |frame: &str| {
                if frame == "ping" {
                    replier.emit("ev", "pong").unwrap();
                }
            }),
        );

        a.emit("ev", "ping").unwrap();

        assert_eq!(*seen_a.borrow(), vec!["pong".to_string()]);
    }
}
