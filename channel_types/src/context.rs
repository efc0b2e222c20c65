//! Execution contexts and packet travel directions

use serde::{Deserialize, Serialize};
use std::fmt;

/// The isolated execution environment a channel instance runs in
///
/// Chosen once at construction and immutable afterwards. Routing is an
/// exhaustive match over the context and the packet direction, so adding
/// a context forces every decision point to be revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeerContext {
    /// Privileged context; owns the duplex port to the mediator
    Host,
    /// Sandboxed content surface; bridges the host port and the page bus
    Mediator,
    /// Untrusted content; reachable only over the shared bus
    Page,
}

impl PeerContext {
    /// Returns the lowercase name used in transcripts and wire frames
    pub fn as_str(&self) -> &'static str {
        match self {
            PeerContext::Host => "host",
            PeerContext::Mediator => "mediator",
            PeerContext::Page => "page",
        }
    }
}

impl fmt::Display for PeerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which way a packet is travelling between host and page
///
/// Host-originated sends travel outbound; everything else originates
/// inbound. Responses travel opposite to the request they answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Host toward page
    Outbound,
    /// Page toward host
    Inbound,
}

impl Direction {
    /// Returns the opposite direction
    pub fn inverted(self) -> Self {
        match self {
            Direction::Outbound => Direction::Inbound,
            Direction::Inbound => Direction::Outbound,
        }
    }

    /// Returns the lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Outbound => "outbound",
            Direction::Inbound => "inbound",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverted_is_an_involution() {
        assert_eq!(Direction::Outbound.inverted(), Direction::Inbound);
        assert_eq!(Direction::Inbound.inverted(), Direction::Outbound);
        assert_eq!(Direction::Outbound.inverted().inverted(), Direction::Outbound);
    }

    #[test]
    fn test_direction_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Direction::Outbound).unwrap(),
            "\"outbound\""
        );
        assert_eq!(
            serde_json::to_string(&Direction::Inbound).unwrap(),
            "\"inbound\""
        );

        let back: Direction = serde_json::from_str("\"inbound\"").unwrap();
        assert_eq!(back, Direction::Inbound);
    }

    #[test]
    fn test_context_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&PeerContext::Mediator).unwrap(),
            "\"mediator\""
        );
    }

    #[test]
    fn test_display_matches_wire_names() {
        assert_eq!(format!("{}", PeerContext::Host), "host");
        assert_eq!(format!("{}", Direction::Outbound), "outbound");
    }
}
