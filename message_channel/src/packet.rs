//! Packet model and wire framing
//!
//! A packet is immutable once sent: hops receive a packet, adjust their
//! own copy (push or pop a path element), and re-emit. The wire form is
//! a single JSON object whose field names are pinned by contract tests.

use channel_types::{CorrelationId, Direction, HopToken};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors raised while framing or parsing packets
#[derive(Debug, Error)]
pub enum PacketError {
    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Response frame missing correlationId")]
    MissingCorrelation,
}

/// Distinguishes fresh traffic from replies
///
/// Exhaustive matches over this enum are the router's decision points;
/// there is no field-sniffing to guess what a packet is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKind {
    /// A fresh message; carries a correlation id only when the sender
    /// expects a reply
    Message { correlation: Option<CorrelationId> },
    /// A reply travelling back along a recorded path
    Response { correlation: CorrelationId },
}

/// The routed envelope crossing every transport boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Hop tokens pushed on forward travel, popped on response travel.
    /// Length equals the number of hops traversed so far.
    pub path: Vec<HopToken>,
    /// Which adjacent link the next peer forwards across
    pub direction: Direction,
    /// Message or response, with correlation
    pub kind: PacketKind,
    /// JSON text of the application payload; the text round trip at each
    /// boundary is what guarantees no live references survive a hop
    pub payload: String,
}

impl Packet {
    /// Builds a fresh message packet with an empty path
    pub fn message(
        direction: Direction,
        correlation: Option<CorrelationId>,
        payload: String,
    ) -> Self {
        Self {
            path: Vec::new(),
            direction,
            kind: PacketKind::Message { correlation },
            payload,
        }
    }

    /// Builds a response packet retracing `path`
    pub fn response(
        path: Vec<HopToken>,
        direction: Direction,
        correlation: CorrelationId,
        payload: String,
    ) -> Self {
        Self {
            path,
            direction,
            kind: PacketKind::Response { correlation },
            payload,
        }
    }

    /// Checks if this packet is a reply
    pub fn is_response(&self) -> bool {
        matches!(self.kind, PacketKind::Response { .. })
    }

    /// Returns the correlation id, if any
    pub fn correlation(&self) -> Option<CorrelationId> {
        match self.kind {
            PacketKind::Message { correlation } => correlation,
            PacketKind::Response { correlation } => Some(correlation),
        }
    }

    /// Serializes to the text frame that crosses a transport
    pub fn to_frame(&self) -> Result<String, PacketError> {
        let (is_response, correlation_id) = match self.kind {
            PacketKind::Message { correlation } => (false, correlation),
            PacketKind::Response { correlation } => (true, Some(correlation)),
        };
        let frame = WireFrame {
            path: self.path.clone(),
            direction: self.direction,
            is_response,
            correlation_id,
            message: self.payload.clone(),
        };
        serde_json::to_string(&frame).map_err(|err| PacketError::Codec(err.to_string()))
    }

    /// Parses a received text frame
    pub fn from_frame(frame: &str) -> Result<Self, PacketError> {
        let wire: WireFrame =
            serde_json::from_str(frame).map_err(|err| PacketError::Codec(err.to_string()))?;
        let kind = if wire.is_response {
            match wire.correlation_id {
                Some(correlation) => PacketKind::Response { correlation },
                None => return Err(PacketError::MissingCorrelation),
            }
        } else {
            PacketKind::Message {
                correlation: wire.correlation_id,
            }
        };
        Ok(Self {
            path: wire.path,
            direction: wire.direction,
            kind,
            payload: wire.message,
        })
    }
}

/// Exact wire layout
///
/// `correlationId` is omitted entirely, not serialized as null, when a
/// message expects no reply.
#[derive(Debug, Serialize, Deserialize)]
struct WireFrame {
    path: Vec<HopToken>,
    direction: Direction,
    #[serde(rename = "isResponse")]
    is_response: bool,
    #[serde(
        rename = "correlationId",
        skip_serializing_if = "Option::is_none",
        default
    )]
    correlation_id: Option<CorrelationId>,
    message: String,
}

/// Encodes an application value into payload text
pub fn encode_payload<T: Serialize>(value: &T) -> Result<String, PacketError> {
    serde_json::to_string(value).map_err(|err| PacketError::Codec(err.to_string()))
}

/// Decodes payload text into a structurally-copied value
pub fn decode_payload(payload: &str) -> Result<Value, PacketError> {
    serde_json::from_str(payload).map_err(|err| PacketError::Codec(err.to_string()))
}
