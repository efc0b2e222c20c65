//! Unique identifiers for packet routing

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Random token identifying one channel instance on a packet path
///
/// Every channel instance mints a token at construction. Forward travel
/// pushes the token of each traversed hop onto the packet path; response
/// travel pops and verifies them, which protects a hop from consuming a
/// response that was never routed through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HopToken(Uuid);

impl HopToken {
    /// Creates a new random hop token
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a hop token from a UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for HopToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HopToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hop({})", self.0)
    }
}

/// Identifier linking a sent message to its eventual reply
///
/// Minted fresh for every send that expects a response. The sender keys
/// its pending callback on it; the receiver keys the recorded reply path
/// on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    /// Creates a new random correlation ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a correlation ID from a UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Correlation({})", self.0)
    }
}
