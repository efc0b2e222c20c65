//! Frame shape contract tests
//!
//! These tests define the stable wire contract for packet frames. Both
//! ends of every transport parse this shape; a frame that drifts strands
//! traffic mid-route.

use serde::{Deserialize, Serialize};

// ===== Frame Field Names =====
pub const FRAME_FIELD_PATH: &str = "path";
pub const FRAME_FIELD_DIRECTION: &str = "direction";
pub const FRAME_FIELD_IS_RESPONSE: &str = "isResponse";
pub const FRAME_FIELD_CORRELATION: &str = "correlationId";
pub const FRAME_FIELD_MESSAGE: &str = "message";

// ===== Direction Wire Values =====
pub const DIRECTION_OUTBOUND: &str = "outbound";
pub const DIRECTION_INBOUND: &str = "inbound";

// ===== Canonical Payload Structure =====

/// Canonical payload used to exercise the frame round trip
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CanonicalPing {
    pub text: String,
    pub count: u32,
}

// ===== Contract Tests =====
