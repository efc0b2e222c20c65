//! Channel naming contract tests
//!
//! Every peer derives its transport event name from the channel name, so
//! the prefix and the normalization rules must never drift: two builds
//! disagreeing here simply stop hearing each other.

// ===== Pinned Naming Scheme =====
pub const EXPECTED_PREFIX: &str = "message-router-";
