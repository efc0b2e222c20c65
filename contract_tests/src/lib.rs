//! # Wire Contract Tests
//!
//! This crate provides "golden" tests for the shapes that cross the
//! channel, to ensure they don't drift accidentally over time.
//!
//! ## Philosophy
//!
//! - **Explicit over implicit**: Wire contracts are written as code
//! - **Testability first**: Contract tests fail when the shapes change
//! - **Mechanism not policy**: Define what must be stable, not how to use it
//!
//! ## Structure
//!
//! Each contract area has a module verifying:
//! - Frame field names and their exact spelling
//! - Enumerated wire values
//! - Omission rules for optional fields
//! - Payload round trips through frame text

pub mod naming;
pub mod tab_payloads;
pub mod wire_frame;

/// Common test helpers for contract validation
pub mod test_helpers {
    use message_channel::Packet;
    use serde_json::Value;

    /// Parses a packet's frame text into the raw JSON object
    pub fn frame_object(packet: &Packet) -> Value {
        let frame = packet.to_frame().expect("frame serialization failed");
        serde_json::from_str(&frame).expect("frame is not valid JSON")
    }

    /// Verifies a JSON object carries exactly the `expected` fields
    pub fn verify_object_fields(value: &Value, expected: &[&str]) {
        let object = value.as_object().expect("expected a JSON object");
        let mut names: Vec<&str> = object.keys().map(|key| key.as_str()).collect();
        names.sort_unstable();
        let mut want: Vec<&str> = expected.to_vec();
        want.sort_unstable();
        assert_eq!(
            names, want,
            "field set changed: expected {:?}, got {:?}",
            want, names
        );
    }
}
