//! Validated channel names

use std::fmt;

/// Wire prefix shared by every channel event name
///
/// Keeps channel traffic out of the way of any other named events on the
/// same port or document bus.
pub const CHANNEL_NAME_PREFIX: &str = "message-router-";

/// Errors raised by [`ChannelName::new`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelNameError {
    /// The supplied name was empty (or nothing but the wire prefix)
    Empty,
}

impl fmt::Display for ChannelNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelNameError::Empty => write!(f, "channel name must not be empty"),
        }
    }
}

impl std::error::Error for ChannelNameError {}

/// Validated, prefix-normalized channel identifier
///
/// The normalized form is the event name packets travel under, so two
/// channel instances share deliveries exactly when their normalized names
/// are equal. Normalization is idempotent: a name that already carries
/// [`CHANNEL_NAME_PREFIX`] is accepted unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelName(String);

impl ChannelName {
    /// Validates and normalizes a raw name
    ///
    /// Fails synchronously on an empty name; misnaming a channel is a
    /// programmer error, not a runtime condition.
    pub fn new(raw: &str) -> Result<Self, ChannelNameError> {
        let bare = raw.strip_prefix(CHANNEL_NAME_PREFIX).unwrap_or(raw);
        if bare.is_empty() {
            return Err(ChannelNameError::Empty);
        }
        Ok(Self(format!("{}{}", CHANNEL_NAME_PREFIX, bare)))
    }

    /// Returns the normalized name used as the transport event name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
