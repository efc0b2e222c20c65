//! # Channel Types
//!
//! This crate defines the fundamental types shared by every part of the
//! cross-context message channel.
//!
//! ## Philosophy
//!
//! Channel types are designed with these principles:
//! - **Explicit over implicit**: A channel's execution context is a typed
//!   parameter, never inferred from ambient state.
//! - **Type safety first**: Hop tokens and correlation ids cannot be
//!   confused with each other or with raw UUIDs.
//! - **Validated at the edge**: A channel name is checked and normalized
//!   once, at construction; everything downstream trusts it.
//!
//! ## Key Types
//!
//! - [`HopToken`]: Per-instance random identifier pushed onto packet paths
//! - [`CorrelationId`]: Identifier linking a sent message to its reply
//! - [`PeerContext`]: Which of the three isolated contexts a channel runs in
//! - [`Direction`]: Which way a packet travels between host and page
//! - [`ChannelName`]: Validated, prefix-normalized channel identifier

pub mod context;
pub mod ids;
pub mod name;

pub use context::{Direction, PeerContext};
pub use ids::{CorrelationId, HopToken};
pub use name::{ChannelName, ChannelNameError, CHANNEL_NAME_PREFIX};
