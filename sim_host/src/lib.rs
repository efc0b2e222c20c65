//! # Simulated Host
//!
//! This crate provides an in-process simulation of the extension
//! runtime the channel normally runs inside.
//!
//! ## Purpose
//!
//! The simulated host allows testing cross-context messaging without a
//! browser:
//! - Runs under `cargo test`
//! - Deterministic (synchronous delivery, no real event loop)
//! - Fast (no serialization across real process boundaries)
//! - Inspectable (every transport half is directly reachable)
//!
//! ## Philosophy
//!
//! **Testability is a first-class design constraint.**
//!
//! The transports here are faithful to their real counterparts where it
//! matters: the port pair is private to its two ends, while the bus
//! echoes every broadcast back to all subscribers, the broadcaster's own
//! side included. Echo screening is the channel's job, and a simulation
//! that quietly suppressed echoes would hide exactly the bugs these
//! tests exist to catch.

pub mod bus;
pub mod port;
pub mod world;

pub use bus::SimBus;
pub use port::SimPort;
pub use world::ExtensionWorld;
