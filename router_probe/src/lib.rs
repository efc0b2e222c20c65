//! # Router Probe
//!
//! This crate provides a terminal scenario driver that proves the
//! cross-context message channel end to end over the simulated host.
//!
//! ## Philosophy
//!
//! - **Scenarios, not a shell**: each run drives one scripted exchange
//! - **Deterministic**: everything runs over the synchronous simulated world
//! - **The transcript is the output**: one line per observed step, printed
//!   to stdout and optionally written to a file
//! - **The exit code is the verdict**: expectation failures exit nonzero
//!
//! ## Responsibilities
//!
//! The probe:
//! - Wires a full three-peer world per scenario
//! - Drives the exchange and records what it observes
//! - Checks the outcome against the scenario's expectations
//!
//! ## Non-Responsibilities
//!
//! The probe does NOT:
//! - Talk to a real browser or host process
//! - Measure performance
//! - Replace the integration test suites

pub mod runtime;
pub mod scenario;

pub use runtime::{ProbeConfig, ProbeError, ProbeRuntime};
pub use scenario::{Scenario, ScenarioError};
