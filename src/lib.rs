//! CSMA Channel Contention Simulation

#![forbid(unsafe_code, unused_must_use)]
#![warn(clippy::all, missing_docs)]

/// Shared aliases and constants.
pub mod common;

/// Error kinds.
pub mod error;

/// Parameters and policies.
pub mod config;

/// Backoff generation.
pub mod backoff;

/// Station state machine.
pub mod station;

/// Channel and contention resolution.
pub mod channel;

/// Simulation engine.
pub mod simulation;

/// Output and sweeps.
pub mod report;

/// Command-line surface.
pub mod cli;

pub use config::{Policy, SimConfig};
pub use error::{Error, Result};
pub use simulation::{Simulation, SimulationReport, run};
