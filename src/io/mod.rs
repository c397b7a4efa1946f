//! IO modules - external collaborator interfaces
//!
//! This module contains the contracts for every external system the engine
//! talks to, plus the simulated implementations used in development:
//! - `oracle` - capability traits (`LocationOracle`, `PointsOracle`,
//!   `AttractionSource`) and the transient `OracleError`
//! - `gps` - simulated GPS service with the built-in attraction catalog
//! - `reward_central` - simulated reward-points service

pub mod gps;
pub mod oracle;
pub mod reward_central;

// Re-export commonly used types
pub use gps::SimulatedGps;
pub use oracle::{AttractionSource, LocationOracle, OracleError, PointsOracle};
pub use reward_central::SimulatedRewardCentral;
