//! Services - business logic and orchestration
//!
//! This module contains the core engine services:
//! - `rewards` - distance math, proximity checks, nearest-attraction search,
//!   reward evaluation
//! - `registry` - the user arena owned by the tracker between batches
//! - `dispatcher` - bounded-pool fan-out of per-user units of work
//! - `tracker` - periodic tracking loop with cooperative shutdown

pub mod dispatcher;
pub mod registry;
pub mod rewards;
pub mod tracker;

// Re-export commonly used types
pub use dispatcher::{BatchReport, Dispatcher, TrackError, TrackStats};
pub use registry::UserRegistry;
pub use rewards::{RewardFailure, RewardOutcome, RewardsService};
pub use tracker::Tracker;
