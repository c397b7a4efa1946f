//! Domain models - core tracking and rewards types
//!
//! This module contains the canonical data types used throughout the system:
//! - `Coordinate` - latitude/longitude pair in floating-point degrees
//! - `Attraction` - named point of interest from the read-only catalog
//! - `VisitedLocation` - one recorded location sample for a user
//! - `UserReward` - a granted reward, at most one per (user, attraction)
//! - `User` - per-user aggregate: visited history plus reward set
//! - `NearbyAttraction` - transfer object for the nearest-k query

pub mod types;
pub mod user;

// Re-export commonly used types at module level
pub use types::{Attraction, Coordinate, NearbyAttraction, UserReward, VisitedLocation};
pub use user::User;
