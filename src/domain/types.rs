//! Shared value types for tracking and rewards

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A geographic position in floating-point degrees.
///
/// Latitude is positive north, longitude positive east. Immutable value
/// type; all distance math consumes it by copy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

/// A named point of interest from the attraction catalog.
///
/// The catalog is loaded once at startup and shared read-only across all
/// workers, so `Attraction` carries no interior mutability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attraction {
    pub name: String,
    pub city: String,
    pub state: String,
    pub coordinate: Coordinate,
}

impl Attraction {
    pub fn new(
        name: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            name: name.into(),
            city: city.into(),
            state: state.into(),
            coordinate: Coordinate::new(latitude, longitude),
        }
    }
}

/// One recorded location sample for a user.
///
/// Immutable once created; appended to the user's history in sample order,
/// so history order is chronological.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitedLocation {
    pub user_id: Uuid,
    pub coordinate: Coordinate,
    pub time: DateTime<Utc>,
}

impl VisitedLocation {
    pub fn new(user_id: Uuid, coordinate: Coordinate, time: DateTime<Utc>) -> Self {
        Self { user_id, coordinate, time }
    }
}

/// A reward granted to a user for visiting within range of an attraction.
///
/// At most one exists per (user, attraction) pair; `User::add_reward`
/// enforces the uniqueness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserReward {
    pub visited_location: VisitedLocation,
    pub attraction: Attraction,
    pub reward_points: i32,
}

impl UserReward {
    pub fn new(visited_location: VisitedLocation, attraction: Attraction, reward_points: i32) -> Self {
        Self { visited_location, attraction, reward_points }
    }
}

/// Transfer object pairing a nearby attraction with its distance from the
/// query location and the user's reward points for it.
#[derive(Debug, Clone, Serialize)]
pub struct NearbyAttraction {
    pub attraction_name: String,
    pub attraction_location: Coordinate,
    pub user_location: Coordinate,
    /// Distance from the user's location, statute miles
    pub distance_miles: f64,
    pub reward_points: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_display() {
        let c = Coordinate::new(40.741112, -73.989723);
        assert_eq!(c.to_string(), "(40.741112, -73.989723)");
    }

    #[test]
    fn test_visited_location_roundtrip() {
        let loc = VisitedLocation::new(
            Uuid::new_v4(),
            Coordinate::new(33.817595, -117.922008),
            Utc::now(),
        );
        let json = serde_json::to_string(&loc).unwrap();
        let back: VisitedLocation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, loc);
    }
}
