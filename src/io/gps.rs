//! Simulated GPS service
//!
//! Stands in for the remote location provider: serves the static attraction
//! catalog and answers per-user position lookups with random coordinates,
//! optionally after a random delay to model network latency.

use crate::domain::{Attraction, Coordinate, VisitedLocation};
use crate::io::oracle::{AttractionSource, LocationOracle, OracleError};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use uuid::Uuid;

// Latitude clamp used by web-mercator maps; positions outside it are never
// produced by the real provider either.
const MAX_LATITUDE: f64 = 85.051_128_78;

/// Simulated GPS client.
///
/// Thread-safe: the RNG sits behind a mutex held only for number generation,
/// never across an await point.
pub struct SimulatedGps {
    rng: Mutex<StdRng>,
    /// Upper bound on the simulated lookup delay; zero disables it
    latency: Duration,
}

impl SimulatedGps {
    pub fn new() -> Self {
        Self { rng: Mutex::new(StdRng::from_entropy()), latency: Duration::ZERO }
    }

    /// Fixed seed for reproducible positions in tests
    pub fn seeded(seed: u64) -> Self {
        Self { rng: Mutex::new(StdRng::seed_from_u64(seed)), latency: Duration::ZERO }
    }

    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        self.latency = Duration::from_millis(latency_ms);
        self
    }

    fn random_position(&self) -> (Coordinate, Duration) {
        let mut rng = self.rng.lock();
        let coordinate = Coordinate::new(
            rng.gen_range(-MAX_LATITUDE..=MAX_LATITUDE),
            rng.gen_range(-180.0..=180.0),
        );
        let delay = if self.latency.is_zero() {
            Duration::ZERO
        } else {
            Duration::from_millis(rng.gen_range(0..=self.latency.as_millis() as u64))
        };
        (coordinate, delay)
    }
}

impl Default for SimulatedGps {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LocationOracle for SimulatedGps {
    async fn user_location(&self, user_id: Uuid) -> Result<VisitedLocation, OracleError> {
        let (coordinate, delay) = self.random_position();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(VisitedLocation::new(user_id, coordinate, Utc::now()))
    }
}

impl AttractionSource for SimulatedGps {
    fn list_attractions(&self) -> Vec<Attraction> {
        builtin_attractions()
    }
}

/// The static US attraction catalog served by the simulated provider.
pub fn builtin_attractions() -> Vec<Attraction> {
    vec![
        Attraction::new("Disneyland", "Anaheim", "CA", 33.817595, -117.922008),
        Attraction::new("Jackson Hole", "Jackson Hole", "WY", 43.582767, -110.821999),
        Attraction::new("Mojave National Preserve", "Kelso", "CA", 35.141689, -115.510399),
        Attraction::new("Joshua Tree National Park", "Joshua Tree National Park", "CA", 33.881866, -115.90065),
        Attraction::new("Buffalo National River", "St Joe", "AR", 35.985512, -92.757652),
        Attraction::new("Hot Springs National Park", "Hot Springs", "AR", 34.52153, -93.042267),
        Attraction::new("Kartchner Caverns State Park", "Benson", "AZ", 31.837551, -110.347382),
        Attraction::new("Legend Valley", "Thornville", "OH", 39.937778, -82.40667),
        Attraction::new("Flowers Bakery of London", "London", "KY", 37.131527, -84.07486),
        Attraction::new("McKinley Tower", "Anchorage", "AK", 61.218887, -149.877502),
        Attraction::new("Flatiron Building", "New York City", "NY", 40.741112, -73.989723),
        Attraction::new("Fallingwater", "Mill Run", "PA", 39.906113, -79.468056),
        Attraction::new("Union Station", "Washington D.C.", "DC", 38.897095, -77.006332),
        Attraction::new("Roger Dean Stadium", "Jupiter", "FL", 26.890959, -80.116577),
        Attraction::new("Texas Memorial Stadium", "Austin", "TX", 30.283682, -97.732536),
        Attraction::new("Bryce Canyon National Park", "Bryce Canyon City", "UT", 37.593048, -112.187332),
        Attraction::new("Zion National Park", "Springdale", "UT", 37.297817, -113.02877),
        Attraction::new("Grand Prismatic Spring", "Yellowstone National Park", "WY", 44.525121, -110.83819),
        Attraction::new("Yellowstone National Park", "Yellowstone National Park", "WY", 44.60576, -110.53711),
        Attraction::new("Mount Rushmore National Memorial", "Keystone", "SD", 43.879102, -103.459067),
        Attraction::new("Crater Lake National Park", "Klamath Falls", "OR", 42.944611, -122.109245),
        Attraction::new("Grand Canyon National Park", "Grand Canyon Village", "AZ", 36.106965, -112.112997),
        Attraction::new("Golden Gate Bridge", "San Francisco", "CA", 37.819929, -122.478255),
        Attraction::new("Walt Disney World", "Orlando", "FL", 28.385233, -81.563874),
        Attraction::new("San Diego Zoo", "San Diego", "CA", 32.735317, -117.149048),
        Attraction::new("Statue of Liberty", "New York City", "NY", 40.689249, -74.0445),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_is_stable_and_nonempty() {
        let gps = SimulatedGps::seeded(7);
        let first = gps.list_attractions();
        let second = gps.list_attractions();
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_user_location_is_valid_and_stamped() {
        let gps = SimulatedGps::seeded(7);
        let user_id = Uuid::new_v4();
        let visited = gps.user_location(user_id).await.unwrap();

        assert_eq!(visited.user_id, user_id);
        assert!(visited.coordinate.latitude.abs() <= MAX_LATITUDE);
        assert!(visited.coordinate.longitude.abs() <= 180.0);
    }

    #[tokio::test]
    async fn test_seeded_positions_reproducible() {
        let user_id = Uuid::new_v4();
        let a = SimulatedGps::seeded(42).user_location(user_id).await.unwrap();
        let b = SimulatedGps::seeded(42).user_location(user_id).await.unwrap();
        assert_eq!(a.coordinate, b.coordinate);
    }
}
