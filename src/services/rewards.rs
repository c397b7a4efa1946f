//! Reward computation and nearest-attraction search
//!
//! `RewardsService` owns the read-only attraction catalog and the points
//! oracle. All of its distance and search entry points are pure and safe to
//! call from any number of workers concurrently; `calculate_rewards` mutates
//! only the `User` it is handed, which a worker owns exclusively for the
//! duration of its unit of work.

use crate::domain::{Attraction, Coordinate, NearbyAttraction, User, UserReward, VisitedLocation};
use crate::infra::config::Config;
use crate::io::oracle::{OracleError, PointsOracle};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Conversion factor between nautical and statute miles
const STATUTE_MILES_PER_NAUTICAL_MILE: f64 = 1.15077945;

/// Number of attractions returned by the nearby-attractions query
pub const NEARBY_ATTRACTION_COUNT: usize = 5;

/// One (attraction, error) pair that failed its points lookup during a
/// reward pass. The pass continues past it; the next pass retries it.
#[derive(Debug)]
pub struct RewardFailure {
    pub attraction_name: String,
    pub error: OracleError,
}

/// Result of one reward pass over a user's history.
#[derive(Debug, Default)]
pub struct RewardOutcome {
    /// Rewards committed during this pass
    pub granted: usize,
    /// Per-pair lookup failures; empty on a clean pass
    pub failures: Vec<RewardFailure>,
}

pub struct RewardsService {
    catalog: Arc<Vec<Attraction>>,
    points: Arc<dyn PointsOracle>,
    /// Reward-qualification threshold, statute miles
    proximity_buffer_miles: f64,
    /// Attraction-discovery threshold, statute miles
    attraction_range_miles: f64,
}

impl RewardsService {
    pub fn new(
        catalog: Arc<Vec<Attraction>>,
        points: Arc<dyn PointsOracle>,
        config: &Config,
    ) -> Self {
        Self {
            catalog,
            points,
            proximity_buffer_miles: config.proximity_buffer_miles(),
            attraction_range_miles: config.attraction_range_miles(),
        }
    }

    /// Override the reward-qualification buffer. Only callable before the
    /// service is shared; set it to `f64::INFINITY` to make every attraction
    /// reward-eligible.
    pub fn set_proximity_buffer(&mut self, miles: f64) {
        self.proximity_buffer_miles = miles;
    }

    pub fn proximity_buffer_miles(&self) -> f64 {
        self.proximity_buffer_miles
    }

    pub fn catalog(&self) -> &[Attraction] {
        &self.catalog
    }

    /// Great-circle distance between two coordinates, statute miles.
    ///
    /// Haversine form, so two identical coordinates are exactly zero. Arc
    /// minutes of a great circle are nautical miles.
    pub fn distance(a: Coordinate, b: Coordinate) -> f64 {
        let lat1 = a.latitude.to_radians();
        let lat2 = b.latitude.to_radians();
        let delta_lat = (b.latitude - a.latitude).to_radians();
        let delta_lon = (b.longitude - a.longitude).to_radians();

        let h = (delta_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
        let central_angle = 2.0 * h.sqrt().asin();

        let nautical_miles = central_angle.to_degrees() * 60.0;
        nautical_miles * STATUTE_MILES_PER_NAUTICAL_MILE
    }

    /// Discovery check: is the coordinate inside the attraction's default
    /// range? Used for tracking-step decisions, not reward qualification.
    pub fn is_within_attraction_proximity(
        &self,
        attraction: &Attraction,
        location: Coordinate,
    ) -> bool {
        Self::distance(attraction.coordinate, location) <= self.attraction_range_miles
    }

    /// Reward-qualification check against the tunable proximity buffer.
    pub fn near_attraction(&self, visited: &VisitedLocation, attraction: &Attraction) -> bool {
        Self::distance(visited.coordinate, attraction.coordinate) <= self.proximity_buffer_miles
    }

    /// The `k` attractions closest to `location`, ascending by distance.
    ///
    /// Ties preserve the input order of `attractions` (stable sort), so the
    /// result is deterministic for a fixed catalog. Fewer than `k` catalog
    /// entries, or `k == 0`, yields correspondingly fewer results - never an
    /// error.
    pub fn find_closest_attractions(
        &self,
        location: Coordinate,
        attractions: &[Attraction],
        k: usize,
    ) -> Vec<Attraction> {
        if k == 0 || attractions.is_empty() {
            return Vec::new();
        }

        let mut by_distance: Vec<(f64, &Attraction)> = attractions
            .iter()
            .map(|a| (Self::distance(location, a.coordinate), a))
            .collect();
        by_distance.sort_by(|x, y| x.0.total_cmp(&y.0));

        by_distance.into_iter().take(k).map(|(_, a)| a.clone()).collect()
    }

    /// Points lookup for one (attraction, user) pair. Exposed for the
    /// nearby-attractions query, which reports points without requiring a
    /// qualifying reward to exist.
    pub async fn reward_points(
        &self,
        attraction: &Attraction,
        user_id: Uuid,
    ) -> Result<i32, OracleError> {
        self.points.reward_points(attraction, user_id).await
    }

    /// One reward pass: every visited location in the history snapshot
    /// against every catalog attraction.
    ///
    /// The first qualifying visited location for an attraction wins; later
    /// qualifiers are no-ops through the dedup check, so re-running the pass
    /// grants nothing new and performs no oracle calls for attractions the
    /// user already holds. A failed points lookup is captured per pair and
    /// the pass moves on.
    pub async fn calculate_rewards(&self, user: &mut User) -> RewardOutcome {
        // History snapshot: locations appended mid-pass are picked up by the
        // next pass.
        let visited: Vec<VisitedLocation> = user.visited_locations().to_vec();
        let mut outcome = RewardOutcome::default();

        for location in &visited {
            for attraction in self.catalog.iter() {
                if user.has_reward_for(&attraction.name) {
                    continue;
                }
                if !self.near_attraction(location, attraction) {
                    continue;
                }
                match self.points.reward_points(attraction, user.id).await {
                    Ok(points) => {
                        if user.add_reward(UserReward::new(
                            location.clone(),
                            attraction.clone(),
                            points,
                        )) {
                            outcome.granted += 1;
                            debug!(
                                user = %user.user_name,
                                attraction = %attraction.name,
                                points = %points,
                                "reward_granted"
                            );
                        }
                    }
                    Err(error) => {
                        outcome.failures.push(RewardFailure {
                            attraction_name: attraction.name.clone(),
                            error,
                        });
                    }
                }
            }
        }

        outcome
    }

    /// Transfer objects for the five attractions closest to the user's most
    /// recent location. A user that has never been located yields an empty
    /// list.
    pub async fn nearby_attractions(
        &self,
        user: &User,
    ) -> Result<Vec<NearbyAttraction>, OracleError> {
        let Some(visited) = user.latest_location() else {
            return Ok(Vec::new());
        };
        let user_location = visited.coordinate;

        let closest = self.find_closest_attractions(
            user_location,
            self.catalog.as_slice(),
            NEARBY_ATTRACTION_COUNT,
        );

        let mut nearby = Vec::with_capacity(closest.len());
        for attraction in closest {
            let reward_points = self.points.reward_points(&attraction, user.id).await?;
            nearby.push(NearbyAttraction {
                attraction_name: attraction.name,
                attraction_location: attraction.coordinate,
                user_location,
                distance_miles: Self::distance(user_location, attraction.coordinate),
                reward_points,
            });
        }
        Ok(nearby)
    }
}
