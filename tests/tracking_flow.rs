//! End-to-end tracking flow over the simulated collaborators
//!
//! Exercises the whole path the binary wires up: seeded population ->
//! dispatcher batch -> rewards committed -> nearby-attractions query.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tourtrack::domain::{Attraction, Coordinate, User, VisitedLocation};
use tourtrack::infra::{Config, Metrics};
use tourtrack::io::{
    AttractionSource, LocationOracle, OracleError, PointsOracle, SimulatedGps,
    SimulatedRewardCentral,
};
use tourtrack::services::{Dispatcher, RewardsService, UserRegistry};
use uuid::Uuid;

/// Location oracle dropping every user onto a fixed attraction
struct AtAttraction {
    coordinate: Coordinate,
}

#[async_trait]
impl LocationOracle for AtAttraction {
    async fn user_location(&self, user_id: Uuid) -> Result<VisitedLocation, OracleError> {
        Ok(VisitedLocation::new(user_id, self.coordinate, Utc::now()))
    }
}

struct FixedPoints(i32);

#[async_trait]
impl PointsOracle for FixedPoints {
    async fn reward_points(&self, _: &Attraction, _: Uuid) -> Result<i32, OracleError> {
        Ok(self.0)
    }
}

fn seeded_registry(count: usize) -> UserRegistry {
    let mut registry = UserRegistry::new();
    for i in 0..count {
        let name = format!("user{i}");
        let email = format!("{name}@tourtrack.com");
        registry.add_user(User::new(Uuid::new_v4(), name, "000", email));
    }
    registry
}

#[tokio::test]
async fn test_batch_grants_rewards_and_serves_nearby_query() {
    let config = Config::default();
    let gps = SimulatedGps::seeded(11);
    let catalog: Arc<Vec<Attraction>> = Arc::new(gps.list_attractions());
    let target = catalog[0].clone();

    let rewards = Arc::new(RewardsService::new(
        catalog.clone(),
        Arc::new(FixedPoints(100)),
        &config,
    ));
    let location = Arc::new(AtAttraction { coordinate: target.coordinate });
    let metrics = Arc::new(Metrics::new());
    let dispatcher = Dispatcher::new(rewards.clone(), location, metrics.clone(), &config);

    let mut registry = seeded_registry(50);
    let report = dispatcher.track_all(&mut registry).await;

    assert!(report.is_complete());
    assert_eq!(metrics.users_tracked_total(), 50);
    assert_eq!(metrics.rewards_granted_total(), 50);

    // Every user stood on the target attraction: exactly one reward each.
    for user in registry.all_users() {
        assert_eq!(user.rewards().len(), 1);
        assert_eq!(user.rewards()[0].attraction.name, target.name);
        assert_eq!(user.total_reward_points(), 100);
    }

    // The nearby query pairs the five closest attractions with distances.
    let one = registry.all_users().next().unwrap();
    let nearby = rewards.nearby_attractions(one).await.unwrap();
    assert_eq!(nearby.len(), 5);
    assert_eq!(nearby[0].attraction_name, target.name);
    assert_eq!(nearby[0].distance_miles, 0.0);
    for pair in nearby.windows(2) {
        assert!(pair[0].distance_miles <= pair[1].distance_miles);
    }
}

#[tokio::test]
async fn test_second_batch_grants_nothing_new_at_same_position() {
    let config = Config::default();
    let gps = SimulatedGps::seeded(11);
    let catalog: Arc<Vec<Attraction>> = Arc::new(gps.list_attractions());
    let target = catalog[0].clone();

    let rewards = Arc::new(RewardsService::new(catalog, Arc::new(FixedPoints(10)), &config));
    let location = Arc::new(AtAttraction { coordinate: target.coordinate });
    let dispatcher =
        Dispatcher::new(rewards, location, Arc::new(Metrics::new()), &config);

    let mut registry = seeded_registry(5);
    dispatcher.track_all(&mut registry).await;
    let after_first = registry.total_rewards();

    dispatcher.track_all(&mut registry).await;

    assert_eq!(after_first, 5);
    assert_eq!(registry.total_rewards(), after_first);
}

#[tokio::test]
async fn test_simulated_stack_end_to_end() {
    // The real simulated oracles, zero latency, tiny population: the batch
    // must complete and every user gains exactly one location sample.
    let config = Config::default();
    let gps = Arc::new(SimulatedGps::seeded(99));
    let catalog: Arc<Vec<Attraction>> = Arc::new(gps.list_attractions());

    let rewards = Arc::new(RewardsService::new(
        catalog,
        Arc::new(SimulatedRewardCentral::seeded(99)),
        &config,
    ));
    let dispatcher =
        Dispatcher::new(rewards, gps, Arc::new(Metrics::new()), &config);

    let mut registry = seeded_registry(10);
    let report = dispatcher.track_all(&mut registry).await;

    assert!(report.is_complete());
    for user in registry.all_users() {
        assert_eq!(user.visited_locations().len(), 1);
    }
}
