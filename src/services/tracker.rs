//! Periodic tracking loop
//!
//! Re-runs the dispatcher over the whole population on a fixed interval
//! until shut down. Cancellation is cooperative: the shutdown flag is
//! observed between batches, never mid-unit, so a stop during a batch lets
//! in-flight units finish and simply prevents the next batch.

use crate::infra::config::Config;
use crate::services::dispatcher::Dispatcher;
use crate::services::registry::UserRegistry;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::info;

pub struct Tracker {
    dispatcher: Arc<Dispatcher>,
    registry: UserRegistry,
    tracking_interval: Duration,
}

impl Tracker {
    pub fn new(dispatcher: Arc<Dispatcher>, registry: UserRegistry, config: &Config) -> Self {
        Self {
            dispatcher,
            registry,
            tracking_interval: Duration::from_secs(config.tracking_interval_secs()),
        }
    }

    pub fn registry(&self) -> &UserRegistry {
        &self.registry
    }

    /// Run tracking batches until the shutdown flag flips, then hand the
    /// population back to the caller.
    ///
    /// The first batch starts immediately; later batches follow the
    /// configured interval. A batch that outlasts its interval delays the
    /// next tick instead of stacking batches.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> UserRegistry {
        let mut tick = interval(self.tracking_interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval_secs = %self.tracking_interval.as_secs(),
            users = %self.registry.len(),
            "tracker_started"
        );

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    self.dispatcher.track_all(&mut self.registry).await;
                }
                changed = shutdown.changed() => {
                    // A dropped sender counts as shutdown.
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!(
            users = %self.registry.len(),
            total_rewards = %self.registry.total_rewards(),
            "tracker_stopped"
        );
        self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Attraction, Coordinate, User, VisitedLocation};
    use crate::infra::metrics::Metrics;
    use crate::io::oracle::{LocationOracle, OracleError, PointsOracle};
    use crate::services::rewards::RewardsService;
    use async_trait::async_trait;
    use chrono::Utc;
    use uuid::Uuid;

    struct FixedLocation {
        coordinate: Coordinate,
    }

    #[async_trait]
    impl LocationOracle for FixedLocation {
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

    fn test_tracker(metrics: Arc<Metrics>) -> Tracker {
        let attraction = Attraction::new("Attraction1", "City1", "State1", 40.0, -75.0);
        let config = Config::default();
        let rewards = Arc::new(RewardsService::new(
            Arc::new(vec![attraction.clone()]),
            Arc::new(FixedPoints(10)),
            &config,
        ));
        let location = Arc::new(FixedLocation { coordinate: attraction.coordinate });
        let dispatcher = Arc::new(Dispatcher::new(rewards, location, metrics, &config));

        let mut registry = UserRegistry::new();
        for i in 0..3 {
            let name = format!("user{i}");
            let email = format!("{name}@tourtrack.com");
            registry.add_user(User::new(Uuid::new_v4(), name, "000", email));
        }
        Tracker::new(dispatcher, registry, &config)
    }

    #[tokio::test]
    async fn test_runs_first_batch_then_honors_shutdown() {
        let metrics = Arc::new(Metrics::new());
        let tracker = test_tracker(metrics.clone());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(tracker.run(shutdown_rx));

        // The first tick fires immediately; wait for the batch to land.
        tokio::time::sleep(Duration::from_millis(200)).await;
        shutdown_tx.send(true).unwrap();
        let registry = handle.await.unwrap();

        assert_eq!(metrics.batches_total(), 1);
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.total_rewards(), 3);
    }

    #[tokio::test]
    async fn test_dropped_shutdown_sender_stops_tracker() {
        let metrics = Arc::new(Metrics::new());
        let tracker = test_tracker(metrics);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(tracker.run(shutdown_rx));
        tokio::time::sleep(Duration::from_millis(200)).await;
        drop(shutdown_tx);

        let registry = handle.await.unwrap();
        assert_eq!(registry.len(), 3);
    }
}
