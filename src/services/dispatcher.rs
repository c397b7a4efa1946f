//! Concurrent tracking dispatcher
//!
//! Fans the per-user unit of work (location refresh + reward pass) across
//! the population on a bounded worker pool. Users are moved out of the
//! registry into their unit and moved back on completion, so exactly one
//! worker ever owns a given user - the dedup invariant needs no locks.
//!
//! The pool is sized from the host's core count, never from the population:
//! a stalled oracle call pins one slot and nothing else.

use crate::domain::{User, VisitedLocation};
use crate::infra::config::Config;
use crate::infra::metrics::Metrics;
use crate::io::oracle::{LocationOracle, OracleError};
use crate::services::registry::UserRegistry;
use crate::services::rewards::{RewardFailure, RewardsService};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info};

/// Captured failure of one user's unit of work. Sibling units are never
/// affected; the next scheduled pass retries.
#[derive(Debug, Error)]
pub enum TrackError {
    /// The location refresh failed; the user was not modified.
    #[error("location lookup failed: {0}")]
    Location(#[source] OracleError),
    /// One or more points lookups failed. Rewards committed around the
    /// failing pairs are retained, so only the failed pairs retry later.
    #[error("points lookup failed for {} attraction(s)", .failures.len())]
    Rewards { granted: usize, failures: Vec<RewardFailure> },
}

/// Result of one successful unit of work.
#[derive(Debug)]
pub struct TrackStats {
    /// The location sample appended by this unit
    pub visited_location: VisitedLocation,
    /// Rewards committed by this unit
    pub rewards_granted: usize,
}

/// Per-batch completion report.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Population size at batch start
    pub total: usize,
    /// Units that completed cleanly
    pub completed: usize,
    /// Units that ended with a captured failure, by user name
    pub failed: Vec<(String, TrackError)>,
    /// Users never scheduled because the dispatcher stopped or the batch
    /// budget ran out; they retain their previous state
    pub not_scheduled: Vec<String>,
    /// Whether the batch overran its operational budget
    pub budget_exceeded: bool,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        self.completed == self.total
    }
}

pub struct Dispatcher {
    rewards: Arc<RewardsService>,
    location: Arc<dyn LocationOracle>,
    metrics: Arc<Metrics>,
    pool_size: usize,
    batch_budget: Option<Duration>,
    stop: watch::Sender<bool>,
}

impl Dispatcher {
    pub fn new(
        rewards: Arc<RewardsService>,
        location: Arc<dyn LocationOracle>,
        metrics: Arc<Metrics>,
        config: &Config,
    ) -> Self {
        let (stop, _) = watch::channel(false);
        Self {
            rewards,
            location,
            metrics,
            pool_size: config.worker_pool_size(),
            batch_budget: config.batch_budget(),
            stop,
        }
    }

    /// Signal the dispatcher to stop scheduling. Idempotent; in-flight units
    /// drain normally.
    pub fn stop(&self) {
        self.stop.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.stop.borrow()
    }

    /// One user's unit of work: refresh the current location, then run a
    /// reward pass over the updated history.
    pub async fn track_user(&self, user: &mut User) -> Result<TrackStats, TrackError> {
        track_unit(&self.rewards, self.location.as_ref(), user).await
    }

    /// Run one tracking batch over the whole population.
    ///
    /// Every user is moved into its own unit of work; at most `pool_size`
    /// units run at once. Unit failures are captured per user and never
    /// cancel siblings. Once the stop flag or the batch budget is observed
    /// (checked between submissions), remaining users are left unscheduled
    /// and reported; in-flight units always drain so no user state is lost.
    pub async fn track_all(&self, registry: &mut UserRegistry) -> BatchReport {
        let start = Instant::now();
        let users = registry.take_all();

        let mut report = BatchReport { total: users.len(), ..BatchReport::default() };
        debug!(users = %report.total, workers = %self.pool_size, "tracking_batch_started");

        let mut units: JoinSet<(User, Result<TrackStats, TrackError>)> = JoinSet::new();

        for user in users {
            let budget_spent =
                self.batch_budget.is_some_and(|budget| start.elapsed() >= budget);
            if budget_spent {
                report.budget_exceeded = true;
            }
            if budget_spent || self.is_stopped() {
                report.not_scheduled.push(user.user_name.clone());
                registry.restore(user);
                continue;
            }

            // Backpressure: wait for a slot before submitting the next unit.
            while units.len() >= self.pool_size {
                if let Some(joined) = units.join_next().await {
                    self.collect(joined, registry, &mut report);
                }
            }

            let rewards = Arc::clone(&self.rewards);
            let location = Arc::clone(&self.location);
            units.spawn(async move {
                let mut user = user;
                let outcome = track_unit(&rewards, location.as_ref(), &mut user).await;
                (user, outcome)
            });
        }

        // Drain in-flight units; they are never forcibly cancelled.
        while let Some(joined) = units.join_next().await {
            self.collect(joined, registry, &mut report);
        }

        report.elapsed = start.elapsed();
        if self.batch_budget.is_some_and(|budget| report.elapsed >= budget) {
            report.budget_exceeded = true;
        }
        self.metrics.record_batch(report.elapsed.as_millis() as u64);

        info!(
            total = %report.total,
            completed = %report.completed,
            failed = %report.failed.len(),
            not_scheduled = %report.not_scheduled.len(),
            budget_exceeded = %report.budget_exceeded,
            elapsed_ms = %report.elapsed.as_millis(),
            "tracking_batch_finished"
        );
        report
    }

    fn collect(
        &self,
        joined: Result<(User, Result<TrackStats, TrackError>), JoinError>,
        registry: &mut UserRegistry,
        report: &mut BatchReport,
    ) {
        match joined {
            Ok((user, outcome)) => {
                self.record_outcome(&outcome);
                match outcome {
                    Ok(_) => report.completed += 1,
                    Err(err) => report.failed.push((user.user_name.clone(), err)),
                }
                registry.restore(user);
            }
            Err(join_error) => {
                error!(error = %join_error, "tracking_unit_panicked");
            }
        }
    }

    fn record_outcome(&self, outcome: &Result<TrackStats, TrackError>) {
        match outcome {
            Ok(stats) => {
                self.metrics.record_user_tracked();
                self.metrics.record_rewards_granted(stats.rewards_granted as u64);
            }
            Err(TrackError::Location(_)) => {
                self.metrics.record_user_failed();
                self.metrics.record_location_failure();
            }
            Err(TrackError::Rewards { granted, failures }) => {
                self.metrics.record_user_failed();
                self.metrics.record_rewards_granted(*granted as u64);
                self.metrics.record_points_failures(failures.len() as u64);
            }
        }
    }

    /// Builder method for tests to pin the pool size
    #[cfg(test)]
    fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Builder method for tests to pin the batch budget
    #[cfg(test)]
    fn with_batch_budget(mut self, budget: Duration) -> Self {
        self.batch_budget = Some(budget);
        self
    }
}

async fn track_unit(
    rewards: &RewardsService,
    location: &dyn LocationOracle,
    user: &mut User,
) -> Result<TrackStats, TrackError> {
    let visited = location.user_location(user.id).await.map_err(TrackError::Location)?;
    user.add_visited_location(visited.clone());

    let outcome = rewards.calculate_rewards(user).await;
    if outcome.failures.is_empty() {
        Ok(TrackStats { visited_location: visited, rewards_granted: outcome.granted })
    } else {
        Err(TrackError::Rewards { granted: outcome.granted, failures: outcome.failures })
    }
}
