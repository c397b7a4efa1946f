//! Lock-free metrics collection and periodic reporting
//!
//! Uses atomics for hot-path operations to avoid mutex contention. All
//! counter updates are lock-free.
//!
//! NOTE: All atomics use Relaxed ordering intentionally—these are statistical
//! counters only. Do NOT use these atomics for coordination or logic decisions.

use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Update an atomic max value using compare-and-swap loop
#[inline]
fn update_atomic_max(atomic_max: &AtomicU64, new_value: u64) {
    let mut current_max = atomic_max.load(Ordering::Relaxed);
    while new_value > current_max {
        match atomic_max.compare_exchange_weak(
            current_max,
            new_value,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(actual) => current_max = actual,
        }
    }
}

/// Metrics collector shared across the tracker and dispatcher
#[derive(Debug, Default)]
pub struct Metrics {
    /// Completed tracking batches
    batches_total: AtomicU64,
    /// Units of work completed successfully (all passes)
    users_tracked_total: AtomicU64,
    /// Units of work that ended with a captured failure
    users_failed_total: AtomicU64,
    /// Rewards committed (all passes)
    rewards_granted_total: AtomicU64,
    /// Location-oracle lookup failures
    location_failures_total: AtomicU64,
    /// Points-oracle lookup failures
    points_failures_total: AtomicU64,
    /// Wall time of the most recent batch, milliseconds
    last_batch_ms: AtomicU64,
    /// Slowest batch observed, milliseconds
    max_batch_ms: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_user_tracked(&self) {
        self.users_tracked_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_user_failed(&self) {
        self.users_failed_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rewards_granted(&self, count: u64) {
        self.rewards_granted_total.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_location_failure(&self) {
        self.location_failures_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_points_failures(&self, count: u64) {
        self.points_failures_total.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_batch(&self, elapsed_ms: u64) {
        self.batches_total.fetch_add(1, Ordering::Relaxed);
        self.last_batch_ms.store(elapsed_ms, Ordering::Relaxed);
        update_atomic_max(&self.max_batch_ms, elapsed_ms);
    }

    pub fn batches_total(&self) -> u64 {
        self.batches_total.load(Ordering::Relaxed)
    }

    pub fn users_tracked_total(&self) -> u64 {
        self.users_tracked_total.load(Ordering::Relaxed)
    }

    pub fn users_failed_total(&self) -> u64 {
        self.users_failed_total.load(Ordering::Relaxed)
    }

    pub fn rewards_granted_total(&self) -> u64 {
        self.rewards_granted_total.load(Ordering::Relaxed)
    }

    pub fn location_failures_total(&self) -> u64 {
        self.location_failures_total.load(Ordering::Relaxed)
    }

    pub fn points_failures_total(&self) -> u64 {
        self.points_failures_total.load(Ordering::Relaxed)
    }

    pub fn last_batch_ms(&self) -> u64 {
        self.last_batch_ms.load(Ordering::Relaxed)
    }

    pub fn max_batch_ms(&self) -> u64 {
        self.max_batch_ms.load(Ordering::Relaxed)
    }

    /// Emit a structured snapshot of all counters
    pub fn report(&self) {
        info!(
            batches = %self.batches_total(),
            users_tracked = %self.users_tracked_total(),
            users_failed = %self.users_failed_total(),
            rewards_granted = %self.rewards_granted_total(),
            location_failures = %self.location_failures_total(),
            points_failures = %self.points_failures_total(),
            last_batch_ms = %self.last_batch_ms(),
            max_batch_ms = %self.max_batch_ms(),
            "metrics_report"
        );
    }
}
