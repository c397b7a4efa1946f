//! Simulated reward-points service
//!
//! Stands in for the remote points provider: answers each (attraction, user)
//! lookup with a random point value, optionally after a random delay.

use crate::domain::Attraction;
use crate::io::oracle::{OracleError, PointsOracle};
use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use uuid::Uuid;

pub struct SimulatedRewardCentral {
    rng: Mutex<StdRng>,
    /// Upper bound on the simulated lookup delay; zero disables it
    latency: Duration,
}

impl SimulatedRewardCentral {
    pub fn new() -> Self {
        Self { rng: Mutex::new(StdRng::from_entropy()), latency: Duration::ZERO }
    }

    /// Fixed seed for reproducible point values in tests
    pub fn seeded(seed: u64) -> Self {
        Self { rng: Mutex::new(StdRng::seed_from_u64(seed)), latency: Duration::ZERO }
    }

    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        self.latency = Duration::from_millis(latency_ms);
        self
    }

    fn random_points(&self) -> (i32, Duration) {
        let mut rng = self.rng.lock();
        let points = rng.gen_range(1..=1000);
        let delay = if self.latency.is_zero() {
            Duration::ZERO
        } else {
            Duration::from_millis(rng.gen_range(0..=self.latency.as_millis() as u64))
        };
        (points, delay)
    }
}

impl Default for SimulatedRewardCentral {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PointsOracle for SimulatedRewardCentral {
    async fn reward_points(
        &self,
        _attraction: &Attraction,
        _user_id: Uuid,
    ) -> Result<i32, OracleError> {
        let (points, delay) = self.random_points();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(points)
    }
}
