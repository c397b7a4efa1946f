//! External collaborator contracts
//!
//! The engine depends only on these capability traits; the simulated
//! implementations in this crate and the remote production services are
//! interchangeable behind them.

use crate::domain::{Attraction, VisitedLocation};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Failure of a remote lookup.
///
/// Always transient from the engine's point of view: the unit of work that
/// hit it is reported failed and the next scheduled pass retries.
#[derive(Debug, Clone, Error)]
pub enum OracleError {
    #[error("oracle unavailable: {reason}")]
    Unavailable { reason: String },
    #[error("oracle call timed out after {0:?}")]
    Timeout(Duration),
}

impl OracleError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable { reason: reason.into() }
    }
}

/// Source of current user positions. May be remote and slow.
#[async_trait]
pub trait LocationOracle: Send + Sync {
    async fn user_location(&self, user_id: Uuid) -> Result<VisitedLocation, OracleError>;
}

/// Source of reward point values. May be remote and slow; queried at most
/// once per committed reward.
#[async_trait]
pub trait PointsOracle: Send + Sync {
    async fn reward_points(
        &self,
        attraction: &Attraction,
        user_id: Uuid,
    ) -> Result<i32, OracleError>;
}

/// Attraction catalog source. Loaded once at startup and assumed static for
/// the process lifetime.
pub trait AttractionSource: Send + Sync {
    fn list_attractions(&self) -> Vec<Attraction>;
}
