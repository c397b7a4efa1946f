//! User aggregate: identity, visited-location history, reward set

use crate::domain::types::{UserReward, VisitedLocation};
use uuid::Uuid;

/// A tracked user.
///
/// The visited-location history is append-only and ordered, most recent
/// last. The reward set holds at most one entry per attraction; the engine
/// checks before writing and `add_reward` re-checks defensively, so a
/// duplicate can never be committed.
///
/// During a tracking batch, a `User` is owned by exactly one worker task,
/// which is what makes the in-place mutation here safe without locks.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub user_name: String,
    pub phone_number: String,
    pub email: String,
    visited_locations: Vec<VisitedLocation>,
    rewards: Vec<UserReward>,
}

impl User {
    pub fn new(
        id: Uuid,
        user_name: impl Into<String>,
        phone_number: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id,
            user_name: user_name.into(),
            phone_number: phone_number.into(),
            email: email.into(),
            visited_locations: Vec::new(),
            rewards: Vec::new(),
        }
    }

    /// Append a location sample to the history.
    pub fn add_visited_location(&mut self, location: VisitedLocation) {
        self.visited_locations.push(location);
    }

    /// Full visited-location history, oldest first.
    pub fn visited_locations(&self) -> &[VisitedLocation] {
        &self.visited_locations
    }

    /// Most recent location sample, if the user has ever been located.
    pub fn latest_location(&self) -> Option<&VisitedLocation> {
        self.visited_locations.last()
    }

    /// Whether the user already holds a reward for the named attraction.
    pub fn has_reward_for(&self, attraction_name: &str) -> bool {
        self.rewards.iter().any(|r| r.attraction.name == attraction_name)
    }

    /// Commit a reward, refusing a duplicate for an already-rewarded
    /// attraction. Returns whether the reward was added.
    pub fn add_reward(&mut self, reward: UserReward) -> bool {
        if self.has_reward_for(&reward.attraction.name) {
            return false;
        }
        self.rewards.push(reward);
        true
    }

    pub fn rewards(&self) -> &[UserReward] {
        &self.rewards
    }

    pub fn total_reward_points(&self) -> i64 {
        self.rewards.iter().map(|r| i64::from(r.reward_points)).sum()
    }

    /// Drop the entire history. Test scaffolding for scenarios that need a
    /// user with exactly one known location.
    pub fn clear_visited_locations(&mut self) {
        self.visited_locations.clear();
    }
}
