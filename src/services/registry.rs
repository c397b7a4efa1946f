//! User arena
//!
//! Holds the population between tracking batches. `Dispatcher::track_all`
//! drains users out of the registry, moves each into its unit of work, and
//! restores them as units complete - which is what guarantees a user is
//! never owned by two workers at once.

use crate::domain::{Coordinate, User, VisitedLocation};
use chrono::{Duration as ChronoDuration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;
use uuid::Uuid;

pub struct UserRegistry {
    users: FxHashMap<String, User>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self { users: FxHashMap::default() }
    }

    /// Register a user. A user name already present is left untouched.
    pub fn add_user(&mut self, user: User) {
        self.users.entry(user.user_name.clone()).or_insert(user);
    }

    pub fn get_user(&self, user_name: &str) -> Option<&User> {
        self.users.get(user_name)
    }

    pub fn get_user_mut(&mut self, user_name: &str) -> Option<&mut User> {
        self.users.get_mut(user_name)
    }

    pub fn all_users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Move every user out of the registry for a tracking batch.
    pub fn take_all(&mut self) -> Vec<User> {
        self.users.drain().map(|(_, user)| user).collect()
    }

    /// Return a user after its unit of work completes.
    pub fn restore(&mut self, user: User) {
        self.users.insert(user.user_name.clone(), user);
    }

    /// Total rewards held across the population.
    pub fn total_rewards(&self) -> usize {
        self.users.values().map(|u| u.rewards().len()).sum()
    }

    /// Seed `count` internal users, each with three random historical
    /// location samples from the past month.
    pub fn seed_internal(&mut self, count: usize) {
        let mut rng = StdRng::from_entropy();
        self.seed_internal_with_rng(count, &mut rng);
    }

    /// Seeding with a caller-supplied RNG, for reproducible tests.
    pub fn seed_internal_with_rng(&mut self, count: usize, rng: &mut StdRng) {
        for i in 0..count {
            let user_name = format!("internalUser{i}");
            let email = format!("{user_name}@tourtrack.com");
            let mut user = User::new(Uuid::new_v4(), user_name, "000", email);

            for _ in 0..3 {
                let coordinate = Coordinate::new(
                    rng.gen_range(-85.051_128_78..=85.051_128_78),
                    rng.gen_range(-180.0..=180.0),
                );
                let age_secs = rng.gen_range(0..30 * 24 * 3600);
                let time = Utc::now() - ChronoDuration::seconds(age_secs);
                user.add_visited_location(VisitedLocation::new(user.id, coordinate, time));
            }

            self.add_user(user);
        }
    }
}

impl Default for UserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_get_users() {
        let mut registry = UserRegistry::new();
        let jon = User::new(Uuid::new_v4(), "jon", "000", "jon@tourtrack.com");
        let jon2 = User::new(Uuid::new_v4(), "jon2", "000", "jon2@tourtrack.com");
        let jon_id = jon.id;

        registry.add_user(jon);
        registry.add_user(jon2);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get_user("jon").unwrap().id, jon_id);
        assert!(registry.get_user("jon2").is_some());
        assert!(registry.get_user("nobody").is_none());
    }

    #[test]
    fn test_duplicate_user_name_ignored() {
        let mut registry = UserRegistry::new();
        let first = User::new(Uuid::new_v4(), "jon", "000", "jon@tourtrack.com");
        let first_id = first.id;
        registry.add_user(first);
        registry.add_user(User::new(Uuid::new_v4(), "jon", "111", "other@tourtrack.com"));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get_user("jon").unwrap().id, first_id);
    }

    #[test]
    fn test_take_all_and_restore() {
        let mut registry = UserRegistry::new();
        registry.add_user(User::new(Uuid::new_v4(), "jon", "000", "jon@tourtrack.com"));

        let users = registry.take_all();
        assert_eq!(users.len(), 1);
        assert!(registry.is_empty());

        for user in users {
            registry.restore(user);
        }
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_seed_internal_population() {
        let mut registry = UserRegistry::new();
        let mut rng = StdRng::seed_from_u64(1);
        registry.seed_internal_with_rng(10, &mut rng);

        assert_eq!(registry.len(), 10);
        let user = registry.get_user("internalUser0").unwrap();
        assert_eq!(user.visited_locations().len(), 3);
        assert!(user.latest_location().unwrap().time <= Utc::now());
    }
}
