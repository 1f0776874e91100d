//! User directory collaborator: existence, usernames, invalid-claim strikes.
//!
//! The engine consumes this as a trait so production can back it with the
//! relational user store; the in-memory implementation here serves the
//! standalone server and the tests. The invalid-claim counter lives with the
//! user record because it survives across sessions.

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::info;

use crate::errors::{GameError, GameResult};

/// User identifier as issued by the surrounding platform.
pub type UserId = u64;

#[derive(Debug, Clone)]
pub struct UserProfile {
    pub user_id: UserId,
    pub username: String,
    pub invalid_claims: u32,
}

/// User existence, display data, and removal, as consumed by the engine.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn register(&self, user: UserId, username: &str) -> GameResult<()>;

    async fn exists(&self, user: UserId) -> bool;

    async fn profile(&self, user: UserId) -> Option<UserProfile>;

    async fn username(&self, user: UserId) -> Option<String>;

    /// Increment the user's invalid-claim counter and return the new count.
    async fn record_invalid_claim(&self, user: UserId) -> GameResult<u32>;

    /// Delete the user. Returns false when the user was already gone.
    async fn remove(&self, user: UserId) -> bool;
}

/// DashMap-backed directory for the standalone server and tests.
#[derive(Debug, Default)]
pub struct InMemoryUsers {
    users: DashMap<UserId, UserProfile>,
}

impl InMemoryUsers {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUsers {
    async fn register(&self, user: UserId, username: &str) -> GameResult<()> {
        if self.users.contains_key(&user) {
            return Err(GameError::AlreadyRegistered(user));
        }
        if self
            .users
            .iter()
            .any(|entry| entry.value().username == username)
        {
            return Err(GameError::UsernameTaken(username.to_string()));
        }

        self.users.insert(
            user,
            UserProfile {
                user_id: user,
                username: username.to_string(),
                invalid_claims: 0,
            },
        );
        info!(user, username, "registered user");
        Ok(())
    }

    async fn exists(&self, user: UserId) -> bool {
        self.users.contains_key(&user)
    }

    async fn profile(&self, user: UserId) -> Option<UserProfile> {
        self.users.get(&user).map(|entry| entry.value().clone())
    }

    async fn username(&self, user: UserId) -> Option<String> {
        self.users.get(&user).map(|entry| entry.username.clone())
    }

    async fn record_invalid_claim(&self, user: UserId) -> GameResult<u32> {
        let mut entry = self
            .users
            .get_mut(&user)
            .ok_or(GameError::UserNotFound(user))?;
        entry.invalid_claims += 1;
        Ok(entry.invalid_claims)
    }

    async fn remove(&self, user: UserId) -> bool {
        self.users.remove(&user).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn register_and_lookup() {
        let users = InMemoryUsers::new();
        users.register(1, "abebe").await.unwrap();
        assert!(users.exists(1).await);
        assert_eq!(users.username(1).await.as_deref(), Some("abebe"));
    }

    #[tokio::test]
    async fn duplicate_registrations_are_rejected() {
        let users = InMemoryUsers::new();
        users.register(1, "abebe").await.unwrap();
        assert_eq!(
            users.register(1, "other").await,
            Err(GameError::AlreadyRegistered(1))
        );
        assert_eq!(
            users.register(2, "abebe").await,
            Err(GameError::UsernameTaken("abebe".to_string()))
        );
    }

    #[tokio::test]
    async fn strikes_accumulate_until_removal() {
        let users = InMemoryUsers::new();
        users.register(1, "abebe").await.unwrap();
        assert_eq!(users.record_invalid_claim(1).await, Ok(1));
        assert_eq!(users.record_invalid_claim(1).await, Ok(2));
        assert!(users.remove(1).await);
        assert!(!users.exists(1).await);
        assert_eq!(
            users.record_invalid_claim(1).await,
            Err(GameError::UserNotFound(1))
        );
    }
}
