use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::CredentialStore;
use crate::error::DatabaseError;
use crate::user::{NewUser, User};

/// Process-local credential store for tests and local development
///
/// Each operation holds the lock for its whole duration, which gives it the
/// same per-call atomicity as the Postgres store.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    users: Mutex<HashMap<Uuid, User>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn users(&self) -> Result<MutexGuard<'_, HashMap<Uuid, User>>, DatabaseError> {
        self.users
            .lock()
            .map_err(|_| DatabaseError::ConnectionPool("in-memory store lock poisoned".to_string()))
    }

    fn with_user<T>(
        &self,
        id: Uuid,
        update: impl FnOnce(&mut User) -> T,
    ) -> Result<Option<T>, DatabaseError> {
        let mut users = self.users()?;
        Ok(users.get_mut(&id).map(update))
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_username_or_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, DatabaseError> {
        let users = self.users()?;
        let found = users
            .values()
            .filter(|user| {
                username.map_or(false, |u| user.username == u)
                    || email.map_or(false, |e| user.email == e)
            })
            .min_by_key(|user| user.created_at)
            .cloned();

        Ok(found)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        Ok(self.users()?.get(&id).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, DatabaseError> {
        let mut users = self.users()?;

        if let Some(existing) = users
            .values()
            .find(|u| u.username == user.username || u.email == user.email)
        {
            let column = if existing.username == user.username { "username" } else { "email" };
            return Err(DatabaseError::UniqueConstraintViolation(format!(
                "users_{}_key",
                column
            )));
        }

        let user = user.into_user();
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_refresh_token(&self, id: Uuid, token: Option<&str>) -> Result<(), DatabaseError> {
        self.with_user(id, |user| {
            user.refresh_token = token.map(str::to_string);
            user.updated_at = Utc::now();
        })?;
        Ok(())
    }

    async fn rotate_refresh_token(
        &self,
        id: Uuid,
        expected: &str,
        replacement: &str,
    ) -> Result<bool, DatabaseError> {
        let rotated = self.with_user(id, |user| {
            if user.refresh_token.as_deref() != Some(expected) {
                return false;
            }
            user.refresh_token = Some(replacement.to_string());
            user.updated_at = Utc::now();
            true
        })?;

        Ok(rotated.unwrap_or(false))
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), DatabaseError> {
        self.with_user(id, |user| {
            user.password_hash = password_hash.to_string();
            user.updated_at = Utc::now();
        })?;
        Ok(())
    }

    async fn update_avatar(&self, id: Uuid, avatar: &str) -> Result<Option<User>, DatabaseError> {
        self.with_user(id, |user| {
            user.avatar = avatar.to_string();
            user.updated_at = Utc::now();
            user.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            full_name: "Test User".to_string(),
            avatar: "https://media.example/a.png".to_string(),
            cover_image: String::new(),
            password_hash: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let store = InMemoryCredentialStore::new();
        let created = store.create(new_user("alice", "alice@x.com")).await.unwrap();

        let by_id = store.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.username, "alice");

        let by_email = store
            .find_by_username_or_email(None, Some("alice@x.com"))
            .await
            .unwrap();
        assert_eq!(by_email.unwrap().id, created.id);

        let by_username = store
            .find_by_username_or_email(Some("alice"), None)
            .await
            .unwrap();
        assert_eq!(by_username.unwrap().id, created.id);

        assert!(store.find_by_username_or_email(None, None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_or_email_rejected() {
        let store = InMemoryCredentialStore::new();
        store.create(new_user("alice", "alice@x.com")).await.unwrap();

        let same_username = store.create(new_user("alice", "other@x.com")).await;
        assert!(matches!(same_username, Err(DatabaseError::UniqueConstraintViolation(_))));

        let same_email = store.create(new_user("bob", "alice@x.com")).await;
        assert!(matches!(same_email, Err(DatabaseError::UniqueConstraintViolation(_))));
    }

    #[tokio::test]
    async fn test_rotate_requires_matching_token() {
        let store = InMemoryCredentialStore::new();
        let user = store.create(new_user("alice", "alice@x.com")).await.unwrap();
        store.update_refresh_token(user.id, Some("first")).await.unwrap();

        assert!(!store.rotate_refresh_token(user.id, "stale", "second").await.unwrap());
        assert!(store.rotate_refresh_token(user.id, "first", "second").await.unwrap());
        assert!(!store.rotate_refresh_token(user.id, "first", "third").await.unwrap());

        let stored = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.refresh_token.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_rotate_fails_when_cleared() {
        let store = InMemoryCredentialStore::new();
        let user = store.create(new_user("alice", "alice@x.com")).await.unwrap();
        store.update_refresh_token(user.id, Some("first")).await.unwrap();
        store.update_refresh_token(user.id, None).await.unwrap();

        assert!(!store.rotate_refresh_token(user.id, "first", "second").await.unwrap());
    }

    #[tokio::test]
    async fn test_update_avatar_unknown_user() {
        let store = InMemoryCredentialStore::new();
        let updated = store.update_avatar(Uuid::new_v4(), "https://x").await.unwrap();
        assert!(updated.is_none());
    }
}
