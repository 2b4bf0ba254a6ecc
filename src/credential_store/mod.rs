//! Credential store: persistence of user records.
//!
//! Every method is a single atomic operation against the backing store.
//! `rotate_refresh_token` is a conditional write, so of two concurrent
//! rotations presenting the same stored token only one succeeds.

mod memory;
mod postgres;

pub use memory::InMemoryCredentialStore;
pub use postgres::PgCredentialStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::user::{NewUser, User};

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// First user whose username equals `username` or whose email equals `email`.
    /// A `None` criterion matches nothing.
    async fn find_by_username_or_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, DatabaseError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;

    /// Insert a user; `UniqueConstraintViolation` if username or email is taken
    async fn create(&self, user: NewUser) -> Result<User, DatabaseError>;

    /// Overwrite (or clear, with `None`) the stored refresh token
    async fn update_refresh_token(&self, id: Uuid, token: Option<&str>) -> Result<(), DatabaseError>;

    /// Replace the stored refresh token only if it still equals `expected`.
    /// Returns whether the replacement happened.
    async fn rotate_refresh_token(
        &self,
        id: Uuid,
        expected: &str,
        replacement: &str,
    ) -> Result<bool, DatabaseError>;

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), DatabaseError>;

    /// Set the avatar URL and return the updated user, `None` if it does not exist
    async fn update_avatar(&self, id: Uuid, avatar: &str) -> Result<Option<User>, DatabaseError>;
}
