use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::CredentialStore;
use crate::error::DatabaseError;
use crate::user::{NewUser, User};

const USER_COLUMNS: &str = "id, username, email, full_name, avatar, cover_image, \
    password_hash, refresh_token, created_at, updated_at";

/// Postgres-backed credential store
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply pending schema migrations from `./migrations`
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DatabaseError::UnexpectedError(format!("Migration failed: {}", e)))
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_username_or_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, DatabaseError> {
        let query = format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE ($1::TEXT IS NOT NULL AND username = $1)
               OR ($2::TEXT IS NOT NULL AND email = $2)
            ORDER BY created_at
            LIMIT 1
            "#
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(username)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn create(&self, user: NewUser) -> Result<User, DatabaseError> {
        let user = user.into_user();
        let query = format!(
            r#"
            INSERT INTO users (id, username, email, full_name, avatar, cover_image,
                               password_hash, refresh_token, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NULL, $8, $9)
            RETURNING {USER_COLUMNS}
            "#
        );

        let created = sqlx::query_as::<_, User>(&query)
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.full_name)
            .bind(&user.avatar)
            .bind(&user.cover_image)
            .bind(&user.password_hash)
            .bind(user.created_at)
            .bind(user.updated_at)
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }

    async fn update_refresh_token(&self, id: Uuid, token: Option<&str>) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE users SET refresh_token = $1, updated_at = $2 WHERE id = $3")
            .bind(token)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn rotate_refresh_token(
        &self,
        id: Uuid,
        expected: &str,
        replacement: &str,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET refresh_token = $1, updated_at = $2
            WHERE id = $3 AND refresh_token = $4
            "#,
        )
        .bind(replacement)
        .bind(Utc::now())
        .bind(id)
        .bind(expected)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE users SET password_hash = $1, updated_at = $2 WHERE id = $3")
            .bind(password_hash)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn update_avatar(&self, id: Uuid, avatar: &str) -> Result<Option<User>, DatabaseError> {
        let query = format!(
            "UPDATE users SET avatar = $1, updated_at = $2 WHERE id = $3 RETURNING {USER_COLUMNS}"
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(avatar)
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }
}
