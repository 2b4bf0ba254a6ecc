/// Authentication flow controller
///
/// Orchestrates registration, login, logout, token refresh, password change
/// and avatar replacement on top of the credential store, blob store,
/// password hasher and token service.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::auth::claims::TokenKind;
use crate::auth::guard::SessionGuard;
use crate::auth::jwt::{TokenPair, TokenService};
use crate::auth::password::PasswordHasher;
use crate::blob_store::BlobStore;
use crate::credential_store::CredentialStore;
use crate::error::{AppError, AuthError, ValidationError};
use crate::user::{NewUser, PublicUser};
use crate::validators::{
    is_valid_email, is_valid_full_name, is_valid_username, require_field, require_password,
};

/// Registration input; files are local paths owned by the caller
#[derive(Debug, Default)]
pub struct Registration {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub avatar: Option<PathBuf>,
    pub cover_image: Option<PathBuf>,
}

/// Login input: username or email, plus password
#[derive(Debug, Default)]
pub struct Credentials {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: PublicUser,
    pub tokens: TokenPair,
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    blobs: Arc<dyn BlobStore>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        blobs: Arc<dyn BlobStore>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: TokenService,
    ) -> Self {
        Self {
            store,
            blobs,
            hasher,
            tokens,
        }
    }

    /// Guard sharing this service's token service and credential store
    pub fn session_guard(&self) -> SessionGuard {
        SessionGuard::new(self.tokens.clone(), self.store.clone())
    }

    /// Register a new user
    ///
    /// # Errors
    /// - `Validation` for a blank field, a malformed email or a missing avatar
    /// - `Conflict` when the username or email is taken
    /// - `Upload` when the avatar cannot be uploaded
    pub async fn register(&self, registration: Registration) -> Result<PublicUser, AppError> {
        let full_name = require_field("fullName", registration.full_name.as_deref())?;
        let email = require_field("email", registration.email.as_deref())?;
        let username = require_field("username", registration.username.as_deref())?;
        let password = require_password("password", registration.password.as_deref())?;

        let full_name = is_valid_full_name(&full_name)?;
        let email = is_valid_email(&email)?;
        let username = is_valid_username(&username)?;

        let existing = self
            .store
            .find_by_username_or_email(Some(&username), Some(&email))
            .await?;
        if existing.is_some() {
            return Err(AppError::Conflict(
                "User with username or email already exists".to_string(),
            ));
        }

        let avatar_path = registration
            .avatar
            .ok_or_else(|| ValidationError::MissingFile("avatar".to_string()))?;
        let avatar = self.blobs.upload(&avatar_path).await?;

        let cover_image = match registration.cover_image {
            Some(path) => match self.blobs.upload(&path).await {
                Ok(blob) => blob.url,
                Err(e) => {
                    tracing::warn!(error = %e, "Cover image upload failed, continuing without it");
                    String::new()
                }
            },
            None => String::new(),
        };

        let password_hash = self.hasher.hash(&password).await?;

        // The store's unique constraints catch a concurrent registration that
        // slipped past the lookup above. Uploaded images are not deleted then.
        let user = match self
            .store
            .create(NewUser {
                username,
                email,
                full_name,
                avatar: avatar.url.clone(),
                cover_image: cover_image.clone(),
                password_hash,
            })
            .await
        {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(
                    avatar = %avatar.url,
                    cover_image = %cover_image,
                    error = %e,
                    "User creation failed, uploaded images are orphaned"
                );
                return Err(e.into());
            }
        };

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user.into())
    }

    /// Check credentials and start a session
    ///
    /// # Errors
    /// - `Validation` when neither username nor email is given, or no password
    /// - `NotFound` when no user matches
    /// - `InvalidCredentials` on a password mismatch; nothing is persisted
    pub async fn login(&self, credentials: Credentials) -> Result<LoginOutcome, AppError> {
        let username = non_blank_lowercase(credentials.username.as_deref());
        let email = non_blank_lowercase(credentials.email.as_deref());
        if username.is_none() && email.is_none() {
            return Err(ValidationError::EmptyField("username or email".to_string()).into());
        }
        let password = require_password("password", credentials.password.as_deref())?;

        let user = self
            .store
            .find_by_username_or_email(username.as_deref(), email.as_deref())
            .await?
            .ok_or_else(|| AppError::NotFound("User does not exist".to_string()))?;

        if !self.hasher.verify(&password, &user.password_hash).await? {
            return Err(AuthError::InvalidCredentials.into());
        }

        let tokens = self.tokens.issue(&user)?;
        self.store
            .update_refresh_token(user.id, Some(&tokens.refresh_token))
            .await?;

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(LoginOutcome {
            user: user.into(),
            tokens,
        })
    }

    /// End the session of an authenticated user
    pub async fn logout(&self, user_id: uuid::Uuid) -> Result<(), AppError> {
        self.store.update_refresh_token(user_id, None).await?;
        tracing::info!(user_id = %user_id, "User logged out");
        Ok(())
    }

    /// Exchange a refresh token for a new pair, retiring the old refresh token
    ///
    /// # Errors
    /// - `MissingToken` / `InvalidToken` / `UnknownUser` when the token cannot be used
    /// - `TokenReuseOrExpired` when it is not the user's current refresh token,
    ///   including when a concurrent refresh won the race
    pub async fn refresh(&self, incoming: Option<&str>) -> Result<TokenPair, AppError> {
        // Compared byte for byte with the stored token, so never normalized
        let incoming = incoming
            .filter(|t| !t.trim().is_empty())
            .ok_or(AuthError::MissingToken)?;

        let claims = self
            .tokens
            .verify(incoming, TokenKind::Refresh)
            .map_err(AuthError::InvalidToken)?;
        let user_id = claims.user_id().map_err(AuthError::InvalidToken)?;

        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UnknownUser)?;

        if user.refresh_token.as_deref() != Some(incoming) {
            return Err(AuthError::TokenReuseOrExpired.into());
        }

        let tokens = self.tokens.issue(&user)?;
        let rotated = self
            .store
            .rotate_refresh_token(user.id, incoming, &tokens.refresh_token)
            .await?;
        if !rotated {
            return Err(AuthError::TokenReuseOrExpired.into());
        }

        tracing::info!(user_id = %user.id, "Tokens refreshed");
        Ok(tokens)
    }

    /// Replace the password of an authenticated user
    pub async fn change_password(
        &self,
        user_id: uuid::Uuid,
        old_password: Option<&str>,
        new_password: Option<&str>,
    ) -> Result<(), AppError> {
        let old_password = require_password("oldPassword", old_password)?;
        let new_password = require_password("newPassword", new_password)?;

        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UnknownUser)?;

        if !self.hasher.verify(&old_password, &user.password_hash).await? {
            return Err(AuthError::InvalidCredentials.into());
        }

        let password_hash = self.hasher.hash(&new_password).await?;
        self.store.update_password(user.id, &password_hash).await?;

        tracing::info!(user_id = %user.id, "Password changed");
        Ok(())
    }

    /// Upload a new avatar and point the user at it
    pub async fn update_avatar(
        &self,
        user_id: uuid::Uuid,
        avatar: Option<&Path>,
    ) -> Result<PublicUser, AppError> {
        let avatar = avatar.ok_or_else(|| ValidationError::MissingFile("avatar".to_string()))?;
        let blob = self.blobs.upload(avatar).await?;

        let user = self
            .store
            .update_avatar(user_id, &blob.url)
            .await?
            .ok_or_else(|| AppError::NotFound("User does not exist".to_string()))?;

        tracing::info!(user_id = %user.id, "Avatar updated");
        Ok(user.into())
    }
}

fn non_blank_lowercase(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_lowercase)
}
