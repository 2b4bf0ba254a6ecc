/// Session boundary guard
///
/// Turns an inbound access token into the user it belongs to. Read-only.

use std::sync::Arc;

use crate::auth::claims::TokenKind;
use crate::auth::jwt::TokenService;
use crate::credential_store::CredentialStore;
use crate::error::{AppError, AuthError};
use crate::user::PublicUser;

/// The user resolved by the guard, stored in request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub PublicUser);

#[derive(Clone)]
pub struct SessionGuard {
    tokens: TokenService,
    store: Arc<dyn CredentialStore>,
}

impl SessionGuard {
    pub fn new(tokens: TokenService, store: Arc<dyn CredentialStore>) -> Self {
        Self { tokens, store }
    }

    /// Verify `token` as an access token and load its user
    ///
    /// # Errors
    /// - `MissingToken` when no (or a blank) token was presented
    /// - `InvalidToken` when verification fails
    /// - `UnknownUser` when the user no longer exists
    pub async fn authenticate(&self, token: Option<&str>) -> Result<AuthenticatedUser, AppError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;

        let claims = self
            .tokens
            .verify(token, TokenKind::Access)
            .map_err(AuthError::InvalidToken)?;
        let user_id = claims.user_id().map_err(AuthError::InvalidToken)?;

        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UnknownUser)?;

        tracing::debug!(user_id = %user.id, "Access token accepted");
        Ok(AuthenticatedUser(user.into()))
    }
}
