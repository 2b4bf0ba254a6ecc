/// JWT Token Generation and Validation
///
/// Issues access/refresh token pairs and verifies them. Each kind has its own
/// secret and lifetime; verification never touches the database.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use std::fmt;

use crate::auth::claims::{Claims, TokenKind};
use crate::configuration::JwtSettings;
use crate::user::User;

/// Token verification failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    InvalidSignature,
    Expired,
    Malformed,
    Encoding(String),
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::InvalidSignature => write!(f, "token signature is invalid"),
            TokenError::Expired => write!(f, "token has expired"),
            TokenError::Malformed => write!(f, "token is malformed"),
            TokenError::Encoding(msg) => write!(f, "token encoding failed: {}", msg),
        }
    }
}

impl std::error::Error for TokenError {}

/// Access and refresh token issued together
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiry_seconds: i64,
}

impl SigningKeys {
    fn from_secret(secret: &str, expiry_seconds: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            expiry_seconds,
        }
    }
}

#[derive(Clone)]
pub struct TokenService {
    access: SigningKeys,
    refresh: SigningKeys,
    issuer: String,
}

impl TokenService {
    pub fn new(config: &JwtSettings) -> Self {
        Self {
            access: SigningKeys::from_secret(&config.access_token_secret, config.access_token_expiry),
            refresh: SigningKeys::from_secret(&config.refresh_token_secret, config.refresh_token_expiry),
            issuer: config.issuer.clone(),
        }
    }

    fn keys(&self, kind: TokenKind) -> &SigningKeys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    /// Issue a fresh access/refresh pair for `user`
    ///
    /// The access token carries username, email and full name; the refresh
    /// token only the user id.
    pub fn issue(&self, user: &User) -> Result<TokenPair, TokenError> {
        let access_claims = Claims::new(
            user.id,
            TokenKind::Access,
            self.access.expiry_seconds,
            self.issuer.clone(),
        )
        .with_identity(&user.username, &user.email, &user.full_name);

        let refresh_claims = Claims::new(
            user.id,
            TokenKind::Refresh,
            self.refresh.expiry_seconds,
            self.issuer.clone(),
        );

        Ok(TokenPair {
            access_token: self.sign(&access_claims)?,
            refresh_token: self.sign(&refresh_claims)?,
        })
    }

    fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &self.keys(claims.kind).encoding,
        )
        .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Verify `token` as a token of `kind` and return its claims
    ///
    /// # Errors
    /// - `InvalidSignature` if it was not signed with the secret for `kind`
    /// - `Expired` once `exp` has passed
    /// - `Malformed` for anything structurally wrong (encoding, issuer, subject)
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.leeway = 0;

        let claims = decode::<Claims>(token, &self.keys(kind).decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(kind = %kind, "JWT validation error: {}", e);
                match e.kind() {
                    ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    _ => TokenError::Malformed,
                }
            })?;

        // Only reachable if both kinds share a secret
        if claims.kind != kind {
            return Err(TokenError::InvalidSignature);
        }

        claims.user_id()?;
        Ok(claims)
    }
}
