/// JWT Claims structure
///
/// Payload shared by access and refresh tokens. Access tokens also carry the
/// user's identity fields; refresh tokens carry only the subject.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::TokenError;

/// Which secret and lifetime a token was issued under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Access => write!(f, "access"),
            TokenKind::Refresh => write!(f, "refresh"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Unique token ID; keeps two tokens issued in the same second distinct
    pub jti: String,
    pub kind: TokenKind,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    pub iss: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

impl Claims {
    /// Create claims for `user_id` that expire `expiry_seconds` from now
    pub fn new(user_id: Uuid, kind: TokenKind, expiry_seconds: i64, issuer: String) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            jti: Uuid::new_v4().to_string(),
            kind,
            exp: now + expiry_seconds,
            iat: now,
            iss: issuer,
            username: None,
            email: None,
            full_name: None,
        }
    }

    pub fn with_identity(mut self, username: &str, email: &str, full_name: &str) -> Self {
        self.username = Some(username.to_string());
        self.email = Some(email.to_string());
        self.full_name = Some(full_name.to_string());
        self
    }

    /// Extract user ID from claims
    pub fn user_id(&self) -> Result<Uuid, TokenError> {
        Uuid::parse_str(&self.sub).map_err(|_| TokenError::Malformed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_creation() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, TokenKind::Refresh, 3600, "test".to_string());

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.kind, TokenKind::Refresh);
        assert_eq!(claims.iss, "test");
        assert!(claims.username.is_none());
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_claims_have_unique_ids() {
        let user_id = Uuid::new_v4();
        let first = Claims::new(user_id, TokenKind::Access, 3600, "test".to_string());
        let second = Claims::new(user_id, TokenKind::Access, 3600, "test".to_string());

        assert_ne!(first.jti, second.jti);
    }

    #[test]
    fn test_user_id_extraction() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, TokenKind::Access, 3600, "test".to_string());

        assert_eq!(claims.user_id().unwrap(), user_id);
    }

    #[test]
    fn test_invalid_user_id() {
        let mut claims = Claims::new(Uuid::new_v4(), TokenKind::Access, 3600, "test".to_string());
        claims.sub = "invalid-uuid".to_string();

        assert!(matches!(claims.user_id(), Err(TokenError::Malformed)));
    }

    #[test]
    fn test_identity_fields_serialized_only_when_present() {
        let refresh = Claims::new(Uuid::new_v4(), TokenKind::Refresh, 60, "test".to_string());
        let json = serde_json::to_value(&refresh).unwrap();
        assert!(json.get("email").is_none());
        assert_eq!(json["kind"], "refresh");

        let access = Claims::new(Uuid::new_v4(), TokenKind::Access, 60, "test".to_string())
            .with_identity("alice", "alice@x.com", "Alice");
        let json = serde_json::to_value(&access).unwrap();
        assert_eq!(json["email"], "alice@x.com");
        assert_eq!(json["kind"], "access");
    }
}
