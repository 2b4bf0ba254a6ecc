/// User records and their outward representation

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A stored user, as held by the credential store
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: String,
    pub password_hash: String,
    /// Last refresh token issued to this user, `None` when logged out
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a user; identity fields are already validated
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: String,
    pub password_hash: String,
}

impl NewUser {
    pub fn into_user(self) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            username: self.username,
            email: self.email,
            full_name: self.full_name,
            avatar: self.avatar,
            cover_image: self.cover_image,
            password_hash: self.password_hash,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A user without its password hash or refresh token
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            avatar: user.avatar,
            cover_image: user.cover_image,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user() -> NewUser {
        NewUser {
            username: "alice".to_string(),
            email: "alice@x.com".to_string(),
            full_name: "Alice".to_string(),
            avatar: "https://media.example/alice.png".to_string(),
            cover_image: String::new(),
            password_hash: "$2b$04$hash".to_string(),
        }
    }

    #[test]
    fn test_new_user_starts_logged_out() {
        let user = new_user().into_user();
        assert!(user.refresh_token.is_none());
        assert_eq!(user.created_at, user.updated_at);
    }

    #[test]
    fn test_public_user_omits_secrets() {
        let mut user = new_user().into_user();
        user.refresh_token = Some("token".to_string());

        let json = serde_json::to_value(PublicUser::from(user)).unwrap();
        let object = json.as_object().unwrap();

        assert!(!object.contains_key("password"));
        assert!(!object.contains_key("passwordHash"));
        assert!(!object.contains_key("refreshToken"));
        assert_eq!(object["fullName"], "Alice");
        assert_eq!(object["coverImage"], "");
    }
}
