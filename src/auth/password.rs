/// Password Hashing and Verification
///
/// Controllers only see the `PasswordHasher` capability; bcrypt is the
/// production implementation. Hashing runs on the blocking thread pool.

use async_trait::async_trait;

use crate::error::AppError;

#[async_trait]
pub trait PasswordHasher: Send + Sync {
    /// Hash a plaintext password for storage
    async fn hash(&self, password: &str) -> Result<String, AppError>;

    /// Check a plaintext password against a stored hash
    async fn verify(&self, password: &str, hash: &str) -> Result<bool, AppError>;
}

/// Bcrypt-backed hasher
#[derive(Debug, Clone)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

#[async_trait]
impl PasswordHasher for BcryptHasher {
    async fn hash(&self, password: &str) -> Result<String, AppError> {
        let password = password.to_string();
        let cost = self.cost;

        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
    }

    async fn verify(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        let password = password.to_string();
        let hash = hash.to_string();

        tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))?
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> BcryptHasher {
        // minimum cost keeps the tests fast
        BcryptHasher::new(4)
    }

    #[tokio::test]
    async fn test_hash_password() {
        let password = "p1";
        let hash = hasher().hash(password).await.expect("Failed to hash password");

        assert_ne!(password, hash);
        assert!(hash.starts_with("$2"));
    }

    #[tokio::test]
    async fn test_verify_password() {
        let hasher = hasher();
        let hash = hasher.hash("ValidPassword123").await.unwrap();

        assert!(hasher.verify("ValidPassword123", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_wrong_password() {
        let hasher = hasher();
        let hash = hasher.hash("ValidPassword123").await.unwrap();

        assert!(!hasher.verify("WrongPassword123", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_same_password_produces_different_hashes() {
        let hasher = hasher();
        let first = hasher.hash("same").await.unwrap();
        let second = hasher.hash("same").await.unwrap();

        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_invalid_hash_format() {
        let result = hasher().verify("password", "not-a-bcrypt-hash").await;
        assert!(result.is_err());
    }
}
