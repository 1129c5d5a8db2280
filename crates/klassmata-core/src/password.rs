//! Password hashing with bcrypt.

use bcrypt::{DEFAULT_COST, hash, verify};

use crate::errors::AppError;

/// Minimum accepted length for a user-chosen password.
pub const MIN_PASSWORD_LENGTH: usize = 8;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::internal_error(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::internal_error(format!("Failed to verify password: {}", e)))
}

/// Runs [`hash_password`] on the blocking thread pool.
pub async fn hash_password_async(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::internal_error(format!("Task join error: {}", e)))?
}

/// Runs [`verify_password`] on the blocking thread pool.
pub async fn verify_password_async(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::internal_error(format!("Task join error: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("longenough1").unwrap();
        assert_ne!(hash, "longenough1");
        assert!(verify_password("longenough1", &hash).unwrap());
        assert!(!verify_password("wrongpassword", &hash).unwrap());
    }

    #[test]
    fn test_verify_invalid_hash_errors() {
        assert!(verify_password("whatever", "not_a_bcrypt_hash").is_err());
    }

    #[tokio::test]
    async fn test_hash_password_async() {
        let hash = hash_password_async("longenough1".to_string()).await.unwrap();
        assert!(verify_password("longenough1", &hash).unwrap());
    }

    #[tokio::test]
    async fn test_verify_password_async() {
        let hash = hash_password("longenough1").unwrap();
        assert!(verify_password_async("longenough1".to_string(), hash.clone()).await.unwrap());
        assert!(!verify_password_async("wrongpassword".to_string(), hash).await.unwrap());
        assert!(
            verify_password_async("whatever".to_string(), "not_a_bcrypt_hash".to_string())
                .await
                .is_err()
        );
    }
}
