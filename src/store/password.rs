use crate::error::ApiError;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a password into a PHC string with a fresh random salt
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

/// Check a password against a stored PHC string; malformed hashes never match
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// [`hash_password`] on the blocking pool, off the async workers
pub async fn hash_password_blocking(password: String) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ApiError::Internal(format!("Password hashing task failed: {}", e)))?
}

/// [`verify_password`] on the blocking pool
pub async fn verify_password_blocking(password: String, hash: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| ApiError::Internal(format!("Password check task failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifies_only_the_original_password() {
        let hash = hash_password("hunter2").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
    }

    #[test]
    fn salts_differ_between_hashes() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn salt_is_sixteen_random_bytes() {
        let mut salts = std::collections::HashSet::new();
        for _ in 0..8 {
            let hash = hash_password("same").unwrap();
            let parsed = PasswordHash::new(&hash).unwrap();
            let salt = parsed.salt.unwrap().as_str().to_string();
            // 16 bytes in unpadded B64
            assert_eq!(salt.len(), 22);
            salts.insert(salt);
        }
        assert_eq!(salts.len(), 8);
    }

    #[test]
    fn garbage_hash_does_not_match() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[tokio::test]
    async fn blocking_helpers_agree_with_sync_ones() {
        let hash = hash_password_blocking("s3cret".to_string()).await.unwrap();
        assert!(verify_password("s3cret", &hash));
        assert!(verify_password_blocking("s3cret".to_string(), hash.clone())
            .await
            .unwrap());
        assert!(!verify_password_blocking("other".to_string(), hash)
            .await
            .unwrap());
    }
}
