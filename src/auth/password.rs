use crate::error::{AppError, AppResult};

/// Hash a plaintext password with a fresh salt.
pub fn hash_password(plaintext: &str) -> AppResult<String> {
    bcrypt::hash(plaintext, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("password hashing failed: {}", e)))
}

/// Verify plaintext against a stored hash - constant-time via bcrypt.
pub fn verify_password(plaintext: &str, hash: &str) -> bool {
    bcrypt::verify(plaintext, hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_original_password() {
        let hash = hash_password("hunter2").unwrap();
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
    }

    #[test]
    fn same_password_hashes_differently() {
        // Different salts per call; both still verify
        let h1 = hash_password("pw").unwrap();
        let h2 = hash_password("pw").unwrap();
        assert_ne!(h1, h2);
        assert!(verify_password("pw", &h1));
        assert!(verify_password("pw", &h2));
    }

    #[test]
    fn verify_against_garbage_hash_is_false() {
        assert!(!verify_password("pw", "not-a-bcrypt-hash"));
    }
}
