//! Password hashing module
//!
//! Secure password hashing and verification using bcrypt. The work factor
//! comes from configuration so tests can use a cheap cost while production
//! deployments keep the default of 10 or higher.

use anyhow::{Context, Result};

/// Hash a password with the given bcrypt cost.
///
/// # Errors
///
/// Returns an error if the cost is outside bcrypt's supported range (4-31)
/// or hashing fails.
pub fn hash_password(password: &str, cost: u32) -> Result<String> {
    bcrypt::hash(password, cost).context("Failed to hash password")
}

/// Verify a password against a stored bcrypt hash.
///
/// Returns `true` if the password matches, `false` otherwise.
///
/// # Errors
///
/// Returns an error if the hash format is invalid.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    bcrypt::verify(password, hash).context("Failed to verify password")
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimum bcrypt cost, keeps tests fast
    const TEST_COST: u32 = 4;

    #[test]
    fn test_hash_password_produces_bcrypt_hash() {
        let hash = hash_password("test_password_123", TEST_COST).expect("Failed to hash password");
        assert!(hash.starts_with("$2"), "Hash should be in bcrypt format");
    }

    #[test]
    fn test_hash_password_produces_different_hashes() {
        let password = "same_password";
        let hash1 = hash_password(password, TEST_COST).expect("Failed to hash password");
        let hash2 = hash_password(password, TEST_COST).expect("Failed to hash password");

        // Different salts should produce different hashes
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_verify_password_correct() {
        let password = "correct_password";
        let hash = hash_password(password, TEST_COST).expect("Failed to hash password");

        assert!(verify_password(password, &hash).expect("Verification should not error"));
    }

    #[test]
    fn test_verify_password_incorrect() {
        let hash = hash_password("correct_password", TEST_COST).expect("Failed to hash password");

        let result =
            verify_password("wrong_password", &hash).expect("Verification should not error");
        assert!(!result);
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        let result = verify_password("password", "invalid_hash_format");
        assert!(result.is_err());
    }

    #[test]
    fn test_hash_password_rejects_invalid_cost() {
        assert!(hash_password("password", 2).is_err());
    }

    #[test]
    fn test_hash_password_unicode() {
        let password = "pässwörd🔐";
        let hash = hash_password(password, TEST_COST).expect("Failed to hash unicode password");

        assert!(verify_password(password, &hash).expect("Verification should not error"));
    }
}
