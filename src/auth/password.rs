use crate::types::{AppError, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hashes a password using Argon2id.
///
/// Returns a PHC-formatted hash string with a fresh random salt, so hashing
/// the same password twice yields different strings.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Verifies a password against an Argon2 hash.
///
/// A stored value that is not a PHC string is an error, not a mismatch.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hashing() {
        let password = "test_password_123";

        let hash = hash_password(password).expect("should hash password");

        // Hash should not equal the original password
        assert_ne!(hash, password);

        // Hash should be in PHC format (starts with $argon2)
        assert!(hash.starts_with("$argon2"), "hash should be in PHC format");
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = hash_password("123456").expect("should hash");
        let second = hash_password("123456").expect("should hash");

        assert_ne!(first, second, "each hash should use a fresh salt");
    }

    #[test]
    fn test_password_verification_success() {
        let password = "secure_password_456";

        let hash = hash_password(password).expect("should hash password");
        let is_valid = verify_password(password, &hash).expect("should verify");

        assert!(is_valid, "correct password should verify successfully");
    }

    #[test]
    fn test_password_verification_failure() {
        let hash = hash_password("correct_password").expect("should hash password");
        let is_valid = verify_password("wrong_password", &hash).expect("should verify");

        assert!(!is_valid, "wrong password should fail verification");
    }

    #[test]
    fn test_verify_against_garbage_hash_is_error() {
        assert!(verify_password("123456", "not-a-phc-string").is_err());
    }
}
