// src/auth/password.rs
// DOCUMENTATION: Password hashing and verification using Argon2id

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::errors::ApiError;

/// Hash a password with Argon2id and a fresh random salt
/// Returns a PHC-formatted string safe for database storage
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| {
            log::error!("Password hashing failed: {}", e);
            ApiError::InternalError
        })?
        .to_string();

    Ok(password_hash)
}

/// Verify a candidate password against a stored PHC hash
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, ApiError> {
    let parsed_hash = PasswordHash::new(password_hash).map_err(|e| {
        log::error!("Invalid password hash format: {}", e);
        ApiError::InternalError
    })?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => {
            log::error!("Password verification failed: {}", e);
            Err(ApiError::InternalError)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_and_verifies() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse battery staple", &hash).unwrap());
    }

    #[test]
    fn rejects_wrong_password() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(!verify_password("incorrect horse", &hash).unwrap());
    }

    #[test]
    fn salts_are_unique() {
        let first = hash_password("same password").unwrap();
        let second = hash_password("same password").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("anything", "not-a-phc-string").is_err());
    }
}
