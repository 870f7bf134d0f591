// src/auth/reset.rs
// DOCUMENTATION: Password-reset token lifecycle helpers
//
// The raw token travels to the user by email; only its SHA-256 digest is
// stored, so a database leak exposes nothing usable.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Raw token size before hex encoding
const TOKEN_BYTES: usize = 32;

/// Tokens are valid for ten minutes
pub const TOKEN_TTL_MINUTES: i64 = 10;

/// A freshly minted reset token
#[derive(Debug)]
pub struct ResetToken {
    /// Hex token sent to the user
    pub raw: String,
    /// SHA-256 hex digest stored in the database
    pub digest: String,
    pub expires_at: DateTime<Utc>,
}

/// Generate a new reset token with its digest and expiry
pub fn generate() -> ResetToken {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    let raw = hex::encode(bytes);
    let digest = digest(&raw);

    ResetToken {
        raw,
        digest,
        expires_at: Utc::now() + Duration::minutes(TOKEN_TTL_MINUTES),
    }
}

/// SHA-256 hex digest of a raw token, for storage and lookup
pub fn digest(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_hex_of_expected_length() {
        let token = generate();
        assert_eq!(token.raw.len(), TOKEN_BYTES * 2);
        assert!(token.raw.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn digest_is_deterministic_and_sha256_sized() {
        let token = generate();
        assert_eq!(token.digest, digest(&token.raw));
        assert_eq!(token.digest.len(), 64);
        assert_ne!(token.digest, digest("different input"));
    }

    #[test]
    fn tokens_are_unique() {
        assert_ne!(generate().raw, generate().raw);
    }

    #[test]
    fn expiry_is_ten_minutes_out() {
        let token = generate();
        let window = token.expires_at - Utc::now();
        assert!(window <= Duration::minutes(TOKEN_TTL_MINUTES));
        assert!(window > Duration::minutes(TOKEN_TTL_MINUTES - 1));
    }
}
