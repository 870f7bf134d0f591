// src/auth/jwt.rs
// DOCUMENTATION: JWT signing and verification (HS256)

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ApiError;

/// JWT claims carried by the session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: Uuid,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiration time (unix seconds)
    pub exp: i64,
}

/// Sign a token for the given user
pub fn sign_token(user_id: Uuid, secret: &str, expires_in_days: i64) -> Result<String, ApiError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        iat: now.timestamp(),
        exp: (now + Duration::days(expires_in_days)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| {
        log::error!("Failed to sign token: {}", e);
        ApiError::InternalError
    })
}

/// Verify a token and return its claims
/// Expired and otherwise-invalid tokens get distinct 401 messages so the
/// client can tell a stale session from a forged one
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            ApiError::Unauthorized("Token expired. Please log in again".to_string())
        }
        _ => ApiError::Unauthorized("Invalid token. Please log in again".to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "an-hs256-test-secret-of-enough-length";

    #[test]
    fn round_trips_claims() {
        let user_id = Uuid::new_v4();
        let token = sign_token(user_id, SECRET, 90).unwrap();
        // JWTs have three dot-separated segments
        assert_eq!(token.matches('.').count(), 2);

        let claims = verify_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, user_id);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn rejects_wrong_secret() {
        let token = sign_token(Uuid::new_v4(), SECRET, 90).unwrap();
        let err = verify_token(&token, "a-completely-different-signing-secret").unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[test]
    fn rejects_tampered_token() {
        let token = sign_token(Uuid::new_v4(), SECRET, 90).unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();
        parts[1] = "eyJzdWIiOiJmb3JnZWQifQ";
        let forged = parts.join(".");
        assert!(verify_token(&forged, SECRET).is_err());
    }

    #[test]
    fn rejects_expired_token() {
        // Negative lifetime puts exp well past the default validation leeway
        let token = sign_token(Uuid::new_v4(), SECRET, -1).unwrap();
        let err = verify_token(&token, SECRET).unwrap_err();
        match err {
            ApiError::Unauthorized(msg) => assert!(msg.contains("expired")),
            other => panic!("expected Unauthorized, got {:?}", other),
        }
    }

    #[test]
    fn rejects_garbage() {
        assert!(verify_token("not.a.token", SECRET).is_err());
    }
}
