// src/models/user.rs
// DOCUMENTATION: User account models
// PURPOSE: Defines serialization/deserialization models for users and auth flows

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Authorization roles, stored as text in the users table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    User,
    Guide,
    LeadGuide,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Guide => "guide",
            Role::LeadGuide => "lead-guide",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "user" => Some(Role::User),
            "guide" => Some(Role::Guide),
            "lead-guide" => Some(Role::LeadGuide),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Represents a complete user record from the database
/// The password hash and reset fields never reach API consumers;
/// use to_response() for anything client-facing
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,

    pub name: String,

    /// Stored lowercased; unique index in the database
    pub email: String,

    /// Filename under {upload_dir}/img/users
    pub photo: String,

    /// One of user, guide, lead-guide, admin
    pub role: String,

    /// Argon2 PHC string
    pub password_hash: String,

    /// Set whenever the password changes; tokens issued before this
    /// moment are rejected
    pub password_changed_at: Option<DateTime<Utc>>,

    /// SHA-256 hex digest of the outstanding reset token
    pub password_reset_token: Option<String>,

    pub password_reset_expires: Option<DateTime<Utc>>,

    /// Soft-delete flag; inactive users are invisible to every query
    pub active: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn role(&self) -> Role {
        Role::parse(&self.role).unwrap_or(Role::User)
    }

    /// True if the password was changed after the token was issued
    /// (iat is a unix timestamp in seconds)
    pub fn changed_password_after(&self, token_iat: i64) -> bool {
        match self.password_changed_at {
            Some(changed_at) => token_iat < changed_at.timestamp(),
            None => false,
        }
    }

    pub fn to_response(&self) -> UserResponse {
        UserResponse {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            photo: self.photo.clone(),
            role: self.role.clone(),
        }
    }
}

/// Response DTO for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub photo: String,
    pub role: String,
}

/// Request DTO for POST /users/signup
/// The password/password_confirm equality is checked in AuthService, where
/// the cross-field context lives
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1, max = 255, message = "Please provide your name"))]
    pub name: String,

    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    pub password_confirm: String,
}

/// Request DTO for POST /users/login
/// Fields are optional so a missing one yields a 400 with the
/// "provide email and password" message instead of a deserialize error
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    pub password_confirm: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePasswordRequest {
    pub current_password: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    pub password_confirm: String,
}

/// Request DTO for PATCH /users/update-me
/// Password fields are deserialized only so their presence can be rejected
#[derive(Debug, Deserialize)]
pub struct UpdateMeRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub password_confirm: Option<String>,
}

/// Request DTO for admin PATCH /users/{id}
#[derive(Debug, Deserialize)]
pub struct AdminUpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            photo: "default.jpg".to_string(),
            role: "lead-guide".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            password_changed_at: None,
            password_reset_token: None,
            password_reset_expires: None,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn role_round_trips_through_text() {
        for role in [Role::User, Role::Guide, Role::LeadGuide, Role::Admin] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("superuser"), None);
    }

    #[test]
    fn unknown_role_text_falls_back_to_user() {
        let mut user = sample_user();
        user.role = "wizard".to_string();
        assert_eq!(user.role(), Role::User);
    }

    #[test]
    fn changed_password_after_compares_iat() {
        let mut user = sample_user();
        assert!(!user.changed_password_after(Utc::now().timestamp()));

        user.password_changed_at = Some(Utc::now());
        let stale_iat = (Utc::now() - Duration::hours(1)).timestamp();
        let fresh_iat = (Utc::now() + Duration::hours(1)).timestamp();
        assert!(user.changed_password_after(stale_iat));
        assert!(!user.changed_password_after(fresh_iat));
    }

    #[test]
    fn signup_enforces_password_length_and_email() {
        use validator::Validate;

        let mut req = SignupRequest {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "password123".to_string(),
            password_confirm: "password123".to_string(),
        };
        assert!(req.validate().is_ok());

        req.password = "short".to_string();
        assert!(req.validate().is_err());

        req.password = "password123".to_string();
        req.email = "not-an-email".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn response_hides_credentials() {
        let user = sample_user();
        let json = serde_json::to_value(user.to_response()).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("password_reset_token").is_none());
        assert_eq!(json["email"], "ada@example.com");
    }
}
