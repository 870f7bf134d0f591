// src/auth/extractor.rs
// DOCUMENTATION: Request guard for authenticated routes
// PURPOSE: Resolve the JWT (header or cookie) into a fresh user record
//
// The token alone is not enough: the account must still exist and be active,
// and the token must predate no password change. Both checks run on every
// protected request.

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use sqlx::PgPool;

use crate::auth::jwt;
use crate::config::Config;
use crate::db::UserRepository;
use crate::errors::ApiError;
use crate::models::{Role, User};

/// The authenticated user, loaded per request
#[derive(Debug)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    /// Authorization guard: 403 unless the user's role is allowed
    pub fn require_role(&self, allowed: &[Role]) -> Result<(), ApiError> {
        if allowed.contains(&self.0.role()) {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }
}

/// Token lookup order: Authorization bearer header, then the jwt cookie
fn extract_token(req: &HttpRequest) -> Option<String> {
    if let Some(value) = req.headers().get(header::AUTHORIZATION) {
        if let Ok(text) = value.to_str() {
            if let Some(token) = text.strip_prefix("Bearer ") {
                return Some(token.trim().to_string());
            }
        }
    }

    req.cookie("jwt").map(|cookie| cookie.value().to_string())
}

impl FromRequest for CurrentUser {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let token = extract_token(&req).ok_or_else(ApiError::not_logged_in)?;

            let config = req
                .app_data::<web::Data<Config>>()
                .ok_or(ApiError::InternalError)?;
            let pool = req
                .app_data::<web::Data<PgPool>>()
                .ok_or(ApiError::InternalError)?;

            let claims = jwt::verify_token(&token, &config.jwt_secret)?;

            let user = UserRepository::get_by_id(pool, claims.sub)
                .await
                .map_err(|_| {
                    ApiError::Unauthorized(
                        "The user belonging to this token no longer exists".to_string(),
                    )
                })?;

            if user.changed_password_after(claims.iat) {
                return Err(ApiError::Unauthorized(
                    "User recently changed the password! Please log in again".to_string(),
                ));
            }

            Ok(CurrentUser(user))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;
    use chrono::Utc;
    use uuid::Uuid;

    fn user_with_role(role: &str) -> CurrentUser {
        CurrentUser(User {
            id: Uuid::new_v4(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            photo: "default.jpg".to_string(),
            role: role.to_string(),
            password_hash: "$argon2id$stub".to_string(),
            password_changed_at: None,
            password_reset_token: None,
            password_reset_expires: None,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
    }

    #[test]
    fn bearer_header_wins_over_cookie() {
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer header-token"))
            .cookie(actix_web::cookie::Cookie::new("jwt", "cookie-token"))
            .to_http_request();
        assert_eq!(extract_token(&req).as_deref(), Some("header-token"));
    }

    #[test]
    fn cookie_is_used_without_header() {
        let req = TestRequest::default()
            .cookie(actix_web::cookie::Cookie::new("jwt", "cookie-token"))
            .to_http_request();
        assert_eq!(extract_token(&req).as_deref(), Some("cookie-token"));
    }

    #[test]
    fn missing_token_is_none() {
        let req = TestRequest::default().to_http_request();
        assert_eq!(extract_token(&req), None);
    }

    #[test]
    fn non_bearer_authorization_is_ignored() {
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Basic dXNlcjpwdw=="))
            .to_http_request();
        assert_eq!(extract_token(&req), None);
    }

    #[test]
    fn role_guard_allows_and_denies() {
        let admin = user_with_role("admin");
        assert!(admin.require_role(&[Role::Admin, Role::LeadGuide]).is_ok());

        let user = user_with_role("user");
        assert!(matches!(
            user.require_role(&[Role::Admin, Role::LeadGuide]),
            Err(ApiError::Forbidden)
        ));
    }
}
