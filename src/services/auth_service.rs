// src/services/auth_service.rs
// DOCUMENTATION: Authentication flows
// PURPOSE: Signup/login/logout and the password lifecycle, including
// token issuance with the jwt cookie

use actix_web::cookie::{time::Duration as CookieDuration, Cookie};
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::auth::{jwt, password, reset};
use crate::config::Config;
use crate::db::UserRepository;
use crate::errors::ApiError;
use crate::models::{
    LoginRequest, ResetPasswordRequest, SignupRequest, UpdatePasswordRequest, User,
};
use crate::services::EmailClient;

fn check_passwords_match(password: &str, password_confirm: &str) -> Result<(), ApiError> {
    if password != password_confirm {
        return Err(ApiError::ValidationError(
            "Passwords do not match".to_string(),
        ));
    }
    Ok(())
}

pub struct AuthService;

impl AuthService {
    /// Issue a token for the user: JSON body plus the jwt cookie
    /// The cookie is HttpOnly so scripts cannot read it, and Secure outside
    /// development
    fn create_send_token(
        user: &User,
        status: StatusCode,
        config: &Config,
    ) -> Result<HttpResponse, ApiError> {
        let token = jwt::sign_token(user.id, &config.jwt_secret, config.jwt_expires_in_days)?;

        let cookie = Cookie::build("jwt", token.clone())
            .path("/")
            .http_only(true)
            .secure(config.is_production())
            .max_age(CookieDuration::days(config.jwt_cookie_expires_in_days))
            .finish();

        Ok(HttpResponse::build(status).cookie(cookie).json(json!({
            "status": "success",
            "token": token,
            "data": { "user": user.to_response() }
        })))
    }

    /// Register a new account and log it in
    pub async fn signup(
        pool: &PgPool,
        config: &Config,
        email_client: &EmailClient,
        req: SignupRequest,
    ) -> Result<HttpResponse, ApiError> {
        req.validate()?;
        check_passwords_match(&req.password, &req.password_confirm)?;

        let password_hash = password::hash_password(&req.password)?;
        let user = UserRepository::create_user(pool, &req.name, &req.email, &password_hash).await?;

        // Welcome mail is best effort; a provider outage must not block signup
        let account_url = format!("{}/me", config.public_url);
        if let Err(e) = email_client.send_welcome(&user, &account_url).await {
            log::warn!("Could not send welcome email to {}: {}", user.email, e);
        }

        Self::create_send_token(&user, StatusCode::CREATED, config)
    }

    /// Exchange credentials for a token
    pub async fn login(
        pool: &PgPool,
        config: &Config,
        req: LoginRequest,
    ) -> Result<HttpResponse, ApiError> {
        let (email, candidate) = match (req.email.as_deref(), req.password.as_deref()) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                (email, password)
            }
            _ => {
                return Err(ApiError::InvalidInput(
                    "Please provide email and password".to_string(),
                ))
            }
        };

        // One error for both unknown account and wrong password, so the
        // endpoint does not reveal which emails exist
        let user = UserRepository::get_by_email(pool, email)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Incorrect email or password".to_string()))?;

        if !password::verify_password(candidate, &user.password_hash)? {
            return Err(ApiError::Unauthorized(
                "Incorrect email or password".to_string(),
            ));
        }

        Self::create_send_token(&user, StatusCode::OK, config)
    }

    /// The jwt cookie is HttpOnly, so logout overwrites it with a dummy
    /// value that expires almost immediately
    pub fn logout() -> HttpResponse {
        let cookie = Cookie::build("jwt", "loggedOut")
            .path("/")
            .http_only(true)
            .max_age(CookieDuration::seconds(10))
            .finish();

        HttpResponse::Ok()
            .cookie(cookie)
            .json(json!({ "status": "success" }))
    }

    /// Issue a reset token and email it to the account holder
    /// The raw token only ever travels in the email; the database sees the
    /// digest
    pub async fn forgot_password(
        pool: &PgPool,
        config: &Config,
        email_client: &EmailClient,
        email: &str,
    ) -> Result<HttpResponse, ApiError> {
        let user = UserRepository::get_by_email(pool, email)
            .await?
            .ok_or_else(|| ApiError::NotFound("User with that email address".to_string()))?;

        let token = reset::generate();
        UserRepository::set_reset_token(pool, user.id, &token.digest, token.expires_at).await?;

        let reset_url = format!(
            "{}/api/v1/users/reset-password/{}",
            config.public_url, token.raw
        );

        if let Err(e) = email_client.send_password_reset(&user, &reset_url).await {
            // Roll the token back; a digest with no delivered counterpart
            // would lock the flow until expiry
            UserRepository::clear_reset_token(pool, user.id).await?;
            log::error!("Could not send reset email to {}: {}", user.email, e);
            return Err(ApiError::ExternalApiError(
                "There was an error sending the email. Try again later".to_string(),
            ));
        }

        Ok(HttpResponse::Ok().json(json!({
            "status": "success",
            "message": "Token sent to email!"
        })))
    }

    /// Redeem a reset token for a new password and a fresh login
    pub async fn reset_password(
        pool: &PgPool,
        config: &Config,
        raw_token: &str,
        req: ResetPasswordRequest,
    ) -> Result<HttpResponse, ApiError> {
        req.validate()?;
        check_passwords_match(&req.password, &req.password_confirm)?;

        let digest = reset::digest(raw_token);
        let user = UserRepository::get_by_reset_token(pool, &digest)
            .await?
            .ok_or_else(|| {
                ApiError::InvalidInput("The token is invalid or has expired".to_string())
            })?;

        let password_hash = password::hash_password(&req.password)?;
        UserRepository::set_password(pool, user.id, &password_hash).await?;

        Self::create_send_token(&user, StatusCode::OK, config)
    }

    /// Password change for a logged-in user; requires the current password
    pub async fn update_password(
        pool: &PgPool,
        config: &Config,
        user: &User,
        req: UpdatePasswordRequest,
    ) -> Result<HttpResponse, ApiError> {
        req.validate()?;
        check_passwords_match(&req.password, &req.password_confirm)?;

        if !password::verify_password(&req.current_password, &user.password_hash)? {
            return Err(ApiError::Unauthorized(
                "Your current password is wrong".to_string(),
            ));
        }

        let password_hash = password::hash_password(&req.password)?;
        UserRepository::set_password(pool, user.id, &password_hash).await?;

        Self::create_send_token(user, StatusCode::OK, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatched_passwords_are_rejected() {
        assert!(check_passwords_match("password123", "password124").is_err());
        assert!(check_passwords_match("password123", "password123").is_ok());
    }
}
