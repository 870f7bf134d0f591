// src/handlers/auth.rs
// DOCUMENTATION: HTTP handlers for authentication and the password lifecycle
// PURPOSE: Parse requests, enforce the credential rate limit, call AuthService

use actix_web::{web, HttpRequest, HttpResponse};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use sqlx::PgPool;
use std::num::NonZeroU32;

use crate::auth::CurrentUser;
use crate::config::Config;
use crate::errors::ApiError;
use crate::models::{
    ForgotPasswordRequest, LoginRequest, ResetPasswordRequest, SignupRequest,
    UpdatePasswordRequest,
};
use crate::services::{AuthService, EmailClient};

/// Per-IP limiter shared by the credential endpoints
pub type AuthRateLimiter = DefaultKeyedRateLimiter<String>;

/// Credential attempts allowed per IP per minute
const ATTEMPTS_PER_MINUTE: u32 = 10;

pub fn build_rate_limiter() -> AuthRateLimiter {
    let per_minute = NonZeroU32::new(ATTEMPTS_PER_MINUTE).unwrap_or(NonZeroU32::MIN);
    RateLimiter::keyed(Quota::per_minute(per_minute))
}

fn check_rate_limit(limiter: &AuthRateLimiter, req: &HttpRequest) -> Result<(), ApiError> {
    let ip = req
        .connection_info()
        .realip_remote_addr()
        .unwrap_or("unknown")
        .to_string();

    limiter.check_key(&ip).map_err(|_| {
        log::warn!("Rate limit hit for {}", ip);
        ApiError::RateLimitExceeded
    })
}

/// POST /api/v1/users/signup
pub async fn signup(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    email_client: web::Data<EmailClient>,
    limiter: web::Data<AuthRateLimiter>,
    req: HttpRequest,
    body: web::Json<SignupRequest>,
) -> Result<HttpResponse, ApiError> {
    check_rate_limit(&limiter, &req)?;

    AuthService::signup(
        pool.get_ref(),
        config.get_ref(),
        email_client.get_ref(),
        body.into_inner(),
    )
    .await
}

/// POST /api/v1/users/login
pub async fn login(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    limiter: web::Data<AuthRateLimiter>,
    req: HttpRequest,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    check_rate_limit(&limiter, &req)?;

    AuthService::login(pool.get_ref(), config.get_ref(), body.into_inner()).await
}

/// GET /api/v1/users/logout
pub async fn logout() -> HttpResponse {
    AuthService::logout()
}

/// POST /api/v1/users/forgot-password
pub async fn forgot_password(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    email_client: web::Data<EmailClient>,
    limiter: web::Data<AuthRateLimiter>,
    req: HttpRequest,
    body: web::Json<ForgotPasswordRequest>,
) -> Result<HttpResponse, ApiError> {
    check_rate_limit(&limiter, &req)?;

    AuthService::forgot_password(
        pool.get_ref(),
        config.get_ref(),
        email_client.get_ref(),
        &body.email,
    )
    .await
}

/// PATCH /api/v1/users/reset-password/{token}
pub async fn reset_password(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    path: web::Path<String>,
    body: web::Json<ResetPasswordRequest>,
) -> Result<HttpResponse, ApiError> {
    AuthService::reset_password(
        pool.get_ref(),
        config.get_ref(),
        &path.into_inner(),
        body.into_inner(),
    )
    .await
}

/// PATCH /api/v1/users/update-my-password
pub async fn update_password(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    current_user: CurrentUser,
    body: web::Json<UpdatePasswordRequest>,
) -> Result<HttpResponse, ApiError> {
    AuthService::update_password(
        pool.get_ref(),
        config.get_ref(),
        &current_user.0,
        body.into_inner(),
    )
    .await
}

/// Configuration for authentication routes
/// Registered before the user routes so the literal paths here win over
/// the /{id} parameter route
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/users")
            .route("/signup", web::post().to(signup))
            .route("/login", web::post().to(login))
            .route("/logout", web::get().to(logout))
            .route("/forgot-password", web::post().to(forgot_password))
            .route("/reset-password/{token}", web::patch().to(reset_password))
            .route("/update-my-password", web::patch().to(update_password)),
    );
}
