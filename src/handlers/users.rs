// src/handlers/users.rs
// DOCUMENTATION: HTTP handlers for user accounts
// PURPOSE: Self-service profile endpoints plus admin user management

use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::config::Config;
use crate::errors::ApiError;
use crate::models::{AdminUpdateUserRequest, Role, UpdateMeRequest};
use crate::services::UserService;

/// GET /users/me
pub async fn get_me(current_user: CurrentUser) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "success",
        "data": current_user.0.to_response()
    }))
}

/// PATCH /users/update-me
pub async fn update_me(
    pool: web::Data<PgPool>,
    current_user: CurrentUser,
    body: web::Json<UpdateMeRequest>,
) -> Result<impl Responder, ApiError> {
    let user =
        UserService::update_me(pool.get_ref(), current_user.0.id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "status": "success", "data": user })))
}

/// POST /users/me/photo
/// Multipart upload of a single avatar image
pub async fn upload_photo(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    current_user: CurrentUser,
    payload: Multipart,
) -> Result<impl Responder, ApiError> {
    let user =
        UserService::upload_photo(pool.get_ref(), config.get_ref(), current_user.0.id, payload)
            .await?;
    Ok(HttpResponse::Ok().json(json!({ "status": "success", "data": user })))
}

/// DELETE /users/delete-me
/// Soft delete of the caller's own account
pub async fn delete_me(
    pool: web::Data<PgPool>,
    current_user: CurrentUser,
) -> Result<impl Responder, ApiError> {
    UserService::delete_me(pool.get_ref(), current_user.0.id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /users (admin)
pub async fn list_users(
    pool: web::Data<PgPool>,
    current_user: CurrentUser,
    query: web::Query<HashMap<String, String>>,
) -> Result<impl Responder, ApiError> {
    current_user.require_role(&[Role::Admin])?;

    let users = UserService::list(pool.get_ref(), &query).await?;
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "results": users.len(),
        "data": users
    })))
}

/// POST /users
/// Account creation goes through /signup; this mirrors the stub the
/// route table keeps for symmetry
pub async fn create_user() -> impl Responder {
    HttpResponse::InternalServerError().json(json!({
        "status": "error",
        "message": "This route is not defined. Please use /signup instead!"
    }))
}

/// GET /users/{id} (admin)
pub async fn get_user(
    pool: web::Data<PgPool>,
    current_user: CurrentUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    current_user.require_role(&[Role::Admin])?;

    let user = UserService::get(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "status": "success", "data": user })))
}

/// PATCH /users/{id} (admin)
pub async fn update_user(
    pool: web::Data<PgPool>,
    current_user: CurrentUser,
    path: web::Path<Uuid>,
    body: web::Json<AdminUpdateUserRequest>,
) -> Result<impl Responder, ApiError> {
    current_user.require_role(&[Role::Admin])?;

    let user =
        UserService::admin_update(pool.get_ref(), path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "status": "success", "data": user })))
}

/// DELETE /users/{id} (admin)
pub async fn delete_user(
    pool: web::Data<PgPool>,
    current_user: CurrentUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    current_user.require_role(&[Role::Admin])?;

    UserService::delete(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Configuration for user routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/users")
            .route("/me", web::get().to(get_me))
            .route("/me/photo", web::post().to(upload_photo))
            .route("/update-me", web::patch().to(update_me))
            .route("/delete-me", web::delete().to(delete_me))
            .route("", web::get().to(list_users))
            .route("", web::post().to(create_user))
            .route("/{id}", web::get().to(get_user))
            .route("/{id}", web::patch().to(update_user))
            .route("/{id}", web::delete().to(delete_user)),
    );
}
