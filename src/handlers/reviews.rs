// src/handlers/reviews.rs
// DOCUMENTATION: HTTP handlers for reviews
// PURPOSE: Flat review CRUD plus the nested tour review routes

use actix_web::{web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::errors::ApiError;
use crate::models::{CreateReviewRequest, Role, UpdateReviewRequest};
use crate::services::ReviewService;

/// GET /reviews
pub async fn list_reviews(
    pool: web::Data<PgPool>,
    query: web::Query<HashMap<String, String>>,
) -> Result<impl Responder, ApiError> {
    let reviews = ReviewService::list(pool.get_ref(), &query).await?;
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "results": reviews.len(),
        "data": reviews
    })))
}

/// GET /tours/{tour_id}/reviews
pub async fn list_tour_reviews(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let reviews = ReviewService::list_for_tour(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "results": reviews.len(),
        "data": reviews
    })))
}

/// POST /tours/{tour_id}/reviews (role: user)
/// The tour comes from the path, the author from the token
pub async fn create_tour_review(
    pool: web::Data<PgPool>,
    current_user: CurrentUser,
    path: web::Path<Uuid>,
    body: web::Json<CreateReviewRequest>,
) -> Result<impl Responder, ApiError> {
    current_user.require_role(&[Role::User])?;

    let review = ReviewService::create(
        pool.get_ref(),
        Some(path.into_inner()),
        &current_user.0,
        body.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Created().json(json!({ "status": "success", "data": review })))
}

/// POST /reviews (role: user), tour id taken from the body
pub async fn create_review(
    pool: web::Data<PgPool>,
    current_user: CurrentUser,
    body: web::Json<CreateReviewRequest>,
) -> Result<impl Responder, ApiError> {
    current_user.require_role(&[Role::User])?;

    let review =
        ReviewService::create(pool.get_ref(), None, &current_user.0, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(json!({ "status": "success", "data": review })))
}

/// GET /reviews/{id}
pub async fn get_review(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let review = ReviewService::get(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "status": "success", "data": review })))
}

/// PATCH /reviews/{id} (author or admin)
pub async fn update_review(
    pool: web::Data<PgPool>,
    current_user: CurrentUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdateReviewRequest>,
) -> Result<impl Responder, ApiError> {
    let review = ReviewService::update(
        pool.get_ref(),
        path.into_inner(),
        &current_user.0,
        body.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(json!({ "status": "success", "data": review })))
}

/// DELETE /reviews/{id} (author or admin)
pub async fn delete_review(
    pool: web::Data<PgPool>,
    current_user: CurrentUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    ReviewService::delete(pool.get_ref(), path.into_inner(), &current_user.0).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Configuration for the flat review routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/reviews")
            .route("", web::get().to(list_reviews))
            .route("", web::post().to(create_review))
            .route("/{id}", web::get().to(get_review))
            .route("/{id}", web::patch().to(update_review))
            .route("/{id}", web::delete().to(delete_review)),
    );
}
