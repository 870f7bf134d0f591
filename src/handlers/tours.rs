// src/handlers/tours.rs
// DOCUMENTATION: HTTP handlers for tour operations
// PURPOSE: Parse requests, call services, return responses

use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::CurrentUser;
use crate::config::Config;
use crate::errors::ApiError;
use crate::handlers::reviews;
use crate::models::{CreateTourRequest, Role, UpdateTourRequest};
use crate::services::{AggregateCache, TourService};

/// GET /tours
pub async fn list_tours(
    pool: web::Data<PgPool>,
    query: web::Query<HashMap<String, String>>,
) -> Result<impl Responder, ApiError> {
    let tours = TourService::list(pool.get_ref(), &query).await?;
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "results": tours.len(),
        "data": tours
    })))
}

/// GET /tours/top-5-cheap
/// Alias that pre-fills the list query with the five best cheap tours
pub async fn top_five_cheap(
    pool: web::Data<PgPool>,
    query: web::Query<HashMap<String, String>>,
) -> Result<impl Responder, ApiError> {
    let mut params = query.into_inner();
    params.insert("limit".to_string(), "5".to_string());
    params.insert("sort".to_string(), "-ratings_average,price".to_string());
    params.insert(
        "fields".to_string(),
        "name,price,duration_days,ratings_average,summary".to_string(),
    );

    let tours = TourService::list(pool.get_ref(), &params).await?;
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "results": tours.len(),
        "data": tours
    })))
}

/// GET /tours/{id}
/// Accepts a UUID or a slug; embeds guides, itinerary and reviews
pub async fn get_tour(
    pool: web::Data<PgPool>,
    path: web::Path<String>,
) -> Result<impl Responder, ApiError> {
    let tour = TourService::get_detail(pool.get_ref(), &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "status": "success", "data": tour })))
}

/// POST /tours (admin, lead-guide)
pub async fn create_tour(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<AggregateCache>>,
    current_user: CurrentUser,
    body: web::Json<CreateTourRequest>,
) -> Result<impl Responder, ApiError> {
    current_user.require_role(&[Role::Admin, Role::LeadGuide])?;
    body.validate()?;

    let tour = TourService::create_tour(pool.get_ref(), cache.get_ref(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(json!({ "status": "success", "data": tour })))
}

/// PATCH /tours/{id} (admin, lead-guide)
pub async fn update_tour(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<AggregateCache>>,
    current_user: CurrentUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdateTourRequest>,
) -> Result<impl Responder, ApiError> {
    current_user.require_role(&[Role::Admin, Role::LeadGuide])?;

    let tour = TourService::update_tour(
        pool.get_ref(),
        cache.get_ref(),
        path.into_inner(),
        body.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(json!({ "status": "success", "data": tour })))
}

/// DELETE /tours/{id} (admin, lead-guide)
pub async fn delete_tour(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<AggregateCache>>,
    current_user: CurrentUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    current_user.require_role(&[Role::Admin, Role::LeadGuide])?;

    TourService::delete_tour(pool.get_ref(), cache.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// PATCH /tours/{id}/images (admin, lead-guide)
/// Multipart upload: one image_cover plus up to three gallery images
pub async fn upload_tour_images(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    current_user: CurrentUser,
    path: web::Path<Uuid>,
    payload: Multipart,
) -> Result<impl Responder, ApiError> {
    current_user.require_role(&[Role::Admin, Role::LeadGuide])?;

    let stored =
        TourService::upload_images(pool.get_ref(), config.get_ref(), path.into_inner(), payload)
            .await?;
    Ok(HttpResponse::Ok().json(json!({ "status": "success", "data": { "images": stored } })))
}

/// GET /tours/stats
pub async fn tour_stats(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<AggregateCache>>,
) -> Result<impl Responder, ApiError> {
    let stats = TourService::stats(pool.get_ref(), cache.get_ref()).await?;
    Ok(HttpResponse::Ok().json(json!({ "status": "success", "data": stats })))
}

/// GET /tours/monthly-plan/{year} (admin, lead-guide, guide)
pub async fn monthly_plan(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<AggregateCache>>,
    current_user: CurrentUser,
    path: web::Path<i32>,
) -> Result<impl Responder, ApiError> {
    current_user.require_role(&[Role::Admin, Role::LeadGuide, Role::Guide])?;

    let plan = TourService::monthly_plan(pool.get_ref(), cache.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "status": "success", "data": plan })))
}

/// GET /tours/within/{distance}/center/{latlng}/unit/{unit}
pub async fn tours_within(
    pool: web::Data<PgPool>,
    path: web::Path<(f64, String, String)>,
) -> Result<impl Responder, ApiError> {
    let (distance, latlng, unit) = path.into_inner();
    let tours = TourService::tours_within(pool.get_ref(), distance, &latlng, &unit).await?;
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "results": tours.len(),
        "data": tours
    })))
}

/// GET /tours/distances/{latlng}/unit/{unit}
pub async fn tour_distances(
    pool: web::Data<PgPool>,
    path: web::Path<(String, String)>,
) -> Result<impl Responder, ApiError> {
    let (latlng, unit) = path.into_inner();
    let distances = TourService::distances(pool.get_ref(), &latlng, &unit).await?;
    Ok(HttpResponse::Ok().json(json!({ "status": "success", "data": distances })))
}

/// Configuration for tour routes, including the nested review routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/tours")
            .route("/top-5-cheap", web::get().to(top_five_cheap))
            .route("/stats", web::get().to(tour_stats))
            .route("/monthly-plan/{year}", web::get().to(monthly_plan))
            .route(
                "/within/{distance}/center/{latlng}/unit/{unit}",
                web::get().to(tours_within),
            )
            .route("/distances/{latlng}/unit/{unit}", web::get().to(tour_distances))
            .route("", web::get().to(list_tours))
            .route("", web::post().to(create_tour))
            .route(
                "/{tour_id}/reviews",
                web::get().to(reviews::list_tour_reviews),
            )
            .route(
                "/{tour_id}/reviews",
                web::post().to(reviews::create_tour_review),
            )
            .route("/{id}/images", web::patch().to(upload_tour_images))
            .route("/{id}", web::get().to(get_tour))
            .route("/{id}", web::patch().to(update_tour))
            .route("/{id}", web::delete().to(delete_tour)),
    );
}
