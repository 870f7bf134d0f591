// src/handlers/bookings.rs
// DOCUMENTATION: HTTP handlers for bookings and checkout

use actix_web::{web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::config::Config;
use crate::errors::ApiError;
use crate::models::{CheckoutCompleteQuery, CreateBookingRequest, Role, UpdateBookingRequest};
use crate::services::{BookingService, PaymentClient};

/// GET /bookings/checkout-session/{tour_id}
/// Creates a hosted checkout session for the authenticated user
pub async fn checkout_session(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    payment: web::Data<PaymentClient>,
    current_user: CurrentUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let session = BookingService::checkout_session(
        pool.get_ref(),
        payment.get_ref(),
        config.get_ref(),
        path.into_inner(),
        &current_user.0,
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({ "status": "success", "session": session })))
}

/// GET /bookings/checkout-complete?tour=&user=&price=
/// Target of the provider's success redirect
pub async fn checkout_complete(
    pool: web::Data<PgPool>,
    query: web::Query<CheckoutCompleteQuery>,
) -> Result<impl Responder, ApiError> {
    let booking = BookingService::checkout_complete(pool.get_ref(), query.into_inner()).await?;
    Ok(HttpResponse::Created().json(json!({ "status": "success", "data": booking })))
}

/// GET /bookings/my-bookings
pub async fn my_bookings(
    pool: web::Data<PgPool>,
    current_user: CurrentUser,
) -> Result<impl Responder, ApiError> {
    let bookings = BookingService::my_bookings(pool.get_ref(), current_user.0.id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "results": bookings.len(),
        "data": bookings
    })))
}

/// GET /bookings (admin, lead-guide)
pub async fn list_bookings(
    pool: web::Data<PgPool>,
    current_user: CurrentUser,
    query: web::Query<HashMap<String, String>>,
) -> Result<impl Responder, ApiError> {
    current_user.require_role(&[Role::Admin, Role::LeadGuide])?;

    let bookings = BookingService::list(pool.get_ref(), &query).await?;
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "results": bookings.len(),
        "data": bookings
    })))
}

/// POST /bookings (admin, lead-guide)
pub async fn create_booking(
    pool: web::Data<PgPool>,
    current_user: CurrentUser,
    body: web::Json<CreateBookingRequest>,
) -> Result<impl Responder, ApiError> {
    current_user.require_role(&[Role::Admin, Role::LeadGuide])?;

    let booking = BookingService::create(pool.get_ref(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(json!({ "status": "success", "data": booking })))
}

/// GET /bookings/{id} (admin, lead-guide)
pub async fn get_booking(
    pool: web::Data<PgPool>,
    current_user: CurrentUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    current_user.require_role(&[Role::Admin, Role::LeadGuide])?;

    let booking = BookingService::get(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "status": "success", "data": booking })))
}

/// PATCH /bookings/{id} (admin, lead-guide)
pub async fn update_booking(
    pool: web::Data<PgPool>,
    current_user: CurrentUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdateBookingRequest>,
) -> Result<impl Responder, ApiError> {
    current_user.require_role(&[Role::Admin, Role::LeadGuide])?;

    let booking =
        BookingService::update(pool.get_ref(), path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "status": "success", "data": booking })))
}

/// DELETE /bookings/{id} (admin, lead-guide)
pub async fn delete_booking(
    pool: web::Data<PgPool>,
    current_user: CurrentUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    current_user.require_role(&[Role::Admin, Role::LeadGuide])?;

    BookingService::delete(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Configuration for booking routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/bookings")
            .route("/checkout-session/{tour_id}", web::get().to(checkout_session))
            .route("/checkout-complete", web::get().to(checkout_complete))
            .route("/my-bookings", web::get().to(my_bookings))
            .route("", web::get().to(list_bookings))
            .route("", web::post().to(create_booking))
            .route("/{id}", web::get().to(get_booking))
            .route("/{id}", web::patch().to(update_booking))
            .route("/{id}", web::delete().to(delete_booking)),
    );
}
