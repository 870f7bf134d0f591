// src/services/booking_service.rs
// DOCUMENTATION: Business logic for bookings and checkout

use serde_json::Value;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::config::Config;
use crate::db::query::QueryOptions;
use crate::db::{BookingRepository, TourRepository, BOOKING_COLUMNS};
use crate::errors::ApiError;
use crate::models::{
    BookingResponse, CheckoutCompleteQuery, CreateBookingRequest, UpdateBookingRequest, User,
};
use crate::services::payment_client::{CheckoutParams, PaymentClient};

pub struct BookingService;

impl BookingService {
    /// Create a hosted checkout session for the tour
    /// The success URL carries tour/user/price back to checkout-complete
    pub async fn checkout_session(
        pool: &PgPool,
        payment: &PaymentClient,
        config: &Config,
        tour_id: Uuid,
        user: &User,
    ) -> Result<Value, ApiError> {
        let tour = TourRepository::get_by_id(pool, tour_id).await?;

        let success_url = format!(
            "{}/api/v1/bookings/checkout-complete?tour={}&user={}&price={}",
            config.public_url, tour.id, user.id, tour.price
        );
        let cancel_url = format!("{}/tours/{}", config.public_url, tour.slug);

        let params = CheckoutParams {
            tour: &tour,
            customer_email: &user.email,
            success_url,
            cancel_url,
        };

        payment.create_checkout_session(&params).await
    }

    /// Create the booking from the success-redirect query params
    pub async fn checkout_complete(
        pool: &PgPool,
        query: CheckoutCompleteQuery,
    ) -> Result<BookingResponse, ApiError> {
        let (tour_id, user_id, price) = match (query.tour, query.user, query.price) {
            (Some(tour), Some(user), Some(price)) => (tour, user, price),
            _ => {
                return Err(ApiError::InvalidInput(
                    "Checkout redirect is missing tour, user or price".to_string(),
                ))
            }
        };

        let booking = BookingRepository::create_booking(
            pool,
            &CreateBookingRequest {
                tour_id,
                user_id,
                price,
                paid: true,
            },
        )
        .await?;

        Ok(booking.to_response())
    }

    /// List bookings through the shared query grammar, with projection
    pub async fn list(
        pool: &PgPool,
        params: &HashMap<String, String>,
    ) -> Result<Vec<Value>, ApiError> {
        let opts = QueryOptions::from_params(params, &BOOKING_COLUMNS)?;
        let bookings = BookingRepository::list(pool, &opts).await?;

        let mut items = Vec::with_capacity(bookings.len());
        for booking in &bookings {
            let value =
                serde_json::to_value(booking.to_response()).map_err(|_| ApiError::InternalError)?;
            items.push(opts.project(value));
        }
        Ok(items)
    }

    pub async fn my_bookings(pool: &PgPool, user_id: Uuid) -> Result<Vec<BookingResponse>, ApiError> {
        let bookings = BookingRepository::list_by_user(pool, user_id).await?;
        Ok(bookings.iter().map(|b| b.to_response()).collect())
    }

    pub async fn get(pool: &PgPool, id: Uuid) -> Result<BookingResponse, ApiError> {
        Ok(BookingRepository::get_by_id(pool, id).await?.to_response())
    }

    pub async fn create(
        pool: &PgPool,
        req: CreateBookingRequest,
    ) -> Result<BookingResponse, ApiError> {
        // Surface a 404 for unknown tours before the insert
        let _ = TourRepository::get_by_id(pool, req.tour_id).await?;

        let booking = BookingRepository::create_booking(pool, &req).await?;
        Ok(booking.to_response())
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        req: UpdateBookingRequest,
    ) -> Result<BookingResponse, ApiError> {
        let booking = BookingRepository::update_booking(pool, id, &req).await?;
        Ok(booking.to_response())
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), ApiError> {
        BookingRepository::delete_booking(pool, id).await
    }
}
