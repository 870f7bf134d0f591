// src/services/review_service.rs
// DOCUMENTATION: Business logic for reviews

use serde_json::Value;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use crate::db::query::QueryOptions;
use crate::db::{ReviewRepository, TourRepository, REVIEW_COLUMNS};
use crate::errors::ApiError;
use crate::models::{CreateReviewRequest, ReviewResponse, Role, UpdateReviewRequest, User};

pub struct ReviewService;

impl ReviewService {
    /// List reviews through the shared query grammar, with projection
    pub async fn list(
        pool: &PgPool,
        params: &HashMap<String, String>,
    ) -> Result<Vec<Value>, ApiError> {
        let opts = QueryOptions::from_params(params, &REVIEW_COLUMNS)?;
        let reviews = ReviewRepository::list(pool, &opts).await?;

        let mut items = Vec::with_capacity(reviews.len());
        for review in &reviews {
            let value =
                serde_json::to_value(review.to_response()).map_err(|_| ApiError::InternalError)?;
            items.push(opts.project(value));
        }
        Ok(items)
    }

    pub async fn list_for_tour(
        pool: &PgPool,
        tour_id: Uuid,
    ) -> Result<Vec<ReviewResponse>, ApiError> {
        let reviews = ReviewRepository::list_by_tour(pool, tour_id).await?;
        Ok(reviews.iter().map(|r| r.to_response()).collect())
    }

    pub async fn get(pool: &PgPool, id: Uuid) -> Result<ReviewResponse, ApiError> {
        Ok(ReviewRepository::get_by_id(pool, id).await?.to_response())
    }

    /// Create a review; the tour may come from the nested route or the body,
    /// the author is always the caller
    pub async fn create(
        pool: &PgPool,
        tour_id: Option<Uuid>,
        author: &User,
        req: CreateReviewRequest,
    ) -> Result<ReviewResponse, ApiError> {
        req.validate()?;

        let tour_id = tour_id.or(req.tour_id).ok_or_else(|| {
            ApiError::InvalidInput("A review must belong to a tour".to_string())
        })?;

        // 404 for unknown tours instead of a foreign-key 500
        let _ = TourRepository::get_by_id(pool, tour_id).await?;

        let review = ReviewRepository::create_review(pool, tour_id, author.id, &req).await?;
        Ok(review.to_response())
    }

    /// Update a review; only the author or an admin may touch it
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        caller: &User,
        req: UpdateReviewRequest,
    ) -> Result<ReviewResponse, ApiError> {
        req.validate()?;

        let existing = ReviewRepository::get_by_id(pool, id).await?;
        if existing.user_id != caller.id && caller.role() != Role::Admin {
            return Err(ApiError::Forbidden);
        }

        let review = ReviewRepository::update_review(pool, id, &req).await?;
        Ok(review.to_response())
    }

    /// Delete a review; same ownership rule as update
    pub async fn delete(pool: &PgPool, id: Uuid, caller: &User) -> Result<(), ApiError> {
        let existing = ReviewRepository::get_by_id(pool, id).await?;
        if existing.user_id != caller.id && caller.role() != Role::Admin {
            return Err(ApiError::Forbidden);
        }

        ReviewRepository::delete_review(pool, id).await
    }
}
