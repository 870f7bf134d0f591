// src/models/review.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Tour review; one per (tour, user) pair
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub review: String,
    pub rating: f32,
    pub tour_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Author fields joined from users on read
    #[sqlx(default)]
    pub author_name: Option<String>,
    #[sqlx(default)]
    pub author_photo: Option<String>,
}

/// Request to create a new review
/// tour_id may come from the nested route instead of the body;
/// the author is always the authenticated user
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateReviewRequest {
    #[validate(length(min = 1, message = "Review cannot be empty"))]
    pub review: String,

    #[validate(range(min = 1.0, max = 5.0, message = "Rating must be between 1 and 5"))]
    pub rating: f32,

    pub tour_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateReviewRequest {
    #[validate(length(min = 1, message = "Review cannot be empty"))]
    pub review: Option<String>,

    #[validate(range(min = 1.0, max = 5.0, message = "Rating must be between 1 and 5"))]
    pub rating: Option<f32>,
}

/// Embedded author in review reads
#[derive(Debug, Clone, Serialize)]
pub struct ReviewAuthor {
    pub id: Uuid,
    pub name: String,
    pub photo: String,
}

/// Review response DTO exposed via API
#[derive(Debug, Clone, Serialize)]
pub struct ReviewResponse {
    pub id: Uuid,
    pub review: String,
    pub rating: f32,
    pub tour_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub user: ReviewAuthor,
}

impl Review {
    /// Convert database Review into API response
    pub fn to_response(&self) -> ReviewResponse {
        ReviewResponse {
            id: self.id,
            review: self.review.clone(),
            rating: self.rating,
            tour_id: self.tour_id,
            created_at: self.created_at,
            user: ReviewAuthor {
                id: self.user_id,
                name: self.author_name.clone().unwrap_or_default(),
                photo: self
                    .author_photo
                    .clone()
                    .unwrap_or_else(|| "default.jpg".to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_bounds_are_enforced() {
        let mut req = CreateReviewRequest {
            review: "Loved it".to_string(),
            rating: 5.0,
            tour_id: None,
        };
        assert!(req.validate().is_ok());

        req.rating = 0.5;
        assert!(req.validate().is_err());

        req.rating = 5.5;
        assert!(req.validate().is_err());
    }

    #[test]
    fn empty_review_is_rejected() {
        let req = CreateReviewRequest {
            review: String::new(),
            rating: 4.0,
            tour_id: None,
        };
        assert!(req.validate().is_err());
    }
}
