// src/db/review_repository.rs
// DOCUMENTATION: Review database operations
// PURPOSE: Review CRUD plus the ratings rollup written back to tours

use sqlx::PgPool;
use uuid::Uuid;

use crate::db::query::{ColumnSpec, ColumnType, QueryOptions, ResourceColumns};
use crate::errors::ApiError;
use crate::models::{CreateReviewRequest, Review, UpdateReviewRequest};

/// Filterable/sortable review columns exposed to the query grammar
pub const REVIEW_COLUMNS: ResourceColumns = ResourceColumns {
    columns: &[
        ColumnSpec {
            name: "rating",
            column: "r.rating",
            kind: ColumnType::Numeric,
        },
        ColumnSpec {
            name: "tour_id",
            column: "r.tour_id",
            kind: ColumnType::Text,
        },
        ColumnSpec {
            name: "user_id",
            column: "r.user_id",
            kind: ColumnType::Text,
        },
        ColumnSpec {
            name: "created_at",
            column: "r.created_at",
            kind: ColumnType::Text,
        },
    ],
    default_sort: "-created_at",
};

/// Base SELECT embedding the author's public fields
const REVIEW_SELECT: &str = r#"
    SELECT r.id, r.review, r.rating, r.tour_id, r.user_id,
           r.created_at, r.updated_at,
           u.name AS author_name, u.photo AS author_photo
    FROM reviews r
    LEFT JOIN users u ON u.id = r.user_id AND u.active = TRUE
"#;

pub struct ReviewRepository;

impl ReviewRepository {
    /// Create a new review
    /// The (tour_id, user_id) unique index keeps it to one review per user
    /// per tour; violations surface as 409
    pub async fn create_review(
        pool: &PgPool,
        tour_id: Uuid,
        user_id: Uuid,
        req: &CreateReviewRequest,
    ) -> Result<Review, ApiError> {
        let inserted: (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO reviews (review, rating, tour_id, user_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, NOW(), NOW())
            RETURNING id
            "#,
        )
        .bind(&req.review)
        .bind(req.rating)
        .bind(tour_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Self::calc_average_ratings(pool, tour_id).await?;

        Self::get_by_id(pool, inserted.0).await
    }

    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Review, ApiError> {
        let sql = format!("{} WHERE r.id = $1", REVIEW_SELECT);
        sqlx::query_as::<_, Review>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::NotFound("Review".to_string()))
    }

    /// List reviews through the shared query grammar
    pub async fn list(pool: &PgPool, opts: &QueryOptions) -> Result<Vec<Review>, ApiError> {
        let where_clauses = opts.where_clauses();
        let where_sql = if where_clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", where_clauses.join(" AND "))
        };

        let sql = format!(
            "{} {} {} {}",
            REVIEW_SELECT,
            where_sql,
            opts.order_by(),
            opts.limit_offset()
        );

        log::debug!("Executing review list query: {}", sql);

        let reviews = sqlx::query_as::<_, Review>(&sql).fetch_all(pool).await?;
        Ok(reviews)
    }

    /// All reviews of one tour, newest first
    pub async fn list_by_tour(pool: &PgPool, tour_id: Uuid) -> Result<Vec<Review>, ApiError> {
        let sql = format!(
            "{} WHERE r.tour_id = $1 ORDER BY r.created_at DESC",
            REVIEW_SELECT
        );
        let reviews = sqlx::query_as::<_, Review>(&sql)
            .bind(tour_id)
            .fetch_all(pool)
            .await?;

        Ok(reviews)
    }

    pub async fn update_review(
        pool: &PgPool,
        id: Uuid,
        req: &UpdateReviewRequest,
    ) -> Result<Review, ApiError> {
        let updated = sqlx::query_as::<_, (Uuid, Uuid)>(
            r#"
            UPDATE reviews
            SET review = COALESCE($1, review),
                rating = COALESCE($2, rating),
                updated_at = NOW()
            WHERE id = $3
            RETURNING id, tour_id
            "#,
        )
        .bind(&req.review)
        .bind(req.rating)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Review".to_string()))?;

        Self::calc_average_ratings(pool, updated.1).await?;

        Self::get_by_id(pool, updated.0).await
    }

    pub async fn delete_review(pool: &PgPool, id: Uuid) -> Result<(), ApiError> {
        let deleted = sqlx::query_as::<_, (Uuid,)>("DELETE FROM reviews WHERE id = $1 RETURNING tour_id")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::NotFound("Review".to_string()))?;

        Self::calc_average_ratings(pool, deleted.0).await?;

        log::info!("Deleted review: {}", id);
        Ok(())
    }

    /// Recompute the tour's ratings rollup from its reviews
    /// A tour with no reviews falls back to quantity 0 / average 4.5;
    /// the average is stored rounded to one decimal
    pub async fn calc_average_ratings(pool: &PgPool, tour_id: Uuid) -> Result<(), ApiError> {
        sqlx::query(
            r#"
            UPDATE tours
            SET ratings_quantity = stats.quantity,
                ratings_average = stats.average,
                updated_at = NOW()
            FROM (
                SELECT
                    COUNT(*)::int AS quantity,
                    COALESCE(ROUND(AVG(rating)::numeric, 1), 4.5)::real AS average
                FROM reviews
                WHERE tour_id = $1
            ) AS stats
            WHERE tours.id = $1
            "#,
        )
        .bind(tour_id)
        .execute(pool)
        .await?;

        Ok(())
    }
}
