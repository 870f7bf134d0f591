// src/db/booking_repository.rs
// DOCUMENTATION: Booking database operations

use sqlx::PgPool;
use uuid::Uuid;

use crate::db::query::{ColumnSpec, ColumnType, QueryOptions, ResourceColumns};
use crate::errors::ApiError;
use crate::models::{Booking, CreateBookingRequest, UpdateBookingRequest};

/// Filterable/sortable booking columns exposed to the query grammar
pub const BOOKING_COLUMNS: ResourceColumns = ResourceColumns {
    columns: &[
        ColumnSpec {
            name: "price",
            column: "b.price",
            kind: ColumnType::Numeric,
        },
        ColumnSpec {
            name: "paid",
            column: "b.paid",
            kind: ColumnType::Boolean,
        },
        ColumnSpec {
            name: "tour_id",
            column: "b.tour_id",
            kind: ColumnType::Text,
        },
        ColumnSpec {
            name: "user_id",
            column: "b.user_id",
            kind: ColumnType::Text,
        },
        ColumnSpec {
            name: "created_at",
            column: "b.created_at",
            kind: ColumnType::Text,
        },
    ],
    default_sort: "-created_at",
};

/// Base SELECT embedding the tour name
const BOOKING_SELECT: &str = r#"
    SELECT b.id, b.tour_id, b.user_id, b.price, b.paid, b.created_at,
           t.name AS tour_name
    FROM bookings b
    LEFT JOIN tours t ON t.id = b.tour_id
"#;

pub struct BookingRepository;

impl BookingRepository {
    pub async fn create_booking(
        pool: &PgPool,
        req: &CreateBookingRequest,
    ) -> Result<Booking, ApiError> {
        let inserted: (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO bookings (tour_id, user_id, price, paid, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING id
            "#,
        )
        .bind(req.tour_id)
        .bind(req.user_id)
        .bind(req.price)
        .bind(req.paid)
        .fetch_one(pool)
        .await?;

        log::info!(
            "Created booking {} (tour {}, user {})",
            inserted.0,
            req.tour_id,
            req.user_id
        );
        Self::get_by_id(pool, inserted.0).await
    }

    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Booking, ApiError> {
        let sql = format!("{} WHERE b.id = $1", BOOKING_SELECT);
        sqlx::query_as::<_, Booking>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::NotFound("Booking".to_string()))
    }

    /// List bookings through the shared query grammar
    pub async fn list(pool: &PgPool, opts: &QueryOptions) -> Result<Vec<Booking>, ApiError> {
        let where_clauses = opts.where_clauses();
        let where_sql = if where_clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", where_clauses.join(" AND "))
        };

        let sql = format!(
            "{} {} {} {}",
            BOOKING_SELECT,
            where_sql,
            opts.order_by(),
            opts.limit_offset()
        );

        log::debug!("Executing booking list query: {}", sql);

        let bookings = sqlx::query_as::<_, Booking>(&sql).fetch_all(pool).await?;
        Ok(bookings)
    }

    /// All bookings made by one user, newest first
    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Booking>, ApiError> {
        let sql = format!(
            "{} WHERE b.user_id = $1 ORDER BY b.created_at DESC",
            BOOKING_SELECT
        );
        let bookings = sqlx::query_as::<_, Booking>(&sql)
            .bind(user_id)
            .fetch_all(pool)
            .await?;

        Ok(bookings)
    }

    pub async fn update_booking(
        pool: &PgPool,
        id: Uuid,
        req: &UpdateBookingRequest,
    ) -> Result<Booking, ApiError> {
        let updated = sqlx::query_as::<_, (Uuid,)>(
            r#"
            UPDATE bookings
            SET price = COALESCE($1, price),
                paid = COALESCE($2, paid)
            WHERE id = $3
            RETURNING id
            "#,
        )
        .bind(req.price)
        .bind(req.paid)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Booking".to_string()))?;

        Self::get_by_id(pool, updated.0).await
    }

    pub async fn delete_booking(pool: &PgPool, id: Uuid) -> Result<(), ApiError> {
        let rows = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(ApiError::NotFound("Booking".to_string()));
        }

        log::info!("Deleted booking: {}", id);
        Ok(())
    }
}
