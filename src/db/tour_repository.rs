// src/db/tour_repository.rs
// DOCUMENTATION: Database access layer for tours
// PURPOSE: All SQL for tour CRUD, aggregates and geospatial queries

use chrono::{DateTime, Utc};
use geo_types::Point;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::db::query::{ColumnSpec, ColumnType, QueryOptions, ResourceColumns};
use crate::errors::ApiError;
use crate::models::{
    slugify, CreateTourRequest, MonthlyPlanEntry, Tour, TourDistance, TourStats, UpdateTourRequest,
};

/// Filterable/sortable tour columns exposed to the query grammar
pub const TOUR_COLUMNS: ResourceColumns = ResourceColumns {
    columns: &[
        ColumnSpec {
            name: "name",
            column: "t.name",
            kind: ColumnType::Text,
        },
        ColumnSpec {
            name: "slug",
            column: "t.slug",
            kind: ColumnType::Text,
        },
        ColumnSpec {
            name: "duration_days",
            column: "t.duration_days",
            kind: ColumnType::Numeric,
        },
        ColumnSpec {
            name: "max_group_size",
            column: "t.max_group_size",
            kind: ColumnType::Numeric,
        },
        ColumnSpec {
            name: "difficulty",
            column: "t.difficulty",
            kind: ColumnType::Text,
        },
        ColumnSpec {
            name: "ratings_average",
            column: "t.ratings_average",
            kind: ColumnType::Numeric,
        },
        ColumnSpec {
            name: "ratings_quantity",
            column: "t.ratings_quantity",
            kind: ColumnType::Numeric,
        },
        ColumnSpec {
            name: "price",
            column: "t.price",
            kind: ColumnType::Numeric,
        },
        ColumnSpec {
            name: "price_discount",
            column: "t.price_discount",
            kind: ColumnType::Numeric,
        },
        ColumnSpec {
            name: "created_at",
            column: "t.created_at",
            kind: ColumnType::Text,
        },
    ],
    default_sort: "-created_at",
};

/// Internal struct for mapping database rows to the Tour model
/// Coordinates come from ST_X/ST_Y; guides and itinerary stops arrive as
/// json_agg payloads from the LATERAL joins
#[derive(Debug, FromRow)]
struct TourRow {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub duration_days: i32,
    pub max_group_size: i32,
    pub difficulty: String,
    pub ratings_average: f32,
    pub ratings_quantity: i32,
    pub price: f64,
    pub price_discount: Option<f64>,
    pub summary: Option<String>,
    pub description: String,
    pub image_cover: String,
    pub images: Vec<String>,
    pub start_dates: Vec<DateTime<Utc>>,
    pub secret: bool,
    pub longitude: f64, // From ST_X(start_location)
    pub latitude: f64,  // From ST_Y(start_location)
    pub start_address: Option<String>,
    pub start_description: Option<String>,
    pub guides: Option<serde_json::Value>,
    pub locations: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TourRow {
    fn into_tour(self) -> Tour {
        Tour {
            id: self.id,
            name: self.name,
            slug: self.slug,
            duration_days: self.duration_days,
            max_group_size: self.max_group_size,
            difficulty: self.difficulty,
            ratings_average: self.ratings_average,
            ratings_quantity: self.ratings_quantity,
            price: self.price,
            price_discount: self.price_discount,
            summary: self.summary,
            description: self.description,
            image_cover: self.image_cover,
            images: self.images,
            start_dates: self.start_dates,
            secret: self.secret,
            longitude: self.longitude,
            latitude: self.latitude,
            start_address: self.start_address,
            start_description: self.start_description,
            guides: self
                .guides
                .and_then(|v| serde_json::from_value(v).ok())
                .unwrap_or_default(),
            locations: self
                .locations
                .and_then(|v| serde_json::from_value(v).ok())
                .unwrap_or_default(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Base SELECT with coordinate extraction and guide/location embedding
const TOUR_SELECT: &str = r#"
    SELECT
        t.id, t.name, t.slug, t.duration_days, t.max_group_size, t.difficulty,
        t.ratings_average, t.ratings_quantity, t.price, t.price_discount,
        t.summary, t.description, t.image_cover, t.images, t.start_dates,
        t.secret,
        ST_X(t.start_location) as longitude,
        ST_Y(t.start_location) as latitude,
        t.start_address, t.start_description,
        g.guides as guides,
        l.locations as locations,
        t.created_at, t.updated_at
    FROM tours t
    LEFT JOIN LATERAL (
        SELECT json_agg(json_build_object(
            'id', u.id, 'name', u.name, 'photo', u.photo, 'role', u.role
        )) AS guides
        FROM tour_guides tg
        JOIN users u ON u.id = tg.user_id AND u.active = TRUE
        WHERE tg.tour_id = t.id
    ) g ON true
    LEFT JOIN LATERAL (
        SELECT json_agg(json_build_object(
            'longitude', ST_X(tl.location),
            'latitude', ST_Y(tl.location),
            'address', tl.address,
            'description', tl.description,
            'day', tl.day
        ) ORDER BY tl.day) AS locations
        FROM tour_locations tl
        WHERE tl.tour_id = t.id
    ) l ON true
"#;

/// TourRepository: All database operations for tours
/// Secret tours never leave the public read paths
pub struct TourRepository;

impl TourRepository {
    /// Create new tour with its itinerary stops and guide links
    pub async fn create_tour(pool: &PgPool, req: &CreateTourRequest) -> Result<Tour, ApiError> {
        let slug = slugify(&req.name);
        let mut tx = pool.begin().await?;

        let inserted: (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO tours (
                name, slug, duration_days, max_group_size, difficulty,
                price, price_discount, summary, description, image_cover,
                images, start_dates, secret, start_location,
                start_address, start_description, created_at, updated_at
            )
            VALUES (
                $1, $2, $3, $4, $5,
                $6, $7, $8, $9, $10,
                $11, $12, $13,
                ST_SetSRID(ST_MakePoint($14, $15), 4326),
                $16, $17, NOW(), NOW()
            )
            RETURNING id
            "#,
        )
        .bind(&req.name) // $1
        .bind(&slug) // $2
        .bind(req.duration_days) // $3
        .bind(req.max_group_size) // $4
        .bind(req.difficulty.as_str()) // $5
        .bind(req.price) // $6
        .bind(req.price_discount) // $7
        .bind(&req.summary) // $8
        .bind(&req.description) // $9
        .bind(&req.image_cover) // $10
        .bind(&req.images) // $11
        .bind(&req.start_dates) // $12
        .bind(req.secret) // $13
        .bind(req.start_location[0]) // $14 - longitude
        .bind(req.start_location[1]) // $15 - latitude
        .bind(&req.start_address) // $16
        .bind(&req.start_description) // $17
        .fetch_one(&mut *tx)
        .await?;

        for stop in &req.locations {
            sqlx::query(
                r#"
                INSERT INTO tour_locations (tour_id, location, address, description, day)
                VALUES ($1, ST_SetSRID(ST_MakePoint($2, $3), 4326), $4, $5, $6)
                "#,
            )
            .bind(inserted.0)
            .bind(stop.location[0])
            .bind(stop.location[1])
            .bind(&stop.address)
            .bind(&stop.description)
            .bind(stop.day)
            .execute(&mut *tx)
            .await?;
        }

        for guide_id in &req.guides {
            sqlx::query("INSERT INTO tour_guides (tour_id, user_id) VALUES ($1, $2)")
                .bind(inserted.0)
                .bind(guide_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        let tour = Self::get_by_id(pool, inserted.0).await?;
        log::info!("Created tour {} ({})", tour.name, tour.id);
        Ok(tour)
    }

    /// Retrieve tour by ID
    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Tour, ApiError> {
        let sql = format!("{} WHERE t.id = $1 AND t.secret = FALSE", TOUR_SELECT);
        let row = sqlx::query_as::<_, TourRow>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::NotFound("Tour".to_string()))?;

        Ok(row.into_tour())
    }

    /// Retrieve tour by slug (used by the public site URLs)
    pub async fn get_by_slug(pool: &PgPool, slug: &str) -> Result<Tour, ApiError> {
        let sql = format!("{} WHERE t.slug = $1 AND t.secret = FALSE", TOUR_SELECT);
        let row = sqlx::query_as::<_, TourRow>(&sql)
            .bind(slug)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::NotFound("Tour".to_string()))?;

        Ok(row.into_tour())
    }

    /// List tours through the shared query grammar
    pub async fn list(pool: &PgPool, opts: &QueryOptions) -> Result<Vec<Tour>, ApiError> {
        let mut where_clauses = vec!["t.secret = FALSE".to_string()];
        where_clauses.extend(opts.where_clauses());

        let sql = format!(
            "{} WHERE {} {} {}",
            TOUR_SELECT,
            where_clauses.join(" AND "),
            opts.order_by(),
            opts.limit_offset()
        );

        log::debug!("Executing tour list query: {}", sql);

        let rows = sqlx::query_as::<_, TourRow>(&sql).fetch_all(pool).await?;
        Ok(rows.into_iter().map(TourRow::into_tour).collect())
    }

    /// Partial update - only provided fields are modified
    /// Renaming regenerates the slug
    pub async fn update_tour(
        pool: &PgPool,
        id: Uuid,
        req: &UpdateTourRequest,
    ) -> Result<Tour, ApiError> {
        let slug = req.name.as_deref().map(slugify);

        let updated = sqlx::query_as::<_, (Uuid,)>(
            r#"
            UPDATE tours
            SET name = COALESCE($1, name),
                slug = COALESCE($2, slug),
                duration_days = COALESCE($3, duration_days),
                max_group_size = COALESCE($4, max_group_size),
                difficulty = COALESCE($5, difficulty),
                price = COALESCE($6, price),
                price_discount = COALESCE($7, price_discount),
                summary = COALESCE($8, summary),
                description = COALESCE($9, description),
                image_cover = COALESCE($10, image_cover),
                images = COALESCE($11, images),
                start_dates = COALESCE($12, start_dates),
                secret = COALESCE($13, secret),
                updated_at = NOW()
            WHERE id = $14
            RETURNING id
            "#,
        )
        .bind(&req.name)
        .bind(&slug)
        .bind(req.duration_days)
        .bind(req.max_group_size)
        .bind(req.difficulty.map(|d| d.as_str()))
        .bind(req.price)
        .bind(req.price_discount)
        .bind(&req.summary)
        .bind(&req.description)
        .bind(&req.image_cover)
        .bind(&req.images)
        .bind(&req.start_dates)
        .bind(req.secret)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Tour".to_string()))?;

        let tour = Self::get_by_id(pool, updated.0).await?;
        log::info!("Updated tour: {}", id);
        Ok(tour)
    }

    /// Store the processed upload filenames
    pub async fn update_images(
        pool: &PgPool,
        id: Uuid,
        image_cover: Option<&str>,
        images: &[String],
    ) -> Result<(), ApiError> {
        let rows = sqlx::query(
            r#"
            UPDATE tours
            SET image_cover = COALESCE($1, image_cover),
                images = CASE WHEN cardinality($2::text[]) > 0 THEN $2 ELSE images END,
                updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(image_cover)
        .bind(images)
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(ApiError::NotFound("Tour".to_string()));
        }
        Ok(())
    }

    /// Physical delete; dependent reviews/bookings cascade in the schema
    pub async fn delete_tour(pool: &PgPool, id: Uuid) -> Result<(), ApiError> {
        let rows = sqlx::query("DELETE FROM tours WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(ApiError::NotFound("Tour".to_string()));
        }

        log::info!("Deleted tour: {}", id);
        Ok(())
    }

    /// Tours whose departure point lies within radius_m of the center
    pub async fn find_within(
        pool: &PgPool,
        center: Point<f64>,
        radius_m: f64,
    ) -> Result<Vec<Tour>, ApiError> {
        let sql = format!(
            r#"{} WHERE t.secret = FALSE
               AND ST_DWithin(
                   t.start_location::geography,
                   ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography,
                   $3
               )"#,
            TOUR_SELECT
        );

        let rows = sqlx::query_as::<_, TourRow>(&sql)
            .bind(center.x())
            .bind(center.y())
            .bind(radius_m)
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(TourRow::into_tour).collect())
    }

    /// Distance from the point to every tour's departure point
    /// ST_Distance yields meters; the multiplier converts to km or miles
    pub async fn distances_from(
        pool: &PgPool,
        center: Point<f64>,
        multiplier: f64,
    ) -> Result<Vec<TourDistance>, ApiError> {
        let rows = sqlx::query_as::<_, TourDistance>(
            r#"
            SELECT
                t.id, t.name,
                ST_Distance(
                    t.start_location::geography,
                    ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography
                ) * $3 AS distance
            FROM tours t
            WHERE t.secret = FALSE
            ORDER BY distance ASC
            "#,
        )
        .bind(center.x())
        .bind(center.y())
        .bind(multiplier)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    /// Aggregate statistics grouped by difficulty, cheapest group first
    pub async fn stats(pool: &PgPool) -> Result<Vec<TourStats>, ApiError> {
        let rows = sqlx::query_as::<_, TourStats>(
            r#"
            SELECT
                UPPER(t.difficulty) AS difficulty,
                COUNT(*) AS num_tours,
                COALESCE(SUM(t.ratings_quantity), 0)::bigint AS num_ratings,
                COALESCE(AVG(t.ratings_average), 0)::double precision AS avg_rating,
                COALESCE(AVG(t.price), 0)::double precision AS avg_price,
                COALESCE(MIN(t.price), 0)::double precision AS min_price,
                COALESCE(MAX(t.price), 0)::double precision AS max_price
            FROM tours t
            WHERE t.secret = FALSE
            GROUP BY t.difficulty
            ORDER BY avg_price ASC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    /// Tour starts per month of the given year
    pub async fn monthly_plan(pool: &PgPool, year: i32) -> Result<Vec<MonthlyPlanEntry>, ApiError> {
        let rows = sqlx::query_as::<_, MonthlyPlanEntry>(
            r#"
            SELECT
                EXTRACT(MONTH FROM d.start_date)::int AS month,
                COUNT(*) AS num_tour_starts,
                array_agg(t.name) AS tours
            FROM tours t
            CROSS JOIN unnest(t.start_dates) AS d(start_date)
            WHERE t.secret = FALSE
              AND d.start_date >= make_timestamptz($1, 1, 1, 0, 0, 0)
              AND d.start_date < make_timestamptz($2, 1, 1, 0, 0, 0)
            GROUP BY month
            ORDER BY month ASC
            "#,
        )
        .bind(year)
        .bind(year + 1)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }
}
