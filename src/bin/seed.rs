// src/bin/seed.rs
// Development data loader: imports dev-data/*.json straight into the
// database, or wipes it with --delete. Intentionally self-contained so it
// can run against any environment that has DATABASE_URL set.
//
//   cargo run --bin seed            # import dev-data/
//   cargo run --bin seed -- --delete

use anyhow::{bail, Context, Result};
use argon2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Utc};
use dotenv::dotenv;
use serde::Deserialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::env;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct SeedUser {
    name: String,
    email: String,
    password: String,
    #[serde(default = "default_role")]
    role: String,
    #[serde(default)]
    photo: Option<String>,
}

fn default_role() -> String {
    "user".to_string()
}

#[derive(Debug, Deserialize)]
struct SeedLocation {
    location: [f64; 2],
    address: Option<String>,
    description: Option<String>,
    day: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct SeedTour {
    name: String,
    duration_days: i32,
    max_group_size: i32,
    difficulty: String,
    price: f64,
    #[serde(default)]
    price_discount: Option<f64>,
    #[serde(default)]
    summary: Option<String>,
    description: String,
    image_cover: String,
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    start_dates: Vec<DateTime<Utc>>,
    start_location: [f64; 2],
    #[serde(default)]
    start_address: Option<String>,
    #[serde(default)]
    start_description: Option<String>,
    #[serde(default)]
    locations: Vec<SeedLocation>,
    /// Guide accounts referenced by email
    #[serde(default)]
    guides: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SeedReview {
    /// Tour referenced by name
    tour: String,
    /// Author referenced by email
    user: String,
    review: String,
    rating: f32,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let database_url =
        env::var("DATABASE_URL").context("DATABASE_URL is required to run the seeder")?;

    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect(&database_url)
        .await
        .context("Could not connect to the database")?;

    let args: Vec<String> = env::args().skip(1).collect();
    if args.iter().any(|a| a == "--delete") {
        delete_all(&pool).await?;
        log::info!("All data deleted");
        return Ok(());
    }

    let data_dir = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .cloned()
        .unwrap_or_else(|| "dev-data".to_string());

    import_all(&pool, &data_dir).await?;
    log::info!("Dev data imported from {}/", data_dir);
    Ok(())
}

async fn delete_all(pool: &PgPool) -> Result<()> {
    for table in ["reviews", "bookings", "tour_guides", "tour_locations", "tours", "users"] {
        sqlx::query(&format!("DELETE FROM {}", table))
            .execute(pool)
            .await
            .with_context(|| format!("Failed to clear {}", table))?;
    }
    Ok(())
}

fn load<T: serde::de::DeserializeOwned>(dir: &str, file: &str) -> Result<Vec<T>> {
    let path = format!("{}/{}", dir, file);
    let raw = std::fs::read_to_string(&path).with_context(|| format!("Cannot read {}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("Cannot parse {}", path))
}

async fn import_all(pool: &PgPool, dir: &str) -> Result<()> {
    let users: Vec<SeedUser> = load(dir, "users.json")?;
    let tours: Vec<SeedTour> = load(dir, "tours.json")?;
    let reviews: Vec<SeedReview> = load(dir, "reviews.json")?;

    for user in &users {
        insert_user(pool, user).await?;
    }
    log::info!("Imported {} users", users.len());

    for tour in &tours {
        insert_tour(pool, tour).await?;
    }
    log::info!("Imported {} tours", tours.len());

    for review in &reviews {
        insert_review(pool, review).await?;
    }
    log::info!("Imported {} reviews", reviews.len());

    Ok(())
}

async fn insert_user(pool: &PgPool, user: &SeedUser) -> Result<()> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(user.password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Hashing failed for {}: {}", user.email, e))?
        .to_string();

    sqlx::query(
        r#"
        INSERT INTO users (name, email, photo, role, password_hash)
        VALUES ($1, LOWER($2), COALESCE($3, 'default.jpg'), $4, $5)
        ON CONFLICT (email) DO NOTHING
        "#,
    )
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.photo)
    .bind(&user.role)
    .bind(&password_hash)
    .execute(pool)
    .await
    .with_context(|| format!("Failed to insert user {}", user.email))?;

    Ok(())
}

async fn insert_tour(pool: &PgPool, tour: &SeedTour) -> Result<()> {
    let slug = slugify(&tour.name);

    let inserted: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO tours (
            name, slug, duration_days, max_group_size, difficulty,
            price, price_discount, summary, description, image_cover,
            images, start_dates, start_location, start_address, start_description
        )
        VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
            ST_SetSRID(ST_MakePoint($13, $14), 4326), $15, $16
        )
        RETURNING id
        "#,
    )
    .bind(&tour.name)
    .bind(&slug)
    .bind(tour.duration_days)
    .bind(tour.max_group_size)
    .bind(&tour.difficulty)
    .bind(tour.price)
    .bind(tour.price_discount)
    .bind(&tour.summary)
    .bind(&tour.description)
    .bind(&tour.image_cover)
    .bind(&tour.images)
    .bind(&tour.start_dates)
    .bind(tour.start_location[0])
    .bind(tour.start_location[1])
    .bind(&tour.start_address)
    .bind(&tour.start_description)
    .fetch_one(pool)
    .await
    .with_context(|| format!("Failed to insert tour {}", tour.name))?;

    for stop in &tour.locations {
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
        .execute(pool)
        .await?;
    }

    for guide_email in &tour.guides {
        let guide = user_id_by_email(pool, guide_email).await?;
        sqlx::query("INSERT INTO tour_guides (tour_id, user_id) VALUES ($1, $2)")
            .bind(inserted.0)
            .bind(guide)
            .execute(pool)
            .await?;
    }

    Ok(())
}

async fn insert_review(pool: &PgPool, review: &SeedReview) -> Result<()> {
    let tour_id: (Uuid,) = sqlx::query_as("SELECT id FROM tours WHERE name = $1")
        .bind(&review.tour)
        .fetch_optional(pool)
        .await?
        .with_context(|| format!("Review references unknown tour '{}'", review.tour))?;

    let user_id = user_id_by_email(pool, &review.user).await?;

    sqlx::query(
        r#"
        INSERT INTO reviews (review, rating, tour_id, user_id)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (tour_id, user_id) DO NOTHING
        "#,
    )
    .bind(&review.review)
    .bind(review.rating)
    .bind(tour_id.0)
    .bind(user_id)
    .execute(pool)
    .await?;

    // Keep the tour rollup in sync with what was just loaded
    sqlx::query(
        r#"
        UPDATE tours
        SET ratings_quantity = stats.quantity,
            ratings_average = stats.average
        FROM (
            SELECT COUNT(*)::int AS quantity,
                   COALESCE(ROUND(AVG(rating)::numeric, 1), 4.5)::real AS average
            FROM reviews WHERE tour_id = $1
        ) AS stats
        WHERE tours.id = $1
        "#,
    )
    .bind(tour_id.0)
    .execute(pool)
    .await?;

    Ok(())
}

async fn user_id_by_email(pool: &PgPool, email: &str) -> Result<Uuid> {
    let row: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = LOWER($1)")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    match row {
        Some((id,)) => Ok(id),
        None => bail!("No user with email {}", email),
    }
}

fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
