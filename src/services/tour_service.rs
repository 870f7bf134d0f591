// src/services/tour_service.rs
// DOCUMENTATION: Business logic for tours
// PURPOSE: Intermediary between handlers and repository, handles extra logic

use actix_multipart::Multipart;
use chrono::Utc;
use geo_types::Point;
use serde_json::Value;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::config::Config;
use crate::db::query::QueryOptions;
use crate::db::{ReviewRepository, TourRepository, TOUR_COLUMNS};
use crate::errors::ApiError;
use crate::models::{
    CreateTourRequest, TourDetailResponse, TourDistance, TourResponse, UpdateTourRequest,
};
use crate::services::cache::AggregateCache;
use crate::services::media;

/// Meters per statute mile / kilometer
const METERS_PER_MILE: f64 = 1609.34;
const METERS_PER_KM: f64 = 1000.0;

pub struct TourService;

impl TourService {
    /// List tours through the shared query grammar, with projection applied
    pub async fn list(
        pool: &PgPool,
        params: &HashMap<String, String>,
    ) -> Result<Vec<Value>, ApiError> {
        let opts = QueryOptions::from_params(params, &TOUR_COLUMNS)?;
        let tours = TourRepository::list(pool, &opts).await?;

        let mut items = Vec::with_capacity(tours.len());
        for tour in &tours {
            let value =
                serde_json::to_value(tour.to_response()).map_err(|_| ApiError::InternalError)?;
            items.push(opts.project(value));
        }
        Ok(items)
    }

    /// Get a tour by UUID or slug, with its reviews embedded
    pub async fn get_detail(
        pool: &PgPool,
        identifier: &str,
    ) -> Result<TourDetailResponse, ApiError> {
        // Try to parse as UUID first; anything else is treated as a slug
        let tour = if let Ok(uuid) = Uuid::parse_str(identifier) {
            TourRepository::get_by_id(pool, uuid).await?
        } else {
            TourRepository::get_by_slug(pool, identifier).await?
        };

        let reviews = ReviewRepository::list_by_tour(pool, tour.id).await?;

        Ok(TourDetailResponse {
            tour: tour.to_response(),
            reviews: reviews.iter().map(|r| r.to_response()).collect(),
        })
    }

    pub async fn create_tour(
        pool: &PgPool,
        cache: &AggregateCache,
        req: CreateTourRequest,
    ) -> Result<TourResponse, ApiError> {
        if !req.has_valid_discount() {
            return Err(ApiError::ValidationError(
                "The price_discount should be below the regular price".to_string(),
            ));
        }

        let tour = TourRepository::create_tour(pool, &req).await?;
        Self::invalidate_aggregates(cache).await;
        Ok(tour.to_response())
    }

    pub async fn update_tour(
        pool: &PgPool,
        cache: &AggregateCache,
        id: Uuid,
        req: UpdateTourRequest,
    ) -> Result<TourResponse, ApiError> {
        let tour = TourRepository::update_tour(pool, id, &req).await?;
        Self::invalidate_aggregates(cache).await;
        Ok(tour.to_response())
    }

    pub async fn delete_tour(
        pool: &PgPool,
        cache: &AggregateCache,
        id: Uuid,
    ) -> Result<(), ApiError> {
        TourRepository::delete_tour(pool, id).await?;
        Self::invalidate_aggregates(cache).await;
        Ok(())
    }

    async fn invalidate_aggregates(cache: &AggregateCache) {
        cache.invalidate_prefix("tour-stats").await;
        cache.invalidate_prefix("monthly-plan:").await;
    }

    /// Per-difficulty aggregate, cached
    pub async fn stats(pool: &PgPool, cache: &AggregateCache) -> Result<Value, ApiError> {
        if let Some(cached) = cache.get("tour-stats").await {
            return Ok(cached);
        }

        let stats = TourRepository::stats(pool).await?;
        let value = serde_json::to_value(stats).map_err(|_| ApiError::InternalError)?;
        cache.set("tour-stats".to_string(), value.clone()).await;
        Ok(value)
    }

    /// Busiest-month breakdown for one year, cached
    pub async fn monthly_plan(
        pool: &PgPool,
        cache: &AggregateCache,
        year: i32,
    ) -> Result<Value, ApiError> {
        let key = format!("monthly-plan:{}", year);
        if let Some(cached) = cache.get(&key).await {
            return Ok(cached);
        }

        let plan = TourRepository::monthly_plan(pool, year).await?;
        let value = serde_json::to_value(plan).map_err(|_| ApiError::InternalError)?;
        cache.set(key, value.clone()).await;
        Ok(value)
    }

    /// Tours starting within `distance` of the lat,lng center
    pub async fn tours_within(
        pool: &PgPool,
        distance: f64,
        latlng: &str,
        unit: &str,
    ) -> Result<Vec<TourResponse>, ApiError> {
        let center = parse_latlng(latlng)?;
        let radius_m = distance * meters_per_unit(unit);

        let tours = TourRepository::find_within(pool, center, radius_m).await?;
        Ok(tours.iter().map(|t| t.to_response()).collect())
    }

    /// Distance from the lat,lng point to every tour start
    pub async fn distances(
        pool: &PgPool,
        latlng: &str,
        unit: &str,
    ) -> Result<Vec<TourDistance>, ApiError> {
        let center = parse_latlng(latlng)?;
        let multiplier = 1.0 / meters_per_unit(unit);

        TourRepository::distances_from(pool, center, multiplier).await
    }

    /// Process a multipart upload of one cover and up to three gallery images
    pub async fn upload_images(
        pool: &PgPool,
        config: &Config,
        id: Uuid,
        payload: Multipart,
    ) -> Result<Vec<String>, ApiError> {
        // Fails early with 404 before any image work
        let _ = TourRepository::get_by_id(pool, id).await?;

        let uploads = media::collect_images(payload).await?;
        if uploads.is_empty() {
            return Err(ApiError::InvalidInput("No images in upload".to_string()));
        }

        let dir = format!("{}/img/tours", config.upload_dir);
        let stamp = Utc::now().timestamp_millis();

        let mut cover: Option<String> = None;
        let mut gallery: Vec<String> = Vec::new();

        for upload in &uploads {
            let (w, h) = media::TOUR_IMAGE_SIZE;
            let jpeg = media::resize_to_jpeg(&upload.data, w, h)?;

            let filename = if upload.field_name == "image_cover" {
                format!("tour-{}-{}-cover.jpeg", id, stamp)
            } else {
                if gallery.len() >= 3 {
                    return Err(ApiError::InvalidInput(
                        "A tour accepts at most 3 gallery images".to_string(),
                    ));
                }
                format!("tour-{}-{}-{}.jpeg", id, stamp, gallery.len() + 1)
            };

            media::save_image(&dir, &filename, &jpeg).await?;

            if upload.field_name == "image_cover" {
                cover = Some(filename);
            } else {
                gallery.push(filename);
            }
        }

        TourRepository::update_images(pool, id, cover.as_deref(), &gallery).await?;

        let mut stored: Vec<String> = cover.into_iter().collect();
        stored.extend(gallery);
        Ok(stored)
    }
}

/// Parse "lat,lng" path segments
fn parse_latlng(latlng: &str) -> Result<Point<f64>, ApiError> {
    let invalid = || {
        ApiError::InvalidInput(
            "Please provide latitude and longitude in the format lat,lng".to_string(),
        )
    };

    let mut parts = latlng.split(',');
    let lat: f64 = parts
        .next()
        .and_then(|p| p.trim().parse().ok())
        .ok_or_else(invalid)?;
    let lng: f64 = parts
        .next()
        .and_then(|p| p.trim().parse().ok())
        .ok_or_else(invalid)?;

    if parts.next().is_some() || !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng)
    {
        return Err(invalid());
    }

    // Points are (x, y) = (longitude, latitude)
    Ok(Point::new(lng, lat))
}

fn meters_per_unit(unit: &str) -> f64 {
    if unit == "mi" {
        METERS_PER_MILE
    } else {
        METERS_PER_KM
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_latlng_pairs() {
        let point = parse_latlng("34.111745,-118.113491").unwrap();
        assert!((point.y() - 34.111745).abs() < 1e-9);
        assert!((point.x() + 118.113491).abs() < 1e-9);
    }

    #[test]
    fn rejects_malformed_latlng() {
        assert!(parse_latlng("34.111745").is_err());
        assert!(parse_latlng("lat,lng").is_err());
        assert!(parse_latlng("1,2,3").is_err());
        assert!(parse_latlng("95.0,10.0").is_err());
        assert!(parse_latlng("10.0,200.0").is_err());
    }

    #[test]
    fn unit_conversion_defaults_to_km() {
        assert_eq!(meters_per_unit("mi"), METERS_PER_MILE);
        assert_eq!(meters_per_unit("km"), METERS_PER_KM);
        assert_eq!(meters_per_unit("furlongs"), METERS_PER_KM);
    }
}
