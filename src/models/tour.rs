// src/models/tour.rs
// DOCUMENTATION: Core data structures for tours
// PURPOSE: Defines all serialization/deserialization models for API and database

use chrono::{DateTime, Utc};
use geojson::Geometry;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::ReviewResponse;

/// Tour difficulty levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Difficult,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Difficult => "difficult",
        }
    }
}

/// Guide embedded in tour reads (name, photo and role only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuideSummary {
    pub id: Uuid,
    pub name: String,
    pub photo: String,
    pub role: String,
}

/// One itinerary stop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourLocation {
    pub longitude: f64,
    pub latitude: f64,
    pub address: Option<String>,
    pub description: Option<String>,
    pub day: Option<i32>,
}

/// Represents a complete tour record from the database
/// Coordinates are extracted from the PostGIS point via ST_X/ST_Y;
/// guides and itinerary stops are aggregated by the repository
#[derive(Debug, Clone)]
pub struct Tour {
    pub id: Uuid,

    /// Unique display name, 10 to 40 characters
    pub name: String,

    /// URL-safe identifier derived from the name
    pub slug: String,

    pub duration_days: i32,

    pub max_group_size: i32,

    /// easy, medium or difficult
    pub difficulty: String,

    /// Derived from reviews; defaults to 4.5 until the first review lands
    pub ratings_average: f32,

    pub ratings_quantity: i32,

    pub price: f64,

    /// Always strictly below price when present
    pub price_discount: Option<f64>,

    pub summary: Option<String>,

    pub description: String,

    pub image_cover: String,

    pub images: Vec<String>,

    pub start_dates: Vec<DateTime<Utc>>,

    /// Secret tours are invisible to every public read
    pub secret: bool,

    /// Departure point (longitude, latitude)
    pub longitude: f64,
    pub latitude: f64,
    pub start_address: Option<String>,
    pub start_description: Option<String>,

    pub guides: Vec<GuideSummary>,

    pub locations: Vec<TourLocation>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// GeoJSON rendering of the departure point
#[derive(Debug, Serialize)]
pub struct StartLocationResponse {
    #[serde(flatten)]
    pub geometry: Geometry,
    pub address: Option<String>,
    pub description: Option<String>,
}

/// Response DTO for GET endpoints
#[derive(Debug, Serialize)]
pub struct TourResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub duration_days: i32,

    /// Convenience projection of duration_days / 7
    pub duration_weeks: f64,

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
    pub start_location: StartLocationResponse,
    pub guides: Vec<GuideSummary>,
    pub locations: Vec<TourLocation>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Extended response for GET /tours/{id}: the tour plus its reviews
#[derive(Debug, Serialize)]
pub struct TourDetailResponse {
    #[serde(flatten)]
    pub tour: TourResponse,
    pub reviews: Vec<ReviewResponse>,
}

impl Tour {
    pub fn to_response(&self) -> TourResponse {
        TourResponse {
            id: self.id,
            name: self.name.clone(),
            slug: self.slug.clone(),
            duration_days: self.duration_days,
            duration_weeks: f64::from(self.duration_days) / 7.0,
            max_group_size: self.max_group_size,
            difficulty: self.difficulty.clone(),
            ratings_average: self.ratings_average,
            ratings_quantity: self.ratings_quantity,
            price: self.price,
            price_discount: self.price_discount,
            summary: self.summary.clone(),
            description: self.description.clone(),
            image_cover: self.image_cover.clone(),
            images: self.images.clone(),
            start_dates: self.start_dates.clone(),
            start_location: StartLocationResponse {
                geometry: Geometry::new(geojson::Value::Point(vec![
                    self.longitude,
                    self.latitude,
                ])),
                address: self.start_address.clone(),
                description: self.start_description.clone(),
            },
            guides: self.guides.clone(),
            locations: self.locations.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Itinerary stop in create/update payloads: [longitude, latitude]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTourLocation {
    pub location: [f64; 2],
    pub address: Option<String>,
    pub description: Option<String>,
    pub day: Option<i32>,
}

/// Request DTO for POST /tours
/// The discount-below-price rule is cross-field, checked via
/// has_valid_discount() alongside validate()
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTourRequest {
    #[validate(length(
        min = 10,
        max = 40,
        message = "A tour name must have between 10 and 40 characters"
    ))]
    pub name: String,

    #[validate(range(min = 1, message = "A tour must have a duration"))]
    pub duration_days: i32,

    #[validate(range(min = 1, message = "A tour must have a group size"))]
    pub max_group_size: i32,

    pub difficulty: Difficulty,

    #[validate(range(min = 0.0, message = "A tour must have a price"))]
    pub price: f64,

    pub price_discount: Option<f64>,

    pub summary: Option<String>,

    #[validate(length(min = 1, message = "A tour must have a description"))]
    pub description: String,

    #[validate(length(min = 1, message = "A tour must have a cover image"))]
    pub image_cover: String,

    #[serde(default)]
    pub images: Vec<String>,

    #[serde(default)]
    pub start_dates: Vec<DateTime<Utc>>,

    #[serde(default)]
    pub secret: bool,

    /// Departure point [longitude, latitude]
    pub start_location: [f64; 2],

    pub start_address: Option<String>,

    pub start_description: Option<String>,

    #[serde(default)]
    pub locations: Vec<CreateTourLocation>,

    /// Guide user ids
    #[serde(default)]
    pub guides: Vec<Uuid>,
}

impl CreateTourRequest {
    /// Discounts must stay strictly below the regular price
    pub fn has_valid_discount(&self) -> bool {
        self.price_discount.map_or(true, |d| d < self.price)
    }
}

/// Request DTO for PATCH /tours/{id}
/// All fields optional - only provided fields are updated
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTourRequest {
    pub name: Option<String>,
    pub duration_days: Option<i32>,
    pub max_group_size: Option<i32>,
    pub difficulty: Option<Difficulty>,
    pub price: Option<f64>,
    pub price_discount: Option<f64>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub image_cover: Option<String>,
    pub images: Option<Vec<String>>,
    pub start_dates: Option<Vec<DateTime<Utc>>>,
    pub secret: Option<bool>,
}

/// Per-difficulty aggregate row for GET /tours/stats
#[derive(Debug, Serialize, FromRow)]
pub struct TourStats {
    pub difficulty: String,
    pub num_tours: i64,
    pub num_ratings: i64,
    pub avg_rating: f64,
    pub avg_price: f64,
    pub min_price: f64,
    pub max_price: f64,
}

/// One month of GET /tours/monthly-plan/{year}
#[derive(Debug, Serialize, FromRow)]
pub struct MonthlyPlanEntry {
    pub month: i32,
    pub num_tour_starts: i64,
    pub tours: Vec<String>,
}

/// Row for GET /tours/distances: distance from the query point
#[derive(Debug, Serialize, FromRow)]
pub struct TourDistance {
    pub id: Uuid,
    pub name: String,
    pub distance: f64,
}

/// Build a URL-safe slug from a tour name
pub fn slugify(name: &str) -> String {
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

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request() -> CreateTourRequest {
        CreateTourRequest {
            name: "The Forest Hiker".to_string(),
            duration_days: 5,
            max_group_size: 25,
            difficulty: Difficulty::Easy,
            price: 397.0,
            price_discount: None,
            summary: Some("Breathtaking hike through the Canadian Banff".to_string()),
            description: "A description long enough to pass validation".to_string(),
            image_cover: "tour-1-cover.jpg".to_string(),
            images: vec![],
            start_dates: vec![],
            secret: false,
            start_location: [-115.570154, 51.178456],
            start_address: Some("Banff, CAN".to_string()),
            start_description: None,
            locations: vec![],
            guides: vec![],
        }
    }

    #[test]
    fn slugify_normalizes_names() {
        assert_eq!(slugify("The Forest Hiker"), "the-forest-hiker");
        assert_eq!(slugify("  The   Snow  Adventurer! "), "the-snow-adventurer");
        assert_eq!(slugify("Tour #42: Fjords & Peaks"), "tour-42-fjords-peaks");
    }

    #[test]
    fn discount_must_be_below_price() {
        let mut req = sample_request();
        req.price_discount = Some(397.0);
        assert!(!req.has_valid_discount());

        req.price_discount = Some(100.0);
        assert!(req.has_valid_discount());

        req.price_discount = None;
        assert!(req.has_valid_discount());
    }

    #[test]
    fn name_length_is_enforced() {
        let mut req = sample_request();
        req.name = "Too short".to_string();
        assert!(req.validate().is_err());

        req.name = "x".repeat(41);
        assert!(req.validate().is_err());
    }

    #[test]
    fn difficulty_deserializes_lowercase() {
        let d: Difficulty = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(d, Difficulty::Medium);
        assert!(serde_json::from_str::<Difficulty>("\"extreme\"").is_err());
    }

    #[test]
    fn response_exposes_geojson_start_location() {
        let tour = Tour {
            id: Uuid::new_v4(),
            name: "The Forest Hiker".to_string(),
            slug: "the-forest-hiker".to_string(),
            duration_days: 7,
            max_group_size: 25,
            difficulty: "easy".to_string(),
            ratings_average: 4.5,
            ratings_quantity: 0,
            price: 397.0,
            price_discount: None,
            summary: None,
            description: "desc".to_string(),
            image_cover: "cover.jpg".to_string(),
            images: vec![],
            start_dates: vec![],
            secret: false,
            longitude: -115.57,
            latitude: 51.17,
            start_address: None,
            start_description: None,
            guides: vec![],
            locations: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(tour.to_response()).unwrap();
        assert_eq!(json["duration_weeks"], 1.0);
        assert_eq!(json["start_location"]["type"], "Point");
        assert_eq!(json["start_location"]["coordinates"][0], -115.57);
    }
}
