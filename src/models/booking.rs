// src/models/booking.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Paid (or comped) reservation of a tour by a user
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub tour_id: Uuid,
    pub user_id: Uuid,
    /// Price at booking time; the tour price may change later
    pub price: f64,
    pub paid: bool,
    pub created_at: DateTime<Utc>,
    /// Joined from tours on read
    #[sqlx(default)]
    pub tour_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingRequest {
    pub tour_id: Uuid,
    pub user_id: Uuid,
    pub price: f64,
    #[serde(default = "default_paid")]
    pub paid: bool,
}

fn default_paid() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateBookingRequest {
    pub price: Option<f64>,
    pub paid: Option<bool>,
}

/// Query params on the checkout success redirect
#[derive(Debug, Deserialize)]
pub struct CheckoutCompleteQuery {
    pub tour: Option<Uuid>,
    pub user: Option<Uuid>,
    pub price: Option<f64>,
}

/// Booking response DTO
#[derive(Debug, Clone, Serialize)]
pub struct BookingResponse {
    pub id: Uuid,
    pub tour_id: Uuid,
    pub tour_name: Option<String>,
    pub user_id: Uuid,
    pub price: f64,
    pub paid: bool,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn to_response(&self) -> BookingResponse {
        BookingResponse {
            id: self.id,
            tour_id: self.tour_id,
            tour_name: self.tour_name.clone(),
            user_id: self.user_id,
            price: self.price,
            paid: self.paid,
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paid_defaults_to_true() {
        let req: CreateBookingRequest = serde_json::from_value(serde_json::json!({
            "tour_id": Uuid::new_v4(),
            "user_id": Uuid::new_v4(),
            "price": 497.0
        }))
        .unwrap();
        assert!(req.paid);
    }
}
