// src/services/payment_client.rs
// DOCUMENTATION: Payment checkout provider client
// PURPOSE: Create hosted checkout sessions for tour purchases
//
// The provider speaks a form-encoded API (Stripe-compatible); the session
// object comes back as JSON and is passed through to the client untouched.

use reqwest::Client;

use crate::config::Config;
use crate::errors::ApiError;
use crate::models::Tour;

/// Everything the provider needs to build a hosted checkout page
#[derive(Debug)]
pub struct CheckoutParams<'a> {
    pub tour: &'a Tour,
    pub customer_email: &'a str,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Clone)]
pub struct PaymentClient {
    client: Client,
    api_url: String,
    secret_key: String,
}

impl PaymentClient {
    pub fn from_config(config: &Config) -> Self {
        Self {
            client: Client::new(),
            api_url: config.payment_api_url.clone(),
            secret_key: config.payment_secret_key.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.secret_key.is_empty()
    }

    /// Create a checkout session and return the provider's session object
    pub async fn create_checkout_session(
        &self,
        params: &CheckoutParams<'_>,
    ) -> Result<serde_json::Value, ApiError> {
        if !self.is_configured() {
            return Err(ApiError::InvalidInput(
                "Payment provider is not configured".to_string(),
            ));
        }

        let form = build_session_form(params);

        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.api_url))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                log::error!("Checkout session request failed: {}", e);
                ApiError::ExternalApiError("Could not create checkout session".to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            log::error!("Payment provider returned {}: {}", status, body);
            return Err(ApiError::ExternalApiError(
                "Could not create checkout session".to_string(),
            ));
        }

        response.json().await.map_err(|e| {
            log::error!("Malformed checkout session response: {}", e);
            ApiError::ExternalApiError("Could not create checkout session".to_string())
        })
    }
}

/// Session form fields: one card line item priced in cents
fn build_session_form(params: &CheckoutParams<'_>) -> Vec<(String, String)> {
    let tour = params.tour;
    let amount_cents = (tour.price * 100.0).round() as i64;

    vec![
        ("mode".to_string(), "payment".to_string()),
        (
            "payment_method_types[0]".to_string(),
            "card".to_string(),
        ),
        ("success_url".to_string(), params.success_url.clone()),
        ("cancel_url".to_string(), params.cancel_url.clone()),
        (
            "customer_email".to_string(),
            params.customer_email.to_string(),
        ),
        ("client_reference_id".to_string(), tour.id.to_string()),
        (
            "line_items[0][price_data][currency]".to_string(),
            "usd".to_string(),
        ),
        (
            "line_items[0][price_data][product_data][name]".to_string(),
            format!("{} Tour", tour.name),
        ),
        (
            "line_items[0][price_data][product_data][description]".to_string(),
            tour.summary.clone().unwrap_or_default(),
        ),
        (
            "line_items[0][price_data][unit_amount]".to_string(),
            amount_cents.to_string(),
        ),
        ("line_items[0][quantity]".to_string(), "1".to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_tour() -> Tour {
        Tour {
            id: Uuid::new_v4(),
            name: "The Sea Explorer".to_string(),
            slug: "the-sea-explorer".to_string(),
            duration_days: 7,
            max_group_size: 15,
            difficulty: "medium".to_string(),
            ratings_average: 4.8,
            ratings_quantity: 23,
            price: 497.0,
            price_discount: None,
            summary: Some("Exploring the jaw-dropping US east coast".to_string()),
            description: "desc".to_string(),
            image_cover: "tour-2-cover.jpg".to_string(),
            images: vec![],
            start_dates: vec![],
            secret: false,
            longitude: -80.18,
            latitude: 25.77,
            start_address: None,
            start_description: None,
            guides: vec![],
            locations: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn session_form_prices_in_cents() {
        let tour = sample_tour();
        let params = CheckoutParams {
            tour: &tour,
            customer_email: "ada@example.com",
            success_url: "http://localhost:3000/?tour=x".to_string(),
            cancel_url: "http://localhost:3000/tours/the-sea-explorer".to_string(),
        };

        let form = build_session_form(&params);
        let get = |key: &str| {
            form.iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
                .unwrap()
        };

        assert_eq!(get("mode"), "payment");
        assert_eq!(get("line_items[0][price_data][unit_amount]"), "49700");
        assert_eq!(
            get("line_items[0][price_data][product_data][name]"),
            "The Sea Explorer Tour"
        );
        assert_eq!(get("customer_email"), "ada@example.com");
        assert_eq!(get("client_reference_id"), tour.id.to_string());
    }
}
