// src/services/email_client.rs
// DOCUMENTATION: Email delivery provider client
// PURPOSE: Handle communication with the transactional mail API

use reqwest::Client;
use serde::Serialize;

use crate::config::Config;
use crate::errors::ApiError;
use crate::models::User;

/// Transactional email client
/// When no provider is configured the sends become logged no-ops, which
/// keeps development environments working without credentials
#[derive(Clone)]
pub struct EmailClient {
    client: Client,
    api_url: String,
    api_token: String,
    from: String,
}

/// Payload for the provider's message endpoint
#[derive(Debug, Serialize)]
struct EmailMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

impl EmailClient {
    pub fn from_config(config: &Config) -> Self {
        Self {
            client: Client::new(),
            api_url: config.email_api_url.clone(),
            api_token: config.email_api_token.clone(),
            from: config.email_from.clone(),
        }
    }

    /// Deliver one message through the provider
    pub async fn send(&self, to: &str, subject: &str, text: &str) -> Result<(), ApiError> {
        if self.api_url.is_empty() {
            log::warn!("Email delivery disabled; skipping '{}' to {}", subject, to);
            return Ok(());
        }

        let message = EmailMessage {
            from: &self.from,
            to,
            subject,
            text,
        };

        let response = self
            .client
            .post(format!("{}/messages", self.api_url))
            .bearer_auth(&self.api_token)
            .json(&message)
            .send()
            .await
            .map_err(|e| {
                log::error!("Email request failed: {}", e);
                ApiError::ExternalApiError("Email delivery failed".to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            log::error!("Email provider returned {}: {}", status, body);
            return Err(ApiError::ExternalApiError(
                "Email delivery failed".to_string(),
            ));
        }

        log::info!("Sent '{}' email to {}", subject, to);
        Ok(())
    }

    pub async fn send_welcome(&self, user: &User, account_url: &str) -> Result<(), ApiError> {
        let text = format!(
            "Hi {},\n\nWelcome to Tourbase, we're glad to have you!\n\
             Manage your account here: {}\n",
            user.name, account_url
        );
        self.send(&user.email, "Welcome to the Tourbase family!", &text)
            .await
    }

    pub async fn send_password_reset(&self, user: &User, reset_url: &str) -> Result<(), ApiError> {
        let text = format!(
            "Hi {},\n\nForgot your password? Submit a PATCH request with your new \
             password to: {}\n\nIf you didn't forget your password, please ignore \
             this email. The link is valid for 10 minutes.\n",
            user.name, reset_url
        );
        self.send(
            &user.email,
            "Your password reset token (valid for 10 minutes)",
            &text,
        )
        .await
    }
}
