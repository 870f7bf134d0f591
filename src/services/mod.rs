// src/services/mod.rs
// DOCUMENTATION: Services module organization
// PURPOSE: Re-export service components

pub mod auth_service;
pub mod booking_service;
pub mod cache;
pub mod email_client;
pub mod media;
pub mod payment_client;
pub mod review_service;
pub mod tour_service;
pub mod user_service;

pub use auth_service::*;
pub use booking_service::*;
pub use cache::*;
pub use email_client::*;
pub use payment_client::*;
pub use review_service::*;
pub use tour_service::*;
pub use user_service::*;
