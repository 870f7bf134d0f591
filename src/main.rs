// src/main.rs
// DOCUMENTATION: Application entry point
// PURPOSE: Initialize config, database, and start HTTP server

mod auth;
mod config;
mod db;
mod errors;
mod handlers;
mod models;
mod services;

use actix_web::{middleware::Logger, web, App, HttpServer};
use config::Config;
use dotenv::dotenv;
use services::{start_cleanup_task, AggregateCache, EmailClient, PaymentClient};
use std::io;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // 1. Load environment variables
    dotenv().ok();

    // 2. Load configuration
    let config = Config::from_env();
    if let Err(e) = config.validate() {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    }

    // 3. Initialize logging
    if std::env::var("RUST_LOG").is_err() {
        let log_level = if !config.log_level.is_empty() {
            &config.log_level
        } else {
            "info,actix_web=info,sqlx=warn"
        };
        std::env::set_var("RUST_LOG", log_level);
    }
    env_logger::init();

    log::info!("Starting tourbase API server...");
    log::info!("Environment: {}", config.environment);
    log::info!(
        "Server Address: {}:{}",
        config.server_address,
        config.server_port
    );

    // 4. Initialize database connection pool
    let pool = match config::init_db_pool(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    // 5. Aggregate cache for the stats endpoints (10 minute TTL)
    let cache = Arc::new(AggregateCache::new(600));
    start_cleanup_task(cache.clone(), 300);
    log::info!("Initialized aggregate cache (TTL: 10 minutes)");

    // 6. External collaborators and the shared credential rate limiter
    let email_client = web::Data::new(EmailClient::from_config(&config));
    let payment_client = web::Data::new(PaymentClient::from_config(&config));
    let rate_limiter = web::Data::new(handlers::auth::build_rate_limiter());

    // 7. Start HTTP server
    let server_addr = format!("{}:{}", config.server_address, config.server_port);
    let config_clone = config.clone();

    HttpServer::new(move || {
        App::new()
            // Application state (database pool, config, cache and clients)
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(config_clone.clone()))
            .app_data(web::Data::new(cache.clone()))
            .app_data(email_client.clone())
            .app_data(payment_client.clone())
            .app_data(rate_limiter.clone())
            // Middleware
            .wrap(Logger::default())
            .wrap(actix_web::middleware::Compress::default())
            // Routes; auth first so its literal paths win over /users/{id}
            .configure(handlers::health_config)
            .configure(handlers::auth_config)
            .configure(handlers::users_config)
            .configure(handlers::tours_config)
            .configure(handlers::reviews_config)
            .configure(handlers::bookings_config)
    })
    .bind(&server_addr)?
    .run()
    .await
}
