//! SubMan Admin Server
//!
//! Back-office API for the SubMan Telegram subscription store.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       SUBMAN ADMIN                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌─────────────────┐  ┌──────────────────┐  │
//! │  │  REST API │  │  Subscription   │  │  AI Assistant    │  │
//! │  │  (Axum)   │  │  Monitor (core) │  │  (OpenAI API)    │  │
//! │  └─────┬─────┘  └────────┬────────┘  └────────┬─────────┘  │
//! │        └─────────────────┼────────────────────┘            │
//! │                          ▼                                  │
//! │                   ┌─────────────┐                          │
//! │                   │ PostgreSQL  │                          │
//! │                   └─────────────┘                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod db;
mod models;
mod handlers;
mod error;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post, put, delete},
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use subman_core::ai::{OpenAiClient, TextGenerator};
use subman_core::monitor::SubscriptionRepository;

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    // Initialize logging; subman_core logs through the `log` bridge
    let production = config.is_production();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "subman_admin=debug,subman_core=info,tower_http=debug".into()))
        .with(production.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!production).then(tracing_subscriber::fmt::layer))
        .init();

    tracing::info!("SubMan Admin starting ({})...", config.environment);
    tracing::info!("Database: {}", config.database_url.split('@').last().unwrap_or("***"));

    // Initialize database pool
    let pool = db::create_pool(&config.database_url).await
        .context("Failed to create database pool")?;

    // Run migrations
    tracing::info!("Running database migrations...");
    db::run_migrations(&pool).await
        .context("Failed to run migrations")?;

    let ai_settings = config.ai_settings();
    if !ai_settings.is_configured() {
        tracing::warn!("OPENAI_API_KEY is not set, AI endpoints will answer 503");
    }
    let ai = OpenAiClient::new(ai_settings).context("Failed to build AI client")?;

    let thresholds = config.monitor_thresholds();
    tracing::info!(
        "Subscription monitor: lookahead {}h, stale active {}",
        thresholds.lookahead().num_hours(),
        if thresholds.flag_stale_active { "on" } else { "off" }
    );

    // Build application state
    let state = AppState {
        subscriptions: Arc::new(models::PgSubscriptionRepository::new(pool.clone())),
        ai: Arc::new(ai),
        pool,
        config: config.clone(),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await
        .context("Server error")?;

    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pool: sqlx::PgPool,
    pub config: config::Config,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub ai: Arc<dyn TextGenerator>,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    // Catalog
    let catalog_routes = Router::new()
        .route("/api/v1/categories", get(handlers::categories::list))
        .route("/api/v1/categories", post(handlers::categories::create))
        .route("/api/v1/categories/:id", get(handlers::categories::get))
        .route("/api/v1/categories/:id", put(handlers::categories::update))
        .route("/api/v1/categories/:id", delete(handlers::categories::delete))

        .route("/api/v1/products", get(handlers::products::list))
        .route("/api/v1/products", post(handlers::products::create))
        .route("/api/v1/products/:id", get(handlers::products::get))
        .route("/api/v1/products/:id", put(handlers::products::update))
        .route("/api/v1/products/:id", delete(handlers::products::delete));

    // Customers
    let customer_routes = Router::new()
        .route("/api/v1/users", get(handlers::users::list))
        .route("/api/v1/users", post(handlers::users::create))
        .route("/api/v1/users/:id", get(handlers::users::get))
        .route("/api/v1/users/:id", put(handlers::users::update))
        .route("/api/v1/users/:id", delete(handlers::users::delete))

        .route("/api/v1/orders", get(handlers::orders::list))
        .route("/api/v1/orders", post(handlers::orders::create))
        .route("/api/v1/orders/:id", get(handlers::orders::get))
        .route("/api/v1/orders/:id", put(handlers::orders::update))
        .route("/api/v1/orders/:id", delete(handlers::orders::delete))

        .route("/api/v1/subscriptions", get(handlers::subscriptions::list))
        .route("/api/v1/subscriptions", post(handlers::subscriptions::create))
        .route("/api/v1/subscriptions/anomalies", get(handlers::monitor::anomalies))
        .route("/api/v1/subscriptions/:id", get(handlers::subscriptions::get))
        .route("/api/v1/subscriptions/:id", put(handlers::subscriptions::update))
        .route("/api/v1/subscriptions/:id", delete(handlers::subscriptions::delete));

    // Monitor, AI assistant, dashboard
    let insight_routes = Router::new()
        .route("/api/v1/monitor/classify", post(handlers::monitor::classify))
        .route("/api/v1/monitor/cross-check", post(handlers::monitor::cross_check))
        .route("/api/v1/ai/broadcast-message", post(handlers::ai::broadcast_message))
        .route("/api/v1/ai/sales-analysis", post(handlers::ai::sales_analysis))
        .route("/api/v1/broadcasts/audience", post(handlers::broadcasts::audience))
        .route("/api/v1/dashboard/metrics", get(handlers::dashboard::metrics));

    // Combine all routes
    Router::new()
        .route("/health", get(handlers::health::check))
        .merge(catalog_routes)
        .merge(customer_routes)
        .merge(insight_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
