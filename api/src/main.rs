//! Ratings API Server
//!
//! Keeps a running average rating per driver. Every rating mutation updates
//! the rating record and the driver's (sum, count) aggregate atomically, so
//! averages are read in O(1) without scanning rating history.
//! Uses hexagonal (ports & adapters) architecture for clean separation of concerns.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    routing::{delete, get, post},
    Json, Router,
};
use sea_orm::Database;
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod adapters;
mod app;
mod config;
mod domain;
mod entity;
mod error;
mod handlers;

#[cfg(test)]
mod test_utils;


use adapters::{ensure_schema, InMemoryRatingStore, PostgresRatingStore};
use app::{seed_entities, AggregationEngine, QueryService};
use config::Config;
use domain::ports::{EntityRegistry, RatingStore};

/// Application state shared across all handlers
pub struct AppState<S: RatingStore> {
    pub engine: Arc<AggregationEngine<S>>,
    pub queries: Arc<QueryService<S>>,
}

impl<S: RatingStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            queries: self.queries.clone(),
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Build the HTTP router over any rating store
pub fn build_router<S: RatingStore + 'static>(
    state: AppState<S>,
    request_timeout: Duration,
) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health))
        // Drivers and their averages
        .route("/drivers", get(handlers::list_entities::<S>))
        .route(
            "/drivers/:entity_id/ratings",
            post(handlers::submit_rating::<S>).get(handlers::list_ratings::<S>),
        )
        .route(
            "/drivers/:entity_id/ratings/:rater_id",
            delete(handlers::remove_rating::<S>),
        )
        // Middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(request_timeout))
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,ratings_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Ratings API...");

    // Load configuration
    let config = Config::from_env();
    config
        .rating_bounds()
        .context("Invalid RATING_MIN/RATING_MAX")?;

    match config.database_url.clone() {
        Some(url) => {
            tracing::info!("Connecting to database...");
            let db = Database::connect(&url)
                .await
                .context("Failed to connect to database")?;
            ensure_schema(&db)
                .await
                .context("Failed to create schema")?;
            tracing::info!("Database connected");

            serve(
                Arc::new(PostgresRatingStore::new(db, config.lock_timeout)),
                config,
            )
            .await
        }
        None => {
            tracing::warn!("DATABASE_URL not set, ratings are kept in memory only");
            serve(
                Arc::new(InMemoryRatingStore::new(config.lock_timeout)),
                config,
            )
            .await
        }
    }
}

async fn serve<S>(store: Arc<S>, config: Config) -> anyhow::Result<()>
where
    S: RatingStore + EntityRegistry + 'static,
{
    seed_entities(store.as_ref(), config.seed_entities)
        .await
        .context("Failed to seed entities")?;

    let state = AppState {
        engine: Arc::new(AggregationEngine::new(
            store.clone(),
            config.rating_bounds()?,
            config.retry_policy(),
        )),
        queries: Arc::new(QueryService::new(store)),
    };

    let app = build_router(state, config.request_timeout);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}
