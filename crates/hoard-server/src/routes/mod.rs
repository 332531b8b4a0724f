//! API routes for the hoard server.

pub mod treasures;
pub mod users;

use axum::Router;
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Creates the main API router with all routes mounted under `/api`.
pub fn create_router(pool: PgPool) -> Router {
    Router::new()
        .nest("/api", api_routes(pool))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

fn api_routes(pool: PgPool) -> Router {
    treasures::router(pool.clone()).merge(users::router(pool))
}

/// Connects to the database and serves the API until the process stops.
pub async fn serve(config: &crate::ServerConfig) -> anyhow::Result<()> {
    use anyhow::Context;

    let pool = crate::db::create_pool(&config.database_url, config.max_connections)
        .await
        .context("Failed to connect to the database")?;
    if config.migrate_on_start {
        crate::db::run_migrations(&pool)
            .await
            .context("Failed to run migrations")?;
    }

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, "Hoard API listening");

    axum::serve(listener, create_router(pool))
        .await
        .context("Server error")?;
    Ok(())
}
