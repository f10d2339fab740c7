//! natter server
//!
//! Single binary serving the group and private chat REST API.

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use natter_common::auth::JwtContext;
use natter_server::config::{Config, StorageBackend};
use natter_server::store::{ChatStore, MemoryStore, PgStore};
use natter_server::{api, db, state};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; real deployments set the environment.
    let _ = dotenvy::dotenv();

    // ── Logging ─────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    // ── Storage ─────────────────────────────────────────────────
    let store: Arc<dyn ChatStore> = match config.storage {
        StorageBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?;
            let pool = db::connect(url, config.db_max_connections).await?;
            db::migrate(&pool).await?;
            Arc::new(PgStore::new(pool))
        }
        StorageBackend::Memory => {
            tracing::warn!("using in-memory storage, data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    // ── JWT context ─────────────────────────────────────────────
    let jwt = JwtContext::from_secret(&config.jwt_secret)
        .map_err(|e| anyhow::anyhow!("invalid JWT secret: {e}"))?;

    let state = state::AppState::new(
        store,
        jwt,
        config.token_ttl_secs,
        config.history_visibility,
    );

    // ── Router ──────────────────────────────────────────────────
    let app = Router::new()
        .nest("/api", api::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    // ── Listen ──────────────────────────────────────────────────
    tracing::info!(
        addr = %config.listen_addr,
        history_visibility = ?config.history_visibility,
        "natter-server listening"
    );
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
