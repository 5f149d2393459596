//! Stockroom Server - storefront backend for carts, reservations and orders.
//!
//! This server exposes the stockroom-engine over HTTP and WebSocket, persists
//! everything in PostgreSQL and runs the cart expiry sweep in the background.

mod auth;
mod config;
mod db;
mod error;
mod handlers;
mod routes;
mod sweeper;
mod websocket;

use crate::config::Config;
use crate::db::PgStore;
use crate::websocket::{ConnectionManager, SocketNotifier};
use axum::Router;
use std::sync::Arc;
use stockroom_engine::{AdminGate, CatalogSeed, SharedStore, Shop};
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub shop: Shop,
    pub config: Arc<Config>,
    pub admin: Arc<AdminGate>,
    pub conn_manager: Arc<ConnectionManager>,
}

impl AppState {
    /// Wire the engine over `store`, reporting through open sockets.
    pub fn new(store: SharedStore, config: Config) -> Self {
        let conn_manager = ConnectionManager::new_shared();
        let notifier = Arc::new(SocketNotifier::new(conn_manager.clone()));
        let shop = Shop::with_notifier(store, config.shop_config(), notifier);
        let admin = Arc::new(AdminGate::new(
            config.admin_password.clone(),
            config.admin_max_attempts,
            config.admin_lockout_secs,
        ));

        Self {
            shop,
            config: Arc::new(config),
            admin,
            conn_manager,
        }
    }
}

/// Build the router with all routes and layers.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(routes::create_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

async fn load_seed(path: &str, shop: &Shop) -> Result<(), Box<dyn std::error::Error>> {
    let json = tokio::fs::read_to_string(path).await?;
    let seed = CatalogSeed::from_json(&json)?;
    let grant = AdminGate::trusted(handlers::now());
    seed.apply(&grant, shop.store().as_ref()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "stockroom_server=debug,stockroom_engine=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing::info!("Starting Stockroom Server on {}:{}", config.host, config.port);
    if config.admin_password.is_none() {
        tracing::warn!("ADMIN_PASSWORD is not set, admin routes are disabled");
    }

    // Create database pool
    let pool = db::create_pool(&config.database_url).await?;

    // Run migrations
    tracing::info!("Running database migrations...");
    db::run_migrations(&pool).await?;

    // Build application state
    let store: SharedStore = Arc::new(PgStore::new(pool));
    let state = AppState::new(store, config.clone());

    if let Some(path) = config.catalog_seed.as_deref() {
        tracing::info!(path = %path, "Applying catalog seed");
        load_seed(path, &state.shop).await?;
    }

    // Background expiry sweep
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = sweeper::spawn(state.shop.clone(), config.sweep_interval(), shutdown_rx);

    let app = build_app(state);

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    sweeper.await?;

    Ok(())
}
