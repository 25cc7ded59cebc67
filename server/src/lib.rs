//! Tasksync Mirror - a self-hostable realtime tree database.
//!
//! Serves the tree over REST (`GET`/`PUT`/`DELETE /{path}.json`) and pushes
//! snapshots of watched subtrees over a WebSocket at `/ws`.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod websocket;

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::TreeStore;
use crate::websocket::ConnectionManager;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub tree: Arc<TreeStore>,
    pub config: Arc<Config>,
    pub conn_manager: Arc<ConnectionManager>,
}

impl AppState {
    /// Build state for `config`, loading its data file if set.
    pub async fn open(config: Config) -> std::io::Result<Self> {
        let tree = TreeStore::open(config.data_file.clone()).await?;
        Ok(Self {
            tree: Arc::new(tree),
            config: Arc::new(config),
            conn_manager: ConnectionManager::new_shared(),
        })
    }

    /// Memory-only state with default configuration.
    pub fn in_memory() -> Self {
        Self {
            tree: Arc::new(TreeStore::new()),
            config: Arc::new(Config::default()),
            conn_manager: ConnectionManager::new_shared(),
        }
    }
}

/// Build the router with tracing and permissive CORS.
pub fn create_app(state: AppState) -> Router {
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

/// Serve the mirror on `listener` until the process stops.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, create_app(state)).await
}
