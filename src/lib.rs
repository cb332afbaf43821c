//! Stockroom: a small single-tenant inventory service with an HTML surface
//! and a JSON API over the same state.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod web;

use std::sync::Arc;
use std::time::Duration;

use axum::{middleware::from_fn_with_state, routing::get, Router};
use sqlx::SqlitePool;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::Config;
use crate::services::SessionManager;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<Config>,
    pub sessions: SessionManager,
}

impl AppState {
    pub fn new(db: SqlitePool, config: Config) -> Self {
        let sessions = SessionManager::new(
            config.auth.session_secret.clone(),
            config.auth.idle_timeout_minutes,
            config.auth.remember_days,
        );
        Self {
            db,
            config: Arc::new(config),
            sessions,
        }
    }
}

/// Assemble the full application router
pub fn create_app(state: AppState) -> Router {
    let request_timeout = Duration::from_secs(state.config.server.request_timeout_secs);

    Router::new()
        .merge(routes::web_routes())
        .nest("/api", routes::api_routes())
        .route("/health", get(handlers::health::health_check))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::session::session_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(state)
}
