//! HTTP service over the siting engine.

pub mod api;
pub mod config;
pub mod state;

use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::state::AppState;

/// Full application router with state and middleware applied.
pub fn app(config: Config) -> Router {
    let state = Arc::new(AppState::new(config.clone()));
    api::routes(&config)
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
        .layer(middleware::from_fn(api::request_id::ensure_request_id))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
