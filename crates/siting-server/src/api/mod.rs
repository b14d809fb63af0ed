//! API routes for the siting server.

pub mod buffers;
pub mod error;
pub mod request_id;
mod routes;
pub mod storage;

use crate::config::Config;
use axum::Router;

pub fn routes(config: &Config) -> Router<std::sync::Arc<crate::state::AppState>> {
    routes::create_router(config)
}

#[cfg(test)]
mod tests;
