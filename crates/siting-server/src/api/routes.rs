//! REST API routes.

use axum::{
    extract::{DefaultBodyLimit, Query, State},
    routing::{get, post},
    Json, Router,
};
use geojson::FeatureCollection;
use serde::{Deserialize, Serialize};
use siting_core::{
    loader, required_area_sqft, resolve_max_distances, RequiredDistances, RequirementRule,
};
use std::sync::Arc;

use crate::api::error::{blocking, ApiError, ApiResult};
use crate::api::{buffers, storage};
use crate::config::Config;
use crate::state::AppState;

/// Create the API router.
pub fn create_router(config: &Config) -> Router<Arc<AppState>> {
    // Reference data, read straight from disk
    let data_routes = Router::new()
        .route("/v1/facilities", get(list_facilities))
        .route("/v1/requirements", get(list_requirements))
        .route("/v1/required-area", get(get_required_area));

    // Geometry-heavy routes
    let analysis_routes = Router::new()
        .route("/v1/buffer-zones", get(buffers::get_buffer_zones))
        .route("/v1/buffer-zones/generate", post(buffers::generate_buffer_zones))
        .route("/v1/storage-areas/compliance", get(storage::storage_area_compliance))
        .route("/v1/distance-check", post(storage::distance_check))
        .route("/v1/violations", get(storage::list_violations))
        .layer(DefaultBodyLimit::max(config.max_body_bytes));

    data_routes.merge(analysis_routes)
}

async fn list_facilities(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<FeatureCollection>> {
    let facilities = blocking(move || Ok(state.load_facilities()?)).await?;
    Ok(Json(loader::facilities_to_geojson(&facilities)))
}

#[derive(Debug, Serialize)]
pub struct RequirementsResponse {
    pub rules: Vec<RequirementRule>,
    pub max_distances: RequiredDistances,
}

async fn list_requirements(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<RequirementsResponse>> {
    let rules = blocking(move || Ok(state.load_rules()?)).await?;
    let max_distances = resolve_max_distances(&rules)?;
    Ok(Json(RequirementsResponse {
        rules,
        max_distances,
    }))
}

#[derive(Debug, Deserialize)]
pub struct RequiredAreaQuery {
    pub storage_volume_gal: f64,
}

#[derive(Debug, Serialize)]
pub struct RequiredAreaResponse {
    pub storage_volume_gal: f64,
    pub tanks: f64,
    pub required_area_sqft: f64,
}

async fn get_required_area(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RequiredAreaQuery>,
) -> ApiResult<Json<RequiredAreaResponse>> {
    let volume = query.storage_volume_gal;
    if !volume.is_finite() || volume <= 0.0 {
        return Err(ApiError::bad_request(format!(
            "storage_volume_gal must be a finite positive number, got {volume}"
        )));
    }
    let tank = &state.config().rules.tank;
    Ok(Json(RequiredAreaResponse {
        storage_volume_gal: volume,
        tanks: tank.tanks_for(volume),
        required_area_sqft: required_area_sqft(volume, tank),
    }))
}
