//! Buffer zone generation and retrieval.

use axum::{extract::State, http::StatusCode, Json};
use geojson::FeatureCollection;
use serde::Deserialize;
use siting_core::{generate_and_store, resolve_max_distances, store};
use std::sync::Arc;

use crate::api::error::{blocking, ApiResult};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    /// Collection name; defaults to the configured one.
    pub name: Option<String>,
}

/// Regenerate buffers from the facility and requirement data, replacing the
/// stored collection.
pub async fn generate_buffer_zones(
    State(state): State<Arc<AppState>>,
    body: Option<Json<GenerateRequest>>,
) -> ApiResult<(StatusCode, Json<FeatureCollection>)> {
    let request = body.map(|Json(req)| req).unwrap_or_default();
    let name = request
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| state.config().buffer_collection_name.clone());

    let collection = blocking(move || {
        let facilities = state.load_facilities()?;
        let rules = state.load_rules()?;
        let distances = resolve_max_distances(&rules)?;
        let projection = state.projection()?;
        Ok(generate_and_store(
            &state.buffer_store(),
            &facilities,
            &distances,
            &state.config().rules,
            &projection,
            &name,
        )?)
    })
    .await?;

    tracing::info!(
        "Generated buffer collection '{}' with {} zones",
        collection.name,
        collection.zones.len()
    );
    Ok((StatusCode::CREATED, Json(store::to_feature_collection(&collection))))
}

/// The last persisted buffer collection.
pub async fn get_buffer_zones(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<FeatureCollection>> {
    let collection = blocking(move || Ok(state.buffer_store().load()?)).await?;
    Ok(Json(store::to_feature_collection(&collection)))
}
