//! Storage-area compliance, point-distance checks and zoning violations.

use axum::{
    extract::{Query, State},
    Json,
};
use geojson::Position;
use serde::Deserialize;
use siting_core::{
    area_centroid, check_distance, evaluate, find_violations, geometry, loader,
    ComplianceVerdict, HazardCategory, LatLng, StorageEvaluation, ZoningViolation,
};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::api::error::{blocking, ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ComplianceQuery {
    pub storage_volume_gal: Option<f64>,
}

/// Evaluate every candidate storage area against the stored buffers.
pub async fn storage_area_compliance(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ComplianceQuery>,
) -> ApiResult<Json<StorageEvaluation>> {
    let volume = query.storage_volume_gal;
    let evaluation = blocking(move || {
        let zones = state.buffer_store().load()?;
        let facilities = state.load_facilities()?;
        let candidates = loader::candidate_areas(&facilities, &state.config().rules);
        let projection = state.projection()?;
        Ok(evaluate(
            &candidates,
            &zones.zones,
            volume,
            &state.config().rules,
            &projection,
        )?)
    })
    .await?;

    tracing::info!(
        total = evaluation.summary.total,
        compliant = evaluation.summary.compliant,
        failed = evaluation.summary.failed,
        "Evaluated storage areas"
    );
    Ok(Json(evaluation))
}

/// Body of a point-distance check. The area is given either directly as a
/// `[lat, lng]` centroid or as polygon rings, whose vertex average is used.
#[derive(Debug, Deserialize)]
pub struct DistanceCheckRequest {
    pub area_id: Option<String>,
    pub centroid: Option<[f64; 2]>,
    pub polygon: Option<Vec<Vec<Position>>>,
    pub storage_volume_gal: f64,
    #[serde(default)]
    pub hazard_points_by_category: BTreeMap<HazardCategory, Vec<[f64; 2]>>,
}

impl DistanceCheckRequest {
    fn centroid(&self) -> ApiResult<LatLng> {
        match (&self.centroid, &self.polygon) {
            (Some([lat, lng]), _) => Ok(LatLng::new(*lat, *lng)),
            (None, Some(rings)) => {
                let mp = geometry::multipolygon_from_geojson(&geojson::Value::Polygon(
                    rings.clone(),
                ))?;
                area_centroid(&mp).ok_or_else(|| ApiError::bad_request("polygon has no vertices"))
            }
            (None, None) => Err(ApiError::bad_request(
                "either centroid or polygon must be supplied",
            )),
        }
    }
}

pub async fn distance_check(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DistanceCheckRequest>,
) -> ApiResult<Json<ComplianceVerdict>> {
    let centroid = request.centroid()?;
    let hazards: BTreeMap<HazardCategory, Vec<LatLng>> = request
        .hazard_points_by_category
        .iter()
        .map(|(category, points)| {
            (
                *category,
                points.iter().map(|[lat, lng]| LatLng::new(*lat, *lng)).collect(),
            )
        })
        .collect();

    let verdict = blocking(move || {
        let rules = state.load_rules()?;
        Ok(check_distance(
            request.area_id.as_deref(),
            centroid,
            &hazards,
            request.storage_volume_gal,
            &rules,
        )?)
    })
    .await?;

    tracing::info!(
        area = verdict.area_id.as_deref().unwrap_or("-"),
        compliant = verdict.compliant,
        "Distance check: {}",
        verdict.reason
    );
    Ok(Json(verdict))
}

#[derive(Debug, Deserialize)]
pub struct ViolationsQuery {
    pub amenity: Option<String>,
}

pub async fn list_violations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ViolationsQuery>,
) -> ApiResult<Json<Vec<ZoningViolation>>> {
    let violations = blocking(move || {
        let facilities = state.load_facilities()?;
        let rules = state.load_rules()?;
        let projection = state.projection()?;
        Ok(find_violations(
            &facilities,
            &rules,
            &state.config().rules,
            &projection,
            query.amenity.as_deref(),
        )?)
    })
    .await?;
    Ok(Json(violations))
}
