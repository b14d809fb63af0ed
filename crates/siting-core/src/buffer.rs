//! Safety buffer generation around hazardous facilities.

use chrono::Utc;
use geo::Simplify;
use std::collections::HashSet;

use crate::error::{BufferGenerationError, GeometryError};
use crate::geometry;
use crate::models::{BufferZone, BufferZoneCollection, Facility, HazardCategory};
use crate::projection::PlanarProjection;
use crate::rules::{RequiredDistances, SitingRules};

pub const DEFAULT_COLLECTION_NAME: &str = "buffer_zones";

/// Build one buffer per (facility, hazard category) pair.
///
/// A facility gets a buffer for each category it is flagged with whose
/// resolved distance is positive. Buffers are offset in the planar system,
/// simplified, and returned in global coordinates. A repeated
/// (facility, category) pair is skipped with a warning.
///
/// An empty facility list or an empty result is an error: every airport
/// has at least one hazardous facility.
pub fn generate_buffers(
    facilities: &[Facility],
    distances: &RequiredDistances,
    rules: &SitingRules,
    projection: &PlanarProjection,
    collection_name: &str,
) -> Result<BufferZoneCollection, BufferGenerationError> {
    if facilities.is_empty() {
        return Err(BufferGenerationError::NoFacilities);
    }

    let planar = facilities
        .iter()
        .map(|facility| {
            projection
                .to_planar(&facility.geometry)
                .map_err(|source| BufferGenerationError::InvalidFacility {
                    facility: facility.id.clone(),
                    source,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut seen: HashSet<(&str, HazardCategory)> = HashSet::new();
    let mut zones = Vec::new();

    for (facility, planar) in facilities.iter().zip(&planar) {
        let flags = facility.distance_requirements.flags();
        tracing::debug!(facility = %facility.label(), ?flags, "Processing facility");

        for category in flags.flagged() {
            let distance_ft = distances.get(category);
            if distance_ft <= 0.0 {
                continue;
            }
            if !seen.insert((facility.id.as_str(), category)) {
                tracing::warn!(
                    facility = %facility.id,
                    %category,
                    "Duplicate buffer for facility and category, skipping"
                );
                continue;
            }

            let invalid = |source: GeometryError| BufferGenerationError::InvalidFacility {
                facility: facility.id.clone(),
                source,
            };
            let buffered = geometry::buffer(planar, distance_ft)
                .map_err(invalid)?
                .simplify(rules.simplify_tolerance_ft);
            if buffered.0.is_empty() {
                tracing::warn!(facility = %facility.id, %category, "Buffer collapsed to nothing, skipping");
                continue;
            }
            let geometry = projection.to_global(&buffered).map_err(invalid)?;

            tracing::debug!(
                facility = %facility.label(),
                %category,
                distance_ft,
                "Added buffer zone"
            );
            zones.push(BufferZone {
                facility_id: facility.id.clone(),
                facility_name: facility.name.clone(),
                hazard_categories: vec![category],
                buffer_distance_ft: distance_ft,
                geometry,
            });
        }
    }

    if zones.is_empty() {
        return Err(BufferGenerationError::NoBuffersProduced {
            facility_count: facilities.len(),
        });
    }

    tracing::info!(
        zones = zones.len(),
        facilities = facilities.len(),
        "Generated buffer zones"
    );
    Ok(BufferZoneCollection {
        name: collection_name.to_string(),
        generated_at: Utc::now(),
        zones,
    })
}
