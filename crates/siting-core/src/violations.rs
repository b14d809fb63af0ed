//! Zoning violations between candidate storage areas and hazardous
//! facilities, measured edge to edge in the planar system.

use geo::{Distance, Euclidean, Geometry};
use serde::Serialize;

use crate::error::{ComplianceEvaluationError, RequirementResolutionError, SitingError};
use crate::models::{Facility, HazardCategory, RequirementRule};
use crate::projection::PlanarProjection;
use crate::rules::SitingRules;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoningViolation {
    pub source_id: String,
    pub source_name: Option<String>,
    pub target_id: String,
    pub target_name: Option<String>,
    pub hazard_category: HazardCategory,
    pub regulation_name: String,
    pub required_distance_ft: f64,
    pub actual_distance_ft: f64,
}

/// Find every rule a candidate storage area breaks against its neighbours.
///
/// Sources are facilities with a candidate amenity, optionally narrowed to
/// `amenity`. Each other facility is a target for every category it is
/// flagged with; a rule for that category is violated when its safety
/// distance exceeds the edge-to-edge distance.
pub fn find_violations(
    facilities: &[Facility],
    rules: &[RequirementRule],
    siting: &SitingRules,
    projection: &PlanarProjection,
    amenity: Option<&str>,
) -> Result<Vec<ZoningViolation>, SitingError> {
    if rules.is_empty() {
        return Err(RequirementResolutionError::EmptyTable.into());
    }

    let planar = facilities
        .iter()
        .map(|facility| {
            projection
                .to_planar(&facility.geometry)
                .map(Geometry::MultiPolygon)
                .map_err(|source| ComplianceEvaluationError::InvalidFacility {
                    facility: facility.id.clone(),
                    source,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let is_source = |facility: &Facility| {
        siting.is_candidate_amenity(&facility.amenity)
            && amenity.map_or(true, |wanted| facility.amenity.eq_ignore_ascii_case(wanted))
    };

    let mut violations = Vec::new();
    for (source, source_geometry) in facilities.iter().zip(&planar) {
        if !is_source(source) {
            continue;
        }
        for (target, target_geometry) in facilities.iter().zip(&planar) {
            if target.id == source.id {
                continue;
            }
            let flags = target.distance_requirements.flags();
            if !flags.any() {
                continue;
            }
            let distance_ft = Euclidean.distance(source_geometry, target_geometry);

            for category in flags.flagged() {
                for rule in rules.iter().filter(|rule| rule.applies_to(category)) {
                    if distance_ft < rule.safety_distance_ft {
                        violations.push(ZoningViolation {
                            source_id: source.id.clone(),
                            source_name: source.name.clone(),
                            target_id: target.id.clone(),
                            target_name: target.name.clone(),
                            hazard_category: category,
                            regulation_name: rule.label().to_string(),
                            required_distance_ft: rule.safety_distance_ft,
                            actual_distance_ft: distance_ft,
                        });
                    }
                }
            }
        }
    }

    tracing::info!(violations = violations.len(), ?amenity, "Zoning violation check complete");
    Ok(violations)
}
