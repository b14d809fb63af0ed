//! Storage-area compliance engine.
//!
//! Each candidate area is projected, every foreign buffer that touches it is
//! subtracted, and the remaining area is classified against an optional
//! storage volume. Areas are evaluated independently; one area's geometry
//! failure is recorded against that area and does not abort the batch.

use geo::{Area, Intersects, MultiPolygon};

use crate::error::{ComplianceEvaluationError, GeometryError};
use crate::geometry;
use crate::models::{
    AreaEvaluation, AreaFailure, BufferZone, CandidateStorageArea, ComplianceResult,
    ComplianceStatus, EvaluationSummary, OverlappingBuffer, StorageEvaluation,
};
use crate::projection::PlanarProjection;
use crate::rules::{required_area_sqft, SitingRules};

/// A buffer zone together with its planar geometry.
struct PlanarZone<'a> {
    zone: &'a BufferZone,
    planar: MultiPolygon<f64>,
}

/// Evaluate every candidate area against the buffer zones.
///
/// `requested_volume_gal`, when given, must be finite and positive; it
/// implies a minimum required area that partially covered areas must meet.
pub fn evaluate(
    candidates: &[CandidateStorageArea],
    zones: &[BufferZone],
    requested_volume_gal: Option<f64>,
    rules: &SitingRules,
    projection: &PlanarProjection,
) -> Result<StorageEvaluation, ComplianceEvaluationError> {
    if candidates.is_empty() {
        return Err(ComplianceEvaluationError::NoCandidateAreas);
    }
    if zones.is_empty() {
        return Err(ComplianceEvaluationError::NoBufferZones);
    }
    if let Some(volume) = requested_volume_gal {
        if !volume.is_finite() || volume <= 0.0 {
            return Err(ComplianceEvaluationError::InvalidVolume(volume));
        }
    }
    let required_area = requested_volume_gal.map(|volume| required_area_sqft(volume, &rules.tank));

    // Buffers are shared by every area, so a bad buffer fails the batch.
    let planar_zones = zones
        .iter()
        .map(|zone| {
            projection
                .to_planar(&zone.geometry)
                .map(|planar| PlanarZone { zone, planar })
                .map_err(|source| ComplianceEvaluationError::InvalidBuffer {
                    facility: zone.facility_id.clone(),
                    category: zone.category_label(),
                    source,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut summary = EvaluationSummary {
        total: candidates.len(),
        ..EvaluationSummary::default()
    };
    let mut results = Vec::with_capacity(candidates.len());

    for area in candidates {
        match evaluate_area(area, &planar_zones, required_area, rules, projection) {
            Ok(result) => {
                match result.compliance_status {
                    ComplianceStatus::Compliant => summary.compliant += 1,
                    ComplianceStatus::NonCompliant => summary.non_compliant += 1,
                }
                results.push(AreaEvaluation::Evaluated(result));
            }
            Err(err) => {
                tracing::warn!(area = %area.id, error = %err, "Candidate area evaluation failed");
                summary.failed += 1;
                results.push(AreaEvaluation::Failed(AreaFailure {
                    area_id: area.id.clone(),
                    area_name: area.name.clone(),
                    error: err.to_string(),
                }));
            }
        }
    }

    tracing::info!(
        total = summary.total,
        compliant = summary.compliant,
        non_compliant = summary.non_compliant,
        failed = summary.failed,
        "Evaluated candidate storage areas"
    );

    Ok(StorageEvaluation {
        storage_volume_gal: requested_volume_gal,
        required_area_sqft: required_area,
        summary,
        results,
    })
}

fn evaluate_area(
    area: &CandidateStorageArea,
    zones: &[PlanarZone<'_>],
    required_area: Option<f64>,
    rules: &SitingRules,
    projection: &PlanarProjection,
) -> Result<ComplianceResult, GeometryError> {
    let epsilon = rules.sliver_epsilon_sqft;
    let planar_area = projection.to_planar(&area.geometry)?;
    let original_area = planar_area.unsigned_area();

    let mut available = planar_area.clone();
    let mut overlapping_buffers = Vec::new();

    for PlanarZone { zone, planar } in zones {
        // A facility's own buffer never reduces its own area.
        if zone.facility_id == area.id {
            continue;
        }
        // Predicate only; areas are always measured in the planar system.
        if !area.geometry.intersects(&zone.geometry) {
            continue;
        }

        let overlap_area = geometry::intersection(&planar_area, planar)?.unsigned_area();
        if overlap_area < epsilon {
            tracing::debug!(area = %area.id, buffer = %zone.facility_id, "Boundary contact only");
            continue;
        }

        available = geometry::difference(&available, planar)?;
        for category in &zone.hazard_categories {
            overlapping_buffers.push(OverlappingBuffer {
                buffer_id: zone.facility_id.clone(),
                facility_name: zone.facility_name.clone(),
                hazard_type: *category,
                buffer_distance_ft: zone.buffer_distance_ft,
                overlap_area_sqft: overlap_area,
            });
        }
    }

    let available_area = if overlapping_buffers.is_empty() {
        original_area
    } else {
        let remaining = available.unsigned_area().min(original_area);
        if remaining < epsilon {
            0.0
        } else {
            remaining
        }
    };

    let (compliance_status, compliance_details) =
        classify(overlapping_buffers.is_empty(), available_area, required_area);

    let area_reduction_percent = if original_area > 0.0 {
        ((original_area - available_area) / original_area * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    };

    let available_geometry = if available_area > 0.0 && !available.0.is_empty() {
        let global = projection.to_global(&available)?;
        Some(geojson::Geometry::new(geometry::multipolygon_to_geojson(&global)))
    } else {
        None
    };

    Ok(ComplianceResult {
        area_id: area.id.clone(),
        area_name: area.name.clone(),
        area_type: area.amenity.clone(),
        original_area_sqft: original_area,
        available_area_sqft: available_area,
        area_reduction_percent,
        required_area_sqft: required_area,
        overlapping_buffers,
        compliance_status,
        compliance_details,
        available_geometry,
    })
}

fn classify(
    no_overlaps: bool,
    available_area: f64,
    required_area: Option<f64>,
) -> (ComplianceStatus, String) {
    if no_overlaps {
        return (ComplianceStatus::Compliant, "No safety buffer overlaps".to_string());
    }
    if available_area == 0.0 {
        return (
            ComplianceStatus::NonCompliant,
            "Area completely covered by safety buffers".to_string(),
        );
    }
    match required_area {
        None => (
            ComplianceStatus::Compliant,
            format!(
                "Available area ({available_area:.2} sq ft) remains after safety buffer overlaps; \
                 no storage volume requested"
            ),
        ),
        Some(required) if available_area < required => (
            ComplianceStatus::NonCompliant,
            format!(
                "Available area ({available_area:.2} sq ft) is less than required ({required:.2} sq ft), \
                 short by {:.2} sq ft",
                required - available_area
            ),
        ),
        Some(required) => (
            ComplianceStatus::Compliant,
            format!(
                "Available area ({available_area:.2} sq ft) is sufficient for storage \
                 (requires {required:.2} sq ft, surplus {:.2} sq ft)",
                available_area - required
            ),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{bowtie_ft, projection, rect_ft, square_ft};
    use crate::models::HazardCategory;
    use crate::rules::TankSpec;

    fn area(id: &str, geometry: MultiPolygon<f64>) -> CandidateStorageArea {
        CandidateStorageArea {
            id: id.to_string(),
            name: Some(format!("{id} name")),
            amenity: "Free Space".to_string(),
            geometry,
        }
    }

    fn zone(facility_id: &str, category: HazardCategory, geometry: MultiPolygon<f64>) -> BufferZone {
        BufferZone {
            facility_id: facility_id.to_string(),
            facility_name: None,
            hazard_categories: vec![category],
            buffer_distance_ft: 200.0,
            geometry,
        }
    }

    fn run(
        candidates: &[CandidateStorageArea],
        zones: &[BufferZone],
        volume: Option<f64>,
    ) -> StorageEvaluation {
        evaluate(candidates, zones, volume, &SitingRules::default(), &projection()).unwrap()
    }

    fn only_result(evaluation: &StorageEvaluation) -> &ComplianceResult {
        evaluation.results[0].result().expect("evaluated")
    }

    /// Volume whose required area is exactly `sqft`.
    fn volume_for_area(sqft: f64) -> f64 {
        let tank = TankSpec::default();
        sqft / tank.footprint_sqft() * tank.usable_capacity_ft3() * tank.gallons_per_cubic_foot
    }

    #[test]
    fn disjoint_area_is_compliant_with_full_area() {
        let p = projection();
        let candidates = [area("field", square_ft(&p, 1_000.0, 0.0, 100.0))];
        let zones = [zone("terminal", HazardCategory::People, square_ft(&p, -200.0, -200.0, 500.0))];
        let evaluation = run(&candidates, &zones, None);
        let result = only_result(&evaluation);

        assert_eq!(result.compliance_status, ComplianceStatus::Compliant);
        assert_eq!(result.compliance_details, "No safety buffer overlaps");
        assert_eq!(result.available_area_sqft, result.original_area_sqft);
        assert_eq!(result.area_reduction_percent, 0.0);
        assert!(result.overlapping_buffers.is_empty());
        assert!((result.original_area_sqft - 10_000.0).abs() < 0.01);
    }

    #[test]
    fn fully_covered_area_is_non_compliant() {
        let p = projection();
        let candidates = [area("field", square_ft(&p, 0.0, 0.0, 100.0))];
        let zones = [zone("terminal", HazardCategory::People, square_ft(&p, -200.0, -200.0, 500.0))];
        let evaluation = run(&candidates, &zones, None);
        let result = only_result(&evaluation);

        assert_eq!(result.compliance_status, ComplianceStatus::NonCompliant);
        assert_eq!(result.compliance_details, "Area completely covered by safety buffers");
        assert_eq!(result.available_area_sqft, 0.0);
        assert_eq!(result.area_reduction_percent, 100.0);
        assert!(result.available_geometry.is_none());
        assert_eq!(result.overlapping_buffers.len(), 1);
        let overlap = &result.overlapping_buffers[0];
        assert_eq!(overlap.buffer_id, "terminal");
        assert_eq!(overlap.hazard_type, HazardCategory::People);
        assert!((overlap.overlap_area_sqft - 10_000.0).abs() < 0.1);
    }

    #[test]
    fn partial_overlap_without_volume_is_compliant() {
        let p = projection();
        let candidates = [area("field", square_ft(&p, 0.0, 0.0, 100.0))];
        // Covers the western 40 ft of the area.
        let zones = [zone("terminal", HazardCategory::People, rect_ft(&p, -500.0, -50.0, 540.0, 200.0))];
        let evaluation = run(&candidates, &zones, None);
        let result = only_result(&evaluation);

        assert_eq!(result.compliance_status, ComplianceStatus::Compliant);
        assert!((result.available_area_sqft - 6_000.0).abs() < 0.5);
        assert!((result.area_reduction_percent - 40.0).abs() < 0.01);
        assert!((result.overlapping_buffers[0].overlap_area_sqft - 4_000.0).abs() < 0.5);
        assert!(result.available_geometry.is_some());
        assert!(result.compliance_details.contains("no storage volume requested"));
    }

    #[test]
    fn insufficient_remaining_area_reports_both_values() {
        let p = projection();
        let candidates = [area("field", square_ft(&p, 0.0, 0.0, 100.0))];
        let zones = [zone("terminal", HazardCategory::People, rect_ft(&p, -500.0, -50.0, 540.0, 200.0))];
        let volume = volume_for_area(8_000.0);
        let evaluation = run(&candidates, &zones, Some(volume));
        let result = only_result(&evaluation);

        assert_eq!(result.compliance_status, ComplianceStatus::NonCompliant);
        let required = result.required_area_sqft.unwrap();
        assert!((required - 8_000.0).abs() < 1e-6);
        assert!(result
            .compliance_details
            .contains(&format!("{:.2}", result.available_area_sqft)));
        assert!(result.compliance_details.contains(&format!("{required:.2}")));
        assert_eq!(evaluation.summary.non_compliant, 1);
    }

    #[test]
    fn sufficient_remaining_area_is_compliant() {
        let p = projection();
        let candidates = [area("field", square_ft(&p, 0.0, 0.0, 100.0))];
        let zones = [zone("terminal", HazardCategory::People, rect_ft(&p, -500.0, -50.0, 540.0, 200.0))];
        let evaluation = run(&candidates, &zones, Some(volume_for_area(1_000.0)));
        let result = only_result(&evaluation);

        assert_eq!(result.compliance_status, ComplianceStatus::Compliant);
        assert!(result.compliance_details.contains("is sufficient for storage"));
    }

    #[test]
    fn own_buffer_is_ignored() {
        let p = projection();
        let candidates = [area("deicing-pad", square_ft(&p, 0.0, 0.0, 100.0))];
        let zones = [
            zone("deicing-pad", HazardCategory::FlammableLiquids, square_ft(&p, -200.0, -200.0, 500.0)),
            zone("terminal", HazardCategory::People, square_ft(&p, 5_000.0, 5_000.0, 100.0)),
        ];
        let evaluation = run(&candidates, &zones, None);
        let result = only_result(&evaluation);
        assert_eq!(result.compliance_status, ComplianceStatus::Compliant);
        assert_eq!(result.available_area_sqft, result.original_area_sqft);
    }

    #[test]
    fn union_of_overlapping_buffers_is_subtracted_once() {
        let p = projection();
        let candidates = [area("field", square_ft(&p, 0.0, 0.0, 100.0))];
        // Both cover the western half; the second also covers the south 20 ft.
        let zones = [
            zone("terminal", HazardCategory::People, rect_ft(&p, -100.0, -100.0, 150.0, 300.0)),
            zone("fuel", HazardCategory::FlammableLiquids, rect_ft(&p, -100.0, -100.0, 400.0, 120.0)),
        ];
        let evaluation = run(&candidates, &zones, None);
        let result = only_result(&evaluation);
        // Remaining: east half (50 x 100) minus its south 20 ft strip.
        assert!((result.available_area_sqft - 4_000.0).abs() < 0.5);
        assert_eq!(result.overlapping_buffers.len(), 2);
        assert!(result.area_reduction_percent <= 100.0);
    }

    #[test]
    fn sliver_below_epsilon_counts_as_covered() {
        let p = projection();
        let candidates = [area("field", square_ft(&p, 0.0, 0.0, 100.0))];
        // Leaves a 100 ft x 0.005 ft strip uncovered, well under 1 sq ft.
        let zones = [zone("terminal", HazardCategory::People, rect_ft(&p, -50.0, -50.0, 200.0, 149.995))];
        let evaluation = run(&candidates, &zones, None);
        let result = only_result(&evaluation);
        assert_eq!(result.available_area_sqft, 0.0);
        assert_eq!(result.compliance_status, ComplianceStatus::NonCompliant);
    }

    #[test]
    fn one_bad_area_does_not_abort_the_batch() {
        let p = projection();
        let mut broken = square_ft(&p, 0.0, 0.0, 100.0);
        broken.0[0].exterior_mut(|ring| ring.0[1].x = f64::INFINITY);
        let candidates = [
            area("broken", broken),
            area("field", square_ft(&p, 1_000.0, 0.0, 100.0)),
        ];
        let zones = [zone("terminal", HazardCategory::People, square_ft(&p, -200.0, -200.0, 100.0))];
        let evaluation = run(&candidates, &zones, None);

        assert_eq!(evaluation.summary.total, 2);
        assert_eq!(evaluation.summary.failed, 1);
        assert_eq!(evaluation.summary.compliant, 1);
        assert!(matches!(evaluation.find("broken"), Some(AreaEvaluation::Failed(_))));
        assert!(matches!(evaluation.find("field"), Some(AreaEvaluation::Evaluated(_))));
    }

    #[test]
    fn empty_inputs_are_errors() {
        let p = projection();
        let rules = SitingRules::default();
        let zones = [zone("terminal", HazardCategory::People, square_ft(&p, 0.0, 0.0, 100.0))];
        let candidates = [area("field", square_ft(&p, 0.0, 0.0, 100.0))];

        assert!(matches!(
            evaluate(&[], &zones, None, &rules, &p),
            Err(ComplianceEvaluationError::NoCandidateAreas)
        ));
        assert!(matches!(
            evaluate(&candidates, &[], None, &rules, &p),
            Err(ComplianceEvaluationError::NoBufferZones)
        ));
        assert!(matches!(
            evaluate(&candidates, &zones, Some(-5.0), &rules, &p),
            Err(ComplianceEvaluationError::InvalidVolume(_))
        ));
    }

    #[test]
    fn degenerate_area_has_zero_reduction() {
        let p = projection();
        let flat = rect_ft(&p, 0.0, 0.0, 100.0, 0.0);
        let zones = [zone("terminal", HazardCategory::People, square_ft(&p, 5_000.0, 5_000.0, 100.0))];
        let evaluation = run(&[area("flat", flat)], &zones, None);
        let result = only_result(&evaluation);
        assert_eq!(result.area_reduction_percent, 0.0);
    }

    #[test]
    fn self_intersecting_area_fails_alone() {
        let p = projection();
        let candidates = [
            area("crossed", bowtie_ft(&p, 0.0, 0.0, 100.0)),
            area("field", square_ft(&p, 1_000.0, 0.0, 100.0)),
        ];
        // Covers only the western 30 ft of the crossed area.
        let zones = [zone("terminal", HazardCategory::People, rect_ft(&p, -100.0, -50.0, 130.0, 200.0))];
        let evaluation = run(&candidates, &zones, None);

        assert_eq!(evaluation.summary.failed, 1);
        assert_eq!(evaluation.summary.compliant, 1);
        assert_eq!(evaluation.summary.non_compliant, 0);
        match evaluation.find("crossed") {
            Some(AreaEvaluation::Failed(failure)) => {
                assert!(failure.error.contains("self-intersecting"), "{}", failure.error);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
