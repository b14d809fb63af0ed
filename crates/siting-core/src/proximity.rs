//! Point-distance compliance check.
//!
//! A lighter path than the polygon engine: the candidate area is reduced to
//! a single centroid and compared against lists of hazard points.

use geo::{Coord, Distance, Geodesic, MultiPolygon, Point};
use std::collections::BTreeMap;

use crate::error::{ComplianceEvaluationError, GeometryError};
use crate::geometry;
use crate::models::{ComplianceVerdict, HazardCategory, LatLng, RequirementRule};
use crate::rules::required_distance_for_volume;

/// International foot, used for reported geodesic distances.
pub const METERS_PER_FOOT: f64 = 0.3048;

/// Geodesic (WGS84 ellipsoid) distance between two points, in feet.
pub fn geodesic_distance_ft(a: LatLng, b: LatLng) -> f64 {
    let meters = Geodesic.distance(Point::new(a.lng, a.lat), Point::new(b.lng, b.lat));
    meters / METERS_PER_FOOT
}

/// Vertex average of the area's exterior ring, as `(lat, lng)`.
///
/// Not area-weighted, so for irregular non-convex areas the point can fall
/// outside the polygon.
pub fn area_centroid(mp: &MultiPolygon<f64>) -> Option<LatLng> {
    geometry::vertex_average(mp).map(|c| LatLng::new(c.y, c.x))
}

fn check_point(point: LatLng) -> Result<LatLng, GeometryError> {
    geometry::check_lon_lat(Coord { x: point.lng, y: point.lat })?;
    Ok(point)
}

/// Compare the nearest hazard point against the regulation distance for
/// `storage_volume_gal`.
///
/// Categories with no points contribute nothing. If no category has any
/// point, or no rule covers the volume, the check fails instead of
/// returning a verdict.
pub fn check(
    area_id: Option<&str>,
    centroid: LatLng,
    hazard_points_by_category: &BTreeMap<HazardCategory, Vec<LatLng>>,
    storage_volume_gal: f64,
    rules: &[RequirementRule],
) -> Result<ComplianceVerdict, ComplianceEvaluationError> {
    let centroid = check_point(centroid)?;
    if !storage_volume_gal.is_finite() || storage_volume_gal <= 0.0 {
        return Err(ComplianceEvaluationError::InvalidVolume(storage_volume_gal));
    }

    let mut distances_by_category = BTreeMap::new();
    for (category, points) in hazard_points_by_category {
        let mut nearest: Option<f64> = None;
        for point in points {
            let distance = geodesic_distance_ft(centroid, check_point(*point)?);
            nearest = Some(nearest.map_or(distance, |d| d.min(distance)));
        }
        if let Some(distance) = nearest {
            distances_by_category.insert(*category, distance);
        }
    }

    let (nearest_category, actual_distance_ft) = distances_by_category
        .iter()
        .min_by(|a, b| a.1.total_cmp(b.1))
        .map(|(category, distance)| (*category, *distance))
        .ok_or(ComplianceEvaluationError::NoHazardPoints)?;

    let rule = required_distance_for_volume(rules, storage_volume_gal)?;
    let required_distance_ft = rule.safety_distance_ft;
    let compliant = actual_distance_ft >= required_distance_ft;

    let reason = if compliant {
        format!(
            "Nearest hazard ({nearest_category}) is {actual_distance_ft:.2} ft away, \
             meeting the required {required_distance_ft:.2} ft"
        )
    } else {
        format!(
            "Nearest hazard ({nearest_category}) is {actual_distance_ft:.2} ft away, \
             less than the required {required_distance_ft:.2} ft"
        )
    };
    tracing::debug!(?area_id, actual_distance_ft, required_distance_ft, compliant, "Point-distance check");

    Ok(ComplianceVerdict {
        area_id: area_id.map(str::to_string),
        centroid,
        storage_volume_gal,
        regulation: rule.label().to_string(),
        required_distance_ft,
        actual_distance_ft,
        nearest_category,
        distances_by_category,
        compliant,
        reason,
    })
}
