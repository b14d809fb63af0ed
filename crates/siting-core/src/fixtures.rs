//! Shared test fixtures: planar squares near Hartsfield-Jackson and
//! facility/rule builders.

use geo::{polygon, Coord, MultiPolygon};

use crate::models::{DistanceRequirements, Facility, HazardFlags, RequirementRule};
use crate::projection::PlanarProjection;

/// Near the main terminal at Hartsfield-Jackson.
pub(crate) const ORIGIN: Coord<f64> = Coord { x: -84.4277, y: 33.6407 };

pub(crate) fn projection() -> PlanarProjection {
    PlanarProjection::georgia_west().unwrap()
}

/// Axis-aligned planar square, given in feet offsets from [`ORIGIN`],
/// returned in global coordinates.
pub(crate) fn square_ft(projection: &PlanarProjection, x0: f64, y0: f64, side: f64) -> MultiPolygon<f64> {
    rect_ft(projection, x0, y0, side, side)
}

pub(crate) fn rect_ft(
    projection: &PlanarProjection,
    x0: f64,
    y0: f64,
    width: f64,
    height: f64,
) -> MultiPolygon<f64> {
    let origin = projection.coord_to_planar(ORIGIN).unwrap();
    let (x, y) = (origin.x + x0, origin.y + y0);
    let planar = MultiPolygon::new(vec![polygon![
        (x: x, y: y),
        (x: x + width, y: y),
        (x: x + width, y: y + height),
        (x: x, y: y + height),
        (x: x, y: y),
    ]]);
    projection.to_global(&planar).unwrap()
}

/// Self-intersecting "bowtie" over the square at the given planar offset.
pub(crate) fn bowtie_ft(projection: &PlanarProjection, x0: f64, y0: f64, side: f64) -> MultiPolygon<f64> {
    let origin = projection.coord_to_planar(ORIGIN).unwrap();
    let (x, y) = (origin.x + x0, origin.y + y0);
    let planar = MultiPolygon::new(vec![polygon![
        (x: x, y: y),
        (x: x + side, y: y + side),
        (x: x + side, y: y),
        (x: x, y: y + side),
        (x: x, y: y),
    ]]);
    projection.to_global(&planar).unwrap()
}

/// Global coordinate of a planar offset from [`ORIGIN`].
pub(crate) fn point_ft(projection: &PlanarProjection, dx: f64, dy: f64) -> Coord<f64> {
    let origin = projection.coord_to_planar(ORIGIN).unwrap();
    projection
        .coord_to_global(Coord { x: origin.x + dx, y: origin.y + dy })
        .unwrap()
}

pub(crate) fn people() -> DistanceRequirements {
    DistanceRequirements::Parsed(HazardFlags {
        contains_people: true,
        ..HazardFlags::default()
    })
}

pub(crate) fn facility(
    id: &str,
    amenity: &str,
    requirements: DistanceRequirements,
    geometry: MultiPolygon<f64>,
) -> Facility {
    Facility {
        id: id.to_string(),
        name: Some(format!("{id} name")),
        amenity: amenity.to_string(),
        distance_requirements: requirements,
        geometry,
    }
}

pub(crate) fn rule(info: &str, min: Option<f64>, max: Option<f64>, ft: f64) -> RequirementRule {
    RequirementRule {
        regulation_name: None,
        regulation_info: info.to_string(),
        storage_gal_min: min,
        storage_gal_max: max,
        safety_distance_ft: ft,
        hazard_categories: None,
    }
}
