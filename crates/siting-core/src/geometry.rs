//! Polygon validation, GeoJSON conversion and guarded boolean operations.

use geo::{BooleanOps, Buffer, Coord, CoordsIter, LineString, MultiPolygon, Polygon, Validation};
use std::panic::{self, AssertUnwindSafe};

use crate::error::GeometryError;

type Position = Vec<f64>;
type Ring = Vec<Position>;

/// Convert a GeoJSON geometry value into a multipolygon.
///
/// Rings must already be closed, hold at least four positions and have
/// finite coordinates. Nothing is repaired here.
pub fn multipolygon_from_geojson(value: &geojson::Value) -> Result<MultiPolygon<f64>, GeometryError> {
    match value {
        geojson::Value::Polygon(rings) => Ok(MultiPolygon::new(vec![polygon_from_rings(rings)?])),
        geojson::Value::MultiPolygon(polygons) => {
            let polygons = polygons
                .iter()
                .map(|rings| polygon_from_rings(rings))
                .collect::<Result<Vec<_>, _>>()?;
            if polygons.is_empty() {
                return Err(GeometryError::Empty);
            }
            Ok(MultiPolygon::new(polygons))
        }
        other => Err(GeometryError::Unsupported(other.type_name().to_string())),
    }
}

fn polygon_from_rings(rings: &[Ring]) -> Result<Polygon<f64>, GeometryError> {
    let mut rings = rings.iter().map(|ring| ring_from_positions(ring));
    let exterior = rings.next().ok_or(GeometryError::Empty)??;
    let interiors = rings.collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn ring_from_positions(positions: &[Position]) -> Result<LineString<f64>, GeometryError> {
    if positions.len() < 4 {
        return Err(GeometryError::TooFewPositions {
            count: positions.len(),
        });
    }

    let coords = positions
        .iter()
        .map(|position| {
            let x = position.first().copied().unwrap_or(f64::NAN);
            let y = position.get(1).copied().unwrap_or(f64::NAN);
            if x.is_finite() && y.is_finite() {
                Ok(Coord { x, y })
            } else {
                Err(GeometryError::NonFinite { x, y })
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    let first = coords[0];
    let last = coords[coords.len() - 1];
    if first != last {
        return Err(GeometryError::UnclosedRing {
            first_x: first.x,
            first_y: first.y,
            last_x: last.x,
            last_y: last.y,
        });
    }

    Ok(LineString::new(coords))
}

fn ring_to_positions(ring: &LineString<f64>) -> Ring {
    ring.0.iter().map(|c| vec![c.x, c.y]).collect()
}

fn polygon_to_rings(poly: &Polygon<f64>) -> Vec<Ring> {
    let mut rings = vec![ring_to_positions(poly.exterior())];
    rings.extend(poly.interiors().iter().map(ring_to_positions));
    rings
}

/// Convert a multipolygon to a GeoJSON geometry value, collapsing a single
/// polygon to `Polygon`.
pub fn multipolygon_to_geojson(mp: &MultiPolygon<f64>) -> geojson::Value {
    match mp.0.as_slice() {
        [single] => geojson::Value::Polygon(polygon_to_rings(single)),
        polygons => geojson::Value::MultiPolygon(polygons.iter().map(polygon_to_rings).collect()),
    }
}

/// Reject non-finite coordinates and geometries over the vertex budget.
pub fn validate(mp: &MultiPolygon<f64>, max_vertices: usize) -> Result<(), GeometryError> {
    if mp.0.is_empty() {
        return Err(GeometryError::Empty);
    }
    let count = mp.coords_count();
    if count > max_vertices {
        return Err(GeometryError::VertexBudgetExceeded {
            count,
            budget: max_vertices,
        });
    }
    if let Some(bad) = mp.coords_iter().find(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return Err(GeometryError::NonFinite { x: bad.x, y: bad.y });
    }
    Ok(())
}

/// Lon/lat coordinate check: finite and inside the geographic range.
pub fn check_lon_lat(coord: Coord<f64>) -> Result<Coord<f64>, GeometryError> {
    if !coord.x.is_finite() || !coord.y.is_finite() {
        return Err(GeometryError::NonFinite { x: coord.x, y: coord.y });
    }
    if !(-180.0..=180.0).contains(&coord.x) || !(-90.0..=90.0).contains(&coord.y) {
        return Err(GeometryError::OutOfRange { x: coord.x, y: coord.y });
    }
    Ok(coord)
}

/// [`validate`] for lon/lat input, additionally rejecting out-of-range
/// coordinates and self-intersecting polygons.
///
/// Polygons with fewer than three distinct exterior vertices have no
/// extent; they are let through so callers see a zero area.
pub fn validate_global(mp: &MultiPolygon<f64>, max_vertices: usize) -> Result<(), GeometryError> {
    validate(mp, max_vertices)?;
    for coord in mp.coords_iter() {
        check_lon_lat(coord)?;
    }
    for polygon in &mp.0 {
        if !is_collapsed(polygon) && !polygon.is_valid() {
            return Err(GeometryError::Invalid);
        }
    }
    Ok(())
}

fn is_collapsed(polygon: &Polygon<f64>) -> bool {
    let mut distinct: Vec<Coord<f64>> = Vec::with_capacity(3);
    for coord in &polygon.exterior().0 {
        if !distinct.contains(coord) {
            distinct.push(*coord);
            if distinct.len() >= 3 {
                return false;
            }
        }
    }
    true
}

/// Planar intersection. The overlay engine can panic on degenerate input,
/// which is reported as a geometry error instead.
pub fn intersection(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> Result<MultiPolygon<f64>, GeometryError> {
    panic::catch_unwind(AssertUnwindSafe(|| a.intersection(b)))
        .map_err(|_| GeometryError::BooleanOp("intersection"))
}

/// Planar difference `a - b`, guarded like [`intersection`].
pub fn difference(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> Result<MultiPolygon<f64>, GeometryError> {
    panic::catch_unwind(AssertUnwindSafe(|| a.difference(b)))
        .map_err(|_| GeometryError::BooleanOp("difference"))
}

/// Outward planar offset with round joins, guarded like [`intersection`].
pub fn buffer(mp: &MultiPolygon<f64>, distance: f64) -> Result<MultiPolygon<f64>, GeometryError> {
    panic::catch_unwind(AssertUnwindSafe(|| mp.buffer(distance)))
        .map_err(|_| GeometryError::BooleanOp("buffer"))
}

/// Mean of the exterior-ring vertices of the first polygon, as listed.
///
/// This is a vertex average, not an area-weighted centroid. A closed ring's
/// repeated closing vertex is counted. Returns `None` for an empty geometry.
pub fn vertex_average(mp: &MultiPolygon<f64>) -> Option<Coord<f64>> {
    let ring = mp.0.first()?.exterior();
    if ring.0.is_empty() {
        return None;
    }
    let n = ring.0.len() as f64;
    let (sx, sy) = ring
        .0
        .iter()
        .fold((0.0, 0.0), |(sx, sy), c| (sx + c.x, sy + c.y));
    Some(Coord { x: sx / n, y: sy / n })
}
