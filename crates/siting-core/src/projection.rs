//! Conversion between global lon/lat degrees and the local planar system.
//!
//! All area, distance, buffering and boolean work happens in planar US
//! survey feet. The default planar system is NAD83 / Georgia West
//! (transverse Mercator), which covers the airport's extent.

use geo::{Area, Coord, MapCoords, MultiPolygon};
use proj4rs::{proj::Proj, transform::transform};

use crate::error::GeometryError;
use crate::geometry;

/// NAD83 / Georgia West expressed in metres; output is rescaled to US feet.
pub const GEORGIA_WEST_PROJ: &str = "+proj=tmerc +lat_0=30 +lon_0=-84.16666666666667 +k=0.9999 \
     +x_0=699999.9998983998 +y_0=0 +ellps=GRS80 +units=m +no_defs";

const GEOGRAPHIC_PROJ: &str = "+proj=longlat +ellps=GRS80 +no_defs";

/// Metres in one US survey foot.
pub const METERS_PER_US_FOOT: f64 = 1200.0 / 3937.0;

pub const DEFAULT_MAX_VERTICES: usize = 50_000;

/// Fixed planar projection used for every metric operation.
pub struct PlanarProjection {
    geographic: Proj,
    planar: Proj,
    proj_string: String,
    max_vertices: usize,
}

impl std::fmt::Debug for PlanarProjection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanarProjection")
            .field("proj_string", &self.proj_string)
            .field("max_vertices", &self.max_vertices)
            .finish()
    }
}

impl PlanarProjection {
    /// Build from a PROJ.4 string whose linear unit is metres.
    pub fn new(proj_string: &str) -> Result<Self, GeometryError> {
        let geographic = Proj::from_proj_string(GEOGRAPHIC_PROJ)
            .map_err(|e| GeometryError::Projection(format!("{GEOGRAPHIC_PROJ}: {e}")))?;
        let planar = Proj::from_proj_string(proj_string)
            .map_err(|e| GeometryError::Projection(format!("{proj_string}: {e}")))?;
        Ok(Self {
            geographic,
            planar,
            proj_string: proj_string.to_string(),
            max_vertices: DEFAULT_MAX_VERTICES,
        })
    }

    pub fn georgia_west() -> Result<Self, GeometryError> {
        Self::new(GEORGIA_WEST_PROJ)
    }

    /// Geometries above this vertex count are rejected before any work.
    pub fn with_max_vertices(mut self, max_vertices: usize) -> Self {
        self.max_vertices = max_vertices;
        self
    }

    pub fn max_vertices(&self) -> usize {
        self.max_vertices
    }

    pub fn proj_string(&self) -> &str {
        &self.proj_string
    }

    /// Project a single lon/lat coordinate to planar feet.
    pub fn coord_to_planar(&self, coord: Coord<f64>) -> Result<Coord<f64>, GeometryError> {
        let coord = geometry::check_lon_lat(coord)?;
        let mut point = (coord.x.to_radians(), coord.y.to_radians(), 0.0);
        transform(&self.geographic, &self.planar, &mut point)
            .map_err(|e| GeometryError::Projection(e.to_string()))?;
        finite(Coord {
            x: point.0 / METERS_PER_US_FOOT,
            y: point.1 / METERS_PER_US_FOOT,
        })
    }

    /// Unproject a planar feet coordinate back to lon/lat degrees.
    pub fn coord_to_global(&self, coord: Coord<f64>) -> Result<Coord<f64>, GeometryError> {
        if !coord.x.is_finite() || !coord.y.is_finite() {
            return Err(GeometryError::NonFinite { x: coord.x, y: coord.y });
        }
        let mut point = (coord.x * METERS_PER_US_FOOT, coord.y * METERS_PER_US_FOOT, 0.0);
        transform(&self.planar, &self.geographic, &mut point)
            .map_err(|e| GeometryError::Projection(e.to_string()))?;
        finite(Coord {
            x: point.0.to_degrees(),
            y: point.1.to_degrees(),
        })
    }

    pub fn to_planar(&self, mp: &MultiPolygon<f64>) -> Result<MultiPolygon<f64>, GeometryError> {
        geometry::validate_global(mp, self.max_vertices)?;
        mp.try_map_coords(|c| self.coord_to_planar(c))
    }

    pub fn to_global(&self, mp: &MultiPolygon<f64>) -> Result<MultiPolygon<f64>, GeometryError> {
        geometry::validate(mp, self.max_vertices)?;
        mp.try_map_coords(|c| self.coord_to_global(c))
    }

    /// Area in square feet of a global geometry.
    pub fn area_sqft(&self, mp: &MultiPolygon<f64>) -> Result<f64, GeometryError> {
        Ok(self.to_planar(mp)?.unsigned_area())
    }
}

fn finite(coord: Coord<f64>) -> Result<Coord<f64>, GeometryError> {
    if coord.x.is_finite() && coord.y.is_finite() {
        Ok(coord)
    } else {
        Err(GeometryError::NonFinite { x: coord.x, y: coord.y })
    }
}
