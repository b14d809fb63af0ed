//! Siting rules: tunables, regulatory distance resolution and tank sizing.

use serde::{Deserialize, Serialize};

use crate::error::{GeometryError, NoMatchingRegulationError, RequirementResolutionError};
use crate::models::{HazardCategory, RequirementRule};
use crate::projection::{PlanarProjection, DEFAULT_MAX_VERTICES, GEORGIA_WEST_PROJ};

/// Configuration for siting analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitingRules {
    /// PROJ.4 string of the planar system (linear unit metres)
    pub planar_proj: String,
    /// Douglas-Peucker tolerance applied to buffer boundaries, in feet
    pub simplify_tolerance_ft: f64,
    /// Areas below this are treated as zero, in square feet
    pub sliver_epsilon_sqft: f64,
    /// Maximum vertex count accepted per geometry
    pub max_vertices: usize,
    /// Facility amenities that count as candidate storage areas
    pub candidate_amenities: Vec<String>,
    pub tank: TankSpec,
}

impl Default for SitingRules {
    fn default() -> Self {
        Self {
            planar_proj: GEORGIA_WEST_PROJ.to_string(),
            simplify_tolerance_ft: 0.1,
            sliver_epsilon_sqft: 1.0,
            max_vertices: DEFAULT_MAX_VERTICES,
            candidate_amenities: vec!["Free Space".into(), "Deicing".into()],
            tank: TankSpec::default(),
        }
    }
}

impl SitingRules {
    /// Build the planar projection these rules describe.
    pub fn projection(&self) -> Result<PlanarProjection, GeometryError> {
        Ok(PlanarProjection::new(&self.planar_proj)?.with_max_vertices(self.max_vertices))
    }

    pub fn is_candidate_amenity(&self, amenity: &str) -> bool {
        self.candidate_amenities
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(amenity))
    }
}

/// Engineering constants of the liquid hydrogen tank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TankSpec {
    pub width_ft: f64,
    pub length_ft: f64,
    pub water_capacity_gal: f64,
    /// Fraction of the vessel kept as vapour space
    pub ullage: f64,
    /// Fraction retained after boil-off
    pub evaporation_retention: f64,
    pub gallons_per_cubic_foot: f64,
}

impl Default for TankSpec {
    fn default() -> Self {
        Self {
            width_ft: 10.1667,
            length_ft: 56.5,
            water_capacity_gal: 18_014.0,
            ullage: 0.05,
            evaporation_retention: 0.9925,
            gallons_per_cubic_foot: 7.48052,
        }
    }
}

impl TankSpec {
    pub fn footprint_sqft(&self) -> f64 {
        self.width_ft * self.length_ft
    }

    /// Usable hydrogen volume per tank in cubic feet.
    pub fn usable_capacity_ft3(&self) -> f64 {
        let water_capacity_ft3 = self.water_capacity_gal / self.gallons_per_cubic_foot;
        water_capacity_ft3 * (1.0 - self.ullage) * self.evaporation_retention
    }

    /// Number of tanks needed for a volume, kept fractional.
    pub fn tanks_for(&self, volume_gal: f64) -> f64 {
        let volume_ft3 = volume_gal / self.gallons_per_cubic_foot;
        volume_ft3 / self.usable_capacity_ft3()
    }
}

/// Ground area needed to store `volume_gal` of hydrogen.
pub fn required_area_sqft(volume_gal: f64, tank: &TankSpec) -> f64 {
    tank.tanks_for(volume_gal) * tank.footprint_sqft()
}

/// Binding safety distance per hazard category, in feet. Zero means no
/// rule matched and no buffer is generated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RequiredDistances {
    pub people: f64,
    pub flammable_liquids: f64,
    pub open_fire: f64,
}

impl RequiredDistances {
    pub fn get(&self, category: HazardCategory) -> f64 {
        match category {
            HazardCategory::People => self.people,
            HazardCategory::FlammableLiquids => self.flammable_liquids,
            HazardCategory::OpenFire => self.open_fire,
        }
    }

    fn raise(&mut self, category: HazardCategory, distance_ft: f64) {
        let slot = match category {
            HazardCategory::People => &mut self.people,
            HazardCategory::FlammableLiquids => &mut self.flammable_liquids,
            HazardCategory::OpenFire => &mut self.open_fire,
        };
        *slot = slot.max(distance_ft);
    }
}

/// Resolve the maximum required distance per category across all rules.
///
/// The most conservative matching row binds, not the first one.
pub fn resolve_max_distances(
    rules: &[RequirementRule],
) -> Result<RequiredDistances, RequirementResolutionError> {
    if rules.is_empty() {
        return Err(RequirementResolutionError::EmptyTable);
    }

    let mut distances = RequiredDistances::default();
    for rule in rules {
        for category in rule.categories() {
            distances.raise(category, rule.safety_distance_ft);
        }
    }

    tracing::debug!(
        people = distances.people,
        flammable_liquids = distances.flammable_liquids,
        open_fire = distances.open_fire,
        "Resolved maximum safety distances"
    );
    Ok(distances)
}

/// First rule whose volume range contains `volume_gal`.
pub fn required_distance_for_volume(
    rules: &[RequirementRule],
    volume_gal: f64,
) -> Result<&RequirementRule, NoMatchingRegulationError> {
    rules
        .iter()
        .find(|rule| rule.covers_volume(volume_gal))
        .ok_or(NoMatchingRegulationError {
            storage_volume_gal: volume_gal,
        })
}
