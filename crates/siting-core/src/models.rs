//! Data model for facilities, requirement rules, buffer zones and
//! compliance results.

use chrono::{DateTime, Utc};
use geo::MultiPolygon;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Hazard a facility can pose to a hydrogen storage site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HazardCategory {
    #[serde(rename = "contains_people", alias = "people")]
    People,
    #[serde(rename = "contains_flammable_liquids", alias = "flammable_liquids")]
    FlammableLiquids,
    #[serde(rename = "contains_open_fire", alias = "open_fire")]
    OpenFire,
}

impl HazardCategory {
    pub const ALL: [HazardCategory; 3] = [
        HazardCategory::People,
        HazardCategory::FlammableLiquids,
        HazardCategory::OpenFire,
    ];

    /// Attribute key used in facility `distance_requirements`.
    pub fn key(self) -> &'static str {
        match self {
            HazardCategory::People => "contains_people",
            HazardCategory::FlammableLiquids => "contains_flammable_liquids",
            HazardCategory::OpenFire => "contains_open_fire",
        }
    }

    /// Keyword looked for in free-text regulation descriptions.
    pub fn keyword(self) -> &'static str {
        match self {
            HazardCategory::People => "people",
            HazardCategory::FlammableLiquids => "flammable liquids",
            HazardCategory::OpenFire => "open fire",
        }
    }

    /// Parse an explicit rule tag. Accepts both the short form
    /// (`open_fire`) and the attribute key (`contains_open_fire`).
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        let tag = tag.strip_prefix("contains_").unwrap_or(&tag);
        match tag {
            "people" => Some(HazardCategory::People),
            "flammable_liquids" => Some(HazardCategory::FlammableLiquids),
            "open_fire" => Some(HazardCategory::OpenFire),
            _ => None,
        }
    }
}

impl fmt::Display for HazardCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Hazard flags of a facility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HazardFlags {
    #[serde(default)]
    pub contains_people: bool,
    #[serde(default)]
    pub contains_flammable_liquids: bool,
    #[serde(default)]
    pub contains_open_fire: bool,
}

impl HazardFlags {
    pub fn is_flagged(&self, category: HazardCategory) -> bool {
        match category {
            HazardCategory::People => self.contains_people,
            HazardCategory::FlammableLiquids => self.contains_flammable_liquids,
            HazardCategory::OpenFire => self.contains_open_fire,
        }
    }

    /// Categories this facility is flagged with, in canonical order.
    pub fn flagged(&self) -> impl Iterator<Item = HazardCategory> + '_ {
        HazardCategory::ALL
            .into_iter()
            .filter(|category| self.is_flagged(*category))
    }

    pub fn any(&self) -> bool {
        self.flagged().next().is_some()
    }
}

/// Normalised `distance_requirements` attribute.
///
/// Source data carries either a mapping, a JSON string holding a mapping,
/// or nothing at all. Loading collapses those forms into this type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DistanceRequirements {
    Parsed(HazardFlags),
    #[default]
    Empty,
}

impl DistanceRequirements {
    pub fn flags(&self) -> HazardFlags {
        match self {
            DistanceRequirements::Parsed(flags) => *flags,
            DistanceRequirements::Empty => HazardFlags::default(),
        }
    }
}

/// An airport facility polygon in global (lon/lat degree) coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Facility {
    /// Stable identity: explicit id, else the name.
    pub id: String,
    pub name: Option<String>,
    pub amenity: String,
    pub distance_requirements: DistanceRequirements,
    pub geometry: MultiPolygon<f64>,
}

impl Facility {
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// A location that may be able to host hydrogen tanks.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateStorageArea {
    pub id: String,
    pub name: Option<String>,
    pub amenity: String,
    pub geometry: MultiPolygon<f64>,
}

impl From<&Facility> for CandidateStorageArea {
    fn from(facility: &Facility) -> Self {
        Self {
            id: facility.id.clone(),
            name: facility.name.clone(),
            amenity: facility.amenity.clone(),
            geometry: facility.geometry.clone(),
        }
    }
}

/// One row of the regulatory distance table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regulation_name: Option<String>,
    pub regulation_info: String,
    pub storage_gal_min: Option<f64>,
    pub storage_gal_max: Option<f64>,
    pub safety_distance_ft: f64,
    /// Explicit category tags; when absent the categories are derived from
    /// keywords in `regulation_info`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hazard_categories: Option<Vec<HazardCategory>>,
}

impl RequirementRule {
    /// Categories this rule applies to.
    pub fn categories(&self) -> Vec<HazardCategory> {
        if let Some(tags) = &self.hazard_categories {
            return tags.clone();
        }
        let info = self.regulation_info.to_lowercase();
        HazardCategory::ALL
            .into_iter()
            .filter(|category| info.contains(category.keyword()))
            .collect()
    }

    pub fn applies_to(&self, category: HazardCategory) -> bool {
        self.categories().contains(&category)
    }

    /// Inclusive volume range check; a missing bound is open.
    pub fn covers_volume(&self, volume_gal: f64) -> bool {
        let min = self.storage_gal_min.unwrap_or(0.0);
        let max = self.storage_gal_max.unwrap_or(f64::INFINITY);
        min <= volume_gal && volume_gal <= max
    }

    pub fn label(&self) -> &str {
        self.regulation_name.as_deref().unwrap_or(&self.regulation_info)
    }
}

/// A safety buffer around one facility for one hazard category.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferZone {
    pub facility_id: String,
    pub facility_name: Option<String>,
    /// Always a single category today; kept as a list so buffers can later
    /// be merged across categories.
    pub hazard_categories: Vec<HazardCategory>,
    pub buffer_distance_ft: f64,
    /// Buffered geometry in global coordinates.
    pub geometry: MultiPolygon<f64>,
}

impl BufferZone {
    pub fn category(&self) -> Option<HazardCategory> {
        self.hazard_categories.first().copied()
    }

    pub fn category_label(&self) -> String {
        self.hazard_categories
            .iter()
            .map(|category| category.key())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Named output of one buffer generation run.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferZoneCollection {
    pub name: String,
    pub generated_at: DateTime<Utc>,
    pub zones: Vec<BufferZone>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComplianceStatus {
    Compliant,
    NonCompliant,
}

/// A buffer zone that overlaps a candidate area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlappingBuffer {
    pub buffer_id: String,
    pub facility_name: Option<String>,
    pub hazard_type: HazardCategory,
    pub buffer_distance_ft: f64,
    pub overlap_area_sqft: f64,
}

/// Per-area output of the storage-area compliance engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplianceResult {
    pub area_id: String,
    pub area_name: Option<String>,
    pub area_type: String,
    pub original_area_sqft: f64,
    pub available_area_sqft: f64,
    pub area_reduction_percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_area_sqft: Option<f64>,
    pub overlapping_buffers: Vec<OverlappingBuffer>,
    pub compliance_status: ComplianceStatus,
    pub compliance_details: String,
    /// Remaining usable geometry in global coordinates, absent when the
    /// area is completely covered.
    pub available_geometry: Option<geojson::Geometry>,
}

/// An area whose evaluation failed; other areas are unaffected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaFailure {
    pub area_id: String,
    pub area_name: Option<String>,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AreaEvaluation {
    Evaluated(ComplianceResult),
    Failed(AreaFailure),
}

impl AreaEvaluation {
    pub fn area_id(&self) -> &str {
        match self {
            AreaEvaluation::Evaluated(result) => &result.area_id,
            AreaEvaluation::Failed(failure) => &failure.area_id,
        }
    }

    pub fn result(&self) -> Option<&ComplianceResult> {
        match self {
            AreaEvaluation::Evaluated(result) => Some(result),
            AreaEvaluation::Failed(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EvaluationSummary {
    pub total: usize,
    pub compliant: usize,
    pub non_compliant: usize,
    pub failed: usize,
}

/// Batch output of the storage-area compliance engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageEvaluation {
    pub storage_volume_gal: Option<f64>,
    pub required_area_sqft: Option<f64>,
    pub summary: EvaluationSummary,
    pub results: Vec<AreaEvaluation>,
}

impl StorageEvaluation {
    pub fn find(&self, area_id: &str) -> Option<&AreaEvaluation> {
        self.results.iter().find(|result| result.area_id() == area_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Output of the point-distance compliance check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplianceVerdict {
    pub area_id: Option<String>,
    pub centroid: LatLng,
    pub storage_volume_gal: f64,
    pub regulation: String,
    pub required_distance_ft: f64,
    pub actual_distance_ft: f64,
    pub nearest_category: HazardCategory,
    pub distances_by_category: BTreeMap<HazardCategory, f64>,
    pub compliant: bool,
    pub reason: String,
}
