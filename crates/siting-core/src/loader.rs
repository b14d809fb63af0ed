//! Data-loading boundary: facility GeoJSON and the requirement table.
//!
//! Everything loose in the source data is normalised here so the engine
//! only sees typed, validated values.

use geojson::{feature::Id, Feature, FeatureCollection, JsonObject, JsonValue};
use std::io::Read;
use std::path::Path;

use crate::error::{LoadError, RequirementResolutionError};
use crate::geometry;
use crate::models::{
    CandidateStorageArea, DistanceRequirements, Facility, HazardCategory, HazardFlags,
    RequirementRule,
};
use crate::rules::SitingRules;

const DEFAULT_AMENITY: &str = "Unspecified";

fn read_to_string(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Load the facility FeatureCollection from disk.
pub fn load_facilities(path: &Path) -> Result<Vec<Facility>, LoadError> {
    let raw = read_to_string(path)?;
    let collection: FeatureCollection = raw.parse()?;
    let facilities = parse_facilities(&collection)?;
    tracing::info!(count = facilities.len(), path = %path.display(), "Loaded facilities");
    Ok(facilities)
}

/// Convert features into facilities. Only Polygon and MultiPolygon
/// geometries are accepted; any invalid feature fails the load.
pub fn parse_facilities(collection: &FeatureCollection) -> Result<Vec<Facility>, LoadError> {
    collection
        .features
        .iter()
        .enumerate()
        .map(|(index, feature)| parse_facility(index, feature))
        .collect()
}

fn parse_facility(index: usize, feature: &Feature) -> Result<Facility, LoadError> {
    let value = feature
        .geometry
        .as_ref()
        .map(|g| &g.value)
        .ok_or(LoadError::MissingGeometry { index })?;
    let geometry = geometry::multipolygon_from_geojson(value)
        .map_err(|source| LoadError::Geometry { index, source })?;

    let empty = JsonObject::new();
    let properties = feature.properties.as_ref().unwrap_or(&empty);
    let name = string_property(properties, "name");
    let id = properties
        .get("id")
        .and_then(json_identity)
        .or_else(|| feature.id.as_ref().map(feature_identity))
        .or_else(|| name.clone())
        .unwrap_or_else(|| format!("feature-{index}"));
    let amenity = string_property(properties, "amenity").unwrap_or_else(|| DEFAULT_AMENITY.to_string());
    let distance_requirements = parse_distance_requirements(&id, properties.get("distance_requirements"));

    Ok(Facility {
        id,
        name,
        amenity,
        distance_requirements,
        geometry,
    })
}

fn string_property(properties: &JsonObject, key: &str) -> Option<String> {
    properties
        .get(key)
        .and_then(JsonValue::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn json_identity(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn feature_identity(id: &Id) -> String {
    match id {
        Id::String(s) => s.clone(),
        Id::Number(n) => n.to_string(),
    }
}

/// Normalise the `distance_requirements` attribute.
///
/// A mapping is read directly; a string is parsed as JSON first. Parse
/// failures and anything else yield [`DistanceRequirements::Empty`]. Only a
/// literal `true` sets a flag.
pub fn parse_distance_requirements(facility: &str, value: Option<&JsonValue>) -> DistanceRequirements {
    match value {
        Some(JsonValue::Object(map)) => DistanceRequirements::Parsed(flags_from_map(map)),
        Some(JsonValue::String(raw)) => match serde_json::from_str::<JsonValue>(raw) {
            Ok(JsonValue::Object(map)) => DistanceRequirements::Parsed(flags_from_map(&map)),
            Ok(_) => DistanceRequirements::Empty,
            Err(err) => {
                tracing::warn!(facility, error = %err, "Unparseable distance_requirements, treating as no hazards");
                DistanceRequirements::Empty
            }
        },
        _ => DistanceRequirements::Empty,
    }
}

fn flags_from_map(map: &JsonObject) -> HazardFlags {
    let flag = |category: HazardCategory| matches!(map.get(category.key()), Some(JsonValue::Bool(true)));
    HazardFlags {
        contains_people: flag(HazardCategory::People),
        contains_flammable_liquids: flag(HazardCategory::FlammableLiquids),
        contains_open_fire: flag(HazardCategory::OpenFire),
    }
}

/// Facilities whose amenity marks them as candidate storage areas.
pub fn candidate_areas(facilities: &[Facility], rules: &SitingRules) -> Vec<CandidateStorageArea> {
    facilities
        .iter()
        .filter(|facility| rules.is_candidate_amenity(&facility.amenity))
        .map(CandidateStorageArea::from)
        .collect()
}

/// Serialise facilities back to GeoJSON for map display.
pub fn facilities_to_geojson(facilities: &[Facility]) -> FeatureCollection {
    let features = facilities
        .iter()
        .map(|facility| {
            let mut properties = JsonObject::new();
            properties.insert("id".into(), facility.id.clone().into());
            properties.insert("name".into(), facility.name.clone().into());
            properties.insert("amenity".into(), facility.amenity.clone().into());
            properties.insert(
                "distance_requirements".into(),
                serde_json::to_value(facility.distance_requirements).unwrap_or(JsonValue::Null),
            );
            Feature {
                bbox: None,
                geometry: Some(geojson::Geometry::new(geometry::multipolygon_to_geojson(
                    &facility.geometry,
                ))),
                id: Some(Id::String(facility.id.clone())),
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

const REQUIRED_COLUMNS: [&str; 4] = [
    "regulation_info",
    "storage_gal_min",
    "storage_gal_max",
    "safety_distance_ft",
];

/// Load the requirement table from a CSV file.
pub fn load_requirement_rules(path: &Path) -> Result<Vec<RequirementRule>, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let rules = parse_requirement_rules(file)?;
    tracing::info!(count = rules.len(), path = %path.display(), "Loaded requirement rules");
    Ok(rules)
}

/// Parse the requirement table.
///
/// Required columns are `regulation_info`, `storage_gal_min`,
/// `storage_gal_max` and `safety_distance_ft`. Optional columns are
/// `regulation_name` and `hazard_category` (explicit tags separated by `;`).
/// Empty bound cells are open bounds.
pub fn parse_requirement_rules<R: Read>(reader: R) -> Result<Vec<RequirementRule>, RequirementResolutionError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_ascii_lowercase())
        .collect();
    let column = |name: &str| headers.iter().position(|h| h == name);

    let mut required = [0usize; 4];
    for (slot, name) in required.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = column(name).ok_or(RequirementResolutionError::MissingColumn(name))?;
    }
    let [info_idx, min_idx, max_idx, distance_idx] = required;
    let name_idx = column("regulation_name");
    let tag_idx = column("hazard_category");

    let mut rules = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        // Row numbers as seen in a spreadsheet, header on row 1.
        let row = i + 2;
        let cell = |idx: usize| record.get(idx).unwrap_or("").trim();
        if record.iter().all(|value| value.trim().is_empty()) {
            continue;
        }

        let safety_distance_ft = parse_number(row, "safety_distance_ft", cell(distance_idx))?
            .ok_or_else(|| RequirementResolutionError::InvalidValue {
                row,
                column: "safety_distance_ft",
                value: String::new(),
            })?;
        if safety_distance_ft < 0.0 {
            return Err(RequirementResolutionError::InvalidValue {
                row,
                column: "safety_distance_ft",
                value: cell(distance_idx).to_string(),
            });
        }

        let hazard_categories = match tag_idx.map(cell).filter(|raw| !raw.is_empty()) {
            Some(raw) => Some(
                raw.split(';')
                    .map(|tag| {
                        HazardCategory::from_tag(tag).ok_or_else(|| RequirementResolutionError::InvalidValue {
                            row,
                            column: "hazard_category",
                            value: tag.trim().to_string(),
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            None => None,
        };

        rules.push(RequirementRule {
            regulation_name: name_idx.map(cell).filter(|s| !s.is_empty()).map(str::to_string),
            regulation_info: cell(info_idx).to_string(),
            storage_gal_min: parse_number(row, "storage_gal_min", cell(min_idx))?,
            storage_gal_max: parse_number(row, "storage_gal_max", cell(max_idx))?,
            safety_distance_ft,
            hazard_categories,
        });
    }

    if rules.is_empty() {
        return Err(RequirementResolutionError::EmptyTable);
    }
    Ok(rules)
}

fn parse_number(row: usize, column: &'static str, raw: &str) -> Result<Option<f64>, RequirementResolutionError> {
    if raw.is_empty() || raw.eq_ignore_ascii_case("null") || raw.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    raw.replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .map(Some)
        .ok_or_else(|| RequirementResolutionError::InvalidValue {
            row,
            column,
            value: raw.to_string(),
        })
}
