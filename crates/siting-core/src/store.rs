//! Persistence of the buffer zone collection as a GeoJSON file.
//!
//! Each generation run fully overwrites the file; readers load it whole.
//! There is no locking, so concurrent writers race and the last one wins.

use chrono::{DateTime, Utc};
use geojson::{Feature, FeatureCollection, JsonObject, JsonValue};
use std::path::{Path, PathBuf};

use crate::buffer::generate_buffers;
use crate::error::{SitingError, StoreError};
use crate::geometry;
use crate::models::{BufferZone, BufferZoneCollection, Facility, HazardCategory};
use crate::projection::PlanarProjection;
use crate::rules::{RequiredDistances, SitingRules};

#[derive(Debug, Clone)]
pub struct BufferZoneStore {
    path: PathBuf,
}

impl BufferZoneStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    /// Write the collection, replacing whatever was there.
    pub fn save(&self, collection: &BufferZoneCollection) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let json = serde_json::to_string_pretty(&to_feature_collection(collection))
            .map_err(|e| StoreError::Malformed(e.to_string()))?;
        std::fs::write(&self.path, json).map_err(|e| self.io_error(e))?;
        tracing::info!(
            path = %self.path.display(),
            zones = collection.zones.len(),
            "Saved buffer zones"
        );
        Ok(())
    }

    pub fn load(&self) -> Result<BufferZoneCollection, StoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(self.path.display().to_string()))
            }
            Err(e) => return Err(self.io_error(e)),
        };
        let features: FeatureCollection = raw
            .parse()
            .map_err(|e: geojson::Error| StoreError::Malformed(e.to_string()))?;
        from_feature_collection(&features)
    }
}

/// Generate buffers and persist them, returning the collection.
pub fn generate_and_store(
    store: &BufferZoneStore,
    facilities: &[Facility],
    distances: &RequiredDistances,
    rules: &SitingRules,
    projection: &PlanarProjection,
    collection_name: &str,
) -> Result<BufferZoneCollection, SitingError> {
    let collection = generate_buffers(facilities, distances, rules, projection, collection_name)?;
    store.save(&collection)?;
    Ok(collection)
}

pub fn to_feature_collection(collection: &BufferZoneCollection) -> FeatureCollection {
    let features = collection
        .zones
        .iter()
        .map(|zone| {
            let mut properties = JsonObject::new();
            properties.insert("facility_id".into(), zone.facility_id.clone().into());
            properties.insert("facility_name".into(), zone.facility_name.clone().into());
            properties.insert(
                "hazard_categories".into(),
                serde_json::to_value(&zone.hazard_categories).unwrap_or(JsonValue::Null),
            );
            properties.insert("buffer_distance_ft".into(), zone.buffer_distance_ft.into());
            Feature {
                bbox: None,
                geometry: Some(geojson::Geometry::new(geometry::multipolygon_to_geojson(
                    &zone.geometry,
                ))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    let mut foreign = JsonObject::new();
    foreign.insert("name".into(), collection.name.clone().into());
    foreign.insert("generated_at".into(), collection.generated_at.to_rfc3339().into());

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: Some(foreign),
    }
}

pub fn from_feature_collection(features: &FeatureCollection) -> Result<BufferZoneCollection, StoreError> {
    let foreign = features.foreign_members.as_ref();
    let name = foreign
        .and_then(|m| m.get("name"))
        .and_then(JsonValue::as_str)
        .unwrap_or(crate::buffer::DEFAULT_COLLECTION_NAME)
        .to_string();
    let generated_at = foreign
        .and_then(|m| m.get("generated_at"))
        .and_then(JsonValue::as_str)
        .map(|raw| {
            DateTime::parse_from_rfc3339(raw)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| StoreError::Malformed(format!("generated_at: {e}")))
        })
        .transpose()?
        .ok_or_else(|| StoreError::Malformed("missing generated_at".to_string()))?;

    let zones = features
        .features
        .iter()
        .enumerate()
        .map(|(index, feature)| zone_from_feature(index, feature))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(BufferZoneCollection {
        name,
        generated_at,
        zones,
    })
}

fn zone_from_feature(index: usize, feature: &Feature) -> Result<BufferZone, StoreError> {
    let malformed = |what: &str| StoreError::Malformed(format!("feature {index}: {what}"));

    let value = feature
        .geometry
        .as_ref()
        .map(|g| &g.value)
        .ok_or_else(|| malformed("missing geometry"))?;
    let geometry = geometry::multipolygon_from_geojson(value).map_err(|e| malformed(&e.to_string()))?;

    let properties = feature.properties.as_ref().ok_or_else(|| malformed("missing properties"))?;
    let facility_id = properties
        .get("facility_id")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| malformed("missing facility_id"))?
        .to_string();
    let facility_name = properties
        .get("facility_name")
        .and_then(JsonValue::as_str)
        .map(str::to_string);
    let hazard_categories: Vec<HazardCategory> = properties
        .get("hazard_categories")
        .cloned()
        .map(serde_json::from_value::<Vec<HazardCategory>>)
        .transpose()
        .map_err(|e| malformed(&format!("hazard_categories: {e}")))?
        .filter(|categories: &Vec<HazardCategory>| !categories.is_empty())
        .ok_or_else(|| malformed("missing hazard_categories"))?;
    let buffer_distance_ft = properties
        .get("buffer_distance_ft")
        .and_then(JsonValue::as_f64)
        .ok_or_else(|| malformed("missing buffer_distance_ft"))?;

    Ok(BufferZone {
        facility_id,
        facility_name,
        hazard_categories,
        buffer_distance_ft,
        geometry,
    })
}
