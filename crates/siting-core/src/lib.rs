//! Core engine for siting hydrogen storage at an airport.
//!
//! Facilities are buffered by the regulatory distance for each hazard they
//! pose, candidate storage areas are reduced by every foreign buffer they
//! touch, and what remains is checked against the area a requested storage
//! volume needs. All metric work happens in a planar projection in feet.

pub mod buffer;
pub mod compliance;
pub mod error;
pub mod geometry;
pub mod loader;
pub mod models;
pub mod projection;
pub mod proximity;
pub mod rules;
pub mod store;
pub mod violations;

#[cfg(test)]
pub(crate) mod fixtures;

pub use buffer::{generate_buffers, DEFAULT_COLLECTION_NAME};
pub use compliance::evaluate;
pub use error::{
    BufferGenerationError, ComplianceEvaluationError, GeometryError, LoadError,
    NoMatchingRegulationError, RequirementResolutionError, SitingError, StoreError,
};
pub use models::{
    AreaEvaluation, AreaFailure, BufferZone, BufferZoneCollection, CandidateStorageArea,
    ComplianceResult, ComplianceStatus, ComplianceVerdict, DistanceRequirements,
    EvaluationSummary, Facility, HazardCategory, HazardFlags, LatLng, OverlappingBuffer,
    RequirementRule, StorageEvaluation,
};
pub use projection::PlanarProjection;
pub use proximity::{area_centroid, check as check_distance};
pub use rules::{
    required_area_sqft, required_distance_for_volume, resolve_max_distances, RequiredDistances,
    SitingRules, TankSpec,
};
pub use store::{generate_and_store, BufferZoneStore};
pub use violations::{find_violations, ZoningViolation};
