//! Error taxonomy for the siting engine.
//!
//! Each stage of the pipeline raises its own error type; [`SitingError`]
//! wraps all of them for callers that drive the whole pipeline.

use thiserror::Error;

/// Malformed, unclosed, or non-finite input geometry.
///
/// The core never repairs geometry; rings must be closed and coordinates
/// finite by the time they arrive.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("non-finite coordinate ({x}, {y})")]
    NonFinite { x: f64, y: f64 },

    #[error("ring is not closed: first vertex ({first_x}, {first_y}) != last vertex ({last_x}, {last_y})")]
    UnclosedRing {
        first_x: f64,
        first_y: f64,
        last_x: f64,
        last_y: f64,
    },

    #[error("coordinate ({x}, {y}) is outside longitude [-180, 180] or latitude [-90, 90]")]
    OutOfRange { x: f64, y: f64 },

    #[error("polygon is self-intersecting or otherwise topologically invalid")]
    Invalid,

    #[error("ring has {count} positions, at least 4 are required")]
    TooFewPositions { count: usize },

    #[error("unsupported geometry type '{0}', expected Polygon or MultiPolygon")]
    Unsupported(String),

    #[error("geometry is empty")]
    Empty,

    #[error("geometry has {count} vertices, exceeding the budget of {budget}")]
    VertexBudgetExceeded { count: usize, budget: usize },

    #[error("projection failed: {0}")]
    Projection(String),

    #[error("boolean {0} operation failed on degenerate geometry")]
    BooleanOp(&'static str),
}

/// Buffer generation produced nothing or was handed unusable input.
#[derive(Debug, Error)]
pub enum BufferGenerationError {
    #[error("facility collection is empty")]
    NoFacilities,

    #[error("no buffer zones were produced from {facility_count} facilities")]
    NoBuffersProduced { facility_count: usize },

    #[error("facility '{facility}' has invalid geometry: {source}")]
    InvalidFacility {
        facility: String,
        #[source]
        source: GeometryError,
    },
}

/// The requirement table is empty or structurally unusable.
#[derive(Debug, Error)]
pub enum RequirementResolutionError {
    #[error("requirement table is empty")]
    EmptyTable,

    #[error("requirement table is missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("row {row}: invalid value '{value}' in column '{column}'")]
    InvalidValue {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("failed to read requirement table: {0}")]
    Csv(#[from] csv::Error),
}

/// Inputs required by the compliance paths were missing or unusable.
#[derive(Debug, Error)]
pub enum ComplianceEvaluationError {
    #[error("no candidate storage areas were supplied")]
    NoCandidateAreas,

    #[error("buffer zone collection is empty")]
    NoBufferZones,

    #[error("buffer zone for '{facility}' ({category}) has invalid geometry: {source}")]
    InvalidBuffer {
        facility: String,
        category: String,
        #[source]
        source: GeometryError,
    },

    #[error("facility '{facility}' has invalid geometry: {source}")]
    InvalidFacility {
        facility: String,
        #[source]
        source: GeometryError,
    },

    #[error("no hazard points were supplied for any category")]
    NoHazardPoints,

    #[error("invalid storage volume {0} gal, expected a finite positive number")]
    InvalidVolume(f64),

    #[error(transparent)]
    NoMatchingRegulation(#[from] NoMatchingRegulationError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// A requested storage volume falls outside every rule's volume range.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("no regulation covers a storage volume of {storage_volume_gal} gal")]
pub struct NoMatchingRegulationError {
    pub storage_volume_gal: f64,
}

/// Failure at the data-loading boundary.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("feature {index} has no geometry")]
    MissingGeometry { index: usize },

    #[error("feature {index}: {source}")]
    Geometry {
        index: usize,
        #[source]
        source: GeometryError,
    },

    #[error(transparent)]
    Requirements(#[from] RequirementResolutionError),
}

/// Failure reading or writing the persisted buffer collection.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("buffer zone collection not found at {0}")]
    NotFound(String),

    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed buffer zone collection: {0}")]
    Malformed(String),
}

/// Umbrella error for callers that drive the whole pipeline.
#[derive(Debug, Error)]
pub enum SitingError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    BufferGeneration(#[from] BufferGenerationError),

    #[error(transparent)]
    RequirementResolution(#[from] RequirementResolutionError),

    #[error(transparent)]
    ComplianceEvaluation(#[from] ComplianceEvaluationError),

    #[error(transparent)]
    NoMatchingRegulation(#[from] NoMatchingRegulationError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
