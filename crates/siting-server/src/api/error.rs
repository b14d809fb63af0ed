//! Mapping of engine failures onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use siting_core::{ComplianceEvaluationError, LoadError, SitingError, StoreError};

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            kind: "bad_request",
            message: message.into(),
        }
    }

    pub fn internal(message: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            kind: "internal",
            message: message.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    fn classify(err: &SitingError) -> (StatusCode, &'static str) {
        use ComplianceEvaluationError as C;
        match err {
            SitingError::Geometry(_) => (StatusCode::UNPROCESSABLE_ENTITY, "geometry"),
            SitingError::NoMatchingRegulation(_)
            | SitingError::ComplianceEvaluation(C::NoMatchingRegulation(_)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "no_matching_regulation")
            }
            SitingError::ComplianceEvaluation(C::InvalidVolume(_)) => {
                (StatusCode::BAD_REQUEST, "invalid_volume")
            }
            SitingError::ComplianceEvaluation(C::Geometry(_)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "geometry")
            }
            SitingError::ComplianceEvaluation(
                C::NoHazardPoints | C::NoCandidateAreas | C::NoBufferZones,
            ) => (StatusCode::UNPROCESSABLE_ENTITY, "compliance_evaluation"),
            SitingError::ComplianceEvaluation(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "compliance_evaluation")
            }
            SitingError::BufferGeneration(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "buffer_generation")
            }
            SitingError::RequirementResolution(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "requirement_resolution")
            }
            SitingError::Store(StoreError::NotFound(_)) => (StatusCode::NOT_FOUND, "not_found"),
            SitingError::Load(LoadError::Io { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                (StatusCode::NOT_FOUND, "not_found")
            }
            SitingError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "store"),
            SitingError::Load(_) => (StatusCode::INTERNAL_SERVER_ERROR, "load"),
        }
    }
}

impl<E> From<E> for ApiError
where
    E: Into<SitingError>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        let (status, kind) = Self::classify(&err);
        Self {
            status,
            kind,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(kind = self.kind, "{}", self.message);
        } else {
            tracing::debug!(kind = self.kind, status = %self.status, "{}", self.message);
        }
        (
            self.status,
            Json(json!({ "error": self.kind, "message": self.message })),
        )
            .into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Run geometry work off the async executor.
pub async fn blocking<T, F>(work: F) -> ApiResult<T>
where
    F: FnOnce() -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(ApiError::internal)?
}
