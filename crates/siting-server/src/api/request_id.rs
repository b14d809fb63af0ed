//! Request correlation ids.
//!
//! Every request gets an `x-request-id`: a caller-supplied one is kept when
//! it is short printable ASCII, otherwise a fresh UUID is issued. The id is
//! attached to the tracing span for the request and echoed on the response.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

const MAX_REQUEST_ID_LEN: usize = 128;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    /// Accept the caller's id if usable, else generate one.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let supplied = headers
            .get(&REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| {
                !value.is_empty()
                    && value.len() <= MAX_REQUEST_ID_LEN
                    && value.bytes().all(|b| b.is_ascii_graphic())
            })
            .map(str::to_string);
        Self(supplied.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()))
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

pub async fn ensure_request_id(mut request: Request, next: Next) -> Response {
    let request_id = RequestId::from_headers(request.headers());
    let header = HeaderValue::from_str(&request_id.0).ok();

    if let Some(value) = header.clone() {
        request.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    let span = tracing::info_span!(
        "http",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
    );
    request.extensions_mut().insert(request_id);

    let mut response = next.run(request).instrument(span).await;
    if let Some(value) = header {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_a_usable_caller_id() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static(" abc-123 "));
        assert_eq!(RequestId::from_headers(&headers).0, "abc-123");
    }

    #[test]
    fn replaces_missing_or_oversized_ids() {
        let generated = RequestId::from_headers(&HeaderMap::new());
        assert!(uuid::Uuid::parse_str(&generated.0).is_ok());

        let mut headers = HeaderMap::new();
        let long = "x".repeat(MAX_REQUEST_ID_LEN + 1);
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_str(&long).unwrap());
        assert_ne!(RequestId::from_headers(&headers).0, long);
    }
}
