//! Request context extraction.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::convert::Infallible;

use crate::domain::foundation::CommandMetadata;

/// Caller identity header. Authentication happens in front of this service.
pub const ACTOR_HEADER: &str = "x-actor";
pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const TRACE_HEADER: &str = "traceparent";

const DEFAULT_ACTOR: &str = "api";

/// `CommandMetadata` built from request headers; never rejects.
#[derive(Debug, Clone)]
pub struct RequestMetadata(pub CommandMetadata);

#[async_trait]
impl<S> FromRequestParts<S> for RequestMetadata
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let mut metadata =
            CommandMetadata::new(header(ACTOR_HEADER).unwrap_or_else(|| DEFAULT_ACTOR.to_string()))
                .with_source("api");
        if let Some(request_id) = header(REQUEST_ID_HEADER) {
            metadata = metadata.with_correlation_id(request_id);
        }
        if let Some(trace) = header(TRACE_HEADER) {
            metadata = metadata.with_trace_id(trace);
        }
        Ok(RequestMetadata(metadata))
    }
}
