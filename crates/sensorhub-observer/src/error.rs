//! Error types for the Observer API server.
//!
//! [`ObserverError`] unifies all failure modes into a single enum that
//! can be converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sensorhub_core::QueryError;

/// Errors that can occur in the Observer API layer.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// The path names a domain that does not exist.
    #[error("unknown domain: {0}")]
    UnknownDomain(String),

    /// The requested entity was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// An invalid query parameter was provided.
    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

impl From<QueryError> for ObserverError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::NotFound { .. } => Self::NotFound(err.to_string()),
            QueryError::InvalidArgument(msg) => Self::InvalidQuery(msg),
        }
    }
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::UnknownDomain(_) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidQuery(_) => StatusCode::BAD_REQUEST,
        };

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use sensorhub_types::{Domain, EntityId};

    use super::*;

    #[test]
    fn query_errors_map_to_http_status() {
        let not_found: ObserverError = QueryError::NotFound {
            domain: Domain::Wifi,
            entity_id: EntityId::from("AP9"),
        }
        .into();
        assert_eq!(not_found.into_response().status(), StatusCode::NOT_FOUND);

        let invalid: ObserverError = QueryError::InvalidArgument(String::from("bad")).into();
        assert_eq!(invalid.into_response().status(), StatusCode::BAD_REQUEST);

        let unknown = ObserverError::UnknownDomain(String::from("tram"));
        assert_eq!(unknown.into_response().status(), StatusCode::NOT_FOUND);
    }
}
