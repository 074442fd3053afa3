//! External error surface.
//!
//! One wrapper translates every internal error into the external failure
//! shape `{ "detail": ... }` with the HTTP status taken from the central
//! `ErrorKind` table. Handlers never carry status conditionals, and internal
//! messages, SQL text and upstream bodies never reach the client.
//!
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::error::{ErrorKind, TimeleError};

/// Error wrapper for edge handlers.
pub struct EdgeError(pub TimeleError);

impl<E: Into<TimeleError>> From<E> for EdgeError {
    fn from(err: E) -> Self {
        EdgeError(err.into())
    }
}

impl IntoResponse for EdgeError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        match kind {
            ErrorKind::Internal => tracing::error!(error = %self.0, "internal edge error"),
            ErrorKind::UpstreamUnavailable => {
                tracing::warn!(error = %self.0, "upstream unavailable")
            }
            _ => {}
        }
        let status = StatusCode::from_u16(kind.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = serde_json::json!({ "detail": self.0.detail() });
        (status, Json(body)).into_response()
    }
}

pub type EdgeResult<T> = std::result::Result<T, EdgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_typed_error_maps_through_the_table() {
        let err = EdgeError(TimeleError::service(ErrorKind::EmptyCart, "cart has no items"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["detail"], "cart has no items");
    }

    #[tokio::test]
    async fn test_untyped_error_is_sanitized_500() {
        let err = EdgeError(TimeleError::Internal("sql: SELECT * FROM users".into()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["detail"], "internal server error");
    }

    #[tokio::test]
    async fn test_malformed_id_is_422() {
        let err = EdgeError(TimeleError::service(
            ErrorKind::InvalidIdFormat,
            "`abc` is not a valid user id (UUID)",
        ));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
