//! Maps [`HostlinkError`] onto the HTTP status table of spec §7.
//!
//! Response bodies are deliberately thin: `{"error": "<message>"}`, except
//! for `Unauthenticated`, whose message is never echoed to the client — the
//! body is empty and only the status line carries information.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use hostlink_core::HostlinkError;
use serde_json::json;

/// Thin wrapper so the rest of the crate can `?` straight out of
/// `hostlink_core::Result` into an axum handler.
#[derive(Debug)]
pub struct ApiError(pub HostlinkError);

impl From<HostlinkError> for ApiError {
    fn from(err: HostlinkError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // spec §4.3: authentication failures stay generic, no body detail
        // that could help an attacker distinguish failure reasons.
        if matches!(
            self.0,
            HostlinkError::Unauthenticated | HostlinkError::PublicKeyNotFound(_)
        ) {
            return status.into_response();
        }

        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn validation_error_maps_to_400_with_body() {
        let response = ApiError(HostlinkError::Validation("bad field".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Validation failed: bad field");
    }

    #[tokio::test]
    async fn unauthenticated_error_has_empty_body() {
        let response = ApiError(HostlinkError::Unauthenticated).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn not_found_maps_to_404() {
        let response = ApiError(HostlinkError::not_found_task("tsk_1")).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn conflict_maps_to_409() {
        let response = ApiError(HostlinkError::Conflict("dup".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
