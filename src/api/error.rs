//! Mapping from `EwclError` to HTTP responses.
//!
//! This is the only place error kinds turn into status codes. 5xx bodies never
//! carry internal details; those go to the log.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::EwclError;

impl EwclError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            EwclError::Input(_) => StatusCode::BAD_REQUEST,
            EwclError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            EwclError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            EwclError::ShapeMismatch { .. }
            | EwclError::FeatureIndex { .. }
            | EwclError::Prediction(_)
            | EwclError::Config(_)
            | EwclError::InvalidConfig(_)
            | EwclError::Json(_)
            | EwclError::Io(_)
            | EwclError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Convert an extractor rejection, keeping 413 for bodies over the limit.
pub(crate) fn rejection_error(status: StatusCode, body_text: String) -> EwclError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        EwclError::PayloadTooLarge(body_text)
    } else {
        EwclError::Input(body_text)
    }
}

impl IntoResponse for EwclError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            EwclError::Input(msg) | EwclError::PayloadTooLarge(msg) => msg.clone(),
            EwclError::ModelUnavailable(detail) => {
                tracing::error!(detail = %detail, "Model unavailable");
                "Model not loaded".to_string()
            }
            EwclError::Prediction(detail) => {
                tracing::error!(detail = %detail, "Prediction failed");
                "Prediction failed. Check server logs for details.".to_string()
            }
            other => {
                tracing::error!(error = %other, "Internal server error");
                "An internal error occurred".to_string()
            }
        };

        let body = Json(json!({
            "error": true,
            "message": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds_map_to_distinct_statuses() {
        assert_eq!(
            EwclError::Input("empty input".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            EwclError::PayloadTooLarge("limit".into()).status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            EwclError::ModelUnavailable("gone".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            EwclError::Prediction("nan".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            EwclError::FeatureIndex { index: 9, len: 8 }.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn rejections_keep_payload_too_large() {
        assert!(matches!(
            rejection_error(StatusCode::PAYLOAD_TOO_LARGE, "length limit exceeded".into()),
            EwclError::PayloadTooLarge(_)
        ));
        assert!(matches!(
            rejection_error(StatusCode::UNPROCESSABLE_ENTITY, "missing field".into()),
            EwclError::Input(_)
        ));
    }

    #[tokio::test]
    async fn internal_details_are_not_leaked() {
        let response =
            EwclError::Internal("/srv/secret/path exploded".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(!text.contains("secret"));
    }
}
