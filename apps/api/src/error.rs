use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use evidentia_core::AppError;
use serde::Serialize;
use tracing::{error, warn};

/// API error payload.
///
/// Forbidden responses carry only the unmet requirement, never the caller's
/// effective permission set.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    requirement: Option<String>,
}

impl ErrorResponse {
    fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field: None,
            requirement: None,
        }
    }
}

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.0.to_string();
        let (status, payload) = match self.0 {
            AppError::Unauthenticated => {
                (StatusCode::UNAUTHORIZED, ErrorResponse::message(message))
            }
            AppError::Forbidden { requirement } => (
                StatusCode::FORBIDDEN,
                ErrorResponse {
                    requirement: Some(requirement),
                    ..ErrorResponse::message(message)
                },
            ),
            AppError::NotFound { .. } => (StatusCode::NOT_FOUND, ErrorResponse::message(message)),
            AppError::InvalidTransition { .. } | AppError::Conflict(_) => {
                (StatusCode::CONFLICT, ErrorResponse::message(message))
            }
            AppError::Validation { field, .. } => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    field: Some(field),
                    ..ErrorResponse::message(message)
                },
            ),
            AppError::Unavailable(detail) => {
                warn!(%detail, "collaborator unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorResponse::message("service temporarily unavailable"),
                )
            }
            AppError::Internal(detail) => {
                error!(%detail, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::message("internal server error"),
                )
            }
        };

        (status, Json(payload)).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use evidentia_core::AppError;
    use serde_json::Value;

    use super::ApiError;

    async fn render(error: AppError) -> (StatusCode, Value) {
        let response = ApiError(error).into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_else(|error| panic!("body should be readable: {error}"));
        let payload = serde_json::from_slice(&body)
            .unwrap_or_else(|error| panic!("body should be json: {error}"));
        (status, payload)
    }

    #[tokio::test]
    async fn forbidden_echoes_only_the_requirement() {
        let (status, payload) = render(AppError::Forbidden {
            requirement: "EVIDENCES.APPROVE".to_owned(),
        })
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(payload["requirement"], "EVIDENCES.APPROVE");
        assert!(payload.get("permissions").is_none());
    }

    #[tokio::test]
    async fn taxonomy_maps_to_statuses() {
        let cases = [
            (AppError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (
                AppError::not_found("evidence", "H3"),
                StatusCode::NOT_FOUND,
            ),
            (
                AppError::invalid_transition("approved", "assigned"),
                StatusCode::CONFLICT,
            ),
            (
                AppError::Conflict("stale".to_owned()),
                StatusCode::CONFLICT,
            ),
            (
                AppError::validation("rejection_reason", "required"),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::Internal("broken".to_owned()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(render(error).await.0, expected);
        }
    }

    #[tokio::test]
    async fn collaborator_failure_detail_stays_server_side() {
        let (status, payload) =
            render(AppError::Unavailable("catalog store timed out at 10.0.0.4".to_owned())).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload["message"], "service temporarily unavailable");
    }

    #[tokio::test]
    async fn validation_names_the_field() {
        let (_, payload) = render(AppError::validation("file_name", "must not be empty")).await;
        assert_eq!(payload["field"], "file_name");
    }
}
