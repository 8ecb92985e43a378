use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use freightdesk_core::DomainError;
use serde::Serialize;

/// Error body returned by every API route.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Wraps domain `anyhow` errors so handlers can use `?`.
#[derive(Debug)]
pub struct ApiError(anyhow::Error);

pub type ApiResult<T> = Result<T, ApiError>;

impl<E: Into<anyhow::Error>> From<E> for ApiError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl ApiError {
    fn status_and_body(&self) -> (StatusCode, ErrorResponse) {
        if let Some(domain) = self.0.downcast_ref::<DomainError>() {
            let status = match domain {
                DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
                DomainError::Validation(_) => StatusCode::BAD_REQUEST,
                DomainError::Conflict(_) | DomainError::InvalidTransition { .. } => {
                    StatusCode::CONFLICT
                }
                DomainError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            };
            return (
                status,
                ErrorResponse {
                    error: domain.to_string(),
                    code: domain.code().to_string(),
                },
            );
        }

        if matches!(self.0.downcast_ref::<sqlx::Error>(), Some(sqlx::Error::RowNotFound)) {
            return (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error: "resource not found".to_string(),
                    code: "NOT_FOUND".to_string(),
                },
            );
        }

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorResponse {
                error: "internal server error".to_string(),
                code: "INTERNAL".to_string(),
            },
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            tracing::error!(error = ?self.0, "Request failed");
        } else {
            tracing::debug!(status = %status, error = %self.0, "Request rejected");
        }
        (status, Json(body)).into_response()
    }
}
