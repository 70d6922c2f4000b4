use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use serde_json::{Value, json};

pub type AppResult<T> = Result<T, AppError>;

/// Error taxonomy for both the HTTP surface and the event path.
///
/// HTTP handlers return these and get the uniform `{statusCode, message,
/// data}` envelope; the gateway logs them and drops the offending event
/// instead, since the socket has no reply channel for errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error(transparent)]
    Storage(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Storage(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            AppError::Storage(_) | AppError::Internal(_) => {
                tracing::error!(error = ?self, "request failed");
                "An unexpected error occurred".to_owned()
            }
            other => other.to_string(),
        };

        (
            status,
            Json(json!({
                "statusCode": status.as_u16(),
                "message": message,
                "data": Value::Null,
            })),
        )
            .into_response()
    }
}
