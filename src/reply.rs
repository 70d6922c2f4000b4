use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use serde::Serialize;

/// Uniform success envelope: `{statusCode, message, data}`.
#[derive(Debug, Clone, Serialize)]
pub struct ApiReply<T> {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub message: String,
    pub data: T,
}

impl<T> ApiReply<T> {
    pub fn ok(status_code: u16, message: &str, data: T) -> Self {
        Self {
            status_code,
            message: message.to_owned(),
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiReply<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}
