use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};

use pulseboard_api_types::{ApiErrorBody, ApiErrorMessage};

use crate::application::directory::DirectoryError;
use crate::application::error::ErrorReport;

pub mod codes {
    pub const AUTH_FAILED: &str = "auth_failed";
    pub const UPSTREAM_UNAVAILABLE: &str = "upstream_unavailable";
    pub const MALFORMED_UPSTREAM: &str = "malformed_upstream_response";
}

/// Error response for the typed `/api/v1` surface.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }
}

impl From<DirectoryError> for ApiError {
    fn from(error: DirectoryError) -> Self {
        let code = match &error {
            DirectoryError::Auth { .. } => codes::AUTH_FAILED,
            DirectoryError::Unavailable { .. } => codes::UPSTREAM_UNAVAILABLE,
            DirectoryError::Malformed { .. } => codes::MALFORMED_UPSTREAM,
        };
        Self::new(StatusCode::BAD_GATEWAY, code, error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.clone(),
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        ErrorReport::from_message(
            "infra::http::api",
            self.status,
            format!("{}: {}", self.code, self.message),
        )
        .attach(&mut response);
        response
    }
}

/// Relay an upstream failure on the passthrough surface: mirror the
/// upstream status (500 when there is none) and wrap the upstream payload
/// under an `error` key, inventing nothing.
pub fn proxy_error_response(source: &'static str, error: DirectoryError) -> Response {
    let status = error
        .upstream_status()
        .and_then(|code| StatusCode::from_u16(code).ok())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let detail = error.to_string();
    let payload = match error {
        DirectoryError::Auth { payload, detail, .. }
        | DirectoryError::Unavailable { payload, detail, .. } => {
            payload.unwrap_or(Value::String(detail))
        }
        DirectoryError::Malformed { context } => Value::String(context),
    };

    let mut response = (status, Json(json!({ "error": payload }))).into_response();
    ErrorReport::from_message(source, status, detail).attach(&mut response);
    response
}
