use crate::utils::error::{ErrorCategory, LensError};
use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::{JsonRejection, PathRejection},
    },
    extract::{FromRequest, FromRequestParts},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// `axum::Json` 的包裝，解析失敗時回傳 `LensError` 的 JSON 錯誤
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(LensError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(LensError))]
pub struct ApiPath<T>(pub T);

impl From<JsonRejection> for LensError {
    fn from(rejection: JsonRejection) -> Self {
        LensError::invalid_input("request body", rejection.body_text())
    }
}

impl From<PathRejection> for LensError {
    fn from(rejection: PathRejection) -> Self {
        LensError::invalid_input("path", rejection.body_text())
    }
}

impl From<MultipartRejection> for LensError {
    fn from(rejection: MultipartRejection) -> Self {
        LensError::invalid_input("multipart body", rejection.body_text())
    }
}

impl IntoResponse for LensError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        match self.category() {
            ErrorCategory::Client => tracing::debug!("Rejected request ({}): {}", status, self),
            ErrorCategory::Upstream => tracing::error!("❌ Upstream failure: {}", self),
            ErrorCategory::Internal => tracing::error!("❌ Internal error: {}", self),
        }

        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}
