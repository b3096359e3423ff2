use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::CocoonError;

/// JSON error body returned by every failing route.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub error_code: String,
}

pub fn status_for(err: &CocoonError) -> StatusCode {
    match err {
        CocoonError::Validation(_) | CocoonError::InvalidUser(_) | CocoonError::InvalidPath(_) => {
            StatusCode::BAD_REQUEST
        }
        CocoonError::NotFound(_) => StatusCode::NOT_FOUND,
        CocoonError::Llm(_) | CocoonError::Mirror(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Malformed or mistyped request bodies are client errors, not axum's plain-text 4xx.
impl From<JsonRejection> for CocoonError {
    fn from(rejection: JsonRejection) -> Self {
        CocoonError::Validation(rejection.body_text())
    }
}

impl IntoResponse for CocoonError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.code(), "request failed");
        } else {
            tracing::debug!(error = %self, code = self.code(), "request rejected");
        }
        let body = ApiError {
            error: self.to_string(),
            error_code: self.code().to_string(),
        };
        (status, Json(body)).into_response()
    }
}
