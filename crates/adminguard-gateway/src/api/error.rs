use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use adminguard_core::error::{AdminGuardError, ClientCode};

/// Boundary wrapper mapping the closed error enumeration to HTTP.
#[derive(Debug)]
pub struct ApiError(pub AdminGuardError);

impl From<AdminGuardError> for ApiError {
    fn from(e: AdminGuardError) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0.client_code() {
            ClientCode::BadRequest => StatusCode::BAD_REQUEST,
            ClientCode::AuthFailed => StatusCode::UNAUTHORIZED,
            ClientCode::NotImplemented => StatusCode::NOT_IMPLEMENTED,
            ClientCode::Forbidden => StatusCode::FORBIDDEN,
            ClientCode::NotFound => StatusCode::NOT_FOUND,
            ClientCode::UnsupportedVersion | ClientCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Internal details are logged where they happen, not sent.
        let message = match &self.0 {
            AdminGuardError::Internal(_) | AdminGuardError::UnsupportedVersion => {
                "internal error".to_string()
            }
            other => other.to_string(),
        };
        let body = Json(json!({
            "error": self.0.client_code().as_str(),
            "message": message,
        }));
        (status, body).into_response()
    }
}
