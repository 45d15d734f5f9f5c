//! Mapping of booking errors onto HTTP responses

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use peerly_core::Error;
use tracing::error;

/// A core error on its way out of a handler
#[derive(Debug)]
pub struct ApiError(pub Error);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::TutorNotFound(_)
            | Error::SlotNotFound(_)
            | Error::AttemptNotFound(_)
            | Error::BookingNotFound(_) => StatusCode::NOT_FOUND,
            Error::SlotFull { .. }
            | Error::AttemptStateMismatch { .. }
            | Error::InvalidTransition { .. } => StatusCode::CONFLICT,
            Error::InvalidSubject { .. } | Error::TutorNotAccepting(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Error::InvalidValue(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("request failed: {}", self.0);
        }
        let body = Json(serde_json::json!({
            "error": self.0.kind(),
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}
