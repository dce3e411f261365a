use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::services::scheduling::BookingError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error("invalid request: {0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Booking(e) => match e {
                BookingError::Conflict { .. } | BookingError::CapacityExceeded { .. } => {
                    StatusCode::CONFLICT
                }
                BookingError::InvalidTransition { .. }
                | BookingError::OutsideWorkingHours { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                BookingError::NotFound(_) => StatusCode::NOT_FOUND,
                BookingError::Unauthorized => StatusCode::FORBIDDEN,
                BookingError::Invalid(_) => StatusCode::BAD_REQUEST,
                BookingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
