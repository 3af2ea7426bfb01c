use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, error};

use crate::api::types::ErrorBody;
use crate::error::DeckError;

/// Message returned for server-side failures outside development
pub const GENERIC_ERROR: &str = "Internal server error";

/// An error ready to be written as `{"success": false, "error": ...}`
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Map a crate error onto a status code; 500s hide their cause unless `expose` is set
    pub fn from_error(err: &DeckError, expose: bool) -> Self {
        let status = match err {
            DeckError::Validation(_) => StatusCode::BAD_REQUEST,
            DeckError::NotFound(_) => StatusCode::NOT_FOUND,
            DeckError::Conflict(_) => StatusCode::CONFLICT,
            DeckError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if err.is_client_error() {
            debug!("Request rejected: {}", err);
        } else if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Request failed: {}", err);
            let message = if expose {
                err.to_string()
            } else {
                GENERIC_ERROR.to_string()
            };
            return Self::new(status, message);
        }

        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            error: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_keep_their_message() {
        let err = ApiError::from_error(&DeckError::Validation("name is required".into()), false);
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "name is required");

        let err = ApiError::from_error(&DeckError::Conflict("taken".into()), false);
        assert_eq!(err.status, StatusCode::CONFLICT);

        let err = ApiError::from_error(&DeckError::ServiceUnavailable("down".into()), false);
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.message, "down");
    }

    #[test]
    fn server_errors_are_hidden_outside_development() {
        let cause = DeckError::VectorStore("HTTP 500: boom".into());

        let hidden = ApiError::from_error(&cause, false);
        assert_eq!(hidden.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(hidden.message, GENERIC_ERROR);

        let shown = ApiError::from_error(&cause, true);
        assert!(shown.message.contains("boom"));
    }
}
