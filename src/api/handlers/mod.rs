pub mod agents;
pub mod messages;
pub mod projects;
pub mod system;

pub use agents::*;
pub use messages::*;
pub use projects::*;
pub use system::*;

use axum::extract::rejection::JsonRejection;
use axum::Json;
use uuid::Uuid;

use crate::api::error::ApiError;

/// Unwrap a JSON body, turning a malformed payload into a 400
pub(crate) fn parse_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

/// Parse a path id; ids that are not UUIDs cannot exist, so they are a 404
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found(format!("{} not found", what)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn malformed_ids_are_not_found() {
        let err = parse_id("not-a-uuid", "Project").unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "Project not found");

        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string(), "Project").unwrap(), id);
    }
}
