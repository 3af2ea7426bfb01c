use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use chrono::Utc;
use tracing::info;

use super::parse_body;
use crate::api::{
    error::ApiError,
    state::AppState,
    types::{MessageQuery, MessagesResponse, SendMessageResponse, WsMessage},
};
use crate::domain::SendMessageRequest;
use crate::error::DeckError;

const MESSAGE_LOG_SERVICE: &str = "Agent message log";

/// Messages returned when the caller gives no limit
pub const DEFAULT_MESSAGE_LIMIT: usize = 10;

/// POST /api/agents/message
pub async fn send_message(
    State(state): State<AppState>,
    body: std::result::Result<Json<SendMessageRequest>, JsonRejection>,
) -> std::result::Result<Json<SendMessageResponse>, ApiError> {
    let request = parse_body(body)?;

    // An unavailable log takes precedence over validation errors.
    if !state.directory.is_available() {
        return Err(state.reject(DeckError::ServiceUnavailable(format!(
            "{} is not available",
            MESSAGE_LOG_SERVICE
        ))));
    }

    let message = request
        .into_message(Utc::now())
        .map_err(|e| state.reject(e))?;

    state
        .directory
        .append_message(&message)
        .await
        .require(MESSAGE_LOG_SERVICE)
        .map_err(|e| state.reject(e))?;

    info!(
        "Message {} sent from {} to {}",
        message.id, message.from_agent, message.to_agent
    );
    state.broadcast(WsMessage::NewMessage(message.clone()));

    Ok(Json(SendMessageResponse {
        success: true,
        message_id: message.id.clone(),
        data: message,
    }))
}

/// GET /api/agents/messages?agentId=..&limit=..
pub async fn list_messages(
    State(state): State<AppState>,
    query: std::result::Result<Query<MessageQuery>, QueryRejection>,
) -> std::result::Result<Json<MessagesResponse>, ApiError> {
    let Query(query) = query.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

    let agent_id = query
        .agent_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());
    let limit = query.limit.unwrap_or(DEFAULT_MESSAGE_LIMIT);

    let messages = state
        .directory
        .recent_messages(agent_id, limit)
        .await
        .require(MESSAGE_LOG_SERVICE)
        .map_err(|e| state.reject(e))?;

    Ok(Json(MessagesResponse { messages }))
}
