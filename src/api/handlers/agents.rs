use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use tracing::{info, warn};

use super::{parse_body, parse_id};
use crate::api::{
    error::ApiError,
    state::AppState,
    types::{DeleteResponse, DeletedAgent, WsMessage},
};
use crate::domain::{Agent, AgentInput, AgentPatch, AgentView, DirectoryStatus};

/// GET /api/agents
///
/// Agents are merged with their directory presence. A directory that is
/// down or failing marks every agent inactive instead of failing the request.
pub async fn list_agents(
    State(state): State<AppState>,
) -> std::result::Result<Json<Vec<AgentView>>, ApiError> {
    let agents = state.store.list_agents().await.map_err(|e| state.reject(e))?;

    let ids: Vec<String> = agents.iter().map(|a| a.agent_id.clone()).collect();
    let present = state.directory.presence(&ids).await.ok().unwrap_or_default();

    let views = agents
        .into_iter()
        .map(|agent| {
            let directory_status = if present.contains(&agent.agent_id) {
                DirectoryStatus::Active
            } else {
                DirectoryStatus::Inactive
            };
            AgentView {
                agent,
                directory_status,
            }
        })
        .collect();

    Ok(Json(views))
}

/// POST /api/agents
pub async fn register_agent(
    State(state): State<AppState>,
    body: std::result::Result<Json<AgentInput>, JsonRejection>,
) -> std::result::Result<(StatusCode, Json<Agent>), ApiError> {
    let draft = parse_body(body)?.validate().map_err(|e| state.reject(e))?;
    let agent = state
        .store
        .insert_agent(draft)
        .await
        .map_err(|e| state.reject(e))?;

    // Failures were already logged by the directory client.
    if state.directory.register_agent(&agent).await.is_unavailable() {
        warn!("Directory unavailable, {} registered locally only", agent.agent_id);
    }

    info!("Agent registered: {} ({})", agent.agent_id, agent.id);
    state.broadcast(WsMessage::AgentRegistered(agent.clone()));

    Ok((StatusCode::CREATED, Json(agent)))
}

/// PUT /api/agents/:id
pub async fn update_agent(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: std::result::Result<Json<AgentPatch>, JsonRejection>,
) -> std::result::Result<Json<Agent>, ApiError> {
    let id = parse_id(&id, "Agent")?;
    let patch = parse_body(body)?.validate().map_err(|e| state.reject(e))?;

    let agent = state
        .store
        .update_agent(id, patch)
        .await
        .map_err(|e| state.reject(e))?
        .ok_or_else(|| ApiError::not_found("Agent not found"))?;

    info!("Agent updated: {}", agent.agent_id);
    state.broadcast(WsMessage::AgentUpdated(agent.clone()));

    Ok(Json(agent))
}

/// DELETE /api/agents/:id
///
/// The directory entry is left in place.
pub async fn delete_agent(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> std::result::Result<Json<DeleteResponse>, ApiError> {
    let id = parse_id(&id, "Agent")?;
    let agent = state
        .store
        .delete_agent(id)
        .await
        .map_err(|e| state.reject(e))?
        .ok_or_else(|| ApiError::not_found("Agent not found"))?;

    info!("Agent deleted: {}", agent.agent_id);
    state.broadcast(WsMessage::AgentDeleted(DeletedAgent {
        id: agent.id,
        agent_id: agent.agent_id,
    }));

    Ok(Json(DeleteResponse {
        success: true,
        message: "Agent deleted".to_string(),
        id: agent.id,
    }))
}
