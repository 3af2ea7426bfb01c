use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use super::{parse_body, parse_id};
use crate::api::{
    error::ApiError,
    state::AppState,
    types::{DeleteResponse, DeletedProject, WsMessage},
};
use crate::domain::{Project, ProjectInput};

/// GET /api/projects
pub async fn list_projects(
    State(state): State<AppState>,
) -> std::result::Result<Json<Vec<Project>>, ApiError> {
    let projects = state
        .store
        .list_projects()
        .await
        .map_err(|e| state.reject(e))?;
    Ok(Json(projects))
}

/// POST /api/projects
pub async fn create_project(
    State(state): State<AppState>,
    body: std::result::Result<Json<ProjectInput>, JsonRejection>,
) -> std::result::Result<(StatusCode, Json<Project>), ApiError> {
    let draft = parse_body(body)?.validate().map_err(|e| state.reject(e))?;
    let project = state
        .store
        .insert_project(draft)
        .await
        .map_err(|e| state.reject(e))?;

    info!("Project created: {} ({})", project.name, project.id);
    state.broadcast(WsMessage::ProjectCreated(project.clone()));

    Ok((StatusCode::CREATED, Json(project)))
}

/// GET /api/projects/:id
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> std::result::Result<Json<Project>, ApiError> {
    let id = parse_id(&id, "Project")?;
    state
        .store
        .get_project(id)
        .await
        .map_err(|e| state.reject(e))?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Project not found"))
}

/// PUT /api/projects/:id
pub async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: std::result::Result<Json<ProjectInput>, JsonRejection>,
) -> std::result::Result<Json<Project>, ApiError> {
    let id = parse_id(&id, "Project")?;
    let draft = parse_body(body)?.validate().map_err(|e| state.reject(e))?;

    let project = state
        .store
        .replace_project(id, draft)
        .await
        .map_err(|e| state.reject(e))?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;

    info!("Project updated: {}", project.id);
    state.broadcast(WsMessage::ProjectUpdated(project.clone()));

    Ok(Json(project))
}

/// DELETE /api/projects/:id
pub async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> std::result::Result<Json<DeleteResponse>, ApiError> {
    let id = parse_id(&id, "Project")?;
    let project = state
        .store
        .delete_project(id)
        .await
        .map_err(|e| state.reject(e))?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;

    info!("Project deleted: {}", project.id);
    state.broadcast(WsMessage::ProjectDeleted(DeletedProject { id: project.id }));

    Ok(Json(DeleteResponse {
        success: true,
        message: "Project deleted".to_string(),
        id: project.id,
    }))
}
