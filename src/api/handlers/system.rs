use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use sysinfo::System;
use tracing::warn;

use crate::api::{
    error::ApiError,
    state::AppState,
    types::{CollectionStats, HealthResponse, MemoryUsage, StatsResponse},
};

/// GET /api/health -- liveness/readiness probe
///
/// A down database is a 503; a down vector store only degrades the status.
pub async fn health_handler(
    State(state): State<AppState>,
) -> std::result::Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let database = state.store.ping().await.is_ok();
    let vector_store = state.directory.heartbeat().await.is_ok();

    let resp = HealthResponse {
        status: if database && vector_store {
            "ok".to_string()
        } else {
            "degraded".to_string()
        },
        timestamp: Utc::now(),
        database,
        vector_store,
        uptime_seconds: state.uptime_seconds(),
    };

    if database {
        Ok(Json(resp))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(resp)))
    }
}

/// GET /api/stats
pub async fn get_stats(
    State(state): State<AppState>,
) -> std::result::Result<Json<StatsResponse>, ApiError> {
    let database = state.store.ping().await.is_ok();
    let vector_store = state.directory.heartbeat().await.is_ok();

    let projects = state
        .store
        .project_status_counts()
        .await
        .map_err(|e| state.reject(e))?;
    let agents = state
        .store
        .agent_status_counts()
        .await
        .map_err(|e| state.reject(e))?;

    let memory = match tokio::task::spawn_blocking(process_memory).await {
        Ok(memory) => memory,
        Err(e) => {
            warn!("Memory sampling task failed: {}", e);
            None
        }
    };

    Ok(Json(StatsResponse {
        database,
        vector_store,
        projects: CollectionStats::from_counts(projects),
        agents: CollectionStats::from_counts(agents),
        connected_clients: state.connected_clients(),
        uptime_seconds: state.uptime_seconds(),
        memory,
        timestamp: Utc::now(),
    }))
}

/// Memory of the current process, if the platform reports it
fn process_memory() -> Option<MemoryUsage> {
    let pid = sysinfo::get_current_pid().ok()?;
    let system = System::new_all();
    let process = system.process(pid)?;

    Some(MemoryUsage {
        resident_bytes: process.memory(),
        virtual_bytes: process.virtual_memory(),
    })
}
