use axum::{
    http::HeaderValue,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::warn;

use crate::api::{handlers, state::AppState, websocket::websocket_handler};
use crate::config::ServerConfig;

pub fn create_router(state: AppState, server: &ServerConfig) -> Router {
    // CORS configuration
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    let cors = match server.frontend_url.trim_end_matches('/').parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin),
        Err(e) => {
            warn!(
                "Invalid frontend origin {:?} ({}), allowing any origin",
                server.frontend_url, e
            );
            cors.allow_origin(Any)
        }
    };

    Router::new()
        // Project endpoints
        .route(
            "/api/projects",
            get(handlers::list_projects).post(handlers::create_project),
        )
        .route(
            "/api/projects/:id",
            get(handlers::get_project)
                .put(handlers::update_project)
                .delete(handlers::delete_project),
        )
        // Agent endpoints
        .route(
            "/api/agents",
            get(handlers::list_agents).post(handlers::register_agent),
        )
        .route("/api/agents/message", post(handlers::send_message))
        .route("/api/agents/messages", get(handlers::list_messages))
        .route(
            "/api/agents/:id",
            put(handlers::update_agent).delete(handlers::delete_agent),
        )
        // System endpoints
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/health", get(handlers::health_handler))
        // WebSocket endpoint
        .route("/ws", get(websocket_handler))
        // Uploaded files
        .nest_service("/uploads", ServeDir::new(&server.uploads_dir))
        // Add state and CORS
        .with_state(state)
        .layer(cors)
}
