use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

use crate::adapters::{ChromaClient, PostgresStore};
use crate::api::{create_router, AppState};
use crate::config::AppConfig;
use crate::directory::{AgentDirectory, AGENT_DIRECTORY, MESSAGE_LOG};
use crate::error::Result;
use crate::persistence::{seed_default_agents, DocumentStore, MemoryStore};

/// Open the document store, seed it and connect the vector store
pub async fn build_state(config: &AppConfig, ephemeral: bool) -> Result<AppState> {
    let store: Arc<dyn DocumentStore> = if ephemeral {
        warn!("Running with an in-memory store, data is lost on exit");
        Arc::new(MemoryStore::new())
    } else {
        let store =
            PostgresStore::new(&config.database.url, config.database.max_connections).await?;
        store.migrate().await?;
        Arc::new(store)
    };

    seed_default_agents(store.as_ref()).await?;

    let directory = connect_directory(config).await;

    tokio::fs::create_dir_all(&config.server.uploads_dir).await?;

    Ok(AppState::new(
        store,
        directory,
        config.expose_error_details(),
    ))
}

/// Connect to the vector store; a missing or unreachable service only disables messaging
pub async fn connect_directory(config: &AppConfig) -> AgentDirectory {
    let Some(url) = config.vector_store.url.as_deref() else {
        warn!("No vector store configured, agent messaging disabled");
        return AgentDirectory::unavailable();
    };

    match ChromaClient::connect(url, &[AGENT_DIRECTORY, MESSAGE_LOG]).await {
        Ok(client) => AgentDirectory::new(Arc::new(client)),
        Err(e) => {
            warn!("Vector store at {} unavailable ({}), agent messaging disabled", url, e);
            AgentDirectory::unavailable()
        }
    }
}

/// Start the API server and run until Ctrl+C or SIGTERM
pub async fn start_api_server(config: &AppConfig, state: AppState) -> Result<()> {
    let app = create_router(state, &config.server);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = TcpListener::bind(addr).await?;
    info!("🚀 API server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API server stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
