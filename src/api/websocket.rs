use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use std::collections::HashSet;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::api::state::AppState;
use crate::api::types::{AgentStatusUpdate, Broadcast, ClientEvent, WsMessage};
use crate::domain::AgentStatusPing;

/// WebSocket handler for the presence channel
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    // Subscribe before the upgrade so events published while the
    // handshake completes are not lost.
    let rx = state.subscribe();
    ws.on_upgrade(|socket| handle_socket(socket, state, rx))
}

async fn handle_socket(socket: WebSocket, state: AppState, mut rx: broadcast::Receiver<Broadcast>) {
    let connection_id = Uuid::new_v4();
    let clients = state.client_connected();
    info!("WebSocket client {} connected ({} total)", connection_id, clients);

    let (mut sender, mut receiver) = socket.split();

    // Spawn a task to forward broadcast messages to this WebSocket
    let send_task = tokio::spawn(async move {
        loop {
            let broadcast = match rx.recv().await {
                Ok(broadcast) => broadcast,
                Err(RecvError::Lagged(skipped)) => {
                    warn!("WebSocket client {} lagged, skipped {} events", connection_id, skipped);
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            if broadcast.origin == Some(connection_id) {
                continue;
            }

            let json = match serde_json::to_string(&broadcast.message) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize WebSocket message: {}", e);
                    continue;
                }
            };

            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    let mut rooms: HashSet<String> = HashSet::new();

    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => handle_event(&state, connection_id, &mut rooms, event).await,
                Err(e) => debug!("Ignoring unparseable frame from {}: {}", connection_id, e),
            },
            Message::Close(_) => {
                break;
            }
            // Axum answers pings itself
            _ => {}
        }
    }

    // Abort the send task when connection closes
    send_task.abort();

    let clients = state.client_disconnected();
    info!("WebSocket client {} disconnected ({} remaining)", connection_id, clients);
}

async fn handle_event(
    state: &AppState,
    connection_id: Uuid,
    rooms: &mut HashSet<String>,
    event: ClientEvent,
) {
    match event {
        ClientEvent::JoinAgent(agent_id) => {
            info!("Client {} joined agent room {}", connection_id, agent_id);
            rooms.insert(agent_id);
        }
        ClientEvent::AgentStatus(ping) => {
            if let Some(update) = record_status(state, ping).await {
                state.broadcast_from(connection_id, WsMessage::AgentStatusUpdate(update));
            }
        }
    }
}

async fn record_status(state: &AppState, ping: AgentStatusPing) -> Option<AgentStatusUpdate> {
    let ping = match ping.validate() {
        Ok(ping) => ping,
        Err(e) => {
            warn!("Rejected agent status: {}", e);
            return None;
        }
    };

    match state.store.upsert_agent_status(&ping).await {
        Ok(agent) => {
            debug!("Agent {} is now {}", agent.agent_id, agent.status);
            Some(AgentStatusUpdate::from(&agent))
        }
        Err(e) => {
            error!("Failed to record status for {}: {}", ping.agent_id, e);
            None
        }
    }
}
