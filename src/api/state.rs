use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{Broadcast, WsMessage};
use crate::directory::AgentDirectory;
use crate::error::DeckError;
use crate::persistence::DocumentStore;

/// Capacity of the event channel; slower clients skip what they miss
pub const BROADCAST_CAPACITY: usize = 1000;

/// Shared application state for API handlers
#[derive(Clone)]
pub struct AppState {
    /// Primary document store
    pub store: Arc<dyn DocumentStore>,

    /// External directory and message log
    pub directory: AgentDirectory,

    /// WebSocket broadcast channel
    pub ws_tx: broadcast::Sender<Broadcast>,

    /// Application start time
    pub start_time: DateTime<Utc>,

    /// Echo internal error messages to clients (development only)
    pub expose_errors: bool,

    connected_clients: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, directory: AgentDirectory, expose_errors: bool) -> Self {
        let (ws_tx, _) = broadcast::channel(BROADCAST_CAPACITY);

        Self {
            store,
            directory,
            ws_tx,
            start_time: Utc::now(),
            expose_errors,
            connected_clients: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Broadcast a message to all WebSocket clients
    pub fn broadcast(&self, msg: WsMessage) {
        self.send(Broadcast {
            origin: None,
            message: msg,
        });
    }

    /// Broadcast to every client except the connection `origin`
    pub fn broadcast_from(&self, origin: Uuid, msg: WsMessage) {
        self.send(Broadcast {
            origin: Some(origin),
            message: msg,
        });
    }

    fn send(&self, broadcast: Broadcast) {
        debug!("Broadcasting {}", broadcast.message.event_name());
        // Ignore errors (no receivers)
        let _ = self.ws_tx.send(broadcast);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Broadcast> {
        self.ws_tx.subscribe()
    }

    /// Get uptime in seconds
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.start_time).num_seconds()
    }

    /// Convert a crate error into an HTTP error response
    pub fn reject(&self, err: DeckError) -> ApiError {
        ApiError::from_error(&err, self.expose_errors)
    }

    pub fn client_connected(&self) -> usize {
        self.connected_clients.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn client_disconnected(&self) -> usize {
        self.connected_clients
            .fetch_sub(1, Ordering::SeqCst)
            .saturating_sub(1)
    }

    pub fn connected_clients(&self) -> usize {
        self.connected_clients.load(Ordering::SeqCst)
    }
}
