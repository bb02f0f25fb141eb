use crate::interface_adapters::net::PeerRegistry;
use crate::use_cases::{GameEvent, WorldUpdate};
use axum::extract::ws::Utf8Bytes;
use tokio::sync::{broadcast, mpsc, watch};

#[derive(Clone)]
pub struct AppState {
    // Events flowing from the sockets into the session loop.
    pub input_tx: mpsc::Sender<GameEvent>,
    // World updates produced by the session loop (domain structs).
    pub world_tx: broadcast::Sender<WorldUpdate>,
    // Serialized world updates, shared across all connections.
    pub world_bytes_tx: broadcast::Sender<Utf8Bytes>,
    // Latest serialized world update for lag recovery.
    pub world_latest_tx: watch::Sender<Utf8Bytes>,
    // Outbound binary queues of connected peers; also the session transport.
    pub peers: PeerRegistry,
    pub outbound_capacity: usize,
}
