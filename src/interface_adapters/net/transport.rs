// WebSocket-backed transport: every connected peer owns a bounded outbound queue
// drained by its socket task.

use crate::domain::PeerId;
use crate::use_cases::{Channel, PeerHandle, Transport};
use axum::body::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::warn;

/// The session host is always the authority and never has a socket of its own.
pub const HOST_PEER_ID: PeerId = 0;

#[derive(Clone, Default)]
pub struct PeerRegistry {
    peers: Arc<RwLock<HashMap<PeerId, mpsc::Sender<Bytes>>>>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, peer_id: PeerId, outbound: mpsc::Sender<Bytes>) {
        match self.peers.write() {
            Ok(mut peers) => {
                peers.insert(peer_id, outbound);
            }
            Err(_) => warn!(peer_id, "peer registry poisoned; register skipped"),
        }
    }

    pub fn unregister(&self, peer_id: PeerId) {
        match self.peers.write() {
            Ok(mut peers) => {
                peers.remove(&peer_id);
            }
            Err(_) => warn!(peer_id, "peer registry poisoned; unregister skipped"),
        }
    }

    fn deliver(peer_id: PeerId, outbound: &mpsc::Sender<Bytes>, bytes: Bytes) {
        // Fire-and-forget: a slow socket loses messages rather than stalling the tick.
        match outbound.try_send(bytes) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => warn!(peer_id, "outbound queue full; dropping message"),
            Err(TrySendError::Closed(_)) => {}
        }
    }
}

impl Transport for PeerRegistry {
    fn local_peer_id(&self) -> PeerId {
        HOST_PEER_ID
    }

    fn authority_peer_id(&self) -> PeerId {
        HOST_PEER_ID
    }

    fn send(&self, bytes: &[u8], _channel: Channel, peer: PeerId) {
        let Ok(peers) = self.peers.read() else {
            return;
        };
        if let Some(outbound) = peers.get(&peer) {
            Self::deliver(peer, outbound, Bytes::copy_from_slice(bytes));
        }
    }

    fn send_to_all(&self, bytes: &[u8], _channel: Channel, except: Option<PeerId>) {
        let Ok(peers) = self.peers.read() else {
            return;
        };
        // One shared buffer for every recipient.
        let bytes = Bytes::copy_from_slice(bytes);
        for (&peer_id, outbound) in peers.iter() {
            if Some(peer_id) == except {
                continue;
            }
            Self::deliver(peer_id, outbound, bytes.clone());
        }
    }

    fn resolve_peer(&self, id: PeerId) -> Option<PeerHandle> {
        let peers = self.peers.read().ok()?;
        // Every socket peer flies the ship that shares its id.
        peers.contains_key(&id).then_some(PeerHandle {
            id,
            linked_ship: Some(id),
        })
    }
}
