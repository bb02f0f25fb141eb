use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::domain::state::{PeerId, ShipId};
use crate::use_cases::replication::{Channel, PeerHandle, Transport};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Sent {
    To(PeerId, Vec<u8>),
    All {
        except: Option<PeerId>,
        bytes: Vec<u8>,
    },
}

// In-memory transport that records sends and peer lookups.
#[derive(Clone, Default)]
pub(crate) struct RecordingTransport {
    local: PeerId,
    peers: HashMap<PeerId, Option<ShipId>>,
    sent: Arc<Mutex<Vec<Sent>>>,
    lookups: Arc<Mutex<Vec<PeerId>>>,
}

impl RecordingTransport {
    pub(crate) fn new(local: PeerId) -> Self {
        Self {
            local,
            ..Self::default()
        }
    }

    pub(crate) fn with_peer(mut self, id: PeerId, ship: Option<ShipId>) -> Self {
        self.peers.insert(id, ship);
        self
    }

    pub(crate) fn sent(&self) -> Vec<Sent> {
        self.sent.lock().expect("sent mutex poisoned").clone()
    }

    pub(crate) fn lookups(&self) -> Vec<PeerId> {
        self.lookups.lock().expect("lookups mutex poisoned").clone()
    }
}

impl Transport for RecordingTransport {
    fn local_peer_id(&self) -> PeerId {
        self.local
    }

    fn authority_peer_id(&self) -> PeerId {
        0
    }

    fn send(&self, bytes: &[u8], _channel: Channel, peer: PeerId) {
        let mut guard = self.sent.lock().expect("sent mutex poisoned");
        guard.push(Sent::To(peer, bytes.to_vec()));
    }

    fn send_to_all(&self, bytes: &[u8], _channel: Channel, except: Option<PeerId>) {
        let mut guard = self.sent.lock().expect("sent mutex poisoned");
        guard.push(Sent::All {
            except,
            bytes: bytes.to_vec(),
        });
    }

    fn resolve_peer(&self, id: PeerId) -> Option<PeerHandle> {
        let mut guard = self.lookups.lock().expect("lookups mutex poisoned");
        guard.push(id);
        self.peers.get(&id).map(|ship| PeerHandle {
            id,
            linked_ship: *ship,
        })
    }
}
