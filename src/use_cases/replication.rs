// Replication of grenade volleys between the session authority and participants.

use crate::domain::arena::Arena;
use crate::domain::packet::{
    DecodeError, Envelope, GRENADE_SUBCATEGORY, PacketHeader, SpawnMessage,
};
use crate::domain::ports::Environment;
use crate::domain::state::{GrenadeId, PeerId, ShipId};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Session host; relays every trigger it receives.
    Authority,
    Participant,
}

/// Logical transport channels used by this feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Shared by participant->authority triggers and authority->participant relays.
    WeaponSpawn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerHandle {
    pub id: PeerId,
    pub linked_ship: Option<ShipId>,
}

// Port for the session transport. Sends are fire-and-forget.
pub trait Transport: Send {
    fn local_peer_id(&self) -> PeerId;
    fn authority_peer_id(&self) -> PeerId;
    fn send(&self, bytes: &[u8], channel: Channel, peer: PeerId);
    /// Sends to every connected peer except `except`.
    fn send_to_all(&self, bytes: &[u8], channel: Channel, except: Option<PeerId>);
    fn resolve_peer(&self, id: PeerId) -> Option<PeerHandle>;
}

/// Result of handling one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// Another feature's traffic, or a different subcategory.
    NotForUs,
    /// Truncated or mistagged bytes; dropped after a diagnostic log.
    Malformed(DecodeError),
    UnknownPeer(PeerId),
    /// The peer is known but has no live ship to fire from.
    NoShip(PeerId),
    Spawned {
        ship_id: ShipId,
        grenades: Vec<GrenadeId>,
        relayed: bool,
    },
}

pub struct Replicator<T> {
    role: Role,
    transport: T,
}

impl<T: Transport> Replicator<T> {
    pub fn new(role: Role, transport: T) -> Self {
        Self { role, transport }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Local use of the pickup: spawn right away, then tell the others.
    pub fn fire_local<E: Environment>(
        &self,
        arena: &mut Arena<E>,
        ship_id: ShipId,
    ) -> Vec<GrenadeId> {
        let grenades = arena.spawn_volley(ship_id);

        let bytes = SpawnMessage {
            peer_id: self.transport.local_peer_id(),
        }
        .encode();
        match self.role {
            Role::Authority => self
                .transport
                .send_to_all(&bytes, Channel::WeaponSpawn, None),
            Role::Participant => self.transport.send(
                &bytes,
                Channel::WeaponSpawn,
                self.transport.authority_peer_id(),
            ),
        }
        grenades
    }

    /// Inbound custom message from `source`. `bytes` is the full envelope.
    pub fn on_message<E: Environment>(
        &self,
        arena: &mut Arena<E>,
        source: PeerId,
        bytes: &[u8],
    ) -> ReceiveOutcome {
        let envelope = match Envelope::parse(bytes) {
            Ok(envelope) => envelope,
            Err(e) => {
                debug!(peer_id = source, error = ?e, "dropping unreadable envelope");
                return ReceiveOutcome::Malformed(e);
            }
        };
        if envelope.header != PacketHeader::CustomMessage
            || envelope.subcategory != GRENADE_SUBCATEGORY
        {
            return ReceiveOutcome::NotForUs;
        }

        let message = match SpawnMessage::decode(envelope.payload) {
            Ok(message) => message,
            Err(DecodeError::TagMismatch) => {
                debug!(peer_id = source, "custom message belongs to another feature");
                return ReceiveOutcome::NotForUs;
            }
            Err(e) => {
                debug!(peer_id = source, error = ?e, "dropping malformed spawn trigger");
                return ReceiveOutcome::Malformed(e);
            }
        };

        let Some(peer) = self.transport.resolve_peer(message.peer_id) else {
            debug!(peer_id = message.peer_id, "spawn trigger for unknown peer");
            return ReceiveOutcome::UnknownPeer(message.peer_id);
        };
        let Some(ship_id) = peer.linked_ship.filter(|id| arena.ship(*id).is_some()) else {
            debug!(peer_id = peer.id, "spawn trigger for peer without a ship");
            return ReceiveOutcome::NoShip(peer.id);
        };

        let grenades = arena.spawn_volley(ship_id);

        // Relay the received bytes untouched; receivers rebuild from their own view.
        let relayed = self.role == Role::Authority;
        if relayed {
            self.transport
                .send_to_all(bytes, Channel::WeaponSpawn, Some(source));
        }

        info!(
            peer_id = peer.id,
            ship_id,
            relayed,
            "volley replicated"
        );
        ReceiveOutcome::Spawned {
            ship_id,
            grenades,
            relayed,
        }
    }
}
