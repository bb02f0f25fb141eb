// Per-session context: the arena plus the replication role and transport it runs under.

use crate::domain::arena::Arena;
use crate::domain::grenade::CollisionBody;
use crate::domain::ports::Environment;
use crate::domain::state::{GrenadeId, PeerId, ShipId};
use crate::use_cases::replication::{ReceiveOutcome, Replicator, Transport};

pub struct Session<E, T> {
    arena: Arena<E>,
    replicator: Replicator<T>,
}

impl<E: Environment, T: Transport> Session<E, T> {
    pub fn new(arena: Arena<E>, replicator: Replicator<T>) -> Self {
        Self { arena, replicator }
    }

    pub fn arena(&self) -> &Arena<E> {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut Arena<E> {
        &mut self.arena
    }

    /// The local ship used its grenade pickup.
    pub fn spawn_volley(&mut self, ship_id: ShipId) -> Vec<GrenadeId> {
        self.replicator.fire_local(&mut self.arena, ship_id)
    }

    pub fn step_all(&mut self, dt: f32) {
        self.arena.step(dt);
    }

    pub fn on_collision(&mut self, grenade_id: GrenadeId, body: CollisionBody) -> bool {
        self.arena.on_collision(grenade_id, body)
    }

    pub fn on_protocol_message(&mut self, source: PeerId, bytes: &[u8]) -> ReceiveOutcome {
        self.replicator.on_message(&mut self.arena, source, bytes)
    }
}
