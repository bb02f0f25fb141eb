// Use-case level inputs/outputs for the session loop.

use crate::domain::{EpilogueSnapshot, GrenadeSnapshot, PeerId, Pose, ShipSnapshot, SimEvent};
use crate::domain::state::EpilogueId;

#[derive(Debug, Clone)]
pub enum GameEvent {
    Join { peer_id: PeerId },
    Leave { peer_id: PeerId },
    Pose { peer_id: PeerId, pose: Pose },
    /// Binary envelope received from a peer.
    Protocol { peer_id: PeerId, bytes: Vec<u8> },
    EffectFinished { epilogue_id: EpilogueId },
}

#[derive(Debug, Clone)]
pub struct WorldUpdate {
    pub tick: u64,
    pub ships: Vec<ShipSnapshot>,
    pub grenades: Vec<GrenadeSnapshot>,
    pub epilogues: Vec<EpilogueSnapshot>,
    pub events: Vec<SimEvent>,
}
