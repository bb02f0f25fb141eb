// Wire protocol DTOs and conversions for the session host's WebSocket clients.
// Binary frames carry transport envelopes and never pass through these types.

use crate::domain::impact::ImpactOutcome;
use crate::domain::{EpilogueSnapshot, GrenadeSnapshot, Pose, ShipSnapshot, SimEvent};
use crate::use_cases::WorldUpdate;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    // Assigned peer id; also the id of the peer's ship.
    Identity { peer_id: String },
    WorldUpdate(WorldUpdateDto),
}

/// Messages the client sends to the server as text frames.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    // Live pose of the client's ship, authoritative for spawn placement.
    Pose(PoseDto),
    // The client finished playing an explosion effect.
    EffectFinished { epilogue_id: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct PoseDto {
    pub position: [f32; 3],
    /// Quaternion as `[x, y, z, w]`.
    pub rotation: [f32; 4],
    #[serde(default)]
    pub velocity: [f32; 3],
}

impl PoseDto {
    /// Rejects non-finite values and degenerate rotations.
    pub fn into_pose(self) -> Option<Pose> {
        let finite = self
            .position
            .iter()
            .chain(self.rotation.iter())
            .chain(self.velocity.iter())
            .all(|v| v.is_finite());
        if !finite {
            return None;
        }

        let rotation = Quat::from_array(self.rotation);
        if rotation.length_squared() < 1e-6 {
            return None;
        }

        Some(Pose {
            position: Vec3::from_array(self.position),
            rotation: rotation.normalize(),
            velocity: Vec3::from_array(self.velocity),
        })
    }
}

/// Snapshot of the world sent to clients on each tick.
#[derive(Debug, Clone, Serialize)]
pub struct WorldUpdateDto {
    pub tick: u64,
    pub ships: Vec<ShipStateDto>,
    pub grenades: Vec<GrenadeStateDto>,
    pub epilogues: Vec<EpilogueStateDto>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<SimEventDto>,
}

impl From<WorldUpdate> for WorldUpdateDto {
    fn from(update: WorldUpdate) -> Self {
        Self {
            tick: update.tick,
            ships: update.ships.iter().map(ShipStateDto::from).collect(),
            grenades: update.grenades.iter().map(GrenadeStateDto::from).collect(),
            epilogues: update.epilogues.iter().map(EpilogueStateDto::from).collect(),
            events: update.events.iter().map(SimEventDto::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ShipStateDto {
    pub id: String,
    pub position: [f32; 3],
    pub rotation: [f32; 4],
    pub hp: f32,
    pub score: u32,
}

impl From<&ShipSnapshot> for ShipStateDto {
    fn from(ship: &ShipSnapshot) -> Self {
        Self {
            id: ship.id.to_string(),
            position: ship.position.to_array(),
            rotation: ship.rotation.to_array(),
            hp: ship.hp,
            score: ship.score,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GrenadeStateDto {
    pub id: String,
    pub owner_id: String,
    pub position: [f32; 3],
    // Direction the mesh faces; follows velocity.
    pub forward: [f32; 3],
    pub bounces: u32,
}

impl From<&GrenadeSnapshot> for GrenadeStateDto {
    fn from(grenade: &GrenadeSnapshot) -> Self {
        Self {
            id: grenade.id.to_string(),
            owner_id: grenade.owner_id.to_string(),
            position: grenade.position.to_array(),
            forward: grenade.mesh_forward.to_array(),
            bounces: grenade.bounce_count,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EpilogueStateDto {
    pub id: String,
    pub position: [f32; 3],
    pub completed: bool,
}

impl From<&EpilogueSnapshot> for EpilogueStateDto {
    fn from(epilogue: &EpilogueSnapshot) -> Self {
        Self {
            id: epilogue.id.to_string(),
            position: epilogue.position.to_array(),
            completed: epilogue.completed,
        }
    }
}

/// Presentation events raised during the tick.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind")]
pub enum SimEventDto {
    VolleyDeployed {
        ship_id: String,
        play_cue: bool,
    },
    GrenadeOccluded {
        grenade_id: String,
    },
    ImpactSound {
        grenade_id: String,
        position: [f32; 3],
    },
    Explosion {
        grenade_id: String,
        position: [f32; 3],
        epilogue_id: String,
    },
    ShipStruck {
        target_id: String,
        owner_id: String,
        absorbed: bool,
        damage: f32,
    },
    ScoreAwarded {
        ship_id: String,
        score: u32,
    },
    ExplosiveDestroyed {
        explosive_id: String,
        owner_id: String,
    },
}

impl From<&SimEvent> for SimEventDto {
    fn from(event: &SimEvent) -> Self {
        match *event {
            SimEvent::VolleyDeployed { ship_id, play_cue } => SimEventDto::VolleyDeployed {
                ship_id: ship_id.to_string(),
                play_cue,
            },
            SimEvent::GrenadeOccluded { grenade_id } => SimEventDto::GrenadeOccluded {
                grenade_id: grenade_id.to_string(),
            },
            SimEvent::ImpactSound {
                grenade_id,
                position,
            } => SimEventDto::ImpactSound {
                grenade_id: grenade_id.to_string(),
                position: position.to_array(),
            },
            SimEvent::Explosion {
                grenade_id,
                position,
                epilogue_id,
            } => SimEventDto::Explosion {
                grenade_id: grenade_id.to_string(),
                position: position.to_array(),
                epilogue_id: epilogue_id.to_string(),
            },
            SimEvent::ShipStruck {
                target_id,
                owner_id,
                outcome,
            } => {
                let (absorbed, damage) = match outcome {
                    ImpactOutcome::Absorbed => (true, 0.0),
                    ImpactOutcome::Hit { damage } => (false, damage),
                };
                SimEventDto::ShipStruck {
                    target_id: target_id.to_string(),
                    owner_id: owner_id.to_string(),
                    absorbed,
                    damage,
                }
            }
            SimEvent::ScoreAwarded { ship_id, score } => SimEventDto::ScoreAwarded {
                ship_id: ship_id.to_string(),
                score,
            },
            SimEvent::ExplosiveDestroyed {
                explosive_id,
                owner_id,
            } => SimEventDto::ExplosiveDestroyed {
                explosive_id: explosive_id.to_string(),
                owner_id: owner_id.to_string(),
            },
        }
    }
}
