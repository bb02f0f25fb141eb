// Domain layer: core simulation types and rules.

pub mod arena;
pub mod epilogue;
pub mod geometry;
pub mod grenade;
pub mod impact;
pub mod math;
pub mod packet;
pub mod ports;
pub mod state;
pub mod systems;
pub mod tuning;

pub use arena::{Arena, SimEvent};
pub use grenade::{CollisionBody, Grenade, GrenadeState};
pub use state::{
    EpilogueSnapshot, GrenadeSnapshot, PeerId, Pose, ShipId, ShipSnapshot, SimShip,
};
