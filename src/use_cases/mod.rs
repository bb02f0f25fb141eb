// Use cases layer: application workflows for the session host.

pub mod game;
pub mod replication;
pub mod session;
pub mod types;

pub use replication::{Channel, PeerHandle, ReceiveOutcome, Replicator, Role, Transport};
pub use session::Session;
pub use types::{GameEvent, WorldUpdate};

#[cfg(test)]
pub(crate) mod test_support;
