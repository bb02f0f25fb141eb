// Network adapter modules: client sockets and the transport they feed.

pub mod client;
pub mod transport;

pub use client::{world_update_serializer, ws_handler};
pub use transport::{HOST_PEER_ID, PeerRegistry};
