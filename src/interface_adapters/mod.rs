// Interface adapters: wire protocol, peer transport and socket handling.

pub mod net;
pub mod protocol;
pub mod state;
pub mod utils;
