// Room hub: connection registry, room membership and fan-out

// Public API - what other modules can use
pub use connection_registry::{InMemoryRoomHub, RoomHub};
pub use room_key::{ConnectionId, RoomKey};
pub use sequence::ProjectSequencer;

use thiserror::Error;

// Internal modules
mod connection_registry;
mod room_key;
mod sequence;

/// Hub-internal failures. These are logged and never sent to clients.
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Unknown connection: {0}")]
    UnknownConnection(ConnectionId),
}
