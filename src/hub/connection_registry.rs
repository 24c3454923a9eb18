use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, instrument, warn};

use super::{ConnectionId, HubError, RoomKey};

/// Connection registry and room fan-out
///
/// Unknown connections and rooms are never surfaced to callers: they only
/// arise from races between a disconnect and an in-flight operation, so every
/// method logs and carries on.
#[async_trait]
pub trait RoomHub: Send + Sync {
    /// Register a new connection with its outbound channel
    async fn connect(&self, sender: mpsc::UnboundedSender<String>) -> ConnectionId;

    /// Bind a connection to a user and join it to `user:<id>`
    async fn authenticate(&self, connection_id: ConnectionId, user_id: &str);

    async fn join_room(&self, connection_id: ConnectionId, room: RoomKey);

    async fn leave_room(&self, connection_id: ConnectionId, room: &RoomKey);

    /// Deliver a message to every current member of `room` except `exclude`.
    /// Returns the number of connections the message was handed to.
    async fn broadcast(
        &self,
        room: &RoomKey,
        message: &str,
        exclude: Option<ConnectionId>,
    ) -> usize;

    /// Send directly to one connection, returns false if it is gone
    async fn send_to_connection(&self, connection_id: ConnectionId, message: &str) -> bool;

    /// Drop every membership of the connection and forget it
    async fn disconnect(&self, connection_id: ConnectionId);

    async fn user_of(&self, connection_id: ConnectionId) -> Option<String>;

    async fn rooms_of(&self, connection_id: ConnectionId) -> Vec<RoomKey>;

    async fn members_of(&self, room: &RoomKey) -> Vec<ConnectionId>;

    async fn connection_count(&self) -> usize;
}

struct ConnectionEntry {
    user_id: Option<String>,
    rooms: HashSet<RoomKey>,
    sender: mpsc::UnboundedSender<String>,
}

#[derive(Default)]
struct Registry {
    connections: HashMap<ConnectionId, ConnectionEntry>,
    // room -> members, rooms with no members are removed
    rooms: HashMap<RoomKey, HashSet<ConnectionId>>,
}

impl Registry {
    fn entry_mut(&mut self, connection_id: ConnectionId) -> Result<&mut ConnectionEntry, HubError> {
        self.connections
            .get_mut(&connection_id)
            .ok_or(HubError::UnknownConnection(connection_id))
    }

    fn join(&mut self, connection_id: ConnectionId, room: RoomKey) -> Result<bool, HubError> {
        let entry = self.entry_mut(connection_id)?;
        if !entry.rooms.insert(room.clone()) {
            return Ok(false);
        }
        self.rooms.entry(room).or_default().insert(connection_id);
        Ok(true)
    }

    fn leave(&mut self, connection_id: ConnectionId, room: &RoomKey) -> Result<bool, HubError> {
        let entry = self.entry_mut(connection_id)?;
        if !entry.rooms.remove(room) {
            return Ok(false);
        }
        self.remove_member(room, connection_id);
        Ok(true)
    }

    fn remove_member(&mut self, room: &RoomKey, connection_id: ConnectionId) {
        if let Some(members) = self.rooms.get_mut(room) {
            members.remove(&connection_id);
            if members.is_empty() {
                self.rooms.remove(room);
            }
        }
    }
}

/// In-memory room hub, one per process
///
/// All state sits behind a single lock so that disconnect purges the
/// connection record and its memberships in one step. Broadcast enumerates
/// and sends under the read lock: once `disconnect` holds the write lock no
/// later broadcast can reach the connection.
pub struct InMemoryRoomHub {
    registry: RwLock<Registry>,
}

impl InMemoryRoomHub {
    pub fn new() -> Self {
        Self {
            registry: RwLock::new(Registry::default()),
        }
    }

    // Emptied rooms must be pruned, tests check this
    #[cfg(test)]
    async fn room_count(&self) -> usize {
        self.registry.read().await.rooms.len()
    }
}

impl Default for InMemoryRoomHub {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoomHub for InMemoryRoomHub {
    #[instrument(skip(self, sender))]
    async fn connect(&self, sender: mpsc::UnboundedSender<String>) -> ConnectionId {
        let connection_id = ConnectionId::new();
        let mut registry = self.registry.write().await;
        registry.connections.insert(
            connection_id,
            ConnectionEntry {
                user_id: None,
                rooms: HashSet::new(),
                sender,
            },
        );

        info!(connection_id = %connection_id, "Connection registered");
        connection_id
    }

    #[instrument(skip(self))]
    async fn authenticate(&self, connection_id: ConnectionId, user_id: &str) {
        let mut registry = self.registry.write().await;

        let previous = match registry.entry_mut(connection_id) {
            Ok(entry) => {
                if entry.user_id.as_deref() == Some(user_id) {
                    debug!(connection_id = %connection_id, user_id = %user_id, "Already authenticated");
                    return;
                }
                entry.user_id.replace(user_id.to_string())
            }
            Err(e) => {
                warn!(error = %e, "Ignoring authenticate for unknown connection");
                return;
            }
        };

        if let Some(previous_user) = previous {
            if let Err(e) = registry.leave(connection_id, &RoomKey::user(previous_user)) {
                warn!(error = %e, "Failed to leave previous user room");
            }
        }
        if let Err(e) = registry.join(connection_id, RoomKey::user(user_id)) {
            warn!(error = %e, "Failed to join user room");
        }

        info!(
            connection_id = %connection_id,
            user_id = %user_id,
            "Connection authenticated"
        );
    }

    #[instrument(skip(self, room), fields(room = %room))]
    async fn join_room(&self, connection_id: ConnectionId, room: RoomKey) {
        let mut registry = self.registry.write().await;
        match registry.join(connection_id, room) {
            Ok(true) => debug!(connection_id = %connection_id, "Joined room"),
            Ok(false) => debug!(connection_id = %connection_id, "Already a member"),
            Err(e) => warn!(error = %e, "Ignoring join for unknown connection"),
        }
    }

    #[instrument(skip(self, room), fields(room = %room))]
    async fn leave_room(&self, connection_id: ConnectionId, room: &RoomKey) {
        let mut registry = self.registry.write().await;
        match registry.leave(connection_id, room) {
            Ok(true) => debug!(connection_id = %connection_id, "Left room"),
            Ok(false) => debug!(connection_id = %connection_id, "Not a member"),
            Err(e) => warn!(error = %e, "Ignoring leave for unknown connection"),
        }
    }

    async fn broadcast(
        &self,
        room: &RoomKey,
        message: &str,
        exclude: Option<ConnectionId>,
    ) -> usize {
        let registry = self.registry.read().await;

        let members = match registry.rooms.get(room) {
            Some(members) => members,
            None => {
                debug!(room = %room, "Broadcast to empty room");
                return 0;
            }
        };

        let mut delivered = 0;
        for connection_id in members {
            if Some(*connection_id) == exclude {
                continue;
            }
            let Some(entry) = registry.connections.get(connection_id) else {
                continue;
            };
            match entry.sender.send(message.to_string()) {
                Ok(()) => delivered += 1,
                Err(_) => {
                    debug!(
                        room = %room,
                        connection_id = %connection_id,
                        "Outbound channel closed, skipping"
                    );
                }
            }
        }

        debug!(room = %room, receivers = delivered, "Room broadcast sent");
        delivered
    }

    async fn send_to_connection(&self, connection_id: ConnectionId, message: &str) -> bool {
        let registry = self.registry.read().await;
        match registry.connections.get(&connection_id) {
            Some(entry) => entry.sender.send(message.to_string()).is_ok(),
            None => {
                debug!(connection_id = %connection_id, "Direct send to unknown connection");
                false
            }
        }
    }

    #[instrument(skip(self))]
    async fn disconnect(&self, connection_id: ConnectionId) {
        let mut registry = self.registry.write().await;

        let Some(entry) = registry.connections.remove(&connection_id) else {
            debug!(connection_id = %connection_id, "Disconnect for unknown connection");
            return;
        };

        for room in &entry.rooms {
            registry.remove_member(room, connection_id);
        }

        info!(
            connection_id = %connection_id,
            user_id = ?entry.user_id,
            rooms = entry.rooms.len(),
            "Connection removed"
        );
    }

    async fn user_of(&self, connection_id: ConnectionId) -> Option<String> {
        let registry = self.registry.read().await;
        registry
            .connections
            .get(&connection_id)
            .and_then(|entry| entry.user_id.clone())
    }

    async fn rooms_of(&self, connection_id: ConnectionId) -> Vec<RoomKey> {
        let registry = self.registry.read().await;
        let mut rooms: Vec<RoomKey> = registry
            .connections
            .get(&connection_id)
            .map(|entry| entry.rooms.iter().cloned().collect())
            .unwrap_or_default();
        rooms.sort();
        rooms
    }

    async fn members_of(&self, room: &RoomKey) -> Vec<ConnectionId> {
        let registry = self.registry.read().await;
        let mut members: Vec<ConnectionId> = registry
            .rooms
            .get(room)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default();
        members.sort();
        members
    }

    async fn connection_count(&self) -> usize {
        self.registry.read().await.connections.len()
    }
}
