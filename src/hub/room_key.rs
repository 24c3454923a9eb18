use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::Display;
use uuid::Uuid;

/// Opaque identity of one live client session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The kind of broadcast group a room represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[strum(serialize_all = "lowercase")]
enum RoomKind {
    User,
    Workspace,
    Project,
}

/// Typed room key, rendered as `<kind>:<id>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomKey {
    kind: RoomKind,
    id: String,
}

impl RoomKey {
    fn new(kind: RoomKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn user(user_id: impl Into<String>) -> Self {
        Self::new(RoomKind::User, user_id)
    }

    pub fn workspace(workspace_id: impl Into<String>) -> Self {
        Self::new(RoomKind::Workspace, workspace_id)
    }

    pub fn project(project_id: impl Into<String>) -> Self {
        Self::new(RoomKind::Project, project_id)
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(RoomKey::user("u1"), "user:u1")]
    #[case(RoomKey::workspace("w-9"), "workspace:w-9")]
    #[case(RoomKey::project("p:1"), "project:p:1")]
    fn test_room_key_display(#[case] key: RoomKey, #[case] expected: &str) {
        assert_eq!(key.to_string(), expected);
    }

    #[test]
    fn test_room_keys_differ_by_kind() {
        assert_ne!(RoomKey::user("1"), RoomKey::project("1"));
        assert_eq!(RoomKey::project("p1"), RoomKey::project("p1"));
    }

    #[test]
    fn test_connection_ids_are_unique() {
        assert_ne!(ConnectionId::new(), ConnectionId::new());
    }
}
