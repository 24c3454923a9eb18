use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Message types for WebSocket communication
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum MessageType {
    // Client -> Server
    Authenticate,
    JoinWorkspace,
    LeaveWorkspace,
    JoinProject,
    LeaveProject,
    TaskUpdate,
    CommentAdded,
    Typing,

    // Server -> Client
    Authenticated,
    TaskUpdated,
    NewComment,
    UserTyping,
    Error,
}

/// Metadata for WebSocket messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketMessageMeta {
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Per-project sequence stamped by the hub on task-updated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u64>,
}

/// Base structure for WebSocket messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketMessage {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub payload: serde_json::Value,
    #[serde(default)]
    pub meta: Option<WebSocketMessageMeta>,
}

/// Client-to-Server message payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatePayload {
    /// Bearer credential; older clients send their bare user id
    #[serde(alias = "userId")]
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspacePayload {
    pub workspace_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPayload {
    pub project_id: String,
}

/// Shared by task-update (client) and task-updated (server)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdatePayload {
    pub project_id: String,
    pub task_id: String,
    pub updates: serde_json::Value,
}

/// Shared by comment-added (client) and new-comment (server)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommentPayload {
    pub project_id: String,
    pub task_id: String,
    pub comment: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    pub project_id: String,
    pub task_id: String,
    pub is_typing: bool,
}

/// Server-to-Client message payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedPayload {
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserTypingPayload {
    pub user_id: Option<String>,
    pub task_id: String,
    pub is_typing: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}

/// Helper functions for creating messages
impl WebSocketMessage {
    pub fn new(message_type: MessageType, payload: serde_json::Value) -> Self {
        Self {
            message_type,
            payload,
            meta: Some(WebSocketMessageMeta {
                timestamp: Utc::now(),
                user_id: None,
                sequence: None,
            }),
        }
    }

    fn with_payload<T: Serialize>(message_type: MessageType, payload: T) -> Self {
        // Payload structs only hold strings, bools and JSON values
        Self::new(
            message_type,
            serde_json::to_value(payload).unwrap_or_default(),
        )
    }

    /// Decode the payload into one of the typed payload structs
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }

    pub fn sequence(&self) -> Option<u64> {
        self.meta.as_ref().and_then(|meta| meta.sequence)
    }

    pub fn with_user(mut self, user_id: Option<String>) -> Self {
        if let Some(meta) = self.meta.as_mut() {
            meta.user_id = user_id;
        }
        self
    }

    pub fn with_sequence(mut self, sequence: u64) -> Self {
        if let Some(meta) = self.meta.as_mut() {
            meta.sequence = Some(sequence);
        }
        self
    }

    /// Create an AUTHENTICATE message
    pub fn authenticate(token: String) -> Self {
        Self::with_payload(MessageType::Authenticate, AuthenticatePayload { token })
    }

    /// Create a JOIN_WORKSPACE message
    pub fn join_workspace(workspace_id: String) -> Self {
        Self::with_payload(MessageType::JoinWorkspace, WorkspacePayload { workspace_id })
    }

    /// Create a LEAVE_WORKSPACE message
    pub fn leave_workspace(workspace_id: String) -> Self {
        Self::with_payload(MessageType::LeaveWorkspace, WorkspacePayload { workspace_id })
    }

    /// Create a JOIN_PROJECT message
    pub fn join_project(project_id: String) -> Self {
        Self::with_payload(MessageType::JoinProject, ProjectPayload { project_id })
    }

    /// Create a LEAVE_PROJECT message
    pub fn leave_project(project_id: String) -> Self {
        Self::with_payload(MessageType::LeaveProject, ProjectPayload { project_id })
    }

    /// Create a TASK_UPDATE message
    pub fn task_update(project_id: String, task_id: String, updates: serde_json::Value) -> Self {
        Self::with_payload(
            MessageType::TaskUpdate,
            TaskUpdatePayload {
                project_id,
                task_id,
                updates,
            },
        )
    }

    /// Create a COMMENT_ADDED message
    pub fn comment_added(project_id: String, task_id: String, comment: serde_json::Value) -> Self {
        Self::with_payload(
            MessageType::CommentAdded,
            CommentPayload {
                project_id,
                task_id,
                comment,
            },
        )
    }

    /// Create a TYPING message
    pub fn typing(project_id: String, task_id: String, is_typing: bool) -> Self {
        Self::with_payload(
            MessageType::Typing,
            TypingPayload {
                project_id,
                task_id,
                is_typing,
            },
        )
    }

    /// Create an AUTHENTICATED message
    pub fn authenticated(user_id: String) -> Self {
        Self::with_payload(MessageType::Authenticated, AuthenticatedPayload { user_id })
    }

    /// Create a TASK_UPDATED message
    pub fn task_updated(payload: TaskUpdatePayload) -> Self {
        Self::with_payload(MessageType::TaskUpdated, payload)
    }

    /// Create a NEW_COMMENT message
    pub fn new_comment(payload: CommentPayload) -> Self {
        Self::with_payload(MessageType::NewComment, payload)
    }

    /// Create a USER_TYPING message
    pub fn user_typing(user_id: Option<String>, task_id: String, is_typing: bool) -> Self {
        Self::with_payload(
            MessageType::UserTyping,
            UserTypingPayload {
                user_id,
                task_id,
                is_typing,
            },
        )
    }

    /// Create an ERROR message
    pub fn error(message: String) -> Self {
        Self::with_payload(MessageType::Error, ErrorPayload { message })
    }
}
