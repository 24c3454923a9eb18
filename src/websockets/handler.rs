use async_trait::async_trait;
use axum::{
    extract::{Query, State, WebSocketUpgrade},
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::auth::Authenticator;
use crate::hub::{ConnectionId, ProjectSequencer, RoomHub, RoomKey};
use crate::shared::{AppError, AppState};
use crate::websockets::messages::{
    AuthenticatePayload, CommentPayload, MessageType, ProjectPayload, TaskUpdatePayload,
    TypingPayload, WebSocketMessage, WorkspacePayload,
};

use super::socket::{Connection, MessageHandler, SocketWrapper};

/// Routes client frames to hub operations
pub struct WebsocketReceiveHandler {
    hub: Arc<dyn RoomHub>,
    authenticator: Arc<dyn Authenticator>,
    sequencer: Arc<ProjectSequencer>,
}

impl WebsocketReceiveHandler {
    pub fn new(
        hub: Arc<dyn RoomHub>,
        authenticator: Arc<dyn Authenticator>,
        sequencer: Arc<ProjectSequencer>,
    ) -> Self {
        Self {
            hub,
            authenticator,
            sequencer,
        }
    }

    pub fn from_state(app_state: &AppState) -> Self {
        Self::new(
            app_state.hub.clone(),
            app_state.authenticator.clone(),
            app_state.sequencer.clone(),
        )
    }

    async fn reply(&self, connection_id: ConnectionId, message: WebSocketMessage) {
        match serde_json::to_string(&message) {
            Ok(json) => {
                self.hub.send_to_connection(connection_id, &json).await;
            }
            Err(e) => warn!(error = %e, "Failed to serialize reply"),
        }
    }

    async fn reply_error(&self, connection_id: ConnectionId, message: impl Into<String>) {
        self.reply(connection_id, WebSocketMessage::error(message.into()))
            .await;
    }

    async fn fan_out(&self, room: &RoomKey, message: WebSocketMessage, exclude: ConnectionId) {
        match serde_json::to_string(&message) {
            Ok(json) => {
                let delivered = self.hub.broadcast(room, &json, Some(exclude)).await;
                debug!(
                    room = %room,
                    message_type = ?message.message_type,
                    delivered,
                    "Relayed event"
                );
            }
            Err(e) => warn!(room = %room, error = %e, "Failed to serialize event"),
        }
    }

    async fn on_authenticate(&self, connection_id: ConnectionId, payload: AuthenticatePayload) {
        match self.authenticator.verify(&payload.token).await {
            Ok(user_id) => {
                self.hub.authenticate(connection_id, &user_id).await;
                self.reply(connection_id, WebSocketMessage::authenticated(user_id))
                    .await;
            }
            Err(e) => {
                warn!(connection_id = %connection_id, error = %e, "Authentication failed");
                self.reply_error(connection_id, "Authentication failed").await;
            }
        }
    }

    async fn on_task_update(&self, connection_id: ConnectionId, payload: TaskUpdatePayload) {
        let room = RoomKey::project(payload.project_id.as_str());
        let sequence = self.sequencer.next();
        let user_id = self.hub.user_of(connection_id).await;
        let event = WebSocketMessage::task_updated(payload)
            .with_user(user_id)
            .with_sequence(sequence);
        self.fan_out(&room, event, connection_id).await;
    }

    async fn on_comment_added(&self, connection_id: ConnectionId, payload: CommentPayload) {
        let room = RoomKey::project(payload.project_id.as_str());
        let user_id = self.hub.user_of(connection_id).await;
        let event = WebSocketMessage::new_comment(payload).with_user(user_id);
        self.fan_out(&room, event, connection_id).await;
    }

    async fn on_typing(&self, connection_id: ConnectionId, payload: TypingPayload) {
        let room = RoomKey::project(payload.project_id.as_str());
        let user_id = self.hub.user_of(connection_id).await;
        let event = WebSocketMessage::user_typing(user_id, payload.task_id, payload.is_typing);
        self.fan_out(&room, event, connection_id).await;
    }

    async fn dispatch(
        &self,
        connection_id: ConnectionId,
        message: WebSocketMessage,
    ) -> Result<(), serde_json::Error> {
        match &message.message_type {
            MessageType::Authenticate => {
                self.on_authenticate(connection_id, message.payload_as()?)
                    .await
            }
            MessageType::JoinWorkspace => {
                let payload: WorkspacePayload = message.payload_as()?;
                self.hub
                    .join_room(connection_id, RoomKey::workspace(payload.workspace_id))
                    .await;
            }
            MessageType::LeaveWorkspace => {
                let payload: WorkspacePayload = message.payload_as()?;
                self.hub
                    .leave_room(connection_id, &RoomKey::workspace(payload.workspace_id))
                    .await;
            }
            MessageType::JoinProject => {
                let payload: ProjectPayload = message.payload_as()?;
                self.hub
                    .join_room(connection_id, RoomKey::project(payload.project_id))
                    .await;
            }
            MessageType::LeaveProject => {
                let payload: ProjectPayload = message.payload_as()?;
                self.hub
                    .leave_room(connection_id, &RoomKey::project(payload.project_id))
                    .await;
            }
            MessageType::TaskUpdate => {
                self.on_task_update(connection_id, message.payload_as()?)
                    .await
            }
            MessageType::CommentAdded => {
                self.on_comment_added(connection_id, message.payload_as()?)
                    .await
            }
            MessageType::Typing => self.on_typing(connection_id, message.payload_as()?).await,
            other => {
                debug!(
                    connection_id = %connection_id,
                    message_type = ?other,
                    "Ignoring server-only message type from client"
                );
            }
        }
        Ok(())
    }
}

#[async_trait]
impl MessageHandler for WebsocketReceiveHandler {
    async fn handle_message(&self, connection_id: ConnectionId, message: String) {
        debug!(
            connection_id = %connection_id,
            message = %message,
            "Received message"
        );

        let parsed = match serde_json::from_str::<WebSocketMessage>(&message) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(
                    connection_id = %connection_id,
                    error = %e,
                    "Failed to parse WebSocket message"
                );
                self.reply_error(connection_id, "Malformed message").await;
                return;
            }
        };

        let message_type = parsed.message_type.clone();
        if let Err(e) = self.dispatch(connection_id, parsed).await {
            warn!(
                connection_id = %connection_id,
                message_type = ?message_type,
                error = %e,
                "Invalid message payload"
            );
            self.reply_error(connection_id, format!("Invalid payload: {}", e))
                .await;
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WebSocketQuery {
    pub token: Option<String>,
}

/// WebSocket endpoint
/// GET /ws, optionally pre-authenticated with `?token=`
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WebSocketQuery>,
    State(app_state): State<AppState>,
) -> Result<Response, AppError> {
    let user_id = verify_query_token(app_state.authenticator.as_ref(), query.token).await?;

    info!(user_id = ?user_id, "WebSocket connection requested");
    Ok(ws.on_upgrade(move |socket| serve_connection(Box::new(socket), user_id, app_state)))
}

/// A bad `?token=` rejects the upgrade with 401, a missing one is allowed
async fn verify_query_token(
    authenticator: &dyn Authenticator,
    token: Option<String>,
) -> Result<Option<String>, AppError> {
    let Some(token) = token else {
        return Ok(None);
    };
    match authenticator.verify(&token).await {
        Ok(user_id) => Ok(Some(user_id)),
        Err(e) => {
            warn!(error = %e, "Rejecting WebSocket upgrade with invalid token");
            Err(e)
        }
    }
}

/// Run one client session: register, pump frames until either side hangs up,
/// then drop every membership
async fn serve_connection(
    socket: Box<dyn SocketWrapper>,
    user_id: Option<String>,
    app_state: AppState,
) {
    // Outbound channel (hub -> client)
    let (outbound_sender, outbound_receiver) = mpsc::unbounded_channel::<String>();
    let connection_id = app_state.hub.connect(outbound_sender).await;

    if let Some(user_id) = user_id {
        app_state.hub.authenticate(connection_id, &user_id).await;
        match serde_json::to_string(&WebSocketMessage::authenticated(user_id)) {
            Ok(json) => {
                app_state.hub.send_to_connection(connection_id, &json).await;
            }
            Err(e) => warn!(error = %e, "Failed to serialize reply"),
        }
    }

    info!(connection_id = %connection_id, "WebSocket connection established");

    let message_handler = Arc::new(WebsocketReceiveHandler::from_state(&app_state));
    let connection = Connection::new(connection_id, socket, outbound_receiver, message_handler);

    match connection.run().await {
        Ok(()) => info!(connection_id = %connection_id, "WebSocket connection closed cleanly"),
        Err(e) => warn!(connection_id = %connection_id, error = %e, "WebSocket connection error"),
    }

    app_state.hub.disconnect(connection_id).await;
}
