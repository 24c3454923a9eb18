#![allow(dead_code)]

use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use taskboard_sync::{
    hub::RoomHub,
    reorder::{Notifier, ReorderCoordinator},
    task::repository::TaskRepository,
    websockets::{MessageHandler, WebSocketMessage},
};

use super::mocks::HandlerIntentSink;
use super::setup::TestSetup;

// ============================================================================
// Action Helpers
// ============================================================================

impl TestSetup {
    pub fn connection_of(&self, name: &str) -> taskboard_sync::ConnectionId {
        self.clients
            .get(name)
            .unwrap_or_else(|| panic!("no client named {}", name))
            .connection_id
    }

    /// Send a frame as if it arrived on the client's socket
    pub async fn send_message(&self, name: &str, message: WebSocketMessage) {
        let message_json = serde_json::to_string(&message).unwrap();
        self.input_handler
            .handle_message(self.connection_of(name), message_json)
            .await;
    }

    pub async fn send_raw(&self, name: &str, raw: &str) {
        self.input_handler
            .handle_message(self.connection_of(name), raw.to_string())
            .await;
    }

    /// Drain every frame queued for a client
    pub async fn take_messages(&self, name: &str) -> Vec<String> {
        let client = self
            .clients
            .get(name)
            .unwrap_or_else(|| panic!("no client named {}", name));
        let mut receiver = client.receiver.lock().await;
        let mut messages = vec![];
        while let Ok(message) = receiver.try_recv() {
            messages.push(message);
        }
        messages
    }

    /// Clear all queued frames
    pub async fn clear_messages(&self) {
        for name in &self.client_names {
            self.take_messages(name).await;
        }
    }

    pub async fn disconnect(&self, name: &str) {
        self.hub.disconnect(self.connection_of(name)).await;
    }

    // ============================================================================
    // Convenience Action Methods
    // ============================================================================

    /// Authenticate with the client's name as the credential
    pub async fn authenticate(&self, name: &str) {
        self.send_message(name, WebSocketMessage::authenticate(name.to_string()))
            .await;
    }

    pub async fn join_project(&self, name: &str) {
        self.send_message(name, WebSocketMessage::join_project(self.project_id.to_string()))
            .await;
    }

    pub async fn leave_project(&self, name: &str) {
        self.send_message(name, WebSocketMessage::leave_project(self.project_id.to_string()))
            .await;
    }

    /// Announce a move of the task at `task_index` to a final placement
    pub async fn send_task_update(&self, name: &str, task_index: usize, position: i32) {
        self.send_message(
            name,
            WebSocketMessage::task_update(
                self.project_id.to_string(),
                self.task_ids[task_index].to_string(),
                json!({ "section_id": null, "position": position }),
            ),
        )
        .await;
    }

    pub async fn send_comment(&self, name: &str, task_index: usize, text: &str) {
        self.send_message(
            name,
            WebSocketMessage::comment_added(
                self.project_id.to_string(),
                self.task_ids[task_index].to_string(),
                json!({ "content": text }),
            ),
        )
        .await;
    }

    pub async fn send_typing(&self, name: &str, task_index: usize, is_typing: bool) {
        self.send_message(
            name,
            WebSocketMessage::typing(
                self.project_id.to_string(),
                self.task_ids[task_index].to_string(),
                is_typing,
            ),
        )
        .await;
    }

    /// A loaded coordinator for `name` whose intents go through the hub
    pub async fn coordinator_for(
        &self,
        name: &str,
        repository: Arc<dyn TaskRepository>,
        notifier: Arc<dyn Notifier>,
    ) -> ReorderCoordinator {
        let sink = HandlerIntentSink::new(self.input_handler.clone(), self.connection_of(name));
        let coordinator =
            ReorderCoordinator::new(self.project_id, repository, Arc::new(sink), notifier);
        coordinator.load().await.unwrap();
        coordinator
    }

    /// Deliver every queued frame for `name` to its coordinator
    pub async fn pump(&self, name: &str, coordinator: &ReorderCoordinator) {
        for frame in self.take_messages(name).await {
            coordinator.handle_remote(&frame).await.unwrap();
        }
    }

    pub fn task(&self, index: usize) -> Uuid {
        self.task_ids[index]
    }
}
