//! Test assertion helpers - fluent API for verifying test expectations
#![allow(dead_code)] // Test utilities may not all be used in every test

use serde_json::Value;

use taskboard_sync::websockets::{MessageType, WebSocketMessage};

use super::setup::TestSetup;

// ============================================================================
// Assertion Helpers
// ============================================================================

pub struct MessageAssertion<'a> {
    setup: &'a TestSetup,
    clients: Vec<&'a str>,
}

impl<'a> MessageAssertion<'a> {
    /// Create an assertion for every client in the setup
    pub fn for_all_clients(setup: &'a TestSetup) -> Self {
        let clients = setup.client_names.iter().map(|s| s.as_str()).collect();
        Self { setup, clients }
    }

    /// Create an assertion for specific clients
    pub fn for_clients(setup: &'a TestSetup, clients: Vec<&'a str>) -> Self {
        Self { setup, clients }
    }

    /// Assert that each client received exactly one frame, of the given type,
    /// and that all of them carry the same payload
    pub async fn received_exactly_one(self, expected_type: MessageType) -> MessageContent {
        let mut messages = vec![];

        for client in &self.clients {
            let frames = self.setup.take_messages(client).await;
            assert_eq!(
                frames.len(),
                1,
                "{} should have received exactly one message, got {:?}",
                client,
                frames
            );

            let msg: WebSocketMessage = serde_json::from_str(&frames[0]).unwrap();
            assert_eq!(
                msg.message_type, expected_type,
                "{} received wrong message type",
                client
            );
            messages.push(msg);
        }

        for (i, msg) in messages.iter().enumerate().skip(1) {
            assert_eq!(
                msg.payload, messages[0].payload,
                "{} payload differs from {}",
                self.clients[i], self.clients[0]
            );
        }

        MessageContent::from(&messages[0])
    }

    /// Assert that clients received no frames at all
    pub async fn received_no_messages(self) {
        for client in &self.clients {
            let frames = self.setup.take_messages(client).await;
            assert!(
                frames.is_empty(),
                "{} should not have received any messages, got {:?}",
                client,
                frames
            );
        }
    }

    /// Assert the exact sequence of message types each client received
    pub async fn received_message_sequence(
        self,
        expected_types: Vec<MessageType>,
    ) -> Vec<MessageContent> {
        let mut first_client = vec![];

        for (n, client) in self.clients.iter().enumerate() {
            let frames = self.setup.take_messages(client).await;
            let messages: Vec<WebSocketMessage> = frames
                .iter()
                .map(|frame| serde_json::from_str(frame).unwrap())
                .collect();
            let types: Vec<MessageType> =
                messages.iter().map(|m| m.message_type.clone()).collect();
            assert_eq!(types, expected_types, "{} received wrong sequence", client);

            if n == 0 {
                first_client = messages.iter().map(MessageContent::from).collect();
            }
        }

        first_client
    }
}

/// A received frame's payload and sequence, with checks for common shapes
#[derive(Debug)]
pub struct MessageContent {
    pub payload: Value,
    pub sequence: Option<u64>,
    pub sender: Option<String>,
}

impl From<&WebSocketMessage> for MessageContent {
    fn from(message: &WebSocketMessage) -> Self {
        Self {
            payload: message.payload.clone(),
            sequence: message.sequence(),
            sender: message.meta.as_ref().and_then(|m| m.user_id.clone()),
        }
    }
}

impl MessageContent {
    pub fn verify_task(self, task_id: uuid::Uuid) -> Self {
        assert_eq!(self.payload["taskId"], task_id.to_string());
        self
    }

    pub fn verify_position(self, position: i64) -> Self {
        assert_eq!(self.payload["updates"]["position"], position);
        self
    }

    pub fn verify_sequence(self, sequence: u64) -> Self {
        assert_eq!(self.sequence, Some(sequence));
        self
    }

    pub fn verify_sender(self, user_id: &str) -> Self {
        assert_eq!(self.sender.as_deref(), Some(user_id));
        self
    }
}
