#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

use taskboard_sync::{
    auth::TrustedAuthenticator,
    hub::{ConnectionId, InMemoryRoomHub, ProjectSequencer, RoomHub},
    task::{models::TaskModel, repository::InMemoryTaskRepository},
    websockets::WebsocketReceiveHandler,
};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

/// One simulated browser tab: a hub connection and its outbound frames
pub struct TestClient {
    pub connection_id: ConnectionId,
    pub receiver: Mutex<mpsc::UnboundedReceiver<String>>,
}

pub struct TestSetup {
    pub hub: Arc<InMemoryRoomHub>,
    pub input_handler: Arc<WebsocketReceiveHandler>,
    pub repository: Arc<InMemoryTaskRepository>,
    pub project_id: Uuid,
    pub task_ids: Vec<Uuid>,
    pub clients: HashMap<String, TestClient>,
    pub client_names: Vec<String>,
}

pub struct TestSetupBuilder {
    clients: Vec<String>,
    members: Option<Vec<String>>,
    task_count: usize,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            clients: vec![],
            members: None,
            task_count: 3,
        }
    }

    pub fn with_clients(mut self, clients: Vec<&str>) -> Self {
        self.clients = clients.into_iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_two_clients(self) -> Self {
        self.with_clients(vec!["alice", "bob"])
    }

    pub fn with_three_clients(self) -> Self {
        self.with_clients(vec!["alice", "bob", "charlie"])
    }

    /// Only these clients join the project room, default is all of them
    pub fn with_project_members(mut self, members: Vec<&str>) -> Self {
        self.members = Some(members.into_iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn with_tasks(mut self, task_count: usize) -> Self {
        self.task_count = task_count;
        self
    }

    pub async fn build(self) -> TestSetup {
        let hub = Arc::new(InMemoryRoomHub::new());
        let input_handler = Arc::new(WebsocketReceiveHandler::new(
            hub.clone(),
            Arc::new(TrustedAuthenticator),
            Arc::new(ProjectSequencer::new()),
        ));

        let project_id = Uuid::new_v4();
        let tasks: Vec<TaskModel> = (0..self.task_count)
            .map(|i| TaskModel::new(project_id, None, format!("task {}", i), i as i32))
            .collect();
        let task_ids = tasks.iter().map(|t| t.id).collect();
        let repository = Arc::new(InMemoryTaskRepository::with_tasks(tasks));

        let mut clients = HashMap::new();
        for name in &self.clients {
            let (tx, rx) = mpsc::unbounded_channel();
            let connection_id = hub.connect(tx).await;
            clients.insert(
                name.clone(),
                TestClient {
                    connection_id,
                    receiver: Mutex::new(rx),
                },
            );
        }

        let setup = TestSetup {
            hub,
            input_handler,
            repository,
            project_id,
            task_ids,
            clients,
            client_names: self.clients.clone(),
        };

        for name in &self.clients {
            setup.authenticate(name).await;
        }
        let members = self.members.unwrap_or(self.clients);
        for name in &members {
            setup.join_project(name).await;
        }
        setup.clear_messages().await;
        setup
    }
}
