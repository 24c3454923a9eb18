#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use uuid::Uuid;

use taskboard_sync::{
    hub::ConnectionId,
    reorder::{IntentSink, Notifier},
    task::{
        models::{MoveTaskRequest, TaskModel},
        repository::{InMemoryTaskRepository, TaskRepository},
    },
    websockets::{MessageHandler, WebsocketReceiveHandler},
    AppError, ReorderError, WebSocketMessage,
};

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// Records every user-visible error
#[derive(Default)]
pub struct MockNotifier {
    errors: Mutex<Vec<String>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl Notifier for MockNotifier {
    fn error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

/// Reads through to a shared repository but refuses every move
pub struct FailingTaskRepository {
    inner: Arc<InMemoryTaskRepository>,
    move_calls: AtomicUsize,
    list_calls: AtomicUsize,
}

impl FailingTaskRepository {
    pub fn new(inner: Arc<InMemoryTaskRepository>) -> Self {
        Self {
            inner,
            move_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
        }
    }

    pub fn move_calls(&self) -> usize {
        self.move_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaskRepository for FailingTaskRepository {
    async fn move_task(&self, _request: &MoveTaskRequest) -> Result<TaskModel, AppError> {
        self.move_calls.fetch_add(1, Ordering::SeqCst);
        Err(AppError::DatabaseError(
            "could not serialize access due to concurrent update".to_string(),
        ))
    }

    async fn list_tasks(&self, project_id: Uuid) -> Result<Vec<TaskModel>, AppError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.list_tasks(project_id).await
    }
}

/// Holds each gated move until the test releases it. `true` lets the write
/// through to the shared repository, `false` fails it.
pub struct GatedTaskRepository {
    inner: Arc<InMemoryTaskRepository>,
    gates: Mutex<HashMap<Uuid, oneshot::Receiver<bool>>>,
    waiting: AtomicUsize,
}

impl GatedTaskRepository {
    pub fn new(inner: Arc<InMemoryTaskRepository>) -> Self {
        Self {
            inner,
            gates: Mutex::new(HashMap::new()),
            waiting: AtomicUsize::new(0),
        }
    }

    /// Gate the next move of `task_id`
    pub fn gate(&self, task_id: Uuid) -> oneshot::Sender<bool> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(task_id, rx);
        tx
    }

    /// Moves currently parked on a gate
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }

    pub async fn wait_for(&self, count: usize) {
        while self.waiting() < count {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl TaskRepository for GatedTaskRepository {
    async fn move_task(&self, request: &MoveTaskRequest) -> Result<TaskModel, AppError> {
        let gate = self.gates.lock().unwrap().remove(&request.task_id);
        let Some(gate) = gate else {
            return self.inner.move_task(request).await;
        };

        self.waiting.fetch_add(1, Ordering::SeqCst);
        let allowed = gate.await.unwrap_or(false);
        self.waiting.fetch_sub(1, Ordering::SeqCst);

        if allowed {
            self.inner.move_task(request).await
        } else {
            Err(AppError::DatabaseError("deadlock detected".to_string()))
        }
    }

    async fn list_tasks(&self, project_id: Uuid) -> Result<Vec<TaskModel>, AppError> {
        self.inner.list_tasks(project_id).await
    }
}

/// Feeds a client's intents straight into the hub's message handler, as if
/// they had arrived on that client's socket
pub struct HandlerIntentSink {
    handler: Arc<WebsocketReceiveHandler>,
    connection_id: ConnectionId,
}

impl HandlerIntentSink {
    pub fn new(handler: Arc<WebsocketReceiveHandler>, connection_id: ConnectionId) -> Self {
        Self {
            handler,
            connection_id,
        }
    }
}

#[async_trait]
impl IntentSink for HandlerIntentSink {
    async fn emit(&self, message: WebSocketMessage) -> Result<(), ReorderError> {
        let json = serde_json::to_string(&message)
            .map_err(|e| ReorderError::MalformedEvent(e.to_string()))?;
        self.handler.handle_message(self.connection_id, json).await;
        Ok(())
    }
}
