use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{BoardView, PendingReorder, RemoteOutcome, ReorderError};
use crate::task::{models::TaskModel, repository::TaskRepository};
use crate::websockets::WebSocketMessage;

/// Surfaces user-visible errors, e.g. a toast
pub trait Notifier: Send + Sync {
    fn error(&self, message: &str);
}

/// Where confirmed reorders are announced, normally the client's socket
#[async_trait]
pub trait IntentSink: Send + Sync {
    async fn emit(&self, message: WebSocketMessage) -> Result<(), ReorderError>;
}

/// Writes intents as JSON text frames onto an outbound socket channel
pub struct SocketIntentSink {
    sender: mpsc::UnboundedSender<String>,
}

impl SocketIntentSink {
    pub fn new(sender: mpsc::UnboundedSender<String>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl IntentSink for SocketIntentSink {
    async fn emit(&self, message: WebSocketMessage) -> Result<(), ReorderError> {
        let json = serde_json::to_string(&message)
            .map_err(|e| ReorderError::MalformedEvent(e.to_string()))?;
        self.sender
            .send(json)
            .map_err(|_| ReorderError::ChannelClosed)
    }
}

/// Drives optimistic drag-and-drop for one project board
///
/// The view is updated before the durable write. On success the final
/// placement is announced to the project room; on failure the user sees one
/// error and the board is rebuilt from a full listing.
pub struct ReorderCoordinator {
    project_id: Uuid,
    repository: Arc<dyn TaskRepository>,
    sink: Arc<dyn IntentSink>,
    notifier: Arc<dyn Notifier>,
    board: Mutex<BoardState>,
}

/// A local drop whose write has not returned yet
#[derive(Debug, Clone)]
struct InFlightMove {
    idempotency_key: Uuid,
    task_id: Uuid,
    section_id: Option<Uuid>,
    index: usize,
}

struct BoardState {
    view: BoardView,
    // Re-applied on top of every fetched listing until their writes settle
    in_flight: Vec<InFlightMove>,
}

impl BoardState {
    fn settle(&mut self, idempotency_key: Uuid) {
        self.in_flight
            .retain(|m| m.idempotency_key != idempotency_key);
    }

    fn replace(&mut self, tasks: Vec<TaskModel>) {
        self.view.replace(tasks);
        for m in &self.in_flight {
            if let Err(e) = self.view.apply_move(m.task_id, m.section_id, m.index) {
                warn!(task_id = %m.task_id, error = %e, "Pending drop no longer applies");
            }
        }
    }
}

impl ReorderCoordinator {
    pub fn new(
        project_id: Uuid,
        repository: Arc<dyn TaskRepository>,
        sink: Arc<dyn IntentSink>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            project_id,
            repository,
            sink,
            notifier,
            board: Mutex::new(BoardState {
                view: BoardView::new(project_id),
                in_flight: Vec::new(),
            }),
        }
    }

    pub fn project_id(&self) -> Uuid {
        self.project_id
    }

    /// Snapshot of the current view
    pub async fn view(&self) -> BoardView {
        self.board.lock().await.view.clone()
    }

    /// Initial load, same as a refresh
    pub async fn load(&self) -> Result<(), ReorderError> {
        self.refresh().await
    }

    /// Replace the view with the persisted ordering, keeping drops whose
    /// writes are still in flight
    #[instrument(skip(self), fields(project_id = %self.project_id))]
    pub async fn refresh(&self) -> Result<(), ReorderError> {
        let tasks = self.repository.list_tasks(self.project_id).await?;
        let task_count = tasks.len();

        let mut board = self.board.lock().await;
        board.replace(tasks);
        debug!(
            tasks = task_count,
            in_flight = board.in_flight.len(),
            last_sequence = board.view.last_sequence(),
            "Board refreshed"
        );
        Ok(())
    }

    /// Handle a local drop of `task_id` at `index` within `section_id`.
    ///
    /// Returns None when the drop leaves the board unchanged. A failed write is
    /// not an error here: the returned reorder is `Reverted` and the board has
    /// already been reconciled.
    #[instrument(skip(self), fields(project_id = %self.project_id))]
    pub async fn reorder(
        &self,
        task_id: Uuid,
        section_id: Option<Uuid>,
        index: usize,
    ) -> Result<Option<PendingReorder>, ReorderError> {
        let (origin, mut pending) = {
            let mut board = self.board.lock().await;
            let origin = board
                .view
                .locate(task_id)
                .ok_or(ReorderError::UnknownTask(task_id))?;
            let Some(final_index) = board.view.apply_move(task_id, section_id, index)? else {
                debug!(task_id = %task_id, "Drop left the board unchanged");
                return Ok(None);
            };

            let pending =
                PendingReorder::new(self.project_id, task_id, section_id, final_index as i32);
            board.in_flight.push(InFlightMove {
                idempotency_key: pending.idempotency_key,
                task_id,
                section_id,
                index: final_index,
            });
            (origin, pending)
        };
        pending.begin_write()?;

        match self.repository.move_task(&pending.request()).await {
            Ok(stored) => {
                pending.confirm()?;
                info!(
                    task_id = %task_id,
                    position = stored.position,
                    "Reorder confirmed"
                );

                {
                    let mut board = self.board.lock().await;
                    board.settle(pending.idempotency_key);
                    // A fetch may have landed while the write was in flight
                    if let Err(e) = board.view.apply_move(
                        task_id,
                        stored.section_id,
                        stored.position.max(0) as usize,
                    ) {
                        warn!(task_id = %task_id, error = %e, "Confirmed task missing from view");
                    }
                }

                let intent = WebSocketMessage::task_update(
                    self.project_id.to_string(),
                    task_id.to_string(),
                    json!({
                        "section_id": stored.section_id,
                        "position": stored.position,
                    }),
                );
                // The write is durable, peers will catch up on their next fetch
                if let Err(e) = self.sink.emit(intent).await {
                    warn!(task_id = %task_id, error = %e, "Failed to announce reorder");
                }
            }
            Err(e) => {
                pending.revert()?;
                warn!(task_id = %task_id, error = %e, "Reorder failed, reverting");
                self.notifier.error(&format!("Failed to move task: {}", e));

                // Undo only this drop, other drops may still be in flight
                {
                    let mut board = self.board.lock().await;
                    board.settle(pending.idempotency_key);
                    let (origin_section, origin_index) = origin;
                    if let Err(e) = board.view.apply_move(task_id, origin_section, origin_index) {
                        warn!(task_id = %task_id, error = %e, "Could not undo failed drop");
                    }
                }
                if let Err(e) = self.refresh().await {
                    warn!(error = %e, "Re-fetch after failed reorder failed");
                }
            }
        }

        Ok(Some(pending))
    }

    /// Merge a frame received from the hub. Only task-updated frames for this
    /// project change the view.
    pub async fn handle_remote(&self, raw: &str) -> Result<RemoteOutcome, ReorderError> {
        let message: WebSocketMessage = serde_json::from_str(raw)
            .map_err(|e| ReorderError::MalformedEvent(e.to_string()))?;

        let outcome = self.board.lock().await.view.apply_remote(&message);
        if outcome == RemoteOutcome::NeedsRefetch {
            self.refresh().await?;
        }
        Ok(outcome)
    }
}
