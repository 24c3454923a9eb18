use strum_macros::{AsRefStr, Display};
use uuid::Uuid;

use super::ReorderError;
use crate::task::models::MoveTaskRequest;

/// Lifecycle of one drag-and-drop.
///
/// `Local -> Pending -> Confirmed | Reverted`, nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum ReorderState {
    /// Applied to the local view only
    Local,
    /// Durable write in flight
    Pending,
    Confirmed,
    Reverted,
}

/// A reorder that has been applied optimistically and is being persisted
#[derive(Debug, Clone)]
pub struct PendingReorder {
    pub project_id: Uuid,
    pub task_id: Uuid,
    pub section_id: Option<Uuid>,
    pub position: i32,
    pub idempotency_key: Uuid,
    state: ReorderState,
}

impl PendingReorder {
    pub fn new(project_id: Uuid, task_id: Uuid, section_id: Option<Uuid>, position: i32) -> Self {
        Self {
            project_id,
            task_id,
            section_id,
            position,
            idempotency_key: Uuid::new_v4(),
            state: ReorderState::Local,
        }
    }

    pub fn state(&self) -> ReorderState {
        self.state
    }

    pub fn begin_write(&mut self) -> Result<(), ReorderError> {
        self.transition(ReorderState::Local, ReorderState::Pending)
    }

    pub fn confirm(&mut self) -> Result<(), ReorderError> {
        self.transition(ReorderState::Pending, ReorderState::Confirmed)
    }

    pub fn revert(&mut self) -> Result<(), ReorderError> {
        self.transition(ReorderState::Pending, ReorderState::Reverted)
    }

    /// Request for the persistence collaborator, carrying this reorder's key
    pub fn request(&self) -> MoveTaskRequest {
        MoveTaskRequest::new(self.task_id, self.section_id, self.position)
            .with_idempotency_key(self.idempotency_key)
    }

    fn transition(&mut self, from: ReorderState, to: ReorderState) -> Result<(), ReorderError> {
        if self.state != from {
            return Err(ReorderError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        self.state = to;
        Ok(())
    }
}
