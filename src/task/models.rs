use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for the tasks table, limited to the ordering columns
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct TaskModel {
    pub id: Uuid,
    pub project_id: Uuid,
    pub section_id: Option<Uuid>, // None is the project's "no section" list
    pub title: String,
    pub position: i32, // Dense 0-based index within (project, section)
    pub updated_at: DateTime<Utc>,
}

impl TaskModel {
    pub fn new(project_id: Uuid, section_id: Option<Uuid>, title: impl Into<String>, position: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            section_id,
            title: title.into(),
            position,
            updated_at: Utc::now(),
        }
    }

    pub fn is_in(&self, project_id: Uuid, section_id: Option<Uuid>) -> bool {
        self.project_id == project_id && self.section_id == section_id
    }
}

/// A durable move: place `task_id` at `position` inside `section_id`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MoveTaskRequest {
    pub task_id: Uuid,
    pub section_id: Option<Uuid>,
    pub position: i32,
    /// Client-generated; repeating a key returns the stored result instead of moving again
    pub idempotency_key: Option<Uuid>,
}

impl MoveTaskRequest {
    pub fn new(task_id: Uuid, section_id: Option<Uuid>, position: i32) -> Self {
        Self {
            task_id,
            section_id,
            position,
            idempotency_key: Some(Uuid::new_v4()),
        }
    }

    pub fn with_idempotency_key(mut self, key: Uuid) -> Self {
        self.idempotency_key = Some(key);
        self
    }
}
