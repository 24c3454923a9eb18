use serde::Deserialize;
use uuid::Uuid;

/// Query parameters for GET /api/tasks
#[derive(Debug, Deserialize)]
pub struct ListTasksQuery {
    pub project_id: Uuid,
}

/// Request payload for PUT /api/tasks/:id/move
#[derive(Debug, Deserialize)]
pub struct MoveTaskBody {
    #[serde(default)]
    pub section_id: Option<Uuid>,
    pub position: i32,
    #[serde(default)]
    pub idempotency_key: Option<Uuid>,
}
