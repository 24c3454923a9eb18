use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    models::{MoveTaskRequest, TaskModel},
    types::{ListTasksQuery, MoveTaskBody},
};
use crate::auth::AuthenticatedUser;
use crate::shared::{AppError, AppState};

/// HTTP handler for listing a project's tasks
///
/// GET /api/tasks?project_id=X
/// Used by clients for the initial load and for full reconciliation
#[instrument(name = "list_tasks", skip(state, user))]
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<ListTasksQuery>,
) -> Result<Json<Vec<TaskModel>>, AppError> {
    let tasks = state.task_repository.list_tasks(query.project_id).await?;

    info!(
        user_id = %user.0,
        project_id = %query.project_id,
        task_count = tasks.len(),
        "Tasks listed"
    );

    Ok(Json(tasks))
}

/// HTTP handler for the durable half of a drag-and-drop reorder
///
/// PUT /api/tasks/:id/move
/// Returns the task as stored after siblings were shifted
#[instrument(name = "move_task", skip(state, user, body))]
pub async fn move_task(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(task_id): Path<Uuid>,
    Json(body): Json<MoveTaskBody>,
) -> Result<Json<TaskModel>, AppError> {
    let request = MoveTaskRequest {
        task_id,
        section_id: body.section_id,
        position: body.position,
        idempotency_key: body.idempotency_key,
    };

    let task = state.task_repository.move_task(&request).await?;

    info!(
        user_id = %user.0,
        task_id = %task.id,
        section_id = ?task.section_id,
        position = task.position,
        "Task move stored"
    );

    Ok(Json(task))
}
