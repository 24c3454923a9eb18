use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::models::{MoveTaskRequest, TaskModel};
use crate::shared::AppError;

/// Persistence collaborator for task ordering
///
/// `move_task` must shift sibling positions atomically with the move so that
/// no reader ever sees two tasks sharing a position in one section.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Move a task to `position` within `section_id`, returning the stored task.
    /// A position past the end of the section appends.
    async fn move_task(&self, request: &MoveTaskRequest) -> Result<TaskModel, AppError>;

    /// All tasks of a project ordered by section, then position
    async fn list_tasks(&self, project_id: Uuid) -> Result<Vec<TaskModel>, AppError>;
}

fn validate_position(request: &MoveTaskRequest) -> Result<(), AppError> {
    if request.position < 0 {
        return Err(AppError::BadRequest(
            "position must be zero or greater".to_string(),
        ));
    }
    Ok(())
}

/// Idempotency receipts kept by the in-memory store before the oldest are dropped
const MAX_RECEIPTS: usize = 10_000;

/// Receipts older than this are pruned by the Postgres store
const RECEIPT_RETENTION: &str = "1 day";

struct TaskStore {
    tasks: HashMap<Uuid, TaskModel>,
    // idempotency key -> moved task id
    receipts: HashMap<Uuid, Uuid>,
    // insertion order, oldest first
    receipt_order: VecDeque<Uuid>,
    receipt_capacity: usize,
}

impl TaskStore {
    fn new(receipt_capacity: usize) -> Self {
        Self {
            tasks: HashMap::new(),
            receipts: HashMap::new(),
            receipt_order: VecDeque::new(),
            receipt_capacity,
        }
    }

    fn record_receipt(&mut self, key: Uuid, task_id: Uuid) {
        if self.receipts.insert(key, task_id).is_none() {
            self.receipt_order.push_back(key);
        }
        while self.receipt_order.len() > self.receipt_capacity {
            if let Some(oldest) = self.receipt_order.pop_front() {
                self.receipts.remove(&oldest);
                debug!(idempotency_key = %oldest, "Evicted move receipt");
            }
        }
    }

    fn ordered_ids(&self, project_id: Uuid, section_id: Option<Uuid>, skip: Uuid) -> Vec<Uuid> {
        let mut siblings: Vec<&TaskModel> = self
            .tasks
            .values()
            .filter(|t| t.id != skip && t.is_in(project_id, section_id))
            .collect();
        siblings.sort_by_key(|t| (t.position, t.id));
        siblings.into_iter().map(|t| t.id).collect()
    }

    fn renumber(&mut self, ordered: &[Uuid]) {
        for (index, id) in ordered.iter().enumerate() {
            if let Some(task) = self.tasks.get_mut(id) {
                task.position = index as i32;
            }
        }
    }
}

/// In-memory implementation of TaskRepository for development and testing
pub struct InMemoryTaskRepository {
    store: Mutex<TaskStore>,
}

impl Default for InMemoryTaskRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTaskRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self::with_receipt_capacity(MAX_RECEIPTS)
    }

    /// Keep at most `capacity` idempotency receipts, evicting the oldest
    pub fn with_receipt_capacity(capacity: usize) -> Self {
        Self {
            store: Mutex::new(TaskStore::new(capacity)),
        }
    }

    /// Creates an in-memory repository with pre-populated tasks
    pub fn with_tasks(tasks: Vec<TaskModel>) -> Self {
        let repo = Self::new();
        for task in tasks {
            repo.insert_task(task);
        }
        repo
    }

    pub fn insert_task(&self, task: TaskModel) {
        let mut store = self.lock();
        store.tasks.insert(task.id, task);
    }

    pub fn get_task(&self, task_id: Uuid) -> Option<TaskModel> {
        self.lock().tasks.get(&task_id).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TaskStore> {
        self.store
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    #[instrument(skip(self, request), fields(task_id = %request.task_id))]
    async fn move_task(&self, request: &MoveTaskRequest) -> Result<TaskModel, AppError> {
        validate_position(request)?;

        let mut store = self.lock();

        if let Some(key) = request.idempotency_key {
            if let Some(task_id) = store.receipts.get(&key).copied() {
                debug!(idempotency_key = %key, "Move already applied, returning stored task");
                return store
                    .tasks
                    .get(&task_id)
                    .cloned()
                    .ok_or_else(|| AppError::NotFound("Task not found".to_string()));
            }
        }

        let current = store
            .tasks
            .get(&request.task_id)
            .cloned()
            .ok_or_else(|| {
                warn!("Task not found for move");
                AppError::NotFound("Task not found".to_string())
            })?;

        let source = store.ordered_ids(current.project_id, current.section_id, current.id);
        let mut target = if current.section_id == request.section_id {
            source.clone()
        } else {
            store.renumber(&source);
            store.ordered_ids(current.project_id, request.section_id, current.id)
        };

        let index = (request.position as usize).min(target.len());
        target.insert(index, current.id);

        if let Some(task) = store.tasks.get_mut(&current.id) {
            task.section_id = request.section_id;
            task.updated_at = Utc::now();
        }
        store.renumber(&target);

        if let Some(key) = request.idempotency_key {
            store.record_receipt(key, current.id);
        }

        let moved = store
            .tasks
            .get(&current.id)
            .cloned()
            .ok_or(AppError::Internal)?;

        info!(
            section_id = ?moved.section_id,
            position = moved.position,
            "Task moved"
        );
        Ok(moved)
    }

    #[instrument(skip(self))]
    async fn list_tasks(&self, project_id: Uuid) -> Result<Vec<TaskModel>, AppError> {
        let store = self.lock();
        let mut tasks: Vec<TaskModel> = store
            .tasks
            .values()
            .filter(|t| t.project_id == project_id)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| (t.section_id, t.position, t.id));

        debug!(task_count = tasks.len(), "Tasks listed from memory");
        Ok(tasks)
    }
}

/// PostgreSQL implementation of task repository
///
/// Expects the `tasks` and `task_move_receipts` tables from
/// `migrations/0001_task_positions.sql`.
pub struct PostgresTaskRepository {
    pool: PgPool,
}

impl PostgresTaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn database_error(e: sqlx::Error) -> AppError {
    warn!(error = %e, "Task query failed");
    AppError::DatabaseError(e.to_string())
}

const TASK_COLUMNS: &str = "id, project_id, section_id, title, position, updated_at";

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    #[instrument(skip(self, request), fields(task_id = %request.task_id))]
    async fn move_task(&self, request: &MoveTaskRequest) -> Result<TaskModel, AppError> {
        validate_position(request)?;

        let mut tx = self.pool.begin().await.map_err(database_error)?;

        let project_id: Uuid = sqlx::query_scalar("SELECT project_id FROM tasks WHERE id = $1")
            .bind(request.task_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(database_error)?
            .ok_or_else(|| AppError::NotFound("Task not found".to_string()))?;

        // Serialize every reorder within the project
        sqlx::query("SELECT id FROM tasks WHERE project_id = $1 FOR UPDATE")
            .bind(project_id)
            .execute(&mut *tx)
            .await
            .map_err(database_error)?;

        let current: TaskModel =
            sqlx::query_as(&format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS))
                .bind(request.task_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(database_error)?;

        if let Some(key) = request.idempotency_key {
            sqlx::query(&format!(
                "DELETE FROM task_move_receipts WHERE created_at < NOW() - INTERVAL '{}'",
                RECEIPT_RETENTION
            ))
            .execute(&mut *tx)
            .await
            .map_err(database_error)?;

            let receipt = sqlx::query(
                "INSERT INTO task_move_receipts (idempotency_key, task_id) VALUES ($1, $2) \
                 ON CONFLICT (idempotency_key) DO NOTHING",
            )
            .bind(key)
            .bind(request.task_id)
            .execute(&mut *tx)
            .await
            .map_err(database_error)?;

            if receipt.rows_affected() == 0 {
                debug!(idempotency_key = %key, "Move already applied, returning stored task");
                tx.commit().await.map_err(database_error)?;
                return Ok(current);
            }
        }

        // Close the gap left in the source section
        sqlx::query(
            "UPDATE tasks SET position = position - 1 \
             WHERE project_id = $1 AND section_id IS NOT DISTINCT FROM $2 \
             AND position > $3 AND id <> $4",
        )
        .bind(project_id)
        .bind(current.section_id)
        .bind(current.position)
        .bind(current.id)
        .execute(&mut *tx)
        .await
        .map_err(database_error)?;

        let sibling_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM tasks \
             WHERE project_id = $1 AND section_id IS NOT DISTINCT FROM $2 AND id <> $3",
        )
        .bind(project_id)
        .bind(request.section_id)
        .bind(current.id)
        .fetch_one(&mut *tx)
        .await
        .map_err(database_error)?;

        let position = i64::from(request.position).min(sibling_count) as i32;

        // Open a slot in the target section
        sqlx::query(
            "UPDATE tasks SET position = position + 1 \
             WHERE project_id = $1 AND section_id IS NOT DISTINCT FROM $2 \
             AND position >= $3 AND id <> $4",
        )
        .bind(project_id)
        .bind(request.section_id)
        .bind(position)
        .bind(current.id)
        .execute(&mut *tx)
        .await
        .map_err(database_error)?;

        let moved: TaskModel = sqlx::query_as(&format!(
            "UPDATE tasks SET section_id = $1, position = $2, updated_at = NOW() \
             WHERE id = $3 RETURNING {}",
            TASK_COLUMNS
        ))
        .bind(request.section_id)
        .bind(position)
        .bind(current.id)
        .fetch_one(&mut *tx)
        .await
        .map_err(database_error)?;

        tx.commit().await.map_err(database_error)?;

        info!(
            section_id = ?moved.section_id,
            position = moved.position,
            "Task moved in database"
        );
        Ok(moved)
    }

    #[instrument(skip(self))]
    async fn list_tasks(&self, project_id: Uuid) -> Result<Vec<TaskModel>, AppError> {
        let tasks: Vec<TaskModel> = sqlx::query_as(&format!(
            "SELECT {} FROM tasks WHERE project_id = $1 \
             ORDER BY section_id NULLS FIRST, position, id",
            TASK_COLUMNS
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        debug!(task_count = tasks.len(), "Tasks listed from database");
        Ok(tasks)
    }
}
