use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;
use uuid::Uuid;

use super::ReorderError;
use crate::task::models::TaskModel;
use crate::websockets::{MessageType, TaskUpdatePayload, WebSocketMessage};

/// What a remote event did to the local view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteOutcome {
    Applied,
    /// Sequence at or below the last one applied
    Stale,
    /// Not a task-updated event for this project
    Ignored,
    /// The event cannot be merged locally, the caller should re-fetch
    NeedsRefetch,
}

// Final placement carried in task-updated `updates`
#[derive(Debug, Deserialize)]
struct PositionUpdate {
    section_id: Option<Uuid>,
    position: i32,
}

/// Client-side ordered view of one project's tasks, grouped by section
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardView {
    project_id: Uuid,
    sections: BTreeMap<Option<Uuid>, Vec<TaskModel>>,
    last_sequence: u64,
}

impl BoardView {
    pub fn new(project_id: Uuid) -> Self {
        Self {
            project_id,
            sections: BTreeMap::new(),
            last_sequence: 0,
        }
    }

    pub fn from_tasks(project_id: Uuid, tasks: Vec<TaskModel>) -> Self {
        let mut view = Self::new(project_id);
        view.replace(tasks);
        view
    }

    /// Replace the whole view with a fresh listing. The sequence watermark is
    /// kept so that events older than the fetch are still dropped.
    pub fn replace(&mut self, tasks: Vec<TaskModel>) {
        self.sections.clear();
        for task in tasks
            .into_iter()
            .filter(|task| task.project_id == self.project_id)
        {
            self.sections.entry(task.section_id).or_default().push(task);
        }
        for section in self.sections.values_mut() {
            section.sort_by_key(|task| (task.position, task.id));
        }
    }

    pub fn project_id(&self) -> Uuid {
        self.project_id
    }

    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    pub fn section(&self, section_id: Option<Uuid>) -> &[TaskModel] {
        self.sections
            .get(&section_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn task_ids(&self, section_id: Option<Uuid>) -> Vec<Uuid> {
        self.section(section_id).iter().map(|task| task.id).collect()
    }

    /// Every task, ordered by section then position
    pub fn tasks(&self) -> Vec<TaskModel> {
        self.sections.values().flatten().cloned().collect()
    }

    pub fn locate(&self, task_id: Uuid) -> Option<(Option<Uuid>, usize)> {
        self.sections.iter().find_map(|(section_id, tasks)| {
            tasks
                .iter()
                .position(|task| task.id == task_id)
                .map(|index| (*section_id, index))
        })
    }

    /// Move a task to `index` within `section_id`, clamping past-the-end
    /// indexes. Returns the final index, or None when the task is already there.
    pub fn apply_move(
        &mut self,
        task_id: Uuid,
        section_id: Option<Uuid>,
        index: usize,
    ) -> Result<Option<usize>, ReorderError> {
        let (from_section, from_index) = self
            .locate(task_id)
            .ok_or(ReorderError::UnknownTask(task_id))?;

        let target_len = self.section(section_id).len();
        let max_index = if from_section == section_id {
            target_len - 1
        } else {
            target_len
        };
        let index = index.min(max_index);
        if from_section == section_id && from_index == index {
            return Ok(None);
        }

        let source = self
            .sections
            .get_mut(&from_section)
            .ok_or(ReorderError::UnknownTask(task_id))?;
        let mut task = source.remove(from_index);
        if source.is_empty() {
            self.sections.remove(&from_section);
        }

        task.section_id = section_id;
        self.sections
            .entry(section_id)
            .or_default()
            .insert(index, task);

        self.renumber(from_section);
        self.renumber(section_id);
        Ok(Some(index))
    }

    /// Merge a `task-updated` event carrying the task's final placement
    pub fn apply_remote(&mut self, event: &WebSocketMessage) -> RemoteOutcome {
        if event.message_type != MessageType::TaskUpdated {
            return RemoteOutcome::Ignored;
        }
        let Ok(payload) = event.payload_as::<TaskUpdatePayload>() else {
            return RemoteOutcome::Ignored;
        };
        if payload.project_id != self.project_id.to_string() {
            return RemoteOutcome::Ignored;
        }

        if let Some(sequence) = event.sequence() {
            if sequence <= self.last_sequence {
                debug!(
                    sequence,
                    last_sequence = self.last_sequence,
                    "Dropping stale task update"
                );
                return RemoteOutcome::Stale;
            }
            self.last_sequence = sequence;
        }

        let Ok(task_id) = payload.task_id.parse::<Uuid>() else {
            return RemoteOutcome::NeedsRefetch;
        };
        // Edits other than placement are not carried in full
        let Ok(update) = serde_json::from_value::<PositionUpdate>(payload.updates) else {
            return RemoteOutcome::NeedsRefetch;
        };
        if update.position < 0 {
            return RemoteOutcome::NeedsRefetch;
        }

        match self.apply_move(task_id, update.section_id, update.position as usize) {
            Ok(_) => RemoteOutcome::Applied,
            Err(_) => RemoteOutcome::NeedsRefetch,
        }
    }

    fn renumber(&mut self, section_id: Option<Uuid>) {
        if let Some(tasks) = self.sections.get_mut(&section_id) {
            for (index, task) in tasks.iter_mut().enumerate() {
                task.position = index as i32;
            }
        }
    }
}
