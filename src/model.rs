use crate::age::{self, AgeLabel};
use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

pub type TaskId = String;

pub const NO_DESCRIPTION: &str = "No description";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnId {
    Todo,
    Progress,
    Done,
}

impl ColumnId {
    pub const ALL: [ColumnId; 3] = [ColumnId::Todo, ColumnId::Progress, ColumnId::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnId::Todo => "todo",
            ColumnId::Progress => "progress",
            ColumnId::Done => "done",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ColumnId::Todo => "To Do",
            ColumnId::Progress => "In Progress",
            ColumnId::Done => "Done",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            ColumnId::Todo => 0,
            ColumnId::Progress => 1,
            ColumnId::Done => 2,
        }
    }

    pub fn from_index(idx: usize) -> Option<Self> {
        Self::ALL.get(idx).copied()
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnId {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "todo" => Ok(ColumnId::Todo),
            "progress" => Ok(ColumnId::Progress),
            "done" => Ok(ColumnId::Done),
            other => Err(BoardError::UnknownColumn(other.to_string())),
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum BoardError {
    #[error("task title must not be empty")]
    EmptyTitle,
    #[error("task not found: {0}")]
    TaskNotFound(String),
    #[error("unknown column: {0} (expected todo, progress or done)")]
    UnknownColumn(String),
    #[error("task already done: {0}")]
    AlreadyDone(String),
}

#[derive(Debug, Clone)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Last label computed by [`Board::reconcile_age`]. Not persisted.
    pub label: AgeLabel,
}

impl Task {
    pub fn description_or_placeholder(&self) -> &str {
        self.description.as_deref().unwrap_or(NO_DESCRIPTION)
    }
}

#[derive(Debug, Clone)]
pub struct Column {
    pub id: ColumnId,
    pub task_ids: Vec<TaskId>,
}

/// One persisted task, as stored in the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TaskId>,
    pub title: String,
    #[serde(default)]
    pub desc: String,
    #[serde(rename = "columnId")]
    pub column_id: String,
    #[serde(default)]
    pub timestamp: Option<RawTimestamp>,
}

/// Creation time in epoch milliseconds. Older snapshots store it as a string,
/// sometimes with a fractional part; anything else is kept as `Other` so the
/// record can be skipped on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Millis(i64),
    Float(f64),
    Text(String),
    Other(serde_json::Value),
}

impl RawTimestamp {
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        let millis = match self {
            RawTimestamp::Millis(ms) => *ms,
            RawTimestamp::Float(ms) => float_millis(*ms)?,
            RawTimestamp::Text(text) => {
                let text = text.trim();
                match text.parse::<i64>() {
                    Ok(ms) => ms,
                    Err(_) => float_millis(text.parse::<f64>().ok()?)?,
                }
            }
            RawTimestamp::Other(_) => return None,
        };
        Utc.timestamp_millis_opt(millis).single()
    }
}

fn float_millis(ms: f64) -> Option<i64> {
    if !ms.is_finite() || ms.abs() >= i64::MAX as f64 {
        return None;
    }
    Some(ms.trunc() as i64)
}

#[derive(Debug, Clone)]
pub struct Board {
    columns: Vec<Column>,
    tasks: HashMap<TaskId, Task>,
    stale_after: Duration,
}

impl Default for Board {
    fn default() -> Self {
        Board::new(Duration::hours(age::STALE_AFTER_HOURS))
    }
}

impl Board {
    pub fn new(stale_after: Duration) -> Self {
        Board {
            columns: ColumnId::ALL
                .iter()
                .map(|id| Column {
                    id: *id,
                    task_ids: Vec::new(),
                })
                .collect(),
            tasks: HashMap::new(),
            stale_after,
        }
    }

    /// Rebuilds a board from snapshot records, keeping each recorded column and
    /// creation time. Records naming an unknown column or carrying an
    /// unreadable timestamp are dropped. Ages are not reconciled here.
    pub fn restore(records: Vec<TaskRecord>, stale_after: Duration, now: DateTime<Utc>) -> Self {
        let mut board = Board::new(stale_after);
        for record in records {
            let column = match record.column_id.parse::<ColumnId>() {
                Ok(column) => column,
                Err(err) => {
                    tracing::warn!(title = %record.title, "skipping stored task: {}", err);
                    continue;
                }
            };
            let created_at = match &record.timestamp {
                None => now,
                Some(raw) => match raw.to_datetime() {
                    Some(dt) => dt,
                    None => {
                        tracing::warn!(title = %record.title, ?raw, "skipping stored task with bad timestamp");
                        continue;
                    }
                },
            };
            let id = match record.id {
                Some(id) if !id.is_empty() && !board.tasks.contains_key(&id) => id,
                _ => board.generate_id(),
            };
            let description = non_empty(&record.desc);
            board.insert(
                Task {
                    id,
                    title: record.title,
                    description,
                    created_at,
                    label: age::label_for(column, created_at),
                },
                column,
            );
        }
        board
    }

    pub fn snapshot(&self) -> Vec<TaskRecord> {
        self.columns
            .iter()
            .flat_map(|column| {
                column
                    .task_ids
                    .iter()
                    .filter_map(|id| self.tasks.get(id))
                    .map(move |task| TaskRecord {
                        id: Some(task.id.clone()),
                        title: task.title.clone(),
                        desc: task.description.clone().unwrap_or_default(),
                        column_id: column.id.as_str().to_string(),
                        timestamp: Some(RawTimestamp::Millis(task.created_at.timestamp_millis())),
                    })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn column(&self, id: ColumnId) -> &Column {
        &self.columns[id.index()]
    }

    pub fn tasks_in(&self, column: ColumnId) -> impl Iterator<Item = &Task> + '_ {
        self.column(column)
            .task_ids
            .iter()
            .filter_map(|id| self.tasks.get(id))
    }

    pub fn count(&self, column: ColumnId) -> usize {
        self.column(column).task_ids.len()
    }

    pub fn column_of(&self, task_id: &str) -> Option<ColumnId> {
        self.columns
            .iter()
            .find(|c| c.task_ids.iter().any(|id| id == task_id))
            .map(|c| c.id)
    }

    /// The "mark done" action is offered for every task outside `done`.
    pub fn done_action_visible(&self, task_id: &str) -> bool {
        matches!(self.column_of(task_id), Some(c) if c != ColumnId::Done)
    }

    /// Adds a task to `todo`. The title is trimmed and must not be empty; an
    /// empty description is stored as absent.
    pub fn create_task(
        &mut self,
        title: &str,
        description: &str,
        now: DateTime<Utc>,
    ) -> Result<TaskId, BoardError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(BoardError::EmptyTitle);
        }
        let id = self.generate_id();
        self.insert(
            Task {
                id: id.clone(),
                title: title.to_string(),
                description: non_empty(description),
                created_at: now,
                label: AgeLabel::Created(now),
            },
            ColumnId::Todo,
        );
        self.reconcile_age(&id, now)?;
        Ok(id)
    }

    /// Detaches the task from its column and appends it to `dest`, then
    /// reconciles its age, which may move it again (a stale task dropped on
    /// `todo` lands in `progress`).
    pub fn move_task(
        &mut self,
        task_id: &str,
        dest: ColumnId,
        now: DateTime<Utc>,
    ) -> Result<(), BoardError> {
        let src = self
            .column_of(task_id)
            .ok_or_else(|| BoardError::TaskNotFound(task_id.to_string()))?;
        self.relocate(task_id, src, dest);
        self.reconcile_age(task_id, now)?;
        Ok(())
    }

    /// Removes a task. Returns `None` when the id is not on the board.
    pub fn delete_task(&mut self, task_id: &str) -> Option<Task> {
        let task = self.tasks.remove(task_id)?;
        for column in &mut self.columns {
            column.task_ids.retain(|id| id != task_id);
        }
        Some(task)
    }

    /// Recomputes the task's age label. Mutating: a `todo` task whose age has
    /// reached the stale threshold is moved to `progress` as part of the same
    /// call. Returns whether that move happened.
    pub fn reconcile_age(&mut self, task_id: &str, now: DateTime<Utc>) -> Result<bool, BoardError> {
        let column = self
            .column_of(task_id)
            .ok_or_else(|| BoardError::TaskNotFound(task_id.to_string()))?;
        let created_at = self
            .tasks
            .get(task_id)
            .map(|t| t.created_at)
            .ok_or_else(|| BoardError::TaskNotFound(task_id.to_string()))?;

        let auto_move =
            column == ColumnId::Todo && age::is_stale(created_at, now, self.stale_after);
        let label = if auto_move {
            self.relocate(task_id, ColumnId::Todo, ColumnId::Progress);
            tracing::info!(task = task_id, "auto-moved stale task to progress");
            AgeLabel::AutoMoved {
                created_at,
                after_hours: self.stale_after.num_hours(),
            }
        } else {
            age::label_for(column, created_at)
        };
        if let Some(task) = self.tasks.get_mut(task_id) {
            task.label = label;
        }
        Ok(auto_move)
    }

    /// Reconciles every task on the board, whatever its age. Returns the ids
    /// that were auto-moved.
    pub fn sweep(&mut self, now: DateTime<Utc>) -> Vec<TaskId> {
        let ids: Vec<TaskId> = self
            .columns
            .iter()
            .flat_map(|c| c.task_ids.iter().cloned())
            .collect();
        ids.into_iter()
            .filter(|id| matches!(self.reconcile_age(id, now), Ok(true)))
            .collect()
    }

    fn insert(&mut self, task: Task, column: ColumnId) {
        self.columns[column.index()].task_ids.push(task.id.clone());
        self.tasks.insert(task.id.clone(), task);
    }

    fn relocate(&mut self, task_id: &str, src: ColumnId, dest: ColumnId) {
        self.columns[src.index()].task_ids.retain(|id| id != task_id);
        self.columns[dest.index()]
            .task_ids
            .push(task_id.to_string());
    }

    fn generate_id(&self) -> TaskId {
        loop {
            let id: String = rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(6)
                .map(char::from)
                .collect();
            if !self.tasks.contains_key(&id) {
                return id;
            }
        }
    }
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
